//! File extension to language mapping.

use phf::phf_map;

static LANGUAGES: phf::Map<&'static str, &'static str> = phf_map! {
    "rs" => "Rust",
    "py" => "Python",
    "js" => "JavaScript",
    "jsx" => "JavaScript",
    "mjs" => "JavaScript",
    "cjs" => "JavaScript",
    "ts" => "TypeScript",
    "tsx" => "TypeScript",
    "go" => "Go",
    "java" => "Java",
    "kt" => "Kotlin",
    "rb" => "Ruby",
    "php" => "PHP",
    "cs" => "C#",
    "c" => "C",
    "h" => "C",
    "cpp" => "C++",
    "cc" => "C++",
    "hpp" => "C++",
    "swift" => "Swift",
    "scala" => "Scala",
    "sh" => "Shell",
    "sql" => "SQL",
    "vue" => "Vue",
    "svelte" => "Svelte",
    "dart" => "Dart",
    "ex" => "Elixir",
    "exs" => "Elixir",
    "prisma" => "Prisma",
};

/// Language for a file extension, if it is a recognized source language.
pub fn language_for_extension(ext: &str) -> Option<&'static str> {
    LANGUAGES.get(ext.to_ascii_lowercase().as_str()).copied()
}

/// Line-comment prefix for a language.
pub fn comment_prefix(language: &str) -> &'static str {
    match language {
        "Python" | "Ruby" | "Shell" | "Elixir" => "#",
        "SQL" => "--",
        _ => "//",
    }
}
