//! Framework and package manager detection from project manifests.

use std::fs;
use std::path::Path;

/// Lockfiles, in package manager priority order.
pub const LOCKFILES: &[(&str, &str)] = &[
    ("pnpm-lock.yaml", "pnpm"),
    ("yarn.lock", "yarn"),
    ("bun.lockb", "bun"),
    ("package-lock.json", "npm"),
    ("Cargo.lock", "cargo"),
    ("go.sum", "go"),
    ("poetry.lock", "poetry"),
    ("Pipfile.lock", "pipenv"),
    ("uv.lock", "uv"),
    ("Gemfile.lock", "bundler"),
    ("composer.lock", "composer"),
];

/// Manifests that identify a package manager when no lockfile exists.
const MANIFESTS: &[(&str, &str)] = &[
    ("package.json", "npm"),
    ("Cargo.toml", "cargo"),
    ("go.mod", "go"),
    ("pyproject.toml", "pip"),
    ("requirements.txt", "pip"),
    ("Pipfile", "pipenv"),
    ("Gemfile", "bundler"),
    ("pom.xml", "maven"),
    ("build.gradle", "gradle"),
    ("build.gradle.kts", "gradle"),
    ("composer.json", "composer"),
];

const NPM_FRAMEWORKS: &[(&str, &str)] = &[
    ("next", "Next.js"),
    ("react", "React"),
    ("vue", "Vue"),
    ("@angular/core", "Angular"),
    ("svelte", "Svelte"),
    ("express", "Express"),
    ("fastify", "Fastify"),
    ("koa", "Koa"),
    ("@nestjs/core", "NestJS"),
    ("@prisma/client", "Prisma"),
    ("mongoose", "Mongoose"),
    ("typeorm", "TypeORM"),
    ("jest", "Jest"),
    ("vitest", "Vitest"),
];

/// (needle, framework) matched case-insensitively against manifest text.
const TEXT_FRAMEWORKS: &[(&str, &[(&str, &str)])] = &[
    (
        "requirements.txt",
        &[("django", "Django"), ("flask", "Flask"), ("fastapi", "FastAPI"), ("sqlalchemy", "SQLAlchemy"), ("pytest", "pytest")],
    ),
    (
        "pyproject.toml",
        &[("django", "Django"), ("flask", "Flask"), ("fastapi", "FastAPI"), ("sqlalchemy", "SQLAlchemy"), ("pytest", "pytest")],
    ),
    (
        "Cargo.toml",
        &[("axum", "Axum"), ("actix-web", "Actix Web"), ("rocket", "Rocket"), ("tokio", "Tokio"), ("diesel", "Diesel"), ("sea-orm", "SeaORM"), ("sqlx", "SQLx")],
    ),
    (
        "go.mod",
        &[("gin-gonic/gin", "Gin"), ("labstack/echo", "Echo"), ("go-chi/chi", "Chi"), ("gorm.io/gorm", "GORM")],
    ),
    (
        "pom.xml",
        &[("spring-boot", "Spring Boot"), ("hibernate", "Hibernate"), ("junit", "JUnit")],
    ),
    ("Gemfile", &[("rails", "Rails"), ("sinatra", "Sinatra"), ("rspec", "RSpec")]),
];

/// Package manager for the project at `root`, lockfiles first.
pub fn package_manager(root: &Path) -> Option<String> {
    LOCKFILES
        .iter()
        .chain(MANIFESTS.iter())
        .find(|(file, _)| root.join(file).is_file())
        .map(|(_, manager)| manager.to_string())
}

/// Frameworks named in the root manifests, sorted and deduplicated.
/// Unreadable or malformed manifests contribute nothing.
pub fn frameworks(root: &Path) -> Vec<String> {
    let mut found = npm_frameworks(root);

    for (manifest, table) in TEXT_FRAMEWORKS {
        let Ok(text) = fs::read_to_string(root.join(manifest)) else {
            continue;
        };
        let text = text.to_ascii_lowercase();
        for (needle, name) in table.iter() {
            if text.contains(needle) {
                found.push(name.to_string());
            }
        }
    }

    found.sort();
    found.dedup();
    found
}

fn npm_frameworks(root: &Path) -> Vec<String> {
    let Ok(text) = fs::read_to_string(root.join("package.json")) else {
        return Vec::new();
    };
    let manifest: serde_json::Value = match serde_json::from_str(&text) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!("ignoring malformed package.json: {}", e);
            return Vec::new();
        }
    };

    let mut found = Vec::new();
    for section in ["dependencies", "devDependencies"] {
        let Some(deps) = manifest.get(section).and_then(|d| d.as_object()) else {
            continue;
        };
        for (package, name) in NPM_FRAMEWORKS {
            if deps.contains_key(*package) {
                found.push(name.to_string());
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_package_manager_prefers_lockfile() {
        let temp = TempDir::new().unwrap();
        assert_eq!(package_manager(temp.path()), None);

        fs::write(temp.path().join("package.json"), "{}").unwrap();
        assert_eq!(package_manager(temp.path()).as_deref(), Some("npm"));

        fs::write(temp.path().join("pnpm-lock.yaml"), "").unwrap();
        assert_eq!(package_manager(temp.path()).as_deref(), Some("pnpm"));
    }

    #[test]
    fn test_frameworks_from_manifests() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("package.json"),
            r#"{"dependencies": {"express": "^4", "react": "^18"}, "devDependencies": {"jest": "^29"}}"#,
        )
        .unwrap();
        fs::write(temp.path().join("requirements.txt"), "Flask==3.0\n").unwrap();

        assert_eq!(frameworks(temp.path()), vec!["Express", "Flask", "Jest", "React"]);
    }

    #[test]
    fn test_malformed_package_json_ignored() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("package.json"), "{ not json").unwrap();
        assert!(frameworks(temp.path()).is_empty());
    }
}
