//! Scoring and grading for repolens.
//!
//! Maps category findings to a 0-100 score and a letter grade, and combines
//! category scores into one weighted overall score. Nothing in here performs
//! I/O or talks to the generation backend.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Category names produced by the built-in engines.
pub mod categories {
    pub const DOCUMENTATION: &str = "documentation";
    pub const ARCHITECTURE: &str = "architecture";
    pub const SECURITY: &str = "security";
    pub const CI: &str = "ci";
    pub const TESTING: &str = "testing";
    pub const PERFORMANCE: &str = "performance";
    pub const COLLABORATION: &str = "collaboration";
    pub const OVERALL: &str = "overall";
}

/// Default weight table.
pub mod weights {
    pub const SECURITY: f64 = 1.5; // highest
    pub const TESTING: f64 = 1.3;
    pub const CI: f64 = 1.1;
    pub const PERFORMANCE: f64 = 1.1;
    pub const ARCHITECTURE: f64 = 1.0;
    pub const DOCUMENTATION: f64 = 1.0;
    pub const COLLABORATION: f64 = 0.8; // lowest
    pub const UNKNOWN: f64 = 1.0;
}

/// Lower bound (inclusive) of every passing grade band.
pub mod bands {
    pub const A_PLUS: i32 = 97;
    pub const A: i32 = 93;
    pub const A_MINUS: i32 = 90;
    pub const B_PLUS: i32 = 87;
    pub const B: i32 = 83;
    pub const B_MINUS: i32 = 80;
    pub const C_PLUS: i32 = 77;
    pub const C: i32 = 73;
    pub const C_MINUS: i32 = 70;
    pub const D_PLUS: i32 = 67;
    pub const D: i32 = 63;
    pub const D_MINUS: i32 = 60;
}

/// Letter grade, ordered from worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "F")]
    F,
    #[serde(rename = "D-")]
    DMinus,
    #[serde(rename = "D")]
    D,
    #[serde(rename = "D+")]
    DPlus,
    #[serde(rename = "C-")]
    CMinus,
    #[serde(rename = "C")]
    C,
    #[serde(rename = "C+")]
    CPlus,
    #[serde(rename = "B-")]
    BMinus,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "A-")]
    AMinus,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "A+")]
    APlus,
}

impl Grade {
    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::AMinus => "A-",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::BMinus => "B-",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::CMinus => "C-",
            Grade::DPlus => "D+",
            Grade::D => "D",
            Grade::DMinus => "D-",
            Grade::F => "F",
        }
    }

    /// Whether this grade is a pass (D- or better).
    pub fn is_passing(&self) -> bool {
        *self != Grade::F
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One engine's contribution to the overall health computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryResult {
    pub name: String,
    /// Score from 0-100, higher = healthier
    pub score: i32,
    pub grade: Grade,
    pub details: String,
}

impl CategoryResult {
    /// Build a result, clamping the score into 0-100 and deriving the grade.
    pub fn new(name: impl Into<String>, score: i32, details: impl Into<String>) -> Self {
        let score = score.clamp(0, 100);
        Self {
            name: name.into(),
            score,
            grade: letter_grade(score),
            details: details.into(),
        }
    }
}

/// Determine the letter grade from a score.
pub fn letter_grade(score: i32) -> Grade {
    match score {
        s if s >= bands::A_PLUS => Grade::APlus,
        s if s >= bands::A => Grade::A,
        s if s >= bands::A_MINUS => Grade::AMinus,
        s if s >= bands::B_PLUS => Grade::BPlus,
        s if s >= bands::B => Grade::B,
        s if s >= bands::B_MINUS => Grade::BMinus,
        s if s >= bands::C_PLUS => Grade::CPlus,
        s if s >= bands::C => Grade::C,
        s if s >= bands::C_MINUS => Grade::CMinus,
        s if s >= bands::D_PLUS => Grade::DPlus,
        s if s >= bands::D => Grade::D,
        s if s >= bands::D_MINUS => Grade::DMinus,
        _ => Grade::F,
    }
}

/// Per-category weights used by [`overall_score`].
#[derive(Debug, Clone, PartialEq)]
pub struct Weights {
    table: HashMap<String, f64>,
}

impl Default for Weights {
    fn default() -> Self {
        let table = [
            (categories::SECURITY, weights::SECURITY),
            (categories::TESTING, weights::TESTING),
            (categories::CI, weights::CI),
            (categories::PERFORMANCE, weights::PERFORMANCE),
            (categories::ARCHITECTURE, weights::ARCHITECTURE),
            (categories::DOCUMENTATION, weights::DOCUMENTATION),
            (categories::COLLABORATION, weights::COLLABORATION),
        ]
        .into_iter()
        .map(|(name, weight)| (name.to_string(), weight))
        .collect();
        Self { table }
    }
}

impl Weights {
    /// A table where every category weighs 1.0.
    pub fn uniform() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    /// Default table with the given overrides applied on top.
    pub fn with_overrides(overrides: &HashMap<String, f64>) -> Self {
        let mut weights = Self::default();
        for (name, weight) in overrides {
            weights.table.insert(name.clone(), *weight);
        }
        weights
    }

    /// Weight for a category; unrecognized names weigh 1.0.
    pub fn weight(&self, category: &str) -> f64 {
        self.table.get(category).copied().unwrap_or(weights::UNKNOWN)
    }
}

/// Weighted average of category scores, rounded to the nearest integer.
///
/// Returns 0 for an empty input.
pub fn overall_score(categories: &[CategoryResult], weights: &Weights) -> i32 {
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;

    for category in categories {
        let weight = weights.weight(&category.name);
        weighted_sum += f64::from(category.score) * weight;
        weight_total += weight;
    }

    if weight_total <= 0.0 {
        return 0;
    }

    (weighted_sum / weight_total).round() as i32
}

/// Additive score card used by engines to turn findings into a category score.
///
/// Starts from a base and applies bonuses and penalties, recording a line of
/// explanation for each adjustment so the details string is reproducible.
#[derive(Debug, Clone)]
pub struct ScoreCard {
    score: i32,
    notes: Vec<String>,
}

impl ScoreCard {
    pub fn new(base: i32) -> Self {
        Self {
            score: base,
            notes: Vec::new(),
        }
    }

    pub fn add(&mut self, points: i32, note: impl Into<String>) -> &mut Self {
        self.score += points;
        self.notes.push(format!("+{} {}", points, note.into()));
        self
    }

    pub fn deduct(&mut self, points: i32, note: impl Into<String>) -> &mut Self {
        self.score -= points;
        self.notes.push(format!("-{} {}", points, note.into()));
        self
    }

    pub fn score(&self) -> i32 {
        self.score.clamp(0, 100)
    }

    /// Finish the card into a category result.
    pub fn finish(&self, name: &str) -> CategoryResult {
        CategoryResult::new(name, self.score(), self.notes.join("; "))
    }
}
