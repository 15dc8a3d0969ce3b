//! Password strength scoring.
//!
//! Five predicates are checked (minimum length, lowercase, uppercase, digit,
//! symbol). The score is the number satisfied minus one, floored at zero,
//! giving a 0-4 scale.

use serde::{Deserialize, Serialize};

pub const MIN_LENGTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PasswordStrength {
    MuitoFraca,
    Fraca,
    Media,
    Forte,
    MuitoForte,
}

impl PasswordStrength {
    pub fn from_score(score: u8) -> Self {
        match score {
            0 => PasswordStrength::MuitoFraca,
            1 => PasswordStrength::Fraca,
            2 => PasswordStrength::Media,
            3 => PasswordStrength::Forte,
            _ => PasswordStrength::MuitoForte,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordReport {
    pub min_length: bool,
    pub lowercase: bool,
    pub uppercase: bool,
    pub digit: bool,
    pub symbol: bool,
    pub score: u8,
    pub strength: PasswordStrength,
}

impl PasswordReport {
    /// True when the length requirement holds and the score reaches
    /// `min_score`.
    pub fn is_acceptable(&self, min_score: u8) -> bool {
        self.min_length && self.score >= min_score
    }

    /// Human-readable hints for each failed predicate.
    pub fn feedback(&self) -> Vec<String> {
        let mut hints = Vec::new();
        if !self.min_length {
            hints.push(format!("Use at least {} characters", MIN_LENGTH));
        }
        if !self.lowercase {
            hints.push("Add a lowercase letter".to_string());
        }
        if !self.uppercase {
            hints.push("Add an uppercase letter".to_string());
        }
        if !self.digit {
            hints.push("Add a digit".to_string());
        }
        if !self.symbol {
            hints.push("Add a symbol".to_string());
        }
        hints
    }
}

/// Scores a password.
///
/// # Example
/// ```
/// use valida::{evaluate_password, PasswordStrength};
/// let report = evaluate_password("Obra#2024");
/// assert_eq!(report.score, 4);
/// assert_eq!(report.strength, PasswordStrength::MuitoForte);
/// ```
pub fn evaluate_password(password: &str) -> PasswordReport {
    let min_length = password.chars().count() >= MIN_LENGTH;
    let lowercase = password.chars().any(|c| c.is_lowercase());
    let uppercase = password.chars().any(|c| c.is_uppercase());
    let digit = password.chars().any(|c| c.is_ascii_digit());
    let symbol = password.chars().any(|c| !c.is_alphanumeric() && !c.is_whitespace());

    let satisfied = [min_length, lowercase, uppercase, digit, symbol]
        .iter()
        .filter(|passed| **passed)
        .count() as u8;
    let score = satisfied.saturating_sub(1);

    PasswordReport {
        min_length,
        lowercase,
        uppercase,
        digit,
        symbol,
        score,
        strength: PasswordStrength::from_score(score),
    }
}
