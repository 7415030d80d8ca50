//! Textual allow-list check on generated SQL.
//!
//! This inspects text, it does not parse SQL. A completion that begins with
//! `select` but hides side effects in CTEs or function calls passes; the
//! guard's job is to reject the model's refusal sentinel and anything that
//! is not shaped like a read.

use std::error::Error;
use std::fmt;

/// Token the model must return verbatim when no query can be formed.
pub const SENTINEL: &str = "ERROR";

#[derive(Debug, PartialEq, Eq)]
pub enum GuardError {
    /// The model returned the refusal sentinel.
    TooVague,
    /// The completion does not start with SELECT.
    NotSelect,
}

impl fmt::Display for GuardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuardError::TooVague => {
                write!(f, "the question could not be mapped to a query")
            }
            GuardError::NotSelect => {
                write!(f, "only SELECT statements are allowed")
            }
        }
    }
}

impl Error for GuardError {}

/// Strips markdown fences and stray backticks the model wraps around SQL.
pub fn sanitize_completion(raw: &str) -> String {
    raw.replace("```sql", "")
        .replace("```", "")
        .replace('`', "")
        .trim()
        .to_string()
}

/// Sanitizes a raw completion and applies the two checks, in order:
/// sentinel match, then the SELECT prefix. Returns the cleaned SQL text.
pub fn guard_completion(raw: &str) -> Result<String, GuardError> {
    let sql = sanitize_completion(raw);

    if sql.eq_ignore_ascii_case(SENTINEL) {
        return Err(GuardError::TooVague);
    }

    if !sql.to_lowercase().starts_with("select") {
        return Err(GuardError::NotSelect);
    }

    Ok(sql)
}
