//! Error types for profile construction and evaluation.
//!
//! All errors that can occur while building a profile or resolving
//! a field are represented by the `ProfileError` enum.

use thiserror::Error;

/// Format a cycle path as a readable string.
fn format_cycle_path(path: &[String]) -> String {
    if path.is_empty() {
        return String::from("(empty cycle)");
    }
    path.join(" -> ")
}

/// Errors that can occur while building or querying a profile.
///
/// Construction errors (`InvalidKey`, `InvalidValue`, `DuplicateField`,
/// `Json`) reject the whole profile. Evaluation errors abort the current
/// query and propagate to the caller unchanged.
///
/// # Examples
///
/// ```rust
/// use statprofile::ProfileError;
///
/// let err = ProfileError::InvalidKey("atk".to_string());
/// assert_eq!(err.to_string(), "Invalid profile key: atk");
/// ```
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProfileError {
    /// A profile entry was keyed by something that is not a field.
    #[error("Invalid profile key: {0}")]
    InvalidKey(String),

    /// A raw profile value could not be turned into a contribution.
    #[error("Invalid value for field {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    /// Two fields with the same display name were registered.
    #[error("Duplicate field name: {0}")]
    DuplicateField(String),

    /// Profile source text was not valid JSON.
    #[error("Malformed profile source: {0}")]
    Json(String),

    /// An operator was applied to operands it does not support.
    #[error("Type error in {op}: {detail}")]
    Type { op: &'static str, detail: String },

    /// Division with a zero divisor.
    #[error("Division by zero in {0}")]
    DivisionByZero(String),

    /// A guarded expression was used where a plain value is required.
    ///
    /// Guards only make sense as top-level field contributions; an unmet
    /// guard nested inside arithmetic has no value to offer.
    #[error("Unmet guard used as an operand: {0}")]
    UnmetOperand(String),

    /// A custom combinator rejected its inputs.
    #[error("Combinator {name} failed: {reason}")]
    Combinator { name: String, reason: String },

    /// Nested field lookups went deeper than the configured limit.
    ///
    /// This almost always means the formulas reference each other in a loop.
    #[error("Recursion limit of {limit} exceeded while resolving {field}")]
    RecursionLimit { field: String, limit: usize },

    /// A dependency cycle was found among field formulas.
    ///
    /// If A reads B, B reads C and C reads A, the path is `[A, B, C, A]`.
    #[error("Cycle detected: {}", format_cycle_path(.path))]
    Cycle { path: Vec<String> },
}

impl ProfileError {
    /// Shorthand for an operand type error.
    pub fn type_error(op: &'static str, detail: impl Into<String>) -> Self {
        Self::Type {
            op,
            detail: detail.into(),
        }
    }

    /// Shorthand for a failure reported by a custom combinator.
    pub fn combinator(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Combinator {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
