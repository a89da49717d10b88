//! Resolved field breakdowns.
//!
//! Contains the `ResolvedField` type returned by
//! [`Profile::explain`](crate::Profile::explain): the final value of a
//! field together with what each contribution resolved to.

use crate::expr::Outcome;
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// A resolved field value with its full breakdown.
///
/// # Examples
///
/// ```rust
/// use statprofile::{Field, Profile, Value};
///
/// let atk = Field::new("atk");
/// let profile = Profile::builder().insert(&atk, 100).insert(&atk, 20).build();
///
/// let resolved = profile.explain(&atk).unwrap();
/// assert_eq!(resolved.value, Value::Number(120.0));
/// assert_eq!(resolved.contributions.len(), 2);
/// assert!(!resolved.used_default);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolvedField {
    /// Display name of the field.
    pub field: String,

    /// The final value.
    pub value: Value,

    /// Name of the combinator that produced `value`.
    pub combinator: String,

    /// Every registered contribution, in order.
    ///
    /// Each entry is `(expression, outcome)`.
    pub contributions: Vec<(String, Outcome)>,

    /// Whether no contribution applied and the default was used.
    pub used_default: bool,
}

impl ResolvedField {
    /// Create an empty breakdown for `field`.
    pub fn new(field: impl Into<String>, combinator: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: Value::default(),
            combinator: combinator.into(),
            contributions: Vec::new(),
            used_default: false,
        }
    }

    /// Record one contribution and what it resolved to.
    pub fn add_contribution(&mut self, description: impl Into<String>, outcome: Outcome) {
        self.contributions.push((description.into(), outcome));
    }

    /// The values that took part in the combination.
    pub fn applied(&self) -> Vec<Value> {
        self.contributions
            .iter()
            .filter_map(|(_, outcome)| outcome.value())
            .collect()
    }

    /// How many contributions were filtered out by their guard.
    pub fn unmet_count(&self) -> usize {
        self.contributions
            .iter()
            .filter(|(_, outcome)| outcome.is_unmet())
            .count()
    }
}
