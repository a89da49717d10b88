//! Evaluation context.
//!
//! Expressions never hold data of their own: every field they read is
//! looked up through a `Context`. [`Profile`](crate::Profile) is the
//! context in practice, which is what lets a field's formula read other
//! fields of the same profile.

use crate::error::ProfileError;
use crate::expr::Expr;
use crate::field::Field;
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// Read access to field values during evaluation.
///
/// # Examples
///
/// ```rust
/// use statprofile::{Context, Field, Profile, Value};
///
/// let hp = Field::new("hp");
/// let profile = Profile::builder().insert(&hp, 1200).build();
///
/// let ctx: &dyn Context = &profile;
/// assert_eq!(ctx.lookup(&hp).unwrap(), Value::Number(1200.0));
/// ```
pub trait Context {
    /// Resolve `field` in this context.
    fn lookup(&self, field: &Field) -> Result<Value, ProfileError>;

    /// Resolve `field` in this context with each `(other, value)`
    /// override taking precedence over the context's own contributions
    /// for `other`. The context itself is not modified.
    fn lookup_scoped(
        &self,
        field: &Field,
        overrides: &[(Field, Expr)],
    ) -> Result<Value, ProfileError>;
}

/// Evaluation settings carried by a profile.
///
/// # Examples
///
/// ```rust
/// use statprofile::EvalConfig;
///
/// let config: EvalConfig = serde_json::from_str(r#"{ "max_depth": 32 }"#).unwrap();
/// assert_eq!(config.max_depth, 32);
/// assert_eq!(EvalConfig::default().max_depth, EvalConfig::DEFAULT_MAX_DEPTH);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Maximum number of nested field lookups in one query.
    ///
    /// Formulas that read each other in a loop hit this limit and fail
    /// with `ProfileError::RecursionLimit` instead of overflowing the stack.
    pub max_depth: usize,
}

impl EvalConfig {
    /// Default nesting limit. Real formula chains stay far below it.
    pub const DEFAULT_MAX_DEPTH: usize = 128;

    /// Config with a specific nesting limit.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// A flat context with fixed values and no overrides.
    struct FixedContext(HashMap<Field, Value>);

    impl Context for FixedContext {
        fn lookup(&self, field: &Field) -> Result<Value, ProfileError> {
            match self.0.get(field) {
                Some(value) => Ok(*value),
                None => field.default_value().evaluate(self),
            }
        }

        fn lookup_scoped(
            &self,
            field: &Field,
            overrides: &[(Field, Expr)],
        ) -> Result<Value, ProfileError> {
            let mut values = self.0.clone();
            for (other, expr) in overrides {
                values.insert(other.clone(), expr.evaluate(self)?);
            }
            FixedContext(values).lookup(field)
        }
    }

    #[test]
    fn test_custom_context() {
        let a = Field::new("a");
        let b = Field::builder("b").default(&a * 3).build();
        let mut values = HashMap::new();
        values.insert(a.clone(), Value::Number(2.0));
        let ctx = FixedContext(values);

        assert_eq!((&a + 1).evaluate(&ctx).unwrap(), Value::Number(3.0));
        assert_eq!(ctx.lookup(&b).unwrap(), Value::Number(6.0));
        assert_eq!(
            b.scoped([(&a, 5)]).evaluate(&ctx).unwrap(),
            Value::Number(15.0)
        );
    }

    #[test]
    fn test_config_default_and_serde() {
        let config = EvalConfig::default();
        assert_eq!(config.max_depth, EvalConfig::DEFAULT_MAX_DEPTH);

        let json = serde_json::to_string(&EvalConfig::with_max_depth(8)).unwrap();
        assert_eq!(json, r#"{"max_depth":8}"#);

        let empty: EvalConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, EvalConfig::default());
    }
}
