//! Guarded field bindings.
//!
//! A `GuardedField` pairs a field with a condition. It is only used as a
//! profile key: the profile stores the field itself, with the registered
//! value wrapped in a guard expression.

use crate::expr::Expr;
use crate::field::Field;
use crate::predicate::Predicate;
use std::fmt;

/// A field paired with the condition under which a contribution applies.
///
/// Usually obtained from [`Field::when`].
#[derive(Clone)]
pub struct GuardedField {
    field: Field,
    condition: Predicate,
}

impl GuardedField {
    /// Pair `field` with `condition`.
    ///
    /// Equivalent to `field.when(condition)`.
    ///
    /// # Arguments
    ///
    /// * `field` - The field a bound value contributes to
    /// * `condition` - The predicate that must hold for it to apply
    pub fn new(field: Field, condition: Predicate) -> Self {
        Self { field, condition }
    }

    /// The field the contribution is registered under.
    pub fn field(&self) -> &Field {
        &self.field
    }

    /// The guarding condition.
    pub fn condition(&self) -> &Predicate {
        &self.condition
    }

    /// Narrow the guard: the contribution applies only if both the
    /// current condition and `more` hold.
    pub fn when(self, more: Predicate) -> GuardedField {
        let condition = self.condition.and(&more);
        Self {
            field: self.field,
            condition,
        }
    }

    /// Wrap `value` so it resolves only while the condition holds.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use statprofile::{Field, Outcome, Profile, Value};
    ///
    /// let stacks = Field::new("stacks");
    /// let bonus = Field::new("bonus");
    /// let expr = bonus.when(stacks.ge(3)).bind(&stacks * 0.1);
    ///
    /// let low = Profile::builder().insert(&stacks, 1).build();
    /// let high = Profile::builder().insert(&stacks, 4).build();
    /// assert_eq!(expr.resolve(&low).unwrap(), Outcome::Unmet);
    /// assert!(expr.resolve(&high).unwrap().value().is_some());
    /// ```
    pub fn bind(&self, value: impl Into<Expr>) -> Expr {
        Expr::guard(self.condition.clone(), value.into())
    }
}

impl fmt::Display for GuardedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} if {}", self.field, self.condition)
    }
}

impl fmt::Debug for GuardedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GuardedField({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Outcome;
    use crate::profile::Profile;
    use crate::value::Value;

    #[test]
    fn test_bind_checks_condition_per_context() {
        let x = Field::new("x");
        let y = Field::new("y");
        let bound = y.when(x.gt(0)).bind(5);

        let on = Profile::builder().insert(&x, 1).build();
        let off = Profile::builder().insert(&x, -1).build();
        assert_eq!(
            bound.resolve(&on).unwrap(),
            Outcome::Resolved(Value::Number(5.0))
        );
        assert_eq!(bound.resolve(&off).unwrap(), Outcome::Unmet);
    }

    #[test]
    fn test_value_is_lazy() {
        let x = Field::new("x");
        let y = Field::new("y");
        let bound = y.when(x.gt(0)).bind(&x * 10);

        let p = Profile::builder().insert(&x, 2).build();
        assert_eq!(
            bound.resolve(&p).unwrap(),
            Outcome::Resolved(Value::Number(20.0))
        );
    }

    #[test]
    fn test_narrowed_guard() {
        let x = Field::new("x");
        let y = Field::new("y");
        let guard = y.when(x.gt(0)).when(x.lt(10));
        let bound = guard.bind(1);

        let inside = Profile::builder().insert(&x, 5).build();
        let outside = Profile::builder().insert(&x, 15).build();
        assert!(!bound.resolve(&inside).unwrap().is_unmet());
        assert!(bound.resolve(&outside).unwrap().is_unmet());
        assert_eq!(guard.field(), &y);
    }

    #[test]
    fn test_display() {
        let x = Field::new("x");
        let y = Field::new("y");
        assert_eq!(y.when(x.gt(0)).to_string(), "<y> if (<x> > 0)");
    }
}
