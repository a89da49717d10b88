//! Field module.
//!
//! Provides the `Field` type: a named quantity that is both an
//! expression (it evaluates to its value in the context) and the key
//! under which profiles store contributions.

use crate::combinator::Combinator;
use crate::context::Context;
use crate::error::ProfileError;
use crate::expr::Expr;
use crate::guard::GuardedField;
use crate::predicate::Predicate;
use crate::value::Value;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

struct FieldInner {
    name: Arc<str>,
    default: Expr,
    combinator: Combinator,
}

/// A named quantity with a default value and a combination policy.
///
/// Fields are compared and hashed by identity: every constructed field
/// is a distinct key, even when two fields share a display name.
/// Cloning a `Field` yields the same field.
///
/// # Examples
///
/// ```rust
/// use statprofile::{Combinator, Field};
///
/// let atk = Field::new("atk");
/// let level = Field::builder("level")
///     .default(1)
///     .combinator(Combinator::Last)
///     .build();
///
/// assert_eq!(atk, atk.clone());
/// assert_ne!(atk, Field::new("atk"));
/// assert_eq!(level.name(), "level");
/// ```
#[derive(Clone)]
pub struct Field(Arc<FieldInner>);

impl Field {
    /// Create a field that defaults to 0 and sums its contributions.
    pub fn new(name: impl Into<String>) -> Self {
        Self::builder(name).build()
    }

    /// Start building a field with a custom default or combinator.
    pub fn builder(name: impl Into<String>) -> FieldBuilder {
        FieldBuilder {
            name: name.into(),
            default: Expr::literal(0),
            combinator: Combinator::Sum,
        }
    }

    /// Display name. Only used for diagnostics.
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Value used when no contribution applies.
    ///
    /// Evaluated lazily against the profile being queried.
    pub fn default_value(&self) -> &Expr {
        &self.0.default
    }

    /// How contributions are folded into one value.
    pub fn combinator(&self) -> &Combinator {
        &self.0.combinator
    }

    /// The value of this field in `ctx`.
    pub fn evaluate(&self, ctx: &dyn Context) -> Result<Value, ProfileError> {
        ctx.lookup(self)
    }

    /// This field as an expression.
    pub fn to_expr(&self) -> Expr {
        Expr::from(self)
    }

    /// Pair this field with a condition, for registering a guarded
    /// contribution in a profile.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use statprofile::{Field, Profile, Value};
    ///
    /// let hp = Field::new("hp_ratio");
    /// let dmg_bonus = Field::new("dmg_bonus");
    ///
    /// let profile = Profile::builder()
    ///     .insert(&hp, 0.4)
    ///     .insert(dmg_bonus.when(hp.lt(0.5)), 0.3)
    ///     .build();
    /// assert_eq!(profile.get(&dmg_bonus).unwrap(), Value::Number(0.3));
    /// ```
    pub fn when(&self, condition: Predicate) -> GuardedField {
        GuardedField::new(self.clone(), condition)
    }

    /// Read this field with other fields temporarily overridden.
    ///
    /// The returned expression evaluates the field in a context where
    /// each `(field, value)` override shadows that field entirely. The
    /// context itself is left untouched.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use statprofile::{Field, Profile, Value};
    ///
    /// let crit = Field::new("crit");
    /// let dmg = Field::new("dmg");
    ///
    /// let profile = Profile::builder()
    ///     .insert(&crit, 0.2)
    ///     .insert(&dmg, 100.0 * (1.0 + &crit))
    ///     .build();
    ///
    /// let always_crit = dmg.scoped([(&crit, 1.0)]);
    /// assert_eq!(always_crit.evaluate(&profile).unwrap(), Value::Number(200.0));
    /// assert_eq!(profile.get(&crit).unwrap(), Value::Number(0.2));
    /// ```
    pub fn scoped<I, K, V>(&self, overrides: I) -> Expr
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Field>,
        V: Into<Expr>,
    {
        let overrides = overrides
            .into_iter()
            .map(|(field, value)| (field.into(), value.into()))
            .collect();
        Expr::scoped(self.clone(), overrides)
    }

    /// Floor-combine this field with another operand.
    pub fn min(&self, other: impl Into<Expr>) -> Expr {
        self.to_expr().min(other)
    }

    /// Cap-combine this field with another operand.
    pub fn max(&self, other: impl Into<Expr>) -> Expr {
        self.to_expr().max(other)
    }

    /// `self == other`
    pub fn equals(&self, other: impl Into<Expr>) -> Predicate {
        self.to_expr().equals(other)
    }

    /// `self > other`
    pub fn gt(&self, other: impl Into<Expr>) -> Predicate {
        self.to_expr().gt(other)
    }

    /// `self >= other`
    pub fn ge(&self, other: impl Into<Expr>) -> Predicate {
        self.to_expr().ge(other)
    }

    /// `self < other`
    pub fn lt(&self, other: impl Into<Expr>) -> Predicate {
        self.to_expr().lt(other)
    }

    /// `self <= other`
    pub fn le(&self, other: impl Into<Expr>) -> Predicate {
        self.to_expr().le(other)
    }
}

impl PartialEq for Field {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Field {}

impl Hash for Field {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Arc::as_ptr(&self.0), state);
    }
}

impl From<&Field> for Field {
    fn from(field: &Field) -> Self {
        field.clone()
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.0.name)
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Field({})", self.0.name)
    }
}

/// Builder for fields with a non-zero default or a custom combinator.
pub struct FieldBuilder {
    name: String,
    default: Expr,
    combinator: Combinator,
}

impl FieldBuilder {
    /// Value used when no contribution applies. May reference other fields.
    pub fn default(mut self, default: impl Into<Expr>) -> Self {
        self.default = default.into();
        self
    }

    /// How contributions are folded into one value.
    pub fn combinator(mut self, combinator: Combinator) -> Self {
        self.combinator = combinator;
        self
    }

    /// Finish the field. Each call produces a distinct field.
    pub fn build(self) -> Field {
        Field(Arc::new(FieldInner {
            name: Arc::from(self.name),
            default: self.default,
            combinator: self.combinator,
        }))
    }
}
