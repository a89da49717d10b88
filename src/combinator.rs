//! Field combination policies.
//!
//! A combinator reduces the ordered list of resolved contributions for
//! a field to a single value. Profiles only invoke a combinator with a
//! non-empty list: when nothing applies, the field's default is used.

use crate::error::ProfileError;
use crate::value::{ArithOp, Value};
use std::fmt;
use std::sync::Arc;

type CombineFn = dyn Fn(&[Value]) -> Result<Value, ProfileError> + Send + Sync;

/// How a field folds its contributions into one value.
///
/// # Examples
///
/// ```rust
/// use statprofile::{Combinator, Value};
///
/// let values = [Value::from(2), Value::from(3), Value::from(5)];
/// assert_eq!(Combinator::Sum.combine(&values).unwrap(), Value::Number(10.0));
/// assert_eq!(Combinator::Last.combine(&values).unwrap(), Value::Number(5.0));
/// ```
#[derive(Clone, Default)]
pub enum Combinator {
    /// Arithmetic sum of every contribution.
    #[default]
    Sum,
    /// Only the last contribution counts (last write wins).
    Last,
    /// Only the first contribution counts.
    First,
    /// Arithmetic product of every contribution.
    Product,
    /// Largest contribution.
    Max,
    /// Smallest contribution.
    Min,
    /// Caller-supplied reduction.
    Custom { name: Arc<str>, combine: Arc<CombineFn> },
}

impl Combinator {
    /// Wrap a reduction function as a combinator.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use statprofile::{Combinator, ProfileError, Value};
    ///
    /// let count = Combinator::custom("count", |values: &[Value]| {
    ///     Ok::<_, ProfileError>(Value::Number(values.len() as f64))
    /// });
    /// let values = [Value::from(7), Value::from(7)];
    /// assert_eq!(count.combine(&values).unwrap(), Value::Number(2.0));
    /// ```
    pub fn custom<F>(name: impl Into<String>, combine: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, ProfileError> + Send + Sync + 'static,
    {
        let name: String = name.into();
        Combinator::Custom {
            name: Arc::from(name),
            combine: Arc::new(combine),
        }
    }

    /// Short name for displays and breakdowns.
    pub fn name(&self) -> &str {
        match self {
            Combinator::Sum => "sum",
            Combinator::Last => "last",
            Combinator::First => "first",
            Combinator::Product => "product",
            Combinator::Max => "max",
            Combinator::Min => "min",
            Combinator::Custom { name, .. } => name.as_ref(),
        }
    }

    /// Reduce `values` to one value.
    ///
    /// `Sum` and `Product` fold from the first value; an empty list
    /// yields their identity, 0 or 1. A single value of any kind is
    /// returned as is. The picking combinators reject an empty list.
    pub fn combine(&self, values: &[Value]) -> Result<Value, ProfileError> {
        match self {
            Combinator::Sum => reduce(ArithOp::Add, Value::Number(0.0), values),
            Combinator::Product => reduce(ArithOp::Mul, Value::Number(1.0), values),
            Combinator::Last => values.last().copied().ok_or_else(|| self.empty()),
            Combinator::First => values.first().copied().ok_or_else(|| self.empty()),
            Combinator::Max | Combinator::Min => {
                let op = if matches!(self, Combinator::Max) {
                    ArithOp::Max
                } else {
                    ArithOp::Min
                };
                let (first, rest) = values.split_first().ok_or_else(|| self.empty())?;
                first.expect_number(op.symbol())?;
                fold(op, *first, rest)
            }
            Combinator::Custom { combine, .. } => combine(values),
        }
    }

    fn empty(&self) -> ProfileError {
        ProfileError::combinator(self.name(), "no contributions to combine")
    }
}

/// Fold from the first value, so a lone value passes through unchanged.
/// `identity` is only used for an empty list.
fn reduce(op: ArithOp, identity: Value, values: &[Value]) -> Result<Value, ProfileError> {
    match values.split_first() {
        Some((first, rest)) => fold(op, *first, rest),
        None => Ok(identity),
    }
}

fn fold(op: ArithOp, init: Value, values: &[Value]) -> Result<Value, ProfileError> {
    values
        .iter()
        .try_fold(init, |acc, value| op.apply(acc, *value))
}

impl fmt::Debug for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Combinator::Custom { name, .. } => write!(f, "Custom(<{}>)", name),
            other => write!(f, "{}", other.name()),
        }
    }
}
