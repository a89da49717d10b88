//! Lazy expression trees.
//!
//! An `Expr` is an immutable, cheaply clonable tree of nodes evaluated
//! against a [`Context`]. Trees are built by composing fields, scalars
//! and other expressions with the arithmetic operators (`+ - * /` and
//! unary `-`), the floor/cap combinators [`min`] and [`max`], and the
//! comparison methods that yield a [`Predicate`].
//!
//! ```rust
//! use statprofile::{Field, Profile, Value};
//!
//! let base = Field::new("base");
//! let bonus = Field::new("bonus");
//! let total = 2.0 * &base + &bonus;
//!
//! let profile = Profile::builder()
//!     .insert(&base, 10)
//!     .insert(&bonus, 5)
//!     .build();
//! assert_eq!(total.evaluate(&profile).unwrap(), Value::Number(25.0));
//! assert_eq!(total.to_string(), "((2 * <base>) + <bonus>)");
//! ```

use crate::context::Context;
use crate::error::ProfileError;
use crate::field::Field;
use crate::predicate::Predicate;
use crate::value::{ArithOp, CompareOp, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::sync::Arc;

type ComputeFn = dyn Fn(&dyn Context) -> Result<Value, ProfileError> + Send + Sync;

/// Result of resolving a possibly guarded expression.
///
/// `Unmet` means a guard did not hold under the context. It is filtered
/// out before a field's contributions are combined and is never a value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    /// The expression produced a value.
    Resolved(Value),
    /// A guard on the expression was not met.
    Unmet,
}

impl Outcome {
    /// The resolved value, if any.
    pub fn value(self) -> Option<Value> {
        match self {
            Outcome::Resolved(v) => Some(v),
            Outcome::Unmet => None,
        }
    }

    /// Whether a guard rejected this contribution.
    pub fn is_unmet(self) -> bool {
        matches!(self, Outcome::Unmet)
    }
}

/// A node of an expression tree.
pub enum ExprNode {
    /// A constant.
    Literal(Value),
    /// The value of a field in the evaluation context.
    Field(Field),
    /// Arithmetic negation.
    Neg(Expr),
    /// A binary arithmetic, floor or cap operation.
    Binary { op: ArithOp, lhs: Expr, rhs: Expr },
    /// `inner` when `predicate` holds, otherwise unmet.
    Guard { predicate: Predicate, inner: Expr },
    /// `field` read with other fields temporarily overridden.
    Scoped {
        field: Field,
        overrides: Vec<(Field, Expr)>,
    },
    /// An opaque computation over the context.
    Computed { name: Arc<str>, compute: Arc<ComputeFn> },
}

/// A lazily evaluated computation over a context.
///
/// Cloning an `Expr` shares the tree; operands are held by reference.
#[derive(Clone)]
pub struct Expr(Arc<ExprNode>);

impl Expr {
    fn from_node(node: ExprNode) -> Self {
        Self(Arc::new(node))
    }

    /// A constant expression.
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::from_node(ExprNode::Literal(value.into()))
    }

    /// Wrap a primitive computation.
    ///
    /// The name only shows up in displays. The computation must be pure;
    /// it may read fields through the context it is handed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use statprofile::{Context, Expr, Field, Profile, Value};
    ///
    /// let level = Field::new("level");
    /// let lvl = level.clone();
    /// let squared = Expr::from_fn("level^2", move |ctx: &dyn Context| {
    ///     let n = ctx.lookup(&lvl)?.expect_number("level^2")?;
    ///     Ok(Value::Number(n * n))
    /// });
    ///
    /// let profile = Profile::builder().insert(&level, 7).build();
    /// assert_eq!(squared.evaluate(&profile).unwrap(), Value::Number(49.0));
    /// ```
    pub fn from_fn<F>(name: impl Into<String>, compute: F) -> Self
    where
        F: Fn(&dyn Context) -> Result<Value, ProfileError> + Send + Sync + 'static,
    {
        let name: String = name.into();
        Self::from_node(ExprNode::Computed {
            name: Arc::from(name),
            compute: Arc::new(compute),
        })
    }

    pub(crate) fn binary(op: ArithOp, lhs: Expr, rhs: Expr) -> Self {
        Self::from_node(ExprNode::Binary { op, lhs, rhs })
    }

    pub(crate) fn guard(predicate: Predicate, inner: Expr) -> Self {
        Self::from_node(ExprNode::Guard { predicate, inner })
    }

    pub(crate) fn scoped(field: Field, overrides: Vec<(Field, Expr)>) -> Self {
        Self::from_node(ExprNode::Scoped { field, overrides })
    }

    /// The root node of this tree.
    pub fn node(&self) -> &ExprNode {
        &self.0
    }

    /// Resolve the expression, keeping unmet guards distinguishable.
    pub fn resolve(&self, ctx: &dyn Context) -> Result<Outcome, ProfileError> {
        match self.node() {
            ExprNode::Guard { predicate, inner } => {
                if predicate.check(ctx)? {
                    inner.resolve(ctx)
                } else {
                    Ok(Outcome::Unmet)
                }
            }
            _ => self.evaluate(ctx).map(Outcome::Resolved),
        }
    }

    /// Evaluate the expression to a value.
    ///
    /// An unmet guard reached here is an error: the guard sits somewhere
    /// a plain value is required.
    pub fn evaluate(&self, ctx: &dyn Context) -> Result<Value, ProfileError> {
        match self.node() {
            ExprNode::Literal(value) => Ok(*value),
            ExprNode::Field(field) => ctx.lookup(field),
            ExprNode::Neg(inner) => {
                let n = inner.evaluate(ctx)?.expect_number("-")?;
                Ok(Value::Number(-n))
            }
            ExprNode::Binary { op, lhs, rhs } => {
                let a = lhs.evaluate(ctx)?;
                let b = rhs.evaluate(ctx)?;
                op.apply(a, b)
            }
            ExprNode::Guard { .. } => match self.resolve(ctx)? {
                Outcome::Resolved(value) => Ok(value),
                Outcome::Unmet => Err(ProfileError::UnmetOperand(self.to_string())),
            },
            ExprNode::Scoped { field, overrides } => ctx.lookup_scoped(field, overrides),
            ExprNode::Computed { compute, .. } => compute(ctx),
        }
    }

    /// Floor-combine: the smaller of the two operands.
    pub fn min(&self, other: impl Into<Expr>) -> Expr {
        Expr::binary(ArithOp::Min, self.clone(), other.into())
    }

    /// Cap-combine: the larger of the two operands.
    pub fn max(&self, other: impl Into<Expr>) -> Expr {
        Expr::binary(ArithOp::Max, self.clone(), other.into())
    }

    /// Keep the value between `low` and `high`.
    pub fn clamp(&self, low: impl Into<Expr>, high: impl Into<Expr>) -> Expr {
        self.max(low).min(high)
    }

    /// `self == other`
    pub fn equals(&self, other: impl Into<Expr>) -> Predicate {
        Predicate::compare(CompareOp::Eq, self.clone(), other.into())
    }

    /// `self > other`
    pub fn gt(&self, other: impl Into<Expr>) -> Predicate {
        Predicate::compare(CompareOp::Gt, self.clone(), other.into())
    }

    /// `self >= other`
    pub fn ge(&self, other: impl Into<Expr>) -> Predicate {
        Predicate::compare(CompareOp::Ge, self.clone(), other.into())
    }

    /// `self < other`
    pub fn lt(&self, other: impl Into<Expr>) -> Predicate {
        Predicate::compare(CompareOp::Lt, self.clone(), other.into())
    }

    /// `self <= other`
    pub fn le(&self, other: impl Into<Expr>) -> Predicate {
        Predicate::compare(CompareOp::Le, self.clone(), other.into())
    }

    /// Every field this tree reads directly, in first-seen order.
    ///
    /// Opaque computations are not inspected.
    pub fn referenced_fields(&self) -> Vec<Field> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    pub(crate) fn collect_fields(&self, out: &mut Vec<Field>) {
        match self.node() {
            ExprNode::Literal(_) | ExprNode::Computed { .. } => {}
            ExprNode::Field(field) => push_unique(out, field),
            ExprNode::Neg(inner) => inner.collect_fields(out),
            ExprNode::Binary { lhs, rhs, .. } => {
                lhs.collect_fields(out);
                rhs.collect_fields(out);
            }
            ExprNode::Guard { predicate, inner } => {
                predicate.collect_fields(out);
                inner.collect_fields(out);
            }
            ExprNode::Scoped { field, overrides } => {
                push_unique(out, field);
                for (_, value) in overrides {
                    value.collect_fields(out);
                }
            }
        }
    }
}

pub(crate) fn push_unique(out: &mut Vec<Field>, field: &Field) {
    if !out.contains(field) {
        out.push(field.clone());
    }
}

/// Floor-combine two operands, either of which may be a scalar.
///
/// ```rust
/// use statprofile::{min, Field, Profile, Value};
///
/// let rate = Field::new("rate");
/// let capped = min(1.0, &rate);
/// let profile = Profile::builder().insert(&rate, 1.4).build();
/// assert_eq!(capped.evaluate(&profile).unwrap(), Value::Number(1.0));
/// ```
pub fn min(lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Expr {
    Expr::binary(ArithOp::Min, lhs.into(), rhs.into())
}

/// Cap-combine two operands, either of which may be a scalar.
pub fn max(lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Expr {
    Expr::binary(ArithOp::Max, lhs.into(), rhs.into())
}

impl From<Value> for Expr {
    fn from(value: Value) -> Self {
        Expr::literal(value)
    }
}

impl From<f64> for Expr {
    fn from(n: f64) -> Self {
        Expr::literal(n)
    }
}

impl From<i32> for Expr {
    fn from(n: i32) -> Self {
        Expr::literal(n)
    }
}

impl From<bool> for Expr {
    fn from(b: bool) -> Self {
        Expr::literal(b)
    }
}

impl From<Field> for Expr {
    fn from(field: Field) -> Self {
        Expr::from_node(ExprNode::Field(field))
    }
}

impl From<&Field> for Expr {
    fn from(field: &Field) -> Self {
        Expr::from(field.clone())
    }
}

impl From<&Expr> for Expr {
    fn from(expr: &Expr) -> Self {
        expr.clone()
    }
}

macro_rules! scalar_lhs_ops {
    ($trait:ident, $method:ident, $op:ident, $($scalar:ty),*) => {$(
        impl $trait<Expr> for $scalar {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                Expr::binary(ArithOp::$op, Expr::from(self), rhs)
            }
        }

        impl $trait<&Expr> for $scalar {
            type Output = Expr;
            fn $method(self, rhs: &Expr) -> Expr {
                Expr::binary(ArithOp::$op, Expr::from(self), rhs.clone())
            }
        }

        impl $trait<Field> for $scalar {
            type Output = Expr;
            fn $method(self, rhs: Field) -> Expr {
                Expr::binary(ArithOp::$op, Expr::from(self), Expr::from(rhs))
            }
        }

        impl $trait<&Field> for $scalar {
            type Output = Expr;
            fn $method(self, rhs: &Field) -> Expr {
                Expr::binary(ArithOp::$op, Expr::from(self), Expr::from(rhs))
            }
        }
    )*};
}

macro_rules! arith_ops {
    ($($trait:ident, $method:ident, $op:ident);* $(;)?) => {$(
        impl<R: Into<Expr>> $trait<R> for Expr {
            type Output = Expr;
            fn $method(self, rhs: R) -> Expr {
                Expr::binary(ArithOp::$op, self, rhs.into())
            }
        }

        impl<R: Into<Expr>> $trait<R> for &Expr {
            type Output = Expr;
            fn $method(self, rhs: R) -> Expr {
                Expr::binary(ArithOp::$op, self.clone(), rhs.into())
            }
        }

        impl<R: Into<Expr>> $trait<R> for Field {
            type Output = Expr;
            fn $method(self, rhs: R) -> Expr {
                Expr::binary(ArithOp::$op, Expr::from(self), rhs.into())
            }
        }

        impl<R: Into<Expr>> $trait<R> for &Field {
            type Output = Expr;
            fn $method(self, rhs: R) -> Expr {
                Expr::binary(ArithOp::$op, Expr::from(self), rhs.into())
            }
        }

        scalar_lhs_ops!($trait, $method, $op, f64, i32);
    )*};
}

arith_ops! {
    Add, add, Add;
    Sub, sub, Sub;
    Mul, mul, Mul;
    Div, div, Div;
}

impl Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::from_node(ExprNode::Neg(self))
    }
}

impl Neg for &Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        -self.clone()
    }
}

impl Neg for Field {
    type Output = Expr;
    fn neg(self) -> Expr {
        -Expr::from(self)
    }
}

impl Neg for &Field {
    type Output = Expr;
    fn neg(self) -> Expr {
        -Expr::from(self)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node() {
            ExprNode::Literal(value) => write!(f, "{}", value),
            ExprNode::Field(field) => write!(f, "{}", field),
            ExprNode::Neg(inner) => write!(f, "-{}", inner),
            ExprNode::Binary { op, lhs, rhs } => match op {
                ArithOp::Min | ArithOp::Max => write!(f, "{}({}, {})", op.symbol(), lhs, rhs),
                _ => write!(f, "({} {} {})", lhs, op.symbol(), rhs),
            },
            ExprNode::Guard { predicate, inner } => write!(f, "{} if {}", inner, predicate),
            ExprNode::Scoped { field, overrides } => {
                write!(f, "{}[", field)?;
                for (i, (other, value)) in overrides.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}={}", other, value)?;
                }
                write!(f, "]")
            }
            ExprNode::Computed { name, .. } => write!(f, "{{{}}}", name),
        }
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Expr({})", self)
    }
}
