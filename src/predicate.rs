//! Boolean conditions over a context.
//!
//! Predicates come out of the comparison methods on [`Expr`] and
//! [`Field`] and compose with `&`, `|` and `!`. They are used to guard
//! field contributions (see [`Field::when`]).

use crate::context::Context;
use crate::error::ProfileError;
use crate::expr::Expr;
use crate::field::Field;
use crate::value::CompareOp;
use std::fmt;
use std::ops::{BitAnd, BitOr, Not};
use std::sync::Arc;

/// A node of a predicate tree.
pub enum PredicateNode {
    /// Comparison between two expressions.
    Compare { op: CompareOp, lhs: Expr, rhs: Expr },
    /// Both sides hold.
    And(Predicate, Predicate),
    /// At least one side holds.
    Or(Predicate, Predicate),
    /// The inner predicate does not hold.
    Not(Predicate),
}

/// A lazily evaluated boolean over a context.
///
/// # Examples
///
/// ```rust
/// use statprofile::{Field, Profile};
///
/// let hp = Field::new("hp_ratio");
/// let low_hp = hp.lt(0.5);
/// let full_hp = hp.ge(1.0);
///
/// let profile = Profile::builder().insert(&hp, 0.3).build();
/// assert!(low_hp.check(&profile).unwrap());
/// assert!(!(low_hp & full_hp).check(&profile).unwrap());
/// ```
#[derive(Clone)]
pub struct Predicate(Arc<PredicateNode>);

impl Predicate {
    fn from_node(node: PredicateNode) -> Self {
        Self(Arc::new(node))
    }

    pub(crate) fn compare(op: CompareOp, lhs: Expr, rhs: Expr) -> Self {
        Self::from_node(PredicateNode::Compare { op, lhs, rhs })
    }

    /// The root node of this tree.
    pub fn node(&self) -> &PredicateNode {
        &self.0
    }

    /// Evaluate the predicate.
    ///
    /// Both sides of `and`/`or` are evaluated, so an operand error is
    /// reported no matter what the other side resolves to.
    pub fn check(&self, ctx: &dyn Context) -> Result<bool, ProfileError> {
        match self.node() {
            PredicateNode::Compare { op, lhs, rhs } => {
                let a = lhs.evaluate(ctx)?;
                let b = rhs.evaluate(ctx)?;
                op.apply(a, b)
            }
            PredicateNode::And(a, b) => {
                let left = a.check(ctx)?;
                let right = b.check(ctx)?;
                Ok(left && right)
            }
            PredicateNode::Or(a, b) => {
                let left = a.check(ctx)?;
                let right = b.check(ctx)?;
                Ok(left || right)
            }
            PredicateNode::Not(inner) => Ok(!inner.check(ctx)?),
        }
    }

    /// Both `self` and `other` hold.
    pub fn and(&self, other: &Predicate) -> Predicate {
        Self::from_node(PredicateNode::And(self.clone(), other.clone()))
    }

    /// Either `self` or `other` holds.
    pub fn or(&self, other: &Predicate) -> Predicate {
        Self::from_node(PredicateNode::Or(self.clone(), other.clone()))
    }

    /// `self` does not hold.
    pub fn negate(&self) -> Predicate {
        Self::from_node(PredicateNode::Not(self.clone()))
    }

    pub(crate) fn collect_fields(&self, out: &mut Vec<Field>) {
        match self.node() {
            PredicateNode::Compare { lhs, rhs, .. } => {
                lhs.collect_fields(out);
                rhs.collect_fields(out);
            }
            PredicateNode::And(a, b) | PredicateNode::Or(a, b) => {
                a.collect_fields(out);
                b.collect_fields(out);
            }
            PredicateNode::Not(inner) => inner.collect_fields(out),
        }
    }
}

impl BitAnd for Predicate {
    type Output = Predicate;
    fn bitand(self, rhs: Predicate) -> Predicate {
        self.and(&rhs)
    }
}

impl BitAnd for &Predicate {
    type Output = Predicate;
    fn bitand(self, rhs: &Predicate) -> Predicate {
        self.and(rhs)
    }
}

impl BitOr for Predicate {
    type Output = Predicate;
    fn bitor(self, rhs: Predicate) -> Predicate {
        self.or(&rhs)
    }
}

impl BitOr for &Predicate {
    type Output = Predicate;
    fn bitor(self, rhs: &Predicate) -> Predicate {
        self.or(rhs)
    }
}

impl Not for Predicate {
    type Output = Predicate;
    fn not(self) -> Predicate {
        self.negate()
    }
}

impl Not for &Predicate {
    type Output = Predicate;
    fn not(self) -> Predicate {
        self.negate()
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node() {
            PredicateNode::Compare { op, lhs, rhs } => {
                write!(f, "({} {} {})", lhs, op.symbol(), rhs)
            }
            PredicateNode::And(a, b) => write!(f, "({} and {})", a, b),
            PredicateNode::Or(a, b) => write!(f, "({} or {})", a, b),
            PredicateNode::Not(inner) => write!(f, "not {}", inner),
        }
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Predicate({})", self)
    }
}
