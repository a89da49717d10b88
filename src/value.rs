//! Value types and the operators defined over them.
//!
//! Expressions resolve to a `Value`. Arithmetic is only defined on
//! numbers, ordering only on numbers, equality on two values of the
//! same kind. Anything else is a `ProfileError::Type` raised at the
//! operator that received the bad operand.

use crate::error::ProfileError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A resolved value.
///
/// # Examples
///
/// ```rust
/// use statprofile::Value;
///
/// let v: Value = 1.5.into();
/// assert_eq!(v.as_number(), Some(1.5));
/// assert_eq!(Value::from(true).as_number(), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// A numeric quantity.
    Number(f64),
    /// A flag, usually produced by formulas that pick between branches.
    Bool(bool),
}

impl Value {
    /// The numeric payload, if this is a number.
    pub fn as_number(self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(n),
            Value::Bool(_) => None,
        }
    }

    /// The boolean payload, if this is a flag.
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(b),
            Value::Number(_) => None,
        }
    }

    /// Name of the value kind, used in error messages.
    pub fn kind(self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Bool(_) => "bool",
        }
    }

    /// The numeric payload, or a type error attributed to `op`.
    pub fn expect_number(self, op: &'static str) -> Result<f64, ProfileError> {
        self.as_number().ok_or_else(|| {
            ProfileError::type_error(op, format!("expected a number, found {}", self))
        })
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Number(0.0)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// Binary operators that produce a value.
///
/// `Min` and `Max` are the floor-combine and cap-combine operators used
/// to clamp a derived value between bounds built from other values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Min,
    Max,
}

impl ArithOp {
    /// Operator symbol used in displays and errors.
    pub fn symbol(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
            ArithOp::Min => "min",
            ArithOp::Max => "max",
        }
    }

    /// Apply the operator to two resolved operands.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use statprofile::value::{ArithOp, Value};
    ///
    /// let v = ArithOp::Sub.apply(Value::from(10), Value::from(4)).unwrap();
    /// assert_eq!(v, Value::Number(6.0));
    ///
    /// assert!(ArithOp::Add.apply(Value::from(1), Value::from(true)).is_err());
    /// ```
    pub fn apply(self, lhs: Value, rhs: Value) -> Result<Value, ProfileError> {
        let op = self.symbol();
        let (a, b) = match (lhs, rhs) {
            (Value::Number(a), Value::Number(b)) => (a, b),
            _ => {
                return Err(ProfileError::type_error(
                    op,
                    format!("unsupported operands {} and {}", lhs.kind(), rhs.kind()),
                ))
            }
        };
        let result = match self {
            ArithOp::Add => a + b,
            ArithOp::Sub => a - b,
            ArithOp::Mul => a * b,
            ArithOp::Div => {
                if b == 0.0 {
                    return Err(ProfileError::DivisionByZero(format!("{} / {}", a, b)));
                }
                a / b
            }
            ArithOp::Min => a.min(b),
            ArithOp::Max => a.max(b),
        };
        Ok(Value::Number(result))
    }
}

/// Comparison operators that produce a boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CompareOp {
    /// Operator symbol used in displays and errors.
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
        }
    }

    /// Compare two resolved operands.
    ///
    /// Equality accepts two values of the same kind; ordering accepts
    /// numbers only.
    pub fn apply(self, lhs: Value, rhs: Value) -> Result<bool, ProfileError> {
        match (self, lhs, rhs) {
            (CompareOp::Eq, Value::Number(a), Value::Number(b)) => Ok(a == b),
            (CompareOp::Eq, Value::Bool(a), Value::Bool(b)) => Ok(a == b),
            (CompareOp::Gt, Value::Number(a), Value::Number(b)) => Ok(a > b),
            (CompareOp::Ge, Value::Number(a), Value::Number(b)) => Ok(a >= b),
            (CompareOp::Lt, Value::Number(a), Value::Number(b)) => Ok(a < b),
            (CompareOp::Le, Value::Number(a), Value::Number(b)) => Ok(a <= b),
            _ => Err(ProfileError::type_error(
                self.symbol(),
                format!("cannot compare {} with {}", lhs.kind(), rhs.kind()),
            )),
        }
    }
}
