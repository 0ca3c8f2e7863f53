// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Entity identifiers and relation values.
//!
//! Everything a planning domain stores in a [`State`](crate::State), passes as
//! a call argument, or names as a goal is a [`Value`]. Values are totally
//! ordered and hashable so they can key relation maps; floats go through
//! [`OrderedFloat`] to keep that property.

use std::fmt;
use std::sync::Arc;

use ordered_float::OrderedFloat;

use crate::multigoal::Multigoal;

/// A relation value or entity identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Value {
    /// Absence of a value.
    #[default]
    Nil,
    /// Boolean flag (e.g. `clear[b] = true`).
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Totally ordered float.
    Float(OrderedFloat<f64>),
    /// Interned string; the usual entity identifier.
    Str(Arc<str>),
    /// Ordered, growable collection.
    List(Vec<Value>),
    /// Fixed composite key such as a `(from, to)` pair.
    Tuple(Vec<Value>),
    /// A multigoal passed as a task argument.
    Multigoal(Arc<Multigoal>),
}

impl Value {
    /// Returns the string payload, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer payload, if any.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view: integers widen to `f64`.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(f.into_inner()),
            _ => None,
        }
    }

    /// Returns the boolean payload, if any.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the list payload, if any.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the multigoal payload, if any.
    pub fn as_multigoal(&self) -> Option<&Arc<Multigoal>> {
        match self {
            Self::Multigoal(goal) => Some(goal),
            _ => None,
        }
    }

    /// True for `Str` values equal to `text`.
    pub fn is(&self, text: &str) -> bool {
        self.as_str() == Some(text)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => f.write_str("nil"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{}", x.into_inner()),
            Self::Str(s) => f.write_str(s),
            Self::List(items) => {
                f.write_str("[")?;
                write_joined(f, items)?;
                f.write_str("]")
            }
            Self::Tuple(items) => {
                f.write_str("(")?;
                write_joined(f, items)?;
                f.write_str(")")
            }
            Self::Multigoal(goal) => write!(f, "<multigoal {}>", goal.name()),
        }
    }
}

pub(crate) fn write_joined<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(Arc::from(s))
    }
}

impl From<&Value> for Value {
    fn from(v: &Value) -> Self {
        v.clone()
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<usize> for Value {
    fn from(i: usize) -> Self {
        Self::Int(i64::try_from(i).unwrap_or(i64::MAX))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(OrderedFloat(x))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

impl From<Multigoal> for Value {
    fn from(goal: Multigoal) -> Self {
        Self::Multigoal(Arc::new(goal))
    }
}

impl From<Arc<Multigoal>> for Value {
    fn from(goal: Arc<Multigoal>) -> Self {
        Self::Multigoal(goal)
    }
}

impl<A, B> From<(A, B)> for Value
where
    A: Into<Value>,
    B: Into<Value>,
{
    fn from((a, b): (A, B)) -> Self {
        Self::Tuple(vec![a.into(), b.into()])
    }
}

/// Builds a `Vec<Value>` argument list, converting each element with
/// [`Value::from`].
///
/// ```
/// use htn_core::{args, Value};
///
/// let a = args!["a", 3, true];
/// assert_eq!(a, vec![Value::from("a"), Value::Int(3), Value::Bool(true)]);
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::Value::from($arg)),+]
    };
}
