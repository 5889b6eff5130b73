use core::cmp::Ordering;
use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ValueError;
use crate::property::Operator;

/// Smallest delta the planner treats as a change. Never used for equality.
pub const MIN_PROPERTY_DISTANCE: f32 = 0.00001;

/// Tag of a [`TypedValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    Char,
    String,
    Vector2,
    Vector3,
    Vector4,
}

impl ValueKind {
    pub const ALL: [ValueKind; 8] = [
        ValueKind::Bool,
        ValueKind::Int,
        ValueKind::Float,
        ValueKind::Char,
        ValueKind::String,
        ValueKind::Vector2,
        ValueKind::Vector3,
        ValueKind::Vector4,
    ];

    /// Comparison operators a condition on this kind may use.
    pub fn passive_operators(self) -> &'static [Operator] {
        use Operator::*;
        match self {
            ValueKind::Bool
            | ValueKind::Vector2
            | ValueKind::Vector3
            | ValueKind::Vector4 => &[Equal, NotEqual],
            ValueKind::Int | ValueKind::Float | ValueKind::Char | ValueKind::String => &[
                Equal,
                NotEqual,
                Less,
                LessOrEqual,
                Greater,
                GreaterOrEqual,
            ],
        }
    }

    /// Mutation operators an effect on this kind may use.
    pub fn active_operators(self) -> &'static [Operator] {
        use Operator::*;
        match self {
            ValueKind::Bool | ValueKind::String => &[Assign],
            ValueKind::Int
            | ValueKind::Float
            | ValueKind::Char
            | ValueKind::Vector2
            | ValueKind::Vector3
            | ValueKind::Vector4 => &[Add, Subtract, Assign],
        }
    }

    pub fn supports(self, op: Operator) -> bool {
        if op.is_passive() {
            self.passive_operators().contains(&op)
        } else {
            self.active_operators().contains(&op)
        }
    }

    pub fn default_value(self) -> TypedValue {
        match self {
            ValueKind::Bool => TypedValue::Bool(false),
            ValueKind::Int => TypedValue::Int(0),
            ValueKind::Float => TypedValue::Float(0.0),
            ValueKind::Char => TypedValue::Char('\0'),
            ValueKind::String => TypedValue::String(String::new()),
            ValueKind::Vector2 => TypedValue::Vector2([0.0; 2]),
            ValueKind::Vector3 => TypedValue::Vector3([0.0; 3]),
            ValueKind::Vector4 => TypedValue::Vector4([0.0; 4]),
        }
    }

    pub fn short_name(self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Char => "char",
            ValueKind::String => "string",
            ValueKind::Vector2 => "vector2",
            ValueKind::Vector3 => "vector3",
            ValueKind::Vector4 => "vector4",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for ValueKind {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ValueKind::ALL
            .into_iter()
            .find(|kind| kind.short_name() == s)
            .ok_or_else(|| ValueError::UnknownKind(s.to_string()))
    }
}

/// A world-state value. The variant is fixed for the lifetime of the value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", content = "value", rename_all = "snake_case"))]
pub enum TypedValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    Char(char),
    String(String),
    Vector2([f32; 2]),
    Vector3([f32; 3]),
    Vector4([f32; 4]),
}

impl TypedValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            TypedValue::Bool(_) => ValueKind::Bool,
            TypedValue::Int(_) => ValueKind::Int,
            TypedValue::Float(_) => ValueKind::Float,
            TypedValue::Char(_) => ValueKind::Char,
            TypedValue::String(_) => ValueKind::String,
            TypedValue::Vector2(_) => ValueKind::Vector2,
            TypedValue::Vector3(_) => ValueKind::Vector3,
            TypedValue::Vector4(_) => ValueKind::Vector4,
        }
    }

    /// Evaluate `self <op> other` for a passive operator.
    ///
    /// Returns an error (never panics) for mismatched kinds, active operators, or orderings the
    /// kind does not support.
    pub fn compare(&self, op: Operator, other: &TypedValue) -> Result<bool, ValueError> {
        self.ensure_same_kind(other)?;
        if !op.is_passive() || !self.kind().supports(op) {
            return Err(ValueError::UnsupportedOperator {
                kind: self.kind(),
                op,
            });
        }

        if op == Operator::Equal {
            return Ok(self == other);
        }
        if op == Operator::NotEqual {
            return Ok(self != other);
        }

        // NaN on either side: every ordering is false.
        let Some(ordering) = self.partial_order(other) else {
            return Ok(false);
        };
        Ok(match op {
            Operator::Less => ordering.is_lt(),
            Operator::LessOrEqual => ordering.is_le(),
            Operator::Greater => ordering.is_gt(),
            Operator::GreaterOrEqual => ordering.is_ge(),
            _ => false,
        })
    }

    fn partial_order(&self, other: &TypedValue) -> Option<Ordering> {
        match (self, other) {
            (TypedValue::Int(a), TypedValue::Int(b)) => Some(a.cmp(b)),
            (TypedValue::Float(a), TypedValue::Float(b)) => a.partial_cmp(b),
            (TypedValue::Char(a), TypedValue::Char(b)) => Some(a.cmp(b)),
            (TypedValue::String(a), TypedValue::String(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    pub fn checked_add(&self, delta: &TypedValue) -> Result<TypedValue, ValueError> {
        self.combine(delta, Sign::Plus)
    }

    pub fn checked_sub(&self, delta: &TypedValue) -> Result<TypedValue, ValueError> {
        self.combine(delta, Sign::Minus)
    }

    fn combine(&self, delta: &TypedValue, sign: Sign) -> Result<TypedValue, ValueError> {
        self.ensure_same_kind(delta)?;
        let op = match sign {
            Sign::Plus => Operator::Add,
            Sign::Minus => Operator::Subtract,
        };

        match (self, delta) {
            (TypedValue::Int(a), TypedValue::Int(b)) => {
                let out = match sign {
                    Sign::Plus => a.checked_add(*b),
                    Sign::Minus => a.checked_sub(*b),
                };
                out.map(TypedValue::Int).ok_or(ValueError::Overflow)
            }
            (TypedValue::Float(a), TypedValue::Float(b)) => Ok(TypedValue::Float(sign.apply(*a, *b))),
            (TypedValue::Char(a), TypedValue::Char(b)) => {
                let (a, b) = (*a as u32, *b as u32);
                let code = match sign {
                    Sign::Plus => a.checked_add(b),
                    Sign::Minus => a.checked_sub(b),
                };
                code.and_then(char::from_u32)
                    .map(TypedValue::Char)
                    .ok_or(ValueError::InvalidChar)
            }
            (TypedValue::Vector2(a), TypedValue::Vector2(b)) => Ok(TypedValue::Vector2(sign.zip(*a, *b))),
            (TypedValue::Vector3(a), TypedValue::Vector3(b)) => Ok(TypedValue::Vector3(sign.zip(*a, *b))),
            (TypedValue::Vector4(a), TypedValue::Vector4(b)) => Ok(TypedValue::Vector4(sign.zip(*a, *b))),
            _ => Err(ValueError::UnsupportedOperator {
                kind: self.kind(),
                op,
            }),
        }
    }

    /// Signed magnitude of a delta value, used to tell which way `+=`/`-=` moves an ordered kind.
    ///
    /// `None` for kinds without a scalar direction (bool, string, vectors).
    pub fn scalar_magnitude(&self) -> Option<f64> {
        match self {
            TypedValue::Int(v) => Some(f64::from(*v)),
            TypedValue::Float(v) => Some(f64::from(*v)),
            TypedValue::Char(c) => Some(f64::from(*c as u32)),
            _ => None,
        }
    }

    /// Deterministic total order over every value: kind first, then contents.
    ///
    /// Floats use `f32::total_cmp`. This is for canonical sorting, not for condition evaluation.
    pub fn total_cmp(&self, other: &TypedValue) -> Ordering {
        fn floats(a: &[f32], b: &[f32]) -> Ordering {
            a.iter()
                .zip(b)
                .map(|(x, y)| x.total_cmp(y))
                .find(|o| o.is_ne())
                .unwrap_or(Ordering::Equal)
        }

        match (self, other) {
            (TypedValue::Bool(a), TypedValue::Bool(b)) => a.cmp(b),
            (TypedValue::Int(a), TypedValue::Int(b)) => a.cmp(b),
            (TypedValue::Float(a), TypedValue::Float(b)) => a.total_cmp(b),
            (TypedValue::Char(a), TypedValue::Char(b)) => a.cmp(b),
            (TypedValue::String(a), TypedValue::String(b)) => a.cmp(b),
            (TypedValue::Vector2(a), TypedValue::Vector2(b)) => floats(a, b),
            (TypedValue::Vector3(a), TypedValue::Vector3(b)) => floats(a, b),
            (TypedValue::Vector4(a), TypedValue::Vector4(b)) => floats(a, b),
            _ => self.kind().cmp(&other.kind()),
        }
    }

    fn ensure_same_kind(&self, other: &TypedValue) -> Result<(), ValueError> {
        if self.kind() == other.kind() {
            Ok(())
        } else {
            Err(ValueError::KindMismatch {
                expected: self.kind(),
                found: other.kind(),
            })
        }
    }
}

#[derive(Clone, Copy)]
enum Sign {
    Plus,
    Minus,
}

impl Sign {
    fn apply(self, a: f32, b: f32) -> f32 {
        match self {
            Sign::Plus => a + b,
            Sign::Minus => a - b,
        }
    }

    fn zip<const N: usize>(self, a: [f32; N], b: [f32; N]) -> [f32; N] {
        let mut out = a;
        for (slot, delta) in out.iter_mut().zip(b) {
            *slot = self.apply(*slot, delta);
        }
        out
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::Bool(v) => write!(f, "{v}"),
            TypedValue::Int(v) => write!(f, "{v}"),
            TypedValue::Float(v) => write!(f, "{v}"),
            TypedValue::Char(v) => write!(f, "'{v}'"),
            TypedValue::String(v) => write!(f, "{v:?}"),
            TypedValue::Vector2([x, y]) => write!(f, "({x}, {y})"),
            TypedValue::Vector3([x, y, z]) => write!(f, "({x}, {y}, {z})"),
            TypedValue::Vector4([x, y, z, w]) => write!(f, "({x}, {y}, {z}, {w})"),
        }
    }
}

impl From<bool> for TypedValue {
    fn from(value: bool) -> Self {
        TypedValue::Bool(value)
    }
}

impl From<i32> for TypedValue {
    fn from(value: i32) -> Self {
        TypedValue::Int(value)
    }
}

impl From<f32> for TypedValue {
    fn from(value: f32) -> Self {
        TypedValue::Float(value)
    }
}

impl From<char> for TypedValue {
    fn from(value: char) -> Self {
        TypedValue::Char(value)
    }
}

impl From<&str> for TypedValue {
    fn from(value: &str) -> Self {
        TypedValue::String(value.to_string())
    }
}

impl From<String> for TypedValue {
    fn from(value: String) -> Self {
        TypedValue::String(value)
    }
}

impl From<[f32; 2]> for TypedValue {
    fn from(value: [f32; 2]) -> Self {
        TypedValue::Vector2(value)
    }
}

impl From<[f32; 3]> for TypedValue {
    fn from(value: [f32; 3]) -> Self {
        TypedValue::Vector3(value)
    }
}

impl From<[f32; 4]> for TypedValue {
    fn from(value: [f32; 4]) -> Self {
        TypedValue::Vector4(value)
    }
}
