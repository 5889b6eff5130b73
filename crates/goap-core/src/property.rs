use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{EvalError, PropertyError, ValueError};
use crate::value::TypedValue;

/// Comparison (passive) and assignment/delta (active) operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Operator {
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
    Equal,
    NotEqual,
    Assign,
    Add,
    Subtract,
}

impl Operator {
    pub const ALL: [Operator; 9] = [
        Operator::Greater,
        Operator::GreaterOrEqual,
        Operator::Less,
        Operator::LessOrEqual,
        Operator::Equal,
        Operator::NotEqual,
        Operator::Assign,
        Operator::Add,
        Operator::Subtract,
    ];

    pub fn is_passive(self) -> bool {
        !self.is_active()
    }

    pub fn is_active(self) -> bool {
        matches!(self, Operator::Assign | Operator::Add | Operator::Subtract)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Greater => ">",
            Operator::GreaterOrEqual => ">=",
            Operator::Less => "<",
            Operator::LessOrEqual => "<=",
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::Assign => "=",
            Operator::Add => "+=",
            Operator::Subtract => "-=",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Operator {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operator::ALL
            .into_iter()
            .find(|op| op.symbol() == s)
            .ok_or_else(|| ValueError::UnknownOperator(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PropertyMode {
    Condition,
    Effect,
}

impl fmt::Display for PropertyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyMode::Condition => f.write_str("condition"),
            PropertyMode::Effect => f.write_str("effect"),
        }
    }
}

/// A single named condition (`key op value` comparison) or effect (`key op value` mutation).
///
/// The operator is validated against the value kind and mode when the property is built, so a
/// constructed `Property` never carries an invalid combination.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "PropertyRepr", into = "PropertyRepr"))]
pub struct Property {
    key: String,
    value: TypedValue,
    operator: Operator,
    mode: PropertyMode,
}

impl Property {
    pub fn new(
        key: impl Into<String>,
        operator: Operator,
        value: impl Into<TypedValue>,
        mode: PropertyMode,
    ) -> Result<Self, PropertyError> {
        let key = key.into();
        let value = value.into();
        if key.is_empty() {
            return Err(PropertyError::EmptyKey);
        }

        let mode_ok = match mode {
            PropertyMode::Condition => operator.is_passive(),
            PropertyMode::Effect => operator.is_active(),
        };
        if !mode_ok || !value.kind().supports(operator) {
            return Err(PropertyError::InvalidOperator {
                kind: value.kind(),
                op: operator,
                mode,
            });
        }

        Ok(Self {
            key,
            value,
            operator,
            mode,
        })
    }

    pub fn condition(
        key: impl Into<String>,
        operator: Operator,
        value: impl Into<TypedValue>,
    ) -> Result<Self, PropertyError> {
        Self::new(key, operator, value, PropertyMode::Condition)
    }

    pub fn effect(
        key: impl Into<String>,
        operator: Operator,
        value: impl Into<TypedValue>,
    ) -> Result<Self, PropertyError> {
        Self::new(key, operator, value, PropertyMode::Effect)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &TypedValue {
        &self.value
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn mode(&self) -> PropertyMode {
        self.mode
    }

    pub fn is_condition(&self) -> bool {
        self.mode == PropertyMode::Condition
    }

    pub fn is_effect(&self) -> bool {
        self.mode == PropertyMode::Effect
    }

    /// Copy with a different value; revalidated against the operator.
    pub fn with_value(&self, value: impl Into<TypedValue>) -> Result<Self, PropertyError> {
        Self::new(self.key.clone(), self.operator, value, self.mode)
    }

    /// Copy with a different operator; revalidated against the value kind and mode.
    pub fn with_operator(&self, operator: Operator) -> Result<Self, PropertyError> {
        Self::new(self.key.clone(), operator, self.value.clone(), self.mode)
    }

    /// `actual <op> value` for a condition. False on kind mismatch or for effects; never panics.
    pub fn evaluate(&self, actual: &TypedValue) -> bool {
        if !self.is_condition() {
            return false;
        }
        actual.compare(self.operator, &self.value).unwrap_or(false)
    }

    /// Like [`Property::evaluate`], but reports why a condition could not be checked.
    pub fn check(&self, actual: Option<&TypedValue>) -> Result<bool, EvalError> {
        let Some(actual) = actual else {
            return Err(EvalError::UnknownVariable(self.key.clone()));
        };
        if actual.kind() != self.value.kind() {
            return Err(EvalError::KindMismatch {
                key: self.key.clone(),
                expected: self.value.kind(),
                found: actual.kind(),
            });
        }
        Ok(self.evaluate(actual))
    }

    /// Apply this effect to `target`, returning the new value.
    pub fn apply(&self, target: &TypedValue) -> Result<TypedValue, ValueError> {
        if target.kind() != self.value.kind() {
            return Err(ValueError::KindMismatch {
                expected: self.value.kind(),
                found: target.kind(),
            });
        }
        match self.operator {
            Operator::Assign => Ok(self.value.clone()),
            Operator::Add => target.checked_add(&self.value),
            Operator::Subtract => target.checked_sub(&self.value),
            op => Err(ValueError::UnsupportedOperator {
                kind: self.value.kind(),
                op,
            }),
        }
    }

    /// Deterministic ordering: key, mode, operator, then value by [`TypedValue::total_cmp`].
    pub fn canonical_cmp(&self, other: &Property) -> core::cmp::Ordering {
        self.key
            .cmp(&other.key)
            .then(self.mode.cmp(&other.mode))
            .then(self.operator.cmp(&other.operator))
            .then_with(|| self.value.total_cmp(&other.value))
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.key, self.operator, self.value)
    }
}

#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
struct PropertyRepr {
    key: String,
    operator: Operator,
    value: TypedValue,
    mode: PropertyMode,
}

#[cfg(feature = "serde")]
impl TryFrom<PropertyRepr> for Property {
    type Error = PropertyError;

    fn try_from(repr: PropertyRepr) -> Result<Self, Self::Error> {
        Property::new(repr.key, repr.operator, repr.value, repr.mode)
    }
}

#[cfg(feature = "serde")]
impl From<Property> for PropertyRepr {
    fn from(property: Property) -> Self {
        Self {
            key: property.key,
            operator: property.operator,
            value: property.value,
            mode: property.mode,
        }
    }
}
