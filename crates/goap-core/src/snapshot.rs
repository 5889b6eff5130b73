use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{ActionError, EvalError};
use crate::property::{Operator, Property};
use crate::value::TypedValue;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
struct Entry {
    value: TypedValue,
    planning_value: f32,
}

/// Immutable, owned copy of world state keyed by variable name.
///
/// Planning runs against snapshots so that live blackboard writes cannot disturb a search in
/// flight. Transformations return new snapshots.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Snapshot {
    entries: BTreeMap<String, Entry>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style copy with `name` set to `value`.
    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<TypedValue>) -> Self {
        let name = name.into();
        let planning_value = self.planning_value(&name);
        self.insert(name, value.into(), planning_value);
        self
    }

    pub fn with_planning_value(mut self, name: &str, planning_value: f32) -> Self {
        if let Some(entry) = self.entries.get_mut(name) {
            entry.planning_value = planning_value;
        }
        self
    }

    pub(crate) fn insert(&mut self, name: String, value: TypedValue, planning_value: f32) {
        self.entries.insert(
            name,
            Entry {
                value,
                planning_value,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&TypedValue> {
        self.entries.get(name).map(|entry| &entry.value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Planning value of `name`, zero for unknown variables.
    pub fn planning_value(&self, name: &str) -> f32 {
        self.entries
            .get(name)
            .map(|entry| entry.planning_value)
            .unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TypedValue)> {
        self.entries
            .iter()
            .map(|(name, entry)| (name.as_str(), &entry.value))
    }

    /// Condition holds in this state. Unknown keys are unsatisfied.
    pub fn holds(&self, condition: &Property) -> bool {
        self.get(condition.key())
            .is_some_and(|value| condition.evaluate(value))
    }

    pub fn check(&self, condition: &Property) -> Result<bool, EvalError> {
        condition.check(self.get(condition.key()))
    }

    pub fn satisfies(&self, conditions: &[Property]) -> bool {
        conditions.iter().all(|condition| self.holds(condition))
    }

    /// Conditions from `conditions` that do not hold here, in order.
    pub fn unsatisfied<'a>(
        &'a self,
        conditions: &'a [Property],
    ) -> impl Iterator<Item = &'a Property> + 'a {
        conditions.iter().filter(move |condition| !self.holds(condition))
    }

    /// New state with `effects` applied in declaration order; later effects on a key win.
    ///
    /// Assigning to a missing key creates it. A delta on a missing key fails.
    pub fn apply_effects(&self, effects: &[Property]) -> Result<Snapshot, ActionError> {
        let mut next = self.clone();
        for effect in effects {
            next.apply_effect(effect)?;
        }
        Ok(next)
    }

    fn apply_effect(&mut self, effect: &Property) -> Result<(), ActionError> {
        let key = effect.key();
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.value = effect.apply(&entry.value).map_err(|source| ActionError::Value {
                    key: key.to_string(),
                    source,
                })?;
            }
            None if effect.operator() == Operator::Assign => {
                self.insert(key.to_string(), effect.value().clone(), 0.0);
            }
            None => return Err(ActionError::UnknownVariable(key.to_string())),
        }
        Ok(())
    }
}

impl<K, V> FromIterator<(K, V)> for Snapshot
where
    K: Into<String>,
    V: Into<TypedValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Snapshot::new(), |snapshot, (name, value)| {
                snapshot.with_value(name, value)
            })
    }
}
