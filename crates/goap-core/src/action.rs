#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ActionError;
use crate::property::{Property, PropertyMode};
use crate::snapshot::Snapshot;

/// Status reported by an executing action each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionStatus {
    Running,
    Success,
    Failure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Success,
    Failure,
}

impl From<ActionOutcome> for ActionStatus {
    fn from(value: ActionOutcome) -> Self {
        match value {
            ActionOutcome::Success => ActionStatus::Success,
            ActionOutcome::Failure => ActionStatus::Failure,
        }
    }
}

impl ActionStatus {
    pub fn outcome(self) -> Option<ActionOutcome> {
        match self {
            ActionStatus::Running => None,
            ActionStatus::Success => Some(ActionOutcome::Success),
            ActionStatus::Failure => Some(ActionOutcome::Failure),
        }
    }
}

/// Reusable capability: preconditions, effects, and a cost.
///
/// Conditions and effects keep insertion order. Condition keys are unique; effects may repeat a
/// key, in which case the later effect wins.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "ActionRepr", into = "ActionRepr"))]
pub struct Action {
    name: String,
    conditions: Vec<Property>,
    effects: Vec<Property>,
    cost: f32,
}

impl Action {
    pub fn new(name: impl Into<String>, cost: f32) -> Result<Self, ActionError> {
        validate_cost(cost)?;
        Ok(Self {
            name: name.into(),
            conditions: Vec::new(),
            effects: Vec::new(),
            cost,
        })
    }

    pub fn with_condition(mut self, condition: Property) -> Result<Self, ActionError> {
        self.add_condition(condition)?;
        Ok(self)
    }

    pub fn with_effect(mut self, effect: Property) -> Result<Self, ActionError> {
        self.add_effect(effect)?;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cost(&self) -> f32 {
        self.cost
    }

    pub fn set_cost(&mut self, cost: f32) -> Result<(), ActionError> {
        validate_cost(cost)?;
        self.cost = cost;
        Ok(())
    }

    pub fn conditions(&self) -> &[Property] {
        &self.conditions
    }

    pub fn effects(&self) -> &[Property] {
        &self.effects
    }

    pub fn add_condition(&mut self, condition: Property) -> Result<(), ActionError> {
        push_condition(&mut self.conditions, condition)
    }

    pub fn add_effect(&mut self, effect: Property) -> Result<(), ActionError> {
        push_effect(&mut self.effects, effect)
    }

    pub fn remove_condition(&mut self, key: &str) -> bool {
        remove_first(&mut self.conditions, key)
    }

    pub fn remove_effect(&mut self, key: &str) -> bool {
        remove_first(&mut self.effects, key)
    }

    /// Every condition holds in `state`. A condition on a missing key is unsatisfied.
    pub fn is_satisfied_by(&self, state: &Snapshot) -> bool {
        state.satisfies(&self.conditions)
    }

    pub fn apply_effects(&self, state: &Snapshot) -> Result<Snapshot, ActionError> {
        state.apply_effects(&self.effects)
    }
}

#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
struct ActionRepr {
    name: String,
    conditions: Vec<Property>,
    effects: Vec<Property>,
    cost: f32,
}

#[cfg(feature = "serde")]
impl TryFrom<ActionRepr> for Action {
    type Error = ActionError;

    fn try_from(repr: ActionRepr) -> Result<Self, Self::Error> {
        let mut action = Action::new(repr.name, repr.cost)?;
        for condition in repr.conditions {
            action.add_condition(condition)?;
        }
        for effect in repr.effects {
            action.add_effect(effect)?;
        }
        Ok(action)
    }
}

#[cfg(feature = "serde")]
impl From<Action> for ActionRepr {
    fn from(action: Action) -> Self {
        Self {
            name: action.name,
            conditions: action.conditions,
            effects: action.effects,
            cost: action.cost,
        }
    }
}

fn validate_cost(cost: f32) -> Result<(), ActionError> {
    if cost.is_finite() && cost >= 0.0 {
        Ok(())
    } else {
        Err(ActionError::InvalidCost)
    }
}

pub(crate) fn push_condition(
    conditions: &mut Vec<Property>,
    condition: Property,
) -> Result<(), ActionError> {
    if !condition.is_condition() {
        return Err(ActionError::WrongMode {
            expected: PropertyMode::Condition,
            found: condition.mode(),
        });
    }
    if conditions.iter().any(|c| c.key() == condition.key()) {
        return Err(ActionError::DuplicateKey(condition.key().to_string()));
    }
    conditions.push(condition);
    Ok(())
}

pub(crate) fn push_effect(effects: &mut Vec<Property>, effect: Property) -> Result<(), ActionError> {
    if !effect.is_effect() {
        return Err(ActionError::WrongMode {
            expected: PropertyMode::Effect,
            found: effect.mode(),
        });
    }
    effects.push(effect);
    Ok(())
}

pub(crate) fn remove_first(properties: &mut Vec<Property>, key: &str) -> bool {
    match properties.iter().position(|p| p.key() == key) {
        Some(index) => {
            properties.remove(index);
            true
        }
        None => false,
    }
}
