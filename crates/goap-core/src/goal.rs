#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::action::push_condition;
use crate::error::ActionError;
use crate::property::Property;
use crate::snapshot::Snapshot;

/// A named set of target conditions.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "GoalRepr", into = "GoalRepr"))]
pub struct Goal {
    name: String,
    conditions: Vec<Property>,
    priority: f32,
}

impl Goal {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            conditions: Vec::new(),
            priority: 0.0,
        }
    }

    pub fn with_condition(mut self, condition: Property) -> Result<Self, ActionError> {
        self.add_condition(condition)?;
        Ok(self)
    }

    pub fn with_priority(mut self, priority: f32) -> Self {
        self.priority = priority;
        self
    }

    pub fn add_condition(&mut self, condition: Property) -> Result<(), ActionError> {
        push_condition(&mut self.conditions, condition)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn conditions(&self) -> &[Property] {
        &self.conditions
    }

    pub fn priority(&self) -> f32 {
        self.priority
    }

    pub fn is_satisfied_by(&self, state: &Snapshot) -> bool {
        state.satisfies(&self.conditions)
    }

    /// Base priority plus the planning values of variables behind still-unsatisfied conditions.
    pub fn weight(&self, state: &Snapshot) -> f32 {
        state
            .unsatisfied(&self.conditions)
            .map(|condition| state.planning_value(condition.key()))
            .fold(self.priority, |acc, value| acc + value)
    }
}

#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
struct GoalRepr {
    name: String,
    conditions: Vec<Property>,
    #[serde(default)]
    priority: f32,
}

#[cfg(feature = "serde")]
impl TryFrom<GoalRepr> for Goal {
    type Error = ActionError;

    fn try_from(repr: GoalRepr) -> Result<Self, Self::Error> {
        let mut goal = Goal::new(repr.name).with_priority(repr.priority);
        for condition in repr.conditions {
            goal.add_condition(condition)?;
        }
        Ok(goal)
    }
}

#[cfg(feature = "serde")]
impl From<Goal> for GoalRepr {
    fn from(goal: Goal) -> Self {
        Self {
            name: goal.name,
            conditions: goal.conditions,
            priority: goal.priority,
        }
    }
}
