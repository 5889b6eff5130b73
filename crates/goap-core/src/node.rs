use core::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::action::{push_condition, push_effect, remove_first, Action};
use crate::error::ActionError;
use crate::event::{ChangeEvent, ChangeObserver, NodeChange, Observers};
use crate::property::Property;
use crate::snapshot::Snapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeId(Uuid);

impl NodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// An [`Action`] bound to one agent's planning graph.
///
/// The node owns copies of the action's conditions and effects, so per-node edits never touch the
/// shared action definition. A node without an action is never a planning candidate.
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "NodeRepr", into = "NodeRepr"))]
pub struct ActionNode {
    id: NodeId,
    name: String,
    description: String,
    position: [f32; 2],
    action: Option<Arc<Action>>,
    conditions: Vec<Property>,
    effects: Vec<Property>,
    observers: Observers,
}

impl ActionNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            name: name.into(),
            description: String::new(),
            position: [0.0, 0.0],
            action: None,
            conditions: Vec::new(),
            effects: Vec::new(),
            observers: Observers::default(),
        }
    }

    /// Node named after `action`, holding copies of its conditions and effects.
    pub fn from_action(action: Arc<Action>) -> Self {
        let mut node = Self::new(action.name());
        node.set_action(action);
        node
    }

    pub fn subscribe(&mut self, observer: Arc<dyn ChangeObserver>) {
        self.observers.subscribe(observer);
    }

    fn changed(&self, change: NodeChange) {
        self.observers.notify(ChangeEvent::NodeChanged {
            node: self.id,
            change,
        });
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.changed(NodeChange::Renamed);
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
        self.changed(NodeChange::Described);
    }

    /// Editor canvas position.
    pub fn position(&self) -> [f32; 2] {
        self.position
    }

    pub fn set_position(&mut self, position: [f32; 2]) {
        self.position = position;
        self.changed(NodeChange::Moved);
    }

    pub fn action(&self) -> Option<&Arc<Action>> {
        self.action.as_ref()
    }

    /// Bind `action`, replacing this node's conditions and effects with copies of its own.
    pub fn set_action(&mut self, action: Arc<Action>) {
        self.conditions = action.conditions().to_vec();
        self.effects = action.effects().to_vec();
        self.action = Some(action);
        self.changed(NodeChange::ActionSet);
    }

    pub fn clear_action(&mut self) {
        self.action = None;
        self.changed(NodeChange::ActionCleared);
    }

    pub fn is_plannable(&self) -> bool {
        self.action.is_some()
    }

    /// Cost of the bound action; `None` for nodes without one.
    pub fn cost(&self) -> Option<f32> {
        self.action.as_ref().map(|action| action.cost())
    }

    pub fn conditions(&self) -> &[Property] {
        &self.conditions
    }

    pub fn effects(&self) -> &[Property] {
        &self.effects
    }

    pub fn add_condition(&mut self, condition: Property) -> Result<(), ActionError> {
        let key = condition.key().to_string();
        push_condition(&mut self.conditions, condition)?;
        self.changed(NodeChange::ConditionAdded(key));
        Ok(())
    }

    pub fn add_effect(&mut self, effect: Property) -> Result<(), ActionError> {
        let key = effect.key().to_string();
        push_effect(&mut self.effects, effect)?;
        self.changed(NodeChange::EffectAdded(key));
        Ok(())
    }

    pub fn remove_condition(&mut self, key: &str) -> bool {
        if !remove_first(&mut self.conditions, key) {
            tracing::warn!(node = %self.name, key, "Condition not found on remove");
            return false;
        }
        self.changed(NodeChange::ConditionRemoved(key.to_string()));
        true
    }

    /// Remove the first effect on `key`.
    pub fn remove_effect(&mut self, key: &str) -> bool {
        if !remove_first(&mut self.effects, key) {
            tracing::warn!(node = %self.name, key, "Effect not found on remove");
            return false;
        }
        self.changed(NodeChange::EffectRemoved(key.to_string()));
        true
    }

    /// Drop every condition and effect keyed to `key`; returns how many were removed.
    ///
    /// Call after removing a blackboard variable so no dangling property survives.
    pub fn purge_key(&mut self, key: &str) -> usize {
        let before = self.conditions.len() + self.effects.len();
        let had_condition = self.conditions.iter().any(|c| c.key() == key);
        let had_effect = self.effects.iter().any(|e| e.key() == key);

        self.conditions.retain(|c| c.key() != key);
        self.effects.retain(|e| e.key() != key);

        if had_condition {
            self.changed(NodeChange::ConditionRemoved(key.to_string()));
        }
        if had_effect {
            self.changed(NodeChange::EffectRemoved(key.to_string()));
        }
        before - (self.conditions.len() + self.effects.len())
    }

    pub fn is_satisfied_by(&self, state: &Snapshot) -> bool {
        state.satisfies(&self.conditions)
    }

    pub fn apply_effects(&self, state: &Snapshot) -> Result<Snapshot, ActionError> {
        state.apply_effects(&self.effects)
    }
}

/// Wire form of [`ActionNode`]; properties are re-checked on the way in, observers are dropped.
#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
struct NodeRepr {
    id: NodeId,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    position: [f32; 2],
    action: Option<Arc<Action>>,
    conditions: Vec<Property>,
    effects: Vec<Property>,
}

#[cfg(feature = "serde")]
impl TryFrom<NodeRepr> for ActionNode {
    type Error = ActionError;

    fn try_from(repr: NodeRepr) -> Result<Self, Self::Error> {
        let mut conditions = Vec::with_capacity(repr.conditions.len());
        for condition in repr.conditions {
            push_condition(&mut conditions, condition)?;
        }
        let mut effects = Vec::with_capacity(repr.effects.len());
        for effect in repr.effects {
            push_effect(&mut effects, effect)?;
        }
        Ok(Self {
            id: repr.id,
            name: repr.name,
            description: repr.description,
            position: repr.position,
            action: repr.action,
            conditions,
            effects,
            observers: Observers::default(),
        })
    }
}

#[cfg(feature = "serde")]
impl From<ActionNode> for NodeRepr {
    fn from(node: ActionNode) -> Self {
        Self {
            id: node.id,
            name: node.name,
            description: node.description,
            position: node.position,
            action: node.action,
            conditions: node.conditions,
            effects: node.effects,
        }
    }
}

impl PartialEq for ActionNode {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.description == other.description
            && self.position == other.position
            && self.action == other.action
            && self.conditions == other.conditions
            && self.effects == other.effects
    }
}

impl fmt::Debug for ActionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionNode")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("action", &self.action.as_ref().map(|a| a.name()))
            .field("conditions", &self.conditions)
            .field("effects", &self.effects)
            .finish()
    }
}
