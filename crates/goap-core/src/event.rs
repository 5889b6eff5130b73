//! Change notifications for editors and other observers of planning data.

use core::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use crate::blackboard::{Scope, VariableId};
use crate::node::NodeId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    VariableAdded {
        scope: Scope,
        id: VariableId,
        name: String,
    },
    VariableRemoved {
        scope: Scope,
        id: VariableId,
        name: String,
    },
    VariableRenamed {
        scope: Scope,
        id: VariableId,
        old: String,
        new: String,
    },
    /// Value, binding, or planning value changed.
    VariableChanged {
        scope: Scope,
        id: VariableId,
        name: String,
    },
    BlackboardCleared {
        scope: Scope,
    },
    NodeChanged {
        node: NodeId,
        change: NodeChange,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeChange {
    ActionSet,
    ActionCleared,
    ConditionAdded(String),
    ConditionRemoved(String),
    EffectAdded(String),
    EffectRemoved(String),
    Renamed,
    Described,
    Moved,
}

pub trait ChangeObserver: Send + Sync {
    fn on_change(&self, event: &ChangeEvent);
}

/// Observer list carried by blackboards and nodes. Cloning shares the observers.
#[derive(Clone, Default)]
pub struct Observers {
    observers: Vec<Arc<dyn ChangeObserver>>,
}

impl Observers {
    pub fn subscribe(&mut self, observer: Arc<dyn ChangeObserver>) {
        self.observers.push(observer);
    }

    pub fn clear(&mut self) {
        self.observers.clear();
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub fn notify(&self, event: ChangeEvent) {
        for observer in &self.observers {
            observer.on_change(&event);
        }
    }
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("len", &self.observers.len())
            .finish()
    }
}

/// Collects events in memory.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ChangeEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ChangeEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn take(&self) -> Vec<ChangeEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl ChangeObserver for RecordingObserver {
    fn on_change(&self, event: &ChangeEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
