//! Combined local + global world state, and the executor contract that mutates it.

use crate::action::ActionStatus;
use crate::blackboard::{Blackboard, Scope};
use crate::error::BlackboardError;
use crate::node::ActionNode;
use crate::property::Property;
use crate::snapshot::Snapshot;
use crate::value::TypedValue;

/// Read-only view over an agent's local blackboard layered on the global one.
///
/// Local entries shadow global entries with the same name.
#[derive(Debug, Clone, Copy)]
pub struct WorldView<'a> {
    local: &'a Blackboard,
    global: &'a Blackboard,
}

impl<'a> WorldView<'a> {
    pub fn new(local: &'a Blackboard, global: &'a Blackboard) -> Self {
        Self { local, global }
    }

    pub fn local(&self) -> &'a Blackboard {
        self.local
    }

    pub fn global(&self) -> &'a Blackboard {
        self.global
    }

    /// Scope holding `name`, local first.
    pub fn owner(&self, name: &str) -> Option<Scope> {
        owner(self.local, self.global, name)
    }

    pub fn get(&self, name: &str) -> Result<TypedValue, BlackboardError> {
        match self.owner(name) {
            Some(Scope::Local) => self.local.get(name),
            Some(Scope::Global) => self.global.get(name),
            None => Err(BlackboardError::UnknownVariable(name.to_string())),
        }
    }

    pub fn check_set(&self, name: &str, value: &TypedValue) -> Result<(), BlackboardError> {
        match self.owner(name) {
            Some(Scope::Local) => self.local.check_set(name, value),
            Some(Scope::Global) => self.global.check_set(name, value),
            None => Err(BlackboardError::UnknownVariable(name.to_string())),
        }
    }

    /// Condition holds against live state. Unknown or unreadable keys are unsatisfied.
    pub fn holds(&self, condition: &Property) -> bool {
        self.get(condition.key())
            .is_ok_and(|value| condition.evaluate(&value))
    }

    pub fn snapshot(&self) -> Snapshot {
        self.local.snapshot_layered(self.global)
    }
}

/// Mutable counterpart of [`WorldView`]; writes go to whichever scope owns the key.
#[derive(Debug)]
pub struct WorldMut<'a> {
    local: &'a mut Blackboard,
    global: &'a mut Blackboard,
}

impl<'a> WorldMut<'a> {
    pub fn new(local: &'a mut Blackboard, global: &'a mut Blackboard) -> Self {
        Self { local, global }
    }

    pub fn view(&self) -> WorldView<'_> {
        WorldView::new(&*self.local, &*self.global)
    }

    pub fn local_mut(&mut self) -> &mut Blackboard {
        &mut *self.local
    }

    pub fn global_mut(&mut self) -> &mut Blackboard {
        &mut *self.global
    }

    pub fn get(&self, name: &str) -> Result<TypedValue, BlackboardError> {
        self.view().get(name)
    }

    pub fn set(&mut self, name: &str, value: impl Into<TypedValue>) -> Result<(), BlackboardError> {
        self.owning_mut(name)?.set(name, value)
    }

    pub fn apply_effect(&mut self, effect: &Property) -> Result<(), BlackboardError> {
        self.owning_mut(effect.key())?.apply_effect(effect)
    }

    /// Apply `effects` in declaration order as one batch.
    ///
    /// Every new value is computed and checked before anything is written, so a failing effect
    /// leaves both blackboards untouched.
    pub fn apply_effects(&mut self, effects: &[Property]) -> Result<(), BlackboardError> {
        let view = self.view();
        let mut staged: Vec<(&str, TypedValue)> = Vec::with_capacity(effects.len());
        for effect in effects {
            let key = effect.key();
            let slot = staged.iter().position(|(name, _)| *name == key);
            let current = match slot {
                Some(index) => staged[index].1.clone(),
                None => view.get(key)?,
            };
            let next = effect
                .apply(&current)
                .map_err(|source| BlackboardError::Effect {
                    name: key.to_string(),
                    source,
                })?;
            view.check_set(key, &next)?;
            match slot {
                Some(index) => staged[index].1 = next,
                None => staged.push((key, next)),
            }
        }

        for (key, value) in staged {
            self.set(key, value)?;
        }
        Ok(())
    }

    pub fn snapshot(&self) -> Snapshot {
        self.view().snapshot()
    }

    fn owning_mut(&mut self, name: &str) -> Result<&mut Blackboard, BlackboardError> {
        match owner(&*self.local, &*self.global, name) {
            Some(Scope::Local) => Ok(&mut *self.local),
            Some(Scope::Global) => Ok(&mut *self.global),
            None => Err(BlackboardError::UnknownVariable(name.to_string())),
        }
    }
}

fn owner(local: &Blackboard, global: &Blackboard, name: &str) -> Option<Scope> {
    if local.contains(name) {
        Some(Scope::Local)
    } else if global.contains(name) {
        Some(Scope::Global)
    } else {
        None
    }
}

/// Runs a planned node against live state. Multi-tick actions report `Running` until done.
pub trait ActionExecutor {
    fn execute(&mut self, node: &ActionNode, world: &mut WorldMut<'_>) -> ActionStatus;

    fn cancel(&mut self, _node: &ActionNode, _world: &mut WorldMut<'_>) {}
}
