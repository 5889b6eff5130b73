use core::fmt;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::binding::{AccessorRegistry, Binding, VariableAccessor};
use crate::error::BlackboardError;
use crate::event::{ChangeEvent, ChangeObserver, Observers};
use crate::property::Property;
use crate::snapshot::Snapshot;
use crate::value::{TypedValue, ValueKind};

/// Stable unique identifier of a blackboard variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VariableId(Uuid);

impl VariableId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl Default for VariableId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VariableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Per-agent (`Local`) or process-wide (`Global`) store. Names are unique per blackboard only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Scope {
    Local,
    Global,
}

/// Lookup by stable id or by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarRef<'a> {
    Id(VariableId),
    Name(&'a str),
}

impl From<VariableId> for VarRef<'_> {
    fn from(id: VariableId) -> Self {
        VarRef::Id(id)
    }
}

impl<'a> From<&'a str> for VarRef<'a> {
    fn from(name: &'a str) -> Self {
        VarRef::Name(name)
    }
}

impl<'a> From<&'a String> for VarRef<'a> {
    fn from(name: &'a String) -> Self {
        VarRef::Name(name.as_str())
    }
}

impl fmt::Display for VarRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarRef::Id(id) => write!(f, "{id}"),
            VarRef::Name(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone)]
pub enum VariableSource {
    Stored(TypedValue),
    Bound(Binding),
}

#[derive(Debug, Clone)]
pub struct Variable {
    id: VariableId,
    name: String,
    kind: ValueKind,
    source: VariableSource,
    planning_value: f32,
}

impl Variable {
    pub fn id(&self) -> VariableId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Weight biasing goal selection toward goals that touch this variable.
    pub fn planning_value(&self) -> f32 {
        self.planning_value
    }

    pub fn source(&self) -> &VariableSource {
        &self.source
    }

    pub fn binding(&self) -> Option<&Binding> {
        match &self.source {
            VariableSource::Bound(binding) => Some(binding),
            VariableSource::Stored(_) => None,
        }
    }

    pub fn is_bound(&self) -> bool {
        self.binding().is_some()
    }

    /// Stored value, or the bound accessor's current value.
    pub fn value(&self) -> Result<TypedValue, BlackboardError> {
        match &self.source {
            VariableSource::Stored(value) => Ok(value.clone()),
            VariableSource::Bound(binding) => {
                let value = binding
                    .read()
                    .ok_or_else(|| BlackboardError::BindingUnavailable {
                        name: self.name.clone(),
                        path: binding.path().to_string(),
                    })?;
                self.ensure_kind(&value)?;
                Ok(value)
            }
        }
    }

    fn ensure_kind(&self, value: &TypedValue) -> Result<(), BlackboardError> {
        if value.kind() == self.kind {
            Ok(())
        } else {
            Err(BlackboardError::KindMismatch {
                name: self.name.clone(),
                expected: self.kind,
                found: value.kind(),
            })
        }
    }

    fn check_write(&self, value: &TypedValue) -> Result<(), BlackboardError> {
        self.ensure_kind(value)?;
        match &self.source {
            VariableSource::Bound(binding) if !binding.is_writable() => {
                Err(BlackboardError::ReadOnlyBinding {
                    name: self.name.clone(),
                    path: binding.path().to_string(),
                })
            }
            _ => Ok(()),
        }
    }

    fn write(&mut self, value: TypedValue) -> Result<(), BlackboardError> {
        self.check_write(&value)?;
        match &mut self.source {
            VariableSource::Stored(slot) => *slot = value,
            VariableSource::Bound(binding) => binding.accessor().set(value),
        }
        Ok(())
    }
}

/// Keyed store of typed world-state variables.
#[derive(Debug, Clone)]
pub struct Blackboard {
    scope: Scope,
    variables: BTreeMap<VariableId, Variable>,
    names: BTreeMap<String, VariableId>,
    observers: Observers,
}

impl Default for Blackboard {
    fn default() -> Self {
        Self::new(Scope::Local)
    }
}

impl Blackboard {
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            variables: BTreeMap::new(),
            names: BTreeMap::new(),
            observers: Observers::default(),
        }
    }

    pub fn local() -> Self {
        Self::new(Scope::Local)
    }

    pub fn global() -> Self {
        Self::new(Scope::Global)
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn subscribe(&mut self, observer: Arc<dyn ChangeObserver>) {
        self.observers.subscribe(observer);
    }

    /// Variables in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.names.values().filter_map(|id| self.variables.get(id))
    }

    pub fn id_of(&self, name: &str) -> Option<VariableId> {
        self.names.get(name).copied()
    }

    pub fn contains<'a>(&self, var: impl Into<VarRef<'a>>) -> bool {
        self.variable(var).is_some()
    }

    pub fn variable<'a>(&self, var: impl Into<VarRef<'a>>) -> Option<&Variable> {
        let id = self.resolve(var.into())?;
        self.variables.get(&id)
    }

    fn resolve(&self, var: VarRef<'_>) -> Option<VariableId> {
        match var {
            VarRef::Id(id) => self.variables.contains_key(&id).then_some(id),
            VarRef::Name(name) => self.id_of(name),
        }
    }

    fn variable_mut(&mut self, var: VarRef<'_>) -> Result<&mut Variable, BlackboardError> {
        let id = self
            .resolve(var)
            .ok_or_else(|| BlackboardError::UnknownVariable(var.to_string()))?;
        self.variables
            .get_mut(&id)
            .ok_or_else(|| BlackboardError::UnknownVariable(var.to_string()))
    }

    pub fn add_variable(
        &mut self,
        name: impl Into<String>,
        initial_value: impl Into<TypedValue>,
    ) -> Result<&Variable, BlackboardError> {
        let value = initial_value.into();
        self.insert(name.into(), value.kind(), VariableSource::Stored(value))
    }

    /// Add a variable holding the zero value of `kind`.
    pub fn add_variable_with_kind(
        &mut self,
        name: impl Into<String>,
        kind: ValueKind,
    ) -> Result<&Variable, BlackboardError> {
        self.add_variable(name, kind.default_value())
    }

    /// Add a variable whose value lives behind an accessor.
    pub fn add_bound_variable(
        &mut self,
        name: impl Into<String>,
        kind: ValueKind,
        binding: Binding,
    ) -> Result<&Variable, BlackboardError> {
        self.insert(name.into(), kind, VariableSource::Bound(binding))
    }

    fn insert(
        &mut self,
        name: String,
        kind: ValueKind,
        source: VariableSource,
    ) -> Result<&Variable, BlackboardError> {
        if name.is_empty() {
            return Err(BlackboardError::EmptyName);
        }
        if self.names.contains_key(&name) {
            return Err(BlackboardError::DuplicateKey(name));
        }

        let id = VariableId::new();
        tracing::debug!(scope = ?self.scope, %id, name = %name, %kind, "Adding variable");

        self.names.insert(name.clone(), id);
        self.variables.insert(
            id,
            Variable {
                id,
                name: name.clone(),
                kind,
                source,
                planning_value: 0.0,
            },
        );
        self.observers.notify(ChangeEvent::VariableAdded {
            scope: self.scope,
            id,
            name,
        });

        self.variables
            .get(&id)
            .ok_or(BlackboardError::UnknownVariable(id.to_string()))
    }

    /// Remove a variable. Properties keyed to it become dangling; their owners must purge them.
    pub fn remove_variable<'a>(&mut self, var: impl Into<VarRef<'a>>) -> bool {
        let Some(id) = self.resolve(var.into()) else {
            return false;
        };
        let Some(variable) = self.variables.remove(&id) else {
            return false;
        };
        self.names.remove(&variable.name);

        tracing::debug!(scope = ?self.scope, %id, name = %variable.name, "Removed variable");
        self.observers.notify(ChangeEvent::VariableRemoved {
            scope: self.scope,
            id,
            name: variable.name,
        });
        true
    }

    pub fn clear(&mut self) {
        self.variables.clear();
        self.names.clear();
        self.observers
            .notify(ChangeEvent::BlackboardCleared { scope: self.scope });
    }

    pub fn get<'a>(&self, var: impl Into<VarRef<'a>>) -> Result<TypedValue, BlackboardError> {
        let var = var.into();
        self.variable(var)
            .ok_or_else(|| BlackboardError::UnknownVariable(var.to_string()))?
            .value()
    }

    pub fn set<'a>(
        &mut self,
        var: impl Into<VarRef<'a>>,
        value: impl Into<TypedValue>,
    ) -> Result<(), BlackboardError> {
        let scope = self.scope;
        let variable = self.variable_mut(var.into())?;
        variable.write(value.into())?;

        let event = ChangeEvent::VariableChanged {
            scope,
            id: variable.id,
            name: variable.name.clone(),
        };
        self.observers.notify(event);
        Ok(())
    }

    /// Whether [`set`](Self::set) would accept `value`. Nothing is written.
    pub fn check_set<'a>(
        &self,
        var: impl Into<VarRef<'a>>,
        value: &TypedValue,
    ) -> Result<(), BlackboardError> {
        let var = var.into();
        self.variable(var)
            .ok_or_else(|| BlackboardError::UnknownVariable(var.to_string()))?
            .check_write(value)
    }

    pub fn set_planning_value<'a>(
        &mut self,
        var: impl Into<VarRef<'a>>,
        planning_value: f32,
    ) -> Result<(), BlackboardError> {
        let scope = self.scope;
        let variable = self.variable_mut(var.into())?;
        variable.planning_value = planning_value;

        let event = ChangeEvent::VariableChanged {
            scope,
            id: variable.id,
            name: variable.name.clone(),
        };
        self.observers.notify(event);
        Ok(())
    }

    pub fn rename_variable<'a>(
        &mut self,
        var: impl Into<VarRef<'a>>,
        new_name: impl Into<String>,
    ) -> Result<(), BlackboardError> {
        let new_name = new_name.into();
        if new_name.is_empty() {
            return Err(BlackboardError::EmptyName);
        }
        let var = var.into();
        let id = self
            .resolve(var)
            .ok_or_else(|| BlackboardError::UnknownVariable(var.to_string()))?;
        if let Some(existing) = self.names.get(&new_name) {
            if *existing == id {
                return Ok(());
            }
            return Err(BlackboardError::DuplicateKey(new_name));
        }

        let variable = self.variable_mut(VarRef::Id(id))?;
        let old = std::mem::replace(&mut variable.name, new_name.clone());
        self.names.remove(&old);
        self.names.insert(new_name.clone(), id);

        self.observers.notify(ChangeEvent::VariableRenamed {
            scope: self.scope,
            id,
            old,
            new: new_name,
        });
        Ok(())
    }

    /// Route reads/writes of an existing variable through `binding`.
    pub fn bind<'a>(
        &mut self,
        var: impl Into<VarRef<'a>>,
        binding: Binding,
    ) -> Result<(), BlackboardError> {
        let scope = self.scope;
        let variable = self.variable_mut(var.into())?;
        tracing::debug!(name = %variable.name, path = binding.path(), "Binding variable");
        variable.source = VariableSource::Bound(binding);

        let event = ChangeEvent::VariableChanged {
            scope,
            id: variable.id,
            name: variable.name.clone(),
        };
        self.observers.notify(event);
        Ok(())
    }

    /// Bind through an accessor registered under `path`.
    pub fn bind_path<'a>(
        &mut self,
        var: impl Into<VarRef<'a>>,
        path: &str,
        registry: &AccessorRegistry,
    ) -> Result<(), BlackboardError> {
        let binding = registry
            .resolve(path)
            .ok_or_else(|| BlackboardError::UnknownBindingPath(path.to_string()))?;
        self.bind(var, binding)
    }

    pub fn bind_accessor<'a>(
        &mut self,
        var: impl Into<VarRef<'a>>,
        path: impl Into<String>,
        accessor: Arc<dyn VariableAccessor>,
    ) -> Result<(), BlackboardError> {
        self.bind(var, Binding::new(path, accessor))
    }

    /// Detach a binding, keeping the accessor's current value (or the kind's zero value when the
    /// accessor cannot provide one).
    pub fn unbind<'a>(&mut self, var: impl Into<VarRef<'a>>) -> Result<(), BlackboardError> {
        let scope = self.scope;
        let variable = self.variable_mut(var.into())?;
        if !variable.is_bound() {
            return Ok(());
        }
        let value = variable
            .value()
            .unwrap_or_else(|_| variable.kind.default_value());
        variable.source = VariableSource::Stored(value);

        let event = ChangeEvent::VariableChanged {
            scope,
            id: variable.id,
            name: variable.name.clone(),
        };
        self.observers.notify(event);
        Ok(())
    }

    /// Apply an effect to the live value of the variable it targets.
    pub fn apply_effect(&mut self, effect: &Property) -> Result<(), BlackboardError> {
        let current = self.get(effect.key())?;
        let next = effect
            .apply(&current)
            .map_err(|source| BlackboardError::Effect {
                name: effect.key().to_string(),
                source,
            })?;
        self.set(effect.key(), next)
    }

    /// Owned, immutable copy with bound variables resolved.
    ///
    /// Bound variables whose accessor cannot answer are left out, so conditions on them read as
    /// unknown (unsatisfied).
    pub fn snapshot(&self) -> Snapshot {
        let mut snapshot = Snapshot::new();
        self.fill_snapshot(&mut snapshot);
        snapshot
    }

    /// Combined logical state: `self` entries shadow `global` entries with the same name.
    pub fn snapshot_layered(&self, global: &Blackboard) -> Snapshot {
        let mut snapshot = Snapshot::new();
        global.fill_snapshot(&mut snapshot);
        self.fill_snapshot(&mut snapshot);
        snapshot
    }

    fn fill_snapshot(&self, snapshot: &mut Snapshot) {
        for variable in self.iter() {
            match variable.value() {
                Ok(value) => snapshot.insert(variable.name.clone(), value, variable.planning_value),
                Err(error) => {
                    tracing::warn!(
                        scope = ?self.scope,
                        name = %variable.name,
                        %error,
                        "Skipping unreadable variable in snapshot"
                    );
                }
            }
        }
    }
}

/// Handle to the process-wide blackboard.
///
/// Created once at startup and passed to every agent that needs it. Any number of readers, one
/// writer at a time.
#[derive(Debug, Clone)]
pub struct GlobalBlackboard {
    inner: Arc<RwLock<Blackboard>>,
}

impl Default for GlobalBlackboard {
    fn default() -> Self {
        Self::new(Blackboard::global())
    }
}

impl GlobalBlackboard {
    /// Wrap `blackboard`, forcing its scope to [`Scope::Global`].
    pub fn new(mut blackboard: Blackboard) -> Self {
        blackboard.scope = Scope::Global;
        Self {
            inner: Arc::new(RwLock::new(blackboard)),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Blackboard> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Blackboard> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> Snapshot {
        self.read().snapshot()
    }

    pub fn ptr_eq(&self, other: &GlobalBlackboard) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
