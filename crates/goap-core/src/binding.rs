//! Accessor capability for variables bound to host-side data.
//!
//! The blackboard never inspects engine objects. A collaborator registers a get/set pair per path
//! and the blackboard reads/writes through it.

use core::fmt;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::value::TypedValue;

pub trait VariableAccessor: Send + Sync {
    /// Current value, or `None` if the host cannot provide one right now.
    fn get(&self) -> Option<TypedValue>;

    /// Write a value. Only called when [`VariableAccessor::is_writable`] is true.
    fn set(&self, _value: TypedValue) {}

    /// Method-style bindings are read-only.
    fn is_writable(&self) -> bool {
        false
    }
}

type Getter = Box<dyn Fn() -> Option<TypedValue> + Send + Sync>;
type Setter = Box<dyn Fn(TypedValue) + Send + Sync>;

/// Accessor built from a pair of closures.
pub struct FnAccessor {
    getter: Getter,
    setter: Option<Setter>,
}

impl FnAccessor {
    pub fn new<G, S>(getter: G, setter: S) -> Self
    where
        G: Fn() -> Option<TypedValue> + Send + Sync + 'static,
        S: Fn(TypedValue) + Send + Sync + 'static,
    {
        Self {
            getter: Box::new(getter),
            setter: Some(Box::new(setter)),
        }
    }

    pub fn read_only<G>(getter: G) -> Self
    where
        G: Fn() -> Option<TypedValue> + Send + Sync + 'static,
    {
        Self {
            getter: Box::new(getter),
            setter: None,
        }
    }
}

impl VariableAccessor for FnAccessor {
    fn get(&self) -> Option<TypedValue> {
        (self.getter)()
    }

    fn set(&self, value: TypedValue) {
        if let Some(setter) = &self.setter {
            setter(value);
        }
    }

    fn is_writable(&self) -> bool {
        self.setter.is_some()
    }
}

impl fmt::Debug for FnAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnAccessor")
            .field("writable", &self.is_writable())
            .finish()
    }
}

/// A variable's link to an external accessor, keyed by a host path such as `"Agent.Health.value"`.
#[derive(Clone)]
pub struct Binding {
    path: String,
    accessor: Arc<dyn VariableAccessor>,
}

impl Binding {
    pub fn new(path: impl Into<String>, accessor: Arc<dyn VariableAccessor>) -> Self {
        Self {
            path: path.into(),
            accessor,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last segment of the path, for display.
    pub fn short_path(&self) -> &str {
        self.path.rsplit('.').next().unwrap_or(&self.path)
    }

    pub fn accessor(&self) -> &Arc<dyn VariableAccessor> {
        &self.accessor
    }

    pub fn read(&self) -> Option<TypedValue> {
        self.accessor.get()
    }

    pub fn is_writable(&self) -> bool {
        self.accessor.is_writable()
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("path", &self.path)
            .field("writable", &self.is_writable())
            .finish()
    }
}

/// Accessors registered by path.
#[derive(Clone, Default)]
pub struct AccessorRegistry {
    accessors: BTreeMap<String, Arc<dyn VariableAccessor>>,
}

impl AccessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the accessor for `path`.
    pub fn register(&mut self, path: impl Into<String>, accessor: Arc<dyn VariableAccessor>) {
        self.accessors.insert(path.into(), accessor);
    }

    pub fn resolve(&self, path: &str) -> Option<Binding> {
        self.accessors
            .get(path)
            .map(|accessor| Binding::new(path, Arc::clone(accessor)))
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.accessors.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.accessors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accessors.is_empty()
    }
}

impl fmt::Debug for AccessorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.accessors.keys()).finish()
    }
}
