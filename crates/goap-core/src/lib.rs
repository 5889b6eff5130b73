//! Typed world-state, properties, and actions for goal-oriented action planning.
//!
//! The planner itself lives in `goap-planner`; this crate holds the data model it searches over.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod action;
pub mod binding;
pub mod blackboard;
pub mod error;
pub mod event;
pub mod goal;
pub mod node;
pub mod property;
pub mod snapshot;
pub mod value;
pub mod world;

pub use action::{Action, ActionOutcome, ActionStatus};
pub use binding::{AccessorRegistry, Binding, FnAccessor, VariableAccessor};
pub use blackboard::{
    Blackboard, GlobalBlackboard, Scope, VarRef, Variable, VariableId, VariableSource,
};
pub use error::{ActionError, BlackboardError, EvalError, PropertyError, ValueError};
pub use event::{ChangeEvent, ChangeObserver, NodeChange, Observers, RecordingObserver};
pub use goal::Goal;
pub use node::{ActionNode, NodeId};
pub use property::{Operator, Property, PropertyMode};
pub use snapshot::Snapshot;
pub use value::{TypedValue, ValueKind, MIN_PROPERTY_DISTANCE};
pub use world::{ActionExecutor, WorldMut, WorldView};
