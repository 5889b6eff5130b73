//! Single entrypoint for the `goap-*` crates: the typed world-state model and the planner.
//!
//! ```
//! use std::sync::Arc;
//!
//! use goap::prelude::*;
//!
//! let mut bb = Blackboard::local();
//! bb.add_variable("hasAxe", false)?;
//! bb.add_variable("nearTree", true)?;
//!
//! let chop = Action::new("ChopTree", 1.0)?
//!     .with_condition(Property::condition("nearTree", Operator::Equal, true)?)?
//!     .with_effect(Property::effect("hasAxe", Operator::Assign, true)?)?;
//! let nodes = [ActionNode::from_action(Arc::new(chop))];
//!
//! let goal = [Property::condition("hasAxe", Operator::Equal, true)?];
//! let plan = GoapPlanner::new().plan(&goal, &bb.snapshot(), &nodes)?;
//! assert_eq!(plan.names(), ["ChopTree"]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

#[cfg(feature = "core")]
#[cfg_attr(docsrs, doc(cfg(feature = "core")))]
pub use goap_core as core;

#[cfg(feature = "planner")]
#[cfg_attr(docsrs, doc(cfg(feature = "planner")))]
pub use goap_planner as planner;

/// Common imports for building and planning.
#[cfg(feature = "planner")]
#[cfg_attr(docsrs, doc(cfg(feature = "planner")))]
pub mod prelude {
    pub use goap_core::{
        Action, ActionNode, Blackboard, GlobalBlackboard, Goal, Operator, Property, Snapshot,
        TypedValue, ValueKind,
    };
    pub use goap_planner::{GoapPlanner, Plan, PlanError, PlanRunner, PlannerConfig};
}
