//! Deterministic backward-regression GOAP planner over `goap-core` action nodes.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod plan;
pub mod planner;
pub mod runner;

pub use config::PlannerConfig;
pub use error::{PlanError, ValidationError};
pub use plan::{Plan, PlanStep, PrioritizedPlan};
pub use planner::GoapPlanner;
pub use runner::{PlanRunner, RunnerStatus};
