use goap_core::{ActionError, NodeId};
use thiserror::Error;

/// Why no plan was produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// The search space was exhausted without reaching the start state.
    #[error("no sequence of actions reaches the goal")]
    NoPath,

    /// The iteration bound was hit first. Widen the limit or look for a malformed action graph.
    #[error("planning gave up after {limit} iterations")]
    LimitExceeded { limit: usize },

    #[error("goal property `{0}` is not a condition")]
    InvalidGoal(String),

    #[error("every goal is already satisfied")]
    NoPendingGoal,
}

impl PlanError {
    pub fn is_limit_exceeded(&self) -> bool {
        matches!(self, PlanError::LimitExceeded { .. })
    }
}

/// A plan that does not hold up when replayed against a state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("plan step {step} references a node that is not available")]
    MissingNode { step: usize, node: NodeId },

    #[error("preconditions of step {step} (`{name}`) do not hold")]
    PreconditionFailed { step: usize, name: String },

    #[error("effects of step {step} could not be applied: {source}")]
    Effect {
        step: usize,
        #[source]
        source: ActionError,
    },

    #[error("goal is not satisfied after the last step")]
    GoalNotReached,
}
