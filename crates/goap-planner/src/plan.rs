#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use goap_core::{ActionNode, NodeId};

/// One planned step: a reference to the node that runs it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlanStep {
    /// Index into the node slice the plan was computed from.
    pub node_index: usize,
    pub node_id: NodeId,
    pub name: String,
    pub cost: f32,
}

/// Ordered, costed sequence of action nodes. Immutable once produced.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Plan {
    steps: Vec<PlanStep>,
    cost: f32,
}

impl Plan {
    pub(crate) fn new(steps: Vec<PlanStep>, cost: f32) -> Self {
        Self { steps, cost }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), 0.0)
    }

    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    pub fn cost(&self) -> f32 {
        self.cost
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.name.as_str()).collect()
    }

    /// Resolve each step against `nodes`, by index first and by id if the slice was reordered.
    pub fn nodes<'a>(&self, nodes: &'a [ActionNode]) -> Option<Vec<&'a ActionNode>> {
        self.steps
            .iter()
            .map(|step| resolve_step(step, nodes))
            .collect()
    }
}

pub(crate) fn resolve_step<'a>(step: &PlanStep, nodes: &'a [ActionNode]) -> Option<&'a ActionNode> {
    nodes
        .get(step.node_index)
        .filter(|node| node.id() == step.node_id)
        .or_else(|| nodes.iter().find(|node| node.id() == step.node_id))
}

/// Plan produced for one of several candidate goals.
#[derive(Debug, Clone, PartialEq)]
pub struct PrioritizedPlan {
    /// Index of the chosen goal in the slice passed to the planner.
    pub goal_index: usize,
    pub plan: Plan,
}
