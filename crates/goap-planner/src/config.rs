#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Search bounds and weighting for [`GoapPlanner`](crate::GoapPlanner).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlannerConfig {
    /// Max number of goal-state expansions before giving up (loop protection).
    pub max_iterations: usize,

    /// How many times a goal-state may be reopened after a strictly cheaper way to reach it is
    /// found.
    pub max_retries: u32,

    /// Multiplier on the unsatisfied-condition count in `f = g + w * h`. `0.0` turns the search
    /// into uniform-cost search.
    pub heuristic_weight: f32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_iterations: 300,
            max_retries: 4,
            heuristic_weight: 1.0,
        }
    }
}
