use goap_core::{ActionExecutor, ActionNode, ActionStatus, WorldMut};

use crate::plan::{resolve_step, Plan};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerStatus {
    Running,
    Completed,
    Failed { step: usize },
    /// Live state no longer supports the plan at `step`; re-plan.
    Stale { step: usize },
}

impl RunnerStatus {
    pub fn is_finished(self) -> bool {
        !matches!(self, RunnerStatus::Running)
    }
}

/// Drives a [`Plan`] against live state one node at a time.
///
/// Before a node starts, its preconditions are re-checked against the live blackboards (the plan
/// was computed from a snapshot and may be stale). Instant actions chain within a single tick.
#[derive(Debug, Clone)]
pub struct PlanRunner {
    plan: Plan,
    index: usize,
    started: bool,
    apply_effects: bool,
}

impl PlanRunner {
    pub fn new(plan: Plan) -> Self {
        Self {
            plan,
            index: 0,
            started: false,
            apply_effects: true,
        }
    }

    /// Whether a successful node's modeled effects are written to live state (default `true`).
    ///
    /// Turn this off when executors mutate the blackboard themselves.
    pub fn with_effect_application(mut self, apply_effects: bool) -> Self {
        self.apply_effects = apply_effects;
        self
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn is_finished(&self) -> bool {
        self.index >= self.plan.len()
    }

    pub fn tick<E>(
        &mut self,
        nodes: &[ActionNode],
        executor: &mut E,
        world: &mut WorldMut<'_>,
    ) -> RunnerStatus
    where
        E: ActionExecutor + ?Sized,
    {
        while self.index < self.plan.len() {
            let step = &self.plan.steps()[self.index];
            let Some(node) = resolve_step(step, nodes) else {
                tracing::warn!(step = self.index, name = %step.name, "Planned node is gone");
                return RunnerStatus::Stale { step: self.index };
            };

            if !self.started {
                let view = world.view();
                if !node.conditions().iter().all(|c| view.holds(c)) {
                    tracing::warn!(step = self.index, node = node.name(), "Plan is stale");
                    return RunnerStatus::Stale { step: self.index };
                }
                self.started = true;
            }

            match executor.execute(node, world) {
                ActionStatus::Running => return RunnerStatus::Running,
                ActionStatus::Failure => {
                    self.started = false;
                    return RunnerStatus::Failed { step: self.index };
                }
                ActionStatus::Success => {
                    self.started = false;
                    if self.apply_effects {
                        if let Err(error) = world.apply_effects(node.effects()) {
                            tracing::warn!(step = self.index, node = node.name(), %error, "Could not apply effects");
                            return RunnerStatus::Failed { step: self.index };
                        }
                    }
                    self.index += 1;
                }
            }
        }

        RunnerStatus::Completed
    }

    /// Cancel the node currently running, if any.
    pub fn cancel<E>(
        &mut self,
        nodes: &[ActionNode],
        executor: &mut E,
        world: &mut WorldMut<'_>,
    ) where
        E: ActionExecutor + ?Sized,
    {
        if !self.started {
            return;
        }
        if let Some(node) = self
            .plan
            .steps()
            .get(self.index)
            .and_then(|step| resolve_step(step, nodes))
        {
            executor.cancel(node, world);
        }
        self.started = false;
    }
}
