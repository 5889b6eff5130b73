use core::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};

use goap_core::{
    ActionNode, Goal, Operator, Property, Snapshot, TypedValue, MIN_PROPERTY_DISTANCE,
};

use crate::config::PlannerConfig;
use crate::error::{PlanError, ValidationError};
use crate::plan::{resolve_step, Plan, PlanStep, PrioritizedPlan};

/// Backward (regression) GOAP planner.
///
/// Starts from the goal conditions and regresses them through candidate nodes until every
/// remaining condition already holds in the start snapshot. Holds no state between calls.
#[derive(Debug, Clone, Default)]
pub struct GoapPlanner {
    config: PlannerConfig,
}

impl GoapPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: PlannerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn plan_goal(
        &self,
        goal: &Goal,
        start: &Snapshot,
        nodes: &[ActionNode],
    ) -> Result<Plan, PlanError> {
        self.plan(goal.conditions(), start, nodes)
    }

    /// Cheapest sequence of `nodes` turning `start` into a state where every `goal` condition holds.
    pub fn plan(
        &self,
        goal: &[Property],
        start: &Snapshot,
        nodes: &[ActionNode],
    ) -> Result<Plan, PlanError> {
        if let Some(bad) = goal.iter().find(|p| !p.is_condition()) {
            return Err(PlanError::InvalidGoal(bad.to_string()));
        }

        let root = canonicalize(goal.to_vec());
        if start.satisfies(&root) {
            return Ok(Plan::empty());
        }

        tracing::debug!(
            goal_conditions = root.len(),
            nodes = nodes.len(),
            "Starting GOAP plan search"
        );

        if let Some(orphan) = start
            .unsatisfied(&root)
            .find(|condition| !is_produced_by_any(condition, nodes))
        {
            tracing::debug!(condition = %orphan, "Goal condition has no producing action");
            return Err(PlanError::NoPath);
        }

        let mut search = Search::new(&self.config, start, nodes);
        search.run(root)
    }

    /// Plan for the most valuable pending goal that is feasible.
    ///
    /// Goals are tried in descending [`Goal::weight`] order (declaration order on ties); goals
    /// already satisfied are skipped.
    pub fn plan_prioritized(
        &self,
        goals: &[Goal],
        start: &Snapshot,
        nodes: &[ActionNode],
    ) -> Result<PrioritizedPlan, PlanError> {
        let mut order: Vec<(usize, f32)> = goals
            .iter()
            .enumerate()
            .filter(|(_, goal)| !goal.is_satisfied_by(start))
            .map(|(index, goal)| (index, goal.weight(start)))
            .collect();
        order.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        let mut last_error: Option<PlanError> = None;
        for (goal_index, weight) in order {
            let goal = &goals[goal_index];
            match self.plan_goal(goal, start, nodes) {
                Ok(plan) => {
                    tracing::debug!(goal = goal.name(), weight, "Selected goal");
                    return Ok(PrioritizedPlan { goal_index, plan });
                }
                Err(error) => {
                    tracing::debug!(goal = goal.name(), %error, "Goal infeasible");
                    let keep_previous = last_error
                        .as_ref()
                        .is_some_and(|prev| prev.is_limit_exceeded() && !error.is_limit_exceeded());
                    if !keep_previous {
                        last_error = Some(error);
                    }
                }
            }
        }

        Err(last_error.unwrap_or(PlanError::NoPendingGoal))
    }

    /// Replay `plan` from `start`, checking each step's preconditions before applying its effects.
    ///
    /// Returns the final state.
    pub fn validate_plan(
        &self,
        plan: &Plan,
        goal: &[Property],
        start: &Snapshot,
        nodes: &[ActionNode],
    ) -> Result<Snapshot, ValidationError> {
        let mut state = start.clone();
        for (step_index, step) in plan.steps().iter().enumerate() {
            let node = resolve_step(step, nodes).ok_or(ValidationError::MissingNode {
                step: step_index,
                node: step.node_id,
            })?;
            if !node.is_satisfied_by(&state) {
                return Err(ValidationError::PreconditionFailed {
                    step: step_index,
                    name: node.name().to_string(),
                });
            }
            state = node
                .apply_effects(&state)
                .map_err(|source| ValidationError::Effect {
                    step: step_index,
                    source,
                })?;
        }

        if state.satisfies(goal) {
            Ok(state)
        } else {
            Err(ValidationError::GoalNotReached)
        }
    }
}

fn is_produced_by_any(condition: &Property, nodes: &[ActionNode]) -> bool {
    nodes
        .iter()
        .filter(|node| node.is_plannable())
        .flat_map(|node| node.effects())
        .any(|effect| effect.key() == condition.key())
}

/// Result of pushing one condition backward through a node's effects.
#[derive(Debug, Clone, PartialEq)]
enum Regression {
    /// An assignment makes the condition true; it no longer needs to hold beforehand.
    Discharged,
    /// The condition must hold beforehand in this (possibly shifted) form.
    Required(Property),
    /// An assignment makes the condition false, or a delta cannot be inverted.
    Conflict,
}

fn regress(condition: &Property, effects: &[Property]) -> Regression {
    let mut current = condition.clone();
    // Later effects win, so walk from the last one back.
    for effect in effects.iter().rev().filter(|e| e.key() == condition.key()) {
        let shifted = match effect.operator() {
            Operator::Assign => {
                return if current.evaluate(effect.value()) {
                    Regression::Discharged
                } else {
                    Regression::Conflict
                };
            }
            // `k += d` then `k op v`  <=>  `k op (v - d)` beforehand.
            Operator::Add => current.value().checked_sub(effect.value()),
            Operator::Subtract => current.value().checked_add(effect.value()),
            _ => return Regression::Conflict,
        };
        match shifted.ok().and_then(|value| current.with_value(value).ok()) {
            Some(next) => current = next,
            None => return Regression::Conflict,
        }
    }
    Regression::Required(current)
}

/// How far `actual` is from satisfying `condition`; zero when it holds, `None` when unknown.
fn gap(condition: &Property, actual: Option<&TypedValue>) -> Option<f64> {
    let actual = actual?;
    if condition.evaluate(actual) {
        return Some(0.0);
    }

    let target = condition.value();
    match (actual, target) {
        (TypedValue::Vector2(a), TypedValue::Vector2(b)) => Some(distance(a, b)),
        (TypedValue::Vector3(a), TypedValue::Vector3(b)) => Some(distance(a, b)),
        (TypedValue::Vector4(a), TypedValue::Vector4(b)) => Some(distance(a, b)),
        _ => match (actual.scalar_magnitude(), target.scalar_magnitude()) {
            // Strict comparisons need to clear the threshold by at least one step.
            (Some(a), Some(b)) => Some((a - b).abs() + f64::from(MIN_PROPERTY_DISTANCE)),
            _ => Some(1.0),
        },
    }
}

fn distance(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| f64::from(x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

fn canonicalize(mut conditions: Vec<Property>) -> Vec<Property> {
    conditions.sort_by(|a, b| a.canonical_cmp(b));
    conditions.dedup_by(|a, b| a.canonical_cmp(b).is_eq());
    conditions
}

/// An `==` condition pins the value; every other condition on that key must accept it.
fn is_contradictory(conditions: &[Property]) -> bool {
    conditions
        .iter()
        .filter(|pin| pin.operator() == Operator::Equal)
        .any(|pin| {
            conditions
                .iter()
                .filter(|other| other.key() == pin.key())
                .any(|other| !other.evaluate(pin.value()))
        })
}

/// Canonical remaining-condition set, used as the visited-set key.
#[derive(Debug, Clone)]
struct StateKey(Vec<Property>);

impl PartialEq for StateKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for StateKey {}

impl PartialOrd for StateKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for StateKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| a.canonical_cmp(b))
            .find(|o| o.is_ne())
            .unwrap_or_else(|| self.0.len().cmp(&other.0.len()))
    }
}

#[derive(Debug)]
struct SearchNode {
    key: StateKey,
    g: f32,
    parent: Option<usize>,
    /// Index of the action node regressed through to reach this goal-state.
    via: Option<usize>,
}

impl SearchNode {
    fn conditions(&self) -> &[Property] {
        &self.key.0
    }
}

#[derive(Debug, Clone, Copy)]
struct OpenEntry {
    f: f32,
    g: f32,
    introduced: usize,
    action: usize,
    seq: u64,
    index: usize,
}

impl OpenEntry {
    fn key_cmp(&self, other: &Self) -> Ordering {
        self.f
            .total_cmp(&other.f)
            .then(self.introduced.cmp(&other.introduced))
            .then(self.action.cmp(&other.action))
            .then(self.seq.cmp(&other.seq))
    }
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key_cmp(other).is_eq()
    }
}

impl Eq for OpenEntry {}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering to make BinaryHeap behave like a min-heap.
        other.key_cmp(self)
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone, Copy)]
struct Visit {
    best_g: f32,
    expanded: bool,
    reopened: u32,
}

struct Search<'a> {
    config: &'a PlannerConfig,
    start: &'a Snapshot,
    nodes: &'a [ActionNode],
    arena: Vec<SearchNode>,
    open: BinaryHeap<OpenEntry>,
    visited: BTreeMap<StateKey, Visit>,
    seq: u64,
}

impl<'a> Search<'a> {
    fn new(config: &'a PlannerConfig, start: &'a Snapshot, nodes: &'a [ActionNode]) -> Self {
        Self {
            config,
            start,
            nodes,
            arena: Vec::new(),
            open: BinaryHeap::new(),
            visited: BTreeMap::new(),
            seq: 0,
        }
    }

    fn h(&self, conditions: &[Property]) -> f32 {
        let missing = self.start.unsatisfied(conditions).count();
        self.config.heuristic_weight * missing as f32
    }

    fn push(&mut self, node: SearchNode, introduced: usize, action: usize) {
        let f = node.g + self.h(node.conditions());
        let g = node.g;
        let index = self.arena.len();
        self.arena.push(node);
        self.open.push(OpenEntry {
            f,
            g,
            introduced,
            action,
            seq: self.seq,
            index,
        });
        self.seq += 1;
    }

    /// Pops goal-states until nothing cheaper than the best plan found so far is left.
    ///
    /// The heuristic may overestimate, so the first plan found is only an upper bound.
    fn run(&mut self, root: Vec<Property>) -> Result<Plan, PlanError> {
        let root = StateKey(root);
        self.visited.insert(
            root.clone(),
            Visit {
                best_g: 0.0,
                expanded: false,
                reopened: 0,
            },
        );
        self.push(
            SearchNode {
                key: root,
                g: 0.0,
                parent: None,
                via: None,
            },
            0,
            0,
        );

        let mut iterations: usize = 0;
        let mut best: Option<usize> = None;
        while let Some(entry) = self.open.pop() {
            let bound = best.map(|found| self.arena[found].g);
            if bound.is_some_and(|bound| entry.g >= bound) {
                continue;
            }
            match self.visited.get_mut(&self.arena[entry.index].key) {
                Some(visit) if entry.g <= visit.best_g => visit.expanded = true,
                _ => continue, // stale heap entry
            }

            iterations += 1;
            if self.start.satisfies(self.arena[entry.index].conditions()) {
                tracing::trace!(cost = entry.g, iterations, "Candidate GOAP plan");
                best = Some(entry.index);
                continue;
            }

            if iterations > self.config.max_iterations {
                tracing::warn!(
                    limit = self.config.max_iterations,
                    open = self.open.len(),
                    found = best.is_some(),
                    "GOAP search hit its iteration limit"
                );
                return match best {
                    Some(found) => Ok(self.finish(found, iterations)),
                    None => Err(PlanError::LimitExceeded {
                        limit: self.config.max_iterations,
                    }),
                };
            }

            self.expand(entry.index, bound);
        }

        match best {
            Some(found) => Ok(self.finish(found, iterations)),
            None => {
                tracing::debug!(iterations, "GOAP search exhausted without a plan");
                Err(PlanError::NoPath)
            }
        }
    }

    fn finish(&self, index: usize, iterations: usize) -> Plan {
        let plan = self.reconstruct(index);
        tracing::debug!(
            steps = plan.len(),
            cost = plan.cost(),
            iterations,
            "GOAP plan found"
        );
        plan
    }

    fn expand(&mut self, index: usize, bound: Option<f32>) {
        let parent_g = self.arena[index].g;
        let nodes = self.nodes;
        let candidates: Vec<(usize, f32, Vec<Property>)> = nodes
            .iter()
            .enumerate()
            .filter_map(|(action_index, node)| {
                let g = parent_g + node.cost()?;
                if bound.is_some_and(|bound| g >= bound) {
                    return None;
                }
                let derived = self.derive(self.arena[index].conditions(), node)?;
                Some((action_index, g, derived))
            })
            .collect();

        for (action_index, g, derived) in candidates {
            let node = &nodes[action_index];
            let introduced = self.start.unsatisfied(node.conditions()).count();
            // Goal-states already true in `start` are never expanded, so reaching one again
            // costs no reopen budget.
            let terminal = self.start.satisfies(&derived);
            let key = StateKey(derived);

            match self.visited.get_mut(&key) {
                Some(visit) if visit.best_g <= g => continue,
                Some(visit) if !visit.expanded || terminal => {
                    visit.best_g = g;
                    visit.expanded = false;
                }
                Some(visit) => {
                    if visit.reopened >= self.config.max_retries {
                        tracing::trace!(node = node.name(), "Reopen budget spent; dropping");
                        continue;
                    }
                    visit.reopened += 1;
                    visit.expanded = false;
                    visit.best_g = g;
                }
                None => {
                    self.visited.insert(
                        key.clone(),
                        Visit {
                            best_g: g,
                            expanded: false,
                            reopened: 0,
                        },
                    );
                }
            }

            tracing::trace!(
                node = node.name(),
                g,
                remaining = key.0.len(),
                "Regressed goal-state"
            );
            self.push(
                SearchNode {
                    key,
                    g,
                    parent: Some(index),
                    via: Some(action_index),
                },
                introduced,
                action_index,
            );
        }
    }

    /// Goal-state that must hold before `node` for `conditions` to hold after it, if `node` makes
    /// progress without clobbering any condition.
    ///
    /// Discharging a condition counts as progress even when it already holds in `start`; a node
    /// that requires the very condition it discharges does not.
    fn derive(&self, conditions: &[Property], node: &ActionNode) -> Option<Vec<Property>> {
        let mut progress = false;
        let mut derived = Vec::with_capacity(conditions.len() + node.conditions().len());

        for condition in conditions {
            let actual = self.start.get(condition.key());
            let satisfied = condition_holds(condition, actual);
            match regress(condition, node.effects()) {
                Regression::Conflict => return None,
                Regression::Discharged => progress |= !requires(node, condition),
                Regression::Required(next) => {
                    if !satisfied && next != *condition {
                        let closes = condition_holds(&next, actual);
                        let narrows = match (gap(condition, actual), gap(&next, actual)) {
                            (Some(before), Some(after)) => {
                                after + f64::from(MIN_PROPERTY_DISTANCE) < before
                            }
                            _ => false,
                        };
                        progress |= closes || narrows;
                    }
                    derived.push(next);
                }
            }
        }

        if !progress {
            return None;
        }

        derived.extend(node.conditions().iter().cloned());
        let derived = canonicalize(derived);
        if is_contradictory(&derived) {
            return None;
        }
        Some(derived)
    }

    fn reconstruct(&self, index: usize) -> Plan {
        let mut steps = Vec::new();
        let mut cursor = Some(index);
        // Walking parent links from the state nearest `start` yields execution order.
        while let Some(current) = cursor {
            let node = &self.arena[current];
            if let Some(action_index) = node.via {
                let action = &self.nodes[action_index];
                steps.push(PlanStep {
                    node_index: action_index,
                    node_id: action.id(),
                    name: action.name().to_string(),
                    cost: action.cost().unwrap_or(0.0),
                });
            }
            cursor = node.parent;
        }
        Plan::new(steps, self.arena[index].g)
    }
}

fn requires(node: &ActionNode, condition: &Property) -> bool {
    node.conditions()
        .iter()
        .any(|own| own.canonical_cmp(condition).is_eq())
}

fn condition_holds(condition: &Property, actual: Option<&TypedValue>) -> bool {
    actual.is_some_and(|value| condition.evaluate(value))
}
