use std::sync::Arc;

use goap_core::{Action, ActionNode, Operator, Property, Snapshot, TypedValue};
use goap_planner::{GoapPlanner, PlanError, PlannerConfig, ValidationError};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn cond(key: &str, op: Operator, value: impl Into<TypedValue>) -> Property {
    Property::condition(key, op, value).expect("condition")
}

fn effect(key: &str, op: Operator, value: impl Into<TypedValue>) -> Property {
    Property::effect(key, op, value).expect("effect")
}

fn node(name: &str, cost: f32, conditions: &[Property], effects: &[Property]) -> ActionNode {
    let mut action = Action::new(name, cost).expect("action");
    for c in conditions {
        action.add_condition(c.clone()).expect("add condition");
    }
    for e in effects {
        action.add_effect(e.clone()).expect("add effect");
    }
    ActionNode::from_action(Arc::new(action))
}

/// Shed -> axe -> two rounds of chopping, taking `wood` from 2 to 6.
fn lumberjack() -> (Vec<ActionNode>, Snapshot, Vec<Property>) {
    let nodes = vec![
        node(
            "GoToShed",
            1.0,
            &[],
            &[effect("at_shed", Operator::Assign, true)],
        ),
        node(
            "GetAxe",
            1.0,
            &[cond("at_shed", Operator::Equal, true)],
            &[effect("hasAxe", Operator::Assign, true)],
        ),
        node(
            "ChopTree",
            1.0,
            &[cond("hasAxe", Operator::Equal, true)],
            &[effect("wood", Operator::Add, 2)],
        ),
    ];
    let start = Snapshot::new()
        .with_value("at_shed", false)
        .with_value("hasAxe", false)
        .with_value("wood", 2);
    let goal = vec![cond("wood", Operator::GreaterOrEqual, 6)];
    (nodes, start, goal)
}

#[test]
fn single_step_plan() {
    init_tracing();
    let nodes = vec![node(
        "ChopTree",
        2.5,
        &[cond("nearTree", Operator::Equal, true)],
        &[effect("hasAxe", Operator::Assign, true)],
    )];
    let start = Snapshot::new()
        .with_value("hasAxe", false)
        .with_value("nearTree", true);
    let goal = [cond("hasAxe", Operator::Equal, true)];

    let plan = GoapPlanner::new()
        .plan(&goal, &start, &nodes)
        .expect("plan");
    assert_eq!(plan.names(), ["ChopTree"]);
    assert_eq!(plan.cost(), 2.5);
    assert_eq!(plan.steps()[0].node_id, nodes[0].id());
}

#[test]
fn goal_on_unknown_key_without_producer_has_no_path() {
    let nodes = vec![node(
        "Idle",
        1.0,
        &[],
        &[effect("bored", Operator::Assign, true)],
    )];
    let start = Snapshot::new().with_value("bored", false);
    let goal = [cond("treasure", Operator::Equal, true)];

    assert_eq!(
        GoapPlanner::new().plan(&goal, &start, &nodes),
        Err(PlanError::NoPath)
    );
}

#[test]
fn cheaper_of_two_equivalent_nodes_wins() {
    let nodes = vec![
        node(
            "BuyAxe",
            5.0,
            &[cond("hasGold", Operator::Equal, true)],
            &[effect("hasAxe", Operator::Assign, true)],
        ),
        node(
            "BorrowAxe",
            2.0,
            &[cond("hasFriend", Operator::Equal, true)],
            &[effect("hasAxe", Operator::Assign, true)],
        ),
    ];
    let start = Snapshot::new()
        .with_value("hasAxe", false)
        .with_value("hasGold", true)
        .with_value("hasFriend", true);
    let goal = [cond("hasAxe", Operator::Equal, true)];

    let plan = GoapPlanner::new()
        .plan(&goal, &start, &nodes)
        .expect("plan");
    assert_eq!(plan.names(), ["BorrowAxe"]);
    assert_eq!(plan.cost(), 2.0);
}

#[test]
fn self_requiring_node_is_pruned_not_looped() {
    let looping = node(
        "Sharpen",
        1.0,
        &[cond("sharp", Operator::Equal, true)],
        &[effect("sharp", Operator::Assign, true)],
    );
    let start = Snapshot::new().with_value("sharp", false);
    let goal = [cond("sharp", Operator::Equal, true)];
    let planner = GoapPlanner::new().with_config(PlannerConfig {
        max_iterations: 10,
        ..PlannerConfig::default()
    });

    assert_eq!(
        planner.plan(&goal, &start, std::slice::from_ref(&looping)),
        Err(PlanError::NoPath)
    );

    let whetstone = node(
        "UseWhetstone",
        10.0,
        &[],
        &[effect("sharp", Operator::Assign, true)],
    );
    let plan = planner
        .plan(&goal, &start, &[looping, whetstone])
        .expect("plan");
    assert_eq!(plan.names(), ["UseWhetstone"]);
}

#[test]
fn satisfied_or_empty_goal_needs_no_steps() {
    let (nodes, start, _) = lumberjack();
    let planner = GoapPlanner::new();

    let plan = planner.plan(&[], &start, &nodes).expect("plan");
    assert!(plan.is_empty());
    assert_eq!(plan.cost(), 0.0);

    let already = [cond("wood", Operator::Greater, 1)];
    assert!(planner.plan(&already, &start, &nodes).expect("plan").is_empty());
}

#[test]
fn multi_step_chain_with_repeated_delta() {
    init_tracing();
    let (nodes, start, goal) = lumberjack();
    let planner = GoapPlanner::new();

    let plan = planner.plan(&goal, &start, &nodes).expect("plan");
    assert_eq!(plan.names(), ["GoToShed", "GetAxe", "ChopTree", "ChopTree"]);
    assert_eq!(plan.cost(), 4.0);

    let end = planner
        .validate_plan(&plan, &goal, &start, &nodes)
        .expect("sound plan");
    assert_eq!(end.get("wood"), Some(&TypedValue::Int(6)));
    assert_eq!(end.get("hasAxe"), Some(&TypedValue::Bool(true)));
}

#[test]
fn subtracting_delta_reaches_upper_bound() {
    let nodes = vec![node(
        "Eat",
        1.0,
        &[],
        &[effect("hunger", Operator::Subtract, 3)],
    )];
    let start = Snapshot::new().with_value("hunger", 9);
    let goal = [cond("hunger", Operator::LessOrEqual, 2)];

    let plan = GoapPlanner::new()
        .plan(&goal, &start, &nodes)
        .expect("plan");
    assert_eq!(plan.len(), 3);
}

#[test]
fn effects_that_clobber_other_goal_conditions_run_first() {
    let nodes = vec![
        node(
            "SetA",
            1.0,
            &[],
            &[
                effect("a", Operator::Assign, true),
                effect("b", Operator::Assign, false),
            ],
        ),
        node("SetB", 1.0, &[], &[effect("b", Operator::Assign, true)]),
    ];
    let start = Snapshot::new().with_value("a", false).with_value("b", false);
    let goal = [
        cond("a", Operator::Equal, true),
        cond("b", Operator::Equal, true),
    ];
    let planner = GoapPlanner::new();

    let plan = planner.plan(&goal, &start, &nodes).expect("plan");
    assert_eq!(plan.names(), ["SetA", "SetB"]);
    assert!(planner.validate_plan(&plan, &goal, &start, &nodes).is_ok());
}

#[test]
fn equal_cost_ties_follow_declaration_order() {
    let nodes = vec![
        node("First", 1.0, &[], &[effect("done", Operator::Assign, true)]),
        node("Second", 1.0, &[], &[effect("done", Operator::Assign, true)]),
    ];
    let start = Snapshot::new().with_value("done", false);
    let goal = [cond("done", Operator::Equal, true)];

    let plan = GoapPlanner::new()
        .plan(&goal, &start, &nodes)
        .expect("plan");
    assert_eq!(plan.names(), ["First"]);

    let mut reversed = nodes.clone();
    reversed.reverse();
    let plan = GoapPlanner::new()
        .plan(&goal, &start, &reversed)
        .expect("plan");
    assert_eq!(plan.names(), ["Second"]);
}

#[test]
fn planning_is_idempotent() {
    let (nodes, start, goal) = lumberjack();
    let planner = GoapPlanner::new();

    let first = planner.plan(&goal, &start, &nodes).expect("plan");
    let second = planner.plan(&goal, &start, &nodes).expect("plan");
    assert_eq!(first, second);
}

#[test]
fn nodes_without_an_action_are_ignored() {
    let mut sketch = ActionNode::new("Sketch");
    sketch
        .add_effect(effect("door_open", Operator::Assign, true))
        .expect("effect");
    let start = Snapshot::new().with_value("door_open", false);
    let goal = [cond("door_open", Operator::Equal, true)];

    assert_eq!(
        GoapPlanner::new().plan(&goal, &start, &[sketch]),
        Err(PlanError::NoPath)
    );
}

#[test]
fn effect_in_goal_is_rejected() {
    let (nodes, start, _) = lumberjack();
    let goal = [effect("wood", Operator::Assign, 10)];

    assert!(matches!(
        GoapPlanner::new().plan(&goal, &start, &nodes),
        Err(PlanError::InvalidGoal(_))
    ));
}

#[test]
fn iteration_limit_is_distinct_from_no_path() {
    let gather = node("Gather", 1.0, &[], &[effect("wood", Operator::Add, 1)]);
    let start = Snapshot::new().with_value("wood", 0);
    let goal = [cond("wood", Operator::GreaterOrEqual, 1_000)];
    let planner = GoapPlanner::new().with_config(PlannerConfig {
        max_iterations: 50,
        ..PlannerConfig::default()
    });

    let err = planner
        .plan(&goal, &start, std::slice::from_ref(&gather))
        .expect_err("too deep for the limit");
    assert_eq!(err, PlanError::LimitExceeded { limit: 50 });
    assert!(err.is_limit_exceeded());

    // A dead end that exhausts the frontier is reported as NoPath.
    let locked = node(
        "OpenDoor",
        1.0,
        &[cond("hasKey", Operator::Equal, true)],
        &[effect("door_open", Operator::Assign, true)],
    );
    let start = Snapshot::new()
        .with_value("door_open", false)
        .with_value("hasKey", false);
    let goal = [cond("door_open", Operator::Equal, true)];
    assert_eq!(
        planner.plan(&goal, &start, &[locked]),
        Err(PlanError::NoPath)
    );
}

#[test]
fn validation_catches_broken_plans() {
    let (nodes, start, goal) = lumberjack();
    let planner = GoapPlanner::new();
    let plan = planner.plan(&goal, &start, &nodes).expect("plan");

    // Start state where the shed trip no longer suffices: no wood to add to.
    let moved = Snapshot::new()
        .with_value("at_shed", false)
        .with_value("hasAxe", false);
    assert!(matches!(
        planner.validate_plan(&plan, &goal, &moved, &nodes),
        Err(ValidationError::Effect { step: 2, .. })
    ));

    let poorer = start.clone().with_value("wood", 0);
    assert_eq!(
        planner.validate_plan(&plan, &goal, &poorer, &nodes),
        Err(ValidationError::GoalNotReached)
    );

    let others: Vec<ActionNode> = nodes
        .iter()
        .map(|n| ActionNode::from_action(Arc::clone(n.action().expect("action"))))
        .collect();
    assert!(matches!(
        planner.validate_plan(&plan, &goal, &start, &others),
        Err(ValidationError::MissingNode { step: 0, .. })
    ));

    // Plan nodes resolve by id even when the slice is reordered.
    let mut shuffled = nodes.clone();
    shuffled.rotate_left(1);
    assert!(planner.validate_plan(&plan, &goal, &start, &shuffled).is_ok());
    assert_eq!(plan.nodes(&shuffled).map(|n| n.len()), Some(4));
}

#[test]
fn shared_setup_beats_expensive_shortcut() {
    let nodes = vec![
        node(
            "Prepare",
            1.0,
            &[],
            &[
                effect("p", Operator::Assign, true),
                effect("q", Operator::Assign, true),
                effect("r", Operator::Assign, true),
            ],
        ),
        node(
            "Combo",
            1.0,
            &[
                cond("p", Operator::Equal, true),
                cond("q", Operator::Equal, true),
                cond("r", Operator::Equal, true),
            ],
            &[
                effect("a", Operator::Assign, true),
                effect("b", Operator::Assign, true),
                effect("c", Operator::Assign, true),
            ],
        ),
        node(
            "Expensive",
            3.5,
            &[],
            &[
                effect("a", Operator::Assign, true),
                effect("b", Operator::Assign, true),
                effect("c", Operator::Assign, true),
            ],
        ),
    ];
    let mut start = Snapshot::new();
    for key in ["a", "b", "c", "p", "q", "r"] {
        start = start.with_value(key, false);
    }
    let goal = [
        cond("a", Operator::Equal, true),
        cond("b", Operator::Equal, true),
        cond("c", Operator::Equal, true),
    ];
    let planner = GoapPlanner::new();

    let plan = planner.plan(&goal, &start, &nodes).expect("plan");
    assert_eq!(plan.names(), ["Prepare", "Combo"]);
    assert_eq!(plan.cost(), 2.0);
    assert!(planner.validate_plan(&plan, &goal, &start, &nodes).is_ok());
}

#[test]
fn goal_condition_true_at_start_can_be_restored() {
    init_tracing();
    let nodes = vec![
        node(
            "OpenDoor",
            1.0,
            &[],
            &[effect("door_open", Operator::Assign, true)],
        ),
        node(
            "Enter",
            1.0,
            &[cond("door_open", Operator::Equal, true)],
            &[effect("inside", Operator::Assign, true)],
        ),
        node(
            "CloseDoor",
            1.0,
            &[],
            &[effect("door_open", Operator::Assign, false)],
        ),
    ];
    let start = Snapshot::new()
        .with_value("door_open", false)
        .with_value("inside", false);
    let goal = [
        cond("inside", Operator::Equal, true),
        cond("door_open", Operator::Equal, false),
    ];
    let planner = GoapPlanner::new();

    let plan = planner.plan(&goal, &start, &nodes).expect("plan");
    assert_eq!(plan.names(), ["OpenDoor", "Enter", "CloseDoor"]);
    assert_eq!(plan.cost(), 3.0);
    assert!(planner.validate_plan(&plan, &goal, &start, &nodes).is_ok());
}

#[test]
fn goal_reached_on_the_last_allowed_pop_is_returned() {
    let gather = node("Gather", 1.0, &[], &[effect("wood", Operator::Add, 1)]);
    let start = Snapshot::new().with_value("wood", 0);
    let goal = [cond("wood", Operator::GreaterOrEqual, 3)];
    let limited = |max_iterations| {
        GoapPlanner::new().with_config(PlannerConfig {
            max_iterations,
            ..PlannerConfig::default()
        })
    };

    let plan = limited(3)
        .plan(&goal, &start, std::slice::from_ref(&gather))
        .expect("plan");
    assert_eq!(plan.names(), ["Gather", "Gather", "Gather"]);

    assert_eq!(
        limited(2).plan(&goal, &start, std::slice::from_ref(&gather)),
        Err(PlanError::LimitExceeded { limit: 2 })
    );
}
