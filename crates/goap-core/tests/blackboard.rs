use std::sync::{Arc, Mutex};

use goap_core::{
    AccessorRegistry, Blackboard, BlackboardError, ChangeEvent, FnAccessor, GlobalBlackboard,
    Operator, Property, RecordingObserver, Scope, TypedValue, ValueKind, WorldMut, WorldView,
};

#[test]
fn add_get_set_remove_roundtrip() {
    let mut bb = Blackboard::local();
    let id = bb.add_variable("wood", 3).expect("add").id();

    assert_eq!(bb.get("wood"), Ok(TypedValue::Int(3)));
    assert_eq!(bb.get(id), Ok(TypedValue::Int(3)));

    bb.set("wood", 5).expect("set");
    assert_eq!(bb.get("wood"), Ok(TypedValue::Int(5)));

    assert!(bb.remove_variable("wood"));
    assert!(!bb.remove_variable("wood"));
    assert!(!bb.contains(id));
    assert_eq!(
        bb.get("wood"),
        Err(BlackboardError::UnknownVariable("wood".to_string()))
    );
}

#[test]
fn names_are_unique_and_non_empty() {
    let mut bb = Blackboard::local();
    bb.add_variable("hasAxe", false).expect("add");

    assert_eq!(
        bb.add_variable("hasAxe", true).map(|v| v.id()),
        Err(BlackboardError::DuplicateKey("hasAxe".to_string()))
    );
    assert_eq!(
        bb.add_variable("", 1).map(|v| v.id()),
        Err(BlackboardError::EmptyName)
    );
    assert_eq!(bb.len(), 1);
}

#[test]
fn writes_keep_the_declared_kind() {
    let mut bb = Blackboard::local();
    bb.add_variable_with_kind("speed", ValueKind::Float)
        .expect("add");
    assert_eq!(bb.get("speed"), Ok(TypedValue::Float(0.0)));

    let err = bb.set("speed", 3).expect_err("int into float slot");
    assert_eq!(
        err,
        BlackboardError::KindMismatch {
            name: "speed".to_string(),
            expected: ValueKind::Float,
            found: ValueKind::Int,
        }
    );
}

#[test]
fn rename_keeps_identity() {
    let mut bb = Blackboard::local();
    let id = bb.add_variable("gold", 10).expect("add").id();
    bb.add_variable("wood", 1).expect("add");

    bb.rename_variable("gold", "coins").expect("rename");
    assert_eq!(bb.id_of("coins"), Some(id));
    assert!(!bb.contains("gold"));

    assert_eq!(
        bb.rename_variable("coins", "wood"),
        Err(BlackboardError::DuplicateKey("wood".to_string()))
    );
    // Renaming onto itself is a no-op.
    assert_eq!(bb.rename_variable(id, "coins"), Ok(()));
}

#[test]
fn iteration_is_in_name_order() {
    let mut bb = Blackboard::local();
    bb.add_variable("zeta", 1).expect("add");
    bb.add_variable("alpha", 2).expect("add");
    bb.add_variable("mid", 3).expect("add");

    let names: Vec<&str> = bb.iter().map(|v| v.name()).collect();
    assert_eq!(names, ["alpha", "mid", "zeta"]);
}

#[test]
fn apply_effect_updates_live_value() {
    let mut bb = Blackboard::local();
    bb.add_variable("wood", 2).expect("add");

    let gather = Property::effect("wood", Operator::Add, 3).expect("effect");
    bb.apply_effect(&gather).expect("apply");
    assert_eq!(bb.get("wood"), Ok(TypedValue::Int(5)));

    let overflow = Property::effect("wood", Operator::Add, i32::MAX).expect("effect");
    assert!(matches!(
        bb.apply_effect(&overflow),
        Err(BlackboardError::Effect { .. })
    ));
    assert_eq!(bb.get("wood"), Ok(TypedValue::Int(5)));
}

#[test]
fn bound_variables_read_and_write_through_accessors() {
    let health = Arc::new(Mutex::new(TypedValue::Int(80)));
    let getter = Arc::clone(&health);
    let setter = Arc::clone(&health);

    let mut registry = AccessorRegistry::new();
    registry.register(
        "Player/Health.current",
        Arc::new(FnAccessor::new(
            move || getter.lock().ok().map(|v| v.clone()),
            move |value| {
                if let Ok(mut slot) = setter.lock() {
                    *slot = value;
                }
            },
        )),
    );
    registry.register(
        "Player/Stats.level()",
        Arc::new(FnAccessor::read_only(|| Some(TypedValue::Int(7)))),
    );

    let mut bb = Blackboard::local();
    bb.add_variable_with_kind("health", ValueKind::Int)
        .expect("add");
    bb.add_variable_with_kind("level", ValueKind::Int)
        .expect("add");
    bb.bind_path("health", "Player/Health.current", &registry)
        .expect("bind");
    bb.bind_path("level", "Player/Stats.level()", &registry)
        .expect("bind");

    assert_eq!(bb.get("health"), Ok(TypedValue::Int(80)));
    bb.set("health", 55).expect("writable binding");
    assert_eq!(*health.lock().expect("lock"), TypedValue::Int(55));

    assert_eq!(bb.get("level"), Ok(TypedValue::Int(7)));
    assert!(matches!(
        bb.set("level", 8),
        Err(BlackboardError::ReadOnlyBinding { .. })
    ));

    assert_eq!(
        bb.bind_path("level", "Missing.path", &registry),
        Err(BlackboardError::UnknownBindingPath("Missing.path".to_string()))
    );

    let binding = bb
        .variable("health")
        .and_then(|v| v.binding())
        .expect("bound");
    assert_eq!(binding.short_path(), "current");
    assert!(binding.is_writable());

    bb.unbind("health").expect("unbind");
    assert!(!bb.variable("health").expect("variable").is_bound());
    assert_eq!(bb.get("health"), Ok(TypedValue::Int(55)));
}

#[test]
fn bound_variable_with_wrong_kind_is_reported() {
    let mut bb = Blackboard::local();
    bb.add_variable_with_kind("flag", ValueKind::Bool)
        .expect("add");
    bb.bind_accessor(
        "flag",
        "Door.open",
        Arc::new(FnAccessor::read_only(|| Some(TypedValue::Int(1)))),
    )
    .expect("bind");

    assert!(matches!(
        bb.get("flag"),
        Err(BlackboardError::KindMismatch { .. })
    ));
    // Unreadable variables are left out of snapshots.
    assert!(!bb.snapshot().contains("flag"));
}

#[test]
fn layered_snapshot_prefers_local_values() {
    let mut global = Blackboard::global();
    global.add_variable("time_of_day", 12).expect("add");
    global.add_variable("raining", true).expect("add");

    let mut local = Blackboard::local();
    local.add_variable("raining", false).expect("add");
    local.add_variable("hungry", true).expect("add");
    local.set_planning_value("hungry", 2.5).expect("planning value");

    let snapshot = local.snapshot_layered(&global);
    assert_eq!(snapshot.len(), 3);
    assert_eq!(snapshot.get("raining"), Some(&TypedValue::Bool(false)));
    assert_eq!(snapshot.get("time_of_day"), Some(&TypedValue::Int(12)));
    assert_eq!(snapshot.planning_value("hungry"), 2.5);
    assert_eq!(snapshot.planning_value("unknown"), 0.0);
}

#[test]
fn observers_see_structural_changes() {
    let observer = Arc::new(RecordingObserver::new());
    let mut bb = Blackboard::local();
    bb.subscribe(observer.clone());

    let id = bb.add_variable("wood", 0).expect("add").id();
    bb.set("wood", 1).expect("set");
    bb.rename_variable("wood", "logs").expect("rename");
    bb.remove_variable("logs");
    bb.clear();

    let events = observer.take();
    assert_eq!(
        events,
        vec![
            ChangeEvent::VariableAdded {
                scope: Scope::Local,
                id,
                name: "wood".to_string(),
            },
            ChangeEvent::VariableChanged {
                scope: Scope::Local,
                id,
                name: "wood".to_string(),
            },
            ChangeEvent::VariableRenamed {
                scope: Scope::Local,
                id,
                old: "wood".to_string(),
                new: "logs".to_string(),
            },
            ChangeEvent::VariableRemoved {
                scope: Scope::Local,
                id,
                name: "logs".to_string(),
            },
            ChangeEvent::BlackboardCleared {
                scope: Scope::Local
            },
        ]
    );
    assert!(observer.events().is_empty());
}

#[test]
fn global_blackboard_is_shared_between_handles() {
    let global = GlobalBlackboard::new(Blackboard::local());
    assert_eq!(global.read().scope(), Scope::Global);

    let other = global.clone();
    assert!(global.ptr_eq(&other));

    other
        .write()
        .add_variable("alarm", false)
        .map(|_| ())
        .expect("add");
    global.write().set("alarm", true).expect("set");

    assert_eq!(other.snapshot().get("alarm"), Some(&TypedValue::Bool(true)));
    assert!(!global.ptr_eq(&GlobalBlackboard::default()));
}

#[test]
fn world_routes_writes_to_the_owning_scope() {
    let mut global = Blackboard::global();
    global.add_variable("bridge_up", false).expect("add");
    let mut local = Blackboard::local();
    local.add_variable("stamina", 10).expect("add");

    {
        let mut world = WorldMut::new(&mut local, &mut global);
        world.set("bridge_up", true).expect("global write");
        world
            .apply_effect(&Property::effect("stamina", Operator::Subtract, 4).expect("effect"))
            .expect("local write");
        assert!(world.set("missing", 1).is_err());
    }

    let view = WorldView::new(&local, &global);
    assert_eq!(view.owner("bridge_up"), Some(Scope::Global));
    assert_eq!(view.owner("stamina"), Some(Scope::Local));
    assert_eq!(view.get("stamina"), Ok(TypedValue::Int(6)));
    assert!(view.holds(&Property::condition("bridge_up", Operator::Equal, true).expect("cond")));
    assert!(!view.holds(&Property::condition("missing", Operator::Equal, true).expect("cond")));
}

#[test]
fn world_effects_apply_all_or_nothing() {
    let mut global = Blackboard::global();
    global.add_variable("pressure", i32::MAX - 1).expect("add");
    let mut local = Blackboard::local();
    local.add_variable("water", 0).expect("add");

    let pump = [
        Property::effect("water", Operator::Add, 2).expect("effect"),
        Property::effect("pressure", Operator::Add, 1).expect("effect"),
        Property::effect("water", Operator::Add, 3).expect("effect"),
    ];
    let mut world = WorldMut::new(&mut local, &mut global);
    world.apply_effects(&pump).expect("fits");
    assert_eq!(world.get("water"), Ok(TypedValue::Int(5)));
    assert_eq!(world.get("pressure"), Ok(TypedValue::Int(i32::MAX)));

    assert!(matches!(
        world.apply_effects(&pump),
        Err(BlackboardError::Effect { .. })
    ));
    assert_eq!(world.get("water"), Ok(TypedValue::Int(5)));

    world
        .global_mut()
        .add_variable_with_kind("level", ValueKind::Int)
        .expect("add");
    world
        .global_mut()
        .bind_accessor(
            "level",
            "Player/Stats.level()",
            Arc::new(FnAccessor::read_only(|| Some(TypedValue::Int(3)))),
        )
        .expect("bind");
    let level_up = [
        Property::effect("water", Operator::Add, 1).expect("effect"),
        Property::effect("level", Operator::Add, 1).expect("effect"),
    ];
    assert!(matches!(
        world.apply_effects(&level_up),
        Err(BlackboardError::ReadOnlyBinding { .. })
    ));
    assert_eq!(world.get("water"), Ok(TypedValue::Int(5)));
}
