#![cfg(feature = "serde")]

use goap_planner::PlannerConfig;

#[test]
fn defaults_bound_the_search() {
    let config = PlannerConfig::default();
    assert_eq!(config.max_iterations, 300);
    assert_eq!(config.max_retries, 4);
    assert_eq!(config.heuristic_weight, 1.0);
}

#[test]
fn partial_config_fills_in_defaults() {
    let config: PlannerConfig =
        serde_json::from_str(r#"{ "max_iterations": 1000 }"#).expect("config");
    assert_eq!(
        config,
        PlannerConfig {
            max_iterations: 1000,
            ..PlannerConfig::default()
        }
    );
}
