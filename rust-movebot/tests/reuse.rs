use rust_movebot::config::PlannerConfig;
use rust_movebot::runner::{run_instance, run_scenario};
use rust_movebot::scenario;

#[test]
fn cached_plans_are_reused_between_real_frames() {
    let artifact = run_scenario("corridor", PlannerConfig::default(), 0xC0FF_EE01, 600).unwrap();
    let metrics = &artifact.metrics;
    assert!(
        metrics.reuse_hits > 0,
        "an on-path agent should ride its cached plan"
    );
    assert!(
        metrics.sessions < metrics.frames,
        "replanning every frame defeats the fast path: {} sessions / {} frames",
        metrics.sessions,
        metrics.frames
    );
}

#[test]
fn identical_seeds_reproduce_identical_command_logs() {
    let a = run_instance(
        scenario::by_name("corridor").unwrap(),
        PlannerConfig::default(),
        0x5EED_0042,
        400,
    )
    .unwrap();
    let b = run_instance(
        scenario::by_name("corridor").unwrap(),
        PlannerConfig::default(),
        0x5EED_0042,
        400,
    )
    .unwrap();

    assert_eq!(a.commands, b.commands);
    assert_eq!(a.metrics.frames, b.metrics.frames);
    assert_eq!(a.metrics.final_origin, b.metrics.final_origin);
}

#[test]
fn corridor_run_reaches_its_target() {
    let artifact = run_scenario("corridor", PlannerConfig::default(), 0xBEEF_0001, 2_000).unwrap();
    assert!(
        artifact.metrics.reached_at_frame.is_some(),
        "straight corridor should be traversed well within the frame budget"
    );
}
