use arena_movement_core::constants::{FRAME_QUANTUM_MS, MAX_FRAME_MS};
use arena_movement_core::env::FrameEvents;
use arena_movement_core::snapshot::MOVE_RESTRICTION_SILENT;
use rust_movebot::config::PlannerConfig;
use rust_movebot::context::{PlanRequest, PredictionContext};
use rust_movebot::frames::FrameArena;
use rust_movebot::scenario;
use rust_movebot::strategies::StrategyKind;

#[test]
fn session_restores_agent_state_bit_for_bit() {
    let sc = scenario::by_name("corridor").unwrap();
    let mut planner = PredictionContext::new(PlannerConfig::default(), 7);
    let state = sc.start;
    let before = state;
    let mut substates = sc.substates;

    let mut request = PlanRequest {
        state: &state,
        substates: &mut substates,
        last_events: FrameEvents::default(),
        now_ms: 0,
        target: sc.target,
        has_tracked_enemy: false,
    };
    let _ = planner.frame_input(&mut request, &sc.world, &sc.nav, &sc.spots);

    assert_eq!(state, before);
}

#[test]
fn accepted_steps_respect_quantum_and_capacity() {
    let sc = scenario::by_name("corridor").unwrap();
    let mut planner = PredictionContext::new(PlannerConfig::default(), 11);
    let state = sc.start;
    let mut substates = sc.substates;

    let mut request = PlanRequest {
        state: &state,
        substates: &mut substates,
        last_events: FrameEvents::default(),
        now_ms: 0,
        target: sc.target,
        has_tracked_enemy: false,
    };
    let _ = planner.frame_input(&mut request, &sc.world, &sc.nav, &sc.spots);

    let session = planner.session();
    assert!(session.arena.len() >= 2, "planning accepted no steps");
    assert!(session.arena.len() <= FrameArena::CAPACITY);
    for frame in session.arena.frames() {
        if frame.frame_ms != 0 {
            assert_eq!(frame.frame_ms % FRAME_QUANTUM_MS, 0);
            assert!(frame.frame_ms < MAX_FRAME_MS);
        }
    }
}

#[test]
fn silenced_agent_resolves_without_hop_strategies() {
    let sc = scenario::by_name("corridor").unwrap();
    let mut planner = PredictionContext::new(PlannerConfig::default(), 23);
    let mut state = sc.start;
    state.move_state.restrictions = MOVE_RESTRICTION_SILENT;
    state.physics.velocity = arena_movement_core::math::Vec3::new(420.0, 0.0, 0.0);
    state.physics.ground_entity = Some(arena_movement_core::snapshot::ENTITY_WORLD);
    let mut substates = sc.substates;

    let mut request = PlanRequest {
        state: &state,
        substates: &mut substates,
        last_events: FrameEvents::default(),
        now_ms: 0,
        target: sc.target,
        has_tracked_enemy: true,
    };
    // The suggestion chain must terminate even when its first picks drop
    // out (dodge hands off, the hop family disables itself for silence).
    let _ = planner.frame_input(&mut request, &sc.world, &sc.nav, &sc.spots);

    let session = planner.session();
    assert!(session.arena.len() >= 2);
    for frame in session.arena.frames() {
        let hopped = matches!(
            frame.strategy,
            Some(StrategyKind::BunnyFollowingChain)
                | Some(StrategyKind::BunnyToShortcutArea)
                | Some(StrategyKind::BunnyAlongVelocity)
                | Some(StrategyKind::BunnyInterpolatingChain)
        );
        assert!(!hopped, "a silenced agent must not plan hop steps");
    }
}
