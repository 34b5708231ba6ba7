use arena_movement_core::command::BUTTON_SPECIAL;
use arena_movement_core::env::FrameEvents;
use arena_movement_core::math::Vec3;
use arena_movement_core::snapshot::{EntityId, ENTITY_WORLD, WATER_LEVEL_HEAD};
use rust_movebot::config::PlannerConfig;
use rust_movebot::context::{PlanRequest, PredictionContext};
use rust_movebot::scenario;
use rust_movebot::strategies::StrategyKind;

#[test]
fn submerged_agent_plans_with_the_swim_strategy() {
    let sc = scenario::by_name("water-pool").unwrap();
    let mut planner = PredictionContext::new(PlannerConfig::default(), 3);
    let mut state = sc.start;
    state.physics.origin = Vec3::new(700.0, 0.0, -100.0);
    state.physics.ground_entity = None;
    state.physics.water_level = WATER_LEVEL_HEAD;
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

    let first = &planner.session().arena.frames()[0];
    assert_eq!(first.strategy, Some(StrategyKind::Swim));
    assert_eq!(first.command.forward, 1);
    assert!(!first.command.is_pressed(BUTTON_SPECIAL));
}

#[test]
fn jumppad_touch_arms_flight_and_completes_the_same_step() {
    let sc = scenario::by_name("jumppad-hall").unwrap();
    let mut planner = PredictionContext::new(PlannerConfig::default(), 5);
    let mut state = sc.start;
    state.physics.origin = Vec3::new(576.0, 0.0, 40.0);
    state.physics.velocity = Vec3::new(260.0, 0.0, 620.0);
    state.physics.ground_entity = None;
    let mut substates = sc.substates;

    let mut events = FrameEvents::default();
    events.touched_jumppad = Some((EntityId(1), Vec3::new(1100.0, 0.0, 0.0)));

    let mut request = PlanRequest {
        state: &state,
        substates: &mut substates,
        last_events: events,
        now_ms: 0,
        target: sc.target,
        has_tracked_enemy: false,
    };
    let command = planner.frame_input(&mut request, &sc.world, &sc.nav, &sc.spots);

    // The handler clears the input and finishes in one predicted step.
    assert_eq!(command.forward, 0);
    assert_eq!(command.buttons, 0);

    let session = planner.session();
    assert_eq!(session.arena.len(), 2);
    assert_eq!(
        session.arena.frames()[0].strategy,
        Some(StrategyKind::HandleTriggeredJumppad)
    );
    assert!(session.landing.count >= 1, "no landing areas were saved");
    // The committed bundle the agent carries forward has the flight armed.
    assert!(substates.flight.active);
    assert!(substates.jumppad.active);
}

#[test]
fn full_speed_run_with_dash_ready_plans_a_quantum_dash_step() {
    let sc = scenario::by_name("corridor").unwrap();
    let mut planner = PredictionContext::new(PlannerConfig::default(), 9);
    let mut state = sc.start;
    state.physics.velocity = Vec3::new(480.0, 0.0, 0.0);
    state.physics.yaw = 0.0;
    state.physics.ground_entity = Some(ENTITY_WORLD);
    let mut substates = sc.substates;

    let mut request = PlanRequest {
        state: &state,
        substates: &mut substates,
        last_events: FrameEvents::default(),
        now_ms: 0,
        target: sc.target,
        has_tracked_enemy: false,
    };
    let command = planner.frame_input(&mut request, &sc.world, &sc.nav, &sc.spots);

    assert!(command.is_pressed(BUTTON_SPECIAL), "dash button not set");
    let first = &planner.session().arena.frames()[0];
    assert_eq!(first.frame_ms, 16, "dash steps must use the quantum");
    assert!(matches!(
        first.strategy,
        Some(StrategyKind::BunnyFollowingChain)
    ));
}

#[test]
fn active_camp_state_selects_the_camp_strategy() {
    use arena_movement_core::command::BUTTON_WALK;

    let sc = scenario::by_name("corridor").unwrap();
    let mut planner = PredictionContext::new(PlannerConfig::default(), 17);
    let mut state = sc.start;
    state.physics.ground_entity = Some(ENTITY_WORLD);
    let mut substates = sc.substates;
    substates.activate_camp(state.physics.origin, 128.0, false, 0);

    let mut request = PlanRequest {
        state: &state,
        substates: &mut substates,
        last_events: FrameEvents::default(),
        now_ms: 0,
        target: sc.target,
        has_tracked_enemy: false,
    };
    let command = planner.frame_input(&mut request, &sc.world, &sc.nav, &sc.spots);

    assert_eq!(
        planner.session().arena.frames()[0].strategy,
        Some(StrategyKind::CampSpot)
    );
    assert!(command.is_pressed(BUTTON_WALK), "camping moves quietly");
}

#[test]
fn platform_touch_selects_the_ride_strategy_and_idles() {
    let sc = scenario::by_name("platform-tower").unwrap();
    let mut planner = PredictionContext::new(PlannerConfig::default(), 19);
    let mut state = sc.start;
    // Standing on the rising platform body, partway up.
    state.physics.origin = Vec3::new(608.0, 0.0, 80.0);
    state.physics.ground_entity = Some(EntityId(1));
    let mut substates = sc.substates;

    let mut events = FrameEvents::default();
    events.touched_platform = Some(EntityId(1));

    let mut request = PlanRequest {
        state: &state,
        substates: &mut substates,
        last_events: events,
        now_ms: 0,
        target: sc.target,
        has_tracked_enemy: false,
    };
    let command = planner.frame_input(&mut request, &sc.world, &sc.nav, &sc.spots);

    assert_eq!(
        planner.session().arena.frames()[0].strategy,
        Some(StrategyKind::RidePlatform)
    );
    // Riding means no movement keys; the platform does the work.
    assert_eq!(command.forward, 0);
    assert_eq!(command.side, 0);
    assert_eq!(command.up, 0);
}

#[test]
fn running_into_a_dead_end_wall_rolls_the_plan_back() {
    use arena_movement_core::nav::{GridNav, TravelType};
    use arena_movement_core::sim::MoveWorld;
    use arena_movement_core::snapshot::{PhysicsSnapshot, PlayerState};
    use arena_movement_core::substate::SubStateBundle;
    use arena_movement_core::tactical::{SpotRegistry, TacticalSpot};
    use arena_movement_core::trace::BoxBounds;
    use rust_movebot::context::NavTarget;

    // Narrow corridor, full-width wall, and a target on the far side only
    // reachable through an expensive detour the wall bump cannot excuse.
    let mut world = MoveWorld::new(BoxBounds::new(
        Vec3::new(-128.0, -64.0, 0.0),
        Vec3::new(768.0, 64.0, 512.0),
    ));
    world.add_brush(BoxBounds::new(
        Vec3::new(-128.0, -64.0, -16.0),
        Vec3::new(768.0, 64.0, 0.0),
    ));
    world.add_brush(BoxBounds::new(
        Vec3::new(200.0, -64.0, 0.0),
        Vec3::new(264.0, 64.0, 512.0),
    ));

    let mut nav = GridNav::new();
    let near = nav.add_area(
        BoxBounds::new(Vec3::new(-128.0, -64.0, 0.0), Vec3::new(200.0, 64.0, 160.0)),
        true,
    );
    let far = nav.add_area(
        BoxBounds::new(Vec3::new(264.0, -64.0, 0.0), Vec3::new(768.0, 64.0, 160.0)),
        true,
    );
    nav.link_bidir(near, far, TravelType::Jump, 300);

    let spots = SpotRegistry::new(
        vec![TacticalSpot {
            point: Vec3::new(500.0, 0.0, 0.0),
            area: far,
        }],
        256.0,
    );

    let state = PlayerState {
        physics: PhysicsSnapshot {
            origin: Vec3::new(0.0, 0.0, 0.5),
            velocity: Vec3::new(450.0, 0.0, 0.0),
            ground_entity: Some(ENTITY_WORLD),
            ..Default::default()
        },
        ..Default::default()
    };
    let mut substates = SubStateBundle::default();

    let mut planner = PredictionContext::new(PlannerConfig::default(), 13);
    let mut request = PlanRequest {
        state: &state,
        substates: &mut substates,
        last_events: FrameEvents::default(),
        now_ms: 0,
        target: NavTarget {
            area: far,
            origin: Vec3::new(500.0, 0.0, 0.0),
        },
    has_tracked_enemy: false,
    };
    let _ = planner.frame_input(&mut request, &world, &nav, &spots);

    assert!(
        planner.stats().rollbacks >= 1,
        "losing all speed against the wall must request a rollback"
    );
}
