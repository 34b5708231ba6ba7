//! The bunny-hop family. All four variants share the same step skeleton
//! (keep hopping, dash when it is free speed, walljump out of corners, and
//! nudge the airborne velocity toward the intended line) and differ only in
//! how they pick that intended direction.

use crate::context::{PlanDeps, SessionData};
use crate::strategies::{common, CheckOutcome, MovementStrategy, PlanOutcome, StrategyKind};
use crate::trace_cache::EnvTraceCache;
use arena_movement_core::command::BUTTON_SPECIAL;
use arena_movement_core::constants::DEFAULT_FRAME_MS;
use arena_movement_core::constants::DEFAULT_RUN_SPEED_UPS;
use arena_movement_core::math::Vec3;
use arena_movement_core::snapshot::{
    PhysicsSnapshot, PlayerMoveState, MOVE_FEATURE_DASH, MOVE_FEATURE_WALLJUMP,
    MOVE_RESTRICTION_SILENT,
};
use arena_movement_core::BotInput;

/// Hop-sustaining jumps start once this fraction of run speed is reached.
const HOP_SPEED_FRACTION: f32 = 0.55;
/// Minimum planar speed for the velocity-direction variant to make sense.
const VELOCITY_VARIANT_MIN_FRACTION: f32 = 0.5;
/// How many chain entries the shortcut variant will look ahead.
const SHORTCUT_LOOKAHEAD: usize = 4;
/// Steps one hop sequence predicts before the plan counts as far enough.
const HOP_HORIZON_STEPS: u32 = 16;

const VARIANTS: [StrategyKind; 4] = [
    StrategyKind::BunnyFollowingChain,
    StrategyKind::BunnyToShortcutArea,
    StrategyKind::BunnyAlongVelocity,
    StrategyKind::BunnyInterpolatingChain,
];

/// The variant tried when this one has no usable intended direction.
fn next_variant(kind: StrategyKind) -> StrategyKind {
    match kind {
        StrategyKind::BunnyFollowingChain => StrategyKind::BunnyToShortcutArea,
        StrategyKind::BunnyToShortcutArea => StrategyKind::BunnyAlongVelocity,
        StrategyKind::BunnyAlongVelocity => StrategyKind::BunnyInterpolatingChain,
        _ => StrategyKind::WalkToBestSpot,
    }
}

/// Extra acceleration available to the hop family, fading linearly from full
/// strength at the threshold speed to nothing at the ceiling, scaled by the
/// class speed limit.
fn assist_strength(deps: &PlanDeps, move_state: &PlayerMoveState, speed: f32) -> f32 {
    let cfg = deps.cfg;
    let class_scale = move_state.max_ground_speed / DEFAULT_RUN_SPEED_UPS;
    if speed <= cfg.assist_full_speed {
        return cfg.assist_accel_max * class_scale;
    }
    if speed >= cfg.assist_ceiling_speed {
        return 0.0;
    }
    let fade =
        (cfg.assist_ceiling_speed - speed) / (cfg.assist_ceiling_speed - cfg.assist_full_speed);
    cfg.assist_accel_max * fade * class_scale
}

/// Airborne steering correction: rotate the horizontal velocity toward the
/// intended direction without changing speed. Near-aligned movement gets the
/// full scripted correction; anything else a gentler blend.
fn air_steering_override(
    deps: &PlanDeps,
    snapshot: &PhysicsSnapshot,
    move_state: &PlayerMoveState,
    intended: Vec3,
) -> Option<Vec3> {
    let speed = snapshot.planar_speed();
    if speed < 1.0 {
        return None;
    }
    let assist = assist_strength(deps, move_state, speed);
    if assist <= 0.0 {
        return None;
    }

    let velocity_dir = snapshot.velocity.horizontal().normalized_or_zero();
    let aligned = velocity_dir.dot(intended) >= deps.cfg.straight_alignment_dot;
    let blend = if aligned { 1.0 } else { 0.35 };

    let dt = DEFAULT_FRAME_MS as f32 / 1000.0;
    let nudged = snapshot.velocity.horizontal() + intended * (assist * blend * dt);
    let redirected = nudged.normalized_or_zero() * speed;
    Some(Vec3::new(redirected.x, redirected.y, snapshot.velocity.z))
}

/// Shared per-step skeleton for every variant.
fn plan_hop(
    session: &mut SessionData,
    deps: &PlanDeps,
    kind: StrategyKind,
    intended: Option<Vec3>,
) -> PlanOutcome {
    let snapshot = session.top_snapshot();
    let move_state = session.arena.top().player.move_state;

    if move_state.is_restricted(MOVE_RESTRICTION_SILENT) {
        // Systemic: hopping is loud. Drop the whole family for the session.
        for variant in VARIANTS {
            session.disable(variant);
        }
        return PlanOutcome::SwitchTo(StrategyKind::WalkToBestSpot);
    }
    if !common::bunnying_allowed(&snapshot, &move_state) {
        return PlanOutcome::SwitchTo(StrategyKind::WalkToBestSpot);
    }

    let intended = intended
        .map(|dir| dir.horizontal().normalized_or_zero())
        .filter(|dir| *dir != Vec3::ZERO);
    let Some(intended) = intended else {
        return PlanOutcome::SwitchTo(next_variant(kind));
    };

    let corrected = {
        let cache = session
            .arena
            .top_cache_mut()
            .traces
            .get_or_insert_with(EnvTraceCache::new);
        cache.correct_intended_dir(deps.env, deps.nav, &snapshot, intended)
    };

    let mut command = BotInput::default();
    command.set_look_dir(corrected);
    command.set_forward(1);
    let mut frame_ms = 0u32;

    let speed = snapshot.planar_speed();
    if snapshot.grounded() {
        let dash_ready = move_state.has_feature(MOVE_FEATURE_DASH)
            && move_state.dash_cooldown_ms == 0
            && speed < move_state.dash_speed;
        if dash_ready && !common::run_blocked_ahead(session, deps) {
            command.press(BUTTON_SPECIAL);
            // Dashes are timing-sensitive; predict them at the quantum.
            frame_ms = 16;
        } else if speed >= move_state.max_ground_speed * HOP_SPEED_FRACTION {
            command.set_up(1);
        }
    } else {
        let walljump_ready = move_state.has_feature(MOVE_FEATURE_WALLJUMP)
            && move_state.walljump_cooldown_ms == 0
            && snapshot.velocity.z < 0.0;
        if walljump_ready && common::run_blocked_ahead(session, deps) {
            command.press(BUTTON_SPECIAL);
            frame_ms = 16;
        } else if let Some(velocity) =
            air_steering_override(deps, &snapshot, &move_state, corrected)
        {
            command.set_velocity_override(velocity);
        }
    }

    session.pending.command = command;
    session.pending.frame_ms = frame_ms;
    PlanOutcome::Applied
}

fn check_hop(session: &mut SessionData, deps: &PlanDeps) -> CheckOutcome {
    if common::movement_completed(session, deps) {
        return CheckOutcome::Complete;
    }
    if session.sequence.steps >= HOP_HORIZON_STEPS {
        return CheckOutcome::Complete;
    }
    common::check_speed_change(session, deps)
}

pub struct BunnyFollowingChainStrategy;

impl BunnyFollowingChainStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl MovementStrategy for BunnyFollowingChainStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::BunnyFollowingChain
    }

    fn plan_step(&mut self, session: &mut SessionData, deps: &PlanDeps) -> PlanOutcome {
        let snapshot = session.top_snapshot();
        let intended =
            common::route_point(session, deps).map(|point| point - snapshot.origin);
        plan_hop(session, deps, self.kind(), intended)
    }

    fn check_step(&mut self, session: &mut SessionData, deps: &PlanDeps) -> CheckOutcome {
        check_hop(session, deps)
    }
}

pub struct BunnyToShortcutAreaStrategy;

impl BunnyToShortcutAreaStrategy {
    pub fn new() -> Self {
        Self
    }

    /// Furthest chain point within the lookahead that a straight probe can
    /// reach; skipping intermediate reaches is the whole point.
    fn shortcut_point(session: &mut SessionData, deps: &PlanDeps) -> Option<Vec3> {
        let snapshot = session.top_snapshot();
        let candidates: Vec<Vec3> = common::cached_reach_chain(session, deps)
            .iter()
            .skip(1)
            .take(SHORTCUT_LOOKAHEAD)
            .map(|reach| reach.end)
            .collect();
        let mut best = None;
        for point in candidates {
            let probe = deps.env.trace(
                snapshot.origin,
                point,
                arena_movement_core::trace::BoxBounds::standing_player(),
            );
            if !probe.hit() {
                best = Some(point);
            }
        }
        best
    }
}

impl MovementStrategy for BunnyToShortcutAreaStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::BunnyToShortcutArea
    }

    fn plan_step(&mut self, session: &mut SessionData, deps: &PlanDeps) -> PlanOutcome {
        let snapshot = session.top_snapshot();
        let intended =
            Self::shortcut_point(session, deps).map(|point| point - snapshot.origin);
        plan_hop(session, deps, self.kind(), intended)
    }

    fn check_step(&mut self, session: &mut SessionData, deps: &PlanDeps) -> CheckOutcome {
        check_hop(session, deps)
    }
}

pub struct BunnyAlongVelocityStrategy;

impl BunnyAlongVelocityStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl MovementStrategy for BunnyAlongVelocityStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::BunnyAlongVelocity
    }

    fn plan_step(&mut self, session: &mut SessionData, deps: &PlanDeps) -> PlanOutcome {
        let snapshot = session.top_snapshot();
        let move_state = session.arena.top().player.move_state;
        let intended = if snapshot.planar_speed()
            >= move_state.max_ground_speed * VELOCITY_VARIANT_MIN_FRACTION
        {
            Some(snapshot.velocity.horizontal())
        } else {
            None
        };
        plan_hop(session, deps, self.kind(), intended)
    }

    fn check_step(&mut self, session: &mut SessionData, deps: &PlanDeps) -> CheckOutcome {
        check_hop(session, deps)
    }
}

pub struct BunnyInterpolatingChainStrategy;

impl BunnyInterpolatingChainStrategy {
    pub fn new() -> Self {
        Self
    }

    fn interpolated_dir(session: &mut SessionData, deps: &PlanDeps) -> Option<Vec3> {
        let snapshot = session.top_snapshot();
        let chain = common::cached_reach_chain(session, deps);
        if chain.is_empty() {
            return None;
        }
        const WEIGHTS: [f32; 4] = [0.4, 0.3, 0.2, 0.1];
        let mut blended = Vec3::ZERO;
        for (reach, weight) in chain.iter().zip(WEIGHTS) {
            blended += (reach.end - snapshot.origin).normalized_or_zero() * weight;
        }
        let dir = blended.normalized_or_zero();
        if dir == Vec3::ZERO {
            None
        } else {
            Some(dir)
        }
    }
}

impl MovementStrategy for BunnyInterpolatingChainStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::BunnyInterpolatingChain
    }

    fn plan_step(&mut self, session: &mut SessionData, deps: &PlanDeps) -> PlanOutcome {
        let intended = Self::interpolated_dir(session, deps);
        plan_hop(session, deps, self.kind(), intended)
    }

    fn check_step(&mut self, session: &mut SessionData, deps: &PlanDeps) -> CheckOutcome {
        check_hop(session, deps)
    }
}
