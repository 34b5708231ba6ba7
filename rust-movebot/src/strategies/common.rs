//! Helpers shared across the strategy family: route following, the default
//! ground command, speed-loss detection, and the applicability predicates.
//! All free functions taking the session state by parameter.

use crate::context::{PlanDeps, SessionData, SpeedLoss};
use crate::strategies::CheckOutcome;
use arena_movement_core::math::Vec3;
use arena_movement_core::nav::Reach;
use arena_movement_core::snapshot::{
    PhysicsSnapshot, PlayerMoveState, MOVE_RESTRICTION_SILENT, WATER_LEVEL_WAIST,
};
use arena_movement_core::trace::BoxBounds;
use arena_movement_core::BotInput;

/// A route point closer than this counts as reached; steer for the next one.
pub const ROUTE_POINT_REACHED_UNITS: f32 = 24.0;
pub const REACH_CHAIN_LIMIT: usize = 12;
pub const NEAR_TARGET_UNITS: f32 = 192.0;
pub const NEAR_TARGET_TRAVEL_CS: u32 = 150;
const RUN_PROBE_UNITS: f32 = 48.0;

/// Look at `point` and move forward. Ground steering keeps the gaze level
/// unless the point is strongly above or below.
pub fn steer_toward(command: &mut BotInput, snapshot: &PhysicsSnapshot, point: Vec3) {
    let mut to = point - snapshot.origin;
    if to.z.abs() < to.horizontal_length() * 0.5 {
        to.z = 0.0;
    }
    let dir = to.normalized_or_zero();
    if dir != Vec3::ZERO {
        command.set_look_dir(dir);
    }
    command.set_forward(1);
}

/// The reach chain from the current frame toward the nav target, computed at
/// most once per stack depth.
pub fn cached_reach_chain<'a>(session: &'a mut SessionData, deps: &PlanDeps) -> &'a [Reach] {
    let area = session.current_area();
    let target = session.nav_target;
    let flags = session.travel_flags;
    let cache = session.arena.top_cache_mut();
    if cache.reach_chain.is_none() {
        let mut chain = Vec::new();
        if area != 0 && target.area != 0 && area != target.area {
            deps.nav
                .reach_chain(area, target.area, flags, REACH_CHAIN_LIMIT, &mut chain);
        }
        cache.reach_chain = Some(chain);
    }
    cache.reach_chain.as_deref().unwrap_or(&[])
}

/// Next point to move through on the way to the nav target.
pub fn route_point(session: &mut SessionData, deps: &PlanDeps) -> Option<Vec3> {
    let snapshot = session.top_snapshot();
    let target = session.nav_target;
    if target.area != 0 && session.current_area() == target.area {
        return Some(target.origin);
    }
    let chain = cached_reach_chain(session, deps);
    let first = chain.first()?;
    let reached = snapshot
        .origin
        .horizontal()
        .distance_to(first.start.horizontal())
        < ROUTE_POINT_REACHED_UNITS;
    Some(if reached { first.end } else { first.start })
}

/// Default input when nothing cleverer applies: run toward the route.
/// Cached per depth since repeated re-entry after rollbacks asks again.
pub fn default_ground_command(session: &mut SessionData, deps: &PlanDeps) -> BotInput {
    if let Some(cached) = session.arena.top_cache_mut().default_command {
        return cached;
    }
    let snapshot = session.top_snapshot();
    let point = route_point(session, deps).unwrap_or(session.nav_target.origin);
    let mut command = BotInput::default();
    steer_toward(&mut command, &snapshot, point);
    session.arena.top_cache_mut().default_command = Some(command);
    command
}

/// Whether a straight run from the current frame is about to hit something.
pub fn run_blocked_ahead(session: &mut SessionData, deps: &PlanDeps) -> bool {
    if let Some(cached) = session.arena.top_cache_mut().hazard_ahead {
        return cached;
    }
    let snapshot = session.top_snapshot();
    let dir = {
        let velocity_dir = snapshot.velocity.horizontal().normalized_or_zero();
        if velocity_dir == Vec3::ZERO {
            snapshot.forward_dir().horizontal().normalized_or_zero()
        } else {
            velocity_dir
        }
    };
    let blocked = if dir == Vec3::ZERO {
        false
    } else {
        deps.env
            .trace(
                snapshot.origin,
                snapshot.origin + dir * RUN_PROBE_UNITS,
                BoxBounds::standing_player(),
            )
            .hit()
    };
    session.arena.top_cache_mut().hazard_ahead = Some(blocked);
    blocked
}

pub fn near_nav_target(session: &SessionData, deps: &PlanDeps) -> bool {
    let target = session.nav_target;
    if target.area == 0 {
        return false;
    }
    let area = session.current_area();
    if area == target.area {
        return true;
    }
    let snapshot = session.top_snapshot();
    if snapshot.origin.distance_to(target.origin) < NEAR_TARGET_UNITS {
        return true;
    }
    if area != 0 {
        if let Some(time) = deps.nav.travel_time(area, target.area, session.travel_flags) {
            return time < NEAR_TARGET_TRAVEL_CS;
        }
    }
    false
}

pub fn bunnying_allowed(snapshot: &PhysicsSnapshot, move_state: &PlayerMoveState) -> bool {
    !move_state.is_restricted(MOVE_RESTRICTION_SILENT)
        && snapshot.water_level < WATER_LEVEL_WAIST
        && move_state.stun_ms == 0
}

/// Classify this step's planar speed change and roll back once any pattern
/// outlives its tolerance: a wall bump (near-zero speed after high speed), a
/// bounce-back (reversed horizontal direction), or deceleration beyond the
/// tolerable per-second rate. Being at or near the nav target excuses all
/// three.
pub fn check_speed_change(session: &mut SessionData, deps: &PlanDeps) -> CheckOutcome {
    let Some(prev_frame) = session.arena.below_top() else {
        return CheckOutcome::Continue;
    };
    let prev = prev_frame.player.physics;
    let frame_ms = prev_frame.frame_ms.max(1);
    let now = session.top_snapshot();

    if near_nav_target(session, deps) {
        session.loss = SpeedLoss::default();
        return CheckOutcome::Continue;
    }

    let prev_area = if prev.area_num != 0 {
        prev.area_num
    } else {
        prev.dropped_area_num
    };
    if prev_area != session.current_area() {
        // An area transition explains most legitimate speed changes
        // (ledge drops, pads, stairs).
        session.loss = SpeedLoss::default();
        return CheckOutcome::Continue;
    }

    let cfg = deps.cfg;
    let prev_speed = prev.planar_speed();
    let now_speed = now.planar_speed();
    let dt = frame_ms as f32 / 1000.0;

    let wall_bump = prev_speed > cfg.wall_bump_prev_speed && now_speed < cfg.wall_bump_now_speed;
    session.loss.wall_ms = if wall_bump {
        session.loss.wall_ms + frame_ms
    } else {
        0
    };

    let bounced = prev_speed > cfg.wall_bump_prev_speed
        && now_speed > cfg.wall_bump_now_speed
        && prev
            .velocity
            .horizontal()
            .normalized_or_zero()
            .dot(now.velocity.horizontal().normalized_or_zero())
            < cfg.bounce_back_dot;
    session.loss.bounce_ms = if bounced {
        session.loss.bounce_ms + frame_ms
    } else {
        0
    };

    let decelerating = (prev_speed - now_speed) / dt > cfg.tolerable_decel_ups;
    session.loss.decel_ms = if decelerating {
        session.loss.decel_ms + frame_ms
    } else {
        0
    };

    if session.loss.wall_ms > cfg.wall_bump_tolerance_ms
        || session.loss.bounce_ms > cfg.bounce_tolerance_ms
        || session.loss.decel_ms > cfg.decel_tolerance_ms
    {
        return CheckOutcome::Rollback;
    }
    CheckOutcome::Continue
}

/// Whether the plan has predicted enough: a settled dwell in the target
/// area, or a confirmed landing with speed kept.
pub fn movement_completed(session: &SessionData, deps: &PlanDeps) -> bool {
    if session.nav_target.area != 0 && session.target_dwell_ms >= deps.cfg.target_dwell_ms {
        return true;
    }
    session.ground_distance_since_landing >= deps.cfg.landing_confirmation_units
        && session.top_snapshot().planar_speed() > deps.cfg.wall_bump_prev_speed
}
