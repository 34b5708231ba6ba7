//! Camp a held spot: alternate short strafe bursts inside the camp radius
//! and re-aim at either the spot's watch point or a randomized direction,
//! re-rolling the strafe keys on a jittered timeout.

use crate::context::{PlanDeps, SessionData};
use crate::strategies::{CheckOutcome, MovementStrategy, PlanOutcome, StrategyKind};
use crate::trace_cache::EnvTraceCache;
use arena_movement_core::command::BUTTON_WALK;
use arena_movement_core::math::dir_from_angles;
use arena_movement_core::BotInput;

const RE_AIM_MIN_MS: u16 = 600;
const RE_AIM_JITTER_MS: u16 = 500;

pub struct CampSpotStrategy;

impl CampSpotStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl MovementStrategy for CampSpotStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::CampSpot
    }

    fn plan_step(&mut self, session: &mut SessionData, deps: &PlanDeps) -> PlanOutcome {
        let snapshot = session.top_snapshot();
        let camp = session.arena.top().substates.camp;
        if !camp.active {
            return PlanOutcome::SwitchTo(StrategyKind::WalkToBestSpot);
        }

        // Re-roll the dwell strafe on its jittered timeout.
        if !session.arena.top().substates.key_move.active {
            let keys = {
                let mut rng = session.rng;
                let cache = session
                    .arena
                    .top_cache_mut()
                    .traces
                    .get_or_insert_with(EnvTraceCache::new);
                let keys = cache.pick_key_move(deps.env, deps.nav, &snapshot, &mut rng, true);
                session.rng = rng;
                keys
            };
            let (forward, side) = keys.unwrap_or((0, 0));
            let min = deps.cfg.camp_strafe_min_ms as i32;
            let max = deps.cfg.camp_strafe_max_ms as i32;
            let timeout = if max > min {
                session.rng.next_range(min, max) as u16
            } else {
                min as u16
            };
            session
                .arena
                .top_mut()
                .substates
                .activate_key_move(forward as i32, side as i32, timeout);
        }

        // Periodic re-aim: alert camps watch the spot, relaxed ones sweep a
        // randomized direction.
        if !session.arena.top().substates.pending_look.active {
            let (yaw, pitch) = if camp.alert {
                let to = (camp.origin - snapshot.origin).normalized_or_zero();
                (
                    arena_movement_core::math::yaw_of(to),
                    arena_movement_core::math::pitch_of(to),
                )
            } else {
                (session.rng.next_range(-180, 180) as f32, 0.0)
            };
            let timeout = RE_AIM_MIN_MS + session.rng.next_int(RE_AIM_JITTER_MS as u32) as u16;
            session
                .arena
                .top_mut()
                .substates
                .activate_pending_look(yaw, pitch, timeout);
        }

        let substates = session.arena.top().substates;
        let mut command = BotInput::default();
        command.set_forward(substates.key_move.forward as i32);
        command.set_side(substates.key_move.side as i32);
        command.press(BUTTON_WALK);
        command.set_look_dir(dir_from_angles(
            substates.pending_look.yaw,
            substates.pending_look.pitch,
        ));
        session.pending.command = command;
        PlanOutcome::Applied
    }

    fn check_step(&mut self, session: &mut SessionData, _deps: &PlanDeps) -> CheckOutcome {
        if !session.arena.top().substates.camp.active {
            return CheckOutcome::Complete;
        }
        // A camp never needs a deep prediction stack; a few frames are
        // enough to commit the dwell pattern.
        if session.sequence.steps >= 6 {
            return CheckOutcome::Complete;
        }
        CheckOutcome::Continue
    }
}
