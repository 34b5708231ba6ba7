//! Ride a moving platform: idle while it carries the agent, then walk off
//! through the least obstructed exit once it stops rising.

use crate::context::{PlanDeps, SessionData};
use crate::strategies::{common, CheckOutcome, MovementStrategy, PlanOutcome, StrategyKind};
use crate::trace_cache::EnvTraceCache;
use arena_movement_core::BotInput;

/// Forced exit key-move duration once the platform tops out.
const EXIT_KEY_MOVE_MS: u16 = 320;

pub struct RidePlatformStrategy;

impl RidePlatformStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl MovementStrategy for RidePlatformStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::RidePlatform
    }

    fn plan_step(&mut self, session: &mut SessionData, deps: &PlanDeps) -> PlanOutcome {
        let riding = session.arena.top().events.touched_platform.is_some();
        if riding {
            // The platform does the moving; pin the gaze on the route so
            // the exit step starts aligned.
            let snapshot = session.top_snapshot();
            let mut command = BotInput::default();
            if let Some(point) = common::route_point(session, deps) {
                let to = (point - snapshot.origin).horizontal().normalized_or_zero();
                if to != arena_movement_core::math::Vec3::ZERO {
                    command.set_look_dir(to);
                }
            }
            session.pending.command = command;
            return PlanOutcome::Applied;
        }

        // Top state reached: leave through an open direction.
        let snapshot = session.top_snapshot();
        if session.arena.top().substates.key_move.active {
            return PlanOutcome::SwitchTo(StrategyKind::WalkToBestSpot);
        }
        let keys = {
            let mut rng = session.rng;
            let cache = session
                .arena
                .top_cache_mut()
                .traces
                .get_or_insert_with(EnvTraceCache::new);
            let keys = cache.pick_key_move(deps.env, deps.nav, &snapshot, &mut rng, false);
            session.rng = rng;
            keys
        };
        match keys {
            Some((forward, side)) => {
                session
                    .arena
                    .top_mut()
                    .substates
                    .activate_key_move(forward as i32, side as i32, EXIT_KEY_MOVE_MS);
                PlanOutcome::SwitchTo(StrategyKind::WalkToBestSpot)
            }
            None => PlanOutcome::SwitchTo(StrategyKind::Fallback),
        }
    }

    fn check_step(&mut self, session: &mut SessionData, _deps: &PlanDeps) -> CheckOutcome {
        // A slow ride would eat the whole stack; commit a stretch and let
        // the next session resume from higher up.
        if session.sequence.steps >= 20 {
            return CheckOutcome::Complete;
        }
        let top = session.arena.top();
        if top.events.touched_platform.is_some() {
            return CheckOutcome::Continue;
        }
        if top.player.physics.grounded() {
            CheckOutcome::Complete
        } else {
            CheckOutcome::Continue
        }
    }
}
