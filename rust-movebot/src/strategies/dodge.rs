//! Combat dodge: while an enemy is tracked, mix semi-random strafes, dashes
//! and crouch-slides, biased toward route-preserving moves when the agent is
//! already close to its travel target. Retries are bounded by a
//! skill-dependent attempt budget.

use crate::context::{PlanDeps, SessionData};
use crate::strategies::{common, CheckOutcome, MovementStrategy, PlanOutcome, StrategyKind};
use crate::trace_cache::EnvTraceCache;
use arena_movement_core::command::BUTTON_SPECIAL;
use arena_movement_core::snapshot::MOVE_FEATURE_DASH;
use arena_movement_core::BotInput;

/// Below this remaining travel time, dodges stop wandering off the route.
const ROUTE_BIAS_TRAVEL_CS: u32 = 500;
/// Steps one dodge sequence predicts before handing control back.
const DODGE_HORIZON_STEPS: u32 = 4;

pub struct CombatDodgeStrategy {
    attempts: u32,
}

impl CombatDodgeStrategy {
    pub fn new() -> Self {
        Self { attempts: 0 }
    }
}

impl MovementStrategy for CombatDodgeStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::CombatDodge
    }

    fn plan_step(&mut self, session: &mut SessionData, deps: &PlanDeps) -> PlanOutcome {
        if !session.has_tracked_enemy {
            return PlanOutcome::SwitchTo(StrategyKind::WalkToBestSpot);
        }
        if self.attempts >= deps.cfg.dodge_attempt_budget() {
            return PlanOutcome::SwitchTo(StrategyKind::WalkToBestSpot);
        }
        self.attempts += 1;

        let snapshot = session.top_snapshot();
        let move_state = session.arena.top().player.move_state;

        let time_pressed = session
            .sequence
            .min_travel_time_cs
            .map(|time| time < ROUTE_BIAS_TRAVEL_CS)
            .unwrap_or(false);

        let keys = {
            let mut rng = session.rng;
            let cache = session
                .arena
                .top_cache_mut()
                .traces
                .get_or_insert_with(EnvTraceCache::new);
            let keys =
                cache.pick_key_move(deps.env, deps.nav, &snapshot, &mut rng, !time_pressed);
            session.rng = rng;
            keys
        };
        let Some((forward, side)) = keys else {
            return PlanOutcome::SwitchTo(StrategyKind::WalkToBestSpot);
        };

        let mut command = BotInput::default();
        command.set_forward(forward as i32);
        command.set_side(side as i32);
        if let Some(point) = common::route_point(session, deps) {
            common::steer_toward(&mut command, &snapshot, point);
            command.set_forward(forward as i32);
        }

        // Spice the strafe with an ability roll: dash, crouch-slide, or
        // nothing.
        let roll = session.rng.next_int(4);
        if roll == 0
            && snapshot.grounded()
            && move_state.has_feature(MOVE_FEATURE_DASH)
            && move_state.dash_cooldown_ms == 0
        {
            command.press(BUTTON_SPECIAL);
            session.pending.frame_ms = 16;
        } else if roll == 1 && snapshot.grounded() && snapshot.planar_speed() > 200.0 {
            command.set_up(-1);
        }

        session.pending.command = command;
        PlanOutcome::Applied
    }

    fn check_step(&mut self, session: &mut SessionData, deps: &PlanDeps) -> CheckOutcome {
        if common::movement_completed(session, deps) {
            return CheckOutcome::Complete;
        }
        // Dodging is a short-horizon activity; commit a few frames and let
        // the next session re-roll.
        if session.sequence.steps >= DODGE_HORIZON_STEPS {
            return CheckOutcome::Complete;
        }
        CheckOutcome::Continue
    }

    fn on_sequence_started(&mut self, _session: &mut SessionData, _deps: &PlanDeps) {
        self.attempts = 0;
    }
}
