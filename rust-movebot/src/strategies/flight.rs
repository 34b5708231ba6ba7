//! Airborne after a jump pad: hold steady and watch for the landing window,
//! then hand off to the saved-areas landing strategy.

use crate::context::{PlanDeps, SessionData};
use crate::strategies::{CheckOutcome, MovementStrategy, PlanOutcome, StrategyKind};
use arena_movement_core::math::Vec3;
use arena_movement_core::BotInput;

/// Proximity to the flight target that opens the landing window.
const LANDING_PROXIMITY_UNITS: f32 = 96.0;

pub struct FlyUntilLandingStrategy;

impl FlyUntilLandingStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl MovementStrategy for FlyUntilLandingStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::FlyUntilLanding
    }

    fn plan_step(&mut self, session: &mut SessionData, _deps: &PlanDeps) -> PlanOutcome {
        let snapshot = session.top_snapshot();
        let flight = session.arena.top().substates.flight;
        if !flight.active {
            return PlanOutcome::SwitchTo(StrategyKind::WalkToBestSpot);
        }

        let window_open = snapshot.origin.z <= flight.trigger_z
            || snapshot.origin.distance_to(flight.target) < LANDING_PROXIMITY_UNITS;
        if window_open && session.landing.count > 0 {
            return PlanOutcome::SwitchTo(StrategyKind::LandOnSavedAreas);
        }

        // Mid-flight: no inputs, just keep the gaze on where this ends.
        let mut command = BotInput::default();
        let to = (flight.target - snapshot.origin).normalized_or_zero();
        if to != Vec3::ZERO {
            command.set_look_dir(to);
        }
        session.pending.command = command;
        PlanOutcome::Applied
    }

    fn check_step(&mut self, session: &mut SessionData, _deps: &PlanDeps) -> CheckOutcome {
        if session.top_snapshot().grounded() {
            return CheckOutcome::Complete;
        }
        if session.sequence.steps >= 32 {
            return CheckOutcome::Complete;
        }
        CheckOutcome::Continue
    }
}
