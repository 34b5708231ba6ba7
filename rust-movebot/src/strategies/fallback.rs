//! The safe default. Always applicable, always terminates after one step,
//! which keeps the planner from ever stalling with nothing to do.

use crate::context::{PlanDeps, SessionData};
use crate::strategies::{common, CheckOutcome, MovementStrategy, PlanOutcome, StrategyKind};
use arena_movement_core::command::BUTTON_WALK;

pub struct FallbackStrategy;

impl FallbackStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl MovementStrategy for FallbackStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Fallback
    }

    fn plan_step(&mut self, session: &mut SessionData, deps: &PlanDeps) -> PlanOutcome {
        let mut command = common::default_ground_command(session, deps);
        command.press(BUTTON_WALK);
        session.pending.command = command;
        PlanOutcome::Applied
    }

    fn check_step(&mut self, _session: &mut SessionData, _deps: &PlanDeps) -> CheckOutcome {
        CheckOutcome::Complete
    }
}
