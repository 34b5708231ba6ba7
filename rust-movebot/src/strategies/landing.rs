//! Land on one of the areas saved at the jump-pad touch. Candidates are
//! tried in descending score order; the first one reached without a rollback
//! and matching the committed target wins.

use crate::context::{PlanDeps, SessionData};
use crate::strategies::{CheckOutcome, MovementStrategy, PlanOutcome, StopReason, StrategyKind};
use arena_movement_core::math::Vec3;
use arena_movement_core::BotInput;

pub struct LandOnSavedAreasStrategy;

impl LandOnSavedAreasStrategy {
    pub fn new() -> Self {
        Self
    }

    fn candidate_point(deps: &PlanDeps, area: u32) -> Option<Vec3> {
        let bounds = deps.nav.area_bounds(area)?;
        let center = bounds.center();
        Some(Vec3::new(center.x, center.y, bounds.mins.z))
    }
}

impl MovementStrategy for LandOnSavedAreasStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::LandOnSavedAreas
    }

    fn plan_step(&mut self, session: &mut SessionData, deps: &PlanDeps) -> PlanOutcome {
        let Some(candidate) = session.landing.current() else {
            // Out of candidates: this strategy is done for the session and
            // whatever the pad flight turns into is someone else's problem.
            session.disable(StrategyKind::LandOnSavedAreas);
            if session.active == Some(StrategyKind::LandOnSavedAreas) {
                return PlanOutcome::Rollback;
            }
            return PlanOutcome::SwitchTo(StrategyKind::Fallback);
        };
        session.landing.committed = Some(candidate);

        let snapshot = session.top_snapshot();
        let Some(point) = Self::candidate_point(deps, candidate) else {
            session.landing.advance();
            return PlanOutcome::Rollback;
        };

        // Gentle air steering toward the chosen area; full-strength control
        // belongs to the hop family, not a landing approach.
        let mut command = BotInput::default();
        let to = (point - snapshot.origin).normalized_or_zero();
        if to != Vec3::ZERO {
            command.set_look_dir(to);
        }
        command.set_forward(1);
        session.pending.command = command;
        PlanOutcome::Applied
    }

    fn check_step(&mut self, session: &mut SessionData, _deps: &PlanDeps) -> CheckOutcome {
        let snapshot = session.top_snapshot();
        if !snapshot.grounded() {
            return CheckOutcome::Continue;
        }
        let landed_area = if snapshot.area_num != 0 {
            snapshot.area_num
        } else {
            snapshot.dropped_area_num
        };
        if session.landing.committed == Some(landed_area) {
            return CheckOutcome::Complete;
        }
        // Touched down somewhere else: spend the next candidate and retry
        // from the savepoint.
        session.landing.advance();
        CheckOutcome::Rollback
    }

    fn on_sequence_stopped(
        &mut self,
        session: &mut SessionData,
        _deps: &PlanDeps,
        reason: StopReason,
    ) {
        if reason == StopReason::Completed {
            session.landing.committed = None;
        }
    }
}
