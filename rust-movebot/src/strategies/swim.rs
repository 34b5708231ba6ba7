//! Underwater movement: steer along the route (or toward the surface when
//! there is none), and pop out at a surface-exit reachability edge.

use crate::context::{PlanDeps, SessionData};
use crate::strategies::{common, CheckOutcome, MovementStrategy, PlanOutcome, StrategyKind};
use arena_movement_core::math::Vec3;
use arena_movement_core::nav::TravelType;
use arena_movement_core::snapshot::WATER_LEVEL_WAIST;
use arena_movement_core::BotInput;

/// Distance to a surface-exit edge at which the swim starts pushing up and
/// out of the water.
const SURFACE_EXIT_UNITS: f32 = 24.0;

pub struct SwimStrategy;

impl SwimStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl MovementStrategy for SwimStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Swim
    }

    fn plan_step(&mut self, session: &mut SessionData, deps: &PlanDeps) -> PlanOutcome {
        let snapshot = session.top_snapshot();
        if snapshot.water_level < WATER_LEVEL_WAIST {
            return PlanOutcome::SwitchTo(StrategyKind::WalkToBestSpot);
        }

        let mut command = BotInput::default();
        command.set_forward(1);

        let exit_edge = common::cached_reach_chain(session, deps)
            .iter()
            .find(|reach| reach.travel_type != TravelType::Swim)
            .copied();

        if let Some(point) = common::route_point(session, deps) {
            let to = (point - snapshot.origin).normalized_or_zero();
            if to != Vec3::ZERO {
                command.set_look_dir(to);
            }
        } else {
            // No route: swim ahead, pitched toward the surface.
            let forward = snapshot.forward_dir().horizontal().normalized_or_zero();
            let dir = (forward + Vec3::UP * 0.5).normalized_or_zero();
            command.set_look_dir(dir);
            command.set_up(1);
        }

        if let Some(edge) = exit_edge {
            if snapshot.origin.distance_to(edge.start) < SURFACE_EXIT_UNITS {
                command.set_up(1);
            }
        }

        session.pending.command = command;
        PlanOutcome::Applied
    }

    fn check_step(&mut self, session: &mut SessionData, _deps: &PlanDeps) -> CheckOutcome {
        if session.top_snapshot().water_level < WATER_LEVEL_WAIST {
            return CheckOutcome::Complete;
        }
        // A long crossing does not need the whole stack; commit a stretch
        // and replan from the middle of the pool.
        if session.sequence.steps >= 24 {
            return CheckOutcome::Complete;
        }
        CheckOutcome::Continue
    }
}
