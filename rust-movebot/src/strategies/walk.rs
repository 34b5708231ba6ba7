//! Default ground locomotion: ask the tactical-spot subsystem for a walkable
//! point close to the travel target and run there, honoring any short-lived
//! forced key move left behind by another strategy.

use crate::context::{PlanDeps, SessionData};
use crate::strategies::{common, CheckOutcome, MovementStrategy, PlanOutcome, StrategyKind};
use arena_movement_core::command::BUTTON_WALK;
use arena_movement_core::snapshot::MOVE_RESTRICTION_SILENT;
use arena_movement_core::tactical::SpotProfile;
use arena_movement_core::BotInput;

const SPOT_SEARCH_RADIUS: f32 = 384.0;
/// Frames one walk sequence will predict before calling the plan good.
const WALK_HORIZON_STEPS: u32 = 24;

pub struct WalkToBestSpotStrategy;

impl WalkToBestSpotStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl MovementStrategy for WalkToBestSpotStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::WalkToBestSpot
    }

    fn plan_step(&mut self, session: &mut SessionData, deps: &PlanDeps) -> PlanOutcome {
        let snapshot = session.top_snapshot();
        let move_state = session.arena.top().player.move_state;

        let mut command = BotInput::default();

        let key_move = session.arena.top().substates.key_move;
        if key_move.active {
            command.set_forward(key_move.forward as i32);
            command.set_side(key_move.side as i32);
            if let Some(point) = common::route_point(session, deps) {
                let to = (point - snapshot.origin).normalized_or_zero();
                if to != arena_movement_core::math::Vec3::ZERO {
                    command.set_look_dir(to);
                }
            }
        } else {
            // Anchor the walk on the best walkable spot near the target.
            let anchor = if session.nav_target.area != 0 {
                session.nav_target.origin
            } else {
                snapshot.origin
            };
            let mut candidates = Vec::new();
            deps.spots.query(
                anchor,
                SPOT_SEARCH_RADIUS,
                SpotProfile::NearestWalkable,
                &mut candidates,
            );
            let destination = candidates
                .first()
                .map(|candidate| candidate.point)
                .or_else(|| common::route_point(session, deps))
                .unwrap_or(session.nav_target.origin);
            common::steer_toward(&mut command, &snapshot, destination);
        }

        if move_state.is_restricted(MOVE_RESTRICTION_SILENT) {
            command.press(BUTTON_WALK);
        }
        session.pending.command = command;
        PlanOutcome::Applied
    }

    fn check_step(&mut self, session: &mut SessionData, deps: &PlanDeps) -> CheckOutcome {
        if common::movement_completed(session, deps) {
            return CheckOutcome::Complete;
        }
        if session.sequence.steps >= WALK_HORIZON_STEPS {
            return CheckOutcome::Complete;
        }
        common::check_speed_change(session, deps)
    }
}
