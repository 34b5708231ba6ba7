//! React to a jump-pad touch: save the candidate landing areas around the
//! pad's target, arm the flight sub-state, and clear the input. The pad
//! owns the trajectory from here.

use crate::context::{PlanDeps, SessionData};
use crate::strategies::{CheckOutcome, MovementStrategy, PlanOutcome, StrategyKind};
use arena_movement_core::constants::MAX_SAVED_LANDING_AREAS;
use arena_movement_core::math::Vec3;
use arena_movement_core::BotInput;

/// Radius around the pad target searched for candidate landing areas.
const LANDING_SEARCH_RADIUS: f32 = 256.0;
const FLIGHT_TIMEOUT_MS: u16 = 2400;
const JUMPPAD_TIMEOUT_MS: u16 = 1040;

pub struct HandleTriggeredJumppadStrategy;

impl HandleTriggeredJumppadStrategy {
    pub fn new() -> Self {
        Self
    }

    /// Grounded areas near the pad target, best travel time to the nav
    /// target first.
    fn saved_landing_areas(
        session: &SessionData,
        deps: &PlanDeps,
        target: Vec3,
    ) -> ([u32; MAX_SAVED_LANDING_AREAS], u8) {
        let mut nearby = Vec::new();
        deps.nav
            .areas_in_radius(target, LANDING_SEARCH_RADIUS, &mut nearby);
        nearby.retain(|area| {
            deps.nav.area_is_grounded(*area) && !deps.nav.area_is_disabled(*area)
        });

        let nav_target = session.nav_target;
        let flags = session.travel_flags;
        let mut scored: Vec<(u32, u32)> = nearby
            .into_iter()
            .map(|area| {
                let time = if nav_target.area != 0 {
                    deps.nav
                        .travel_time(area, nav_target.area, flags)
                        .unwrap_or(u32::MAX)
                } else {
                    u32::MAX
                };
                (time, area)
            })
            .collect();
        scored.sort_by_key(|entry| (entry.0, entry.1));

        let mut areas = [0u32; MAX_SAVED_LANDING_AREAS];
        let mut count = 0u8;
        for (_, area) in scored.into_iter().take(MAX_SAVED_LANDING_AREAS) {
            areas[count as usize] = area;
            count += 1;
        }
        (areas, count)
    }
}

impl MovementStrategy for HandleTriggeredJumppadStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::HandleTriggeredJumppad
    }

    fn plan_step(&mut self, session: &mut SessionData, deps: &PlanDeps) -> PlanOutcome {
        let top = session.arena.top();
        let Some((_, target)) = top.events.touched_jumppad else {
            return PlanOutcome::SwitchTo(if top.substates.flight.active {
                StrategyKind::FlyUntilLanding
            } else {
                StrategyKind::WalkToBestSpot
            });
        };
        if top.substates.jumppad.active {
            return PlanOutcome::SwitchTo(StrategyKind::FlyUntilLanding);
        }

        let (areas, count) = Self::saved_landing_areas(session, deps, target);
        session.landing.areas = areas;
        session.landing.count = count;
        session.landing.next_candidate = 0;
        session.landing.committed = None;

        let substates = &mut session.arena.top_mut().substates;
        substates.activate_jumppad(JUMPPAD_TIMEOUT_MS);
        substates.activate_flight(target, target.z, FLIGHT_TIMEOUT_MS);

        session.pending.command = BotInput::default();
        PlanOutcome::Applied
    }

    fn check_step(&mut self, _session: &mut SessionData, _deps: &PlanDeps) -> CheckOutcome {
        // One step is all this needs; the flight strategy owns the rest.
        CheckOutcome::Complete
    }
}
