//! The movement strategy family: a closed set of tags dispatched through one
//! trait with four contract operations. Strategies never fail hard; they
//! signal "cannot apply, try X instead" or "roll back" and the planner
//! resolves the rest.

pub mod bunny;
pub mod camp;
pub mod common;
pub mod dodge;
pub mod fallback;
pub mod flight;
pub mod jumppad;
pub mod landing;
pub mod platform;
pub mod swim;
pub mod walk;

use crate::context::{PlanDeps, SessionData};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrategyKind {
    Fallback,
    Swim,
    RidePlatform,
    CampSpot,
    FlyUntilLanding,
    LandOnSavedAreas,
    HandleTriggeredJumppad,
    BunnyFollowingChain,
    BunnyToShortcutArea,
    BunnyAlongVelocity,
    BunnyInterpolatingChain,
    CombatDodge,
    WalkToBestSpot,
}

pub const STRATEGY_COUNT: usize = 13;

impl StrategyKind {
    pub const ALL: [Self; STRATEGY_COUNT] = [
        Self::Fallback,
        Self::Swim,
        Self::RidePlatform,
        Self::CampSpot,
        Self::FlyUntilLanding,
        Self::LandOnSavedAreas,
        Self::HandleTriggeredJumppad,
        Self::BunnyFollowingChain,
        Self::BunnyToShortcutArea,
        Self::BunnyAlongVelocity,
        Self::BunnyInterpolatingChain,
        Self::CombatDodge,
        Self::WalkToBestSpot,
    ];

    pub fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|kind| *kind == self)
            .expect("kind is in ALL")
    }

    /// One bit per tag, for visited/disabled sets.
    pub fn bit(self) -> u16 {
        1 << self.index()
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Fallback => "fallback",
            Self::Swim => "swim",
            Self::RidePlatform => "ride-platform",
            Self::CampSpot => "camp-spot",
            Self::FlyUntilLanding => "fly-until-landing",
            Self::LandOnSavedAreas => "land-on-saved-areas",
            Self::HandleTriggeredJumppad => "handle-triggered-jumppad",
            Self::BunnyFollowingChain => "bunny-following-chain",
            Self::BunnyToShortcutArea => "bunny-to-shortcut-area",
            Self::BunnyAlongVelocity => "bunny-along-velocity",
            Self::BunnyInterpolatingChain => "bunny-interpolating-chain",
            Self::CombatDodge => "combat-dodge",
            Self::WalkToBestSpot => "walk-to-best-spot",
        }
    }
}

/// Result of asking a strategy to plan the next step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlanOutcome {
    /// The pending command and step duration are filled in.
    Applied,
    /// Not applicable right now; the nominated alternative should try.
    SwitchTo(StrategyKind),
    /// The step as attempted is invalid.
    Rollback,
}

/// Result of validating a simulated step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckOutcome {
    Continue,
    /// Enough of the path has been predicted.
    Complete,
    Rollback,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    Switched,
    RolledBack,
    Completed,
    SessionEnd,
}

pub trait MovementStrategy {
    fn kind(&self) -> StrategyKind;

    fn plan_step(&mut self, session: &mut SessionData, deps: &PlanDeps) -> PlanOutcome;

    fn check_step(&mut self, session: &mut SessionData, deps: &PlanDeps) -> CheckOutcome;

    /// A contiguous run of frames under this strategy has begun; the frame
    /// the run starts at has just become the rollback savepoint.
    fn on_sequence_started(&mut self, _session: &mut SessionData, _deps: &PlanDeps) {}

    fn on_sequence_stopped(
        &mut self,
        _session: &mut SessionData,
        _deps: &PlanDeps,
        _reason: StopReason,
    ) {
    }
}

/// Strategy instances in `StrategyKind::ALL` order.
pub fn create_roster() -> Vec<Box<dyn MovementStrategy>> {
    let roster: Vec<Box<dyn MovementStrategy>> = vec![
        Box::new(fallback::FallbackStrategy::new()),
        Box::new(swim::SwimStrategy::new()),
        Box::new(platform::RidePlatformStrategy::new()),
        Box::new(camp::CampSpotStrategy::new()),
        Box::new(flight::FlyUntilLandingStrategy::new()),
        Box::new(landing::LandOnSavedAreasStrategy::new()),
        Box::new(jumppad::HandleTriggeredJumppadStrategy::new()),
        Box::new(bunny::BunnyFollowingChainStrategy::new()),
        Box::new(bunny::BunnyToShortcutAreaStrategy::new()),
        Box::new(bunny::BunnyAlongVelocityStrategy::new()),
        Box::new(bunny::BunnyInterpolatingChainStrategy::new()),
        Box::new(dodge::CombatDodgeStrategy::new()),
        Box::new(walk::WalkToBestSpotStrategy::new()),
    ];
    debug_assert!(roster
        .iter()
        .zip(StrategyKind::ALL)
        .all(|(strategy, kind)| strategy.kind() == kind));
    roster
}

pub fn describe_strategies() -> Vec<(&'static str, &'static str)> {
    vec![
        ("fallback", "Safe default; always terminates after one step."),
        ("swim", "Steer along the route while submerged, exit at the surface."),
        ("ride-platform", "Idle on a rising platform, walk away at the top."),
        ("camp-spot", "Dwell strafing around a held spot with periodic re-aim."),
        ("fly-until-landing", "Wait out a jump-pad flight until the landing window."),
        ("land-on-saved-areas", "Try precomputed landing areas in score order."),
        ("handle-triggered-jumppad", "Set up flight state right after a pad touch."),
        ("bunny-following-chain", "Hop chain along the straight reach chain."),
        ("bunny-to-shortcut-area", "Hop toward the best shortcut area down the chain."),
        ("bunny-along-velocity", "Hop keeping the current velocity direction."),
        ("bunny-interpolating-chain", "Hop toward a blend of upcoming reach points."),
        ("combat-dodge", "Semi-random strafe/dash mixes while an enemy is tracked."),
        ("walk-to-best-spot", "Plain ground movement toward the best nearby spot."),
    ]
}
