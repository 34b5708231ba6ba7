//! The prediction context: a bounded stack of speculative frames, a roster
//! of movement strategies, and the step loop that plans, simulates,
//! validates, and either commits, rolls back, or finishes. One context per
//! agent; nothing here touches global state. The world is reached only
//! through the injected environment and the recording event sink.

use crate::config::PlannerConfig;
use crate::frames::{FrameArena, PredictedFrame};
use crate::strategies::{
    common, create_roster, CheckOutcome, MovementStrategy, PlanOutcome, StopReason, StrategyKind,
};
use arena_movement_core::constants::{
    DEFAULT_FRAME_MS, FRAME_QUANTUM_MS, MAX_FRAME_MS, MAX_SAVED_LANDING_AREAS,
};
use arena_movement_core::env::{FrameEvents, SimEnvironment};
use arena_movement_core::error::ViolationCode;
use arena_movement_core::math::Vec3;
use arena_movement_core::nav::{NavQuery, TRAVEL_FLAGS_DEFAULT};
use arena_movement_core::rng::SeededRng;
use arena_movement_core::snapshot::{PhysicsSnapshot, PlayerState};
use arena_movement_core::substate::SubStateBundle;
use arena_movement_core::tactical::SpotQuery;
use arena_movement_core::trace::{BoxBounds, CONTENTS_HAZARD};
use arena_movement_core::BotInput;
use serde::Serialize;
use tracing::{debug, trace};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NavTarget {
    pub area: u32,
    pub origin: Vec3,
}

/// External collaborators for one planning call; dependency-injected, never
/// global.
pub struct PlanDeps<'a> {
    pub env: &'a dyn SimEnvironment,
    pub nav: &'a dyn NavQuery,
    pub spots: &'a dyn SpotQuery,
    pub cfg: &'a PlannerConfig,
}

/// The command being planned for the current top of stack.
#[derive(Clone, Copy, Debug, Default)]
pub struct PendingStep {
    pub command: BotInput,
    /// 0 = use the default step duration.
    pub frame_ms: u32,
}

#[derive(Clone, Copy, Debug)]
pub struct SequenceStats {
    pub start_index: usize,
    pub start_origin: Vec3,
    pub min_travel_time_cs: Option<u32>,
    pub steps: u32,
}

impl Default for SequenceStats {
    fn default() -> Self {
        Self {
            start_index: 0,
            start_origin: Vec3::ZERO,
            min_travel_time_cs: None,
            steps: 0,
        }
    }
}

/// Millisecond accumulators for the three speed-loss patterns; each rolls
/// back independently once it outlives its tolerance.
#[derive(Clone, Copy, Debug, Default)]
pub struct SpeedLoss {
    pub wall_ms: u32,
    pub bounce_ms: u32,
    pub decel_ms: u32,
}

/// Landing candidates saved at a jump-pad touch, consumed in score order.
#[derive(Clone, Copy, Debug, Default)]
pub struct LandingPlan {
    pub areas: [u32; MAX_SAVED_LANDING_AREAS],
    pub count: u8,
    pub next_candidate: u8,
    pub committed: Option<u32>,
}

impl LandingPlan {
    pub fn current(&self) -> Option<u32> {
        if self.next_candidate < self.count {
            Some(self.areas[self.next_candidate as usize])
        } else {
            None
        }
    }

    pub fn advance(&mut self) {
        self.next_candidate = self.next_candidate.saturating_add(1);
        self.committed = None;
    }
}

/// All mutable state of one planning session. Strategies receive this plus
/// the dependencies and nothing else.
pub struct SessionData {
    pub arena: FrameArena,
    pub pending: PendingStep,
    pub nav_target: NavTarget,
    pub travel_flags: u32,
    pub has_tracked_enemy: bool,
    pub rng: SeededRng,
    pub savepoint: usize,
    pub active: Option<StrategyKind>,
    pub disabled_mask: u16,
    pub sequence: SequenceStats,
    pub loss: SpeedLoss,
    pub landing: LandingPlan,
    /// Grounded time in the target area, ms.
    pub target_dwell_ms: u32,
    /// Ground distance covered since the most recent landing.
    pub ground_distance_since_landing: f32,
    landed: bool,
    pub completed: bool,
    pub rollbacks: u32,
}

impl SessionData {
    fn new(seed: u32) -> Self {
        Self {
            arena: FrameArena::new(),
            pending: PendingStep::default(),
            nav_target: NavTarget::default(),
            travel_flags: TRAVEL_FLAGS_DEFAULT,
            has_tracked_enemy: false,
            rng: SeededRng::new(seed),
            savepoint: 0,
            active: None,
            disabled_mask: 0,
            sequence: SequenceStats::default(),
            loss: SpeedLoss::default(),
            landing: LandingPlan::default(),
            target_dwell_ms: 0,
            ground_distance_since_landing: 0.0,
            landed: false,
            completed: false,
            rollbacks: 0,
        }
    }

    pub fn top_snapshot(&self) -> PhysicsSnapshot {
        self.arena.top().player.physics
    }

    /// Current area, falling back to the dropped-to-floor area while airborne.
    pub fn current_area(&self) -> u32 {
        let snapshot = self.top_snapshot();
        if snapshot.area_num != 0 {
            snapshot.area_num
        } else {
            snapshot.dropped_area_num
        }
    }

    pub fn is_disabled(&self, kind: StrategyKind) -> bool {
        self.disabled_mask & kind.bit() != 0
    }

    /// Permanently disable a strategy for the rest of this session.
    pub fn disable(&mut self, kind: StrategyKind) {
        if kind != StrategyKind::Fallback {
            self.disabled_mask |= kind.bit();
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct CachedPlanFrame {
    at_ms: u64,
    frame_ms: u32,
    command: BotInput,
    expected: PhysicsSnapshot,
    substate_mask: u8,
}

#[derive(Clone, Debug, Default)]
struct CachedPlan {
    frames: Vec<CachedPlanFrame>,
}

#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct PlannerStats {
    pub sessions: u32,
    pub rollbacks: u32,
    pub reuse_hits: u32,
    pub overflows: u32,
}

/// Everything the planner needs from the agent for one real frame.
pub struct PlanRequest<'a> {
    pub state: &'a PlayerState,
    pub substates: &'a mut SubStateBundle,
    /// Events the agent's *real* last frame produced (pad touches etc.).
    pub last_events: FrameEvents,
    pub now_ms: u64,
    pub target: NavTarget,
    pub has_tracked_enemy: bool,
}

enum StepControl {
    Continue,
    Stop,
}

pub struct PredictionContext {
    cfg: PlannerConfig,
    roster: Vec<Box<dyn MovementStrategy>>,
    session: SessionData,
    plan: Option<CachedPlan>,
    stats: PlannerStats,
}

impl PredictionContext {
    pub fn new(cfg: PlannerConfig, seed: u32) -> Self {
        Self {
            cfg,
            roster: create_roster(),
            session: SessionData::new(seed),
            plan: None,
            stats: PlannerStats::default(),
        }
    }

    pub fn stats(&self) -> PlannerStats {
        self.stats
    }

    /// Produce the movement command to submit this real frame, reusing the
    /// cached plan when the agent is still on the predicted path.
    pub fn frame_input(
        &mut self,
        req: &mut PlanRequest,
        env: &dyn SimEnvironment,
        nav: &dyn NavQuery,
        spots: &dyn SpotQuery,
    ) -> BotInput {
        if let Some(command) = self.try_reuse(req) {
            self.stats.reuse_hits += 1;
            return command;
        }

        let cfg = self.cfg;
        let deps = PlanDeps {
            env,
            nav,
            spots,
            cfg: &cfg,
        };
        self.build_plan(req, &deps)
    }

    fn try_reuse(&mut self, req: &PlanRequest) -> Option<BotInput> {
        let result = {
            let plan = self.plan.as_ref()?;
            reuse_command(plan, req, &self.cfg)
        };
        if result.is_none() {
            self.plan = None;
        }
        result
    }

    fn build_plan(&mut self, req: &mut PlanRequest, deps: &PlanDeps) -> BotInput {
        self.stats.sessions += 1;
        let entry_state = *req.state;

        self.start_session(req, deps);
        debug!(
            now_ms = req.now_ms,
            target_area = req.target.area,
            "planning session started"
        );

        let mut iterations = 0u32;
        while !self.session.completed {
            iterations += 1;
            if iterations > deps.cfg.max_step_iterations {
                debug!(iterations, "session hit its step-iteration bound");
                break;
            }
            if self.session.arena.is_full() {
                self.handle_overflow(deps);
                continue;
            }
            match self.plan_and_step(deps) {
                StepControl::Continue => {}
                StepControl::Stop => break,
            }
        }

        if let Some(active) = self.session.active.take() {
            self.roster[active.index()].on_sequence_stopped(
                &mut self.session,
                deps,
                StopReason::SessionEnd,
            );
        }

        // Speculation must be perfectly undoable: the real state was only
        // ever copied, and frame 0 still mirrors it bit for bit (the session
        // only ever annotated its nav-area fields).
        debug_assert!(
            *req.state == entry_state,
            "{}",
            ViolationCode::RestoreMismatch
        );
        let first_player = self.session.arena.frame(0).player;
        debug_assert!(
            first_player.physics.origin == entry_state.physics.origin
                && first_player.physics.velocity == entry_state.physics.velocity
                && first_player.physics.ground_entity == entry_state.physics.ground_entity
                && first_player.physics.water_level == entry_state.physics.water_level
                && first_player.move_state == entry_state.move_state,
            "{}",
            ViolationCode::RestoreMismatch
        );

        // The first predicted frame's bundle becomes the committed sub-state
        // for the next real frame.
        if self.session.arena.len() > 1 {
            *req.substates = self.session.arena.frame(1).substates;
        }

        let command = self.finish_session();
        debug!(
            frames = self.session.arena.len(),
            rollbacks = self.session.rollbacks,
            "planning session finished"
        );
        command
    }

    fn start_session(&mut self, req: &PlanRequest, deps: &PlanDeps) {
        let session = &mut self.session;
        session.arena.clear();
        session.pending = PendingStep::default();
        session.nav_target = req.target;
        session.travel_flags = TRAVEL_FLAGS_DEFAULT;
        session.has_tracked_enemy = req.has_tracked_enemy;
        session.savepoint = 0;
        session.active = None;
        session.disabled_mask = 0;
        session.sequence = SequenceStats::default();
        session.loss = SpeedLoss::default();
        session.landing = LandingPlan::default();
        session.target_dwell_ms = 0;
        session.ground_distance_since_landing = 0.0;
        session.landed = false;
        session.completed = false;
        session.rollbacks = 0;

        let mut frame0 = PredictedFrame::at_state(*req.state, *req.substates, req.now_ms);
        frame0.events = req.last_events;
        frame0.player.physics.area_num = deps.nav.area_num(frame0.player.physics.origin);
        frame0.player.physics.dropped_area_num =
            dropped_area(deps, frame0.player.physics.origin);
        session.arena.push(frame0);
    }

    /// Retain the predicted stack for reuse and emit this frame's command.
    fn finish_session(&mut self) -> BotInput {
        let frames = self.session.arena.frames();
        let planned: Vec<CachedPlanFrame> = frames
            .iter()
            .map(|frame| CachedPlanFrame {
                at_ms: frame.sim_time_ms,
                frame_ms: frame.frame_ms,
                command: frame.command,
                expected: frame.player.physics,
                substate_mask: frame.substates.active_mask(),
            })
            .collect();
        self.plan = Some(CachedPlan { frames: planned });

        let first = self.session.arena.frame(0);
        if first.strategy.is_some() {
            first.command
        } else {
            // Planning produced nothing; emit a safe default instead of
            // stalling.
            let mut command = BotInput::default();
            common::steer_toward(
                &mut command,
                &first.player.physics,
                self.session.nav_target.origin,
            );
            command
        }
    }

    fn plan_and_step(&mut self, deps: &PlanDeps) -> StepControl {
        let Some(kind) = self.resolve_and_plan(deps) else {
            return StepControl::Continue;
        };
        if self.session.completed {
            return StepControl::Stop;
        }

        let frame_ms = quantize_frame_ms(self.session.pending.frame_ms);
        debug_assert!(
            frame_ms % FRAME_QUANTUM_MS == 0 && frame_ms > 0 && frame_ms < MAX_FRAME_MS,
            "{}",
            ViolationCode::FrameDurationQuantum
        );

        let pending_command = self.session.pending.command;
        {
            let top = self.session.arena.top_mut();
            top.command = pending_command;
            top.strategy = Some(kind);
            top.frame_ms = frame_ms;
        }

        // Exactly one simulated tick, side effects recorded privately.
        let top = self.session.arena.top().clone();
        let mut player = top.player;
        let mut events = FrameEvents::default();
        deps.env
            .step_player(&mut player, &top.command, frame_ms, &mut events);

        let mut bundle = top.substates;
        bundle.frame(frame_ms);
        player.physics.area_num = deps.nav.area_num(player.physics.origin);
        player.physics.dropped_area_num = dropped_area(deps, player.physics.origin);
        bundle.try_deactivate(&player.physics);

        let next = PredictedFrame {
            player,
            substates: bundle,
            events,
            command: BotInput::default(),
            strategy: None,
            sim_time_ms: top.sim_time_ms + frame_ms as u64,
            frame_ms: 0,
        };
        if !self.session.arena.push(next) {
            self.handle_overflow(deps);
            return StepControl::Continue;
        }

        self.update_progress_trackers(deps, frame_ms);

        if !self.generic_step_valid(deps) {
            trace!(strategy = kind.name(), "generic validation failed");
            self.rollback(deps);
            return StepControl::Continue;
        }

        match self.roster[kind.index()].check_step(&mut self.session, deps) {
            CheckOutcome::Continue => StepControl::Continue,
            CheckOutcome::Complete => {
                self.complete(deps);
                StepControl::Stop
            }
            CheckOutcome::Rollback => {
                trace!(strategy = kind.name(), "step check requested rollback");
                self.rollback(deps);
                StepControl::Continue
            }
        }
    }

    /// Resolve which strategy plans this step, following "cannot apply"
    /// nominations with an explicit visited set. Returns `None` when a
    /// rollback happened instead of a planned step.
    fn resolve_and_plan(&mut self, deps: &PlanDeps) -> Option<StrategyKind> {
        self.session.pending = PendingStep::default();
        let mut visited: u16 = 0;
        let mut kind = match self.session.active {
            Some(active) => active,
            None => suggest_strategy(&self.session),
        };

        loop {
            if self.session.is_disabled(kind) {
                kind = StrategyKind::Fallback;
            }
            if visited & kind.bit() != 0 {
                debug_assert!(
                    kind == StrategyKind::Fallback,
                    "{}",
                    ViolationCode::SuggestionCycle
                );
                // Release builds: break the loop with the safe default.
                let snapshot = self.session.top_snapshot();
                let mut command = BotInput::default();
                common::steer_toward(&mut command, &snapshot, self.session.nav_target.origin);
                self.session.pending.command = command;
                kind = StrategyKind::Fallback;
                break;
            }
            visited |= kind.bit();

            match self.roster[kind.index()].plan_step(&mut self.session, deps) {
                PlanOutcome::Applied => break,
                PlanOutcome::SwitchTo(next) => {
                    trace!(from = kind.name(), to = next.name(), "strategy redirect");
                    kind = next;
                }
                PlanOutcome::Rollback => {
                    if self.session.active == Some(kind) {
                        self.rollback(deps);
                        return None;
                    }
                    // A candidate that was never active cannot roll the
                    // stack back; it just drops out of this session.
                    self.session.disable(kind);
                    kind = StrategyKind::Fallback;
                }
            }
        }

        if self.session.active != Some(kind) {
            if let Some(old) = self.session.active {
                self.roster[old.index()].on_sequence_stopped(
                    &mut self.session,
                    deps,
                    StopReason::Switched,
                );
            }
            self.session.active = Some(kind);
            self.session.savepoint = self.session.arena.top_index();
            self.session.sequence = SequenceStats {
                start_index: self.session.arena.top_index(),
                start_origin: self.session.top_snapshot().origin,
                min_travel_time_cs: None,
                steps: 0,
            };
            self.session.loss = SpeedLoss::default();
            self.roster[kind.index()].on_sequence_started(&mut self.session, deps);
        }
        self.session.sequence.steps += 1;
        Some(kind)
    }

    fn rollback(&mut self, deps: &PlanDeps) {
        self.stats.rollbacks += 1;
        self.session.rollbacks += 1;

        let savepoint = self
            .session
            .savepoint
            .min(self.session.arena.len().saturating_sub(1));
        let no_progress = self.session.arena.len() <= savepoint + 1;

        if let Some(old) = self.session.active.take() {
            self.roster[old.index()].on_sequence_stopped(
                &mut self.session,
                deps,
                StopReason::RolledBack,
            );
            if no_progress {
                // Rolling back without ever advancing past the savepoint
                // would loop forever; drop the strategy for this session.
                self.session.disable(old);
            }
        }

        self.session.arena.truncate(savepoint + 1);
        self.session.savepoint = self.session.arena.top_index();
        self.session.loss = SpeedLoss::default();
        debug_assert_eq!(
            self.session.arena.top_index(),
            savepoint,
            "{}",
            ViolationCode::StackCacheParity
        );

        if self.session.rollbacks > deps.cfg.max_rollbacks_per_session {
            debug!("rollback budget exhausted; accepting the partial plan");
            self.session.completed = true;
        }
    }

    fn handle_overflow(&mut self, deps: &PlanDeps) {
        self.stats.overflows += 1;
        debug_assert!(
            self.session.arena.is_full(),
            "{}",
            ViolationCode::StackOverflow
        );
        if let Some(active) = self.session.active {
            debug!(strategy = active.name(), "stack overflow; disabling strategy");
            self.session.disable(active);
        }
        self.rollback(deps);
        // A full stack that still fails to finish is a finished plan.
        if self.session.arena.is_full() {
            self.session.completed = true;
        }
    }

    fn complete(&mut self, deps: &PlanDeps) {
        self.session.completed = true;
        if let Some(active) = self.session.active.take() {
            self.roster[active.index()].on_sequence_stopped(
                &mut self.session,
                deps,
                StopReason::Completed,
            );
        }
    }

    fn update_progress_trackers(&mut self, deps: &PlanDeps, frame_ms: u32) {
        let session = &mut self.session;
        let top = session.arena.top();
        let snapshot = top.player.physics;
        let prev = session
            .arena
            .below_top()
            .map(|frame| frame.player.physics);

        let area = if snapshot.area_num != 0 {
            snapshot.area_num
        } else {
            snapshot.dropped_area_num
        };

        if snapshot.grounded() && session.nav_target.area != 0 && area == session.nav_target.area {
            session.target_dwell_ms += frame_ms;
        } else {
            session.target_dwell_ms = 0;
        }

        if let Some(prev) = prev {
            if snapshot.grounded() && !prev.grounded() {
                session.landed = true;
                session.ground_distance_since_landing = 0.0;
            } else if snapshot.grounded() && session.landed {
                session.ground_distance_since_landing +=
                    prev.origin.horizontal().distance_to(snapshot.origin.horizontal());
            }
        }

        if session.nav_target.area != 0 && area != 0 {
            if let Some(time) =
                deps.nav
                    .travel_time(area, session.nav_target.area, session.travel_flags)
            {
                session.sequence.min_travel_time_cs = Some(
                    session
                        .sequence
                        .min_travel_time_cs
                        .map_or(time, |best| best.min(time)),
                );
            }
        }
    }

    /// Validation every accepted step must pass regardless of strategy.
    fn generic_step_valid(&self, deps: &PlanDeps) -> bool {
        let snapshot = self.session.top_snapshot();
        if deps.env.point_contents(snapshot.origin + Vec3::new(0.0, 0.0, 4.0)) & CONTENTS_HAZARD
            != 0
        {
            return false;
        }
        let area = self.session.current_area();
        if area != 0 && deps.nav.area_is_disabled(area) {
            return false;
        }
        if self.session.nav_target.area != 0
            && area != 0
            && deps
                .nav
                .travel_time(area, self.session.nav_target.area, self.session.travel_flags)
                .is_none()
        {
            return false;
        }
        true
    }

    /// Grounded time and landing progress the strategies read for their
    /// completion checks.
    pub fn session(&self) -> &SessionData {
        &self.session
    }
}

/// The generic "which strategy applies now" decision used whenever no
/// strategy is active.
fn suggest_strategy(session: &SessionData) -> StrategyKind {
    let top = session.arena.top();
    let snapshot = top.player.physics;
    let substates = top.substates;

    if snapshot.water_level >= 2 {
        return StrategyKind::Swim;
    }
    if top.events.touched_jumppad.is_some() && !substates.jumppad.active {
        return StrategyKind::HandleTriggeredJumppad;
    }
    if substates.flight.active {
        return StrategyKind::FlyUntilLanding;
    }
    if top.events.touched_platform.is_some() {
        return StrategyKind::RidePlatform;
    }
    if substates.camp.active {
        return StrategyKind::CampSpot;
    }
    if session.has_tracked_enemy {
        return StrategyKind::CombatDodge;
    }
    if common::bunnying_allowed(&snapshot, &top.player.move_state) {
        return StrategyKind::BunnyFollowingChain;
    }
    StrategyKind::WalkToBestSpot
}

fn quantize_frame_ms(requested: u32) -> u32 {
    let frame_ms = if requested == 0 {
        DEFAULT_FRAME_MS
    } else {
        requested
    };
    let quantum = FRAME_QUANTUM_MS;
    let snapped = (frame_ms / quantum).max(1) * quantum;
    snapped.min((MAX_FRAME_MS / quantum) * quantum)
}

fn dropped_area(deps: &PlanDeps, origin: Vec3) -> u32 {
    let floor = deps.env.trace(
        origin,
        origin - Vec3::new(0.0, 0.0, 96.0),
        BoxBounds::standing_player(),
    );
    deps.nav.area_num(floor.end + Vec3::new(0.0, 0.0, 1.0))
}

fn reuse_command(
    plan: &CachedPlan,
    req: &PlanRequest,
    cfg: &PlannerConfig,
) -> Option<BotInput> {
    let frames = &plan.frames;
    if frames.len() < 2 {
        return None;
    }

    let mut index = None;
    for i in 0..frames.len() - 1 {
        let frame = &frames[i];
        if frame.frame_ms == 0 {
            return None;
        }
        if req.now_ms >= frame.at_ms && req.now_ms < frame.at_ms + frame.frame_ms as u64 {
            index = Some(i);
            break;
        }
    }
    let i = index?;
    let lower = &frames[i];
    let upper = &frames[i + 1];
    let t = (req.now_ms - lower.at_ms) as f32 / lower.frame_ms as f32;

    let real = req.state.physics;
    let expected_origin = lower.expected.origin.lerp(upper.expected.origin, t);
    if real.origin.distance_to(expected_origin) > cfg.reuse_origin_tolerance {
        return None;
    }

    let expected_speed = lower.expected.velocity.length()
        + (upper.expected.velocity.length() - lower.expected.velocity.length()) * t;
    let real_speed = real.velocity.length();
    if (real_speed - expected_speed).abs()
        > cfg.reuse_speed_tolerance_frac * expected_speed.max(1.0)
    {
        return None;
    }

    if real_speed > 1.0 && expected_speed > 1.0 {
        let real_dir = real.velocity.normalized_or_zero();
        let expected_dir = lower.expected.velocity.normalized_or_zero();
        if real_dir.dot(expected_dir) < cfg.reuse_dir_tolerance_deg.to_radians().cos() {
            return None;
        }
    }

    // Divergence of the active sub-states means the cached plan no longer
    // describes this agent.
    if req.substates.active_mask() != lower.substate_mask {
        return None;
    }

    let mut command = lower.command;
    if let (Some(a), Some(b)) = (lower.command.look_dir, upper.command.look_dir) {
        command.look_dir = Some(a.lerp(b, t).normalized_or_zero());
    }
    Some(command)
}
