//! The seam between the planner and the world it speculates in. The physics
//! integration is an opaque, deterministic call behind [`SimEnvironment`];
//! its side-effect callbacks go through a caller-supplied [`FrameEventSink`],
//! so a planning session records them privately instead of touching live
//! game state.

use crate::command::BotInput;
use crate::math::Vec3;
use crate::snapshot::{EntityId, PlayerState};
use crate::trace::{BoxBounds, TraceResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerKind {
    Jumppad,
    Teleporter,
    Platform,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PredictedEvent {
    Jump,
    Dash,
    Walljump,
    FallDamage,
}

pub trait FrameEventSink {
    /// The simulated volume overlapped a trigger. `target` is the trigger's
    /// destination/apex point when it has one, else the entity origin.
    fn touch_trigger(&mut self, kind: TriggerKind, entity: EntityId, target: Vec3);

    fn predicted_event(&mut self, event: PredictedEvent);
}

pub trait SimEnvironment {
    /// Sweep `bounds` from `start` to `end`, returning the first hit.
    fn trace(&self, start: Vec3, end: Vec3, bounds: BoxBounds) -> TraceResult;

    fn point_contents(&self, point: Vec3) -> u32;

    /// Advance the player by `frame_ms` under `input`. Must be fully
    /// deterministic for identical inputs; all discrete side effects are
    /// reported through `events`.
    fn step_player(
        &self,
        state: &mut PlayerState,
        input: &BotInput,
        frame_ms: u32,
        events: &mut dyn FrameEventSink,
    );
}

/// Recording sink used for the lifetime of one planning session (and by the
/// runner, which applies nothing back to a live world either).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameEvents {
    pub touched_jumppad: Option<(EntityId, Vec3)>,
    pub touched_teleporter: Option<EntityId>,
    pub touched_platform: Option<EntityId>,
    pub jumped: bool,
    pub dashed: bool,
    pub walljumped: bool,
    pub fall_damage: bool,
}

impl FrameEvents {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn any_ability_used(&self) -> bool {
        self.jumped || self.dashed || self.walljumped
    }
}

impl FrameEventSink for FrameEvents {
    fn touch_trigger(&mut self, kind: TriggerKind, entity: EntityId, target: Vec3) {
        match kind {
            TriggerKind::Jumppad => self.touched_jumppad = Some((entity, target)),
            TriggerKind::Teleporter => self.touched_teleporter = Some(entity),
            TriggerKind::Platform => self.touched_platform = Some(entity),
        }
    }

    fn predicted_event(&mut self, event: PredictedEvent) {
        match event {
            PredictedEvent::Jump => self.jumped = true,
            PredictedEvent::Dash => self.dashed = true,
            PredictedEvent::Walljump => self.walljumped = true,
            PredictedEvent::FallDamage => self.fall_damage = true,
        }
    }
}
