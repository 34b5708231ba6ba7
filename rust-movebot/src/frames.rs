//! The predicted-frame stack and its per-frame caches. Both live in fixed
//! arenas indexed by the same integer and are truncated together, so a value
//! computed at some depth survives rollback-and-reentry into that depth.

use crate::strategies::StrategyKind;
use crate::trace_cache::EnvTraceCache;
use arena_movement_core::constants::MAX_PREDICTED_FRAMES;
use arena_movement_core::env::FrameEvents;
use arena_movement_core::nav::Reach;
use arena_movement_core::snapshot::PlayerState;
use arena_movement_core::substate::SubStateBundle;
use arena_movement_core::BotInput;

/// One accepted prediction step: the state it starts from, and the command
/// chosen at it once planning has filled it in.
#[derive(Clone, Debug)]
pub struct PredictedFrame {
    pub player: PlayerState,
    pub substates: SubStateBundle,
    /// Side effects recorded while arriving at this frame; empty on frame 0
    /// unless seeded with the agent's real last-frame events.
    pub events: FrameEvents,
    pub command: BotInput,
    pub strategy: Option<StrategyKind>,
    pub sim_time_ms: u64,
    /// Duration of the step taken *from* this frame; 0 until planned.
    pub frame_ms: u32,
}

impl PredictedFrame {
    pub fn at_state(player: PlayerState, substates: SubStateBundle, sim_time_ms: u64) -> Self {
        Self {
            player,
            substates,
            events: FrameEvents::default(),
            command: BotInput::default(),
            strategy: None,
            sim_time_ms,
            frame_ms: 0,
        }
    }
}

/// Lazily computed per-depth values. Presence is the `Option`, not a side
/// bitset; everything here describes the state of the frame at the same
/// index and stays valid however many times planning re-enters that depth.
#[derive(Clone, Debug, Default)]
pub struct CacheSlots {
    pub reach_chain: Option<Vec<Reach>>,
    pub default_command: Option<BotInput>,
    /// Whether a straight run from this frame is about to hit something.
    pub hazard_ahead: Option<bool>,
    pub traces: Option<EnvTraceCache>,
}

#[derive(Debug, Default)]
pub struct FrameArena {
    frames: Vec<PredictedFrame>,
    caches: Vec<CacheSlots>,
}

impl FrameArena {
    pub const CAPACITY: usize = MAX_PREDICTED_FRAMES;

    pub fn new() -> Self {
        Self {
            frames: Vec::with_capacity(Self::CAPACITY),
            caches: Vec::with_capacity(Self::CAPACITY),
        }
    }

    pub fn len(&self) -> usize {
        debug_assert_eq!(self.frames.len(), self.caches.len());
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.len() >= Self::CAPACITY
    }

    pub fn clear(&mut self) {
        self.frames.clear();
        self.caches.clear();
    }

    /// Push a frame with a fresh cache slot; `false` when at capacity.
    pub fn push(&mut self, frame: PredictedFrame) -> bool {
        if self.is_full() {
            return false;
        }
        self.frames.push(frame);
        self.caches.push(CacheSlots::default());
        true
    }

    pub fn truncate(&mut self, new_len: usize) {
        self.frames.truncate(new_len);
        self.caches.truncate(new_len);
    }

    pub fn top_index(&self) -> usize {
        debug_assert!(!self.is_empty());
        self.len() - 1
    }

    pub fn top(&self) -> &PredictedFrame {
        self.frames.last().expect("arena is empty")
    }

    pub fn top_mut(&mut self) -> &mut PredictedFrame {
        self.frames.last_mut().expect("arena is empty")
    }

    pub fn top_cache_mut(&mut self) -> &mut CacheSlots {
        self.caches.last_mut().expect("arena is empty")
    }

    pub fn frame(&self, index: usize) -> &PredictedFrame {
        &self.frames[index]
    }

    pub fn frames(&self) -> &[PredictedFrame] {
        &self.frames
    }

    /// Previous frame, when the stack is at least two deep.
    pub fn below_top(&self) -> Option<&PredictedFrame> {
        let len = self.len();
        if len >= 2 {
            Some(&self.frames[len - 2])
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> PredictedFrame {
        PredictedFrame::at_state(PlayerState::default(), SubStateBundle::default(), 0)
    }

    #[test]
    fn arena_rejects_pushes_past_capacity() {
        let mut arena = FrameArena::new();
        for _ in 0..FrameArena::CAPACITY {
            assert!(arena.push(frame()));
        }
        assert!(!arena.push(frame()));
        assert_eq!(arena.len(), FrameArena::CAPACITY);
    }

    #[test]
    fn truncation_keeps_frames_and_caches_in_lockstep() {
        let mut arena = FrameArena::new();
        for _ in 0..8 {
            arena.push(frame());
        }
        arena.top_cache_mut().hazard_ahead = Some(true);
        arena.truncate(3);
        assert_eq!(arena.len(), 3);
        assert_eq!(arena.top_index(), 2);
        assert!(arena.top_cache_mut().hazard_ahead.is_none());
    }
}
