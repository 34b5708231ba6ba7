//! Per-step cache of the collision probes around the agent's predicted
//! position: 8 compass directions at two height bands, at most 16 casts,
//! every result kept for the remainder of the step. A fresh cache is created
//! for every new stack depth.

use arena_movement_core::constants::{
    TRACE_CACHE_DIRECTIONS, TRACE_CACHE_PROBE_DEPTH, TRACE_CACHE_SHORTCUT_CLEARANCE,
};
use arena_movement_core::env::SimEnvironment;
use arena_movement_core::math::{dir_from_angles, Vec3};
use arena_movement_core::nav::NavQuery;
use arena_movement_core::rng::SeededRng;
use arena_movement_core::snapshot::PhysicsSnapshot;
use arena_movement_core::trace::{BoxBounds, TraceResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProbeBand {
    FullHeight,
    /// Lower bound raised to step height; clear here means a hop clears it.
    Jumpable,
}

/// Yaw offset (degrees, CCW from facing) and the key pair that moves there.
const DIR_TABLE: [(f32, (i8, i8)); TRACE_CACHE_DIRECTIONS] = [
    (0.0, (1, 0)),
    (45.0, (1, -1)),
    (90.0, (0, -1)),
    (135.0, (-1, -1)),
    (180.0, (-1, 0)),
    (225.0, (-1, 1)),
    (270.0, (0, 1)),
    (315.0, (1, 1)),
];

/// Preference order for non-random key moves: forward first, then the
/// gentlest deviations.
const KEY_MOVE_PREFERENCE: [usize; TRACE_CACHE_DIRECTIONS] = [0, 1, 7, 2, 6, 3, 5, 4];

#[derive(Clone, Debug, Default)]
pub struct EnvTraceCache {
    full: [Option<TraceResult>; TRACE_CACHE_DIRECTIONS],
    jumpable: [Option<TraceResult>; TRACE_CACHE_DIRECTIONS],
    shortcut_checked: bool,
}

impl EnvTraceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dir_vector(snapshot: &PhysicsSnapshot, index: usize) -> Vec3 {
        dir_from_angles(snapshot.yaw + DIR_TABLE[index].0, 0.0)
    }

    pub fn dir_keys(index: usize) -> (i8, i8) {
        DIR_TABLE[index].1
    }

    /// Probe one direction at one band, tracing only when the answer is not
    /// already known for this step.
    pub fn probe(
        &mut self,
        env: &dyn SimEnvironment,
        nav: &dyn NavQuery,
        snapshot: &PhysicsSnapshot,
        index: usize,
        band: ProbeBand,
    ) -> TraceResult {
        self.try_bulk_shortcut(nav, snapshot);

        let slot = match band {
            ProbeBand::FullHeight => self.full[index],
            ProbeBand::Jumpable => self.jumpable[index],
        };
        if let Some(result) = slot {
            return result;
        }

        let dir = Self::dir_vector(snapshot, index);
        let end = snapshot.origin + dir * TRACE_CACHE_PROBE_DEPTH;
        let result = match band {
            ProbeBand::FullHeight => {
                let result = env.trace(snapshot.origin, end, BoxBounds::standing_player());
                self.full[index] = Some(result);
                if !result.hit() {
                    // An unobstructed full-height probe settles the raised
                    // band for free.
                    self.jumpable[index] = Some(result);
                }
                result
            }
            ProbeBand::Jumpable => {
                let result = env.trace(snapshot.origin, end, BoxBounds::jumpable_player());
                self.jumpable[index] = Some(result);
                result
            }
        };
        result
    }

    pub fn is_open(
        &mut self,
        env: &dyn SimEnvironment,
        nav: &dyn NavQuery,
        snapshot: &PhysicsSnapshot,
        index: usize,
        band: ProbeBand,
    ) -> bool {
        !self.probe(env, nav, snapshot, index, band).hit()
    }

    /// Bit per blocked direction at the given band.
    pub fn blocked_mask(
        &mut self,
        env: &dyn SimEnvironment,
        nav: &dyn NavQuery,
        snapshot: &PhysicsSnapshot,
        band: ProbeBand,
    ) -> u8 {
        let mut mask = 0u8;
        for index in 0..TRACE_CACHE_DIRECTIONS {
            if !self.is_open(env, nav, snapshot, index, band) {
                mask |= 1 << index;
            }
        }
        mask
    }

    /// When the surrounding nav area already guarantees clearance on every
    /// side, mark all 16 results open without a single cast.
    fn try_bulk_shortcut(&mut self, nav: &dyn NavQuery, snapshot: &PhysicsSnapshot) {
        if self.shortcut_checked {
            return;
        }
        self.shortcut_checked = true;

        if snapshot.area_num == 0 {
            return;
        }
        let Some(bounds) = nav.area_bounds(snapshot.area_num) else {
            return;
        };
        let origin = snapshot.origin;
        let clearance = TRACE_CACHE_SHORTCUT_CLEARANCE;
        let roomy = origin.x - bounds.mins.x >= clearance
            && bounds.maxs.x - origin.x >= clearance
            && origin.y - bounds.mins.y >= clearance
            && bounds.maxs.y - origin.y >= clearance;
        if !roomy {
            return;
        }

        for index in 0..TRACE_CACHE_DIRECTIONS {
            let dir = Self::dir_vector(snapshot, index);
            let open = TraceResult::open(origin + dir * TRACE_CACHE_PROBE_DEPTH);
            self.full[index] = Some(open);
            self.jumpable[index] = Some(open);
        }
    }

    /// Blend an intended look direction away from blocked space, weighting
    /// candidate directions by how well they align with the current velocity.
    pub fn correct_intended_dir(
        &mut self,
        env: &dyn SimEnvironment,
        nav: &dyn NavQuery,
        snapshot: &PhysicsSnapshot,
        intended: Vec3,
    ) -> Vec3 {
        let intended = intended.normalized_or_zero();
        if intended == Vec3::ZERO {
            return intended;
        }

        // Find which compass slot the intent falls into; if that way is
        // open there is nothing to correct.
        let mut best_aligned = 0;
        let mut best_dot = -2.0;
        for index in 0..TRACE_CACHE_DIRECTIONS {
            let dot = Self::dir_vector(snapshot, index).dot(intended);
            if dot > best_dot {
                best_dot = dot;
                best_aligned = index;
            }
        }
        if self.is_open(env, nav, snapshot, best_aligned, ProbeBand::FullHeight) {
            return intended;
        }

        let velocity_dir = snapshot.velocity.horizontal().normalized_or_zero();
        let mut best: Option<(Vec3, f32)> = None;
        for index in 0..TRACE_CACHE_DIRECTIONS {
            if !self.is_open(env, nav, snapshot, index, ProbeBand::FullHeight) {
                continue;
            }
            let dir = Self::dir_vector(snapshot, index);
            let score = dir.dot(intended) * 0.6 + dir.dot(velocity_dir) * 0.4;
            match best {
                None => best = Some((dir, score)),
                Some((_, existing)) if score > existing => best = Some((dir, score)),
                _ => {}
            }
        }

        match best {
            Some((dir, _)) => (intended * 0.3 + dir * 0.7).normalized_or_zero(),
            None => intended,
        }
    }

    /// Pick a key pair among non-blocked directions: deterministic preference
    /// order, or a seeded random choice when `randomized`.
    pub fn pick_key_move(
        &mut self,
        env: &dyn SimEnvironment,
        nav: &dyn NavQuery,
        snapshot: &PhysicsSnapshot,
        rng: &mut SeededRng,
        randomized: bool,
    ) -> Option<(i8, i8)> {
        let mut open = [false; TRACE_CACHE_DIRECTIONS];
        let mut open_count = 0u32;
        for index in 0..TRACE_CACHE_DIRECTIONS {
            if self.is_open(env, nav, snapshot, index, ProbeBand::FullHeight) {
                open[index] = true;
                open_count += 1;
            }
        }
        if open_count == 0 {
            return None;
        }

        if randomized {
            let mut pick = rng.next_int(open_count);
            for (index, is_open) in open.iter().enumerate() {
                if !is_open {
                    continue;
                }
                if pick == 0 {
                    return Some(Self::dir_keys(index));
                }
                pick -= 1;
            }
            None
        } else {
            KEY_MOVE_PREFERENCE
                .iter()
                .find(|index| open[**index])
                .map(|index| Self::dir_keys(*index))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_movement_core::sim::MoveWorld;

    fn world_with_east_wall() -> MoveWorld {
        let mut world = MoveWorld::new(BoxBounds::new(
            Vec3::new(-512.0, -512.0, 0.0),
            Vec3::new(512.0, 512.0, 256.0),
        ));
        world.add_brush(BoxBounds::new(
            Vec3::new(-512.0, -512.0, -16.0),
            Vec3::new(512.0, 512.0, 0.0),
        ));
        world.add_brush(BoxBounds::new(
            Vec3::new(48.0, -512.0, 0.0),
            Vec3::new(96.0, 512.0, 256.0),
        ));
        world
    }

    fn snapshot() -> PhysicsSnapshot {
        PhysicsSnapshot {
            origin: Vec3::new(0.0, 0.0, 0.5),
            yaw: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn wall_ahead_is_blocked_and_cached() {
        let world = world_with_east_wall();
        let nav = arena_movement_core::nav::GridNav::new();
        let mut cache = EnvTraceCache::new();
        let snapshot = snapshot();

        let first = cache.probe(&world, &nav, &snapshot, 0, ProbeBand::FullHeight);
        assert!(first.hit());
        // Second query answers from the slot; equality proves no re-cast drift.
        let second = cache.probe(&world, &nav, &snapshot, 0, ProbeBand::FullHeight);
        assert_eq!(first, second);
        // Opposite direction is open, and its jumpable band came for free.
        assert!(cache.is_open(&world, &nav, &snapshot, 4, ProbeBand::FullHeight));
        assert!(cache.jumpable[4].is_some());
    }

    #[test]
    fn correction_steers_away_from_the_wall() {
        let world = world_with_east_wall();
        let nav = arena_movement_core::nav::GridNav::new();
        let mut cache = EnvTraceCache::new();
        let snapshot = snapshot();

        let corrected =
            cache.correct_intended_dir(&world, &nav, &snapshot, Vec3::new(1.0, 0.0, 0.0));
        assert!(corrected.x < 1.0);
        assert!((corrected.length() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn key_move_prefers_forward_when_open() {
        let world = world_with_east_wall();
        let nav = arena_movement_core::nav::GridNav::new();
        let mut cache = EnvTraceCache::new();
        let mut rng = SeededRng::new(7);

        let mut snapshot = snapshot();
        snapshot.yaw = 180.0; // face away from the wall
        let keys = cache
            .pick_key_move(&world, &nav, &snapshot, &mut rng, false)
            .unwrap();
        assert_eq!(keys, (1, 0));
    }
}
