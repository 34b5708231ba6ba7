use crate::constants::{PLAYER_HALF_WIDTH, PLAYER_HEIGHT, STEP_HEIGHT};
use crate::math::Vec3;
use crate::snapshot::EntityId;

pub const CONTENTS_SOLID: u32 = 1 << 0;
pub const CONTENTS_WATER: u32 = 1 << 1;
pub const CONTENTS_LAVA: u32 = 1 << 2;
pub const CONTENTS_SLIME: u32 = 1 << 3;
pub const CONTENTS_PLAYERCLIP: u32 = 1 << 4;
pub const CONTENTS_TRIGGER: u32 = 1 << 5;
pub const CONTENTS_DONOTENTER: u32 = 1 << 6;

/// Contents a predicted step must never end up inside.
pub const CONTENTS_HAZARD: u32 = CONTENTS_LAVA | CONTENTS_SLIME;

pub const SURF_LADDER: u32 = 1 << 0;
pub const SURF_NOWALLJUMP: u32 = 1 << 1;

/// Axis-aligned bounds, mins/maxs relative to an origin at the feet center.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxBounds {
    pub mins: Vec3,
    pub maxs: Vec3,
}

impl BoxBounds {
    pub const fn new(mins: Vec3, maxs: Vec3) -> Self {
        Self { mins, maxs }
    }

    /// Full-height standing player box.
    pub fn standing_player() -> Self {
        Self {
            mins: Vec3::new(-PLAYER_HALF_WIDTH, -PLAYER_HALF_WIDTH, 0.0),
            maxs: Vec3::new(PLAYER_HALF_WIDTH, PLAYER_HALF_WIDTH, PLAYER_HEIGHT),
        }
    }

    /// Player box with the lower bound raised to step height, so probes
    /// ignore obstructions a step-up or jump would clear.
    pub fn jumpable_player() -> Self {
        let mut bounds = Self::standing_player();
        bounds.mins.z += STEP_HEIGHT;
        bounds
    }

    pub fn center(&self) -> Vec3 {
        (self.mins + self.maxs) * 0.5
    }

    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            mins: self.mins + offset,
            maxs: self.maxs + offset,
        }
    }

    pub fn expanded(&self, margin: f32) -> Self {
        let m = Vec3::new(margin, margin, margin);
        Self {
            mins: self.mins - m,
            maxs: self.maxs + m,
        }
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.mins.x
            && point.x <= self.maxs.x
            && point.y >= self.mins.y
            && point.y <= self.maxs.y
            && point.z >= self.mins.z
            && point.z <= self.maxs.z
    }

    pub fn overlaps(&self, other: &Self) -> bool {
        self.mins.x <= other.maxs.x
            && self.maxs.x >= other.mins.x
            && self.mins.y <= other.maxs.y
            && self.maxs.y >= other.mins.y
            && self.mins.z <= other.maxs.z
            && self.maxs.z >= other.mins.z
    }
}

/// Result of one collision probe. There is no error variant: a probe always
/// answers with how far it got and what it ran into.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TraceResult {
    /// Fraction of the requested sweep that completed, 1.0 = unobstructed.
    pub fraction: f32,
    pub end: Vec3,
    pub normal: Vec3,
    pub contents: u32,
    pub surface_flags: u32,
    pub entity: Option<EntityId>,
}

impl TraceResult {
    pub fn open(end: Vec3) -> Self {
        Self {
            fraction: 1.0,
            end,
            normal: Vec3::ZERO,
            contents: 0,
            surface_flags: 0,
            entity: None,
        }
    }

    #[inline]
    pub fn hit(&self) -> bool {
        self.fraction < 1.0
    }
}
