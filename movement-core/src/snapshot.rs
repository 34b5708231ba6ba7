use crate::math::{dir_from_angles, Vec3};
use serde::{Deserialize, Serialize};

/// Handle of a world entity a trace or ground check can hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u16);

/// The static world geometry.
pub const ENTITY_WORLD: EntityId = EntityId(0);

pub const WATER_LEVEL_NONE: u8 = 0;
pub const WATER_LEVEL_FEET: u8 = 1;
pub const WATER_LEVEL_WAIST: u8 = 2;
pub const WATER_LEVEL_HEAD: u8 = 3;

/// Physics fields captured before every simulated step and diffed after it.
/// Copied by value between stack frames; never aliased.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhysicsSnapshot {
    pub origin: Vec3,
    pub velocity: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub ground_entity: Option<EntityId>,
    pub water_level: u8,
    /// Navigation area at the origin; 0 when outside the area graph.
    pub area_num: u32,
    /// Navigation area after dropping the origin to the floor.
    pub dropped_area_num: u32,
}

impl Default for PhysicsSnapshot {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            velocity: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            ground_entity: None,
            water_level: WATER_LEVEL_NONE,
            area_num: 0,
            dropped_area_num: 0,
        }
    }
}

impl PhysicsSnapshot {
    #[inline]
    pub fn planar_speed(&self) -> f32 {
        self.velocity.horizontal_length()
    }

    #[inline]
    pub fn forward_dir(&self) -> Vec3 {
        dir_from_angles(self.yaw, self.pitch)
    }

    #[inline]
    pub fn grounded(&self) -> bool {
        self.ground_entity.is_some()
    }
}

// Movement capabilities.
pub const MOVE_FEATURE_DASH: u8 = 1 << 0;
pub const MOVE_FEATURE_WALLJUMP: u8 = 1 << 1;
pub const MOVE_FEATURE_CROUCH_SLIDE: u8 = 1 << 2;

// Externally imposed restrictions.
pub const MOVE_RESTRICTION_SILENT: u8 = 1 << 0;

/// Per-class movement parameters and ability cooldown timers.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerMoveState {
    pub features: u8,
    pub restrictions: u8,
    pub max_ground_speed: f32,
    pub dash_speed: f32,
    pub stun_ms: u16,
    pub dash_cooldown_ms: u16,
    pub walljump_cooldown_ms: u16,
    pub crouch_slide_ms: u16,
}

impl Default for PlayerMoveState {
    fn default() -> Self {
        Self {
            features: MOVE_FEATURE_DASH | MOVE_FEATURE_WALLJUMP,
            restrictions: 0,
            max_ground_speed: crate::constants::DEFAULT_RUN_SPEED_UPS,
            dash_speed: crate::constants::DEFAULT_DASH_SPEED_UPS,
            stun_ms: 0,
            dash_cooldown_ms: 0,
            walljump_cooldown_ms: 0,
            crouch_slide_ms: 0,
        }
    }
}

impl PlayerMoveState {
    #[inline]
    pub fn has_feature(&self, feature: u8) -> bool {
        self.features & feature != 0
    }

    #[inline]
    pub fn is_restricted(&self, restriction: u8) -> bool {
        self.restrictions & restriction != 0
    }

    pub fn tick(&mut self, dt_ms: u32) {
        let dt = dt_ms.min(u16::MAX as u32) as u16;
        self.stun_ms = self.stun_ms.saturating_sub(dt);
        self.dash_cooldown_ms = self.dash_cooldown_ms.saturating_sub(dt);
        self.walljump_cooldown_ms = self.walljump_cooldown_ms.saturating_sub(dt);
        self.crouch_slide_ms = self.crouch_slide_ms.saturating_sub(dt);
    }
}

/// Everything the physics-integration call reads and writes for one player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub physics: PhysicsSnapshot,
    pub move_state: PlayerMoveState,
}
