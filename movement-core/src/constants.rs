//! Movement and planning constants. Values that are empirically tuned rather
//! than structural live in `rust-movebot`'s `PlannerConfig` instead.

/// Smallest simulated step; every frame duration is a multiple of this.
pub const FRAME_QUANTUM_MS: u32 = 16;

/// Default duration of one predicted step.
pub const DEFAULT_FRAME_MS: u32 = 48;

/// Hard ceiling on a single predicted step duration (exclusive).
pub const MAX_FRAME_MS: u32 = 100;

/// Capacity of the predicted-frame stack and of every per-frame cache arena.
pub const MAX_PREDICTED_FRAMES: usize = 48;

// Player bounding box (Z up, origin at feet center).
pub const PLAYER_HALF_WIDTH: f32 = 16.0;
pub const PLAYER_HEIGHT: f32 = 56.0;
pub const PLAYER_CROUCH_HEIGHT: f32 = 38.0;
pub const PLAYER_VIEW_HEIGHT: f32 = 46.0;

/// Highest ledge the slide move will step up without a jump.
pub const STEP_HEIGHT: f32 = 18.0;

pub const GRAVITY_UPS2: f32 = 850.0;
pub const JUMP_VELOCITY_UPS: f32 = 280.0;
pub const DASH_VELOCITY_UPS: f32 = 550.0;
pub const WALLJUMP_VERTICAL_UPS: f32 = 300.0;

pub const DEFAULT_RUN_SPEED_UPS: f32 = 480.0;
pub const DEFAULT_DASH_SPEED_UPS: f32 = 550.0;
pub const WALK_SPEED_FRACTION: f32 = 0.5;

pub const GROUND_ACCEL: f32 = 12.0;
pub const AIR_ACCEL: f32 = 1.0;
pub const GROUND_FRICTION: f32 = 8.0;
pub const WATER_FRICTION: f32 = 4.0;
pub const SWIM_SPEED_UPS: f32 = 300.0;

pub const DASH_COOLDOWN_MS: u16 = 1000;
pub const WALLJUMP_COOLDOWN_MS: u16 = 1300;
pub const CROUCH_SLIDE_MS: u16 = 800;

/// Landing faster than this (downward, units/s) reports a fall-damage event.
pub const FALL_DAMAGE_SPEED_UPS: f32 = 600.0;

/// Velocity overrides and packed points are snapped to this grid.
pub const VELOCITY_SNAP: f32 = 1.0 / 16.0;

/// Upper bound on saved candidate landing areas after a jump pad.
pub const MAX_SAVED_LANDING_AREAS: usize = 16;

/// Compass directions probed by the environment trace cache.
pub const TRACE_CACHE_DIRECTIONS: usize = 8;

/// Length of one trace-cache probe, in units.
pub const TRACE_CACHE_PROBE_DEPTH: f32 = 40.0;

/// Clearance the bulk shortcut requires from the area bounds, in units.
pub const TRACE_CACHE_SHORTCUT_CLEARANCE: f32 = 48.0;
