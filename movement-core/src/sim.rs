//! Reference world: axis-aligned brushes, water, triggers, and a
//! deterministic player integrator behind [`SimEnvironment`]. This is the
//! vehicle the planner is exercised against; a real game supplies its own
//! implementation of the same traits.

use crate::command::{BotInput, BUTTON_SPECIAL, BUTTON_WALK};
use crate::constants::{
    AIR_ACCEL, DASH_COOLDOWN_MS, DASH_VELOCITY_UPS, FALL_DAMAGE_SPEED_UPS, GRAVITY_UPS2,
    GROUND_ACCEL, GROUND_FRICTION, JUMP_VELOCITY_UPS, PLAYER_VIEW_HEIGHT, STEP_HEIGHT,
    SWIM_SPEED_UPS, WALK_SPEED_FRACTION, WALLJUMP_COOLDOWN_MS, WALLJUMP_VERTICAL_UPS,
    WATER_FRICTION,
};
use crate::env::{FrameEventSink, PredictedEvent, SimEnvironment, TriggerKind};
use crate::math::{dir_from_angles, pitch_of, yaw_of, Vec3};
use crate::snapshot::{
    EntityId, PlayerState, ENTITY_WORLD, MOVE_FEATURE_DASH, MOVE_FEATURE_WALLJUMP,
    WATER_LEVEL_FEET, WATER_LEVEL_HEAD, WATER_LEVEL_NONE, WATER_LEVEL_WAIST,
};
use crate::trace::{BoxBounds, TraceResult, CONTENTS_SOLID, CONTENTS_WATER};

const TRACE_PULLBACK: f32 = 0.03;
const GROUND_NORMAL_MIN_Z: f32 = 0.7;
const GROUND_PROBE_DEPTH: f32 = 2.0;
const WALLJUMP_PROBE_DEPTH: f32 = 20.0;
const MAX_CLIP_BUMPS: usize = 4;

#[derive(Clone, Copy, Debug)]
struct Brush {
    bounds: BoxBounds,
    entity: EntityId,
}

#[derive(Clone, Copy, Debug)]
struct WaterVolume {
    bounds: BoxBounds,
    contents: u32,
}

#[derive(Clone, Copy, Debug)]
enum TriggerBehavior {
    Jumppad { push: Vec3, target: Vec3 },
    Teleporter { dest: Vec3 },
}

#[derive(Clone, Copy, Debug)]
struct TriggerVolume {
    bounds: BoxBounds,
    entity: EntityId,
    behavior: TriggerBehavior,
}

#[derive(Clone, Copy, Debug)]
struct Platform {
    entity: EntityId,
    body: BoxBounds,
    top_z: f32,
    rise_speed: f32,
}

#[derive(Clone, Debug)]
pub struct MoveWorld {
    brushes: Vec<Brush>,
    water: Vec<WaterVolume>,
    triggers: Vec<TriggerVolume>,
    platforms: Vec<Platform>,
    next_entity: u16,
}

impl MoveWorld {
    /// An empty world enclosed by six solid slabs at `bounds`.
    pub fn new(bounds: BoxBounds) -> Self {
        let mut world = Self {
            brushes: Vec::new(),
            water: Vec::new(),
            triggers: Vec::new(),
            platforms: Vec::new(),
            next_entity: 1,
        };
        let pad = 512.0;
        let lo = bounds.mins - Vec3::new(pad, pad, pad);
        let hi = bounds.maxs + Vec3::new(pad, pad, pad);
        let walls = [
            BoxBounds::new(lo, Vec3::new(bounds.mins.x, hi.y, hi.z)),
            BoxBounds::new(Vec3::new(bounds.maxs.x, lo.y, lo.z), hi),
            BoxBounds::new(lo, Vec3::new(hi.x, bounds.mins.y, hi.z)),
            BoxBounds::new(Vec3::new(lo.x, bounds.maxs.y, lo.z), hi),
            BoxBounds::new(lo, Vec3::new(hi.x, hi.y, bounds.mins.z)),
            BoxBounds::new(Vec3::new(lo.x, lo.y, bounds.maxs.z), hi),
        ];
        for wall in walls {
            world.brushes.push(Brush {
                bounds: wall,
                entity: ENTITY_WORLD,
            });
        }
        world
    }

    pub fn add_brush(&mut self, bounds: BoxBounds) {
        self.brushes.push(Brush {
            bounds,
            entity: ENTITY_WORLD,
        });
    }

    pub fn add_water(&mut self, bounds: BoxBounds, contents: u32) {
        self.water.push(WaterVolume {
            bounds,
            contents: contents | CONTENTS_WATER,
        });
    }

    pub fn add_jumppad(&mut self, bounds: BoxBounds, push: Vec3, target: Vec3) -> EntityId {
        let entity = self.alloc_entity();
        self.triggers.push(TriggerVolume {
            bounds,
            entity,
            behavior: TriggerBehavior::Jumppad { push, target },
        });
        entity
    }

    pub fn add_teleporter(&mut self, bounds: BoxBounds, dest: Vec3) -> EntityId {
        let entity = self.alloc_entity();
        self.triggers.push(TriggerVolume {
            bounds,
            entity,
            behavior: TriggerBehavior::Teleporter { dest },
        });
        entity
    }

    /// A platform body that carries anyone standing on it up to `top_z`.
    pub fn add_platform(&mut self, body: BoxBounds, top_z: f32, rise_speed: f32) -> EntityId {
        let entity = self.alloc_entity();
        self.brushes.push(Brush {
            bounds: body,
            entity,
        });
        self.platforms.push(Platform {
            entity,
            body,
            top_z,
            rise_speed,
        });
        entity
    }

    /// The platform whose ride column contains `origin`, if any: inside the
    /// body footprint, between the body top and the travel top.
    fn riding_platform(&self, origin: Vec3) -> Option<&Platform> {
        self.platforms.iter().find(|platform| {
            origin.x >= platform.body.mins.x
                && origin.x <= platform.body.maxs.x
                && origin.y >= platform.body.mins.y
                && origin.y <= platform.body.maxs.y
                && origin.z >= platform.body.maxs.z - 2.0
                && origin.z <= platform.top_z + 0.5
        })
    }

    pub fn platform_top_z(&self, entity: EntityId) -> Option<f32> {
        self.platforms
            .iter()
            .find(|platform| platform.entity == entity)
            .map(|platform| platform.top_z)
    }

    pub fn is_platform(&self, entity: EntityId) -> bool {
        self.platforms.iter().any(|platform| platform.entity == entity)
    }

    fn alloc_entity(&mut self) -> EntityId {
        let entity = EntityId(self.next_entity);
        self.next_entity += 1;
        entity
    }

    fn ground_entity_at(&self, origin: Vec3, bounds: BoxBounds) -> Option<EntityId> {
        let below = origin - Vec3::new(0.0, 0.0, GROUND_PROBE_DEPTH);
        let tr = self.trace(origin, below, bounds);
        if tr.hit() && tr.normal.z >= GROUND_NORMAL_MIN_Z {
            tr.entity
        } else {
            None
        }
    }

    fn water_level_at(&self, origin: Vec3) -> u8 {
        let probes = [
            (origin + Vec3::new(0.0, 0.0, PLAYER_VIEW_HEIGHT), WATER_LEVEL_HEAD),
            (
                origin + Vec3::new(0.0, 0.0, PLAYER_VIEW_HEIGHT * 0.5),
                WATER_LEVEL_WAIST,
            ),
            (origin + Vec3::new(0.0, 0.0, 4.0), WATER_LEVEL_FEET),
        ];
        for (point, level) in probes {
            if self.point_contents(point) & CONTENTS_WATER != 0 {
                return level;
            }
        }
        WATER_LEVEL_NONE
    }

    fn water_contents_at(&self, point: Vec3) -> u32 {
        for volume in &self.water {
            if volume.bounds.contains_point(point) {
                return volume.contents;
            }
        }
        0
    }

    /// Sweep `bounds` against one brush, updating `best` in place.
    fn clip_to_brush(
        start: Vec3,
        delta: Vec3,
        bounds: BoxBounds,
        brush: &Brush,
        best: &mut TraceResult,
    ) {
        // Minkowski-expand the brush by the moving box.
        let expanded = BoxBounds::new(
            brush.bounds.mins - bounds.maxs,
            brush.bounds.maxs - bounds.mins,
        );

        let mut t_enter = -f32::INFINITY;
        let mut t_exit = f32::INFINITY;
        let mut enter_normal = Vec3::ZERO;

        for axis in 0..3 {
            let (s, d, lo, hi) = match axis {
                0 => (start.x, delta.x, expanded.mins.x, expanded.maxs.x),
                1 => (start.y, delta.y, expanded.mins.y, expanded.maxs.y),
                _ => (start.z, delta.z, expanded.mins.z, expanded.maxs.z),
            };
            if d.abs() < 1e-8 {
                if s < lo || s > hi {
                    return;
                }
                continue;
            }
            let inv = 1.0 / d;
            let mut t1 = (lo - s) * inv;
            let mut t2 = (hi - s) * inv;
            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
            }
            // The entering face always opposes the motion along this axis.
            if t1 > t_enter {
                t_enter = t1;
                enter_normal = axis_normal(axis, -d.signum());
            }
            t_exit = t_exit.min(t2);
        }

        if t_enter > t_exit || t_exit < 0.0 || t_enter > best.fraction {
            return;
        }

        if t_enter < 0.0 {
            // Started inside this brush.
            *best = TraceResult {
                fraction: 0.0,
                end: start,
                normal: Vec3::ZERO,
                contents: CONTENTS_SOLID,
                surface_flags: 0,
                entity: Some(brush.entity),
            };
            return;
        }
        if t_enter > 1.0 {
            return;
        }

        let length = delta.length();
        let pullback = if length > 1e-6 {
            TRACE_PULLBACK / length
        } else {
            0.0
        };
        let fraction = (t_enter - pullback).max(0.0);
        if fraction < best.fraction {
            *best = TraceResult {
                fraction,
                end: start + delta * fraction,
                normal: enter_normal,
                contents: CONTENTS_SOLID,
                surface_flags: 0,
                entity: Some(brush.entity),
            };
        }
    }

    /// Clip a displacement against everything solid, sliding along planes.
    /// Attempts a step-up when a grounded move is blocked by a low wall.
    fn slide_move(
        &self,
        origin: &mut Vec3,
        velocity: &mut Vec3,
        bounds: BoxBounds,
        dt: f32,
        grounded: bool,
    ) {
        let mut remaining = dt;
        for _ in 0..MAX_CLIP_BUMPS {
            if remaining <= 0.0 || velocity.length_sq() < 1e-6 {
                return;
            }
            let target = *origin + *velocity * remaining;
            let tr = self.trace(*origin, target, bounds);
            *origin = tr.end;
            if !tr.hit() {
                return;
            }

            if grounded && tr.normal.z < GROUND_NORMAL_MIN_Z && tr.normal.z > -0.1 {
                if let Some(stepped) =
                    self.try_step_up(*origin, *velocity, bounds, remaining * (1.0 - tr.fraction))
                {
                    *origin = stepped;
                    return;
                }
            }

            // Clip the velocity to the blocking plane.
            let into = velocity.dot(tr.normal);
            if into < 0.0 {
                *velocity -= tr.normal * (into * 1.001);
            }
            remaining *= 1.0 - tr.fraction;
        }
    }

    fn try_step_up(&self, origin: Vec3, velocity: Vec3, bounds: BoxBounds, dt: f32) -> Option<Vec3> {
        let up = origin + Vec3::new(0.0, 0.0, STEP_HEIGHT);
        let tr_up = self.trace(origin, up, bounds);
        if tr_up.hit() {
            return None;
        }
        let across = tr_up.end + velocity.horizontal() * dt;
        let tr_across = self.trace(tr_up.end, across, bounds);
        if tr_across.fraction < 0.5 {
            return None;
        }
        let down = tr_across.end - Vec3::new(0.0, 0.0, STEP_HEIGHT);
        let tr_down = self.trace(tr_across.end, down, bounds);
        if tr_down.hit() && tr_down.normal.z >= GROUND_NORMAL_MIN_Z {
            Some(tr_down.end)
        } else {
            None
        }
    }

    fn walljump_probe(&self, origin: Vec3, velocity: Vec3, bounds: BoxBounds) -> Option<Vec3> {
        let dir = velocity.horizontal().normalized_or_zero();
        if dir == Vec3::ZERO {
            return None;
        }
        let tr = self.trace(origin, origin + dir * WALLJUMP_PROBE_DEPTH, bounds);
        if tr.hit() && tr.normal.z.abs() < GROUND_NORMAL_MIN_Z {
            Some(tr.normal)
        } else {
            None
        }
    }
}

impl SimEnvironment for MoveWorld {
    fn trace(&self, start: Vec3, end: Vec3, bounds: BoxBounds) -> TraceResult {
        let delta = end - start;
        let mut best = TraceResult::open(end);
        for brush in &self.brushes {
            Self::clip_to_brush(start, delta, bounds, brush, &mut best);
            if best.fraction == 0.0 {
                break;
            }
        }
        best
    }

    fn point_contents(&self, point: Vec3) -> u32 {
        let mut contents = self.water_contents_at(point);
        for brush in &self.brushes {
            if brush.bounds.contains_point(point) {
                contents |= CONTENTS_SOLID;
                break;
            }
        }
        contents
    }

    /// Integration runs in fixed quanta so a long predicted step lands
    /// exactly where the same wall time of short real steps would.
    fn step_player(
        &self,
        state: &mut PlayerState,
        input: &BotInput,
        frame_ms: u32,
        events: &mut dyn FrameEventSink,
    ) {
        let quanta = (frame_ms / crate::constants::FRAME_QUANTUM_MS).max(1);
        let mut velocity_override = input.velocity_override;
        for _ in 0..quanta {
            self.integrate(state, input, velocity_override.take(), events);
        }
    }
}

impl MoveWorld {
    fn integrate(
        &self,
        state: &mut PlayerState,
        input: &BotInput,
        velocity_override: Option<Vec3>,
        events: &mut dyn FrameEventSink,
    ) {
        let dt = crate::constants::FRAME_QUANTUM_MS as f32 / 1000.0;
        let bounds = BoxBounds::standing_player();
        let mut origin = state.physics.origin;
        let mut velocity = state.physics.velocity;

        state.move_state.tick(crate::constants::FRAME_QUANTUM_MS);

        if let Some(dir) = input.look_dir {
            state.physics.yaw = yaw_of(dir);
            state.physics.pitch = pitch_of(dir);
        }
        if let Some(overridden) = velocity_override {
            velocity = overridden;
        }

        let water_level = self.water_level_at(origin);
        let mut ground = match self.riding_platform(origin) {
            Some(platform) => Some(platform.entity),
            None => self.ground_entity_at(origin, bounds),
        };
        let stunned = state.move_state.stun_ms > 0;

        let forward = dir_from_angles(state.physics.yaw, 0.0);
        let right = Vec3::new(forward.y, -forward.x, 0.0);
        let mut wishdir = (forward * input.forward as f32 + right * input.side as f32)
            .normalized_or_zero();
        let mut wishspeed = state.move_state.max_ground_speed;
        if input.is_pressed(BUTTON_WALK) {
            wishspeed *= WALK_SPEED_FRACTION;
        }

        if water_level >= WATER_LEVEL_WAIST {
            // Swimming: pitch steers, up swims vertically.
            let swim_forward = dir_from_angles(state.physics.yaw, state.physics.pitch);
            wishdir = (swim_forward * input.forward as f32
                + right * input.side as f32
                + Vec3::UP * input.up as f32)
                .normalized_or_zero();
            let drop = (1.0 - WATER_FRICTION * dt).max(0.0);
            velocity = velocity * drop;
            if !stunned {
                velocity = accelerate(velocity, wishdir, SWIM_SPEED_UPS, GROUND_ACCEL, dt);
            }
        } else if ground.is_some() && !stunned {
            if input.up > 0 {
                velocity.z = JUMP_VELOCITY_UPS;
                ground = None;
                events.predicted_event(PredictedEvent::Jump);
            } else {
                let speed = velocity.horizontal_length();
                if speed > 0.0 {
                    let drop = speed * GROUND_FRICTION * dt;
                    let scale = ((speed - drop).max(0.0)) / speed;
                    velocity.x *= scale;
                    velocity.y *= scale;
                }
                velocity = accelerate(velocity, wishdir, wishspeed, GROUND_ACCEL, dt);
            }

            if input.is_pressed(BUTTON_SPECIAL)
                && state.move_state.has_feature(MOVE_FEATURE_DASH)
                && state.move_state.dash_cooldown_ms == 0
                && velocity.horizontal_length() < state.move_state.dash_speed
            {
                let dash_dir = if wishdir == Vec3::ZERO { forward } else { wishdir };
                velocity.x = dash_dir.x * DASH_VELOCITY_UPS;
                velocity.y = dash_dir.y * DASH_VELOCITY_UPS;
                state.move_state.dash_cooldown_ms = DASH_COOLDOWN_MS;
                events.predicted_event(PredictedEvent::Dash);
            }
        } else {
            if input.is_pressed(BUTTON_SPECIAL)
                && !stunned
                && state.move_state.has_feature(MOVE_FEATURE_WALLJUMP)
                && state.move_state.walljump_cooldown_ms == 0
            {
                if let Some(normal) = self.walljump_probe(origin, velocity, bounds) {
                    let horizontal = velocity.horizontal();
                    let reflected = horizontal - normal * (2.0 * horizontal.dot(normal));
                    velocity.x = reflected.x * 0.9;
                    velocity.y = reflected.y * 0.9;
                    velocity.z = velocity.z.max(WALLJUMP_VERTICAL_UPS);
                    state.move_state.walljump_cooldown_ms = WALLJUMP_COOLDOWN_MS;
                    events.predicted_event(PredictedEvent::Walljump);
                }
            }
            if !stunned {
                velocity = accelerate(velocity, wishdir, wishspeed, AIR_ACCEL, dt);
            }
            velocity.z -= GRAVITY_UPS2 * dt;
        }

        let falling_speed = (-velocity.z).max(0.0);
        let was_grounded = ground.is_some();
        self.slide_move(&mut origin, &mut velocity, bounds, dt, was_grounded);

        // Platform carry: a rider below the platform's top keeps rising.
        // A jump (upward velocity) opts out of the carry for this quantum.
        if velocity.z <= 0.1 {
            if let Some(platform) = self.riding_platform(origin).copied() {
                if origin.z < platform.top_z {
                    origin.z = (origin.z + platform.rise_speed * dt).min(platform.top_z);
                    velocity.z = 0.0;
                    events.touch_trigger(
                        TriggerKind::Platform,
                        platform.entity,
                        Vec3::new(origin.x, origin.y, platform.top_z),
                    );
                }
            }
        }

        let new_ground = self.ground_entity_at(origin, bounds);
        if new_ground.is_some() {
            if !was_grounded && falling_speed > FALL_DAMAGE_SPEED_UPS {
                events.predicted_event(PredictedEvent::FallDamage);
            }
            if velocity.z < 0.0 {
                velocity.z = 0.0;
            }
        }

        let player_box = bounds.translated(origin);
        for trigger in &self.triggers {
            if !trigger.bounds.overlaps(&player_box) {
                continue;
            }
            match trigger.behavior {
                TriggerBehavior::Jumppad { push, target } => {
                    velocity = push;
                    events.touch_trigger(TriggerKind::Jumppad, trigger.entity, target);
                }
                TriggerBehavior::Teleporter { dest } => {
                    origin = dest;
                    events.touch_trigger(TriggerKind::Teleporter, trigger.entity, dest);
                }
            }
        }

        state.physics.origin = origin;
        state.physics.velocity = velocity;
        state.physics.ground_entity = if velocity.z > 1.0 {
            None
        } else if let Some(platform) = self.riding_platform(origin) {
            Some(platform.entity)
        } else {
            self.ground_entity_at(origin, bounds)
        };
        state.physics.water_level = self.water_level_at(origin);
        // Area numbers are navigation data; the caller refreshes them.
    }
}

/// Quake-style acceleration: only the missing speed along the wish direction
/// is added, capped by `accel`.
fn accelerate(velocity: Vec3, wishdir: Vec3, wishspeed: f32, accel: f32, dt: f32) -> Vec3 {
    if wishdir == Vec3::ZERO {
        return velocity;
    }
    let current = velocity.dot(wishdir);
    let add = wishspeed - current;
    if add <= 0.0 {
        return velocity;
    }
    let push = (accel * wishspeed * dt).min(add);
    velocity + wishdir * push
}

#[inline]
fn axis_normal(axis: usize, sign: f32) -> Vec3 {
    match axis {
        0 => Vec3::new(sign, 0.0, 0.0),
        1 => Vec3::new(0.0, sign, 0.0),
        _ => Vec3::new(0.0, 0.0, sign),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::FrameEvents;
    use crate::snapshot::PhysicsSnapshot;

    fn flat_world() -> MoveWorld {
        let mut world = MoveWorld::new(BoxBounds::new(
            Vec3::new(-1024.0, -1024.0, 0.0),
            Vec3::new(1024.0, 1024.0, 512.0),
        ));
        world.add_brush(BoxBounds::new(
            Vec3::new(-1024.0, -1024.0, -16.0),
            Vec3::new(1024.0, 1024.0, 0.0),
        ));
        world
    }

    fn standing_state() -> PlayerState {
        PlayerState {
            physics: PhysicsSnapshot {
                origin: Vec3::new(0.0, 0.0, 0.5),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn stepping_is_deterministic() {
        let world = flat_world();
        let mut input = BotInput::default();
        input.set_forward(1);

        let mut a = standing_state();
        let mut b = standing_state();
        let mut events = FrameEvents::default();
        for _ in 0..20 {
            world.step_player(&mut a, &input, 48, &mut events);
            world.step_player(&mut b, &input, 48, &mut events);
        }
        assert_eq!(a, b);
    }

    #[test]
    fn forward_input_builds_ground_speed() {
        let world = flat_world();
        let mut state = standing_state();
        let mut input = BotInput::default();
        input.set_forward(1);
        let mut events = FrameEvents::default();
        for _ in 0..40 {
            world.step_player(&mut state, &input, 48, &mut events);
        }
        assert!(state.physics.planar_speed() > 300.0);
        assert!(state.physics.grounded());
    }

    #[test]
    fn walls_stop_horizontal_motion() {
        let mut world = flat_world();
        world.add_brush(BoxBounds::new(
            Vec3::new(128.0, -1024.0, 0.0),
            Vec3::new(160.0, 1024.0, 512.0),
        ));
        let mut state = standing_state();
        let mut input = BotInput::default();
        input.set_forward(1);
        let mut events = FrameEvents::default();
        for _ in 0..80 {
            world.step_player(&mut state, &input, 48, &mut events);
        }
        assert!(state.physics.origin.x < 128.0);
        assert!(state.physics.planar_speed() < 30.0);
    }

    #[test]
    fn jumppad_touch_reports_and_launches() {
        let mut world = flat_world();
        world.add_jumppad(
            BoxBounds::new(Vec3::new(-32.0, -32.0, 0.0), Vec3::new(32.0, 32.0, 8.0)),
            Vec3::new(0.0, 0.0, 600.0),
            Vec3::new(0.0, 0.0, 300.0),
        );
        let mut state = standing_state();
        let input = BotInput::default();
        let mut events = FrameEvents::default();
        world.step_player(&mut state, &input, 48, &mut events);
        assert!(events.touched_jumppad.is_some());
        assert!(state.physics.velocity.z > 500.0);
    }
}
