//! Persistent movement sub-states. Each member is an independently timed
//! {inactive, active} machine; the whole bundle is copied by value onto every
//! predicted frame. The packed form is an explicit boundary (quantized to
//! whole units and 16 ms ticks), not a memory-layout contract.

use crate::constants::FRAME_QUANTUM_MS;
use crate::error::DecodeError;
use crate::math::Vec3;
use crate::snapshot::PhysicsSnapshot;

pub const SUBSTATE_FLIGHT: u8 = 1 << 0;
pub const SUBSTATE_JUMPPAD: u8 = 1 << 1;
pub const SUBSTATE_WEAPON_JUMP: u8 = 1 << 2;
pub const SUBSTATE_PENDING_LOOK: u8 = 1 << 3;
pub const SUBSTATE_CAMP: u8 = 1 << 4;
pub const SUBSTATE_KEY_MOVE: u8 = 1 << 5;

const SUBSTATE_MASK: u8 = SUBSTATE_FLIGHT
    | SUBSTATE_JUMPPAD
    | SUBSTATE_WEAPON_JUMP
    | SUBSTATE_PENDING_LOOK
    | SUBSTATE_CAMP
    | SUBSTATE_KEY_MOVE;

/// Size of the packed wire form of a [`SubStateBundle`].
pub const PACKED_BUNDLE_LEN: usize = 32;

/// A camp deactivates once the agent strays past this multiple of its radius.
pub const CAMP_LEAVE_RADIUS_SCALE: f32 = 1.5;

/// Airborne-until-landing. Lands when the origin drops to `trigger_z` or the
/// flight times out; ground contact always ends it.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FlightState {
    pub active: bool,
    pub timeout_ms: u16,
    pub target: Vec3,
    pub trigger_z: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct JumppadState {
    pub active: bool,
    pub timeout_ms: u16,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WeaponJumpState {
    pub active: bool,
    pub timeout_ms: u16,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PendingLookState {
    pub active: bool,
    pub timeout_ms: u16,
    pub yaw: f32,
    pub pitch: f32,
}

/// Camp a spot. `timeout_ms == 0` camps indefinitely.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CampingState {
    pub active: bool,
    pub timeout_ms: u16,
    pub origin: Vec3,
    pub radius: f32,
    pub alert: bool,
}

/// Short-lived forced key move (e.g. stepping off a platform).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct KeyMoveState {
    pub active: bool,
    pub timeout_ms: u16,
    pub forward: i8,
    pub side: i8,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SubStateBundle {
    pub flight: FlightState,
    pub jumppad: JumppadState,
    pub weapon_jump: WeaponJumpState,
    pub pending_look: PendingLookState,
    pub camp: CampingState,
    pub key_move: KeyMoveState,
}

impl SubStateBundle {
    pub fn active_mask(&self) -> u8 {
        let mut mask = 0;
        if self.flight.active {
            mask |= SUBSTATE_FLIGHT;
        }
        if self.jumppad.active {
            mask |= SUBSTATE_JUMPPAD;
        }
        if self.weapon_jump.active {
            mask |= SUBSTATE_WEAPON_JUMP;
        }
        if self.pending_look.active {
            mask |= SUBSTATE_PENDING_LOOK;
        }
        if self.camp.active {
            mask |= SUBSTATE_CAMP;
        }
        if self.key_move.active {
            mask |= SUBSTATE_KEY_MOVE;
        }
        mask
    }

    /// Advance every timed member by `dt_ms`. A timer reaching zero turns its
    /// member off; a zero timer on an active member means "no time limit".
    pub fn frame(&mut self, dt_ms: u32) {
        tick_member(&mut self.flight.active, &mut self.flight.timeout_ms, dt_ms);
        tick_member(&mut self.jumppad.active, &mut self.jumppad.timeout_ms, dt_ms);
        tick_member(
            &mut self.weapon_jump.active,
            &mut self.weapon_jump.timeout_ms,
            dt_ms,
        );
        tick_member(
            &mut self.pending_look.active,
            &mut self.pending_look.timeout_ms,
            dt_ms,
        );
        tick_member(&mut self.camp.active, &mut self.camp.timeout_ms, dt_ms);
        tick_member(&mut self.key_move.active, &mut self.key_move.timeout_ms, dt_ms);
    }

    /// Turn members off whose trigger condition no longer holds against the
    /// post-step snapshot. Called once per simulated step.
    pub fn try_deactivate(&mut self, snapshot: &PhysicsSnapshot) {
        if self.flight.active && snapshot.grounded() {
            self.flight = FlightState::default();
        }
        if self.jumppad.active && snapshot.grounded() {
            self.jumppad = JumppadState::default();
        }
        if self.weapon_jump.active && snapshot.grounded() {
            self.weapon_jump = WeaponJumpState::default();
        }
        if self.camp.active
            && self.camp.radius > 0.0
            && snapshot.origin.distance_to(self.camp.origin)
                > self.camp.radius * CAMP_LEAVE_RADIUS_SCALE
        {
            self.camp = CampingState::default();
        }
    }

    pub fn activate_flight(&mut self, target: Vec3, trigger_z: f32, timeout_ms: u16) {
        self.flight = FlightState {
            active: true,
            timeout_ms,
            target,
            trigger_z,
        };
    }

    pub fn activate_jumppad(&mut self, timeout_ms: u16) {
        self.jumppad = JumppadState {
            active: true,
            timeout_ms,
        };
    }

    pub fn activate_weapon_jump(&mut self, timeout_ms: u16) {
        self.weapon_jump = WeaponJumpState {
            active: true,
            timeout_ms,
        };
    }

    pub fn activate_pending_look(&mut self, yaw: f32, pitch: f32, timeout_ms: u16) {
        self.pending_look = PendingLookState {
            active: true,
            timeout_ms,
            yaw,
            pitch,
        };
    }

    pub fn activate_camp(&mut self, origin: Vec3, radius: f32, alert: bool, timeout_ms: u16) {
        self.camp = CampingState {
            active: true,
            timeout_ms,
            origin,
            radius,
            alert,
        };
    }

    pub fn activate_key_move(&mut self, forward: i32, side: i32, timeout_ms: u16) {
        self.key_move = KeyMoveState {
            active: true,
            timeout_ms,
            forward: forward.clamp(-1, 1) as i8,
            side: side.clamp(-1, 1) as i8,
        };
    }

    pub fn encode_packed(&self) -> [u8; PACKED_BUNDLE_LEN] {
        let mut out = [0u8; PACKED_BUNDLE_LEN];
        out[0] = self.active_mask();
        out[1] = (self.key_move.forward + 1) as u8
            | (((self.key_move.side + 1) as u8) << 2)
            | if self.camp.alert { 1 << 4 } else { 0 };
        write_point(&mut out, 2, self.flight.target);
        write_i16_le(&mut out, 8, quantize_unit(self.flight.trigger_z));
        out[10] = ms_to_ticks(self.flight.timeout_ms);
        out[11] = ms_to_ticks(self.jumppad.timeout_ms);
        out[12] = ms_to_ticks(self.weapon_jump.timeout_ms);
        out[13] = ms_to_ticks(self.pending_look.timeout_ms);
        write_i16_le(&mut out, 14, yaw_to_i16(self.pending_look.yaw));
        write_i16_le(&mut out, 16, yaw_to_i16(self.pending_look.pitch));
        write_point(&mut out, 18, self.camp.origin);
        out[24] = (self.camp.radius / 4.0).round().clamp(0.0, 255.0) as u8;
        out[25] = ms_to_ticks(self.camp.timeout_ms);
        out[26] = ms_to_ticks(self.key_move.timeout_ms);
        out
    }

    pub fn decode_packed(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() < PACKED_BUNDLE_LEN {
            return Err(DecodeError::ShortBuffer {
                actual: bytes.len(),
                expected: PACKED_BUNDLE_LEN,
            });
        }
        if bytes[0] & !SUBSTATE_MASK != 0 {
            return Err(DecodeError::FieldOutOfRange { field: "active_mask" });
        }
        for (i, byte) in bytes[27..PACKED_BUNDLE_LEN].iter().enumerate() {
            if *byte != 0 {
                return Err(DecodeError::ReservedNonZero { offset: 27 + i });
            }
        }
        let keys = bytes[1];
        let forward = (keys & 0x03) as i32 - 1;
        let side = ((keys >> 2) & 0x03) as i32 - 1;
        if forward > 1 || side > 1 || keys & 0xE0 != 0 {
            return Err(DecodeError::FieldOutOfRange { field: "key_move" });
        }
        let mask = bytes[0];

        Ok(Self {
            flight: FlightState {
                active: mask & SUBSTATE_FLIGHT != 0,
                timeout_ms: ticks_to_ms(bytes[10]),
                target: read_point(bytes, 2),
                trigger_z: read_i16_le(bytes, 8) as f32,
            },
            jumppad: JumppadState {
                active: mask & SUBSTATE_JUMPPAD != 0,
                timeout_ms: ticks_to_ms(bytes[11]),
            },
            weapon_jump: WeaponJumpState {
                active: mask & SUBSTATE_WEAPON_JUMP != 0,
                timeout_ms: ticks_to_ms(bytes[12]),
            },
            pending_look: PendingLookState {
                active: mask & SUBSTATE_PENDING_LOOK != 0,
                timeout_ms: ticks_to_ms(bytes[13]),
                yaw: i16_to_yaw(read_i16_le(bytes, 14)),
                pitch: i16_to_yaw(read_i16_le(bytes, 16)),
            },
            camp: CampingState {
                active: mask & SUBSTATE_CAMP != 0,
                timeout_ms: ticks_to_ms(bytes[25]),
                origin: read_point(bytes, 18),
                radius: bytes[24] as f32 * 4.0,
                alert: keys & (1 << 4) != 0,
            },
            key_move: KeyMoveState {
                active: mask & SUBSTATE_KEY_MOVE != 0,
                timeout_ms: ticks_to_ms(bytes[26]),
                forward: forward as i8,
                side: side as i8,
            },
        })
    }
}

fn tick_member(active: &mut bool, timeout_ms: &mut u16, dt_ms: u32) {
    if !*active || *timeout_ms == 0 {
        return;
    }
    let dt = dt_ms.min(u16::MAX as u32) as u16;
    *timeout_ms = timeout_ms.saturating_sub(dt);
    if *timeout_ms == 0 {
        *active = false;
    }
}

#[inline]
fn ms_to_ticks(ms: u16) -> u8 {
    ms.div_ceil(FRAME_QUANTUM_MS as u16).min(255) as u8
}

#[inline]
fn ticks_to_ms(ticks: u8) -> u16 {
    ticks as u16 * FRAME_QUANTUM_MS as u16
}

#[inline]
fn quantize_unit(value: f32) -> i16 {
    value.round().clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

#[inline]
fn yaw_to_i16(deg: f32) -> i16 {
    ((deg.rem_euclid(360.0) - 180.0) / 360.0 * 65536.0).round() as i32 as i16
}

#[inline]
fn i16_to_yaw(raw: i16) -> f32 {
    raw as f32 / 65536.0 * 360.0 + 180.0
}

fn write_point(bytes: &mut [u8], offset: usize, point: Vec3) {
    write_i16_le(bytes, offset, quantize_unit(point.x));
    write_i16_le(bytes, offset + 2, quantize_unit(point.y));
    write_i16_le(bytes, offset + 4, quantize_unit(point.z));
}

fn read_point(bytes: &[u8], offset: usize) -> Vec3 {
    Vec3::new(
        read_i16_le(bytes, offset) as f32,
        read_i16_le(bytes, offset + 2) as f32,
        read_i16_le(bytes, offset + 4) as f32,
    )
}

#[inline]
fn read_i16_le(bytes: &[u8], offset: usize) -> i16 {
    i16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

#[inline]
fn write_i16_le(bytes: &mut [u8], offset: usize, value: i16) {
    bytes[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundle_roundtrips_through_packed_form() {
        let mut bundle = SubStateBundle::default();
        bundle.activate_flight(Vec3::new(128.0, -64.0, 300.0), 250.0, 640);
        bundle.activate_camp(Vec3::new(512.0, 512.0, 0.0), 128.0, true, 0);
        bundle.activate_key_move(-1, 1, 320);

        let decoded = SubStateBundle::decode_packed(&bundle.encode_packed()).unwrap();
        assert_eq!(decoded, bundle);
        assert_eq!(
            decoded.active_mask(),
            SUBSTATE_FLIGHT | SUBSTATE_CAMP | SUBSTATE_KEY_MOVE
        );
    }

    #[test]
    fn timers_expire_and_deactivate() {
        let mut bundle = SubStateBundle::default();
        bundle.activate_jumppad(96);
        bundle.frame(48);
        assert!(bundle.jumppad.active);
        bundle.frame(48);
        assert!(!bundle.jumppad.active);
    }

    #[test]
    fn camp_deactivates_past_its_leave_radius() {
        let mut bundle = SubStateBundle::default();
        bundle.activate_camp(Vec3::ZERO, 100.0, false, 0);

        let mut snapshot = PhysicsSnapshot {
            origin: Vec3::new(140.0, 0.0, 0.0),
            ..Default::default()
        };
        bundle.try_deactivate(&snapshot);
        assert!(bundle.camp.active);

        snapshot.origin.x = 160.0;
        bundle.try_deactivate(&snapshot);
        assert!(!bundle.camp.active);
    }
}
