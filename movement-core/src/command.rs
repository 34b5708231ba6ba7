use crate::constants::VELOCITY_SNAP;
use crate::error::DecodeError;
use crate::math::{dir_from_angles, pitch_of, yaw_of, Vec3};

pub const BUTTON_ATTACK: u8 = 1 << 0;
pub const BUTTON_SPECIAL: u8 = 1 << 1;
pub const BUTTON_WALK: u8 = 1 << 2;

const BUTTON_MASK: u8 = BUTTON_ATTACK | BUTTON_SPECIAL | BUTTON_WALK;

/// Size of the packed wire form of a [`BotInput`].
pub const PACKED_INPUT_LEN: usize = 20;

const FLAG_HAS_LOOK: u8 = 1 << 0;
const FLAG_ALLOW_YAW: u8 = 1 << 1;
const FLAG_ALLOW_PITCH: u8 = 1 << 2;
const FLAG_HAS_VELOCITY: u8 = 1 << 3;
const FLAG_MASK: u8 = FLAG_HAS_LOOK | FLAG_ALLOW_YAW | FLAG_ALLOW_PITCH | FLAG_HAS_VELOCITY;

/// One simulation tick's intended input. Pure value object: accumulating
/// setters, no side effects.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BotInput {
    pub forward: i8,
    pub side: i8,
    pub up: i8,
    pub buttons: u8,
    /// Normalized look direction; `None` keeps the current/already computed
    /// angles.
    pub look_dir: Option<Vec3>,
    /// Whether downstream code may still override the yaw.
    pub allow_yaw_turn: bool,
    /// Whether downstream code may still override the pitch.
    pub allow_pitch_turn: bool,
    /// Snapped velocity override, applied verbatim before integration.
    pub velocity_override: Option<Vec3>,
    /// Pending weapon index; -1 = unset.
    pub pending_weapon: i8,
}

impl Default for BotInput {
    fn default() -> Self {
        Self {
            forward: 0,
            side: 0,
            up: 0,
            buttons: 0,
            look_dir: None,
            allow_yaw_turn: true,
            allow_pitch_turn: true,
            velocity_override: None,
            pending_weapon: -1,
        }
    }
}

impl BotInput {
    /// Reset to defaults: full rotation allowed, no movement, no buttons.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn set_forward(&mut self, value: i32) {
        self.forward = value.clamp(-1, 1) as i8;
    }

    pub fn set_side(&mut self, value: i32) {
        self.side = value.clamp(-1, 1) as i8;
    }

    pub fn set_up(&mut self, value: i32) {
        self.up = value.clamp(-1, 1) as i8;
    }

    pub fn press(&mut self, button: u8) {
        self.buttons |= button & BUTTON_MASK;
    }

    pub fn is_pressed(&self, button: u8) -> bool {
        self.buttons & button != 0
    }

    /// Set the intended look direction. By default the result is final for
    /// both axes; re-enable per-axis overrides explicitly if needed.
    pub fn set_look_dir(&mut self, dir: Vec3) {
        self.look_dir = Some(dir.normalized_or_zero());
        self.allow_yaw_turn = false;
        self.allow_pitch_turn = false;
    }

    /// Snap to the velocity grid and clamp each axis to the packed range.
    pub fn set_velocity_override(&mut self, velocity: Vec3) {
        self.velocity_override = Some(Vec3::new(
            snap_axis(velocity.x),
            snap_axis(velocity.y),
            snap_axis(velocity.z),
        ));
    }

    pub fn encode_packed(&self) -> [u8; PACKED_INPUT_LEN] {
        let mut out = [0u8; PACKED_INPUT_LEN];
        out[0] = (self.forward + 1) as u8 | (((self.side + 1) as u8) << 2) | (((self.up + 1) as u8) << 4);
        out[1] = self.buttons;

        let mut flags = 0u8;
        if self.look_dir.is_some() {
            flags |= FLAG_HAS_LOOK;
        }
        if self.allow_yaw_turn {
            flags |= FLAG_ALLOW_YAW;
        }
        if self.allow_pitch_turn {
            flags |= FLAG_ALLOW_PITCH;
        }
        if self.velocity_override.is_some() {
            flags |= FLAG_HAS_VELOCITY;
        }
        out[2] = flags;
        out[3] = self.pending_weapon as u8;

        if let Some(dir) = self.look_dir {
            write_u16_le(&mut out, 4, yaw_to_bam(yaw_of(dir)));
            write_u16_le(&mut out, 6, pitch_to_bam(pitch_of(dir)) as u16);
        }
        if let Some(velocity) = self.velocity_override {
            write_u16_le(&mut out, 8, quantize_axis(velocity.x) as u16);
            write_u16_le(&mut out, 10, quantize_axis(velocity.y) as u16);
            write_u16_le(&mut out, 12, quantize_axis(velocity.z) as u16);
        }
        out
    }

    pub fn decode_packed(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() < PACKED_INPUT_LEN {
            return Err(DecodeError::ShortBuffer {
                actual: bytes.len(),
                expected: PACKED_INPUT_LEN,
            });
        }
        for (i, byte) in bytes[14..PACKED_INPUT_LEN].iter().enumerate() {
            if *byte != 0 {
                return Err(DecodeError::ReservedNonZero { offset: 14 + i });
            }
        }

        let axes = bytes[0];
        let forward = (axes & 0x03) as i32 - 1;
        let side = ((axes >> 2) & 0x03) as i32 - 1;
        let up = ((axes >> 4) & 0x03) as i32 - 1;
        if forward > 1 || side > 1 || up > 1 || axes & 0xC0 != 0 {
            return Err(DecodeError::FieldOutOfRange { field: "axes" });
        }
        if bytes[1] & !BUTTON_MASK != 0 {
            return Err(DecodeError::FieldOutOfRange { field: "buttons" });
        }
        let flags = bytes[2];
        if flags & !FLAG_MASK != 0 {
            return Err(DecodeError::FieldOutOfRange { field: "flags" });
        }

        let look_dir = if flags & FLAG_HAS_LOOK != 0 {
            let yaw = bam_to_yaw(read_u16_le(bytes, 4));
            let pitch = bam_to_pitch(read_u16_le(bytes, 6) as i16);
            Some(dir_from_angles(yaw, pitch))
        } else {
            None
        };
        let velocity_override = if flags & FLAG_HAS_VELOCITY != 0 {
            Some(Vec3::new(
                dequantize_axis(read_u16_le(bytes, 8) as i16),
                dequantize_axis(read_u16_le(bytes, 10) as i16),
                dequantize_axis(read_u16_le(bytes, 12) as i16),
            ))
        } else {
            None
        };

        Ok(Self {
            forward: forward as i8,
            side: side as i8,
            up: up as i8,
            buttons: bytes[1],
            look_dir,
            allow_yaw_turn: flags & FLAG_ALLOW_YAW != 0,
            allow_pitch_turn: flags & FLAG_ALLOW_PITCH != 0,
            velocity_override,
            pending_weapon: bytes[3] as i8,
        })
    }
}

#[inline]
fn snap_axis(value: f32) -> f32 {
    let quantized = quantize_axis(value);
    quantized as f32 * VELOCITY_SNAP
}

#[inline]
fn quantize_axis(value: f32) -> i16 {
    (value / VELOCITY_SNAP)
        .round()
        .clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

#[inline]
fn dequantize_axis(raw: i16) -> f32 {
    raw as f32 * VELOCITY_SNAP
}

#[inline]
fn yaw_to_bam(yaw_deg: f32) -> u16 {
    let wrapped = yaw_deg.rem_euclid(360.0);
    ((wrapped / 360.0) * 65536.0).round() as u32 as u16
}

#[inline]
fn bam_to_yaw(bam: u16) -> f32 {
    let deg = bam as f32 / 65536.0 * 360.0;
    if deg >= 180.0 {
        deg - 360.0
    } else {
        deg
    }
}

#[inline]
fn pitch_to_bam(pitch_deg: f32) -> i16 {
    ((pitch_deg / 360.0) * 65536.0).round().clamp(-16384.0, 16384.0) as i16
}

#[inline]
fn bam_to_pitch(bam: i16) -> f32 {
    bam as f32 / 65536.0 * 360.0
}

#[inline]
fn read_u16_le(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

#[inline]
fn write_u16_le(bytes: &mut [u8], offset: usize, value: u16) {
    bytes[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_roundtrip_preserves_all_fields() {
        let mut input = BotInput::default();
        input.set_forward(1);
        input.set_side(-1);
        input.press(BUTTON_SPECIAL);
        input.set_look_dir(Vec3::new(0.6, 0.8, 0.0));
        input.set_velocity_override(Vec3::new(421.37, -3.0, 0.25));
        input.pending_weapon = 5;

        let decoded = BotInput::decode_packed(&input.encode_packed()).unwrap();
        assert_eq!(decoded.forward, 1);
        assert_eq!(decoded.side, -1);
        assert_eq!(decoded.up, 0);
        assert!(decoded.is_pressed(BUTTON_SPECIAL));
        assert_eq!(decoded.pending_weapon, 5);
        assert!(!decoded.allow_yaw_turn);

        let dir = decoded.look_dir.unwrap();
        assert!(dir.distance_to(Vec3::new(0.6, 0.8, 0.0)) < 1e-2);

        // The override was snapped on set, so the roundtrip is exact.
        assert_eq!(decoded.velocity_override, input.velocity_override);
    }

    #[test]
    fn decode_rejects_short_and_dirty_buffers() {
        let cleared = BotInput::default();
        let mut bytes = cleared.encode_packed();

        assert!(matches!(
            BotInput::decode_packed(&bytes[..10]),
            Err(DecodeError::ShortBuffer { .. })
        ));

        bytes[17] = 1;
        assert!(matches!(
            BotInput::decode_packed(&bytes),
            Err(DecodeError::ReservedNonZero { offset: 17 })
        ));
    }

    #[test]
    fn clear_restores_defaults() {
        let mut input = BotInput::default();
        input.set_forward(1);
        input.press(BUTTON_ATTACK);
        input.set_look_dir(Vec3::new(1.0, 0.0, 0.0));
        input.clear();
        assert_eq!(input, BotInput::default());
        assert!(input.allow_yaw_turn && input.allow_pitch_turn);
    }
}
