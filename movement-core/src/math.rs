use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const UP: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 1.0,
    };

    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    #[inline]
    pub fn cross(self, other: Self) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    #[inline]
    pub fn length_sq(self) -> f32 {
        self.dot(self)
    }

    #[inline]
    pub fn length(self) -> f32 {
        self.length_sq().sqrt()
    }

    /// Planar (XY) component with Z dropped.
    #[inline]
    pub fn horizontal(self) -> Self {
        Self {
            x: self.x,
            y: self.y,
            z: 0.0,
        }
    }

    #[inline]
    pub fn horizontal_length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    #[inline]
    pub fn distance_to(self, other: Self) -> f32 {
        (other - self).length()
    }

    #[inline]
    pub fn distance_sq_to(self, other: Self) -> f32 {
        (other - self).length_sq()
    }

    /// Unit vector, or zero when the length is degenerate.
    pub fn normalized_or_zero(self) -> Self {
        let len = self.length();
        if len < 1e-6 {
            Self::ZERO
        } else {
            self * (1.0 / len)
        }
    }

    #[inline]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        self + (other - self) * t
    }

    #[inline]
    pub fn min_by_axis(self, other: Self) -> Self {
        Self {
            x: self.x.min(other.x),
            y: self.y.min(other.y),
            z: self.z.min(other.z),
        }
    }

    #[inline]
    pub fn max_by_axis(self, other: Self) -> Self {
        Self {
            x: self.x.max(other.x),
            y: self.y.max(other.y),
            z: self.z.max(other.z),
        }
    }
}

impl Add for Vec3 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

impl AddAssign for Vec3 {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Vec3 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

impl SubAssign for Vec3 {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Mul<f32> for Vec3 {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: f32) -> Self {
        Self {
            x: self.x * rhs,
            y: self.y * rhs,
            z: self.z * rhs,
        }
    }
}

impl Neg for Vec3 {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }
}

/// Yaw of a direction in degrees, [-180, 180).
#[inline]
pub fn yaw_of(dir: Vec3) -> f32 {
    dir.y.atan2(dir.x).to_degrees()
}

/// Pitch of a direction in degrees; positive looks up.
#[inline]
pub fn pitch_of(dir: Vec3) -> f32 {
    let planar = dir.horizontal_length();
    dir.z.atan2(planar).to_degrees()
}

/// Unit direction from yaw/pitch in degrees.
pub fn dir_from_angles(yaw_deg: f32, pitch_deg: f32) -> Vec3 {
    let (sy, cy) = yaw_deg.to_radians().sin_cos();
    let (sp, cp) = pitch_deg.to_radians().sin_cos();
    Vec3::new(cy * cp, sy * cp, sp)
}

/// Shortest signed yaw delta `to - from` in degrees, [-180, 180).
pub fn signed_yaw_delta(from_deg: f32, to_deg: f32) -> f32 {
    let mut delta = (to_deg - from_deg) % 360.0;
    if delta >= 180.0 {
        delta -= 360.0;
    } else if delta < -180.0 {
        delta += 360.0;
    }
    delta
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaw_delta_wraps_across_the_seam() {
        assert!((signed_yaw_delta(170.0, -170.0) - 20.0).abs() < 1e-4);
        assert!((signed_yaw_delta(-170.0, 170.0) + 20.0).abs() < 1e-4);
        assert!(signed_yaw_delta(45.0, 45.0).abs() < 1e-6);
    }

    #[test]
    fn angles_roundtrip_through_direction() {
        let dir = dir_from_angles(30.0, -15.0);
        assert!((dir.length() - 1.0).abs() < 1e-5);
        assert!((yaw_of(dir) - 30.0).abs() < 1e-3);
        assert!((pitch_of(dir) + 15.0).abs() < 1e-3);
    }
}
