//! Vector/quaternion helpers. Quaternions are stored (x, y, z, w).

use serde::{Deserialize, Serialize};

pub type Vec3 = [f32; 3];
pub type Quat = [f32; 4];

pub const VEC3_ZERO: Vec3 = [0.0, 0.0, 0.0];
pub const QUAT_IDENTITY: Quat = [0.0, 0.0, 0.0, 1.0];

/// Position + rotation pair as exchanged with the host.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        position: VEC3_ZERO,
        rotation: QUAT_IDENTITY,
    };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Linear interpolation of scalars.
#[inline]
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
pub fn dot4(a: Quat, b: Quat) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2] + a[3] * b[3]
}

#[inline]
pub fn negate4(q: Quat) -> Quat {
    [-q[0], -q[1], -q[2], -q[3]]
}

/// Flip `q` into the hemisphere of `reference` so consecutive keys never jump
/// across the double cover (q and -q encode the same rotation).
#[inline]
pub fn align_hemisphere(reference: Quat, q: Quat) -> Quat {
    if dot4(reference, q) < 0.0 {
        negate4(q)
    } else {
        q
    }
}
