// Copyright @yucwang 2023

use crate::math::constants::{ Float, Vector3f };

/// Orthonormal basis; `to_local` maps world directions into the basis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub x: Vector3f,
    pub y: Vector3f,
    pub z: Vector3f
}

impl Default for Frame {
    fn default() -> Self {
        Frame {
            x: Vector3f::new(1.0, 0.0, 0.0),
            y: Vector3f::new(0.0, 1.0, 0.0),
            z: Vector3f::new(0.0, 0.0, 1.0)
        }
    }
}

impl Frame {
    pub fn new(new_x: Vector3f, new_y: Vector3f, new_z: Vector3f) -> Frame {
        Frame {
            x: new_x,
            y: new_y,
            z: new_z
        }
    }

    pub fn from_xy(new_x: Vector3f, new_y: Vector3f) -> Frame {
        Frame {
            x: new_x,
            y: new_y,
            z: new_x.cross(&new_y)
        }
    }

    pub fn from_xz(new_x: Vector3f, new_z: Vector3f) -> Frame {
        Frame {
            x: new_x,
            y: new_z.cross(&new_x),
            z: new_z
        }
    }

    /// Builds a frame around a unit `new_z` (Duff et al. branchless basis).
    pub fn from_z(new_z: Vector3f) -> Frame {
        let sign = (1.0 as Float).copysign(new_z.z);
        let a = -1.0 / (sign + new_z.z);
        let b = new_z.x * new_z.y * a;
        let x = Vector3f::new(1.0 + sign * new_z.x * new_z.x * a, sign * b, -sign * new_z.x);
        let y = Vector3f::new(b, sign + new_z.y * new_z.y * a, -new_z.y);
        Frame { x, y, z: new_z }
    }

    pub fn to_local(&self, v: Vector3f) -> Vector3f {
        Vector3f::new(v.dot(&self.x), v.dot(&self.y), v.dot(&self.z))
    }

    pub fn from_local(&self, v: Vector3f) -> Vector3f {
        v.x * self.x + v.y * self.y + v.z * self.z
    }
}

// Shading-space trigonometry. The shading normal is +z.

#[inline]
pub fn cos_theta(w: &Vector3f) -> Float {
    w.z
}

#[inline]
pub fn cos2_theta(w: &Vector3f) -> Float {
    w.z * w.z
}

#[inline]
pub fn abs_cos_theta(w: &Vector3f) -> Float {
    w.z.abs()
}

#[inline]
pub fn sin2_theta(w: &Vector3f) -> Float {
    (1.0 - cos2_theta(w)).max(0.0)
}

#[inline]
pub fn sin_theta(w: &Vector3f) -> Float {
    sin2_theta(w).sqrt()
}

#[inline]
pub fn tan2_theta(w: &Vector3f) -> Float {
    sin2_theta(w) / cos2_theta(w)
}

#[inline]
pub fn cos_phi(w: &Vector3f) -> Float {
    let sin_theta = sin_theta(w);
    if sin_theta == 0.0 {
        1.0
    } else {
        (w.x / sin_theta).clamp(-1.0, 1.0)
    }
}

#[inline]
pub fn sin_phi(w: &Vector3f) -> Float {
    let sin_theta = sin_theta(w);
    if sin_theta == 0.0 {
        0.0
    } else {
        (w.y / sin_theta).clamp(-1.0, 1.0)
    }
}

/// Cosine of the azimuthal angle between `wa` and `wb`.
pub fn cos_d_phi(wa: &Vector3f, wb: &Vector3f) -> Float {
    let waxy = wa.x * wa.x + wa.y * wa.y;
    let wbxy = wb.x * wb.x + wb.y * wb.y;
    if waxy == 0.0 || wbxy == 0.0 {
        return 1.0;
    }
    ((wa.x * wb.x + wa.y * wb.y) / (waxy * wbxy).sqrt()).clamp(-1.0, 1.0)
}

#[inline]
pub fn same_hemisphere(w: &Vector3f, wp: &Vector3f) -> bool {
    w.z * wp.z > 0.0
}

pub fn spherical_direction(sin_theta: Float, cos_theta: Float, phi: Float) -> Vector3f {
    let sin_theta = sin_theta.clamp(-1.0, 1.0);
    Vector3f::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta.clamp(-1.0, 1.0))
}

pub fn spherical_theta(v: &Vector3f) -> Float {
    v.z.clamp(-1.0, 1.0).acos()
}

/// Azimuth in [0, 2π).
pub fn spherical_phi(v: &Vector3f) -> Float {
    let p = v.y.atan2(v.x);
    if p < 0.0 {
        p + 2.0 * crate::math::constants::PI
    } else {
        p
    }
}

/// Flips `n` into the hemisphere of `v`.
#[inline]
pub fn face_forward(n: Vector3f, v: &Vector3f) -> Vector3f {
    if n.dot(v) < 0.0 {
        -n
    } else {
        n
    }
}
