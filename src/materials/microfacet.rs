// Copyright @yucwang 2026

use crate::math::constants::{ Float, Vector2f, Vector3f, PI };
use crate::math::frame::{ abs_cos_theta, cos2_theta, cos_phi, sin_phi, tan2_theta };
use crate::math::warp::{ lerp, safe_sqrt, sample_uniform_disk_polar };

/// Anisotropic Trowbridge–Reitz (GGX) distribution of microfacet normals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrowbridgeReitzDistribution {
    alpha_x: Float,
    alpha_y: Float,
}

impl TrowbridgeReitzDistribution {
    pub fn new(alpha_x: Float, alpha_y: Float) -> Self {
        let distrib = Self { alpha_x, alpha_y };
        if !distrib.effectively_smooth() {
            // Keeps D finite when only one axis is near zero.
            return Self {
                alpha_x: alpha_x.max(1e-4),
                alpha_y: alpha_y.max(1e-4),
            };
        }
        distrib
    }

    pub fn isotropic(alpha: Float) -> Self {
        Self::new(alpha, alpha)
    }

    pub fn roughness_to_alpha(roughness: Float) -> Float {
        roughness.max(0.0).sqrt()
    }

    pub fn alpha_x(&self) -> Float {
        self.alpha_x
    }

    pub fn alpha_y(&self) -> Float {
        self.alpha_y
    }

    pub fn effectively_smooth(&self) -> bool {
        self.alpha_x.max(self.alpha_y) < 1e-3
    }

    pub fn d(&self, wm: &Vector3f) -> Float {
        let tan2_theta = tan2_theta(wm);
        if tan2_theta.is_infinite() || tan2_theta.is_nan() {
            return 0.0;
        }
        let cos4_theta = cos2_theta(wm) * cos2_theta(wm);
        if cos4_theta < 1e-16 {
            return 0.0;
        }
        let cx = cos_phi(wm) / self.alpha_x;
        let sy = sin_phi(wm) / self.alpha_y;
        let e = tan2_theta * (cx * cx + sy * sy);
        1.0 / (PI * self.alpha_x * self.alpha_y * cos4_theta * (1.0 + e) * (1.0 + e))
    }

    pub fn lambda(&self, w: &Vector3f) -> Float {
        let tan2_theta = tan2_theta(w);
        if tan2_theta.is_infinite() || tan2_theta.is_nan() {
            return 0.0;
        }
        let cx = cos_phi(w) * self.alpha_x;
        let sy = sin_phi(w) * self.alpha_y;
        let alpha2 = cx * cx + sy * sy;
        ((1.0 + alpha2 * tan2_theta).sqrt() - 1.0) / 2.0
    }

    pub fn g1(&self, w: &Vector3f) -> Float {
        1.0 / (1.0 + self.lambda(w))
    }

    /// Height-correlated masking-shadowing.
    pub fn g(&self, wo: &Vector3f, wi: &Vector3f) -> Float {
        1.0 / (1.0 + self.lambda(wo) + self.lambda(wi))
    }

    /// Distribution of normals visible from `w`.
    pub fn d_visible(&self, w: &Vector3f, wm: &Vector3f) -> Float {
        let cos = abs_cos_theta(w);
        if cos == 0.0 {
            return 0.0;
        }
        self.g1(w) / cos * self.d(wm) * w.dot(wm).abs()
    }

    pub fn pdf(&self, w: &Vector3f, wm: &Vector3f) -> Float {
        self.d_visible(w, wm)
    }

    /// Samples a visible normal for `w`; the result always lies in the upper hemisphere.
    pub fn sample_wm(&self, w: &Vector3f, u: &Vector2f) -> Vector3f {
        let mut wh = Vector3f::new(self.alpha_x * w.x, self.alpha_y * w.y, w.z).normalize();
        if wh.z < 0.0 {
            wh = -wh;
        }

        let t1 = if wh.z < 0.99999 {
            Vector3f::z().cross(&wh).normalize()
        } else {
            Vector3f::x()
        };
        let t2 = wh.cross(&t1);

        let mut p = sample_uniform_disk_polar(u);
        let h = safe_sqrt(1.0 - p.x * p.x);
        p.y = lerp((1.0 + wh.z) / 2.0, h, p.y);

        let pz = safe_sqrt(1.0 - p.norm_squared());
        let nh = p.x * t1 + p.y * t2 + pz * wh;
        Vector3f::new(self.alpha_x * nh.x, self.alpha_y * nh.y, nh.z.max(1e-6)).normalize()
    }

    pub fn regularize(&mut self) {
        if self.alpha_x < 0.3 {
            self.alpha_x = (2.0 * self.alpha_x).clamp(0.1, 0.3);
        }
        if self.alpha_y < 0.3 {
            self.alpha_y = (2.0 * self.alpha_y).clamp(0.1, 0.3);
        }
    }
}

pub fn reflect(wo: &Vector3f, n: &Vector3f) -> Vector3f {
    -*wo + 2.0 * wo.dot(n) * *n
}

/// Refracts `wi` through a boundary with normal `n` and relative index `eta`.
/// Returns the transmitted direction and the relative index actually used
/// (inverted when `wi` arrives from below `n`); `None` on total internal reflection.
pub fn refract(wi: &Vector3f, n: &Vector3f, eta: Float) -> Option<(Vector3f, Float)> {
    let mut n = *n;
    let mut eta = eta;
    let mut cos_theta_i = n.dot(wi);
    if cos_theta_i < 0.0 {
        eta = 1.0 / eta;
        cos_theta_i = -cos_theta_i;
        n = -n;
    }

    let sin2_theta_i = (1.0 - cos_theta_i * cos_theta_i).max(0.0);
    let sin2_theta_t = sin2_theta_i / (eta * eta);
    if sin2_theta_t >= 1.0 {
        return None;
    }
    let cos_theta_t = safe_sqrt(1.0 - sin2_theta_t);

    let wt = -*wi / eta + (cos_theta_i / eta - cos_theta_t) * n;
    Some((wt, eta))
}
