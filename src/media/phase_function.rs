// Copyright @yucwang 2026

use crate::math::constants::{ Float, Vector2f, Vector3f, INV_4PI, PI };
use crate::math::frame::{ Frame, spherical_direction };
use crate::math::warp::safe_sqrt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseFunctionSample {
    pub p: Float,
    pub wi: Vector3f,
    pub pdf: Float,
}

/// Scattering kernel of a participating medium. `wo` and `wi` both point away
/// from the scattering location.
pub trait PhaseFunction: Send + Sync {
    fn p(&self, wo: Vector3f, wi: Vector3f) -> Float;
    fn sample_p(&self, wo: Vector3f, u: Vector2f) -> Option<PhaseFunctionSample>;
    fn pdf(&self, wo: Vector3f, wi: Vector3f) -> Float;
}

pub fn henyey_greenstein(cos_theta: Float, g: Float) -> Float {
    let g = g.clamp(-0.99, 0.99);
    let denom = 1.0 + g * g + 2.0 * g * cos_theta;
    INV_4PI * (1.0 - g * g) / (denom * safe_sqrt(denom))
}

/// Samples `wi` around `wo`; returns the direction and its density.
pub fn sample_henyey_greenstein(wo: Vector3f, g: Float, u: Vector2f) -> (Vector3f, Float) {
    let g = g.clamp(-0.99, 0.99);
    let cos_theta = if g.abs() < 1e-3 {
        1.0 - 2.0 * u.x
    } else {
        let sq = (1.0 - g * g) / (1.0 + g - 2.0 * g * u.x);
        -1.0 / (2.0 * g) * (1.0 + g * g - sq * sq)
    };
    let sin_theta = safe_sqrt(1.0 - cos_theta * cos_theta);
    let phi = 2.0 * PI * u.y;
    let frame = Frame::from_z(wo);
    let wi = frame.from_local(spherical_direction(sin_theta, cos_theta, phi));
    (wi, henyey_greenstein(cos_theta, g))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HGPhaseFunction {
    g: Float,
}

impl HGPhaseFunction {
    pub fn new(g: Float) -> Self {
        Self { g }
    }

    pub fn g(&self) -> Float {
        self.g
    }
}

impl PhaseFunction for HGPhaseFunction {
    fn p(&self, wo: Vector3f, wi: Vector3f) -> Float {
        henyey_greenstein(wo.dot(&wi), self.g)
    }

    fn sample_p(&self, wo: Vector3f, u: Vector2f) -> Option<PhaseFunctionSample> {
        let (wi, pdf) = sample_henyey_greenstein(wo, self.g, u);
        Some(PhaseFunctionSample { p: pdf, wi, pdf })
    }

    fn pdf(&self, wo: Vector3f, wi: Vector3f) -> Float {
        self.p(wo, wi)
    }
}
