// Copyright @yucwang 2026

use crate::core::bxdf::{ BSDFSample, BxDF, BxDFFlags, BxDFReflTransFlags, TransportMode };
use crate::core::computation_node::ComputationNode;
use crate::materials::fresnel::{ fr_dielectric, fresnel_moment1 };
use crate::math::constants::{ Float, Vector2f, Vector3f, INV_PI, PI };
use crate::math::frame::{ abs_cos_theta, cos_theta, same_hemisphere };
use crate::math::spectrum::SampledSpectrum;
use crate::math::warp::sample_cosine_hemisphere;

/// Exit lobe of light leaving a subsurface medium through a smooth boundary:
/// Fresnel transmission renormalized to integrate to one over the hemisphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedFresnelBxDF {
    eta: Float,
}

impl NormalizedFresnelBxDF {
    pub fn new(eta: Float) -> Self {
        Self { eta }
    }

    pub fn eta(&self) -> Float {
        self.eta
    }
}

impl ComputationNode for NormalizedFresnelBxDF {
    fn to_string(&self) -> String {
        format!("NormalizedFresnelBxDF: [ eta: {} ]", self.eta)
    }
}

impl BxDF for NormalizedFresnelBxDF {
    fn name(&self) -> &'static str {
        "NormalizedFresnelBxDF"
    }

    fn flags(&self) -> BxDFFlags {
        BxDFFlags::DIFFUSE_REFLECTION
    }

    fn f(&self, wo: Vector3f, wi: Vector3f, mode: TransportMode) -> SampledSpectrum {
        if !same_hemisphere(&wo, &wi) {
            return SampledSpectrum::zero();
        }
        let c = 1.0 - 2.0 * fresnel_moment1(1.0 / self.eta);
        let mut f = SampledSpectrum::constant((1.0 - fr_dielectric(cos_theta(&wi), self.eta)) / (c * PI));
        if mode == TransportMode::Radiance {
            f *= self.eta * self.eta;
        }
        f
    }

    fn sample_f(&self,
                wo: Vector3f,
                _uc: Float,
                u: Vector2f,
                mode: TransportMode,
                sample_flags: BxDFReflTransFlags) -> Option<BSDFSample> {
        if !sample_flags.contains(BxDFReflTransFlags::REFLECTION) {
            return None;
        }
        let mut wi = sample_cosine_hemisphere(&u);
        if wo.z < 0.0 {
            wi.z *= -1.0;
        }
        let pdf = self.pdf(wo, wi, mode, sample_flags);
        if pdf == 0.0 {
            return None;
        }
        Some(BSDFSample::new(self.f(wo, wi, mode), wi, pdf, BxDFFlags::DIFFUSE_REFLECTION))
    }

    fn pdf(&self,
           wo: Vector3f,
           wi: Vector3f,
           _mode: TransportMode,
           sample_flags: BxDFReflTransFlags) -> Float {
        if !sample_flags.contains(BxDFReflTransFlags::REFLECTION) || !same_hemisphere(&wo, &wi) {
            return 0.0;
        }
        abs_cos_theta(&wi) * INV_PI
    }

    fn diffuse_reflectance(&self) -> SampledSpectrum {
        SampledSpectrum::zero()
    }

    fn regularize(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::frame::spherical_direction;

    fn assert_close(a: Float, b: Float) {
        assert!((a - b).abs() < 1e-5, "expected {} ≈ {}", a, b);
    }

    #[test]
    fn test_value_and_adjoint_scaling() {
        let bxdf = NormalizedFresnelBxDF::new(1.33);
        let wo = spherical_direction(0.5, 0.866_025_4, 0.1);
        let wi = Vector3f::z();
        let c = 1.0 - 2.0 * fresnel_moment1(1.0 / 1.33);
        let expected = (1.0 - fr_dielectric(1.0, 1.33)) / (c * PI);
        let importance = bxdf.f(wo, wi, TransportMode::Importance);
        let radiance = bxdf.f(wo, wi, TransportMode::Radiance);
        assert_close(importance[0], expected);
        assert_close(radiance[0], expected * 1.33 * 1.33);
        assert!(bxdf.f(wo, -wi, TransportMode::Radiance).is_black());
    }

    #[test]
    fn test_sample_follows_wo_side() {
        let bxdf = NormalizedFresnelBxDF::new(1.5);
        let u = Vector2f::new(0.3, 0.8);
        let up = bxdf.sample_f(Vector3f::new(0.0, 0.6, 0.8), 0.5, u, TransportMode::Radiance, BxDFReflTransFlags::ALL).unwrap();
        let down = bxdf.sample_f(Vector3f::new(0.0, 0.6, -0.8), 0.5, u, TransportMode::Radiance, BxDFReflTransFlags::ALL).unwrap();
        assert!(up.wi.z > 0.0);
        assert!(down.wi.z < 0.0);
        assert_eq!(up.flags, BxDFFlags::DIFFUSE_REFLECTION);
        assert_close(up.pdf, up.wi.z * INV_PI);
        assert_close(up.pdf, down.pdf);
    }

    #[test]
    fn test_transmission_request_is_empty() {
        let bxdf = NormalizedFresnelBxDF::new(1.5);
        let wo = Vector3f::z();
        assert!(bxdf.sample_f(wo, 0.5, Vector2f::new(0.5, 0.5), TransportMode::Radiance,
                              BxDFReflTransFlags::TRANSMISSION).is_none());
        assert_eq!(bxdf.pdf(wo, wo, TransportMode::Radiance, BxDFReflTransFlags::TRANSMISSION), 0.0);
    }
}
