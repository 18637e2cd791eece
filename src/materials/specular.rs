// Copyright @yucwang 2026

use crate::core::bxdf::{ BSDFSample, BxDF, BxDFFlags, BxDFReflTransFlags, TransportMode };
use crate::core::computation_node::ComputationNode;
use crate::materials::fresnel::fr_dielectric;
use crate::materials::microfacet::refract;
use crate::math::constants::{ Float, Vector2f, Vector3f };
use crate::math::frame::{ abs_cos_theta, cos_theta, face_forward };
use crate::math::spectrum::SampledSpectrum;

/// An index of exactly one makes the interface vanish; nudge it.
pub(crate) fn nudge_unit_eta(eta: Float) -> Float {
    if eta == 1.0 {
        log::debug!("Relative index 1 nudged to 1.001.");
        1.001
    } else {
        eta
    }
}

/// Mirror reflection weighted by the dielectric Fresnel term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpecularReflectionBxDF {
    eta: Float,
    r: SampledSpectrum,
}

impl SpecularReflectionBxDF {
    pub fn new(eta: Float, r: SampledSpectrum) -> Self {
        Self { eta: nudge_unit_eta(eta), r }
    }
}

impl ComputationNode for SpecularReflectionBxDF {
    fn to_string(&self) -> String {
        format!("SpecularReflectionBxDF: [ eta: {}, R: {:?} ]", self.eta, self.r.values())
    }
}

impl BxDF for SpecularReflectionBxDF {
    fn name(&self) -> &'static str {
        "SpecularReflectionBxDF"
    }

    fn flags(&self) -> BxDFFlags {
        BxDFFlags::SPECULAR_REFLECTION
    }

    fn f(&self, _wo: Vector3f, _wi: Vector3f, _mode: TransportMode) -> SampledSpectrum {
        SampledSpectrum::zero()
    }

    fn sample_f(&self,
                wo: Vector3f,
                _uc: Float,
                _u: Vector2f,
                _mode: TransportMode,
                sample_flags: BxDFReflTransFlags) -> Option<BSDFSample> {
        if !sample_flags.contains(BxDFReflTransFlags::REFLECTION) {
            return None;
        }
        let wi = Vector3f::new(-wo.x, -wo.y, wo.z);
        let cos = abs_cos_theta(&wi);
        if cos == 0.0 {
            return None;
        }
        let fr = self.r * (fr_dielectric(cos_theta(&wo), self.eta) / cos);
        Some(BSDFSample::new(fr, wi, 1.0, BxDFFlags::SPECULAR_REFLECTION))
    }

    fn pdf(&self, _wo: Vector3f, _wi: Vector3f, _mode: TransportMode, _sample_flags: BxDFReflTransFlags) -> Float {
        0.0
    }

    fn diffuse_reflectance(&self) -> SampledSpectrum {
        SampledSpectrum::zero()
    }

    fn regularize(&mut self) {}
}

/// Refraction through a smooth dielectric boundary, weighted by `1 - F`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpecularTransmissionBxDF {
    eta: Float,
    t: SampledSpectrum,
}

impl SpecularTransmissionBxDF {
    pub fn new(eta: Float, t: SampledSpectrum) -> Self {
        Self { eta: nudge_unit_eta(eta), t }
    }
}

impl ComputationNode for SpecularTransmissionBxDF {
    fn to_string(&self) -> String {
        format!("SpecularTransmissionBxDF: [ eta: {}, T: {:?} ]", self.eta, self.t.values())
    }
}

impl BxDF for SpecularTransmissionBxDF {
    fn name(&self) -> &'static str {
        "SpecularTransmissionBxDF"
    }

    fn flags(&self) -> BxDFFlags {
        BxDFFlags::SPECULAR_TRANSMISSION
    }

    fn f(&self, _wo: Vector3f, _wi: Vector3f, _mode: TransportMode) -> SampledSpectrum {
        SampledSpectrum::zero()
    }

    fn sample_f(&self,
                wo: Vector3f,
                _uc: Float,
                _u: Vector2f,
                mode: TransportMode,
                sample_flags: BxDFReflTransFlags) -> Option<BSDFSample> {
        if wo.z == 0.0 || !sample_flags.contains(BxDFReflTransFlags::TRANSMISSION) {
            return None;
        }

        let etap = if cos_theta(&wo) > 0.0 { self.eta } else { 1.0 / self.eta };
        let (wi, etap) = refract(&wo, &face_forward(Vector3f::z(), &wo), etap)?;
        let cos = abs_cos_theta(&wi);
        if cos == 0.0 {
            return None;
        }

        let mut ft = self.t * ((1.0 - fr_dielectric(cos_theta(&wo), self.eta)) / cos);
        if mode == TransportMode::Radiance {
            ft /= etap * etap;
        }
        Some(BSDFSample::new(ft, wi, 1.0, BxDFFlags::SPECULAR_TRANSMISSION).with_eta(etap))
    }

    fn pdf(&self, _wo: Vector3f, _wi: Vector3f, _mode: TransportMode, _sample_flags: BxDFReflTransFlags) -> Float {
        0.0
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
    fn test_reflection_mirrors() {
        let bxdf = SpecularReflectionBxDF::new(1.5, SampledSpectrum::one());
        for wo in [
            spherical_direction(0.3, 0.953_939_2, 0.4),
            spherical_direction(0.9, -0.435_889_9, 2.5),
        ] {
            let bs = bxdf.sample_f(wo, 0.5, Vector2f::new(0.5, 0.5), TransportMode::Radiance, BxDFReflTransFlags::ALL).unwrap();
            assert_eq!(bs.wi, Vector3f::new(-wo.x, -wo.y, wo.z));
            assert_eq!(bs.pdf, 1.0);
            assert!(bs.is_specular());
            assert_eq!(bxdf.pdf(wo, bs.wi, TransportMode::Radiance, BxDFReflTransFlags::ALL), 0.0);
            assert!(bxdf.f(wo, bs.wi, TransportMode::Radiance).is_black());
        }
    }

    #[test]
    fn test_reflection_weight_at_normal() {
        let bxdf = SpecularReflectionBxDF::new(1.5, SampledSpectrum::one());
        let bs = bxdf.sample_f(Vector3f::z(), 0.5, Vector2f::new(0.5, 0.5), TransportMode::Radiance, BxDFReflTransFlags::ALL).unwrap();
        assert_close(bs.f[0], 0.04);
    }

    #[test]
    fn test_transmission_none_exactly_at_tir() {
        let bxdf = SpecularTransmissionBxDF::new(1.5, SampledSpectrum::one());
        let critical = (1.0 as Float / 1.5).asin();
        for degrees in [5.0 as Float, 20.0, 40.0, 41.0, 42.5, 60.0, 85.0] {
            let theta = degrees.to_radians();
            // Arriving from inside the denser medium.
            let wo = spherical_direction(theta.sin(), -theta.cos(), 0.7);
            let sample = bxdf.sample_f(wo, 0.5, Vector2f::new(0.5, 0.5), TransportMode::Radiance, BxDFReflTransFlags::ALL);
            assert_eq!(sample.is_none(), theta > critical, "theta {}", degrees);
        }
    }

    #[test]
    fn test_transmission_radiance_scaling() {
        let bxdf = SpecularTransmissionBxDF::new(1.5, SampledSpectrum::one());
        let wo = spherical_direction(0.5, 0.866_025_4, 0.0);
        let u = Vector2f::new(0.5, 0.5);
        let radiance = bxdf.sample_f(wo, 0.5, u, TransportMode::Radiance, BxDFReflTransFlags::ALL).unwrap();
        let importance = bxdf.sample_f(wo, 0.5, u, TransportMode::Importance, BxDFReflTransFlags::ALL).unwrap();
        assert!(radiance.wi.z < 0.0);
        assert_close(radiance.eta, 1.5);
        assert_close(radiance.f[0] * 2.25, importance.f[0]);
    }

    #[test]
    fn test_unit_eta_is_nudged() {
        let bxdf = SpecularTransmissionBxDF::new(1.0, SampledSpectrum::one());
        let bs = bxdf.sample_f(Vector3f::z(), 0.5, Vector2f::new(0.5, 0.5), TransportMode::Importance, BxDFReflTransFlags::ALL).unwrap();
        assert_close(bs.eta, 1.001);
    }
}
