// Copyright @yucwang 2026

use crate::core::bxdf::{ BSDFSample, BxDF, BxDFFlags, BxDFReflTransFlags, TransportMode };
use crate::core::computation_node::ComputationNode;
use crate::materials::fresnel::fr_complex_spectrum;
use crate::materials::microfacet::{ reflect, TrowbridgeReitzDistribution };
use crate::math::constants::{ Float, Vector2f, Vector3f };
use crate::math::frame::{ abs_cos_theta, same_hemisphere };
use crate::math::spectrum::SampledSpectrum;

/// Torrance–Sparrow reflection off a metal with complex index `eta + i k`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConductorBxDF {
    distrib: TrowbridgeReitzDistribution,
    eta: SampledSpectrum,
    k: SampledSpectrum,
}

impl ConductorBxDF {
    pub fn new(distrib: TrowbridgeReitzDistribution, eta: SampledSpectrum, k: SampledSpectrum) -> Self {
        Self { distrib, eta, k }
    }

    pub fn distribution(&self) -> &TrowbridgeReitzDistribution {
        &self.distrib
    }

    fn torrance_sparrow(&self, wo: &Vector3f, wi: &Vector3f, wh: &Vector3f) -> SampledSpectrum {
        let cos_theta_o = abs_cos_theta(wo);
        let cos_theta_i = abs_cos_theta(wi);
        let fresnel = fr_complex_spectrum(wi.dot(wh).abs(), &self.eta, &self.k);
        fresnel * (self.distrib.d(wh) * self.distrib.g(wo, wi) / (4.0 * cos_theta_i * cos_theta_o))
    }
}

impl ComputationNode for ConductorBxDF {
    fn to_string(&self) -> String {
        format!("ConductorBxDF: [ alpha: ({}, {}), eta: {:?}, k: {:?} ]",
                self.distrib.alpha_x(), self.distrib.alpha_y(),
                self.eta.values(), self.k.values())
    }
}

impl BxDF for ConductorBxDF {
    fn name(&self) -> &'static str {
        "ConductorBxDF"
    }

    fn flags(&self) -> BxDFFlags {
        if self.distrib.effectively_smooth() {
            BxDFFlags::SPECULAR_REFLECTION
        } else {
            BxDFFlags::GLOSSY_REFLECTION
        }
    }

    fn f(&self, wo: Vector3f, wi: Vector3f, _mode: TransportMode) -> SampledSpectrum {
        if !same_hemisphere(&wo, &wi) || self.distrib.effectively_smooth() {
            return SampledSpectrum::zero();
        }
        if abs_cos_theta(&wi) == 0.0 || abs_cos_theta(&wo) == 0.0 {
            return SampledSpectrum::zero();
        }
        let wh = wi + wo;
        if wh.norm_squared() == 0.0 {
            return SampledSpectrum::zero();
        }
        self.torrance_sparrow(&wo, &wi, &wh.normalize())
    }

    fn sample_f(&self,
                wo: Vector3f,
                _uc: Float,
                u: Vector2f,
                _mode: TransportMode,
                sample_flags: BxDFReflTransFlags) -> Option<BSDFSample> {
        if !sample_flags.contains(BxDFReflTransFlags::REFLECTION) {
            return None;
        }
        if self.distrib.effectively_smooth() {
            let wi = Vector3f::new(-wo.x, -wo.y, wo.z);
            let cos = abs_cos_theta(&wi);
            if cos == 0.0 {
                return None;
            }
            let f = fr_complex_spectrum(cos, &self.eta, &self.k) / cos;
            return Some(BSDFSample::new(f, wi, 1.0, BxDFFlags::SPECULAR_REFLECTION));
        }

        if wo.z == 0.0 {
            return None;
        }
        let wh = self.distrib.sample_wm(&wo, &u);
        let wi = reflect(&wo, &wh);
        if !same_hemisphere(&wo, &wi) || wo.dot(&wh) <= 0.0 {
            return None;
        }
        if abs_cos_theta(&wi) == 0.0 || abs_cos_theta(&wo) == 0.0 {
            return None;
        }

        let pdf = self.distrib.pdf(&wo, &wh) / (4.0 * wo.dot(&wh));
        let f = self.torrance_sparrow(&wo, &wi, &wh);
        Some(BSDFSample::new(f, wi, pdf, BxDFFlags::GLOSSY_REFLECTION))
    }

    fn pdf(&self,
           wo: Vector3f,
           wi: Vector3f,
           _mode: TransportMode,
           sample_flags: BxDFReflTransFlags) -> Float {
        if !sample_flags.contains(BxDFReflTransFlags::REFLECTION) || !same_hemisphere(&wo, &wi) {
            return 0.0;
        }
        if self.distrib.effectively_smooth() {
            return 0.0;
        }
        let wh = wo + wi;
        if wh.norm_squared() == 0.0 || wo.dot(&wh) <= 0.0 {
            return 0.0;
        }
        let wh = wh.normalize();
        self.distrib.pdf(&wo, &wh) / (4.0 * wo.dot(&wh))
    }

    fn diffuse_reflectance(&self) -> SampledSpectrum {
        SampledSpectrum::zero()
    }

    fn regularize(&mut self) {
        self.distrib.regularize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::frame::spherical_direction;

    fn gold_like(alpha: Float) -> ConductorBxDF {
        ConductorBxDF::new(
            TrowbridgeReitzDistribution::isotropic(alpha),
            SampledSpectrum::new([0.2, 0.4, 1.1, 1.4]),
            SampledSpectrum::new([3.6, 2.9, 2.2, 1.8]),
        )
    }

    fn assert_rel(a: Float, b: Float, tol: Float) {
        assert!((a - b).abs() <= tol * a.abs().max(b.abs()).max(1e-6), "expected {} ≈ {}", a, b);
    }

    #[test]
    fn test_reciprocity() {
        let bxdf = gold_like(0.25);
        let wo = spherical_direction(0.5, 0.866_025_4, 0.3);
        let wi = spherical_direction(0.7, 0.714_142_8, 2.0);
        let a = bxdf.f(wo, wi, TransportMode::Radiance);
        let b = bxdf.f(wi, wo, TransportMode::Radiance);
        for i in 0..4 {
            assert!(a[i] > 0.0);
            assert_rel(a[i], b[i], 1e-4);
        }
    }

    #[test]
    fn test_smooth_is_mirror() {
        let bxdf = gold_like(0.0);
        assert_eq!(bxdf.flags(), BxDFFlags::SPECULAR_REFLECTION);
        let wo = spherical_direction(0.6, 0.8, 1.0);
        let bs = bxdf.sample_f(wo, 0.5, Vector2f::new(0.3, 0.3), TransportMode::Radiance, BxDFReflTransFlags::ALL).unwrap();
        assert_eq!(bs.wi, Vector3f::new(-wo.x, -wo.y, wo.z));
        assert_eq!(bs.pdf, 1.0);
        assert_eq!(bxdf.pdf(wo, bs.wi, TransportMode::Radiance, BxDFReflTransFlags::ALL), 0.0);
    }

    #[test]
    fn test_rough_sample_consistent() {
        let bxdf = gold_like(0.3);
        let wo = spherical_direction(0.5, 0.866_025_4, 0.9);
        for i in 0..6 {
            for j in 0..6 {
                let u = Vector2f::new((i as Float + 0.5) / 6.0, (j as Float + 0.5) / 6.0);
                if let Some(bs) = bxdf.sample_f(wo, 0.5, u, TransportMode::Radiance, BxDFReflTransFlags::ALL) {
                    assert!(bs.pdf > 0.0);
                    assert_rel(bs.pdf, bxdf.pdf(wo, bs.wi, TransportMode::Radiance, BxDFReflTransFlags::ALL), 1e-3);
                    assert_rel(bs.f[1], bxdf.f(wo, bs.wi, TransportMode::Radiance)[1], 1e-3);
                }
            }
        }
    }

    #[test]
    fn test_regularize_turns_specular_glossy() {
        let mut bxdf = gold_like(0.0);
        bxdf.regularize();
        assert_eq!(bxdf.flags(), BxDFFlags::GLOSSY_REFLECTION);
        let wo = spherical_direction(0.5, 0.866_025_4, 0.0);
        let wi = Vector3f::new(-wo.x, -wo.y, wo.z);
        assert!(bxdf.f(wo, wi, TransportMode::Radiance)[0] > 0.0);
    }

    #[test]
    fn test_transmission_request_is_empty() {
        let bxdf = gold_like(0.3);
        assert!(bxdf.sample_f(Vector3f::z(), 0.5, Vector2f::new(0.5, 0.5), TransportMode::Radiance, BxDFReflTransFlags::TRANSMISSION).is_none());
    }
}
