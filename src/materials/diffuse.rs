// Copyright @yucwang 2023

use crate::core::bxdf::{ BSDFSample, BxDF, BxDFFlags, BxDFReflTransFlags, TransportMode };
use crate::core::computation_node::ComputationNode;
use crate::math::constants::{ Float, INV_PI, Vector2f, Vector3f };
use crate::math::frame::{ abs_cos_theta, cos_d_phi, same_hemisphere, sin_theta };
use crate::math::spectrum::SampledSpectrum;
use crate::math::warp::{ sample_cosine_hemisphere, sample_cosine_hemisphere_pdf };

/// Lambertian reflection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdealDiffuseBxDF {
    r: SampledSpectrum,
}

impl IdealDiffuseBxDF {
    pub fn new(r: SampledSpectrum) -> Self {
        Self { r }
    }
}

impl ComputationNode for IdealDiffuseBxDF {
    fn to_string(&self) -> String {
        format!("IdealDiffuseBxDF: [ R: {:?} ]", self.r.values())
    }
}

impl BxDF for IdealDiffuseBxDF {
    fn name(&self) -> &'static str {
        "IdealDiffuseBxDF"
    }

    fn flags(&self) -> BxDFFlags {
        if self.r.is_black() {
            BxDFFlags::empty()
        } else {
            BxDFFlags::DIFFUSE_REFLECTION
        }
    }

    fn f(&self, wo: Vector3f, wi: Vector3f, _mode: TransportMode) -> SampledSpectrum {
        if !same_hemisphere(&wo, &wi) {
            return SampledSpectrum::zero();
        }
        self.r * INV_PI
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
        let mut wi = sample_cosine_hemisphere(&u);
        if wo.z < 0.0 {
            wi.z *= -1.0;
        }
        let pdf = sample_cosine_hemisphere_pdf(abs_cos_theta(&wi));
        Some(BSDFSample::new(self.r * INV_PI, wi, pdf, BxDFFlags::DIFFUSE_REFLECTION))
    }

    fn pdf(&self,
           wo: Vector3f,
           wi: Vector3f,
           _mode: TransportMode,
           sample_flags: BxDFReflTransFlags) -> Float {
        if !sample_flags.contains(BxDFReflTransFlags::REFLECTION) || !same_hemisphere(&wo, &wi) {
            return 0.0;
        }
        sample_cosine_hemisphere_pdf(abs_cos_theta(&wi))
    }

    fn diffuse_reflectance(&self) -> SampledSpectrum {
        self.r
    }

    fn regularize(&mut self) {}
}

/// Oren–Nayar reflection and transmission. `sigma` is the facet slope
/// standard deviation in degrees; zero gives Lambertian lobes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiffuseBxDF {
    r: SampledSpectrum,
    t: SampledSpectrum,
    a: Float,
    b: Float,
}

impl DiffuseBxDF {
    pub fn new(r: SampledSpectrum, t: SampledSpectrum, sigma: Float) -> Self {
        let sigma = sigma.to_radians();
        let sigma2 = sigma * sigma;
        Self {
            r,
            t,
            a: 1.0 - sigma2 / (2.0 * (sigma2 + 0.33)),
            b: 0.45 * sigma2 / (sigma2 + 0.09),
        }
    }

    fn lobe_probabilities(&self, sample_flags: BxDFReflTransFlags) -> (Float, Float) {
        let mut pr = self.r.max_component_value();
        let mut pt = self.t.max_component_value();
        if !sample_flags.contains(BxDFReflTransFlags::REFLECTION) {
            pr = 0.0;
        }
        if !sample_flags.contains(BxDFReflTransFlags::TRANSMISSION) {
            pt = 0.0;
        }
        (pr, pt)
    }
}

impl ComputationNode for DiffuseBxDF {
    fn to_string(&self) -> String {
        format!("DiffuseBxDF: [ R: {:?}, T: {:?}, A: {}, B: {} ]",
                self.r.values(), self.t.values(), self.a, self.b)
    }
}

impl BxDF for DiffuseBxDF {
    fn name(&self) -> &'static str {
        "DiffuseBxDF"
    }

    fn flags(&self) -> BxDFFlags {
        let mut flags = BxDFFlags::empty();
        if !self.r.is_black() {
            flags |= BxDFFlags::DIFFUSE_REFLECTION;
        }
        if !self.t.is_black() {
            flags |= BxDFFlags::DIFFUSE_TRANSMISSION;
        }
        flags
    }

    fn f(&self, wo: Vector3f, wi: Vector3f, _mode: TransportMode) -> SampledSpectrum {
        let same = same_hemisphere(&wo, &wi);
        if self.b == 0.0 {
            return if same { self.r * INV_PI } else { self.t * INV_PI };
        }
        if (same && self.r.is_black()) || (!same && self.t.is_black()) {
            return SampledSpectrum::zero();
        }

        let sin_theta_i = sin_theta(&wi);
        let sin_theta_o = sin_theta(&wo);
        let max_cos = cos_d_phi(&wi, &wo).max(0.0);
        let (sin_alpha, tan_beta) = if abs_cos_theta(&wi) > abs_cos_theta(&wo) {
            (sin_theta_o, sin_theta_i / abs_cos_theta(&wi))
        } else {
            (sin_theta_i, sin_theta_o / abs_cos_theta(&wo))
        };

        let scale = INV_PI * (self.a + self.b * max_cos * sin_alpha * tan_beta);
        if same {
            self.r * scale
        } else {
            self.t * scale
        }
    }

    fn sample_f(&self,
                wo: Vector3f,
                uc: Float,
                u: Vector2f,
                mode: TransportMode,
                sample_flags: BxDFReflTransFlags) -> Option<BSDFSample> {
        let (pr, pt) = self.lobe_probabilities(sample_flags);
        if pr == 0.0 && pt == 0.0 {
            return None;
        }

        let mut wi = sample_cosine_hemisphere(&u);
        if uc < pr / (pr + pt) {
            if wo.z < 0.0 {
                wi.z *= -1.0;
            }
            let pdf = sample_cosine_hemisphere_pdf(abs_cos_theta(&wi)) * pr / (pr + pt);
            Some(BSDFSample::new(self.f(wo, wi, mode), wi, pdf, BxDFFlags::DIFFUSE_REFLECTION))
        } else {
            if wo.z > 0.0 {
                wi.z *= -1.0;
            }
            let pdf = sample_cosine_hemisphere_pdf(abs_cos_theta(&wi)) * pt / (pr + pt);
            Some(BSDFSample::new(self.f(wo, wi, mode), wi, pdf, BxDFFlags::DIFFUSE_TRANSMISSION))
        }
    }

    fn pdf(&self,
           wo: Vector3f,
           wi: Vector3f,
           _mode: TransportMode,
           sample_flags: BxDFReflTransFlags) -> Float {
        let (pr, pt) = self.lobe_probabilities(sample_flags);
        if pr == 0.0 && pt == 0.0 {
            return 0.0;
        }
        let lobe = if same_hemisphere(&wo, &wi) { pr } else { pt };
        lobe / (pr + pt) * sample_cosine_hemisphere_pdf(abs_cos_theta(&wi))
    }

    fn diffuse_reflectance(&self) -> SampledSpectrum {
        self.r
    }

    fn regularize(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::constants::PI;
    use crate::math::frame::spherical_direction;

    fn assert_close(a: Float, b: Float) {
        assert!((a - b).abs() < 1e-5, "expected {} ≈ {}", a, b);
    }

    #[test]
    fn test_ideal_diffuse_at_normal() {
        let bxdf = IdealDiffuseBxDF::new(SampledSpectrum::constant(0.5));
        let n = Vector3f::z();
        let f = bxdf.f(n, n, TransportMode::Radiance);
        for i in 0..4 {
            assert_eq!(f[i], 0.5 * INV_PI);
        }
        assert_close(bxdf.pdf(n, n, TransportMode::Radiance, BxDFReflTransFlags::ALL), 1.0 / PI);
    }

    #[test]
    fn test_ideal_diffuse_rejects_transmission_request() {
        let bxdf = IdealDiffuseBxDF::new(SampledSpectrum::constant(0.5));
        let wo = Vector3f::z();
        let u = Vector2f::new(0.3, 0.6);
        assert!(bxdf.sample_f(wo, 0.5, u, TransportMode::Radiance, BxDFReflTransFlags::TRANSMISSION).is_none());
        assert!(bxdf.f(wo, -wo, TransportMode::Radiance).is_black());
    }

    #[test]
    fn test_ideal_diffuse_sample_follows_wo() {
        let bxdf = IdealDiffuseBxDF::new(SampledSpectrum::constant(0.8));
        let wo = Vector3f::new(0.2, 0.1, -0.97).normalize();
        let bs = bxdf.sample_f(wo, 0.5, Vector2f::new(0.4, 0.7), TransportMode::Radiance, BxDFReflTransFlags::ALL).unwrap();
        assert!(bs.wi.z < 0.0);
        assert_close(bs.pdf, bxdf.pdf(wo, bs.wi, TransportMode::Radiance, BxDFReflTransFlags::ALL));
    }

    #[test]
    fn test_oren_nayar_reciprocity() {
        let bxdf = DiffuseBxDF::new(SampledSpectrum::constant(0.7), SampledSpectrum::constant(0.2), 25.0);
        let wo = spherical_direction(0.5, 0.866_025_4, 0.3);
        let wi = spherical_direction(0.8, 0.6, 1.9);
        let a = bxdf.f(wo, wi, TransportMode::Radiance);
        let b = bxdf.f(wi, wo, TransportMode::Radiance);
        for i in 0..4 {
            assert_close(a[i], b[i]);
        }
        let wt = Vector3f::new(wi.x, wi.y, -wi.z);
        let a = bxdf.f(wo, wt, TransportMode::Radiance);
        let b = bxdf.f(wt, wo, TransportMode::Radiance);
        assert_close(a[0], b[0]);
        assert!(a[0] > 0.0);
    }

    #[test]
    fn test_zero_sigma_is_lambertian() {
        let bxdf = DiffuseBxDF::new(SampledSpectrum::constant(0.6), SampledSpectrum::constant(0.3), 0.0);
        let wo = spherical_direction(0.5, 0.866_025_4, 0.3);
        let wi = spherical_direction(0.8, 0.6, 1.9);
        assert_close(bxdf.f(wo, wi, TransportMode::Radiance)[0], 0.6 * INV_PI);
        assert_close(bxdf.f(wo, -wi, TransportMode::Radiance)[0], 0.3 * INV_PI);
    }

    #[test]
    fn test_lobe_selection() {
        let bxdf = DiffuseBxDF::new(SampledSpectrum::constant(0.6), SampledSpectrum::constant(0.3), 10.0);
        assert!(bxdf.flags().is_reflective() && bxdf.flags().is_transmissive());
        let wo = Vector3f::z();
        let u = Vector2f::new(0.25, 0.5);
        let refl = bxdf.sample_f(wo, 0.1, u, TransportMode::Radiance, BxDFReflTransFlags::ALL).unwrap();
        assert!(refl.wi.z > 0.0);
        assert_eq!(refl.flags, BxDFFlags::DIFFUSE_REFLECTION);
        let trans = bxdf.sample_f(wo, 0.9, u, TransportMode::Radiance, BxDFReflTransFlags::ALL).unwrap();
        assert!(trans.wi.z < 0.0);
        assert_eq!(trans.flags, BxDFFlags::DIFFUSE_TRANSMISSION);
        assert_close(trans.pdf, bxdf.pdf(wo, trans.wi, TransportMode::Radiance, BxDFReflTransFlags::ALL));
        let only_t = bxdf.sample_f(wo, 0.1, u, TransportMode::Radiance, BxDFReflTransFlags::TRANSMISSION).unwrap();
        assert!(only_t.wi.z < 0.0);
    }
}
