// Copyright @yucwang 2026

use crate::core::bxdf::{ BSDFSample, BxDF, BxDFFlags, BxDFReflTransFlags, TransportMode };
use crate::core::computation_node::ComputationNode;
use crate::materials::fresnel::fr_dielectric;
use crate::math::constants::{ Float, Vector2f, Vector3f };
use crate::math::frame::{ abs_cos_theta, cos_theta };
use crate::math::spectrum::SampledSpectrum;

/// Infinitesimally thin dielectric sheet. Light passes straight through or
/// mirrors, with internal bounces summed in closed form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThinDielectricBxDF {
    eta: Float,
}

impl ThinDielectricBxDF {
    pub fn new(eta: Float) -> Self {
        Self { eta }
    }

    /// Reflectance and transmittance after all internal reflections; they sum to one.
    pub fn reflectance_transmittance(&self, cos_theta_o: Float) -> (Float, Float) {
        let mut r = fr_dielectric(cos_theta_o, self.eta);
        let mut t = 1.0 - r;
        if r < 1.0 {
            r += t * t * r / (1.0 - r * r);
            t = 1.0 - r;
        }
        (r, t)
    }
}

impl ComputationNode for ThinDielectricBxDF {
    fn to_string(&self) -> String {
        format!("ThinDielectricBxDF: [ eta: {} ]", self.eta)
    }
}

impl BxDF for ThinDielectricBxDF {
    fn name(&self) -> &'static str {
        "ThinDielectricBxDF"
    }

    fn flags(&self) -> BxDFFlags {
        BxDFFlags::REFLECTION | BxDFFlags::TRANSMISSION | BxDFFlags::SPECULAR
    }

    fn f(&self, _wo: Vector3f, _wi: Vector3f, _mode: TransportMode) -> SampledSpectrum {
        SampledSpectrum::zero()
    }

    fn sample_f(&self,
                wo: Vector3f,
                uc: Float,
                _u: Vector2f,
                _mode: TransportMode,
                sample_flags: BxDFReflTransFlags) -> Option<BSDFSample> {
        let (r, t) = self.reflectance_transmittance(cos_theta(&wo));
        let pr = if sample_flags.contains(BxDFReflTransFlags::REFLECTION) { r } else { 0.0 };
        let pt = if sample_flags.contains(BxDFReflTransFlags::TRANSMISSION) { t } else { 0.0 };
        if pr == 0.0 && pt == 0.0 {
            return None;
        }
        let cos = abs_cos_theta(&wo);
        if cos == 0.0 {
            return None;
        }

        if uc < pr / (pr + pt) {
            let wi = Vector3f::new(-wo.x, -wo.y, wo.z);
            let fr = SampledSpectrum::constant(r / cos);
            Some(BSDFSample::new(fr, wi, pr / (pr + pt), BxDFFlags::SPECULAR_REFLECTION))
        } else {
            let wi = -wo;
            let ft = SampledSpectrum::constant(t / cos);
            Some(BSDFSample::new(ft, wi, pt / (pr + pt), BxDFFlags::SPECULAR_TRANSMISSION))
        }
    }

    fn pdf(&self, _wo: Vector3f, _wi: Vector3f, _mode: TransportMode, _sample_flags: BxDFReflTransFlags) -> Float {
        0.0
    }

    fn diffuse_reflectance(&self) -> SampledSpectrum {
        SampledSpectrum::zero()
    }

    // A sheet with no thickness has no roughness to widen.
    fn regularize(&mut self) {}
}
