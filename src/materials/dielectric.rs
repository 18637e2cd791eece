// Copyright @yucwang 2026

use crate::core::bxdf::{ BSDFSample, BxDF, BxDFFlags, BxDFReflTransFlags, TransportMode };
use crate::core::computation_node::ComputationNode;
use crate::materials::fresnel::fr_dielectric;
use crate::materials::microfacet::{ reflect, refract, TrowbridgeReitzDistribution };
use crate::materials::specular::nudge_unit_eta;
use crate::math::constants::{ Float, Vector2f, Vector3f };
use crate::math::frame::{ abs_cos_theta, cos_theta, face_forward, same_hemisphere };
use crate::math::spectrum::SampledSpectrum;

/// Dielectric boundary with optional microfacet roughness. Reflection and
/// transmission are chosen stochastically by the Fresnel term and tinted by
/// `r` and `t` respectively.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DielectricInterfaceBxDF {
    eta: Float,
    distrib: TrowbridgeReitzDistribution,
    r: SampledSpectrum,
    t: SampledSpectrum,
}

impl DielectricInterfaceBxDF {
    pub fn new(eta: Float, distrib: TrowbridgeReitzDistribution) -> Self {
        Self::with_tints(eta, distrib, SampledSpectrum::one(), SampledSpectrum::one())
    }

    pub fn with_tints(eta: Float,
                      distrib: TrowbridgeReitzDistribution,
                      r: SampledSpectrum,
                      t: SampledSpectrum) -> Self {
        Self {
            eta: nudge_unit_eta(eta),
            distrib,
            r,
            t,
        }
    }

    pub fn eta(&self) -> Float {
        self.eta
    }

    pub fn distribution(&self) -> &TrowbridgeReitzDistribution {
        &self.distrib
    }

    fn lobe_probabilities(r: Float, t: Float, sample_flags: BxDFReflTransFlags) -> (Float, Float) {
        let pr = if sample_flags.contains(BxDFReflTransFlags::REFLECTION) { r } else { 0.0 };
        let pt = if sample_flags.contains(BxDFReflTransFlags::TRANSMISSION) { t } else { 0.0 };
        (pr, pt)
    }

    /// Generalized half vector for a direction pair, facing +z, together with
    /// the relative index used to build it. `None` for degenerate or
    /// back-facing configurations.
    fn half_vector(&self, wo: &Vector3f, wi: &Vector3f) -> Option<(Vector3f, Float, bool)> {
        let cos_theta_o = cos_theta(wo);
        let cos_theta_i = cos_theta(wi);
        let reflect = cos_theta_i * cos_theta_o > 0.0;
        let etap = if reflect {
            1.0
        } else if cos_theta_o > 0.0 {
            self.eta
        } else {
            1.0 / self.eta
        };

        let wm = wi * etap + wo;
        if cos_theta_i == 0.0 || cos_theta_o == 0.0 || wm.norm_squared() == 0.0 {
            return None;
        }
        let wm = face_forward(wm.normalize(), &Vector3f::z());
        if wm.dot(wi) * cos_theta_i < 0.0 || wm.dot(wo) * cos_theta_o < 0.0 {
            return None;
        }
        Some((wm, etap, reflect))
    }

    fn sample_smooth(&self,
                     wo: Vector3f,
                     uc: Float,
                     mode: TransportMode,
                     sample_flags: BxDFReflTransFlags) -> Option<BSDFSample> {
        let r = fr_dielectric(cos_theta(&wo), self.eta);
        let t = 1.0 - r;
        let (pr, pt) = Self::lobe_probabilities(r, t, sample_flags);
        if pr == 0.0 && pt == 0.0 {
            return None;
        }

        if uc < pr / (pr + pt) {
            let wi = Vector3f::new(-wo.x, -wo.y, wo.z);
            let fr = self.r * (r / abs_cos_theta(&wi));
            Some(BSDFSample::new(fr, wi, pr / (pr + pt), BxDFFlags::SPECULAR_REFLECTION))
        } else {
            let (wi, etap) = refract(&wo, &Vector3f::z(), self.eta)?;
            let mut ft = self.t * (t / abs_cos_theta(&wi));
            if mode == TransportMode::Radiance {
                ft /= etap * etap;
            }
            Some(BSDFSample::new(ft, wi, pt / (pr + pt), BxDFFlags::SPECULAR_TRANSMISSION).with_eta(etap))
        }
    }

    fn sample_rough(&self,
                    wo: Vector3f,
                    uc: Float,
                    u: Vector2f,
                    mode: TransportMode,
                    sample_flags: BxDFReflTransFlags) -> Option<BSDFSample> {
        let wm = self.distrib.sample_wm(&wo, &u);
        let r = fr_dielectric(wo.dot(&wm), self.eta);
        let t = 1.0 - r;
        let (pr, pt) = Self::lobe_probabilities(r, t, sample_flags);
        if pr == 0.0 && pt == 0.0 {
            return None;
        }

        if uc < pr / (pr + pt) {
            let wi = reflect(&wo, &wm);
            if !same_hemisphere(&wo, &wi) {
                return None;
            }
            let pdf = self.distrib.pdf(&wo, &wm) / (4.0 * wo.dot(&wm).abs()) * pr / (pr + pt);
            let value = self.distrib.d(&wm) * self.distrib.g(&wo, &wi) * r
                / (4.0 * cos_theta(&wi) * cos_theta(&wo));
            Some(BSDFSample::new(self.r * value, wi, pdf, BxDFFlags::GLOSSY_REFLECTION))
        } else {
            let (wi, etap) = refract(&wo, &wm, self.eta)?;
            if same_hemisphere(&wo, &wi) || wi.z == 0.0 {
                return None;
            }
            let denom = (wi.dot(&wm) + wo.dot(&wm) / etap).powi(2);
            let dwm_dwi = wi.dot(&wm).abs() / denom;
            let pdf = self.distrib.pdf(&wo, &wm) * dwm_dwi * pt / (pr + pt);
            let value = self.distrib.d(&wm) * self.distrib.g(&wo, &wi)
                * (wi.dot(&wm) * wo.dot(&wm) / (cos_theta(&wi) * cos_theta(&wo) * denom)).abs();
            let mut ft = self.t * (t * value);
            if mode == TransportMode::Radiance {
                ft /= etap * etap;
            }
            Some(BSDFSample::new(ft, wi, pdf, BxDFFlags::GLOSSY_TRANSMISSION).with_eta(etap))
        }
    }
}

impl ComputationNode for DielectricInterfaceBxDF {
    fn to_string(&self) -> String {
        format!("DielectricInterfaceBxDF: [ eta: {}, alpha: ({}, {}), R: {:?}, T: {:?} ]",
                self.eta, self.distrib.alpha_x(), self.distrib.alpha_y(),
                self.r.values(), self.t.values())
    }
}

impl BxDF for DielectricInterfaceBxDF {
    fn name(&self) -> &'static str {
        "DielectricInterfaceBxDF"
    }

    fn flags(&self) -> BxDFFlags {
        let lobe = if self.distrib.effectively_smooth() { BxDFFlags::SPECULAR } else { BxDFFlags::GLOSSY };
        BxDFFlags::REFLECTION | BxDFFlags::TRANSMISSION | lobe
    }

    fn f(&self, wo: Vector3f, wi: Vector3f, mode: TransportMode) -> SampledSpectrum {
        if self.distrib.effectively_smooth() {
            return SampledSpectrum::zero();
        }
        let (wm, etap, reflect) = match self.half_vector(&wo, &wi) {
            Some(h) => h,
            None => return SampledSpectrum::zero(),
        };

        let fr = fr_dielectric(wo.dot(&wm), self.eta);
        let cos_theta_o = cos_theta(&wo);
        let cos_theta_i = cos_theta(&wi);
        if reflect {
            let value = self.distrib.d(&wm) * self.distrib.g(&wo, &wi) * fr
                / (4.0 * cos_theta_i * cos_theta_o).abs();
            self.r * value
        } else {
            let denom = (wi.dot(&wm) + wo.dot(&wm) / etap).powi(2) * cos_theta_i * cos_theta_o;
            let value = self.distrib.d(&wm) * (1.0 - fr) * self.distrib.g(&wo, &wi)
                * (wi.dot(&wm) * wo.dot(&wm) / denom).abs();
            let mut ft = self.t * value;
            if mode == TransportMode::Radiance {
                ft /= etap * etap;
            }
            ft
        }
    }

    fn sample_f(&self,
                wo: Vector3f,
                uc: Float,
                u: Vector2f,
                mode: TransportMode,
                sample_flags: BxDFReflTransFlags) -> Option<BSDFSample> {
        if self.distrib.effectively_smooth() {
            self.sample_smooth(wo, uc, mode, sample_flags)
        } else {
            self.sample_rough(wo, uc, u, mode, sample_flags)
        }
    }

    fn pdf(&self,
           wo: Vector3f,
           wi: Vector3f,
           _mode: TransportMode,
           sample_flags: BxDFReflTransFlags) -> Float {
        if self.distrib.effectively_smooth() {
            return 0.0;
        }
        let (wm, etap, reflect) = match self.half_vector(&wo, &wi) {
            Some(h) => h,
            None => return 0.0,
        };

        let r = fr_dielectric(wo.dot(&wm), self.eta);
        let (pr, pt) = Self::lobe_probabilities(r, 1.0 - r, sample_flags);
        if pr == 0.0 && pt == 0.0 {
            return 0.0;
        }

        if reflect {
            self.distrib.pdf(&wo, &wm) / (4.0 * wo.dot(&wm).abs()) * pr / (pr + pt)
        } else {
            let denom = (wi.dot(&wm) + wo.dot(&wm) / etap).powi(2);
            let dwm_dwi = wi.dot(&wm).abs() / denom;
            self.distrib.pdf(&wo, &wm) * dwm_dwi * pt / (pr + pt)
        }
    }

    fn diffuse_reflectance(&self) -> SampledSpectrum {
        SampledSpectrum::zero()
    }

    fn regularize(&mut self) {
        self.distrib.regularize();
    }
}
