// Copyright @yucwang 2026

use std::sync::Arc;

use crate::core::bxdf::{ BSDFSample, BxDF, BxDFFlags, BxDFReflTransFlags, TransportMode };
use crate::core::computation_node::ComputationNode;
use crate::materials::microfacet::reflect;
use crate::math::constants::{ Float, Vector2f, Vector3f, PI, PI_OVER_2 };
use crate::math::frame::{ abs_cos_theta, cos_theta, same_hemisphere, spherical_direction, spherical_theta };
use crate::math::spectrum::{ SampledSpectrum, SampledWavelengths, N_SPECTRUM_SAMPLES };

/// A point in a table's parameter square together with its density.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableSample {
    pub p: Vector2f,
    pub pdf: Float,
}

/// Tabulated reflectance data, conditioned on the outgoing direction
/// `(phi_o, theta_o)`. Loading the tables is left to the implementor.
pub trait MeasuredBRDFData: Send + Sync {
    /// Tables are parameterized by `phi_m - phi_o` instead of `phi_m`.
    fn isotropic(&self) -> bool;

    fn ndf(&self, u_wm: &Vector2f, phi_o: Float, theta_o: Float) -> Float;

    /// Projected microfacet area.
    fn sigma(&self, u_wo: &Vector2f, phi_o: Float, theta_o: Float) -> Float;

    fn sample_vndf(&self, u: &Vector2f, phi_o: Float, theta_o: Float) -> TableSample;

    fn invert_vndf(&self, u_wm: &Vector2f, phi_o: Float, theta_o: Float) -> TableSample;

    fn sample_luminance(&self, u: &Vector2f, phi_o: Float, theta_o: Float) -> TableSample;

    fn luminance(&self, u: &Vector2f, phi_o: Float, theta_o: Float) -> Float;

    fn spectrum(&self, u: &Vector2f, phi_o: Float, theta_o: Float, lambda: Float) -> Float;
}

pub fn u2theta(u: Float) -> Float {
    u * u * PI_OVER_2
}

pub fn u2phi(u: Float) -> Float {
    (2.0 * u - 1.0) * PI
}

pub fn theta2u(theta: Float) -> Float {
    (theta * (2.0 / PI)).max(0.0).sqrt()
}

pub fn phi2u(phi: Float) -> Float {
    (phi + PI) / (2.0 * PI)
}

/// Data-driven reflection evaluated for a fixed set of wavelengths.
#[derive(Clone)]
pub struct MeasuredBxDF {
    brdf: Arc<dyn MeasuredBRDFData>,
    lambda: SampledWavelengths,
}

impl MeasuredBxDF {
    pub fn new(brdf: Arc<dyn MeasuredBRDFData>, lambda: SampledWavelengths) -> Self {
        Self { brdf, lambda }
    }

    fn spectral_value(&self, u: &Vector2f, phi_o: Float, theta_o: Float) -> SampledSpectrum {
        let mut fr = SampledSpectrum::zero();
        for i in 0..N_SPECTRUM_SAMPLES {
            fr[i] = self.brdf.spectrum(u, phi_o, theta_o, self.lambda[i]).max(0.0);
        }
        fr
    }

    // Square coordinates of the half vector, relative to phi_o when isotropic.
    fn half_vector_coords(&self, wm: &Vector3f, phi_o: Float) -> Vector2f {
        let theta_m = spherical_theta(wm);
        let phi_m = wm.y.atan2(wm.x);
        let phi = if self.brdf.isotropic() { phi_m - phi_o } else { phi_m };
        let v = phi2u(phi);
        Vector2f::new(theta2u(theta_m), v - v.floor())
    }

    fn jacobian(u_wm: &Vector2f, w: &Vector3f, wm: &Vector3f) -> Float {
        let sin_theta_m = (wm.x * wm.x + wm.y * wm.y).sqrt();
        4.0 * w.dot(wm) * (2.0 * PI * PI * u_wm.x * sin_theta_m).max(1e-6)
    }
}

impl std::fmt::Debug for MeasuredBxDF {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeasuredBxDF")
            .field("isotropic", &self.brdf.isotropic())
            .field("lambda", &self.lambda)
            .finish()
    }
}

impl ComputationNode for MeasuredBxDF {
    fn to_string(&self) -> String {
        format!("MeasuredBxDF: [ isotropic: {}, lambda: {:?} ]", self.brdf.isotropic(), self.lambda)
    }
}

impl BxDF for MeasuredBxDF {
    fn name(&self) -> &'static str {
        "MeasuredBxDF"
    }

    fn flags(&self) -> BxDFFlags {
        BxDFFlags::GLOSSY_REFLECTION
    }

    fn f(&self, wo: Vector3f, wi: Vector3f, _mode: TransportMode) -> SampledSpectrum {
        if !same_hemisphere(&wo, &wi) {
            return SampledSpectrum::zero();
        }
        let (wo, wi) = if wo.z < 0.0 { (-wo, -wi) } else { (wo, wi) };

        let wm = wi + wo;
        if wm.norm_squared() == 0.0 || cos_theta(&wi) == 0.0 {
            return SampledSpectrum::zero();
        }
        let wm = wm.normalize();

        let theta_o = spherical_theta(&wo);
        let phi_o = wo.y.atan2(wo.x);
        let u_wm = self.half_vector_coords(&wm, phi_o);
        let u_wo = Vector2f::new(theta2u(theta_o), phi2u(phi_o));
        let ui = self.brdf.invert_vndf(&u_wm, phi_o, theta_o);

        self.spectral_value(&ui.p, phi_o, theta_o)
            * (self.brdf.ndf(&u_wm, phi_o, theta_o)
                / (4.0 * self.brdf.sigma(&u_wo, phi_o, theta_o) * cos_theta(&wi)))
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
        let (wo, flip_wi) = if wo.z <= 0.0 { (-wo, true) } else { (wo, false) };

        let theta_o = spherical_theta(&wo);
        let phi_o = wo.y.atan2(wo.x);

        // Luminance slice first, then the visible normals.
        let lum = self.brdf.sample_luminance(&u, phi_o, theta_o);
        let vndf = self.brdf.sample_vndf(&lum.p, phi_o, theta_o);
        let u_wm = vndf.p;

        let mut phi_m = u2phi(u_wm.y);
        let theta_m = u2theta(u_wm.x);
        if self.brdf.isotropic() {
            phi_m += phi_o;
        }
        let wm = spherical_direction(theta_m.sin(), theta_m.cos(), phi_m);
        let mut wi = reflect(&wo, &wm);
        if wi.z <= 0.0 {
            return None;
        }

        let u_wo = Vector2f::new(theta2u(theta_o), phi2u(phi_o));
        let fr = self.spectral_value(&lum.p, phi_o, theta_o)
            * (self.brdf.ndf(&u_wm, phi_o, theta_o)
                / (4.0 * self.brdf.sigma(&u_wo, phi_o, theta_o) * abs_cos_theta(&wi)));

        let pdf = vndf.pdf * lum.pdf / Self::jacobian(&u_wm, &wo, &wm);
        if pdf <= 0.0 || !pdf.is_finite() {
            return None;
        }
        if flip_wi {
            wi = -wi;
        }
        Some(BSDFSample::new(fr, wi, pdf, BxDFFlags::GLOSSY_REFLECTION))
    }

    fn pdf(&self,
           wo: Vector3f,
           wi: Vector3f,
           _mode: TransportMode,
           sample_flags: BxDFReflTransFlags) -> Float {
        if !sample_flags.contains(BxDFReflTransFlags::REFLECTION) || !same_hemisphere(&wo, &wi) {
            return 0.0;
        }
        let (wo, wi) = if wo.z < 0.0 { (-wo, -wi) } else { (wo, wi) };

        let wm = wi + wo;
        if wm.norm_squared() == 0.0 {
            return 0.0;
        }
        let wm = wm.normalize();

        let theta_o = spherical_theta(&wo);
        let phi_o = wo.y.atan2(wo.x);
        let u_wm = self.half_vector_coords(&wm, phi_o);
        let ui = self.brdf.invert_vndf(&u_wm, phi_o, theta_o);
        let lum_pdf = self.brdf.luminance(&ui.p, phi_o, theta_o);

        ui.pdf * lum_pdf / Self::jacobian(&u_wm, &wi, &wm)
    }

    fn diffuse_reflectance(&self) -> SampledSpectrum {
        SampledSpectrum::zero()
    }

    fn regularize(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    // Identity warps over a constant table.
    struct FlatTable {
        isotropic: bool,
    }

    impl MeasuredBRDFData for FlatTable {
        fn isotropic(&self) -> bool {
            self.isotropic
        }

        fn ndf(&self, _u_wm: &Vector2f, _phi_o: Float, _theta_o: Float) -> Float {
            2.0
        }

        fn sigma(&self, _u_wo: &Vector2f, _phi_o: Float, _theta_o: Float) -> Float {
            0.5
        }

        fn sample_vndf(&self, u: &Vector2f, _phi_o: Float, _theta_o: Float) -> TableSample {
            TableSample { p: *u, pdf: 1.0 }
        }

        fn invert_vndf(&self, u_wm: &Vector2f, _phi_o: Float, _theta_o: Float) -> TableSample {
            TableSample { p: *u_wm, pdf: 1.0 }
        }

        fn sample_luminance(&self, u: &Vector2f, _phi_o: Float, _theta_o: Float) -> TableSample {
            TableSample { p: *u, pdf: 1.0 }
        }

        fn luminance(&self, _u: &Vector2f, _phi_o: Float, _theta_o: Float) -> Float {
            1.0
        }

        fn spectrum(&self, _u: &Vector2f, _phi_o: Float, _theta_o: Float, lambda: Float) -> Float {
            if lambda < 500.0 { 0.25 } else { 0.75 }
        }
    }

    fn measured(isotropic: bool) -> MeasuredBxDF {
        let lambda = SampledWavelengths::new([420.0, 480.0, 560.0, 640.0], [1.0; N_SPECTRUM_SAMPLES]);
        MeasuredBxDF::new(Arc::new(FlatTable { isotropic }), lambda)
    }

    #[test]
    fn test_reparameterization_inverts() {
        for k in 0..=10 {
            let u = k as Float / 10.0;
            assert!((theta2u(u2theta(u)) - u).abs() < 1e-5);
            assert!((phi2u(u2phi(u)) - u).abs() < 1e-5);
        }
        assert!((u2theta(1.0) - PI_OVER_2).abs() < 1e-6);
        assert!((u2phi(0.0) + PI).abs() < 1e-6);
    }

    #[test]
    fn test_value_per_wavelength() {
        let bxdf = measured(true);
        let wo = spherical_direction(0.5, 0.866_025_4, 0.3);
        let wi = spherical_direction(0.3, 0.953_939_2, 2.1);
        let f = bxdf.f(wo, wi, TransportMode::Radiance);
        let scale = 2.0 / (4.0 * 0.5 * wi.z);
        assert!((f[0] - 0.25 * scale).abs() < 1e-4);
        assert!((f[3] - 0.75 * scale).abs() < 1e-4);
        assert!(bxdf.f(wo, -wi, TransportMode::Radiance).is_black());
        assert_eq!(bxdf.f(-wo, -wi, TransportMode::Radiance), f);
    }

    #[test]
    fn test_sample_matches_pdf() {
        for isotropic in [true, false] {
            let bxdf = measured(isotropic);
            let wo = spherical_direction(0.4, 0.916_515_1, 1.2);
            for i in 0..8 {
                for j in 0..8 {
                    let u = Vector2f::new((i as Float + 0.5) / 8.0, (j as Float + 0.5) / 8.0);
                    if let Some(bs) = bxdf.sample_f(wo, 0.5, u, TransportMode::Radiance, BxDFReflTransFlags::ALL) {
                        assert!(bs.wi.z > 0.0);
                        let pdf = bxdf.pdf(wo, bs.wi, TransportMode::Radiance, BxDFReflTransFlags::ALL);
                        assert!((pdf - bs.pdf).abs() <= 1e-2 * bs.pdf, "{} vs {}", pdf, bs.pdf);
                    }
                }
            }
        }
    }

    #[test]
    fn test_flags_and_lobe_requests() {
        let bxdf = measured(false);
        assert_eq!(bxdf.flags(), BxDFFlags::GLOSSY_REFLECTION);
        assert!(bxdf.diffuse_reflectance().is_black());
        assert!(bxdf.sample_f(Vector3f::z(), 0.5, Vector2f::new(0.5, 0.5), TransportMode::Radiance,
                              BxDFReflTransFlags::TRANSMISSION).is_none());
    }
}
