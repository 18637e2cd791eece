// Copyright @yucwang 2026

use crate::core::bxdf::{ BSDFSample, BxDF, BxDFFlags, BxDFReflTransFlags, TransportMode };
use crate::core::computation_node::ComputationNode;
use crate::materials::fresnel::fr_dielectric;
use crate::math::constants::{ Float, Vector2f, Vector3f, INV_2PI, ONE_MINUS_EPSILON, PI, SQRT_PI_OVER_8 };
use crate::math::frame::abs_cos_theta;
use crate::math::spectrum::SampledSpectrum;
use crate::math::warp::{ i0, log_i0, safe_asin, safe_sqrt, sample_trimmed_logistic, trimmed_logistic };

// Internal paths tracked explicitly; longer ones are folded into a single term.
const P_MAX: usize = 3;

/// Fiber scattering in the frame where +x runs along the hair and the
/// azimuth is measured in the y-z plane. `h` is the offset of the hit point
/// across the fiber width, in [-1, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HairBxDF {
    h: Float,
    gamma_o: Float,
    eta: Float,
    sigma_a: SampledSpectrum,
    beta_m: Float,
    beta_n: Float,
    v: [Float; P_MAX + 1],
    s: Float,
    sin_2k_alpha: [Float; 3],
    cos_2k_alpha: [Float; 3],
}

fn mp(cos_theta_i: Float, cos_theta_o: Float, sin_theta_i: Float, sin_theta_o: Float, v: Float) -> Float {
    let a = cos_theta_i * cos_theta_o / v;
    let b = sin_theta_i * sin_theta_o / v;
    let mp = if v <= 0.1 {
        (log_i0(a) - b - 1.0 / v + 0.6931 + (1.0 / (2.0 * v)).ln()).exp()
    } else {
        ((-b).exp() * i0(a)) / ((1.0 / v).sinh() * 2.0 * v)
    };
    debug_assert!(mp.is_finite(), "longitudinal term diverged for v = {}", v);
    mp
}

fn ap(cos_theta_o: Float, eta: Float, h: Float, t: &SampledSpectrum) -> [SampledSpectrum; P_MAX + 1] {
    let mut ap = [SampledSpectrum::zero(); P_MAX + 1];
    let cos_gamma_o = safe_sqrt(1.0 - h * h);
    let f = fr_dielectric(cos_theta_o * cos_gamma_o, eta);
    ap[0] = SampledSpectrum::constant(f);
    ap[1] = *t * ((1.0 - f) * (1.0 - f));
    for p in 2..P_MAX {
        ap[p] = ap[p - 1] * *t * f;
    }
    // Geometric series over every remaining bounce.
    ap[P_MAX] = ap[P_MAX - 1] * *t * f / (1.0 - *t * f);
    ap
}

fn phi(p: usize, gamma_o: Float, gamma_t: Float) -> Float {
    let p = p as Float;
    2.0 * p * gamma_t - 2.0 * gamma_o + p * PI
}

fn np(phi_value: Float, p: usize, s: Float, gamma_o: Float, gamma_t: Float) -> Float {
    let mut dphi = phi_value - phi(p, gamma_o, gamma_t);
    while dphi > PI {
        dphi -= 2.0 * PI;
    }
    while dphi < -PI {
        dphi += 2.0 * PI;
    }
    trimmed_logistic(dphi, s, -PI, PI)
}

// Picks an index proportionally to `weights` and returns `u` remapped to [0, 1).
fn sample_discrete(weights: &[Float], u: Float) -> (usize, Float) {
    let total: Float = weights.iter().sum();
    let up = u * total;
    let mut sum = 0.0;
    let mut last = 0;
    for (i, &w) in weights.iter().enumerate() {
        if w <= 0.0 {
            continue;
        }
        if up < sum + w {
            return (i, ((up - sum) / w).clamp(0.0, ONE_MINUS_EPSILON));
        }
        sum += w;
        last = i;
    }
    (last, ONE_MINUS_EPSILON)
}

impl HairBxDF {
    /// `alpha` is the cuticle scale tilt in degrees.
    pub fn new(h: Float, eta: Float, sigma_a: SampledSpectrum, beta_m: Float, beta_n: Float, alpha: Float) -> Self {
        debug_assert!((-1.0..=1.0).contains(&h));
        debug_assert!((0.0..=1.0).contains(&beta_m) && (0.0..=1.0).contains(&beta_n));

        let mut v = [0.0; P_MAX + 1];
        v[0] = (0.726 * beta_m + 0.812 * beta_m * beta_m + 3.7 * beta_m.powi(20)).powi(2);
        v[1] = 0.25 * v[0];
        v[2] = 4.0 * v[0];
        for p in 3..=P_MAX {
            v[p] = v[2];
        }

        let s = SQRT_PI_OVER_8 * (0.265 * beta_n + 1.194 * beta_n * beta_n + 5.372 * beta_n.powi(22));

        let mut sin_2k_alpha = [0.0; 3];
        let mut cos_2k_alpha = [0.0; 3];
        sin_2k_alpha[0] = alpha.to_radians().sin();
        cos_2k_alpha[0] = safe_sqrt(1.0 - sin_2k_alpha[0] * sin_2k_alpha[0]);
        for i in 1..3 {
            sin_2k_alpha[i] = 2.0 * cos_2k_alpha[i - 1] * sin_2k_alpha[i - 1];
            cos_2k_alpha[i] = cos_2k_alpha[i - 1] * cos_2k_alpha[i - 1] - sin_2k_alpha[i - 1] * sin_2k_alpha[i - 1];
        }

        Self {
            h,
            gamma_o: safe_asin(h),
            eta,
            sigma_a,
            beta_m,
            beta_n,
            v,
            s,
            sin_2k_alpha,
            cos_2k_alpha,
        }
    }

    /// Absorption (RGB) for eumelanin and pheomelanin concentrations.
    pub fn sigma_a_from_concentration(ce: Float, cp: Float) -> [Float; 3] {
        let eumelanin = [0.419, 0.697, 1.37];
        let pheomelanin = [0.187, 0.4, 1.05];
        [
            ce * eumelanin[0] + cp * pheomelanin[0],
            ce * eumelanin[1] + cp * pheomelanin[1],
            ce * eumelanin[2] + cp * pheomelanin[2],
        ]
    }

    /// Absorption that yields roughly the color `c` after multiple scattering.
    pub fn sigma_a_from_reflectance(c: &SampledSpectrum, beta_n: Float) -> SampledSpectrum {
        let denom = 5.969 - 0.215 * beta_n + 2.532 * beta_n.powi(2) - 10.73 * beta_n.powi(3)
            + 5.574 * beta_n.powi(4) + 0.245 * beta_n.powi(5);
        c.map(|ci| {
            let x = ci.ln() / denom;
            x * x
        })
    }

    // Longitudinal angle of wo rotated by the cuticle tilt of path `p`.
    fn tilted(&self, p: usize, sin_theta_o: Float, cos_theta_o: Float) -> (Float, Float) {
        let (sin_tilted, cos_tilted) = match p {
            0 => (sin_theta_o * self.cos_2k_alpha[1] - cos_theta_o * self.sin_2k_alpha[1],
                  cos_theta_o * self.cos_2k_alpha[1] + sin_theta_o * self.sin_2k_alpha[1]),
            1 => (sin_theta_o * self.cos_2k_alpha[0] + cos_theta_o * self.sin_2k_alpha[0],
                  cos_theta_o * self.cos_2k_alpha[0] - sin_theta_o * self.sin_2k_alpha[0]),
            2 => (sin_theta_o * self.cos_2k_alpha[2] + cos_theta_o * self.sin_2k_alpha[2],
                  cos_theta_o * self.cos_2k_alpha[2] - sin_theta_o * self.sin_2k_alpha[2]),
            _ => (sin_theta_o, cos_theta_o),
        };
        (sin_tilted, cos_tilted.abs())
    }

    // Refracted azimuthal offset and the transmittance of one pass through the fiber.
    fn transmission(&self, sin_theta_o: Float, cos_theta_o: Float) -> (Float, SampledSpectrum) {
        let sin_theta_t = sin_theta_o / self.eta;
        let cos_theta_t = safe_sqrt(1.0 - sin_theta_t * sin_theta_t);

        let etap = safe_sqrt(self.eta * self.eta - sin_theta_o * sin_theta_o) / cos_theta_o;
        let sin_gamma_t = self.h / etap;
        let cos_gamma_t = safe_sqrt(1.0 - sin_gamma_t * sin_gamma_t);
        let gamma_t = safe_asin(sin_gamma_t);

        let t = (-(self.sigma_a * (2.0 * cos_gamma_t / cos_theta_t))).exp();
        (gamma_t, t)
    }

    fn compute_ap_pdf(&self, cos_theta_o: Float) -> [Float; P_MAX + 1] {
        let sin_theta_o = safe_sqrt(1.0 - cos_theta_o * cos_theta_o);
        let (_, t) = self.transmission(sin_theta_o, cos_theta_o);
        let ap = ap(cos_theta_o, self.eta, self.h, &t);

        let sum: Float = ap.iter().map(|a| a.average()).sum();
        let mut ap_pdf = [0.0; P_MAX + 1];
        if sum <= 0.0 {
            return ap_pdf;
        }
        for (pdf, a) in ap_pdf.iter_mut().zip(ap.iter()) {
            *pdf = a.average() / sum;
        }
        ap_pdf
    }

    fn lobe_pdf(&self,
                sin_theta_o: Float,
                cos_theta_o: Float,
                sin_theta_i: Float,
                cos_theta_i: Float,
                dphi: Float,
                gamma_t: Float,
                ap_pdf: &[Float; P_MAX + 1]) -> Float {
        let mut pdf = 0.0;
        for p in 0..P_MAX {
            let (sin_tilted, cos_tilted) = self.tilted(p, sin_theta_o, cos_theta_o);
            pdf += mp(cos_theta_i, cos_tilted, sin_theta_i, sin_tilted, self.v[p])
                * ap_pdf[p] * np(dphi, p, self.s, self.gamma_o, gamma_t);
        }
        pdf += mp(cos_theta_i, cos_theta_o, sin_theta_i, sin_theta_o, self.v[P_MAX]) * ap_pdf[P_MAX] * INV_2PI;
        pdf
    }
}

fn longitudinal(w: &Vector3f) -> (Float, Float, Float) {
    let sin_theta = w.x;
    let cos_theta = safe_sqrt(1.0 - sin_theta * sin_theta);
    let phi = w.z.atan2(w.y);
    (sin_theta, cos_theta, phi)
}

impl ComputationNode for HairBxDF {
    fn to_string(&self) -> String {
        format!("HairBxDF: [ h: {}, eta: {}, sigma_a: {:?}, beta_m: {}, beta_n: {}, v[0]: {}, s: {} ]",
                self.h, self.eta, self.sigma_a.values(), self.beta_m, self.beta_n, self.v[0], self.s)
    }
}

impl BxDF for HairBxDF {
    fn name(&self) -> &'static str {
        "HairBxDF"
    }

    fn flags(&self) -> BxDFFlags {
        BxDFFlags::GLOSSY_REFLECTION
    }

    fn f(&self, wo: Vector3f, wi: Vector3f, _mode: TransportMode) -> SampledSpectrum {
        let (sin_theta_o, cos_theta_o, phi_o) = longitudinal(&wo);
        let (sin_theta_i, cos_theta_i, phi_i) = longitudinal(&wi);

        let (gamma_t, t) = self.transmission(sin_theta_o, cos_theta_o);
        let ap = ap(cos_theta_o, self.eta, self.h, &t);
        let phi_value = phi_i - phi_o;

        let mut fsum = SampledSpectrum::zero();
        for p in 0..P_MAX {
            let (sin_tilted, cos_tilted) = self.tilted(p, sin_theta_o, cos_theta_o);
            fsum += ap[p] * (mp(cos_theta_i, cos_tilted, sin_theta_i, sin_tilted, self.v[p])
                * np(phi_value, p, self.s, self.gamma_o, gamma_t));
        }
        fsum += ap[P_MAX] * (mp(cos_theta_i, cos_theta_o, sin_theta_i, sin_theta_o, self.v[P_MAX]) * INV_2PI);

        if abs_cos_theta(&wi) > 0.0 {
            fsum /= abs_cos_theta(&wi);
        }
        fsum
    }

    fn sample_f(&self,
                wo: Vector3f,
                uc: Float,
                u: Vector2f,
                mode: TransportMode,
                sample_flags: BxDFReflTransFlags) -> Option<BSDFSample> {
        if !sample_flags.contains(BxDFReflTransFlags::REFLECTION) {
            return None;
        }
        let (sin_theta_o, cos_theta_o, phi_o) = longitudinal(&wo);

        // Scattering path.
        let ap_pdf = self.compute_ap_pdf(cos_theta_o);
        let (p, uc) = sample_discrete(&ap_pdf, uc);
        let (sin_tilted, cos_tilted) = self.tilted(p, sin_theta_o, cos_theta_o);

        // Longitudinal angle.
        let u0 = u.x.max(1e-5);
        let cos_theta = 1.0 + self.v[p] * (u0 + (1.0 - u0) * (-2.0 / self.v[p]).exp()).ln();
        let sin_theta = safe_sqrt(1.0 - cos_theta * cos_theta);
        let cos_phi = (2.0 * PI * u.y).cos();
        let sin_theta_i = -cos_theta * sin_tilted + sin_theta * cos_phi * cos_tilted;
        let cos_theta_i = safe_sqrt(1.0 - sin_theta_i * sin_theta_i);

        // Azimuthal offset.
        let (gamma_t, _) = self.transmission(sin_theta_o, cos_theta_o);
        let dphi = if p < P_MAX {
            phi(p, self.gamma_o, gamma_t) + sample_trimmed_logistic(uc, self.s, -PI, PI)
        } else {
            2.0 * PI * uc
        };

        let phi_i = phi_o + dphi;
        let wi = Vector3f::new(sin_theta_i, cos_theta_i * phi_i.cos(), cos_theta_i * phi_i.sin());

        let pdf = self.lobe_pdf(sin_theta_o, cos_theta_o, sin_theta_i, cos_theta_i, dphi, gamma_t, &ap_pdf);
        if pdf <= 0.0 || !pdf.is_finite() {
            return None;
        }
        Some(BSDFSample::new(self.f(wo, wi, mode), wi, pdf, self.flags()))
    }

    fn pdf(&self,
           wo: Vector3f,
           wi: Vector3f,
           _mode: TransportMode,
           sample_flags: BxDFReflTransFlags) -> Float {
        if !sample_flags.contains(BxDFReflTransFlags::REFLECTION) {
            return 0.0;
        }
        let (sin_theta_o, cos_theta_o, phi_o) = longitudinal(&wo);
        let (sin_theta_i, cos_theta_i, phi_i) = longitudinal(&wi);

        let (gamma_t, _) = self.transmission(sin_theta_o, cos_theta_o);
        let ap_pdf = self.compute_ap_pdf(cos_theta_o);
        self.lobe_pdf(sin_theta_o, cos_theta_o, sin_theta_i, cos_theta_i, phi_i - phi_o, gamma_t, &ap_pdf)
    }

    fn diffuse_reflectance(&self) -> SampledSpectrum {
        SampledSpectrum::zero()
    }

    fn regularize(&mut self) {}
}
