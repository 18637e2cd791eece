// Copyright @yucwang 2026

use nalgebra::Complex;

use crate::math::constants::Float;
use crate::math::spectrum::{ SampledSpectrum, N_SPECTRUM_SAMPLES };
use crate::math::warp::safe_sqrt;

/// Unpolarized Fresnel reflectance of a dielectric boundary. `eta` is the
/// relative index below the surface over above; negative cosines mean the
/// incident direction is below the surface.
pub fn fr_dielectric(cos_theta_i: Float, eta: Float) -> Float {
    let mut cos_theta_i = cos_theta_i.clamp(-1.0, 1.0);
    let mut eta = eta;
    if cos_theta_i < 0.0 {
        eta = 1.0 / eta;
        cos_theta_i = -cos_theta_i;
    }

    let sin2_theta_i = 1.0 - cos_theta_i * cos_theta_i;
    let sin2_theta_t = sin2_theta_i / (eta * eta);
    if sin2_theta_t >= 1.0 {
        return 1.0;
    }
    let cos_theta_t = safe_sqrt(1.0 - sin2_theta_t);

    let r_parl = (eta * cos_theta_i - cos_theta_t) / (eta * cos_theta_i + cos_theta_t);
    let r_perp = (cos_theta_i - eta * cos_theta_t) / (cos_theta_i + eta * cos_theta_t);
    (r_parl * r_parl + r_perp * r_perp) / 2.0
}

/// Fresnel reflectance for a complex index of refraction `eta + i k`.
pub fn fr_complex(cos_theta_i: Float, eta: Complex<Float>) -> Float {
    let cos_theta_i = cos_theta_i.clamp(0.0, 1.0);
    let sin2_theta_i = 1.0 - cos_theta_i * cos_theta_i;
    let sin2_theta_t = Complex::new(sin2_theta_i, 0.0) / (eta * eta);
    let cos_theta_t = (Complex::new(1.0, 0.0) - sin2_theta_t).sqrt();

    let r_parl = (eta * cos_theta_i - cos_theta_t) / (eta * cos_theta_i + cos_theta_t);
    let r_perp = (cos_theta_t * -eta + cos_theta_i) / (eta * cos_theta_t + cos_theta_i);
    (r_parl.norm_sqr() + r_perp.norm_sqr()) / 2.0
}

pub fn fr_complex_spectrum(cos_theta_i: Float, eta: &SampledSpectrum, k: &SampledSpectrum) -> SampledSpectrum {
    let mut result = SampledSpectrum::zero();
    for i in 0..N_SPECTRUM_SAMPLES {
        result[i] = fr_complex(cos_theta_i, Complex::new(eta[i], k[i]));
    }
    result
}

/// First moment of the dielectric Fresnel reflectance (polynomial fit).
pub fn fresnel_moment1(eta: Float) -> Float {
    let eta2 = eta * eta;
    let eta3 = eta2 * eta;
    let eta4 = eta3 * eta;
    let eta5 = eta4 * eta;
    if eta < 1.0 {
        0.45966 - 1.73965 * eta + 3.37668 * eta2 - 3.904945 * eta3 + 2.49277 * eta4 - 0.68441 * eta5
    } else {
        -4.61686 + 11.1136 * eta - 10.4646 * eta2 + 5.11455 * eta3 - 1.27198 * eta4 + 0.12746 * eta5
    }
}

/// Hemispherically averaged Fresnel reflectance (Egan and Hilgeman fit).
pub fn fr_diffuse_reflectance(eta: Float) -> Float {
    if eta < 1.0 {
        -0.4399 + 0.7099 / eta - 0.3319 / (eta * eta) + 0.0636 / (eta * eta * eta)
    } else {
        -1.4399 / (eta * eta) + 0.7099 / eta + 0.6681 + 0.0636 * eta
    }
}
