// Copyright @yucwang 2023

use super::constants::{ INV_PI, INV_4PI, PI, Float, Vector2f, Vector3f };

#[inline]
pub fn lerp(t: Float, a: Float, b: Float) -> Float {
    (1.0 - t) * a + t * b
}

#[inline]
pub fn safe_sqrt(x: Float) -> Float {
    x.max(0.0).sqrt()
}

#[inline]
pub fn safe_asin(x: Float) -> Float {
    x.clamp(-1.0, 1.0).asin()
}

#[inline]
pub fn safe_acos(x: Float) -> Float {
    x.clamp(-1.0, 1.0).acos()
}

pub fn sample_uniform_hemisphere(u: &Vector2f) -> Vector3f {
    let z: Float = u.x;
    let r: Float = safe_sqrt(1. - z * z);
    let phi: Float = 2. * PI * u.y;

    return Vector3f::new(r * phi.cos(), r * phi.sin(), z)
}

pub fn sample_uniform_hemisphere_pdf() -> Float {
    return INV_PI / 2.
}

pub fn sample_uniform_sphere(u: &Vector2f) -> Vector3f {
    let z: Float = 1. - 2. * u.x;
    let r: Float = safe_sqrt(1. - z * z);
    let phi: Float = 2. * PI * u.y;

    return Vector3f::new(r * phi.cos(), r * phi.sin(), z)
}

pub fn sample_uniform_sphere_pdf() -> Float {
    return INV_4PI
}

pub fn sample_uniform_disk_concentric(u: &Vector2f) -> Vector2f {
    let r1: Float = 2.0 * u.x - 1.0;
    let r2: Float = 2.0 * u.y - 1.0;

    let phi: Float;
    let r:   Float;

    if r1 == 0. && r2 == 0. {
        r = 0.0;
        phi = 0.0;
    } else if r1 * r1 > r2 * r2 {
        r = r1;
        phi = (PI / 4.0) * (r2 / r1);
    } else {
        r = r2;
        phi = (PI / 2.0) - (r1 / r2) * (PI / 4.0);
    }

    let (sin_phi, cos_phi) = phi.sin_cos();

    return Vector2f::new(r * cos_phi, r * sin_phi)
}

pub fn sample_uniform_disk_polar(u: &Vector2f) -> Vector2f {
    let r = u.x.sqrt();
    let theta = 2. * PI * u.y;

    return Vector2f::new(r * theta.cos(), r * theta.sin())
}

pub fn sample_cosine_hemisphere(u: &Vector2f) -> Vector3f {
    let p = sample_uniform_disk_concentric(&u);
    let z = safe_sqrt(1. - p.x * p.x - p.y * p.y);

    return Vector3f::new(p.x, p.y, z)
}

pub fn sample_cosine_hemisphere_pdf(cos_theta: Float) -> Float {
    return cos_theta * INV_PI;
}

/// Distance sampled proportionally to `a * exp(-a * x)`.
pub fn sample_exponential(u: Float, a: Float) -> Float {
    -(1. - u).ln() / a
}

/// Balance of two strategies with the power (β = 2) heuristic.
pub fn power_heuristic(nf: Float, f_pdf: Float, ng: Float, g_pdf: Float) -> Float {
    let f = nf * f_pdf;
    let g = ng * g_pdf;
    if (f * f).is_infinite() {
        return 1.0;
    }
    if f == 0.0 && g == 0.0 {
        return 0.0;
    }
    (f * f) / (f * f + g * g)
}

pub fn logistic(x: Float, s: Float) -> Float {
    let x = x.abs();
    let e = (-x / s).exp();
    e / (s * (1. + e) * (1. + e))
}

pub fn logistic_cdf(x: Float, s: Float) -> Float {
    1. / (1. + (-x / s).exp())
}

/// Logistic density renormalized to the interval [a, b].
pub fn trimmed_logistic(x: Float, s: Float, a: Float, b: Float) -> Float {
    logistic(x, s) / (logistic_cdf(b, s) - logistic_cdf(a, s))
}

pub fn sample_trimmed_logistic(u: Float, s: Float, a: Float, b: Float) -> Float {
    let u = lerp(u, logistic_cdf(a, s), logistic_cdf(b, s));
    let x = -s * (1. / u - 1.).ln();
    x.clamp(a, b)
}

/// Modified Bessel function of the first kind, order zero (series truncated at 10 terms).
pub fn i0(x: Float) -> Float {
    let mut val: Float = 0.;
    let mut x2i: Float = 1.;
    let mut ifact: Float = 1.;
    let mut i4: Float = 1.;
    for i in 0..10 {
        if i > 1 {
            ifact *= i as Float;
        }
        val += x2i / (i4 * ifact * ifact);
        x2i *= x * x;
        i4 *= 4.;
    }
    val
}

pub fn log_i0(x: Float) -> Float {
    if x > 12. {
        x + 0.5 * (-(2. * PI).ln() + (1. / x).ln() + 1. / (8. * x))
    } else {
        i0(x).ln()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn assert_close(a: Float, b: Float) {
        assert!((a - b).abs() < 1e-4, "expected {} ≈ {}", a, b);
    }

    #[test]
    fn test_cosine_hemisphere_is_unit_and_upper() {
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..256 {
            let u = Vector2f::new(rng.gen::<Float>(), rng.gen::<Float>());
            let w = sample_cosine_hemisphere(&u);
            assert!(w.z >= 0.0);
            assert_close(w.norm(), 1.0);
        }
    }

    #[test]
    fn test_power_heuristic() {
        assert_close(power_heuristic(1., 1., 1., 1.), 0.5);
        assert_close(power_heuristic(1., 2., 1., 0.), 1.0);
        assert_close(power_heuristic(1., 0., 1., 0.), 0.0);
        assert_close(power_heuristic(1., Float::INFINITY, 1., 1.), 1.0);
    }

    #[test]
    fn test_bessel_i0() {
        assert_close(i0(0.0), 1.0);
        // I0(1) = 1.2660658...
        assert_close(i0(1.0), 1.266_065_9);
        assert_close(log_i0(2.0), i0(2.0).ln());
        // ln I0(12) = 9.8495..., the truncated series runs slightly low there.
        assert!((i0(12.0).ln() - 9.849_5).abs() < 3e-2);
        // Asymptotic branch stays close to the series across the switch point.
        assert!((log_i0(12.01) - i0(12.0).ln()).abs() < 3e-2);
        assert!(log_i0(12.01) > log_i0(11.99));
    }

    #[test]
    fn test_trimmed_logistic_sample_in_range() {
        for k in 0..32 {
            let u = (k as Float + 0.5) / 32.0;
            let x = sample_trimmed_logistic(u, 0.3, -PI, PI);
            assert!(x >= -PI && x <= PI);
        }
        assert!(trimmed_logistic(0.0, 0.3, -PI, PI) > logistic(0.0, 0.3));
    }

    #[test]
    fn test_exponential_sample_is_non_negative() {
        assert_close(sample_exponential(0.0, 2.0), 0.0);
        assert!(sample_exponential(0.9, 2.0) > 0.0);
    }
}
