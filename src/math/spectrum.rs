// Copyright 2020 @TwoCookingMice

use std::ops::{Add, AddAssign, Div, DivAssign, Index, IndexMut, Mul, MulAssign, Neg, Sub, SubAssign};

use nalgebra::SVector;

use super::constants::Float;

/// Number of wavelengths carried by every spectral quantity.
pub const N_SPECTRUM_SAMPLES: usize = 4;

pub const LAMBDA_MIN: Float = 360.0;
pub const LAMBDA_MAX: Float = 830.0;

/// A spectrum point-sampled at the caller's wavelengths.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampledSpectrum {
    values: SVector<Float, N_SPECTRUM_SAMPLES>,
}

impl Default for SampledSpectrum {
    fn default() -> Self {
        Self { values: SVector::zeros() }
    }
}

impl SampledSpectrum {
    pub fn new(values: [Float; N_SPECTRUM_SAMPLES]) -> Self {
        Self { values: SVector::from(values) }
    }

    pub fn constant(value: Float) -> Self {
        Self { values: SVector::repeat(value) }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn one() -> Self {
        Self::constant(1.0)
    }

    /// True when every sample is exactly zero.
    pub fn is_black(&self) -> bool {
        self.values.iter().all(|v| *v == 0.0)
    }

    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|v| v.is_finite())
    }

    pub fn has_negative(&self) -> bool {
        self.values.iter().any(|v| *v < 0.0)
    }

    pub fn max_component_value(&self) -> Float {
        self.values.max()
    }

    pub fn min_component_value(&self) -> Float {
        self.values.min()
    }

    pub fn average(&self) -> Float {
        self.values.sum() / N_SPECTRUM_SAMPLES as Float
    }

    pub fn map<F: Fn(Float) -> Float>(&self, f: F) -> Self {
        Self { values: self.values.map(f) }
    }

    pub fn exp(&self) -> Self {
        self.map(Float::exp)
    }

    pub fn sqrt(&self) -> Self {
        self.map(|v| v.max(0.0).sqrt())
    }

    pub fn clamp(&self, min: Float, max: Float) -> Self {
        self.map(|v| v.clamp(min, max))
    }

    pub fn values(&self) -> [Float; N_SPECTRUM_SAMPLES] {
        self.values.into()
    }
}

impl Index<usize> for SampledSpectrum {
    type Output = Float;

    fn index(&self, idx: usize) -> &Float {
        &self.values[idx]
    }
}

impl IndexMut<usize> for SampledSpectrum {
    fn index_mut(&mut self, idx: usize) -> &mut Float {
        &mut self.values[idx]
    }
}

impl Add for SampledSpectrum {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self { values: self.values + rhs.values }
    }
}

impl AddAssign for SampledSpectrum {
    fn add_assign(&mut self, rhs: Self) {
        self.values += rhs.values;
    }
}

impl Sub for SampledSpectrum {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self { values: self.values - rhs.values }
    }
}

impl SubAssign for SampledSpectrum {
    fn sub_assign(&mut self, rhs: Self) {
        self.values -= rhs.values;
    }
}

impl Mul for SampledSpectrum {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self { values: self.values.component_mul(&rhs.values) }
    }
}

impl MulAssign for SampledSpectrum {
    fn mul_assign(&mut self, rhs: Self) {
        self.values.component_mul_assign(&rhs.values);
    }
}

impl Mul<Float> for SampledSpectrum {
    type Output = Self;

    fn mul(self, rhs: Float) -> Self {
        Self { values: self.values * rhs }
    }
}

impl Mul<SampledSpectrum> for Float {
    type Output = SampledSpectrum;

    fn mul(self, rhs: SampledSpectrum) -> SampledSpectrum {
        rhs * self
    }
}

impl MulAssign<Float> for SampledSpectrum {
    fn mul_assign(&mut self, rhs: Float) {
        self.values *= rhs;
    }
}

impl Div for SampledSpectrum {
    type Output = Self;

    // Division by a zero sample yields zero rather than inf/NaN.
    fn div(self, rhs: Self) -> Self {
        let mut values = self.values;
        for idx in 0..N_SPECTRUM_SAMPLES {
            values[idx] = if rhs.values[idx] != 0.0 { values[idx] / rhs.values[idx] } else { 0.0 };
        }
        Self { values }
    }
}

impl Div<Float> for SampledSpectrum {
    type Output = Self;

    fn div(self, rhs: Float) -> Self {
        debug_assert!(rhs != 0.0, "spectrum divided by zero");
        Self { values: self.values / rhs }
    }
}

impl DivAssign<Float> for SampledSpectrum {
    fn div_assign(&mut self, rhs: Float) {
        debug_assert!(rhs != 0.0, "spectrum divided by zero");
        self.values /= rhs;
    }
}

impl Sub<SampledSpectrum> for Float {
    type Output = SampledSpectrum;

    fn sub(self, rhs: SampledSpectrum) -> SampledSpectrum {
        SampledSpectrum::constant(self) - rhs
    }
}

impl Neg for SampledSpectrum {
    type Output = Self;

    fn neg(self) -> Self {
        Self { values: -self.values }
    }
}

/// The wavelengths (in nm) a spectral evaluation is carried out at, supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampledWavelengths {
    lambda: [Float; N_SPECTRUM_SAMPLES],
    pdf: [Float; N_SPECTRUM_SAMPLES],
}

impl SampledWavelengths {
    pub fn new(lambda: [Float; N_SPECTRUM_SAMPLES], pdf: [Float; N_SPECTRUM_SAMPLES]) -> Self {
        Self { lambda, pdf }
    }

    /// Stratified uniform wavelengths over [lambda_min, lambda_max] driven by one sample.
    pub fn sample_uniform(u: Float, lambda_min: Float, lambda_max: Float) -> Self {
        let mut lambda = [0.0; N_SPECTRUM_SAMPLES];
        lambda[0] = lambda_min + u * (lambda_max - lambda_min);
        let delta = (lambda_max - lambda_min) / N_SPECTRUM_SAMPLES as Float;
        for i in 1..N_SPECTRUM_SAMPLES {
            lambda[i] = lambda[i - 1] + delta;
            if lambda[i] > lambda_max {
                lambda[i] = lambda_min + (lambda[i] - lambda_max);
            }
        }
        let pdf = [1.0 / (lambda_max - lambda_min); N_SPECTRUM_SAMPLES];
        Self { lambda, pdf }
    }

    pub fn pdf(&self) -> SampledSpectrum {
        SampledSpectrum::new(self.pdf)
    }
}

impl Default for SampledWavelengths {
    fn default() -> Self {
        Self::sample_uniform(0.5, LAMBDA_MIN, LAMBDA_MAX)
    }
}

impl Index<usize> for SampledWavelengths {
    type Output = Float;

    fn index(&self, idx: usize) -> &Float {
        &self.lambda[idx]
    }
}
