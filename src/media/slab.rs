// Copyright @yucwang 2026

use crate::math::constants::{ Float, Vector3f };
use crate::math::spectrum::SampledSpectrum;
use crate::media::phase_function::HGPhaseFunction;

/// Homogeneous medium between the two interfaces of a layered material.
/// Distances are measured in units of mean free path along the normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerSlab {
    thickness: Float,
    albedo: SampledSpectrum,
    g: Float,
}

impl LayerSlab {
    pub fn new(thickness: Float) -> Self {
        let floored = thickness.max(Float::MIN_POSITIVE);
        if floored != thickness {
            log::debug!("Layer thickness {} floored to {}.", thickness, floored);
        }
        Self {
            thickness: floored,
            albedo: SampledSpectrum::zero(),
            g: 0.0,
        }
    }

    pub fn with_albedo(mut self, albedo: SampledSpectrum) -> Self {
        self.albedo = albedo;
        self
    }

    pub fn with_g(mut self, g: Float) -> Self {
        self.g = g;
        self
    }

    pub fn thickness(&self) -> Float {
        self.thickness
    }

    pub fn albedo(&self) -> SampledSpectrum {
        self.albedo
    }

    pub fn g(&self) -> Float {
        self.g
    }

    pub fn has_scattering(&self) -> bool {
        !self.albedo.is_black()
    }

    pub fn phase_function(&self) -> HGPhaseFunction {
        HGPhaseFunction::new(self.g)
    }
}

/// Beer–Lambert transmittance across a height difference `dz` along `w`.
pub fn transmittance(dz: Float, w: &Vector3f) -> Float {
    if dz.abs() <= Float::MIN_POSITIVE {
        return 1.0;
    }
    (-(dz / w.z).abs()).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Float, b: Float) {
        assert!((a - b).abs() < 1e-5, "expected {} ≈ {}", a, b);
    }

    #[test]
    fn test_thickness_floor() {
        assert_eq!(LayerSlab::new(0.0).thickness(), Float::MIN_POSITIVE);
        assert_eq!(LayerSlab::new(-1.0).thickness(), Float::MIN_POSITIVE);
        assert_eq!(LayerSlab::new(0.25).thickness(), 0.25);
    }

    #[test]
    fn test_transmittance() {
        let w = Vector3f::new(0.0, 0.0, 1.0);
        assert_close(transmittance(0.0, &w), 1.0);
        assert_close(transmittance(1.0, &w), (-1.0 as Float).exp());
        let slanted = Vector3f::new(0.8, 0.0, -0.6);
        assert_close(transmittance(0.3, &slanted), (-0.5 as Float).exp());
    }

    #[test]
    fn test_scattering_flag() {
        let slab = LayerSlab::new(0.1);
        assert!(!slab.has_scattering());
        let slab = slab.with_albedo(SampledSpectrum::constant(0.5)).with_g(0.3);
        assert!(slab.has_scattering());
        assert_eq!(slab.phase_function().g(), 0.3);
    }
}
