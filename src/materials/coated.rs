// Copyright @yucwang 2026

use crate::core::bxdf::{ BSDFSample, BxDF, BxDFFlags, BxDFReflTransFlags, TransportMode };
use crate::core::computation_node::ComputationNode;
use crate::materials::conductor::ConductorBxDF;
use crate::materials::dielectric::DielectricInterfaceBxDF;
use crate::materials::diffuse::IdealDiffuseBxDF;
use crate::materials::fresnel::fr_diffuse_reflectance;
use crate::materials::layered::{ LayeredBxDF, LayeredBxDFConfig };
use crate::math::constants::{ Float, Vector2f, Vector3f };
use crate::math::spectrum::SampledSpectrum;
use crate::media::slab::LayerSlab;

// Forwards the scattering queries of a coated wrapper to its layered engine.
macro_rules! forward_to_layered {
    ($name:literal) => {
        fn name(&self) -> &'static str {
            $name
        }

        fn flags(&self) -> BxDFFlags {
            self.layered.flags()
        }

        fn f(&self, wo: Vector3f, wi: Vector3f, mode: TransportMode) -> SampledSpectrum {
            self.layered.f(wo, wi, mode)
        }

        fn sample_f(&self,
                    wo: Vector3f,
                    uc: Float,
                    u: Vector2f,
                    mode: TransportMode,
                    sample_flags: BxDFReflTransFlags) -> Option<BSDFSample> {
            self.layered.sample_f(wo, uc, u, mode, sample_flags)
        }

        fn pdf(&self,
               wo: Vector3f,
               wi: Vector3f,
               mode: TransportMode,
               sample_flags: BxDFReflTransFlags) -> Float {
            self.layered.pdf(wo, wi, mode, sample_flags)
        }

        fn regularize(&mut self) {
            self.layered.regularize();
        }
    };
}

/// Diffuse base under a dielectric coat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoatedDiffuseBxDF {
    layered: LayeredBxDF<DielectricInterfaceBxDF, IdealDiffuseBxDF>,
}

impl CoatedDiffuseBxDF {
    pub fn new(top: DielectricInterfaceBxDF,
               bottom: IdealDiffuseBxDF,
               slab: LayerSlab,
               config: LayeredBxDFConfig) -> Self {
        Self {
            layered: LayeredBxDF::new(top, bottom, slab, config),
        }
    }

    pub fn layered(&self) -> &LayeredBxDF<DielectricInterfaceBxDF, IdealDiffuseBxDF> {
        &self.layered
    }
}

impl ComputationNode for CoatedDiffuseBxDF {
    fn to_string(&self) -> String {
        format!("CoatedDiffuseBxDF: [ {} ]", self.layered.to_string())
    }
}

impl BxDF for CoatedDiffuseBxDF {
    forward_to_layered!("CoatedDiffuseBxDF");

    /// Base albedo seen through the coat, attenuated by the coat's diffuse reflectance.
    fn diffuse_reflectance(&self) -> SampledSpectrum {
        let through = (1.0 - fr_diffuse_reflectance(self.layered.top().eta())).clamp(0.0, 1.0);
        self.layered.bottom().diffuse_reflectance() * through
    }
}

/// Metal base under a dielectric coat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoatedConductorBxDF {
    layered: LayeredBxDF<DielectricInterfaceBxDF, ConductorBxDF>,
}

impl CoatedConductorBxDF {
    pub fn new(top: DielectricInterfaceBxDF,
               bottom: ConductorBxDF,
               slab: LayerSlab,
               config: LayeredBxDFConfig) -> Self {
        Self {
            layered: LayeredBxDF::new(top, bottom, slab, config),
        }
    }

    pub fn layered(&self) -> &LayeredBxDF<DielectricInterfaceBxDF, ConductorBxDF> {
        &self.layered
    }
}

impl ComputationNode for CoatedConductorBxDF {
    fn to_string(&self) -> String {
        format!("CoatedConductorBxDF: [ {} ]", self.layered.to_string())
    }
}

impl BxDF for CoatedConductorBxDF {
    forward_to_layered!("CoatedConductorBxDF");

    fn diffuse_reflectance(&self) -> SampledSpectrum {
        self.layered.diffuse_reflectance()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materials::microfacet::TrowbridgeReitzDistribution;
    use crate::math::frame::spherical_direction;

    fn assert_close(a: Float, b: Float) {
        assert!((a - b).abs() < 1e-5, "expected {} ≈ {}", a, b);
    }

    fn plastic(albedo: Float) -> CoatedDiffuseBxDF {
        CoatedDiffuseBxDF::new(
            DielectricInterfaceBxDF::new(1.5, TrowbridgeReitzDistribution::isotropic(0.0)),
            IdealDiffuseBxDF::new(SampledSpectrum::constant(0.8)),
            LayerSlab::new(0.01).with_albedo(SampledSpectrum::constant(albedo)),
            LayeredBxDFConfig::default(),
        )
    }

    #[test]
    fn test_diffuse_reflectance_attenuated_by_coat() {
        let bxdf = plastic(0.0);
        let expected = 0.8 * (1.0 - fr_diffuse_reflectance(1.5));
        let rho = bxdf.diffuse_reflectance();
        for i in 0..4 {
            assert_close(rho[i], expected);
            assert!(rho[i] < 0.8);
        }
    }

    #[test]
    fn test_forwards_to_engine() {
        let bxdf = plastic(0.3);
        let wo = spherical_direction(0.6, 0.8, 0.4);
        let wi = spherical_direction(0.3, 0.953_939_2, 1.0);
        assert_eq!(bxdf.name(), "CoatedDiffuseBxDF");
        assert_eq!(bxdf.flags(), bxdf.layered().flags());
        assert_eq!(bxdf.f(wo, wi, TransportMode::Radiance), bxdf.layered().f(wo, wi, TransportMode::Radiance));
        assert_eq!(bxdf.pdf(wo, wi, TransportMode::Radiance, BxDFReflTransFlags::ALL),
                   bxdf.layered().pdf(wo, wi, TransportMode::Radiance, BxDFReflTransFlags::ALL));
    }

    #[test]
    fn test_coated_conductor_reflects_only() {
        let bxdf = CoatedConductorBxDF::new(
            DielectricInterfaceBxDF::new(1.5, TrowbridgeReitzDistribution::isotropic(0.1)),
            ConductorBxDF::new(TrowbridgeReitzDistribution::isotropic(0.2),
                               SampledSpectrum::constant(0.2), SampledSpectrum::constant(3.0)),
            LayerSlab::new(0.01),
            LayeredBxDFConfig::default(),
        );
        let flags = bxdf.flags();
        assert!(flags.is_reflective());
        assert!(!flags.is_transmissive());
        assert!(flags.is_glossy());
        assert!(bxdf.diffuse_reflectance().is_black());

        let wo = spherical_direction(0.5, 0.866_025_4, 0.1);
        for k in 0..32 {
            let uc = (k as Float + 0.5) / 32.0;
            if let Some(bs) = bxdf.sample_f(wo, uc, Vector2f::new(uc, 1.0 - uc), TransportMode::Radiance, BxDFReflTransFlags::ALL) {
                assert!(bs.wi.z > 0.0);
                assert!(bs.pdf > 0.0);
            }
        }
    }
}
