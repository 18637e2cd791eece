// Copyright @yucwang 2026

use crate::core::bxdf::{ BSDFSample, BxDF, BxDFFlags, BxDFReflTransFlags, TransportMode };
use crate::core::computation_node::ComputationNode;
use crate::materials::coated::{ CoatedConductorBxDF, CoatedDiffuseBxDF };
use crate::materials::conductor::ConductorBxDF;
use crate::materials::dielectric::DielectricInterfaceBxDF;
use crate::materials::diffuse::{ DiffuseBxDF, IdealDiffuseBxDF };
use crate::materials::hair::HairBxDF;
use crate::materials::measured::MeasuredBxDF;
use crate::materials::normalized_fresnel::NormalizedFresnelBxDF;
use crate::materials::specular::{ SpecularReflectionBxDF, SpecularTransmissionBxDF };
use crate::materials::thin_dielectric::ThinDielectricBxDF;
use crate::math::constants::{ Float, Vector2f, Vector3f };
use crate::math::spectrum::SampledSpectrum;

/// Every scattering model a shading point can resolve to.
#[derive(Debug, Clone)]
pub enum BxDFHandle {
    IdealDiffuse(IdealDiffuseBxDF),
    Diffuse(DiffuseBxDF),
    SpecularReflection(SpecularReflectionBxDF),
    SpecularTransmission(SpecularTransmissionBxDF),
    Dielectric(DielectricInterfaceBxDF),
    ThinDielectric(ThinDielectricBxDF),
    Conductor(ConductorBxDF),
    CoatedDiffuse(CoatedDiffuseBxDF),
    CoatedConductor(CoatedConductorBxDF),
    Hair(HairBxDF),
    Measured(MeasuredBxDF),
    NormalizedFresnel(NormalizedFresnelBxDF),
}

macro_rules! dispatch {
    ($handle:expr, $bxdf:ident => $body:expr) => {
        match $handle {
            BxDFHandle::IdealDiffuse($bxdf) => $body,
            BxDFHandle::Diffuse($bxdf) => $body,
            BxDFHandle::SpecularReflection($bxdf) => $body,
            BxDFHandle::SpecularTransmission($bxdf) => $body,
            BxDFHandle::Dielectric($bxdf) => $body,
            BxDFHandle::ThinDielectric($bxdf) => $body,
            BxDFHandle::Conductor($bxdf) => $body,
            BxDFHandle::CoatedDiffuse($bxdf) => $body,
            BxDFHandle::CoatedConductor($bxdf) => $body,
            BxDFHandle::Hair($bxdf) => $body,
            BxDFHandle::Measured($bxdf) => $body,
            BxDFHandle::NormalizedFresnel($bxdf) => $body,
        }
    };
}

macro_rules! impl_from {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for BxDFHandle {
                fn from(bxdf: $ty) -> Self {
                    BxDFHandle::$variant(bxdf)
                }
            }
        )*
    };
}

impl_from!(
    IdealDiffuse(IdealDiffuseBxDF),
    Diffuse(DiffuseBxDF),
    SpecularReflection(SpecularReflectionBxDF),
    SpecularTransmission(SpecularTransmissionBxDF),
    Dielectric(DielectricInterfaceBxDF),
    ThinDielectric(ThinDielectricBxDF),
    Conductor(ConductorBxDF),
    CoatedDiffuse(CoatedDiffuseBxDF),
    CoatedConductor(CoatedConductorBxDF),
    Hair(HairBxDF),
    Measured(MeasuredBxDF),
    NormalizedFresnel(NormalizedFresnelBxDF),
);

impl ComputationNode for BxDFHandle {
    fn to_string(&self) -> String {
        dispatch!(self, bxdf => bxdf.to_string())
    }
}

impl BxDF for BxDFHandle {
    fn name(&self) -> &'static str {
        dispatch!(self, bxdf => bxdf.name())
    }

    fn flags(&self) -> BxDFFlags {
        dispatch!(self, bxdf => bxdf.flags())
    }

    fn f(&self, wo: Vector3f, wi: Vector3f, mode: TransportMode) -> SampledSpectrum {
        dispatch!(self, bxdf => bxdf.f(wo, wi, mode))
    }

    fn sample_f(&self,
                wo: Vector3f,
                uc: Float,
                u: Vector2f,
                mode: TransportMode,
                sample_flags: BxDFReflTransFlags) -> Option<BSDFSample> {
        dispatch!(self, bxdf => bxdf.sample_f(wo, uc, u, mode, sample_flags))
    }

    fn pdf(&self,
           wo: Vector3f,
           wi: Vector3f,
           mode: TransportMode,
           sample_flags: BxDFReflTransFlags) -> Float {
        dispatch!(self, bxdf => bxdf.pdf(wo, wi, mode, sample_flags))
    }

    fn diffuse_reflectance(&self) -> SampledSpectrum {
        dispatch!(self, bxdf => bxdf.diffuse_reflectance())
    }

    fn regularize(&mut self) {
        dispatch!(self, bxdf => bxdf.regularize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materials::microfacet::TrowbridgeReitzDistribution;
    use crate::math::frame::spherical_direction;

    #[test]
    fn test_dispatch_matches_variant() {
        let diffuse = IdealDiffuseBxDF::new(SampledSpectrum::constant(0.5));
        let handle = BxDFHandle::from(diffuse);
        let wo = spherical_direction(0.6, 0.8, 0.4);
        let wi = spherical_direction(0.3, 0.953_939_2, 1.0);
        assert_eq!(handle.name(), "IdealDiffuseBxDF");
        assert_eq!(handle.flags(), diffuse.flags());
        assert_eq!(handle.f(wo, wi, TransportMode::Radiance), diffuse.f(wo, wi, TransportMode::Radiance));
        assert_eq!(handle.pdf(wo, wi, TransportMode::Radiance, BxDFReflTransFlags::ALL),
                   diffuse.pdf(wo, wi, TransportMode::Radiance, BxDFReflTransFlags::ALL));
        let u = Vector2f::new(0.2, 0.7);
        assert_eq!(handle.sample_f(wo, 0.5, u, TransportMode::Radiance, BxDFReflTransFlags::ALL),
                   diffuse.sample_f(wo, 0.5, u, TransportMode::Radiance, BxDFReflTransFlags::ALL));
    }

    #[test]
    fn test_regularize_through_handle() {
        let conductor = ConductorBxDF::new(TrowbridgeReitzDistribution::isotropic(0.0),
                                           SampledSpectrum::constant(0.2), SampledSpectrum::constant(3.0));
        let mut handle: BxDFHandle = conductor.into();
        assert!(handle.flags().is_specular());
        handle.regularize();
        assert!(handle.flags().is_glossy());
        assert_eq!(handle.name(), "ConductorBxDF");
    }

    #[test]
    fn test_names_are_distinct() {
        let handles: Vec<BxDFHandle> = vec![
            ThinDielectricBxDF::new(1.5).into(),
            NormalizedFresnelBxDF::new(1.33).into(),
            HairBxDF::new(0.0, 1.55, SampledSpectrum::zero(), 0.3, 0.3, 2.0).into(),
            SpecularReflectionBxDF::new(1.5, SampledSpectrum::one()).into(),
        ];
        let names: Vec<&str> = handles.iter().map(|h| h.name()).collect();
        assert_eq!(names, vec!["ThinDielectricBxDF", "NormalizedFresnelBxDF", "HairBxDF", "SpecularReflectionBxDF"]);
    }
}
