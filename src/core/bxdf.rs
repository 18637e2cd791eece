// Copyright @yucwang 2023

use std::fmt;
use std::ops::Not;

use bitflags::bitflags;

use crate::math::constants::{ Float, Vector2f, Vector3f };
use crate::math::spectrum::SampledSpectrum;

bitflags! {
    /// Lobes a scattering function may produce.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BxDFFlags: u8 {
        const REFLECTION = 1 << 0;
        const TRANSMISSION = 1 << 1;
        const DIFFUSE = 1 << 2;
        const GLOSSY = 1 << 3;
        const SPECULAR = 1 << 4;

        const DIFFUSE_REFLECTION = Self::DIFFUSE.bits() | Self::REFLECTION.bits();
        const DIFFUSE_TRANSMISSION = Self::DIFFUSE.bits() | Self::TRANSMISSION.bits();
        const GLOSSY_REFLECTION = Self::GLOSSY.bits() | Self::REFLECTION.bits();
        const GLOSSY_TRANSMISSION = Self::GLOSSY.bits() | Self::TRANSMISSION.bits();
        const SPECULAR_REFLECTION = Self::SPECULAR.bits() | Self::REFLECTION.bits();
        const SPECULAR_TRANSMISSION = Self::SPECULAR.bits() | Self::TRANSMISSION.bits();
        const ALL = Self::DIFFUSE.bits() | Self::GLOSSY.bits() | Self::SPECULAR.bits()
            | Self::REFLECTION.bits() | Self::TRANSMISSION.bits();
    }
}

impl BxDFFlags {
    pub fn is_reflective(&self) -> bool {
        self.contains(BxDFFlags::REFLECTION)
    }

    pub fn is_transmissive(&self) -> bool {
        self.contains(BxDFFlags::TRANSMISSION)
    }

    pub fn is_diffuse(&self) -> bool {
        self.contains(BxDFFlags::DIFFUSE)
    }

    pub fn is_glossy(&self) -> bool {
        self.contains(BxDFFlags::GLOSSY)
    }

    pub fn is_specular(&self) -> bool {
        self.contains(BxDFFlags::SPECULAR)
    }

    pub fn is_non_specular(&self) -> bool {
        self.intersects(BxDFFlags::DIFFUSE | BxDFFlags::GLOSSY)
    }
}

bitflags! {
    /// Hemispheres a caller allows `sample_f` and `pdf` to consider.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BxDFReflTransFlags: u8 {
        const REFLECTION = 1 << 0;
        const TRANSMISSION = 1 << 1;
        const ALL = Self::REFLECTION.bits() | Self::TRANSMISSION.bits();
    }
}

/// Whether the quantity carried along the path is radiance (camera paths)
/// or importance (light paths).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportMode {
    Radiance,
    Importance,
}

impl Not for TransportMode {
    type Output = TransportMode;

    fn not(self) -> TransportMode {
        match self {
            TransportMode::Radiance => TransportMode::Importance,
            TransportMode::Importance => TransportMode::Radiance,
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportMode::Radiance => write!(f, "radiance"),
            TransportMode::Importance => write!(f, "importance"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BSDFSample {
    pub f: SampledSpectrum,
    pub wi: Vector3f,
    pub pdf: Float,
    pub flags: BxDFFlags,
    /// Relative index of refraction across the boundary, 1 for non-refractive events.
    pub eta: Float,
    /// Set when `pdf` is only proportional to the density of `wi`.
    pub pdf_is_proportional: bool,
}

impl BSDFSample {
    pub fn new(f: SampledSpectrum, wi: Vector3f, pdf: Float, flags: BxDFFlags) -> Self {
        Self {
            f,
            wi,
            pdf,
            flags,
            eta: 1.0,
            pdf_is_proportional: false,
        }
    }

    pub fn with_eta(mut self, eta: Float) -> Self {
        self.eta = eta;
        self
    }

    pub fn with_proportional_pdf(mut self, pdf_is_proportional: bool) -> Self {
        self.pdf_is_proportional = pdf_is_proportional;
        self
    }

    pub fn is_reflection(&self) -> bool {
        self.flags.is_reflective()
    }

    pub fn is_transmission(&self) -> bool {
        self.flags.is_transmissive()
    }

    pub fn is_specular(&self) -> bool {
        self.flags.is_specular()
    }
}

/// Local-frame scattering function. Directions are unit vectors with the
/// shading normal along +z.
pub trait BxDF: Send + Sync {
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn flags(&self) -> BxDFFlags;

    fn f(&self, wo: Vector3f, wi: Vector3f, mode: TransportMode) -> SampledSpectrum;

    fn sample_f(&self,
                wo: Vector3f,
                uc: Float,
                u: Vector2f,
                mode: TransportMode,
                sample_flags: BxDFReflTransFlags) -> Option<BSDFSample>;

    fn pdf(&self,
           wo: Vector3f,
           wi: Vector3f,
           mode: TransportMode,
           sample_flags: BxDFReflTransFlags) -> Float;

    /// Rough albedo estimate for previews.
    fn diffuse_reflectance(&self) -> SampledSpectrum;

    /// Widens near-specular lobes. Call at most once, before sharing the instance.
    fn regularize(&mut self);
}
