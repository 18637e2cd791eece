// Copyright @yucwang 2026

pub mod coated;
pub mod conductor;
pub mod dielectric;
pub mod diffuse;
pub mod fresnel;
pub mod hair;
pub mod handle;
pub mod layered;
pub mod measured;
pub mod microfacet;
pub mod normalized_fresnel;
pub mod specular;
pub mod thin_dielectric;
