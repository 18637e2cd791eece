// Copyright @yucwang 2021

pub mod bxdf;
pub mod computation_node;
pub mod hash;
pub mod material_loader;
pub mod options;
pub mod rng;
