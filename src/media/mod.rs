// Copyright @yucwang 2026

pub mod phase_function;
pub mod slab;
