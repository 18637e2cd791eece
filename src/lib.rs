// Copyright @yucwang 2021

#![allow(dead_code)]

pub extern crate nalgebra as na;

pub mod core;
pub mod math;
pub mod media;
pub mod materials;
pub mod io;
