/* Copyright 2020 @Yuchen Wong */

use nalgebra::{Vector2, Vector3};

pub type Float = f32;
pub type Int = i32;
pub type UInt = u32;

pub type Vector2f = Vector2<Float>;
pub type Vector3f = Vector3<Float>;

pub const EPSILON: Float = 1e-4;
pub const PI: Float = std::f32::consts::PI;
pub const INV_PI: Float = std::f32::consts::FRAC_1_PI;
pub const INV_2PI: Float = 0.5 * std::f32::consts::FRAC_1_PI;
pub const INV_4PI: Float = 0.25 * std::f32::consts::FRAC_1_PI;
pub const PI_OVER_2: Float = std::f32::consts::FRAC_PI_2;
pub const PI_OVER_4: Float = std::f32::consts::FRAC_PI_4;
pub const SQRT_PI_OVER_8: Float = 0.626_657_07;
pub const SQUARE_2: Float = std::f32::consts::SQRT_2;
pub const INV_SQUARE_2: Float = std::f32::consts::FRAC_1_SQRT_2;

// Largest float strictly below one, used to keep canonical samples in [0, 1).
pub const ONE_MINUS_EPSILON: Float = 1.0 - Float::EPSILON / 2.0;
