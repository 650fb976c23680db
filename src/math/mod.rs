pub mod math_helpers;

pub mod bit_math;
pub mod compound_math;
pub mod fixed_point;
pub mod liquidity_math;
pub mod tick_bitmap;
pub mod tick_math;

pub mod curve_assimilate;
pub mod curve_math;
pub mod curve_roll;
pub mod swap_math;
