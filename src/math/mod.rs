pub mod liquidity;
pub mod position;
pub mod precision;
pub mod tick_math;
