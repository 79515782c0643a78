//! Invoice billing arithmetic
//!
//! - [`fee`]: Fee and consumption tax calculation over exact decimals

pub mod fee;

pub use fee::{CalculationError, CalculationResult, FeeCalculator};
