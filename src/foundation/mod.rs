//! Shared value types, error taxonomy, and pixel math.

pub mod core;
pub mod error;
pub(crate) mod math;
