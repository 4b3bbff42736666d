//! Correspondence provider seam.

pub mod landmarks;

pub use landmarks::{LandmarkDetector, NoLandmarks, StaticLandmarks};
