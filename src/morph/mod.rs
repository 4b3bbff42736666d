//! The morphing core: piecewise-affine warper, frame sequencer, orchestrator.

pub mod orchestrator;
pub mod sequencer;
pub mod warp;

pub use orchestrator::{MorphConfig, MorphOutcome, MorphRequest, Orchestrator};
pub use sequencer::{synthesize, synthesize_frame, MorphMode, MorphPlan};
pub use warp::warp_triangle;
