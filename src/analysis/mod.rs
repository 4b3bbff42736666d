//! Classifier-attention analysis over a morph sequence.

pub mod aggregator;
pub mod colormap;
pub mod model;

pub use aggregator::{Aggregator, AnalysisConfig, AnalysisSummary, FrameSample};
pub use model::{AttentionMap, AttentionModel, LazyModel, Prediction};
