//! Facemorph generates a smooth visual transition between two images and
//! visualizes where a classifier focuses attention across that transition.
//!
//! The pipeline is sequential: resolve and normalize the two sources, detect
//! landmark correspondence, synthesize intermediate frames by piecewise-affine
//! warping (or a plain cross-dissolve when no correspondence exists), encode
//! the sequence to MP4, then run a per-frame attention analysis pass. The
//! [`job::JobManager`] runs all of that as one background job per submission
//! and publishes poll-able progress snapshots.
//!
//! External collaborators (the landmark model, the classifier, image
//! acquisition) sit behind traits: [`detect::LandmarkDetector`],
//! [`analysis::AttentionModel`], [`assets::ImageSource`].
#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod analysis;
pub mod assets;
pub mod detect;
pub mod encode;
pub mod foundation;
pub mod geometry;
pub mod job;
pub mod morph;

pub use crate::foundation::core::{FramePlanes, FrameRgb, FrameSize, Fps};
pub use crate::foundation::error::{MorphError, MorphResult};

pub use crate::analysis::{Aggregator, AnalysisConfig, AnalysisSummary, AttentionModel, LazyModel};
pub use crate::assets::{FileImageSource, ImageSource};
pub use crate::detect::{LandmarkDetector, NoLandmarks, StaticLandmarks};
pub use crate::encode::{FfmpegSink, FfmpegSinkFactory, FfmpegSinkOpts, FrameSink, InMemorySink};
pub use crate::geometry::{Point2, PointSet};
pub use crate::job::{
    JobContext, JobManager, JobRequest, JobResult, PoolOpts, ProgressBoard, ProgressObserver,
    SessionId, Snapshot, Stage,
};
pub use crate::morph::{MorphConfig, MorphMode, MorphOutcome, MorphRequest, Orchestrator};
