//! End-to-end morph pipeline orchestration.

use std::path::PathBuf;

use crate::assets::image::ImageSource;
use crate::detect::landmarks::LandmarkDetector;
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{Fps, FrameRgb, FrameSize};
use crate::foundation::error::{MorphError, MorphResult};
use crate::geometry::{delaunay, PointSet};
use crate::job::progress::{ProgressObserver, Stage};
use crate::morph::sequencer::{synthesize, MorphMode, MorphPlan};

/// Per-job geometry and timing configuration.
#[derive(Clone, Copy, Debug)]
pub struct MorphConfig {
    /// Base size every frame of the job is normalized to.
    pub size: FrameSize,
    /// Number of interpolation steps.
    pub total_frames: usize,
    /// Output frame rate.
    pub fps: Fps,
}

impl Default for MorphConfig {
    fn default() -> Self {
        Self {
            size: FrameSize {
                width: 320,
                height: 320,
            },
            total_frames: 120,
            fps: Fps { num: 30, den: 1 },
        }
    }
}

/// Inputs of one morph job.
#[derive(Clone, Debug)]
pub struct MorphRequest {
    /// Reference to the first source image.
    pub image_a: String,
    /// Reference to the second source image.
    pub image_b: String,
    /// Output path for the morph video.
    pub video_out: PathBuf,
}

/// Result of a completed morph stage.
///
/// The frame sequence is handed to the attention stage by the caller, not by
/// the orchestrator.
#[derive(Debug)]
pub struct MorphOutcome {
    /// Where the morph video was written.
    pub video_path: PathBuf,
    /// Number of frames produced.
    pub frame_count: usize,
    /// The synthesis mode that was selected.
    pub mode: MorphMode,
    /// The full ordered frame sequence.
    pub frames: Vec<FrameRgb>,
}

/// Sequential state machine coordinating one morph:
/// `loading -> detecting -> {warping | blending} -> encoding -> done`,
/// or `error` from any state.
pub struct Orchestrator<'a> {
    resolver: &'a dyn ImageSource,
    detector: &'a dyn LandmarkDetector,
    config: MorphConfig,
}

impl<'a> Orchestrator<'a> {
    /// Create an orchestrator over the given collaborators.
    pub fn new(
        resolver: &'a dyn ImageSource,
        detector: &'a dyn LandmarkDetector,
        config: MorphConfig,
    ) -> Self {
        Self {
            resolver,
            detector,
            config,
        }
    }

    /// Run the full morph: load, detect, synthesize, encode.
    ///
    /// Landmark absence on either side is a valid outcome selecting the
    /// simple-blend mode. A geometry failure during triangulation is also
    /// recovered by falling back to simple blend and is never surfaced.
    /// Loading and encoding failures abort the job.
    #[tracing::instrument(skip(self, sink, progress), fields(image_a = %request.image_a, image_b = %request.image_b))]
    pub fn run(
        &self,
        request: &MorphRequest,
        sink: &mut dyn FrameSink,
        progress: &dyn ProgressObserver,
    ) -> MorphResult<MorphOutcome> {
        // loading
        progress.report(0, 100, Stage::Loading);
        let frame_a = self.load(&request.image_a)?;
        let frame_b = self.load(&request.image_b)?;
        progress.report(100, 100, Stage::Loading);

        // detecting: always succeeds as a step and deterministically selects
        // the synthesis mode.
        progress.report(0, 100, Stage::Detecting);
        let landmarks_a = self.detector.detect(&frame_a);
        let landmarks_b = self.detector.detect(&frame_b);
        let plan = match (landmarks_a, landmarks_b) {
            (Some(a), Some(b)) => match self.build_face_plan(a, b) {
                Ok(plan) => plan,
                Err(e) => {
                    tracing::warn!("triangulation failed ({e}); falling back to simple blend");
                    MorphPlan::SimpleBlend
                }
            },
            _ => {
                tracing::debug!("no correspondence on at least one side; using simple blend");
                MorphPlan::SimpleBlend
            }
        };
        let mode = plan.mode();
        progress.report(100, 100, Stage::Detecting);
        tracing::info!(?mode, "synthesis mode selected");

        // warping / blending: one progress update per frame.
        let frames = synthesize(&frame_a, &frame_b, &plan, self.config.total_frames, progress)?;

        // encoding
        progress.report(0, 100, Stage::Encoding);
        sink.begin(SinkConfig {
            width: self.config.size.width,
            height: self.config.size.height,
            fps: self.config.fps,
        })?;
        for (idx, frame) in frames.iter().enumerate() {
            sink.push_frame(idx, frame)?;
        }
        sink.end()?;
        progress.report(100, 100, Stage::Encoding);
        tracing::info!(frames = frames.len(), out = %request.video_out.display(), "morph video encoded");

        Ok(MorphOutcome {
            video_path: request.video_out.clone(),
            frame_count: frames.len(),
            mode,
            frames,
        })
    }

    fn load(&self, reference: &str) -> MorphResult<FrameRgb> {
        self.resolver.load(reference, self.config.size).map_err(|e| {
            let cause = match e {
                MorphError::Load(msg) => msg,
                other => other.to_string(),
            };
            MorphError::load(format!("failed to load image '{reference}': {cause}"))
        })
    }

    fn build_face_plan(&self, raw_a: PointSet, raw_b: PointSet) -> MorphResult<MorphPlan> {
        let points_a = raw_a.with_boundary(self.config.size);
        let points_b = raw_b.with_boundary(self.config.size);
        let averaged = PointSet::midpoint(&points_a, &points_b)?;
        let triangles = delaunay(&averaged)?;
        Ok(MorphPlan::FaceWarp {
            points_a,
            points_b,
            triangles,
        })
    }
}
