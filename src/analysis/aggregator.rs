//! Per-frame sampling and summary aggregation for the analysis pass.

use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{Fps, FrameRgb};
use crate::foundation::error::{MorphError, MorphResult};
use crate::job::progress::{ProgressObserver, Stage};

use super::colormap::{overlay_heatmap, resize_bilinear};
use super::model::{AttentionModel, Prediction};

/// Sampling parameters of the analysis pass.
#[derive(Clone, Copy, Debug)]
pub struct AnalysisConfig {
    /// Number of frames sampled for the detailed report.
    pub detail_samples: usize,
    /// Stride of the statistics subsample (every n-th frame).
    pub stats_stride: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            detail_samples: 5,
            stats_stride: 5,
        }
    }
}

/// One entry of the detailed per-sample report.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct FrameSample {
    /// Index of the sampled frame.
    pub frame_index: usize,
    /// Normalized position of the sample in the sequence, `idx / (N-1)`.
    pub alpha: f32,
    /// Predicted class name at that frame.
    pub class_name: String,
    /// Prediction confidence.
    pub confidence: f32,
}

/// Cross-frame attention statistics.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct AnalysisSummary {
    /// Detailed report over evenly spaced sample frames.
    pub detailed_frames: Vec<FrameSample>,
    /// Distinct predicted classes over the statistics subsample, in first-seen order.
    pub unique_classes: Vec<String>,
    /// Number of distinct predicted classes over the subsample.
    pub num_class_changes: usize,
    /// Most frequent predicted class over the subsample.
    pub dominant_class: String,
}

/// Runs per-frame inference over a morph sequence, streams the attention
/// overlay video, and computes the textual analysis summary.
pub struct Aggregator<'a> {
    model: &'a dyn AttentionModel,
    config: AnalysisConfig,
}

impl<'a> Aggregator<'a> {
    /// Create an aggregator over an initialized model handle.
    pub fn new(model: &'a dyn AttentionModel, config: AnalysisConfig) -> Self {
        Self { model, config }
    }

    /// Analyze the full frame sequence.
    ///
    /// For every frame: classify, compute the heatmap for the top class,
    /// resize it to frame resolution, overlay, and push to `sink`. One
    /// progress report per processed frame, stage `Gradcam`. Per-frame
    /// predictions are computed once and reused by the detailed report and
    /// the statistics.
    pub fn analyze(
        &self,
        frames: &[FrameRgb],
        fps: Fps,
        sink: &mut dyn FrameSink,
        progress: &dyn ProgressObserver,
    ) -> MorphResult<AnalysisSummary> {
        if frames.is_empty() {
            return Err(MorphError::validation("cannot analyze an empty sequence"));
        }

        let size = frames[0].size();
        sink.begin(SinkConfig {
            width: size.width,
            height: size.height,
            fps,
        })?;

        let total = frames.len();
        let mut predictions: Vec<Prediction> = Vec::with_capacity(total);
        for (i, frame) in frames.iter().enumerate() {
            let prediction = self.model.classify(frame)?;
            let map = self.model.attention_map(frame, prediction.class_id)?;
            let resized = resize_bilinear(&map, frame.size());
            sink.push_frame(i, &overlay_heatmap(frame, &resized))?;
            predictions.push(prediction);
            progress.report((i + 1) as u64, total as u64, Stage::Gradcam);
        }
        sink.end()?;

        Ok(self.summarize(&predictions))
    }

    fn summarize(&self, predictions: &[Prediction]) -> AnalysisSummary {
        let total = predictions.len();

        let detailed_frames = sample_indices(total, self.config.detail_samples)
            .into_iter()
            .map(|idx| FrameSample {
                frame_index: idx,
                alpha: if total > 1 {
                    idx as f32 / (total - 1) as f32
                } else {
                    0.0
                },
                class_name: predictions[idx].class_name.clone(),
                confidence: predictions[idx].confidence,
            })
            .collect();

        let stride = self.config.stats_stride.max(1);
        let subsample: Vec<&str> = predictions
            .iter()
            .step_by(stride)
            .map(|p| p.class_name.as_str())
            .collect();

        let mut unique_classes: Vec<String> = Vec::new();
        for class in &subsample {
            if !unique_classes.iter().any(|c| c == class) {
                unique_classes.push((*class).to_owned());
            }
        }

        let dominant_class = unique_classes
            .iter()
            .max_by_key(|class| subsample.iter().filter(|c| **c == class.as_str()).count())
            .cloned()
            .unwrap_or_default();

        AnalysisSummary {
            num_class_changes: unique_classes.len(),
            unique_classes,
            dominant_class,
            detailed_frames,
        }
    }
}

/// Evenly spaced sample indices: `round(i * (N-1) / (K-1))` for `i` in `0..K`.
fn sample_indices(total: usize, samples: usize) -> Vec<usize> {
    if total == 0 || samples == 0 {
        return Vec::new();
    }
    if total == 1 {
        return vec![0; samples];
    }
    if samples == 1 {
        return vec![0];
    }
    (0..samples)
        .map(|i| {
            let pos = i as f64 * (total - 1) as f64 / (samples - 1) as f64;
            pos.round() as usize
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::model::AttentionMap;
    use crate::encode::sink::InMemorySink;
    use crate::foundation::core::FrameSize;
    use crate::job::progress::NoProgress;

    /// Predicts a class from the red channel of the top-left pixel.
    struct ThresholdModel;

    impl AttentionModel for ThresholdModel {
        fn classify(&self, frame: &FrameRgb) -> MorphResult<Prediction> {
            let red = frame.data[0];
            let (class_id, class_name) = if red >= 128 { (1, "ruddy") } else { (2, "dusky") };
            Ok(Prediction {
                class_id,
                class_name: class_name.into(),
                confidence: f32::from(red) / 255.0,
            })
        }

        fn attention_map(&self, _frame: &FrameRgb, _class_id: usize) -> MorphResult<AttentionMap> {
            AttentionMap::new(2, 2, vec![0.0, 0.25, 0.5, 1.0])
        }
    }

    fn solid(red: u8) -> FrameRgb {
        let size = FrameSize::new(8, 8).unwrap();
        let mut data = Vec::new();
        for _ in 0..size.pixel_count() {
            data.extend_from_slice(&[red, 0, 0]);
        }
        FrameRgb::from_raw(size, data).unwrap()
    }

    #[test]
    fn sample_indices_are_evenly_spaced() {
        assert_eq!(sample_indices(120, 5), vec![0, 30, 60, 89, 119]);
        assert_eq!(sample_indices(5, 5), vec![0, 1, 2, 3, 4]);
        assert_eq!(sample_indices(2, 5), vec![0, 0, 1, 1, 1]);
    }

    #[test]
    fn analyze_streams_one_overlay_per_frame() {
        let frames: Vec<FrameRgb> = (0..10).map(|i| solid(i * 25)).collect();
        let aggregator = Aggregator::new(&ThresholdModel, AnalysisConfig::default());
        let mut sink = InMemorySink::new();
        let summary = aggregator
            .analyze(&frames, Fps::new(30, 1).unwrap(), &mut sink, &NoProgress)
            .unwrap();

        assert_eq!(sink.frames().len(), 10);
        assert_eq!(summary.detailed_frames.len(), 5);
        // Frames 0..5 are "dusky" (red < 128), frames 6..10 "ruddy"; the
        // stride-5 subsample sees frames 0 and 5, i.e. dusky twice.
        assert_eq!(summary.unique_classes, vec!["dusky".to_string()]);
        assert_eq!(summary.num_class_changes, 1);
        assert_eq!(summary.dominant_class, "dusky");
    }

    #[test]
    fn detailed_samples_cover_normalized_positions() {
        let frames: Vec<FrameRgb> = (0..121).map(|i| solid((i * 2) as u8)).collect();
        let aggregator = Aggregator::new(&ThresholdModel, AnalysisConfig::default());
        let mut sink = InMemorySink::new();
        let summary = aggregator
            .analyze(&frames, Fps::new(30, 1).unwrap(), &mut sink, &NoProgress)
            .unwrap();

        let alphas: Vec<f32> = summary.detailed_frames.iter().map(|s| s.alpha).collect();
        assert_eq!(alphas, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn empty_sequence_is_rejected() {
        let aggregator = Aggregator::new(&ThresholdModel, AnalysisConfig::default());
        let mut sink = InMemorySink::new();
        assert!(aggregator
            .analyze(&[], Fps::new(30, 1).unwrap(), &mut sink, &NoProgress)
            .is_err());
    }
}
