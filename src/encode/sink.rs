//! Frame sink trait, factories, and in-memory/discard sinks.

use std::path::Path;

use crate::foundation::core::{Fps, FrameRgb};
use crate::foundation::error::MorphResult;

/// Configuration provided to a [`FrameSink`] at the start of a sequence.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frames-per-second.
    pub fps: Fps,
}

/// Sink contract for consuming produced frames in sequence order.
///
/// Ordering contract: `push_frame` is called with strictly increasing `idx`.
pub trait FrameSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> MorphResult<()>;
    /// Push one frame in strictly increasing sequence order.
    fn push_frame(&mut self, idx: usize, frame: &FrameRgb) -> MorphResult<()>;
    /// Called once after the last frame is pushed.
    fn end(&mut self) -> MorphResult<()>;
}

/// Creates one sink per output video.
///
/// The job manager encodes two videos per job (morph and attention overlay);
/// the factory seam lets tests substitute non-encoding sinks.
pub trait SinkFactory: Send + Sync {
    /// Create a sink that will write to `out_path`.
    fn create(&self, out_path: &Path) -> Box<dyn FrameSink>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(usize, FrameRgb)>,
}

impl InMemorySink {
    /// Create a new in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the sink configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg.clone()
    }

    /// Borrow the captured frames.
    pub fn frames(&self) -> &[(usize, FrameRgb)] {
        &self.frames
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> MorphResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        Ok(())
    }

    fn push_frame(&mut self, idx: usize, frame: &FrameRgb) -> MorphResult<()> {
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> MorphResult<()> {
        Ok(())
    }
}

/// Sink that validates the ordering contract and discards frame data.
///
/// Useful when a test exercises the job lifecycle but has no interest in the
/// encoded output.
#[derive(Debug, Default)]
pub struct DiscardSink {
    last_idx: Option<usize>,
    /// Number of frames received.
    pub pushed: usize,
}

impl FrameSink for DiscardSink {
    fn begin(&mut self, _cfg: SinkConfig) -> MorphResult<()> {
        self.last_idx = None;
        self.pushed = 0;
        Ok(())
    }

    fn push_frame(&mut self, idx: usize, _frame: &FrameRgb) -> MorphResult<()> {
        if let Some(last) = self.last_idx {
            if idx <= last {
                return Err(crate::foundation::error::MorphError::encode(
                    "sink received out-of-order frame index",
                ));
            }
        }
        self.last_idx = Some(idx);
        self.pushed += 1;
        Ok(())
    }

    fn end(&mut self) -> MorphResult<()> {
        Ok(())
    }
}

/// Factory producing [`DiscardSink`]s.
pub struct DiscardSinkFactory;

impl SinkFactory for DiscardSinkFactory {
    fn create(&self, _out_path: &Path) -> Box<dyn FrameSink> {
        Box::new(DiscardSink::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::FrameSize;

    fn frame() -> FrameRgb {
        FrameRgb::from_raw(FrameSize::new(2, 2).unwrap(), vec![7; 12]).unwrap()
    }

    #[test]
    fn in_memory_sink_captures_frames_in_order() {
        let mut sink = InMemorySink::new();
        sink.begin(SinkConfig {
            width: 2,
            height: 2,
            fps: Fps::new(30, 1).unwrap(),
        })
        .unwrap();
        sink.push_frame(0, &frame()).unwrap();
        sink.push_frame(1, &frame()).unwrap();
        sink.end().unwrap();
        assert_eq!(sink.frames().len(), 2);
        assert_eq!(sink.frames()[1].0, 1);
    }

    #[test]
    fn discard_sink_rejects_out_of_order_frames() {
        let mut sink = DiscardSink::default();
        sink.begin(SinkConfig {
            width: 2,
            height: 2,
            fps: Fps::new(30, 1).unwrap(),
        })
        .unwrap();
        sink.push_frame(1, &frame()).unwrap();
        assert!(sink.push_frame(1, &frame()).is_err());
    }
}
