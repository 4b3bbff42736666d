//! Frame sinks and the ffmpeg-backed MP4 encoder.

pub mod ffmpeg;
pub mod sink;

pub use ffmpeg::{FfmpegSink, FfmpegSinkFactory, FfmpegSinkOpts};
pub use sink::{DiscardSink, DiscardSinkFactory, FrameSink, InMemorySink, SinkConfig, SinkFactory};
