//! Landmark detector trait and built-in providers.

use crate::foundation::core::FrameRgb;
use crate::geometry::PointSet;

/// Correspondence provider: detects an ordered landmark set on one image.
///
/// `None` is a valid, non-exceptional outcome meaning "no correspondence
/// available"; the orchestrator then falls back to a plain cross-dissolve.
/// Implementations behind this seam (a face-mesh model, a fixture file, a
/// test fake) must return the same landmark ordering for every image they
/// process, since the two sets of one job are matched index-by-index.
pub trait LandmarkDetector: Send + Sync {
    /// Detect landmarks on `frame`, or report that none are present.
    fn detect(&self, frame: &FrameRgb) -> Option<PointSet>;
}

/// Detector that never finds landmarks; every job becomes a simple blend.
pub struct NoLandmarks;

impl LandmarkDetector for NoLandmarks {
    fn detect(&self, _frame: &FrameRgb) -> Option<PointSet> {
        None
    }
}

/// Detector returning pre-computed landmark sets in submission order.
///
/// Used by the CLI to feed externally produced landmarks (one set per source
/// image) and by tests as a deterministic fake. Calls beyond the provided
/// sets report no landmarks.
pub struct StaticLandmarks {
    sets: Vec<Option<PointSet>>,
    next: std::sync::atomic::AtomicUsize,
}

impl StaticLandmarks {
    /// Create a detector that hands out `sets` one call at a time.
    pub fn new(sets: Vec<Option<PointSet>>) -> Self {
        Self {
            sets,
            next: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Convenience: the same landmark set for every call.
    pub fn repeating(set: PointSet) -> Self {
        Self {
            sets: vec![Some(set)],
            next: std::sync::atomic::AtomicUsize::new(usize::MAX),
        }
    }
}

impl LandmarkDetector for StaticLandmarks {
    fn detect(&self, _frame: &FrameRgb) -> Option<PointSet> {
        use std::sync::atomic::Ordering;
        if self.next.load(Ordering::Relaxed) == usize::MAX {
            return self.sets.first().cloned().flatten();
        }
        let idx = self.next.fetch_add(1, Ordering::Relaxed);
        self.sets.get(idx).cloned().flatten()
    }
}
