//! Attention model trait and lazy-loading wrapper.

use std::sync::Mutex;

use crate::foundation::core::FrameRgb;
use crate::foundation::error::{MorphError, MorphResult};

/// A classifier's top prediction for one frame.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Prediction {
    /// Class index in the model's label space.
    pub class_id: usize,
    /// Human-readable class name.
    pub class_name: String,
    /// Softmax confidence in `[0, 1]`.
    pub confidence: f32,
}

/// A per-pixel importance map produced by the classifier for one class.
///
/// Values are normalized to `[0, 1]`; resolution is model-defined and is
/// resized to frame resolution by the aggregator.
#[derive(Clone, Debug)]
pub struct AttentionMap {
    /// Map width in cells.
    pub width: u32,
    /// Map height in cells.
    pub height: u32,
    /// Row-major importance scores.
    pub data: Vec<f32>,
}

impl AttentionMap {
    /// Create a map, validating the buffer length.
    pub fn new(width: u32, height: u32, data: Vec<f32>) -> MorphResult<Self> {
        if data.len() != width as usize * height as usize {
            return Err(MorphError::validation(
                "attention map buffer length must be width * height",
            ));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }
}

/// Classifier + saliency collaborator consumed by the attention aggregator.
///
/// Implementations wrap a pretrained convolutional network and its
/// gradient-based attention computation; this crate only depends on the
/// input/output contract.
pub trait AttentionModel: Send + Sync {
    /// Predict the top class for `frame`.
    fn classify(&self, frame: &FrameRgb) -> MorphResult<Prediction>;
    /// Compute the attention heatmap of `frame` for `class_id`.
    fn attention_map(&self, frame: &FrameRgb, class_id: usize) -> MorphResult<AttentionMap>;
}

/// Lazily initialized, process-wide model handle.
///
/// The underlying model is constructed on first use, exactly once, even under
/// concurrent first uses. All inference access is serialized through the same
/// mutex: overlapping jobs block on each other's calls instead of sharing a
/// live forward pass, since the wrapped model is treated as not reentrant.
pub struct LazyModel<M> {
    slot: Mutex<Option<M>>,
    factory: Box<dyn Fn() -> MorphResult<M> + Send + Sync>,
}

impl<M> LazyModel<M> {
    /// Create a handle that will build the model with `factory` on first use.
    pub fn new(factory: impl Fn() -> MorphResult<M> + Send + Sync + 'static) -> Self {
        Self {
            slot: Mutex::new(None),
            factory: Box::new(factory),
        }
    }

    /// Return `true` once the model has been constructed.
    pub fn is_initialized(&self) -> bool {
        self.slot.lock().map(|slot| slot.is_some()).unwrap_or(false)
    }

    fn with_model<R>(&self, op: impl FnOnce(&M) -> MorphResult<R>) -> MorphResult<R> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| MorphError::inference("model mutex poisoned"))?;
        if slot.is_none() {
            tracing::info!("initializing attention model");
            *slot = Some((self.factory)()?);
        }
        let model = slot
            .as_ref()
            .ok_or_else(|| MorphError::inference("model slot empty after initialization"))?;
        op(model)
    }
}

impl<M: AttentionModel> AttentionModel for LazyModel<M> {
    fn classify(&self, frame: &FrameRgb) -> MorphResult<Prediction> {
        self.with_model(|m| m.classify(frame))
    }

    fn attention_map(&self, frame: &FrameRgb, class_id: usize) -> MorphResult<AttentionMap> {
        self.with_model(|m| m.attention_map(frame, class_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::FrameSize;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingModel;

    impl AttentionModel for CountingModel {
        fn classify(&self, _frame: &FrameRgb) -> MorphResult<Prediction> {
            Ok(Prediction {
                class_id: 1,
                class_name: "tabby".into(),
                confidence: 0.9,
            })
        }

        fn attention_map(&self, _frame: &FrameRgb, _class_id: usize) -> MorphResult<AttentionMap> {
            AttentionMap::new(2, 2, vec![0.0, 0.5, 0.5, 1.0])
        }
    }

    fn frame() -> FrameRgb {
        FrameRgb::from_raw(FrameSize::new(2, 2).unwrap(), vec![0; 12]).unwrap()
    }

    #[test]
    fn lazy_model_initializes_exactly_once_across_threads() {
        let inits = Arc::new(AtomicUsize::new(0));
        let counter = inits.clone();
        let lazy = Arc::new(LazyModel::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(CountingModel)
        }));
        assert!(!lazy.is_initialized());

        let mut handles = Vec::new();
        for _ in 0..4 {
            let lazy = lazy.clone();
            handles.push(std::thread::spawn(move || {
                lazy.classify(&frame()).unwrap();
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(inits.load(Ordering::SeqCst), 1);
        assert!(lazy.is_initialized());
    }

    #[test]
    fn factory_failure_surfaces_and_allows_retry() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let lazy = LazyModel::new(move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(MorphError::inference("weights missing"))
            } else {
                Ok(CountingModel)
            }
        });

        assert!(lazy.classify(&frame()).is_err());
        assert!(lazy.classify(&frame()).is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn attention_map_validates_length() {
        assert!(AttentionMap::new(2, 2, vec![0.0; 3]).is_err());
    }
}
