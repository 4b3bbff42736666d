//! Crate-wide error taxonomy and result alias.

/// Crate-wide result alias.
pub type MorphResult<T> = Result<T, MorphError>;

/// Error taxonomy for the morphing pipeline.
///
/// The variants mirror the pipeline stages that can fail: source loading,
/// triangulation geometry, video encoding, and classifier inference.
/// `Validation` covers precondition failures at API boundaries.
#[derive(thiserror::Error, Debug)]
pub enum MorphError {
    /// Source image could not be read or decoded.
    #[error("load error: {0}")]
    Load(String),

    /// Degenerate or mismatched point sets during triangulation.
    #[error("geometry error: {0}")]
    Geometry(String),

    /// Video encoding I/O failure.
    #[error("encode error: {0}")]
    Encode(String),

    /// Classifier collaborator failure.
    #[error("inference error: {0}")]
    Inference(String),

    /// Precondition failure at an API boundary.
    #[error("validation error: {0}")]
    Validation(String),

    /// Any other error, preserved with its source chain.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MorphError {
    /// Build a [`MorphError::Load`].
    pub fn load(msg: impl Into<String>) -> Self {
        Self::Load(msg.into())
    }

    /// Build a [`MorphError::Geometry`].
    pub fn geometry(msg: impl Into<String>) -> Self {
        Self::Geometry(msg.into())
    }

    /// Build a [`MorphError::Encode`].
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`MorphError::Inference`].
    pub fn inference(msg: impl Into<String>) -> Self {
        Self::Inference(msg.into())
    }

    /// Build a [`MorphError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(MorphError::load("x").to_string().contains("load error:"));
        assert!(MorphError::geometry("x")
            .to_string()
            .contains("geometry error:"));
        assert!(MorphError::encode("x").to_string().contains("encode error:"));
        assert!(MorphError::inference("x")
            .to_string()
            .contains("inference error:"));
        assert!(MorphError::validation("x")
            .to_string()
            .contains("validation error:"));
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = MorphError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
