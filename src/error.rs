use thiserror::Error;

pub type Dims = (usize, usize, usize);

#[derive(Debug, Error)]
pub enum ZoneError {
    #[error("invalid gland mask: {0}")]
    InvalidMask(String),

    #[error("shape mismatch in {context}: {left:?} vs {right:?}")]
    ShapeMismatch {
        context: String,
        left: Vec<usize>,
        right: Vec<usize>,
    },

    #[error("unsupported granularity: {0} (expected 20, 8, 4 or 2)")]
    UnsupportedGranularity(u32),

    #[error("invalid zone configuration: {0}")]
    InvalidConfig(String),
}

impl ZoneError {
    pub fn dims_mismatch(context: impl Into<String>, left: Dims, right: Dims) -> Self {
        ZoneError::ShapeMismatch {
            context: context.into(),
            left: vec![left.0, left.1, left.2],
            right: vec![right.0, right.1, right.2],
        }
    }
}
