use thiserror::Error;

use crate::attribute::Attribute;

/// Errors raised by the point cloud data model
#[derive(Debug, Error)]
pub enum PointCloudError {
    #[error("invalid buffer dimensions {rows}x{cols}")]
    InvalidDimensions { rows: i64, cols: i64 },

    #[error("index ({row}, {col}) out of range for {rows}x{cols} buffer")]
    IndexOutOfRange {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("invalid sampling domain: {0}")]
    InvalidDomain(String),

    #[error("missing parameter `{0}`")]
    MissingParameter(String),

    #[error("parameter `{name}` holds {stored}, requested {requested}")]
    TypeMismatch {
        name: String,
        stored: &'static str,
        requested: &'static str,
    },

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("point cloud has no {0:?} attribute")]
    MissingAttribute(Attribute),

    #[error(transparent)]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PointCloudError>;
