//! Error types for detection, training and evaluation.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors reported by the pedhog core.
///
/// Every variant is recoverable: callers can fix the input and retry.
/// Session state (classifier, metrics) is never modified by a failing call.
#[derive(Debug, Error)]
pub enum Error {
    /// A file or directory could not be read or written.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Path that was being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An image could not be decoded or encoded.
    #[error("image error on {}: {source}", path.display())]
    Image {
        /// Path of the image.
        path: PathBuf,
        /// Underlying codec error.
        #[source]
        source: image::ImageError,
    },

    /// A model or annotation file is malformed.
    #[error("format error in {}:{line}: {message}", path.display())]
    Format {
        /// File being parsed.
        path: PathBuf,
        /// 1-based line number, or 0 when the problem is not tied to a line.
        line: usize,
        /// Human readable description.
        message: String,
    },

    /// Descriptor length does not match the classifier's feature count.
    #[error("dimension mismatch: classifier expects {expected} features, descriptor has {actual}")]
    DimensionMismatch {
        /// Feature count of the classifier.
        expected: usize,
        /// Length of the offending descriptor.
        actual: usize,
    },

    /// The descriptor window does not fit inside the cell grid.
    #[error(
        "window at cell offset {offset} needs {needed_cols}x{needed_rows} cells, grid is {cols}x{rows}"
    )]
    WindowOutOfBounds {
        /// Horizontal cell offset of the window.
        offset: usize,
        /// Columns required from the offset onwards.
        needed_cols: usize,
        /// Rows required.
        needed_rows: usize,
        /// Columns available.
        cols: usize,
        /// Rows available.
        rows: usize,
    },

    /// Training was requested with no examples.
    #[error("training set is empty")]
    EmptyTrainingSet,

    /// An operation needs a classifier but none has been trained or loaded.
    #[error("no classifier: train or load a model first")]
    NoClassifier,

    /// The linear solver rejected its input or failed to produce a model.
    #[error("solver error: {0}")]
    Solver(String),

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Configuration JSON could not be parsed.
    #[error("configuration parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Wraps an I/O error with the path it occurred on.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Wraps an image codec error with the path it occurred on.
    pub fn image(path: impl AsRef<Path>, source: image::ImageError) -> Self {
        Self::Image {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Creates a format error for `path` at 1-based `line`.
    pub fn format(path: impl AsRef<Path>, line: usize, message: impl Into<String>) -> Self {
        Self::Format {
            path: path.as_ref().to_path_buf(),
            line,
            message: message.into(),
        }
    }

    /// Creates a dimension mismatch error.
    #[must_use]
    pub const fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
