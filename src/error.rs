//! Error types for calibration operations.
//!
//! Every failure is deterministic and input-dependent, so callers get a typed
//! error instead of NaN-filled output.

use thiserror::Error;

/// Main error type for calibration operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalibrationError {
    /// Invalid caller-supplied configuration (move sign, empty resting set, schema).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A computation hit a degenerate or non-finite value.
    #[error("Numeric degeneracy: {context}")]
    NumericDegeneracy { context: String },

    /// Array dimensions disagree with the sensor schema.
    #[error("Shape mismatch in {what}: expected {expected}, got {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A resting-frame index points past the end of its series.
    #[error("Frame index {index} out of range for series of {len} frames")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Coarse failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid sign, empty index set or invalid schema.
    Configuration,
    /// Zero-length vectors, zero-norm quaternions, singular conversions.
    NumericDegeneracy,
    /// Inputs inconsistent with the joint/segment schema.
    ShapeMismatch,
}

/// Result type alias for calibration operations.
pub type Result<T> = std::result::Result<T, CalibrationError>;

impl CalibrationError {
    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a numeric degeneracy error.
    #[must_use]
    pub fn numeric_degeneracy(context: impl Into<String>) -> Self {
        Self::NumericDegeneracy {
            context: context.into(),
        }
    }

    /// Create a shape mismatch error.
    #[must_use]
    pub const fn shape_mismatch(what: &'static str, expected: usize, actual: usize) -> Self {
        Self::ShapeMismatch {
            what,
            expected,
            actual,
        }
    }

    /// Create an index out of range error.
    #[must_use]
    pub const fn index_out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }

    /// The failure category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::NumericDegeneracy { .. } => ErrorKind::NumericDegeneracy,
            Self::ShapeMismatch { .. } | Self::IndexOutOfRange { .. } => ErrorKind::ShapeMismatch,
        }
    }
}
