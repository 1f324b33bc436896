//! Configuration for trial calibration.
//!
//! This module provides [`CalibrationConfig`], which centralizes the sensor
//! schema and numerical thresholds, along with a preset for the 23-segment
//! inertial suit the recordings come from.
//!
//! # Example
//!
//! ```
//! use orientation_calibration::{CalibrationConfig, QuaternionSignPolicy};
//!
//! let config = CalibrationConfig::xsens()
//!     .with_quaternion_sign(QuaternionSignPolicy::NonNegativeScalar)
//!     .with_parallel(false);
//! assert!(config.validate().is_ok());
//! ```

use crate::error::{CalibrationError, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of floats in one quaternion field (w, x, y, z).
pub const QUATERNION_FIELD_WIDTH: usize = 4;

/// Fixed joint and field layout of the external motion-capture export.
///
/// Position frames are flattened as `3 * joint_count` scalars. Orientation
/// records are `orientation_width` scalars holding scalar-first quaternions
/// at fixed offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SensorSchema {
    /// Number of joints per position frame.
    pub joint_count: usize,

    /// Joint index of the left hip.
    pub left_hip: usize,

    /// Joint index of the right hip.
    pub right_hip: usize,

    /// Joint index of the landmark above the hips, used to find "up".
    pub vertical_reference: usize,

    /// Number of scalars per orientation record.
    pub orientation_width: usize,

    /// Offset of the thorax quaternion inside an orientation record.
    pub thorax_offset: usize,

    /// Offset of the head quaternion inside an orientation record.
    pub head_offset: usize,
}

impl SensorSchema {
    /// Layout of the 23-segment suit export.
    pub const XSENS: Self = Self {
        joint_count: 23,
        left_hip: 15,
        right_hip: 19,
        vertical_reference: 0,
        orientation_width: 23 * QUATERNION_FIELD_WIDTH,
        thorax_offset: 16,
        head_offset: 24,
    };

    /// Number of scalars in one flattened position frame.
    #[must_use]
    pub const fn position_width(&self) -> usize {
        3 * self.joint_count
    }

    /// Validate the schema.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a joint index falls outside the
    /// joint count, the hip joints coincide, or a quaternion field does not
    /// fit in the record.
    pub fn validate(&self) -> Result<()> {
        if self.joint_count == 0 {
            return Err(CalibrationError::configuration(
                "joint_count must be positive",
            ));
        }
        if self.joint_count.checked_mul(3).is_none() {
            return Err(CalibrationError::configuration(format!(
                "joint_count {} overflows the position frame width",
                self.joint_count
            )));
        }
        for (name, index) in [
            ("left_hip", self.left_hip),
            ("right_hip", self.right_hip),
            ("vertical_reference", self.vertical_reference),
        ] {
            if index >= self.joint_count {
                return Err(CalibrationError::configuration(format!(
                    "{name} joint {index} outside joint_count {}",
                    self.joint_count
                )));
            }
        }
        if self.left_hip == self.right_hip {
            return Err(CalibrationError::configuration(
                "left_hip and right_hip must be distinct joints",
            ));
        }
        for (name, offset) in [("thorax", self.thorax_offset), ("head", self.head_offset)] {
            let fits = offset
                .checked_add(QUATERNION_FIELD_WIDTH)
                .is_some_and(|end| end <= self.orientation_width);
            if !fits {
                return Err(CalibrationError::configuration(format!(
                    "{name} quaternion at offset {offset} exceeds record width {}",
                    self.orientation_width
                )));
            }
        }
        if self.thorax_offset.abs_diff(self.head_offset) < QUATERNION_FIELD_WIDTH {
            return Err(CalibrationError::configuration(
                "thorax and head quaternion fields overlap",
            ));
        }
        Ok(())
    }
}

impl Default for SensorSchema {
    fn default() -> Self {
        Self::XSENS
    }
}

/// Sign convention applied to rotated quaternions.
///
/// `q` and `-q` encode the same rotation, so the output sign is a choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum QuaternionSignPolicy {
    /// Every frame independently gets `w >= 0`.
    NonNegativeScalar,
    /// First frame gets `w >= 0`; later frames take the sign closest to the
    /// previous frame's output for the same segment.
    #[default]
    Continuous,
}

/// Configuration for trial calibration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CalibrationConfig {
    /// Joint and field layout of the input arrays.
    pub schema: SensorSchema,

    /// Norms at or below this are treated as zero.
    /// Applies to the horizontal hip vector and raw quaternions.
    pub degeneracy_eps: f64,

    /// Output quaternion sign convention.
    pub quaternion_sign: QuaternionSignPolicy,

    /// Rotate frames on the rayon thread pool.
    pub parallel: bool,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            schema: SensorSchema::XSENS,
            degeneracy_eps: 1e-9,
            quaternion_sign: QuaternionSignPolicy::Continuous,
            parallel: true,
        }
    }
}

impl CalibrationConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Preset for the 23-segment inertial suit.
    #[must_use]
    pub fn xsens() -> Self {
        Self::default()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema is invalid or the epsilon is not a
    /// positive finite number.
    pub fn validate(&self) -> Result<()> {
        if !(self.degeneracy_eps.is_finite() && self.degeneracy_eps > 0.0) {
            return Err(CalibrationError::configuration(
                "degeneracy_eps must be positive and finite",
            ));
        }
        self.schema.validate()
    }

    /// Set the sensor schema.
    #[must_use]
    pub const fn with_schema(mut self, schema: SensorSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Set the degeneracy threshold.
    #[must_use]
    pub const fn with_degeneracy_eps(mut self, eps: f64) -> Self {
        self.degeneracy_eps = eps;
        self
    }

    /// Set the quaternion sign policy.
    #[must_use]
    pub const fn with_quaternion_sign(mut self, policy: QuaternionSignPolicy) -> Self {
        self.quaternion_sign = policy;
        self
    }

    /// Enable/disable per-frame parallelism.
    #[must_use]
    pub const fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}
