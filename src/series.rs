//! Per-trial input series.
//!
//! All series are flattened row-major buffers as handed over by the
//! ingestion layer. Shapes are checked once, at construction and against
//! the [`SensorSchema`], so the calibration code can index without
//! re-validating.

use std::ops::Range;

use crate::config::{SensorSchema, QUATERNION_FIELD_WIDTH};
use crate::error::{CalibrationError, Result};
use crate::math::Quaternion;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Joint positions for one trial: `frames x joints x 3`, flattened.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawPositionSeries"))]
pub struct JointPositionSeries {
    data: Vec<f64>,
    joint_count: usize,
}

impl JointPositionSeries {
    /// Wrap a flattened buffer of `3 * joint_count` scalars per frame.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if `joint_count` is zero or the buffer
    /// length is not a multiple of the frame width.
    pub fn new(data: Vec<f64>, joint_count: usize) -> Result<Self> {
        let width = position_frame_width(joint_count)?;
        if data.len() % width != 0 {
            return Err(CalibrationError::shape_mismatch(
                "position buffer length (multiple of frame width)",
                (data.len() / width + 1) * width,
                data.len(),
            ));
        }
        Ok(Self { data, joint_count })
    }

    /// Build from one flattened row per frame.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if `joint_count` is invalid or any row is
    /// not `3 * joint_count` wide.
    pub fn from_frames<F: AsRef<[f64]>>(frames: &[F], joint_count: usize) -> Result<Self> {
        let width = position_frame_width(joint_count)?;
        let mut data = Vec::with_capacity(frames.len() * width);
        for frame in frames {
            let frame = frame.as_ref();
            if frame.len() != width {
                return Err(CalibrationError::shape_mismatch(
                    "position frame width",
                    width,
                    frame.len(),
                ));
            }
            data.extend_from_slice(frame);
        }
        Self::new(data, joint_count)
    }

    /// Check the joint count against the schema.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the counts disagree.
    pub fn check_schema(&self, schema: &SensorSchema) -> Result<()> {
        if self.joint_count != schema.joint_count {
            return Err(CalibrationError::shape_mismatch(
                "joint count",
                schema.joint_count,
                self.joint_count,
            ));
        }
        Ok(())
    }

    /// Number of frames.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.data.len() / self.frame_width()
    }

    /// Number of joints per frame.
    #[must_use]
    pub const fn joint_count(&self) -> usize {
        self.joint_count
    }

    /// Scalars per frame.
    #[must_use]
    pub const fn frame_width(&self) -> usize {
        3 * self.joint_count
    }

    /// Flattened row of one frame.
    #[must_use]
    pub fn frame(&self, index: usize) -> &[f64] {
        let width = self.frame_width();
        &self.data[index * width..(index + 1) * width]
    }

    /// Position of `joint` in `frame`.
    #[must_use]
    pub fn joint(&self, frame: usize, joint: usize) -> [f64; 3] {
        let start = frame * self.frame_width() + 3 * joint;
        [self.data[start], self.data[start + 1], self.data[start + 2]]
    }

    /// The whole flattened buffer.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Mutable access for in-crate rotation.
    pub(crate) fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Take back the flattened buffer.
    #[must_use]
    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }
}

/// Scalars per position frame for `joint_count` joints.
fn position_frame_width(joint_count: usize) -> Result<usize> {
    match joint_count.checked_mul(3) {
        Some(0) => Err(CalibrationError::shape_mismatch("joint count", 1, 0)),
        Some(width) => Ok(width),
        None => Err(CalibrationError::shape_mismatch(
            "joint count",
            usize::MAX / 3,
            joint_count,
        )),
    }
}

/// Unchecked wire form of [`JointPositionSeries`].
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawPositionSeries {
    data: Vec<f64>,
    joint_count: usize,
}

#[cfg(feature = "serde")]
impl TryFrom<RawPositionSeries> for JointPositionSeries {
    type Error = CalibrationError;

    fn try_from(raw: RawPositionSeries) -> Result<Self> {
        Self::new(raw.data, raw.joint_count)
    }
}

/// Per-frame orientation records holding several segment quaternions.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawOrientationSeries"))]
pub struct OrientationSeries {
    data: Vec<f64>,
    record_width: usize,
}

/// Unchecked wire form of [`OrientationSeries`].
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawOrientationSeries {
    data: Vec<f64>,
    record_width: usize,
}

#[cfg(feature = "serde")]
impl TryFrom<RawOrientationSeries> for OrientationSeries {
    type Error = CalibrationError;

    fn try_from(raw: RawOrientationSeries) -> Result<Self> {
        Self::new(raw.data, raw.record_width)
    }
}

impl OrientationSeries {
    /// Wrap a flattened buffer of `record_width` scalars per frame.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if `record_width` is smaller than one
    /// quaternion or the buffer length is not a multiple of it.
    pub fn new(data: Vec<f64>, record_width: usize) -> Result<Self> {
        if record_width < QUATERNION_FIELD_WIDTH {
            return Err(CalibrationError::shape_mismatch(
                "orientation record width",
                QUATERNION_FIELD_WIDTH,
                record_width,
            ));
        }
        if data.len() % record_width != 0 {
            return Err(CalibrationError::shape_mismatch(
                "orientation buffer length (multiple of record width)",
                (data.len() / record_width + 1) * record_width,
                data.len(),
            ));
        }
        Ok(Self { data, record_width })
    }

    /// Build from one record per frame.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the records have different widths.
    pub fn from_frames<F: AsRef<[f64]>>(frames: &[F]) -> Result<Self> {
        let record_width = frames.first().map_or(0, |f| f.as_ref().len());
        let mut data = Vec::with_capacity(frames.len() * record_width);
        for frame in frames {
            let frame = frame.as_ref();
            if frame.len() != record_width {
                return Err(CalibrationError::shape_mismatch(
                    "orientation record width",
                    record_width,
                    frame.len(),
                ));
            }
            data.extend_from_slice(frame);
        }
        Self::new(data, record_width)
    }

    /// Check the record width against the schema.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the widths disagree.
    pub fn check_schema(&self, schema: &SensorSchema) -> Result<()> {
        if self.record_width != schema.orientation_width {
            return Err(CalibrationError::shape_mismatch(
                "orientation record width",
                schema.orientation_width,
                self.record_width,
            ));
        }
        Ok(())
    }

    /// Number of frames.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.data.len() / self.record_width
    }

    /// Scalars per record.
    #[must_use]
    pub const fn record_width(&self) -> usize {
        self.record_width
    }

    /// Record of one frame.
    #[must_use]
    pub fn record(&self, index: usize) -> &[f64] {
        &self.data[index * self.record_width..(index + 1) * self.record_width]
    }

    /// Raw (not normalized) quaternion stored at `offset` in `frame`.
    #[must_use]
    pub fn quaternion(&self, frame: usize, offset: usize) -> Quaternion {
        Quaternion::from_slice(&self.record(frame)[offset..offset + QUATERNION_FIELD_WIDTH])
    }

    /// The whole flattened buffer.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Mutable access for in-crate rotation.
    pub(crate) fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Take back the flattened buffer.
    #[must_use]
    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }
}

/// Non-empty, sorted, duplicate-free set of resting-frame indices.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<usize>"))]
#[cfg_attr(feature = "serde", serde(into = "Vec<usize>"))]
pub struct FrameIndexSet {
    indices: Vec<usize>,
}

impl FrameIndexSet {
    /// Build from arbitrary indices; order and duplicates are discarded.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `indices` is empty.
    pub fn new(mut indices: Vec<usize>) -> Result<Self> {
        if indices.is_empty() {
            return Err(CalibrationError::configuration(
                "resting-frame set is empty",
            ));
        }
        indices.sort_unstable();
        indices.dedup();
        Ok(Self { indices })
    }

    /// Build from a contiguous frame range.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the range is empty.
    pub fn from_range(range: Range<usize>) -> Result<Self> {
        Self::new(range.collect())
    }

    /// Check every index against a series length.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` for the largest offending index.
    pub fn check_bounds(&self, len: usize) -> Result<()> {
        match self.indices.last() {
            Some(&last) if last >= len => Err(CalibrationError::index_out_of_range(last, len)),
            _ => Ok(()),
        }
    }

    /// Number of distinct frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Always false for a constructed set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }

    /// Indices in ascending order.
    #[must_use]
    pub fn as_slice(&self) -> &[usize] {
        &self.indices
    }
}

impl TryFrom<Vec<usize>> for FrameIndexSet {
    type Error = CalibrationError;

    fn try_from(indices: Vec<usize>) -> Result<Self> {
        Self::new(indices)
    }
}

impl From<FrameIndexSet> for Vec<usize> {
    fn from(set: FrameIndexSet) -> Self {
        set.indices
    }
}

/// Twist direction convention of a trial.
///
/// Selects which horizontal axis the hip vector is aligned with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MoveOrientation {
    /// Sign `+1`: target `(0, -1, 0)`.
    Positive,
    /// Sign `-1`: target `(0, 1, 0)`.
    Negative,
}

impl MoveOrientation {
    /// Parse the external `+1`/`-1` convention from a float.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for any value other than exactly
    /// `1.0` or `-1.0`.
    #[allow(clippy::float_cmp)]
    pub fn from_sign(sign: f64) -> Result<Self> {
        if sign == 1.0 {
            Ok(Self::Positive)
        } else if sign == -1.0 {
            Ok(Self::Negative)
        } else {
            Err(CalibrationError::configuration(format!(
                "move orientation sign must be 1 or -1, got {sign}"
            )))
        }
    }

    /// The `+1`/`-1` value.
    #[must_use]
    pub const fn sign(self) -> i32 {
        match self {
            Self::Positive => 1,
            Self::Negative => -1,
        }
    }

    /// Horizontal direction the hip vector should point along.
    #[must_use]
    pub const fn target_vector(self) -> [f64; 3] {
        match self {
            Self::Positive => [0.0, -1.0, 0.0],
            Self::Negative => [0.0, 1.0, 0.0],
        }
    }
}

impl TryFrom<i32> for MoveOrientation {
    type Error = CalibrationError;

    fn try_from(sign: i32) -> Result<Self> {
        match sign {
            1 => Ok(Self::Positive),
            -1 => Ok(Self::Negative),
            other => Err(CalibrationError::configuration(format!(
                "move orientation sign must be 1 or -1, got {other}"
            ))),
        }
    }
}

impl TryFrom<f64> for MoveOrientation {
    type Error = CalibrationError;

    fn try_from(sign: f64) -> Result<Self> {
        Self::from_sign(sign)
    }
}
