//! Frame alignment: the yaw rotation that turns a trial's resting pelvis
//! towards a canonical heading.
//!
//! # Algorithm
//!
//! 1. Average `left_hip - right_hip` over the resting frames (hip vector)
//! 2. Average `vertical_reference - hip midpoint` over the same frames
//! 3. `front = hip x vertical`, used only to pick the rotation direction
//! 4. Drop the vertical component of the hip vector
//! 5. Target is `(0, -1, 0)` for sign `+1`, `(0, 1, 0)` for sign `-1`
//! 6. `angle = acos(clamp(cos(hip, target)))`
//! 7. Negate the angle when `front.x < 0`
//! 8. `R = yaw(angle)`

use log::{debug, info};

use crate::config::{CalibrationConfig, SensorSchema};
use crate::error::{CalibrationError, Result};
use crate::math::linalg::{
    angle_between, cross3, midpoint3, norm3, project_horizontal, sub3, RotationMatrix,
};
use crate::series::{FrameIndexSet, JointPositionSeries, MoveOrientation};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Rotation and the resting geometry it was derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AlignmentResult {
    /// Yaw rotation to apply to the whole trial.
    pub rotation: RotationMatrix,

    /// Signed yaw angle of `rotation` in radians, in `[-pi, pi]`.
    pub angle: f64,

    /// Mean resting hip vector with its vertical component removed.
    pub hip_vector: [f64; 3],

    /// Mean resting vector from hip midpoint to the vertical landmark.
    pub vertical_vector: [f64; 3],

    /// `hip x vertical` computed before the horizontal projection.
    pub front_vector: [f64; 3],

    /// Horizontal direction selected by the move orientation.
    pub target: [f64; 3],
}

impl AlignmentResult {
    /// Alignment angle in degrees.
    #[must_use]
    pub fn angle_degrees(&self) -> f64 {
        self.angle.to_degrees()
    }
}

/// Compute the canonical yaw rotation of one trial.
///
/// # Arguments
///
/// * `positions` - Joint position series of the trial
/// * `resting_frames` - Quiescent frames to sample the pelvis geometry from
/// * `orientation` - Twist direction convention of the trial
/// * `config` - Calibration configuration (schema and thresholds)
///
/// # Errors
///
/// Returns an error if:
/// - The configuration is invalid
/// - The joint count disagrees with the schema, or a resting index is out of range
/// - A sampled joint position is non-finite
/// - The horizontal hip vector has (near) zero length
///
/// # Example
///
/// ```
/// use orientation_calibration::{
///     compute_alignment, CalibrationConfig, FrameIndexSet, JointPositionSeries,
///     MoveOrientation, SensorSchema,
/// };
///
/// let schema = SensorSchema::XSENS;
/// let mut frame = vec![0.0; schema.position_width()];
/// frame[3 * schema.left_hip..3 * schema.left_hip + 3].copy_from_slice(&[0.0, -0.1, 1.0]);
/// frame[3 * schema.right_hip..3 * schema.right_hip + 3].copy_from_slice(&[0.0, 0.1, 1.0]);
/// frame[3 * schema.vertical_reference..3 * schema.vertical_reference + 3]
///     .copy_from_slice(&[0.0, 0.0, 1.5]);
///
/// let positions = JointPositionSeries::from_frames(&[frame], schema.joint_count)?;
/// let resting = FrameIndexSet::from_range(0..1)?;
/// let result = compute_alignment(
///     &positions,
///     &resting,
///     MoveOrientation::Positive,
///     &CalibrationConfig::xsens(),
/// )?;
/// assert!(result.angle.abs() < 1e-12);
/// # Ok::<(), orientation_calibration::CalibrationError>(())
/// ```
pub fn compute_alignment(
    positions: &JointPositionSeries,
    resting_frames: &FrameIndexSet,
    orientation: MoveOrientation,
    config: &CalibrationConfig,
) -> Result<AlignmentResult> {
    config.validate()?;
    positions.check_schema(&config.schema)?;
    resting_frames.check_bounds(positions.frame_count())?;

    let (hip_mean, vertical_mean) = resting_geometry(positions, resting_frames, &config.schema)?;
    let front_vector = cross3(&hip_mean, &vertical_mean);

    // Only yaw is corrected, so the hip vector is compared in the ground plane.
    let hip_vector = project_horizontal(&hip_mean);
    let hip_norm = norm3(&hip_vector);
    if hip_norm <= config.degeneracy_eps {
        return Err(CalibrationError::numeric_degeneracy(format!(
            "horizontal hip vector has length {hip_norm:e}"
        )));
    }

    let target = orientation.target_vector();
    let mut angle = angle_between(&hip_vector, &target);
    if front_vector[0] < 0.0 {
        angle = -angle;
    }
    let rotation = RotationMatrix::yaw(angle);

    info!("alignment angle: {:.3} deg", angle.to_degrees());
    debug!(
        "hip vector {hip_vector:?}, target {target:?}, front {front_vector:?} (sign {})",
        orientation.sign()
    );

    Ok(AlignmentResult {
        rotation,
        angle,
        hip_vector,
        vertical_vector: vertical_mean,
        front_vector,
        target,
    })
}

/// Mean hip and vertical vectors over the resting frames.
fn resting_geometry(
    positions: &JointPositionSeries,
    resting_frames: &FrameIndexSet,
    schema: &SensorSchema,
) -> Result<([f64; 3], [f64; 3])> {
    let mut hip_sum = [0.0; 3];
    let mut vertical_sum = [0.0; 3];

    for frame in resting_frames.iter() {
        let left = positions.joint(frame, schema.left_hip);
        let right = positions.joint(frame, schema.right_hip);
        let top = positions.joint(frame, schema.vertical_reference);
        let landmarks = [left, right, top];
        if !landmarks.iter().flatten().all(|v| v.is_finite()) {
            return Err(CalibrationError::numeric_degeneracy(format!(
                "non-finite pelvis landmark in resting frame {frame}"
            )));
        }

        let hip = sub3(&left, &right);
        let vertical = sub3(&top, &midpoint3(&left, &right));
        for axis in 0..3 {
            hip_sum[axis] += hip[axis];
            vertical_sum[axis] += vertical[axis];
        }
    }

    let n = resting_frames.len() as f64;
    Ok((hip_sum.map(|v| v / n), vertical_sum.map(|v| v / n)))
}
