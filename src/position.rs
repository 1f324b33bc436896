//! Rigid rotation of a joint position series.

use rayon::prelude::*;

use crate::config::CalibrationConfig;
use crate::error::Result;
use crate::math::linalg::RotationMatrix;
use crate::series::JointPositionSeries;

/// Rotate every joint of every frame: `p -> R * p`.
///
/// Returns a new series of the same shape; the input is left untouched.
/// Frames are independent and are processed on the rayon pool when
/// `config.parallel` is set.
///
/// # Errors
///
/// Returns a configuration error for an invalid config, or
/// `ShapeMismatch` if the joint count disagrees with the schema.
pub fn rotate_positions(
    positions: &JointPositionSeries,
    rotation: &RotationMatrix,
    config: &CalibrationConfig,
) -> Result<JointPositionSeries> {
    config.validate()?;
    positions.check_schema(&config.schema)?;

    let mut rotated = positions.clone();
    let width = rotated.frame_width();
    if config.parallel {
        rotated
            .as_mut_slice()
            .par_chunks_mut(width)
            .for_each(|frame| rotate_frame(frame, rotation));
    } else {
        rotated
            .as_mut_slice()
            .chunks_mut(width)
            .for_each(|frame| rotate_frame(frame, rotation));
    }
    Ok(rotated)
}

fn rotate_frame(frame: &mut [f64], rotation: &RotationMatrix) {
    for joint in frame.chunks_exact_mut(3) {
        let p = rotation.apply(&[joint[0], joint[1], joint[2]]);
        joint.copy_from_slice(&p);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SensorSchema;
    use crate::error::CalibrationError;
    use crate::math::linalg::norm3;
    use approx::assert_relative_eq;
    use proptest::prelude::*;
    use std::f64::consts::FRAC_PI_2;

    fn ramp_series(frames: usize) -> JointPositionSeries {
        let width = SensorSchema::XSENS.position_width();
        let data = (0..frames * width)
            .map(|i| (i as f64 * 0.37).sin())
            .collect();
        JointPositionSeries::new(data, SensorSchema::XSENS.joint_count).unwrap()
    }

    #[test]
    fn test_quarter_turn() {
        let schema = SensorSchema::XSENS;
        let mut frame = vec![0.0; schema.position_width()];
        frame[..3].copy_from_slice(&[1.0, 2.0, 3.0]);
        let positions = JointPositionSeries::from_frames(&[frame], schema.joint_count).unwrap();

        let rotated = rotate_positions(
            &positions,
            &RotationMatrix::yaw(FRAC_PI_2),
            &CalibrationConfig::default(),
        )
        .unwrap();
        let p = rotated.joint(0, 0);
        assert_relative_eq!(p[0], -2.0, epsilon = 1e-12);
        assert_relative_eq!(p[1], 1.0, epsilon = 1e-12);
        assert_relative_eq!(p[2], 3.0, epsilon = 1e-12);
        assert_eq!(rotated.frame_count(), 1);
        assert_eq!(positions.joint(0, 0), [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let positions = ramp_series(50);
        let rotation = RotationMatrix::yaw(1.1);
        let config = CalibrationConfig::default().with_parallel(true);
        let parallel = rotate_positions(&positions, &rotation, &config).unwrap();
        let config = config.with_parallel(false);
        let sequential = rotate_positions(&positions, &rotation, &config).unwrap();
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn test_identity_is_noop() {
        let positions = ramp_series(3);
        let rotated = rotate_positions(
            &positions,
            &RotationMatrix::identity(),
            &CalibrationConfig::default(),
        )
        .unwrap();
        assert_eq!(rotated, positions);
    }

    #[test]
    fn test_schema_mismatch() {
        let positions = JointPositionSeries::new(vec![0.0; 9], 3).unwrap();
        let err = rotate_positions(
            &positions,
            &RotationMatrix::identity(),
            &CalibrationConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CalibrationError::ShapeMismatch { .. }));
    }

    proptest! {
        #[test]
        fn prop_norm_preserving(
            angle in -std::f64::consts::PI..std::f64::consts::PI,
            x in -10.0..10.0f64,
            y in -10.0..10.0f64,
            z in -10.0..10.0f64,
        ) {
            let schema = SensorSchema::XSENS;
            let mut frame = vec![0.0; schema.position_width()];
            frame[3..6].copy_from_slice(&[x, y, z]);
            let positions = JointPositionSeries::from_frames(&[frame], schema.joint_count).unwrap();
            let config = CalibrationConfig::default().with_parallel(false);
            let rotation = RotationMatrix::yaw(angle);
            let rotated = rotate_positions(&positions, &rotation, &config).unwrap();
            let before = norm3(&positions.joint(0, 1));
            let after = norm3(&rotated.joint(0, 1));
            prop_assert!((before - after).abs() < 1e-9);
        }
    }
}
