//! End-to-end properties of the calibration pass.
//!
//! These tests build synthetic trials in the suit layout and check the
//! geometric guarantees of alignment, rotation and gaze calibration.

use approx::assert_relative_eq;
use orientation_calibration::{
    calibrate_trial, compute_alignment, compute_gaze_zero, gaze_zero_from_indices,
    rotate_orientations, rotate_positions, CalibrationConfig, CalibrationError, ErrorKind,
    FrameIndexSet, GazeInput, JointPositionSeries, MoveOrientation, OrientationSeries, Quaternion,
    QuaternionSignPolicy, RotationMatrix, SensorSchema, TrialInput,
};
use proptest::prelude::*;
use std::f64::consts::{FRAC_PI_2, PI};

// =============================================================================
// TRIAL GENERATORS
// =============================================================================

/// Standing pelvis: hips `half_width` either side of the midpoint along
/// `hip_direction` (horizontal), landmark `height` above the midpoint.
fn standing_frame(hip_direction: f64, half_width: f64, height: f64, sway: f64) -> Vec<f64> {
    let schema = SensorSchema::XSENS;
    let (s, c) = hip_direction.sin_cos();
    let mid = [0.3 + sway, -0.2, 0.95];
    let left = [mid[0] + half_width * c, mid[1] + half_width * s, mid[2]];
    let right = [mid[0] - half_width * c, mid[1] - half_width * s, mid[2]];
    let top = [mid[0], mid[1], mid[2] + height];

    let mut frame: Vec<f64> = (0..schema.position_width())
        .map(|i| 0.01 * i as f64)
        .collect();
    for (joint, p) in [
        (schema.left_hip, left),
        (schema.right_hip, right),
        (schema.vertical_reference, top),
    ] {
        frame[3 * joint..3 * joint + 3].copy_from_slice(&p);
    }
    frame
}

fn standing_series(hip_direction: f64, frames: usize) -> JointPositionSeries {
    let rows: Vec<Vec<f64>> = (0..frames)
        .map(|i| standing_frame(hip_direction, 0.12, 0.25, 0.001 * i as f64))
        .collect();
    JointPositionSeries::from_frames(&rows, SensorSchema::XSENS.joint_count).unwrap()
}

fn orientation_series(frames: usize) -> OrientationSeries {
    let schema = SensorSchema::XSENS;
    let rows: Vec<Vec<f64>> = (0..frames)
        .map(|i| {
            let t = i as f64 * 0.05;
            let mut record = vec![0.25; schema.orientation_width];
            let thorax = Quaternion::new(t.cos(), 0.1, 0.2, t.sin());
            let head = Quaternion::new(0.7, t.sin(), -0.3, 0.4);
            thorax.write_to(&mut record[schema.thorax_offset..]);
            head.write_to(&mut record[schema.head_offset..]);
            record
        })
        .collect();
    OrientationSeries::from_frames(&rows).unwrap()
}

fn align(positions: &JointPositionSeries, sign: MoveOrientation) -> f64 {
    let resting = FrameIndexSet::from_range(0..positions.frame_count()).unwrap();
    compute_alignment(positions, &resting, sign, &CalibrationConfig::default())
        .unwrap()
        .angle
}

// =============================================================================
// FRAME ALIGNMENT
// =============================================================================

#[test]
fn quarter_turn_scenario_matrix() {
    // hip = (1, 0, 0), landmark straight above the midpoint, sign +1
    let positions = standing_series(0.0, 1);
    let resting = FrameIndexSet::from_range(0..1).unwrap();
    let result = compute_alignment(
        &positions,
        &resting,
        MoveOrientation::Positive,
        &CalibrationConfig::default(),
    )
    .unwrap();

    assert_relative_eq!(result.angle, FRAC_PI_2, epsilon = 1e-12);
    let expected = [[0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]];
    for (i, row) in expected.iter().enumerate() {
        for (j, &value) in row.iter().enumerate() {
            assert_relative_eq!(result.rotation.get(i, j), value, epsilon = 1e-12);
        }
    }
}

#[test]
fn hip_parallel_to_target_gives_zero_angle() {
    // Hip pointing along -y is already on the +1 target.
    let positions = standing_series(-FRAC_PI_2, 10);
    let angle = align(&positions, MoveOrientation::Positive);
    assert_relative_eq!(angle, 0.0, epsilon = 1e-7);

    let positions = standing_series(FRAC_PI_2, 10);
    let angle = align(&positions, MoveOrientation::Negative);
    assert_relative_eq!(angle, 0.0, epsilon = 1e-7);
}

#[test]
fn opposite_signs_give_supplementary_angles() {
    for direction in [-2.5, -1.0, 0.0, 0.4, 1.3, 2.9] {
        let positions = standing_series(direction, 5);
        let positive = align(&positions, MoveOrientation::Positive);
        let negative = align(&positions, MoveOrientation::Negative);
        assert_relative_eq!(positive.abs() + negative.abs(), PI, epsilon = 1e-9);
        // Both take the direction from the same front vector.
        assert!(positive * negative >= 0.0);
    }
}

#[test]
fn invalid_sign_is_configuration_error() {
    for bad in [0.0, 2.0, -0.5] {
        let err = MoveOrientation::from_sign(bad).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}

#[test]
fn collapsed_hips_are_degenerate() {
    let schema = SensorSchema::XSENS;
    let mut frame = standing_frame(0.0, 0.12, 0.25, 0.0);
    // Stack the hips vertically.
    frame[3 * schema.left_hip..3 * schema.left_hip + 3].copy_from_slice(&[0.3, -0.2, 1.0]);
    frame[3 * schema.right_hip..3 * schema.right_hip + 3].copy_from_slice(&[0.3, -0.2, 0.9]);
    let positions = JointPositionSeries::from_frames(&[frame], schema.joint_count).unwrap();
    let resting = FrameIndexSet::from_range(0..1).unwrap();

    let err = compute_alignment(
        &positions,
        &resting,
        MoveOrientation::Positive,
        &CalibrationConfig::default(),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NumericDegeneracy);
}

// =============================================================================
// ROTATORS
// =============================================================================

#[test]
fn rotated_trial_keeps_shape_and_untracked_fields() {
    let schema = SensorSchema::XSENS;
    let positions = standing_series(0.7, 12);
    let orientations = orientation_series(12);
    let rotation = RotationMatrix::yaw(-1.2);
    let config = CalibrationConfig::default();

    let rotated_positions = rotate_positions(&positions, &rotation, &config).unwrap();
    assert_eq!(rotated_positions.frame_count(), positions.frame_count());

    let rotated = rotate_orientations(&orientations, &rotation, &config).unwrap();
    assert_eq!(rotated.as_slice().len(), orientations.as_slice().len());
    for frame in 0..rotated.frame_count() {
        for (i, (&a, &b)) in rotated
            .record(frame)
            .iter()
            .zip(orientations.record(frame))
            .enumerate()
        {
            let tracked = (schema.thorax_offset..schema.thorax_offset + 4).contains(&i)
                || (schema.head_offset..schema.head_offset + 4).contains(&i);
            if !tracked {
                assert_eq!(a, b);
            }
        }
    }
}

#[test]
fn rotated_orientation_matches_matrix_product() {
    let schema = SensorSchema::XSENS;
    let orientations = orientation_series(8);
    let rotation = RotationMatrix::yaw(2.2);
    let policy = QuaternionSignPolicy::NonNegativeScalar;
    let config = CalibrationConfig::default().with_quaternion_sign(policy);
    let rotated = rotate_orientations(&orientations, &rotation, &config).unwrap();

    for frame in 0..orientations.frame_count() {
        let raw = orientations.quaternion(frame, schema.head_offset);
        let expected = rotation.compose(&raw.normalized(1e-12).unwrap().to_rotation_matrix());
        let actual = rotated.quaternion(frame, schema.head_offset);
        let actual = actual.to_rotation_matrix();
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(actual.get(i, j), expected.get(i, j), epsilon = 1e-9);
            }
        }
        assert!(rotated.quaternion(frame, schema.head_offset).w >= 0.0);
    }
}

#[test]
fn zero_norm_quaternion_is_degenerate() {
    let schema = SensorSchema::XSENS;
    let mut record = vec![0.0; schema.orientation_width];
    Quaternion::identity().write_to(&mut record[schema.head_offset..]);
    // Thorax left all zeros.
    let orientations = OrientationSeries::from_frames(&[record]).unwrap();
    let err = rotate_orientations(
        &orientations,
        &RotationMatrix::identity(),
        &CalibrationConfig::default(),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NumericDegeneracy);
}

#[test]
fn wrong_joint_count_is_shape_mismatch() {
    let positions = JointPositionSeries::new(vec![0.0; 3 * 17 * 2], 17).unwrap();
    let err = rotate_positions(
        &positions,
        &RotationMatrix::identity(),
        &CalibrationConfig::default(),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ShapeMismatch);
}

// =============================================================================
// GAZE
// =============================================================================

#[test]
fn gaze_constant_resting_value_is_exact() {
    for c in [0.1, -12.345, 1e-7, 88.8] {
        let azimuth = vec![c; 50];
        let elevation = vec![c / 3.0; 50];
        let resting = FrameIndexSet::from_range(5..45).unwrap();
        let zero = compute_gaze_zero(&azimuth, &elevation, &resting).unwrap();
        assert_eq!(zero.azimuth, c);
        assert_eq!(zero.elevation, c / 3.0);
    }
}

#[test]
fn gaze_empty_resting_set_is_configuration_error() {
    let err = gaze_zero_from_indices(&[1.0, 2.0], &[3.0, 4.0], &[]).unwrap_err();
    assert!(matches!(err, CalibrationError::Configuration(_)));
}

// =============================================================================
// FULL PASS
// =============================================================================

#[test]
fn full_pass_aligns_trial() {
    let schema = SensorSchema::XSENS;
    let input = TrialInput {
        label: "subject-07/42/1".to_string(),
        positions: standing_series(0.0, 20),
        orientations: orientation_series(20),
        move_orientation: MoveOrientation::Positive,
        resting_frames: FrameIndexSet::from_range(0..10).unwrap(),
        gaze: Some(GazeInput {
            azimuth: (0..20).map(|i| if i < 5 { 3.0 } else { 40.0 }).collect(),
            elevation: vec![-2.0; 20],
            resting_frames: FrameIndexSet::from_range(0..5).unwrap(),
        }),
    };

    let trial = calibrate_trial(&input, &CalibrationConfig::default()).unwrap();
    assert!(trial.alignment.rotation.is_orthonormal(1e-12));
    assert_relative_eq!(trial.alignment.angle, FRAC_PI_2, epsilon = 1e-9);

    // Hip vector (1, 0, 0) ends up along +y after the quarter turn.
    let left = trial.positions.joint(0, schema.left_hip);
    let right = trial.positions.joint(0, schema.right_hip);
    assert_relative_eq!(left[0] - right[0], 0.0, epsilon = 1e-9);
    assert_relative_eq!(left[1] - right[1], 0.24, epsilon = 1e-9);

    let gaze = trial.gaze_zero.unwrap();
    assert_eq!(gaze.azimuth, 3.0);
    assert_eq!(gaze.elevation, -2.0);
}

// =============================================================================
// PROPERTIES
// =============================================================================

proptest! {
    #[test]
    fn prop_rotation_is_proper(
        direction in -PI..PI,
        half_width in 0.05..0.3f64,
        height in 0.1..0.5f64,
        positive in any::<bool>(),
    ) {
        let rows = vec![standing_frame(direction, half_width, height, 0.0)];
        let joint_count = SensorSchema::XSENS.joint_count;
        let positions = JointPositionSeries::from_frames(&rows, joint_count).unwrap();
        let resting = FrameIndexSet::from_range(0..1).unwrap();
        let sign = if positive { MoveOrientation::Positive } else { MoveOrientation::Negative };
        let config = CalibrationConfig::default();
        let result = compute_alignment(&positions, &resting, sign, &config).unwrap();
        prop_assert!(result.rotation.is_orthonormal(1e-9));
        prop_assert!((result.rotation.determinant() - 1.0).abs() < 1e-9);
        prop_assert!(result.angle.abs() <= PI + 1e-12);
    }

    #[test]
    fn prop_position_rotation_preserves_norms(
        angle in -PI..PI,
        direction in -PI..PI,
    ) {
        let positions = standing_series(direction, 3);
        let rotation = RotationMatrix::yaw(angle);
        let config = CalibrationConfig::default();
        let rotated = rotate_positions(&positions, &rotation, &config).unwrap();
        for frame in 0..positions.frame_count() {
            for joint in 0..positions.joint_count() {
                let a = positions.joint(frame, joint);
                let b = rotated.joint(frame, joint);
                let na = (a[0] * a[0] + a[1] * a[1] + a[2] * a[2]).sqrt();
                let nb = (b[0] * b[0] + b[1] * b[1] + b[2] * b[2]).sqrt();
                prop_assert!((na - nb).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn prop_quaternion_round_trip(
        w in -1.0..1.0f64,
        x in -1.0..1.0f64,
        y in -1.0..1.0f64,
        z in -1.0..1.0f64,
    ) {
        let raw = Quaternion::new(w, x, y, z);
        prop_assume!(raw.norm() > 1e-2);
        let q = raw.normalized(1e-12).unwrap();
        let back = Quaternion::from_rotation_matrix(&q.to_rotation_matrix(), 1e-12).unwrap();
        prop_assert!(back.angle_to(&q) < 1e-6);
        let aligned = back.aligned_with(&q);
        prop_assert!((aligned.w - q.w).abs() < 1e-9);
        prop_assert!((aligned.x - q.x).abs() < 1e-9);
        prop_assert!((aligned.y - q.y).abs() < 1e-9);
        prop_assert!((aligned.z - q.z).abs() < 1e-9);
    }
}
