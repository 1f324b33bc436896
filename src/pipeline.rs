//! Per-trial calibration pass and its batch form.
//!
//! Alignment has to finish before the rotators run since both consume its
//! matrix; the gaze zero-reference is independent. Trials share nothing, so
//! a batch is spread over the rayon pool.

use log::{debug, info};
use rayon::prelude::*;

use crate::alignment::{compute_alignment, AlignmentResult};
use crate::config::CalibrationConfig;
use crate::error::Result;
use crate::gaze::{compute_gaze_zero, GazeZero};
use crate::orientation::rotate_orientations;
use crate::position::rotate_positions;
use crate::series::{FrameIndexSet, JointPositionSeries, MoveOrientation, OrientationSeries};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Eye-tracking angles and their resting window.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GazeInput {
    /// Per-frame azimuth.
    pub azimuth: Vec<f64>,
    /// Per-frame elevation.
    pub elevation: Vec<f64>,
    /// Eye resting frames (may differ from the pelvis resting frames).
    pub resting_frames: FrameIndexSet,
}

/// Everything the calibration pass needs for one trial.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrialInput {
    /// Free-form identifier used in log messages.
    pub label: String,
    /// Joint positions.
    pub positions: JointPositionSeries,
    /// Segment orientations.
    pub orientations: OrientationSeries,
    /// Twist direction convention.
    pub move_orientation: MoveOrientation,
    /// Pelvis resting frames.
    pub resting_frames: FrameIndexSet,
    /// Eye-tracking data, when the trial has any.
    pub gaze: Option<GazeInput>,
}

/// Rotated copies of a trial's series plus the diagnostics.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CalibratedTrial {
    /// Identifier copied from the input.
    pub label: String,
    /// Rotation, angle and resting geometry.
    pub alignment: AlignmentResult,
    /// Positions in the aligned frame.
    pub positions: JointPositionSeries,
    /// Orientations with thorax and head re-expressed in the aligned frame.
    pub orientations: OrientationSeries,
    /// Resting gaze offsets, when gaze data was supplied.
    pub gaze_zero: Option<GazeZero>,
}

/// Run alignment, both rotators and the gaze calibrator on one trial.
///
/// # Errors
///
/// Returns the first error of any stage; no partial result is produced.
pub fn calibrate_trial(input: &TrialInput, config: &CalibrationConfig) -> Result<CalibratedTrial> {
    debug!(
        "calibrating trial {} ({} frames)",
        input.label,
        input.positions.frame_count()
    );

    let alignment = compute_alignment(
        &input.positions,
        &input.resting_frames,
        input.move_orientation,
        config,
    )?;
    let positions = rotate_positions(&input.positions, &alignment.rotation, config)?;
    let orientations = rotate_orientations(&input.orientations, &alignment.rotation, config)?;
    let gaze_zero = input
        .gaze
        .as_ref()
        .map(|gaze| compute_gaze_zero(&gaze.azimuth, &gaze.elevation, &gaze.resting_frames))
        .transpose()?;

    debug!(
        "trial {} aligned by {:.3} deg",
        input.label,
        alignment.angle_degrees()
    );

    Ok(CalibratedTrial {
        label: input.label.clone(),
        alignment,
        positions,
        orientations,
        gaze_zero,
    })
}

/// Calibrate many trials in parallel.
///
/// Returns one result per input, in input order; a failing trial does not
/// affect the others.
pub fn calibrate_trials(
    inputs: &[TrialInput],
    config: &CalibrationConfig,
) -> Vec<Result<CalibratedTrial>> {
    info!("calibrating {} trials", inputs.len());
    let results: Vec<Result<CalibratedTrial>> = inputs
        .par_iter()
        .map(|input| calibrate_trial(input, config))
        .collect();

    let failed = results.iter().filter(|r| r.is_err()).count();
    info!(
        "calibrated {} trials, {failed} failed",
        results.len() - failed
    );
    results
}
