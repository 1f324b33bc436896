//! Resting gaze zero-reference.
//!
//! The eye tracker's zero direction depends on each subject's face
//! geometry. The mean azimuth and elevation over a resting period give the
//! offset to subtract before comparing gaze angles across subjects.

use crate::error::{CalibrationError, Result};
use crate::series::FrameIndexSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Resting-state gaze angles of one trial.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GazeZero {
    /// Mean resting azimuth.
    pub azimuth: f64,
    /// Mean resting elevation.
    pub elevation: f64,
}

impl GazeZero {
    /// Subtract the zero-reference from a pair of angle series.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the series lengths differ.
    pub fn rezeroed(&self, azimuth: &[f64], elevation: &[f64]) -> Result<(Vec<f64>, Vec<f64>)> {
        check_lengths(azimuth, elevation)?;
        Ok((
            azimuth.iter().map(|a| a - self.azimuth).collect(),
            elevation.iter().map(|e| e - self.elevation).collect(),
        ))
    }
}

/// Mean azimuth and elevation over the eye resting frames.
///
/// # Errors
///
/// Returns an error if:
/// - The series lengths differ, or a resting index is out of range
/// - A sampled angle is non-finite
///
/// An empty resting set cannot be built; use [`gaze_zero_from_indices`]
/// to have an empty index list reported as a configuration error.
///
/// # Example
///
/// ```
/// use orientation_calibration::{compute_gaze_zero, FrameIndexSet};
///
/// let azimuth = vec![2.0, 4.0, 30.0];
/// let elevation = vec![-1.0, 1.0, 12.0];
/// let resting = FrameIndexSet::from_range(0..2)?;
/// let zero = compute_gaze_zero(&azimuth, &elevation, &resting)?;
/// assert_eq!(zero.azimuth, 3.0);
/// assert_eq!(zero.elevation, 0.0);
/// # Ok::<(), orientation_calibration::CalibrationError>(())
/// ```
pub fn compute_gaze_zero(
    azimuth: &[f64],
    elevation: &[f64],
    resting_frames: &FrameIndexSet,
) -> Result<GazeZero> {
    check_lengths(azimuth, elevation)?;
    resting_frames.check_bounds(azimuth.len())?;

    Ok(GazeZero {
        azimuth: resting_mean(azimuth, resting_frames, "azimuth")?,
        elevation: resting_mean(elevation, resting_frames, "elevation")?,
    })
}

/// [`compute_gaze_zero`] from a raw index list.
///
/// # Errors
///
/// Returns a configuration error if `indices` is empty, otherwise the
/// errors of [`compute_gaze_zero`].
pub fn gaze_zero_from_indices(
    azimuth: &[f64],
    elevation: &[f64],
    indices: &[usize],
) -> Result<GazeZero> {
    let resting = FrameIndexSet::new(indices.to_vec())?;
    compute_gaze_zero(azimuth, elevation, &resting)
}

fn check_lengths(azimuth: &[f64], elevation: &[f64]) -> Result<()> {
    if azimuth.len() != elevation.len() {
        return Err(CalibrationError::shape_mismatch(
            "elevation length",
            azimuth.len(),
            elevation.len(),
        ));
    }
    Ok(())
}

/// Running mean; a constant window yields that constant bit-for-bit.
fn resting_mean(series: &[f64], resting_frames: &FrameIndexSet, name: &str) -> Result<f64> {
    let mut mean = 0.0;
    for (k, frame) in resting_frames.iter().enumerate() {
        let value = series[frame];
        if !value.is_finite() {
            return Err(CalibrationError::numeric_degeneracy(format!(
                "non-finite {name} in eye resting frame {frame}"
            )));
        }
        mean += (value - mean) / (k + 1) as f64;
    }
    Ok(mean)
}
