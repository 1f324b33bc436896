//! Rotation of the tracked segment orientations (thorax and head).
//!
//! Each quaternion goes through a matrix round trip: normalize, convert to
//! a matrix `M`, left-multiply by the trial rotation `R`, convert back. All
//! other fields of a record are copied unchanged.

use rayon::prelude::*;

use crate::config::{
    CalibrationConfig, QuaternionSignPolicy, SensorSchema, QUATERNION_FIELD_WIDTH,
};
use crate::error::{CalibrationError, Result};
use crate::math::linalg::RotationMatrix;
use crate::math::Quaternion;
use crate::series::OrientationSeries;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Skeletal segment whose orientation is re-expressed in the aligned frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Segment {
    /// Upper trunk.
    Thorax,
    /// Head.
    Head,
}

impl Segment {
    /// Every segment this module rotates.
    pub const TRACKED: [Self; 2] = [Self::Thorax, Self::Head];

    /// Field offset of this segment's quaternion in a record.
    #[must_use]
    pub const fn offset(self, schema: &SensorSchema) -> usize {
        match self {
            Self::Thorax => schema.thorax_offset,
            Self::Head => schema.head_offset,
        }
    }

    /// Lower-case name for messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Thorax => "thorax",
            Self::Head => "head",
        }
    }
}

/// Re-express one orientation in the aligned frame: `q' ~ R * M(q)`.
///
/// `q` need not be unit length. The result is unit length with the sign
/// the conversion branch produced.
///
/// # Errors
///
/// Returns `NumericDegeneracy` if `q` is zero or non-finite, or the
/// rotated matrix cannot be converted back.
pub fn rotate_quaternion(
    q: &Quaternion,
    rotation: &RotationMatrix,
    eps: f64,
) -> Result<Quaternion> {
    let unit = q.normalized(eps)?;
    let rotated = rotation.compose(&unit.to_rotation_matrix());
    Quaternion::from_rotation_matrix(&rotated, eps)
}

/// Rotate the thorax and head quaternions of every frame.
///
/// The output has the same shape as the input. The sign of each output
/// quaternion follows `config.quaternion_sign`.
///
/// # Errors
///
/// Returns an error if:
/// - The record width disagrees with the schema
/// - A tracked quaternion is zero or non-finite
///
/// With `config.parallel` set and several bad frames, which frame is
/// reported is unspecified.
pub fn rotate_orientations(
    orientations: &OrientationSeries,
    rotation: &RotationMatrix,
    config: &CalibrationConfig,
) -> Result<OrientationSeries> {
    config.validate()?;
    orientations.check_schema(&config.schema)?;

    let schema = config.schema;
    let eps = config.degeneracy_eps;
    let mut rotated = orientations.clone();
    let width = rotated.record_width();

    let rotate_record = |(frame, record): (usize, &mut [f64])| -> Result<()> {
        for segment in Segment::TRACKED {
            let field = &mut record[segment.offset(&schema)..][..QUATERNION_FIELD_WIDTH];
            let q = rotate_quaternion(&Quaternion::from_slice(field), rotation, eps)
                .map_err(|err| with_location(err, segment, frame))?;
            q.canonical().write_to(field);
        }
        Ok(())
    };

    if config.parallel {
        rotated
            .as_mut_slice()
            .par_chunks_mut(width)
            .enumerate()
            .try_for_each(rotate_record)?;
    } else {
        rotated
            .as_mut_slice()
            .chunks_mut(width)
            .enumerate()
            .try_for_each(rotate_record)?;
    }

    if config.quaternion_sign == QuaternionSignPolicy::Continuous {
        enforce_continuity(&mut rotated, &schema);
    }
    Ok(rotated)
}

/// Flip each tracked quaternion onto the hemisphere of the previous frame's.
fn enforce_continuity(series: &mut OrientationSeries, schema: &SensorSchema) {
    let width = series.record_width();
    for segment in Segment::TRACKED {
        let offset = segment.offset(schema);
        let mut previous: Option<Quaternion> = None;
        for record in series.as_mut_slice().chunks_mut(width) {
            let field = &mut record[offset..offset + QUATERNION_FIELD_WIDTH];
            let mut q = Quaternion::from_slice(field);
            if let Some(prev) = previous {
                q = q.aligned_with(&prev);
                q.write_to(field);
            }
            previous = Some(q);
        }
    }
}

fn with_location(err: CalibrationError, segment: Segment, frame: usize) -> CalibrationError {
    match err {
        CalibrationError::NumericDegeneracy { context } => CalibrationError::numeric_degeneracy(
            format!("{} quaternion in frame {frame}: {context}", segment.name()),
        ),
        other => other,
    }
}
