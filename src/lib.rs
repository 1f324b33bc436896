//! Orientation Calibration Library
//!
//! Frame alignment for multi-sensor motion-capture and eye-tracking trials.
//!
//! Every downstream metric (gaze angles, neck angles, trajectories) needs
//! the trial expressed in one canonical frame. This crate computes a yaw
//! rotation per trial from the resting pelvis geometry, applies it to joint
//! positions and to the thorax and head orientations, and derives the
//! resting gaze zero-reference.
//!
//! # Features
//!
//! - **Typed failures**: invalid signs, empty resting windows, degenerate
//!   geometry and schema mismatches are errors, never NaN output
//! - **Named schema**: joint and quaternion offsets live in [`SensorSchema`]
//! - **Stable quaternion conversion**: largest-term branch selection
//! - **Explicit sign policy**: see [`QuaternionSignPolicy`]
//! - **Parallel**: frames and trials are processed on the rayon pool
//!
//! # Quick Start
//!
//! ```
//! use orientation_calibration::{
//!     calibrate_trial, CalibrationConfig, FrameIndexSet, JointPositionSeries,
//!     MoveOrientation, OrientationSeries, Quaternion, SensorSchema, TrialInput,
//! };
//!
//! let schema = SensorSchema::XSENS;
//! let mut frame = vec![0.0; schema.position_width()];
//! frame[3 * schema.left_hip..3 * schema.left_hip + 3].copy_from_slice(&[0.15, 0.0, 0.9]);
//! frame[3 * schema.right_hip..3 * schema.right_hip + 3].copy_from_slice(&[-0.15, 0.0, 0.9]);
//! frame[3 * schema.vertical_reference..3 * schema.vertical_reference + 3]
//!     .copy_from_slice(&[0.0, 0.0, 1.0]);
//!
//! let mut record = vec![0.0; schema.orientation_width];
//! Quaternion::identity().write_to(&mut record[schema.thorax_offset..]);
//! Quaternion::identity().write_to(&mut record[schema.head_offset..]);
//!
//! let input = TrialInput {
//!     label: "subject-01/trial-03".to_string(),
//!     positions: JointPositionSeries::from_frames(&[frame], schema.joint_count)?,
//!     orientations: OrientationSeries::from_frames(&[record])?,
//!     move_orientation: MoveOrientation::try_from(1_i32)?,
//!     resting_frames: FrameIndexSet::from_range(0..1)?,
//!     gaze: None,
//! };
//!
//! let trial = calibrate_trial(&input, &CalibrationConfig::xsens())?;
//! assert!(trial.alignment.rotation.is_orthonormal(1e-12));
//! # Ok::<(), orientation_calibration::CalibrationError>(())
//! ```
//!
//! # Stages
//!
//! | Stage | Function | Depends on |
//! |-------|----------|------------|
//! | Frame alignment | [`compute_alignment`] | resting positions |
//! | Position rotation | [`rotate_positions`] | alignment |
//! | Orientation rotation | [`rotate_orientations`] | alignment |
//! | Gaze zero-reference | [`compute_gaze_zero`] | nothing |

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::many_single_char_names)]

pub mod alignment;
pub mod config;
pub mod error;
pub mod gaze;
pub mod math;
pub mod orientation;
pub mod pipeline;
pub mod position;
pub mod series;

// Re-exports for convenient access
pub use alignment::{compute_alignment, AlignmentResult};
pub use config::{CalibrationConfig, QuaternionSignPolicy, SensorSchema};
pub use error::{CalibrationError, ErrorKind, Result};
pub use gaze::{compute_gaze_zero, gaze_zero_from_indices, GazeZero};
pub use math::{Quaternion, RotationMatrix};
pub use orientation::{rotate_orientations, rotate_quaternion, Segment};
pub use pipeline::{calibrate_trial, calibrate_trials, CalibratedTrial, GazeInput, TrialInput};
pub use position::rotate_positions;
pub use series::{FrameIndexSet, JointPositionSeries, MoveOrientation, OrientationSeries};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
