//! Mathematical utilities for frame alignment.
//!
//! This module provides:
//! - [`linalg`]: 3D vector helpers and [`RotationMatrix`]
//! - [`quaternion`]: scalar-first [`Quaternion`] with matrix conversion

pub mod linalg;
pub mod quaternion;

pub use linalg::{angle_between, cross3, dot3, norm3, RotationMatrix};
pub use quaternion::Quaternion;
