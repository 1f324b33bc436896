//! Scalar-first unit quaternions and their conversion to and from
//! rotation matrices.
//!
//! # Conventions
//!
//! - Component order is `(w, x, y, z)`, matching the suit export.
//! - Matrices act on column vectors: `v' = M * v`.
//! - `q` and `-q` are the same rotation; [`Quaternion::canonical`] and
//!   [`Quaternion::aligned_with`] pick one representative.

use crate::error::{CalibrationError, Result};
use crate::math::linalg::RotationMatrix;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Quaternion `w + xi + yj + zk`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Quaternion {
    /// Scalar part.
    pub w: f64,
    /// i component.
    pub x: f64,
    /// j component.
    pub y: f64,
    /// k component.
    pub z: f64,
}

impl Quaternion {
    /// Create a quaternion from its components.
    #[must_use]
    pub const fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    /// The identity rotation.
    #[must_use]
    pub const fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }

    /// Read a scalar-first quaternion from the first four entries of a
    /// schema-checked record field.
    #[must_use]
    pub(crate) fn from_slice(field: &[f64]) -> Self {
        Self::new(field[0], field[1], field[2], field[3])
    }

    /// Write `(w, x, y, z)` into the first four entries of `field`.
    ///
    /// # Panics
    ///
    /// Panics if `field` has fewer than four entries.
    pub fn write_to(&self, field: &mut [f64]) {
        field[..4].copy_from_slice(&self.to_array());
    }

    /// Components as `[w, x, y, z]`.
    #[must_use]
    pub const fn to_array(&self) -> [f64; 4] {
        [self.w, self.x, self.y, self.z]
    }

    /// Four-dimensional dot product.
    #[must_use]
    #[inline]
    pub fn dot(&self, other: &Self) -> f64 {
        self.w * other.w + self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Euclidean norm.
    #[must_use]
    #[inline]
    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Whether every component is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }

    /// `-q`, the same rotation with the opposite sign.
    #[must_use]
    pub fn negated(&self) -> Self {
        Self::new(-self.w, -self.x, -self.y, -self.z)
    }

    /// Unit quaternion in the direction of `self`.
    ///
    /// # Errors
    ///
    /// Returns `NumericDegeneracy` if a component is non-finite or the norm
    /// is at or below `eps`.
    pub fn normalized(&self, eps: f64) -> Result<Self> {
        if !self.is_finite() {
            return Err(CalibrationError::numeric_degeneracy(format!(
                "non-finite quaternion {:?}",
                self.to_array()
            )));
        }
        let norm = self.norm();
        if norm <= eps {
            return Err(CalibrationError::numeric_degeneracy(format!(
                "quaternion norm {norm:e} is too small to normalize"
            )));
        }
        Ok(Self::new(
            self.w / norm,
            self.x / norm,
            self.y / norm,
            self.z / norm,
        ))
    }

    /// Representative with a non-negative scalar part.
    ///
    /// When `w` is exactly zero the first non-zero vector component is made
    /// positive.
    #[must_use]
    pub fn canonical(&self) -> Self {
        let leading = [self.w, self.x, self.y, self.z]
            .into_iter()
            .find(|&c| c != 0.0)
            .unwrap_or(0.0);
        if leading < 0.0 {
            self.negated()
        } else {
            *self
        }
    }

    /// Representative closest to `reference` (non-negative dot product).
    #[must_use]
    pub fn aligned_with(&self, reference: &Self) -> Self {
        if self.dot(reference) < 0.0 {
            self.negated()
        } else {
            *self
        }
    }

    /// Rotation angle between two unit quaternions, in `[0, pi]`.
    #[must_use]
    pub fn angle_to(&self, other: &Self) -> f64 {
        2.0 * self.dot(other).abs().clamp(0.0, 1.0).acos()
    }

    /// Rotation matrix of a unit quaternion.
    #[must_use]
    pub fn to_rotation_matrix(&self) -> RotationMatrix {
        let Self { w, x, y, z } = *self;
        RotationMatrix::from_rows_unchecked([
            [
                1.0 - 2.0 * (y * y + z * z),
                2.0 * (x * y - w * z),
                2.0 * (x * z + w * y),
            ],
            [
                2.0 * (x * y + w * z),
                1.0 - 2.0 * (x * x + z * z),
                2.0 * (y * z - w * x),
            ],
            [
                2.0 * (x * z - w * y),
                2.0 * (y * z + w * x),
                1.0 - 2.0 * (x * x + y * y),
            ],
        ])
    }

    /// Unit quaternion of a rotation matrix.
    ///
    /// The branch is picked from the largest of the trace and the three
    /// diagonal entries, so the square root taken is never of a small
    /// number for a proper rotation. The sign of the result is whatever the
    /// branch yields; apply [`Self::canonical`] or [`Self::aligned_with`]
    /// for a fixed convention.
    ///
    /// # Errors
    ///
    /// Returns `NumericDegeneracy` if the matrix is non-finite or the
    /// selected branch's radicand is at or below `eps` (not a rotation).
    pub fn from_rotation_matrix(m: &RotationMatrix, eps: f64) -> Result<Self> {
        if !m.is_finite() {
            return Err(CalibrationError::numeric_degeneracy(
                "non-finite rotation matrix",
            ));
        }
        let r = m.rows();
        let trace = r[0][0] + r[1][1] + r[2][2];
        let branch = Branch::select(trace, r[0][0], r[1][1], r[2][2]);

        let radicand = match branch {
            Branch::Trace => 1.0 + trace,
            Branch::X => 1.0 + r[0][0] - r[1][1] - r[2][2],
            Branch::Y => 1.0 + r[1][1] - r[0][0] - r[2][2],
            Branch::Z => 1.0 + r[2][2] - r[0][0] - r[1][1],
        };
        if radicand <= eps {
            return Err(CalibrationError::numeric_degeneracy(format!(
                "singular matrix-to-quaternion branch {branch:?} (radicand {radicand:e})"
            )));
        }
        // s = 4 * |largest component|
        let s = 2.0 * radicand.sqrt();

        let q = match branch {
            Branch::Trace => Self::new(
                0.25 * s,
                (r[2][1] - r[1][2]) / s,
                (r[0][2] - r[2][0]) / s,
                (r[1][0] - r[0][1]) / s,
            ),
            Branch::X => Self::new(
                (r[2][1] - r[1][2]) / s,
                0.25 * s,
                (r[0][1] + r[1][0]) / s,
                (r[0][2] + r[2][0]) / s,
            ),
            Branch::Y => Self::new(
                (r[0][2] - r[2][0]) / s,
                (r[0][1] + r[1][0]) / s,
                0.25 * s,
                (r[1][2] + r[2][1]) / s,
            ),
            Branch::Z => Self::new(
                (r[1][0] - r[0][1]) / s,
                (r[0][2] + r[2][0]) / s,
                (r[1][2] + r[2][1]) / s,
                0.25 * s,
            ),
        };
        // Absorb rounding from slightly non-orthonormal products.
        q.normalized(eps)
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::identity()
    }
}

/// Largest-term branch of the matrix-to-quaternion conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Branch {
    Trace,
    X,
    Y,
    Z,
}

impl Branch {
    fn select(trace: f64, m00: f64, m11: f64, m22: f64) -> Self {
        if trace >= m00 && trace >= m11 && trace >= m22 {
            Self::Trace
        } else if m00 >= m11 && m00 >= m22 {
            Self::X
        } else if m11 >= m22 {
            Self::Y
        } else {
            Self::Z
        }
    }
}
