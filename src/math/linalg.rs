//! Linear algebra utilities for frame alignment.
//!
//! Plain `[f64; 3]` helpers for the resting-geometry vectors, plus the
//! [`RotationMatrix`] wrapper over nalgebra's `Matrix3`.

use nalgebra::{Matrix3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Index of the vertical (gravity) axis.
pub const VERTICAL_AXIS: usize = 2;

/// A proper 3x3 rotation matrix (orthonormal, determinant +1).
///
/// Stored row-major as `rows[i][j]`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RotationMatrix {
    rows: [[f64; 3]; 3],
}

impl RotationMatrix {
    /// The identity rotation.
    #[must_use]
    pub const fn identity() -> Self {
        Self {
            rows: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    /// Rotation by `angle` radians about the vertical axis.
    ///
    /// Positive angles turn +x towards +y.
    #[must_use]
    pub fn yaw(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self {
            rows: [[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    /// Wrap raw rows without checking orthonormality.
    ///
    /// Used for intermediate products such as `R * M`; check with
    /// [`Self::is_orthonormal`] when the source is untrusted.
    #[must_use]
    pub const fn from_rows_unchecked(rows: [[f64; 3]; 3]) -> Self {
        Self { rows }
    }

    /// Row-major entries.
    #[must_use]
    #[inline]
    pub const fn rows(&self) -> &[[f64; 3]; 3] {
        &self.rows
    }

    /// Entry at row `i`, column `j`.
    #[must_use]
    #[inline]
    pub const fn get(&self, i: usize, j: usize) -> f64 {
        self.rows[i][j]
    }

    /// Rotate a point: `R * p`.
    #[must_use]
    #[inline]
    pub fn apply(&self, p: &[f64; 3]) -> [f64; 3] {
        let r = &self.rows;
        [
            r[0][0] * p[0] + r[0][1] * p[1] + r[0][2] * p[2],
            r[1][0] * p[0] + r[1][1] * p[1] + r[1][2] * p[2],
            r[2][0] * p[0] + r[2][1] * p[1] + r[2][2] * p[2],
        ]
    }

    /// Matrix product `self * rhs`.
    #[must_use]
    pub fn compose(&self, rhs: &Self) -> Self {
        Self::from_matrix3(&(self.to_matrix3() * rhs.to_matrix3()))
    }

    /// Transpose (the inverse for a proper rotation).
    #[must_use]
    pub fn transpose(&self) -> Self {
        Self::from_matrix3(&self.to_matrix3().transpose())
    }

    /// Determinant.
    #[must_use]
    pub fn determinant(&self) -> f64 {
        self.to_matrix3().determinant()
    }

    /// Check `R * R^T = I` and `det(R) = +1` within `tol`.
    #[must_use]
    pub fn is_orthonormal(&self, tol: f64) -> bool {
        let m = self.to_matrix3();
        let residual = (m * m.transpose() - Matrix3::identity()).abs().max();
        residual <= tol && (m.determinant() - 1.0).abs() <= tol
    }

    /// Yaw angle of this rotation, assuming it is a pure rotation about
    /// the vertical axis.
    #[must_use]
    pub fn yaw_angle(&self) -> f64 {
        self.rows[1][0].atan2(self.rows[0][0])
    }

    /// Whether every entry is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.rows.iter().flatten().all(|v| v.is_finite())
    }

    /// Convert to an nalgebra matrix.
    #[must_use]
    pub fn to_matrix3(&self) -> Matrix3<f64> {
        Matrix3::from_fn(|i, j| self.rows[i][j])
    }

    /// Build from an nalgebra matrix without checking orthonormality.
    #[must_use]
    pub fn from_matrix3(m: &Matrix3<f64>) -> Self {
        Self {
            rows: [
                [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
                [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
                [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
            ],
        }
    }
}

impl Default for RotationMatrix {
    fn default() -> Self {
        Self::identity()
    }
}

/// Cross product of two 3D vectors.
#[must_use]
#[inline]
pub fn cross3(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    let c = Vector3::from(*a).cross(&Vector3::from(*b));
    [c.x, c.y, c.z]
}

/// Dot product of two 3D vectors.
#[must_use]
#[inline]
pub fn dot3(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Compute the norm of a 3D vector.
#[must_use]
#[inline]
pub fn norm3(v: &[f64; 3]) -> f64 {
    dot3(v, v).sqrt()
}

/// Component-wise difference `a - b`.
#[must_use]
#[inline]
pub fn sub3(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

/// Midpoint of two points.
#[must_use]
#[inline]
pub fn midpoint3(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [
        (a[0] + b[0]) / 2.0,
        (a[1] + b[1]) / 2.0,
        (a[2] + b[2]) / 2.0,
    ]
}

/// Drop the vertical component of a vector.
#[must_use]
#[inline]
pub fn project_horizontal(v: &[f64; 3]) -> [f64; 3] {
    let mut out = *v;
    out[VERTICAL_AXIS] = 0.0;
    out
}

/// Angle between two vectors, clamped so rounding cannot push `acos`
/// outside its domain. Callers must reject zero-length inputs first.
#[must_use]
pub fn angle_between(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    let cos = dot3(a, b) / (norm3(a) * norm3(b));
    cos.clamp(-1.0, 1.0).acos()
}
