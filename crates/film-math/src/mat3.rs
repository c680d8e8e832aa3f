//! Row-major 3x3 matrix for tristimulus transforms.
//!
//! Column-vector convention, `result = m * v`:
//!
//! ```text
//! | m00 m01 m02 |   | x |
//! | m10 m11 m12 | * | y |
//! | m20 m21 m22 |   | z |
//! ```
//!
//! # Usage
//!
//! ```rust
//! use film_math::Mat3;
//!
//! let m = Mat3::from_rows([[2.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 0.5]]);
//! assert_eq!(m.transform([1.0, 1.0, 1.0]), [2.0, 1.0, 0.5]);
//! ```

use std::ops::Mul;

/// A 3x3 matrix stored as rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat3 {
    /// Matrix elements in row-major order.
    pub m: [[f32; 3]; 3],
}

impl Mat3 {
    /// Identity matrix.
    pub const IDENTITY: Self = Self {
        m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    };

    /// Creates a matrix from row arrays.
    #[inline]
    pub const fn from_rows(rows: [[f32; 3]; 3]) -> Self {
        Self { m: rows }
    }

    /// Applies the matrix to a column vector.
    #[inline]
    pub fn transform(&self, v: [f32; 3]) -> [f32; 3] {
        let m = &self.m;
        [
            m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
            m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
            m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
        ]
    }

    /// Matrix inverse, or `None` when singular.
    pub fn inverse(&self) -> Option<Self> {
        let g = self.to_glam();
        if g.determinant().abs() < 1e-12 {
            return None;
        }
        Some(Self::from_glam(g.inverse()))
    }

    /// Converts to glam Mat3 (column-major).
    #[inline]
    pub fn to_glam(&self) -> glam::Mat3 {
        glam::Mat3::from_cols_array_2d(&[
            [self.m[0][0], self.m[1][0], self.m[2][0]],
            [self.m[0][1], self.m[1][1], self.m[2][1]],
            [self.m[0][2], self.m[1][2], self.m[2][2]],
        ])
    }

    /// Creates from glam Mat3.
    #[inline]
    pub fn from_glam(g: glam::Mat3) -> Self {
        let c = g.to_cols_array_2d();
        Self::from_rows([
            [c[0][0], c[1][0], c[2][0]],
            [c[0][1], c[1][1], c[2][1]],
            [c[0][2], c[1][2], c[2][2]],
        ])
    }
}

impl Default for Mat3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Mat3 {
    type Output = Mat3;

    fn mul(self, rhs: Mat3) -> Mat3 {
        Mat3::from_glam(self.to_glam() * rhs.to_glam())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const XYZ_TO_SRGB: Mat3 = Mat3::from_rows([
        [3.2404542, -1.5371385, -0.4985314],
        [-0.9692660, 1.8760108, 0.0415560],
        [0.0556434, -0.2040259, 1.0572252],
    ]);

    #[test]
    fn test_inverse_round_trip() {
        let inv = XYZ_TO_SRGB.inverse().unwrap();
        let id = XYZ_TO_SRGB * inv;
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((id.m[i][j] - expected).abs() < 1e-5);
            }
        }
        // sRGB white maps to D65 Y = 1
        let xyz = inv.transform([1.0, 1.0, 1.0]);
        assert!((xyz[1] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_singular() {
        let m = Mat3::from_rows([[1.0, 2.0, 3.0], [2.0, 4.0, 6.0], [0.0, 0.0, 1.0]]);
        assert!(m.inverse().is_none());
    }

    #[test]
    fn test_glam_layout() {
        let m = Mat3::from_rows([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]);
        assert_eq!(Mat3::from_glam(m.to_glam()), m);
        let v = m.to_glam() * glam::Vec3::new(1.0, 0.0, 0.0);
        assert_eq!(v.to_array(), [1.0, 4.0, 7.0]);
    }
}
