//! Two-dimensional lookup grids.
//!
//! [`Grid2d`] stores values on a rectilinear grid and answers queries by
//! bilinear interpolation. Queries outside the axes clamp to the nearest edge;
//! the grid never extrapolates.

use crate::interp::{inverse_lerp, lerp};
use thiserror::Error;

/// Errors raised when building a lookup table.
#[derive(Debug, Error, PartialEq)]
pub enum TableError {
    /// An axis has no samples.
    #[error("axis '{0}' is empty")]
    EmptyAxis(&'static str),

    /// An axis is not strictly increasing.
    #[error("axis '{0}' must be strictly increasing")]
    NotIncreasing(&'static str),

    /// Value count does not match the axes.
    #[error("expected {expected} values, got {got}")]
    ValueCount {
        /// `xs.len() * ys.len()`
        expected: usize,
        /// Supplied count
        got: usize,
    },
}

/// Bilinear lookup grid, `values[iy * xs.len() + ix]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid2d {
    xs: Vec<f32>,
    ys: Vec<f32>,
    values: Vec<f32>,
}

fn check_axis(axis: &[f32], name: &'static str) -> Result<(), TableError> {
    if axis.is_empty() {
        return Err(TableError::EmptyAxis(name));
    }
    if axis.windows(2).any(|w| !(w[1] > w[0])) {
        return Err(TableError::NotIncreasing(name));
    }
    Ok(())
}

/// Lower index and blend factor for `v` on `axis`, clamped to the ends.
fn locate(axis: &[f32], v: f32) -> (usize, f32) {
    let n = axis.len();
    if n == 1 || v.is_nan() || v <= axis[0] {
        return (0, 0.0);
    }
    if v >= axis[n - 1] {
        return (n - 2, 1.0);
    }
    let i = axis.partition_point(|&a| a <= v).saturating_sub(1).min(n - 2);
    (i, inverse_lerp(axis[i], axis[i + 1], v))
}

impl Grid2d {
    /// Builds a grid, validating axes and value count.
    pub fn new(xs: Vec<f32>, ys: Vec<f32>, values: Vec<f32>) -> Result<Self, TableError> {
        check_axis(&xs, "x")?;
        check_axis(&ys, "y")?;
        let expected = xs.len() * ys.len();
        if values.len() != expected {
            return Err(TableError::ValueCount {
                expected,
                got: values.len(),
            });
        }
        Ok(Self { xs, ys, values })
    }

    /// X axis samples.
    pub fn xs(&self) -> &[f32] {
        &self.xs
    }

    /// Y axis samples.
    pub fn ys(&self) -> &[f32] {
        &self.ys
    }

    /// Value at grid node `(ix, iy)`.
    pub fn node(&self, ix: usize, iy: usize) -> f32 {
        self.values[iy * self.xs.len() + ix]
    }

    /// Bilinear lookup, clamped to the grid domain.
    ///
    /// ```rust
    /// use film_math::Grid2d;
    ///
    /// let g = Grid2d::new(vec![0.0, 1.0], vec![0.0, 1.0], vec![0.0, 1.0, 2.0, 3.0]).unwrap();
    /// assert_eq!(g.sample(0.5, 0.5), 1.5);
    /// assert_eq!(g.sample(-4.0, 9.0), 2.0);
    /// ```
    pub fn sample(&self, x: f32, y: f32) -> f32 {
        let (ix, tx) = locate(&self.xs, x);
        let (iy, ty) = locate(&self.ys, y);
        let ix1 = (ix + 1).min(self.xs.len() - 1);
        let iy1 = (iy + 1).min(self.ys.len() - 1);

        let top = lerp(self.node(ix, iy), self.node(ix1, iy), tx);
        let bottom = lerp(self.node(ix, iy1), self.node(ix1, iy1), tx);
        lerp(top, bottom, ty)
    }

    /// Returns `true` if `(x, y)` lies inside the axes (inclusive).
    pub fn contains(&self, x: f32, y: f32) -> bool {
        let (x0, x1) = (self.xs[0], self.xs[self.xs.len() - 1]);
        let (y0, y1) = (self.ys[0], self.ys[self.ys.len() - 1]);
        (x0..=x1).contains(&x) && (y0..=y1).contains(&y)
    }
}
