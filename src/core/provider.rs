//! Oracles consumed by the sampler.
//!
//! The engine never sees a precision matrix directly; it only asks for a gradient at a
//! position, a product with a vector, or a single column. [`DensePrecisionTarget`]
//! implements all three for a (truncated) Gaussian and serves as the reference target
//! in tests and the Python bindings.

use crate::error::{Error, Result};

/// Gradient of the log-density at a position.
pub trait GradientProvider: Send + Sync {
    fn dimension(&self) -> usize;

    /// Log-density gradient at `position`.
    fn gradient_log_density(&self, position: &[f64]) -> Result<Vec<f64>>;
}

/// Precision · vector.
pub trait PrecisionProductProvider: Send + Sync {
    fn dimension(&self) -> usize;

    fn product_with_precision(&self, vector: &[f64]) -> Result<Vec<f64>>;
}

/// Single precision-matrix column, used for rank-1 action refreshes.
pub trait PrecisionColumnProvider: Send + Sync {
    fn dimension(&self) -> usize;

    /// Column `index`. Errors with `Error::IndexOutOfRange` for `index >= dimension()`.
    fn column(&self, index: usize) -> Result<Vec<f64>>;
}

/// Gaussian energy `(x - mu)' P (x - mu) / 2` with a dense symmetric precision `P`.
#[derive(Debug, Clone, PartialEq)]
pub struct DensePrecisionTarget {
    dim: usize,
    /// Row-major `dim x dim`.
    precision: Vec<f64>,
    mean: Vec<f64>,
}

/// Relative tolerance for the symmetry check.
const SYMMETRY_TOL: f64 = 1e-10;

impl DensePrecisionTarget {
    /// Build from a row-major square matrix and an optional mean (zero by default).
    ///
    /// Errors:
    /// - `Error::InvalidParam` if the matrix is empty, not square, not symmetric or not finite.
    /// - `Error::DimensionMismatch` if `mean` has the wrong length.
    pub fn new(precision: Vec<f64>, dim: usize, mean: Option<Vec<f64>>) -> Result<Self> {
        if dim == 0 {
            return Err(Error::InvalidParam("precision must be at least 1x1".into()));
        }
        if precision.len() != dim * dim {
            return Err(Error::InvalidParam(format!(
                "precision must have {} entries for dim {dim}, got {}",
                dim * dim,
                precision.len()
            )));
        }
        if !precision.iter().all(|x| x.is_finite()) {
            return Err(Error::InvalidParam("precision entries must be finite".into()));
        }
        for i in 0..dim {
            for j in (i + 1)..dim {
                let (a, b) = (precision[i * dim + j], precision[j * dim + i]);
                let scale = a.abs().max(b.abs()).max(1.0);
                if (a - b).abs() > SYMMETRY_TOL * scale {
                    return Err(Error::InvalidParam(format!(
                        "precision must be symmetric: P[{i},{j}] = {a}, P[{j},{i}] = {b}"
                    )));
                }
            }
        }
        let mean = match mean {
            Some(m) => {
                if m.len() != dim {
                    return Err(Error::DimensionMismatch {
                        what: "mean",
                        expected: dim,
                        actual: m.len(),
                    });
                }
                if !m.iter().all(|x| x.is_finite()) {
                    return Err(Error::InvalidParam("mean entries must be finite".into()));
                }
                m
            }
            None => vec![0.0; dim],
        };
        Ok(Self {
            dim,
            precision,
            mean,
        })
    }

    /// Build from rows.
    pub fn from_rows(rows: &[Vec<f64>], mean: Option<Vec<f64>>) -> Result<Self> {
        let dim = rows.len();
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != dim) {
            return Err(Error::InvalidParam(format!(
                "precision row {i} has {} entries, expected {dim}",
                row.len()
            )));
        }
        Self::new(rows.concat(), dim, mean)
    }

    /// Identity precision, zero mean.
    pub fn identity(dim: usize) -> Result<Self> {
        let mut precision = vec![0.0; dim * dim];
        for i in 0..dim {
            precision[i * dim + i] = 1.0;
        }
        Self::new(precision, dim, None)
    }

    #[inline]
    pub fn entry(&self, row: usize, col: usize) -> f64 {
        self.precision[row * self.dim + col]
    }

    fn multiply(&self, vector: &[f64]) -> Vec<f64> {
        self.precision
            .chunks_exact(self.dim)
            .map(|row| row.iter().zip(vector).map(|(a, b)| a * b).sum())
            .collect()
    }

    fn check_input(&self, what: &'static str, v: &[f64]) -> Result<()> {
        if v.len() != self.dim {
            return Err(Error::DimensionMismatch {
                what,
                expected: self.dim,
                actual: v.len(),
            });
        }
        Ok(())
    }
}

impl GradientProvider for DensePrecisionTarget {
    fn dimension(&self) -> usize {
        self.dim
    }

    fn gradient_log_density(&self, position: &[f64]) -> Result<Vec<f64>> {
        self.check_input("position", position)?;
        let centered: Vec<f64> = position.iter().zip(&self.mean).map(|(x, m)| x - m).collect();
        Ok(self.multiply(&centered).into_iter().map(|g| -g).collect())
    }
}

impl PrecisionProductProvider for DensePrecisionTarget {
    fn dimension(&self) -> usize {
        self.dim
    }

    fn product_with_precision(&self, vector: &[f64]) -> Result<Vec<f64>> {
        self.check_input("vector", vector)?;
        Ok(self.multiply(vector))
    }
}

impl PrecisionColumnProvider for DensePrecisionTarget {
    fn dimension(&self) -> usize {
        self.dim
    }

    fn column(&self, index: usize) -> Result<Vec<f64>> {
        if index >= self.dim {
            return Err(Error::IndexOutOfRange {
                index,
                dim: self.dim,
            });
        }
        // Symmetric: column == row.
        let start = index * self.dim;
        Ok(self.precision[start..start + self.dim].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tridiagonal() -> Result<DensePrecisionTarget> {
        DensePrecisionTarget::from_rows(
            &[
                vec![2.0, -1.0, 0.0],
                vec![-1.0, 2.0, -1.0],
                vec![0.0, -1.0, 2.0],
            ],
            Some(vec![1.0, 0.0, -1.0]),
        )
    }

    #[test]
    fn gradient_is_minus_precision_times_offset() -> Result<()> {
        let t = tridiagonal()?;
        let g = t.gradient_log_density(&[1.0, 1.0, -1.0])?;
        // offset (0, 1, 0) -> P offset = (-1, 2, -1)
        assert_eq!(g, vec![1.0, -2.0, 1.0]);
        Ok(())
    }

    #[test]
    fn product_and_columns_agree() -> Result<()> {
        let t = tridiagonal()?;
        let e1 = t.product_with_precision(&[0.0, 1.0, 0.0])?;
        assert_eq!(e1, t.column(1)?);
        Ok(())
    }

    #[test]
    fn column_out_of_range() -> Result<()> {
        let t = tridiagonal()?;
        assert!(matches!(
            t.column(3),
            Err(Error::IndexOutOfRange { index: 3, dim: 3 })
        ));
        Ok(())
    }

    #[test]
    fn asymmetric_rejected() {
        let err =
            DensePrecisionTarget::from_rows(&[vec![1.0, 0.5], vec![0.0, 1.0]], None).unwrap_err();
        assert!(err.to_string().contains("symmetric"));
    }

    #[test]
    fn ragged_rows_rejected() {
        assert!(DensePrecisionTarget::from_rows(&[vec![1.0, 0.0], vec![1.0]], None).is_err());
    }

    #[test]
    fn wrong_length_vector_rejected() -> Result<()> {
        let t = DensePrecisionTarget::identity(2)?;
        assert!(matches!(
            t.product_with_precision(&[1.0]),
            Err(Error::DimensionMismatch { .. })
        ));
        Ok(())
    }
}
