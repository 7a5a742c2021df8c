use rand::prelude::*;
use serde::{Serialize, Deserialize};
use std::f64::consts::PI;

use crate::error::{NetError, Result};

/// Row-major dense matrix. Layer weights are stored as `outputs × inputs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<f64>>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix {
            rows,
            cols,
            data: vec![vec![0.0; cols]; rows],
        }
    }

    /// Samples a single value from N(0, 1) using the Box-Muller transform.
    /// Both u1 and u2 must be uniform on (0, 1].
    fn sample_standard_normal<R: Rng>(rng: &mut R) -> f64 {
        // Draw two independent uniform samples in (0, 1] to avoid log(0).
        let u1: f64 = 1.0 - rng.gen::<f64>();
        let u2: f64 = 1.0 - rng.gen::<f64>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }

    /// Fan-in scaled initialization: every entry drawn from N(0, 1/sqrt(cols)).
    ///
    /// `cols` is the fan-in (number of input connections).
    pub fn xavier(rows: usize, cols: usize) -> Matrix {
        Matrix::xavier_with(rows, cols, &mut rand::thread_rng())
    }

    /// Same as [`Matrix::xavier`] but draws from the given generator.
    pub fn xavier_with<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> Matrix {
        let std_dev = (1.0 / cols as f64).sqrt();
        let mut res = Matrix::zeros(rows, cols);
        for row in res.data.iter_mut() {
            for w in row.iter_mut() {
                *w = Matrix::sample_standard_normal(rng) * std_dev;
            }
        }
        res
    }

    /// Builds a `rows × cols` matrix, rejecting ragged or mis-sized input.
    pub fn from_rows(rows: usize, cols: usize, data: Vec<Vec<f64>>) -> Result<Matrix> {
        if data.len() != rows {
            return Err(NetError::shape("matrix rows", rows, data.len()));
        }
        if let Some(bad) = data.iter().find(|r| r.len() != cols) {
            return Err(NetError::shape("matrix columns", cols, bad.len()));
        }
        Ok(Matrix { rows, cols, data })
    }

    /// `self · v`; `v` must have `cols` entries.
    pub fn mul_vec(&self, v: &[f64]) -> Vec<f64> {
        self.data
            .iter()
            .map(|row| row.iter().zip(v).map(|(w, x)| w * x).sum())
            .collect()
    }

    /// `selfᵀ · v`; `v` must have `rows` entries.
    pub fn transpose_mul_vec(&self, v: &[f64]) -> Vec<f64> {
        let mut res = vec![0.0; self.cols];
        for (row, scale) in self.data.iter().zip(v) {
            for (acc, w) in res.iter_mut().zip(row) {
                *acc += scale * w;
            }
        }
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;

    #[test]
    fn from_rows_rejects_ragged_data() {
        let err = Matrix::from_rows(2, 2, vec![vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(matches!(err, NetError::Shape { expected: 2, got: 1, .. }));
        assert!(Matrix::from_rows(3, 2, vec![vec![1.0, 2.0]]).is_err());
    }

    #[test]
    fn products_match_hand_computation() {
        let m = Matrix::from_rows(2, 3, vec![vec![1.0, 2.0, 3.0], vec![-1.0, 0.0, 0.5]]).unwrap();
        assert_eq!(m.mul_vec(&[1.0, 1.0, 2.0]), vec![9.0, 0.0]);
        assert_eq!(m.transpose_mul_vec(&[2.0, 4.0]), vec![-2.0, 4.0, 8.0]);
    }

    #[test]
    fn xavier_is_reproducible_and_scaled() {
        let a = Matrix::xavier_with(64, 16, &mut StdRng::seed_from_u64(7));
        let b = Matrix::xavier_with(64, 16, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);

        let n = (a.rows * a.cols) as f64;
        let mean = a.data.iter().flatten().sum::<f64>() / n;
        let var = a.data.iter().flatten().map(|w| (w - mean).powi(2)).sum::<f64>() / n;
        // Expected variance is 1/16.
        assert!(mean.abs() < 0.05, "mean = {}", mean);
        assert!((var - 1.0 / 16.0).abs() < 0.02, "var = {}", var);
    }
}
