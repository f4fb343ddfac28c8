//! Linear algebra operations
//!
//! Dense solves are delegated to nalgebra; the ndarray <-> nalgebra
//! conversions are contained here so callers only see ndarray types.

use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2};

use crate::error::{DeembedError, Result};

/// Result of least squares solve
pub struct LstsqResult {
    pub solution: Vec<f64>,
    /// Ratio of largest to smallest singular value
    pub condition: f64,
}

/// Convert ndarray Array2<f64> to nalgebra DMatrix<f64>
#[inline]
fn to_na_real(a: &Array2<f64>) -> DMatrix<f64> {
    let (m, n) = a.dim();
    DMatrix::from_fn(m, n, |i, j| a[[i, j]])
}

/// Solve least squares problem Ax = b using SVD
///
/// Returns the solution vector and the condition number of `a`.
pub fn lstsq(a: &Array2<f64>, b: &Array1<f64>) -> Result<LstsqResult> {
    let (m, n) = a.dim();
    if m == 0 || n == 0 {
        return Err(DeembedError::InvalidParameter(
            "least squares: empty matrix".into(),
        ));
    }
    if b.len() != m {
        return Err(DeembedError::InvalidParameter(format!(
            "least squares: {} rows but {} observations",
            m,
            b.len()
        )));
    }

    let a_na = to_na_real(a);
    let b_na = DVector::from_fn(m, |i, _| b[i]);

    let svd = a_na.svd(true, true);
    let solution = svd
        .solve(&b_na, 1e-14)
        .map_err(|e| DeembedError::InvalidParameter(format!("least squares: {e}")))?;

    let smax = svd.singular_values.iter().cloned().fold(0.0_f64, f64::max);
    let smin = svd.singular_values.iter().cloned().fold(f64::INFINITY, f64::min);
    let condition = if smin > 1e-15 { smax / smin } else { f64::INFINITY };

    Ok(LstsqResult {
        solution: solution.iter().cloned().collect(),
        condition,
    })
}
