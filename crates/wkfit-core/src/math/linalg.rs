//! Linear algebra operations
//!
//! Thin wrapper around nalgebra. All ndarray <-> nalgebra conversions
//! live here so the fitting code only sees ndarray types.

use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2};
use num_complex::Complex64;

/// Result of least squares solve
#[derive(Debug, Clone)]
pub struct LstsqResult {
    pub solution: Vec<f64>,
    /// Number of singular values above the cut-off
    pub rank: usize,
    /// sigma_max / sigma_min, infinite when rank deficient
    pub condition: f64,
}

impl LstsqResult {
    /// True when the system had fewer independent columns than unknowns
    pub fn is_rank_deficient(&self) -> bool {
        self.rank < self.solution.len()
    }
}

#[inline]
fn to_na_real(a: &Array2<f64>) -> DMatrix<f64> {
    let (m, n) = a.dim();
    DMatrix::from_fn(m, n, |i, j| a[[i, j]])
}

// ============================================================================
// Least Squares
// ============================================================================

/// Solve the least squares problem Ax = b using SVD
///
/// Singular values below `eps * max(m, n) * sigma_max` are treated as zero,
/// so a rank-deficient system yields the minimum-norm solution instead of
/// an error.
pub fn lstsq(a: &Array2<f64>, b: &Array1<f64>) -> Result<LstsqResult, &'static str> {
    let (m, n) = a.dim();
    if m == 0 || n == 0 {
        return Err("Empty matrix");
    }
    if b.len() != m {
        return Err("Dimension mismatch");
    }

    let a_na = to_na_real(a);
    let b_na = DVector::from_fn(m, |i, _| b[i]);

    let svd = a_na.svd(true, true);

    let singular_values: Vec<f64> = svd.singular_values.iter().cloned().collect();
    let sigma_max = singular_values.iter().cloned().fold(0.0, f64::max);
    let cutoff = f64::EPSILON * m.max(n) as f64 * sigma_max;

    let rank = singular_values.iter().filter(|&&s| s > cutoff).count();

    let solution = svd.solve(&b_na, cutoff).map_err(|_| "SVD solve failed")?;
    let x: Vec<f64> = solution.iter().cloned().collect();

    if x.iter().any(|v| !v.is_finite()) {
        return Err("SVD solve produced non-finite values");
    }

    let sigma_min = singular_values.iter().cloned().fold(f64::INFINITY, f64::min);
    let condition = if sigma_min > cutoff && sigma_min > 0.0 {
        sigma_max / sigma_min
    } else {
        f64::INFINITY
    };

    Ok(LstsqResult {
        solution: x,
        rank,
        condition,
    })
}

// ============================================================================
// Real/imaginary stacking
// ============================================================================

/// Stack a complex matrix as `[Re(A); Im(A)]`
pub fn stack_real_imag_matrix(a: &Array2<Complex64>) -> Array2<f64> {
    let (rows, cols) = a.dim();
    let mut result = Array2::<f64>::zeros((2 * rows, cols));
    for i in 0..rows {
        for j in 0..cols {
            result[[i, j]] = a[[i, j]].re;
            result[[rows + i, j]] = a[[i, j]].im;
        }
    }
    result
}

/// Stack a complex vector as `[Re(v); Im(v)]`
pub fn stack_real_imag_vector(v: &Array1<Complex64>) -> Array1<f64> {
    let n = v.len();
    let mut result = Array1::<f64>::zeros(2 * n);
    for i in 0..n {
        result[i] = v[i].re;
        result[n + i] = v[i].im;
    }
    result
}
