//! Linear algebra operations for VAR estimation and Chow statistics
//!
//! Thin helpers over `nalgebra` dense matrices: residual cross-products,
//! log-determinants through a Cholesky factorisation (the only way determinants
//! are taken in this crate), normal-equation solves, and the Newey-West
//! bandwidth rule used by the HAC covariance mode.

use crate::errors::{ChowResult, ChowTestError};
use nalgebra::{DMatrix, DVector};

/// Validates that a matrix contains no NaN or Inf values
pub fn ensure_finite_matrix(a: &DMatrix<f64>, operation: &str) -> ChowResult<()> {
    for j in 0..a.ncols() {
        for i in 0..a.nrows() {
            let val = a[(i, j)];
            if !val.is_finite() {
                return Err(ChowTestError::numerical(
                    format!("Non-finite value ({}) at position [{},{}]", val, i, j),
                    operation,
                ));
            }
        }
    }
    Ok(())
}

/// Residual cross-product `u'u`.
pub fn cross_product(u: &DMatrix<f64>) -> DMatrix<f64> {
    u.tr_mul(u)
}

/// Natural log of the determinant of a symmetric positive definite matrix.
///
/// The factorisation doubles as the positive-definiteness check: a matrix
/// without a Cholesky factor is rejected with a `NumericalError` naming it.
pub fn log_det_pd(a: &DMatrix<f64>, name: &str) -> ChowResult<f64> {
    if !a.is_square() || a.nrows() == 0 {
        return Err(ChowTestError::numerical(
            format!("{} must be a non-empty square matrix, got {}x{}", name, a.nrows(), a.ncols()),
            "log_det_pd",
        ));
    }
    ensure_finite_matrix(a, "log_det_pd")?;

    let chol = a.clone().cholesky().ok_or_else(|| {
        ChowTestError::numerical(format!("{} is not positive definite", name), "log_det_pd")
    })?;

    let l = chol.l();
    let log_det = 2.0 * l.diagonal().iter().map(|d| d.ln()).sum::<f64>();

    if !log_det.is_finite() {
        return Err(ChowTestError::numerical(
            format!("log-determinant of {} is not finite", name),
            "log_det_pd",
        ));
    }
    Ok(log_det)
}

/// Column means of an observation-by-variable matrix.
pub fn column_means(a: &DMatrix<f64>) -> DVector<f64> {
    let n = a.nrows().max(1) as f64;
    DVector::from_iterator(a.ncols(), a.column_iter().map(|c| c.sum() / n))
}

/// Least squares `Y = Z B + U` via the normal equations.
///
/// Returns `(B, (Z'Z)^{-1})`. A rank-deficient `Z` makes `Z'Z` singular and is
/// reported as a `NumericalError`.
pub fn solve_normal_equations(
    z: &DMatrix<f64>,
    y: &DMatrix<f64>,
) -> ChowResult<(DMatrix<f64>, DMatrix<f64>)> {
    if z.nrows() != y.nrows() {
        return Err(ChowTestError::numerical(
            format!(
                "Regressor rows ({}) do not match response rows ({})",
                z.nrows(),
                y.nrows()
            ),
            "solve_normal_equations",
        ));
    }
    if z.nrows() < z.ncols() {
        return Err(ChowTestError::numerical(
            format!(
                "Underdetermined system: {} observations for {} regressors",
                z.nrows(),
                z.ncols()
            ),
            "solve_normal_equations",
        ));
    }

    let ztz = z.tr_mul(z);
    let chol = ztz.cholesky().ok_or_else(|| {
        ChowTestError::numerical(
            "Regressor cross-product is singular",
            "solve_normal_equations",
        )
    })?;

    let beta = chol.solve(&z.tr_mul(y));
    let ztz_inv = chol.inverse();
    Ok((beta, ztz_inv))
}

/// Newey-West automatic bandwidth selection: `floor(4 (n/100)^(2/9))`,
/// clamped to `[1, n/4]`.
pub fn newey_west_bandwidth(n: usize) -> usize {
    if n <= 2 {
        return 1;
    }

    let raw = (4.0 * (n as f64 / 100.0).powf(2.0 / 9.0)).floor() as usize;
    let upper = (n / 4).max(1).min(n.saturating_sub(1));
    raw.clamp(1, upper)
}

/// Stack `copies` copies of `a` vertically.
pub fn stack_rows(a: &DMatrix<f64>, copies: usize) -> DMatrix<f64> {
    let rows = a.nrows();
    DMatrix::from_fn(rows * copies, a.ncols(), |i, j| a[(i % rows, j)])
}
