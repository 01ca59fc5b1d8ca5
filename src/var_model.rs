//! VAR estimation and simulation.
//!
//! The Chow machinery only needs three things from an estimator: the
//! coefficient matrix, its companion form, and the residuals. [`VarEstimator`]
//! is the seam; [`OlsVarEstimator`] is the equation-by-equation least squares
//! implementation used by default. [`simulate_var`] is the matching simulator
//! used by the bootstrap.
//!
//! Coefficient layout (rows of `coefficients`, one column per equation):
//!
//! ```text
//! row 0                      intercept
//! rows 1 + (i-1) n .. i n    lag i block, i = 1..p
//! rows 1 + n p ..            exogenous regressors
//! ```

use crate::config::CovarianceMode;
use crate::errors::{ChowResult, ChowTestError};
use crate::linear_algebra::{ensure_finite_matrix, newey_west_bandwidth, solve_normal_equations};
use nalgebra::{DMatrix, DVector};

/// Output of a VAR fit on one sample window.
#[derive(Debug, Clone)]
pub struct VarFit {
    /// Lag order `p`
    pub lags: usize,
    /// `(1 + n p + m) x n` coefficient matrix
    pub coefficients: DMatrix<f64>,
    /// `n p x n p` companion matrix
    pub companion: DMatrix<f64>,
    /// `(rows - p) x n` residual matrix
    pub residuals: DMatrix<f64>,
    /// Coefficient standard errors, same layout as `coefficients`
    pub standard_errors: DMatrix<f64>,
}

impl VarFit {
    /// Number of endogenous variables.
    pub fn n_endogenous(&self) -> usize {
        self.coefficients.ncols()
    }

    /// Regressors per equation (`1 + n p + m`).
    pub fn coeff_rows(&self) -> usize {
        self.coefficients.nrows()
    }

    /// Number of exogenous columns `m`.
    pub fn n_exogenous(&self) -> usize {
        self.coeff_rows() - 1 - self.n_endogenous() * self.lags
    }

    /// Intercept of each equation.
    pub fn intercept(&self) -> DVector<f64> {
        self.coefficients.row(0).transpose()
    }

    /// `m x n` block of exogenous coefficients.
    pub fn exogenous_coefficients(&self) -> DMatrix<f64> {
        let start = 1 + self.n_endogenous() * self.lags;
        self.coefficients
            .rows(start, self.coeff_rows() - start)
            .into_owned()
    }

    /// Top `n` rows of the companion matrix: `[A_1 ... A_p]`.
    pub fn companion_block(&self) -> DMatrix<f64> {
        self.companion.rows(0, self.n_endogenous()).into_owned()
    }
}

/// Estimates a VAR(p) with intercept on one sample window.
pub trait VarEstimator: Send + Sync {
    /// Fit `y` (rows = observations) on `p` of its own lags, an intercept and
    /// the contemporaneous rows of `x`. The first `p` rows serve as presample.
    fn estimate(
        &self,
        lags: usize,
        y: &DMatrix<f64>,
        x: &DMatrix<f64>,
        mode: CovarianceMode,
    ) -> ChowResult<VarFit>;
}

/// Equation-by-equation OLS estimator.
#[derive(Debug, Clone, Copy, Default)]
pub struct OlsVarEstimator;

impl OlsVarEstimator {
    /// Create the estimator.
    pub fn new() -> Self {
        Self
    }
}

impl VarEstimator for OlsVarEstimator {
    fn estimate(
        &self,
        lags: usize,
        y: &DMatrix<f64>,
        x: &DMatrix<f64>,
        mode: CovarianceMode,
    ) -> ChowResult<VarFit> {
        let (rows, n) = y.shape();
        if lags == 0 {
            return Err(ChowTestError::InvalidParameter {
                parameter: "lags".to_string(),
                value: 0.0,
                constraint: "must be at least 1".to_string(),
            });
        }
        if x.nrows() != rows {
            return Err(ChowTestError::configuration(format!(
                "estimation window has {} endogenous rows but {} exogenous rows",
                rows,
                x.nrows()
            )));
        }

        let m = x.ncols();
        let k = 1 + n * lags + m;
        if rows <= lags + k {
            return Err(ChowTestError::InsufficientData {
                required: lags + k + 1,
                actual: rows,
            });
        }
        ensure_finite_matrix(y, "var_estimate")?;

        let z = build_regressors(lags, y, x);
        let y_eff = y.rows(lags, rows - lags).into_owned();

        let (coefficients, ztz_inv) = solve_normal_equations(&z, &y_eff)?;
        let residuals = &y_eff - &z * &coefficients;
        let companion = companion_matrix(&coefficients, n, lags);
        let standard_errors = standard_errors(&z, &residuals, &ztz_inv, mode);

        Ok(VarFit {
            lags,
            coefficients,
            companion,
            residuals,
            standard_errors,
        })
    }
}

/// Regressor matrix `[1, y_{t-1}', ..., y_{t-p}', x_t']` for `t = p..rows`.
fn build_regressors(lags: usize, y: &DMatrix<f64>, x: &DMatrix<f64>) -> DMatrix<f64> {
    let (rows, n) = y.shape();
    let m = x.ncols();
    let k = 1 + n * lags + m;

    DMatrix::from_fn(rows - lags, k, |t, col| {
        let obs = t + lags;
        if col == 0 {
            1.0
        } else if col <= n * lags {
            let lag = (col - 1) / n + 1;
            let var = (col - 1) % n;
            y[(obs - lag, var)]
        } else {
            x[(obs, col - 1 - n * lags)]
        }
    })
}

/// Companion matrix of a VAR(p) from its coefficient matrix.
///
/// Entry `(j, (i-1) n + v)` of the top block is the coefficient of `y_{t-i, v}`
/// in equation `j`; the lower block shifts the state by one lag.
pub fn companion_matrix(coefficients: &DMatrix<f64>, n: usize, lags: usize) -> DMatrix<f64> {
    let dim = n * lags;
    let mut companion = DMatrix::zeros(dim, dim);

    for eq in 0..n {
        for col in 0..dim {
            companion[(eq, col)] = coefficients[(1 + col, eq)];
        }
    }
    for i in n..dim {
        companion[(i, i - n)] = 1.0;
    }
    companion
}

fn standard_errors(
    z: &DMatrix<f64>,
    residuals: &DMatrix<f64>,
    ztz_inv: &DMatrix<f64>,
    mode: CovarianceMode,
) -> DMatrix<f64> {
    let (t, k) = z.shape();
    let n = residuals.ncols();
    let mut se = DMatrix::zeros(k, n);

    for eq in 0..n {
        let u = residuals.column(eq);
        let cov = match mode {
            CovarianceMode::Classical => {
                let dof = if t > k { t - k } else { t };
                let sigma2 = u.norm_squared() / dof as f64;
                ztz_inv * sigma2
            }
            CovarianceMode::Hc => {
                let mut meat = DMatrix::zeros(k, k);
                for s in 0..t {
                    let zs = z.row(s).transpose();
                    meat += &zs * zs.transpose() * (u[s] * u[s]);
                }
                ztz_inv * meat * ztz_inv
            }
            CovarianceMode::Hac => {
                let bandwidth = newey_west_bandwidth(t);
                let mut meat = DMatrix::zeros(k, k);
                for s in 0..t {
                    let zs = z.row(s).transpose();
                    meat += &zs * zs.transpose() * (u[s] * u[s]);
                }
                for lag in 1..=bandwidth {
                    let weight = 1.0 - lag as f64 / (bandwidth + 1) as f64;
                    let mut gamma = DMatrix::zeros(k, k);
                    for s in lag..t {
                        let zs = z.row(s).transpose();
                        let zl = z.row(s - lag);
                        gamma += &zs * zl * (u[s] * u[s - lag]);
                    }
                    meat += (&gamma + gamma.transpose()) * weight;
                }
                ztz_inv * meat * ztz_inv
            }
        };

        for r in 0..k {
            se[(r, eq)] = cov[(r, r)].max(0.0).sqrt();
        }
    }
    se
}

/// Simulate `y_t = A_1 y_{t-1} + ... + A_p y_{t-p} + e_t`.
///
/// `block` is the `n x n p` top block of the companion matrix, `shocks` holds
/// one row per simulated period (intercept and exogenous effects included), and
/// `initial` supplies the `p` starting rows, oldest first. The returned path has
/// `p + shocks.nrows()` rows and starts with `initial`.
pub fn simulate_var(
    block: &DMatrix<f64>,
    shocks: &DMatrix<f64>,
    initial: &DMatrix<f64>,
) -> ChowResult<DMatrix<f64>> {
    let n = block.nrows();
    let lags = initial.nrows();
    if lags == 0 || block.ncols() != n * lags {
        return Err(ChowTestError::configuration(format!(
            "companion block is {}x{} but {} initial rows were supplied",
            n,
            block.ncols(),
            lags
        )));
    }
    if shocks.ncols() != n || initial.ncols() != n {
        return Err(ChowTestError::configuration(format!(
            "shocks have {} columns and initial values {}, expected {}",
            shocks.ncols(),
            initial.ncols(),
            n
        )));
    }

    let steps = shocks.nrows();
    let mut path = DMatrix::zeros(lags + steps, n);
    path.rows_mut(0, lags).copy_from(initial);

    for s in 0..steps {
        let t = lags + s;
        for eq in 0..n {
            let mut value = shocks[(s, eq)];
            for lag in 1..=lags {
                for var in 0..n {
                    value += block[(eq, (lag - 1) * n + var)] * path[(t - lag, var)];
                }
            }
            path[(t, eq)] = value;
        }
    }

    ensure_finite_matrix(&path, "simulate_var")?;
    Ok(path)
}
