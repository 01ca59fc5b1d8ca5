//! Chow test statistics for a VAR split at one candidate break.
//!
//! Given the pre- and post-break residual cross-products and the full-sample
//! residuals, [`chow_statistics`] returns the sample-split, break-point and
//! forecast statistics with their degrees of freedom. The function is pure:
//! identical inputs give identical output.
//!
//! All determinants are taken on the log scale through
//! [`log_det_pd`](crate::linear_algebra::log_det_pd), so an input that is not
//! positive definite yields a `NumericalError` instead of `NaN`.

use crate::errors::{validate_finite, ChowResult, ChowTestError};
use crate::linear_algebra::{cross_product, log_det_pd};
use nalgebra::DMatrix;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Shape of the VAR being tested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ModelDimensions {
    /// Lag order `p`
    pub lags: usize,
    /// Endogenous variables `n`
    pub n_endogenous: usize,
    /// Exogenous columns `m` (the intercept is not counted)
    pub n_exogenous: usize,
}

impl ModelDimensions {
    /// Describe a VAR(p) in `n` variables with `m` exogenous columns.
    pub fn new(lags: usize, n_endogenous: usize, n_exogenous: usize) -> Self {
        Self {
            lags,
            n_endogenous,
            n_exogenous,
        }
    }

    /// Minimum subsample size used by the grid builder: `n (1 + p) + m`.
    pub fn param(&self) -> usize {
        self.n_endogenous * (1 + self.lags) + self.n_exogenous
    }

    /// Regressors per equation: intercept, `n p` lags, `m` exogenous.
    pub fn coeff_rows(&self) -> usize {
        1 + self.n_endogenous * self.lags + self.n_exogenous
    }

    /// Deterministic and exogenous regressors per equation (intercept included).
    pub fn exo_count(&self) -> usize {
        1 + self.n_exogenous
    }
}

/// The seven numbers produced for one candidate in one pass.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChowStatistics {
    /// Sample-split statistic
    pub tstat_ss: f64,
    /// Sample-split degrees of freedom
    pub df_ss: f64,
    /// Break-point statistic
    pub tstat_bp: f64,
    /// Break-point degrees of freedom
    pub df_bp: f64,
    /// Forecast statistic
    pub tstat_fc: f64,
    /// Forecast numerator degrees of freedom
    pub df_fc1: f64,
    /// Forecast denominator degrees of freedom
    pub df_fc2: f64,
}

impl ChowStatistics {
    /// The three statistics in SS, BP, FC order.
    pub fn tstats(&self) -> [f64; 3] {
        [self.tstat_ss, self.tstat_bp, self.tstat_fc]
    }
}

/// Inputs for one candidate break.
#[derive(Debug, Clone, Copy)]
pub struct SplitCovariances<'a> {
    /// Pre-break residual count
    pub n1: usize,
    /// Post-break residual count
    pub n2: usize,
    /// Effective sample length
    pub effective_len: usize,
    /// Pooled full-sample covariance at this split
    pub sigma_pooled: &'a DMatrix<f64>,
    /// Pre-break cross-product `u1'u1`
    pub sigma1: &'a DMatrix<f64>,
    /// Post-break cross-product `u2'u2`
    pub sigma2: &'a DMatrix<f64>,
    /// Full-sample residuals
    pub full_residuals: &'a DMatrix<f64>,
}

/// `(u_1'u_1 + u_2'u_2) / (n1 + n2)` with `u_1` the leading `n1` and `u_2` the
/// trailing `n2` rows of the full-sample residuals.
pub fn pooled_covariance(full_residuals: &DMatrix<f64>, n1: usize, n2: usize) -> ChowResult<DMatrix<f64>> {
    let rows = full_residuals.nrows();
    if n1 > rows || n2 > rows || n1 + n2 == 0 {
        return Err(ChowTestError::configuration(format!(
            "cannot slice {} and {} rows from {} full-sample residuals",
            n1, n2, rows
        )));
    }
    let head = full_residuals.rows(0, n1).into_owned();
    let tail = full_residuals.rows(rows - n2, n2).into_owned();
    Ok((cross_product(&head) + cross_product(&tail)) / (n1 + n2) as f64)
}

/// Sample-split, break-point and forecast statistics for one split.
pub fn chow_statistics(input: &SplitCovariances<'_>, dims: &ModelDimensions) -> ChowResult<ChowStatistics> {
    let SplitCovariances {
        n1,
        n2,
        effective_len,
        sigma_pooled,
        sigma1,
        sigma2,
        full_residuals,
    } = *input;

    if n1 == 0 || n2 == 0 || n1 > effective_len {
        return Err(ChowTestError::configuration(format!(
            "invalid split sizes n1 = {}, n2 = {} for T = {}",
            n1, n2, effective_len
        )));
    }

    let p = dims.lags as f64;
    let k = dims.n_endogenous as f64;
    let t = effective_len as f64;
    let n1f = n1 as f64;
    let n2f = n2 as f64;
    let total = n1f + n2f;

    let log_det_pooled = log_det_pd(sigma_pooled, "pooled covariance")?;
    let log_det_1 = log_det_pd(&(sigma1 / n1f), "pre-break covariance")?;
    let log_det_2 = log_det_pd(&(sigma2 / n2f), "post-break covariance")?;
    let log_det_split = log_det_pd(&((sigma1 + sigma2) / total), "split covariance")?;

    let tstat_ss = total * (log_det_pooled - log_det_split);
    let df_ss = p * k * k + k * dims.exo_count() as f64;

    let tstat_bp = total * log_det_pooled - n1f * log_det_1 - n2f * log_det_2;
    let df_bp = df_ss + k * (k + 1.0) / 2.0;

    // Forecast (predictive failure) test with Rao's F approximation.
    let kstar = t - n1f;
    let kk = k * kstar;
    let q = kk / 2.0 - 1.0;
    let big_n = t - dims.coeff_rows() as f64 - kstar - (k - kstar + 1.0) / 2.0;
    let s_den = k * k + kstar * kstar - 5.0;
    let s = if s_den > 0.0 {
        ((kk * kk - 4.0) / s_den).sqrt()
    } else {
        1.0
    };

    let log_det_full = log_det_pd(&(cross_product(full_residuals) / t), "full-sample covariance")?;
    let log_r2 = (k * (n1f / t).ln() + log_det_1 - log_det_full) / s;
    let r2 = log_r2.exp();
    let df_fc2 = (big_n * s - q).round();
    let tstat_fc = ((1.0 - r2) / r2) * df_fc2 / kk;

    validate_finite(tstat_ss, "sample-split statistic")?;
    validate_finite(tstat_bp, "break-point statistic")?;
    validate_finite(tstat_fc, "forecast statistic")?;

    Ok(ChowStatistics {
        tstat_ss,
        df_ss,
        tstat_bp,
        df_bp,
        tstat_fc,
        df_fc1: kk,
        df_fc2,
    })
}
