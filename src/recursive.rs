//! Recursive subsample estimation.
//!
//! Two mirrored expanding-window passes run over a [`BreakpointGrid`]: the
//! forward pass fixes the window start at the first row and moves the end one
//! row per candidate, the backward pass fixes the end at the last row and moves
//! the start. Each window is re-estimated from scratch and contributes its
//! residual count and residual cross-product.

use crate::config::CovarianceMode;
use crate::errors::{ChowResult, ChowTestError};
use crate::grid::{ensure_matching_passes, BreakpointGrid};
use crate::linear_algebra::cross_product;
use crate::sample::{SampleWindow, VarData};
use crate::statistics::{chow_statistics, pooled_covariance, ChowStatistics, ModelDimensions, SplitCovariances};
use crate::var_model::VarEstimator;
use nalgebra::DMatrix;

/// Residual count and cross-product of one subsample fit.
#[derive(Debug, Clone)]
pub struct SubsampleFit {
    /// Residual rows
    pub len: usize,
    /// `u'u`
    pub cross_product: DMatrix<f64>,
}

/// Output of both passes, indexed by candidate.
#[derive(Debug, Clone)]
pub struct RecursivePasses {
    /// Pre-break fits (forward pass)
    pub forward: Vec<SubsampleFit>,
    /// Post-break fits (backward pass)
    pub backward: Vec<SubsampleFit>,
}

/// Drives the forward and backward passes with a VAR estimator.
#[derive(Debug)]
pub struct RecursiveEstimator<'a, E: VarEstimator + ?Sized> {
    estimator: &'a E,
    dims: ModelDimensions,
    covariance: CovarianceMode,
}

impl<'a, E: VarEstimator + ?Sized> RecursiveEstimator<'a, E> {
    /// Wrap an estimator for a model of the given shape.
    pub fn new(estimator: &'a E, dims: ModelDimensions, covariance: CovarianceMode) -> Self {
        Self {
            estimator,
            dims,
            covariance,
        }
    }

    /// Run both passes over `grid` on `data`.
    pub fn run_passes(&self, data: &VarData, grid: &BreakpointGrid) -> ChowResult<RecursivePasses> {
        let forward = (0..grid.iterat())
            .map(|i| {
                let fit = self.fit_window(data, grid.forward_window(i))?;
                self.check_pre_break(fit.len)?;
                self.check_rank(fit.len, "pre-break")?;
                Ok(fit)
            })
            .collect::<ChowResult<Vec<_>>>()?;

        let backward = (0..grid.iterat())
            .map(|i| {
                let fit = self.fit_window(data, grid.backward_window(i))?;
                self.check_post_break(fit.len)?;
                self.check_rank(fit.len, "post-break")?;
                Ok(fit)
            })
            .collect::<ChowResult<Vec<_>>>()?;

        ensure_matching_passes(forward.len(), backward.len())?;
        Ok(RecursivePasses { forward, backward })
    }

    /// Chow statistics for every candidate of `grid`.
    ///
    /// `full_residuals` are the residuals of the full-sample fit on the same
    /// data; they supply the pooled covariance and the forecast-test
    /// denominator.
    pub fn grid_statistics(
        &self,
        data: &VarData,
        grid: &BreakpointGrid,
        full_residuals: &DMatrix<f64>,
    ) -> ChowResult<Vec<ChowStatistics>> {
        let passes = self.run_passes(data, grid)?;
        passes
            .forward
            .iter()
            .zip(passes.backward.iter())
            .map(|(pre, post)| {
                let pooled = pooled_covariance(full_residuals, pre.len, post.len)?;
                let input = SplitCovariances {
                    n1: pre.len,
                    n2: post.len,
                    effective_len: grid.effective_len,
                    sigma_pooled: &pooled,
                    sigma1: &pre.cross_product,
                    sigma2: &post.cross_product,
                    full_residuals,
                };
                chow_statistics(&input, &self.dims)
            })
            .collect()
    }

    fn fit_window(&self, data: &VarData, window: SampleWindow) -> ChowResult<SubsampleFit> {
        let y = data.endogenous_window(window);
        let x = data.exogenous_window(window);
        let fit = self
            .estimator
            .estimate(self.dims.lags, &y, &x, self.covariance)?;
        Ok(SubsampleFit {
            len: fit.residuals.nrows(),
            cross_product: cross_product(&fit.residuals),
        })
    }

    fn check_pre_break(&self, n1: usize) -> ChowResult<()> {
        if n1 <= self.dims.n_endogenous {
            return Err(ChowTestError::configuration(format!(
                "starting sample smaller than parameters: {} residuals for {} variables",
                n1, self.dims.n_endogenous
            )));
        }
        Ok(())
    }

    fn check_post_break(&self, n2: usize) -> ChowResult<()> {
        if n2 < self.dims.param() {
            return Err(ChowTestError::configuration(format!(
                "ending sample smaller than parameters: {} residuals for {} parameters",
                n2,
                self.dims.param()
            )));
        }
        Ok(())
    }

    /// Residuals of a window with `coeff_rows` regressors span at most
    /// `len - coeff_rows` dimensions, so fewer than `n` leaves `u'u` singular.
    fn check_rank(&self, len: usize, side: &str) -> ChowResult<()> {
        let dof = len.saturating_sub(self.dims.coeff_rows());
        if dof < self.dims.n_endogenous {
            return Err(ChowTestError::numerical(
                format!(
                    "{} covariance is not positive definite: {} residuals leave {} degrees of freedom for {} variables",
                    side, len, dof, self.dims.n_endogenous
                ),
                "recursive_estimation",
            ));
        }
        Ok(())
    }
}
