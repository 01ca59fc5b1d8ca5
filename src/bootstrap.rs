//! Residual-resampling bootstrap for the Chow statistics.
//!
//! Each replicate resamples rows of a centered residual pool (re-inflated with
//! the intercept and any exogenous component), simulates a new series from the
//! fitted VAR, and re-runs full-sample estimation plus both recursive passes
//! over the grid built on the original data. Empirical p-values count how often
//! a replicate statistic strictly exceeds the original one.
//!
//! Two schedules are supported (see [`BootstrapSchedule`]):
//!
//! - `SingleStream`: one [`BootstrapRng`] is created from the seed right before
//!   the first replicate and lent to every replicate in turn.
//! - `PerReplicate`: replicate `r` owns a stream seeded with
//!   `mix_seed(seed, r)`. With the `parallel` feature replicates run on the
//!   rayon pool; results are always aggregated in replicate order, so the
//!   outcome does not depend on the feature.

use crate::config::{BootstrapSchedule, CovarianceMode, BURN_IN_COPIES};
use crate::errors::{ChowResult, ChowTestError};
use crate::grid::BreakpointGrid;
use crate::linear_algebra::{column_means, stack_rows};
use crate::recursive::RecursiveEstimator;
use crate::resampling::{mix_seed, BootstrapRng, Resampler, RowResampler};
use crate::sample::VarData;
use crate::statistics::{ChowStatistics, ModelDimensions};
use crate::var_model::{simulate_var, VarEstimator, VarFit};
use nalgebra::DMatrix;

/// What the bootstrap is run against: the original data, its full-sample fit,
/// the grid, and the point statistics for every candidate.
#[derive(Debug, Clone, Copy)]
pub struct OriginalModel<'a> {
    /// Original data
    pub data: &'a VarData,
    /// Full-sample fit on `data`
    pub fit: &'a VarFit,
    /// Grid built on `data`
    pub grid: &'a BreakpointGrid,
    /// Point statistics, one per candidate
    pub statistics: &'a [ChowStatistics],
}

/// Aggregated bootstrap output, indexed by candidate. Each array is in SS, BP,
/// FC order.
#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapOutcome {
    /// Number of replicates
    pub replications: usize,
    /// Mean replicate statistic
    pub mean: Vec<[f64; 3]>,
    /// Share of replicates strictly above the original statistic
    pub p_value: Vec<[f64; 3]>,
}

#[derive(Debug)]
struct Accumulator {
    exceedances: Vec<[usize; 3]>,
    sums: Vec<[f64; 3]>,
}

impl Accumulator {
    fn new(candidates: usize) -> Self {
        Self {
            exceedances: vec![[0; 3]; candidates],
            sums: vec![[0.0; 3]; candidates],
        }
    }

    fn add(&mut self, original: &[ChowStatistics], replicate: &[ChowStatistics]) -> ChowResult<()> {
        if replicate.len() != original.len() {
            return Err(ChowTestError::BootstrapError {
                reason: format!(
                    "replicate produced {} candidates, expected {}",
                    replicate.len(),
                    original.len()
                ),
            });
        }
        for (i, (orig, rep)) in original.iter().zip(replicate).enumerate() {
            let o = orig.tstats();
            let r = rep.tstats();
            for test in 0..3 {
                if r[test] > o[test] {
                    self.exceedances[i][test] += 1;
                }
                self.sums[i][test] += r[test];
            }
        }
        Ok(())
    }

    fn finish(self, replications: usize) -> BootstrapOutcome {
        let reps = replications as f64;
        BootstrapOutcome {
            replications,
            mean: self
                .sums
                .iter()
                .map(|s| [s[0] / reps, s[1] / reps, s[2] / reps])
                .collect(),
            p_value: self
                .exceedances
                .iter()
                .map(|c| [c[0] as f64 / reps, c[1] as f64 / reps, c[2] as f64 / reps])
                .collect(),
        }
    }
}

/// Centered residual pool with the deterministic part added back.
///
/// `exogenous` holds the exogenous rows aligned with the residuals (raw rows
/// `p..`). A row-count mismatch is logged and the exogenous component is only
/// added over the overlapping rows.
pub fn residual_pool(fit: &VarFit, exogenous: &DMatrix<f64>) -> DMatrix<f64> {
    let residuals = &fit.residuals;
    let means = column_means(residuals);
    let intercept = fit.intercept();
    let mut pool = DMatrix::from_fn(residuals.nrows(), residuals.ncols(), |i, j| {
        residuals[(i, j)] - means[j] + intercept[j]
    });

    if fit.n_exogenous() > 0 {
        if exogenous.ncols() != fit.n_exogenous() {
            log::warn!(
                "exogenous data has {} columns but the fit has {}; exogenous component skipped",
                exogenous.ncols(),
                fit.n_exogenous()
            );
            return pool;
        }
        if exogenous.nrows() != pool.nrows() {
            log::warn!(
                "residual pool has {} rows but exogenous data has {}; using the first {}",
                pool.nrows(),
                exogenous.nrows(),
                pool.nrows().min(exogenous.nrows())
            );
        }
        let overlap = pool.nrows().min(exogenous.nrows());
        let component = exogenous.rows(0, overlap) * fit.exogenous_coefficients();
        let mut head = pool.rows_mut(0, overlap);
        head += component;
    }
    pool
}

/// Runs bootstrap replicates for one model configuration.
#[derive(Debug)]
pub struct BootstrapEngine<'a, E: VarEstimator + ?Sized> {
    estimator: &'a E,
    dims: ModelDimensions,
    covariance: CovarianceMode,
}

impl<'a, E: VarEstimator + ?Sized> BootstrapEngine<'a, E> {
    /// Engine using `estimator` for every replicate fit.
    pub fn new(estimator: &'a E, dims: ModelDimensions, covariance: CovarianceMode) -> Self {
        Self {
            estimator,
            dims,
            covariance,
        }
    }

    /// Run `replications` replicates and aggregate p-values and means.
    ///
    /// With `seed = None` the stream is seeded from OS entropy and the result
    /// is not reproducible.
    pub fn run(
        &self,
        original: &OriginalModel<'_>,
        replications: usize,
        seed: Option<u64>,
        schedule: BootstrapSchedule,
    ) -> ChowResult<BootstrapOutcome> {
        if replications == 0 {
            return Err(ChowTestError::BootstrapError {
                reason: "at least one replication is required".to_string(),
            });
        }
        if original.statistics.len() != original.grid.iterat() {
            return Err(ChowTestError::BootstrapError {
                reason: format!(
                    "{} point statistics for {} candidates",
                    original.statistics.len(),
                    original.grid.iterat()
                ),
            });
        }

        let lags = self.dims.lags;
        let exogenous_eff = original
            .data
            .exogenous()
            .rows(lags, original.data.nobs() - lags)
            .into_owned();
        let pool = stack_rows(&residual_pool(original.fit, &exogenous_eff), BURN_IN_COPIES);

        log::info!(
            "bootstrap: {} replications over {} candidates ({:?})",
            replications,
            original.grid.iterat(),
            schedule
        );

        let mut acc = Accumulator::new(original.grid.iterat());
        match schedule {
            BootstrapSchedule::SingleStream => {
                let mut rng = match seed {
                    Some(s) => BootstrapRng::with_seed(s),
                    None => BootstrapRng::from_entropy(),
                };
                for r in 0..replications {
                    let stats = self.replicate(original, &pool, &mut rng)?;
                    acc.add(original.statistics, &stats)?;
                    if (r + 1) % 100 == 0 {
                        log::debug!("bootstrap: {} of {} replicates done", r + 1, replications);
                    }
                }
            }
            BootstrapSchedule::PerReplicate => {
                let base = seed.unwrap_or_else(|| BootstrapRng::from_entropy().u64());
                let run_one = |r: usize| {
                    let mut rng = BootstrapRng::with_seed(mix_seed(base, r));
                    self.replicate(original, &pool, &mut rng)
                };

                #[cfg(feature = "parallel")]
                let results: Vec<ChowResult<Vec<ChowStatistics>>> = {
                    use rayon::prelude::*;
                    (0..replications).into_par_iter().map(run_one).collect()
                };

                #[cfg(not(feature = "parallel"))]
                let results: Vec<ChowResult<Vec<ChowStatistics>>> =
                    (0..replications).map(run_one).collect();

                for stats in results {
                    acc.add(original.statistics, &stats?)?;
                }
            }
        }

        Ok(acc.finish(replications))
    }

    /// Simulate one replicate series of the same length as the original data.
    pub fn simulate_replicate(
        &self,
        original: &OriginalModel<'_>,
        pool: &DMatrix<f64>,
        rng: &mut BootstrapRng,
    ) -> ChowResult<VarData> {
        let lags = self.dims.lags;
        let nobs = original.data.nobs();
        let shocks = RowResampler::new(rng).resample(pool);
        let initial = original.data.endogenous().rows(0, lags).into_owned();
        let path = simulate_var(&original.fit.companion_block(), &shocks, &initial)?;
        if path.nrows() < nobs {
            return Err(ChowTestError::BootstrapError {
                reason: format!(
                    "simulated {} rows but the sample needs {}",
                    path.nrows(),
                    nobs
                ),
            });
        }
        let kept = path.rows(path.nrows() - nobs, nobs).into_owned();
        Ok(original.data.with_endogenous(kept))
    }

    fn replicate(
        &self,
        original: &OriginalModel<'_>,
        pool: &DMatrix<f64>,
        rng: &mut BootstrapRng,
    ) -> ChowResult<Vec<ChowStatistics>> {
        let data = self.simulate_replicate(original, pool, rng)?;
        let full = self.estimator.estimate(
            self.dims.lags,
            data.endogenous(),
            data.exogenous(),
            self.covariance,
        )?;
        RecursiveEstimator::new(self.estimator, self.dims, self.covariance).grid_statistics(
            &data,
            original.grid,
            &full.residuals,
        )
    }
}
