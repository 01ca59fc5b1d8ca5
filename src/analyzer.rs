//! # VAR Stability Analyzer
//!
//! [`VarStabilityAnalyzer`] is the main entry point. It validates the
//! configuration once, then for each dataset:
//!
//! 1. fits the VAR on the full sample,
//! 2. builds the breakpoint grid,
//! 3. runs the forward and backward recursive passes to get the point
//!    statistics for every candidate,
//! 4. bootstraps the statistics over the same grid,
//! 5. assembles the result table.
//!
//! Datasets can be analyzed directly with [`VarStabilityAnalyzer::analyze`] or
//! registered by name and analyzed in a batch.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use nalgebra::DMatrix;
//! use var_chow::{ChowTestConfig, VarData, VarStabilityAnalyzer};
//!
//! # fn main() -> Result<(), var_chow::ChowTestError> {
//! let y = DMatrix::from_fn(200, 2, |i, j| ((i * (j + 3)) as f64 * 0.7).sin());
//! let data = VarData::new(y, None, None)?;
//!
//! let config = ChowTestConfig::quick().with_lags(1).at_date("101").with_seed(42);
//! let analyzer = VarStabilityAnalyzer::new(config)?;
//! let report = analyzer.analyze(&data)?;
//!
//! for row in report.table.rows() {
//!     println!("{}: SS {:.2} (p = {:.3})", row.label, row.tstat_ss, row.pv_ss_boot);
//! }
//! # Ok(())
//! # }
//! ```

use crate::bootstrap::{BootstrapEngine, OriginalModel};
use crate::config::{validate_chow_config, ChowTestConfig};
use crate::errors::{ChowResult, ChowTestError};
use crate::grid::BreakpointGrid;
use crate::recursive::RecursiveEstimator;
use crate::results::{assemble_table, ChowTestReport};
use crate::sample::VarData;
use crate::statistics::{ChowStatistics, ModelDimensions};
use crate::var_model::{OlsVarEstimator, VarEstimator, VarFit};
use nalgebra::DMatrix;
use std::collections::BTreeMap;
use std::sync::RwLock;

/// Full-sample fit, grid and point statistics of one dataset.
#[derive(Debug, Clone)]
pub struct PointEstimates {
    /// Model shape
    pub dims: ModelDimensions,
    /// Full-sample VAR fit
    pub fit: VarFit,
    /// Candidate breaks and recursive spans
    pub grid: BreakpointGrid,
    /// Statistics per candidate
    pub statistics: Vec<ChowStatistics>,
}

/// Bootstrapped Chow stability tests for VAR models.
#[derive(Debug)]
pub struct VarStabilityAnalyzer<E: VarEstimator = OlsVarEstimator> {
    config: ChowTestConfig,
    estimator: E,
    /// Registered datasets (deterministic ordering)
    datasets: RwLock<BTreeMap<String, VarData>>,
    /// Reports of analyzed datasets
    reports: RwLock<BTreeMap<String, ChowTestReport>>,
}

impl VarStabilityAnalyzer<OlsVarEstimator> {
    /// Analyzer using OLS estimation.
    pub fn new(config: ChowTestConfig) -> ChowResult<Self> {
        Self::with_estimator(config, OlsVarEstimator::new())
    }
}

impl<E: VarEstimator> VarStabilityAnalyzer<E> {
    /// Analyzer using a custom VAR estimator.
    pub fn with_estimator(config: ChowTestConfig, estimator: E) -> ChowResult<Self> {
        validate_chow_config(&config)?;
        Ok(Self {
            config,
            estimator,
            datasets: RwLock::new(BTreeMap::new()),
            reports: RwLock::new(BTreeMap::new()),
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &ChowTestConfig {
        &self.config
    }

    /// Full-sample fit, grid and point statistics, without the bootstrap.
    pub fn point_estimates(&self, data: &VarData) -> ChowResult<PointEstimates> {
        let dims = ModelDimensions::new(self.config.lags, data.n_endogenous(), data.n_exogenous());
        let grid = BreakpointGrid::build(
            &self.config.break_spec,
            &dims,
            data.nobs(),
            data.labels(),
            self.config.initial_trim,
        )?;
        let fit = self.estimator.estimate(
            dims.lags,
            data.endogenous(),
            data.exogenous(),
            self.config.covariance,
        )?;
        let statistics = RecursiveEstimator::new(&self.estimator, dims, self.config.covariance)
            .grid_statistics(data, &grid, &fit.residuals)?;

        Ok(PointEstimates {
            dims,
            fit,
            grid,
            statistics,
        })
    }

    /// Run the complete test on one dataset.
    pub fn analyze(&self, data: &VarData) -> ChowResult<ChowTestReport> {
        let point = self.point_estimates(data)?;
        log::info!(
            "chow test: VAR({}) in {} variables, {} candidate break(s)",
            point.dims.lags,
            point.dims.n_endogenous,
            point.grid.iterat()
        );

        let original = OriginalModel {
            data,
            fit: &point.fit,
            grid: &point.grid,
            statistics: &point.statistics,
        };
        let outcome = BootstrapEngine::new(&self.estimator, point.dims, self.config.covariance).run(
            &original,
            self.config.replications,
            self.config.seed,
            self.config.schedule,
        )?;
        let table = assemble_table(point.grid.candidates(), &point.statistics, &outcome)?;

        Ok(ChowTestReport {
            table,
            grid: point.grid,
            lags: point.dims.lags,
            replications: self.config.replications,
            seed: self.config.seed,
        })
    }

    /// Register a dataset under `name`. Returns `true` if it replaced one.
    pub fn add_dataset(&self, name: impl Into<String>, data: VarData) -> ChowResult<bool> {
        let name = name.into();
        let mut datasets = self.datasets.write().map_err(|_| poisoned("datasets"))?;
        let replaced = datasets.insert(name.clone(), data).is_some();
        if replaced {
            let mut reports = self.reports.write().map_err(|_| poisoned("reports"))?;
            reports.remove(&name);
        }
        Ok(replaced)
    }

    /// Names of registered datasets.
    pub fn dataset_names(&self) -> ChowResult<Vec<String>> {
        let datasets = self.datasets.read().map_err(|_| poisoned("datasets"))?;
        Ok(datasets.keys().cloned().collect())
    }

    /// Analyze one registered dataset and keep its report.
    pub fn analyze_dataset(&self, name: &str) -> ChowResult<ChowTestReport> {
        let data = {
            let datasets = self.datasets.read().map_err(|_| poisoned("datasets"))?;
            datasets
                .get(name)
                .cloned()
                .ok_or_else(|| ChowTestError::DatasetNotFound {
                    name: name.to_string(),
                })?
        };
        let report = self.analyze(&data)?;
        let mut reports = self.reports.write().map_err(|_| poisoned("reports"))?;
        reports.insert(name.to_string(), report.clone());
        Ok(report)
    }

    /// Analyze every registered dataset. A failing dataset does not stop the
    /// batch; its error is returned alongside its name.
    pub fn analyze_all_datasets(&self) -> ChowResult<Vec<(String, ChowTestError)>> {
        let names = self.dataset_names()?;

        #[cfg(feature = "parallel")]
        let outcomes: Vec<(String, ChowResult<ChowTestReport>)> = {
            use rayon::prelude::*;
            names
                .into_par_iter()
                .map(|name| {
                    let result = self.analyze_dataset(&name);
                    (name, result)
                })
                .collect()
        };

        #[cfg(not(feature = "parallel"))]
        let outcomes: Vec<(String, ChowResult<ChowTestReport>)> = names
            .into_iter()
            .map(|name| {
                let result = self.analyze_dataset(&name);
                (name, result)
            })
            .collect();

        let failures: Vec<(String, ChowTestError)> = outcomes
            .into_iter()
            .filter_map(|(name, result)| result.err().map(|e| (name, e)))
            .collect();
        if !failures.is_empty() {
            log::warn!(
                "{} dataset(s) failed: {:?}",
                failures.len(),
                failures.iter().map(|(n, _)| n.as_str()).collect::<Vec<_>>()
            );
        }
        Ok(failures)
    }

    /// Stored report of a dataset.
    pub fn get_report(&self, name: &str) -> ChowResult<ChowTestReport> {
        let reports = self.reports.read().map_err(|_| poisoned("reports"))?;
        reports
            .get(name)
            .cloned()
            .ok_or_else(|| ChowTestError::DatasetNotFound {
                name: name.to_string(),
            })
    }
}

fn poisoned(resource: &str) -> ChowTestError {
    ChowTestError::LockPoisoned {
        resource: resource.to_string(),
    }
}

/// One-call test on raw matrices with sequential labels and OLS estimation.
pub fn var_chow_test(
    endogenous: DMatrix<f64>,
    exogenous: Option<DMatrix<f64>>,
    config: &ChowTestConfig,
) -> ChowResult<ChowTestReport> {
    let data = VarData::new(endogenous, exogenous, None)?;
    VarStabilityAnalyzer::new(config.clone())?.analyze(&data)
}
