//! # Test Configuration
//!
//! Configuration structures controlling the Chow stability tests: lag order,
//! which break dates to test, the bootstrap size and seeding schedule, and the
//! covariance mode handed to the VAR estimator.

use crate::errors::{validate_parameter, ChowResult, ChowTestError};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Minimum number of bootstrap replications accepted.
pub const MIN_REPLICATIONS: usize = 99;
/// Default initial trimming fraction for the "every date" search.
pub const DEFAULT_TRIM: f64 = 0.15;
/// Step by which the trim fraction is widened when the first window is too short.
pub const TRIM_STEP: f64 = 0.01;
/// Number of copies of the residual pool stacked to form the burn-in buffer.
pub const BURN_IN_COPIES: usize = 4;

/// Which break dates to test.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BreakSpec {
    /// A single break; the label names the first observation of the new regime.
    Date(String),
    /// Every admissible date inside the trimmed sample.
    Every,
}

/// Covariance estimator used for coefficient standard errors.
///
/// Only standard errors depend on this choice; coefficients and residuals,
/// and therefore every Chow statistic, are identical across modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CovarianceMode {
    /// Classical homoskedastic standard errors
    #[default]
    Classical,
    /// White heteroskedasticity-consistent (HC0) standard errors
    Hc,
    /// Newey-West heteroskedasticity and autocorrelation consistent standard errors
    Hac,
}

/// How random streams are assigned to bootstrap replicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BootstrapSchedule {
    /// One generator seeded once before the first replicate and shared by all
    /// replicates in order.
    #[default]
    SingleStream,
    /// One generator per replicate, seeded from `mix_seed(seed, replicate)`.
    /// Runs on the rayon pool when the `parallel` feature is enabled.
    PerReplicate,
}

/// Configuration for a Chow stability test run.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChowTestConfig {
    /// VAR lag order `p`
    pub lags: usize,
    /// Break date(s) to test
    pub break_spec: BreakSpec,
    /// Number of bootstrap replications
    pub replications: usize,
    /// Seed for the bootstrap generator; `None` draws one from OS entropy
    pub seed: Option<u64>,
    /// Initial trimming fraction for [`BreakSpec::Every`]
    pub initial_trim: f64,
    /// Covariance mode passed through to the VAR estimator
    pub covariance: CovarianceMode,
    /// Seeding schedule for bootstrap replicates
    pub schedule: BootstrapSchedule,
}

impl Default for ChowTestConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl ChowTestConfig {
    /// Quick configuration: the minimum number of replications.
    pub fn quick() -> Self {
        Self {
            replications: MIN_REPLICATIONS,
            ..Self::standard()
        }
    }

    /// Standard configuration: VAR(1), every date, 499 replications.
    pub fn standard() -> Self {
        Self {
            lags: 1,
            break_spec: BreakSpec::Every,
            replications: 499,
            seed: None,
            initial_trim: DEFAULT_TRIM,
            covariance: CovarianceMode::Classical,
            schedule: BootstrapSchedule::SingleStream,
        }
    }

    /// Thorough configuration: 1999 replications.
    pub fn thorough() -> Self {
        Self {
            replications: 1999,
            ..Self::standard()
        }
    }

    /// Set the lag order.
    pub fn with_lags(mut self, lags: usize) -> Self {
        self.lags = lags;
        self
    }

    /// Test a single break date.
    pub fn at_date(mut self, label: impl Into<String>) -> Self {
        self.break_spec = BreakSpec::Date(label.into());
        self
    }

    /// Test every admissible date.
    pub fn every_date(mut self) -> Self {
        self.break_spec = BreakSpec::Every;
        self
    }

    /// Set the number of bootstrap replications.
    pub fn with_replications(mut self, replications: usize) -> Self {
        self.replications = replications;
        self
    }

    /// Fix the bootstrap seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the covariance mode.
    pub fn with_covariance(mut self, covariance: CovarianceMode) -> Self {
        self.covariance = covariance;
        self
    }

    /// Set the bootstrap schedule.
    pub fn with_schedule(mut self, schedule: BootstrapSchedule) -> Self {
        self.schedule = schedule;
        self
    }
}

/// Validate a test configuration before any estimation is attempted.
pub fn validate_chow_config(config: &ChowTestConfig) -> ChowResult<()> {
    if config.lags == 0 {
        return Err(ChowTestError::InvalidParameter {
            parameter: "lags".to_string(),
            value: 0.0,
            constraint: "must be at least 1".to_string(),
        });
    }

    if config.replications < MIN_REPLICATIONS {
        return Err(ChowTestError::InvalidParameter {
            parameter: "replications".to_string(),
            value: config.replications as f64,
            constraint: format!("must be at least {}", MIN_REPLICATIONS),
        });
    }

    validate_parameter(config.initial_trim, f64::EPSILON, 0.5, "initial_trim")?;

    if let BreakSpec::Date(label) = &config.break_spec {
        if label.trim().is_empty() {
            return Err(ChowTestError::configuration("break date label is empty"));
        }
    }

    Ok(())
}
