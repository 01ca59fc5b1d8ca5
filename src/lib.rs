//! # VAR Chow Tests
//!
//! Bootstrapped Chow stability tests for vector autoregressions.
//!
//! For a single hypothesized break date, or for every admissible date in a
//! trimmed search window, this crate computes three complementary stability
//! statistics for a VAR(p) with intercept and optional exogenous regressors,
//! together with bootstrap p-values obtained by re-simulating the fitted model
//! under residual resampling.
//!
//! ## Key Features
//!
//! - **Sample-split test**: pooled against split residual covariance
//! - **Break-point test**: also sensitive to a shift in the error covariance
//! - **Forecast test**: predictive failure of the pre-break fit (Rao F approximation)
//! - **Residual bootstrap**: reproducible single-stream or per-replicate seeding,
//!   optionally parallel with the `parallel` feature
//! - **Asymptotic p-values**: chi-square and F tail probabilities alongside the
//!   bootstrap ones
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use nalgebra::DMatrix;
//! use var_chow::{
//!     generate_var_series, ChowTestConfig, GeneratorConfig, VarData, VarRegime,
//!     VarStabilityAnalyzer,
//! };
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Coefficients change at observation 100.
//!     let before = VarRegime::var1(vec![0.0, 0.0], DMatrix::from_row_slice(2, 2, &[0.5, 0.1, 0.0, 0.3]));
//!     let after = VarRegime::var1(vec![0.0, 0.0], DMatrix::from_row_slice(2, 2, &[-0.4, 0.0, 0.2, -0.5]));
//!     let gen = GeneratorConfig { length: 200, seed: Some(7), burn_in: 100 };
//!     let y = generate_var_series(&gen, &[before, after], &[100])?;
//!
//!     let config = ChowTestConfig::standard().with_lags(1).with_seed(42);
//!     let report = VarStabilityAnalyzer::new(config)?.analyze(&VarData::new(y, None, None)?)?;
//!
//!     for label in report.p_value_profile().rejections(0.05) {
//!         println!("instability at {}", label);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! Data flows strictly downward: [`grid`] builds the candidate breaks,
//! [`recursive`] re-estimates the VAR on expanding windows through the
//! [`VarEstimator`] seam, [`statistics`] turns residual cross-products into the
//! test statistics, [`bootstrap`] repeats the pipeline on simulated series and
//! [`results`] assembles the table. [`VarStabilityAnalyzer`] ties them together.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
pub mod config;
pub mod errors;
pub mod linear_algebra;
pub mod results;
pub mod sample;

// Estimation and testing
pub mod analyzer;
pub mod bootstrap;
pub mod generators;
pub mod grid;
pub mod recursive;
pub mod resampling;
pub mod statistics;
pub mod var_model;

// Re-exports for convenience - main public API
pub use analyzer::{var_chow_test, PointEstimates, VarStabilityAnalyzer};
pub use config::{
    validate_chow_config, BootstrapSchedule, BreakSpec, ChowTestConfig, CovarianceMode,
};
pub use errors::{ChowResult, ChowTestError};
pub use results::{
    chi_square_tail, f_tail, ChowTestReport, ChowTestRow, ChowTestTable, PValueProfile,
    COLUMN_NAMES,
};
pub use sample::{ObservationLabels, SampleWindow, VarData};

// Building blocks
pub use bootstrap::{residual_pool, BootstrapEngine, BootstrapOutcome, OriginalModel};
pub use grid::{BreakCandidate, BreakpointGrid};
pub use recursive::RecursiveEstimator;
pub use resampling::{mix_seed, BootstrapRng, Resampler, RowResampler};
pub use statistics::{chow_statistics, ChowStatistics, ModelDimensions, SplitCovariances};
pub use var_model::{simulate_var, OlsVarEstimator, VarEstimator, VarFit};

// Data generation exports
pub use generators::{generate_var_series, GeneratorConfig, VarRegime};
