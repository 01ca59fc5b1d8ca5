//! Synthetic VAR series for testing and validation.
//!
//! [`generate_var_series`] simulates a Gaussian VAR whose coefficients switch
//! between regimes at fixed observation indices. A single regime gives a
//! stable process with no break; two regimes give a series with a known
//! structural break, which is what the Chow tests are meant to find.

use crate::errors::{validate_data_length, validate_parameter, ChowResult, ChowTestError};
use crate::linear_algebra::ensure_finite_matrix;
use nalgebra::DMatrix;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use rand_distr::{Distribution, StandardNormal};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Length and reproducibility controls.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GeneratorConfig {
    /// Number of observations returned
    pub length: usize,
    /// Random seed for reproducible generation
    pub seed: Option<u64>,
    /// Observations simulated under the first regime and discarded
    pub burn_in: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            length: 200,
            seed: None,
            burn_in: 100,
        }
    }
}

/// Coefficients of one VAR regime.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VarRegime {
    /// Intercept, one entry per variable
    pub intercept: Vec<f64>,
    /// `A_1, ..., A_p`, each `n x n`
    pub lag_matrices: Vec<DMatrix<f64>>,
    /// Standard deviation of the i.i.d. Gaussian shocks
    pub noise_scale: f64,
}

impl VarRegime {
    /// VAR(1) regime with unit shock variance.
    pub fn var1(intercept: Vec<f64>, a1: DMatrix<f64>) -> Self {
        Self {
            intercept,
            lag_matrices: vec![a1],
            noise_scale: 1.0,
        }
    }

    /// Set the shock standard deviation.
    pub fn with_noise_scale(mut self, noise_scale: f64) -> Self {
        self.noise_scale = noise_scale;
        self
    }

    fn n_variables(&self) -> usize {
        self.intercept.len()
    }

    fn lags(&self) -> usize {
        self.lag_matrices.len()
    }

    fn validate(&self, n: usize) -> ChowResult<()> {
        if self.n_variables() != n {
            return Err(ChowTestError::InvalidParameter {
                parameter: "intercept".to_string(),
                value: self.n_variables() as f64,
                constraint: format!("must have {} entries", n),
            });
        }
        if self.lag_matrices.is_empty() {
            return Err(ChowTestError::InvalidParameter {
                parameter: "lag_matrices".to_string(),
                value: 0.0,
                constraint: "at least one lag matrix required".to_string(),
            });
        }
        if let Some(bad) = self.lag_matrices.iter().find(|a| a.shape() != (n, n)) {
            return Err(ChowTestError::configuration(format!(
                "lag matrix is {}x{}, expected {}x{}",
                bad.nrows(),
                bad.ncols(),
                n,
                n
            )));
        }
        validate_parameter(self.noise_scale, 0.0, f64::MAX, "noise_scale")
    }
}

/// Simulate a regime-switching Gaussian VAR.
///
/// Regime `k` is active from observation `switch_points[k - 1]` (0 for the
/// first regime) up to, but excluding, `switch_points[k]`. `switch_points`
/// must be strictly increasing, inside `(0, length)`, and one shorter than
/// `regimes`. Returns a `length x n` matrix.
///
/// # Example
/// ```rust
/// use nalgebra::DMatrix;
/// use var_chow::generators::{generate_var_series, GeneratorConfig, VarRegime};
///
/// let before = VarRegime::var1(vec![0.0, 0.0], DMatrix::from_row_slice(2, 2, &[0.5, 0.1, 0.0, 0.3]));
/// let after = VarRegime::var1(vec![1.0, 0.0], DMatrix::from_row_slice(2, 2, &[-0.4, 0.0, 0.2, -0.5]));
/// let config = GeneratorConfig { length: 200, seed: Some(1), burn_in: 50 };
/// let y = generate_var_series(&config, &[before, after], &[100]).unwrap();
/// assert_eq!(y.shape(), (200, 2));
/// ```
pub fn generate_var_series(
    config: &GeneratorConfig,
    regimes: &[VarRegime],
    switch_points: &[usize],
) -> ChowResult<DMatrix<f64>> {
    let first = regimes.first().ok_or_else(|| ChowTestError::InvalidParameter {
        parameter: "regimes".to_string(),
        value: 0.0,
        constraint: "at least one regime required".to_string(),
    })?;
    validate_data_length(config.length, 1)?;

    let n = first.n_variables();
    if n == 0 {
        return Err(ChowTestError::configuration("regimes have no variables"));
    }
    for regime in regimes {
        regime.validate(n)?;
    }

    if switch_points.len() + 1 != regimes.len() {
        return Err(ChowTestError::configuration(format!(
            "{} regimes need {} switch points, got {}",
            regimes.len(),
            regimes.len() - 1,
            switch_points.len()
        )));
    }
    let ordered = switch_points.windows(2).all(|w| w[0] < w[1]);
    let inside = switch_points.iter().all(|&s| s > 0 && s < config.length);
    if !ordered || !inside {
        return Err(ChowTestError::configuration(format!(
            "switch points {:?} must be increasing and inside (0, {})",
            switch_points, config.length
        )));
    }

    let max_lags = regimes.iter().map(VarRegime::lags).max().unwrap_or(1);
    let total = max_lags + config.burn_in + config.length;
    let offset = max_lags + config.burn_in;

    let mut rng = match config.seed {
        Some(seed) => ChaCha20Rng::seed_from_u64(seed),
        None => ChaCha20Rng::from_entropy(),
    };

    let mut path = DMatrix::<f64>::zeros(total, n);
    for t in max_lags..total {
        let obs = t.saturating_sub(offset);
        let active = if t < offset {
            0
        } else {
            switch_points.iter().take_while(|&&s| s <= obs).count()
        };
        let regime = &regimes[active];

        for eq in 0..n {
            let shock: f64 = StandardNormal.sample(&mut rng);
            let mut value = regime.intercept[eq] + regime.noise_scale * shock;
            for (lag, a) in regime.lag_matrices.iter().enumerate() {
                for var in 0..n {
                    value += a[(eq, var)] * path[(t - lag - 1, var)];
                }
            }
            path[(t, eq)] = value;
        }
    }

    let series = path.rows(offset, config.length).into_owned();
    ensure_finite_matrix(&series, "generate_var_series")?;
    log::debug!(
        "generated {} x {} VAR series with {} regimes",
        config.length,
        n,
        regimes.len()
    );
    Ok(series)
}
