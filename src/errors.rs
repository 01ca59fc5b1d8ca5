//! Error types and validation functions for VAR stability testing.
//!
//! Every fallible operation in the crate returns [`ChowResult`]. Configuration
//! problems (mismatched inputs, windows too short for the model) abort the whole
//! computation; numerical problems (singular regressors, covariance matrices that
//! are not positive definite) are reported explicitly instead of leaking `NaN`.

use thiserror::Error;

/// Error types for Chow stability testing operations.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum ChowTestError {
    /// Insufficient data for the requested model.
    #[error("Insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData {
        /// Minimum required observations
        required: usize,
        /// Actual number of observations provided
        actual: usize,
    },

    /// Invalid parameter value in the test configuration.
    #[error("Invalid parameter: {parameter} = {value}, expected {constraint}")]
    InvalidParameter {
        /// Parameter name
        parameter: String,
        /// Invalid value provided
        value: f64,
        /// Valid range or constraint description
        constraint: String,
    },

    /// Inconsistent inputs or sample windows that cannot identify the model.
    #[error("Configuration error: {reason}")]
    Configuration {
        /// Description of the inconsistency
        reason: String,
    },

    /// Numerical computation error (singular or indefinite matrices, non-finite values).
    #[error("Numerical computation failed: {reason}")]
    NumericalError {
        /// Detailed reason for numerical failure
        reason: String,
        /// Operation that failed
        operation: Option<String>,
    },

    /// Bootstrap replicate generation failed.
    #[error("Bootstrap resampling failed: {reason}")]
    BootstrapError {
        /// Reason for bootstrap failure
        reason: String,
    },

    /// Dataset not registered with the analyzer.
    #[error("Dataset not found: {name}")]
    DatasetNotFound {
        /// Name that was looked up
        name: String,
    },

    /// Internal lock poisoned by a panicking thread.
    #[error("Lock poisoned: {resource}")]
    LockPoisoned {
        /// Guarded resource
        resource: String,
    },
}

/// Result type for Chow testing operations.
pub type ChowResult<T> = Result<T, ChowTestError>;

impl ChowTestError {
    /// Shorthand for a [`ChowTestError::Configuration`] error.
    pub fn configuration(reason: impl Into<String>) -> Self {
        ChowTestError::Configuration {
            reason: reason.into(),
        }
    }

    /// Shorthand for a [`ChowTestError::NumericalError`] tagged with an operation.
    pub fn numerical(reason: impl Into<String>, operation: &str) -> Self {
        ChowTestError::NumericalError {
            reason: reason.into(),
            operation: Some(operation.to_string()),
        }
    }
}

/// Validates that a series has at least `min_required` observations.
///
/// # Example
/// ```rust
/// use var_chow::errors::validate_data_length;
///
/// assert!(validate_data_length(10, 5).is_ok());
/// assert!(validate_data_length(3, 5).is_err());
/// ```
pub fn validate_data_length(actual: usize, min_required: usize) -> ChowResult<()> {
    if actual < min_required {
        Err(ChowTestError::InsufficientData {
            required: min_required,
            actual,
        })
    } else {
        Ok(())
    }
}

/// Validates that a parameter is within the inclusive range `[min, max]`.
///
/// # Example
/// ```rust
/// use var_chow::errors::validate_parameter;
///
/// assert!(validate_parameter(0.15, 0.0, 0.5, "trim").is_ok());
/// assert!(validate_parameter(0.75, 0.0, 0.5, "trim").is_err());
/// ```
pub fn validate_parameter(value: f64, min: f64, max: f64, name: &str) -> ChowResult<()> {
    if value.is_nan() {
        return Err(ChowTestError::InvalidParameter {
            parameter: name.to_string(),
            value,
            constraint: "must not be NaN".to_string(),
        });
    }

    if value < min || value > max {
        Err(ChowTestError::InvalidParameter {
            parameter: name.to_string(),
            value,
            constraint: format!("[{}, {}]", min, max),
        })
    } else {
        Ok(())
    }
}

/// Validates that all values in a slice are finite.
///
/// Returns on the first non-finite value, reporting its position.
///
/// # Example
/// ```rust
/// use var_chow::errors::validate_all_finite;
///
/// assert!(validate_all_finite(&[1.0, 2.0], "y").is_ok());
/// assert!(validate_all_finite(&[1.0, f64::NAN], "y").is_err());
/// ```
pub fn validate_all_finite(data: &[f64], name: &str) -> ChowResult<()> {
    if let Some((i, &value)) = data.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        let value_desc = if value.is_nan() {
            "NaN".to_string()
        } else if value.is_sign_positive() {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        };

        return Err(ChowTestError::NumericalError {
            reason: format!(
                "{} contains non-finite value at index {}: {}",
                name, i, value_desc
            ),
            operation: None,
        });
    }

    Ok(())
}

/// Validates that a computed statistic is finite.
pub fn validate_finite(value: f64, name: &str) -> ChowResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ChowTestError::NumericalError {
            reason: format!("{} is not finite: {}", name, value),
            operation: None,
        })
    }
}
