//! Integration tests for error handling and invalid input scenarios
//!
//! These tests validate that the analyzer rejects inconsistent inputs with the
//! right error variant and never returns a partial table.

use nalgebra::DMatrix;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use var_chow::{
    var_chow_test, ChowTestConfig, ChowTestError, ObservationLabels, VarData,
    VarStabilityAnalyzer,
};

fn noise(rows: usize, cols: usize) -> DMatrix<f64> {
    let mut rng = ChaCha20Rng::seed_from_u64(2024);
    DMatrix::from_fn(rows, cols, |_, _| rng.gen_range(-0.5..0.5))
}

/// Test scenario: endogenous and exogenous data of different lengths
#[test]
fn test_row_mismatch_is_configuration_error() {
    let config = ChowTestConfig::quick().at_date("50").with_seed(1);
    match var_chow_test(noise(100, 2), Some(noise(99, 1)), &config) {
        Err(ChowTestError::Configuration { reason }) => {
            assert!(reason.contains("100"), "unexpected reason: {}", reason);
        }
        other => panic!("Expected Configuration error, got {:?}", other),
    }
}

/// Test scenario: single break date leaving too few pre-break observations
#[test]
fn test_early_single_date_fails_immediately() {
    let config = ChowTestConfig::quick().at_date("4").with_seed(1);
    match var_chow_test(noise(100, 2), None, &config) {
        Err(ChowTestError::Configuration { reason }) => {
            assert!(reason.contains("starting sample smaller than parameters"));
        }
        other => panic!("Expected Configuration error, got {:?}", other),
    }
}

/// Test scenario: single break date leaving too few post-break observations
#[test]
fn test_late_single_date_fails_immediately() {
    let config = ChowTestConfig::quick().at_date("99").with_seed(1);
    match var_chow_test(noise(100, 2), None, &config) {
        Err(ChowTestError::Configuration { reason }) => {
            assert!(reason.contains("ending sample smaller than parameters"));
        }
        other => panic!("Expected Configuration error, got {:?}", other),
    }
}

/// Test scenario: break label that does not name an observation
#[test]
fn test_unknown_label() {
    let labels: Vec<String> = (0..100)
        .map(|i| format!("{}Q{}", 1980 + i / 4, i % 4 + 1))
        .collect();
    let data = VarData::new(
        noise(100, 2),
        None,
        Some(ObservationLabels::new(labels).unwrap()),
    )
    .unwrap();

    let analyzer = VarStabilityAnalyzer::new(ChowTestConfig::quick().at_date("2100Q1")).unwrap();
    assert!(matches!(
        analyzer.analyze(&data),
        Err(ChowTestError::Configuration { .. })
    ));

    let analyzer = VarStabilityAnalyzer::new(ChowTestConfig::quick().at_date("1992Q3").with_seed(4)).unwrap();
    let report = analyzer.analyze(&data).unwrap();
    assert_eq!(report.table.rows()[0].label, "1992Q3");
}

/// Test scenario: invalid configuration values
#[test]
fn test_invalid_parameters() {
    for config in [
        ChowTestConfig::quick().with_lags(0),
        ChowTestConfig::quick().with_replications(98),
    ] {
        assert!(matches!(
            VarStabilityAnalyzer::new(config),
            Err(ChowTestError::InvalidParameter { .. })
        ));
    }

    let mut config = ChowTestConfig::quick();
    config.initial_trim = 0.0;
    assert!(VarStabilityAnalyzer::new(config).is_err());
}

/// Test scenario: non-finite observations
#[test]
fn test_non_finite_data() {
    let mut y = noise(60, 2);
    y[(10, 1)] = f64::INFINITY;
    match VarData::new(y, None, None) {
        Err(ChowTestError::NumericalError { reason, .. }) => {
            assert!(reason.contains("index"));
        }
        other => panic!("Expected NumericalError, got {:?}", other),
    }
}

/// Test scenario: fewer observations than the lag order needs
#[test]
fn test_insufficient_observations() {
    let config = ChowTestConfig::quick().with_lags(3).with_seed(1);
    assert!(matches!(
        var_chow_test(noise(3, 2), None, &config),
        Err(ChowTestError::InsufficientData { .. })
    ));

    // Enough rows for the lags but not for any admissible break.
    let config = ChowTestConfig::quick().with_lags(2).with_seed(1);
    assert!(matches!(
        var_chow_test(noise(12, 3), None, &config),
        Err(ChowTestError::Configuration { .. })
    ));
}

/// Test scenario: break date leaving exactly as many pre-break residuals as parameters
#[test]
fn test_break_at_parameter_boundary_is_numerical_error() {
    // n = 2, p = 1: param = 4, so label "6" gives n1 = 4 with one residual
    // degree of freedom for two variables.
    let config = ChowTestConfig::quick().at_date("6").with_seed(1);
    match var_chow_test(noise(100, 2), None, &config) {
        Err(ChowTestError::NumericalError { reason, .. }) => {
            assert!(reason.contains("pre-break covariance is not positive definite"));
        }
        other => panic!("Expected NumericalError, got {:?}", other),
    }

    let config = ChowTestConfig::quick().at_date("7").with_seed(1);
    let report = var_chow_test(noise(100, 2), None, &config).unwrap();
    assert_eq!(report.table.rows()[0].pre_len, 5);
}

/// Test scenario: errors render readable messages
#[test]
fn test_error_messages() {
    let config = ChowTestConfig::quick().at_date("4").with_seed(1);
    let err = var_chow_test(noise(100, 2), None, &config).unwrap_err();
    assert!(err.to_string().starts_with("Configuration error"));
}
