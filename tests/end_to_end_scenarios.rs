//! End-to-end scenarios for the bootstrapped Chow tests.
//!
//! Series are simulated with `generate_var_series`, so every scenario is
//! reproducible from its seed.

use nalgebra::DMatrix;
use var_chow::{
    generate_var_series, BootstrapSchedule, ChowTestConfig, CovarianceMode, GeneratorConfig,
    VarData, VarRegime, VarStabilityAnalyzer,
};

fn regime_a() -> VarRegime {
    VarRegime::var1(vec![0.0, 0.0], DMatrix::from_row_slice(2, 2, &[0.5, 0.1, 0.0, 0.3]))
}

fn regime_b() -> VarRegime {
    VarRegime::var1(vec![0.0, 0.0], DMatrix::from_row_slice(2, 2, &[-0.4, 0.0, 0.2, -0.5]))
}

/// 200 observations, coefficients switch at observation index 100.
fn series_with_break(seed: u64) -> VarData {
    let config = GeneratorConfig {
        length: 200,
        seed: Some(seed),
        burn_in: 100,
    };
    let y = generate_var_series(&config, &[regime_a(), regime_b()], &[100]).unwrap();
    VarData::new(y, None, None).unwrap()
}

fn stable_series(length: usize, seed: u64) -> VarData {
    let config = GeneratorConfig {
        length,
        seed: Some(seed),
        burn_in: 100,
    };
    let y = generate_var_series(&config, &[regime_a()], &[]).unwrap();
    VarData::new(y, None, None).unwrap()
}

/// 95% quantiles of chi-square(6) and chi-square(9).
const CHI2_6_95: f64 = 12.5916;
const CHI2_9_95: f64 = 16.9190;

/// Scenario: a known break at the tested date is detected by the sample-split
/// and break-point tests, asymptotically and by bootstrap.
#[test]
fn test_known_break_is_detected_at_single_date() {
    let data = series_with_break(2024);
    // Label "101" is raw row 100, the first observation of the new regime.
    let config = ChowTestConfig::quick().with_lags(1).at_date("101").with_seed(42);
    let report = VarStabilityAnalyzer::new(config)
        .unwrap()
        .analyze(&data)
        .unwrap();

    assert_eq!(report.table.len(), 1);
    let row = &report.table.rows()[0];
    assert_eq!(row.label, "101");
    assert_eq!(row.pre_len, 99);
    assert_eq!(row.post_len, 100);
    assert_eq!(row.df_ss, 6.0);
    assert_eq!(row.df_bp, 9.0);

    assert!(
        row.tstat_ss > CHI2_6_95,
        "sample-split statistic {} below critical value",
        row.tstat_ss
    );
    assert!(
        row.tstat_bp > CHI2_9_95,
        "break-point statistic {} below critical value",
        row.tstat_bp
    );
    assert!(row.pv_ss_boot < 0.05, "bootstrap p-value {}", row.pv_ss_boot);
    assert!(row.pv_bp_boot < 0.05, "bootstrap p-value {}", row.pv_bp_boot);
    assert!(row.pv_ss_asym.unwrap() < 0.05);

    // The bootstrap distribution is centred well below the observed statistic.
    assert!(row.tstat_ss_bootmean < row.tstat_ss);
}

/// Scenario: the break is visible in the every-date profile around the true date.
#[test]
fn test_every_date_profile_covers_break() {
    let data = series_with_break(7);
    let config = ChowTestConfig::quick().with_lags(1).with_seed(11);
    let report = VarStabilityAnalyzer::new(config)
        .unwrap()
        .analyze(&data)
        .unwrap();

    // T = 199, trim widened by one step to 0.16: 32 observations at each end.
    assert_eq!(report.table.len(), report.grid.iterat());
    assert_eq!(report.table.len(), 199 - 2 * 32 + 1);
    assert_eq!(report.table.rows()[0].label, "34");

    let rows = report.table.rows();
    assert!(rows.windows(2).all(|w| w[1].break_index == w[0].break_index + 1));
    assert!(rows.iter().all(|r| r.df_bp == r.df_ss + 3.0));

    let at_break = report.table.row("101").unwrap();
    assert!(at_break.pv_ss_boot < 0.05);

    let profile = report.p_value_profile();
    assert_eq!(profile.labels.len(), rows.len());
    assert!(profile.rejections(0.05).contains(&"101"));
    assert_eq!(report.table.to_matrix().shape(), (rows.len(), 13));
}

/// Scenario: without a break the bootstrap tests reject at roughly the
/// nominal rate.
#[test]
fn test_no_break_rejection_rate_near_nominal() {
    let mut rejections = [0usize; 3];
    for seed in 0..20u64 {
        let data = stable_series(120, 500 + seed);
        let config = ChowTestConfig::quick().at_date("61").with_seed(seed);
        let report = VarStabilityAnalyzer::new(config)
            .unwrap()
            .analyze(&data)
            .unwrap();
        let row = &report.table.rows()[0];
        for (count, p) in rejections
            .iter_mut()
            .zip([row.pv_ss_boot, row.pv_bp_boot, row.pv_fc_boot])
        {
            if p < 0.05 {
                *count += 1;
            }
        }
    }
    for count in rejections {
        assert!(count <= 6, "{} of 20 rejections at the 5% level", count);
    }
}

/// Scenario: fixed inputs and seed reproduce the table bit-for-bit.
#[test]
fn test_seeded_runs_are_reproducible() {
    let data = stable_series(90, 3);
    let config = ChowTestConfig::quick().with_lags(2).with_seed(99);

    let first = VarStabilityAnalyzer::new(config.clone())
        .unwrap()
        .analyze(&data)
        .unwrap();
    let second = VarStabilityAnalyzer::new(config.clone())
        .unwrap()
        .analyze(&data)
        .unwrap();
    assert_eq!(first.table, second.table);

    let other_seed = VarStabilityAnalyzer::new(config.with_seed(100))
        .unwrap()
        .analyze(&data)
        .unwrap();
    assert_ne!(first.table.to_matrix(), other_seed.table.to_matrix());
    // Point statistics do not depend on the seed.
    assert_eq!(
        first.table.rows()[0].tstat_bp,
        other_seed.table.rows()[0].tstat_bp
    );
}

/// Scenario: per-replicate seeding is reproducible whatever the thread pool does.
#[test]
fn test_per_replicate_schedule_is_reproducible() {
    let data = stable_series(80, 4);
    let config = ChowTestConfig::quick()
        .at_date("40")
        .with_seed(5)
        .with_schedule(BootstrapSchedule::PerReplicate);

    let a = VarStabilityAnalyzer::new(config.clone())
        .unwrap()
        .analyze(&data)
        .unwrap();
    let b = VarStabilityAnalyzer::new(config)
        .unwrap()
        .analyze(&data)
        .unwrap();
    assert_eq!(a.table, b.table);
}

/// Scenario: the covariance mode changes standard errors only, so the whole
/// table is unchanged.
#[test]
fn test_covariance_mode_leaves_table_unchanged() {
    let data = stable_series(100, 8);
    let base = ChowTestConfig::quick().at_date("50").with_seed(21);

    let classical = VarStabilityAnalyzer::new(base.clone())
        .unwrap()
        .analyze(&data)
        .unwrap();
    let hac = VarStabilityAnalyzer::new(base.with_covariance(CovarianceMode::Hac))
        .unwrap()
        .analyze(&data)
        .unwrap();
    assert_eq!(classical.table, hac.table);
}

/// Scenario: exogenous regressors enter the degrees of freedom.
#[test]
fn test_exogenous_regressors() {
    let stable = stable_series(120, 12);
    let x = DMatrix::from_fn(120, 1, |i, _| (i as f64 * 0.25).cos());
    let data = VarData::new(stable.endogenous().clone(), Some(x), None).unwrap();

    let config = ChowTestConfig::quick().at_date("61").with_seed(2);
    let report = VarStabilityAnalyzer::new(config)
        .unwrap()
        .analyze(&data)
        .unwrap();

    let row = &report.table.rows()[0];
    // p n^2 + n (1 + m) = 4 + 4
    assert_eq!(row.df_ss, 8.0);
    assert_eq!(row.df_bp, 11.0);
    assert!((0.0..=1.0).contains(&row.pv_fc_boot));
}
