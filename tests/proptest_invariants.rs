//! Property tests for grid construction and the Chow statistics.

use nalgebra::DMatrix;
use proptest::prelude::*;
use var_chow::{
    chow_statistics, generate_var_series, BreakSpec, BreakpointGrid, ChowTestError,
    CovarianceMode, GeneratorConfig, ModelDimensions, ObservationLabels, OlsVarEstimator,
    RecursiveEstimator, SplitCovariances, VarData, VarEstimator, VarRegime,
};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Either the grid is valid or construction fails with a configuration
    /// error; it never loops or yields an empty grid.
    #[test]
    fn grid_is_consistent_or_rejected(
        nobs in 5usize..400,
        lags in 1usize..4,
        n in 1usize..4,
        m in 0usize..3,
        initial_trim in 0.05f64..0.3,
    ) {
        let dims = ModelDimensions::new(lags, n, m);
        let labels = ObservationLabels::sequential(nobs);
        match BreakpointGrid::build(&BreakSpec::Every, &dims, nobs, &labels, initial_trim) {
            Ok(grid) => {
                let trim = grid.trim.unwrap();
                prop_assert!(trim <= 1.0);
                prop_assert!(grid.iterat() > 0);
                prop_assert_eq!(
                    grid.forward.last - grid.forward.first,
                    grid.backward.last - grid.backward.first
                );
                prop_assert_eq!(grid.effective_len, nobs - lags);
                for c in grid.candidates() {
                    prop_assert!(c.pre_len >= dims.param());
                    prop_assert!(c.post_len >= dims.param());
                    prop_assert_eq!(c.pre_len + c.post_len, grid.effective_len);
                }
            }
            Err(ChowTestError::Configuration { .. }) | Err(ChowTestError::InsufficientData { .. }) => {}
            Err(other) => prop_assert!(false, "unexpected error {:?}", other),
        }
    }

    /// Degrees of freedom follow the model shape for any valid covariances.
    #[test]
    fn break_point_df_extends_sample_split_df(
        lags in 1usize..4,
        m in 0usize..3,
        d1 in prop::collection::vec(0.5f64..5.0, 2),
        d2 in prop::collection::vec(0.5f64..5.0, 2),
        n1 in 30usize..70,
    ) {
        let n = 2;
        let t = 100;
        let dims = ModelDimensions::new(lags, n, m);
        let pooled = DMatrix::from_diagonal(&nalgebra::DVector::from_vec(vec![1.5, 2.5]));
        let sigma1 = DMatrix::from_diagonal(&nalgebra::DVector::from_vec(d1)) * n1 as f64;
        let sigma2 = DMatrix::from_diagonal(&nalgebra::DVector::from_vec(d2)) * (t - n1) as f64;
        let residuals = DMatrix::from_fn(t, n, |i, j| if i % 2 == j { 1.0 } else { -0.25 });

        let input = SplitCovariances {
            n1,
            n2: t - n1,
            effective_len: t,
            sigma_pooled: &pooled,
            sigma1: &sigma1,
            sigma2: &sigma2,
            full_residuals: &residuals,
        };
        let stats = chow_statistics(&input, &dims).unwrap();
        prop_assert_eq!(stats.df_bp, stats.df_ss + (n * (n + 1) / 2) as f64);
        prop_assert_eq!(stats.df_ss, (lags * n * n + n * (1 + m)) as f64);
        prop_assert_eq!(stats.df_fc1, (n * (t - n1)) as f64);
        prop_assert_eq!(stats, chow_statistics(&input, &dims).unwrap());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// On real fits the split model never fits worse than the pooled one.
    #[test]
    fn statistics_are_non_negative_on_fitted_data(seed in 0u64..10_000, split in 40usize..80) {
        let regime = VarRegime::var1(vec![0.3, -0.2], DMatrix::from_row_slice(2, 2, &[0.4, 0.1, -0.1, 0.2]));
        let config = GeneratorConfig { length: 120, seed: Some(seed), burn_in: 30 };
        let y = generate_var_series(&config, &[regime], &[]).unwrap();
        let data = VarData::new(y, None, None).unwrap();

        let dims = ModelDimensions::new(1, 2, 0);
        let spec = BreakSpec::Date(split.to_string());
        let grid = BreakpointGrid::build(&spec, &dims, 120, data.labels(), 0.15).unwrap();
        let full = OlsVarEstimator
            .estimate(1, data.endogenous(), data.exogenous(), CovarianceMode::Classical)
            .unwrap();
        let stats = RecursiveEstimator::new(&OlsVarEstimator, dims, CovarianceMode::Classical)
            .grid_statistics(&data, &grid, &full.residuals)
            .unwrap();

        prop_assert_eq!(stats.len(), 1);
        prop_assert!(stats[0].tstat_ss >= -1e-8);
        prop_assert!(stats[0].tstat_bp >= stats[0].tstat_ss - 1e-8);
    }
}
