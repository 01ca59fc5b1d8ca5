//! # Chow Test Results
//!
//! Result structures produced by the assembler: one [`ChowTestRow`] per
//! candidate break, collected in a [`ChowTestTable`], and the
//! [`ChowTestReport`] returned by the analyzer. The table converts to the
//! 13-column numeric matrix described by [`COLUMN_NAMES`] and to a
//! [`PValueProfile`] for plotting.

use crate::bootstrap::BootstrapOutcome;
use crate::errors::{ChowResult, ChowTestError};
use crate::grid::{BreakCandidate, BreakpointGrid};
use crate::statistics::ChowStatistics;
use nalgebra::DMatrix;
use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Column order of [`ChowTestTable::to_matrix`].
pub const COLUMN_NAMES: [&str; 13] = [
    "tstat_ss",
    "tstat_ss_bootmean",
    "df_ss",
    "pv_ss_boot",
    "tstat_bp",
    "tstat_bp_bootmean",
    "df_bp",
    "pv_bp_boot",
    "tstat_fc",
    "tstat_fc_bootmean",
    "df_fc1",
    "df_fc2",
    "pv_fc_boot",
];

/// Significance levels drawn as reference lines in a p-value plot.
pub const REFERENCE_LEVELS: [f64; 2] = [0.05, 0.10];

/// All results for one candidate break date.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChowTestRow {
    /// Label of the first post-break observation
    pub label: String,
    /// Effective-sample offset of the break
    pub break_index: usize,
    /// Pre-break residual count
    pub pre_len: usize,
    /// Post-break residual count
    pub post_len: usize,

    /// Sample-split statistic
    pub tstat_ss: f64,
    /// Mean sample-split statistic over replicates
    pub tstat_ss_bootmean: f64,
    /// Sample-split degrees of freedom
    pub df_ss: f64,
    /// Bootstrap p-value of `tstat_ss`
    pub pv_ss_boot: f64,
    /// Chi-square tail probability of `tstat_ss`
    pub pv_ss_asym: Option<f64>,

    /// Break-point statistic
    pub tstat_bp: f64,
    /// Mean break-point statistic over replicates
    pub tstat_bp_bootmean: f64,
    /// Break-point degrees of freedom
    pub df_bp: f64,
    /// Bootstrap p-value of `tstat_bp`
    pub pv_bp_boot: f64,
    /// Chi-square tail probability of `tstat_bp`
    pub pv_bp_asym: Option<f64>,

    /// Forecast (Rao F) statistic
    pub tstat_fc: f64,
    /// Mean forecast statistic over replicates
    pub tstat_fc_bootmean: f64,
    /// Forecast numerator degrees of freedom
    pub df_fc1: f64,
    /// Forecast denominator degrees of freedom
    pub df_fc2: f64,
    /// Bootstrap p-value of `tstat_fc`
    pub pv_fc_boot: f64,
    /// F tail probability of `tstat_fc`
    pub pv_fc_asym: Option<f64>,
}

impl ChowTestRow {
    /// The 13 numeric columns in [`COLUMN_NAMES`] order.
    pub fn values(&self) -> [f64; 13] {
        [
            self.tstat_ss,
            self.tstat_ss_bootmean,
            self.df_ss,
            self.pv_ss_boot,
            self.tstat_bp,
            self.tstat_bp_bootmean,
            self.df_bp,
            self.pv_bp_boot,
            self.tstat_fc,
            self.tstat_fc_bootmean,
            self.df_fc1,
            self.df_fc2,
            self.pv_fc_boot,
        ]
    }
}

/// Rows in increasing break order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChowTestTable {
    rows: Vec<ChowTestRow>,
}

impl ChowTestTable {
    /// All rows.
    pub fn rows(&self) -> &[ChowTestRow] {
        &self.rows
    }

    /// Number of tested candidates.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when no candidate was tested.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row for a break label, if it was tested.
    pub fn row(&self, label: &str) -> Option<&ChowTestRow> {
        self.rows.iter().find(|r| r.label == label.trim())
    }

    /// `rows x 13` matrix, columns as in [`COLUMN_NAMES`].
    pub fn to_matrix(&self) -> DMatrix<f64> {
        let values: Vec<[f64; 13]> = self.rows.iter().map(ChowTestRow::values).collect();
        DMatrix::from_fn(values.len(), COLUMN_NAMES.len(), |i, j| values[i][j])
    }

    /// Bootstrap p-value series for an external plot.
    pub fn p_value_profile(&self) -> PValueProfile {
        PValueProfile {
            labels: self.rows.iter().map(|r| r.label.clone()).collect(),
            sample_split: self.rows.iter().map(|r| r.pv_ss_boot).collect(),
            break_point: self.rows.iter().map(|r| r.pv_bp_boot).collect(),
            forecast: self.rows.iter().map(|r| r.pv_fc_boot).collect(),
            reference_levels: REFERENCE_LEVELS,
        }
    }
}

/// Three bootstrap p-value series over the break dates, plus the reference
/// significance lines.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PValueProfile {
    /// Break labels, x axis
    pub labels: Vec<String>,
    /// Sample-split bootstrap p-values
    pub sample_split: Vec<f64>,
    /// Break-point bootstrap p-values
    pub break_point: Vec<f64>,
    /// Forecast bootstrap p-values
    pub forecast: Vec<f64>,
    /// Horizontal lines at 0.05 and 0.10
    pub reference_levels: [f64; 2],
}

impl PValueProfile {
    /// Labels where any of the three tests rejects at `level`.
    pub fn rejections(&self, level: f64) -> Vec<&str> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(i, _)| {
                self.sample_split[*i] < level || self.break_point[*i] < level || self.forecast[*i] < level
            })
            .map(|(_, l)| l.as_str())
            .collect()
    }
}

/// Complete output of a stability analysis.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChowTestReport {
    /// Per-candidate results
    pub table: ChowTestTable,
    /// Grid the candidates came from
    pub grid: BreakpointGrid,
    /// VAR lag order
    pub lags: usize,
    /// Bootstrap replications
    pub replications: usize,
    /// Seed used, if one was fixed
    pub seed: Option<u64>,
}

impl ChowTestReport {
    /// Final trimming fraction (`None` for a single date).
    pub fn trim(&self) -> Option<f64> {
        self.grid.trim
    }

    /// See [`ChowTestTable::p_value_profile`].
    pub fn p_value_profile(&self) -> PValueProfile {
        self.table.p_value_profile()
    }
}

/// Upper tail probability of a chi-square statistic; `None` if `df <= 0`.
pub fn chi_square_tail(stat: f64, df: f64) -> Option<f64> {
    if df.is_nan() || df <= 0.0 || !stat.is_finite() {
        return None;
    }
    let dist = ChiSquared::new(df).ok()?;
    Some(1.0 - dist.cdf(stat.max(0.0)))
}

/// Upper tail probability of an F statistic; `None` if either df is not positive.
pub fn f_tail(stat: f64, df1: f64, df2: f64) -> Option<f64> {
    if df1.is_nan() || df2.is_nan() || df1 <= 0.0 || df2 <= 0.0 || !stat.is_finite() {
        return None;
    }
    let dist = FisherSnedecor::new(df1, df2).ok()?;
    Some(1.0 - dist.cdf(stat.max(0.0)))
}

/// Merge point statistics, bootstrap output and candidate metadata into a table.
pub fn assemble_table(
    candidates: &[BreakCandidate],
    statistics: &[ChowStatistics],
    bootstrap: &BootstrapOutcome,
) -> ChowResult<ChowTestTable> {
    let n = candidates.len();
    if statistics.len() != n || bootstrap.mean.len() != n || bootstrap.p_value.len() != n {
        return Err(ChowTestError::configuration(format!(
            "cannot assemble {} candidates with {} statistics and {} bootstrap rows",
            n,
            statistics.len(),
            bootstrap.p_value.len()
        )));
    }

    let rows = candidates
        .iter()
        .zip(statistics)
        .zip(bootstrap.mean.iter().zip(&bootstrap.p_value))
        .map(|((c, s), (mean, pv))| ChowTestRow {
            label: c.label.clone(),
            break_index: c.break_index,
            pre_len: c.pre_len,
            post_len: c.post_len,
            tstat_ss: s.tstat_ss,
            tstat_ss_bootmean: mean[0],
            df_ss: s.df_ss,
            pv_ss_boot: pv[0],
            pv_ss_asym: chi_square_tail(s.tstat_ss, s.df_ss),
            tstat_bp: s.tstat_bp,
            tstat_bp_bootmean: mean[1],
            df_bp: s.df_bp,
            pv_bp_boot: pv[1],
            pv_bp_asym: chi_square_tail(s.tstat_bp, s.df_bp),
            tstat_fc: s.tstat_fc,
            tstat_fc_bootmean: mean[2],
            df_fc1: s.df_fc1,
            df_fc2: s.df_fc2,
            pv_fc_boot: pv[2],
            pv_fc_asym: f_tail(s.tstat_fc, s.df_fc1, s.df_fc2),
        })
        .collect();

    Ok(ChowTestTable { rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn candidate(b: usize) -> BreakCandidate {
        BreakCandidate {
            break_index: b,
            pre_len: b,
            post_len: 100 - b,
            label: (b + 2).to_string(),
        }
    }

    fn stats(v: f64) -> ChowStatistics {
        ChowStatistics {
            tstat_ss: v,
            df_ss: 6.0,
            tstat_bp: v + 1.0,
            df_bp: 9.0,
            tstat_fc: v / 10.0,
            df_fc1: 100.0,
            df_fc2: 92.0,
        }
    }

    fn table() -> ChowTestTable {
        let outcome = BootstrapOutcome {
            replications: 99,
            mean: vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]],
            p_value: vec![[0.01, 0.2, 0.5], [0.3, 0.4, 0.08]],
        };
        assemble_table(&[candidate(40), candidate(41)], &[stats(12.0), stats(3.0)], &outcome).unwrap()
    }

    #[test]
    fn test_matrix_column_order() {
        let m = table().to_matrix();
        assert_eq!(m.shape(), (2, 13));
        assert_eq!(m[(0, 0)], 12.0);
        assert_eq!(m[(0, 1)], 1.0);
        assert_eq!(m[(0, 2)], 6.0);
        assert_eq!(m[(0, 3)], 0.01);
        assert_eq!(m[(0, 4)], 13.0);
        assert_eq!(m[(0, 6)], 9.0);
        assert_eq!(m[(0, 8)], 1.2);
        assert_eq!(m[(0, 10)], 100.0);
        assert_eq!(m[(0, 11)], 92.0);
        assert_eq!(m[(1, 12)], 0.08);
        assert_eq!(COLUMN_NAMES[12], "pv_fc_boot");
    }

    #[test]
    fn test_rows_keep_candidate_metadata() {
        let t = table();
        assert_eq!(t.len(), 2);
        let row = t.row("43").unwrap();
        assert_eq!(row.break_index, 41);
        assert_eq!(row.pre_len, 41);
        assert_eq!(row.post_len, 59);
        assert!(t.row("7").is_none());
        assert!(row.pv_ss_asym.unwrap() > 0.0);
    }

    #[test]
    fn test_profile() {
        let profile = table().p_value_profile();
        assert_eq!(profile.labels, vec!["42", "43"]);
        assert_eq!(profile.forecast, vec![0.5, 0.08]);
        assert_eq!(profile.reference_levels, [0.05, 0.10]);
        assert_eq!(profile.rejections(0.05), vec!["42"]);
        assert_eq!(profile.rejections(0.10), vec!["42", "43"]);
    }

    #[test]
    fn test_length_mismatch() {
        let outcome = BootstrapOutcome {
            replications: 99,
            mean: vec![[0.0; 3]],
            p_value: vec![[0.0; 3]],
        };
        assert!(matches!(
            assemble_table(&[candidate(40), candidate(41)], &[stats(1.0)], &outcome),
            Err(ChowTestError::Configuration { .. })
        ));
    }

    #[test]
    fn test_non_positive_forecast_df_has_no_asymptotic_p_value() {
        let mut s = stats(4.0);
        s.df_fc2 = 0.0;
        let outcome = BootstrapOutcome {
            replications: 99,
            mean: vec![[0.0; 3]],
            p_value: vec![[0.5; 3]],
        };
        let t = assemble_table(&[candidate(40)], &[s], &outcome).unwrap();
        let row = &t.rows()[0];
        assert!(row.pv_fc_asym.is_none());
        assert!(row.pv_ss_asym.is_some());
        assert_eq!(row.pv_fc_boot, 0.5);
    }

    #[test]
    fn test_tail_probabilities() {
        // Chi-square(2) survival is exp(-x / 2).
        assert_approx_eq!(chi_square_tail(2.0 * 20f64.ln(), 2.0).unwrap(), 0.05, 1e-9);
        assert_approx_eq!(chi_square_tail(-1.0, 2.0).unwrap(), 1.0, 1e-12);
        assert!(chi_square_tail(1.0, 0.0).is_none());

        let p1 = f_tail(1.0, 4.0, 40.0).unwrap();
        let p2 = f_tail(3.0, 4.0, 40.0).unwrap();
        assert!(p1 > p2);
        assert!((0.0..=1.0).contains(&p2));
        assert!(f_tail(1.0, 4.0, -3.0).is_none());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_report_serde_round_trip() {
        use crate::config::BreakSpec;
        use crate::sample::ObservationLabels;
        use crate::statistics::ModelDimensions;

        let dims = ModelDimensions::new(1, 2, 0);
        let grid = BreakpointGrid::build(
            &BreakSpec::Every,
            &dims,
            102,
            &ObservationLabels::sequential(102),
            0.15,
        )
        .unwrap();
        let report = ChowTestReport {
            table: table(),
            grid,
            lags: 1,
            replications: 99,
            seed: Some(7),
        };

        let json = serde_json::to_string(&report).unwrap();
        let back: ChowTestReport = serde_json::from_str(&json).unwrap();

        assert_eq!(back.lags, 1);
        assert_eq!(back.seed, Some(7));
        assert_eq!(back.grid.iterat(), report.grid.iterat());
        assert_eq!(back.grid.candidates(), report.grid.candidates());
        assert_eq!(back.table.len(), 2);
        for (a, b) in back.table.rows().iter().zip(report.table.rows()) {
            assert_eq!(a.label, b.label);
            assert_eq!(a.pv_ss_asym.is_some(), b.pv_ss_asym.is_some());
            for (x, y) in a.values().iter().zip(b.values().iter()) {
                assert_approx_eq!(*x, *y, 1e-12);
            }
        }
    }
}
