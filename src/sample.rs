//! Sample bookkeeping: observation labels, index windows, and validated VAR data.
//!
//! Internally every window is an integer range over the raw observation rows.
//! Labels are only consulted to interpret a requested break date and to tag
//! output rows.

use crate::errors::{validate_all_finite, ChowResult, ChowTestError};
use nalgebra::DMatrix;
use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A contiguous, inclusive range `[first, last]` of raw observation indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SampleWindow {
    /// First index in the window
    pub first: usize,
    /// Last index in the window (inclusive)
    pub last: usize,
}

impl SampleWindow {
    /// Create a window; `first` must not exceed `last`.
    pub fn new(first: usize, last: usize) -> ChowResult<Self> {
        if first > last {
            return Err(ChowTestError::configuration(format!(
                "sample window [{}, {}] is empty",
                first, last
            )));
        }
        Ok(Self { first, last })
    }

    /// Number of observations covered.
    pub(crate) fn len(&self) -> usize {
        self.last - self.first + 1
    }
}

/// Translates between observation labels and raw row offsets.
#[derive(Debug, Clone)]
pub struct ObservationLabels {
    labels: Vec<String>,
    positions: HashMap<String, usize>,
}

impl ObservationLabels {
    /// Caller-supplied labels, one per raw observation. Labels must be unique.
    pub fn new(labels: Vec<String>) -> ChowResult<Self> {
        let mut positions = HashMap::with_capacity(labels.len());
        for (i, label) in labels.iter().enumerate() {
            if positions.insert(label.clone(), i).is_some() {
                return Err(ChowTestError::configuration(format!(
                    "duplicate observation label '{}'",
                    label
                )));
            }
        }
        Ok(Self { labels, positions })
    }

    /// Sequential 1-based labels `"1"`, `"2"`, ...
    pub fn sequential(len: usize) -> Self {
        let labels: Vec<String> = (1..=len).map(|i| i.to_string()).collect();
        let positions = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.clone(), i))
            .collect();
        Self { labels, positions }
    }

    /// Raw row offset of a label.
    pub fn position(&self, label: &str) -> ChowResult<usize> {
        self.positions.get(label.trim()).copied().ok_or_else(|| {
            ChowTestError::configuration(format!("unknown observation label '{}'", label))
        })
    }

    /// Label of a raw row offset.
    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// Number of labelled observations.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// True when no observations are labelled.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Endogenous and exogenous data for a VAR, validated for shape and finiteness.
///
/// Rows are observations. The exogenous block may have zero columns; the
/// intercept is always added by the estimator and is not part of it.
#[derive(Debug, Clone)]
pub struct VarData {
    endogenous: DMatrix<f64>,
    exogenous: DMatrix<f64>,
    labels: ObservationLabels,
}

impl VarData {
    /// Validate and bundle the data. Mismatched row counts between `Y` and
    /// `X` (or the labels) are a configuration error.
    pub fn new(
        endogenous: DMatrix<f64>,
        exogenous: Option<DMatrix<f64>>,
        labels: Option<ObservationLabels>,
    ) -> ChowResult<Self> {
        let rows = endogenous.nrows();
        if endogenous.ncols() == 0 {
            return Err(ChowTestError::configuration(
                "endogenous data has no variables",
            ));
        }

        let exogenous = exogenous.unwrap_or_else(|| DMatrix::zeros(rows, 0));
        if exogenous.nrows() != rows {
            return Err(ChowTestError::configuration(format!(
                "endogenous data has {} rows but exogenous data has {}",
                rows,
                exogenous.nrows()
            )));
        }

        let labels = labels.unwrap_or_else(|| ObservationLabels::sequential(rows));
        if labels.len() != rows {
            return Err(ChowTestError::configuration(format!(
                "{} observation labels supplied for {} rows",
                labels.len(),
                rows
            )));
        }

        validate_all_finite(endogenous.as_slice(), "endogenous data")?;
        validate_all_finite(exogenous.as_slice(), "exogenous data")?;

        Ok(Self {
            endogenous,
            exogenous,
            labels,
        })
    }

    /// Endogenous matrix `Y`.
    pub fn endogenous(&self) -> &DMatrix<f64> {
        &self.endogenous
    }

    /// Exogenous matrix `X` (possibly zero columns).
    pub fn exogenous(&self) -> &DMatrix<f64> {
        &self.exogenous
    }

    /// Observation labels.
    pub fn labels(&self) -> &ObservationLabels {
        &self.labels
    }

    /// Number of raw observations.
    pub fn nobs(&self) -> usize {
        self.endogenous.nrows()
    }

    /// Number of endogenous variables `n`.
    pub fn n_endogenous(&self) -> usize {
        self.endogenous.ncols()
    }

    /// Number of exogenous columns `m`.
    pub fn n_exogenous(&self) -> usize {
        self.exogenous.ncols()
    }

    /// Copy of the endogenous rows inside `window`.
    pub fn endogenous_window(&self, window: SampleWindow) -> DMatrix<f64> {
        self.endogenous
            .rows(window.first, window.len())
            .into_owned()
    }

    /// Copy of the exogenous rows inside `window`.
    pub fn exogenous_window(&self, window: SampleWindow) -> DMatrix<f64> {
        self.exogenous.rows(window.first, window.len()).into_owned()
    }

    /// Same exogenous data and labels with a different endogenous matrix.
    pub(crate) fn with_endogenous(&self, endogenous: DMatrix<f64>) -> Self {
        debug_assert_eq!(endogenous.shape(), self.endogenous.shape());
        Self {
            endogenous,
            exogenous: self.exogenous.clone(),
            labels: self.labels.clone(),
        }
    }
}
