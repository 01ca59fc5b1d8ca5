//! Breakpoint grid construction.
//!
//! A candidate break `b` is an effective-sample offset: the pre-break regime
//! covers effective observations `0..b` (`n1 = b` residuals) and the
//! post-break regime covers `b..T` (`n2 = T - b` residuals). In raw rows the
//! pre-break estimation window is `[0, b + p - 1]` and the post-break window is
//! `[b, T + p - 1]`, its first `p` rows serving as presample.
//!
//! The forward span holds the last row of every pre-break window and the
//! backward span the first row of every post-break window. Both advance by one
//! row per candidate, so their lengths must agree.

use crate::config::{BreakSpec, TRIM_STEP};
use crate::errors::{ChowResult, ChowTestError};
use crate::sample::{ObservationLabels, SampleWindow};
use crate::statistics::ModelDimensions;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One break date under test.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BreakCandidate {
    /// Effective-sample offset of the first post-break observation
    pub break_index: usize,
    /// Pre-break residual count `n1`
    pub pre_len: usize,
    /// Post-break residual count `n2`
    pub post_len: usize,
    /// Label of the first post-break observation
    pub label: String,
}

/// Ordered break candidates with the recursive estimation spans that cover them.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BreakpointGrid {
    /// Final trimming fraction (`None` for a single requested date)
    pub trim: Option<f64>,
    /// Raw rows in the sample
    pub nobs: usize,
    /// Effective sample length `T`
    pub effective_len: usize,
    /// Span of pre-break window end rows
    pub forward: SampleWindow,
    /// Span of post-break window start rows
    pub backward: SampleWindow,
    candidates: Vec<BreakCandidate>,
}

impl BreakpointGrid {
    /// Build the grid for a break specification.
    ///
    /// A window may hold as few as `param = n(1 + p) + m` residuals. At that
    /// bound only `n - 1` residual degrees of freedom remain, so estimation
    /// over such a window fails with a `NumericalError`. In every-date mode
    /// the trim search adds one step of margin, which short samples can
    /// round back onto the bound.
    pub fn build(
        spec: &BreakSpec,
        dims: &ModelDimensions,
        nobs: usize,
        labels: &ObservationLabels,
        initial_trim: f64,
    ) -> ChowResult<Self> {
        if nobs <= dims.lags {
            return Err(ChowTestError::InsufficientData {
                required: dims.lags + 1,
                actual: nobs,
            });
        }
        let effective_len = nobs - dims.lags;

        let (trim, first_break, last_break) = match spec {
            BreakSpec::Every => {
                let (trim, trim_obs) = search_trim(effective_len, dims.param(), initial_trim)?;
                if trim_obs == 0 || trim_obs > effective_len - trim_obs {
                    return Err(ChowTestError::configuration(format!(
                        "trimming {} of {} observations at each end leaves no candidate break dates",
                        trim_obs, effective_len
                    )));
                }
                (Some(trim), trim_obs, effective_len - trim_obs)
            }
            BreakSpec::Date(label) => {
                let raw = labels.position(label)?;
                if raw < dims.lags {
                    return Err(ChowTestError::configuration(format!(
                        "break date '{}' falls inside the {}-observation presample",
                        label, dims.lags
                    )));
                }
                let b = raw - dims.lags;
                check_fixed_windows(b, effective_len, dims.param())?;
                (None, b, b)
            }
        };

        let forward = SampleWindow::new(first_break + dims.lags - 1, last_break + dims.lags - 1)?;
        let backward = SampleWindow::new(first_break, last_break)?;
        ensure_matching_passes(forward.len(), backward.len())?;

        let candidates = (0..forward.len())
            .map(|i| {
                let b = first_break + i;
                BreakCandidate {
                    break_index: b,
                    pre_len: b,
                    post_len: effective_len - b,
                    label: labels
                        .label(b + dims.lags)
                        .map(str::to_string)
                        .unwrap_or_else(|| (b + dims.lags + 1).to_string()),
                }
            })
            .collect::<Vec<_>>();

        log::debug!(
            "breakpoint grid: T = {}, trim = {:?}, {} candidates [{}, {}]",
            effective_len,
            trim,
            candidates.len(),
            first_break,
            last_break
        );

        Ok(Self {
            trim,
            nobs,
            effective_len,
            forward,
            backward,
            candidates,
        })
    }

    /// Number of candidates (`iterat`).
    pub fn iterat(&self) -> usize {
        self.candidates.len()
    }

    /// Candidates in increasing break order.
    pub fn candidates(&self) -> &[BreakCandidate] {
        &self.candidates
    }

    /// Pre-break estimation window of candidate `i`.
    pub fn forward_window(&self, i: usize) -> SampleWindow {
        SampleWindow {
            first: 0,
            last: self.forward.first + i,
        }
    }

    /// Post-break estimation window of candidate `i`.
    pub fn backward_window(&self, i: usize) -> SampleWindow {
        SampleWindow {
            first: self.backward.first + i,
            last: self.nobs - 1,
        }
    }
}

/// Widen the trim in steps of 0.01 until the first window holds at least
/// `param` observations, then add one more step of margin.
///
/// Returns the final trim and `round(T * trim)`.
pub fn search_trim(effective_len: usize, param: usize, initial_trim: f64) -> ChowResult<(f64, usize)> {
    let mut steps = 0usize;
    loop {
        let trim = initial_trim + steps as f64 * TRIM_STEP;
        if trim > 1.0 {
            return Err(ChowTestError::configuration(format!(
                "starting sample smaller than parameters: {} observations cannot hold {} parameters at any trim",
                effective_len, param
            )));
        }
        let trim_obs = (effective_len as f64 * trim).round() as usize;
        if trim_obs >= param {
            break;
        }
        steps += 1;
    }

    let trim = initial_trim + (steps + 1) as f64 * TRIM_STEP;
    if trim > 1.0 {
        return Err(ChowTestError::configuration(format!(
            "trim widened to {:.2}, beyond the sample",
            trim
        )));
    }
    if steps > 0 {
        log::info!(
            "trim widened from {:.2} to {:.2} to fit {} parameters",
            initial_trim,
            trim,
            param
        );
    }
    Ok((trim, (effective_len as f64 * trim).round() as usize))
}

/// Abort when the forward and backward passes would visit different numbers
/// of windows.
pub fn ensure_matching_passes(forward_len: usize, backward_len: usize) -> ChowResult<()> {
    if forward_len != backward_len {
        return Err(ChowTestError::configuration(format!(
            "forward pass has {} windows but backward pass has {}",
            forward_len, backward_len
        )));
    }
    Ok(())
}

fn check_fixed_windows(break_index: usize, effective_len: usize, param: usize) -> ChowResult<()> {
    if break_index < param {
        return Err(ChowTestError::configuration(format!(
            "starting sample smaller than parameters: {} observations for {} parameters",
            break_index, param
        )));
    }
    let post = effective_len.saturating_sub(break_index);
    if post < param {
        return Err(ChowTestError::configuration(format!(
            "ending sample smaller than parameters: {} observations for {} parameters",
            post, param
        )));
    }
    Ok(())
}
