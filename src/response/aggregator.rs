//! Single-partition response accumulation.
//!
//! For each lag slot `k` (lag `τ = k + 1`) the signs are paired with the
//! forward return that starts at the same index:
//!
//! ```text
//! signs_head = S[0 .. N-τ]
//! returns[i] = (P[i + τ] - P[i]) / P[i]        i in 0 .. N-τ
//! numerator  = Σ returns[i] · signs_head[i]
//! count      = #{ i : signs_head[i] != 0 }
//! ```
//!
//! Returns are simple relative returns. They are not log returns and must
//! not be replaced by them; published curves were produced with this form.

use super::{ObservationCounts, ResponseAccumulator, ResponseCurve};
use crate::error::{ResponseError, Result};
use crate::series::{PriceSeries, SignSeries};
use serde::{Deserialize, Serialize};

/// How signs are lined up with midpoints before accumulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignAlignment {
    /// Pair the sign of tick `t + 1` with the midpoint at tick `t`, so the
    /// return is measured from the midpoint just before the trade.
    #[default]
    PreviousMidpoint,

    /// Pair sign and midpoint at the same index.
    Contemporaneous,
}

impl SignAlignment {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignAlignment::PreviousMidpoint => "previous_midpoint",
            SignAlignment::Contemporaneous => "contemporaneous",
        }
    }

    /// Apply the alignment, returning equal-length series.
    pub fn apply(
        self,
        prices: &PriceSeries,
        signs: &SignSeries,
    ) -> Result<(PriceSeries, SignSeries)> {
        check_lengths(prices, signs)?;

        match self {
            SignAlignment::Contemporaneous => Ok((prices.clone(), signs.clone())),
            SignAlignment::PreviousMidpoint => {
                let n = prices.len();
                if n < 2 {
                    return Err(ResponseError::InsufficientData { needed: 2, got: n });
                }
                Ok((prices.slice(0..n - 1), signs.slice(1..n)))
            }
        }
    }
}

fn check_lengths(prices: &PriceSeries, signs: &SignSeries) -> Result<()> {
    if prices.len() != signs.len() {
        return Err(ResponseError::config(format!(
            "price/sign length mismatch: {} vs {}",
            prices.len(),
            signs.len()
        )));
    }
    Ok(())
}

/// Accumulate `(Σ r·ε, n)` for every lag slot of one partition.
///
/// Slots whose lag reaches past the end of the series stay empty
/// (numerator 0, count 0).
///
/// # Errors
///
/// [`ResponseError::Configuration`] if `tau_max` is zero or the series
/// lengths differ.
pub fn accumulate_response(
    prices: &PriceSeries,
    signs: &SignSeries,
    tau_max: usize,
) -> Result<ResponseAccumulator> {
    if tau_max == 0 {
        return Err(ResponseError::config("tau_max must be > 0"));
    }
    check_lengths(prices, signs)?;

    let p = prices.prices();
    let s = signs.values();
    let n = p.len();

    let mut numerators = vec![0.0; tau_max];
    let mut counts = vec![0u64; tau_max];

    for k in 0..tau_max {
        let tau = k + 1;
        if tau >= n {
            break;
        }
        let m = n - tau;

        let (sum, count) = p[tau..]
            .iter()
            .zip(&p[..m])
            .zip(&s[..m])
            .filter(|(_, &sign)| sign != 0)
            .fold((0.0, 0u64), |(sum, count), ((&later, &earlier), &sign)| {
                let ret = (later - earlier) / earlier;
                (sum + ret * sign as f64, count + 1)
            });

        if count > 0 {
            numerators[k] = sum;
        }
        counts[k] = count;
    }

    ResponseAccumulator::from_parts(numerators, counts)
}

/// Normalised response curve of one partition plus its observation counts.
pub fn compute_response(
    prices: &PriceSeries,
    signs: &SignSeries,
    tau_max: usize,
) -> Result<(ResponseCurve, ObservationCounts)> {
    let acc = accumulate_response(prices, signs, tau_max)?;
    Ok((acc.normalize(), acc.counts().to_vec()))
}
