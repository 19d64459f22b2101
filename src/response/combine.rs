//! Combining response curves.
//!
//! Two different averages are used on purpose:
//!
//! ```text
//! year curve   R_y(τ) = Σ_w num_w(τ) / Σ_w n_w(τ)     (observation-weighted)
//! group curve  R_g(τ) = (1/K) Σ_k R_k(τ)              (unweighted)
//! ```
//!
//! Every instrument in a group counts equally regardless of how actively it
//! trades, while within one instrument every observation counts equally.

use super::{ResponseAccumulator, ResponseCurve};
use crate::error::{ResponseError, Result};

/// Combine per-partition accumulators into one observation-weighted curve.
///
/// Missing partitions are simply absent from the iterator. If no partition
/// contributes to a lag, that slot is `NaN`; an empty iterator yields an
/// all-`NaN` curve.
pub fn combine_partitions<'a, I>(tau_max: usize, partitions: I) -> Result<ResponseCurve>
where
    I: IntoIterator<Item = &'a ResponseAccumulator>,
{
    if tau_max == 0 {
        return Err(ResponseError::config("tau_max must be > 0"));
    }

    let mut total = ResponseAccumulator::zeros(tau_max);
    for acc in partitions {
        total.merge(acc)?;
    }
    Ok(total.normalize())
}

/// Unweighted arithmetic mean of instrument curves.
///
/// A `NaN` slot in any input makes that slot `NaN` in the result.
///
/// # Errors
///
/// [`ResponseError::Configuration`] if `curves` is empty or the curves
/// differ in length.
pub fn combine_instruments(curves: &[ResponseCurve]) -> Result<ResponseCurve> {
    let first = curves
        .first()
        .ok_or_else(|| ResponseError::config("cannot combine an empty set of curves"))?;
    let tau_max = first.tau_max();

    let mut sums = vec![0.0; tau_max];
    for curve in curves {
        if curve.tau_max() != tau_max {
            return Err(ResponseError::config(format!(
                "curve length mismatch: {} vs {}",
                curve.tau_max(),
                tau_max
            )));
        }
        for (sum, v) in sums.iter_mut().zip(curve.values()) {
            *sum += v;
        }
    }

    let k = curves.len() as f64;
    Ok(ResponseCurve::new(sums.into_iter().map(|s| s / k).collect()))
}
