//! Physical Time Resampling
//!
//! Converts trade-time series (one point per quote tick) into physical-time
//! series (one point per fixed-width time bin, one second by default), so
//! that response functions can be measured with τ in seconds instead of
//! ticks.
//!
//! # Bin Rules
//!
//! ```text
//! m(bin) = last midpoint inside the bin, or m(bin - 1) if the bin is empty
//! ε(bin) = sign(Σ trade signs inside the bin), 0 if empty or balanced
//! ```
//!
//! The grid starts at the first tick's timestamp rounded down to a multiple
//! of the bin width and ends with the bin holding the last tick. The first
//! bin always contains a tick, so every bin has a midpoint.
//!
//! # Example
//!
//! ```ignore
//! use fx_response::preprocessing::resample_physical;
//!
//! let (prices_s, signs_s) = resample_physical(&prices, &signs, 1_000_000_000)?;
//! assert_eq!(prices_s.len(), signs_s.len());
//! ```

use crate::error::{ResponseError, Result};
use crate::series::{PriceSeries, SignSeries};

/// One second, in nanoseconds.
pub const ONE_SECOND_NS: u64 = 1_000_000_000;

/// Resample trade-time prices and signs onto a fixed-width time grid.
///
/// # Errors
///
/// - [`ResponseError::Configuration`] if `bin_width_ns` is zero or the inputs
///   differ in length
/// - [`ResponseError::InsufficientData`] if there are fewer than 2 ticks
pub fn resample_physical(
    prices: &PriceSeries,
    signs: &SignSeries,
    bin_width_ns: u64,
) -> Result<(PriceSeries, SignSeries)> {
    if bin_width_ns == 0 {
        return Err(ResponseError::config("bin_width_ns must be > 0"));
    }
    if prices.len() != signs.len() {
        return Err(ResponseError::config(format!(
            "price/sign length mismatch: {} vs {}",
            prices.len(),
            signs.len()
        )));
    }
    if prices.len() < 2 {
        return Err(ResponseError::InsufficientData {
            needed: 2,
            got: prices.len(),
        });
    }

    let ts = prices.timestamps();
    let p = prices.prices();
    let s = signs.values();

    let start = ts[0] / bin_width_ns * bin_width_ns;
    let n_bins = ((ts[ts.len() - 1] - start) / bin_width_ns + 1) as usize;

    let mut last_mid: Vec<Option<f64>> = vec![None; n_bins];
    let mut sign_sum = vec![0i64; n_bins];

    for i in 0..p.len() {
        let bin = ((ts[i] - start) / bin_width_ns) as usize;
        last_mid[bin] = Some(p[i]);
        sign_sum[bin] += s[i] as i64;
    }

    let mut midpoints = Vec::with_capacity(n_bins);
    let mut carried = p[0];
    for mid in last_mid {
        if let Some(m) = mid {
            carried = m;
        }
        midpoints.push(carried);
    }

    let bin_signs: Vec<i8> = sign_sum.iter().map(|&sum| sum.signum() as i8).collect();
    let bin_times: Vec<u64> = (0..n_bins as u64)
        .map(|b| start + b * bin_width_ns)
        .collect();

    log::debug!(
        "Resampled {} ticks into {} bins of {} ns",
        p.len(),
        n_bins,
        bin_width_ns
    );

    Ok((
        PriceSeries::new(bin_times, midpoints)?,
        SignSeries::physical(bin_signs)?,
    ))
}
