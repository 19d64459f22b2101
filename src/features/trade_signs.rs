//! Trade Sign Inference
//!
//! Infers the direction of order flow from midpoint price changes:
//!
//! ```text
//! ε(t) = sign(m(t) - m(t-1))
//! ```
//!
//! where +1 indicates buyer-initiated flow (the midpoint moved up) and -1
//! seller-initiated flow. FX quote feeds carry no trade prints, so the
//! midpoint change is the only available proxy.
//!
//! # Flat Ticks
//!
//! An unchanged midpoint carries no new information; it inherits the last
//! observed direction (forward fill).
//!
//! # Leading Ticks
//!
//! Index 0 has no predecessor, and any flat run at the start of the series
//! has no earlier direction to inherit. These positions are back-filled with
//! the first non-zero direction in the series, so the result never contains
//! a zero.
//!
//! # Example
//!
//! ```
//! use fx_response::features::trade_signs::derive_trade_signs;
//! use fx_response::series::PriceSeries;
//!
//! let prices = PriceSeries::from_prices(vec![1.0, 1.0, 2.0, 2.0, 1.0]).unwrap();
//! let signs = derive_trade_signs(&prices).unwrap();
//!
//! assert_eq!(signs.values(), &[1, 1, 1, 1, -1]);
//! ```

use crate::error::{ResponseError, Result};
use crate::series::{PriceSeries, SignSeries};

/// Sign of a price difference as `-1`, `0` or `+1`.
#[inline]
fn direction(diff: f64) -> i8 {
    if diff > 0.0 {
        1
    } else if diff < 0.0 {
        -1
    } else {
        0
    }
}

/// Derive one trade sign per price.
///
/// # Errors
///
/// - [`ResponseError::InsufficientData`] if the series has fewer than 2 points
/// - [`ResponseError::InvariantViolation`] if the price never changes, so no
///   direction can be inferred for any tick
pub fn derive_trade_signs(prices: &PriceSeries) -> Result<SignSeries> {
    let p = prices.prices();
    let n = p.len();

    if n < 2 {
        return Err(ResponseError::InsufficientData { needed: 2, got: n });
    }

    let mut signs = vec![0i8; n];

    for i in 1..n {
        let s = direction(p[i] - p[i - 1]);
        signs[i] = if s != 0 { s } else { signs[i - 1] };
    }

    let first = signs.iter().position(|&s| s != 0).ok_or_else(|| {
        ResponseError::invariant(format!(
            "midpoint never changes over {n} ticks; trade direction is undefined"
        ))
    })?;

    let fill = signs[first];
    signs[..first].iter_mut().for_each(|s| *s = fill);

    // Rejects any zero that slipped through.
    SignSeries::trade(signs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::SignKind;

    fn signs_of(prices: Vec<f64>) -> Result<SignSeries> {
        derive_trade_signs(&PriceSeries::from_prices(prices).unwrap())
    }

    #[test]
    fn test_forward_fill() {
        let signs = signs_of(vec![1.0, 1.0, 2.0, 2.0, 1.0]).unwrap();

        assert_eq!(signs.values()[2], 1);
        assert_eq!(signs.values()[3], 1); // carried
        assert_eq!(signs.values()[4], -1);
    }

    #[test]
    fn test_index_zero_copies_first_direction() {
        let signs = signs_of(vec![1.0, 0.9, 1.0]).unwrap();
        assert_eq!(signs.values(), &[-1, -1, 1]);
    }

    #[test]
    fn test_leading_flat_run_back_filled() {
        let signs = signs_of(vec![5.0, 5.0, 5.0, 4.0, 4.0, 6.0]).unwrap();
        assert_eq!(signs.values(), &[-1, -1, -1, -1, -1, 1]);
    }

    #[test]
    fn test_no_zeros() {
        let signs = signs_of(vec![100.0, 100.0, 101.0, 99.0, 99.0, 100.0]).unwrap();

        assert_eq!(signs.kind(), SignKind::Trade);
        assert_eq!(signs.nonzero_count(), signs.len());
        assert_eq!(&signs.values()[2..], &[1, -1, -1, 1]);
    }

    #[test]
    fn test_deterministic() {
        let prices = PriceSeries::from_prices(vec![1.0, 1.2, 1.1, 1.1, 1.3]).unwrap();
        let a = derive_trade_signs(&prices).unwrap();
        let b = derive_trade_signs(&prices).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_too_short() {
        let err = signs_of(vec![1.0]).unwrap_err();
        assert!(matches!(err, ResponseError::InsufficientData { got: 1, .. }));

        let err = signs_of(vec![]).unwrap_err();
        assert!(matches!(err, ResponseError::InsufficientData { got: 0, .. }));
    }

    #[test]
    fn test_flat_series_is_invariant_violation() {
        let err = signs_of(vec![1.5, 1.5, 1.5]).unwrap_err();
        assert!(matches!(err, ResponseError::InvariantViolation(_)));
    }
}
