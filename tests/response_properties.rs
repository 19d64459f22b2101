//! Property tests for trade signs and response functions.
//!
//! These tests verify:
//! 1. Trade signs are deterministic, forward-filled and never zero
//! 2. Response values match a direct evaluation of the defining formula
//! 3. Weeks combine weighted by observations, instruments unweighted
//! 4. Lags without observations are NaN rather than errors

use fx_response::{
    accumulate_response, combine_instruments, combine_partitions, compute_response,
    derive_trade_signs, PriceSeries, ResponseAccumulator, ResponseCurve, ResponseError,
    SignAlignment, SignSeries,
};

// ============================================================================
// Test Fixtures
// ============================================================================

/// Deterministic midpoint path with flat runs, starting at `start`.
fn random_walk(n: usize, seed: u64, start: f64) -> Vec<f64> {
    let mut state = seed.max(1);
    let mut price = start;
    let mut prices = Vec::with_capacity(n);
    for _ in 0..n {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        price += ((state % 5) as f64 - 2.0) * 1e-4;
        prices.push(price);
    }
    prices
}

/// Direct evaluation of R at slot k (lag k + 1).
fn reference_response(p: &[f64], s: &[i8], k: usize) -> (f64, u64) {
    let shift = k + 1;
    let mut sum = 0.0;
    let mut n = 0;
    for i in 0..p.len().saturating_sub(shift) {
        if s[i] != 0 {
            sum += (p[i + shift] - p[i]) / p[i] * s[i] as f64;
            n += 1;
        }
    }
    (sum, n)
}

// ============================================================================
// Trade Signs
// ============================================================================

#[test]
fn test_forward_fill_example() {
    let prices = PriceSeries::from_prices(vec![1.0, 1.0, 2.0, 2.0, 1.0]).unwrap();
    let signs = derive_trade_signs(&prices).unwrap();
    assert_eq!(signs.values(), &[1, 1, 1, 1, -1]);
}

#[test]
fn test_signs_deterministic_and_nonzero() {
    for seed in 1..20u64 {
        let prices = PriceSeries::from_prices(random_walk(500, seed, 1.2)).unwrap();

        let a = derive_trade_signs(&prices).unwrap();
        let b = derive_trade_signs(&prices).unwrap();

        assert_eq!(a, b);
        assert_eq!(a.len(), prices.len());
        assert!(a.values().iter().all(|&s| s == 1 || s == -1));
    }
}

#[test]
fn test_signs_follow_last_move() {
    let raw = random_walk(300, 7, 1.0);
    let prices = PriceSeries::from_prices(raw.clone()).unwrap();
    let signs = derive_trade_signs(&prices).unwrap();

    for i in 1..raw.len() {
        let d = raw[i] - raw[i - 1];
        if d > 0.0 {
            assert_eq!(signs.values()[i], 1);
        } else if d < 0.0 {
            assert_eq!(signs.values()[i], -1);
        } else {
            assert_eq!(signs.values()[i], signs.values()[i - 1]);
        }
    }
}

#[test]
fn test_trade_series_rejects_zero() {
    assert!(matches!(
        SignSeries::trade(vec![1, 0, -1]),
        Err(ResponseError::InvariantViolation(_))
    ));
}

// ============================================================================
// Single-Partition Response
// ============================================================================

#[test]
fn test_end_to_end_scenario() {
    let p = [100.0, 100.0, 101.0, 99.0, 99.0, 100.0];
    let prices = PriceSeries::from_prices(p.to_vec()).unwrap();
    let signs = derive_trade_signs(&prices).unwrap();
    assert_eq!(signs.values(), &[1, 1, 1, -1, -1, 1]);

    let (curve, counts) = compute_response(&prices, &signs, 2).unwrap();
    assert_eq!(curve.tau_max(), 2);
    assert_eq!(counts, vec![5, 4]);

    for k in 0..2 {
        let (sum, n) = reference_response(&p, signs.values(), k);
        let expected = sum / n as f64;
        assert!(
            (curve.values()[k] - expected).abs() < 1e-15,
            "slot {k}: {} vs {}",
            curve.values()[k],
            expected
        );
    }

    // slot 0 by hand: (0 + 1/100 - 2/101 + 0 - 1/99) / 5
    let by_hand = (0.01 - 2.0 / 101.0 - 1.0 / 99.0) / 5.0;
    assert!((curve.at_lag(1).unwrap() - by_hand).abs() < 1e-15);
}

#[test]
fn test_matches_reference_on_random_walks() {
    for seed in [3u64, 11, 42] {
        let raw = random_walk(400, seed, 1.5);
        let prices = PriceSeries::from_prices(raw.clone()).unwrap();
        let signs = derive_trade_signs(&prices).unwrap();

        let acc = accumulate_response(&prices, &signs, 25).unwrap();
        for k in 0..25 {
            let (sum, n) = reference_response(&raw, signs.values(), k);
            assert_eq!(acc.counts()[k], n);
            assert!((acc.numerators()[k] - sum).abs() < 1e-12);
        }
    }
}

#[test]
fn test_response_is_deterministic() {
    let prices = PriceSeries::from_prices(random_walk(1000, 5, 1.1)).unwrap();
    let signs = derive_trade_signs(&prices).unwrap();

    let a = compute_response(&prices, &signs, 50).unwrap();
    let b = compute_response(&prices, &signs, 50).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_flat_prices_give_zero_response() {
    let prices = PriceSeries::from_prices(vec![1.25; 20]).unwrap();
    let signs = SignSeries::trade(vec![1; 20]).unwrap();

    let (curve, counts) = compute_response(&prices, &signs, 5).unwrap();
    assert!(curve.values().iter().all(|&v| v == 0.0));
    assert!(counts.iter().all(|&n| n > 0));
}

#[test]
fn test_lags_beyond_series_are_nan() {
    let prices = PriceSeries::from_prices(vec![1.0, 1.1, 1.0, 1.2]).unwrap();
    let signs = derive_trade_signs(&prices).unwrap();

    let (curve, counts) = compute_response(&prices, &signs, 6).unwrap();
    assert_eq!(counts, vec![3, 2, 1, 0, 0, 0]);
    assert_eq!(curve.finite_count(), 3);
    assert!(curve.values()[3..].iter().all(|v| v.is_nan()));
}

#[test]
fn test_alignment_shortens_by_one() {
    let prices = PriceSeries::from_prices(random_walk(50, 9, 1.0)).unwrap();
    let signs = derive_trade_signs(&prices).unwrap();

    let (p, s) = SignAlignment::PreviousMidpoint.apply(&prices, &signs).unwrap();
    assert_eq!(p.len(), 49);
    assert_eq!(s.values(), &signs.values()[1..]);
    assert_eq!(p.prices(), &prices.prices()[..49]);
}

// ============================================================================
// Combination
// ============================================================================

#[test]
fn test_weeks_weighted_by_observations() {
    let weeks = [
        ResponseAccumulator::from_parts(vec![6.0], vec![3]).unwrap(),
        ResponseAccumulator::from_parts(vec![4.0], vec![1]).unwrap(),
    ];
    let curve = combine_partitions(1, &weeks).unwrap();
    assert_eq!(curve.values(), &[2.5]);

    // averaging the divided curves would give 3.0
    let naive = (weeks[0].normalize().values()[0] + weeks[1].normalize().values()[0]) / 2.0;
    assert_eq!(naive, 3.0);
}

#[test]
fn test_instruments_unweighted() {
    let curves = [
        ResponseCurve::new(vec![1.0]),
        ResponseCurve::new(vec![2.0]),
        ResponseCurve::new(vec![3.0]),
    ];
    assert_eq!(combine_instruments(&curves).unwrap().values(), &[2.0]);
}

#[test]
fn test_year_equals_concatenated_sums() {
    let tau_max = 10;
    let mut weeks = Vec::new();
    let mut total_num = vec![0.0; tau_max];
    let mut total_n = vec![0u64; tau_max];

    for seed in 1..=6u64 {
        let prices = PriceSeries::from_prices(random_walk(200 + seed as usize * 10, seed, 1.3)).unwrap();
        let signs = derive_trade_signs(&prices).unwrap();
        let acc = accumulate_response(&prices, &signs, tau_max).unwrap();
        for k in 0..tau_max {
            total_num[k] += acc.numerators()[k];
            total_n[k] += acc.counts()[k];
        }
        weeks.push(acc);
    }

    let curve = combine_partitions(tau_max, &weeks).unwrap();
    for k in 0..tau_max {
        let expected = total_num[k] / total_n[k] as f64;
        assert!((curve.values()[k] - expected).abs() < 1e-15);
    }
}
