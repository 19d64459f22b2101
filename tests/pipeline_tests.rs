//! End-to-end tests for the response pipeline.
//!
//! These tests verify:
//! 1. A year with missing weeks still produces a finite curve
//! 2. Recoverable partition errors are skipped, fatal ones abort
//! 3. Physical-time runs produce curves on the bin grid
//! 4. Spread classification feeds group averages
//! 5. Parallel and single-threaded runs agree

use fx_response::prelude::*;
use fx_response::spread::SpreadMeasure;
use std::sync::Arc;

// ============================================================================
// Test Fixtures
// ============================================================================

fn random_walk(n: usize, seed: u64, start: f64, step: f64) -> Vec<f64> {
    let mut state = seed.max(1);
    let mut price = start;
    (0..n)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            price += ((state % 5) as f64 - 2.0) * step;
            price
        })
        .collect()
}

fn weeks(n: usize) -> Vec<String> {
    (1..=n).map(|w| format!("w{w:02}")).collect()
}

/// Quotes around a random-walk midpoint with a fixed relative spread.
fn quotes(n: usize, seed: u64, mid: f64, spread_bps: f64) -> QuoteSeries {
    let ticks = random_walk(n, seed, mid, mid * 1e-5)
        .into_iter()
        .enumerate()
        .map(|(i, m)| {
            let half = m * spread_bps / 10_000.0 / 2.0;
            // 300ms between quotes
            QuoteTick::new(i as u64 * 300_000_000, m - half, m + half)
        })
        .collect();
    QuoteSeries::new(ticks).unwrap()
}

fn config_with_weeks(instruments: &[&str], n_weeks: usize, tau_max: usize) -> AnalysisConfig {
    AnalysisConfig::default()
        .with_tau_max(tau_max)
        .with_threads(4)
        .with_data(
            DataConfig::new("unused", "unused")
                .with_instruments(instruments.iter().copied())
                .with_periods(["2019"])
                .with_partitions(weeks(n_weeks)),
        )
}

// ============================================================================
// Instrument Year
// ============================================================================

#[test]
fn test_year_with_missing_weeks() {
    let missing = ["w05", "w10", "w20", "w30", "w40"];
    let mut source = MemorySource::new();
    for (i, week) in weeks(53).iter().enumerate() {
        if missing.contains(&week.as_str()) {
            continue;
        }
        let prices = PriceSeries::from_prices(random_walk(300, i as u64 + 1, 1.1, 1e-5)).unwrap();
        source.insert_prices(PartitionKey::new("eur_usd", "2019", week.as_str()), prices);
    }

    let pipeline = ResponsePipeline::new(source, config_with_weeks(&["eur_usd"], 53, 20)).unwrap();
    let year = pipeline.instrument_year_response("eur_usd", "2019").unwrap();

    assert_eq!(year.partitions_used.len(), 48);
    assert_eq!(year.partitions_missing, missing.to_vec());
    assert_eq!(year.curve.tau_max(), 20);
    assert_eq!(year.curve.finite_count(), 20);

    // the year curve is the sum-then-divide of the used weeks
    let accs: Vec<ResponseAccumulator> = year
        .partitions_used
        .iter()
        .map(|w| {
            pipeline
                .partition_accumulator(&PartitionKey::new("eur_usd", "2019", w.as_str()))
                .unwrap()
        })
        .collect();
    let expected = combine_partitions(20, &accs).unwrap();
    for k in 0..20 {
        assert!((year.curve.values()[k] - expected.values()[k]).abs() < 1e-15);
    }
    assert_eq!(year.counts[0], 48 * 298);
}

#[test]
fn test_all_weeks_missing_gives_nan_curve() {
    let pipeline =
        ResponsePipeline::new(MemorySource::new(), config_with_weeks(&["eur_usd"], 4, 5)).unwrap();
    let year = pipeline.instrument_year_response("eur_usd", "2019").unwrap();

    assert!(year.partitions_used.is_empty());
    assert_eq!(year.partitions_missing.len(), 4);
    assert!(year.curve.values().iter().all(|v| v.is_nan()));
    assert!(year.counts.iter().all(|&n| n == 0));
}

#[test]
fn test_short_week_is_skipped() {
    let mut source = MemorySource::new();
    source.insert_prices(
        PartitionKey::new("eur_usd", "2019", "w01"),
        PriceSeries::from_prices(random_walk(100, 1, 1.1, 1e-5)).unwrap(),
    );
    source.insert_prices(
        PartitionKey::new("eur_usd", "2019", "w02"),
        PriceSeries::from_prices(vec![1.1]).unwrap(),
    );

    let config = AnalysisConfig::default().with_tau_max(5);
    let pipeline = ResponsePipeline::new(source, config).unwrap();
    let year = pipeline.instrument_year_response("eur_usd", "2019").unwrap();

    assert_eq!(year.partitions_used, vec!["w01"]);
    assert_eq!(year.partitions_missing, vec!["w02"]);
}

#[test]
fn test_flat_week_aborts_run() {
    let mut source = MemorySource::new();
    source.insert_prices(
        PartitionKey::new("eur_usd", "2019", "w01"),
        PriceSeries::from_prices(vec![1.1; 50]).unwrap(),
    );

    let pipeline = ResponsePipeline::new(source, AnalysisConfig::default().with_tau_max(5)).unwrap();
    assert!(matches!(
        pipeline.instrument_year_response("eur_usd", "2019"),
        Err(ResponseError::InvariantViolation(_))
    ));
}

#[test]
fn test_parallel_and_single_thread_agree() {
    let mut source_a = MemorySource::new();
    let mut source_b = MemorySource::new();
    for (i, week) in weeks(12).iter().enumerate() {
        let prices = PriceSeries::from_prices(random_walk(400, i as u64 + 100, 1.3, 1e-5)).unwrap();
        let key = PartitionKey::new("gbp_usd", "2019", week.as_str());
        source_a.insert_prices(key.clone(), prices.clone());
        source_b.insert_prices(key, prices);
    }

    let parallel = ResponsePipeline::new(source_a, AnalysisConfig::default().with_tau_max(30).with_threads(4))
        .unwrap()
        .instrument_year_response("gbp_usd", "2019")
        .unwrap();
    let single = ResponsePipeline::new(source_b, AnalysisConfig::default().with_tau_max(30).with_threads(1))
        .unwrap()
        .instrument_year_response("gbp_usd", "2019")
        .unwrap();

    assert_eq!(parallel.curve, single.curve);
    assert_eq!(parallel.counts, single.counts);
}

// ============================================================================
// Physical Time
// ============================================================================

#[test]
fn test_physical_time_response() {
    let mut source = MemorySource::new();
    // 3000 quotes 300ms apart: 900 one-second bins
    source.insert_quotes(
        PartitionKey::new("eur_usd", "2019", "w01"),
        quotes(3000, 17, 1.1, 0.2),
    );

    let config = AnalysisConfig::default()
        .with_tau_max(60)
        .with_time_scale(TimeScale::Physical);
    let pipeline = ResponsePipeline::new(source, config).unwrap();

    let key = PartitionKey::new("eur_usd", "2019", "w01");
    let (prices, signs) = pipeline.partition_series(&key).unwrap();
    assert_eq!(prices.len(), 899);
    assert_eq!(signs.kind(), SignKind::Physical);

    let (curve, counts) = pipeline.partition_response(&key).unwrap();
    assert_eq!(curve.tau_max(), 60);
    assert!(counts[0] > 0 && counts[0] <= 898);
    assert!(counts.windows(2).all(|w| w[1] <= w[0]));
}

// ============================================================================
// Spread Groups
// ============================================================================

fn multi_instrument_source() -> MemorySource {
    let mut source = MemorySource::new();
    let instruments = [
        ("eur_usd", 1.1, 0.2),
        ("gbp_usd", 1.3, 0.4),
        ("usd_mxn", 19.0, 3.0),
        ("usd_try", 5.8, 20.0),
    ];
    for (n, (name, mid, bps)) in instruments.iter().enumerate() {
        for (w, week) in weeks(3).iter().enumerate() {
            source.insert_quotes(
                PartitionKey::new(*name, "2019", week.as_str()),
                quotes(500, (n * 10 + w + 1) as u64, *mid, *bps),
            );
        }
    }
    source
}

#[test]
fn test_spread_statistics() {
    let pipeline = ResponsePipeline::new(multi_instrument_source(), AnalysisConfig::default()).unwrap();
    let table = pipeline
        .spread_statistics(&["usd_try", "eur_usd", "usd_mxn", "gbp_usd", "nzd_usd"], "2019")
        .unwrap();

    assert_eq!(table.measure, SpreadMeasure::BasisPoints);
    let order: Vec<&str> = table.entries().iter().map(|e| e.instrument.as_str()).collect();
    assert_eq!(order, vec!["eur_usd", "gbp_usd", "usd_mxn", "usd_try"]);

    let eur = table.get("eur_usd").unwrap();
    assert!((eur.avg_spread - 0.2).abs() < 1e-6);
    assert!((eur.avg_quotes - 500.0).abs() < 1e-12);
}

#[test]
fn test_group_responses() {
    let store = Arc::new(MemoryCurveStore::new());
    let config = AnalysisConfig::default().with_tau_max(10);
    let pipeline = ResponsePipeline::new(multi_instrument_source(), config)
        .unwrap()
        .with_store(store.clone());

    let instruments = ["eur_usd", "gbp_usd", "usd_mxn", "usd_try"];
    let groups = pipeline.group_responses(&instruments, "2019").unwrap();

    assert_eq!(groups["group_1"].members, vec!["eur_usd", "gbp_usd"]);
    assert_eq!(groups["group_2"].members, vec!["usd_mxn"]);
    assert_eq!(groups["group_3"].members, vec!["usd_try"]);

    // group_1 is the plain mean of its members' year curves
    let response = &pipeline.config().response;
    let eur = store.load_curve(&CurveKey::instrument(response, "eur_usd", "2019")).unwrap();
    let gbp = store.load_curve(&CurveKey::instrument(response, "gbp_usd", "2019")).unwrap();
    let expected = combine_instruments(&[eur, gbp]).unwrap();
    assert_eq!(groups["group_1"].curve, expected);

    assert!(store.contains(&CurveKey::group(response, "group_3", "2019")));
    // 4 instruments + 3 groups
    assert_eq!(store.len(), 7);
}

#[test]
fn test_group_curve_follows_membership() {
    let store = Arc::new(MemoryCurveStore::new());
    let pipeline = ResponsePipeline::new(multi_instrument_source(), AnalysisConfig::default().with_tau_max(10))
        .unwrap()
        .with_store(store.clone());
    let table = pipeline
        .spread_statistics(&["eur_usd", "gbp_usd"], "2019")
        .unwrap();

    let first = pipeline.group_responses_with(&table, &["eur_usd"], "2019").unwrap();
    let eur = pipeline.instrument_curve("eur_usd", "2019").unwrap();
    assert_eq!(first["group_1"].members, vec!["eur_usd"]);
    assert_eq!(first["group_1"].curve, eur);

    // same store, wider instrument list: the stored one-member mean must not be reused
    let second = pipeline
        .group_responses_with(&table, &["eur_usd", "gbp_usd"], "2019")
        .unwrap();
    let gbp = pipeline.instrument_curve("gbp_usd", "2019").unwrap();
    let expected = combine_instruments(&[eur.clone(), gbp]).unwrap();

    assert_eq!(second["group_1"].members, vec!["eur_usd", "gbp_usd"]);
    assert_eq!(second["group_1"].curve, expected);
    assert_ne!(second["group_1"].curve, eur);

    let stored = store
        .load_curve(&CurveKey::group(&pipeline.config().response, "group_1", "2019"))
        .unwrap();
    assert_eq!(stored, expected);
}
