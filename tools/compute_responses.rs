//! Batch Response Computation Tool
//!
//! Configuration-driven tool that computes year-level response curves for
//! every configured instrument and period, classifies instruments by average
//! spread, and writes group-averaged curves.
//!
//! # Output Layout
//!
//! ```text
//! <output_dir>/<scale>/<variant>/<period>/instruments/<instrument>.npy   year curve per instrument
//! <output_dir>/<scale>/<variant>/<period>/groups/<group>.npy             group-averaged curve
//! <output_dir>/<scale>/<variant>/<period>/*/*.json                       curve metadata
//! <output_dir>/<scale>/<variant>/spreads_<period>.json                   spread table
//! <output_dir>/<scale>/<variant>/config.toml                             configuration used
//! ```
//!
//! `<variant>` encodes tau_max, bin width and alignment (e.g.
//! `tau1000_previous_midpoint`), so runs with different response parameters
//! never overwrite each other. Instrument curves found in the store are
//! reused; group curves are recomputed on every run.
//!
//! # Usage
//!
//! ```bash
//! # Run from TOML config
//! cargo run --release --bin compute_responses -- --config configs/fx_2019.toml
//!
//! # Generate sample config
//! cargo run --release --bin compute_responses -- --generate-config fx_2019.toml
//! ```
//!
//! Set `RUST_LOG=info` (or `debug`) for progress logging.

use fx_response::batch::ConsoleProgress;
use fx_response::config::{AnalysisConfig, DataConfig, ExperimentMetadata};
use fx_response::source::HistDataSource;
use fx_response::store::NpyCurveStore;
use fx_response::ResponsePipeline;
use std::fs;
use std::sync::Arc;
use std::time::Instant;

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage(&args[0]);
        std::process::exit(1);
    }

    match args[1].as_str() {
        "--config" => {
            if args.len() < 3 {
                eprintln!("Error: --config requires a path argument");
                std::process::exit(1);
            }
            let verbose = args.iter().any(|a| a == "--verbose");
            if let Err(e) = run_from_config(&args[2], verbose) {
                eprintln!("❌ {e}");
                std::process::exit(1);
            }
        }
        "--generate-config" => {
            if args.len() < 3 {
                eprintln!("Error: --generate-config requires a path argument");
                std::process::exit(1);
            }
            generate_sample_config(&args[2]);
        }
        "--help" | "-h" => {
            print_usage(&args[0]);
        }
        _ => {
            eprintln!("Unknown argument: {}", args[1]);
            print_usage(&args[0]);
            std::process::exit(1);
        }
    }
}

fn print_usage(program: &str) {
    eprintln!(
        r#"
FX Price Response Tool

Usage:
    {program} --config <path.toml> [--verbose]   Compute responses from config file
    {program} --generate-config <path>           Generate sample config file
    {program} --help                             Show this help

Examples:
    {program} --config configs/fx_2019.toml
    {program} --generate-config configs/fx_2019.toml
"#
    );
}

fn generate_sample_config(path: &str) {
    let weeks: Vec<String> = (1..=53).map(|w| format!("w{w:02}")).collect();

    let config = AnalysisConfig::default()
        .with_data(
            DataConfig::new("/path/to/histdata", "/path/to/curves")
                .with_instruments(["eur_usd", "gbp_usd", "usd_jpy", "usd_mxn", "usd_try"])
                .with_periods(["2019"])
                .with_partitions(weeks),
        )
        .with_metadata(ExperimentMetadata {
            description: Some("Trade-time self-response, 2019".to_string()),
            tags: Some(vec!["fx".to_string(), "trade".to_string()]),
            ..ExperimentMetadata::new("fx_response_2019")
        });

    match config.save_toml(path) {
        Ok(()) => {
            println!("✅ Generated sample config: {path}");
            println!("\nEdit the following fields before running:");
            println!("  - data.quotes_dir: <instrument>/<period>/<week>.csv tree");
            println!("  - data.output_dir: where curves are written");
            println!("  - response.time_scale: \"trade\" or \"physical\"");
        }
        Err(e) => {
            eprintln!("Error generating config: {e}");
            std::process::exit(1);
        }
    }
}

fn run_from_config(config_path: &str, verbose: bool) -> fx_response::Result<()> {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                   FX Price Response Tool                     ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    let config = AnalysisConfig::load_toml(config_path)?;
    println!("✅ Loaded configuration: {config_path}");

    let data = config
        .data
        .clone()
        .ok_or_else(|| fx_response::ResponseError::config("config has no [data] section"))?;

    print_config_summary(&config, &data);

    let run_dir = data
        .output_dir
        .join(config.response.time_scale.as_str())
        .join(config.response.variant());
    fs::create_dir_all(&run_dir)?;
    config.save_toml(run_dir.join("config.toml"))?;

    let source = HistDataSource::new(&data.quotes_dir);
    let store = Arc::new(NpyCurveStore::new(&data.output_dir));

    let mut pipeline = ResponsePipeline::new(source, config.clone())?.with_store(store);
    if verbose {
        pipeline = pipeline.with_progress_callback(Box::new(ConsoleProgress::new().verbose()));
    }

    let start = Instant::now();

    for period in &data.periods {
        println!("\n── Period {period} ─────────────────────────────────────────────");

        let table = pipeline.spread_statistics(&data.instruments, period)?;
        let table_path = run_dir.join(format!("spreads_{period}.json"));
        table.save_json(&table_path)?;
        for entry in table.entries() {
            println!(
                "  {:<10} avg spread {:>10.4}  avg quotes/week {:>10.0}",
                entry.instrument, entry.avg_spread, entry.avg_quotes
            );
        }

        let groups = pipeline.group_responses_with(&table, &data.instruments, period)?;
        for group in groups.values() {
            println!(
                "  {:<8} {} instruments, R(1) = {:.3e}",
                group.label,
                group.members.len(),
                group.curve.at_lag(1).unwrap_or(f64::NAN)
            );
        }
    }

    println!("\n✅ Done in {:?}", start.elapsed());
    println!("   Curves written to {}", run_dir.display());
    Ok(())
}

fn print_config_summary(config: &AnalysisConfig, data: &DataConfig) {
    println!();
    println!("Configuration:");
    println!("  Time scale:   {}", config.response.time_scale.as_str());
    println!("  tau_max:      {}", config.response.tau_max);
    println!("  Alignment:    {:?}", config.response.alignment);
    println!("  Spread:       {:?}", config.spread.measure);
    println!("  Instruments:  {}", data.instruments.join(", "));
    println!("  Periods:      {}", data.periods.join(", "));
    match &data.partitions {
        Some(p) => println!("  Partitions:   {} configured", p.len()),
        None => println!("  Partitions:   from source listing"),
    }
    println!("  Quotes:       {}", data.quotes_dir.display());
    println!("  Output:       {}", data.output_dir.display());
    println!();
}
