//! Example: validate a GTFS feed directory with FeedCheck.
//!
//! Usage:
//!   cargo run --example validate_feed -- <feed_dir> [config.json]
//!
//! Set `RUST_LOG=feedcheck=debug` to see per-table and per-rule logs.

use std::env;
use std::fs;
use std::path::Path;

use feedcheck::{FeedCheck, FeedCheckConfig};
use tracing_subscriber::EnvFilter;

fn main() -> feedcheck::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: cargo run --example validate_feed -- <feed_dir> [config.json]");
        std::process::exit(1);
    }

    let dir = Path::new(&args[1]);
    let config = match args.get(2) {
        Some(path) => {
            let json = fs::read_to_string(path).map_err(|source| feedcheck::FeedCheckError::Io {
                path: path.into(),
                source,
            })?;
            FeedCheckConfig::from_json_str(&json)?
        }
        None => FeedCheckConfig::default(),
    };

    let result = FeedCheck::with_config(config).validate_dir(dir)?;

    let separator = "=".repeat(80);
    println!("{}", separator);
    println!("FeedCheck: {}", dir.display());
    println!("{}", separator);

    println!("\n## Files");
    for source in &result.sources {
        println!("  {:<24} {:>8} rows  {}", source.file, source.row_count, source.hash);
    }

    println!("\n## Notices");
    for (code, count) in &result.report.counts {
        println!("  {:<8} {:<52} {:>7}", count.severity.label(), code, count.total);
    }

    let summary = &result.summary;
    println!("\n## Summary");
    println!("  Tables loaded: {}", summary.tables_loaded);
    println!("  Rows: {}", summary.total_rows);
    println!("  Rules run: {}", summary.rules_run);
    if !summary.rules_skipped.is_empty() {
        println!("  Rules skipped: {}", summary.rules_skipped.join(", "));
    }
    if !summary.rules_failed.is_empty() {
        println!("  Rules failed: {}", summary.rules_failed.join(", "));
    }
    println!(
        "  Errors: {}  Warnings: {}  Infos: {}",
        summary.notices_by_severity.error,
        summary.notices_by_severity.warning,
        summary.notices_by_severity.info
    );
    println!("\n{}", summary.recommendation);

    if result.report.has_errors() {
        std::process::exit(2);
    }
    Ok(())
}
