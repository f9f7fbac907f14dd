use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use floodline_common::{CandidateReport, Config, IncomingReport};
use floodline_dedup::{DuplicateDetector, DuplicateResponse, MemoryCandidateWindow};
use floodline_geo::{CoordinateExtractor, CoordinateShape, DatumNormalizer};

#[derive(Parser)]
#[command(name = "floodline", about = "Flood report location extraction and duplicate checks")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract one coordinate from a map link or DMS string
    Extract {
        input: String,
        /// Print {"longitude", "latitude"} instead of [lng, lat]
        #[arg(long)]
        named: bool,
    },
    /// Check a report against stored candidates
    Classify {
        /// JSON file holding one report
        #[arg(long)]
        report: PathBuf,
        /// JSON file holding an array of stored reports
        #[arg(long)]
        candidates: PathBuf,
        /// Reference time (RFC 3339); defaults to now
        #[arg(long)]
        now: Option<DateTime<Utc>>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("floodline=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    config.log_summary();

    match cli.command {
        Command::Extract { input, named } => {
            let extractor = CoordinateExtractor::new(DatumNormalizer::new(config.datum));
            let shape = if named {
                CoordinateShape::Named
            } else {
                CoordinateShape::Pair
            };
            let result = extractor.extract_shaped(&input, shape);
            info!(found = result.is_found(), "Extraction finished");
            println!("{}", serde_json::to_string(&result)?);
        }
        Command::Classify {
            report,
            candidates,
            now,
        } => {
            let report: IncomingReport = read_json(&report)?;
            let candidates = parse_candidates(read_json(&candidates)?);
            info!(candidates = candidates.len(), "Loaded stored reports");

            let window = Arc::new(MemoryCandidateWindow::new(candidates));
            let detector = DuplicateDetector::from_config(&config.dedup, window)?;
            let verdict = detector.check(&report, now.unwrap_or_else(Utc::now)).await;

            let response = DuplicateResponse::from_verdict(&verdict);
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}

/// Decode stored reports one by one; an entry that does not decode is
/// logged and skipped like any other malformed candidate.
fn parse_candidates(entries: Vec<Value>) -> Vec<CandidateReport> {
    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value(entry) {
            Ok(candidate) => Some(candidate),
            Err(e) => {
                warn!(index, error = %e, "Skipping malformed candidate");
                None
            }
        })
        .collect()
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {}", path.display()))
}
