//! Event demand engine — one-shot CLI.
//!
//! Runs the full pipeline over JSON fixture sources and prints the result:
//!
//! ```text
//! event-demand-engine <start YYYY-MM-DD> <end YYYY-MM-DD> <source.json>...
//! ```
//!
//! Each fixture file is one source, named after its file stem. Host rates
//! come from `BASE_RATE` / `MIN_RATE` / `MAX_RATE` when set, else from the
//! engine config defaults.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use event_demand_engine::ingest::providers::FixtureAdapter;
use event_demand_engine::{DateRange, EngineConfig, Pipeline, RateOverrides};

const USAGE: &str = "usage: event-demand-engine <start> <end> <source.json>...";

/// JSON logs when `LOG_FORMAT=json`, compact otherwise. Logs go to stderr so
/// stdout stays machine-readable.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("event_demand_engine=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

fn parse_date(arg: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(arg, "%Y-%m-%d").with_context(|| format!("invalid date {arg:?}"))
}

fn number_from_env(key: &str) -> Result<Option<f64>> {
    match std::env::var(key) {
        Ok(v) => v
            .trim()
            .parse::<f64>()
            .map(Some)
            .with_context(|| format!("{key} is not a number")),
        Err(_) => Ok(None),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 3 {
        bail!(USAGE);
    }
    let range = DateRange::new(parse_date(&args[0])?, parse_date(&args[1])?);

    let config = EngineConfig::load_default().context("loading engine config")?;
    let mut pipeline = Pipeline::new(config);
    for path in args[2..].iter().map(PathBuf::from) {
        let adapter = FixtureAdapter::from_path(&path)?;
        tracing::info!(events = adapter.len(), path = %path.display(), "fixture loaded");
        pipeline = pipeline.with_adapter(Arc::new(adapter));
    }
    if let Some(miles) = number_from_env("PROPERTY_DISTANCE_MILES")? {
        pipeline = pipeline.with_property_distance(miles);
    }

    let overrides = RateOverrides {
        base_rate: number_from_env("BASE_RATE")?,
        min_rate: number_from_env("MIN_RATE")?,
        max_rate: number_from_env("MAX_RATE")?,
    };
    let output = pipeline
        .run(range, &overrides)
        .await
        .context("host rate settings rejected")?;

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
