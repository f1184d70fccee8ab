//! Callsign Availability CLI - list lapsed call signs from the FCC ULS database.

use anyhow::{Context, Result};
use callsign_availability::{
    CacheProvider, CallSignAvailability, Config, JsonFileCache, NoCache, Refresh, build_report,
    config::parse_date_arg, load_or_parse, parse_file,
};
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Callsign Availability - find call signs that can be requested again
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the ULS HD.dat file
    #[arg(short, long, env = "ULS_HD_PATH")]
    source: Option<PathBuf>,

    /// Path of the parsed-data cache
    #[arg(long)]
    cache: Option<PathBuf>,

    /// Always parse the source file and don't write a cache
    #[arg(long, conflicts_with = "refresh")]
    no_cache: bool,

    /// Reparse the source file and rewrite the cache
    #[arg(long)]
    refresh: bool,

    /// Earliest availability date to list (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date_arg)]
    min_date: Option<NaiveDate>,

    /// Exact call sign length to list
    #[arg(short, long)]
    length: Option<usize>,

    /// Maximum number of availability dates to list
    #[arg(short = 'n', long)]
    max_groups: Option<usize>,

    /// Log progress every N lines while parsing (0 = disabled)
    #[arg(short, long)]
    progress: Option<u64>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Config file (defaults to the platform config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    /// Apply command line overrides on top of the loaded config.
    fn apply(&self, config: &mut Config) {
        if let Some(ref source) = self.source {
            config.source = source.clone();
        }
        if let Some(ref cache) = self.cache {
            config.cache_path = cache.clone();
        }
        if self.no_cache {
            config.use_cache = false;
        }
        if let Some(min_date) = self.min_date {
            config.min_date = min_date;
        }
        if let Some(length) = self.length {
            config.call_sign_length = length;
        }
        if let Some(max_groups) = self.max_groups {
            config.max_groups = max_groups;
        }
        if let Some(progress) = self.progress {
            config.progress_interval = progress;
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = match args.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    args.apply(&mut config);
    config.validate()?;
    debug!("Config: {:?}", config);

    let cache: Box<dyn CacheProvider> = match (config.use_cache, args.refresh) {
        (false, _) => Box::new(NoCache),
        (true, false) => Box::new(JsonFileCache::new(&config.cache_path, &config.source)),
        (true, true) => Box::new(Refresh(JsonFileCache::new(
            &config.cache_path,
            &config.source,
        ))),
    };

    let availability = load_or_parse(cache.as_ref(), || parse_source(&config))?;

    let options = config.report_options();
    let report = build_report(&availability, &options).context("Failed to rank call signs")?;
    info!(
        "{} call signs across {} dates",
        report.call_sign_count(),
        report.groups.len()
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report);
    }

    Ok(())
}

/// Parse the configured source file.
fn parse_source(config: &Config) -> Result<CallSignAvailability> {
    let outcome = parse_file(&config.source, config.progress_interval)
        .with_context(|| format!("Failed to parse {}", config.source.display()))?;
    info!("{}", outcome.stats.summary(outcome.availability.len()));
    Ok(outcome.availability)
}
