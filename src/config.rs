use crate::db::listings::listings_table_name;
use crate::errors::PipelineError;
use crate::geocode::DEFAULT_OPENCAGE_URL;
use clap::Parser;
use std::env;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Parser)]
#[command(name = "listings_geoprocessor")]
#[command(about = "Geocode, clean and store scraped real-estate listings")]
pub struct Cli {
    /// Area the listings were scraped for; also names the table
    #[arg(long)]
    pub city: String,

    /// JSON array of raw listing rows
    #[arg(long)]
    pub input: PathBuf,

    /// SQLite database file
    #[arg(long, default_value = "listings.sqlite3")]
    pub db: PathBuf,

    /// Minimum gap between geocoding calls
    #[arg(long, default_value_t = 1000)]
    pub min_interval_ms: u64,

    #[arg(long, default_value_t = 30)]
    pub geocode_timeout_secs: u64,

    /// Stop writing when the database is unreachable instead of skipping rows
    #[arg(long)]
    pub abort_on_sink_unavailable: bool,

    /// Write into memory only; nothing is persisted
    #[arg(long)]
    pub dry_run: bool,

    #[arg(short, long)]
    pub verbose: bool,
}

/// Everything one run needs, CLI flags plus secrets from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub city: String,
    pub input: PathBuf,
    pub db_path: PathBuf,
    pub min_interval: Duration,
    pub geocode_timeout: Duration,
    pub abort_on_sink_unavailable: bool,
    pub dry_run: bool,
    pub geocoder_url: String,
    pub api_key: String,
}

impl Config {
    /// Reads `OPENCAGE_API_KEY` (required) and `OPENCAGE_URL` (optional),
    /// loading `.env` first if present.
    pub fn from_env(cli: Cli) -> Result<Self, PipelineError> {
        if let Some(e) = dotenv_problem(dotenvy::dotenv()) {
            warn!(error = %e, "could not load .env, using process environment only");
        }

        Self::from_parts(
            cli,
            env::var("OPENCAGE_API_KEY").ok(),
            env::var("OPENCAGE_URL").ok(),
        )
    }

    pub fn from_parts(
        cli: Cli,
        api_key: Option<String>,
        geocoder_url: Option<String>,
    ) -> Result<Self, PipelineError> {
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| PipelineError::Config("OPENCAGE_API_KEY must be set".into()))?;

        listings_table_name(&cli.city).map_err(|e| PipelineError::Config(e.to_string()))?;

        Ok(Self {
            city: cli.city,
            input: cli.input,
            db_path: cli.db,
            min_interval: Duration::from_millis(cli.min_interval_ms),
            geocode_timeout: Duration::from_secs(cli.geocode_timeout_secs),
            abort_on_sink_unavailable: cli.abort_on_sink_unavailable,
            dry_run: cli.dry_run,
            geocoder_url: geocoder_url.unwrap_or_else(|| DEFAULT_OPENCAGE_URL.to_string()),
            api_key,
        })
    }
}

/// A missing `.env` is normal. Anything else (unreadable file, bad line)
/// is worth reporting.
fn dotenv_problem<T>(result: dotenvy::Result<T>) -> Option<dotenvy::Error> {
    match result {
        Ok(_) => None,
        Err(dotenvy::Error::Io(e)) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => Some(e),
    }
}
