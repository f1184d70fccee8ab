//! Configuration file support.
//!
//! Loads settings from `~/.config/callsign-availability/config.toml` on Linux
//! (or platform-appropriate location on other OSes). Command line flags
//! override anything set here.

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::report::ReportOptions;

/// Deserialize a date given either as a TOML date (`2022-04-01`) or a
/// string (`"2022-04-01"`).
fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match toml::Value::deserialize(deserializer)? {
        toml::Value::String(s) => parse_date_arg(&s).map_err(serde::de::Error::custom),
        toml::Value::Datetime(dt) => {
            let date = dt
                .date
                .ok_or_else(|| serde::de::Error::custom("datetime has no date part"))?;
            NaiveDate::from_ymd_opt(date.year as i32, date.month as u32, date.day as u32)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {}", dt)))
        }
        other => Err(serde::de::Error::custom(format!(
            "expected a date, found {}",
            other.type_str()
        ))),
    }
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| format!("invalid date {:?} (expected YYYY-MM-DD): {}", s, e))
}

/// Application configuration loaded from TOML file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the ULS `HD.dat` file.
    pub source: PathBuf,

    /// Path of the parsed-data cache.
    pub cache_path: PathBuf,

    /// Reuse the parsed-data cache when it is up to date.
    pub use_cache: bool,

    /// Earliest availability date to report.
    #[serde(deserialize_with = "deserialize_date")]
    pub min_date: NaiveDate,

    /// Exact call sign length to report.
    pub call_sign_length: usize,

    /// Maximum number of availability dates to report.
    pub max_groups: usize,

    /// Log progress every N lines while parsing (0 = disabled).
    pub progress_interval: u64,
}

impl Default for Config {
    fn default() -> Self {
        let report = ReportOptions::default();
        Self {
            source: PathBuf::from("HD.dat"),
            cache_path: PathBuf::from("call_signs.json"),
            use_cache: true,
            min_date: report.min_date,
            call_sign_length: report.call_sign_length,
            max_groups: report.max_groups,
            progress_interval: 0,
        }
    }
}

impl Config {
    /// Load configuration from the default config file location.
    ///
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but is malformed.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Config::default()),
        }
    }

    /// Load configuration from a specific file, which must exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Invalid TOML in config file: {}", path.display()))
    }

    /// Returns the path to the config file.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("callsign-availability/config.toml"))
    }

    /// Validate all configuration settings.
    pub fn validate(&self) -> Result<()> {
        if self.call_sign_length == 0 {
            bail!("call_sign_length must be at least 1");
        }
        if self.max_groups == 0 {
            bail!("max_groups must be at least 1");
        }
        Ok(())
    }

    /// Report filters from this configuration.
    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            min_date: self.min_date,
            call_sign_length: self.call_sign_length,
            max_groups: self.max_groups,
        }
    }
}
