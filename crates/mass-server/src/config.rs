//! Server configuration from environment.

use std::env;
use std::path::PathBuf;

use chrono::NaiveDate;
use mass_core::AdvisoryConfig;

/// Where the current route comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    /// Local RTZ file.
    File,
    /// Remote fleet-data provider, polled in the background.
    Fleet,
}

impl DataSource {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "fleet" | "furuno" => DataSource::Fleet,
            _ => DataSource::File,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DataSource::File => "file",
            DataSource::Fleet => "fleet",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub data_source: DataSource,
    pub rtz_file: PathBuf,
    pub hotspot_file: PathBuf,
    pub fleet_api_url: String,
    pub fleet_api_key: String,
    pub fleet_poll_interval_secs: u64,
    pub mcsse_api_url: String,
    pub mcsse_api_key: String,
    pub mcsse_dry_run: bool,
    pub advisory_reference_date: NaiveDate,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; missing or unparseable values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let advisory_defaults = AdvisoryConfig::default();

        Self {
            host: text("HOST", "0.0.0.0"),
            port: lookup("PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(8000),
            data_source: DataSource::parse(&text("DATA_SOURCE", "file")),
            rtz_file: PathBuf::from(text("RTZ_FILE", "sample_data/route.rtz")),
            hotspot_file: PathBuf::from(text("HOTSPOT_FILE", "data/hotspots.json")),
            fleet_api_url: text("FLEET_API_URL", ""),
            fleet_api_key: text("FLEET_API_KEY", ""),
            fleet_poll_interval_secs: lookup("FLEET_POLL_INTERVAL")
                .and_then(|s| s.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(60),
            mcsse_api_url: text("MCSSE_API_URL", ""),
            mcsse_api_key: text("MCSSE_API_KEY", ""),
            mcsse_dry_run: !lookup("MCSSE_DRY_RUN")
                .is_some_and(|value| value.trim().eq_ignore_ascii_case("false")),
            advisory_reference_date: lookup("ADVISORY_REFERENCE_DATE")
                .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
                .unwrap_or(advisory_defaults.reference_date),
            log_format: match lookup("LOG_FORMAT") {
                Some(value) if value.eq_ignore_ascii_case("json") => LogFormat::Json,
                _ => LogFormat::Text,
            },
        }
    }

    pub fn advisory_config(&self) -> AdvisoryConfig {
        AdvisoryConfig {
            reference_date: self.advisory_reference_date,
            ..AdvisoryConfig::default()
        }
    }

    pub fn fleet_api_configured(&self) -> bool {
        !self.fleet_api_url.trim().is_empty()
    }
}
