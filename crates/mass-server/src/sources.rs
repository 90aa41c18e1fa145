//! Route sources: where the current route document comes from.
//!
//! Every source reduces to one capability, "give me the current route or tell
//! me it is unavailable". Failures are logged here and surface as `None`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mass_core::{parse_rtz, RouteDocument, RtzError};
use reqwest::Client;
use thiserror::Error;

use crate::config::{Config, DataSource};

const FLEET_TIMEOUT_SECS: u64 = 10;

#[async_trait]
pub trait RouteSource: Send + Sync {
    /// Short label used in logs and cache provenance.
    fn name(&self) -> &str;

    async fn fetch(&self) -> Option<RouteDocument>;
}

/// RTZ file on local disk, re-read on every fetch.
pub struct FileRouteSource {
    path: PathBuf,
}

impl FileRouteSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RouteSource for FileRouteSource {
    fn name(&self) -> &str {
        "file"
    }

    async fn fetch(&self) -> Option<RouteDocument> {
        let xml = match tokio::fs::read_to_string(&self.path).await {
            Ok(xml) => xml,
            Err(err) => {
                tracing::error!("RTZ file {} unreadable: {}", self.path.display(), err);
                return None;
            }
        };
        match parse_rtz(&xml) {
            Ok(document) => {
                tracing::info!(
                    "Loaded route from {} ({} waypoints)",
                    self.path.display(),
                    document.waypoint_count
                );
                Some(document)
            }
            Err(err) => {
                tracing::error!("Failed to parse RTZ file {}: {}", self.path.display(), err);
                None
            }
        }
    }
}

#[derive(Debug, Error)]
enum FleetError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("provider answered HTTP {0}")]
    Status(u16),
    #[error("provider returned an unreadable route: {0}")]
    Parse(#[from] RtzError),
}

/// Remote fleet-data provider serving the vessel's active route as RTZ XML.
pub struct FleetApiSource {
    client: Client,
    api_url: String,
    api_key: String,
}

impl FleetApiSource {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(FLEET_TIMEOUT_SECS))
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_url: api_url.into(),
            api_key: api_key.into(),
        }
    }

    async fn request(&self) -> Result<RouteDocument, FleetError> {
        let mut request = self.client.get(&self.api_url);
        if !self.api_key.trim().is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FleetError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        Ok(parse_rtz(&body)?)
    }
}

#[async_trait]
impl RouteSource for FleetApiSource {
    fn name(&self) -> &str {
        "fleet"
    }

    async fn fetch(&self) -> Option<RouteDocument> {
        if self.api_url.trim().is_empty() {
            tracing::warn!("Fleet API URL not configured; no route available");
            return None;
        }
        match self.request().await {
            Ok(document) => {
                tracing::debug!("Fetched route from fleet API ({} waypoints)", document.waypoint_count);
                Some(document)
            }
            Err(err) => {
                tracing::warn!("Fleet API fetch failed: {}", err);
                None
            }
        }
    }
}

/// Build the source selected by `DATA_SOURCE`.
pub fn create_route_source(config: &Config) -> Arc<dyn RouteSource> {
    match config.data_source {
        DataSource::Fleet => {
            tracing::info!("Using fleet API route source: {}", config.fleet_api_url);
            Arc::new(FleetApiSource::new(
                config.fleet_api_url.clone(),
                config.fleet_api_key.clone(),
            ))
        }
        DataSource::File => {
            tracing::info!("Using file route source: {}", config.rtz_file.display());
            Arc::new(FileRouteSource::new(config.rtz_file.clone()))
        }
    }
}
