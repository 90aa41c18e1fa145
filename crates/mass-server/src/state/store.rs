//! Application state: route source, hotspot catalogue, route cache and bridge.

use std::sync::Arc;

use anyhow::{Context, Result};
use mass_core::{
    analyze, BoundingBox, CatalogueMetadata, HotspotCatalogue, HotspotZone, JsonFileCatalogue,
    RouteAnalysis, RouteDocument,
};

use crate::bridge::McsseBridge;
use crate::cache::RouteCache;
use crate::config::Config;
use crate::sources::{create_route_source, RouteSource};

pub type SharedCatalogue = Arc<dyn HotspotCatalogue + Send + Sync>;

pub struct AppState {
    config: Config,
    source: Arc<dyn RouteSource>,
    catalogue: SharedCatalogue,
    cache: RouteCache,
    bridge: McsseBridge,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let source = create_route_source(&config);
        let catalogue: SharedCatalogue = Arc::new(JsonFileCatalogue::new(config.hotspot_file.clone()));
        Self::with_parts(config, source, catalogue)
    }

    /// Assemble state around explicit collaborators.
    pub fn with_parts(config: Config, source: Arc<dyn RouteSource>, catalogue: SharedCatalogue) -> Self {
        let bridge = McsseBridge::new(
            config.mcsse_api_url.clone(),
            config.mcsse_api_key.clone(),
            config.mcsse_dry_run,
        );
        Self {
            config,
            source,
            catalogue,
            cache: RouteCache::new(),
            bridge,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> &RouteCache {
        &self.cache
    }

    pub fn bridge(&self) -> &McsseBridge {
        &self.bridge
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Fetch from the source and cache it; otherwise fall back to the last good route.
    pub async fn current_route(&self) -> Option<RouteDocument> {
        if let Some(document) = self.source.fetch().await {
            self.cache.store(document.clone(), self.source.name());
            return Some(document);
        }
        let cached = self.cache.latest();
        if cached.is_some() {
            tracing::warn!("Route source unavailable, serving cached route");
        }
        cached
    }

    /// Refresh the cache from the source. Returns false when the source had nothing.
    pub async fn refresh_route(&self) -> bool {
        match self.source.fetch().await {
            Some(document) => {
                self.cache.store(document, self.source.name());
                true
            }
            None => false,
        }
    }

    pub fn store_upload(&self, document: RouteDocument, filename: &str) {
        self.cache.store(document, format!("upload:{filename}"));
    }

    pub async fn hotspot_zones(&self, bbox: Option<BoundingBox>) -> Result<Vec<HotspotZone>> {
        let catalogue = Arc::clone(&self.catalogue);
        let zones = tokio::task::spawn_blocking(move || catalogue.list_zones(bbox.as_ref()))
            .await
            .context("hotspot catalogue task failed")??;
        Ok(zones)
    }

    pub async fn hotspot_metadata(&self) -> Result<CatalogueMetadata> {
        let catalogue = Arc::clone(&self.catalogue);
        let metadata = tokio::task::spawn_blocking(move || catalogue.metadata())
            .await
            .context("hotspot catalogue task failed")??;
        Ok(metadata)
    }

    /// Run the analysis pipeline over a route against the full catalogue.
    pub async fn analyze(&self, route: &RouteDocument) -> Result<RouteAnalysis> {
        let zones = self.hotspot_zones(None).await?;
        Ok(analyze(route, &zones, &self.config.advisory_config()))
    }
}
