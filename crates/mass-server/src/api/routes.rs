//! REST API routes.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::bridge::{BridgeStatus, PushOutcome};
use crate::state::AppState;
use mass_core::{
    parse_rtz, BoundingBox, CatalogueMetadata, HotspotZone, RouteAnalysis, RouteDocument,
};

type ApiError = (StatusCode, Json<Value>);

fn api_error(status: StatusCode, error: &str, details: impl std::fmt::Display) -> ApiError {
    (
        status,
        Json(json!({
            "error": error,
            "details": details.to_string()
        })),
    )
}

fn no_route() -> ApiError {
    api_error(
        StatusCode::SERVICE_UNAVAILABLE,
        "No route data available",
        "route source is unavailable and nothing is cached",
    )
}

/// Create the API router.
pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        // Route data
        .route("/api/route", get(get_route))
        .route("/api/route/upload", post(upload_route))
        // Hotspots and analysis
        .route("/api/hotspots", get(list_hotspots))
        .route("/api/analysis", get(get_analysis))
        // MCSSE bridge
        .route("/api/mcsse/push", post(push_to_mcsse))
        .route("/api/mcsse/status", get(mcsse_status))
        .route("/api/status", get(app_status))
}

// ========== ROUTE ==========

async fn get_route(State(state): State<Arc<AppState>>) -> Result<Json<RouteDocument>, ApiError> {
    state.current_route().await.map(Json).ok_or_else(no_route)
}

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    /// Original file name; must end in `.rtz`.
    pub filename: Option<String>,
}

/// Accept a raw RTZ body, parse it and make it the cached route.
async fn upload_route(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UploadQuery>,
    body: String,
) -> Result<Json<RouteDocument>, ApiError> {
    let filename = query.filename.unwrap_or_default();
    if !filename.to_ascii_lowercase().ends_with(".rtz") {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "File must have .rtz extension",
            format!("got filename '{filename}'"),
        ));
    }

    let document = parse_rtz(&body).map_err(|err| {
        tracing::warn!("Rejected uploaded RTZ {}: {}", filename, err);
        api_error(StatusCode::BAD_REQUEST, "Failed to parse RTZ", err)
    })?;

    state.store_upload(document.clone(), &filename);
    tracing::info!(
        "Uploaded and parsed RTZ file {} ({} waypoints)",
        filename,
        document.waypoint_count
    );
    Ok(Json(document))
}

// ========== HOTSPOTS ==========

#[derive(Debug, Deserialize)]
pub struct HotspotQuery {
    pub min_lat: Option<f64>,
    pub min_lon: Option<f64>,
    pub max_lat: Option<f64>,
    pub max_lon: Option<f64>,
}

impl HotspotQuery {
    fn bounding_box(&self) -> Result<Option<BoundingBox>, ApiError> {
        match (self.min_lat, self.min_lon, self.max_lat, self.max_lon) {
            (None, None, None, None) => Ok(None),
            (Some(min_lat), Some(min_lon), Some(max_lat), Some(max_lon)) => {
                if min_lat > max_lat || min_lon > max_lon {
                    return Err(api_error(
                        StatusCode::BAD_REQUEST,
                        "Invalid bounding box",
                        "min_lat/min_lon must not exceed max_lat/max_lon",
                    ));
                }
                Ok(Some(BoundingBox::new(min_lat, min_lon, max_lat, max_lon)))
            }
            _ => Err(api_error(
                StatusCode::BAD_REQUEST,
                "Invalid bounding box",
                "min_lat, min_lon, max_lat and max_lon must be given together",
            )),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HotspotsResponse {
    #[serde(flatten)]
    pub metadata: CatalogueMetadata,
    pub hotspots: Vec<HotspotZone>,
}

fn catalogue_error(err: anyhow::Error) -> ApiError {
    tracing::error!("Hotspot catalogue unavailable: {:#}", err);
    api_error(
        StatusCode::BAD_GATEWAY,
        "Hotspot catalogue unavailable",
        format!("{err:#}"),
    )
}

async fn list_hotspots(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HotspotQuery>,
) -> Result<Json<HotspotsResponse>, ApiError> {
    let bbox = query.bounding_box()?;
    let hotspots = state.hotspot_zones(bbox).await.map_err(catalogue_error)?;
    let metadata = state.hotspot_metadata().await.map_err(catalogue_error)?;
    Ok(Json(HotspotsResponse { metadata, hotspots }))
}

// ========== ANALYSIS ==========

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub route: RouteDocument,
    #[serde(flatten)]
    pub analysis: RouteAnalysis,
    pub hotspot_source: Option<String>,
}

async fn get_analysis(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let route = state.current_route().await.ok_or_else(no_route)?;
    let analysis = state.analyze(&route).await.map_err(catalogue_error)?;
    let metadata = state.hotspot_metadata().await.map_err(catalogue_error)?;

    tracing::debug!(
        "Analysed route '{}': overall risk {}, {} advisories",
        route.route_info.route_name,
        analysis.risk_summary.overall_risk,
        analysis.advisories.len()
    );

    Ok(Json(AnalysisResponse {
        route,
        analysis,
        hotspot_source: metadata.data_source,
    }))
}

// ========== MCSSE ==========

async fn push_to_mcsse(State(state): State<Arc<AppState>>) -> Result<Json<PushOutcome>, ApiError> {
    let route = state.current_route().await.ok_or_else(|| {
        api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "No route data to push",
            "route source is unavailable and nothing is cached",
        )
    })?;
    Ok(Json(state.bridge().push(&route).await))
}

async fn mcsse_status(State(state): State<Arc<AppState>>) -> Json<BridgeStatus> {
    Json(state.bridge().status())
}

// ========== STATUS ==========

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedRouteInfo {
    pub origin: String,
    pub fetched_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppStatus {
    pub data_source: &'static str,
    pub has_route_data: bool,
    pub cached_route: Option<CachedRouteInfo>,
    pub mcsse: BridgeStatus,
    pub fleet_api_configured: bool,
}

async fn app_status(State(state): State<Arc<AppState>>) -> Json<AppStatus> {
    let cached = state.cache().snapshot();
    Json(AppStatus {
        data_source: state.config().data_source.as_str(),
        has_route_data: cached.is_some(),
        cached_route: cached.map(|cached| CachedRouteInfo {
            origin: cached.origin,
            fetched_at: cached.fetched_at,
        }),
        mcsse: state.bridge().status(),
        fleet_api_configured: state.config().fleet_api_configured(),
    })
}
