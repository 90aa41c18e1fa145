//! Outbound bridge to the MCSSE traffic system.
//!
//! Routes are delivered as a GeoJSON `Feature` (a `LineString` through the
//! waypoints plus vessel and voyage properties). In dry-run mode the payload
//! is only logged.

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use chrono::Utc;
use geojson::{Feature, Geometry, Value as GeoValue};
use mass_core::RouteDocument;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

const PUSH_TIMEOUT_SECS: u64 = 10;
const LOG_PREVIEW_CHARS: usize = 500;
const RESPONSE_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushStatus {
    DryRun,
    Sent,
    Failed,
}

/// Result of one push attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushOutcome {
    pub status: PushStatus,
    pub timestamp: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_preview: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeStatus {
    pub configured: bool,
    pub dry_run: bool,
    pub last_push_status: Option<PushStatus>,
    pub last_push_time: Option<String>,
}

pub struct McsseBridge {
    client: Client,
    api_url: String,
    api_key: String,
    dry_run: bool,
    last_push: RwLock<Option<(PushStatus, String)>>,
}

impl McsseBridge {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>, dry_run: bool) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(PUSH_TIMEOUT_SECS))
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_url: api_url.into(),
            api_key: api_key.into(),
            dry_run,
            last_push: RwLock::new(None),
        }
    }

    /// Route as a GeoJSON feature; coordinates are `[lon, lat]`.
    pub fn transform(route: &RouteDocument) -> Feature {
        let info = &route.route_info;
        let coordinates = route
            .waypoints
            .iter()
            .map(|wp| vec![wp.lon, wp.lat])
            .collect();

        let waypoints: Vec<serde_json::Value> = route
            .waypoints
            .iter()
            .map(|wp| {
                let mut props = json!({
                    "id": wp.id,
                    "name": wp.name,
                    "eta": wp.eta,
                });
                let speed_max = wp
                    .leg
                    .as_ref()
                    .and_then(|leg| leg.constraints.as_ref())
                    .map(|constraints| constraints.speed_max);
                if let (Some(speed_max), Some(map)) = (speed_max, props.as_object_mut()) {
                    map.insert("speedMax".to_string(), json!(speed_max));
                }
                props
            })
            .collect();

        let properties = json!({
            "vesselName": info.vessel_name,
            "vesselMMSI": info.vessel_mmsi,
            "vesselIMO": info.vessel_imo,
            "routeName": info.route_name,
            "voyageId": info.vessel_voyage,
            "routeStatus": info.route_status,
            "totalDistanceNm": route.total_distance_nm,
            "waypointCount": route.waypoint_count,
            "waypoints": waypoints,
        });

        Feature {
            bbox: None,
            geometry: Some(Geometry::new(GeoValue::LineString(coordinates))),
            id: None,
            properties: properties.as_object().cloned(),
            foreign_members: None,
        }
    }

    pub async fn push(&self, route: &RouteDocument) -> PushOutcome {
        let feature = Self::transform(route);
        let payload = serde_json::to_string(&feature).unwrap_or_default();
        let timestamp = Utc::now().to_rfc3339();

        let outcome = if self.dry_run {
            tracing::info!(
                "[DRY RUN] Would POST to {} with payload: {}",
                if self.api_url.is_empty() { "(no URL configured)" } else { self.api_url.as_str() },
                preview(&payload, LOG_PREVIEW_CHARS)
            );
            PushOutcome {
                status: PushStatus::DryRun,
                timestamp,
                message: "Dry run: payload logged but not sent".to_string(),
                http_status: None,
                payload_preview: Some(preview(&payload, RESPONSE_PREVIEW_CHARS)),
            }
        } else {
            self.send(&feature, timestamp).await
        };

        *self
            .last_push
            .write()
            .unwrap_or_else(PoisonError::into_inner) =
            Some((outcome.status, outcome.timestamp.clone()));
        outcome
    }

    async fn send(&self, feature: &Feature, timestamp: String) -> PushOutcome {
        let failed = |message: String, http_status: Option<u16>| PushOutcome {
            status: PushStatus::Failed,
            timestamp: timestamp.clone(),
            message,
            http_status,
            payload_preview: None,
        };

        if self.api_url.trim().is_empty() {
            tracing::warn!("MCSSE live push requested without an API URL");
            return failed("MCSSE API URL is not configured".to_string(), None);
        }

        let mut request = self.client.post(&self.api_url).json(feature);
        if !self.api_key.trim().is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        match request.send().await {
            Ok(response) if response.status().is_success() => {
                let code = response.status().as_u16();
                tracing::info!("Pushed route to MCSSE (HTTP {})", code);
                PushOutcome {
                    status: PushStatus::Sent,
                    timestamp: timestamp.clone(),
                    message: "Route delivered to MCSSE".to_string(),
                    http_status: Some(code),
                    payload_preview: None,
                }
            }
            Ok(response) => {
                let code = response.status().as_u16();
                tracing::warn!("MCSSE rejected route push (HTTP {})", code);
                failed(format!("MCSSE answered HTTP {code}"), Some(code))
            }
            Err(err) => {
                tracing::warn!("MCSSE push failed: {}", err);
                failed(format!("MCSSE push failed: {err}"), None)
            }
        }
    }

    pub fn status(&self) -> BridgeStatus {
        let last = self
            .last_push
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        BridgeStatus {
            configured: !self.api_url.trim().is_empty(),
            dry_run: self.dry_run,
            last_push_status: last.as_ref().map(|(status, _)| *status),
            last_push_time: last.map(|(_, time)| time),
        }
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mass_core::parse_rtz;

    fn route() -> RouteDocument {
        parse_rtz(
            r#"<route version="1.1">
                <routeInfo routeName="North Passage" vesselName="Elder Leader" vesselMMSI="123456789" vesselVoyage="V42"/>
                <waypoints>
                    <waypoint id="1" name="Start"><position lat="57.7" lon="11.9"/></waypoint>
                    <waypoint id="2" name="End"><position lat="57.6" lon="11.5"/><leg speedMax="12.5"/></waypoint>
                </waypoints>
                <schedules><schedule id="1"><calculated>
                    <scheduleElement waypointId="2" eta="2026-04-27T09:00:00Z"/>
                </calculated></schedule></schedules>
            </route>"#,
        )
        .unwrap()
    }

    #[test]
    fn transform_builds_line_feature() {
        let value = serde_json::to_value(McsseBridge::transform(&route())).unwrap();

        assert_eq!(value["type"], "Feature");
        assert_eq!(value["geometry"]["type"], "LineString");
        assert_eq!(value["geometry"]["coordinates"][0], json!([11.9, 57.7]));

        let props = &value["properties"];
        assert_eq!(props["vesselName"], "Elder Leader");
        assert_eq!(props["voyageId"], "V42");
        assert_eq!(props["waypointCount"], 2);
        assert!(props["waypoints"][0].get("speedMax").is_none());
        assert!(props["waypoints"][0]["eta"].is_null());
        assert_eq!(props["waypoints"][1]["speedMax"], 12.5);
        assert_eq!(props["waypoints"][1]["eta"], "2026-04-27T09:00:00Z");
    }

    #[tokio::test]
    async fn dry_run_records_status() {
        let bridge = McsseBridge::new("", "", true);
        assert_eq!(bridge.status().last_push_status, None);

        let outcome = bridge.push(&route()).await;
        assert_eq!(outcome.status, PushStatus::DryRun);
        assert!(outcome.payload_preview.unwrap().chars().count() <= RESPONSE_PREVIEW_CHARS);

        let status = bridge.status();
        assert!(!status.configured);
        assert!(status.dry_run);
        assert_eq!(status.last_push_status, Some(PushStatus::DryRun));
        assert_eq!(status.last_push_time, Some(outcome.timestamp));
    }

    #[tokio::test]
    async fn live_push_without_url_fails() {
        let bridge = McsseBridge::new("", "", false);
        let outcome = bridge.push(&route()).await;
        assert_eq!(outcome.status, PushStatus::Failed);
        assert_eq!(bridge.status().last_push_status, Some(PushStatus::Failed));
    }

    #[test]
    fn status_serializes_camel_case() {
        let bridge = McsseBridge::new("https://mcsse.example/api", "key", true);
        let value = serde_json::to_value(bridge.status()).unwrap();
        assert_eq!(
            value,
            json!({"configured": true, "dryRun": true, "lastPushStatus": null, "lastPushTime": null})
        );
    }
}
