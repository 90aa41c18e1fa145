//! Advisory generation for risk-annotated routes.
//!
//! Each (leg, hotspot) pair found by the analyzer becomes one structured
//! advisory with a natural-language message. Output is deterministic: ids use
//! a fixed reference date and a per-call counter, and the final list is
//! ordered by severity and then by the leg's first waypoint.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::hotspot::{HotspotType, HotspotZone};
use crate::models::{RouteInfo, Severity, Waypoint};

const REFERENCE_YEAR: i32 = 2026;
const REFERENCE_MONTH: u32 = 4;
const REFERENCE_DAY: u32 = 27;

pub const DEFAULT_TRANSMISSION_METHOD: &str = "Furuno Cloud (pending two-way integration)";
pub const FALLBACK_ACTION: &str = "Maintain enhanced watch and proceed with caution.";
const DENSITY_UNIT: &str = "vessels/hour";
const ETA_DISPLAY_FORMAT: &str = "%d %b %Y %H:%M UTC";
const NAIVE_ETA_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];
const OFFSET_ETA_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%dT%H:%M%z",
];

/// Kind of advisory. Zone types map onto the first four.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvisoryType {
    TrafficDensityWarning,
    CrossingTrafficAlert,
    CongestionAdvisory,
    FishingActivityNotice,
    SpeedRecommendation,
    ArrivalWindowAdvisory,
}

impl AdvisoryType {
    /// Advisory raised for a zone of the given type.
    pub fn for_hotspot(zone_type: HotspotType) -> Self {
        match zone_type {
            HotspotType::HighTrafficDensity => AdvisoryType::TrafficDensityWarning,
            HotspotType::CrossingTraffic => AdvisoryType::CrossingTrafficAlert,
            HotspotType::Congestion => AdvisoryType::CongestionAdvisory,
            HotspotType::FishingActivity => AdvisoryType::FishingActivityNotice,
            HotspotType::Other => AdvisoryType::TrafficDensityWarning,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            AdvisoryType::TrafficDensityWarning => "Traffic Density Warning",
            AdvisoryType::CrossingTrafficAlert => "Crossing Traffic Alert",
            AdvisoryType::CongestionAdvisory => "Congestion Advisory",
            AdvisoryType::FishingActivityNotice => "Fishing Activity Notice",
            AdvisoryType::SpeedRecommendation => "Speed Recommendation",
            AdvisoryType::ArrivalWindowAdvisory => "Arrival Window Advisory",
        }
    }

    /// Severity before peak-window escalation.
    pub fn default_severity(self) -> Severity {
        match self {
            AdvisoryType::TrafficDensityWarning | AdvisoryType::CrossingTrafficAlert => {
                Severity::High
            }
            AdvisoryType::CongestionAdvisory
            | AdvisoryType::SpeedRecommendation
            | AdvisoryType::ArrivalWindowAdvisory => Severity::Medium,
            AdvisoryType::FishingActivityNotice => Severity::Low,
        }
    }

    pub fn recommended_action(self) -> Option<&'static str> {
        match self {
            AdvisoryType::TrafficDensityWarning => Some(
                "Enhanced radar/AIS monitoring. Maintain maximum lookout. \
                 Consider speed adjustment to arrive outside peak window.",
            ),
            AdvisoryType::CrossingTrafficAlert => Some(
                "Maintain heightened watch for crossing traffic. Reduce speed as required. \
                 Be prepared for evasive manoeuvring.",
            ),
            AdvisoryType::CongestionAdvisory => Some(
                "Reduce speed when approaching the area. Monitor VHF channel 16. \
                 Co-ordinate with VTS if required.",
            ),
            AdvisoryType::FishingActivityNotice => Some(
                "Maintain visual watch. Do not rely solely on AIS. \
                 Fishing vessels may not respond to VHF or radar.",
            ),
            AdvisoryType::SpeedRecommendation | AdvisoryType::ArrivalWindowAdvisory => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransmissionStatus {
    /// Generated and waiting for delivery.
    #[default]
    Ready,
}

/// Structured advisory for one leg crossing one hotspot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Advisory {
    /// `ADV-<reference date>-<NNN>`
    pub id: String,
    pub timestamp: String,
    #[serde(rename = "type")]
    pub advisory_type: AdvisoryType,
    pub severity: Severity,
    /// Waypoint ids bounding the affected leg.
    pub related_waypoints: Vec<i64>,
    pub related_hotspots: Vec<String>,
    pub title: String,
    pub message: String,
    pub structured_data: StructuredData,
    pub transmission_status: TransmissionStatus,
    pub transmission_method: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredData {
    pub affected_leg_start: LegEndpoint,
    pub affected_leg_end: LegEndpoint,
    pub traffic_density: Option<TrafficDensity>,
    #[serde(rename = "vesselETA")]
    pub vessel_eta: Option<String>,
    /// Every declared peak window, comma separated.
    pub peak_window: Option<String>,
    pub in_peak_window: bool,
    pub recommended_action: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegEndpoint {
    pub waypoint_id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficDensity {
    pub value: Number,
    pub unit: String,
}

/// Generation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvisoryConfig {
    /// Date used in advisory ids and timestamps.
    pub reference_date: NaiveDate,
    pub transmission_method: String,
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self {
            reference_date: NaiveDate::from_ymd_opt(REFERENCE_YEAR, REFERENCE_MONTH, REFERENCE_DAY)
                .unwrap_or_default(),
            transmission_method: DEFAULT_TRANSMISSION_METHOD.to_string(),
        }
    }
}

/// A UTC hour range parsed from `HH:MM-HH:MM`. Minutes are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeakWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl PeakWindow {
    pub fn parse(window: &str) -> Option<Self> {
        let (start, end) = window.split_once('-')?;
        if end.contains('-') {
            return None;
        }
        Some(Self {
            start_hour: leading_hour(start)?,
            end_hour: leading_hour(end)?,
        })
    }

    /// Half-open membership: `start <= hour < end`.
    pub fn contains(&self, hour: u32) -> bool {
        self.start_hour <= hour && hour < self.end_hour
    }
}

fn leading_hour(part: &str) -> Option<u32> {
    part.split(':').next()?.trim().parse().ok()
}

/// Parse an ISO-8601 ETA. Values without an offset are read as UTC, a bare
/// date as midnight.
pub fn parse_eta(raw: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed);
    }
    let offset_form = match raw.strip_suffix('Z').or_else(|| raw.strip_suffix('z')) {
        Some(stripped) => format!("{stripped}+00:00"),
        None => raw.to_string(),
    };
    if let Some(parsed) = OFFSET_ETA_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(&offset_form, format).ok())
    {
        return Some(parsed);
    }
    NAIVE_ETA_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc().fixed_offset())
}

/// First declared window containing the ETA's hour.
pub fn match_peak_window<'a>(eta: Option<&str>, windows: &'a [String]) -> Option<&'a str> {
    let hour = parse_eta(eta?)?.hour();
    windows
        .iter()
        .find(|window| PeakWindow::parse(window).is_some_and(|peak| peak.contains(hour)))
        .map(String::as_str)
}

/// ETA for display; unparseable values are shown verbatim.
pub fn display_eta(raw: &str) -> String {
    match parse_eta(raw) {
        Some(parsed) => parsed.format(ETA_DISPLAY_FORMAT).to_string(),
        None => raw.to_string(),
    }
}

/// Turns risk-annotated waypoints into ranked advisories.
#[derive(Debug, Clone, Default)]
pub struct AdvisoryGenerator {
    config: AdvisoryConfig,
}

impl AdvisoryGenerator {
    pub fn new(config: AdvisoryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AdvisoryConfig {
        &self.config
    }

    /// Emit one advisory per intersecting hotspot of every assessed leg.
    ///
    /// Ids are numbered in traversal order before the final sort, so the
    /// returned list is not necessarily in id order.
    pub fn generate(
        &self,
        waypoints: &[Waypoint],
        route_info: &RouteInfo,
        zones: &[HotspotZone],
    ) -> Vec<Advisory> {
        let zones_by_id: HashMap<&str, &HotspotZone> =
            zones.iter().map(|zone| (zone.id.as_str(), zone)).collect();

        let mut advisories = Vec::new();
        let mut sequence = 0u32;

        for leg in waypoints.windows(2) {
            let (from, to) = (&leg[0], &leg[1]);
            let Some(risk) = from.risk_assessment() else {
                continue;
            };

            for zone_id in &risk.intersecting_hotspots {
                let Some(zone) = zones_by_id.get(zone_id.as_str()) else {
                    continue;
                };
                sequence += 1;
                advisories.push(self.build_advisory(sequence, from, to, zone));
            }
        }

        advisories.sort_by_key(|advisory| {
            (
                advisory.severity.sort_rank(),
                advisory.related_waypoints.first().copied().unwrap_or(0),
            )
        });

        tracing::debug!(
            vessel = %route_info.vessel_name,
            voyage = %route_info.vessel_voyage,
            count = advisories.len(),
            "Generated route advisories"
        );

        advisories
    }

    fn build_advisory(
        &self,
        sequence: u32,
        from: &Waypoint,
        to: &Waypoint,
        zone: &HotspotZone,
    ) -> Advisory {
        let advisory_type = AdvisoryType::for_hotspot(zone.zone_type);
        let metadata = &zone.metadata;
        let peak_hours = &metadata.peak_hours_utc;

        let eta = to.eta.as_deref();
        let matched_window = match_peak_window(eta, peak_hours);
        let in_peak = matched_window.is_some();
        let severity = if in_peak {
            Severity::High
        } else {
            advisory_type.default_severity()
        };

        let density = metadata.reported_density();
        let recommended_action = advisory_type
            .recommended_action()
            .unwrap_or(FALLBACK_ACTION)
            .to_string();

        let mut sentences = vec![format!(
            "Vessel route from WP{} ({}) to WP{} ({}) transits {}.",
            from.id, from.name, to.id, to.name, zone.name
        )];
        if let Some(density) = density {
            sentences.push(format!("Average traffic: {density} {DENSITY_UNIT}."));
        }
        if !peak_hours.is_empty() {
            sentences.push(format!("Peak period: {} UTC.", peak_hours.join(", ")));
        }
        if let Some(eta) = eta {
            let shown = display_eta(eta);
            match matched_window {
                Some(window) => sentences.push(format!(
                    "Vessel ETA at WP{}: {} — coincides with peak traffic window ({}).",
                    to.id, shown, window
                )),
                None => sentences.push(format!("Vessel ETA at WP{}: {}.", to.id, shown)),
            }
        }
        if !metadata.dominant_vessel_types.is_empty() {
            sentences.push(format!(
                "Dominant vessel types: {}.",
                metadata.dominant_vessel_types.join(", ")
            ));
        }
        if let Some(notes) = metadata.reported_notes() {
            sentences.push(notes.to_string());
        }

        let date = self.config.reference_date.format("%Y-%m-%d");

        Advisory {
            id: format!("ADV-{date}-{sequence:03}"),
            timestamp: format!("{date}T06:00:00Z"),
            advisory_type,
            severity,
            related_waypoints: vec![from.id, to.id],
            related_hotspots: vec![zone.id.clone()],
            title: format!("{} — {}", advisory_type.title(), zone.name),
            message: sentences.join(" "),
            structured_data: StructuredData {
                affected_leg_start: LegEndpoint {
                    waypoint_id: from.id,
                    name: from.name.clone(),
                },
                affected_leg_end: LegEndpoint {
                    waypoint_id: to.id,
                    name: to.name.clone(),
                },
                traffic_density: density.map(|value| TrafficDensity {
                    value: value.clone(),
                    unit: DENSITY_UNIT.to_string(),
                }),
                vessel_eta: to.eta.clone(),
                peak_window: (!peak_hours.is_empty()).then(|| peak_hours.join(", ")),
                in_peak_window: in_peak,
                recommended_action,
            },
            transmission_status: TransmissionStatus::Ready,
            transmission_method: self.config.transmission_method.clone(),
        }
    }
}

/// Generate advisories with the default configuration.
pub fn generate_advisories(
    waypoints: &[Waypoint],
    route_info: &RouteInfo,
    zones: &[HotspotZone],
) -> Vec<Advisory> {
    AdvisoryGenerator::default().generate(waypoints, route_info, zones)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hotspot::HotspotMetadata;
    use crate::models::RiskAssessment;
    use serde_json::Value;

    fn waypoint(id: i64, name: &str, eta: Option<&str>) -> Waypoint {
        Waypoint {
            id,
            revision: 1,
            name: name.to_string(),
            lat: 0.0,
            lon: 0.0,
            leg: None,
            eta: eta.map(str::to_string),
            leg_distance_nm: 0.0,
        }
    }

    fn zone(id: &str, zone_type: HotspotType, metadata: HotspotMetadata) -> HotspotZone {
        HotspotZone {
            id: id.to_string(),
            name: format!("Zone {id}"),
            zone_type,
            severity: Severity::Medium,
            geometry: Value::Null,
            metadata,
        }
    }

    fn assessed(mut wp: Waypoint, zone_ids: &[&str], level: Severity) -> Waypoint {
        wp.attach_risk(RiskAssessment {
            level,
            intersecting_hotspots: zone_ids.iter().map(|id| id.to_string()).collect(),
            summary: String::new(),
        });
        wp
    }

    #[test]
    fn peak_window_parsing() {
        assert_eq!(
            PeakWindow::parse("06:00-10:00"),
            Some(PeakWindow {
                start_hour: 6,
                end_hour: 10
            })
        );
        assert_eq!(PeakWindow::parse("garbage"), None);
        assert_eq!(PeakWindow::parse("06:00-10:00-12:00"), None);
        assert_eq!(PeakWindow::parse("xx:00-10:00"), None);
    }

    #[test]
    fn peak_window_is_half_open_on_hours() {
        let window = PeakWindow::parse("06:30-10:45").unwrap();
        assert!(window.contains(6));
        assert!(window.contains(9));
        assert!(!window.contains(10));
        assert!(!window.contains(5));
    }

    #[test]
    fn eta_matching() {
        let windows = vec!["02:00-04:00".to_string(), "06:00-10:00".to_string()];
        assert_eq!(
            match_peak_window(Some("2026-04-27T07:30:00Z"), &windows),
            Some("06:00-10:00")
        );
        assert_eq!(match_peak_window(Some("2026-04-27T10:00:00Z"), &windows), None);
        assert_eq!(match_peak_window(Some("not a date"), &windows), None);
        assert_eq!(match_peak_window(None, &windows), None);
        assert_eq!(match_peak_window(Some("2026-04-27T07:30:00Z"), &[]), None);
    }

    #[test]
    fn naive_eta_is_read_as_utc() {
        let parsed = parse_eta("2026-04-27T07:30:00").unwrap();
        assert_eq!(parsed.hour(), 7);
        assert_eq!(display_eta("2026-04-27T07:30:00"), "27 Apr 2026 07:30 UTC");
    }

    #[test]
    fn iso_eta_variants_match_peak_window() {
        let windows = vec!["06:00-10:00".to_string()];
        for eta in [
            "2026-04-27T07:30Z",
            "2026-04-27T07:30+00:00",
            "2026-04-27T07:30:00+0000",
            "2026-04-27T07:30:00.250Z",
        ] {
            assert_eq!(match_peak_window(Some(eta), &windows), Some("06:00-10:00"), "{eta}");
            assert_eq!(display_eta(eta), "27 Apr 2026 07:30 UTC", "{eta}");
        }

        let midnight = parse_eta("2026-04-27").unwrap();
        assert_eq!(midnight.hour(), 0);
        assert_eq!(match_peak_window(Some("2026-04-27"), &windows), None);
    }

    #[test]
    fn unparseable_eta_is_displayed_verbatim() {
        assert_eq!(display_eta("tomorrow morning"), "tomorrow morning");
    }

    #[test]
    fn unknown_zone_type_maps_to_traffic_density_warning() {
        assert_eq!(
            AdvisoryType::for_hotspot(HotspotType::Other),
            AdvisoryType::TrafficDensityWarning
        );
        assert_eq!(AdvisoryType::SpeedRecommendation.recommended_action(), None);
    }

    #[test]
    fn builds_full_message_in_peak_window() {
        let metadata = HotspotMetadata {
            avg_vessels_per_hour: Some(Number::from(45)),
            peak_hours_utc: vec!["06:00-10:00".to_string()],
            dominant_vessel_types: vec!["cargo".to_string(), "tanker".to_string()],
            notes: Some("TSS in force.".to_string()),
            ..HotspotMetadata::default()
        };
        let zones = vec![zone("HS-1", HotspotType::FishingActivity, metadata)];
        let route = vec![
            assessed(waypoint(1, "Alpha", None), &["HS-1"], Severity::Medium),
            waypoint(2, "Bravo", Some("2026-04-27T07:30:00Z")),
        ];

        let advisories = generate_advisories(&route, &RouteInfo::default(), &zones);
        assert_eq!(advisories.len(), 1);
        let advisory = &advisories[0];

        assert_eq!(advisory.id, "ADV-2026-04-27-001");
        assert_eq!(advisory.timestamp, "2026-04-27T06:00:00Z");
        assert_eq!(advisory.advisory_type, AdvisoryType::FishingActivityNotice);
        assert_eq!(advisory.severity, Severity::High);
        assert_eq!(advisory.title, "Fishing Activity Notice — Zone HS-1");
        assert_eq!(
            advisory.message,
            "Vessel route from WP1 (Alpha) to WP2 (Bravo) transits Zone HS-1. \
             Average traffic: 45 vessels/hour. \
             Peak period: 06:00-10:00 UTC. \
             Vessel ETA at WP2: 27 Apr 2026 07:30 UTC — coincides with peak traffic window (06:00-10:00). \
             Dominant vessel types: cargo, tanker. \
             TSS in force."
        );

        let data = &advisory.structured_data;
        assert!(data.in_peak_window);
        assert_eq!(data.peak_window.as_deref(), Some("06:00-10:00"));
        assert_eq!(data.vessel_eta.as_deref(), Some("2026-04-27T07:30:00Z"));
        assert_eq!(data.traffic_density.as_ref().unwrap().unit, "vessels/hour");
        assert_eq!(data.affected_leg_end.name, "Bravo");
    }

    #[test]
    fn absent_metadata_is_omitted_from_message() {
        let zones = vec![zone("HS-9", HotspotType::Congestion, HotspotMetadata::default())];
        let route = vec![
            assessed(waypoint(4, "Delta", None), &["HS-9"], Severity::Medium),
            waypoint(5, "Echo", None),
        ];

        let advisory = &generate_advisories(&route, &RouteInfo::default(), &zones)[0];
        assert_eq!(
            advisory.message,
            "Vessel route from WP4 (Delta) to WP5 (Echo) transits Zone HS-9."
        );
        assert_eq!(advisory.severity, Severity::Medium);
        assert!(advisory.structured_data.traffic_density.is_none());
        assert!(advisory.structured_data.peak_window.is_none());
        assert!(!advisory.structured_data.in_peak_window);
        assert_eq!(
            advisory.structured_data.recommended_action,
            AdvisoryType::CongestionAdvisory.recommended_action().unwrap()
        );
    }

    #[test]
    fn eta_outside_window_is_reported_without_escalation() {
        let metadata = HotspotMetadata {
            peak_hours_utc: vec!["06:00-10:00".to_string()],
            ..HotspotMetadata::default()
        };
        let zones = vec![zone("HS-2", HotspotType::Congestion, metadata)];
        let route = vec![
            assessed(waypoint(1, "A", None), &["HS-2"], Severity::Medium),
            waypoint(2, "B", Some("2026-04-27T14:00:00Z")),
        ];

        let advisory = &generate_advisories(&route, &RouteInfo::default(), &zones)[0];
        assert_eq!(advisory.severity, Severity::Medium);
        assert!(advisory
            .message
            .ends_with("Vessel ETA at WP2: 27 Apr 2026 14:00 UTC."));
    }

    #[test]
    fn unknown_hotspot_ids_are_ignored() {
        let route = vec![
            assessed(waypoint(1, "A", None), &["MISSING"], Severity::High),
            waypoint(2, "B", None),
        ];
        assert!(generate_advisories(&route, &RouteInfo::default(), &[]).is_empty());
    }

    #[test]
    fn custom_reference_date_and_method() {
        let config = AdvisoryConfig {
            reference_date: NaiveDate::from_ymd_opt(2027, 1, 2).unwrap(),
            transmission_method: "VHF".to_string(),
        };
        let zones = vec![zone("HS-1", HotspotType::Congestion, HotspotMetadata::default())];
        let route = vec![
            assessed(waypoint(1, "A", None), &["HS-1"], Severity::Medium),
            waypoint(2, "B", None),
        ];

        let advisory = &AdvisoryGenerator::new(config).generate(&route, &RouteInfo::default(), &zones)[0];
        assert_eq!(advisory.id, "ADV-2027-01-02-001");
        assert_eq!(advisory.transmission_method, "VHF");
    }

    #[test]
    fn serializes_wire_field_names() {
        let zones = vec![zone("HS-1", HotspotType::CrossingTraffic, HotspotMetadata::default())];
        let route = vec![
            assessed(waypoint(1, "A", None), &["HS-1"], Severity::High),
            waypoint(2, "B", None),
        ];
        let advisory = &generate_advisories(&route, &RouteInfo::default(), &zones)[0];
        let value = serde_json::to_value(advisory).unwrap();

        assert_eq!(value["type"], "crossing_traffic_alert");
        assert_eq!(value["transmissionStatus"], "ready");
        assert_eq!(value["relatedWaypoints"], serde_json::json!([1, 2]));
        assert!(value["structuredData"]["vesselETA"].is_null());
        assert_eq!(value["structuredData"]["inPeakWindow"], false);
        assert_eq!(
            value["structuredData"]["affectedLegStart"]["waypointId"],
            1
        );
    }
}
