//! Core data models for parsed routes and their risk annotations.

use serde::{Deserialize, Serialize};

use crate::spatial::BoundingBox;

/// Hazard severity shared by hotspot zones, leg assessments and advisories.
///
/// Variants are declared in ascending order so the derived `Ord` matches
/// `high > medium > low`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
}

impl Severity {
    /// Numeric rank used for escalation and running maxima (low=1 .. high=3).
    pub fn rank(self) -> u8 {
        match self {
            Severity::Low => 1,
            Severity::Medium => 2,
            Severity::High => 3,
        }
    }

    /// Rank used when ordering advisories; ascending order puts `high` first.
    pub fn sort_rank(self) -> u8 {
        match self {
            Severity::High => 0,
            Severity::Medium => 1,
            Severity::Low => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed RTZ document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDocument {
    pub rtz_version: String,
    pub route_info: RouteInfo,
    pub waypoints: Vec<Waypoint>,
    pub schedules: Vec<Schedule>,
    /// Sum of unrounded leg distances, rounded once at the end.
    pub total_distance_nm: f64,
    pub waypoint_count: usize,
}

impl RouteDocument {
    /// Geographic extent of the route's waypoints, `None` for an empty route.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_positions(self.waypoints.iter().map(|wp| (wp.lat, wp.lon)))
    }
}

/// Vessel and route identity from `<routeInfo>`. Missing attributes are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RouteInfo {
    pub route_name: String,
    pub route_author: String,
    pub route_status: String,
    pub vessel_name: String,
    #[serde(rename = "vesselMMSI")]
    pub vessel_mmsi: String,
    #[serde(rename = "vesselIMO")]
    pub vessel_imo: String,
    pub vessel_voyage: String,
    pub validity_period_start: String,
    pub validity_period_stop: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Waypoint {
    pub id: i64,
    pub revision: i64,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    /// Leg constraints (explicit or inherited) plus any risk assessment of
    /// the outgoing leg.
    pub leg: Option<Leg>,
    /// Scheduled arrival, verbatim from the schedule.
    pub eta: Option<String>,
    /// Great-circle distance from the previous waypoint, one decimal.
    pub leg_distance_nm: f64,
}

impl Waypoint {
    pub fn risk_assessment(&self) -> Option<&RiskAssessment> {
        self.leg.as_ref()?.risk_assessment.as_ref()
    }

    /// Attach an assessment, creating a bare leg when the waypoint has none.
    pub fn attach_risk(&mut self, assessment: RiskAssessment) {
        self.leg.get_or_insert_with(Leg::default).risk_assessment = Some(assessment);
    }
}

/// Leg record as exposed on a waypoint.
///
/// A leg created only to carry a risk assessment has no constraints and
/// serializes as `{"riskAssessment": ...}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leg {
    #[serde(flatten)]
    pub constraints: Option<LegConstraints>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_assessment: Option<RiskAssessment>,
}

impl Leg {
    pub fn with_constraints(constraints: LegConstraints) -> Self {
        Self {
            constraints: Some(constraints),
            risk_assessment: None,
        }
    }
}

/// Navigational constraints from an RTZ `<leg>` element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegConstraints {
    #[serde(rename = "speedMax")]
    pub speed_max: f64,
    #[serde(rename = "portsideXTD")]
    pub portside_xtd: f64,
    #[serde(rename = "starboardXTD")]
    pub starboard_xtd: f64,
    #[serde(rename = "geometryType")]
    pub geometry_type: String,
}

impl Default for LegConstraints {
    fn default() -> Self {
        Self {
            speed_max: 0.0,
            portside_xtd: 0.0,
            starboard_xtd: 0.0,
            geometry_type: "Loxodrome".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub id: String,
    pub name: String,
    pub elements: Vec<ScheduleElement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleElement {
    pub waypoint_id: i64,
    pub eta: String,
}

/// Risk attached to a leg that crosses one or more hotspot zones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    /// Highest severity among the intersecting zones.
    pub level: Severity,
    /// Intersecting zone ids in catalogue order.
    pub intersecting_hotspots: Vec<String>,
    pub summary: String,
}
