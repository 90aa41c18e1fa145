//! End-to-end analysis of a parsed route.

use serde::{Deserialize, Serialize};

use crate::advisory::{Advisory, AdvisoryConfig, AdvisoryGenerator};
use crate::analysis::analyze_route;
use crate::hotspot::HotspotZone;
use crate::models::{RouteDocument, Waypoint};
use crate::summary::{summarize, RouteRiskSummary};

/// Output of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteAnalysis {
    pub waypoints: Vec<Waypoint>,
    pub advisories: Vec<Advisory>,
    pub risk_summary: RouteRiskSummary,
}

/// Run analyzer, advisory generator and summarizer over one route snapshot.
pub fn analyze(
    document: &RouteDocument,
    zones: &[HotspotZone],
    config: &AdvisoryConfig,
) -> RouteAnalysis {
    let waypoints = analyze_route(&document.waypoints, zones);
    let advisories =
        AdvisoryGenerator::new(config.clone()).generate(&waypoints, &document.route_info, zones);
    let risk_summary = summarize(&waypoints);

    RouteAnalysis {
        waypoints,
        advisories,
        risk_summary,
    }
}
