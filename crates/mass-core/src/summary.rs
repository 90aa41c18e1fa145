//! Route-level aggregation of per-leg risk.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::{Severity, Waypoint};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRiskSummary {
    /// Highest leg severity, `low` for a clear route.
    pub overall_risk: Severity,
    /// Distinct hotspot ids touched anywhere on the route.
    pub hotspot_count: usize,
    pub risky_legs: Vec<RiskyLeg>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskyLeg {
    pub leg_index: usize,
    pub from_waypoint_id: i64,
    pub from_waypoint_name: String,
    pub to_waypoint_id: i64,
    pub to_waypoint_name: String,
    pub risk_level: Severity,
    pub summary: String,
}

/// Collapse an annotated route into one verdict. Risky legs keep traversal order.
pub fn summarize(waypoints: &[Waypoint]) -> RouteRiskSummary {
    let mut summary = RouteRiskSummary::default();
    let mut hotspots: HashSet<&str> = HashSet::new();

    for (leg_index, leg) in waypoints.windows(2).enumerate() {
        let (from, to) = (&leg[0], &leg[1]);
        let Some(risk) = from.risk_assessment() else {
            continue;
        };

        summary.overall_risk = summary.overall_risk.max(risk.level);
        hotspots.extend(risk.intersecting_hotspots.iter().map(String::as_str));
        summary.risky_legs.push(RiskyLeg {
            leg_index,
            from_waypoint_id: from.id,
            from_waypoint_name: from.name.clone(),
            to_waypoint_id: to.id,
            to_waypoint_name: to.name.clone(),
            risk_level: risk.level,
            summary: risk.summary.clone(),
        });
    }

    summary.hotspot_count = hotspots.len();
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RiskAssessment;

    fn waypoint(id: i64, risk: Option<(Severity, &[&str])>) -> Waypoint {
        let mut wp = Waypoint {
            id,
            revision: 1,
            name: format!("WP_{id}"),
            lat: 0.0,
            lon: 0.0,
            leg: None,
            eta: None,
            leg_distance_nm: 0.0,
        };
        if let Some((level, ids)) = risk {
            wp.attach_risk(RiskAssessment {
                level,
                intersecting_hotspots: ids.iter().map(|id| id.to_string()).collect(),
                summary: format!("leg {id}"),
            });
        }
        wp
    }

    #[test]
    fn clear_route_is_low_risk() {
        let summary = summarize(&[waypoint(1, None), waypoint(2, None)]);
        assert_eq!(summary, RouteRiskSummary::default());

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"overallRisk": "low", "hotspotCount": 0, "riskyLegs": []})
        );
    }

    #[test]
    fn empty_route_is_low_risk() {
        assert_eq!(summarize(&[]), RouteRiskSummary::default());
    }

    #[test]
    fn counts_distinct_hotspots_and_keeps_leg_order() {
        let route = vec![
            waypoint(10, Some((Severity::Medium, &["A", "B"]))),
            waypoint(20, None),
            waypoint(30, Some((Severity::Low, &["B"]))),
            waypoint(40, None),
        ];

        let summary = summarize(&route);
        assert_eq!(summary.overall_risk, Severity::Medium);
        assert_eq!(summary.hotspot_count, 2);
        assert_eq!(summary.risky_legs.len(), 2);

        let first = &summary.risky_legs[0];
        assert_eq!(first.leg_index, 0);
        assert_eq!(first.to_waypoint_id, 20);
        assert_eq!(first.summary, "leg 10");

        let second = &summary.risky_legs[1];
        assert_eq!(second.leg_index, 2);
        assert_eq!(second.from_waypoint_name, "WP_30");
        assert_eq!(second.risk_level, Severity::Low);
    }

    #[test]
    fn assessment_on_final_waypoint_is_ignored() {
        let route = vec![waypoint(1, None), waypoint(2, Some((Severity::High, &["X"])))];
        let summary = summarize(&route);
        assert_eq!(summary.overall_risk, Severity::Low);
        assert!(summary.risky_legs.is_empty());
    }
}
