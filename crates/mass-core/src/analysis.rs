//! Route risk analysis.
//!
//! Intersects every leg of a route with the hotspot footprints and attaches a
//! [`RiskAssessment`] to the waypoint the leg departs from.

use crate::hotspot::HotspotZone;
use crate::models::{RiskAssessment, Waypoint};
use crate::spatial::Footprint;

/// Annotate a route with per-leg risk.
///
/// Returns a new waypoint list; the inputs are left untouched. Leg `i` runs
/// from waypoint `i` to `i + 1`, so the last waypoint is never annotated.
/// Zones whose footprint cannot be built are skipped.
pub fn analyze_route(waypoints: &[Waypoint], zones: &[HotspotZone]) -> Vec<Waypoint> {
    let footprints: Vec<(&HotspotZone, Footprint)> = zones
        .iter()
        .filter_map(|zone| match zone.footprint() {
            Ok(footprint) => Some((zone, footprint)),
            Err(err) => {
                tracing::debug!(zone_id = %zone.id, error = %err, "Skipping hotspot with unreadable footprint");
                None
            }
        })
        .collect();

    let mut annotated = waypoints.to_vec();
    for (index, leg) in waypoints.windows(2).enumerate() {
        let (from, to) = (&leg[0], &leg[1]);
        let hits: Vec<&HotspotZone> = footprints
            .iter()
            .filter(|(_, footprint)| footprint.intersects_leg(from.lat, from.lon, to.lat, to.lon))
            .map(|(zone, _)| *zone)
            .collect();

        if let Some(assessment) = assess_leg(&hits) {
            annotated[index].attach_risk(assessment);
        }
    }

    annotated
}

/// Combine the zones crossed by one leg. `None` when the leg is clear.
fn assess_leg(hits: &[&HotspotZone]) -> Option<RiskAssessment> {
    let level = hits.iter().map(|zone| zone.severity).max()?;

    let summary = hits
        .iter()
        .map(|zone| {
            let density = zone
                .metadata
                .avg_vessels_per_hour
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "?".to_string());
            format!("{}: avg {} vessels/hour.", zone.name, density)
        })
        .collect::<Vec<_>>()
        .join(" ");

    Some(RiskAssessment {
        level,
        intersecting_hotspots: hits.iter().map(|zone| zone.id.clone()).collect(),
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hotspot::{HotspotMetadata, HotspotType};
    use crate::models::{Leg, LegConstraints, Severity};
    use serde_json::{json, Number};

    fn waypoint(id: i64, lat: f64, lon: f64) -> Waypoint {
        Waypoint {
            id,
            revision: 1,
            name: format!("WP_{id}"),
            lat,
            lon,
            leg: None,
            eta: None,
            leg_distance_nm: 0.0,
        }
    }

    fn zone(id: &str, severity: Severity, lon: (f64, f64), density: Option<u64>) -> HotspotZone {
        HotspotZone {
            id: id.to_string(),
            name: format!("Zone {id}"),
            zone_type: HotspotType::Congestion,
            severity,
            geometry: json!({
                "type": "Polygon",
                "coordinates": [[[lon.0, 0.0], [lon.1, 0.0], [lon.1, 1.0], [lon.0, 1.0], [lon.0, 0.0]]]
            }),
            metadata: HotspotMetadata {
                avg_vessels_per_hour: density.map(Number::from),
                ..HotspotMetadata::default()
            },
        }
    }

    #[test]
    fn clear_route_has_no_assessments() {
        let route = vec![waypoint(1, 0.5, 10.0), waypoint(2, 0.5, 11.0)];
        let zones = vec![zone("A", Severity::High, (0.0, 1.0), Some(10))];

        let annotated = analyze_route(&route, &zones);
        assert_eq!(annotated, route);
    }

    #[test]
    fn highest_severity_wins_and_summary_keeps_catalogue_order() {
        let route = vec![waypoint(1, 0.5, 0.0), waypoint(2, 0.5, 5.0)];
        let zones = vec![
            zone("A", Severity::Low, (1.0, 2.0), Some(12)),
            zone("B", Severity::High, (3.0, 4.0), None),
        ];

        let annotated = analyze_route(&route, &zones);
        let risk = annotated[0].risk_assessment().unwrap();

        assert_eq!(risk.level, Severity::High);
        assert_eq!(risk.intersecting_hotspots, vec!["A", "B"]);
        assert_eq!(
            risk.summary,
            "Zone A: avg 12 vessels/hour. Zone B: avg ? vessels/hour."
        );
        assert!(annotated[1].risk_assessment().is_none());
    }

    #[test]
    fn existing_leg_constraints_are_preserved() {
        let mut first = waypoint(1, 0.5, 0.0);
        first.leg = Some(Leg::with_constraints(LegConstraints {
            speed_max: 12.0,
            ..LegConstraints::default()
        }));
        let route = vec![first, waypoint(2, 0.5, 5.0)];
        let zones = vec![zone("A", Severity::Medium, (1.0, 2.0), Some(3))];

        let annotated = analyze_route(&route, &zones);
        let leg = annotated[0].leg.as_ref().unwrap();
        assert_eq!(leg.constraints.as_ref().unwrap().speed_max, 12.0);
        assert_eq!(leg.risk_assessment.as_ref().unwrap().level, Severity::Medium);
        assert!(route[0].risk_assessment().is_none());
    }

    #[test]
    fn malformed_zone_is_skipped() {
        let route = vec![waypoint(1, 0.5, 0.0), waypoint(2, 0.5, 5.0)];
        let mut broken = zone("BROKEN", Severity::High, (1.0, 2.0), None);
        broken.geometry = json!({"type": "Polygon"});
        let zones = vec![broken, zone("OK", Severity::Low, (3.0, 4.0), Some(1))];

        let annotated = analyze_route(&route, &zones);
        let risk = annotated[0].risk_assessment().unwrap();
        assert_eq!(risk.intersecting_hotspots, vec!["OK"]);
        assert_eq!(risk.level, Severity::Low);
    }

    #[test]
    fn single_waypoint_route_is_returned_unchanged() {
        let route = vec![waypoint(1, 0.5, 0.5)];
        let zones = vec![zone("A", Severity::High, (0.0, 1.0), None)];
        assert_eq!(analyze_route(&route, &zones), route);
    }
}
