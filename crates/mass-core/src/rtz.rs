//! RTZ (route exchange format) parser.
//!
//! Reads RTZ 1.1 and 1.2 documents into a [`RouteDocument`]. Producers are
//! not consistent about binding elements to the RTZ namespace, so every
//! lookup tries the document namespace first and then falls back to
//! un-namespaced children. `<extensions>` blocks are discarded.

use std::collections::HashMap;
use std::str::FromStr;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;

use crate::error::RtzError;
use crate::models::{
    Leg, LegConstraints, RouteDocument, RouteInfo, Schedule, ScheduleElement, Waypoint,
};
use crate::spatial::{haversine_nm, round_to_tenth};

pub const RTZ_NAMESPACE_1_1: &str = "http://www.cirm.org/RTZ/1/1";
pub const RTZ_NAMESPACE_1_2: &str = "http://www.cirm.org/RTZ/1/2";

const DEFAULT_VERSION: &str = "1.1";
const EXTENSIONS_TAG: &str = "extensions";

/// Namespace expected for a declared RTZ version. Unknown versions map to 1.1.
pub fn namespace_for_version(version: &str) -> &'static str {
    match version {
        "1.2" => RTZ_NAMESPACE_1_2,
        _ => RTZ_NAMESPACE_1_1,
    }
}

/// Parse an RTZ document.
///
/// Fails only when the text is not well-formed XML or a numeric attribute
/// cannot be read; absent attributes fall back to defaults.
pub fn parse_rtz(xml: &str) -> Result<RouteDocument, RtzError> {
    let root = read_tree(xml)?;
    let rtz_version = root.attr("version").unwrap_or(DEFAULT_VERSION).to_string();
    // A namespaced root tag wins over the version attribute.
    let namespace = root
        .namespace
        .clone()
        .unwrap_or_else(|| namespace_for_version(&rtz_version).to_string());
    let ns = namespace.as_str();

    let route_info = root
        .find("routeInfo", ns)
        .map(parse_route_info)
        .unwrap_or_default();

    let mut waypoints = Vec::new();
    if let Some(list) = root.find("waypoints", ns) {
        let default_leg = match list
            .find("defaultWaypoint", ns)
            .and_then(|default_wp| default_wp.find("leg", ns))
        {
            Some(leg) => Some(parse_leg(leg)?),
            None => None,
        };

        for element in list.find_all("waypoint", ns) {
            if let Some(waypoint) = parse_waypoint(element, ns, default_leg.as_ref())? {
                waypoints.push(waypoint);
            }
        }
    }

    let schedules = match root.find("schedules", ns) {
        Some(list) => parse_schedules(list, ns)?,
        None => Vec::new(),
    };

    apply_schedule_etas(&mut waypoints, &schedules);
    let total_distance_nm = apply_leg_distances(&mut waypoints);

    Ok(RouteDocument {
        rtz_version,
        route_info,
        waypoint_count: waypoints.len(),
        waypoints,
        schedules,
        total_distance_nm,
    })
}

fn parse_route_info(element: &XmlElement) -> RouteInfo {
    let text = |key: &str| element.attr(key).unwrap_or_default().to_string();
    RouteInfo {
        route_name: text("routeName"),
        route_author: text("routeAuthor"),
        route_status: text("routeStatus"),
        vessel_name: text("vesselName"),
        vessel_mmsi: text("vesselMMSI"),
        vessel_imo: text("vesselIMO"),
        vessel_voyage: text("vesselVoyage"),
        validity_period_start: text("validityPeriodStart"),
        validity_period_stop: text("validityPeriodStop"),
    }
}

fn parse_leg(element: &XmlElement) -> Result<LegConstraints, RtzError> {
    let defaults = LegConstraints::default();
    Ok(LegConstraints {
        speed_max: element.number("speedMax", defaults.speed_max)?,
        portside_xtd: element.number("portsideXTD", defaults.portside_xtd)?,
        starboard_xtd: element.number("starboardXTD", defaults.starboard_xtd)?,
        geometry_type: element
            .attr("geometryType")
            .map(str::to_string)
            .unwrap_or(defaults.geometry_type),
    })
}

/// Returns `None` for waypoints without a `<position>`.
fn parse_waypoint(
    element: &XmlElement,
    ns: &str,
    default_leg: Option<&LegConstraints>,
) -> Result<Option<Waypoint>, RtzError> {
    let Some(position) = element.find("position", ns) else {
        return Ok(None);
    };

    let lat = position.number("lat", 0.0)?;
    let lon = position.number("lon", 0.0)?;

    let constraints = match element.find("leg", ns) {
        Some(leg) => Some(parse_leg(leg)?),
        None => default_leg.cloned(),
    };

    let name = match element.attr("name") {
        Some(name) => name.to_string(),
        None => format!("WP_{}", element.attr("id").unwrap_or("?")),
    };

    Ok(Some(Waypoint {
        id: element.number("id", 0)?,
        revision: element.number("revision", 0)?,
        name,
        lat,
        lon,
        leg: constraints.map(Leg::with_constraints),
        eta: None,
        leg_distance_nm: 0.0,
    }))
}

fn parse_schedules(element: &XmlElement, ns: &str) -> Result<Vec<Schedule>, RtzError> {
    element
        .find_all("schedule", ns)
        .into_iter()
        .map(|schedule| -> Result<Schedule, RtzError> {
            let elements = match schedule.find("calculated", ns) {
                Some(calculated) => calculated
                    .find_all("scheduleElement", ns)
                    .into_iter()
                    .map(|entry| -> Result<ScheduleElement, RtzError> {
                        Ok(ScheduleElement {
                            waypoint_id: entry.number("waypointId", 0)?,
                            eta: entry.attr("eta").unwrap_or_default().to_string(),
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?,
                None => Vec::new(),
            };

            Ok(Schedule {
                id: schedule.attr("id").unwrap_or_default().to_string(),
                name: schedule.attr("name").unwrap_or_default().to_string(),
                elements,
            })
        })
        .collect()
}

/// Stamp waypoint ETAs from every schedule. When several entries name the
/// same waypoint the last one processed wins.
fn apply_schedule_etas(waypoints: &mut [Waypoint], schedules: &[Schedule]) {
    let mut etas: HashMap<i64, &str> = HashMap::new();
    for element in schedules.iter().flat_map(|schedule| &schedule.elements) {
        etas.insert(element.waypoint_id, element.eta.as_str());
    }

    for waypoint in waypoints.iter_mut() {
        waypoint.eta = etas
            .get(&waypoint.id)
            .filter(|eta| !eta.is_empty())
            .map(|eta| eta.to_string());
    }
}

/// Fill per-leg distances (rounded) and return the route total.
///
/// The total sums unrounded legs and is rounded once, so it need not equal
/// the sum of the rounded per-leg values.
fn apply_leg_distances(waypoints: &mut [Waypoint]) -> f64 {
    let mut total = 0.0;
    for i in 1..waypoints.len() {
        let (prev, curr) = (&waypoints[i - 1], &waypoints[i]);
        let distance = haversine_nm(prev.lat, prev.lon, curr.lat, curr.lon);
        total += distance;
        waypoints[i].leg_distance_nm = round_to_tenth(distance);
    }
    if let Some(first) = waypoints.first_mut() {
        first.leg_distance_nm = 0.0;
    }
    round_to_tenth(total)
}

// ========== MINIMAL ELEMENT TREE ==========

#[derive(Debug)]
struct XmlElement {
    namespace: Option<String>,
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<XmlElement>,
}

impl XmlElement {
    fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    fn number<T: FromStr>(&self, key: &str, default: T) -> Result<T, RtzError> {
        match self.attr(key) {
            None => Ok(default),
            Some(raw) => raw.trim().parse().map_err(|_| RtzError::InvalidNumber {
                element: self.name.clone(),
                attribute: key.to_string(),
                value: raw.to_string(),
            }),
        }
    }

    fn is(&self, tag: &str, ns: Option<&str>) -> bool {
        self.name == tag && self.namespace.as_deref() == ns
    }

    /// First direct child named `tag`, namespaced form preferred.
    fn find(&self, tag: &str, ns: &str) -> Option<&XmlElement> {
        self.children
            .iter()
            .find(|child| child.is(tag, Some(ns)))
            .or_else(|| self.children.iter().find(|child| child.is(tag, None)))
    }

    /// All direct children named `tag` in the document namespace, or the
    /// un-namespaced ones when there are none.
    fn find_all(&self, tag: &str, ns: &str) -> Vec<&XmlElement> {
        let bound: Vec<&XmlElement> = self
            .children
            .iter()
            .filter(|child| child.is(tag, Some(ns)))
            .collect();
        if !bound.is_empty() {
            return bound;
        }
        self.children
            .iter()
            .filter(|child| child.is(tag, None))
            .collect()
    }
}

fn read_tree(xml: &str) -> Result<XmlElement, RtzError> {
    let mut reader = NsReader::from_str(xml);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let (resolved, event) = reader.read_resolved_event()?;
        match event {
            Event::Start(start) => {
                if stack.is_empty() && root.is_some() {
                    return Err(RtzError::TrailingContent);
                }
                stack.push(open_element(resolved, &start)?);
            }
            Event::Empty(start) => {
                let element = open_element(resolved, &start)?;
                close_element(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                // quick-xml rejects unmatched end tags before we get here.
                if let Some(element) = stack.pop() {
                    close_element(&mut stack, &mut root, element)?;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.pop() {
        return Err(RtzError::Unclosed(open.name));
    }
    root.ok_or(RtzError::MissingRoot)
}

fn open_element(resolved: ResolveResult<'_>, start: &BytesStart<'_>) -> Result<XmlElement, RtzError> {
    let namespace = match resolved {
        ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.0).into_owned()),
        ResolveResult::Unbound => None,
        ResolveResult::Unknown(prefix) => {
            return Err(RtzError::UnboundPrefix(
                String::from_utf8_lossy(&prefix).into_owned(),
            ))
        }
    };

    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr?;
        let key = attr.key.as_ref();
        if key == b"xmlns" || key.starts_with(b"xmlns:") {
            continue;
        }
        let value = attr.unescape_value()?.into_owned();
        attributes.push((String::from_utf8_lossy(key).into_owned(), value));
    }

    Ok(XmlElement {
        namespace,
        name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
        attributes,
        children: Vec::new(),
    })
}

fn close_element(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<(), RtzError> {
    match stack.last_mut() {
        Some(_) if element.name == EXTENSIONS_TAG => Ok(()),
        Some(parent) => {
            parent.children.push(element);
            Ok(())
        }
        None if root.is_some() => Err(RtzError::TrailingContent),
        None => {
            *root = Some(element);
            Ok(())
        }
    }
}
