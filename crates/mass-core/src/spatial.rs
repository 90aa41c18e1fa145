//! Spatial math for leg distances and hotspot footprint intersection.

use geo::{coord, Intersects, Line, LineString, MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GeometryError;

/// Mean Earth radius in nautical miles.
pub const EARTH_RADIUS_NM: f64 = 3440.065;

/// Great-circle distance between two points in nautical miles (haversine).
///
/// # Arguments
/// * `lat1`, `lon1` - First point in decimal degrees
/// * `lat2`, `lon2` - Second point in decimal degrees
pub fn haversine_nm(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_NM * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Round to one decimal place, the precision of every reported distance.
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Inclusive latitude/longitude box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        }
    }

    /// Smallest box covering `(lat, lon)` positions, `None` when empty.
    pub fn from_positions(positions: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        positions.into_iter().fold(None, |acc, (lat, lon)| {
            Some(match acc {
                None => Self::new(lat, lon, lat, lon),
                Some(bbox) => Self::new(
                    bbox.min_lat.min(lat),
                    bbox.min_lon.min(lon),
                    bbox.max_lat.max(lat),
                    bbox.max_lon.max(lon),
                ),
            })
        })
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&lat) && (self.min_lon..=self.max_lon).contains(&lon)
    }
}

/// Planar footprint of a hotspot zone in (lon, lat) space.
#[derive(Debug, Clone, PartialEq)]
pub struct Footprint {
    shape: MultiPolygon<f64>,
}

impl Footprint {
    /// Build a footprint from a GeoJSON `Polygon` or `MultiPolygon` geometry.
    pub fn from_geojson(geometry: &Value) -> Result<Self, GeometryError> {
        let geometry: geojson::Geometry = serde_json::from_value(geometry.clone())
            .map_err(|err| GeometryError::NotGeoJson(err.to_string()))?;

        let polygons = match &geometry.value {
            geojson::Value::Polygon(rings) => vec![polygon_from_rings(rings)?],
            geojson::Value::MultiPolygon(polygons) => polygons
                .iter()
                .map(|rings| polygon_from_rings(rings))
                .collect::<Result<Vec<_>, _>>()?,
            other => return Err(GeometryError::Unsupported(geometry_kind(other).to_string())),
        };

        if polygons.is_empty() {
            return Err(GeometryError::EmptyPolygon);
        }

        Ok(Self {
            shape: MultiPolygon::new(polygons),
        })
    }

    /// True if the straight segment between two waypoints touches the footprint.
    pub fn intersects_leg(&self, from_lat: f64, from_lon: f64, to_lat: f64, to_lon: f64) -> bool {
        let leg = Line::new(
            coord! { x: from_lon, y: from_lat },
            coord! { x: to_lon, y: to_lat },
        );
        self.shape.intersects(&leg)
    }

    /// Exterior ring of the first polygon as `(lat, lon)` pairs.
    pub fn outline(&self) -> Vec<(f64, f64)> {
        self.shape
            .0
            .first()
            .map(|polygon| polygon.exterior().coords().map(|c| (c.y, c.x)).collect())
            .unwrap_or_default()
    }
}

fn polygon_from_rings(rings: &[Vec<Vec<f64>>]) -> Result<Polygon<f64>, GeometryError> {
    let (exterior, interiors) = rings.split_first().ok_or(GeometryError::EmptyPolygon)?;
    let exterior = ring_from_positions(exterior)?;
    let interiors = interiors
        .iter()
        .map(|ring| ring_from_positions(ring))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn ring_from_positions(positions: &[Vec<f64>]) -> Result<LineString<f64>, GeometryError> {
    if positions.len() < 3 {
        return Err(GeometryError::ShortRing(positions.len()));
    }

    let coords = positions
        .iter()
        .map(|position| match (position.first(), position.get(1)) {
            (Some(&x), Some(&y)) if x.is_finite() && y.is_finite() => Ok(coord! { x: x, y: y }),
            (Some(_), Some(_)) => Err(GeometryError::NonFinite),
            _ => Err(GeometryError::ShortPosition),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(LineString::new(coords))
}

fn geometry_kind(value: &geojson::Value) -> &'static str {
    match value {
        geojson::Value::Point(_) => "Point",
        geojson::Value::MultiPoint(_) => "MultiPoint",
        geojson::Value::LineString(_) => "LineString",
        geojson::Value::MultiLineString(_) => "MultiLineString",
        geojson::Value::Polygon(_) => "Polygon",
        geojson::Value::MultiPolygon(_) => "MultiPolygon",
        geojson::Value::GeometryCollection(_) => "GeometryCollection",
    }
}
