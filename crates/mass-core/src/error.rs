//! Error types for the route analysis core.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to read an RTZ route document.
#[derive(Debug, Error)]
pub enum RtzError {
    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("malformed XML attribute: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),
    #[error("document has no root element")]
    MissingRoot,
    #[error("unexpected content after the root element")]
    TrailingContent,
    #[error("element <{0}> is never closed")]
    Unclosed(String),
    #[error("namespace prefix '{0}' is not declared")]
    UnboundPrefix(String),
    #[error("attribute '{attribute}' on <{element}> is not a number: '{value}'")]
    InvalidNumber {
        element: String,
        attribute: String,
        value: String,
    },
}

/// A hotspot footprint that cannot be turned into a polygon.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("footprint is not a GeoJSON geometry: {0}")]
    NotGeoJson(String),
    #[error("unsupported footprint geometry type '{0}'")]
    Unsupported(String),
    #[error("polygon has no rings")]
    EmptyPolygon,
    #[error("ring has {0} positions, at least 3 are required")]
    ShortRing(usize),
    #[error("position has fewer than two ordinates")]
    ShortPosition,
    #[error("position has a non-finite ordinate")]
    NonFinite,
}

/// Failure to read a hotspot catalogue.
#[derive(Debug, Error)]
pub enum CatalogueError {
    #[error("failed to read hotspot catalogue {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid hotspot catalogue: {0}")]
    Json(#[from] serde_json::Error),
}
