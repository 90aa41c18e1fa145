pub mod advisory;
pub mod analysis;
pub mod error;
pub mod hotspot;
pub mod models;
pub mod pipeline;
pub mod rtz;
pub mod spatial;
pub mod summary;

pub use advisory::{
    display_eta, generate_advisories, match_peak_window, parse_eta, Advisory, AdvisoryConfig,
    AdvisoryGenerator, AdvisoryType, LegEndpoint, PeakWindow, StructuredData, TrafficDensity,
    TransmissionStatus,
};
pub use analysis::analyze_route;
pub use error::{CatalogueError, GeometryError, RtzError};
pub use hotspot::{
    filter_by_bounding_box, CatalogueMetadata, HotspotCatalogue, HotspotMetadata, HotspotType,
    HotspotZone, JsonFileCatalogue, StaticCatalogue,
};
pub use models::{
    Leg, LegConstraints, RiskAssessment, RouteDocument, RouteInfo, Schedule, ScheduleElement,
    Severity, Waypoint,
};
pub use pipeline::{analyze, RouteAnalysis};
pub use rtz::{namespace_for_version, parse_rtz, RTZ_NAMESPACE_1_1, RTZ_NAMESPACE_1_2};
pub use spatial::{haversine_nm, round_to_tenth, BoundingBox, Footprint};
pub use summary::{summarize, RiskyLeg, RouteRiskSummary};
