//! CLI tool to run hotspot risk analysis over an RTZ route.
//!
//! Prints the annotated route, advisories and risk summary as JSON.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use mass_core::{analyze, parse_rtz, AdvisoryConfig, HotspotCatalogue, JsonFileCatalogue};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Analyse an RTZ route against a hotspot catalogue
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// RTZ route file
    #[arg(long)]
    rtz: PathBuf,

    /// Hotspot catalogue JSON file
    #[arg(long, default_value = "data/hotspots.json")]
    hotspots: PathBuf,

    /// Date stamped into advisory ids (YYYY-MM-DD)
    #[arg(long)]
    reference_date: Option<NaiveDate>,

    /// Only consider hotspots inside the route's bounding box
    #[arg(long)]
    clip: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("analyze_route=info".parse()?))
        .init();

    let args = Args::parse();

    let xml = std::fs::read_to_string(&args.rtz)
        .with_context(|| format!("failed to read {}", args.rtz.display()))?;
    let route = parse_rtz(&xml).with_context(|| format!("failed to parse {}", args.rtz.display()))?;

    let catalogue = JsonFileCatalogue::new(&args.hotspots);
    let bbox = if args.clip { route.bounding_box() } else { None };
    let zones = catalogue.list_zones(bbox.as_ref())?;

    let mut config = AdvisoryConfig::default();
    if let Some(date) = args.reference_date {
        config.reference_date = date;
    }

    let analysis = analyze(&route, &zones, &config);
    tracing::info!(
        "{}: {} waypoints, {} hotspots checked, overall risk {}, {} advisories",
        route.route_info.route_name,
        route.waypoint_count,
        zones.len(),
        analysis.risk_summary.overall_risk,
        analysis.advisories.len()
    );

    let output = if args.pretty {
        serde_json::to_string_pretty(&analysis)?
    } else {
        serde_json::to_string(&analysis)?
    };
    println!("{output}");

    Ok(())
}
