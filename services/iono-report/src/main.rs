//! Height-integration report.
//!
//! Builds (or loads) a thermosphere run, regrids the requested field onto a
//! uniform altitude grid and prints, as JSON, its volume total over a
//! latitude/longitude box for every timestep:
//! - Engine settings come from `IONO_*` environment variables, overridable
//!   on the command line
//! - Heating rates are reported in W and GW

mod report;
mod synthetic;

use anyhow::{Context, Result};
use clap::Parser;
use iono_grid::{
    AxisKind, EngineConfig, FieldId, GridGeometry, IntegrationBounds, ModelDataProvider,
    NonFinitePolicy, QuadratureRule, ReductionOrder, Regridder, TargetAltitudes,
    VolumeIntegrator,
};
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use report::{
    index_range, AltitudeSummary, ConfigSummary, Region, Report, TimestepTotal, WATTS_PER_GW,
};
use synthetic::SyntheticGrid;

#[derive(Parser, Debug)]
#[command(name = "iono-report")]
#[command(about = "Regrid a thermosphere run and report height-integrated totals")]
struct Args {
    /// Field to integrate (e.g. qjoule, ne, tn)
    #[arg(short, long, default_value = "qjoule")]
    field: FieldId,

    /// Lowest target altitude (km)
    #[arg(long, default_value = "100")]
    alt_min: f64,

    /// Highest target altitude (km)
    #[arg(long, default_value = "400")]
    alt_max: f64,

    /// Target altitude spacing (km)
    #[arg(long, default_value = "5")]
    alt_step: f64,

    /// Southern edge of the box (degrees)
    #[arg(long, default_value = "50", allow_hyphen_values = true)]
    lat_min: f64,

    /// Northern edge of the box (degrees)
    #[arg(long, default_value = "90", allow_hyphen_values = true)]
    lat_max: f64,

    /// Western edge of the box (degrees). The box spans grid samples, so on a
    /// global grid the seam cell from the last longitude back to the first is
    /// not included.
    #[arg(long, default_value = "-180", allow_hyphen_values = true)]
    lon_min: f64,

    /// Eastern edge of the box (degrees)
    #[arg(long, default_value = "180", allow_hyphen_values = true)]
    lon_max: f64,

    /// Number of timesteps in the synthetic run
    #[arg(long, default_value = "4")]
    timesteps: usize,

    /// Horizontal resolution of the synthetic run (degrees)
    #[arg(long, default_value = "5")]
    resolution: f64,

    /// Quadrature rule (trapezoid, legacy)
    #[arg(long)]
    quadrature: Option<String>,

    /// Non-finite sample policy (reject, mask)
    #[arg(long)]
    non_finite: Option<String>,

    /// Horizontal reduction order (lon_then_lat, lat_then_lon)
    #[arg(long)]
    reduction_order: Option<String>,

    /// Pretty-print the JSON report
    #[arg(long)]
    pretty: bool,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize tracing; logs go to stderr so stdout stays valid JSON
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = EngineConfig::from_env();
    if let Some(rule) = &args.quadrature {
        config.quadrature = QuadratureRule::from_str(rule);
    }
    if let Some(policy) = &args.non_finite {
        config.non_finite = NonFinitePolicy::from_str(policy);
    }
    if let Some(order) = &args.reduction_order {
        config.reduction_order = ReductionOrder::from_str(order);
    }
    config.validate()?;

    info!(
        field = %args.field,
        quadrature = %config.quadrature,
        non_finite = %config.non_finite,
        reduction_order = %config.reduction_order,
        "Starting height-integration report"
    );

    let provider = synthetic::build_provider(SyntheticGrid {
        timesteps: args.timesteps,
        resolution_deg: args.resolution,
        interval_s: 3600.0,
    })
    .context("failed to build synthetic run")?;

    let targets = TargetAltitudes::new(args.alt_min, args.alt_max, args.alt_step)?;
    let times = provider.read_axis(AxisKind::Time)?;
    let lat = provider.read_axis(AxisKind::Lat)?;
    let lon = provider.read_axis(AxisKind::Lon)?;
    let time_indices: Vec<usize> = (0..times.len()).collect();
    debug!(
        timesteps = times.len(),
        lat_step = ?lat.uniform_step(1e-9),
        lon_step = ?lon.uniform_step(1e-9),
        "Loaded model grid"
    );

    let regridder = Regridder::new(config.clone())?;
    let regridded = regridder
        .regrid_provider(&provider, &[args.field], &targets, &time_indices)
        .context("regrid failed")?;
    let data = regridded
        .field(args.field)
        .context("regridded field missing from output")?;
    let heights = regridded.height_field();

    let (lat_min, lat_max) = index_range(&lat, args.lat_min, args.lat_max)?;
    let (lon_min, lon_max) = index_range(&lon, args.lon_min, args.lon_max)?;
    let bounds = IntegrationBounds::new(lat_min, lat_max, lon_min, lon_max, 0, targets.len() - 1);
    info!(
        lat_from = lat.values()[lat_min],
        lat_to = lat.values()[lat_max],
        lon_from = lon.values()[lon_min],
        lon_to = lon.values()[lon_max],
        "Integration box snapped to grid samples"
    );

    let integrator = VolumeIntegrator::new(config.clone())?;
    let geometry = GridGeometry::new(heights.view(), &lat, &lon)?;
    let totals = integrator.integrate_volume_series(args.field, data.view(), &geometry, &bounds)?;

    let mut timesteps = Vec::with_capacity(time_indices.len());
    for (t, &total) in totals.value.iter().enumerate() {
        let map = integrator.vertical_map(args.field, data.view(), heights.view(), t, &bounds)?;
        let peak_column = map.value.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let total_gw = (totals.units.symbol == "W").then(|| total / WATTS_PER_GW);
        info!(t, total, "Timestep integrated");
        timesteps.push(TimestepTotal {
            time_s: times.values()[t],
            total,
            units: totals.units,
            total_gw,
            peak_column,
            peak_column_units: map.units,
        });
    }

    let values = targets.values();
    let report = Report {
        field: args.field,
        config: ConfigSummary {
            quadrature: config.quadrature.to_string(),
            non_finite: config.non_finite.to_string(),
            reduction_order: config.reduction_order.to_string(),
            earth_radius_km: config.earth_radius_km,
        },
        altitude_km: AltitudeSummary {
            min: values[0],
            max: values[values.len() - 1],
            levels: values.len(),
        },
        region: Region {
            lat: (lat.values()[lat_min], lat.values()[lat_max]),
            lon: (lon.values()[lon_min], lon.values()[lon_max]),
            lat_indices: (lat_min, lat_max),
            lon_indices: (lon_min, lon_max),
        },
        timesteps,
        extrapolated_cells: regridded.extrapolated_cells,
    };

    let json = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");

    Ok(())
}
