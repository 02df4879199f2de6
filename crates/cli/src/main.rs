//! POZAR CLI - forest-fire susceptibility mapping

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use pozar_algorithms::algebra::{raster_calculator, CalculatorParams};
use pozar_algorithms::classify::{
    reclassify, ClassBreak, MissingPolicy, RangeBoundaries, ReclassifyParams,
};
use pozar_algorithms::conversion::{rasterize, RasterizeParams};
use pozar_core::io::{read_geojson, read_geotiff, write_geotiff};
use pozar_core::raster::{Extent, Raster};
use pozar_pipeline::{run_to_files, Feedback, Stage, SusceptibilityInputs, SusceptibilityParams};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "pozar")]
#[command(author, version, about = "Forest-fire susceptibility mapping", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a raster file
    Info {
        /// Input raster file
        input: PathBuf,
    },
    /// Burn a GeoJSON layer into a raster
    Rasterize {
        /// Input vector file (GeoJSON)
        input: PathBuf,
        /// Output raster file
        output: PathBuf,
        /// Attribute supplying burn values
        #[arg(short, long)]
        field: Option<String>,
        /// Fixed burn value when no field (or the attribute is missing)
        #[arg(short, long, default_value = "0")]
        burn: f64,
        /// Output cell size
        #[arg(short, long, default_value = "25")]
        cell_size: f64,
        /// Nodata marker for the output
        #[arg(short, long, default_value = "-9999", allow_hyphen_values = true)]
        nodata: f64,
        /// Output extent as minx,miny,maxx,maxy (defaults to layer bounds)
        #[arg(short, long)]
        extent: Option<String>,
    },
    /// Reclassify a raster through a break table
    Reclassify {
        /// Input raster file
        input: PathBuf,
        /// Output raster file
        output: PathBuf,
        /// Flat break table: min,max,class triples (e.g. 0,5,1,5,10,2)
        #[arg(short, long)]
        table: String,
        /// Boundary rule: max-ex, min-ex, inclusive, exclusive
        #[arg(long, default_value = "max-ex")]
        boundaries: String,
        /// Map unmatched values to nodata instead of passing them through
        #[arg(long)]
        missing_nodata: bool,
    },
    /// Evaluate a formula over named grids
    Calc {
        /// Output raster file
        output: PathBuf,
        /// Formula referencing grid names (e.g. "7*vt + 5*(dr + ds)")
        #[arg(short, long)]
        formula: String,
        /// Input grid as NAME=PATH (repeatable)
        #[arg(short = 'g', long = "grid", value_name = "NAME=PATH")]
        grids: Vec<String>,
    },
    /// Run the full susceptibility pipeline
    Susceptibility {
        /// Slope raster
        #[arg(long)]
        slope: PathBuf,
        /// Aspect raster (degrees clockwise from north)
        #[arg(long)]
        aspect: PathBuf,
        /// Distance-to-roads categories (GeoJSON)
        #[arg(long)]
        roads: PathBuf,
        /// Distance-to-settlements categories (GeoJSON)
        #[arg(long)]
        settlements: PathBuf,
        /// Vegetation-type categories (GeoJSON)
        #[arg(long)]
        vegetation: PathBuf,
        /// Output path for the continuous index
        #[arg(long)]
        index: PathBuf,
        /// Output path for the 4-class susceptibility raster
        #[arg(long)]
        classes: PathBuf,
        /// Attribute read from the vector layers
        #[arg(long, default_value = "Vrednost")]
        field: String,
        /// Rasterization cell size
        #[arg(long, default_value = "25")]
        cell_size: f64,
        /// Shared grid extent as minx,miny,maxx,maxy
        #[arg(long)]
        extent: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Info { input } => cmd_info(&input),
        Commands::Rasterize {
            input,
            output,
            field,
            burn,
            cell_size,
            nodata,
            extent,
        } => cmd_rasterize(&input, &output, field, burn, cell_size, nodata, extent),
        Commands::Reclassify {
            input,
            output,
            table,
            boundaries,
            missing_nodata,
        } => cmd_reclassify(&input, &output, &table, &boundaries, missing_nodata),
        Commands::Calc {
            output,
            formula,
            grids,
        } => cmd_calc(&output, &formula, &grids),
        Commands::Susceptibility {
            slope,
            aspect,
            roads,
            settlements,
            vegetation,
            index,
            classes,
            field,
            cell_size,
            extent,
        } => cmd_susceptibility(
            &slope,
            &aspect,
            &roads,
            &settlements,
            &vegetation,
            &index,
            &classes,
            field,
            cell_size,
            extent,
        ),
    }
}

// ─── Commands ───────────────────────────────────────────────────────────

fn cmd_info(input: &PathBuf) -> Result<()> {
    let raster: Raster<f64> = read_geotiff(input)
        .with_context(|| format!("cannot read {}", input.display()))?;

    let (min_x, min_y, max_x, max_y) = raster.bounds();
    let stats = raster.statistics();

    println!("{}", input.display());
    println!("  size:      {} x {} cells", raster.cols(), raster.rows());
    println!("  cell size: {}", raster.cell_size());
    println!(
        "  bounds:    ({}, {}) - ({}, {})",
        min_x, min_y, max_x, max_y
    );
    match raster.nodata() {
        Some(nd) => println!("  nodata:    {}", nd),
        None => println!("  nodata:    not set"),
    }
    println!(
        "  values:    min {:?}, max {:?}, mean {:?} ({} valid, {} nodata)",
        stats.min, stats.max, stats.mean, stats.valid_count, stats.nodata_count
    );

    Ok(())
}

fn cmd_rasterize(
    input: &PathBuf,
    output: &PathBuf,
    field: Option<String>,
    burn: f64,
    cell_size: f64,
    nodata: f64,
    extent: Option<String>,
) -> Result<()> {
    let start = Instant::now();

    let features = read_geojson(input)
        .with_context(|| format!("cannot read {}", input.display()))?;
    info!("loaded {} features", features.len());

    let params = RasterizeParams {
        field,
        burn,
        cell_size,
        nodata,
        extent: extent.as_deref().map(parse_extent).transpose()?,
    };
    let grid = rasterize(&features, &params)?;

    write_geotiff(&grid, output)
        .with_context(|| format!("cannot write {}", output.display()))?;
    info!(
        "rasterized to {} ({}x{}) in {:.2}s",
        output.display(),
        grid.cols(),
        grid.rows(),
        start.elapsed().as_secs_f64()
    );

    Ok(())
}

fn cmd_reclassify(
    input: &PathBuf,
    output: &PathBuf,
    table: &str,
    boundaries: &str,
    missing_nodata: bool,
) -> Result<()> {
    let start = Instant::now();

    let raster: Raster<f64> = read_geotiff(input)
        .with_context(|| format!("cannot read {}", input.display()))?;

    let params = ReclassifyParams {
        table: parse_table(table)?,
        boundaries: parse_boundaries(boundaries)?,
        missing: if missing_nodata {
            MissingPolicy::Nodata
        } else {
            MissingPolicy::PassThrough
        },
    };
    let result = reclassify(&raster, &params)?;

    write_geotiff(&result, output)
        .with_context(|| format!("cannot write {}", output.display()))?;
    info!(
        "reclassified {} cells in {:.2}s",
        result.len(),
        start.elapsed().as_secs_f64()
    );

    Ok(())
}

fn cmd_calc(output: &PathBuf, formula: &str, grid_specs: &[String]) -> Result<()> {
    let start = Instant::now();

    let mut grids: Vec<(String, Raster<f64>)> = Vec::with_capacity(grid_specs.len());
    for spec in grid_specs {
        let (name, path) = spec
            .split_once('=')
            .with_context(|| format!("grid spec '{}' is not NAME=PATH", spec))?;
        let raster =
            read_geotiff(path).with_context(|| format!("cannot read {}", path))?;
        grids.push((name.to_string(), raster));
    }

    let refs: Vec<(&str, &Raster<f64>)> = grids
        .iter()
        .map(|(name, raster)| (name.as_str(), raster))
        .collect();
    let result = raster_calculator(formula, &refs, &CalculatorParams::default())?;

    write_geotiff(&result, output)
        .with_context(|| format!("cannot write {}", output.display()))?;
    info!(
        "evaluated '{}' over {} grids in {:.2}s",
        formula,
        refs.len(),
        start.elapsed().as_secs_f64()
    );

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_susceptibility(
    slope: &PathBuf,
    aspect: &PathBuf,
    roads: &PathBuf,
    settlements: &PathBuf,
    vegetation: &PathBuf,
    index: &PathBuf,
    classes: &PathBuf,
    field: String,
    cell_size: f64,
    extent: Option<String>,
) -> Result<()> {
    let start = Instant::now();

    let inputs = SusceptibilityInputs {
        slope: read_geotiff(slope)
            .with_context(|| format!("cannot read {}", slope.display()))?,
        aspect: read_geotiff(aspect)
            .with_context(|| format!("cannot read {}", aspect.display()))?,
        roads: read_geojson(roads)
            .with_context(|| format!("cannot read {}", roads.display()))?,
        settlements: read_geojson(settlements)
            .with_context(|| format!("cannot read {}", settlements.display()))?,
        vegetation: read_geojson(vegetation)
            .with_context(|| format!("cannot read {}", vegetation.display()))?,
    };
    let params = SusceptibilityParams {
        field,
        cell_size,
        extent: extent.as_deref().map(parse_extent).transpose()?,
        ..Default::default()
    };

    let feedback = BarFeedback::new();
    let result = run_to_files(&inputs, &params, &feedback, index, classes)?;
    feedback.bar.finish_and_clear();

    match result {
        Some(output) => {
            let stats = output.index.statistics();
            info!(
                "susceptibility computed in {:.2}s (index min {:?}, max {:?})",
                start.elapsed().as_secs_f64(),
                stats.min,
                stats.max
            );
            println!("RC index:        {}", index.display());
            println!("Susceptibility:  {}", classes.display());
        }
        None => println!("Run canceled, no outputs written."),
    }

    Ok(())
}

// ─── Helpers ────────────────────────────────────────────────────────────

/// Progress bar advancing once per completed pipeline stage
struct BarFeedback {
    bar: ProgressBar,
}

impl BarFeedback {
    fn new() -> Self {
        let bar = ProgressBar::new(Stage::COUNT as u64);
        bar.set_style(
            ProgressStyle::with_template("{bar:30} {pos}/{len} {msg}")
                .expect("static template"),
        );
        Self { bar }
    }
}

impl Feedback for BarFeedback {
    fn advance(&self, completed: Stage) {
        self.bar.set_message(completed.to_string());
        self.bar.inc(1);
    }
}

fn parse_extent(text: &str) -> Result<Extent> {
    let parts: Vec<f64> = text
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .with_context(|| format!("invalid extent '{}'", text))?;
    if parts.len() != 4 {
        bail!("extent must be minx,miny,maxx,maxy");
    }
    Ok(Extent::new(parts[0], parts[1], parts[2], parts[3]))
}

fn parse_table(text: &str) -> Result<Vec<ClassBreak>> {
    let values: Vec<f64> = text
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .with_context(|| format!("invalid table '{}'", text))?;
    if values.is_empty() || values.len() % 3 != 0 {
        bail!("table must be a flat list of min,max,class triples");
    }

    Ok(values
        .chunks(3)
        .map(|c| ClassBreak::new(c[0], c[1], c[2]))
        .collect())
}

fn parse_boundaries(text: &str) -> Result<RangeBoundaries> {
    Ok(match text {
        "max-ex" => RangeBoundaries::MinInMaxEx,
        "min-ex" => RangeBoundaries::MinExMaxIn,
        "inclusive" => RangeBoundaries::Inclusive,
        "exclusive" => RangeBoundaries::Exclusive,
        other => bail!("unknown boundary rule '{}'", other),
    })
}
