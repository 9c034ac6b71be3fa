//! lakeflat CLI - Flatten DEMs over lakes

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use lakeflat_algorithms::hydrology::{fill_sinks, FillSinksParams};
use lakeflat_algorithms::statistics::raster_statistics;
use lakeflat_algorithms::vector::split_by_field;
use lakeflat_core::io::{read_features, read_geotiff_typed, write_features, write_geotiff, GeoTiffOptions};
use lakeflat_core::raster::PixelType;
use lakeflat_pipeline::{ElevationPolicy, FlattenParams, Pipeline};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "lakeflat")]
#[command(author, version, about = "Flatten DEMs over lake polygons", long_about = None)]
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
    /// Replace the DEM inside every lake by one elevation per lake
    Flatten {
        /// Input DEM (GeoTIFF)
        #[arg(long)]
        dem: PathBuf,
        /// Lake polygons (GeoJSON)
        #[arg(long)]
        lakes: PathBuf,
        /// Area of interest polygons (GeoJSON)
        #[arg(long)]
        aoi: PathBuf,
        /// Directory for the timestamped working directory
        #[arg(long, default_value = ".")]
        workdir: PathBuf,
        /// Output GeoTIFF
        #[arg(short, long)]
        output: PathBuf,
        /// Lake elevation: interior-mean, boundary-mean, fixed
        #[arg(short, long, default_value = "interior-mean")]
        policy: String,
        /// Attribute identifying lakes (default: one lake per feature)
        #[arg(short, long)]
        field: Option<String>,
        /// Elevation for the fixed policy
        #[arg(short, long)]
        elevation: Option<f64>,
        /// Output pixel type: byte, uint16, int16, uint32, int32, float32, float64
        /// (default: the input DEM's type)
        #[arg(long)]
        pixel_type: Option<String>,
        /// Minimum slope between cells when filling sinks, in degrees
        #[arg(long, default_value = "0.01")]
        min_slope: f64,
        /// Do not fill sinks before estimating lake elevations
        #[arg(long)]
        no_fill: bool,
        /// Remove the working directory after a successful run
        #[arg(long)]
        purge: bool,
    },
    /// Fill sinks (Planchon-Darboux)
    FillSinks {
        /// Input DEM file
        input: PathBuf,
        /// Output file
        output: PathBuf,
        /// Minimum slope between cells, in degrees
        #[arg(long, default_value = "0.01")]
        min_slope: f64,
        /// Output pixel type (default: the input's type)
        #[arg(long)]
        pixel_type: Option<String>,
    },
    /// Split a lake layer into one GeoJSON file per lake
    SplitLakes {
        /// Lake polygons (GeoJSON)
        lakes: PathBuf,
        /// Output directory
        out_dir: PathBuf,
        /// Attribute identifying lakes (default: one lake per feature)
        #[arg(short, long)]
        field: Option<String>,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Logging already initialised");
    }
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn read_dem(path: &PathBuf) -> Result<(lakeflat_core::Raster<f64>, PixelType)> {
    let pb = spinner("Reading raster...");
    let (raster, pixel_type) = read_geotiff_typed::<f64, _>(path)
        .with_context(|| format!("Failed to read raster {}", path.display()))?;
    pb.finish_and_clear();
    info!("Input: {} x {} ({})", raster.cols(), raster.rows(), pixel_type);
    Ok((raster, pixel_type))
}

fn write_result(raster: &lakeflat_core::Raster<f64>, path: &PathBuf, pixel_type: PixelType) -> Result<()> {
    let pb = spinner("Writing output...");
    write_geotiff(raster, path, Some(GeoTiffOptions { pixel_type })).context("Failed to write output")?;
    pb.finish_and_clear();
    Ok(())
}

fn done(name: &str, path: &PathBuf, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

fn parse_policy(policy: &str, elevation: Option<f64>) -> Result<ElevationPolicy> {
    let parsed = match policy.to_lowercase().as_str() {
        "interior-mean" | "interior" | "mean" => ElevationPolicy::InteriorMean,
        "boundary-mean" | "boundary" => ElevationPolicy::BoundaryMean,
        "fixed" => {
            let value = elevation.context("--elevation is required with the fixed policy")?;
            ElevationPolicy::Fixed(value)
        }
        _ => anyhow::bail!(
            "Unknown policy: {}. Use interior-mean, boundary-mean, or fixed.",
            policy
        ),
    };
    if elevation.is_some() && !matches!(parsed, ElevationPolicy::Fixed(_)) {
        anyhow::bail!("--elevation only applies to the fixed policy");
    }
    Ok(parsed)
}

fn parse_pixel_type(s: Option<&str>) -> Result<Option<PixelType>> {
    s.map(|s| s.parse::<PixelType>().map_err(anyhow::Error::msg))
        .transpose()
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Info { input } => {
            let (raster, pixel_type) = read_dem(&input)?;
            let (rows, cols) = raster.shape();
            let bounds = raster.bounds();

            println!("File: {}", input.display());
            println!("Dimensions: {} x {} ({} cells)", cols, rows, raster.len());
            println!("Pixel type: {}", pixel_type);
            println!("Cell size: {}", raster.cell_size());
            println!(
                "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
                bounds.0, bounds.1, bounds.2, bounds.3
            );
            if let Some(crs) = raster.crs() {
                println!("CRS: {}", crs);
            }
            if let Some(nodata) = raster.nodata() {
                println!("NoData: {}", nodata);
            }
            println!("\nStatistics:");
            match raster_statistics(&raster) {
                Some(stats) => {
                    println!("  Min: {:.4}", stats.min);
                    println!("  Max: {:.4}", stats.max);
                    println!("  Mean: {:.4}", stats.mean);
                    println!("  Std dev: {:.4}", stats.std_dev);
                    println!(
                        "  Valid cells: {} ({:.1}%)",
                        stats.count,
                        100.0 * stats.count as f64 / raster.len() as f64
                    );
                }
                None => println!("  No valid cells"),
            }
        }

        Commands::Flatten {
            dem,
            lakes,
            aoi,
            workdir,
            output,
            policy,
            field,
            elevation,
            pixel_type,
            min_slope,
            no_fill,
            purge,
        } => {
            let params = FlattenParams {
                dem,
                lakes,
                aoi,
                work_dir: workdir,
                output,
                policy: parse_policy(&policy, elevation)?,
                field,
                fill_sinks: !no_fill,
                fill: FillSinksParams { min_slope },
                pixel_type: parse_pixel_type(pixel_type.as_deref())?,
                keep_intermediates: !purge,
            };

            let start = Instant::now();
            let report = Pipeline::new(params)
                .run()
                .context("Failed to flatten lakes")?;
            let elapsed = start.elapsed();

            println!("Lakes flattened: {}", report.lakes.len());
            for lake in &report.lakes {
                println!("  {:<24} {:>12.3} m  ({} cells)", lake.key, lake.elevation, lake.cells);
            }
            if report.overlapping_cells > 0 {
                println!("  Overlapping cells: {}", report.overlapping_cells);
            }
            if report.purged {
                println!("Working directory removed");
            } else {
                println!("Working directory: {}", report.work_dir.display());
            }
            println!("Pixel type: {}", report.pixel_type);
            done("Flattened DEM", &report.output, elapsed);
        }

        Commands::FillSinks {
            input,
            output,
            min_slope,
            pixel_type,
        } => {
            let pixel_type = parse_pixel_type(pixel_type.as_deref())?;
            let (dem, input_type) = read_dem(&input)?;
            let start = Instant::now();
            let result = fill_sinks(&dem, FillSinksParams { min_slope })
                .context("Failed to fill sinks")?;
            let elapsed = start.elapsed();
            write_result(&result, &output, pixel_type.unwrap_or(input_type))?;
            done("Fill sinks", &output, elapsed);
        }

        Commands::SplitLakes {
            lakes,
            out_dir,
            field,
        } => {
            let pb = spinner("Reading lakes...");
            let layer = read_features(&lakes)
                .with_context(|| format!("Failed to read {}", lakes.display()))?;
            pb.finish_and_clear();

            let start = Instant::now();
            let parts = split_by_field(&layer, field.as_deref()).context("Failed to split lakes")?;
            fs::create_dir_all(&out_dir)
                .with_context(|| format!("Failed to create {}", out_dir.display()))?;
            for part in &parts {
                let path = out_dir.join(format!("{}.geojson", part.name));
                write_features(&part.layer, &path)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!("  {} ({} features)", path.display(), part.source_features);
            }
            done(&format!("{} lakes", parts.len()), &out_dir, start.elapsed());
        }
    }

    Ok(())
}
