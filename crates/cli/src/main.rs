//! Contorno CLI - contour lines from digital elevation models

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use contorno_algorithms::contour::{generate_contours, ContourParams};
use contorno_core::io::{read_geotiff, write_geotiff};
use contorno_core::{Raster, Roi};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "contorno")]
#[command(author, version, about = "Contour lines from digital elevation models", long_about = None)]
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
    /// Generate a contour raster from a DEM
    Contours {
        /// Input DEM file
        input: PathBuf,
        /// Output file
        output: PathBuf,
        /// Contour interval in elevation units
        #[arg(short, long)]
        interval: Option<f64>,
        /// Gaussian smoothing size in cells
        #[arg(short, long)]
        kernel_size: Option<f64>,
        /// Polygon simplification tolerance in map units
        #[arg(short, long)]
        tolerance: Option<f64>,
        /// Cell budget for band vectorization
        #[arg(long)]
        max_cells: Option<usize>,
        /// Band vectorization scale in map units
        #[arg(long)]
        scale: Option<f64>,
        /// Worker threads for per-level extraction
        #[arg(long)]
        threads: Option<usize>,
        /// Region of interest as min_x,min_y,max_x,max_y
        #[arg(long, conflicts_with = "polygon")]
        bbox: Option<String>,
        /// Region of interest as "x y, x y, ..."
        #[arg(long)]
        polygon: Option<String>,
        /// JSON file with contour parameters; flags override its values
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set up logging")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn read_dem(path: &Path) -> Result<Raster<f64>> {
    let pb = spinner("Reading raster...");
    let raster = read_geotiff(path).with_context(|| format!("Failed to read {}", path.display()))?;
    pb.finish_and_clear();
    info!("Input: {} x {}", raster.cols(), raster.rows());
    Ok(raster)
}

fn write_result(raster: &Raster<f64>, path: &Path) -> Result<()> {
    let pb = spinner("Writing output...");
    write_geotiff(raster, path).with_context(|| format!("Failed to write {}", path.display()))?;
    pb.finish_and_clear();
    Ok(())
}

fn parse_numbers(s: &str) -> Result<Vec<f64>> {
    s.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .map(|t| t.parse::<f64>().with_context(|| format!("Invalid number: {}", t)))
        .collect()
}

fn parse_bbox(s: &str) -> Result<Roi> {
    let v = parse_numbers(s)?;
    if v.len() != 4 {
        anyhow::bail!("Bounding box needs 4 values (min_x,min_y,max_x,max_y), got {}", v.len());
    }
    if v[0] >= v[2] || v[1] >= v[3] {
        anyhow::bail!("Bounding box minimum must be below maximum: {}", s);
    }
    Ok(Roi::from_rect(v[0], v[1], v[2], v[3]))
}

fn parse_polygon(s: &str) -> Result<Roi> {
    let vertices = s
        .split(',')
        .map(|pair| -> Result<(f64, f64)> {
            let v = parse_numbers(pair)?;
            match v.as_slice() {
                [x, y] => Ok((*x, *y)),
                _ => anyhow::bail!("Polygon vertex needs 2 values: '{}'", pair.trim()),
            }
        })
        .collect::<Result<Vec<_>>>()?;
    if vertices.len() < 3 {
        anyhow::bail!("Polygon needs at least 3 vertices, got {}", vertices.len());
    }
    Ok(Roi::from_vertices(vertices))
}

fn load_params(config: Option<&Path>) -> Result<ContourParams> {
    match config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))
        }
        None => Ok(ContourParams::default()),
    }
}

fn done(name: &str, path: &Path, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        Commands::Info { input } => {
            let raster = read_dem(&input)?;
            let (rows, cols) = raster.shape();
            let bounds = raster.bounds();
            let stats = raster.statistics();

            println!("File: {}", input.display());
            println!("Dimensions: {} x {} ({} cells)", cols, rows, raster.len());
            println!("Cell size: {}", raster.cell_size());
            println!(
                "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
                bounds.0, bounds.1, bounds.2, bounds.3
            );
            if let Some(nodata) = raster.nodata() {
                println!("NoData: {}", nodata);
            }
            println!("\nStatistics:");
            if let Some(min) = stats.min {
                println!("  Min: {:.4}", min);
            }
            if let Some(max) = stats.max {
                println!("  Max: {:.4}", max);
            }
            if let Some(mean) = stats.mean {
                println!("  Mean: {:.4}", mean);
            }
            if !raster.is_empty() {
                println!(
                    "  Valid cells: {} ({:.1}%)",
                    stats.valid_count,
                    100.0 * stats.valid_count as f64 / raster.len() as f64
                );
            }
        }

        Commands::Contours {
            input,
            output,
            interval,
            kernel_size,
            tolerance,
            max_cells,
            scale,
            threads,
            bbox,
            polygon,
            config,
        } => {
            let mut params = load_params(config.as_deref())?;
            if let Some(v) = interval {
                params.interval = v;
            }
            if let Some(v) = kernel_size {
                params.kernel_size = v;
            }
            if let Some(v) = tolerance {
                params.simplify_tolerance = v;
            }
            if let Some(v) = max_cells {
                params.max_cells = v;
            }
            if scale.is_some() {
                params.vector_scale = scale;
            }
            if threads.is_some() {
                params.threads = threads;
            }
            debug!(?params, "contour parameters");

            let dem = read_dem(&input)?;
            let roi = match (bbox, polygon) {
                (Some(b), _) => parse_bbox(&b)?,
                (None, Some(p)) => parse_polygon(&p)?,
                (None, None) => Roi::covering(dem.transform(), dem.rows(), dem.cols()),
            };

            let start = Instant::now();
            let pb = spinner("Generating contours...");
            let result = generate_contours(&dem, &roi, &params).context("Contour generation failed")?;
            pb.finish_and_clear();
            let elapsed = start.elapsed();

            println!("Min elevation: {}", result.min_elevation);
            println!("Max elevation: {}", result.max_elevation);
            println!(
                "Levels: {} (every {} from {})",
                result.levels.len(),
                params.interval,
                result.min_elevation
            );
            if result.effective_scale > dem.cell_size() {
                println!("  Bands vectorized at scale {}", result.effective_scale);
            }

            write_result(&result.contours, &output)?;
            done("Contours", &output, elapsed);
        }
    }

    Ok(())
}
