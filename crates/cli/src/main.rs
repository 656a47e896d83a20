//! Anthrome CLI - land-cover stability classification

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use anthrome_algorithms::pipeline::{PipelineConfig, StabilityPipeline};
use anthrome_algorithms::stability::{stability_cutoff, StabilityClass};
use anthrome_core::io::{read_geotiff, PixelDepth};
use anthrome_core::GeoTiffStore;

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "anthrome")]
#[command(author, version, about = "Land-cover stability classification", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a multi-year series into stable, dynamic and unstable anthromes
    Run {
        /// Directory holding the thematic layers; outputs are written below it
        root: PathBuf,
        /// JSON pipeline configuration (defaults are used when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Years to classify, most recent first (overrides the configuration)
        #[arg(long, value_delimiter = ',')]
        years: Option<Vec<i32>>,
        /// Shared irrigation layer used for every year
        #[arg(long)]
        irrigated: Option<String>,
        /// Also write per-year and aggregate intermediates
        #[arg(long)]
        save_intermediate: bool,
        /// Worker threads (default: all cores)
        #[arg(short, long)]
        threads: Option<usize>,
        /// Sample depth of written rasters
        #[arg(long)]
        depth: Option<DepthArg>,
    },
    /// Show information about a classified raster
    Info {
        /// Input raster file
        input: PathBuf,
    },
    /// Print the default pipeline configuration as JSON
    Config,
    /// Print the dynamic/unstable variety cutoff for a series length
    Cutoff {
        /// Number of years in the series
        years: usize,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DepthArg {
    U8,
    U16,
}

impl From<DepthArg> for PixelDepth {
    fn from(arg: DepthArg) -> Self {
        match arg {
            DepthArg::U8 => PixelDepth::U8,
            DepthArg::U16 => PixelDepth::U16,
        }
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set default subscriber")
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

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let Some(path) = path else {
        return Ok(PipelineConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))
}

/// Validate `config`, then size the global worker pool from it.
fn prepare_pipeline(config: PipelineConfig) -> Result<StabilityPipeline> {
    let pipeline = StabilityPipeline::new(config).context("Invalid configuration")?;
    configure_threads(pipeline.config().threads)?;
    Ok(pipeline)
}

fn configure_threads(threads: Option<usize>) -> Result<()> {
    if let Some(n) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .context("Failed to configure thread pool")?;
        info!("Using {} threads", n);
    }
    Ok(())
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
        Commands::Run {
            root,
            config,
            years,
            irrigated,
            save_intermediate,
            threads,
            depth,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(years) = years {
                config.years = years;
            }
            if irrigated.is_some() {
                config.layers.irrigated = irrigated;
            }
            if save_intermediate {
                config.save_intermediate_layers = true;
            }
            if threads.is_some() {
                config.threads = threads;
            }
            if let Some(depth) = depth {
                config.pixel_depth = depth.into();
            }

            let pipeline = prepare_pipeline(config)?;
            let config = pipeline.config();
            info!(
                "Years: {:?} ({} total, cutoff {})",
                config.years,
                config.years.len(),
                stability_cutoff(config.years.len())
            );

            let mut store = GeoTiffStore::new(&root).with_pixel_depth(config.pixel_depth);
            let start = Instant::now();
            let pb = spinner("Classifying anthromes...");
            let result = pipeline.run(&mut store);
            pb.finish_and_clear();
            let output = result.context("Pipeline failed")?;
            let elapsed = start.elapsed();

            let (rows, cols) = output.composite.shape();
            info!(
                "Output: {} x {}, {} classified cells",
                cols,
                rows,
                output.composite.valid_count()
            );
            let key = config.outputs.result("anthrome.tif");
            done("Anthrome", &store.path_for(&key), elapsed);
        }

        Commands::Info { input } => {
            let pb = spinner("Reading raster...");
            let (grid, descriptor) = read_geotiff(&input).context("Failed to read raster")?;
            pb.finish_and_clear();

            let (rows, cols) = grid.shape();
            let transform = descriptor.transform;
            let bounds = transform.bounds(cols, rows);
            println!("File: {}", input.display());
            println!("Dimensions: {} x {} ({} cells)", cols, rows, grid.len());
            println!("Cell size: {}", transform.cell_size());
            println!(
                "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
                bounds.0, bounds.1, bounds.2, bounds.3
            );
            if let Some(crs) = &descriptor.crs {
                println!("CRS: {}", crs);
            }
            println!("NoData cells: {}", grid.len() - grid.valid_count());

            println!("\nClasses:");
            for (code, count) in grid.class_counts() {
                match StabilityClass::decode(code) {
                    Some((class, base)) => {
                        println!("  {:>4}  {:<9} base {:>3}  {}", code, class, base, count)
                    }
                    None => println!("  {:>4}  {:<9}           {}", code, "-", count),
                }
            }
        }

        Commands::Config => {
            let json = serde_json::to_string_pretty(&PipelineConfig::default())
                .context("Failed to serialize configuration")?;
            println!("{}", json);
        }

        Commands::Cutoff { years } => {
            if years == 0 {
                anyhow::bail!("Series must contain at least one year");
            }
            let cutoff = stability_cutoff(years);
            println!("Years: {}", years);
            println!("  stable:   variety 1");
            if cutoff >= 2 {
                println!("  dynamic:  variety 2..={}", cutoff);
            }
            println!("  unstable: variety > {}", cutoff.max(1));
        }
    }

    Ok(())
}
