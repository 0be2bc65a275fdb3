use clap::{Args, Parser, Subcommand};
use reframe::config::{self, ReframeConfig, SizeMode};
use reframe::convert::ConversionItem;
use reframe::imaging::{
    Background, Fit, ImageBackend, OutputFormat, ResampleQuality, RustBackend, SmoothingQuality,
};
use reframe::{batch, ingest, output};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "reframe")]
#[command(about = "Batch image converter")]
#[command(long_about = "\
Batch image converter

Re-encodes images to one target format, optionally resizing them, using
several workers in parallel. A file that fails to convert is reported and
the rest of the batch carries on.

Fit modes (when the target size differs from the source):

  keep      draw at source size (only when the size is unchanged)
  contain   letterbox into the target, never crops
  cover     center-crop to fill the target, never letterboxes
  stretch   fill the target, ignoring aspect ratio

Settings are read from ./reframe.toml (or --config), then overridden by flags.
Run 'reframe gen-config' to generate a documented reframe.toml.

Set RUST_LOG (e.g. RUST_LOG=reframe=debug) for diagnostic logging.")]
#[command(version)]
struct Cli {
    /// Config file (default: ./reframe.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert images and report per-file results
    Convert(ConvertArgs),
    /// List output formats this build can encode
    Formats,
    /// Print a stock reframe.toml with all options documented
    GenConfig,
}

#[derive(Args)]
struct ConvertArgs {
    /// Image files or directories (walked recursively)
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Output format: MIME type or extension (png, jpg, webp, avif)
    #[arg(long)]
    to: Option<OutputFormat>,

    /// Lossy quality, 0.0 - 1.0
    #[arg(long)]
    quality: Option<f64>,

    /// Target width in pixels (height follows aspect ratio unless given)
    #[arg(long, conflicts_with = "scale")]
    width: Option<u32>,

    /// Target height in pixels (width follows aspect ratio unless given)
    #[arg(long, conflicts_with = "scale")]
    height: Option<u32>,

    /// Scale percent, clamped to 1 - 1000
    #[arg(long)]
    scale: Option<f64>,

    /// Fit mode: keep, contain, cover, stretch
    #[arg(long)]
    fit: Option<Fit>,

    /// Background for formats without alpha: #rgb, #rrggbb, #rrggbbaa
    #[arg(long)]
    background: Option<Background>,

    /// Disable interpolation when scaling
    #[arg(long)]
    no_smoothing: bool,

    /// Interpolation quality: low, medium, high
    #[arg(long)]
    smoothing_quality: Option<SmoothingQuality>,

    /// Pre-draw resample quality: off, pixelated, low, medium, high
    #[arg(long)]
    resample: Option<ResampleQuality>,

    /// Maximum parallel conversions
    #[arg(long)]
    workers: Option<usize>,

    /// Write converted files to this directory
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Print results as JSON instead of text
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("reframe=info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    match cli.command {
        Command::Convert(args) => {
            let mut config = config::load_config(cli.config.as_deref())?;
            apply_overrides(&mut config, &args);
            config.validate()?;
            convert(&config, &args)?;
        }
        Command::Formats => {
            output::print_formats(&RustBackend::new().supported_formats());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Layer command-line flags over the loaded config.
fn apply_overrides(config: &mut ReframeConfig, args: &ConvertArgs) {
    if let Some(format) = &args.to {
        config.output.format = format.clone();
    }
    if let Some(quality) = args.quality {
        config.output.quality = quality;
    }
    if args.width.is_some() || args.height.is_some() {
        config.resize.mode = SizeMode::Pixels;
        config.resize.width = args.width;
        config.resize.height = args.height;
    }
    if let Some(percent) = args.scale {
        config.resize.mode = SizeMode::Scale;
        config.resize.percent = percent;
    }
    if let Some(fit) = args.fit {
        config.draw.fit = fit;
    }
    if let Some(background) = args.background {
        config.draw.background = background;
    }
    if args.no_smoothing {
        config.draw.smoothing = false;
    }
    if let Some(quality) = args.smoothing_quality {
        config.draw.smoothing_quality = quality;
    }
    if let Some(quality) = args.resample {
        config.draw.resample_quality = quality;
    }
    if let Some(workers) = args.workers {
        config.processing.max_workers = Some(workers);
    }
}

fn convert(config: &ReframeConfig, args: &ConvertArgs) -> Result<(), Box<dyn std::error::Error>> {
    let backend = RustBackend::new();
    let options = config.to_options();
    if !backend.supported_formats().contains(&options.format) {
        warn!(format = %options.format, "output format is not supported by this build");
    }

    let mut items = Vec::new();
    for path in ingest::collect_paths(&args.paths)? {
        match ingest::item_from_path(items.len() as u64 + 1, &path) {
            Ok(item) => items.push(item),
            Err(e) => warn!(path = %path.display(), error = %e, "skipping"),
        }
    }

    let workers = config::effective_workers(&config.processing, batch::available_parallelism_hint());

    let summary = if args.json {
        batch::run_batch(&backend, &mut items, &options, workers, None)?
    } else {
        let (tx, rx) = std::sync::mpsc::channel();
        let printer = std::thread::spawn(move || {
            for event in rx {
                output::print_batch_event(&event);
            }
        });
        let summary = batch::run_batch(&backend, &mut items, &options, workers, Some(tx))?;
        printer
            .join()
            .map_err(|_| "progress printer thread panicked")?;
        summary
    };

    let saved = match &args.out_dir {
        Some(dir) => write_outputs(&items, dir)?,
        None => Vec::new(),
    };

    if args.json {
        println!("{}", output::results_json(&items)?);
    } else {
        println!();
        output::print_results(&items);
        output::print_saved(&saved);
    }

    if summary.failed > 0 {
        info!(failed = summary.failed, "some images failed to convert");
    }
    Ok(())
}

/// Write every done item's artifact into `dir` under its derived filename.
///
/// Names that collide within the batch get a numeric suffix.
fn write_outputs(items: &[ConversionItem], dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let mut used = HashSet::new();
    let mut written = Vec::new();
    for output in items.iter().filter_map(ConversionItem::output) {
        let path = dir.join(unique_name(&output.filename, &mut used));
        std::fs::write(&path, &output.bytes)?;
        written.push(path);
    }
    Ok(written)
}

/// `photo.webp`, then `photo-2.webp`, `photo-3.webp`, ...
fn unique_name(filename: &str, used: &mut HashSet<String>) -> String {
    if used.insert(filename.to_string()) {
        return filename.to_string();
    }
    let (stem, ext) = match filename.rfind('.') {
        Some(dot) => (&filename[..dot], &filename[dot..]),
        None => (filename, ""),
    };
    let mut n = 2;
    loop {
        let candidate = format!("{stem}-{n}{ext}");
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}
