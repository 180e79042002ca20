//! CLI binary for batchconv.
//!
//! A thin shim over the library crate that maps CLI flags to a
//! `ConvertConfig`, stages the input files and emits the download.

use anyhow::{Context, Result};
use batchconv::{
    Batch, BatchProgressCallback, ConversionMode, ConvertConfig, ResizeSpec, SourceFile,
};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one live bar plus per-item log lines via
/// [indicatif]. Works correctly when items complete out of order
/// (bounded-concurrency transforms).
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    /// Create a callback whose bar length is set dynamically by
    /// `on_convert_start` (staging only knows a percentage).
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(100);

        let staging_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}%",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(staging_style);
        bar.set_prefix("Staging");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }

    /// Switch from the percentage bar to an item counter once the
    /// transform knows its total.
    fn activate_bar(&self, total: usize) {
        let convert_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} items  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_position(0);
        self.bar.set_length(total as u64);
        self.bar.set_style(convert_style);
        self.bar.set_prefix("Converting");
        self.bar.reset_eta();
    }
}

/// Truncate long error messages to keep output tidy. Item-error messages
/// embed user-supplied filenames, so the cut must land on a char boundary.
fn truncate_message(error: String) -> String {
    match error.char_indices().nth(79) {
        Some((byte, _)) => format!("{}\u{2026}", &error[..byte]),
        None => error,
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_stage_progress(&self, percent: u8) {
        self.bar.set_position(percent as u64);
    }

    fn on_convert_start(&self, total: usize) {
        self.activate_bar(total);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting {total} item(s)…"))
        ));
    }

    fn on_item_complete(&self, index: usize, total: usize, output_name: &str) {
        self.bar.println(format!(
            "  {} Item {:>3}/{:<3}  {}",
            green("✓"),
            index + 1,
            total,
            dim(output_name),
        ));
        self.bar.inc(1);
    }

    fn on_item_skipped(&self, index: usize, total: usize, error: String) {
        let msg = truncate_message(error);
        self.bar.println(format!(
            "  {} Item {:>3}/{:<3}  {}",
            red("✗"),
            index + 1,
            total,
            red(&msg),
        ));
        self.bar.inc(1);
    }

    fn on_convert_complete(&self, total: usize, converted: usize) {
        let skipped = total.saturating_sub(converted);
        self.bar.finish_and_clear();

        if skipped == 0 {
            eprintln!(
                "{} {} item(s) converted successfully",
                green("✔"),
                bold(&converted.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} item(s) converted  ({} skipped)",
                if converted == 0 { red("✘") } else { cyan("⚠") },
                bold(&converted.to_string()),
                total,
                red(&skipped.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Split a PDF into JPG page images (converted_images.zip)
  batchconv pdf-to-jpg scan.pdf

  # Same, but PNG, into a specific directory
  batchconv pdf-to-png scan.pdf -o out/

  # Merge photos into one PDF, one page per image, in argument order
  batchconv img-to-pdf cover.png page1.jpg page2.jpg

  # Flip a batch between PNG and JPEG (mixed inputs are fine)
  batchconv swap-format *.png *.jpg

  # Resample everything to 800x600, keeping each image's format
  batchconv resize --width 800 --height 600 photos/*.jpg

  # Machine-readable stats on stdout
  batchconv --json pdf-to-jpg scan.pdf

MODES AND OUTPUTS:
  Mode         Accepts        Produces
  ───────────  ─────────────  ─────────────────────────────
  pdf-to-jpg   one .pdf       converted_images.zip
  pdf-to-png   one .pdf       converted_images_png.zip
  img-to-pdf   .jpg/.png      converted.pdf
  swap-format  .jpg/.png      converted_images.zip
  resize       .jpg/.png      resized_images_<w>x<h>.zip

  Validation is all-or-nothing: one file of the wrong type rejects the
  whole batch. Decode failures inside an accepted batch are skipped and
  the download is built from the survivors.

ENVIRONMENT VARIABLES:
  BATCHCONV_CONCURRENCY   Concurrent item transforms (default 8)
  BATCHCONV_REPORT_URL    Usage-counter endpoint (off when unset)
  PDFIUM_LIB_PATH         Path to an existing libpdfium build
"#;

/// Batch-convert PDFs and images from the command line.
#[derive(Parser, Debug)]
#[command(
    name = "batchconv",
    version,
    about = "Batch-convert between PDF documents and raster images",
    long_about = "Run one conversion batch: split a PDF into page images, merge images into a \
PDF, swap images between PNG and JPEG, or resample images to a fixed resolution. The batch \
produces a single download (a zip archive or a PDF) written to the output directory.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Conversion to run.
    #[arg(value_enum)]
    mode: ModeArg,

    /// Input files (one PDF for the pdf-* modes, one or more images otherwise).
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Directory to write the download into.
    #[arg(short, long, env = "BATCHCONV_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Target width in pixels (resize mode).
    #[arg(long, required_if_eq("mode", "resize"))]
    width: Option<u32>,

    /// Target height in pixels (resize mode).
    #[arg(long, required_if_eq("mode", "resize"))]
    height: Option<u32>,

    /// Page rasterisation scale factor (pdf-* modes).
    #[arg(long, env = "BATCHCONV_SCALE", default_value_t = 2.0)]
    scale: f32,

    /// Number of concurrent item transforms.
    #[arg(short, long, env = "BATCHCONV_CONCURRENCY", default_value_t = 8)]
    concurrency: usize,

    /// JPEG encode quality (1-100).
    #[arg(long, env = "BATCHCONV_JPEG_QUALITY", default_value_t = 90,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    jpeg_quality: u8,

    /// Usage-counter endpoint; reporting is off when unset.
    #[arg(long, env = "BATCHCONV_REPORT_URL")]
    report_url: Option<String>,

    /// Output batch stats as JSON instead of the human summary.
    #[arg(long, env = "BATCHCONV_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "BATCHCONV_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "BATCHCONV_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "BATCHCONV_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    PdfToJpg,
    PdfToPng,
    ImgToPdf,
    SwapFormat,
    Resize,
}

impl From<ModeArg> for ConversionMode {
    fn from(v: ModeArg) -> Self {
        match v {
            ModeArg::PdfToJpg => ConversionMode::RasterizeToJpg,
            ModeArg::PdfToPng => ConversionMode::RasterizeToPng,
            ModeArg::ImgToPdf => ConversionMode::ImagesToPdf,
            ModeArg::SwapFormat => ConversionMode::SwapImageFormat,
            ModeArg::Resize => ConversionMode::ResizeImage,
        }
    }
}

/// Staging tick pacing for the CLI bar. The library default is zero
/// delay; a short pause here keeps the staging bar visible.
const STAGE_TICK_MS: u64 = 300;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let mode: ConversionMode = cli.mode.into();

    let mut builder = ConvertConfig::builder()
        .scale(cli.scale)
        .concurrency(cli.concurrency)
        .jpeg_quality(cli.jpeg_quality)
        .stage_tick_ms(if show_progress { STAGE_TICK_MS } else { 0 });

    if let (Some(width), Some(height)) = (cli.width, cli.height) {
        builder = builder.resize(ResizeSpec::new(width, height).context("Invalid dimensions")?);
    }
    if let Some(ref url) = cli.report_url {
        builder = builder.report_url(url.clone());
    }
    if show_progress {
        builder = builder.progress(CliProgressCallback::new_dynamic());
    }

    let config = builder.build().context("Invalid configuration")?;

    // ── Load inputs ──────────────────────────────────────────────────────
    let files = cli
        .inputs
        .iter()
        .map(SourceFile::from_path)
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to read inputs")?;

    // ── Stage and convert ────────────────────────────────────────────────
    let batch = Batch::new(mode, config);
    batch.stage(files).await.context("Batch rejected")?;
    let output = batch.convert().await.context("Conversion failed")?;

    let path = output
        .download
        .emit_to_dir(&cli.output_dir)
        .await
        .context("Failed to write download")?;

    // ── Summary ──────────────────────────────────────────────────────────
    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output.stats).context("Failed to serialise stats")?
        );
    } else if !cli.quiet {
        eprintln!(
            "{}  {}/{} item(s)  {}ms  →  {}",
            if output.stats.skipped_items == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            output.stats.converted_items,
            output.stats.total_items,
            output.stats.total_duration_ms,
            bold(&path.display().to_string()),
        );
        for err in &output.skipped {
            eprintln!("   {} {}", red("✗"), dim(&err.to_string()));
        }
    }

    Ok(())
}
