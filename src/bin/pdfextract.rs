//! CLI binary for edgequake-pdfextract.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ExtractionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdfextract::{
    extract, inspect, ExtractionConfig, ExtractionOutput, ExtractionProgressCallback, PageRange,
    PdfiumRenderer, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
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

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Live progress bar plus one log line per finished page.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, Instant>>,
    warnings: AtomicUsize,
}

impl CliProgressCallback {
    /// Spinner until `on_extraction_start` tells us the page count.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            warnings: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Extracting");
        self.bar.reset_eta();
    }

    fn elapsed_secs(&self, page_index: usize) -> f64 {
        self.start_times
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(&page_index)
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_extraction_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Extracting {total_pages} pages…"))
        ));
    }

    fn on_page_start(&self, page_index: usize, _total: usize) {
        self.start_times
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(page_index, Instant::now());
        self.bar.set_message(format!("page {page_index}"));
    }

    fn on_page_warning(&self, page_index: usize, message: &str) {
        self.warnings.fetch_add(1, Ordering::SeqCst);
        let msg = if message.chars().count() > 80 {
            format!("{}\u{2026}", message.chars().take(79).collect::<String>())
        } else {
            message.to_string()
        };
        self.bar
            .println(format!("  {} Page {:>4}  {}", yellow("!"), page_index, dim(&msg)));
    }

    fn on_page_complete(&self, page_index: usize, _total: usize, image_count: usize) {
        let elapsed = self.elapsed_secs(page_index);
        self.bar.println(format!(
            "  {} Page {:>4}  {:<10}  {}",
            green("✓"),
            page_index,
            dim(&format!("{image_count:>3} images")),
            dim(&format!("{elapsed:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_extraction_complete(&self, total_pages: usize, image_count: usize) {
        self.bar.finish_and_clear();
        let warnings = self.warnings.load(Ordering::SeqCst);
        if warnings == 0 {
            eprintln!(
                "{} {} pages, {} images extracted",
                green("✔"),
                bold(&total_pages.to_string()),
                bold(&image_count.to_string())
            );
        } else {
            eprintln!(
                "{} {} pages, {} images extracted  ({} warnings)",
                cyan("⚠"),
                bold(&total_pages.to_string()),
                bold(&image_count.to_string()),
                yellow(&warnings.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Every page into ./out
  pdfextract paper.pdf -o out

  # Pages 3, 4 and 5 (0-based, end exclusive)
  pdfextract paper.pdf -o out --start 3 --end 6

  # Sharper full-page renders, no chart variants
  pdfextract paper.pdf -o out --zoom 4 --no-charts

  # From a URL, JSON summary on stdout
  pdfextract https://arxiv.org/pdf/1706.03762 -o attention --json

  # Metadata only
  pdfextract --inspect-only paper.pdf

OUTPUT LAYOUT:
  <out>/page-NNNN/full.png                  whole page at --zoom
  <out>/page-NNNN/raster-SSS.png            embedded image, RGB
  <out>/page-NNNN/vector-SSS.png            clustered vector drawing
  <out>/page-NNNN/*-SSS-chart.png           same image with a labelled pixel grid

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to an existing libpdfium (skips auto-download)
  PDFIUM_AUTO_CACHE_DIR   Override the default pdfium cache directory
  RUST_LOG                Override the log filter

  PDFium (~30 MB) is downloaded automatically on first run and cached.
"#;

/// Extract page renders, embedded images and vector figures from PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "pdfextract",
    version,
    about = "Extract page renders, embedded images and vector figures from PDFs",
    long_about = "Render every selected page, decode its embedded images to RGB PNGs, and \
group the page's vector drawings into figures rendered to their own PNGs. Each image \
also gets a chart variant with a labelled pixel grid.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Output directory.
    #[arg(short, long, env = "PDFEXTRACT_OUTPUT", default_value = "pdfextract-out")]
    output: PathBuf,

    /// First page, 0-based, inclusive.
    #[arg(long, env = "PDFEXTRACT_START", default_value_t = 0)]
    start: usize,

    /// Page after the last one to extract, 0-based. Defaults to the end.
    #[arg(long, env = "PDFEXTRACT_END")]
    end: Option<usize>,

    /// Full-page render scale (1.0 = 72 DPI).
    #[arg(long, env = "PDFEXTRACT_ZOOM", default_value_t = 2.0)]
    zoom: f32,

    /// Drawings wider or taller than this many points never join a figure.
    #[arg(long, env = "PDFEXTRACT_OVERLAP_THRESHOLD", default_value_t = 400.0)]
    overlap_threshold: f64,

    /// Points of padding around each drawing when testing for overlap.
    #[arg(long, env = "PDFEXTRACT_MARGIN", default_value_t = 10.0)]
    margin: f64,

    /// Gridline density of chart variants.
    #[arg(long, env = "PDFEXTRACT_CHART_DENSITY", default_value_t = 2.0)]
    chart_density: f64,

    /// Skip the gridded chart variants.
    #[arg(long, env = "PDFEXTRACT_NO_CHARTS")]
    no_charts: bool,

    /// Print the ExtractionOutput as JSON on stdout.
    #[arg(long, env = "PDFEXTRACT_JSON")]
    json: bool,

    /// Print PDF metadata only, no extraction.
    #[arg(long)]
    inspect_only: bool,

    /// Use this pdfium library instead of the auto-downloaded one.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Disable progress bar.
    #[arg(long, env = "PDFEXTRACT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFEXTRACT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDFEXTRACT_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDFEXTRACT_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs; --verbose always wins.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
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

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let meta = inspect(&cli.input, cli.download_timeout)
            .await
            .context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
            );
        } else {
            println!("File:         {}", meta.source_name);
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            println!("Pages:        {}", meta.page_count);
            println!("PDF Version:  {}", meta.pdf_version);
            if let Some(ref p) = meta.producer {
                println!("Producer:     {}", p);
            }
        }
        return Ok(());
    }

    // ── Ensure PDFium engine is available ───────────────────────────────
    if cli.pdfium_lib.is_none() {
        ensure_pdfium(cli.quiet)?;
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;
    let range = PageRange {
        start: cli.start,
        end: cli.end,
    };

    // ── Run extraction ───────────────────────────────────────────────────
    let output = extract(&cli.input, &range, &cli.output, &config)
        .await
        .context("Extraction failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if !cli.quiet {
        print_summary(&output, &cli.output, show_progress);
    }

    Ok(())
}

/// Download pdfium on first run, with a byte progress bar unless quiet.
fn ensure_pdfium(quiet: bool) -> Result<()> {
    if pdfium_auto::is_pdfium_cached() {
        return Ok(());
    }
    if quiet {
        tokio::task::block_in_place(|| pdfium_auto::ensure_pdfium_library(None))
            .context("Failed to download PDFium engine")?;
        return Ok(());
    }

    let dl_bar = ProgressBar::new(0);
    dl_bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS),
    );
    dl_bar.set_prefix("PDF engine");
    dl_bar.set_message("Connecting…");
    dl_bar.enable_steady_tick(Duration::from_millis(80));

    let bar = dl_bar.clone();
    tokio::task::block_in_place(|| {
        pdfium_auto::ensure_pdfium_library(Some(&|downloaded, total| {
            if let Some(t) = total {
                if bar.length().unwrap_or(0) != t {
                    bar.set_length(t);
                }
            }
            bar.set_position(downloaded);
        }))
    })
    .context("Failed to download PDFium engine")?;

    dl_bar.finish_with_message("ready ✓");
    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .zoom(cli.zoom)
        .overlap_threshold(cli.overlap_threshold)
        .margin_allowance(cli.margin)
        .chart_density(cli.chart_density)
        .write_charts(!cli.no_charts)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.renderer(Arc::new(PdfiumRenderer::with_library(lib)));
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn print_summary(output: &ExtractionOutput, out_dir: &std::path::Path, show_progress: bool) {
    let stats = &output.stats;
    // The progress callback already printed per-page lines and a total.
    if !show_progress {
        eprintln!(
            "Extracted {} pages: {} raster + {} vector images in {}ms",
            stats.pages_processed, stats.raster_images, stats.vector_images, stats.total_time_ms
        );
        for page in &output.pages {
            for error in &page.errors {
                eprintln!("  {} {}", yellow("!"), error);
            }
        }
    }
    eprintln!(
        "   {} drawings  /  render {}ms  —  {}",
        dim(&stats.drawings.to_string()),
        stats.render_time_ms,
        bold(&out_dir.display().to_string()),
    );
}
