//! CLI binary for mdreport.
//!
//! A thin shim over the library crate: maps flags to `RenderConfig` and
//! either runs a one-shot file conversion or serves the HTTP endpoint.

use anyhow::{Context, Result};
use clap::Parser;
use mdreport::{generate_to_file, server, RenderConfig, ReportMetadata};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # One-shot conversion
  mdreport report.md -o report.pdf

  # Override cover metadata
  mdreport report.md --name "Ada Lovelace" --batch 07

  # Resolve images from an extra directory
  mdreport report.md --asset-dir ./content

  # Run the HTTP service the editor talks to
  mdreport --serve --addr 0.0.0.0:3000

ENDPOINTS (--serve):
  POST /api/generate-pdf   {"markdown": "...", "metadata": {...}} → PDF bytes
  POST /api/files          multipart folder upload (file, batchId, relativePath)

REQUIREMENTS:
  A Chrome or Chromium binary must be installed; the CHROME env var can
  point at a specific one. Diagram and webfont rendering additionally needs
  outbound network access from the browser.
"#;

/// Render Markdown documents into styled, paginated PDF reports.
#[derive(Parser, Debug)]
#[command(
    name = "mdreport",
    version,
    about = "Render Markdown documents into styled, paginated PDF reports via headless Chrome",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Markdown file to convert. Omit when using --serve.
    input: Option<PathBuf>,

    /// Write the PDF to this file (default: the input path with a .pdf extension).
    #[arg(short, long, env = "MDREPORT_OUTPUT")]
    output: Option<PathBuf>,

    /// Run the HTTP service instead of a one-shot conversion.
    #[arg(long)]
    serve: bool,

    /// Bind address for --serve.
    #[arg(long, env = "MDREPORT_ADDR", default_value = "127.0.0.1:3000")]
    addr: SocketAddr,

    /// Extra candidate directory for resolving relative image references
    /// (repeatable; tried after the default `assets` directory).
    #[arg(long = "asset-dir", env = "MDREPORT_ASSET_DIR")]
    asset_dir: Vec<PathBuf>,

    /// Root directory for uploaded folder batches (--serve).
    #[arg(long, env = "MDREPORT_UPLOAD_DIR", default_value = "uploads")]
    upload_dir: PathBuf,

    /// Cover-page logo image.
    #[arg(long, env = "MDREPORT_LOGO", default_value = "assets/logo.png")]
    logo: PathBuf,

    /// Cover-page background image.
    #[arg(long, env = "MDREPORT_COVER_BG", default_value = "assets/cover-bg.png")]
    cover_bg: PathBuf,

    // ── Cover metadata overrides ─────────────────────────────────────────
    /// Report title shown on the cover.
    #[arg(long)]
    title: Option<String>,

    /// Report subtitle shown on the cover.
    #[arg(long)]
    subtitle: Option<String>,

    /// Course line shown on the cover.
    #[arg(long)]
    course: Option<String>,

    /// Student name.
    #[arg(long)]
    name: Option<String>,

    /// Roll number.
    #[arg(long)]
    roll: Option<String>,

    /// Registration number.
    #[arg(long)]
    reg: Option<String>,

    /// Batch identifier.
    #[arg(long)]
    batch: Option<String>,

    /// Submission date.
    #[arg(long)]
    date: Option<String>,

    // ── Render tuning ────────────────────────────────────────────────────
    /// Upper bound on the wait for diagram rendering, in seconds.
    #[arg(long, env = "MDREPORT_DIAGRAM_WAIT", default_value_t = 5)]
    diagram_wait: u64,

    /// Settle delay before PDF capture, in milliseconds.
    #[arg(long, env = "MDREPORT_SETTLE_MS", default_value_t = 1000)]
    settle_ms: u64,

    /// Page margin on all sides, in millimetres.
    #[arg(long, env = "MDREPORT_MARGIN_MM", default_value_t = 15.0)]
    margin_mm: f64,

    /// Run Chrome with its sandbox enabled.
    #[arg(long, env = "MDREPORT_SANDBOX")]
    sandbox: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "MDREPORT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "MDREPORT_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = build_config(&cli).context("Invalid configuration")?;

    // ── Serve mode ───────────────────────────────────────────────────────
    if cli.serve {
        return server::serve(cli.addr, config)
            .await
            .context("Server failed");
    }

    // ── One-shot conversion ──────────────────────────────────────────────
    let input = cli
        .input
        .as_ref()
        .context("Provide a markdown file to convert, or --serve")?;
    let markdown = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| input.with_extension("pdf"));

    let meta = ReportMetadata {
        title: cli.title.clone(),
        subtitle: cli.subtitle.clone(),
        course: cli.course.clone(),
        name: cli.name.clone(),
        roll: cli.roll.clone(),
        reg: cli.reg.clone(),
        batch: cli.batch.clone(),
        date: cli.date.clone(),
    };

    let stats = generate_to_file(&markdown, &meta, &output_path, &config)
        .await
        .context("Report generation failed")?;

    if !cli.quiet {
        eprintln!(
            "✔ {}  ({} image(s) inlined, {} diagram(s), {}ms)",
            output_path.display(),
            stats.inlined_images,
            stats.diagram_blocks,
            stats.total_duration_ms,
        );
        if stats.unresolved_images > 0 {
            eprintln!("  {} image reference(s) could not be resolved", stats.unresolved_images);
        }
    }

    Ok(())
}

/// Map CLI args to `RenderConfig`.
fn build_config(cli: &Cli) -> Result<RenderConfig> {
    let mut builder = RenderConfig::builder()
        .upload_dir(&cli.upload_dir)
        .logo_path(&cli.logo)
        .cover_background_path(&cli.cover_bg)
        .diagram_wait_secs(cli.diagram_wait)
        .settle_delay_ms(cli.settle_ms)
        .margin_mm(cli.margin_mm)
        .sandbox(cli.sandbox);

    for dir in &cli.asset_dir {
        builder = builder.asset_dir(dir);
    }

    Ok(builder.build()?)
}
