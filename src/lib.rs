//! # mdreport
//!
//! Render Markdown documents into styled, paginated PDF reports with a
//! cover page, inlined images, syntax-highlighted code blocks and rendered
//! mermaid diagrams.
//!
//! ## Why a browser?
//!
//! Print-quality pagination — widow/orphan control, per-heading page
//! breaks, backgrounds, a "Page X of Y" footer — is exactly what a browser
//! print engine already does well. Instead of reimplementing layout, this
//! crate assembles one self-contained HTML document (all images inlined as
//! data URIs) and asks headless Chrome to print it.
//!
//! ## Pipeline Overview
//!
//! ```text
//! markdown
//!  │
//!  ├─ 1. Render   page-break pre-pass + CommonMark → HTML (pulldown-cmark,
//!  │              syntect highlighting; mermaid blocks stay literal)
//!  ├─ 2. Inline   rewrite relative <img> refs to base64 data URIs (lol_html)
//!  ├─ 3. Compose  cover page + print stylesheet + diagram promotion
//!  └─ 4. Browser  headless Chrome: load, wait for diagrams, print to PDF
//! ```
//!
//! Each request is independent and stateless: the browser session, the
//! composed document and the PDF bytes all live and die inside one
//! [`generate`] call.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mdreport::{generate, RenderConfig, ReportMetadata};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RenderConfig::default();
//!     let meta = ReportMetadata {
//!         name: Some("Ada".into()),
//!         ..Default::default()
//!     };
//!     let output = generate("# Title\n\nHello", &meta, &config).await?;
//!     std::fs::write("report.pdf", &output.pdf)?;
//!     eprintln!("{} bytes in {}ms", output.pdf.len(), output.stats.total_duration_ms);
//!     Ok(())
//! }
//! ```
//!
//! The same pipeline is exposed over HTTP via [`server::serve`]
//! (`POST /api/generate-pdf`), which is how the browser-based editor
//! consumes it.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `mdreport` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! mdreport = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod generate;
pub mod metadata;
pub mod output;
pub mod pipeline;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{DiagramTheme, RenderConfig, RenderConfigBuilder};
pub use error::ReportError;
pub use generate::{generate, generate_sync, generate_to_file};
pub use metadata::ReportMetadata;
pub use output::{RenderStats, ReportOutput};
