//! Error types for the mdreport library.
//!
//! Only conditions that make the requested PDF impossible are errors here.
//! The degradable conditions the pipeline is specified to survive — a
//! referenced image missing from every candidate directory, a cover asset
//! file that cannot be read, a mermaid diagram that never finishes rendering
//! before its timeout — are *not* represented as error values at all: they
//! are logged via `tracing` and the pipeline continues with degraded output.
//!
//! Everything in [`ReportError`] is fatal to the request that hit it. The
//! HTTP layer is the single point that translates any of these into a `500`
//! response; nothing below it catches and swallows them.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the mdreport library.
#[derive(Debug, Error)]
pub enum ReportError {
    // ── Browser errors ────────────────────────────────────────────────────
    /// Headless Chrome could not be launched.
    #[error(
        "Failed to launch headless Chrome: {detail}\n\
         Check that a Chrome or Chromium binary is installed and on PATH,\n\
         or point the CHROME env var at one."
    )]
    BrowserLaunch { detail: String },

    /// The composed document could not be loaded into the browser tab.
    #[error("Failed to load composed document into the browser: {detail}")]
    PageLoad { detail: String },

    /// Chrome's print-to-PDF call failed.
    #[error("PDF export failed: {detail}")]
    PdfExport { detail: String },

    /// The export call returned bytes that are not a PDF.
    #[error("Browser returned invalid PDF output.\nFirst bytes: {magic:?}")]
    NotAPdf { magic: [u8; 4] },

    // ── Upload errors ─────────────────────────────────────────────────────
    /// A multipart upload was structurally invalid (missing field, bad path).
    #[error("Invalid upload: {detail}")]
    InvalidUpload { detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}
