//! PDF export: composed HTML → paginated PDF via headless Chrome.
//!
//! ## Why spawn_blocking?
//!
//! The `headless_chrome` crate drives the DevTools protocol synchronously;
//! every call blocks its thread. `tokio::task::spawn_blocking` moves the
//! whole browser session onto the blocking pool so Tokio worker threads are
//! never stalled behind a render.
//!
//! ## Why a temp file instead of a data URL?
//!
//! Composed documents routinely exceed a megabyte once images are inlined;
//! data URLs of that size are unreliable across Chrome versions. Writing to
//! a `tempfile` and navigating to the `file://` URL sidesteps the limit, and
//! the file is deleted when the guard drops.
//!
//! Browser teardown is RAII: `Browser` kills its Chrome process on drop, so
//! release happens on every path out of this module, error paths included.

use crate::config::RenderConfig;
use crate::error::ReportError;
use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptions};
use std::io::Write;
use std::time::Duration;
use tracing::{debug, warn};

const MM_PER_INCH: f64 = 25.4;
const A4_WIDTH_IN: f64 = 8.27;
const A4_HEIGHT_IN: f64 = 11.69;

/// Matches a mermaid container that has finished client-side rendering —
/// either the produced `<svg>` or the runtime's processed marker.
const DIAGRAM_READY_SELECTOR: &str = r#".mermaid svg, .mermaid[data-processed="true"]"#;

const HEADER_TEMPLATE: &str = "<div></div>";

const FOOTER_TEMPLATE: &str = r#"<div style="font-family: 'Inter', sans-serif; font-size: 9px; width: 100%; display: flex; justify-content: flex-end; padding-right: 15mm; color: #64748b;"><div>Page <span class="pageNumber"></span> of <span class="totalPages"></span></div></div>"#;

/// Render the composed document to PDF bytes.
///
/// One browser session per call: launch → tab → load → wait → export. Pass
/// `has_diagrams: false` to skip the diagram wait entirely when the composer
/// promoted no blocks — the bound only matters when there is something to
/// wait for.
pub async fn render_pdf(
    html: &str,
    has_diagrams: bool,
    config: &RenderConfig,
) -> Result<Vec<u8>, ReportError> {
    let html = html.to_string();
    let config = config.clone();
    tokio::task::spawn_blocking(move || render_pdf_blocking(&html, has_diagrams, &config))
        .await
        .map_err(|e| ReportError::Internal(format!("Render task panicked: {e}")))?
}

/// Blocking implementation of the browser session.
fn render_pdf_blocking(
    html: &str,
    has_diagrams: bool,
    config: &RenderConfig,
) -> Result<Vec<u8>, ReportError> {
    let mut page_file = tempfile::Builder::new()
        .prefix("mdreport-")
        .suffix(".html")
        .tempfile()
        .map_err(|e| ReportError::Internal(format!("tempfile: {e}")))?;
    page_file
        .write_all(html.as_bytes())
        .and_then(|_| page_file.flush())
        .map_err(|e| ReportError::Internal(format!("tempfile write: {e}")))?;

    let launch = LaunchOptions::default_builder()
        .headless(true)
        .sandbox(config.sandbox)
        .build()
        .map_err(|e| ReportError::BrowserLaunch {
            detail: e.to_string(),
        })?;

    let browser = Browser::new(launch).map_err(|e| ReportError::BrowserLaunch {
        detail: e.to_string(),
    })?;

    let tab = browser.new_tab().map_err(|e| ReportError::PageLoad {
        detail: e.to_string(),
    })?;

    let url = format!("file://{}", page_file.path().display());
    tab.navigate_to(&url)
        .and_then(|t| t.wait_until_navigated())
        .map_err(|e| ReportError::PageLoad {
            detail: e.to_string(),
        })?;
    debug!("Composed document loaded ({} bytes)", html.len());

    // Bounded wait: hitting the timeout is the one recoverable failure in
    // this module — worst case a diagram prints half-rendered.
    if has_diagrams {
        let wait = Duration::from_secs(config.diagram_wait_secs);
        match tab.wait_for_element_with_custom_timeout(DIAGRAM_READY_SELECTOR, wait) {
            Ok(_) => debug!("Diagram rendering settled"),
            Err(e) => warn!(
                "Diagram wait timed out after {}s, proceeding: {}",
                config.diagram_wait_secs, e
            ),
        }
    }

    // Settle delay: absorbs layout shifts and font swaps that land after
    // the readiness selector matches.
    std::thread::sleep(Duration::from_millis(config.settle_delay_ms));

    let margin_in = config.margin_mm / MM_PER_INCH;
    let options = PrintToPdfOptions {
        landscape: Some(false),
        display_header_footer: Some(true),
        print_background: Some(true),
        scale: Some(1.0),
        paper_width: Some(A4_WIDTH_IN),
        paper_height: Some(A4_HEIGHT_IN),
        margin_top: Some(margin_in),
        margin_bottom: Some(margin_in),
        margin_left: Some(margin_in),
        margin_right: Some(margin_in),
        header_template: Some(HEADER_TEMPLATE.to_string()),
        footer_template: Some(FOOTER_TEMPLATE.to_string()),
        prefer_css_page_size: Some(false),
        ..Default::default()
    };

    let pdf = tab
        .print_to_pdf(Some(options))
        .map_err(|e| ReportError::PdfExport {
            detail: e.to_string(),
        })?;

    validate_pdf_magic(&pdf)?;
    debug!("Exported PDF ({} bytes)", pdf.len());
    Ok(pdf)
}

/// Reject export output that does not start with the PDF magic header.
fn validate_pdf_magic(bytes: &[u8]) -> Result<(), ReportError> {
    if bytes.len() >= 5 && &bytes[..5] == b"%PDF-" {
        return Ok(());
    }
    let mut magic = [0u8; 4];
    let n = bytes.len().min(4);
    magic[..n].copy_from_slice(&bytes[..n]);
    Err(ReportError::NotAPdf { magic })
}
