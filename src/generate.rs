//! Generation entry points.
//!
//! [`generate`] is the primary API: it drives the four pipeline stages in
//! strict sequence within one request scope. Every intermediate value —
//! content HTML, inlined fragment, composed document — is created,
//! transformed and discarded inside the call; nothing survives across
//! requests.

use crate::config::RenderConfig;
use crate::error::ReportError;
use crate::metadata::ReportMetadata;
use crate::output::{RenderStats, ReportOutput};
use crate::pipeline::{browser, compose, inline, markdown};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Generate a styled PDF report from a markdown document.
///
/// # Arguments
/// * `markdown_src` — the markdown source, as edited or uploaded
/// * `meta` — cover-page metadata; absent fields fall back to the
///   documented defaults
/// * `config` — rendering configuration
///
/// # Errors
/// Returns `Err(ReportError)` only for fatal failures (browser launch,
/// page load, PDF export). Missing images and diagram-render timeouts
/// degrade the output instead of failing it.
pub async fn generate(
    markdown_src: &str,
    meta: &ReportMetadata,
    config: &RenderConfig,
) -> Result<ReportOutput, ReportError> {
    let total_start = Instant::now();
    info!(
        "Starting report generation ({} bytes of markdown)",
        markdown_src.len()
    );

    // ── Step 1: markdown → content HTML ─────────────────────────────────
    let content = markdown::render_markdown(markdown_src);
    debug!("Rendered markdown → {} bytes of HTML", content.len());

    // ── Step 2: inline image references ──────────────────────────────────
    let inlined = inline::inline_images(&content, &config.asset_dirs)?;
    if inlined.unresolved > 0 {
        debug!(
            "{} image reference(s) left unresolved",
            inlined.unresolved
        );
    }

    // ── Step 3: compose the full document ────────────────────────────────
    let assets = compose::CoverAssets::load(config);
    let composed = compose::compose_document(&inlined.html, meta, &assets, config);
    debug!(
        "Composed document: {} bytes, {} diagram block(s)",
        composed.html.len(),
        composed.diagram_blocks
    );

    // ── Step 4: browser render ───────────────────────────────────────────
    let browser_start = Instant::now();
    let pdf = browser::render_pdf(&composed.html, composed.diagram_blocks > 0, config).await?;
    let browser_duration_ms = browser_start.elapsed().as_millis() as u64;

    let stats = RenderStats {
        html_bytes: composed.html.len(),
        inlined_images: inlined.inlined,
        unresolved_images: inlined.unresolved,
        diagram_blocks: composed.diagram_blocks,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        browser_duration_ms,
    };

    info!(
        "Report generated: {} bytes of PDF in {}ms ({}ms in the browser)",
        pdf.len(),
        stats.total_duration_ms,
        stats.browser_duration_ms
    );

    Ok(ReportOutput { pdf, stats })
}

/// Generate a report and write the PDF directly to a file.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn generate_to_file(
    markdown_src: &str,
    meta: &ReportMetadata,
    output_path: impl AsRef<Path>,
    config: &RenderConfig,
) -> Result<RenderStats, ReportError> {
    let output = generate(markdown_src, meta, config).await?;
    let path = output_path.as_ref();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                ReportError::OutputWriteFailed {
                    path: path.to_path_buf(),
                    source: e,
                }
            })?;
        }
    }

    let tmp_path = path.with_extension("pdf.tmp");
    tokio::fs::write(&tmp_path, &output.pdf)
        .await
        .map_err(|e| ReportError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| ReportError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    Ok(output.stats)
}

/// Synchronous wrapper around [`generate`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_sync(
    markdown_src: &str,
    meta: &ReportMetadata,
    config: &RenderConfig,
) -> Result<ReportOutput, ReportError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ReportError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(generate(markdown_src, meta, config))
}
