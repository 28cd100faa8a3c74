//! Output types returned by the generation entry points.

use serde::{Deserialize, Serialize};

/// Result of a successful markdown-to-PDF generation.
pub struct ReportOutput {
    /// The finished PDF document.
    pub pdf: Vec<u8>,
    /// Timing and counting statistics for the run.
    pub stats: RenderStats,
}

/// Statistics for a single generation run.
///
/// Counts come from the pipeline stages; durations are wall-clock. The
/// browser duration dominates in practice — it includes the diagram wait
/// and the settle delay.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderStats {
    /// Size of the composed HTML document in bytes.
    pub html_bytes: usize,
    /// Images successfully inlined as data URIs.
    pub inlined_images: usize,
    /// Image references that matched the relative pattern but resolved to no
    /// file in any candidate directory (left untouched in the output).
    pub unresolved_images: usize,
    /// Mermaid code blocks promoted to diagram containers.
    pub diagram_blocks: usize,
    /// Total wall-clock time for the whole run, in milliseconds.
    pub total_duration_ms: u64,
    /// Time spent inside the headless browser, in milliseconds.
    pub browser_duration_ms: u64,
}
