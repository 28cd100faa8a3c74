//! Configuration types for report rendering.
//!
//! All rendering behaviour is controlled through [`RenderConfig`], built via
//! its [`RenderConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share a config across the HTTP handlers, serialise it for
//! logging, and diff two runs to understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! A dozen-field constructor is unreadable and breaks on every new field.
//! The builder lets callers set only what they care about and rely on
//! well-documented defaults for the rest.

use crate::error::ReportError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for a markdown-to-PDF rendering run.
///
/// Built via [`RenderConfig::builder()`] or using
/// [`RenderConfig::default()`].
///
/// # Example
/// ```rust
/// use mdreport::RenderConfig;
///
/// let config = RenderConfig::builder()
///     .asset_dir("content")
///     .diagram_wait_secs(10)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Candidate base directories for resolving relative image references,
    /// tried in order. Default: `["assets"]`.
    ///
    /// An `<img src="images/foo.png">` resolves to the first
    /// `<dir>/images/foo.png` that exists. A per-request upload batch
    /// directory, when present, is appended after these.
    pub asset_dirs: Vec<PathBuf>,

    /// Root directory for uploaded folder batches. Default: `"uploads"`.
    ///
    /// `POST /api/files` reconstructs each batch under
    /// `<upload_dir>/<batch_id>/<relative_path>`.
    pub upload_dir: PathBuf,

    /// Path to the cover-page logo image. Default: `"assets/logo.png"`.
    ///
    /// A missing file is substituted with an empty image and logged; it is
    /// never an error.
    pub logo_path: PathBuf,

    /// Path to the cover-page background image. Default: `"assets/cover-bg.png"`.
    pub cover_background_path: PathBuf,

    /// Upper bound on the wait for client-side mermaid rendering, in seconds.
    /// Default: 5.
    ///
    /// The driver waits for a rendered `<svg>` or a `data-processed` marker
    /// to appear. Hitting the bound is not an error — the export proceeds
    /// with whatever DOM state exists, at worst leaving a diagram
    /// half-rendered in the output.
    pub diagram_wait_secs: u64,

    /// Fixed settle delay before PDF capture, in milliseconds. Default: 1000.
    ///
    /// Absorbs late layout shifts and font swaps that finish after the
    /// diagram wait resolves.
    pub settle_delay_ms: u64,

    /// Page margin applied to all four sides, in millimetres. Default: 15.0.
    pub margin_mm: f64,

    /// Run Chrome with its sandbox enabled. Default: false.
    ///
    /// Disabled by default because containerised hosts routinely lack the
    /// kernel facilities the sandbox needs; flip it on when rendering
    /// untrusted markdown on a host that supports it.
    pub sandbox: bool,

    /// URL of the mermaid runtime loaded by the composed document.
    /// Default: the jsDelivr `mermaid.min.js` bundle.
    pub mermaid_js_url: String,

    /// URL of the webfont stylesheet imported by the composed document.
    /// Default: Google Fonts Inter + Lora.
    pub font_css_url: String,

    /// Visual theme applied to mermaid diagrams.
    ///
    /// Passed to the composer as data and serialised into the
    /// `mermaid.initialize` call — there is no hard-coded theme in the
    /// template itself.
    pub diagram_theme: DiagramTheme,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            asset_dirs: vec![PathBuf::from("assets")],
            upload_dir: PathBuf::from("uploads"),
            logo_path: PathBuf::from("assets/logo.png"),
            cover_background_path: PathBuf::from("assets/cover-bg.png"),
            diagram_wait_secs: 5,
            settle_delay_ms: 1000,
            margin_mm: 15.0,
            sandbox: false,
            mermaid_js_url: "https://cdn.jsdelivr.net/npm/mermaid/dist/mermaid.min.js".to_string(),
            font_css_url:
                "https://fonts.googleapis.com/css2?family=Inter:wght@400;500;600;700;800&family=Lora&display=swap"
                    .to_string(),
            diagram_theme: DiagramTheme::default(),
        }
    }
}

impl RenderConfig {
    /// Create a new builder for `RenderConfig`.
    pub fn builder() -> RenderConfigBuilder {
        RenderConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`RenderConfig`].
#[derive(Debug)]
pub struct RenderConfigBuilder {
    config: RenderConfig,
}

impl RenderConfigBuilder {
    /// Append a candidate base directory for image resolution.
    pub fn asset_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.asset_dirs.push(dir.into());
        self
    }

    /// Replace the candidate base directories entirely.
    pub fn asset_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.config.asset_dirs = dirs;
        self
    }

    pub fn upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.upload_dir = dir.into();
        self
    }

    pub fn logo_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.logo_path = path.into();
        self
    }

    pub fn cover_background_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.cover_background_path = path.into();
        self
    }

    pub fn diagram_wait_secs(mut self, secs: u64) -> Self {
        self.config.diagram_wait_secs = secs;
        self
    }

    pub fn settle_delay_ms(mut self, ms: u64) -> Self {
        self.config.settle_delay_ms = ms;
        self
    }

    pub fn margin_mm(mut self, mm: f64) -> Self {
        self.config.margin_mm = mm;
        self
    }

    pub fn sandbox(mut self, v: bool) -> Self {
        self.config.sandbox = v;
        self
    }

    pub fn mermaid_js_url(mut self, url: impl Into<String>) -> Self {
        self.config.mermaid_js_url = url.into();
        self
    }

    pub fn font_css_url(mut self, url: impl Into<String>) -> Self {
        self.config.font_css_url = url.into();
        self
    }

    pub fn diagram_theme(mut self, theme: DiagramTheme) -> Self {
        self.config.diagram_theme = theme;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RenderConfig, ReportError> {
        let c = &self.config;
        if !(0.0..=100.0).contains(&c.margin_mm) {
            return Err(ReportError::InvalidConfig(format!(
                "margin must be 0–100 mm, got {}",
                c.margin_mm
            )));
        }
        if c.diagram_wait_secs == 0 {
            return Err(ReportError::InvalidConfig(
                "diagram wait must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Diagram theme ────────────────────────────────────────────────────────

/// Mermaid `themeVariables`, serialised verbatim into the composed document's
/// `mermaid.initialize` call.
///
/// Field names map to mermaid's camelCase variable names via serde. The
/// defaults reproduce the report's sky-blue palette.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramTheme {
    pub primary_color: String,
    pub primary_text_color: String,
    pub primary_border_color: String,
    pub line_color: String,
    pub secondary_color: String,
    pub tertiary_color: String,
    pub font_family: String,
    pub font_size: String,
    pub main_bkg: String,
    pub node_border: String,
    pub cluster_bkg: String,
    pub title_color: String,
    pub edge_label_background: String,
}

impl Default for DiagramTheme {
    fn default() -> Self {
        Self {
            primary_color: "#e0f2fe".into(),
            primary_text_color: "#0369a1".into(),
            primary_border_color: "#0ea5e9".into(),
            line_color: "#0ea5e9".into(),
            secondary_color: "#f0f9ff".into(),
            tertiary_color: "#ffffff".into(),
            font_family: "Inter, sans-serif".into(),
            font_size: "14px".into(),
            main_bkg: "#ffffff".into(),
            node_border: "#cbd5e1".into(),
            cluster_bkg: "#f1f5f9".into(),
            title_color: "#0f172a".into(),
            edge_label_background: "#ffffff".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = RenderConfig::builder().build().expect("default is valid");
        assert_eq!(config.diagram_wait_secs, 5);
        assert_eq!(config.settle_delay_ms, 1000);
        assert_eq!(config.margin_mm, 15.0);
        assert_eq!(config.asset_dirs, vec![PathBuf::from("assets")]);
    }

    #[test]
    fn rejects_zero_diagram_wait() {
        let err = RenderConfig::builder()
            .diagram_wait_secs(0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("diagram wait"));
    }

    #[test]
    fn rejects_absurd_margin() {
        let err = RenderConfig::builder().margin_mm(250.0).build().unwrap_err();
        assert!(err.to_string().contains("margin"));
    }

    #[test]
    fn theme_serialises_to_camel_case() {
        let json = serde_json::to_value(DiagramTheme::default()).unwrap();
        assert_eq!(json["primaryColor"], "#e0f2fe");
        assert_eq!(json["edgeLabelBackground"], "#ffffff");
        assert!(json.get("primary_color").is_none());
    }

    #[test]
    fn asset_dir_appends() {
        let config = RenderConfig::builder()
            .asset_dir("uploads/batch-1")
            .build()
            .unwrap();
        assert_eq!(config.asset_dirs.len(), 2);
    }
}
