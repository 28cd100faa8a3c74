//! Document composition: content HTML + metadata → one self-contained page.
//!
//! The composed document is what the browser renders: a cover page (base64
//! background, centered logo, title/subtitle, metadata table) followed by
//! the content section, with the print stylesheet and the mermaid runtime
//! reference embedded. Apart from [`CoverAssets::load`], composition is a
//! pure function of its inputs — same content, metadata, assets and theme
//! always produce the same string.
//!
//! Diagram promotion happens here: every literal
//! `<pre><code class="language-mermaid">` block the renderer emitted is
//! rewritten into a `.mermaid` container the client-side runtime targets.
//! The block content stays HTML-escaped; the browser's `textContent`
//! un-escapes it before mermaid parses it.

use crate::config::RenderConfig;
use crate::metadata::ReportMetadata;
use crate::pipeline::markdown::html_escape;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tracing::warn;

/// The two static cover images, base64-encoded.
///
/// A missing or unreadable file substitutes an empty string — the cover
/// degrades to an unstyled background rather than failing the render.
pub struct CoverAssets {
    pub logo_base64: String,
    pub background_base64: String,
}

impl CoverAssets {
    /// Read the configured logo and cover-background files.
    pub fn load(config: &RenderConfig) -> Self {
        Self {
            logo_base64: load_base64(&config.logo_path),
            background_base64: load_base64(&config.cover_background_path),
        }
    }
}

fn load_base64(path: &Path) -> String {
    match std::fs::read(path) {
        Ok(bytes) => STANDARD.encode(bytes),
        Err(e) => {
            warn!("Cover asset '{}' unavailable: {}", path.display(), e);
            String::new()
        }
    }
}

/// Result of composing the full document.
pub struct ComposeOutcome {
    /// The complete HTML document.
    pub html: String,
    /// Diagram blocks promoted to mermaid containers.
    pub diagram_blocks: usize,
}

/// Assemble the complete HTML document.
pub fn compose_document(
    content_html: &str,
    meta: &ReportMetadata,
    assets: &CoverAssets,
    config: &RenderConfig,
) -> ComposeOutcome {
    let (content, diagram_blocks) = promote_diagram_blocks(content_html);

    let theme_json = serde_json::to_string(&config.diagram_theme)
        .unwrap_or_else(|_| "{}".to_string());

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="UTF-8">
<style>
@import url('{font_css_url}');
{css}
</style>
<script src="{mermaid_js_url}"></script>
<script>
  mermaid.initialize({{ startOnLoad: true, theme: 'base', themeVariables: {theme_json} }});
</script>
</head>
<body>
<div class="cover-page" style="background-image: url('data:image/png;base64,{background}')">
  <div class="logo-container">
    <img src="data:image/png;base64,{logo}" class="logo" />
  </div>
  <div class="university">UNIVERSITY OF DHAKA</div>
  <div class="program">Professional Masters in Information and Cyber Security</div>
  <div class="title-section">
    <div class="report-title">{title}</div>
    <div class="report-subtitle">{subtitle}</div>
  </div>
  <div class="course-info">Course: {course}</div>
  <div class="student-details">
{details}
  </div>
</div>
<div class="report-container">
  <div class="content-page">
{content}
  </div>
</div>
</body>
</html>
"#,
        font_css_url = config.font_css_url,
        css = REPORT_CSS,
        mermaid_js_url = config.mermaid_js_url,
        theme_json = theme_json,
        background = assets.background_base64,
        logo = assets.logo_base64,
        title = html_escape(meta.title()),
        subtitle = html_escape(meta.subtitle()),
        course = html_escape(meta.course()),
        details = student_details(meta),
        content = content,
    );

    ComposeOutcome {
        html,
        diagram_blocks,
    }
}

/// Render the cover's metadata rows.
fn student_details(meta: &ReportMetadata) -> String {
    [
        ("Name:", meta.name()),
        ("Roll No:", meta.roll()),
        ("Reg. No:", meta.reg()),
        ("Batch:", meta.batch()),
        ("Submission Date:", meta.date()),
    ]
    .iter()
    .map(|(label, value)| {
        format!(
            "    <div class=\"details-row\">\n      <div class=\"details-label\">{}</div>\n      <div class=\"details-value\">{}</div>\n    </div>\n",
            label,
            html_escape(value)
        )
    })
    .collect()
}

static RE_MERMAID_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<pre><code class="language-mermaid">(.*?)</code></pre>"#)
        .expect("valid regex")
});

/// Rewrite every mermaid code block into a diagram container, exactly once
/// per block.
fn promote_diagram_blocks(html: &str) -> (String, usize) {
    let count = RE_MERMAID_BLOCK.find_iter(html).count();
    let promoted = RE_MERMAID_BLOCK
        .replace_all(
            html,
            r#"<div class="mermaid-wrapper"><div class="mermaid">$1</div></div>"#,
        )
        .to_string();
    (promoted, count)
}

/// The embedded print stylesheet: pagination rules, cover layout, content
/// typography. Colors match the diagram theme defaults.
const REPORT_CSS: &str = r#"
body {
  font-family: 'Inter', sans-serif;
  padding: 0;
  margin: 0;
  color: #1a1a1a;
  background: white;
}
.report-container { padding: 0; }

h2 {
  font-size: 24pt;
  color: #0369a1;
  border-left: 10px solid #0ea5e9;
  padding: 15px 0 15px 25px;
  margin-top: 0;
  margin-bottom: 1cm;
  page-break-before: always;
  page-break-after: avoid;
  background: #f8fafc;
  border-radius: 0 8px 8px 0;
}

h3 {
  font-size: 18pt;
  color: #0369a1;
  margin-top: 1.2cm;
  margin-bottom: 0.6cm;
  page-break-after: avoid;
  display: flex;
  align-items: center;
}

h3::before {
  content: "";
  display: inline-block;
  width: 8px;
  height: 8px;
  background-color: #0ea5e9;
  border-radius: 50%;
  margin-right: 12px;
}

p {
  text-align: justify;
  line-height: 1.8;
  font-family: 'Lora', serif;
  font-size: 11.5pt;
  color: #334155;
  margin-bottom: 0.8cm;
}

ul, ol {
  margin-bottom: 0.8cm;
  color: #334155;
  font-family: 'Lora', serif;
  font-size: 11.5pt;
}

li { margin-bottom: 0.3cm; line-height: 1.6; }

.page-break { page-break-before: always; }

pre {
  background: #0f172a;
  color: #f8fafc;
  padding: 20px;
  border-radius: 12px;
  font-size: 10pt;
  white-space: pre-wrap;
  margin: 1cm 0;
  border: 1px solid rgba(255,255,255,0.05);
  line-height: 1.5;
}

code {
  font-family: 'Inter', monospace;
}

.mermaid-wrapper {
  margin: 1cm 0;
  padding: 0;
  display: flex;
  justify-content: center;
  width: 100%;
}

.mermaid { margin: 0; text-align: center; width: 100%; }

table {
  width: 100%;
  border-collapse: collapse;
  margin: 1cm 0;
  font-size: 10.5pt;
  page-break-inside: auto;
}
th {
  background: #f8fafc;
  color: #0369a1;
  font-weight: 700;
  text-transform: uppercase;
  font-size: 9pt;
  letter-spacing: 0.05em;
  padding: 12px;
  border-bottom: 2px solid #e2e8f0;
  text-align: left;
}
td {
  padding: 12px;
  border-bottom: 1px solid #f1f5f9;
  color: #475569;
}
tr {
  page-break-inside: avoid;
  page-break-after: auto;
}
img {
  max-width: 100%;
  height: auto;
  border-radius: 8px;
}

.content-page {
  padding: 0;
  page-break-after: always;
  word-break: break-word;
}

.cover-page {
  min-height: 90vh;
  width: 100%;
  background-size: cover;
  background-position: center;
  color: white;
  display: flex;
  flex-direction: column;
  align-items: center;
  text-align: center;
  padding: 2cm;
  page-break-after: always;
  position: relative;
  box-sizing: border-box;
}
.logo-container {
  margin-top: 2cm;
  padding: 15px;
  display: flex;
  justify-content: center;
}
.logo {
  width: 140px;
  height: auto;
}
.university {
  font-size: 32px;
  letter-spacing: 2px;
  font-weight: 700;
  margin-top: 10px;
  text-transform: uppercase;
}
.program {
  font-size: 18px;
  font-weight: 400;
  margin-top: 8px;
  opacity: 0.9;
}
.title-section {
  margin-top: 2.5cm;
  margin-bottom: 2cm;
}
.report-title {
  font-size: 34px;
  font-weight: 800;
  line-height: 1.2;
  margin-bottom: 20px;
  width: 100%;
  padding: 0 40px;
  box-sizing: border-box;
  word-wrap: break-word;
}
.report-subtitle {
  font-size: 20px;
  font-weight: 600;
  opacity: 0.95;
  width: 100%;
  padding: 0 40px;
  box-sizing: border-box;
  word-wrap: break-word;
}
.course-info {
  margin-top: 1.5cm;
  font-size: 16px;
  width: 90%;
  border-bottom: 1px solid rgba(255,255,255,0.2);
  padding-bottom: 12px;
  text-align: center;
  box-sizing: border-box;
  word-wrap: break-word;
}
.student-details {
  margin-top: 1cm;
  font-size: 15px;
  width: 60%;
}
.details-row {
  display: flex;
  justify-content: space-between;
  padding: 6px 0;
  border-bottom: 1px solid rgba(255,255,255,0.15);
}
.details-label {
  font-weight: 600;
  opacity: 0.85;
}
.details-value {
  font-weight: 400;
}
"#;
