//! Asset inlining: rewrite relative `<img>` references to base64 data URIs.
//!
//! ## Why a streaming HTML rewriter?
//!
//! Literal string search-and-replace falls apart the moment two image tags
//! share a source, or two near-identical tags differ only in attributes.
//! `lol_html` visits every `img[src]` element independently and rewrites the
//! attribute in place, so duplicates are each handled and untouched markup
//! is emitted byte-for-byte.
//!
//! Resolution is deliberately forgiving: a reference that matches the
//! recognised relative pattern but exists in no candidate directory is left
//! exactly as written and logged — a broken image in the PDF beats a failed
//! render.

use crate::error::ReportError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use lol_html::{element, rewrite_str, RewriteStrSettings};
use std::cell::Cell;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// Result of an inlining pass over a content fragment.
pub struct InlineOutcome {
    /// The rewritten HTML.
    pub html: String,
    /// Images successfully inlined.
    pub inlined: usize,
    /// Recognised references that resolved to no file.
    pub unresolved: usize,
}

/// Inline every recognised relative image reference in `html`.
///
/// `candidate_dirs` are tried in order; the first directory containing the
/// referenced file wins. Reads are synchronous and read-only.
pub fn inline_images(
    html: &str,
    candidate_dirs: &[PathBuf],
) -> Result<InlineOutcome, ReportError> {
    let inlined = Cell::new(0usize);
    let unresolved = Cell::new(0usize);

    let rewritten = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!("img[src]", |el| {
                let src = el.get_attribute("src").unwrap_or_default();
                let Some(relative) = recognised_relative(&src) else {
                    return Ok(());
                };

                match resolve(relative, candidate_dirs) {
                    Some(path) => match std::fs::read(&path) {
                        Ok(bytes) => {
                            let uri = data_uri(&path, &bytes);
                            el.set_attribute("src", &uri)?;
                            debug!("Inlined '{}' from {}", src, path.display());
                            inlined.set(inlined.get() + 1);
                        }
                        Err(e) => {
                            warn!("Failed to read image '{}': {}", path.display(), e);
                            unresolved.set(unresolved.get() + 1);
                        }
                    },
                    None => {
                        warn!("Image '{}' not found in any candidate directory", src);
                        unresolved.set(unresolved.get() + 1);
                    }
                }
                Ok(())
            })],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|e| ReportError::Internal(format!("HTML rewrite failed: {e}")))?;

    Ok(InlineOutcome {
        html: rewritten,
        inlined: inlined.get(),
        unresolved: unresolved.get(),
    })
}

/// Return the relative path for sources matching the recognised pattern
/// (`./images/…` or `images/…`), with any leading `./` stripped.
fn recognised_relative(src: &str) -> Option<&str> {
    let rest = src.strip_prefix("./").unwrap_or(src);
    if rest.starts_with("images/") {
        Some(rest)
    } else {
        None
    }
}

/// Resolve `relative` against each candidate directory in priority order.
///
/// Paths with parent-directory components never resolve: an uploaded
/// document must not read outside its candidate directories.
fn resolve(relative: &str, candidate_dirs: &[PathBuf]) -> Option<PathBuf> {
    let rel = Path::new(relative);
    if rel
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        warn!("Rejecting image path with non-normal components: '{relative}'");
        return None;
    }

    candidate_dirs
        .iter()
        .map(|dir| dir.join(rel))
        .find(|p| p.is_file())
}

/// Build a `data:` URI for the file's bytes, deriving the MIME type from the
/// extension (`.svg` → `image/svg+xml`, `.jpg` → `image/jpeg`, else
/// `image/<ext>`).
fn data_uri(path: &Path, bytes: &[u8]) -> String {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("png")
        .to_ascii_lowercase();
    let mime = match ext.as_str() {
        "svg" => "svg+xml".to_string(),
        "jpg" => "jpeg".to_string(),
        other => other.to_string(),
    };
    format!("data:image/{};base64,{}", mime, STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn fixture_dir(files: &[(&str, &[u8])]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        for (rel, bytes) in files {
            let path = dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, bytes).unwrap();
        }
        dir
    }

    #[test]
    fn inlines_and_round_trips_exact_bytes() {
        let payload: &[u8] = &[0x89, b'P', b'N', b'G', 0, 1, 2, 3];
        let dir = fixture_dir(&[("images/pic.png", payload)]);

        let html = r#"<p><img src="./images/pic.png" alt="pic"></p>"#;
        let out = inline_images(html, &[dir.path().to_path_buf()]).unwrap();

        assert_eq!(out.inlined, 1);
        assert_eq!(out.unresolved, 0);
        let start = out.html.find("base64,").unwrap() + "base64,".len();
        let end = out.html[start..].find('"').unwrap() + start;
        let decoded = STANDARD.decode(&out.html[start..end]).unwrap();
        assert_eq!(decoded, payload);
        assert!(out.html.contains("data:image/png;base64,"));
    }

    #[test]
    fn duplicate_tags_are_each_replaced() {
        let dir = fixture_dir(&[("images/a.png", b"bytes")]);
        let html = r#"<img src="images/a.png"><img src="images/a.png">"#;
        let out = inline_images(html, &[dir.path().to_path_buf()]).unwrap();
        assert_eq!(out.inlined, 2);
        assert_eq!(out.html.matches("data:image/png").count(), 2);
    }

    #[test]
    fn unresolved_reference_left_byte_identical() {
        let html = r#"<p><img src="./images/missing.png" alt="x"></p>"#;
        let out = inline_images(html, &[PathBuf::from("/nonexistent")]).unwrap();
        assert_eq!(out.html, html);
        assert_eq!(out.unresolved, 1);
        assert_eq!(out.inlined, 0);
    }

    #[test]
    fn non_relative_sources_are_ignored() {
        let html = r#"<img src="https://example.com/images/pic.png">"#;
        let out = inline_images(html, &[]).unwrap();
        assert_eq!(out.html, html);
        assert_eq!(out.unresolved, 0);
    }

    #[test]
    fn first_candidate_directory_wins() {
        let first = fixture_dir(&[("images/pic.png", b"first")]);
        let second = fixture_dir(&[("images/pic.png", b"second")]);
        let out = inline_images(
            r#"<img src="images/pic.png">"#,
            &[first.path().to_path_buf(), second.path().to_path_buf()],
        )
        .unwrap();
        let encoded = STANDARD.encode(b"first");
        assert!(out.html.contains(&encoded));
    }

    #[test]
    fn mime_special_cases() {
        let dir = fixture_dir(&[("images/v.svg", b"<svg/>"), ("images/p.jpg", b"jj")]);
        let dirs = vec![dir.path().to_path_buf()];
        let svg = inline_images(r#"<img src="images/v.svg">"#, &dirs).unwrap();
        assert!(svg.html.contains("data:image/svg+xml;base64,"));
        let jpg = inline_images(r#"<img src="images/p.jpg">"#, &dirs).unwrap();
        assert!(jpg.html.contains("data:image/jpeg;base64,"));
    }

    #[test]
    fn parent_components_never_resolve() {
        let dir = fixture_dir(&[("secret.txt", b"secret")]);
        let html = r#"<img src="images/../secret.txt">"#;
        let out = inline_images(html, &[dir.path().join("images")]).unwrap();
        assert_eq!(out.html, html);
        assert_eq!(out.unresolved, 1);
    }
}
