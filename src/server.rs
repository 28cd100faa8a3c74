//! HTTP surface: the generation endpoint and the folder-upload endpoint.
//!
//! This layer is the single point that translates pipeline failures into
//! HTTP responses. Every failure — a browser that would not launch, an
//! export that died, even a request body that failed to parse — comes back
//! as `500` with a JSON `{"error": "..."}` body. Success is raw PDF bytes
//! with attachment headers. There is deliberately no retry, no queue and no
//! browser pooling: one render per request, synchronous from the caller's
//! point of view.

use crate::config::RenderConfig;
use crate::error::ReportError;
use crate::generate;
use crate::metadata::ReportMetadata;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Shared state handed to every handler.
pub struct AppState {
    pub config: RenderConfig,
}

/// Body of `POST /api/generate-pdf`.
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub markdown: String,
    #[serde(default)]
    pub metadata: ReportMetadata,
    /// Optional upload-batch base path (as returned by `POST /api/files`),
    /// added as an extra image-resolution candidate for this request.
    #[serde(default, rename = "basePath")]
    pub base_path: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Serialize)]
struct UploadedFile {
    #[serde(rename = "originalName")]
    original_name: String,
    #[serde(rename = "relativePath")]
    relative_path: String,
    url: String,
}

#[derive(Debug, Serialize)]
struct UploadResponse {
    file: UploadedFile,
}

/// Build the application router.
pub fn router(config: RenderConfig) -> Router {
    let state = Arc::new(AppState { config });
    Router::new()
        .route("/api/generate-pdf", post(generate_pdf))
        .route("/api/files", post(upload_file))
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(addr: SocketAddr, config: RenderConfig) -> Result<(), ReportError> {
    let app = router(config);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ReportError::Internal(format!("Failed to bind {addr}: {e}")))?;
    info!("Listening on http://{addr}");
    axum::serve(listener, app)
        .await
        .map_err(|e| ReportError::Internal(format!("Server error: {e}")))
}

// ── POST /api/generate-pdf ───────────────────────────────────────────────

async fn generate_pdf(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(p) => p,
        Err(rejection) => {
            return error_response(format!("Invalid request body: {rejection}"));
        }
    };

    let mut config = state.config.clone();
    if let Some(base) = req.base_path.as_deref() {
        match resolve_base_path(base, &config.upload_dir) {
            Some(dir) => config.asset_dirs.push(dir),
            // A bogus basePath only degrades image resolution; the render
            // itself still proceeds.
            None => warn!("Ignoring unresolvable basePath '{base}'"),
        }
    }

    match generate::generate(&req.markdown, &req.metadata, &config).await {
        Ok(output) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "application/pdf"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"report.pdf\"",
                ),
            ],
            output.pdf,
        )
            .into_response(),
        Err(e) => {
            error!("PDF generation failed: {e}");
            error_response(e.to_string())
        }
    }
}

fn error_response(message: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody { error: message }),
    )
        .into_response()
}

/// Map a client-visible batch base path back onto the upload directory.
///
/// Accepts the shapes the editor sends (`/api/uploads/<batch>/<dir>`,
/// `/uploads/<batch>/<dir>`, `uploads/<batch>/<dir>`); anything else, or any
/// path with non-normal components, resolves to nothing.
fn resolve_base_path(base: &str, upload_dir: &Path) -> Option<PathBuf> {
    let rest = base.strip_prefix("/api").unwrap_or(base);
    let rest = rest.strip_prefix('/').unwrap_or(rest);
    let rest = rest.strip_prefix("uploads/")?;

    let rel = Path::new(rest);
    if rel.components().any(|c| !matches!(c, Component::Normal(_))) {
        return None;
    }
    Some(upload_dir.join(rel))
}

// ── POST /api/files ──────────────────────────────────────────────────────

async fn upload_file(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
    match store_upload(multipart, &state.config.upload_dir).await {
        Ok(resp) => (StatusCode::OK, Json(resp)).into_response(),
        Err(e) => {
            error!("Upload failed: {e}");
            error_response(e.to_string())
        }
    }
}

async fn store_upload(
    mut multipart: Multipart,
    upload_dir: &Path,
) -> Result<UploadResponse, ReportError> {
    let mut file_bytes: Option<Vec<u8>> = None;
    let mut original_name = String::new();
    let mut batch_id: Option<String> = None;
    let mut relative_path: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ReportError::InvalidUpload {
            detail: format!("malformed multipart body: {e}"),
        })?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                original_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(|e| ReportError::InvalidUpload {
                    detail: format!("failed to read file part: {e}"),
                })?;
                file_bytes = Some(bytes.to_vec());
            }
            "batchId" => {
                batch_id = Some(field.text().await.map_err(|e| {
                    ReportError::InvalidUpload {
                        detail: format!("failed to read batchId: {e}"),
                    }
                })?);
            }
            "relativePath" => {
                relative_path = Some(field.text().await.map_err(|e| {
                    ReportError::InvalidUpload {
                        detail: format!("failed to read relativePath: {e}"),
                    }
                })?);
            }
            _ => {}
        }
    }

    let bytes = file_bytes.ok_or_else(|| ReportError::InvalidUpload {
        detail: "missing 'file' field".into(),
    })?;
    let batch_id = batch_id.ok_or_else(|| ReportError::InvalidUpload {
        detail: "missing 'batchId' field".into(),
    })?;
    let relative_path = relative_path.ok_or_else(|| ReportError::InvalidUpload {
        detail: "missing 'relativePath' field".into(),
    })?;

    let rel = sanitize_relative_path(&relative_path)?;
    let batch = sanitize_batch_id(&batch_id)?;

    let dest = upload_dir.join(&batch).join(&rel);
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ReportError::Internal(format!("create upload dir: {e}")))?;
    }
    tokio::fs::write(&dest, &bytes)
        .await
        .map_err(|e| ReportError::Internal(format!("write upload: {e}")))?;

    info!(
        "Stored upload '{}' ({} bytes) at {}",
        original_name,
        bytes.len(),
        dest.display()
    );

    Ok(UploadResponse {
        file: UploadedFile {
            original_name,
            url: format!("/uploads/{}/{}", batch, rel.display()),
            relative_path: rel.display().to_string(),
        },
    })
}

/// Validate an uploaded relative path: no absolute paths, no parent
/// components, nothing that could escape the batch directory.
fn sanitize_relative_path(raw: &str) -> Result<PathBuf, ReportError> {
    let path = Path::new(raw);
    if raw.is_empty()
        || path
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
    {
        return Err(ReportError::InvalidUpload {
            detail: format!("relativePath '{raw}' escapes the batch directory"),
        });
    }
    Ok(path.to_path_buf())
}

/// A batch id must be a single path component.
fn sanitize_batch_id(raw: &str) -> Result<String, ReportError> {
    let mut components = Path::new(raw).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(raw.to_string()),
        _ => Err(ReportError::InvalidUpload {
            detail: format!("invalid batchId '{raw}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_router(upload_dir: &Path) -> Router {
        let config = RenderConfig::builder()
            .upload_dir(upload_dir)
            .build()
            .unwrap();
        router(config)
    }

    #[tokio::test]
    async fn malformed_json_yields_500_with_error_field() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_router(dir.path());

        let request = Request::builder()
            .method("POST")
            .uri("/api/generate-pdf")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json["error"].as_str().unwrap().contains("Invalid request body"));
    }

    #[tokio::test]
    async fn upload_reconstructs_folder_structure() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_router(dir.path());

        let boundary = "xYzBoundary";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"batchId\"\r\n\r\n\
             batch-1\r\n\
             --{boundary}\r\n\
             Content-Disposition: form-data; name=\"relativePath\"\r\n\r\n\
             content/images/pic.png\r\n\
             --{boundary}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"pic.png\"\r\n\
             Content-Type: image/png\r\n\r\n\
             PNGBYTES\r\n\
             --{boundary}--\r\n"
        );

        let request = Request::builder()
            .method("POST")
            .uri("/api/files")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let stored = dir.path().join("batch-1/content/images/pic.png");
        assert_eq!(std::fs::read(&stored).unwrap(), b"PNGBYTES");

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["file"]["originalName"], "pic.png");
        assert_eq!(json["file"]["url"], "/uploads/batch-1/content/images/pic.png");
    }

    #[tokio::test]
    async fn upload_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_router(dir.path());

        let boundary = "xYzBoundary";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"batchId\"\r\n\r\n\
             batch-1\r\n\
             --{boundary}\r\n\
             Content-Disposition: form-data; name=\"relativePath\"\r\n\r\n\
             ../../evil.txt\r\n\
             --{boundary}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"evil.txt\"\r\n\r\n\
             nope\r\n\
             --{boundary}--\r\n"
        );

        let request = Request::builder()
            .method("POST")
            .uri("/api/files")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!dir.path().join("../evil.txt").exists());
    }

    #[test]
    fn sanitize_rejects_absolute_and_parent_paths() {
        assert!(sanitize_relative_path("/etc/passwd").is_err());
        assert!(sanitize_relative_path("a/../b").is_err());
        assert!(sanitize_relative_path("").is_err());
        assert!(sanitize_relative_path("content/images/x.png").is_ok());
    }

    #[test]
    fn sanitize_batch_id_is_single_component() {
        assert!(sanitize_batch_id("batch-1").is_ok());
        assert!(sanitize_batch_id("a/b").is_err());
        assert!(sanitize_batch_id("..").is_err());
        assert!(sanitize_batch_id("").is_err());
    }

    #[test]
    fn base_path_shapes_resolve_into_upload_dir() {
        let upload = Path::new("uploads");
        assert_eq!(
            resolve_base_path("/api/uploads/batch-1/content", upload),
            Some(PathBuf::from("uploads/batch-1/content"))
        );
        assert_eq!(
            resolve_base_path("/uploads/batch-1", upload),
            Some(PathBuf::from("uploads/batch-1"))
        );
        assert_eq!(
            resolve_base_path("uploads/batch-1", upload),
            Some(PathBuf::from("uploads/batch-1"))
        );
        assert_eq!(resolve_base_path("/elsewhere/batch-1", upload), None);
        assert_eq!(resolve_base_path("/uploads/../etc", upload), None);
    }
}
