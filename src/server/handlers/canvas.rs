//! Canvas API handlers.

use axum::{
    Json,
    body::{Body, Bytes},
    extract::{Multipart, Path, Query, State, rejection::JsonRejection},
    http::header,
    response::IntoResponse,
};
use futures_util::stream;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::canvas::{AppendOutcome, CreatedCanvas};
use crate::element::ElementSpec;
use crate::error::EaselError;
use crate::export::{ExportFormat, ExportedFile, ExportedPdf};
use crate::fetch::UploadedFile;
use crate::session::SessionSummary;

use super::super::state::AppState;

/// Export bytes are sent in chunks of this size.
const STREAM_CHUNK: usize = 64 * 1024;

/// Request body for canvas creation.
#[derive(Debug, Deserialize)]
pub struct InitRequest {
    pub width: Option<i64>,
    pub height: Option<i64>,
    #[serde(default)]
    pub id: Option<String>,
}

/// Request body for the JSON append endpoint.
#[derive(Debug, Deserialize)]
pub struct AddElementRequest {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub properties: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub id: Option<String>,
    /// `pdf` (default) or `zip`.
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FormatQuery {
    #[serde(default)]
    pub format: Option<String>,
}

fn export_format(format: Option<&str>) -> Result<ExportFormat, EaselError> {
    format.unwrap_or_default().parse()
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, EaselError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| EaselError::validation(rejection.body_text()))
}

fn required_id(id: Option<String>) -> Result<String, EaselError> {
    id.map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| EaselError::validation("Missing canvas id"))
}

/// POST /api/canvas/init - Create a blank canvas.
pub async fn init(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<InitRequest>, JsonRejection>,
) -> Result<Json<CreatedCanvas>, EaselError> {
    let req = json_body(payload)?;
    let created = state
        .canvas
        .create_session(req.width, req.height, req.id)
        .await?;
    Ok(Json(created))
}

/// POST /api/canvas/elements - Append one element described as JSON.
pub async fn add_element(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AddElementRequest>, JsonRejection>,
) -> Result<Json<AppendOutcome>, EaselError> {
    let req = json_body(payload)?;
    let id = required_id(req.id)?;

    // Unknown canvas is reported before a malformed element.
    state.canvas.store().get(&id).await?;

    let kind = req
        .kind
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| EaselError::validation("Missing element type"))?;
    let properties = req.properties.unwrap_or_else(|| json!({}));
    let spec: ElementSpec = serde_json::from_value(json!({
        "type": kind.trim().to_ascii_lowercase(),
        "properties": properties,
    }))
    .map_err(|e| EaselError::validation(format!("Invalid element: {}", e)))?;

    let outcome = state.canvas.append_element(&id, spec).await?;
    Ok(Json(outcome))
}

/// POST /api/canvas/add - Append one element from multipart form fields.
///
/// An `image` file part is stored under the upload directory for the
/// duration of the request and removed afterwards, whatever the outcome.
pub async fn add_multipart(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<AppendOutcome>, EaselError> {
    let mut fields: HashMap<String, String> = HashMap::new();
    let mut upload: Option<UploadedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| EaselError::validation(format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == "image" && field.file_name().is_some() {
            let filename = field.file_name().unwrap_or("upload").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| EaselError::validation(format!("Failed to read image: {}", e)))?;
            if bytes.is_empty() {
                continue;
            }

            tokio::fs::create_dir_all(&state.config.upload_dir).await?;
            let path = state.config.upload_dir.join(Uuid::new_v4().to_string());
            tokio::fs::write(&path, &bytes).await?;
            debug!(file = %filename, path = %path.display(), size = bytes.len(), "Stored upload");
            upload = Some(UploadedFile::new(path, filename));
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| EaselError::validation(format!("Failed to read field '{}': {}", name, e)))?;
            fields.insert(name, value);
        }
    }

    let id = required_id(fields.remove("id"))?;
    state.canvas.store().get(&id).await?;

    let kind = match fields.remove("type") {
        Some(kind) => kind,
        None if upload.is_some() => "image".to_string(),
        None => String::new(),
    };
    let spec = ElementSpec::from_fields(&kind, &fields, upload)?;

    let outcome = state.canvas.append_element(&id, spec).await?;
    Ok(Json(outcome))
}

/// GET /api/canvas/export?id=&format= - Download the canvas as PDF, or as a
/// zip holding the PDF.
pub async fn export_query(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse, EaselError> {
    let id = required_id(query.id)?;
    let format = export_format(query.format.as_deref())?;
    let pdf = state.canvas.export_session(&id).await?;
    Ok(file_response(package(pdf, format).await?))
}

/// GET /api/canvas/export/:id?format= - Download the canvas as PDF, or as a
/// zip holding the PDF.
pub async fn export_path(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<FormatQuery>,
) -> Result<impl IntoResponse, EaselError> {
    let format = export_format(query.format.as_deref())?;
    let pdf = state.canvas.export_session(&id).await?;
    Ok(file_response(package(pdf, format).await?))
}

async fn package(pdf: ExportedPdf, format: ExportFormat) -> Result<ExportedFile, EaselError> {
    if format == ExportFormat::Pdf {
        return pdf.into_file(format);
    }
    tokio::task::spawn_blocking(move || pdf.into_file(format))
        .await
        .map_err(|e| EaselError::Export(format!("Packaging task failed: {}", e)))?
}

fn file_response(file: ExportedFile) -> impl IntoResponse {
    let disposition = format!("attachment; filename=\"{}\"", file.filename);
    let length = file.bytes.len().to_string();

    let bytes = Bytes::from(file.bytes);
    let chunks: Vec<Result<Bytes, std::io::Error>> = (0..bytes.len())
        .step_by(STREAM_CHUNK)
        .map(|start| Ok(bytes.slice(start..(start + STREAM_CHUNK).min(bytes.len()))))
        .collect();

    (
        [
            (header::CONTENT_TYPE, file.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CONTENT_LENGTH, length),
        ],
        Body::from_stream(stream::iter(chunks)),
    )
}

/// GET /api/canvas/:id - Session summary.
pub async fn describe(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionSummary>, EaselError> {
    Ok(Json(state.canvas.describe(&id).await?))
}

/// GET /api/canvas/:id/preview - Full-resolution PNG of the surface.
pub async fn preview(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, EaselError> {
    let png = state.canvas.preview_png(&id).await?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}
