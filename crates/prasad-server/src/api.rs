use std::io::Cursor;
use std::sync::Arc;

use axum::{
    extract::{
        multipart::MultipartError, rejection::QueryRejection, DefaultBodyLimit, Multipart, Path,
        Query, State,
    },
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use prasad_shared::constants::{
    APP_NAME, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT, UPLOADS_URL_PREFIX,
};
use prasad_shared::{ImageCategory, ImageMetadata};
use prasad_store::ImageRecord;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ServerError;
use crate::images::{ImageService, IncomingImage};

/// Request bodies may carry several files in one multipart form.
const MAX_REQUEST_BODY: usize = 50 * 1024 * 1024;

/// Multipart boundaries and headers on top of the file bytes.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Form fields copied into an image's metadata when present and non-empty.
const UPLOAD_METADATA_FIELDS: [&str; 3] = ["user_id", "product_id", "category_id"];
const MULTI_UPLOAD_METADATA_FIELDS: [&str; 1] = ["user_id"];

#[derive(Clone)]
pub struct AppState {
    pub images: Arc<ImageService>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    let body_limit = MAX_REQUEST_BODY
        .max(state.images.max_upload_size() as usize + MULTIPART_OVERHEAD);
    let upload_root = state.images.layout().root().to_path_buf();

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/api/v1/images", get(list_images))
        .route("/api/v1/images/", get(list_images))
        .route("/api/v1/images/upload", post(upload_image))
        .route("/api/v1/images/upload/", post(upload_image))
        .route("/api/v1/images/upload-multiple", post(upload_multiple_images))
        .route("/api/v1/images/upload-multiple/", post(upload_multiple_images))
        .route("/api/v1/images/stats/overview", get(image_stats))
        .route("/api/v1/images/{id}", get(get_image).delete(delete_image))
        .route("/api/v1/images/{id}/file", get(get_image_file))
        .nest_service(UPLOADS_URL_PREFIX, ServeDir::new(upload_root))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct UploadResponse {
    message: &'static str,
    image_id: Uuid,
    image_url: String,
    reason: ImageCategory,
    filename: String,
    size: u64,
}

#[derive(Serialize)]
struct UploadResult {
    filename: String,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct MultiUploadResponse {
    message: &'static str,
    results: Vec<UploadResult>,
}

#[derive(Serialize)]
struct ImageSummary {
    id: Uuid,
    image_url: String,
    reason: ImageCategory,
    original_filename: String,
    size: u64,
    uploaded_at: String,
    metadata: ImageMetadata,
}

impl From<ImageRecord> for ImageSummary {
    fn from(record: ImageRecord) -> Self {
        Self {
            id: record.id,
            image_url: record.public_url,
            reason: record.category,
            original_filename: record.original_filename,
            size: record.size_bytes,
            uploaded_at: record.uploaded_at.to_rfc3339(),
            metadata: record.metadata,
        }
    }
}

#[derive(Serialize)]
struct ImageDetail {
    id: Uuid,
    image_url: String,
    reason: ImageCategory,
    original_filename: String,
    stored_filename: String,
    file_path: String,
    content_type: String,
    size: u64,
    uploaded_at: String,
    metadata: ImageMetadata,
}

impl From<ImageRecord> for ImageDetail {
    fn from(record: ImageRecord) -> Self {
        Self {
            id: record.id,
            image_url: record.public_url,
            reason: record.category,
            original_filename: record.original_filename,
            stored_filename: record.stored_filename,
            file_path: record.storage_path,
            content_type: record.content_type,
            size: record.size_bytes,
            uploaded_at: record.uploaded_at.to_rfc3339(),
            metadata: record.metadata,
        }
    }
}

#[derive(Serialize)]
struct ImageListResponse {
    total: u64,
    skip: u64,
    limit: u64,
    images: Vec<ImageSummary>,
}

#[derive(Deserialize)]
struct ListQuery {
    reason: Option<String>,
    skip: Option<i64>,
    limit: Option<i64>,
}

#[derive(Serialize)]
struct StatsResponse {
    total_images: u64,
    by_reason: serde_json::Map<String, serde_json::Value>,
}

async fn root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: format!("Hello {APP_NAME}"),
    })
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ─── Multipart form handling ───

struct UploadedFile {
    file_name: String,
    content_type: String,
    data: Bytes,
}

struct UploadForm {
    category: Option<ImageCategory>,
    files: Vec<UploadedFile>,
    metadata: ImageMetadata,
}

impl UploadForm {
    fn require_category(&self) -> Result<ImageCategory, ServerError> {
        self.category.ok_or_else(|| {
            ServerError::BadRequest("Missing 'reason' field in multipart form".to_string())
        })
    }
}

/// A body cut off at the request limit is an oversized upload, not a
/// malformed form.
fn multipart_error(context: &str, e: MultipartError, max_upload_size: u64) -> ServerError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ServerError::FileTooLarge {
            size: None,
            max: max_upload_size,
        }
    } else {
        ServerError::BadRequest(format!("{context}: {e}"))
    }
}

/// Collect the `reason` field, every part named `file_field`, and the
/// listed metadata fields. Unknown fields are skipped.
async fn read_upload_form(
    multipart: &mut Multipart,
    file_field: &str,
    metadata_fields: &[&str],
    max_upload_size: u64,
) -> Result<UploadForm, ServerError> {
    let mut form = UploadForm {
        category: None,
        files: Vec::new(),
        metadata: ImageMetadata::new(),
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Multipart error", e, max_upload_size))?
    {
        let name = field.name().unwrap_or("").to_string();

        if name == file_field {
            let file_name = field.file_name().unwrap_or("").to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| multipart_error("Failed to read field", e, max_upload_size))?;
            form.files.push(UploadedFile {
                file_name,
                content_type,
                data,
            });
        } else if name == "reason" || metadata_fields.contains(&name.as_str()) {
            let value = field
                .text()
                .await
                .map_err(|e| multipart_error("Failed to read field", e, max_upload_size))?;
            if name == "reason" {
                let category = value
                    .trim()
                    .parse::<ImageCategory>()
                    .map_err(|e| ServerError::BadRequest(e.to_string()))?;
                form.category = Some(category);
            } else if !value.is_empty() {
                form.metadata.insert(name, value);
            }
        }
    }

    Ok(form)
}

async fn save_uploaded(
    images: &ImageService,
    file: UploadedFile,
    category: ImageCategory,
    metadata: ImageMetadata,
) -> Result<ImageRecord, ServerError> {
    let mut stream = Cursor::new(file.data);
    images
        .save(
            &mut stream,
            IncomingImage {
                original_filename: file.file_name,
                content_type: file.content_type,
                category,
                metadata,
            },
        )
        .await
}

// ─── Image endpoints ───

async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ServerError> {
    let form = read_upload_form(
        &mut multipart,
        "file",
        &UPLOAD_METADATA_FIELDS,
        state.images.max_upload_size(),
    )
    .await?;
    let category = form.require_category()?;
    let file = form.files.into_iter().next().ok_or_else(|| {
        ServerError::BadRequest("Missing 'file' field in multipart form".to_string())
    })?;

    let record = save_uploaded(&state.images, file, category, form.metadata).await?;

    info!(id = %record.id, size = record.size_bytes, "Image uploaded via API");

    Ok(Json(UploadResponse {
        message: "Image uploaded successfully",
        image_id: record.id,
        image_url: record.public_url,
        reason: record.category,
        filename: record.stored_filename,
        size: record.size_bytes,
    }))
}

/// Each file is saved on its own; one failure does not stop the rest.
async fn upload_multiple_images(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<MultiUploadResponse>, ServerError> {
    let form = read_upload_form(
        &mut multipart,
        "files",
        &MULTI_UPLOAD_METADATA_FIELDS,
        state.images.max_upload_size(),
    )
    .await?;
    let category = form.require_category()?;
    if form.files.is_empty() {
        return Err(ServerError::BadRequest(
            "Missing 'files' field in multipart form".to_string(),
        ));
    }

    let mut results = Vec::with_capacity(form.files.len());
    for file in form.files {
        let filename = file.file_name.clone();
        match save_uploaded(&state.images, file, category, form.metadata.clone()).await {
            Ok(record) => results.push(UploadResult {
                filename,
                status: "success",
                image_id: Some(record.id),
                image_url: Some(record.public_url),
                error: None,
            }),
            Err(e) => {
                warn!(file = %filename, error = %e, "Image in batch upload failed");
                results.push(UploadResult {
                    filename,
                    status: "failed",
                    image_id: None,
                    image_url: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    Ok(Json(MultiUploadResponse {
        message: "Multiple upload completed",
        results,
    }))
}

async fn list_images(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<ImageListResponse>, ServerError> {
    let Query(query) = query.map_err(|e| ServerError::BadRequest(e.body_text()))?;

    let category = query
        .reason
        .as_deref()
        .filter(|r| !r.is_empty())
        .map(|r| r.parse::<ImageCategory>())
        .transpose()
        .map_err(|e| ServerError::BadRequest(e.to_string()))?;

    let skip = query.skip.unwrap_or(0);
    if skip < 0 {
        return Err(ServerError::BadRequest("skip must be >= 0".to_string()));
    }
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_LIMIT as i64);
    if limit < 1 || limit > MAX_PAGE_LIMIT as i64 {
        return Err(ServerError::BadRequest(format!(
            "limit must be between 1 and {MAX_PAGE_LIMIT}"
        )));
    }
    let (skip, limit) = (skip as u64, limit as u64);

    let (images, total) = match category {
        Some(category) => (
            state.images.list_by_category(category, skip, limit).await?,
            state.images.count_by_category(category).await?,
        ),
        None => (
            state.images.list_all(skip, limit).await?,
            state.images.count_all().await?,
        ),
    };

    Ok(Json(ImageListResponse {
        total,
        skip,
        limit,
        images: images.into_iter().map(ImageSummary::from).collect(),
    }))
}

async fn get_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ImageDetail>, ServerError> {
    let id = parse_image_id(&id)?;
    let record = state
        .images
        .get_by_id(id)
        .await?
        .ok_or_else(|| ServerError::NotFound("Image not found".to_string()))?;
    Ok(Json(ImageDetail::from(record)))
}

async fn get_image_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ServerError> {
    let id = parse_image_id(&id)?;
    let (record, data) = state.images.read_file(id).await?;

    let disposition = content_disposition(&record.original_filename);

    Ok((
        [
            (header::CONTENT_TYPE, record.content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        data,
    )
        .into_response())
}

async fn delete_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ServerError> {
    let id = parse_image_id(&id)?;
    state.images.delete(id).await?;
    Ok(Json(MessageResponse {
        message: "Image deleted successfully".to_string(),
    }))
}

async fn image_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ServerError> {
    let stats = state.images.stats().await?;
    let by_reason = stats
        .by_category
        .into_iter()
        .map(|(category, count)| (category.as_str().to_string(), count.into()))
        .collect();

    Ok(Json(StatsResponse {
        total_images: stats.total,
        by_reason,
    }))
}

fn parse_image_id(raw: &str) -> Result<Uuid, ServerError> {
    Uuid::parse_str(raw).map_err(|_| ServerError::BadRequest(format!("Invalid image id: {raw}")))
}

/// Printable ASCII without quotes or backslashes, for a quoted header value.
fn header_safe_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| (c.is_ascii_graphic() || *c == ' ') && *c != '"' && *c != '\\')
        .collect();
    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned
    }
}

/// `attachment` disposition with an ASCII `filename` and, when the name does
/// not survive that, an RFC 5987 `filename*` carrying it in full.
fn content_disposition(name: &str) -> String {
    let fallback = header_safe_filename(name);
    if fallback == name || name.is_empty() {
        format!("attachment; filename=\"{fallback}\"")
    } else {
        format!(
            "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
            encode_ext_value(name)
        )
    }
}

/// Percent-encode everything outside the RFC 5987 `attr-char` set.
fn encode_ext_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len() * 3);
    for byte in value.bytes() {
        let keep = byte.is_ascii_alphanumeric()
            || matches!(
                byte,
                b'!' | b'#' | b'$' | b'&' | b'+' | b'-' | b'.' | b'^' | b'_' | b'`' | b'|' | b'~'
            );
        if keep {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
