use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, header};
use axum::response::IntoResponse;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::{Photo, QualityRecord};
use crate::state::SharedState;

const FILE_FIELD: &str = "file";

/// Raster formats only. SVG can carry script and is served from the API origin.
const ALLOWED_IMAGE_TYPES: [&str; 4] = ["image/png", "image/jpeg", "image/webp", "image/gif"];

fn is_allowed_image(content_type: &str) -> bool {
    ALLOWED_IMAGE_TYPES
        .iter()
        .any(|allowed| content_type.eq_ignore_ascii_case(allowed))
}

struct Upload {
    file_name: String,
    content_type: String,
    data: Bytes,
}

/// Pull the `file` part out of a multipart body. Other parts are ignored.
async fn read_upload(headers: &HeaderMap, body: Bytes) -> Result<Upload, String> {
    let boundary = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| multer::parse_boundary(ct).ok())
        .ok_or_else(|| "Expected multipart/form-data with a boundary".to_string())?;

    let stream = futures_util::stream::once(async { Ok::<_, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Multipart error: {e}"))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field
            .file_name()
            .map(sanitize_file_name)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "photo".to_string());
        let content_type = field
            .content_type()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_default();
        let data = field
            .bytes()
            .await
            .map_err(|e| format!("Field read error: {e}"))?;

        return Ok(Upload {
            file_name,
            content_type,
            data,
        });
    }

    Err(format!("Missing '{FILE_FIELD}' field"))
}

/// Keep the base name and drop characters that would break a
/// Content-Disposition header.
fn sanitize_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    base.chars()
        .filter(|c| !c.is_control() && *c != '"')
        .take(200)
        .collect::<String>()
        .trim()
        .to_string()
}

async fn load_record(state: &SharedState, id: Uuid) -> Result<QualityRecord, AppError> {
    db::records::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Record not found".to_string()))
}

pub async fn list_by_record(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(record_id): Path<Uuid>,
) -> Result<Json<Vec<Photo>>, AppError> {
    load_record(&state, record_id).await?;
    let photos = db::photos::list_by_record(&state.pool, record_id).await?;
    Ok(Json(photos))
}

pub async fn upload(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(record_id): Path<Uuid>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Photo>, AppError> {
    let record = load_record(&state, record_id).await?;
    auth.require_author_or_admin(record.user_id, "add photos to this record")?;

    let upload = read_upload(&headers, body)
        .await
        .map_err(AppError::BadRequest)?;

    if !is_allowed_image(&upload.content_type) {
        return Err(AppError::BadRequest(format!(
            "Only {} uploads are accepted",
            ALLOWED_IMAGE_TYPES.join(", ")
        )));
    }
    if upload.data.is_empty() {
        return Err(AppError::BadRequest("Uploaded file is empty".to_string()));
    }
    if upload.data.len() > state.config.max_upload_size {
        return Err(AppError::BadRequest(format!(
            "File exceeds the {} byte upload limit",
            state.config.max_upload_size
        )));
    }

    let checksum = hex::encode(Sha256::digest(&upload.data));

    let photo = db::photos::create(
        &state.pool,
        record_id,
        &upload.file_name,
        &upload.content_type,
        &checksum,
        &upload.data,
    )
    .await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "photo.uploaded",
        "photo",
        Some(photo.id),
        Some(serde_json::json!({ "record_id": record_id, "size": photo.size_bytes })),
    )
    .await;

    Ok(Json(photo))
}

pub async fn download(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let blob = db::photos::find_blob(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Photo not found".to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, blob.content_type),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{}\"", blob.file_name),
            ),
            (header::CONTENT_SECURITY_POLICY, "sandbox".to_string()),
        ],
        blob.data,
    ))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let photo = db::photos::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Photo not found".to_string()))?;
    let record = load_record(&state, photo.record_id).await?;

    auth.require_author_or_admin(record.user_id, "delete photos from this record")?;

    db::photos::delete(&state.pool, id).await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "photo.deleted",
        "photo",
        Some(id),
        Some(serde_json::json!({ "record_id": photo.record_id })),
    )
    .await;

    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}
