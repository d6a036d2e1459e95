// SPDX-License-Identifier: MIT

//! Activity upload API routes.
//!
//! All routes require authentication; the auth middleware is applied in
//! routes/mod.rs.

use crate::config::MAX_UPLOAD_BYTES;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{LinkType, UploadStatus};
use crate::services::ingest::{IngestOutcome, UploadDetail, UploadProcessor};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Recent-uploads listing size.
const RECENT_UPLOADS_LIMIT: u32 = 15;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/uploads/activities",
            post(upload_activity).get(list_uploads),
        )
        .route("/api/uploads/activities/{upload_id}", get(get_upload))
        .route(
            "/api/uploads/activities/{upload_id}/attach",
            post(attach_upload),
        )
        // Headroom over the file limit for multipart framing; the exact
        // 20 MiB check happens against the decoded file bytes.
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 1024 * 1024))
}

// ─── Upload Ingestion ────────────────────────────────────────

/// Successful ingestion response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadAcceptedResponse {
    pub upload_id: String,
    pub completed_activity_id: String,
    /// Whether auto-matching linked the activity to a planned session
    pub matched: bool,
}

/// Idempotent re-upload response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateResponse {
    pub duplicate: bool,
    pub upload_id: String,
    pub status: UploadStatus,
}

/// Parse failure response; the upload row is kept with status `error`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseFailedResponse {
    pub error: String,
    pub upload_id: String,
}

/// Ingest one uploaded activity file.
///
/// Multipart form with a single `file` field. The whole pipeline runs
/// synchronously within this request; see `services::ingest`.
async fn upload_activity(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Result<Response> {
    let mut file: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() == Some("file") {
            let filename = field
                .file_name()
                .map(str::to_string)
                .ok_or_else(|| AppError::Validation("Missing filename".to_string()))?;
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read file: {}", e)))?;
            file = Some((filename, bytes.to_vec()));
        }
    }
    let (filename, bytes) = file.ok_or_else(|| AppError::Validation("Missing file".to_string()))?;

    tracing::debug!(
        user_id = %user.user_id,
        filename = %filename,
        size = bytes.len(),
        "Received activity upload"
    );

    let processor = UploadProcessor::new(state.db.clone());
    let outcome = processor
        .process_upload(&user.user_id, &filename, &bytes)
        .await?;

    Ok(match outcome {
        IngestOutcome::Duplicate { upload_id, status } => Json(DuplicateResponse {
            duplicate: true,
            upload_id,
            status,
        })
        .into_response(),
        IngestOutcome::Completed {
            upload_id,
            activity_id,
            matched,
        } => Json(UploadAcceptedResponse {
            upload_id,
            completed_activity_id: activity_id,
            matched,
        })
        .into_response(),
        IngestOutcome::ParseFailed { upload_id, message } => (
            StatusCode::BAD_REQUEST,
            Json(ParseFailedResponse {
                error: message,
                upload_id,
            }),
        )
            .into_response(),
    })
}

// ─── Upload Listing ──────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySummary {
    pub id: String,
    pub sport_type: String,
    pub duration_sec: u32,
    pub distance_m: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkSummary {
    pub planned_session_id: String,
    pub link_type: LinkType,
    pub confidence: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSummary {
    pub id: String,
    pub filename: String,
    pub file_type: String,
    pub file_size: u64,
    pub status: UploadStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity: Option<ActivitySummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<LinkSummary>,
}

impl From<UploadDetail> for UploadSummary {
    fn from(detail: UploadDetail) -> Self {
        let UploadDetail {
            upload,
            activity,
            link,
        } = detail;
        Self {
            id: upload.id,
            filename: upload.filename,
            file_type: upload.format.as_str().to_string(),
            file_size: upload.size_bytes,
            status: upload.status,
            error_message: upload.error_message,
            created_at: format_utc_rfc3339(upload.created_at),
            activity: activity.map(|a| ActivitySummary {
                id: a.id,
                sport_type: a.sport.as_str().to_string(),
                duration_sec: a.duration_sec,
                distance_m: a.distance_m,
            }),
            link: link.map(|l| LinkSummary {
                planned_session_id: l.planned_session_id,
                link_type: l.link_type,
                confidence: l.confidence,
            }),
        }
    }
}

#[derive(Serialize)]
pub struct UploadsResponse {
    pub uploads: Vec<UploadSummary>,
}

/// Recent uploads for the current user, newest first.
async fn list_uploads(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UploadsResponse>> {
    let processor = UploadProcessor::new(state.db.clone());
    let details = processor
        .recent_uploads(&user.user_id, RECENT_UPLOADS_LIMIT)
        .await?;

    Ok(Json(UploadsResponse {
        uploads: details.into_iter().map(UploadSummary::from).collect(),
    }))
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub upload: UploadSummary,
}

/// One upload with its activity and link detail.
async fn get_upload(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(upload_id): Path<String>,
) -> Result<Json<UploadResponse>> {
    let processor = UploadProcessor::new(state.db.clone());
    let detail = processor.upload_detail(&user.user_id, &upload_id).await?;

    Ok(Json(UploadResponse {
        upload: detail.into(),
    }))
}

// ─── Manual Attach ───────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachRequest {
    pub planned_session_id: String,
}

#[derive(Serialize)]
pub struct AttachResponse {
    pub ok: bool,
}

/// Force-link an upload's activity to a chosen planned session.
async fn attach_upload(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(upload_id): Path<String>,
    Json(payload): Json<AttachRequest>,
) -> Result<Json<AttachResponse>> {
    let processor = UploadProcessor::new(state.db.clone());
    processor
        .attach(&user.user_id, &upload_id, &payload.planned_session_id)
        .await?;

    Ok(Json(AttachResponse { ok: true }))
}
