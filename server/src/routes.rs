use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::header::{AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use tf_core::domain::error::AppError;
use tf_core::domain::job::JobRecord;
use tf_core::infra::auth::{require_subject, AuthProvider};
use tf_core::infra::storage::{ArtifactStore, UploadedFile};
use tf_core::usecase::export::{ExportService, DEFAULT_LANG};
use tf_core::usecase::ingest::{IngestService, UploadRequest};
use tf_core::usecase::library::JobLibrary;
use tf_core::usecase::status::StatusReporter;
use tf_core::usecase::translation::TranslationService;

use crate::error::ApiResult;

/// multipart の境界やヘッダ分の余裕
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// ハンドラ共有状態
#[derive(Clone)]
pub struct AppState {
    pub ingest: Arc<IngestService>,
    pub status: Arc<StatusReporter>,
    pub export: Arc<ExportService>,
    pub translation: Arc<TranslationService>,
    pub library: Arc<JobLibrary>,
    pub artifacts: Arc<ArtifactStore>,
    pub auth: Arc<dyn AuthProvider>,
}

impl AppState {
    /// ログイン必須ハンドラ用
    fn authorize(&self, headers: &HeaderMap) -> ApiResult<String> {
        Ok(require_subject(
            self.auth.as_ref(),
            bearer_token(headers).as_deref(),
        )?)
    }
}

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/files", get(list_files))
        .route("/upload", post(upload))
        .route("/check_status/{job_id}", get(check_status))
        .route("/audio/{filename}", get(serve_audio))
        .route("/download/{job_id}", get(download))
        .route("/translate_on_fly", post(translate_on_fly))
        .route("/delete/{job_id}", post(delete_job))
        .route("/clear_all", post(clear_all))
        .layer(DefaultBodyLimit::max(
            max_upload_bytes.saturating_add(MULTIPART_OVERHEAD),
        ))
        .with_state(state)
}

// --- Payloads ---

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    pub filename: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    #[serde(rename = "type", default = "default_export_type")]
    kind: String,
    #[serde(default)]
    lang: Option<String>,
}

fn default_export_type() -> String {
    "txt".to_string()
}

#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    #[serde(default)]
    transcript: String,
    #[serde(default)]
    summary: String,
    target: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TranslateResponse {
    pub success: bool,
    pub translated_text: String,
    pub translated_summary: String,
}

// --- Handlers ---

async fn list_files(State(state): State<AppState>) -> ApiResult<Json<Vec<UploadedFile>>> {
    Ok(Json(state.library.list_uploads().await?))
}

async fn upload(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let mut audio: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::invalid_input(format!("Malformed upload: {e}")))?
    {
        if field.name() != Some("audio") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::invalid_input(format!("Malformed upload: {e}")))?;
        audio = Some((file_name, bytes.to_vec()));
    }

    let Some((file_name, bytes)) = audio else {
        return Err(AppError::invalid_input("No file part").into());
    };

    let job_id = state
        .ingest
        .ingest(UploadRequest {
            file_name,
            bytes,
            client_key: addr.ip().to_string(),
            bearer_token: bearer_token(&headers),
        })
        .await?;

    Ok(Json(UploadResponse {
        message: "Upload successful".to_string(),
        filename: job_id,
    }))
}

async fn check_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Json<JobRecord> {
    Json(state.status.status(&job_id))
}

async fn serve_audio(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ApiResult<Response> {
    let bytes = state.artifacts.read_audio(&filename).await?;
    Ok(([(CONTENT_TYPE, audio_content_type(&filename))], bytes).into_response())
}

async fn download(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Query(query): Query<DownloadQuery>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    state.authorize(&headers)?;
    let lang = query.lang.as_deref().unwrap_or(DEFAULT_LANG);
    let report = state.export.export(&job_id, &query.kind, lang).await?;

    let content_type = HeaderValue::from_str(&report.content_type)
        .map_err(|_| AppError::internal("Invalid content type"))?;
    let disposition =
        HeaderValue::from_str(&format!("attachment; filename=\"{}\"", report.file_name))
            .map_err(|_| AppError::invalid_input("Invalid file name"))?;

    Ok((
        [(CONTENT_TYPE, content_type), (CONTENT_DISPOSITION, disposition)],
        report.body,
    )
        .into_response())
}

async fn translate_on_fly(
    State(state): State<AppState>,
    Json(req): Json<TranslateRequest>,
) -> ApiResult<Json<TranslateResponse>> {
    let report = state
        .translation
        .translate_report(&req.transcript, &req.summary, &req.target)
        .await?;
    Ok(Json(TranslateResponse {
        success: true,
        translated_text: report.transcript,
        translated_summary: report.summary,
    }))
}

async fn delete_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<SuccessResponse>> {
    let subject = state.authorize(&headers)?;
    log::info!("{subject} deleting {job_id}");
    state.library.delete(&job_id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

async fn clear_all(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<SuccessResponse>> {
    let subject = state.authorize(&headers)?;
    log::info!("{subject} clearing all uploads");
    state.library.clear_all().await?;
    Ok(Json(SuccessResponse { success: true }))
}

// --- Helpers ---

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

fn audio_content_type(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "m4a" => "audio/mp4",
        "flac" => "audio/flac",
        "aac" => "audio/aac",
        "ogg" => "audio/ogg",
        _ => "application/octet-stream",
    }
}
