use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use tf_core::domain::error::{AppError, ErrorCode};
use tf_core::domain::stt::SttError;
use tf_core::infra::translate::TranslateError;

/// HTTP ハンドラのエラー型
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    App(#[from] AppError),
}

pub type ApiResult<T> = Result<T, ApiError>;

pub fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorCode::TrialEnded => StatusCode::FORBIDDEN,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Translate => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let ApiError::App(err) = self;
        let status = status_for(err.code);
        if status.is_server_error() {
            log::error!("{err}");
        }

        let mut body = json!({
            "error": err.message,
            "code": err.code,
        });
        if err.code == ErrorCode::TrialEnded {
            body["trial_ended"] = json!(true);
        }
        (status, Json(body)).into_response()
    }
}

/// 起動時エラー
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Failed to load transcription model: {0}")]
    Model(#[from] SttError),
    #[error("Failed to prepare storage: {0}")]
    Storage(#[from] AppError),
    #[error("Failed to create translator: {0}")]
    Translator(#[from] TranslateError),
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },
    #[error("Server error: {0}")]
    Serve(std::io::Error),
}
