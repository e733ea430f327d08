use serde::Serialize;

use super::stt::{SttError, SttErrorKind};

/// アプリケーション共通エラーコード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorCode {
    #[serde(rename = "E_NOT_FOUND")]
    NotFound,
    #[serde(rename = "E_INVALID_INPUT")]
    InvalidInput,
    #[serde(rename = "E_STORAGE")]
    Storage,
    #[serde(rename = "E_STT_UNAVAILABLE")]
    SttUnavailable,
    #[serde(rename = "E_TRANSCRIPTION")]
    Transcription,
    #[serde(rename = "E_TRANSLATE")]
    Translate,
    #[serde(rename = "E_TRIAL_ENDED")]
    TrialEnded,
    #[serde(rename = "E_UNAUTHORIZED")]
    Unauthorized,
    #[serde(rename = "E_INTERNAL")]
    Internal,
}

/// アプリケーションエラー（HTTPレスポンス/ジョブレコード兼用）
#[derive(Debug, Clone, Serialize)]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    pub recoverable: bool,
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::NotFound,
            message: msg.into(),
            recoverable: false,
        }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::InvalidInput,
            message: msg.into(),
            recoverable: true,
        }
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Storage,
            message: msg.into(),
            recoverable: false,
        }
    }

    pub fn translate(msg: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Translate,
            message: msg.into(),
            recoverable: true,
        }
    }

    pub fn trial_ended(msg: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::TrialEnded,
            message: msg.into(),
            recoverable: false,
        }
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Unauthorized,
            message: msg.into(),
            recoverable: false,
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Internal,
            message: msg.into(),
            recoverable: false,
        }
    }
}

impl From<SttError> for AppError {
    fn from(e: SttError) -> Self {
        let code = match e.kind {
            SttErrorKind::EngineNotAvailable => ErrorCode::SttUnavailable,
            _ => ErrorCode::Transcription,
        };
        Self {
            code,
            message: e.to_string(),
            recoverable: e.recoverable,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {}
