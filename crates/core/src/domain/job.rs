use serde::{Deserialize, Serialize};

/// 進捗チェックポイント（正常系はこの順に単調増加する）
pub mod progress {
    /// 未登録ジョブをポーリングしたときの既定値
    pub const UNSEEN: u8 = 5;
    pub const INITIALIZING: u8 = 10;
    pub const TRANSCRIBED: u8 = 60;
    pub const SUMMARIZING: u8 = 75;
    pub const PERSISTING: u8 = 85;
    pub const COMPLETED: u8 = 100;
    pub const FAILED: u8 = 0;
}

/// ジョブ状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Initializing,
    Processing,
    Completed,
    Error,
}

/// パイプライン内部の段階（ログ用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Initializing,
    Transcribing,
    Summarizing,
    Persisting,
    Completed,
    Failed,
}

impl PipelineStage {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Initializing => "initializing",
            Self::Transcribing => "transcribing",
            Self::Summarizing => "summarizing",
            Self::Persisting => "persisting",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// ジョブレコード。ストアでは常に丸ごと差し替える。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub status: JobStatus,
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(
        rename = "message",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub error_message: Option<String>,
}

impl JobRecord {
    /// ストアに存在しないジョブの既定レコード
    pub fn unseen() -> Self {
        Self {
            status: JobStatus::Initializing,
            progress: progress::UNSEEN,
            transcript: None,
            summary: None,
            error_message: None,
        }
    }

    pub fn processing(progress: u8) -> Self {
        Self {
            status: JobStatus::Processing,
            progress,
            transcript: None,
            summary: None,
            error_message: None,
        }
    }

    pub fn completed(transcript: String, summary: String) -> Self {
        Self {
            status: JobStatus::Completed,
            progress: progress::COMPLETED,
            transcript: Some(transcript),
            summary: Some(summary),
            error_message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Error,
            progress: progress::FAILED,
            transcript: None,
            summary: None,
            error_message: Some(message.into()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, JobStatus::Completed | JobStatus::Error)
    }
}
