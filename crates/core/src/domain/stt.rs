use serde::{Deserialize, Serialize};
use std::path::Path;

// ─── TranscriptionResult ─────────────────────────────────────────

/// 時間区間付きの認識セグメント。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// 開始位置 (秒)
    pub start: f64,
    /// 終了位置 (秒)。start 以上。
    pub end: f64,
    /// 認識テキスト (未トリム)
    pub text: String,
}

/// 1ファイル分の文字起こし結果。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscriptionResult {
    /// 全文テキスト
    pub text: String,
    /// 時系列順のセグメント
    pub segments: Vec<TranscriptSegment>,
}

// ─── SttError ────────────────────────────────────────────────────

/// STT処理で発生するエラー。
#[derive(Debug, Clone)]
pub struct SttError {
    /// エラー種別
    pub kind: SttErrorKind,
    /// 人間が読める詳細メッセージ
    pub detail: String,
    /// 再投入で回復しうるかどうか
    pub recoverable: bool,
}

impl std::fmt::Display for SttError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SttError::{:?}: {}", self.kind, self.detail)
    }
}

impl std::error::Error for SttError {}

/// STTエラー種別。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SttErrorKind {
    /// 音声ファイルが存在しない/読めない
    AudioFormat,
    /// STTエンジンが利用不可 (未インストール、モデル未検出等)
    EngineNotAvailable,
    /// 文字起こし処理中のエラー
    TranscriptionFailed,
    /// タイムアウト
    Timeout,
}

impl SttError {
    pub fn audio_format(detail: impl Into<String>) -> Self {
        Self { kind: SttErrorKind::AudioFormat, detail: detail.into(), recoverable: false }
    }

    pub fn engine_not_available(detail: impl Into<String>) -> Self {
        Self { kind: SttErrorKind::EngineNotAvailable, detail: detail.into(), recoverable: false }
    }

    pub fn transcription_failed(detail: impl Into<String>) -> Self {
        Self { kind: SttErrorKind::TranscriptionFailed, detail: detail.into(), recoverable: true }
    }

    pub fn timeout(detail: impl Into<String>) -> Self {
        Self { kind: SttErrorKind::Timeout, detail: detail.into(), recoverable: true }
    }
}

// ─── Transcriber trait ───────────────────────────────────────────

/// 音声ファイルを文字起こしするエンジン。
///
/// `async_trait` を使用して `Arc<dyn Transcriber>` として共有できるようにする。
#[async_trait::async_trait]
pub trait Transcriber: Send + Sync {
    /// ファイル全体を文字起こしする。
    async fn transcribe(&self, audio_path: &Path) -> Result<TranscriptionResult, SttError>;

    /// エンジン名 (例: "whisper.cpp")。
    fn name(&self) -> &str;
}

// ─── Tests ───────────────────────────────────────────────────────
