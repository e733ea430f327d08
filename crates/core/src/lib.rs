//! 音声ファイルの文字起こし・要約ジョブのコアライブラリ
//!
//! - `domain`: ジョブレコード、設定、エラー、STT の型
//! - `infra`: whisper.cpp サイドカー、HTTP 要約/翻訳、成果物ストレージ
//! - `usecase`: 受付、パイプライン、状態照会、エクスポート

pub mod domain;
pub mod infra;
pub mod usecase;
