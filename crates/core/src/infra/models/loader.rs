use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::ModelLoader;
use crate::domain::stt::{SttError, Transcriber};
use crate::infra::stt::{WhisperConfig, WhisperSidecar};
use crate::infra::summarizer::{HttpSummarizer, SummarizeError, Summarizer};

/// 要約エンドポイント設定
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummarizerSettings {
    /// 未設定なら要約は利用不可（原文パススルー）
    pub endpoint: Option<String>,
    pub api_token: Option<String>,
}

/// 標準ローダー: whisper.cpp sidecar + HTTP 要約器
pub struct DefaultModelLoader {
    whisper: WhisperConfig,
    summarizer: SummarizerSettings,
}

impl DefaultModelLoader {
    pub fn new(whisper: WhisperConfig, summarizer: SummarizerSettings) -> Self {
        Self { whisper, summarizer }
    }
}

#[async_trait]
impl ModelLoader for DefaultModelLoader {
    async fn load_transcriber(&self) -> Result<Arc<dyn Transcriber>, SttError> {
        let sidecar = WhisperSidecar::new(self.whisper.clone());
        sidecar.validate()?;
        Ok(Arc::new(sidecar))
    }

    async fn load_summarizer(&self) -> Result<Arc<dyn Summarizer>, SummarizeError> {
        let endpoint = self
            .summarizer
            .endpoint
            .clone()
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| SummarizeError::NotAvailable("No summarizer endpoint configured".into()))?;

        Ok(Arc::new(HttpSummarizer::new(
            endpoint,
            self.summarizer.api_token.clone(),
        )?))
    }
}
