use std::sync::Arc;

use serde::Serialize;

use crate::domain::error::AppError;
use crate::infra::translate::Translator;
use crate::usecase::pipeline::split_chunks;

/// 翻訳APIに1回で渡す最大文字数
pub const TRANSLATE_CHUNK_CHARS: usize = 4500;

/// 翻訳済みレポート
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranslatedReport {
    pub transcript: String,
    pub summary: String,
}

pub struct TranslationService {
    translator: Arc<dyn Translator>,
}

impl TranslationService {
    pub fn new(translator: Arc<dyn Translator>) -> Self {
        Self { translator }
    }

    /// チャンクごとに翻訳して順に連結する。空白だけのチャンクは送らない。
    pub async fn translate_text(&self, text: &str, target: &str) -> Result<String, AppError> {
        let mut out = String::with_capacity(text.len());
        for chunk in split_chunks(text, TRANSLATE_CHUNK_CHARS) {
            if chunk.trim().is_empty() {
                continue;
            }
            let translated = self
                .translator
                .translate(chunk, target)
                .await
                .map_err(|e| AppError::translate(e.to_string()))?;
            out.push_str(&translated);
        }
        Ok(out)
    }

    pub async fn translate_report(
        &self,
        transcript: &str,
        summary: &str,
        target: &str,
    ) -> Result<TranslatedReport, AppError> {
        if target.trim().is_empty() {
            return Err(AppError::invalid_input("Missing target language"));
        }

        let transcript = self.translate_text(transcript, target).await?;
        let summary = if summary.is_empty() {
            String::new()
        } else {
            self.translator
                .translate(summary, target)
                .await
                .map_err(|e| AppError::translate(e.to_string()))?
        };

        log::debug!(
            "Translated report to {target} via {} ({} chars)",
            self.translator.name(),
            transcript.chars().count()
        );
        Ok(TranslatedReport { transcript, summary })
    }
}
