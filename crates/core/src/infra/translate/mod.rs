pub mod google;

pub use google::GoogleTranslator;

use async_trait::async_trait;

/// 翻訳エラー
#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error("Translation failed: {0}")]
    Failed(String),
    #[error("Translation timeout")]
    Timeout,
}

/// 翻訳 trait（ソース言語は自動判定）
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, target: &str) -> Result<String, TranslateError>;

    fn name(&self) -> &str;
}
