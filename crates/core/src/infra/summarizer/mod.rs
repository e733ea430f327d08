pub mod http;
pub mod noop;

pub use http::HttpSummarizer;
pub use noop::NoopSummarizer;

use async_trait::async_trait;

use crate::domain::settings::GenerationParams;

/// 要約エラー
#[derive(Debug, thiserror::Error)]
pub enum SummarizeError {
    #[error("Summarizer not available: {0}")]
    NotAvailable(String),
    #[error("Summarization failed: {0}")]
    Failed(String),
    #[error("Summarization timeout")]
    Timeout,
}

/// 抽象型要約モデル trait
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(
        &self,
        text: &str,
        params: &GenerationParams,
    ) -> Result<String, SummarizeError>;

    fn name(&self) -> &str;
}
