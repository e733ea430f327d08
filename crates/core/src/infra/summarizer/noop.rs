use async_trait::async_trait;

use super::{SummarizeError, Summarizer};
use crate::domain::settings::GenerationParams;

/// NoopSummarizer: 入力をそのまま返す。要約モデルなしで動かすとき用。
pub struct NoopSummarizer;

#[async_trait]
impl Summarizer for NoopSummarizer {
    async fn summarize(
        &self,
        text: &str,
        _params: &GenerationParams,
    ) -> Result<String, SummarizeError> {
        Ok(text.to_string())
    }

    fn name(&self) -> &str {
        "noop"
    }
}
