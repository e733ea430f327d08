use std::sync::Arc;

use crate::domain::settings::GenerationParams;
use crate::infra::models::ModelProvider;

/// チャンク要約: 失敗時は入力をそのまま返し、パイプラインを止めない
pub struct ChunkSummarizer {
    models: Arc<ModelProvider>,
    params: GenerationParams,
}

impl ChunkSummarizer {
    pub fn new(models: Arc<ModelProvider>, params: GenerationParams) -> Self {
        Self { models, params }
    }

    /// `text` は空でないこと。入力トークン上限を超える分は切り捨てて要約する。
    pub async fn summarize(&self, text: &str) -> String {
        let Some(summarizer) = self.models.summarizer().await else {
            return text.to_string();
        };

        let input = truncate_tokens(text, self.params.max_input_tokens);
        match summarizer.summarize(input, &self.params).await {
            Ok(summary) => summary,
            Err(e) => {
                log::warn!("Chunk summarization error: {e}");
                text.to_string()
            }
        }
    }
}

/// 空白区切りで先頭 `max_tokens` トークンまでのスライスを返す
pub fn truncate_tokens(text: &str, max_tokens: usize) -> &str {
    let mut count = 0;
    let mut in_token = false;
    for (i, ch) in text.char_indices() {
        if ch.is_whitespace() {
            in_token = false;
        } else if !in_token {
            if count == max_tokens {
                return text[..i].trim_end();
            }
            count += 1;
            in_token = true;
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::path::Path;

    use crate::domain::stt::{SttError, Transcriber};
    use crate::infra::models::ModelLoader;
    use crate::infra::summarizer::{SummarizeError, Summarizer};

    struct RecordingSummarizer {
        inputs: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    #[async_trait]
    impl Summarizer for RecordingSummarizer {
        async fn summarize(
            &self,
            text: &str,
            _params: &GenerationParams,
        ) -> Result<String, SummarizeError> {
            self.inputs.lock().push(text.to_string());
            if self.fail {
                Err(SummarizeError::Failed("model crashed".into()))
            } else {
                Ok(format!("summary({})", text.len()))
            }
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    struct Loader {
        inputs: Arc<Mutex<Vec<String>>>,
        available: bool,
        fail: bool,
    }

    #[async_trait]
    impl ModelLoader for Loader {
        async fn load_transcriber(&self) -> Result<Arc<dyn Transcriber>, SttError> {
            Err(SttError::engine_not_available("unused"))
        }

        async fn load_summarizer(&self) -> Result<Arc<dyn Summarizer>, SummarizeError> {
            if !self.available {
                return Err(SummarizeError::NotAvailable("none".into()));
            }
            Ok(Arc::new(RecordingSummarizer {
                inputs: self.inputs.clone(),
                fail: self.fail,
            }))
        }
    }

    fn summarizer(available: bool, fail: bool, max_tokens: usize) -> (ChunkSummarizer, Arc<Mutex<Vec<String>>>) {
        let inputs = Arc::new(Mutex::new(Vec::new()));
        let loader = Loader {
            inputs: inputs.clone(),
            available,
            fail,
        };
        let params = GenerationParams {
            max_input_tokens: max_tokens,
            ..Default::default()
        };
        (
            ChunkSummarizer::new(Arc::new(ModelProvider::new(Box::new(loader))), params),
            inputs,
        )
    }

    #[tokio::test]
    async fn test_summarizes_with_model() {
        let (cs, inputs) = summarizer(true, false, 1024);
        assert_eq!(cs.summarize("abc def").await, "summary(7)");
        assert_eq!(inputs.lock().as_slice(), ["abc def"]);
    }

    #[tokio::test]
    async fn test_unavailable_model_passes_through() {
        let (cs, inputs) = summarizer(false, false, 1024);
        assert_eq!(cs.summarize("keep me").await, "keep me");
        assert!(inputs.lock().is_empty());
    }

    #[tokio::test]
    async fn test_failure_returns_original_untruncated() {
        let (cs, _) = summarizer(true, true, 2);
        assert_eq!(cs.summarize("one two three four").await, "one two three four");
    }

    #[tokio::test]
    async fn test_input_truncated_to_token_budget() {
        let (cs, inputs) = summarizer(true, false, 3);
        cs.summarize("a bb ccc dddd eeeee").await;
        assert_eq!(inputs.lock().as_slice(), ["a bb ccc"]);
    }

    #[test]
    fn test_truncate_tokens() {
        assert_eq!(truncate_tokens("a b c", 5), "a b c");
        assert_eq!(truncate_tokens("a b c", 2), "a b");
        assert_eq!(truncate_tokens("  a   b  c ", 2), "  a   b");
        assert_eq!(truncate_tokens("", 2), "");
        assert_eq!(truncate_tokens("héllo wörld ünï", 2), "héllo wörld");
    }
}
