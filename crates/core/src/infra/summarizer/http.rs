use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{SummarizeError, Summarizer};
use crate::domain::settings::GenerationParams;

/// 推論エンドポイント（Hugging Face Inference API 互換）を使用した要約器
pub struct HttpSummarizer {
    client: reqwest::Client,
    endpoint: String,
    api_token: Option<String>,
}

#[derive(Serialize)]
struct SummarizeRequest<'a> {
    inputs: &'a str,
    parameters: Parameters,
}

#[derive(Serialize)]
struct Parameters {
    max_length: u32,
    min_length: u32,
    num_beams: u32,
    length_penalty: f32,
    early_stopping: bool,
    no_repeat_ngram_size: u32,
    truncation: bool,
}

impl From<&GenerationParams> for Parameters {
    fn from(p: &GenerationParams) -> Self {
        Self {
            max_length: p.max_length,
            min_length: p.min_length,
            num_beams: p.num_beams,
            length_penalty: p.length_penalty,
            early_stopping: p.early_stopping,
            no_repeat_ngram_size: p.no_repeat_ngram_size,
            truncation: true,
        }
    }
}

#[derive(Deserialize)]
struct SummaryItem {
    summary_text: String,
}

impl HttpSummarizer {
    pub fn new(endpoint: String, api_token: Option<String>) -> Result<Self, SummarizeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| SummarizeError::NotAvailable(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            api_token,
        })
    }
}

#[async_trait]
impl Summarizer for HttpSummarizer {
    async fn summarize(
        &self,
        text: &str,
        params: &GenerationParams,
    ) -> Result<String, SummarizeError> {
        let request = SummarizeRequest {
            inputs: text,
            parameters: Parameters::from(params),
        };

        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(token) = &self.api_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                SummarizeError::Timeout
            } else {
                SummarizeError::Failed(format!("HTTP request failed: {e}"))
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizeError::Failed(format!(
                "Summarizer API error: {status} - {body}"
            )));
        }

        let items: Vec<SummaryItem> = response
            .json()
            .await
            .map_err(|e| SummarizeError::Failed(format!("Response parse error: {e}")))?;

        items
            .into_iter()
            .next()
            .map(|item| item.summary_text.trim().to_string())
            .ok_or_else(|| SummarizeError::Failed("Empty response from summarizer".to_string()))
    }

    fn name(&self) -> &str {
        "http"
    }
}
