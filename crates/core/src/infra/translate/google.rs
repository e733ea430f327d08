use std::time::Duration;

use async_trait::async_trait;

use super::{TranslateError, Translator};

pub const DEFAULT_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

/// Google 翻訳 Web エンドポイントを使用した翻訳器
pub struct GoogleTranslator {
    client: reqwest::Client,
    endpoint: String,
}

impl GoogleTranslator {
    pub fn new(endpoint: String) -> Result<Self, TranslateError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TranslateError::Failed(format!("HTTP client: {e}")))?;

        Ok(Self { client, endpoint })
    }
}

/// レスポンス `[[["訳文","原文",...], ...], ...]` から訳文を連結する
fn collect_translation(body: &serde_json::Value) -> Result<String, TranslateError> {
    let sentences = body
        .get(0)
        .and_then(|v| v.as_array())
        .ok_or_else(|| TranslateError::Failed("Unexpected translate response".to_string()))?;

    Ok(sentences
        .iter()
        .filter_map(|s| s.get(0).and_then(|t| t.as_str()))
        .collect::<Vec<_>>()
        .join(""))
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str, target: &str) -> Result<String, TranslateError> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", "auto"),
                ("tl", target),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TranslateError::Timeout
                } else {
                    TranslateError::Failed(format!("HTTP request failed: {e}"))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(TranslateError::Failed(format!("Translate API error: {status}")));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| TranslateError::Failed(format!("Response parse error: {e}")))?;

        collect_translation(&body)
    }

    fn name(&self) -> &str {
        "google"
    }
}
