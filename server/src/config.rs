use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use tf_core::domain::settings::UploadPolicy;
use tf_core::infra::models::SummarizerSettings;
use tf_core::infra::stt::WhisperConfig;
use tf_core::infra::translate::google::DEFAULT_ENDPOINT;

/// 翻訳エンドポイント設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatorSettings {
    pub endpoint: String,
}

impl Default for TranslatorSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }
}

/// サーバー設定（環境変数から読む）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub bind_addr: String,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub free_trial_limit: u32,
    pub max_concurrent_jobs: usize,
    pub whisper: WhisperConfig,
    pub summarizer: SummarizerSettings,
    pub translator: TranslatorSettings,
    /// 設定時はこのトークンでログイン必須の操作を許可する
    pub api_token: Option<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        let policy = UploadPolicy::default();
        Self {
            bind_addr: "127.0.0.1:5000".to_string(),
            upload_dir: PathBuf::from("./uploads"),
            max_upload_bytes: policy.max_upload_bytes,
            free_trial_limit: policy.free_trial_limit,
            max_concurrent_jobs: policy.max_concurrent_jobs,
            whisper: WhisperConfig::default(),
            summarizer: SummarizerSettings::default(),
            translator: TranslatorSettings::default(),
            api_token: None,
        }
    }
}

impl AppSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 空文字列は未設定扱い。数値が読めない値は警告して既定値のまま。
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut s = Self::default();
        if let Some(v) = get("TF_BIND_ADDR") {
            s.bind_addr = v;
        }
        if let Some(v) = get("TF_UPLOAD_DIR") {
            s.upload_dir = PathBuf::from(v);
        }
        parse_into(get("TF_MAX_UPLOAD_BYTES"), "TF_MAX_UPLOAD_BYTES", &mut s.max_upload_bytes);
        parse_into(get("TF_FREE_TRIAL_LIMIT"), "TF_FREE_TRIAL_LIMIT", &mut s.free_trial_limit);
        parse_into(
            get("TF_MAX_CONCURRENT_JOBS"),
            "TF_MAX_CONCURRENT_JOBS",
            &mut s.max_concurrent_jobs,
        );

        if let Some(v) = get("WHISPER_BIN") {
            s.whisper.binary_path = PathBuf::from(v);
        }
        if let Some(v) = get("WHISPER_MODEL") {
            s.whisper.model_path = PathBuf::from(v);
        }
        if let Some(v) = get("WHISPER_LANGUAGE") {
            s.whisper.language = v;
        }

        s.summarizer.endpoint = get("TF_SUMMARIZER_URL");
        s.summarizer.api_token = get("TF_SUMMARIZER_TOKEN");
        if let Some(v) = get("TF_TRANSLATE_URL") {
            s.translator.endpoint = v;
        }
        s.api_token = get("TF_API_TOKEN");
        s
    }

    pub fn upload_policy(&self) -> UploadPolicy {
        UploadPolicy {
            max_upload_bytes: self.max_upload_bytes,
            free_trial_limit: self.free_trial_limit,
            max_concurrent_jobs: self.max_concurrent_jobs,
            ..UploadPolicy::default()
        }
    }
}

fn parse_into<T: FromStr>(value: Option<String>, key: &str, slot: &mut T) {
    let Some(v) = value else {
        return;
    };
    match v.parse() {
        Ok(parsed) => *slot = parsed,
        Err(_) => log::warn!("Ignoring invalid {key}={v}"),
    }
}
