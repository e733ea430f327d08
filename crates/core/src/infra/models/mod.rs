mod loader;

pub use loader::{DefaultModelLoader, SummarizerSettings};

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;

use crate::domain::stt::{SttError, Transcriber};
use crate::infra::summarizer::{SummarizeError, Summarizer};

/// モデルのロード処理（重い初期化を担う）
#[async_trait]
pub trait ModelLoader: Send + Sync {
    async fn load_transcriber(&self) -> Result<Arc<dyn Transcriber>, SttError>;

    async fn load_summarizer(&self) -> Result<Arc<dyn Summarizer>, SummarizeError>;
}

/// モデルプロバイダ: 初回呼び出しで一度だけロードし、プロセス終了まで保持する。
///
/// 同時に複数の初回呼び出しがあっても `OnceCell` がロードを直列化する。
pub struct ModelProvider {
    loader: Box<dyn ModelLoader>,
    transcriber: OnceCell<Arc<dyn Transcriber>>,
    summarizer: OnceCell<Option<Arc<dyn Summarizer>>>,
}

impl ModelProvider {
    pub fn new(loader: Box<dyn ModelLoader>) -> Self {
        Self {
            loader,
            transcriber: OnceCell::new(),
            summarizer: OnceCell::new(),
        }
    }

    /// 文字起こしエンジンを取得する。ロード失敗はエラーとして返し、次回再試行する。
    pub async fn transcriber(&self) -> Result<Arc<dyn Transcriber>, SttError> {
        self.transcriber
            .get_or_try_init(|| async {
                let transcriber = self.loader.load_transcriber().await?;
                log::info!("Transcriber loaded: {}", transcriber.name());
                Ok(transcriber)
            })
            .await
            .map(Arc::clone)
    }

    /// 要約モデルを取得する。ロード失敗は「利用不可」としてキャッシュする。
    pub async fn summarizer(&self) -> Option<Arc<dyn Summarizer>> {
        self.summarizer
            .get_or_init(|| async {
                match self.loader.load_summarizer().await {
                    Ok(summarizer) => {
                        log::info!("Summarizer loaded: {}", summarizer.name());
                        Some(summarizer)
                    }
                    Err(e) => {
                        log::warn!("要約モデルを利用できません（原文をそのまま使用）: {e}");
                        None
                    }
                }
            })
            .await
            .clone()
    }
}
