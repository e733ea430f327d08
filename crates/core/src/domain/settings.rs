use serde::{Deserialize, Serialize};

/// 要約パイプラインの分割設定（文字数は Unicode スカラ値単位）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// 1チャンクの最大文字数
    pub chunk_size: usize,
    /// この文字数以下なら分割せず全文を一度に要約する
    pub direct_summary_max_len: usize,
    /// トリム後この文字数以下のチャンクは要約しない
    pub min_chunk_len: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: 3000,
            direct_summary_max_len: 50,
            min_chunk_len: 30,
        }
    }
}

/// 要約モデルの生成パラメータ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// 入力トークン上限（超過分は切り捨て）
    pub max_input_tokens: usize,
    pub max_length: u32,
    pub min_length: u32,
    pub num_beams: u32,
    pub length_penalty: f32,
    pub early_stopping: bool,
    pub no_repeat_ngram_size: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_input_tokens: 1024,
            max_length: 300,
            min_length: 80,
            num_beams: 4,
            length_penalty: 2.0,
            early_stopping: true,
            no_repeat_ngram_size: 3,
        }
    }
}

/// アップロード受付ポリシー
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadPolicy {
    /// 許可する拡張子（小文字、ドットなし）
    pub allowed_extensions: Vec<String>,
    pub max_upload_bytes: usize,
    /// 未ログインクライアントが利用できるアップロード回数
    pub free_trial_limit: u32,
    /// 同時に実行するパイプライン数の上限
    pub max_concurrent_jobs: usize,
}

impl UploadPolicy {
    /// ファイル名の拡張子が許可リストに含まれるか
    pub fn is_allowed(&self, file_name: &str) -> bool {
        match file_name.rsplit_once('.') {
            Some((_, ext)) => {
                let ext = ext.to_ascii_lowercase();
                self.allowed_extensions.iter().any(|a| *a == ext)
            }
            None => false,
        }
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            allowed_extensions: ["mp3", "wav", "m4a", "flac", "aac", "ogg"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_upload_bytes: 50 * 1024 * 1024,
            free_trial_limit: 2,
            max_concurrent_jobs: 2,
        }
    }
}
