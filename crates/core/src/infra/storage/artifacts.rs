use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::error::AppError;

const TRANSCRIPT_SUFFIX: &str = ".txt";
const SUMMARY_SUFFIX: &str = "_summary.txt";

/// アップロード一覧の1件
#[derive(Debug, Clone, Serialize)]
pub struct UploadedFile {
    pub name: String,
    pub time: String,
}

/// アップロード音声と成果物（書き起こし/要約テキスト）のファイルストレージ
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// ディレクトリを作成して開く
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, AppError> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .map_err(|e| AppError::storage(format!("Cannot create upload dir {:?}: {e}", root)))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// ジョブIDを検証してパスを組み立てる（ディレクトリ外参照を拒否）
    fn resolve(&self, name: &str) -> Result<PathBuf, AppError> {
        if name.is_empty()
            || name.contains('/')
            || name.contains('\\')
            || name == "."
            || name == ".."
        {
            return Err(AppError::invalid_input(format!("Invalid file name: {name}")));
        }
        Ok(self.root.join(name))
    }

    pub fn audio_path(&self, job_id: &str) -> Result<PathBuf, AppError> {
        self.resolve(job_id)
    }

    pub fn transcript_path(&self, job_id: &str) -> Result<PathBuf, AppError> {
        self.resolve(&format!("{job_id}{TRANSCRIPT_SUFFIX}"))
    }

    pub fn summary_path(&self, job_id: &str) -> Result<PathBuf, AppError> {
        self.resolve(&format!("{job_id}{SUMMARY_SUFFIX}"))
    }

    /// アップロードされた音声を全量書き込む
    pub async fn save_upload(&self, job_id: &str, bytes: &[u8]) -> Result<PathBuf, AppError> {
        let path = self.audio_path(job_id)?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::storage(format!("Failed to save upload {job_id}: {e}")))?;
        Ok(path)
    }

    pub async fn read_audio(&self, file_name: &str) -> Result<Vec<u8>, AppError> {
        let path = self.audio_path(file_name)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::not_found(format!("File not found: {file_name}")))
            }
            Err(e) => Err(AppError::storage(format!("Failed to read {file_name}: {e}"))),
        }
    }

    /// 書き起こしと要約を UTF-8 テキストで書き込む（空でも必ず作成）
    pub async fn write_artifacts(
        &self,
        job_id: &str,
        transcript: &str,
        summary: &str,
    ) -> Result<(), AppError> {
        let transcript_path = self.transcript_path(job_id)?;
        let summary_path = self.summary_path(job_id)?;

        tokio::fs::write(&transcript_path, transcript)
            .await
            .map_err(|e| AppError::storage(format!("Failed to write transcript: {e}")))?;
        tokio::fs::write(&summary_path, summary)
            .await
            .map_err(|e| AppError::storage(format!("Failed to write summary: {e}")))?;
        Ok(())
    }

    /// 書き起こしを読む。未生成なら None。
    pub async fn read_transcript(&self, job_id: &str) -> Result<Option<String>, AppError> {
        read_optional(&self.transcript_path(job_id)?).await
    }

    /// 要約を読む。未生成なら空文字列。
    pub async fn read_summary(&self, job_id: &str) -> Result<String, AppError> {
        Ok(read_optional(&self.summary_path(job_id)?)
            .await?
            .unwrap_or_default())
    }

    /// 音声と成果物を削除する。存在しないファイルは無視。
    pub async fn delete_job(&self, job_id: &str) -> Result<(), AppError> {
        let paths = [
            self.audio_path(job_id)?,
            self.transcript_path(job_id)?,
            self.summary_path(job_id)?,
        ];
        for path in paths {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(AppError::storage(format!("Failed to delete {:?}: {e}", path)));
                }
            }
        }
        Ok(())
    }

    /// ディレクトリ直下の通常ファイルを全削除し、削除件数を返す
    pub async fn clear_all(&self) -> Result<u32, AppError> {
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| AppError::storage(format!("Failed to list uploads: {e}")))?;

        let mut removed = 0;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| AppError::storage(format!("Failed to list uploads: {e}")))?
        {
            let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
            if !is_file {
                continue;
            }
            match tokio::fs::remove_file(entry.path()).await {
                Ok(()) => removed += 1,
                Err(e) => log::warn!("削除に失敗: {:?}: {e}", entry.path()),
            }
        }
        Ok(removed)
    }

    /// 条件に合うアップロード音声を新しい順に列挙する
    pub async fn list_uploads(
        &self,
        is_audio: impl Fn(&str) -> bool,
    ) -> Result<Vec<UploadedFile>, AppError> {
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| AppError::storage(format!("Failed to list uploads: {e}")))?;

        let mut files: Vec<(DateTime<Utc>, String)> = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| AppError::storage(format!("Failed to list uploads: {e}")))?
        {
            let name = entry.file_name().to_string_lossy().to_string();
            if !is_audio(&name) {
                continue;
            }
            let Ok(meta) = entry.metadata().await else {
                continue;
            };
            if !meta.is_file() {
                continue;
            }
            let time = meta
                .created()
                .or_else(|_| meta.modified())
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());
            files.push((time, name));
        }

        files.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

        Ok(files
            .into_iter()
            .map(|(time, name)| UploadedFile {
                name,
                time: time.format("%Y-%m-%d %H:%M:%S").to_string(),
            })
            .collect())
    }
}

async fn read_optional(path: &Path) -> Result<Option<String>, AppError> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(AppError::storage(format!("Failed to read {:?}: {e}", path))),
    }
}
