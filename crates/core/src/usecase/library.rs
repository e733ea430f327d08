use std::sync::Arc;

use crate::domain::error::AppError;
use crate::domain::settings::UploadPolicy;
use crate::infra::storage::{ArtifactStore, UploadedFile};
use crate::usecase::job_store::JobStore;

/// アップロード済みジョブの一覧・削除
pub struct JobLibrary {
    artifacts: Arc<ArtifactStore>,
    store: Arc<JobStore>,
    policy: UploadPolicy,
}

impl JobLibrary {
    pub fn new(artifacts: Arc<ArtifactStore>, store: Arc<JobStore>, policy: UploadPolicy) -> Self {
        Self {
            artifacts,
            store,
            policy,
        }
    }

    pub async fn list_uploads(&self) -> Result<Vec<UploadedFile>, AppError> {
        self.artifacts
            .list_uploads(|name| self.policy.is_allowed(name))
            .await
    }

    /// 音声・成果物・ジョブレコードを消す
    pub async fn delete(&self, job_id: &str) -> Result<(), AppError> {
        self.artifacts.delete_job(job_id).await?;
        self.store.remove(job_id);
        log::info!("Deleted job {job_id}");
        Ok(())
    }

    pub async fn clear_all(&self) -> Result<u32, AppError> {
        let removed = self.artifacts.clear_all().await?;
        self.store.clear();
        log::info!("Cleared upload directory ({removed} files)");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::job::JobRecord;

    fn library() -> (tempfile::TempDir, JobLibrary, Arc<ArtifactStore>, Arc<JobStore>) {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = Arc::new(ArtifactStore::open(dir.path()).unwrap());
        let store = Arc::new(JobStore::new());
        let lib = JobLibrary::new(artifacts.clone(), store.clone(), UploadPolicy::default());
        (dir, lib, artifacts, store)
    }

    #[tokio::test]
    async fn test_delete_removes_everything() {
        let (_dir, lib, artifacts, store) = library();
        artifacts.save_upload("a.wav", b"RIFF").await.unwrap();
        artifacts.write_artifacts("a.wav", "t", "s").await.unwrap();
        store.set("a.wav", JobRecord::completed("t".into(), "s".into()));

        lib.delete("a.wav").await.unwrap();

        assert!(!artifacts.audio_path("a.wav").unwrap().exists());
        assert!(artifacts.read_transcript("a.wav").await.unwrap().is_none());
        assert!(store.get("a.wav").is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let (_dir, lib, _, _) = library();
        assert!(lib.delete("ghost.wav").await.is_ok());
        assert!(lib.delete("../escape").await.is_err());
    }

    #[tokio::test]
    async fn test_clear_all() {
        let (_dir, lib, artifacts, store) = library();
        artifacts.save_upload("a.wav", b"1").await.unwrap();
        artifacts.save_upload("b.mp3", b"2").await.unwrap();
        artifacts.write_artifacts("a.wav", "t", "s").await.unwrap();
        store.set("a.wav", JobRecord::failed("x"));

        assert_eq!(lib.clear_all().await.unwrap(), 4);
        assert!(store.is_empty());
        assert!(lib.list_uploads().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_only_audio() {
        let (_dir, lib, artifacts, _) = library();
        artifacts.save_upload("a.wav", b"1").await.unwrap();
        artifacts.write_artifacts("a.wav", "t", "s").await.unwrap();

        let files = lib.list_uploads().await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "a.wav");
    }
}
