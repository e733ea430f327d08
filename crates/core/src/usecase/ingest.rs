use std::path::PathBuf;
use std::sync::Arc;

use crate::domain::error::AppError;
use crate::domain::settings::UploadPolicy;
use crate::infra::auth::AuthProvider;
use crate::infra::storage::ArtifactStore;
use crate::usecase::job_runner::JobRunner;
use crate::usecase::trial::TrialGate;

/// アップロード1件
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// クライアントが送ってきた元のファイル名
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// 無料トライアルの集計キー（リモートIP）
    pub client_key: String,
    pub bearer_token: Option<String>,
}

/// 受付: 検証 → 保存 → パイプライン起動
pub struct IngestService {
    policy: UploadPolicy,
    artifacts: Arc<ArtifactStore>,
    trial: Arc<TrialGate>,
    auth: Arc<dyn AuthProvider>,
    runner: JobRunner,
}

impl IngestService {
    pub fn new(
        policy: UploadPolicy,
        artifacts: Arc<ArtifactStore>,
        trial: Arc<TrialGate>,
        auth: Arc<dyn AuthProvider>,
        runner: JobRunner,
    ) -> Self {
        Self {
            policy,
            artifacts,
            trial,
            auth,
            runner,
        }
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    /// ジョブIDを返す。パイプラインの完了は待たない。
    pub async fn ingest(&self, request: UploadRequest) -> Result<String, AppError> {
        let subject = request
            .bearer_token
            .as_deref()
            .and_then(|token| self.auth.verify(token));
        let anonymous = subject.is_none();

        if anonymous {
            let used = self.trial.try_acquire(&request.client_key)?;
            log::info!(
                "Trial upload {used}/{} from {}",
                self.trial.limit(),
                request.client_key
            );
        }

        let (job_id, path) = match self.store_upload(&request).await {
            Ok(stored) => stored,
            Err(e) => {
                if anonymous {
                    self.trial.release(&request.client_key);
                }
                return Err(e);
            }
        };

        log::info!(
            "Accepted upload {} as {job_id} ({} bytes)",
            request.file_name,
            request.bytes.len()
        );
        self.runner.launch(path, job_id.clone());
        Ok(job_id)
    }

    /// 検証して保存する。失敗時は何も書き込まない。
    async fn store_upload(&self, request: &UploadRequest) -> Result<(String, PathBuf), AppError> {
        if request.file_name.trim().is_empty() {
            return Err(AppError::invalid_input("No selected file"));
        }
        if !self.policy.is_allowed(&request.file_name) {
            return Err(AppError::invalid_input(format!(
                "Invalid file type: {}",
                request.file_name
            )));
        }
        if request.bytes.len() > self.policy.max_upload_bytes {
            return Err(AppError::invalid_input("File too large"));
        }

        let job_id = assign_job_id(&sanitize_filename(&request.file_name));
        let path = self.artifacts.save_upload(&job_id, &request.bytes).await?;
        Ok((job_id, path))
    }
}

/// ASCII英数字と `-` `_` `.` 以外を `_` にまとめ、先頭のドットを落とす
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_replaced = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.') {
            out.push(ch);
            last_replaced = false;
        } else if !last_replaced {
            out.push('_');
            last_replaced = true;
        }
    }

    let trimmed = out.trim_start_matches('.');
    if trimmed.is_empty() || trimmed.chars().all(|c| c == '_' || c == '.') {
        return "audio".to_string();
    }
    trimmed.to_string()
}

/// `<stem>_<unix秒>_<6桁hex><.ext>` 形式の一意なジョブIDを振る
pub fn assign_job_id(safe_name: &str) -> String {
    let (stem, ext) = match safe_name.rsplit_once('.') {
        Some((stem, ext)) => (stem, Some(ext)),
        None => (safe_name, None),
    };
    let stem = if stem.is_empty() { "audio" } else { stem };

    let secs = chrono::Utc::now().timestamp();
    let tag = uuid::Uuid::new_v4().simple().to_string();

    match ext {
        Some(ext) if !ext.is_empty() => format!("{stem}_{secs}_{}.{ext}", &tag[..6]),
        _ => format!("{stem}_{secs}_{}", &tag[..6]),
    }
}
