use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::domain::job::JobRecord;

/// ジョブストア: ジョブID → 最新レコードのスナップショット
///
/// レコードは常に丸ごと差し替えるため、読み手は更新前か更新後の
/// どちらか一方の完全なレコードだけを観測する。
pub struct JobStore {
    jobs: RwLock<HashMap<String, Arc<JobRecord>>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
        }
    }

    /// 現在のレコードを取得
    pub fn get(&self, job_id: &str) -> Option<Arc<JobRecord>> {
        self.jobs.read().get(job_id).cloned()
    }

    /// レコードを差し替える
    pub fn set(&self, job_id: &str, record: JobRecord) {
        self.jobs.write().insert(job_id.to_string(), Arc::new(record));
    }

    /// レコードを削除（管理操作用）
    pub fn remove(&self, job_id: &str) -> Option<Arc<JobRecord>> {
        self.jobs.write().remove(job_id)
    }

    /// 全レコードを削除（管理操作用）
    pub fn clear(&self) {
        self.jobs.write().clear();
    }

    pub fn len(&self) -> usize {
        self.jobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.read().is_empty()
    }
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new()
    }
}
