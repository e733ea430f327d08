use std::sync::Arc;

use crate::domain::job::JobRecord;
use crate::usecase::job_store::JobStore;

/// ステータス参照（ポーリング用、読み取り専用）
pub struct StatusReporter {
    store: Arc<JobStore>,
}

impl StatusReporter {
    pub fn new(store: Arc<JobStore>) -> Self {
        Self { store }
    }

    /// 未登録のジョブIDには既定レコード（initializing / 5）を返す
    pub fn status(&self, job_id: &str) -> JobRecord {
        self.store
            .get(job_id)
            .map(|r| (*r).clone())
            .unwrap_or_else(JobRecord::unseen)
    }
}
