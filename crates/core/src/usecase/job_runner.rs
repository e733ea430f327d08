use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::domain::job::JobRecord;
use crate::usecase::job_store::JobStore;
use crate::usecase::pipeline::TranscriptionPipeline;

/// ジョブ起動: ジョブごとに Tokio タスクを発行し、同時実行数をセマフォで制限する
pub struct JobRunner {
    pipeline: Arc<TranscriptionPipeline>,
    store: Arc<JobStore>,
    permits: Arc<Semaphore>,
}

impl JobRunner {
    pub fn new(
        pipeline: Arc<TranscriptionPipeline>,
        store: Arc<JobStore>,
        max_concurrent_jobs: usize,
    ) -> Self {
        Self {
            pipeline,
            store,
            permits: Arc::new(Semaphore::new(max_concurrent_jobs.max(1))),
        }
    }

    /// 起動して即座に戻る。返り値の JoinHandle は待たなくてよい。
    pub fn launch(&self, file_path: PathBuf, job_id: String) -> JoinHandle<()> {
        let pipeline = self.pipeline.clone();
        let store = self.store.clone();
        let permits = self.permits.clone();

        tokio::spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                store.set(&job_id, JobRecord::failed("Job runner is shut down"));
                return;
            };

            let id = job_id.clone();
            let inner = tokio::spawn(async move { pipeline.run(&file_path, &id).await });

            // パイプライン内の panic もエラーレコードにする
            if let Err(e) = inner.await {
                log::error!("[{job_id}] pipeline task aborted: {e}");
                store.set(&job_id, JobRecord::failed(format!("Internal error: {e}")));
            }
        })
    }

    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }
}
