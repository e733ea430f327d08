pub mod config;
pub mod error;
pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use tf_core::domain::settings::{GenerationParams, PipelineConfig, UploadPolicy};
use tf_core::infra::auth::{AuthProvider, NoopAuthProvider, StaticTokenAuth};
use tf_core::infra::models::{DefaultModelLoader, ModelProvider};
use tf_core::infra::storage::ArtifactStore;
use tf_core::infra::translate::{GoogleTranslator, Translator};
use tf_core::usecase::chunk_summarizer::ChunkSummarizer;
use tf_core::usecase::export::ExportService;
use tf_core::usecase::ingest::IngestService;
use tf_core::usecase::job_runner::JobRunner;
use tf_core::usecase::job_store::JobStore;
use tf_core::usecase::library::JobLibrary;
use tf_core::usecase::pipeline::TranscriptionPipeline;
use tf_core::usecase::status::StatusReporter;
use tf_core::usecase::translation::TranslationService;
use tf_core::usecase::trial::TrialGate;

use crate::config::AppSettings;
use crate::error::StartupError;
use crate::routes::AppState;

/// コア部品を組み立ててハンドラ共有状態を作る
pub fn assemble_state(
    policy: UploadPolicy,
    artifacts: Arc<ArtifactStore>,
    models: Arc<ModelProvider>,
    translator: Arc<dyn Translator>,
    auth: Arc<dyn AuthProvider>,
) -> AppState {
    let store = Arc::new(JobStore::new());
    let pipeline = Arc::new(TranscriptionPipeline::new(
        store.clone(),
        models.clone(),
        ChunkSummarizer::new(models, GenerationParams::default()),
        artifacts.clone(),
        PipelineConfig::default(),
    ));
    let runner = JobRunner::new(pipeline, store.clone(), policy.max_concurrent_jobs);
    let trial = Arc::new(TrialGate::new(policy.free_trial_limit));
    let translation = Arc::new(TranslationService::new(translator));

    AppState {
        ingest: Arc::new(IngestService::new(
            policy.clone(),
            artifacts.clone(),
            trial,
            auth.clone(),
            runner,
        )),
        status: Arc::new(StatusReporter::new(store.clone())),
        export: Arc::new(ExportService::new(artifacts.clone(), translation.clone())),
        translation,
        library: Arc::new(JobLibrary::new(artifacts.clone(), store, policy)),
        artifacts,
        auth,
    }
}

/// 起動: 文字起こしモデルを先にロードし、失敗したら起動しない
pub async fn run(settings: AppSettings) -> Result<(), StartupError> {
    log::info!(
        "Starting transcribe-flow (uploads: {}, whisper model: {})",
        settings.upload_dir.display(),
        settings.whisper.model_path.display()
    );

    let policy = settings.upload_policy();
    let artifacts = Arc::new(ArtifactStore::open(settings.upload_dir.clone())?);
    let models = Arc::new(ModelProvider::new(Box::new(DefaultModelLoader::new(
        settings.whisper.clone(),
        settings.summarizer.clone(),
    ))));

    let transcriber = models.transcriber().await?;
    log::info!("Transcriber ready: {}", transcriber.name());
    if models.summarizer().await.is_none() {
        log::warn!("Summaries will fall back to the original text");
    }

    let translator = Arc::new(GoogleTranslator::new(settings.translator.endpoint.clone())?);
    let auth: Arc<dyn AuthProvider> = match &settings.api_token {
        Some(token) => Arc::new(StaticTokenAuth::new(token.clone(), "admin")),
        None => {
            log::warn!("TF_API_TOKEN is not set: download, delete and clear_all will reject every request");
            Arc::new(NoopAuthProvider)
        }
    };
    let state = assemble_state(policy, artifacts, models, translator, auth);
    let app = routes::router(state, settings.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr)
        .await
        .map_err(|source| StartupError::Bind {
            addr: settings.bind_addr.clone(),
            source,
        })?;
    log::info!("Listening on http://{}", settings.bind_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(StartupError::Serve)
}
