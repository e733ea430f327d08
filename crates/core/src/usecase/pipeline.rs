use std::path::Path;
use std::sync::Arc;

use crate::domain::error::AppError;
use crate::domain::job::{progress, JobRecord, PipelineStage};
use crate::domain::settings::PipelineConfig;
use crate::domain::stt::TranscriptSegment;
use crate::infra::models::ModelProvider;
use crate::infra::storage::ArtifactStore;
use crate::usecase::chunk_summarizer::ChunkSummarizer;
use crate::usecase::job_store::JobStore;

/// 文字起こしパイプライン
///
/// Initializing → Transcribing → Summarizing → Persisting → Completed。
/// どの段階で失敗しても Failed（status=error, progress=0）で終わる。
/// 1ジョブのレコードを書き込むのは、そのジョブを実行するタスクだけ。
pub struct TranscriptionPipeline {
    store: Arc<JobStore>,
    models: Arc<ModelProvider>,
    summarizer: ChunkSummarizer,
    artifacts: Arc<ArtifactStore>,
    config: PipelineConfig,
}

impl TranscriptionPipeline {
    pub fn new(
        store: Arc<JobStore>,
        models: Arc<ModelProvider>,
        summarizer: ChunkSummarizer,
        artifacts: Arc<ArtifactStore>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            models,
            summarizer,
            artifacts,
            config,
        }
    }

    /// 1ジョブを最後まで実行する。エラーは呼び出し元へ返さずレコードに記録する。
    pub async fn run(&self, file_path: &Path, job_id: &str) {
        log::info!("Starting transcription for: {job_id}");

        match self.execute(file_path, job_id).await {
            Ok(()) => {
                log::info!("[{job_id}] -> {}", PipelineStage::Completed.as_str());
            }
            Err(e) => {
                log::error!(
                    "[{job_id}] -> {}: {}",
                    PipelineStage::Failed.as_str(),
                    e.message
                );
                self.store.set(job_id, JobRecord::failed(e.message));
            }
        }
    }

    async fn execute(&self, file_path: &Path, job_id: &str) -> Result<(), AppError> {
        self.enter(job_id, PipelineStage::Initializing, progress::INITIALIZING);

        let exists = tokio::fs::try_exists(file_path).await.unwrap_or(false);
        if !exists {
            return Err(AppError::not_found(format!(
                "Audio file not found at {}",
                file_path.display()
            )));
        }

        log::info!("[{job_id}] -> {}", PipelineStage::Transcribing.as_str());
        let transcriber = self.models.transcriber().await?;
        let result = transcriber.transcribe(file_path).await?;
        self.store.set(job_id, JobRecord::processing(progress::TRANSCRIBED));

        let transcript = format_transcript(&result.segments);

        self.enter(job_id, PipelineStage::Summarizing, progress::SUMMARIZING);
        let summary = self.summarize_text(result.text.trim()).await;

        self.enter(job_id, PipelineStage::Persisting, progress::PERSISTING);
        self.artifacts
            .write_artifacts(job_id, &transcript, &summary)
            .await?;

        self.store
            .set(job_id, JobRecord::completed(transcript, summary));
        Ok(())
    }

    /// 段階遷移: ログ出力と進捗レコードの差し替え
    fn enter(&self, job_id: &str, stage: PipelineStage, value: u8) {
        log::info!("[{job_id}] -> {} ({value}%)", stage.as_str());
        self.store.set(job_id, JobRecord::processing(value));
    }

    /// 全文を要約する。短文は一括、長文は固定長チャンクごとに要約して重複を除き連結する。
    pub async fn summarize_text(&self, full_text: &str) -> String {
        if full_text.is_empty() {
            return String::new();
        }

        if full_text.chars().count() <= self.config.direct_summary_max_len {
            return self.summarizer.summarize(full_text).await;
        }

        let mut accepted: Vec<String> = Vec::new();
        for chunk in split_chunks(full_text, self.config.chunk_size) {
            if chunk.trim().chars().count() <= self.config.min_chunk_len {
                continue;
            }
            let summary = self.summarizer.summarize(chunk).await;
            if summary.is_empty() {
                continue;
            }
            let lowered = summary.to_lowercase();
            if accepted.iter().any(|s| s.to_lowercase() == lowered) {
                continue;
            }
            accepted.push(summary);
        }
        accepted.join(" ")
    }
}

/// 秒を `HH:MM:SS` に整形する（端数切り捨て、時は24で折り返さない）
pub fn format_timestamp(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

/// セグメントを `[HH:MM:SS - HH:MM:SS] テキスト` の行にする
pub fn format_transcript(segments: &[TranscriptSegment]) -> String {
    segments
        .iter()
        .map(|s| {
            format!(
                "[{} - {}] {}\n",
                format_timestamp(s.start),
                format_timestamp(s.end),
                s.text.trim()
            )
        })
        .collect()
}

/// 文字数 `size` ごとの重複なしスライス（最後は短くてよい）
pub fn split_chunks(text: &str, size: usize) -> Vec<&str> {
    if size == 0 {
        return vec![text];
    }
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;
    for (i, _) in text.char_indices() {
        if count == size {
            chunks.push(&text[start..i]);
            start = i;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        chunks.push(&text[start..]);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    use crate::domain::job::JobStatus;
    use crate::domain::settings::GenerationParams;
    use crate::domain::stt::{SttError, Transcriber, TranscriptionResult};
    use crate::infra::models::ModelLoader;
    use crate::infra::summarizer::{SummarizeError, Summarizer};

    // ── テスト用モック ──────────────────────────────

    /// 呼び出し時点の進捗を記録する文字起こしエンジン
    struct ScriptedTranscriber {
        result: Result<TranscriptionResult, SttError>,
        store: Arc<JobStore>,
        seen: Arc<Mutex<Vec<u8>>>,
    }

    #[async_trait]
    impl Transcriber for ScriptedTranscriber {
        async fn transcribe(&self, _path: &Path) -> Result<TranscriptionResult, SttError> {
            if let Some(r) = self.store.get("job.wav") {
                self.seen.lock().push(r.progress);
            }
            self.result.clone()
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    /// `map` で入力ごとの出力を決める要約器。`fail` なら常に失敗する。
    struct ScriptedSummarizer {
        calls: Arc<Mutex<Vec<String>>>,
        fail: bool,
        map: fn(&str) -> String,
        store: Arc<JobStore>,
        seen: Arc<Mutex<Vec<u8>>>,
    }

    #[async_trait]
    impl Summarizer for ScriptedSummarizer {
        async fn summarize(
            &self,
            text: &str,
            _params: &GenerationParams,
        ) -> Result<String, SummarizeError> {
            self.calls.lock().push(text.to_string());
            if let Some(r) = self.store.get("job.wav") {
                self.seen.lock().push(r.progress);
            }
            if self.fail {
                return Err(SummarizeError::Failed("boom".into()));
            }
            Ok((self.map)(text))
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    struct Loader {
        transcriber: Arc<ScriptedTranscriber>,
        summarizer: Arc<ScriptedSummarizer>,
    }

    #[async_trait]
    impl ModelLoader for Loader {
        async fn load_transcriber(&self) -> Result<Arc<dyn Transcriber>, SttError> {
            Ok(self.transcriber.clone())
        }

        async fn load_summarizer(&self) -> Result<Arc<dyn Summarizer>, SummarizeError> {
            Ok(self.summarizer.clone())
        }
    }

    struct Harness {
        _dir: tempfile::TempDir,
        store: Arc<JobStore>,
        artifacts: Arc<ArtifactStore>,
        pipeline: TranscriptionPipeline,
        calls: Arc<Mutex<Vec<String>>>,
        seen: Arc<Mutex<Vec<u8>>>,
    }

    fn harness(
        result: Result<TranscriptionResult, SttError>,
        fail: bool,
        map: fn(&str) -> String,
    ) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JobStore::new());
        let artifacts = Arc::new(ArtifactStore::open(dir.path()).unwrap());
        let calls = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let loader = Loader {
            transcriber: Arc::new(ScriptedTranscriber {
                result,
                store: store.clone(),
                seen: seen.clone(),
            }),
            summarizer: Arc::new(ScriptedSummarizer {
                calls: calls.clone(),
                fail,
                map,
                store: store.clone(),
                seen: seen.clone(),
            }),
        };
        let models = Arc::new(ModelProvider::new(Box::new(loader)));
        let summarizer = ChunkSummarizer::new(models.clone(), GenerationParams::default());
        let pipeline = TranscriptionPipeline::new(
            store.clone(),
            models,
            summarizer,
            artifacts.clone(),
            PipelineConfig::default(),
        );
        Harness {
            _dir: dir,
            store,
            artifacts,
            pipeline,
            calls,
            seen,
        }
    }

    fn seg(start: f64, end: f64, text: &str) -> TranscriptSegment {
        TranscriptSegment {
            start,
            end,
            text: text.into(),
        }
    }

    fn upper(text: &str) -> String {
        text.to_uppercase()
    }

    fn constant(_: &str) -> String {
        "Same Summary".to_string()
    }

    async fn write_audio(h: &Harness) -> std::path::PathBuf {
        h.artifacts.save_upload("job.wav", b"RIFF").await.unwrap()
    }

    // ── 整形 ──────────────────────────────

    #[test]
    fn test_format_transcript() {
        let segments = vec![seg(0.0, 2.0, "hello"), seg(2.0, 5.0, "world")];
        assert_eq!(
            format_transcript(&segments),
            "[00:00:00 - 00:00:02] hello\n[00:00:02 - 00:00:05] world\n"
        );
    }

    #[test]
    fn test_format_transcript_trims_text() {
        let segments = vec![seg(0.4, 1.9, "  spaced out \n")];
        assert_eq!(format_transcript(&segments), "[00:00:00 - 00:00:01] spaced out\n");
        assert_eq!(format_transcript(&[]), "");
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0.0), "00:00:00");
        assert_eq!(format_timestamp(59.99), "00:00:59");
        assert_eq!(format_timestamp(3661.5), "01:01:01");
        assert_eq!(format_timestamp(90000.0), "25:00:00");
        assert_eq!(format_timestamp(-3.0), "00:00:00");
        assert_eq!(format_timestamp(f64::NAN), "00:00:00");
    }

    #[test]
    fn test_split_chunks() {
        assert_eq!(split_chunks("abcdefg", 3), vec!["abc", "def", "g"]);
        assert_eq!(split_chunks("abcdef", 3), vec!["abc", "def"]);
        assert_eq!(split_chunks("ab", 3), vec!["ab"]);
        assert!(split_chunks("", 3).is_empty());
        // マルチバイト文字の境界で分割する
        assert_eq!(split_chunks("äöüß", 3), vec!["äöü", "ß"]);
    }

    // ── 要約 ──────────────────────────────

    #[tokio::test]
    async fn test_short_text_summarized_once() {
        let h = harness(Ok(TranscriptionResult::default()), false, upper);
        let text = "x".repeat(50);
        assert_eq!(h.pipeline.summarize_text(&text).await, "X".repeat(50));
        assert_eq!(h.calls.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_text_is_not_summarized() {
        let h = harness(Ok(TranscriptionResult::default()), false, upper);
        assert_eq!(h.pipeline.summarize_text("").await, "");
        assert!(h.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_long_text_is_chunked() {
        let h = harness(Ok(TranscriptionResult::default()), false, |t| format!("s{}", t.len()));
        // 3000 + 3000 + 31 文字 → 3チャンクとも要約対象
        let text = format!("{}{}{}", "a".repeat(3000), "b".repeat(3000), "c".repeat(31));
        let summary = h.pipeline.summarize_text(&text).await;
        assert_eq!(summary, "s3000 s31");
        let calls = h.calls.lock();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0], "a".repeat(3000));
        assert_eq!(calls[1], "b".repeat(3000));
        assert_eq!(calls[2], "c".repeat(31));
    }

    #[tokio::test]
    async fn test_tiny_trailing_chunk_is_dropped() {
        let h = harness(Ok(TranscriptionResult::default()), false, upper);
        let text = format!("{}{}", "a".repeat(3000), " ".repeat(10) + &"z".repeat(30));
        let summary = h.pipeline.summarize_text(&text).await;
        assert_eq!(summary, "A".repeat(3000));
        assert_eq!(h.calls.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_summaries_are_dropped() {
        let h = harness(Ok(TranscriptionResult::default()), false, constant);
        let text = "word ".repeat(1300);
        let summary = h.pipeline.summarize_text(&text).await;
        assert_eq!(summary, "Same Summary");
        assert_eq!(h.calls.lock().len(), 3);
    }

    #[tokio::test]
    async fn test_dedup_is_case_insensitive() {
        fn alternating(t: &str) -> String {
            if t.starts_with('a') {
                "Meeting Notes".into()
            } else {
                "MEETING NOTES".into()
            }
        }
        let h = harness(Ok(TranscriptionResult::default()), false, alternating);
        let text = format!("{}{}", "a".repeat(3000), "b".repeat(3000));
        assert_eq!(h.pipeline.summarize_text(&text).await, "Meeting Notes");
    }

    #[tokio::test]
    async fn test_failing_summarizer_falls_back_to_chunks() {
        let h = harness(Ok(TranscriptionResult::default()), true, upper);
        let text = format!("{}{}", "a".repeat(3000), "b".repeat(100));
        let summary = h.pipeline.summarize_text(&text).await;
        assert_eq!(summary, format!("{} {}", "a".repeat(3000), "b".repeat(100)));
    }

    // ── 実行 ──────────────────────────────

    #[tokio::test]
    async fn test_run_completes_and_persists() {
        let result = TranscriptionResult {
            text: " hello world ".into(),
            segments: vec![seg(0.0, 2.0, " hello"), seg(2.0, 5.0, " world")],
        };
        let h = harness(Ok(result), false, upper);
        let path = write_audio(&h).await;

        h.pipeline.run(&path, "job.wav").await;

        let r = h.store.get("job.wav").unwrap();
        assert_eq!(r.status, JobStatus::Completed);
        assert_eq!(r.progress, 100);
        let transcript = "[00:00:00 - 00:00:02] hello\n[00:00:02 - 00:00:05] world\n";
        assert_eq!(r.transcript.as_deref(), Some(transcript));
        assert_eq!(r.summary.as_deref(), Some("HELLO WORLD"));
        assert!(r.error_message.is_none());

        assert_eq!(
            h.artifacts.read_transcript("job.wav").await.unwrap().as_deref(),
            Some(transcript)
        );
        assert_eq!(h.artifacts.read_summary("job.wav").await.unwrap(), "HELLO WORLD");
    }

    #[tokio::test]
    async fn test_progress_is_monotonic() {
        let result = TranscriptionResult {
            text: "short".into(),
            segments: vec![seg(0.0, 1.0, "short")],
        };
        let h = harness(Ok(result), false, upper);
        let path = write_audio(&h).await;

        h.pipeline.run(&path, "job.wav").await;

        let mut seen = h.seen.lock().clone();
        seen.push(h.store.get("job.wav").unwrap().progress);
        assert_eq!(seen, vec![10, 75, 100]);
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test]
    async fn test_missing_audio_fails() {
        let h = harness(Ok(TranscriptionResult::default()), false, upper);
        h.pipeline
            .run(Path::new("/nonexistent/job.wav"), "job.wav")
            .await;

        let r = h.store.get("job.wav").unwrap();
        assert_eq!(r.status, JobStatus::Error);
        assert_eq!(r.progress, 0);
        assert!(r.error_message.as_deref().unwrap().contains("not found"));
        assert!(r.transcript.is_none());
        assert!(r.summary.is_none());
        assert!(h.artifacts.read_transcript("job.wav").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_transcriber_error_fails_job() {
        let h = harness(
            Err(SttError::transcription_failed("decoder exploded")),
            false,
            upper,
        );
        let path = write_audio(&h).await;
        h.pipeline.run(&path, "job.wav").await;

        let r = h.store.get("job.wav").unwrap();
        assert_eq!(*r, JobRecord::failed(r.error_message.clone().unwrap()));
        assert!(r.error_message.as_deref().unwrap().contains("decoder exploded"));
        assert!(h.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_silent_audio_completes_empty() {
        let h = harness(Ok(TranscriptionResult::default()), false, upper);
        let path = write_audio(&h).await;
        h.pipeline.run(&path, "job.wav").await;

        let r = h.store.get("job.wav").unwrap();
        assert_eq!(r.status, JobStatus::Completed);
        assert_eq!(r.transcript.as_deref(), Some(""));
        assert_eq!(r.summary.as_deref(), Some(""));
        assert_eq!(h.artifacts.read_summary("job.wav").await.unwrap(), "");
        assert!(h.artifacts.summary_path("job.wav").unwrap().exists());
    }

    #[tokio::test]
    async fn test_rerun_overwrites_previous_error() {
        let h = harness(
            Ok(TranscriptionResult {
                text: "ok".into(),
                segments: vec![seg(0.0, 1.0, "ok")],
            }),
            false,
            upper,
        );
        h.store.set("job.wav", JobRecord::failed("old"));
        let path = write_audio(&h).await;
        h.pipeline.run(&path, "job.wav").await;
        assert_eq!(h.store.get("job.wav").unwrap().status, JobStatus::Completed);
    }
}
