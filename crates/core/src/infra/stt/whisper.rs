use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

use crate::domain::stt::{
    SttError, Transcriber, TranscriptSegment, TranscriptionResult,
};

/// Whisper.cpp sidecar の設定。
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct WhisperConfig {
    /// whisper-cli バイナリのパス
    pub binary_path: PathBuf,
    /// GGML モデルファイルのパス
    pub model_path: PathBuf,
    /// 言語 (例: "en", "ja", "auto")
    pub language: String,
    /// サンプリング温度 (0.0 = greedy)
    pub temperature: f32,
    /// ビームサーチサイズ (1 = greedy)
    pub beam_size: u32,
    /// タイムアウト秒数（ファイル全体の処理時間）
    pub timeout_secs: u64,
    /// 使用スレッド数
    pub threads: u32,
}

impl Default for WhisperConfig {
    fn default() -> Self {
        Self {
            binary_path: PathBuf::from("whisper-cli"),
            model_path: PathBuf::from("models/ggml-base.bin"),
            language: "en".into(),
            temperature: 0.0,
            beam_size: 1,
            timeout_secs: 1800,
            threads: 4,
        }
    }
}

/// Whisper.cpp sidecar プロセスマネージャ。
pub struct WhisperSidecar {
    config: WhisperConfig,
}

impl WhisperSidecar {
    pub fn new(config: WhisperConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WhisperConfig {
        &self.config
    }

    /// whisper バイナリとモデルの存在を検証する。
    pub fn validate(&self) -> Result<(), SttError> {
        if !self.config.binary_path.exists() && which_binary(&self.config.binary_path).is_none() {
            return Err(SttError::engine_not_available(format!(
                "Whisper binary not found: {:?}",
                self.config.binary_path
            )));
        }
        if !self.config.model_path.exists() {
            return Err(SttError::engine_not_available(format!(
                "Whisper model not found: {:?}",
                self.config.model_path
            )));
        }
        Ok(())
    }

    /// JSON 出力ファイルのプレフィックス（whisper-cli が `.json` を付与する）
    fn output_prefix(audio_path: &Path) -> PathBuf {
        let mut prefix = audio_path.as_os_str().to_owned();
        prefix.push(".whisper");
        PathBuf::from(prefix)
    }

    /// whisper-cli 用のコマンドライン引数を構築する。
    fn build_args(config: &WhisperConfig, audio_path: &Path, output_prefix: &Path) -> Vec<String> {
        vec![
            "--model".into(),
            config.model_path.to_string_lossy().into(),
            "--language".into(),
            config.language.clone(),
            "--output-json".into(),
            "--output-file".into(),
            output_prefix.to_string_lossy().into(),
            "--no-prints".into(),
            "--threads".into(),
            config.threads.to_string(),
            "--temperature".into(),
            config.temperature.to_string(),
            "--beam-size".into(),
            config.beam_size.to_string(),
            "--file".into(),
            audio_path.to_string_lossy().into(),
        ]
    }

    /// whisper sidecar を実行して出力をパースする。
    async fn run_whisper(&self, audio_path: &Path) -> Result<TranscriptionResult, SttError> {
        let config = &self.config;
        let prefix = Self::output_prefix(audio_path);
        let json_path = prefix.with_extension("whisper.json");
        let args = Self::build_args(config, audio_path, &prefix);

        // 成否に関わらず中間JSONを残さない
        let _cleanup = OutputCleanup(json_path.clone());

        log::debug!("Running whisper: {:?} {:?}", config.binary_path, args);

        let child = Command::new(&config.binary_path)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    SttError::engine_not_available(format!(
                        "Whisper binary not found: {:?}",
                        config.binary_path
                    ))
                } else {
                    SttError::transcription_failed(format!(
                        "Failed to spawn whisper process: {}",
                        e
                    ))
                }
            })?;

        let output = timeout(Duration::from_secs(config.timeout_secs), child.wait_with_output())
            .await
            .map_err(|_| {
                SttError::timeout(format!("Whisper timed out after {}s", config.timeout_secs))
            })?
            .map_err(|e| SttError::transcription_failed(format!("Whisper process error: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SttError::transcription_failed(format!(
                "Whisper exited with status {}: {}",
                output.status, stderr
            )));
        }

        let json = tokio::fs::read_to_string(&json_path).await.map_err(|e| {
            SttError::transcription_failed(format!(
                "Failed to read whisper output {:?}: {}",
                json_path, e
            ))
        })?;
        parse_whisper_output(&json)
    }
}

/// スコープを抜けるときに whisper の出力ファイルを削除する
struct OutputCleanup(PathBuf);

impl Drop for OutputCleanup {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.0) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("whisper 出力の削除に失敗: {:?}: {e}", self.0),
        }
    }
}

// ─── Whisper JSON デシリアライゼーション ──────────────────────────

/// whisper-cli --output-json の出力フォーマット。
#[derive(Debug, serde::Deserialize)]
struct WhisperJsonOutput {
    transcription: Vec<WhisperJsonSegment>,
}

#[derive(Debug, serde::Deserialize)]
struct WhisperJsonSegment {
    offsets: WhisperOffsets,
    text: String,
}

/// ミリ秒単位のオフセット
#[derive(Debug, serde::Deserialize)]
struct WhisperOffsets {
    from: u64,
    to: u64,
}

/// whisper JSON 出力をパースする。空出力は無音として空の結果を返す。
fn parse_whisper_output(output: &str) -> Result<TranscriptionResult, SttError> {
    let json_str = output.trim();

    if json_str.is_empty() {
        return Ok(TranscriptionResult::default());
    }

    let parsed: WhisperJsonOutput = serde_json::from_str(json_str).map_err(|e| {
        let raw: String = json_str.chars().take(500).collect();
        SttError::transcription_failed(format!("Failed to parse whisper JSON: {}. Raw: {}", e, raw))
    })?;

    let text = parsed
        .transcription
        .iter()
        .map(|seg| seg.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<&str>>()
        .join(" ");

    let segments = parsed
        .transcription
        .into_iter()
        .map(|seg| {
            let start = seg.offsets.from as f64 / 1000.0;
            let end = (seg.offsets.to.max(seg.offsets.from)) as f64 / 1000.0;
            TranscriptSegment { start, end, text: seg.text }
        })
        .collect();

    Ok(TranscriptionResult { text, segments })
}

/// PATH 上でバイナリを検索する簡易ヘルパー。
fn which_binary(name: &Path) -> Option<PathBuf> {
    let name_str = name.to_string_lossy();
    if name_str.contains('/') || name_str.contains('\\') {
        return if name.exists() { Some(name.to_path_buf()) } else { None };
    }
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(name))
        .find(|full_path| full_path.exists())
}

// ─── Transcriber 実装 ───────────────────────────────────────────

#[async_trait::async_trait]
impl Transcriber for WhisperSidecar {
    async fn transcribe(&self, audio_path: &Path) -> Result<TranscriptionResult, SttError> {
        if !audio_path.exists() {
            return Err(SttError::audio_format(format!(
                "Audio file not found: {:?}",
                audio_path
            )));
        }

        self.run_whisper(audio_path).await
    }

    fn name(&self) -> &str {
        "whisper.cpp"
    }
}

// ─── テスト ─────────────────────────────────────────────────────
