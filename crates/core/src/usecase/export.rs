use std::io::Cursor;
use std::sync::Arc;

use docx_rs::{Docx, Paragraph, Run, Style, StyleType};

use crate::domain::error::AppError;
use crate::infra::storage::ArtifactStore;
use crate::usecase::translation::TranslationService;

pub const DEFAULT_LANG: &str = "en";

const DOCX_TITLE: &str = "TranscribeFlow Report";
const DOCX_NO_SUMMARY: &str = "No summary available.";

/// ダウンロード形式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Txt,
    Docx,
}

impl ExportFormat {
    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s.to_ascii_lowercase().as_str() {
            "txt" => Ok(Self::Txt),
            "docx" => Ok(Self::Docx),
            _ => Err(AppError::invalid_input("Invalid file type")),
        }
    }

    pub fn extension(&self) -> &str {
        match self {
            Self::Txt => "txt",
            Self::Docx => "docx",
        }
    }

    pub fn content_type(&self) -> &str {
        match self {
            Self::Txt => "text/plain; charset=utf-8",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

/// ダウンロード用に整形したレポート
#[derive(Debug, Clone)]
pub struct ExportedReport {
    pub file_name: String,
    pub content_type: String,
    pub body: Vec<u8>,
}

pub struct ExportService {
    artifacts: Arc<ArtifactStore>,
    translation: Arc<TranslationService>,
}

impl ExportService {
    pub fn new(artifacts: Arc<ArtifactStore>, translation: Arc<TranslationService>) -> Self {
        Self {
            artifacts,
            translation,
        }
    }

    /// 書き起こし（必須）と要約を読み、必要なら翻訳して整形する。
    /// 翻訳に失敗した場合は原文のまま出力する。
    pub async fn export(
        &self,
        job_id: &str,
        format: &str,
        lang: &str,
    ) -> Result<ExportedReport, AppError> {
        let format = ExportFormat::parse(format)?;
        let lang = if lang.trim().is_empty() {
            DEFAULT_LANG
        } else {
            lang.trim()
        };

        let Some(mut transcript) = self.artifacts.read_transcript(job_id).await? else {
            return Err(AppError::not_found("File not found"));
        };
        let mut summary = self.artifacts.read_summary(job_id).await?;

        if lang != DEFAULT_LANG {
            match self.translation.translate_report(&transcript, &summary, lang).await {
                Ok(report) => {
                    transcript = report.transcript;
                    summary = report.summary;
                }
                Err(e) => {
                    log::error!("Translation to {lang} failed for {job_id}: {}", e.message);
                }
            }
        }

        let body = match format {
            ExportFormat::Txt => render_txt(&summary, &transcript).into_bytes(),
            ExportFormat::Docx => render_docx(&summary, &transcript)?,
        };

        Ok(ExportedReport {
            file_name: format!("{job_id}_{lang}.{}", format.extension()),
            content_type: format.content_type().to_string(),
            body,
        })
    }
}

pub fn render_txt(summary: &str, transcript: &str) -> String {
    format!("SUMMARY:\n{summary}\n\nTRANSCRIPT:\n{transcript}")
}

/// 見出し付きの Word 文書。書き起こしは1行1段落。
pub fn render_docx(summary: &str, transcript: &str) -> Result<Vec<u8>, AppError> {
    let summary = if summary.is_empty() {
        DOCX_NO_SUMMARY
    } else {
        summary
    };

    let mut doc = Docx::new()
        .add_style(heading_style("Heading1", "Heading 1", 32))
        .add_style(heading_style("Heading2", "Heading 2", 26))
        .add_paragraph(heading("Heading1", DOCX_TITLE))
        .add_paragraph(heading("Heading2", "Summary"))
        .add_paragraph(text_paragraph(summary))
        .add_paragraph(heading("Heading2", "Transcript"));

    let mut lines = transcript.lines().peekable();
    if lines.peek().is_none() {
        doc = doc.add_paragraph(Paragraph::new());
    }
    for line in lines {
        doc = doc.add_paragraph(text_paragraph(line));
    }

    let mut buf = Cursor::new(Vec::new());
    doc.build()
        .pack(&mut buf)
        .map_err(|e| AppError::internal(format!("Failed to build docx: {e}")))?;
    Ok(buf.into_inner())
}

fn heading_style(id: &str, name: &str, size: usize) -> Style {
    Style::new(id, StyleType::Paragraph).name(name).size(size).bold()
}

fn heading(style: &str, text: &str) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(text)).style(style)
}

fn text_paragraph(text: &str) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(text))
}
