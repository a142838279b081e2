//! Raw document to ordered, trimmed, non-empty text lines.
//!
//! PDF files are read through their text layer first; when that layer is
//! empty the pages are rasterized and run through OCR instead. DOCX files
//! yield one line per paragraph (and per table row), TXT files one line per
//! non-blank line.

mod docx;
mod ocr;
mod pdf;

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{Error, Result};

pub use docx::{DocxReader, ParagraphReader};
pub use ocr::{OcrEngine, PageRasterizer, PdftoppmRasterizer, TesseractOcr};
pub use pdf::{PdfExtractReader, PdfTextReader};

/// Failure reported by one of the extraction backends. The extractor wraps it
/// into [`Error::Extraction`] together with the document name.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct BackendError(pub String);

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        Self(err.to_string())
    }
}

pub type BackendResult<T> = std::result::Result<T, BackendError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    Pdf,
    Docx,
    PlainText,
}

impl DocumentFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "txt" => Some(Self::PlainText),
            _ => None,
        }
    }

    /// Resolve the format from a file name, failing before any extraction is
    /// attempted when the extension is outside the accepted set.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();

        Self::from_extension(ext).ok_or_else(|| Error::unsupported(display_name(path), ext))
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::PlainText => "txt",
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    Direct,
    Ocr,
}

impl ExtractionMethod {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Ocr => "ocr",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedLine {
    pub text: String,
    /// Page number for PDFs, paragraph number for DOCX, always 1 for TXT.
    pub page: usize,
    /// Position of the line within the whole document.
    pub index: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub file_name: String,
    pub format: DocumentFormat,
    pub method: ExtractionMethod,
    pub page_count: usize,
    pub lines: Vec<ExtractedLine>,
}

impl ExtractionResult {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|l| l.text.as_str())
    }
}

/// Accumulates trimmed non-empty lines while keeping document order.
#[derive(Default)]
struct LineCollector {
    lines: Vec<ExtractedLine>,
}

impl LineCollector {
    fn push_block(&mut self, page: usize, block: &str) {
        for raw in block.lines() {
            let text = raw.trim();
            if !text.is_empty() {
                let index = self.lines.len();
                self.lines.push(ExtractedLine {
                    text: text.to_string(),
                    page,
                    index,
                });
            }
        }
    }

    fn finish(self) -> Vec<ExtractedLine> {
        self.lines
    }
}

pub trait TextExtractor: Send + Sync {
    fn extract(&self, path: &Path, format: DocumentFormat) -> Result<ExtractionResult>;

    fn extract_file(&self, path: &Path) -> Result<ExtractionResult> {
        let format = DocumentFormat::from_path(path)?;
        self.extract(path, format)
    }
}

pub struct DocumentExtractor {
    pdf_reader: Box<dyn PdfTextReader>,
    paragraph_reader: Box<dyn ParagraphReader>,
    rasterizer: Box<dyn PageRasterizer>,
    ocr_engine: Box<dyn OcrEngine>,
}

impl DocumentExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pdf_reader: Box::new(PdfExtractReader),
            paragraph_reader: Box::new(DocxReader),
            rasterizer: Box::new(PdftoppmRasterizer::default()),
            ocr_engine: Box::new(TesseractOcr::default()),
        }
    }

    #[must_use]
    pub fn with_pdf_reader(mut self, reader: Box<dyn PdfTextReader>) -> Self {
        self.pdf_reader = reader;
        self
    }

    #[must_use]
    pub fn with_paragraph_reader(mut self, reader: Box<dyn ParagraphReader>) -> Self {
        self.paragraph_reader = reader;
        self
    }

    #[must_use]
    pub fn with_rasterizer(mut self, rasterizer: Box<dyn PageRasterizer>) -> Self {
        self.rasterizer = rasterizer;
        self
    }

    #[must_use]
    pub fn with_ocr_engine(mut self, engine: Box<dyn OcrEngine>) -> Self {
        self.ocr_engine = engine;
        self
    }

    fn extract_pdf(&self, path: &Path, file_name: &str) -> Result<ExtractionResult> {
        let bytes = std::fs::read(path).map_err(|e| Error::extraction(file_name, e))?;
        let pages = self
            .pdf_reader
            .page_texts(&bytes)
            .map_err(|e| Error::extraction(file_name, e))?;

        let has_text_layer = pages.iter().any(|p| !p.trim().is_empty());
        if has_text_layer {
            let mut collector = LineCollector::default();
            for (idx, text) in pages.iter().enumerate() {
                collector.push_block(idx + 1, text);
            }

            return Ok(ExtractionResult {
                file_name: file_name.to_string(),
                format: DocumentFormat::Pdf,
                method: ExtractionMethod::Direct,
                page_count: pages.len(),
                lines: collector.finish(),
            });
        }

        tracing::info!(
            file = file_name,
            pages = pages.len(),
            "PDF has no text layer, falling back to OCR"
        );

        let mut collector = LineCollector::default();
        for page in 1..=pages.len() {
            let image = self
                .rasterizer
                .rasterize(path, page)
                .map_err(|e| Error::extraction(file_name, format!("page {page}: {e}")))?;
            let text = self
                .ocr_engine
                .recognize(&image)
                .map_err(|e| Error::extraction(file_name, format!("page {page}: {e}")))?;
            tracing::debug!(file = file_name, page, chars = text.len(), "OCR page complete");
            collector.push_block(page, &text);
        }

        Ok(ExtractionResult {
            file_name: file_name.to_string(),
            format: DocumentFormat::Pdf,
            method: ExtractionMethod::Ocr,
            page_count: pages.len(),
            lines: collector.finish(),
        })
    }

    fn extract_docx(&self, path: &Path, file_name: &str) -> Result<ExtractionResult> {
        let bytes = std::fs::read(path).map_err(|e| Error::extraction(file_name, e))?;
        let paragraphs = self
            .paragraph_reader
            .paragraphs(&bytes)
            .map_err(|e| Error::extraction(file_name, e))?;

        let mut lines = Vec::new();
        for (idx, paragraph) in paragraphs.iter().enumerate() {
            let text = paragraph.trim();
            if !text.is_empty() {
                lines.push(ExtractedLine {
                    text: text.to_string(),
                    page: idx + 1,
                    index: lines.len(),
                });
            }
        }

        Ok(ExtractionResult {
            file_name: file_name.to_string(),
            format: DocumentFormat::Docx,
            method: ExtractionMethod::Direct,
            page_count: 1,
            lines,
        })
    }

    fn extract_text(path: &Path, file_name: &str) -> Result<ExtractionResult> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::extraction(file_name, e))?;

        let mut collector = LineCollector::default();
        collector.push_block(1, &content);

        Ok(ExtractionResult {
            file_name: file_name.to_string(),
            format: DocumentFormat::PlainText,
            method: ExtractionMethod::Direct,
            page_count: 1,
            lines: collector.finish(),
        })
    }
}

impl Default for DocumentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextExtractor for DocumentExtractor {
    fn extract(&self, path: &Path, format: DocumentFormat) -> Result<ExtractionResult> {
        let file_name = display_name(path);
        tracing::info!(file = %file_name, format = %format, "Starting text extraction");

        let result = match format {
            DocumentFormat::Pdf => self.extract_pdf(path, &file_name)?,
            DocumentFormat::Docx => self.extract_docx(path, &file_name)?,
            DocumentFormat::PlainText => Self::extract_text(path, &file_name)?,
        };

        tracing::info!(
            file = %file_name,
            method = result.method.as_str(),
            pages = result.page_count,
            lines = result.lines.len(),
            "Text extraction complete"
        );

        Ok(result)
    }
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().to_string())
}
