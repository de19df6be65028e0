mod docx;
mod pdf;

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use docx::DocxExtractor;
pub use pdf::PdfExtractor;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Archive error: {0}")]
    Archive(String),
    #[error("XML error: {0}")]
    Xml(String),
    #[error("PDF error: {0}")]
    Pdf(String),
    #[error("Extractor panicked: {0}")]
    Panicked(String),
}

pub type ExtractionResult<T> = Result<T, ExtractionError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    Pdf,
    WordProcessor,
}

impl DocumentFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" | "doc" => Some(Self::WordProcessor),
            _ => None,
        }
    }

    pub fn from_file_name(name: &str) -> Option<Self> {
        Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// An uploaded resume file. The name is only used to infer the format.
#[derive(Debug, Clone)]
pub struct Document {
    name: String,
    format: Option<DocumentFormat>,
    bytes: Vec<u8>,
}

impl Document {
    #[must_use]
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let format = DocumentFormat::from_file_name(&name);
        Self {
            name,
            format,
            bytes,
        }
    }

    #[must_use]
    pub fn with_format(mut self, format: DocumentFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn read(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(name, bytes))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn format(&self) -> Option<DocumentFormat> {
        self.format
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

pub trait TextExtractor: Send + Sync {
    fn supported_formats(&self) -> &[DocumentFormat];

    fn can_extract(&self, format: DocumentFormat) -> bool {
        self.supported_formats().contains(&format)
    }

    fn extract(&self, data: &[u8]) -> ExtractionResult<String>;
}

pub struct CompositeExtractor {
    extractors: Vec<Box<dyn TextExtractor>>,
}

impl CompositeExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            extractors: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_extractor(mut self, extractor: Box<dyn TextExtractor>) -> Self {
        self.extractors.push(extractor);
        self
    }

    fn find_extractor(&self, format: DocumentFormat) -> Option<&dyn TextExtractor> {
        self.extractors
            .iter()
            .find(|e| e.can_extract(format))
            .map(AsRef::as_ref)
    }

    /// Readable text of the document, or an empty string when none can be
    /// recovered. Never fails.
    pub fn extract_text(&self, document: &Document) -> String {
        let Some(format) = document.format() else {
            tracing::debug!("Unrecognized document type: {}", document.name());
            return String::new();
        };

        let Some(extractor) = self.find_extractor(format) else {
            tracing::debug!("No extractor registered for {:?}", format);
            return String::new();
        };

        match extractor.extract(document.bytes()) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("No text extracted from {}: {}", document.name(), e);
                String::new()
            }
        }
    }
}

impl Default for CompositeExtractor {
    fn default() -> Self {
        Self::new()
            .with_extractor(Box::new(PdfExtractor::new()))
            .with_extractor(Box::new(DocxExtractor::new()))
    }
}

/// Extracts text with the default PDF and DOCX extractors.
#[must_use]
pub fn extract_text(document: &Document) -> String {
    CompositeExtractor::default().extract_text(document)
}
