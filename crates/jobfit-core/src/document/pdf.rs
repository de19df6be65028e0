use std::panic::{self, AssertUnwindSafe};

use super::{DocumentFormat, ExtractionError, ExtractionResult, TextExtractor};

/// PDF text extraction: layout-aware first, raw page content streams second.
pub struct PdfExtractor;

impl PdfExtractor {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn extract_layout(data: &[u8]) -> ExtractionResult<String> {
        // pdf-extract panics on some malformed font tables.
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem(data)
        }))
        .map_err(|payload| ExtractionError::Panicked(panic_message(&payload)))?;

        result.map_err(|e| ExtractionError::Pdf(e.to_string()))
    }

    fn extract_content_streams(data: &[u8]) -> ExtractionResult<String> {
        let doc =
            lopdf::Document::load_mem(data).map_err(|e| ExtractionError::Pdf(e.to_string()))?;
        let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
        if pages.is_empty() {
            return Ok(String::new());
        }

        let mut text = String::new();
        for page in pages {
            match doc.extract_text(&[page]) {
                Ok(page_text) => {
                    text.push_str(&page_text);
                    text.push('\n');
                }
                Err(e) => tracing::debug!("Skipping unreadable page {}: {}", page, e),
            }
        }

        Ok(text.trim().to_string())
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextExtractor for PdfExtractor {
    fn supported_formats(&self) -> &[DocumentFormat] {
        &[DocumentFormat::Pdf]
    }

    fn extract(&self, data: &[u8]) -> ExtractionResult<String> {
        match Self::extract_layout(data) {
            Ok(text) if !text.trim().is_empty() => return Ok(text.trim().to_string()),
            Ok(_) => tracing::debug!("Layout extraction found no text, trying content streams"),
            Err(e) => tracing::debug!("Layout extraction failed, trying content streams: {}", e),
        }

        Self::extract_content_streams(data)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{extract_text, fixtures, Document};

    #[test]
    fn test_content_stream_fallback_reads_pages() {
        let bytes = fixtures::pdf_with_text("Fallback Path");
        let text = PdfExtractor::extract_content_streams(&bytes).unwrap();
        assert!(text.contains("Fallback"), "got {text:?}");
    }

    #[test]
    fn test_pageless_pdf_falls_back_to_empty_text() {
        let bytes = fixtures::pdf_without_pages();
        assert_eq!(PdfExtractor::extract_content_streams(&bytes).unwrap(), "");
        assert_eq!(PdfExtractor::new().extract(&bytes).unwrap(), "");

        let document = Document::new("empty.pdf", bytes);
        assert_eq!(extract_text(&document), "");
    }

    #[test]
    fn test_garbage_is_an_error_not_a_panic() {
        let extractor = PdfExtractor::new();
        assert!(extractor.extract(b"definitely not a pdf").is_err());
    }
}
