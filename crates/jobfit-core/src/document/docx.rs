//! Word-processor (DOCX) text extraction.
//!
//! DOCX files are ZIP archives; the body lives in `word/document.xml` as a
//! sequence of `w:p` paragraphs made of `w:r` runs holding `w:t` text.

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use super::{DocumentFormat, ExtractionError, ExtractionResult, TextExtractor};

pub struct DocxExtractor;

impl DocxExtractor {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn read_document_xml(data: &[u8]) -> ExtractionResult<String> {
        let mut archive = ZipArchive::new(Cursor::new(data))
            .map_err(|e| ExtractionError::Archive(format!("Failed to open DOCX archive: {e}")))?;

        let mut file = archive
            .by_name("word/document.xml")
            .map_err(|e| ExtractionError::Archive(format!("Missing word/document.xml: {e}")))?;

        let mut xml = String::new();
        file.read_to_string(&mut xml)
            .map_err(|e| ExtractionError::Archive(format!("Failed to read document.xml: {e}")))?;
        Ok(xml)
    }

    fn paragraphs(xml: &str) -> ExtractionResult<Vec<String>> {
        let mut reader = Reader::from_str(xml);
        let mut paragraphs = Vec::new();
        let mut current = String::new();
        let mut in_paragraph = false;
        let mut in_text = false;
        // Paragraphs inside a text box (`w:txbxContent`) are not part of the
        // enclosing paragraph's text.
        let mut textbox_depth = 0_usize;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) if e.local_name().as_ref() == b"txbxContent" => {
                    textbox_depth += 1;
                }
                Ok(Event::End(e)) if e.local_name().as_ref() == b"txbxContent" => {
                    textbox_depth = textbox_depth.saturating_sub(1);
                }
                Ok(Event::Start(e)) if textbox_depth == 0 => match e.local_name().as_ref() {
                    b"p" => {
                        in_paragraph = true;
                        current.clear();
                    }
                    b"t" => in_text = true,
                    _ => {}
                },
                Ok(Event::Empty(e)) if textbox_depth == 0 => match e.local_name().as_ref() {
                    b"p" => paragraphs.push(String::new()),
                    b"tab" if in_paragraph => current.push('\t'),
                    b"br" | b"cr" if in_paragraph => current.push('\n'),
                    _ => {}
                },
                Ok(Event::Text(t)) if in_text && textbox_depth == 0 => {
                    let text = t
                        .unescape()
                        .map_err(|e| ExtractionError::Xml(e.to_string()))?;
                    current.push_str(&text);
                }
                Ok(Event::End(e)) if textbox_depth == 0 => match e.local_name().as_ref() {
                    b"p" => {
                        in_paragraph = false;
                        paragraphs.push(std::mem::take(&mut current));
                    }
                    b"t" => in_text = false,
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(ExtractionError::Xml(format!(
                        "Error at position {}: {e}",
                        reader.buffer_position()
                    )))
                }
            }
        }

        Ok(paragraphs)
    }
}

impl Default for DocxExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextExtractor for DocxExtractor {
    fn supported_formats(&self) -> &[DocumentFormat] {
        &[DocumentFormat::WordProcessor]
    }

    fn extract(&self, data: &[u8]) -> ExtractionResult<String> {
        let xml = Self::read_document_xml(data)?;
        let paragraphs = Self::paragraphs(&xml)?;
        Ok(paragraphs.join("\n").trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::fixtures;

    const NS: &str = "xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"";

    #[test]
    fn test_runs_concatenate_within_paragraph() {
        let xml = format!(
            "<w:document {NS}><w:body>\
             <w:p><w:r><w:t>Data </w:t></w:r><w:r><w:t>Analyst</w:t></w:r></w:p>\
             <w:p><w:r><w:t>Excel</w:t><w:tab/><w:t>SQL</w:t></w:r></w:p>\
             </w:body></w:document>"
        );
        let paragraphs = DocxExtractor::paragraphs(&xml).unwrap();
        assert_eq!(paragraphs, vec!["Data Analyst", "Excel\tSQL"]);
    }

    #[test]
    fn test_text_box_leaves_enclosing_paragraph_intact() {
        let xml = format!(
            "<w:document {NS}><w:body>\
             <w:p><w:r><w:t>Jane Doe</w:t></w:r>\
             <w:r><w:pict><w:txbxContent>\
             <w:p><w:r><w:t>Boxed</w:t></w:r></w:p><w:p/>\
             </w:txbxContent></w:pict></w:r>\
             <w:r><w:t xml:space=\"preserve\"> Engineer</w:t></w:r></w:p>\
             <w:p><w:r><w:t>Berlin</w:t></w:r></w:p>\
             </w:body></w:document>"
        );
        let paragraphs = DocxExtractor::paragraphs(&xml).unwrap();
        assert_eq!(paragraphs, vec!["Jane Doe Engineer", "Berlin"]);
    }

    #[test]
    fn test_empty_paragraphs_keep_boundaries() {
        let xml = format!(
            "<w:document {NS}><w:body>\
             <w:p><w:r><w:t>Jane</w:t></w:r></w:p><w:p/>\
             <w:p><w:r><w:t>Berlin</w:t></w:r></w:p>\
             </w:body></w:document>"
        );
        let bytes = fixtures::docx_with_document_xml(&xml);
        let text = DocxExtractor::new().extract(&bytes).unwrap();
        assert_eq!(text, "Jane\n\nBerlin");
    }

    #[test]
    fn test_entities_are_unescaped() {
        let bytes = fixtures::docx_with_paragraphs(&["R&amp;D &lt;lead&gt;"]);
        let text = DocxExtractor::new().extract(&bytes).unwrap();
        assert_eq!(text, "R&D <lead>");
    }

    #[test]
    fn test_missing_document_part_is_error() {
        let err = DocxExtractor::new().extract(b"not a zip").unwrap_err();
        assert!(matches!(err, ExtractionError::Archive(_)));
    }
}
