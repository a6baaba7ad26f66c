use crate::domain::model::DocumentFormat;
use crate::domain::ports::DocumentParser;
use crate::utils::error::ExtractionError;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};

const DOCUMENT_PART: &str = "word/document.xml";

/// 讀取 Office Open XML 的主文件部分，並以 `\n` 串接本文段落
///
/// 只計入 `w:body` 直接子元素的 `w:p`。表格儲存格、內容控制項與文字方塊的段落
/// 位於更深層，不會被收錄。
#[derive(Debug, Default, Clone, Copy)]
pub struct DocxParser;

impl DocxParser {
    pub fn new() -> Self {
        Self
    }

    fn read_document_part(raw_bytes: &[u8]) -> Result<String, ExtractionError> {
        let mut archive = zip::ZipArchive::new(Cursor::new(raw_bytes))
            .map_err(|e| malformed(format!("not a DOCX container: {}", e)))?;

        let mut part = archive
            .by_name(DOCUMENT_PART)
            .map_err(|_| malformed(format!("missing {}", DOCUMENT_PART)))?;

        let mut xml = String::new();
        part.read_to_string(&mut xml)
            .map_err(|e| malformed(format!("unreadable {}: {}", DOCUMENT_PART, e)))?;
        Ok(xml)
    }
}

fn malformed(message: String) -> ExtractionError {
    ExtractionError::malformed(DocumentFormat::Docx, message)
}

/// 依文件順序收集每個 `w:body` 直接子段落的文字
pub fn paragraphs_from_xml(xml: &str) -> Result<Vec<String>, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    // w:body 子元素所在的深度
    let mut body_child_depth: Option<usize> = None;
    let mut paragraph_depth: Option<usize> = None;
    let mut nested_paragraphs = 0usize;
    let mut in_text = false;

    loop {
        let collecting = paragraph_depth.is_some() && nested_paragraphs == 0;
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                depth += 1;
                match e.local_name().as_ref() {
                    b"body" => body_child_depth = Some(depth + 1),
                    b"p" if paragraph_depth.is_some() => nested_paragraphs += 1,
                    b"p" if body_child_depth == Some(depth) => {
                        paragraph_depth = Some(depth);
                        current.clear();
                    }
                    b"t" if collecting => in_text = true,
                    _ => {}
                }
            }
            Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"p" if paragraph_depth.is_none() && body_child_depth == Some(depth + 1) => {
                    paragraphs.push(String::new())
                }
                b"tab" if collecting => current.push('\t'),
                b"br" | b"cr" if collecting => current.push('\n'),
                _ => {}
            },
            Ok(Event::Text(ref e)) if in_text => {
                let text = e
                    .unescape()
                    .map_err(|e| malformed(format!("bad text run: {}", e)))?;
                current.push_str(&text);
            }
            Ok(Event::End(ref e)) => {
                match e.local_name().as_ref() {
                    b"p" if paragraph_depth == Some(depth) => {
                        paragraph_depth = None;
                        paragraphs.push(std::mem::take(&mut current));
                    }
                    b"p" if paragraph_depth.is_some() => {
                        nested_paragraphs = nested_paragraphs.saturating_sub(1)
                    }
                    b"t" => in_text = false,
                    b"body" => body_child_depth = None,
                    _ => {}
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(malformed(format!(
                    "XML error at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
    }

    Ok(paragraphs)
}

impl DocumentParser for DocxParser {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Docx
    }

    fn parse(&self, raw_bytes: &[u8]) -> Result<String, ExtractionError> {
        let xml = Self::read_document_part(raw_bytes)?;
        let paragraphs = paragraphs_from_xml(&xml)?;
        tracing::debug!("DOCX contains {} body paragraphs", paragraphs.len());
        Ok(paragraphs.join("\n"))
    }
}
