use crate::domain::model::DocumentFormat;
use crate::domain::ports::DocumentParser;
use crate::utils::error::ExtractionError;
use lopdf::Document;

/// 依頁碼順序串接每一頁的文字
///
/// 無法擷取文字的頁面（純圖片掃描、不支援的字型編碼）視為空白，不會讓整份文件失敗。
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfParser;

impl PdfParser {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentParser for PdfParser {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Pdf
    }

    fn parse(&self, raw_bytes: &[u8]) -> Result<String, ExtractionError> {
        let doc = Document::load_mem(raw_bytes)
            .map_err(|e| ExtractionError::malformed(DocumentFormat::Pdf, e.to_string()))?;

        let mut text = String::new();
        // get_pages 以頁碼為鍵的 BTreeMap，迭代即為頁面順序
        for (page_num, _page_id) in doc.get_pages() {
            match doc.extract_text(&[page_num]) {
                Ok(content) => text.push_str(&content),
                Err(e) => {
                    tracing::debug!("No extractable text on PDF page {}: {}", page_num, e);
                }
            }
        }

        Ok(text)
    }
}
