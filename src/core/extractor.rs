use crate::core::parsers::TextParser;
use crate::domain::model::{declared_extension, DocumentFormat};
use crate::domain::ports::DocumentParser;
use crate::utils::error::ExtractionError;
use std::collections::HashMap;

/// 依副檔名將上傳的文件分派給已註冊的解析器
pub struct DocumentExtractor {
    parsers: HashMap<DocumentFormat, Box<dyn DocumentParser>>,
}

impl DocumentExtractor {
    /// 沒有任何解析器，所有已知格式都回傳 `ParserUnavailable`
    pub fn empty() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    /// 註冊此次編譯啟用的所有解析器
    pub fn with_default_parsers() -> Self {
        let mut extractor = Self::empty();
        extractor.register(TextParser::new(DocumentFormat::PlainText));
        extractor.register(TextParser::new(DocumentFormat::Markdown));

        #[cfg(feature = "pdf")]
        extractor.register(crate::core::parsers::PdfParser::new());

        #[cfg(feature = "docx")]
        extractor.register(crate::core::parsers::DocxParser::new());

        tracing::debug!("Registered document parsers: {:?}", extractor.supported_formats());
        extractor
    }

    /// 同一格式的舊解析器會被取代
    pub fn register<P: DocumentParser + 'static>(&mut self, parser: P) {
        self.parsers.insert(parser.format(), Box::new(parser));
    }

    pub fn supports(&self, format: DocumentFormat) -> bool {
        self.parsers.contains_key(&format)
    }

    pub fn supported_formats(&self) -> Vec<DocumentFormat> {
        DocumentFormat::ALL
            .into_iter()
            .filter(|format| self.supports(*format))
            .collect()
    }

    pub fn extract(&self, file_name: &str, raw_bytes: &[u8]) -> Result<String, ExtractionError> {
        let extension = declared_extension(file_name);
        let format = DocumentFormat::from_extension(&extension)
            .ok_or_else(|| ExtractionError::UnsupportedFileType(extension.clone()))?;

        let parser = self
            .parsers
            .get(&format)
            .ok_or(ExtractionError::ParserUnavailable(format))?;

        tracing::debug!("Extracting {} ({} bytes) as {}", file_name, raw_bytes.len(), format);
        let text = parser.parse(raw_bytes)?;
        tracing::info!("Extracted {} characters from {}", text.chars().count(), file_name);
        Ok(text)
    }
}

impl Default for DocumentExtractor {
    fn default() -> Self {
        Self::with_default_parsers()
    }
}
