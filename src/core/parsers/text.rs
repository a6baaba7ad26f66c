use crate::domain::model::DocumentFormat;
use crate::domain::ports::DocumentParser;
use crate::utils::error::ExtractionError;

/// 純文字與 Markdown：位元組即為內容
#[derive(Debug, Clone, Copy)]
pub struct TextParser {
    format: DocumentFormat,
}

impl TextParser {
    pub fn new(format: DocumentFormat) -> Self {
        Self { format }
    }
}

impl DocumentParser for TextParser {
    fn format(&self) -> DocumentFormat {
        self.format
    }

    fn parse(&self, raw_bytes: &[u8]) -> Result<String, ExtractionError> {
        std::str::from_utf8(raw_bytes)
            .map(str::to_string)
            .map_err(|e| ExtractionError::DecodeError {
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_is_returned_verbatim() {
        let parser = TextParser::new(DocumentFormat::PlainText);
        assert_eq!(parser.parse(b"Hello World").unwrap(), "Hello World");
        assert_eq!(parser.parse(b"  line\r\n").unwrap(), "  line\r\n");
    }

    #[test]
    fn test_invalid_utf8_is_a_decode_error() {
        let parser = TextParser::new(DocumentFormat::Markdown);
        let err = parser.parse(&[0x66, 0x6f, 0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, ExtractionError::DecodeError { .. }));
    }
}
