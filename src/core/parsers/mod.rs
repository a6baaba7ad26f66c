pub mod text;

#[cfg(feature = "pdf")]
pub mod pdf;

#[cfg(feature = "docx")]
pub mod docx;

pub use text::TextParser;

#[cfg(feature = "pdf")]
pub use pdf::PdfParser;

#[cfg(feature = "docx")]
pub use docx::DocxParser;
