// Adapters layer: concrete implementations for external systems (remote model, local files).

pub mod gemini;
pub mod storage;

pub use gemini::GeminiBackend;
pub use storage::LocalDocumentSource;
