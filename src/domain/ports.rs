use crate::domain::model::{DocumentFormat, GenerationRequest, SourceDocument};
use crate::utils::error::{ExtractionError, QueryError, Result};
use async_trait::async_trait;

/// Turns the raw bytes of one document format into plain text.
pub trait DocumentParser: Send + Sync {
    fn format(&self) -> DocumentFormat;
    fn parse(&self, raw_bytes: &[u8]) -> std::result::Result<String, ExtractionError>;
}

/// A remote text-generation model.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> std::result::Result<String, QueryError>;
}

pub trait ConfigProvider: Send + Sync {
    fn api_key(&self) -> &str;
    fn model(&self) -> &str;
    fn api_base_url(&self) -> &str;
    fn request_timeout_seconds(&self) -> Option<u64>;
    fn max_upload_bytes(&self) -> u64;
}

/// Where uploaded documents come from.
pub trait DocumentSource: Send + Sync {
    fn read_document(
        &self,
        path: &str,
    ) -> impl std::future::Future<Output = Result<SourceDocument>> + Send;
}
