use crate::domain::model::SourceDocument;
use crate::domain::ports::DocumentSource;
use crate::utils::error::{AppError, Result};
use std::path::Path;

/// 從本機檔案系統讀取上傳文件，超過 `max_bytes` 的檔案會被拒絕
#[derive(Debug, Clone)]
pub struct LocalDocumentSource {
    max_bytes: u64,
}

impl LocalDocumentSource {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }
}

impl DocumentSource for LocalDocumentSource {
    async fn read_document(&self, path: &str) -> Result<SourceDocument> {
        let size = tokio::fs::metadata(path).await?.len();
        if size > self.max_bytes {
            return Err(AppError::FileTooLarge {
                size,
                limit: self.max_bytes,
            });
        }

        let raw_bytes = tokio::fs::read(path).await?;
        let file_name = Path::new(path)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(path)
            .to_string();

        tracing::debug!("Read {} bytes from {}", raw_bytes.len(), path);
        Ok(SourceDocument::new(file_name, raw_bytes))
    }
}
