pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use adapters::{GeminiBackend, LocalDocumentSource};
pub use app::{LoadReport, Session};
pub use config::{AppConfig, ConfigOverrides};
pub use core::{extractor::DocumentExtractor, query::GroundedQueryClient};
pub use utils::error::{AppError, ConfigError, ExtractionError, QueryError, Result};
