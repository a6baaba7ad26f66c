use crate::domain::model::DocumentFormat;
use thiserror::Error;

/// Failures while turning uploaded bytes into plain text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Cannot read {0}: no parser is available for this format")]
    ParserUnavailable(DocumentFormat),

    #[error("Malformed {format} document: {message}")]
    MalformedDocument {
        format: DocumentFormat,
        message: String,
    },

    #[error("Could not decode file as UTF-8: {message}")]
    DecodeError { message: String },
}

impl ExtractionError {
    pub fn malformed(format: DocumentFormat, message: impl Into<String>) -> Self {
        Self::MalformedDocument {
            format,
            message: message.into(),
        }
    }
}

/// Failures while answering a question against a grounding context.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Please enter a question")]
    EmptyQuestion,

    #[error("No document is loaded; upload a supported file first")]
    NoDocumentLoaded,

    #[error("A query is already in progress")]
    Busy,

    #[error("A Gemini API error occurred. Details: {message}")]
    RemoteApi {
        status: Option<u16>,
        message: String,
    },

    #[error("An unexpected error occurred. Details: {0}")]
    Unexpected(String),
}

impl QueryError {
    pub fn remote(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::RemoteApi {
            status,
            message: message.into(),
        }
    }

    /// True for errors raised before any remote call was attempted.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::EmptyQuestion | Self::NoDocumentLoaded | Self::Busy)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} environment variable is required")]
    MissingApiKey { var: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration parse error: {message}")]
    Parse { message: String },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Error reading file content: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Error during live API call: {0}")]
    Query(#[from] QueryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File too large: {size} bytes (limit {limit} bytes)")]
    FileTooLarge { size: u64, limit: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Validation,
    Remote,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AppError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::Config(_) => ErrorCategory::Configuration,
            AppError::Extraction(_) | AppError::FileTooLarge { .. } => ErrorCategory::Input,
            AppError::Query(e) if e.is_rejection() => ErrorCategory::Validation,
            AppError::Query(_) => ErrorCategory::Remote,
            AppError::Io(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AppError::Query(QueryError::EmptyQuestion) => ErrorSeverity::Low,
            AppError::Query(QueryError::RemoteApi { .. }) => ErrorSeverity::Medium,
            AppError::Query(_) | AppError::Extraction(_) | AppError::FileTooLarge { .. } => {
                ErrorSeverity::High
            }
            AppError::Config(_) | AppError::Io(_) => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            AppError::Config(ConfigError::MissingApiKey { var }) => {
                format!("API key not configured: set {}", var)
            }
            AppError::Config(e) => format!("Invalid configuration: {}", e),
            AppError::Extraction(e) => format!("Error reading file content: {}", e),
            AppError::Query(e) if e.is_rejection() => e.to_string(),
            AppError::Query(e) => format!("Error during live API call: {}", e),
            AppError::Io(e) => format!("Could not read file: {}", e),
            AppError::FileTooLarge { size, limit } => {
                format!("File is too large ({} bytes, limit is {} bytes)", size, limit)
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            AppError::Config(ConfigError::MissingApiKey { .. }) => {
                "Export GOOGLE_API_KEY or add it to a .env file"
            }
            AppError::Config(_) => "Check the configuration file and command line flags",
            AppError::Extraction(ExtractionError::UnsupportedFileType(_)) => {
                "Upload a .txt, .md, .pdf or .docx file"
            }
            AppError::Extraction(ExtractionError::ParserUnavailable(_)) => {
                "Rebuild with the 'pdf' and 'docx' features enabled"
            }
            AppError::Extraction(_) => "Re-upload the file or try a different copy",
            AppError::Query(QueryError::EmptyQuestion) => "Type a question and try again",
            AppError::Query(QueryError::NoDocumentLoaded) => "Upload a document first",
            AppError::Query(QueryError::Busy) => "Wait for the current answer to finish",
            AppError::Query(_) => "Check network access and the API key, then ask again",
            AppError::Io(_) => "Check that the file exists and is readable",
            AppError::FileTooLarge { .. } => "Upload a smaller document",
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
