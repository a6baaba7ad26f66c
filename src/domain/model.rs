use crate::utils::error::QueryError;
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::Path;

pub const PREVIEW_CHAR_LIMIT: usize = 2000;
const PREVIEW_TRUNCATION_MARKER: &str = "\n[...Truncated for display...]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    PlainText,
    Markdown,
    Pdf,
    Docx,
}

impl DocumentFormat {
    pub const ALL: [DocumentFormat; 4] = [
        DocumentFormat::PlainText,
        DocumentFormat::Markdown,
        DocumentFormat::Pdf,
        DocumentFormat::Docx,
    ];

    /// `extension` is the lowercased extension including the leading dot.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            ".txt" => Some(Self::PlainText),
            ".md" => Some(Self::Markdown),
            ".pdf" => Some(Self::Pdf),
            ".docx" => Some(Self::Docx),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::PlainText => ".txt",
            Self::Markdown => ".md",
            Self::Pdf => ".pdf",
            Self::Docx => ".docx",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PlainText => "TXT",
            Self::Markdown => "Markdown",
            Self::Pdf => "PDF",
            Self::Docx => "DOCX",
        };
        f.write_str(name)
    }
}

/// Lowercased extension of `file_name` with its leading dot, or "" when there is none.
pub fn declared_extension(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
        .unwrap_or_default()
}

/// An uploaded file. Held in memory only.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub file_name: String,
    pub raw_bytes: Vec<u8>,
}

impl SourceDocument {
    pub fn new(file_name: impl Into<String>, raw_bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            raw_bytes,
        }
    }

    pub fn declared_extension(&self) -> String {
        declared_extension(&self.file_name)
    }
}

/// Extracted text of exactly one document. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroundingContext {
    source_name: String,
    text: String,
}

impl GroundingContext {
    /// Returns `None` when `text` is empty, so a query can never be grounded on nothing.
    pub fn new(source_name: impl Into<String>, text: String) -> Option<Self> {
        if text.is_empty() {
            return None;
        }
        Some(Self {
            source_name: source_name.into(),
            text,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// First `limit` characters, with a truncation marker appended when cut.
    pub fn preview(&self, limit: usize) -> String {
        match self.text.char_indices().nth(limit) {
            Some((cut, _)) => format!("{}{}", &self.text[..cut], PREVIEW_TRUNCATION_MARKER),
            None => self.text.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub question: String,
    pub grounding_context: String,
}

impl QueryRequest {
    pub fn new(question: &str, grounding_context: &str) -> Result<Self, QueryError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(QueryError::EmptyQuestion);
        }
        Ok(Self {
            question: question.to_string(),
            grounding_context: grounding_context.to_string(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct QueryResponse {
    pub question: String,
    pub outcome: Result<String, QueryError>,
    pub answered_at: DateTime<Utc>,
}

impl QueryResponse {
    pub fn new(question: impl Into<String>, outcome: Result<String, QueryError>) -> Self {
        Self {
            question: question.into(),
            outcome,
            answered_at: Utc::now(),
        }
    }

    pub fn answer(&self) -> Option<&str> {
        self.outcome.as_deref().ok()
    }

    pub fn failure(&self) -> Option<&QueryError> {
        self.outcome.as_ref().err()
    }

    pub fn state(&self) -> QueryState {
        QueryState::terminal_for(&self.outcome)
    }
}

/// Lifecycle of a single query: `Idle -> Validating -> (Rejected | Sending) -> (Succeeded | Failed)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    Idle,
    Validating,
    Rejected,
    Sending,
    Succeeded,
    Failed,
}

impl QueryState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Succeeded | Self::Failed)
    }

    pub fn can_transition_to(&self, next: QueryState) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Validating)
                | (Self::Validating, Self::Rejected)
                | (Self::Validating, Self::Sending)
                | (Self::Sending, Self::Succeeded)
                | (Self::Sending, Self::Failed)
        )
    }

    pub fn terminal_for(outcome: &Result<String, QueryError>) -> Self {
        match outcome {
            Ok(_) => Self::Succeeded,
            Err(e) if e.is_rejection() => Self::Rejected,
            Err(_) => Self::Failed,
        }
    }
}

/// One ordered text part of the content payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentSegment {
    pub text: String,
}

/// Grounding context first, question second. The two are never merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentPayload {
    pub segments: Vec<ContentSegment>,
}

impl ContentPayload {
    pub fn grounded(context: &str, question: &str) -> Self {
        Self {
            segments: vec![
                ContentSegment {
                    text: context.to_string(),
                },
                ContentSegment {
                    text: question.to_string(),
                },
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub model: String,
    pub system_instruction: String,
    pub contents: ContentPayload,
}
