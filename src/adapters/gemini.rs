use crate::domain::model::GenerationRequest;
use crate::domain::ports::{ConfigProvider, GenerationBackend};
use crate::utils::error::{ConfigError, QueryError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentBody<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
    status: Option<String>,
}

fn build_body(request: &GenerationRequest) -> GenerateContentBody<'_> {
    GenerateContentBody {
        system_instruction: Content {
            role: None,
            parts: vec![Part {
                text: &request.system_instruction,
            }],
        },
        // 每個片段一筆 content，文件與問題分開送出
        contents: request
            .contents
            .segments
            .iter()
            .map(|segment| Content {
                role: Some("user"),
                parts: vec![Part {
                    text: &segment.text,
                }],
            })
            .collect(),
    }
}

fn response_text(response: GenerateContentResponse) -> Result<String, QueryError> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(QueryError::Unexpected(format!(
            "prompt was blocked by the API ({})",
            reason
        )));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| QueryError::Unexpected("response contained no candidates".to_string()))?;

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<String>()
        })
        .unwrap_or_default();

    if text.is_empty() {
        return Err(QueryError::Unexpected(format!(
            "response contained no text (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        )));
    }
    Ok(text)
}

/// 串接錯誤及其所有來源，格式為 `outer: cause: root`
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.contains(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}

/// `GenerationBackend` for the Gemini `generateContent` REST endpoint.
pub struct GeminiBackend {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiBackend {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| ConfigError::InvalidValue {
            field: "http_client".to_string(),
            value: String::new(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self, ConfigError> {
        Self::new(
            config.api_key(),
            config.api_base_url(),
            config.request_timeout_seconds().map(Duration::from_secs),
        )
    }

    pub fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl GenerationBackend for GeminiBackend {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, QueryError> {
        let url = self.endpoint(&request.model);
        tracing::debug!("Making API request to: {}", url);

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&build_body(request))
            .send()
            .await
            .map_err(|e| QueryError::remote(e.status().map(|s| s.as_u16()), error_chain(&e)))?;

        let status = response.status();
        tracing::debug!("API response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ErrorEnvelope>(&body) {
                Ok(envelope) => match envelope.error.status {
                    Some(code) => {
                        format!("{} {}: {}", status.as_u16(), code, envelope.error.message)
                    }
                    None => format!("{}: {}", status.as_u16(), envelope.error.message),
                },
                Err(_) if body.is_empty() => status.to_string(),
                Err(_) => format!("{}: {}", status, body),
            };
            return Err(QueryError::remote(Some(status.as_u16()), message));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| QueryError::Unexpected(format!("could not decode response: {}", e)))?;

        response_text(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ContentPayload;
    use httpmock::prelude::*;

    fn request() -> GenerationRequest {
        GenerationRequest {
            model: "gemini-2.5-flash-lite".to_string(),
            system_instruction: "Answer from the document only.".to_string(),
            contents: ContentPayload::grounded(
                "The capital of France is Paris.",
                "What is the capital of France?",
            ),
        }
    }

    fn backend(server: &MockServer) -> GeminiBackend {
        GeminiBackend::new("test-key", server.base_url(), Some(Duration::from_secs(5))).unwrap()
    }

    #[test]
    fn test_body_shape() {
        let req = request();
        let body = serde_json::to_value(build_body(&req)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "systemInstruction": {"parts": [{"text": "Answer from the document only."}]},
                "contents": [
                    {"role": "user", "parts": [{"text": "The capital of France is Paris."}]},
                    {"role": "user", "parts": [{"text": "What is the capital of France?"}]}
                ]
            })
        );
    }

    #[test]
    fn test_parts_of_first_candidate_are_concatenated() {
        let response: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [
                {"content": {"role": "model", "parts": [{"text": "Par"}, {"text": "is."}]}, "finishReason": "STOP"},
                {"content": {"role": "model", "parts": [{"text": "ignored"}]}}
            ]
        }))
        .unwrap();
        assert_eq!(response_text(response).unwrap(), "Paris.");
    }

    #[test]
    fn test_empty_candidate_is_unexpected() {
        let response: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{"finishReason": "SAFETY"}]
        }))
        .unwrap();
        let err = response_text(response).unwrap_err();
        assert!(matches!(err, QueryError::Unexpected(ref m) if m.contains("SAFETY")));
    }

    #[test]
    fn test_blocked_prompt_is_unexpected() {
        let response: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "promptFeedback": {"blockReason": "OTHER"}
        }))
        .unwrap();
        assert!(matches!(response_text(response), Err(QueryError::Unexpected(_))));
    }

    #[tokio::test]
    async fn test_generate_success() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1beta/models/gemini-2.5-flash-lite:generateContent")
                .header("x-goog-api-key", "test-key")
                .body_contains("What is the capital of France?");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({
                    "candidates": [{"content": {"role": "model", "parts": [{"text": "Paris."}]}}]
                }));
        });

        let answer = backend(&server).generate(&request()).await;

        api_mock.assert();
        assert_eq!(answer, Ok("Paris.".to_string()));
    }

    #[tokio::test]
    async fn test_api_error_carries_status_and_message() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST);
            then.status(400).json_body(serde_json::json!({
                "error": {"code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT"}
            }));
        });

        let err = backend(&server).generate(&request()).await.unwrap_err();

        api_mock.assert_hits(1);
        match err {
            QueryError::RemoteApi { status, message } => {
                assert_eq!(status, Some(400));
                assert!(message.contains("API key not valid."));
                assert!(message.contains("INVALID_ARGUMENT"));
            }
            other => panic!("expected RemoteApi, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_undecodable_success_body_is_unexpected() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST);
            then.status(200).body("<html>proxy page</html>");
        });

        let err = backend(&server).generate(&request()).await.unwrap_err();
        assert!(matches!(err, QueryError::Unexpected(_)));
    }

    #[test]
    fn test_error_chain_includes_every_source() {
        #[derive(Debug)]
        struct Outer(std::io::Error);

        impl std::fmt::Display for Outer {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "error sending request")
            }
        }

        impl std::error::Error for Outer {
            fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
                Some(&self.0)
            }
        }

        let err = Outer(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        ));
        assert_eq!(error_chain(&err), "error sending request: connection refused");
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let backend = GeminiBackend::new("k", "http://localhost:1234/", None).unwrap();
        assert_eq!(
            backend.endpoint("m"),
            "http://localhost:1234/v1beta/models/m:generateContent"
        );
    }
}
