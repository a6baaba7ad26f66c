use crate::domain::model::{ContentPayload, GenerationRequest, QueryRequest, QueryState};
use crate::domain::ports::GenerationBackend;
use crate::utils::error::QueryError;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-lite";

pub const NOT_FOUND_ANSWER: &str = "I cannot find the answer in the provided document.";

pub fn system_instruction() -> String {
    format!(
        "You are an expert Q&A system. Extract or summarize information strictly from the document. \
         DO NOT use external knowledge. If the answer is not present, reply with: '{}'",
        NOT_FOUND_ANSWER
    )
}

/// 要求模型後端僅依據提供的文件內容回答問題
///
/// 呼叫之間不保留狀態，每次都重新送出完整的文件內容。
pub struct GroundedQueryClient<B: GenerationBackend> {
    backend: B,
    model: String,
}

impl<B: GenerationBackend> GroundedQueryClient<B> {
    pub fn new(backend: B) -> Self {
        Self::with_model(backend, DEFAULT_MODEL)
    }

    pub fn with_model(backend: B, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn build_request(&self, request: &QueryRequest) -> GenerationRequest {
        GenerationRequest {
            model: self.model.clone(),
            system_instruction: system_instruction(),
            contents: ContentPayload::grounded(&request.grounding_context, &request.question),
        }
    }

    pub async fn answer(
        &self,
        question: &str,
        grounding_context: &str,
    ) -> Result<String, QueryError> {
        let mut state = QueryState::Idle;
        advance(&mut state, QueryState::Validating);

        let request = match QueryRequest::new(question, grounding_context) {
            Ok(request) => request,
            Err(e) => {
                advance(&mut state, QueryState::Rejected);
                return Err(e);
            }
        };

        advance(&mut state, QueryState::Sending);
        let generation = self.build_request(&request);
        let outcome = self.backend.generate(&generation).await;

        match &outcome {
            Ok(answer) => {
                advance(&mut state, QueryState::Succeeded);
                tracing::info!("Received answer ({} characters)", answer.chars().count());
            }
            Err(e) => {
                advance(&mut state, QueryState::Failed);
                tracing::warn!("Query failed: {}", e);
            }
        }
        outcome
    }
}

fn advance(state: &mut QueryState, next: QueryState) {
    debug_assert!(state.can_transition_to(next), "{:?} -> {:?}", state, next);
    tracing::debug!("Query state {:?} -> {:?}", state, next);
    *state = next;
}
