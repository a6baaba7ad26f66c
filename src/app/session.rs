use crate::core::extractor::DocumentExtractor;
use crate::core::query::GroundedQueryClient;
use crate::domain::model::{GroundingContext, QueryResponse, QueryState, SourceDocument};
use crate::domain::ports::GenerationBackend;
use crate::utils::error::{ExtractionError, QueryError};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub file_name: String,
    pub char_count: usize,
}

impl LoadReport {
    pub fn is_empty(&self) -> bool {
        self.char_count == 0
    }
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "File '{}' loaded successfully ({} characters)",
            self.file_name, self.char_count
        )
    }
}

/// 單一使用者的互動狀態：目前的文件與最後一次回答
///
/// 兩者都整體替換。同時只允許一個查詢，進行中再呼叫 `ask` 會得到
/// `QueryError::Busy`。被拒絕的查詢（忙碌、空白問題、未載入文件）不會覆蓋最後的回答。
pub struct Session<B: GenerationBackend> {
    extractor: DocumentExtractor,
    client: GroundedQueryClient<B>,
    context: Mutex<Option<GroundingContext>>,
    last_response: Mutex<Option<QueryResponse>>,
    in_flight: AtomicBool,
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<B: GenerationBackend> Session<B> {
    pub fn new(extractor: DocumentExtractor, client: GroundedQueryClient<B>) -> Self {
        Self {
            extractor,
            client,
            context: Mutex::new(None),
            last_response: Mutex::new(None),
            in_flight: AtomicBool::new(false),
        }
    }

    /// 解析 `document` 並設為查詢依據
    ///
    /// 解析失敗或文件沒有文字時，會清除先前的內容。
    pub async fn load_document(
        &self,
        document: &SourceDocument,
    ) -> Result<LoadReport, ExtractionError> {
        let extracted = self.extractor.extract(&document.file_name, &document.raw_bytes);

        let mut slot = self.context.lock().await;
        match extracted {
            Ok(text) => {
                let context = GroundingContext::new(document.file_name.clone(), text);
                let char_count = context.as_ref().map_or(0, GroundingContext::char_count);
                if context.is_none() {
                    tracing::warn!("{} contains no extractable text", document.file_name);
                }
                *slot = context;
                Ok(LoadReport {
                    file_name: document.file_name.clone(),
                    char_count,
                })
            }
            Err(e) => {
                tracing::warn!("Failed to load {}: {}", document.file_name, e);
                *slot = None;
                Err(e)
            }
        }
    }

    pub async fn context(&self) -> Option<GroundingContext> {
        self.context.lock().await.clone()
    }

    pub async fn has_document(&self) -> bool {
        self.context.lock().await.is_some()
    }

    pub async fn last_response(&self) -> Option<QueryResponse> {
        self.last_response.lock().await.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn ask(&self, question: &str) -> QueryResponse {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!("Rejected query while another is in flight");
            return QueryResponse::new(question.trim(), Err(QueryError::Busy));
        }
        let _guard = InFlightGuard(&self.in_flight);

        let context = self.context().await;
        let outcome = match context {
            Some(context) => {
                tracing::info!(
                    "Generating grounded answer for: '{}...'",
                    question.trim().chars().take(50).collect::<String>()
                );
                self.client.answer(question, context.text()).await
            }
            None => Err(QueryError::NoDocumentLoaded),
        };

        let response = QueryResponse::new(question.trim(), outcome);
        if response.state() != QueryState::Rejected {
            *self.last_response.lock().await = Some(response.clone());
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::GenerationRequest;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use tokio::sync::Notify;

    #[derive(Clone, Default)]
    struct CountingBackend {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl GenerationBackend for CountingBackend {
        async fn generate(&self, request: &GenerationRequest) -> Result<String, QueryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("answer to {}", request.contents.segments[1].text))
        }
    }

    #[derive(Clone, Default)]
    struct GatedBackend {
        started: Arc<Notify>,
        release: Arc<Notify>,
    }

    #[async_trait]
    impl GenerationBackend for GatedBackend {
        async fn generate(&self, _request: &GenerationRequest) -> Result<String, QueryError> {
            self.started.notify_one();
            self.release.notified().await;
            Ok("first".to_string())
        }
    }

    fn session<B: GenerationBackend>(backend: B) -> Session<B> {
        Session::new(
            DocumentExtractor::with_default_parsers(),
            GroundedQueryClient::new(backend),
        )
    }

    #[tokio::test]
    async fn test_ask_without_document_is_rejected_before_client() {
        let backend = CountingBackend::default();
        let session = session(backend.clone());

        let response = session.ask("Anything?").await;

        assert_eq!(response.failure(), Some(&QueryError::NoDocumentLoaded));
        assert_eq!(response.state(), QueryState::Rejected);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_load_then_ask() {
        let backend = CountingBackend::default();
        let session = session(backend.clone());

        let report = session
            .load_document(&SourceDocument::new("facts.txt", b"Water boils at 100C.".to_vec()))
            .await
            .unwrap();
        assert_eq!(report.char_count, 20);

        let response = session.ask("  At what temperature?  ").await;
        assert_eq!(response.question, "At what temperature?");
        assert_eq!(response.answer(), Some("answer to At what temperature?"));
        assert_eq!(
            session.last_response().await.unwrap().answer(),
            Some("answer to At what temperature?")
        );
    }

    #[tokio::test]
    async fn test_failed_upload_clears_previous_context() {
        let session = session(CountingBackend::default());
        session
            .load_document(&SourceDocument::new("a.txt", b"first".to_vec()))
            .await
            .unwrap();
        assert!(session.has_document().await);

        let err = session
            .load_document(&SourceDocument::new("b.csv", b"x,y".to_vec()))
            .await
            .unwrap_err();

        assert_eq!(err, ExtractionError::UnsupportedFileType(".csv".to_string()));
        assert!(!session.has_document().await);
    }

    #[tokio::test]
    async fn test_empty_document_leaves_no_context() {
        let backend = CountingBackend::default();
        let session = session(backend.clone());

        let report = session
            .load_document(&SourceDocument::new("blank.md", Vec::new()))
            .await
            .unwrap();

        assert!(report.is_empty());
        assert_eq!(
            report.to_string(),
            "File 'blank.md' loaded successfully (0 characters)"
        );
        let response = session.ask("What?").await;
        assert_eq!(response.failure(), Some(&QueryError::NoDocumentLoaded));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_rejected_ask_keeps_previous_answer() {
        let backend = CountingBackend::default();
        let session = session(backend.clone());
        session
            .load_document(&SourceDocument::new("doc.txt", b"text".to_vec()))
            .await
            .unwrap();

        session.ask("first?").await;
        let blank = session.ask("   ").await;

        assert_eq!(blank.failure(), Some(&QueryError::EmptyQuestion));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            session.last_response().await.unwrap().answer(),
            Some("answer to first?")
        );
    }

    #[tokio::test]
    async fn test_concurrent_ask_is_rejected_as_busy() {
        let backend = GatedBackend::default();
        let session = session(backend.clone());
        session
            .load_document(&SourceDocument::new("doc.txt", b"text".to_vec()))
            .await
            .unwrap();

        let (first, second) = tokio::join!(session.ask("one"), async {
            backend.started.notified().await;
            assert!(session.is_busy());
            let second = session.ask("two").await;
            backend.release.notify_one();
            second
        });

        assert_eq!(second.failure(), Some(&QueryError::Busy));
        assert_eq!(first.answer(), Some("first"));
        assert_eq!(session.last_response().await.unwrap().question, "one");
        assert!(!session.is_busy());
    }
}
