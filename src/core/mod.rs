pub mod extractor;
pub mod parsers;
pub mod query;

pub use crate::domain::model::{GroundingContext, QueryResponse, SourceDocument};
pub use crate::domain::ports::{ConfigProvider, DocumentParser, GenerationBackend};
pub use extractor::DocumentExtractor;
pub use query::GroundedQueryClient;
