mod chunker;
mod embedding;
mod generation;
mod ingest;
mod pdf;
mod query;
mod vector_store;

pub use chunker::{DocumentInfo, TextChunker};
pub use embedding::{EmbeddingClient, TextEmbedder};
pub use generation::{AnswerGenerator, GenerationClient};
pub use ingest::IngestPipeline;
pub use pdf::{PageText, PdfDocument, extract as extract_pdf};
pub use query::{DEFAULT_TOP_K, QueryService, RetrieveError};
pub use vector_store::{CollectionInfo, VectorIndex, VectorStoreClient};
