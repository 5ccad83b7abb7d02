//! LocScout vector search core
//!
//! Exact cosine ranking over precomputed street-level image embeddings,
//! followed by coordinate validation of the ranked rows.

mod assemble;
pub mod geo;
mod loader;
pub mod npy;
mod service;
mod similarity;
mod store;

pub use assemble::{
    assemble, assemble_one, assemble_report, AssemblyReport, Coordinates, LocationResult,
    SkipReason,
};
pub use loader::{load_corpus, load_metadata};
pub use service::{
    SearchRequest, SearchService, COMBINED_CATEGORY, COMBINED_WEIGHTS, DEFAULT_CATEGORY,
    DEFAULT_THRESHOLD, DEFAULT_TOP_K,
};
pub use similarity::{check_limits, cosine_similarity, rank, rank_weighted, ScoredCandidate};
pub use store::{EmbeddingMatrix, RecordMetadata, StoreStats, VectorStore};
