//! Semantic retrieval and reranking of comparable listings

pub mod embedding;
pub mod indexer;
pub mod rerank;
pub mod retriever;
pub mod vectordb;

pub use embedding::{Embedder, HarmonicEmbedder};
pub use rerank::{Comparable, Reranker, ScoringWeights};
pub use retriever::{Candidate, NearestNeighborIndex, Retrieval, VectorRetriever};
pub use vectordb::PropertyStore;
