//! Vector retrieval of the candidate pool

use anyhow::Result;
use tracing::{debug, warn};

use super::embedding::Embedder;

/// Default oversized pool handed to the reranker, independent of k
pub const DEFAULT_POOL_SIZE: usize = 50;

/// Raw nearest-neighbor hit, before scoring
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub id: i64,
    pub embedding: Vec<f32>,
}

/// Approximate nearest-neighbor search over property embeddings.
///
/// Implementations may rank with any internal metric; scores are recomputed
/// downstream from the returned embeddings.
pub trait NearestNeighborIndex: Send {
    fn nearest(&self, query: &[f32], pool_size: usize) -> Result<Vec<Candidate>>;
}

#[derive(Debug, Clone, Default)]
pub struct Retrieval {
    pub query_embedding: Vec<f32>,
    pub candidates: Vec<Candidate>,
}

pub struct VectorRetriever {
    embedder: Box<dyn Embedder>,
    index: Box<dyn NearestNeighborIndex>,
}

impl VectorRetriever {
    pub fn new(embedder: Box<dyn Embedder>, index: Box<dyn NearestNeighborIndex>) -> Self {
        Self { embedder, index }
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    /// Embed the query and fetch `pool_size` neighbors.
    ///
    /// An unavailable embedder or index degrades to an empty pool; retrying
    /// is left to the caller.
    pub fn retrieve(&self, query_text: &str, pool_size: usize) -> Retrieval {
        let query_embedding = match self.embedder.embed(query_text) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "query embedding failed; returning empty candidate pool");
                return Retrieval::default();
            }
        };

        let candidates = match self.index.nearest(&query_embedding, pool_size) {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "vector index unavailable; returning empty candidate pool");
                Vec::new()
            }
        };

        if candidates.is_empty() {
            warn!("vector index returned no candidates");
        } else {
            debug!(count = candidates.len(), pool_size, "retrieved candidate pool");
        }

        Retrieval {
            query_embedding,
            candidates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::embedding::HarmonicEmbedder;
    use anyhow::bail;

    struct FixedIndex(Vec<Candidate>);

    impl NearestNeighborIndex for FixedIndex {
        fn nearest(&self, _query: &[f32], pool_size: usize) -> Result<Vec<Candidate>> {
            Ok(self.0.iter().take(pool_size).cloned().collect())
        }
    }

    struct DownIndex;

    impl NearestNeighborIndex for DownIndex {
        fn nearest(&self, _query: &[f32], _pool_size: usize) -> Result<Vec<Candidate>> {
            bail!("connection refused")
        }
    }

    fn candidate(id: i64) -> Candidate {
        Candidate {
            id,
            embedding: vec![1.0, 0.0],
        }
    }

    #[test]
    fn test_pool_size_is_respected() {
        let index = FixedIndex((1..=80).map(candidate).collect());
        let retriever = VectorRetriever::new(Box::new(HarmonicEmbedder::new()), Box::new(index));

        let retrieval = retriever.retrieve("apartament titan", DEFAULT_POOL_SIZE);
        assert_eq!(retrieval.candidates.len(), DEFAULT_POOL_SIZE);
        assert_eq!(retrieval.query_embedding.len(), retriever.embedder().dimension());
    }

    #[test]
    fn test_unreachable_index_yields_empty_pool() {
        let retriever = VectorRetriever::new(Box::new(HarmonicEmbedder::new()), Box::new(DownIndex));
        let retrieval = retriever.retrieve("apartament titan", DEFAULT_POOL_SIZE);
        assert!(retrieval.candidates.is_empty());
    }

    struct DownEmbedder;

    impl Embedder for DownEmbedder {
        fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            bail!("model not loaded")
        }

        fn dimension(&self) -> usize {
            2
        }
    }

    #[test]
    fn test_failed_embedding_yields_empty_pool() {
        let index = FixedIndex((1..=5).map(candidate).collect());
        let retriever = VectorRetriever::new(Box::new(DownEmbedder), Box::new(index));

        let retrieval = retriever.retrieve("apartament titan", DEFAULT_POOL_SIZE);
        assert!(retrieval.candidates.is_empty());
        assert!(retrieval.query_embedding.is_empty());
    }
}
