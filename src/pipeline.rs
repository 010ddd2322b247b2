//! Valuation pipeline - filters, retrieval, reranking and pricing
//!
//! Collaborators are injected at construction so tests can swap in fakes.
//! The catalog is shared read-only; everything else is created per query.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::core::catalog::{InMemoryCatalog, PropertyCatalog};
use crate::core::filters::{FilterExtractor, Filters, KeywordFilterExtractor};
use crate::error::{PipelineError, Result};
use crate::pricing::estimator::{estimate, validate_targets, Estimation};
use crate::pricing::report::write_json;
use crate::search::embedding::HarmonicEmbedder;
use crate::search::rerank::{Comparable, Reranker};
use crate::search::retriever::{VectorRetriever, DEFAULT_POOL_SIZE};
use crate::search::vectordb::PropertyStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineInput {
    pub query_text: String,
    pub k: usize,
    #[serde(default)]
    pub target_price_eur: Option<f64>,
    #[serde(default)]
    pub target_sqm: Option<f64>,
}

impl PipelineInput {
    pub fn new(query_text: impl Into<String>, k: usize) -> Self {
        Self {
            query_text: query_text.into(),
            k,
            target_price_eur: None,
            target_sqm: None,
        }
    }

    pub fn with_target_price(mut self, price_eur: Option<f64>) -> Self {
        self.target_price_eur = price_eur;
        self
    }

    pub fn with_target_sqm(mut self, sqm: Option<f64>) -> Self {
        self.target_sqm = sqm;
        self
    }

    fn validate(&self) -> Result<()> {
        validate_targets(self.target_price_eur, self.target_sqm)
            .map_err(|e| PipelineError::InvalidInput(e.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub comparables: Vec<Comparable>,
    pub estimation: Estimation,
}

/// Ranked comparables together with the filters that shaped them
#[derive(Debug, Clone, Serialize)]
pub struct ComparableSearch {
    pub filters: Filters,
    pub comparables: Vec<Comparable>,
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub pool_size: usize,
    pub snapshot_path: Option<PathBuf>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            snapshot_path: None,
        }
    }
}

pub struct Pipeline {
    extractor: Box<dyn FilterExtractor>,
    retriever: VectorRetriever,
    catalog: Arc<dyn PropertyCatalog>,
    reranker: Reranker,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(
        extractor: Box<dyn FilterExtractor>,
        retriever: VectorRetriever,
        catalog: Arc<dyn PropertyCatalog>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            extractor,
            retriever,
            catalog,
            reranker: Reranker::default(),
            options,
        }
    }

    pub fn with_reranker(mut self, reranker: Reranker) -> Self {
        self.reranker = reranker;
        self
    }

    /// Default wiring: SQLite store as index and catalog source, HTP
    /// embeddings, keyword filters with the configured gazetteer.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let store = PropertyStore::open(&config.storage.db_path)?;
        let catalog = InMemoryCatalog::from_properties(
            store
                .load_properties()
                .context("Failed to load property catalog")?,
        );
        info!(properties = catalog.len(), db = %config.storage.db_path.display(), "catalog loaded");

        let retriever = VectorRetriever::new(Box::new(HarmonicEmbedder::new()), Box::new(store));
        let extractor = KeywordFilterExtractor::with_gazetteer(&config.filters.neighborhoods);

        Ok(Self::new(
            Box::new(extractor),
            retriever,
            Arc::new(catalog),
            PipelineOptions {
                pool_size: config.retrieval.pool_size,
                snapshot_path: config.output.snapshot_path.clone(),
            },
        ))
    }

    pub fn catalog(&self) -> &Arc<dyn PropertyCatalog> {
        &self.catalog
    }

    pub fn extract_filters(&self, query_text: &str) -> Filters {
        self.extractor.extract(query_text)
    }

    /// Filters → retrieval → rerank, truncated to `k`.
    ///
    /// Writes the comparables snapshot when one is configured.
    pub fn find_comparables(&self, query_text: &str, k: usize) -> Result<ComparableSearch> {
        let filters = self.extractor.extract(query_text);
        debug!(?filters, "extracted filters");

        let retrieval = self.retriever.retrieve(query_text, self.options.pool_size);
        let comparables = self.reranker.rerank(
            &retrieval.candidates,
            &retrieval.query_embedding,
            &filters,
            self.catalog.as_ref(),
            k,
        )?;
        info!(candidates = retrieval.candidates.len(), kept = comparables.len(), "comparables ranked");

        if let Some(ref path) = self.options.snapshot_path {
            match write_json(path, &comparables) {
                Ok(()) => debug!(path = %path.display(), "saved comparables snapshot"),
                Err(e) => warn!(error = %e, "failed to save comparables snapshot"),
            }
        }

        Ok(ComparableSearch {
            filters,
            comparables,
        })
    }

    pub fn run(&self, input: &PipelineInput) -> Result<PipelineOutput> {
        input.validate()?;
        info!(query = %input.query_text, k = input.k, "running valuation pipeline");

        let search = self.find_comparables(&input.query_text, input.k)?;
        let estimation = estimate(&search.comparables, input.target_price_eur, input.target_sqm)?;
        debug!(fair_price = estimation.fair_price, verdict = %estimation.verdict, "estimated");

        Ok(PipelineOutput {
            comparables: search.comparables,
            estimation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_validation() {
        let ok = PipelineInput::new("apartament titan", 5)
            .with_target_price(Some(0.0))
            .with_target_sqm(Some(54.0));
        assert!(ok.validate().is_ok());

        let bad_price = PipelineInput::new("q", 5).with_target_price(Some(-1.0));
        assert!(matches!(bad_price.validate(), Err(PipelineError::InvalidInput(_))));

        let bad_area = PipelineInput::new("q", 5).with_target_sqm(Some(0.0));
        assert!(matches!(bad_area.validate(), Err(PipelineError::InvalidInput(_))));

        let nan_area = PipelineInput::new("q", 5).with_target_sqm(Some(f64::NAN));
        assert!(nan_area.validate().is_err());
    }

    #[test]
    fn test_input_from_json() {
        let input: PipelineInput =
            serde_json::from_str(r#"{"query_text": "vila pipera", "k": 3}"#).unwrap();
        assert_eq!(input.k, 3);
        assert!(input.target_price_eur.is_none());
    }
}
