//! Reranker for retrieved candidates
//!
//! Recomputes cosine similarity from the candidate embeddings and adjusts it
//! with the query filters. The result is a deterministic total order.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::embedding::cosine_similarity;
use super::retriever::Candidate;
use crate::core::catalog::PropertyCatalog;
use crate::core::filters::Filters;
use crate::core::property::{Property, PropertyType};
use crate::error::{PipelineError, Result};

/// Scored comparable, ready for pricing and serialization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparable {
    pub id: i64,
    pub similarity: f64,
    pub final_score: f64,
    pub property_type: PropertyType,
    pub neighborhood: String,
    pub city: String,
    pub price_eur: f64,
    pub size_sqm: f64,
    pub price_per_sqm: f64,
}

impl Comparable {
    pub fn from_property(property: &Property, similarity: f64, final_score: f64) -> Self {
        Self {
            id: property.id,
            similarity,
            final_score,
            property_type: property.property_type,
            neighborhood: property.neighborhood.clone(),
            city: property.city.clone(),
            price_eur: property.price_eur,
            size_sqm: property.size_sqm,
            price_per_sqm: property.price_per_sqm(),
        }
    }
}

/// Filter adjustments added to the similarity score
#[derive(Debug, Clone)]
pub struct ScoringWeights {
    pub neighborhood_match_bonus: f64,
    pub neighborhood_mismatch_penalty: f64,
    /// Price-per-sqm deviation (EUR) worth one point of penalty
    pub ppsqm_deviation_scale: f64,
    pub ppsqm_penalty_cap: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            neighborhood_match_bonus: 0.20,
            neighborhood_mismatch_penalty: 0.10,
            ppsqm_deviation_scale: 5000.0,
            ppsqm_penalty_cap: 0.15,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Reranker {
    weights: ScoringWeights,
}

impl Reranker {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Score every candidate, sort by final score (desc, ties by id asc) and
    /// keep the first `k`.
    ///
    /// A candidate missing from the catalog aborts the whole call with
    /// [`PipelineError::CatalogIntegrity`].
    pub fn rerank(
        &self,
        candidates: &[Candidate],
        query_embedding: &[f32],
        filters: &Filters,
        catalog: &dyn PropertyCatalog,
        k: usize,
    ) -> Result<Vec<Comparable>> {
        let mut ranked = candidates
            .iter()
            .map(|candidate| {
                let property = catalog
                    .lookup(candidate.id)
                    .ok_or(PipelineError::CatalogIntegrity { id: candidate.id })?;
                let similarity = cosine_similarity(query_embedding, &candidate.embedding);
                let final_score = self.score(property, similarity, filters);
                Ok(Comparable::from_property(property, similarity, final_score))
            })
            .collect::<Result<Vec<_>>>()?;

        ranked.sort_by(|a, b| {
            rank_key(b.final_score)
                .total_cmp(&rank_key(a.final_score))
                .then(a.id.cmp(&b.id))
        });
        ranked.truncate(k);

        debug!(scored = candidates.len(), kept = ranked.len(), "reranked candidates");
        Ok(ranked)
    }

    /// Similarity plus neighborhood and price-per-sqm adjustments (unbounded)
    pub fn score(&self, property: &Property, similarity: f64, filters: &Filters) -> f64 {
        let w = &self.weights;
        let mut score = similarity;

        if let Some(ref wanted) = filters.neighborhood {
            if property.neighborhood.to_lowercase() == wanted.to_lowercase() {
                score += w.neighborhood_match_bonus;
            } else {
                score -= w.neighborhood_mismatch_penalty;
            }
        }

        if let Some(price_max) = filters.price_max {
            if property.size_sqm > 0.0 {
                let ideal_ppsqm = price_max / property.size_sqm;
                let deviation = (property.price_per_sqm() - ideal_ppsqm).abs();
                score -= (deviation / w.ppsqm_deviation_scale).min(w.ppsqm_penalty_cap);
            }
        }

        score
    }
}

/// Sort key for scores; NaN ranks below every real score
pub(crate) fn rank_key(score: f64) -> f64 {
    if score.is_nan() {
        f64::NEG_INFINITY
    } else {
        score
    }
}
