//! Loading listings into the property store

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

use super::embedding::Embedder;
use super::vectordb::PropertyStore;
use crate::core::property::Property;
use crate::core::schema::ListingViolation;

#[derive(Debug, Default)]
pub struct IndexingStats {
    pub indexed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub duration_ms: u128,
}

/// Read a JSON array of listings
pub fn load_listings(path: &Path) -> Result<Vec<Property>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read listings from {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid listings file {}", path.display()))
}

/// Embed and upsert every valid listing.
///
/// Listings with violations and repeated ids (first occurrence wins) are
/// skipped; storage or embedding errors count as failures.
pub fn index_properties(
    store: &PropertyStore,
    embedder: &dyn Embedder,
    properties: &[Property],
) -> Result<IndexingStats> {
    let start = std::time::Instant::now();
    let mut stats = IndexingStats::default();
    let mut seen = HashSet::new();

    for property in properties {
        let mut violations = property.validate();
        if !seen.insert(property.id) {
            violations.push(ListingViolation::DuplicateId(property.id));
        }
        if !violations.is_empty() {
            for v in &violations {
                debug!(id = property.id, "skipping listing: {}", v);
            }
            stats.skipped += 1;
            continue;
        }

        let result = embedder
            .embed(&property.index_text())
            .and_then(|embedding| store.upsert_property(property, &embedding));
        match result {
            Ok(()) => stats.indexed += 1,
            Err(e) => {
                warn!(id = property.id, error = %e, "failed to index listing");
                stats.failed += 1;
            }
        }
    }

    stats.duration_ms = start.elapsed().as_millis();
    store.set_meta("indexed_count", &stats.indexed.to_string())?;
    store.set_meta("last_full_index", &chrono::Utc::now().timestamp().to_string())?;

    Ok(stats)
}
