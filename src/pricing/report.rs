//! JSON artifacts: comparables snapshot, pricing report, final export

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::estimator::{Estimation, Verdict};
use crate::search::rerank::Comparable;

/// Output of re-evaluating a comparables snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingReport {
    pub estimation: Estimation,
    pub comparables_used: Vec<Comparable>,
}

/// Export record for one evaluated listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalReport {
    pub decision_target_id: String,
    pub title: String,
    pub listed_price_eur: Option<f64>,
    pub fair_price_eur: f64,
    pub fair_range_eur: [f64; 2],
    pub label: Verdict,
    pub comparables_used: Vec<Comparable>,
}

impl FinalReport {
    pub fn new(
        title: &str,
        listed_price_eur: Option<f64>,
        estimation: &Estimation,
        comparables: &[Comparable],
    ) -> Self {
        Self {
            decision_target_id: format!("auto_{}", chrono::Utc::now().timestamp()),
            title: title.to_string(),
            listed_price_eur,
            fair_price_eur: estimation.fair_price,
            fair_range_eur: [
                estimation.confidence_interval.lower,
                estimation.confidence_interval.upper,
            ],
            label: estimation.verdict,
            comparables_used: comparables.to_vec(),
        }
    }
}

/// Pretty-printed JSON, creating parent directories as needed
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

/// Read a comparables snapshot written by the pipeline
pub fn load_comparables(path: &Path) -> Result<Vec<Comparable>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read comparables from {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid comparables snapshot {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::property::PropertyType;
    use crate::pricing::estimator::estimate;

    fn comp(id: i64) -> Comparable {
        Comparable {
            id,
            similarity: 0.81,
            final_score: 1.01,
            property_type: PropertyType::Apartment,
            neighborhood: "Titan".to_string(),
            city: "Bucharest".to_string(),
            price_eur: 58000.0,
            size_sqm: 50.0,
            price_per_sqm: 1160.0,
        }
    }

    #[test]
    fn test_snapshot_reload() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested/comparables.json");
        let comps = vec![comp(4), comp(8)];

        write_json(&path, &comps)?;
        assert_eq!(load_comparables(&path)?, comps);
        Ok(())
    }

    #[test]
    fn test_load_missing_snapshot_fails() {
        assert!(load_comparables(Path::new("/nonexistent/comparables.json")).is_err());
    }

    #[test]
    fn test_final_report_shape() {
        let comps = vec![comp(4)];
        let est = estimate(&comps, Some(60000.0), Some(54.0)).unwrap();
        let report = FinalReport::new("2 rooms Titan", Some(60000.0), &est, &comps);

        assert!(report.decision_target_id.starts_with("auto_"));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["label"], est.verdict.as_str());
        assert_eq!(json["fair_range_eur"][0], est.confidence_interval.lower);
        assert_eq!(json["comparables_used"][0]["id"], 4);
    }
}
