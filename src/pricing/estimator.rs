//! Score-weighted fair price estimation

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::PricingError;
use crate::search::rerank::Comparable;

/// Relative half-width of the confidence band around the fair price
pub const BAND_TOLERANCE: f64 = 0.05;

/// Score sums at or below this fraction of the summed magnitudes count as
/// cancelled out
const WEIGHT_CANCELLATION_RATIO: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Underpriced,
    Fair,
    Overpriced,
    Unknown,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Underpriced => "UNDERPRICED",
            Self::Fair => "FAIR",
            Self::Overpriced => "OVERPRICED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    /// Closed interval: both bounds count as FAIR
    pub fn classify(&self, target_price: Option<f64>) -> Verdict {
        match target_price {
            None => Verdict::Unknown,
            Some(p) if p < self.lower => Verdict::Underpriced,
            Some(p) if p > self.upper => Verdict::Overpriced,
            Some(_) => Verdict::Fair,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Estimation {
    pub fair_price: f64,
    pub fair_ppsqm: f64,
    pub confidence_interval: ConfidenceInterval,
    pub verdict: Verdict,
    pub target_sqm: f64,
}

/// Reject a listed price below zero or a non-positive area
pub fn validate_targets(
    target_price: Option<f64>,
    target_sqm: Option<f64>,
) -> Result<(), PricingError> {
    if let Some(p) = target_price {
        if !(p.is_finite() && p >= 0.0) {
            return Err(PricingError::InvalidTarget {
                field: "target price",
                requirement: "a non-negative number",
                value: p,
            });
        }
    }
    if let Some(s) = target_sqm {
        if !(s.is_finite() && s > 0.0) {
            return Err(PricingError::InvalidTarget {
                field: "target area",
                requirement: "positive",
                value: s,
            });
        }
    }
    Ok(())
}

/// Estimate a fair price from ranked comparables.
///
/// `fair_ppsqm` is the average of comparable price-per-sqm weighted by
/// `final_score`. Without `target_sqm` the mean comparable area is used.
/// A score sum that is not clearly positive (cancelled out or negative) is
/// [`PricingError::DegenerateWeights`].
/// Outputs are rounded to cents; the verdict is taken against the rounded
/// band so the reported bounds and verdict always agree.
pub fn estimate(
    comparables: &[Comparable],
    target_price: Option<f64>,
    target_sqm: Option<f64>,
) -> Result<Estimation, PricingError> {
    validate_targets(target_price, target_sqm)?;
    if comparables.is_empty() {
        return Err(PricingError::NoComparables);
    }

    let target_sqm = target_sqm.unwrap_or_else(|| {
        comparables.iter().map(|c| c.size_sqm).sum::<f64>() / comparables.len() as f64
    });

    let weight_sum: f64 = comparables.iter().map(|c| c.final_score).sum();
    let magnitude: f64 = comparables.iter().map(|c| c.final_score.abs()).sum();
    if !(weight_sum > WEIGHT_CANCELLATION_RATIO * magnitude) {
        return Err(PricingError::DegenerateWeights { sum: weight_sum });
    }

    let fair_ppsqm = comparables
        .iter()
        .map(|c| c.price_per_sqm * c.final_score)
        .sum::<f64>()
        / weight_sum;
    let fair_price = fair_ppsqm * target_sqm;
    if !fair_price.is_finite() {
        return Err(PricingError::DegenerateWeights { sum: weight_sum });
    }

    let confidence_interval = ConfidenceInterval {
        lower: round2(fair_price * (1.0 - BAND_TOLERANCE)),
        upper: round2(fair_price * (1.0 + BAND_TOLERANCE)),
    };

    Ok(Estimation {
        fair_price: round2(fair_price),
        fair_ppsqm: round2(fair_ppsqm),
        verdict: confidence_interval.classify(target_price),
        confidence_interval,
        target_sqm: round2(target_sqm),
    })
}

/// Round to two decimals (EUR cents)
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::property::PropertyType;

    fn comp(id: i64, ppsqm: f64, score: f64, size: f64) -> Comparable {
        Comparable {
            id,
            similarity: score,
            final_score: score,
            property_type: PropertyType::Apartment,
            neighborhood: "Titan".to_string(),
            city: "Bucharest".to_string(),
            price_eur: ppsqm * size,
            size_sqm: size,
            price_per_sqm: ppsqm,
        }
    }

    #[test]
    fn test_weighted_average() {
        let comps = vec![
            comp(1, 1000.0, 0.9, 50.0),
            comp(2, 1100.0, 0.5, 55.0),
            comp(3, 1050.0, 0.3, 60.0),
        ];
        let est = estimate(&comps, Some(60000.0), Some(54.0)).unwrap();

        let expected = (1000.0 * 0.9 + 1100.0 * 0.5 + 1050.0 * 0.3) / (0.9 + 0.5 + 0.3);
        assert_eq!(est.fair_ppsqm, round2(expected));
        assert_eq!(est.fair_ppsqm, 1038.24);
        assert_eq!(est.fair_price, 56064.71);
        assert_eq!(est.confidence_interval.lower, 53261.47);
        assert_eq!(est.confidence_interval.upper, 58867.94);
        assert_eq!(est.verdict, Verdict::Overpriced);
        assert_eq!(est.target_sqm, 54.0);
    }

    #[test]
    fn test_band_width() {
        for (ppsqm, size) in [(1234.5, 47.0), (980.0, 101.0), (2750.25, 63.5)] {
            let est = estimate(&[comp(1, ppsqm, 0.7, size)], None, None).unwrap();
            let ci = est.confidence_interval;
            assert!(((ci.upper - ci.lower) - 0.10 * est.fair_price).abs() <= 0.02);
            assert!(ci.lower < est.fair_price && est.fair_price < ci.upper);
        }
    }

    #[test]
    fn test_verdict_boundaries() {
        // 1000 EUR/sqm * 100 sqm = 100000
        let comps = [comp(1, 1000.0, 1.0, 100.0)];
        let verdict = |p: f64| estimate(&comps, Some(p), Some(100.0)).unwrap().verdict;

        assert_eq!(verdict(105000.0), Verdict::Fair);
        assert_eq!(verdict(105000.01), Verdict::Overpriced);
        assert_eq!(verdict(95000.0), Verdict::Fair);
        assert_eq!(verdict(94999.99), Verdict::Underpriced);
        assert_eq!(verdict(100000.0), Verdict::Fair);

        let est = estimate(&comps, None, Some(100.0)).unwrap();
        assert_eq!(est.fair_price, 100000.0);
        assert_eq!(est.verdict, Verdict::Unknown);
    }

    #[test]
    fn test_default_target_area_is_mean() {
        let comps = vec![comp(1, 1000.0, 1.0, 40.0), comp(2, 1000.0, 1.0, 60.0)];
        let est = estimate(&comps, None, None).unwrap();
        assert_eq!(est.target_sqm, 50.0);
        assert_eq!(est.fair_price, 50000.0);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(estimate(&[], Some(1.0), None), Err(PricingError::NoComparables));

        let zero = vec![comp(1, 1000.0, 0.0, 50.0), comp(2, 1200.0, 0.0, 50.0)];
        assert!(matches!(
            estimate(&zero, None, None),
            Err(PricingError::DegenerateWeights { .. })
        ));

        let cancelling = vec![comp(1, 1000.0, 0.5, 50.0), comp(2, 1200.0, -0.5, 50.0)];
        assert!(matches!(
            estimate(&cancelling, Some(50000.0), Some(50.0)),
            Err(PricingError::DegenerateWeights { .. })
        ));
    }

    #[test]
    fn test_near_cancelling_scores_are_degenerate() {
        // 0.1 + 0.2 - 0.3 is ~5.5e-17 in f64, not 0
        let comps = vec![
            comp(1, 1000.0, 0.1, 50.0),
            comp(2, 1100.0, 0.2, 50.0),
            comp(3, 1200.0, -0.3, 50.0),
        ];
        assert!(matches!(
            estimate(&comps, Some(60000.0), Some(54.0)),
            Err(PricingError::DegenerateWeights { .. })
        ));
    }

    #[test]
    fn test_negative_score_sum_is_degenerate() {
        let comps = vec![comp(1, 1000.0, -0.4, 50.0), comp(2, 1100.0, 0.1, 50.0)];
        assert!(matches!(
            estimate(&comps, Some(60000.0), Some(54.0)),
            Err(PricingError::DegenerateWeights { .. })
        ));

        // A negative score is fine while the sum stays positive
        let mixed = vec![comp(1, 1000.0, 1.0, 50.0), comp(2, 2000.0, -0.1, 50.0)];
        let est = estimate(&mixed, None, Some(10.0)).unwrap();
        assert!(est.fair_price > 0.0);
        assert!(est.confidence_interval.lower < est.confidence_interval.upper);
    }

    #[test]
    fn test_invalid_targets_are_rejected() {
        let comps = [comp(1, 1000.0, 1.0, 100.0)];
        for sqm in [0.0, -5.0, f64::NAN] {
            assert!(matches!(
                estimate(&comps, Some(0.0), Some(sqm)),
                Err(PricingError::InvalidTarget { field: "target area", .. })
            ));
        }
        assert!(matches!(
            estimate(&comps, Some(-1.0), Some(100.0)),
            Err(PricingError::InvalidTarget { field: "target price", .. })
        ));
        assert_eq!(estimate(&comps, Some(0.0), Some(100.0)).unwrap().verdict, Verdict::Underpriced);
    }

    #[test]
    fn test_serialized_shape() {
        let est = estimate(&[comp(1, 1000.0, 1.0, 100.0)], Some(120000.0), None).unwrap();
        let json = serde_json::to_value(&est).unwrap();
        assert_eq!(json["verdict"], "OVERPRICED");
        assert_eq!(json["confidence_interval"]["lower"], 95000.0);
        assert_eq!(json["confidence_interval"]["upper"], 105000.0);
    }
}
