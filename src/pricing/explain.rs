//! Verdict explanations
//!
//! Explanation text is produced by an external collaborator (typically a
//! language model) behind [`ExplanationGenerator`]. Its failures never affect
//! the estimate itself. [`TemplateExplainer`] is the built-in deterministic
//! implementation.

use anyhow::Result;
use serde::Serialize;

use super::estimator::{Estimation, Verdict};
use crate::search::rerank::Comparable;

pub const DISCLAIMER: &str = "Educational project; not real-estate advice.";

/// Listing being evaluated
#[derive(Debug, Clone, Default)]
pub struct ListingContext {
    pub title: Option<String>,
    pub listed_price_eur: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Explanation {
    pub explanation_text: String,
    pub disclaimer: String,
}

pub trait ExplanationGenerator {
    fn generate_explanation(
        &self,
        estimation: &Estimation,
        comparables: &[Comparable],
        listing: &ListingContext,
    ) -> Result<Explanation>;
}

/// Rule-based explanation citing the band and the strongest comparables
#[derive(Debug, Clone)]
pub struct TemplateExplainer {
    max_cited: usize,
}

impl TemplateExplainer {
    pub fn new(max_cited: usize) -> Self {
        Self { max_cited }
    }
}

impl Default for TemplateExplainer {
    fn default() -> Self {
        Self::new(3)
    }
}

impl ExplanationGenerator for TemplateExplainer {
    fn generate_explanation(
        &self,
        estimation: &Estimation,
        comparables: &[Comparable],
        listing: &ListingContext,
    ) -> Result<Explanation> {
        let title = listing.title.as_deref().unwrap_or("The listing");
        let ci = &estimation.confidence_interval;
        let mut sentences = vec![format!(
            "Estimated fair price is {:.0} EUR ({:.0} EUR/sqm over {} sqm), with a fair range of {:.0}–{:.0} EUR.",
            estimation.fair_price, estimation.fair_ppsqm, estimation.target_sqm, ci.lower, ci.upper
        )];

        let listed = listing
            .listed_price_eur
            .map(|p| format!(" at {:.0} EUR", p))
            .unwrap_or_default();
        sentences.push(match estimation.verdict {
            Verdict::Underpriced => {
                format!("{} is listed{}, below the fair range: UNDERPRICED.", title, listed)
            }
            Verdict::Overpriced => {
                format!("{} is listed{}, above the fair range: OVERPRICED.", title, listed)
            }
            Verdict::Fair => format!("{} is listed{}, within the fair range: FAIR.", title, listed),
            Verdict::Unknown => {
                format!("No listed price was given for {}, so no verdict is possible.", title)
            }
        });

        let cited: Vec<String> = comparables
            .iter()
            .take(self.max_cited)
            .map(|c| {
                format!(
                    "#{} in {} at {:.0} EUR/sqm (score {:.2})",
                    c.id, c.neighborhood, c.price_per_sqm, c.final_score
                )
            })
            .collect();
        if !cited.is_empty() {
            sentences.push(format!(
                "The estimate is weighted by {} comparables, led by {}.",
                comparables.len(),
                cited.join(", ")
            ));
        }

        Ok(Explanation {
            explanation_text: sentences.join(" "),
            disclaimer: DISCLAIMER.to_string(),
        })
    }
}
