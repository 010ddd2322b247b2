//! Fair price estimation over ranked comparables

pub mod estimator;
pub mod explain;
pub mod report;

pub use estimator::{estimate, ConfidenceInterval, Estimation, Verdict};
pub use explain::{Explanation, ExplanationGenerator, ListingContext, TemplateExplainer};
pub use report::{FinalReport, PricingReport};
