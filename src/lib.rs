//! rag-imobiliar library
//!
//! Fair price estimation for real-estate listings from semantically
//! retrieved comparables.
//!
//! # Modules
//!
//! - `core`: Property model, read-only catalog, query filter extraction
//! - `search`: Embeddings, SQLite property store, retrieval and reranking
//! - `pricing`: Weighted estimator, reports, verdict explanations
//! - `pipeline`: End-to-end valuation wiring

pub mod config;
pub mod core;
pub mod error;
pub mod pipeline;
pub mod pricing;
pub mod search;

// Re-exports for convenience
pub use config::Config;
pub use core::catalog::{InMemoryCatalog, PropertyCatalog};
pub use core::filters::{extract_filters, FilterExtractor, Filters, KeywordFilterExtractor};
pub use core::property::{Property, PropertyType};
pub use error::{PipelineError, PricingError};
pub use pipeline::{Pipeline, PipelineInput, PipelineOptions, PipelineOutput};
pub use pricing::estimator::{estimate, ConfidenceInterval, Estimation, Verdict};
pub use search::rerank::{Comparable, Reranker};
