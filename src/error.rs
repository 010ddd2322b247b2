//! Typed failures of the valuation pipeline

use thiserror::Error;

/// Estimator failures. Each means "no estimate could be produced", never a
/// NaN, infinite or negative price.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PricingError {
    #[error("no comparables available for estimation")]
    NoComparables,

    #[error("comparable scores sum to {sum}; weighted average is undefined")]
    DegenerateWeights { sum: f64 },

    #[error("{field} must be {requirement}, got {value}")]
    InvalidTarget {
        field: &'static str,
        requirement: &'static str,
        value: f64,
    },
}

impl PricingError {
    /// Stable code for JSON output
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoComparables => "NO_COMPARABLES",
            Self::DegenerateWeights { .. } => "DEGENERATE_WEIGHTS",
            Self::InvalidTarget { .. } => "INVALID_INPUT",
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// Index returned an id the catalog does not know (index/catalog drift)
    #[error("catalog integrity error: property {id} is indexed but missing from the catalog")]
    CatalogIntegrity { id: i64 },

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl PipelineError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::CatalogIntegrity { .. } => "CATALOG_INTEGRITY",
            Self::Pricing(e) => e.code(),
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Storage(_) => "STORAGE",
        }
    }
}
