use std::collections::HashSet;

use lazy_static::lazy_static;

lazy_static! {
    pub static ref APARTMENT_ALIASES: HashSet<&'static str> =
        HashSet::from(["apartment", "apartament", "flat", "garsoniera"]);
    pub static ref HOUSE_ALIASES: HashSet<&'static str> =
        HashSet::from(["house", "casa", "casă", "vila", "vilă", "villa"]);
    pub static ref LAND_ALIASES: HashSet<&'static str> =
        HashSet::from(["land", "teren", "plot"]);
}

/// Known neighborhoods, matched in this order
pub const DEFAULT_NEIGHBORHOODS: &[&str] = &[
    "titan",
    "militari",
    "dristor",
    "berceni",
    "aviatiei",
    "pipera",
    "drumul taberei",
];

#[derive(Debug, Clone, PartialEq)]
pub enum ListingViolation {
    NonPositivePrice(f64),
    NonPositiveSize(f64),
    MissingField(&'static str),
    DuplicateId(i64),
}

impl std::fmt::Display for ListingViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonPositivePrice(p) => write!(f, "Price must be positive (got {})", p),
            Self::NonPositiveSize(s) => write!(f, "Size must be positive (got {} sqm)", s),
            Self::MissingField(field) => write!(f, "Missing required field: {}", field),
            Self::DuplicateId(id) => write!(f, "Duplicate property id: {}", id),
        }
    }
}
