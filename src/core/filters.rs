//! Free-text query → structured filters
//!
//! Best-effort keyword matching over a lowercased copy of the query.
//! Text that matches nothing simply yields fewer filters.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::property::PropertyType;
use super::schema::DEFAULT_NEIGHBORHOODS;

lazy_static! {
    // "2 rooms", "3 camere", "2cam"
    static ref ROOMS_RE: Regex = Regex::new(r"\b(\d+)\s*(?:rooms?\b|cam)").unwrap();
    // "60000 euro", "85000 eur", "90000€"
    static ref PRICE_RE: Regex = Regex::new(r"\b(\d{2,6})\s*(?:euros?\b|eur\b|€)").unwrap();
}

/// Constraints extracted from a query. `None` means unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_type: Option<PropertyType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rooms: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neighborhood: Option<String>,
}

impl Filters {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Strategy for turning query text into [`Filters`]
pub trait FilterExtractor: Send + Sync {
    fn extract(&self, query: &str) -> Filters;
}

/// Keyword and pattern based extractor with a neighborhood gazetteer
#[derive(Debug, Clone)]
pub struct KeywordFilterExtractor {
    gazetteer: Vec<String>,
}

impl KeywordFilterExtractor {
    pub fn new() -> Self {
        Self::with_gazetteer(DEFAULT_NEIGHBORHOODS.iter().copied())
    }

    /// Gazetteer entries are matched in the given order; first hit wins
    pub fn with_gazetteer<I, S>(neighborhoods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let gazetteer = neighborhoods
            .into_iter()
            .map(|n| n.as_ref().trim().to_lowercase())
            .filter(|n| !n.is_empty())
            .collect();
        Self { gazetteer }
    }
}

impl Default for KeywordFilterExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterExtractor for KeywordFilterExtractor {
    fn extract(&self, query: &str) -> Filters {
        let q = query.to_lowercase();

        let property_type = PropertyType::PRIORITY
            .into_iter()
            .find(|t| t.aliases().iter().any(|alias| q.contains(alias)));

        let rooms = ROOMS_RE
            .captures(&q)
            .and_then(|c| c[1].parse::<u32>().ok());

        let price_max = PRICE_RE
            .captures(&q)
            .and_then(|c| c[1].parse::<f64>().ok())
            .filter(|p| *p > 0.0);

        let neighborhood = self
            .gazetteer
            .iter()
            .find(|nb| q.contains(nb.as_str()))
            .map(|nb| title_case(nb));

        Filters {
            property_type,
            rooms,
            price_max,
            neighborhood,
        }
    }
}

/// Extract filters with the default gazetteer
pub fn extract_filters(query: &str) -> Filters {
    KeywordFilterExtractor::new().extract(query)
}

/// Uppercase the first letter of every word, lowercase the rest
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_query() {
        let f = extract_filters("apartment 2 rooms Titan budget 60000 euro");
        assert_eq!(
            f,
            Filters {
                property_type: Some(PropertyType::Apartment),
                rooms: Some(2),
                price_max: Some(60000.0),
                neighborhood: Some("Titan".to_string()),
            }
        );
    }

    #[test]
    fn test_romanian_vocabulary() {
        let f = extract_filters("apartament 3 camere drumul taberei buget 95000 euro");
        assert_eq!(f.property_type, Some(PropertyType::Apartment));
        assert_eq!(f.rooms, Some(3));
        assert_eq!(f.price_max, Some(95000.0));
        assert_eq!(f.neighborhood.as_deref(), Some("Drumul Taberei"));
    }

    #[test]
    fn test_type_priority() {
        // apartment beats house beats land
        let f = extract_filters("casa sau apartament");
        assert_eq!(f.property_type, Some(PropertyType::Apartment));
        let f = extract_filters("teren cu casa");
        assert_eq!(f.property_type, Some(PropertyType::House));
        let f = extract_filters("teren de vanzare");
        assert_eq!(f.property_type, Some(PropertyType::Land));
    }

    #[test]
    fn test_first_gazetteer_hit_wins() {
        let f = extract_filters("militari or titan");
        assert_eq!(f.neighborhood.as_deref(), Some("Titan"));

        let extractor = KeywordFilterExtractor::with_gazetteer(["Militari", "Titan"]);
        let f = extractor.extract("militari or titan");
        assert_eq!(f.neighborhood.as_deref(), Some("Militari"));
    }

    #[test]
    fn test_price_digit_bounds() {
        assert_eq!(extract_filters("max 9 euro").price_max, None);
        assert_eq!(extract_filters("max 1200000 euro").price_max, None);
        assert_eq!(extract_filters("max 450000eur").price_max, Some(450000.0));
        assert_eq!(extract_filters("max 00 euro").price_max, None);
        assert_eq!(extract_filters("max 60000 lei").price_max, None);
    }

    #[test]
    fn test_unmatched_query_is_unconstrained() {
        let f = extract_filters("something nice and sunny");
        assert!(f.is_empty());
        assert!(extract_filters("").is_empty());
    }

    #[test]
    fn test_filters_json_omits_absent_fields() {
        let f = extract_filters("2 rooms");
        let json = serde_json::to_value(&f).unwrap();
        assert_eq!(json, serde_json::json!({ "rooms": 2 }));
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("drumul taberei"), "Drumul Taberei");
        assert_eq!(title_case("AVIATIEI"), "Aviatiei");
    }
}
