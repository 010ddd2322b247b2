use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::schema::{ListingViolation, APARTMENT_ALIASES, HOUSE_ALIASES, LAND_ALIASES};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum PropertyType {
    Apartment,
    House,
    Land,
}

impl PropertyType {
    /// Priority order used when several vocabularies occur in one query
    pub const PRIORITY: [PropertyType; 3] = [Self::Apartment, Self::House, Self::Land];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Apartment => "apartment",
            Self::House => "house",
            Self::Land => "land",
        }
    }

    pub fn aliases(&self) -> &'static HashSet<&'static str> {
        match self {
            Self::Apartment => &APARTMENT_ALIASES,
            Self::House => &HOUSE_ALIASES,
            Self::Land => &LAND_ALIASES,
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropertyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::PRIORITY
            .into_iter()
            .find(|t| t.aliases().contains(lower.as_str()))
            .ok_or_else(|| format!("unknown property type '{}'", s))
    }
}

impl TryFrom<String> for PropertyType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// One listing in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: i64,
    pub property_type: PropertyType,
    pub neighborhood: String,
    pub city: String,
    pub price_eur: f64,
    pub size_sqm: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rooms: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_floor: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_built: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parking: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dist_to_metro_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Property {
    /// Property with only the pricing-relevant attributes set
    pub fn new(
        id: i64,
        property_type: PropertyType,
        neighborhood: impl Into<String>,
        city: impl Into<String>,
        price_eur: f64,
        size_sqm: f64,
    ) -> Self {
        Self {
            id,
            property_type,
            neighborhood: neighborhood.into(),
            city: city.into(),
            price_eur,
            size_sqm,
            rooms: None,
            floor: None,
            max_floor: None,
            year_built: None,
            parking: None,
            dist_to_metro_min: None,
            description: None,
        }
    }

    /// Derived on every call so it can never drift from price and size
    pub fn price_per_sqm(&self) -> f64 {
        if self.size_sqm > 0.0 {
            self.price_eur / self.size_sqm
        } else {
            0.0
        }
    }

    pub fn validate(&self) -> Vec<ListingViolation> {
        let mut violations = Vec::new();
        if !(self.price_eur > 0.0) {
            violations.push(ListingViolation::NonPositivePrice(self.price_eur));
        }
        if !(self.size_sqm > 0.0) {
            violations.push(ListingViolation::NonPositiveSize(self.size_sqm));
        }
        if self.neighborhood.trim().is_empty() {
            violations.push(ListingViolation::MissingField("neighborhood"));
        }
        if self.city.trim().is_empty() {
            violations.push(ListingViolation::MissingField("city"));
        }
        violations
    }

    /// Document text embedded into the search index
    pub fn index_text(&self) -> String {
        let mut text = self.property_type.to_string();
        if let Some(rooms) = self.rooms {
            text.push_str(&format!(" {} rooms", rooms));
        }
        text.push_str(&format!(
            " in {}, {}, {} sqm",
            self.neighborhood, self.city, self.size_sqm
        ));
        if let Some(year) = self.year_built {
            text.push_str(&format!(", built {}", year));
        }
        text.push_str(&format!(", price {} euro.", self.price_eur));

        match (self.floor, self.max_floor) {
            (Some(floor), Some(max)) => text.push_str(&format!(" Floor {} of {}.", floor, max)),
            (Some(floor), None) => text.push_str(&format!(" Floor {}.", floor)),
            _ => {}
        }
        if let Some(ref parking) = self.parking {
            text.push_str(&format!(" Parking: {}.", parking));
        }
        if let Some(minutes) = self.dist_to_metro_min {
            text.push_str(&format!(" Metro {} min.", minutes));
        }
        if let Some(ref description) = self.description {
            text.push_str(&format!(" Description: {}", description));
        }
        text
    }
}
