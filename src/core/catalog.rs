//! Read-only property repository

use std::collections::HashMap;

use super::property::Property;

/// Lookup from property id to its attributes.
///
/// Implementations are never mutated while queries run, so one catalog can
/// be shared by concurrent pipelines.
pub trait PropertyCatalog: Send + Sync {
    fn lookup(&self, id: i64) -> Option<&Property>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryCatalog {
    properties: HashMap<i64, Property>,
}

impl InMemoryCatalog {
    /// Build from listings; a repeated id keeps its first occurrence
    pub fn from_properties(properties: impl IntoIterator<Item = Property>) -> Self {
        let mut map = HashMap::new();
        for property in properties {
            map.entry(property.id).or_insert(property);
        }
        Self { properties: map }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.properties.values()
    }
}

impl PropertyCatalog for InMemoryCatalog {
    fn lookup(&self, id: i64) -> Option<&Property> {
        self.properties.get(&id)
    }

    fn len(&self) -> usize {
        self.properties.len()
    }
}
