//! Property store using SQLite
//!
//! Holds the catalog rows and their embeddings. Nearest-neighbor search is a
//! cosine scan computed in Rust, which is adequate for city-sized catalogs.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use tracing::debug;

use super::embedding::cosine_similarity;
use super::rerank::rank_key;
use super::retriever::{Candidate, NearestNeighborIndex};
use crate::core::property::{Property, PropertyType};

const PROPERTY_COLUMNS: &str = "p.id, p.property_type, p.neighborhood, p.city, p.price_eur, p.size_sqm, \
     p.rooms, p.floor, p.max_floor, p.year_built, p.parking, p.dist_to_metro_min, p.description";

pub struct PropertyStore {
    conn: Connection,
}

impl PropertyStore {
    /// Open or create database at path
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open property store {}", db_path.display()))?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// In-memory store (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS properties (
                id INTEGER PRIMARY KEY,
                property_type TEXT NOT NULL,
                neighborhood TEXT NOT NULL,
                city TEXT NOT NULL,
                price_eur REAL NOT NULL,
                size_sqm REAL NOT NULL,
                rooms INTEGER,
                floor INTEGER,
                max_floor INTEGER,
                year_built INTEGER,
                parking TEXT,
                dist_to_metro_min REAL,
                description TEXT,
                indexed_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS embeddings (
                property_id INTEGER PRIMARY KEY,
                embedding BLOB NOT NULL,
                FOREIGN KEY (property_id) REFERENCES properties(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS index_meta (
                key TEXT PRIMARY KEY,
                value TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_properties_neighborhood ON properties(neighborhood);
            "#,
        )?;

        Ok(())
    }

    /// Insert or update a property together with its embedding
    pub fn upsert_property(&self, property: &Property, embedding: &[f32]) -> Result<()> {
        let now = chrono::Utc::now().timestamp();

        self.conn.execute(
            r#"
            INSERT INTO properties (id, property_type, neighborhood, city, price_eur, size_sqm,
                rooms, floor, max_floor, year_built, parking, dist_to_metro_min, description, indexed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            ON CONFLICT(id) DO UPDATE SET
                property_type = excluded.property_type,
                neighborhood = excluded.neighborhood,
                city = excluded.city,
                price_eur = excluded.price_eur,
                size_sqm = excluded.size_sqm,
                rooms = excluded.rooms,
                floor = excluded.floor,
                max_floor = excluded.max_floor,
                year_built = excluded.year_built,
                parking = excluded.parking,
                dist_to_metro_min = excluded.dist_to_metro_min,
                description = excluded.description,
                indexed_at = excluded.indexed_at
            "#,
            params![
                property.id,
                property.property_type.as_str(),
                property.neighborhood,
                property.city,
                property.price_eur,
                property.size_sqm,
                property.rooms,
                property.floor,
                property.max_floor,
                property.year_built,
                property.parking,
                property.dist_to_metro_min,
                property.description,
                now,
            ],
        )?;

        self.conn.execute(
            r#"
            INSERT INTO embeddings (property_id, embedding)
            VALUES (?1, ?2)
            ON CONFLICT(property_id) DO UPDATE SET embedding = excluded.embedding
            "#,
            params![property.id, embedding_to_blob(embedding)],
        )?;

        Ok(())
    }

    pub fn get_property(&self, id: i64) -> Result<Option<Property>> {
        let sql = format!("SELECT {} FROM properties p WHERE p.id = ?1", PROPERTY_COLUMNS);
        self.conn
            .query_row(&sql, params![id], row_to_property)
            .optional()
            .map_err(|e| e.into())
    }

    /// All catalog rows, ordered by id
    pub fn load_properties(&self) -> Result<Vec<Property>> {
        let sql = format!("SELECT {} FROM properties p ORDER BY p.id", PROPERTY_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_property)?;

        let mut properties = Vec::new();
        for row in rows {
            properties.push(row?);
        }
        Ok(properties)
    }

    pub fn get_stats(&self) -> Result<IndexStats> {
        let property_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM properties", [], |row| row.get(0))?;

        let embedding_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM embeddings", [], |row| row.get(0))?;

        let last_indexed: Option<i64> = self
            .conn
            .query_row("SELECT MAX(indexed_at) FROM properties", [], |row| row.get(0))
            .optional()?
            .flatten();

        Ok(IndexStats {
            property_count: property_count as usize,
            embedding_count: embedding_count as usize,
            last_indexed,
        })
    }

    pub fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO index_meta (key, value) VALUES (?1, ?2) ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn get_meta(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM index_meta WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map(Option::flatten)
            .map_err(|e| e.into())
    }
}

impl NearestNeighborIndex for PropertyStore {
    fn nearest(&self, query: &[f32], pool_size: usize) -> Result<Vec<Candidate>> {
        let mut stmt = self
            .conn
            .prepare("SELECT property_id, embedding FROM embeddings")?;
        let rows = stmt.query_map([], |row| {
            let id: i64 = row.get(0)?;
            let blob: Vec<u8> = row.get(1)?;
            Ok((id, blob))
        })?;

        let mut scored: Vec<(f64, Candidate)> = Vec::new();
        for row in rows {
            let (id, blob) = row?;
            let embedding = blob_to_embedding(&blob);
            let distance_score = cosine_similarity(query, &embedding);
            scored.push((distance_score, Candidate { id, embedding }));
        }
        debug!(scanned = scored.len(), pool_size, "nearest-neighbor scan");

        scored.sort_by(|a, b| {
            rank_key(b.0)
                .total_cmp(&rank_key(a.0))
                .then(a.1.id.cmp(&b.1.id))
        });
        scored.truncate(pool_size);

        Ok(scored.into_iter().map(|(_, c)| c).collect())
    }
}

#[derive(Debug)]
pub struct IndexStats {
    pub property_count: usize,
    pub embedding_count: usize,
    pub last_indexed: Option<i64>,
}

fn row_to_property(row: &Row<'_>) -> rusqlite::Result<Property> {
    let type_str: String = row.get(1)?;
    let property_type = type_str.parse::<PropertyType>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, e.into())
    })?;

    Ok(Property {
        id: row.get(0)?,
        property_type,
        neighborhood: row.get(2)?,
        city: row.get(3)?,
        price_eur: row.get(4)?,
        size_sqm: row.get(5)?,
        rooms: row.get(6)?,
        floor: row.get(7)?,
        max_floor: row.get(8)?,
        year_built: row.get(9)?,
        parking: row.get(10)?,
        dist_to_metro_min: row.get(11)?,
        description: row.get(12)?,
    })
}

/// f32 values as little-endian bytes
fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn blob_to_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: i64, neighborhood: &str) -> Property {
        let mut p = Property::new(id, PropertyType::Apartment, neighborhood, "Bucharest", 60000.0, 50.0);
        p.rooms = Some(2);
        p.description = Some("renovated".to_string());
        p
    }

    #[test]
    fn test_blob_conversion() {
        let embedding = vec![1.0, 2.0, 3.0, -0.5];
        assert_eq!(blob_to_embedding(&embedding_to_blob(&embedding)), embedding);
    }

    #[test]
    fn test_store_operations() -> Result<()> {
        let store = PropertyStore::open_in_memory()?;
        store.upsert_property(&sample(2, "Titan"), &[0.1, 0.2])?;
        store.upsert_property(&sample(1, "Militari"), &[0.3, 0.4])?;

        let got = store.get_property(2)?.expect("property 2");
        assert_eq!(got, sample(2, "Titan"));
        assert!(store.get_property(3)?.is_none());

        let all = store.load_properties()?;
        assert_eq!(all.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 2]);

        // upsert replaces the row
        let mut updated = sample(2, "Titan");
        updated.price_eur = 70000.0;
        store.upsert_property(&updated, &[0.1, 0.2])?;
        assert_eq!(store.get_property(2)?.unwrap().price_eur, 70000.0);

        let stats = store.get_stats()?;
        assert_eq!(stats.property_count, 2);
        assert_eq!(stats.embedding_count, 2);
        assert!(stats.last_indexed.is_some());

        store.set_meta("source", "listings.json")?;
        assert_eq!(store.get_meta("source")?.as_deref(), Some("listings.json"));
        assert!(store.get_meta("missing")?.is_none());

        Ok(())
    }

    #[test]
    fn test_nearest() -> Result<()> {
        let store = PropertyStore::open_in_memory()?;
        store.upsert_property(&sample(1, "Titan"), &[1.0, 0.0])?;
        store.upsert_property(&sample(2, "Titan"), &[0.0, 1.0])?;
        store.upsert_property(&sample(3, "Titan"), &[0.7, 0.7])?;

        let hits = store.nearest(&[1.0, 0.1], 2)?;
        assert_eq!(hits.iter().map(|c| c.id).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(hits[0].embedding, vec![1.0, 0.0]);

        let empty = PropertyStore::open_in_memory()?;
        assert!(empty.nearest(&[1.0, 0.0], 50)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_nearest_ranks_nan_scores_last() -> Result<()> {
        let store = PropertyStore::open_in_memory()?;
        store.upsert_property(&sample(1, "Titan"), &[f32::INFINITY, 0.0])?;
        store.upsert_property(&sample(2, "Titan"), &[0.0, 1.0])?;
        store.upsert_property(&sample(3, "Titan"), &[1.0, 0.0])?;

        let hits = store.nearest(&[1.0, 0.0], 3)?;
        assert_eq!(hits.iter().map(|c| c.id).collect::<Vec<_>>(), vec![3, 2, 1]);
        let top2 = store.nearest(&[1.0, 0.0], 2)?;
        assert_eq!(top2.iter().map(|c| c.id).collect::<Vec<_>>(), vec![3, 2]);
        Ok(())
    }
}
