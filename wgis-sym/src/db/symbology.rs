//! Symbology persistence
//!
//! One normalized [`SymbologyRecord`] per layer, stored as a JSON document.
//! Writes are last-writer-wins.

use crate::symbology::SymbologyRecord;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use wgis_common::Result;

/// Durable storage for per-layer symbology records
#[async_trait::async_trait]
pub trait SymbologyStore: Send + Sync {
    /// Insert or replace the layer's record; returns it with `updated_at` set
    async fn save(&self, layer_id: i64, record: &SymbologyRecord) -> Result<SymbologyRecord>;

    async fn load(&self, layer_id: i64) -> Result<Option<SymbologyRecord>>;

    /// Remove the layer's record; `false` if there was none
    async fn delete(&self, layer_id: i64) -> Result<bool>;
}

/// `layer_symbology` table in the shared SQLite database
#[derive(Clone)]
pub struct SqliteSymbologyStore {
    db: SqlitePool,
}

impl SqliteSymbologyStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl SymbologyStore for SqliteSymbologyStore {
    async fn save(&self, layer_id: i64, record: &SymbologyRecord) -> Result<SymbologyRecord> {
        let mut stored = record.clone();
        stored.updated_at = Some(Utc::now());

        let document = serde_json::to_string(&stored).map_err(|e| {
            wgis_common::Error::Internal(format!("Failed to serialize symbology: {}", e))
        })?;
        let updated_at = stored.updated_at.map(|t| t.to_rfc3339()).unwrap_or_default();

        sqlx::query(
            r#"
            INSERT INTO layer_symbology (layer_id, style_type, document, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(layer_id) DO UPDATE SET
                style_type = excluded.style_type,
                document = excluded.document,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(layer_id)
        .bind(stored.style_type())
        .bind(&document)
        .bind(&updated_at)
        .execute(&self.db)
        .await?;

        tracing::debug!(layer_id, style_type = stored.style_type(), "Saved layer symbology");
        Ok(stored)
    }

    async fn load(&self, layer_id: i64) -> Result<Option<SymbologyRecord>> {
        let row = sqlx::query("SELECT document, updated_at FROM layer_symbology WHERE layer_id = ?")
            .bind(layer_id)
            .fetch_optional(&self.db)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let document: String = row.get("document");
        let mut record: SymbologyRecord = serde_json::from_str(&document).map_err(|e| {
            wgis_common::Error::Internal(format!("Failed to deserialize symbology: {}", e))
        })?;

        // the column is authoritative for the timestamp
        let updated_at: String = row.get("updated_at");
        if let Ok(parsed) = DateTime::parse_from_rfc3339(&updated_at) {
            record.updated_at = Some(parsed.with_timezone(&Utc));
        }

        Ok(Some(record))
    }

    async fn delete(&self, layer_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM layer_symbology WHERE layer_id = ?")
            .bind(layer_id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::register_layer;
    use crate::symbology::normalize;
    use serde_json::json;

    async fn setup() -> (SqlitePool, i64) {
        let pool = wgis_common::db::connect_in_memory().await.unwrap();
        let id = register_layer(&pool, "Parcels", "parcels.geojson", Some("Polygon"))
            .await
            .unwrap();
        (pool, id)
    }

    #[tokio::test]
    async fn test_save_load_delete() {
        let (pool, id) = setup().await;
        let store = SqliteSymbologyStore::new(pool);

        assert!(store.load(id).await.unwrap().is_none());

        let record = normalize(json!({"type": "single", "fill": "#ff0000"})).unwrap();
        let saved = store.save(id, &record).await.unwrap();
        assert!(saved.updated_at.is_some());

        let loaded = store.load(id).await.unwrap().unwrap();
        assert_eq!(loaded.symbology, record.symbology);
        assert_eq!(loaded.updated_at, saved.updated_at);

        assert!(store.delete(id).await.unwrap());
        assert!(!store.delete(id).await.unwrap());
        assert!(store.load(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_last_writer_wins() {
        let (pool, id) = setup().await;
        let store = SqliteSymbologyStore::new(pool);

        let first = normalize(json!({"type": "single"})).unwrap();
        let second = normalize(json!({
            "type": "graduated",
            "field": "pop",
            "classes": 4
        }))
        .unwrap();

        store.save(id, &first).await.unwrap();
        store.save(id, &second).await.unwrap();

        let loaded = store.load(id).await.unwrap().unwrap();
        assert_eq!(loaded.style_type(), "graduated");
    }

    #[tokio::test]
    async fn test_unknown_layer_is_rejected() {
        let (pool, id) = setup().await;
        let store = SqliteSymbologyStore::new(pool);
        let record = normalize(json!({"type": "single"})).unwrap();
        assert!(store.save(id + 100, &record).await.is_err());
    }

    #[tokio::test]
    async fn test_removed_with_layer() {
        let (pool, id) = setup().await;
        let store = SqliteSymbologyStore::new(pool.clone());
        let record = normalize(json!({"type": "single"})).unwrap();
        store.save(id, &record).await.unwrap();

        sqlx::query("DELETE FROM layers WHERE id = ?")
            .bind(id)
            .execute(&pool)
            .await
            .unwrap();

        assert!(store.load(id).await.unwrap().is_none());
    }
}
