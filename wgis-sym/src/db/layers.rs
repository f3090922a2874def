//! Read access to the `layers` table
//!
//! Layer rows are created and deleted by the layer manager. This service
//! only needs to map a layer id to its dataset file.

use sqlx::SqlitePool;
use wgis_common::Result;

/// One registered layer
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct LayerRecord {
    pub id: i64,
    pub name: String,
    /// Dataset file name inside the data folder
    pub filename: String,
    /// Geometry type recorded at upload time (e.g. "Polygon")
    pub layer_type: Option<String>,
}

/// Look up a layer by id
pub async fn get_layer(db: &SqlitePool, layer_id: i64) -> Result<Option<LayerRecord>> {
    let layer = sqlx::query_as::<_, LayerRecord>(
        "SELECT id, name, filename, layer_type FROM layers WHERE id = ?",
    )
    .bind(layer_id)
    .fetch_optional(db)
    .await?;

    Ok(layer)
}

/// Register a layer and return its id
pub async fn register_layer(
    db: &SqlitePool,
    name: &str,
    filename: &str,
    layer_type: Option<&str>,
) -> Result<i64> {
    let result = sqlx::query("INSERT INTO layers (name, filename, layer_type) VALUES (?, ?, ?)")
        .bind(name)
        .bind(filename)
        .bind(layer_type)
        .execute(db)
        .await?;

    Ok(result.last_insert_rowid())
}
