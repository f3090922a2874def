//! GeoJSON-backed Feature Source
//!
//! Layers are stored as GeoJSON files in the data folder. Each feature's
//! `properties` become attribute columns; its geometry type is exposed in the
//! reserved `geometry` column.

use super::{AttributeTable, AttributeValue, FeatureSource, FeatureSourceError, GEOMETRY_COLUMN};
use serde_json::Value;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads `<data_dir>/<layer.filename>` for a registered layer
#[derive(Clone)]
pub struct GeoJsonFeatureSource {
    db: SqlitePool,
    data_dir: PathBuf,
}

impl GeoJsonFeatureSource {
    pub fn new(db: SqlitePool, data_dir: PathBuf) -> Self {
        Self { db, data_dir }
    }

    /// Dataset path for a stored file name
    ///
    /// Only the final path component is used so a stored name can never
    /// point outside the data folder.
    fn dataset_path(&self, filename: &str) -> Option<PathBuf> {
        Path::new(filename)
            .file_name()
            .map(|name| self.data_dir.join(name))
    }
}

#[async_trait::async_trait]
impl FeatureSource for GeoJsonFeatureSource {
    async fn read_attributes(&self, layer_id: i64) -> Result<AttributeTable, FeatureSourceError> {
        let layer = crate::db::get_layer(&self.db, layer_id)
            .await
            .map_err(|e| FeatureSourceError::LayerDataUnavailable(e.to_string()))?
            .ok_or(FeatureSourceError::LayerNotFound(layer_id))?;

        let path = self.dataset_path(&layer.filename).ok_or_else(|| {
            FeatureSourceError::LayerDataUnavailable(format!(
                "invalid dataset file name: {}",
                layer.filename
            ))
        })?;

        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            FeatureSourceError::LayerDataUnavailable(format!("{}: {}", path.display(), e))
        })?;

        let table = tokio::task::spawn_blocking(move || parse_geojson(&content))
            .await
            .map_err(|e| FeatureSourceError::LayerDataUnavailable(e.to_string()))??;

        debug!(
            layer_id,
            records = table.len(),
            columns = table.columns().len(),
            "Read layer attributes"
        );
        Ok(table)
    }
}

/// Parse a GeoJSON `FeatureCollection` (or a single `Feature`)
pub fn parse_geojson(content: &str) -> Result<AttributeTable, FeatureSourceError> {
    let document: Value = serde_json::from_str(content)
        .map_err(|e| FeatureSourceError::LayerDataUnavailable(format!("invalid GeoJSON: {}", e)))?;

    let features: Vec<&Value> = match document.get("type").and_then(Value::as_str) {
        Some("FeatureCollection") => document
            .get("features")
            .and_then(Value::as_array)
            .map(|f| f.iter().collect())
            .unwrap_or_default(),
        Some("Feature") => vec![&document],
        other => {
            return Err(FeatureSourceError::LayerDataUnavailable(format!(
                "unsupported GeoJSON type: {}",
                other.unwrap_or("<missing>")
            )))
        }
    };

    let mut table = AttributeTable::new();
    for feature in features {
        let mut record: HashMap<String, AttributeValue> = feature
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| {
                props
                    .iter()
                    .filter(|(k, _)| k.as_str() != GEOMETRY_COLUMN)
                    .map(|(k, v)| (k.clone(), AttributeValue::from_json(v)))
                    .collect()
            })
            .unwrap_or_default();

        let geometry = feature
            .get("geometry")
            .and_then(|g| g.get("type"))
            .and_then(Value::as_str)
            .map(|t| AttributeValue::Text(t.to_string()))
            .unwrap_or(AttributeValue::Null);
        record.insert(GEOMETRY_COLUMN.to_string(), geometry);

        table.push_record(record);
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARCELS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "geometry": {"type": "Polygon", "coordinates": []},
             "properties": {"zone": "R1", "area": 120.5, "tags": ["a"]}},
            {"type": "Feature", "geometry": null,
             "properties": {"zone": "C2", "area": null}}
        ]
    }"#;

    #[test]
    fn test_parse_feature_collection() {
        let table = parse_geojson(PARCELS).unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.has_column(GEOMETRY_COLUMN));

        let area = table.series("area").unwrap();
        assert_eq!(area.values, vec![AttributeValue::Number(120.5), AttributeValue::Null]);

        let tags = table.series("tags").unwrap();
        assert_eq!(tags.values[0], AttributeValue::Text(r#"["a"]"#.to_string()));
        assert_eq!(table.geometry_type().as_deref(), Some("Polygon"));
    }

    #[test]
    fn test_parse_single_feature() {
        let table = parse_geojson(
            r#"{"type": "Feature", "geometry": {"type": "Point"}, "properties": {"id": 7}}"#,
        )
        .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.series("id").unwrap().values, vec![AttributeValue::Number(7.0)]);
    }

    #[test]
    fn test_rejects_non_geojson() {
        assert!(matches!(
            parse_geojson("not json"),
            Err(FeatureSourceError::LayerDataUnavailable(_))
        ));
        assert!(matches!(
            parse_geojson(r#"{"type": "Topology"}"#),
            Err(FeatureSourceError::LayerDataUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_read_attributes_for_registered_layer() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(temp_dir.path().join("parcels.geojson"), PARCELS).unwrap();

        let pool = wgis_common::db::connect_in_memory().await.unwrap();
        let layer_id = crate::db::register_layer(&pool, "Parcels", "parcels.geojson", None)
            .await
            .unwrap();

        let source = GeoJsonFeatureSource::new(pool, temp_dir.path().to_path_buf());
        let table = source.read_attributes(layer_id).await.unwrap();
        assert_eq!(table.len(), 2);

        assert!(matches!(
            source.read_attributes(layer_id + 10).await,
            Err(FeatureSourceError::LayerNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_dataset_is_unavailable() {
        let temp_dir = tempfile::tempdir().unwrap();
        let pool = wgis_common::db::connect_in_memory().await.unwrap();
        let layer_id = crate::db::register_layer(&pool, "Gone", "gone.geojson", None)
            .await
            .unwrap();

        let source = GeoJsonFeatureSource::new(pool, temp_dir.path().to_path_buf());
        assert!(matches!(
            source.read_attributes(layer_id).await,
            Err(FeatureSourceError::LayerDataUnavailable(_))
        ));
    }
}
