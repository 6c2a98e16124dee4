//! Grid geometry loading.
//!
//! Features are validated one at a time and a bad feature is skipped with a
//! warning. Only a document without a `features` array, or one that yields no
//! valid cell at all, fails the whole load.

use serde_json::Value;
use tracing::warn;

use fishflow_common::{
    DataError, DataResult, DatasetFamily, GridCell, GridGeometries, PolygonGeometry,
};
use storage::{ScenarioPath, StorageBackend};

use crate::document::read_json;

/// Load the grid cells of a scenario, ascending by `cell_id`.
pub async fn load_geometries(
    backend: &dyn StorageBackend,
    family: DatasetFamily,
    scenario_id: &str,
) -> DataResult<GridGeometries> {
    let key = ScenarioPath::geometries(family, scenario_id);
    let document: Value = read_json(backend, &key).await?;
    let geometries = parse_feature_collection(scenario_id, &document)?;

    Ok(GridGeometries {
        scenario_id: scenario_id.to_string(),
        geometries,
    })
}

/// Convert a GeoJSON FeatureCollection into grid cells.
pub fn parse_feature_collection(scenario_id: &str, document: &Value) -> DataResult<Vec<GridCell>> {
    let features = document
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            DataError::malformed(
                format!("geometries of {}", scenario_id),
                "missing 'features' array",
            )
        })?;

    let mut cells: Vec<GridCell> = features
        .iter()
        .filter_map(|feature| parse_feature(scenario_id, feature))
        .collect();

    if cells.is_empty() {
        return Err(DataError::malformed(
            format!("geometries of {}", scenario_id),
            "no valid grid cells",
        ));
    }

    // Stable sort, so the first feature wins when an id repeats.
    cells.sort_by_key(|c| c.cell_id);
    let before = cells.len();
    cells.dedup_by_key(|c| c.cell_id);
    if cells.len() != before {
        warn!(
            scenario_id = %scenario_id,
            dropped = before - cells.len(),
            "Dropped features with duplicate cell_id"
        );
    }

    Ok(cells)
}

fn parse_feature(scenario_id: &str, feature: &Value) -> Option<GridCell> {
    let Some(raw_id) = feature.get("properties").and_then(|p| p.get("cell_id")) else {
        warn!(scenario_id = %scenario_id, "Feature missing cell_id property");
        return None;
    };

    let Some(cell_id) = raw_id.as_i64() else {
        warn!(scenario_id = %scenario_id, cell_id = %raw_id, "cell_id must be an integer");
        return None;
    };

    let Some(geometry) = feature.get("geometry") else {
        warn!(scenario_id = %scenario_id, cell_id, "Feature missing geometry");
        return None;
    };

    match PolygonGeometry::from_geojson(geometry) {
        Ok(geometry) => Some(GridCell { cell_id, geometry }),
        Err(e) => {
            warn!(scenario_id = %scenario_id, cell_id, error = %e, "Invalid geometry");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn feature(cell_id: Value) -> Value {
        json!({
            "type": "Feature",
            "properties": {"cell_id": cell_id},
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]
            }
        })
    }

    fn ids(cells: &[GridCell]) -> Vec<i64> {
        cells.iter().map(|c| c.cell_id).collect()
    }

    #[test]
    fn test_cells_sorted_by_id() {
        let doc = json!({
            "type": "FeatureCollection",
            "features": [feature(json!(3)), feature(json!(1)), feature(json!(2))]
        });
        let cells = parse_feature_collection("demo", &doc).unwrap();
        assert_eq!(ids(&cells), vec![1, 2, 3]);
    }

    #[test]
    fn test_invalid_features_are_skipped() {
        let doc = json!({
            "features": [
                feature(json!(5)),
                feature(json!("7")),
                feature(json!(2.5)),
                {"type": "Feature", "properties": {}, "geometry": null},
                {"type": "Feature", "properties": {"cell_id": 8}},
                {
                    "type": "Feature",
                    "properties": {"cell_id": 9},
                    "geometry": {"type": "Point", "coordinates": [0.0, 0.0]}
                },
                {"type": "Feature", "properties": {"cell_id": 10}, "geometry": null},
                feature(json!(0)),
            ]
        });
        let cells = parse_feature_collection("demo", &doc).unwrap();
        assert_eq!(ids(&cells), vec![0, 5]);
    }

    #[test]
    fn test_duplicate_ids_keep_first_feature() {
        let mut second = feature(json!(1));
        second["geometry"]["coordinates"] = json!([[[9.0, 9.0]]]);
        let doc = json!({"features": [feature(json!(1)), second, feature(json!(0))]});

        let cells = parse_feature_collection("demo", &doc).unwrap();
        assert_eq!(ids(&cells), vec![0, 1]);
        assert_eq!(cells[1].geometry.coordinates[0][0], [0.0, 0.0]);
    }

    #[test]
    fn test_missing_features_fails_whole_load() {
        let err =
            parse_feature_collection("demo", &json!({"type": "FeatureCollection"})).unwrap_err();
        assert_eq!(err.kind(), "malformed");
    }

    #[test]
    fn test_no_valid_cells_fails_whole_load() {
        let doc = json!({"features": [feature(json!("a")), {"properties": {"cell_id": 1}}]});
        assert!(parse_feature_collection("demo", &doc).is_err());
        assert!(parse_feature_collection("demo", &json!({"features": []})).is_err());
    }
}
