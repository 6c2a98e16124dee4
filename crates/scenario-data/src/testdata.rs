//! Test data generation utilities.
//!
//! Builds small scenario datasets in the persisted layout so tests can run
//! the loaders end to end against either backend:
//!
//! | Key | Contents |
//! |-----|----------|
//! | `movement/demo/metadata.json` | anchors 2022-01-01 and 2022-07-01, window 14, 3 cells |
//! | `movement/demo/geometries.geojson` | cells 2, 0, 1 (stored out of order) |
//! | `movement/demo/habitat.json` | two records |
//! | `movement/demo/matrices.zarr/` | 3x3 matrices for 2022-01-01, 2022-01-02, 2022-01-04 |
//! | `depth/demo_depth/metadata.json` | window 2022-01-01..2022-12-31, bins 25 and 50 |
//! | `depth/demo_depth/2022-01.json.gz` | hourly rows for bin 25, one row for bin 50 |
//! | `depth/demo_depth/cell_depths.json` | `[100, 250, 40]` |

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use flate2::{write::GzEncoder, Compression};
use object_store::{path::Path as ObjectPath, ObjectStore};
use serde_json::{json, Value};
use walkdir::WalkDir;
use zarrs::array::{ArrayBuilder, DataType, FillValue};
use zarrs::array_subset::ArraySubset;
use zarrs::group::GroupBuilder;
use zarrs_filesystem::FilesystemStore;

use crate::occupancy::{OccupancyRow, OccupancyTable};

pub type TestResult<T> = Result<T, Box<dyn std::error::Error>>;

pub const DEMO_MOVEMENT_ID: &str = "demo";
pub const DEMO_DEPTH_ID: &str = "demo_depth";

/// Dates stored in the demo array store.
pub const DEMO_MATRIX_DATES: [&str; 3] = ["2022-01-01", "2022-01-02", "2022-01-04"];

pub fn movement_metadata(
    scenario_id: &str,
    dates: &[&str],
    window: u32,
    grid_size: usize,
) -> Value {
    json!({
        "scenario_id": scenario_id,
        "name": format!("{} movement", scenario_id),
        "species": "Chinook salmon",
        "region": "Gulf of Alaska",
        "description": "Daily movement patterns",
        "dates": dates,
        "maximum_window_size": window,
        "grid_size": grid_size,
        "r_values": [0.025, 0.05],
        "map_center": [58.5, -152.0],
        "map_zoom": 6
    })
}

pub fn depth_metadata(
    scenario_id: &str,
    time_window: [&str; 2],
    depth_bins: &[i64],
    grid_size: usize,
) -> Value {
    json!({
        "scenario_id": scenario_id,
        "name": format!("{} depth", scenario_id),
        "species": "Chinook salmon",
        "region": "Gulf of Alaska",
        "description": "Hourly depth occupancy",
        "time_window": time_window,
        "grid_size": grid_size,
        "depth_bins": depth_bins,
        "resolution": "hourly",
        "map_center": [58.5, -152.0],
        "map_zoom": 6
    })
}

/// A one-degree square cell feature with its corner at (lon, lat).
pub fn square_cell(cell_id: i64, lon: f64, lat: f64) -> Value {
    json!({
        "type": "Feature",
        "properties": {"cell_id": cell_id},
        "geometry": {
            "type": "Polygon",
            "coordinates": [[
                [lon, lat], [lon + 1.0, lat], [lon + 1.0, lat + 1.0], [lon, lat + 1.0], [lon, lat]
            ]]
        }
    })
}

/// FeatureCollection with one square per id, in the given order.
pub fn feature_collection(cell_ids: &[i64]) -> Value {
    json!({
        "type": "FeatureCollection",
        "features": cell_ids
            .iter()
            .map(|&id| square_cell(id, -152.0 + id as f64, 58.0))
            .collect::<Vec<_>>()
    })
}

/// Matrix whose value at (from, to) is `seed + from * 0.1 + to * 0.01`.
pub fn create_test_matrix(size: usize, seed: f64) -> Vec<Vec<f64>> {
    (0..size)
        .map(|from| {
            (0..size)
                .map(|to| seed + from as f64 * 0.1 + to as f64 * 0.01)
                .collect()
        })
        .collect()
}

pub fn write_bytes(root: &Path, key: &str, bytes: &[u8]) -> TestResult<()> {
    let path = root.join(key);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    Ok(())
}

pub fn write_json(root: &Path, key: &str, value: &Value) -> TestResult<()> {
    write_bytes(root, key, &serde_json::to_vec_pretty(value)?)
}

/// Gzip-compress a table in its stored form.
pub fn encode_occupancy_table(table: &OccupancyTable) -> TestResult<Vec<u8>> {
    use std::io::Write;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&serde_json::to_vec(table)?)?;
    Ok(encoder.finish()?)
}

/// Write a Zarr hierarchy at `path` with one float64 array node per entry.
pub fn write_matrices_zarr(path: &Path, matrices: &[(&str, Vec<Vec<f64>>)]) -> TestResult<()> {
    for (node, matrix) in matrices {
        let rows = matrix.len() as u64;
        let cols = matrix.first().map_or(0, |r| r.len()) as u64;
        let data: Vec<f64> = matrix.iter().flatten().copied().collect();
        write_array_node(path, node, vec![rows, cols], &data)?;
    }
    Ok(())
}

/// Write a single float64 array node of any shape under a Zarr hierarchy.
pub fn write_array_node(path: &Path, node: &str, shape: Vec<u64>, data: &[f64]) -> TestResult<()> {
    std::fs::create_dir_all(path)?;
    let store = Arc::new(FilesystemStore::new(path)?);

    GroupBuilder::new().build(store.clone(), "/")?.store_metadata()?;

    let chunk_shape: Vec<u64> = shape.iter().map(|d| (*d).max(1)).collect();
    let array = ArrayBuilder::new(
        shape.clone(),
        DataType::Float64,
        chunk_shape.try_into()?,
        FillValue::from(f64::NAN),
    )
    .build(store.clone(), &format!("/{}", node))?;

    array.store_metadata()?;

    let subset = ArraySubset::new_with_start_shape(vec![0; shape.len()], shape)?;
    array.store_array_subset_elements(&subset, data)?;

    Ok(())
}

/// Rows of the demo occupancy table.
pub fn demo_occupancy_rows() -> Vec<OccupancyRow> {
    let mut rows = Vec::new();
    for hour in [2u32, 0, 1] {
        for cell_id in [1i64, 0, 2] {
            rows.push(OccupancyRow {
                timestamp: format!("2022-01-01T{:02}:00:00+00:00", hour),
                cell_id,
                depth_bin: 25,
                probability: f64::from(hour) * 0.1 + cell_id as f64 * 0.01,
            });
        }
    }
    rows.push(OccupancyRow {
        timestamp: "2022-01-01T00:00:00+00:00".to_string(),
        cell_id: 0,
        depth_bin: 50,
        probability: 0.9,
    });
    rows
}

/// Write the full demo dataset (see module docs) under `root`.
pub fn write_demo_dataset(root: &Path) -> TestResult<()> {
    let movement = DEMO_MOVEMENT_ID;
    write_json(
        root,
        &format!("movement/{}/metadata.json", movement),
        &movement_metadata(movement, &["2022-01-01", "2022-07-01"], 14, 3),
    )?;
    write_json(
        root,
        &format!("movement/{}/geometries.geojson", movement),
        &feature_collection(&[2, 0, 1]),
    )?;
    write_json(
        root,
        &format!("movement/{}/habitat.json", movement),
        &json!([
            {"date": "2022-01-01", "r": 0.025, "probability": [0.2, 0.3, 0.5]},
            {"date": "2022-07-01", "r": "0.05", "probability": [0.1, 0.1, 0.8]}
        ]),
    )?;

    let matrices: Vec<(&str, Vec<Vec<f64>>)> = DEMO_MATRIX_DATES
        .iter()
        .enumerate()
        .map(|(i, date)| (*date, create_test_matrix(3, i as f64)))
        .collect();
    write_matrices_zarr(&root.join(format!("movement/{}/matrices.zarr", movement)), &matrices)?;

    let depth = DEMO_DEPTH_ID;
    write_json(
        root,
        &format!("depth/{}/metadata.json", depth),
        &depth_metadata(depth, ["2022-01-01", "2022-12-31"], &[25, 50], 3),
    )?;
    write_json(
        root,
        &format!("depth/{}/geometries.geojson", depth),
        &feature_collection(&[0, 1, 2]),
    )?;
    write_json(
        root,
        &format!("depth/{}/cell_depths.json", depth),
        &json!([100.0, 250.0, 40.0]),
    )?;
    write_bytes(
        root,
        &format!("depth/{}/2022-01.json.gz", depth),
        &encode_occupancy_table(&OccupancyTable::from_rows(&demo_occupancy_rows()))?,
    )?;

    Ok(())
}

/// Copy every file under `root` into an object store, keyed by relative path.
pub async fn upload_dir(store: &dyn ObjectStore, root: &Path) -> TestResult<usize> {
    let mut uploaded = 0;
    for entry in WalkDir::new(root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(root)?;
        let key = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let body = Bytes::from(std::fs::read(entry.path())?);
        store.put(&ObjectPath::from(key.as_str()), body.into()).await?;
        uploaded += 1;
    }
    Ok(uploaded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_test_matrix() {
        let matrix = create_test_matrix(3, 1.0);
        assert_eq!(matrix.len(), 3);
        assert!((matrix[2][1] - 1.21).abs() < 1e-9);
    }

    #[test]
    fn test_feature_collection_keeps_order() {
        let fc = feature_collection(&[3, 1, 2]);
        let ids: Vec<i64> = fc["features"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["properties"]["cell_id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }
}
