//! Catalog discovery against both storage backends.

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use object_store::{memory::InMemory, path::Path as ObjectPath, ObjectStore};
use serde_json::json;

use fishflow_common::DatasetFamily;
use storage::{LocalStorage, ObjectStorage, ScenarioCatalog, StorageBackend};

fn movement_metadata(id: &str, dates: &[&str]) -> serde_json::Value {
    json!({
        "scenario_id": id,
        "name": format!("Scenario {}", id),
        "species": "Chinook salmon",
        "region": "Gulf of Alaska",
        "description": "test",
        "dates": dates,
        "maximum_window_size": 14,
        "grid_size": 3,
        "r_values": [0.025, 0.05],
        "map_center": [58.5, -152.0],
        "map_zoom": 6
    })
}

fn fixture_objects() -> Vec<(String, String)> {
    vec![
        (
            "movement/demo/metadata.json".to_string(),
            movement_metadata("demo", &["2022-01-01", "2022-07-01"]).to_string(),
        ),
        (
            "movement/demo/habitat.json".to_string(),
            "[]".to_string(),
        ),
        (
            "movement/second/metadata.json".to_string(),
            movement_metadata("second", &["2023-01-01"]).to_string(),
        ),
        // Malformed date: skipped, not fatal.
        (
            "movement/broken/metadata.json".to_string(),
            movement_metadata("broken", &["2022-13-01"]).to_string(),
        ),
        // Not JSON at all.
        (
            "movement/garbage/metadata.json".to_string(),
            "not json".to_string(),
        ),
        // Data but no metadata.
        (
            "movement/orphan/habitat.json".to_string(),
            "[]".to_string(),
        ),
        // Declares a different id than its directory.
        (
            "movement/renamed/metadata.json".to_string(),
            movement_metadata("other", &["2022-01-01"]).to_string(),
        ),
        // Window reaches past the representable calendar.
        (
            "movement/endless/metadata.json".to_string(),
            {
                let mut value = movement_metadata("endless", &["2022-01-01"]);
                value["maximum_window_size"] = json!(200_000_000u32);
                value.to_string()
            },
        ),
        // Wrong family prefix.
        (
            "depth/deep/metadata.json".to_string(),
            movement_metadata("deep", &["2022-01-01"]).to_string(),
        ),
    ]
}

fn write_local(root: &Path) {
    for (key, body) in fixture_objects() {
        let path = root.join(&key);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }
}

async fn memory_backend() -> ObjectStorage {
    let store = Arc::new(InMemory::new());
    for (key, body) in fixture_objects() {
        store
            .put(&ObjectPath::from(key.as_str()), Bytes::from(body).into())
            .await
            .unwrap();
    }
    ObjectStorage::from_store(store, "test")
}

fn scenario_ids(catalog: &ScenarioCatalog) -> Vec<String> {
    let mut ids: Vec<String> = catalog
        .list_scenarios()
        .iter()
        .map(|s| s.scenario_id.clone())
        .collect();
    ids.sort();
    ids
}

#[tokio::test]
async fn test_local_catalog_skips_invalid_metadata() {
    let dir = tempfile::tempdir().unwrap();
    write_local(dir.path());
    let backend = LocalStorage::new(dir.path());

    let catalog = ScenarioCatalog::build(&backend, DatasetFamily::Movement).await;

    assert_eq!(scenario_ids(&catalog), vec!["demo", "second"]);
    assert_eq!(catalog.family(), DatasetFamily::Movement);

    let demo = catalog.get_scenario("demo").unwrap();
    assert_eq!(demo.anchors().unwrap().0.len(), 2);
    assert!(catalog.get_scenario("broken").is_none());
    assert!(catalog.get_scenario("endless").is_none());
    assert!(catalog.get_scenario("missing").is_none());
}

#[tokio::test]
async fn test_backends_build_identical_catalogs() {
    let dir = tempfile::tempdir().unwrap();
    write_local(dir.path());
    let local = LocalStorage::new(dir.path());
    let remote = memory_backend().await;

    let backends: [&dyn StorageBackend; 2] = [&local, &remote];
    let mut catalogs = Vec::new();
    for backend in backends {
        catalogs.push(ScenarioCatalog::build(backend, DatasetFamily::Movement).await);
    }

    assert_eq!(scenario_ids(&catalogs[0]), scenario_ids(&catalogs[1]));
    assert_eq!(
        catalogs[0].get_scenario("demo"),
        catalogs[1].get_scenario("demo")
    );
}

#[cfg(unix)]
#[tokio::test]
async fn test_local_catalog_survives_symlink_loop() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("movement/good/metadata.json");
    std::fs::create_dir_all(good.parent().unwrap()).unwrap();
    std::fs::write(&good, movement_metadata("good", &["2022-01-01"]).to_string()).unwrap();

    let loop_dir = dir.path().join("movement/zzz");
    std::fs::create_dir_all(&loop_dir).unwrap();
    std::os::unix::fs::symlink(dir.path().join("movement"), loop_dir.join("loop")).unwrap();

    let backend = LocalStorage::new(dir.path());
    let catalog = ScenarioCatalog::build(&backend, DatasetFamily::Movement).await;

    assert_eq!(catalog.len(), 1);
    assert!(catalog.get_scenario("good").is_some());
}

#[tokio::test]
async fn test_depth_family_rejects_movement_records() {
    let backend = memory_backend().await;
    let catalog = ScenarioCatalog::build(&backend, DatasetFamily::Depth).await;
    assert!(catalog.is_empty());
}

#[tokio::test]
async fn test_empty_backend_yields_empty_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let backend = LocalStorage::new(dir.path().join("missing"));
    let catalog = ScenarioCatalog::build(&backend, DatasetFamily::Movement).await;
    assert!(catalog.is_empty());
    assert_eq!(catalog.len(), 0);
}

#[tokio::test]
async fn test_local_array_store_opens_zarr_hierarchy() {
    use zarrs::array::{Array, ArrayBuilder, DataType, FillValue};
    use zarrs::array_subset::ArraySubset;
    use zarrs_filesystem::FilesystemStore;

    let dir = tempfile::tempdir().unwrap();
    let zarr_path = dir.path().join("movement/demo/matrices.zarr");
    std::fs::create_dir_all(&zarr_path).unwrap();

    let store = Arc::new(FilesystemStore::new(&zarr_path).unwrap());
    let array = ArrayBuilder::new(
        vec![2, 2],
        DataType::Float64,
        vec![2, 2].try_into().unwrap(),
        FillValue::from(f64::NAN),
    )
    .build(store.clone(), "/2022-01-01")
    .unwrap();
    array.store_metadata().unwrap();
    let subset = ArraySubset::new_with_start_shape(vec![0, 0], vec![2, 2]).unwrap();
    array
        .store_array_subset_elements(&subset, &[0.5, 0.5, 0.25, 0.75])
        .unwrap();

    let backend = LocalStorage::new(dir.path());
    let opened = backend
        .open_array_store("movement/demo/matrices.zarr")
        .await
        .ok()
        .unwrap();
    let read = Array::open(opened, "/2022-01-01").unwrap();
    assert_eq!(read.shape(), &[2, 2]);
}
