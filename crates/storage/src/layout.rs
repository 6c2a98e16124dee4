//! Key layout of persisted scenario datasets.
//!
//! ```text
//! movement/{scenario_id}/metadata.json
//! movement/{scenario_id}/geometries.geojson
//! movement/{scenario_id}/habitat.json
//! movement/{scenario_id}/matrices.zarr/{YYYY-MM-DD}/...
//! depth/{scenario_id}/metadata.json
//! depth/{scenario_id}/geometries.geojson
//! depth/{scenario_id}/cell_depths.json
//! depth/{scenario_id}/{YYYY-MM}.json.gz
//! ```

use fishflow_common::DatasetFamily;

/// Path builder for consistent storage layout.
pub struct ScenarioPath;

impl ScenarioPath {
    /// Prefix under which every scenario of a family lives.
    pub fn family_prefix(family: DatasetFamily) -> String {
        format!("{}/", family.prefix())
    }

    pub fn metadata(family: DatasetFamily, scenario_id: &str) -> String {
        format!("{}/{}/metadata.json", family.prefix(), scenario_id)
    }

    pub fn geometries(family: DatasetFamily, scenario_id: &str) -> String {
        format!("{}/{}/geometries.geojson", family.prefix(), scenario_id)
    }

    pub fn habitat(scenario_id: &str) -> String {
        format!("{}/{}/habitat.json", DatasetFamily::Movement.prefix(), scenario_id)
    }

    pub fn matrices(scenario_id: &str) -> String {
        format!("{}/{}/matrices.zarr", DatasetFamily::Movement.prefix(), scenario_id)
    }

    pub fn cell_depths(scenario_id: &str) -> String {
        format!("{}/{}/cell_depths.json", DatasetFamily::Depth.prefix(), scenario_id)
    }

    /// Monthly occupancy table; `month` is a `YYYY-MM` key.
    pub fn occupancy_table(scenario_id: &str, month: &str) -> String {
        format!("{}/{}/{}.json.gz", DatasetFamily::Depth.prefix(), scenario_id, month)
    }

    /// Scenario identifier of a key: its second path segment, provided the
    /// key sits under the family prefix and names a file inside a scenario.
    pub fn scenario_id_of(family: DatasetFamily, key: &str) -> Option<&str> {
        let mut parts = key.split('/');
        let top = parts.next()?;
        let scenario_id = parts.next()?;
        let rest = parts.next()?;

        if top != family.prefix() || scenario_id.is_empty() || rest.is_empty() {
            return None;
        }
        Some(scenario_id)
    }
}
