//! Metadata catalog of the scenarios stored under a backend.

use std::collections::HashMap;

use futures::future::join_all;
use tracing::{info, warn};

use fishflow_common::{DatasetFamily, ScenarioSummary};

use crate::backend::StorageBackend;
use crate::layout::ScenarioPath;

/// Index of one family's scenarios, built once and read-only afterwards.
#[derive(Debug, Clone)]
pub struct ScenarioCatalog {
    family: DatasetFamily,
    scenarios: Vec<ScenarioSummary>,
    index: HashMap<String, usize>,
}

impl ScenarioCatalog {
    /// Discover and parse every scenario of `family` under the backend.
    ///
    /// A scenario whose metadata is missing or fails validation is skipped
    /// with a warning; the rest of the catalog is still usable.
    pub async fn build(backend: &dyn StorageBackend, family: DatasetFamily) -> Self {
        let keys = backend.list_keys(&ScenarioPath::family_prefix(family)).await;

        let mut scenario_ids: Vec<String> = Vec::new();
        for key in &keys {
            if let Some(id) = ScenarioPath::scenario_id_of(family, key) {
                if !scenario_ids.iter().any(|s| s == id) {
                    scenario_ids.push(id.to_string());
                }
            }
        }

        let reads = scenario_ids.iter().map(|id| async move {
            let key = ScenarioPath::metadata(family, id);
            (id, backend.read_bytes(&key).await)
        });

        let mut summaries = Vec::with_capacity(scenario_ids.len());
        for (dir_id, read) in join_all(reads).await {
            let bytes = match read {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(
                        family = %family,
                        scenario_id = %dir_id,
                        error = %e,
                        "Skipping scenario without readable metadata"
                    );
                    continue;
                }
            };

            let summary = match ScenarioSummary::from_metadata(family, &bytes) {
                Ok(summary) => summary,
                Err(e) => {
                    warn!(
                        family = %family,
                        scenario_id = %dir_id,
                        error = %e,
                        "Skipping scenario with invalid metadata"
                    );
                    continue;
                }
            };

            if summary.scenario_id != *dir_id {
                warn!(
                    family = %family,
                    scenario_id = %dir_id,
                    declared = %summary.scenario_id,
                    "Skipping scenario whose metadata names a different scenario_id"
                );
                continue;
            }

            info!(family = %family, scenario_id = %summary.scenario_id, "Loaded scenario");
            summaries.push(summary);
        }

        info!(
            family = %family,
            backend = %backend.describe(),
            count = summaries.len(),
            "Scenario catalog built"
        );

        Self::from_summaries(family, summaries)
    }

    /// Build a catalog from already-parsed summaries. Later duplicates of an
    /// identifier are dropped.
    pub fn from_summaries(family: DatasetFamily, summaries: Vec<ScenarioSummary>) -> Self {
        let mut scenarios = Vec::with_capacity(summaries.len());
        let mut index = HashMap::with_capacity(summaries.len());

        for summary in summaries {
            if index.contains_key(&summary.scenario_id) {
                warn!(
                    family = %family,
                    scenario_id = %summary.scenario_id,
                    "Ignoring duplicate scenario"
                );
                continue;
            }
            index.insert(summary.scenario_id.clone(), scenarios.len());
            scenarios.push(summary);
        }

        Self {
            family,
            scenarios,
            index,
        }
    }

    pub fn empty(family: DatasetFamily) -> Self {
        Self::from_summaries(family, Vec::new())
    }

    /// Scenarios in discovery order.
    pub fn list_scenarios(&self) -> &[ScenarioSummary] {
        &self.scenarios
    }

    pub fn get_scenario(&self, scenario_id: &str) -> Option<&ScenarioSummary> {
        self.index.get(scenario_id).map(|&i| &self.scenarios[i])
    }

    pub fn family(&self) -> DatasetFamily {
        self.family
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}
