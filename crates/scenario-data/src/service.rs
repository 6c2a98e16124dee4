//! Query facade over the catalogs and loaders.
//!
//! Every data operation resolves the scenario in the catalog first, then
//! runs its loader. Loader failures are logged here, once, at a level
//! matching their kind, and collapse into `None` for the caller.

use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use metrics::{counter, histogram};
use tracing::{error, info, warn};

use fishflow_common::{
    AllHabitatQuality, CellMaxDepths, DataError, DataResult, DatasetFamily, GridGeometries,
    MovementMatrices, OccupancyLayout, OccupancyResult, ScenarioSummary, ValidationError,
};
use storage::{ScenarioCatalog, StorageBackend};

use crate::availability::AvailabilityWindow;
use crate::cell_depths::load_cell_max_depths;
use crate::geometry::load_geometries;
use crate::habitat::load_habitat_quality;
use crate::movement::load_movement_matrices;
use crate::occupancy::load_occupancy;

/// Read-only query service shared by all requests.
#[derive(Clone)]
pub struct ScenarioDataService {
    backend: Arc<dyn StorageBackend>,
    movement: ScenarioCatalog,
    depth: ScenarioCatalog,
}

impl ScenarioDataService {
    pub fn new(
        backend: Arc<dyn StorageBackend>,
        movement: ScenarioCatalog,
        depth: ScenarioCatalog,
    ) -> Self {
        Self {
            backend,
            movement,
            depth,
        }
    }

    /// Build both catalogs from the backend.
    pub async fn load(backend: Arc<dyn StorageBackend>) -> Self {
        let (movement, depth) = tokio::join!(
            ScenarioCatalog::build(backend.as_ref(), DatasetFamily::Movement),
            ScenarioCatalog::build(backend.as_ref(), DatasetFamily::Depth),
        );
        Self::new(backend, movement, depth)
    }

    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    pub fn catalog(&self, family: DatasetFamily) -> &ScenarioCatalog {
        match family {
            DatasetFamily::Movement => &self.movement,
            DatasetFamily::Depth => &self.depth,
        }
    }

    pub fn list_movement_scenarios(&self) -> &[ScenarioSummary] {
        self.movement.list_scenarios()
    }

    pub fn list_depth_scenarios(&self) -> &[ScenarioSummary] {
        self.depth.list_scenarios()
    }

    /// Every scenario of both families, movement first.
    pub fn list_scenarios(&self) -> Vec<&ScenarioSummary> {
        self.movement
            .list_scenarios()
            .iter()
            .chain(self.depth.list_scenarios())
            .collect()
    }

    pub fn get_movement_scenario(&self, scenario_id: &str) -> Option<&ScenarioSummary> {
        self.movement.get_scenario(scenario_id)
    }

    pub fn get_depth_scenario(&self, scenario_id: &str) -> Option<&ScenarioSummary> {
        self.depth.get_scenario(scenario_id)
    }

    pub async fn get_geometries(
        &self,
        family: DatasetFamily,
        scenario_id: &str,
    ) -> Option<GridGeometries> {
        let started = Instant::now();
        let result = match self.resolve(family, scenario_id) {
            Ok(_) => load_geometries(self.backend.as_ref(), family, scenario_id).await,
            Err(e) => Err(e),
        };
        settle("geometries", scenario_id, started, result)
    }

    pub async fn get_habitat_quality(&self, scenario_id: &str) -> Option<AllHabitatQuality> {
        let started = Instant::now();
        let result = match self.resolve(DatasetFamily::Movement, scenario_id) {
            Ok(scenario) => load_habitat_quality(self.backend.as_ref(), scenario).await,
            Err(e) => Err(e),
        };
        settle("habitat", scenario_id, started, result)
    }

    /// Occupancy of one depth bin over the month containing `month`.
    pub async fn get_occupancy(
        &self,
        scenario_id: &str,
        month: NaiveDate,
        depth_bin: i64,
        layout: OccupancyLayout,
    ) -> Option<OccupancyResult> {
        let started = Instant::now();
        let result = match self.resolve(DatasetFamily::Depth, scenario_id) {
            Ok(_) => {
                load_occupancy(self.backend.as_ref(), scenario_id, month, depth_bin, layout).await
            }
            Err(e) => Err(e),
        };
        settle("occupancy", scenario_id, started, result)
    }

    pub async fn get_cell_max_depths(&self, scenario_id: &str) -> Option<CellMaxDepths> {
        let started = Instant::now();
        let result = match self.resolve(DatasetFamily::Depth, scenario_id) {
            Ok(_) => load_cell_max_depths(self.backend.as_ref(), scenario_id).await,
            Err(e) => Err(e),
        };
        settle("cell_depths", scenario_id, started, result)
    }

    /// Availability window of a movement scenario.
    pub fn availability(
        &self,
        scenario_id: &str,
    ) -> Result<Option<AvailabilityWindow>, ValidationError> {
        match self.movement.get_scenario(scenario_id) {
            Some(scenario) => AvailabilityWindow::for_scenario(scenario).map(Some),
            None => Ok(None),
        }
    }

    /// Movement matrices for every stored date in `start..=end`.
    ///
    /// The range is validated against the scenario's availability window
    /// before the array store is opened.
    pub async fn get_movement_matrices(
        &self,
        scenario_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<MovementMatrices>, ValidationError> {
        let started = Instant::now();

        let Some(scenario) = self.movement.get_scenario(scenario_id) else {
            return Ok(settle(
                "movement_matrices",
                scenario_id,
                started,
                Err(unknown_scenario(DatasetFamily::Movement, scenario_id)),
            ));
        };

        let checked =
            AvailabilityWindow::for_scenario(scenario).and_then(|w| w.validate(start, end));
        let range = match checked {
            Ok(range) => range,
            Err(e) => {
                info!(
                    scenario_id = %scenario_id,
                    start = %start,
                    end = %end,
                    parameter = e.parameter(),
                    error = %e,
                    "Rejected movement request"
                );
                record("movement_matrices", "invalid", started);
                return Err(e);
            }
        };

        let result = load_movement_matrices(self.backend.as_ref(), scenario_id, range).await;
        Ok(settle("movement_matrices", scenario_id, started, result))
    }

    fn resolve(&self, family: DatasetFamily, scenario_id: &str) -> DataResult<&ScenarioSummary> {
        self.catalog(family)
            .get_scenario(scenario_id)
            .ok_or_else(|| unknown_scenario(family, scenario_id))
    }
}

impl std::fmt::Debug for ScenarioDataService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioDataService")
            .field("backend", &self.backend.describe())
            .field("movement_scenarios", &self.movement.len())
            .field("depth_scenarios", &self.depth.len())
            .finish()
    }
}

fn unknown_scenario(family: DatasetFamily, scenario_id: &str) -> DataError {
    DataError::not_found(format!("{} scenario {}", family, scenario_id))
}

/// Log a loader failure by kind and collapse it into `None`.
fn settle<T>(
    operation: &'static str,
    scenario_id: &str,
    started: Instant,
    result: DataResult<T>,
) -> Option<T> {
    match result {
        Ok(value) => {
            record(operation, "ok", started);
            Some(value)
        }
        Err(e) => {
            match &e {
                DataError::NotFound(_) => {
                    info!(operation, scenario_id = %scenario_id, error = %e, "No data")
                }
                DataError::Malformed { .. } => {
                    warn!(operation, scenario_id = %scenario_id, error = %e, "Malformed data")
                }
                DataError::Unavailable { .. } => {
                    error!(operation, scenario_id = %scenario_id, error = %e, "Storage unavailable")
                }
            }
            record(operation, e.kind(), started);
            None
        }
    }
}

fn record(operation: &'static str, outcome: &'static str, started: Instant) {
    counter!("fishflow_queries_total", "operation" => operation, "outcome" => outcome).increment(1);
    histogram!("fishflow_query_duration_ms", "operation" => operation)
        .record(started.elapsed().as_secs_f64() * 1000.0);
}
