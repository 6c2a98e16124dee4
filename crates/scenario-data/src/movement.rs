//! Movement-matrix extraction from a date-keyed Zarr hierarchy.
//!
//! `matrices.zarr` holds one 2-D array node per date, named `YYYY-MM-DD`.
//! Extraction walks the requested dates in order and keeps whichever exist.

use tracing::{debug, info, warn};
use zarrs::array::{Array, ArrayCreateError, DataType};
use zarrs::array_subset::ArraySubset;
use zarrs::storage::ReadableStorageTraits;

use fishflow_common::time::date_key;
use fishflow_common::{DataError, DataResult, DateRange, MovementMatrices, MovementMatrix};
use storage::{ArrayStore, ScenarioPath, StorageBackend};

/// Open the scenario's array store once and extract every date in `range`.
///
/// The zarrs API is synchronous, so extraction runs on the blocking pool.
/// The store handle moves into that task and is dropped when it ends,
/// whichever way it ends.
pub async fn load_movement_matrices(
    backend: &dyn StorageBackend,
    scenario_id: &str,
    range: DateRange,
) -> DataResult<MovementMatrices> {
    let key = ScenarioPath::matrices(scenario_id);
    let store = backend.open_array_store(&key).await?;

    let scenario_id = scenario_id.to_string();
    tokio::task::spawn_blocking(move || extract_matrices(store, &scenario_id, range))
        .await
        .map_err(|e| DataError::unavailable(key, format!("extraction task failed: {}", e)))?
}

/// Extract one matrix per date in `range`, ascending.
///
/// Dates without an entry, and entries that cannot be read as a 2-D numeric
/// matrix, are logged and skipped. An empty result is `NotFound`.
pub fn extract_matrices(
    store: ArrayStore,
    scenario_id: &str,
    range: DateRange,
) -> DataResult<MovementMatrices> {
    let mut matrices = Vec::new();

    for date in range.days() {
        let key = date_key(date);
        match read_matrix(&store, &key) {
            Ok(Some(matrix)) => {
                debug!(scenario_id = %scenario_id, date = %key, rows = matrix.len(), "Read matrix");
                matrices.push(MovementMatrix { date, matrix });
            }
            Ok(None) => {
                info!(scenario_id = %scenario_id, date = %key, "No matrix found for date");
            }
            Err(e) => {
                warn!(
                    scenario_id = %scenario_id,
                    date = %key,
                    error = %e,
                    "Skipping unreadable matrix"
                );
            }
        }
    }

    if matrices.is_empty() {
        return Err(DataError::not_found(format!(
            "matrices for {} to {} in {}",
            range.start, range.end, scenario_id
        )));
    }

    Ok(MovementMatrices {
        scenario_id: scenario_id.to_string(),
        start_date: range.start,
        end_date: range.end,
        matrices,
    })
}

/// Read the array node `/{key}` as a row-major matrix. `Ok(None)` when the
/// node does not exist.
fn read_matrix<S>(store: &std::sync::Arc<S>, key: &str) -> Result<Option<Vec<Vec<f64>>>, String>
where
    S: ?Sized + ReadableStorageTraits + 'static,
{
    let array = match Array::open(store.clone(), &format!("/{}", key)) {
        Ok(array) => array,
        Err(ArrayCreateError::MissingMetadata) => return Ok(None),
        Err(e) => return Err(e.to_string()),
    };

    let &[rows, cols] = array.shape() else {
        return Err(format!("expected a 2-D matrix, got shape {:?}", array.shape()));
    };

    let subset = ArraySubset::new_with_start_shape(vec![0, 0], vec![rows, cols])
        .map_err(|e| e.to_string())?;
    let values: Vec<f64> = match array.data_type() {
        DataType::Float64 => array
            .retrieve_array_subset_elements::<f64>(&subset)
            .map_err(|e| e.to_string())?,
        DataType::Float32 => array
            .retrieve_array_subset_elements::<f32>(&subset)
            .map_err(|e| e.to_string())?
            .into_iter()
            .map(f64::from)
            .collect(),
        other => return Err(format!("unsupported data type {:?}", other)),
    };

    if cols == 0 {
        return Ok(Some(vec![Vec::new(); rows as usize]));
    }

    Ok(Some(
        values
            .chunks(cols as usize)
            .map(|row| row.to_vec())
            .collect(),
    ))
}
