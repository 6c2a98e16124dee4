//! Habitat-quality loading.
//!
//! Unlike geometries, habitat records are fail-closed: one malformed record
//! invalidates the whole document.

use serde_json::Value;

use fishflow_common::time::parse_date;
use fishflow_common::{AllHabitatQuality, DataError, DataResult, HabitatDataItem, ScenarioSummary};
use storage::{ScenarioPath, StorageBackend};

use crate::document::read_json;

/// Load every habitat record of a movement scenario, in stored order.
pub async fn load_habitat_quality(
    backend: &dyn StorageBackend,
    scenario: &ScenarioSummary,
) -> DataResult<AllHabitatQuality> {
    let key = ScenarioPath::habitat(&scenario.scenario_id);
    let document: Value = read_json(backend, &key).await?;
    let habitat_data = parse_habitat_records(&key, &document, scenario.grid_size)?;

    Ok(AllHabitatQuality {
        scenario_id: scenario.scenario_id.clone(),
        habitat_data,
    })
}

/// Parse a `[{date, r, probability[]}]` document.
///
/// `r` may be stored as a number or a numeric string. Every probability
/// sequence must hold exactly `grid_size` values. An empty document is
/// treated as absent data.
pub fn parse_habitat_records(
    key: &str,
    document: &Value,
    grid_size: usize,
) -> DataResult<Vec<HabitatDataItem>> {
    let records = document
        .as_array()
        .ok_or_else(|| DataError::malformed(key, "expected an array of habitat records"))?;

    if records.is_empty() {
        return Err(DataError::not_found(format!("habitat records in {}", key)));
    }

    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            parse_record(record, grid_size)
                .map_err(|reason| DataError::malformed(format!("{} record {}", key, i), reason))
        })
        .collect()
}

fn parse_record(record: &Value, grid_size: usize) -> Result<HabitatDataItem, String> {
    let date = record
        .get("date")
        .and_then(Value::as_str)
        .ok_or("missing 'date'")?;
    let date = parse_date(date).map_err(|e| e.to_string())?;

    let r = match record.get("r") {
        Some(Value::Number(n)) => n.as_f64().ok_or("'r' is not a finite number")?,
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("'r' is not numeric: {:?}", s))?,
        Some(other) => return Err(format!("'r' is not numeric: {}", other)),
        None => return Err("missing 'r'".to_string()),
    };

    let probability = record
        .get("probability")
        .and_then(Value::as_array)
        .ok_or("missing 'probability' array")?
        .iter()
        .map(|v| v.as_f64().ok_or_else(|| format!("non-numeric probability {}", v)))
        .collect::<Result<Vec<f64>, _>>()?;

    if probability.len() != grid_size {
        return Err(format!(
            "probability has {} values, grid has {} cells",
            probability.len(),
            grid_size
        ));
    }

    Ok(HabitatDataItem {
        date,
        r,
        probability,
    })
}
