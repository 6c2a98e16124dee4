//! Depth-occupancy snapshot tables.
//!
//! One table per scenario and month, stored as gzip-compressed columnar JSON:
//!
//! ```text
//! {
//!   "timestamp":   ["2022-01-01T00:00:00+00:00", ...],
//!   "cell_id":     [0, ...],
//!   "depth_bin":   [25, ...],
//!   "probability": [0.12, ...]
//! }
//! ```
//!
//! A query selects one depth bin and pivots its rows by timestamp × cell.

use std::collections::{BTreeMap, HashMap};
use std::io::Read;

use chrono::{DateTime, FixedOffset, NaiveDate};
use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use tracing::info;

use fishflow_common::time::{format_timestamp, month_key, parse_timestamp};
use fishflow_common::{
    DataError, DataResult, OccupancyLayout, OccupancyPayload, OccupancyResult,
};
use storage::{ScenarioPath, StorageBackend};

/// Columnar occupancy snapshot table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OccupancyTable {
    pub timestamp: Vec<String>,
    pub cell_id: Vec<i64>,
    pub depth_bin: Vec<i64>,
    pub probability: Vec<f64>,
}

/// One table row.
#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyRow {
    pub timestamp: String,
    pub cell_id: i64,
    pub depth_bin: i64,
    pub probability: f64,
}

impl OccupancyTable {
    /// Decompress and parse a stored table.
    pub fn decode(key: &str, bytes: &[u8]) -> DataResult<Self> {
        let mut json = Vec::new();
        GzDecoder::new(bytes)
            .read_to_end(&mut json)
            .map_err(|e| DataError::malformed(key, format!("gzip: {}", e)))?;

        let table: Self = serde_json::from_slice(&json).map_err(|e| DataError::malformed(key, e))?;

        let rows = table.timestamp.len();
        if table.cell_id.len() != rows
            || table.depth_bin.len() != rows
            || table.probability.len() != rows
        {
            return Err(DataError::malformed(
                key,
                format!(
                    "column lengths differ: timestamp={} cell_id={} depth_bin={} probability={}",
                    rows,
                    table.cell_id.len(),
                    table.depth_bin.len(),
                    table.probability.len()
                ),
            ));
        }

        Ok(table)
    }

    pub fn from_rows(rows: &[OccupancyRow]) -> Self {
        let mut table = Self::default();
        for row in rows {
            table.timestamp.push(row.timestamp.clone());
            table.cell_id.push(row.cell_id);
            table.depth_bin.push(row.depth_bin);
            table.probability.push(row.probability);
        }
        table
    }

    pub fn len(&self) -> usize {
        self.timestamp.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamp.is_empty()
    }

    /// Row indices whose depth bin matches.
    pub fn rows_in_bin(&self, depth_bin: i64) -> Vec<usize> {
        self.depth_bin
            .iter()
            .enumerate()
            .filter(|(_, bin)| **bin == depth_bin)
            .map(|(i, _)| i)
            .collect()
    }

    /// Pivot the selected rows into the requested view.
    ///
    /// Timestamps are deduplicated and sorted ascending; cells keep the
    /// order in which they first appear. A repeated (timestamp, cell) pair
    /// has no single pivot value and is rejected.
    pub fn pivot(
        &self,
        key: &str,
        rows: &[usize],
        layout: OccupancyLayout,
    ) -> DataResult<OccupancyPayload> {
        let mut parsed: Vec<(DateTime<FixedOffset>, i64, f64)> = Vec::with_capacity(rows.len());
        for &i in rows {
            let ts = parse_timestamp(&self.timestamp[i]).map_err(|e| DataError::malformed(key, e))?;
            parsed.push((ts, self.cell_id[i], self.probability[i]));
        }

        let mut timestamps: Vec<DateTime<FixedOffset>> =
            parsed.iter().map(|(ts, _, _)| *ts).collect();
        timestamps.sort();
        timestamps.dedup();

        let mut cell_ids: Vec<i64> = Vec::new();
        let mut columns: HashMap<i64, usize> = HashMap::new();
        for (_, cell_id, _) in &parsed {
            columns.entry(*cell_id).or_insert_with(|| {
                cell_ids.push(*cell_id);
                cell_ids.len() - 1
            });
        }

        let mut matrix = vec![vec![None; cell_ids.len()]; timestamps.len()];
        for (ts, cell_id, probability) in &parsed {
            let row = timestamps
                .binary_search(ts)
                .map_err(|_| DataError::malformed(key, "timestamp index out of sync"))?;
            let column = columns[cell_id];
            if matrix[row][column].is_some() {
                return Err(DataError::malformed(
                    key,
                    format!("duplicate row for cell {} at {}", cell_id, format_timestamp(ts)),
                ));
            }
            matrix[row][column] = Some(*probability);
        }

        let timestamps: Vec<String> = timestamps.iter().map(format_timestamp).collect();

        Ok(match layout {
            OccupancyLayout::TimestampMajor => OccupancyPayload::TimestampMajor {
                timestamps,
                cell_ids,
                probabilities: matrix,
            },
            OccupancyLayout::CellMajor => {
                let cells: BTreeMap<i64, Vec<Option<f64>>> = cell_ids
                    .iter()
                    .enumerate()
                    .map(|(column, cell_id)| {
                        (*cell_id, matrix.iter().map(|row| row[column]).collect())
                    })
                    .collect();
                OccupancyPayload::CellMajor { timestamps, cells }
            }
        })
    }
}

/// Load one depth bin of the monthly table covering `month`.
///
/// A missing table and a table without rows for the bin are both absent,
/// but reported with different messages.
pub async fn load_occupancy(
    backend: &dyn StorageBackend,
    scenario_id: &str,
    month: NaiveDate,
    depth_bin: i64,
    layout: OccupancyLayout,
) -> DataResult<OccupancyResult> {
    let month_str = month_key(month);
    let key = ScenarioPath::occupancy_table(scenario_id, &month_str);

    let bytes = backend.read_bytes(&key).await.map_err(|e| {
        if e.is_not_found() {
            info!(scenario_id = %scenario_id, month = %month_str, "Occupancy table not found");
            DataError::not_found(format!("occupancy table {}", key))
        } else {
            e.into()
        }
    })?;

    let table = OccupancyTable::decode(&key, &bytes)?;
    let rows = table.rows_in_bin(depth_bin);
    if rows.is_empty() {
        info!(
            scenario_id = %scenario_id,
            month = %month_str,
            depth_bin,
            table_rows = table.len(),
            "No occupancy rows for depth bin"
        );
        return Err(DataError::not_found(format!(
            "rows for depth bin {} in {}",
            depth_bin, key
        )));
    }

    let data = table.pivot(&key, &rows, layout)?;

    Ok(OccupancyResult {
        scenario_id: scenario_id.to_string(),
        month,
        depth_bin,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(ts: &str, cell_id: i64, depth_bin: i64, probability: f64) -> OccupancyRow {
        OccupancyRow {
            timestamp: ts.to_string(),
            cell_id,
            depth_bin,
            probability,
        }
    }

    fn sample_table() -> OccupancyTable {
        OccupancyTable::from_rows(&[
            row("2022-01-01T01:00:00+00:00", 7, 25, 0.7),
            row("2022-01-01T00:00:00+00:00", 7, 25, 0.5),
            row("2022-01-01T00:00:00+00:00", 2, 25, 0.1),
            row("2022-01-01T01:00:00+00:00", 2, 25, 0.2),
            row("2022-01-01T00:00:00+00:00", 7, 50, 0.9),
        ])
    }

    #[test]
    fn test_timestamp_major_pivot() {
        let table = sample_table();
        let rows = table.rows_in_bin(25);
        let payload = table.pivot("t", &rows, OccupancyLayout::TimestampMajor).unwrap();

        match payload {
            OccupancyPayload::TimestampMajor {
                timestamps,
                cell_ids,
                probabilities,
            } => {
                assert_eq!(
                    timestamps,
                    vec!["2022-01-01T00:00:00+0000", "2022-01-01T01:00:00+0000"]
                );
                assert_eq!(cell_ids, vec![7, 2]);
                assert_eq!(
                    probabilities,
                    vec![vec![Some(0.5), Some(0.1)], vec![Some(0.7), Some(0.2)]]
                );
            }
            other => panic!("unexpected layout {:?}", other),
        }
    }

    #[test]
    fn test_cell_major_aligned_to_timestamps() {
        let table = sample_table();
        let rows = table.rows_in_bin(25);
        let payload = table.pivot("t", &rows, OccupancyLayout::CellMajor).unwrap();

        assert_eq!(payload.timestamps().len(), 2);
        assert_eq!(payload.series(7).unwrap(), vec![Some(0.5), Some(0.7)]);
        assert_eq!(payload.series(2).unwrap(), vec![Some(0.1), Some(0.2)]);
        assert!(payload.series(99).is_none());
    }

    #[test]
    fn test_both_views_agree() {
        let table = sample_table();
        let rows = table.rows_in_bin(25);
        let dense = table.pivot("t", &rows, OccupancyLayout::TimestampMajor).unwrap();
        let cells = table.pivot("t", &rows, OccupancyLayout::CellMajor).unwrap();

        assert_eq!(dense.timestamps(), cells.timestamps());
        for cell in [2, 7] {
            assert_eq!(dense.series(cell), cells.series(cell));
        }
    }

    #[test]
    fn test_missing_pair_is_none() {
        let table = OccupancyTable::from_rows(&[
            row("2022-01-01T00:00:00+00:00", 1, 25, 0.5),
            row("2022-01-01T01:00:00+00:00", 2, 25, 0.6),
        ]);
        let rows = table.rows_in_bin(25);
        let payload = table.pivot("t", &rows, OccupancyLayout::CellMajor).unwrap();
        assert_eq!(payload.series(1).unwrap(), vec![Some(0.5), None]);
        assert_eq!(payload.series(2).unwrap(), vec![None, Some(0.6)]);
    }

    #[test]
    fn test_duplicate_pair_rejected() {
        let table = OccupancyTable::from_rows(&[
            row("2022-01-01T00:00:00+00:00", 1, 25, 0.5),
            row("2022-01-01T00:00:00Z", 1, 25, 0.6),
        ]);
        let rows = table.rows_in_bin(25);
        let err = table.pivot("t", &rows, OccupancyLayout::TimestampMajor).unwrap_err();
        assert_eq!(err.kind(), "malformed");
    }

    #[test]
    fn test_offset_preserved() {
        let table = OccupancyTable::from_rows(&[row("2022-01-01T00:00:00-09:00", 1, 25, 0.5)]);
        let rows = table.rows_in_bin(25);
        let payload = table.pivot("t", &rows, OccupancyLayout::CellMajor).unwrap();
        assert_eq!(payload.timestamps(), &["2022-01-01T00:00:00-0900".to_string()]);
    }

    #[test]
    fn test_unparsable_timestamp_rejected() {
        let table = OccupancyTable::from_rows(&[row("noon", 1, 25, 0.5)]);
        let rows = table.rows_in_bin(25);
        assert!(table.pivot("t", &rows, OccupancyLayout::CellMajor).is_err());
    }

    #[test]
    fn test_decode_rejects_ragged_columns() {
        use flate2::{write::GzEncoder, Compression};
        use std::io::Write;

        let json = serde_json::json!({
            "timestamp": ["2022-01-01T00:00:00+00:00"],
            "cell_id": [1, 2],
            "depth_bin": [25],
            "probability": [0.5]
        });
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(json.to_string().as_bytes()).unwrap();
        let bytes = encoder.finish().unwrap();

        let err = OccupancyTable::decode("t", &bytes).unwrap_err();
        assert!(err.to_string().contains("column lengths differ"));
        assert!(OccupancyTable::decode("t", b"not gzip").is_err());
    }

    #[tokio::test]
    async fn test_empty_bin_and_missing_table_are_distinct() {
        use crate::testdata::{encode_occupancy_table, write_bytes};
        use storage::LocalStorage;

        let dir = tempfile::tempdir().unwrap();
        write_bytes(
            dir.path(),
            &ScenarioPath::occupancy_table("deep", "2022-01"),
            &encode_occupancy_table(&sample_table()).unwrap(),
        )
        .unwrap();
        let backend = LocalStorage::new(dir.path());
        let january = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        let february = NaiveDate::from_ymd_opt(2022, 2, 1).unwrap();

        let empty_bin =
            load_occupancy(&backend, "deep", january, 75, OccupancyLayout::TimestampMajor)
                .await
                .unwrap_err();
        let missing_table =
            load_occupancy(&backend, "deep", february, 25, OccupancyLayout::TimestampMajor)
                .await
                .unwrap_err();

        match (&empty_bin, &missing_table) {
            (DataError::NotFound(bin), DataError::NotFound(table)) => {
                assert_eq!(bin, "rows for depth bin 75 in depth/deep/2022-01.json.gz");
                assert_eq!(table, "occupancy table depth/deep/2022-02.json.gz");
            }
            other => panic!("expected two NotFound errors, got {:?}", other),
        }
        assert_ne!(empty_bin.to_string(), missing_table.to_string());

        let found = load_occupancy(&backend, "deep", january, 50, OccupancyLayout::CellMajor)
            .await
            .unwrap();
        assert_eq!(found.data.series(7).unwrap(), vec![Some(0.9)]);
    }
}
