//! Grid cell geometries and per-cell attributes.

use serde::{Deserialize, Serialize};

/// A GeoJSON polygon: linear rings of `[longitude, latitude]` positions, the
/// first ring exterior and the rest holes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolygonGeometry {
    #[serde(rename = "type")]
    pub type_: String,
    pub coordinates: Vec<Vec<[f64; 2]>>,
}

impl PolygonGeometry {
    pub fn new(coordinates: Vec<Vec<[f64; 2]>>) -> Self {
        Self {
            type_: "Polygon".to_string(),
            coordinates,
        }
    }

    /// Parse a GeoJSON geometry object.
    ///
    /// A missing `type` is read as `Polygon`; any other type is unsupported.
    pub fn from_geojson(value: &serde_json::Value) -> Result<Self, String> {
        #[derive(Deserialize)]
        struct RawPolygon {
            #[serde(rename = "type", default = "polygon_type")]
            type_: String,
            coordinates: Vec<Vec<Vec<f64>>>,
        }

        let raw: RawPolygon = serde_json::from_value(value.clone()).map_err(|e| e.to_string())?;
        if raw.type_ != "Polygon" {
            return Err(format!("unsupported geometry type {}", raw.type_));
        }

        let mut rings = Vec::with_capacity(raw.coordinates.len());
        for ring in raw.coordinates {
            let mut positions = Vec::with_capacity(ring.len());
            for position in ring {
                match position.as_slice() {
                    [lon, lat] => positions.push([*lon, *lat]),
                    other => {
                        return Err(format!(
                            "position must be [longitude, latitude], got {} values",
                            other.len()
                        ))
                    }
                }
            }
            rings.push(positions);
        }

        Ok(Self::new(rings))
    }
}

fn polygon_type() -> String {
    "Polygon".to_string()
}

/// A spatial partition unit with a stable integer identifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridCell {
    pub cell_id: i64,
    pub geometry: PolygonGeometry,
}

/// All grid cells of a scenario, ascending by `cell_id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridGeometries {
    pub scenario_id: String,
    pub geometries: Vec<GridCell>,
}

impl GridGeometries {
    pub fn cell_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.geometries.iter().map(|c| c.cell_id)
    }

    pub fn len(&self) -> usize {
        self.geometries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }
}

/// Maximum usable depth of each cell; index is the cell identifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellMaxDepths {
    pub scenario_id: String,
    pub max_depths: Vec<f64>,
}

impl CellMaxDepths {
    pub fn depth_of(&self, cell_id: i64) -> Option<f64> {
        usize::try_from(cell_id)
            .ok()
            .and_then(|i| self.max_depths.get(i))
            .copied()
    }
}
