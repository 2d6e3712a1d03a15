use serde::{Deserialize, Serialize};
use std::fmt;

/// A placeable grid coordinate. The vertical axis is `z` to match the
/// generated map's ground plane. Encoded as `"x,z"` so positions can key
/// serialized maps.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct CellPos {
    pub x: i32,
    pub z: i32,
}

impl CellPos {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// The four grid-adjacent positions, in fixed order.
    pub fn orthogonal_neighbors(self) -> [CellPos; 4] {
        [
            CellPos::new(self.x, self.z + 1),
            CellPos::new(self.x + 1, self.z),
            CellPos::new(self.x, self.z - 1),
            CellPos::new(self.x - 1, self.z),
        ]
    }
}

impl fmt::Display for CellPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.z)
    }
}

impl From<CellPos> for String {
    fn from(value: CellPos) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for CellPos {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let (x, z) = value
            .split_once(',')
            .ok_or_else(|| format!("invalid cell position: {value}"))?;
        let x = x
            .trim()
            .parse()
            .map_err(|_| format!("invalid cell x coordinate: {value}"))?;
        let z = z
            .trim()
            .parse()
            .map_err(|_| format!("invalid cell z coordinate: {value}"))?;
        Ok(CellPos { x, z })
    }
}

pub fn manhattan_distance(a: CellPos, b: CellPos) -> u32 {
    a.x.abs_diff(b.x) + a.z.abs_diff(b.z)
}

pub fn euclidean_distance(a: CellPos, b: CellPos) -> f64 {
    let dx = (a.x - b.x) as f64;
    let dz = (a.z - b.z) as f64;
    (dx * dx + dz * dz).sqrt()
}

/// Arithmetic mean position of a non-empty set of cells.
pub fn centroid(cells: &[CellPos]) -> (f64, f64) {
    let n = cells.len().max(1) as f64;
    let sum_x: f64 = cells.iter().map(|c| c.x as f64).sum();
    let sum_z: f64 = cells.iter().map(|c| c.z as f64).sum();
    (sum_x / n, sum_z / n)
}

pub fn distance_to_point(cell: CellPos, x: f64, z: f64) -> f64 {
    let dx = cell.x as f64 - x;
    let dz = cell.z as f64 - z;
    (dx * dx + dz * dz).sqrt()
}
