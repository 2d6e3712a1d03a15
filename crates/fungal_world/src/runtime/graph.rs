//! Connectivity queries over the base grid adjacency plus grown threads.

use crate::geometry::{distance_to_point, euclidean_distance, CellPos};

use super::state::{Thread, WorldState};
use super::types::RegionId;

/// Tolerance when collecting cell pairs tied for the minimum cross-region
/// distance.
const ENDPOINT_EPSILON: f64 = 1e-6;

impl WorldState {
    /// Walkable neighbors of a cell: the grid-adjacent cells that exist
    /// (boundary positions are never materialized) plus thread endpoints.
    pub fn cell_neighbors(&self, pos: CellPos) -> Vec<CellPos> {
        let Some(cell) = self.cell(pos) else {
            return Vec::new();
        };
        let mut neighbors: Vec<CellPos> = pos
            .orthogonal_neighbors()
            .into_iter()
            .filter(|p| self.cells.contains_key(p))
            .collect();
        for linked in &cell.thread_neighbors {
            if !neighbors.contains(linked) && self.cells.contains_key(linked) {
                neighbors.push(*linked);
            }
        }
        neighbors
    }

    /// The thread whose endpoints are exactly `from` and `to`, if the step
    /// between them is a thread crossing rather than grid adjacency.
    pub fn crossing_thread(&self, from: CellPos, to: CellPos) -> Option<&Thread> {
        self.threads
            .values()
            .find(|t| (t.cell_a == from && t.cell_b == to) || (t.cell_a == to && t.cell_b == from))
    }

    pub fn thread_between(&self, a: RegionId, b: RegionId) -> Option<&Thread> {
        self.threads.values().find(|t| t.joins(a, b))
    }

    pub fn threads_touching_region(&self, region_id: RegionId) -> Vec<&Thread> {
        self.threads
            .values()
            .filter(|t| t.touches_region(region_id))
            .collect()
    }

    pub fn has_mature_thread(&self, region_id: RegionId) -> bool {
        self.threads
            .values()
            .any(|t| t.touches_region(region_id) && t.is_mature())
    }
}

/// Choose the cell pair a new thread between two adjacent regions should
/// anchor to: among all cross-region pairs at the minimum Euclidean distance,
/// take from each side the candidate closest to that side's candidate
/// centroid, so ties resolve to the geometric middle of the shared border
/// rather than to iteration order.
pub fn select_thread_endpoints(
    state: &WorldState,
    region_a: RegionId,
    region_b: RegionId,
) -> Option<(CellPos, CellPos)> {
    let cells_a: Vec<CellPos> = state.regions.get(&region_a)?.cells.iter().copied().collect();
    let cells_b: Vec<CellPos> = state.regions.get(&region_b)?.cells.iter().copied().collect();
    if cells_a.is_empty() || cells_b.is_empty() {
        return None;
    }

    let mut min_distance = f64::MAX;
    for &a in &cells_a {
        for &b in &cells_b {
            let distance = euclidean_distance(a, b);
            if distance < min_distance {
                min_distance = distance;
            }
        }
    }

    let mut candidates_a: Vec<CellPos> = Vec::new();
    let mut candidates_b: Vec<CellPos> = Vec::new();
    for &a in &cells_a {
        for &b in &cells_b {
            if euclidean_distance(a, b) <= min_distance + ENDPOINT_EPSILON {
                if !candidates_a.contains(&a) {
                    candidates_a.push(a);
                }
                if !candidates_b.contains(&b) {
                    candidates_b.push(b);
                }
            }
        }
    }

    Some((
        closest_to_centroid(&candidates_a)?,
        closest_to_centroid(&candidates_b)?,
    ))
}

fn closest_to_centroid(candidates: &[CellPos]) -> Option<CellPos> {
    let (cx, cz) = crate::geometry::centroid(candidates);
    let mut best: Option<(CellPos, f64)> = None;
    for &candidate in candidates {
        let distance = distance_to_point(candidate, cx, cz);
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((candidate, distance)),
        }
    }
    best.map(|(cell, _)| cell)
}
