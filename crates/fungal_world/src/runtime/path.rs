//! Occupancy-aware A* routing over the connectivity graph.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use crate::geometry::{manhattan_distance, CellPos};

use super::state::{Occupant, WorldState};
use super::types::InsectId;

/// Shortest walkable route from `start` to `target`, inclusive of both ends.
///
/// A neighbor is only expanded when the connecting thread, if the step is a
/// thread crossing, is mature, and when the cell is not held by another
/// entity. Cells held by `for_insect` itself (its current cell or an earlier
/// reservation) stay walkable. `None` is a normal outcome, not a fault.
pub fn find_path(
    state: &WorldState,
    start: CellPos,
    target: CellPos,
    for_insect: InsectId,
) -> Option<Vec<CellPos>> {
    if state.cell(start).is_none() || state.cell(target).is_none() {
        return None;
    }
    if start == target {
        return Some(vec![start]);
    }

    // (f-score, insertion sequence): equal f-scores dequeue in FIFO order.
    let mut open: BinaryHeap<(Reverse<(u32, u64)>, CellPos)> = BinaryHeap::new();
    let mut came_from: HashMap<CellPos, CellPos> = HashMap::new();
    let mut g_score: HashMap<CellPos, u32> = HashMap::new();
    let mut seq: u64 = 0;

    g_score.insert(start, 0);
    open.push((Reverse((manhattan_distance(start, target), seq)), start));

    while let Some((_, current)) = open.pop() {
        if current == target {
            return Some(reconstruct(&came_from, current));
        }
        let current_g = g_score[&current];

        for neighbor in state.cell_neighbors(current) {
            if !walkable(state, neighbor, for_insect) {
                continue;
            }
            if let Some(thread) = state.crossing_thread(current, neighbor) {
                if !thread.is_mature() {
                    continue;
                }
            }

            let tentative = current_g + 1;
            if g_score
                .get(&neighbor)
                .map_or(true, |&known| tentative < known)
            {
                came_from.insert(neighbor, current);
                g_score.insert(neighbor, tentative);
                seq += 1;
                let f = tentative + manhattan_distance(neighbor, target);
                open.push((Reverse((f, seq)), neighbor));
            }
        }
    }
    None
}

fn walkable(state: &WorldState, pos: CellPos, for_insect: InsectId) -> bool {
    match state.cell(pos).map(|c| c.occupant) {
        Some(Occupant::Empty) => true,
        // The requesting insect's own cells (current position, prior
        // reservation) stay walkable; everything else is held.
        Some(Occupant::Insect(id)) => id == for_insect,
        Some(_) | None => false,
    }
}

fn reconstruct(came_from: &HashMap<CellPos, CellPos>, mut current: CellPos) -> Vec<CellPos> {
    let mut path = vec![current];
    while let Some(&previous) = came_from.get(&current) {
        current = previous;
        path.push(current);
    }
    path.reverse();
    path
}
