//! Tests for the runtime module.

use std::collections::BTreeSet;

use crate::config::SimConfig;
use crate::geometry::CellPos;

use super::state::{
    Cell, FungusBody, Insect, InsectStatus, Occupant, Region, RegionKind, SporeKind, Thread,
    WorldState,
};
use super::types::{BodyId, InsectId, RegionId, ThreadId};
use super::world::World;

mod growth;
mod mirror;
mod pathfinding;

pub(super) fn pos(x: i32, z: i32) -> CellPos {
    CellPos::new(x, z)
}

/// Fast-running tuning for tests: threads mature in 10 ticks, insects step
/// once per tick, decay stays far away unless a test shortens it.
pub(super) fn test_sim() -> SimConfig {
    SimConfig {
        thread_growth_ticks: 10,
        thread_decay_min_ticks: 100_000,
        thread_decay_max_ticks: 100_001,
        body_release_cooldown_ticks: 5,
        body_release_limit: 2,
        body_spore_amount: 3,
        advanced_bodies: false,
        status_duration_ticks: 10,
        insect_base_speed: 1.0,
        initial_insects_per_participant: 2,
        score_per_spore: 1,
    }
}

/// Two 3x3 regions separated by the border column x=3:
/// region 0 covers x 0..=2, region 1 covers x 4..=6, both z 0..=2.
pub(super) fn two_region_state() -> WorldState {
    let mut state = WorldState {
        time: 0,
        width: 7,
        height: 3,
        ..WorldState::default()
    };
    add_region(&mut state, RegionId(0), RegionKind::Standard, 0..=2);
    add_region(&mut state, RegionId(1), RegionKind::Standard, 4..=6);
    link_regions(&mut state, RegionId(0), RegionId(1));
    state
}

pub(super) fn add_region(
    state: &mut WorldState,
    id: RegionId,
    kind: RegionKind,
    xs: std::ops::RangeInclusive<i32>,
) {
    let mut cells = BTreeSet::new();
    for x in xs {
        for z in 0..=2 {
            let position = pos(x, z);
            cells.insert(position);
            state.cells.insert(
                position,
                Cell {
                    pos: position,
                    region_id: id,
                    occupant: Occupant::Empty,
                    thread_neighbors: BTreeSet::new(),
                },
            );
        }
    }
    state.regions.insert(
        id,
        Region {
            id,
            kind,
            cells,
            neighbors: BTreeSet::new(),
            body: None,
            spore_count: 0,
            spore_threshold: 5,
        },
    );
}

pub(super) fn link_regions(state: &mut WorldState, a: RegionId, b: RegionId) {
    state.regions.get_mut(&a).unwrap().neighbors.insert(b);
    state.regions.get_mut(&b).unwrap().neighbors.insert(a);
}

pub(super) fn world_with(state: WorldState) -> World {
    World::new_with_state(state, test_sim(), 42)
}

pub(super) fn place_insect(state: &mut WorldState, id: InsectId, owner: &str, at: CellPos) {
    state.cells.get_mut(&at).unwrap().occupant = Occupant::Insect(id);
    state.insects.insert(
        id,
        Insect {
            id,
            owner: owner.to_string(),
            cell: at,
            path: Default::default(),
            reserved_target: None,
            status: InsectStatus::Normal,
            status_expires_at: None,
        },
    );
}

pub(super) fn place_body(
    state: &mut WorldState,
    id: BodyId,
    owner: &str,
    region_id: RegionId,
    at: CellPos,
) {
    state.cells.get_mut(&at).unwrap().occupant = Occupant::Body(id);
    state.regions.get_mut(&region_id).unwrap().body = Some(id);
    state.bodies.insert(
        id,
        FungusBody {
            id,
            owner: owner.to_string(),
            region_id,
            cell: at,
            advanced: false,
            releases_done: 0,
            release_limit: 2,
            next_release_at: 0,
        },
    );
}

pub(super) fn place_spore(state: &mut WorldState, at: CellPos, kind: SporeKind) {
    let region_id = state.cells[&at].region_id;
    state.cells.get_mut(&at).unwrap().occupant = Occupant::Spore(kind);
    let region = state.regions.get_mut(&region_id).unwrap();
    region.spore_count += 1;
}

pub(super) fn place_thread(
    state: &mut WorldState,
    id: ThreadId,
    endpoint_a: CellPos,
    endpoint_b: CellPos,
    progress: f64,
) {
    let region_a = state.cells[&endpoint_a].region_id;
    let region_b = state.cells[&endpoint_b].region_id;
    state
        .cells
        .get_mut(&endpoint_a)
        .unwrap()
        .thread_neighbors
        .insert(endpoint_b);
    state
        .cells
        .get_mut(&endpoint_b)
        .unwrap()
        .thread_neighbors
        .insert(endpoint_a);
    state.threads.insert(
        id,
        Thread {
            id,
            region_a,
            region_b,
            cell_a: endpoint_a,
            cell_b: endpoint_b,
            owner: "tester".to_string(),
            origin_body: None,
            progress,
            created_at: 0,
            decay_at: None,
        },
    );
}

/// Occupancy audit used across scenarios: every cell has at most one
/// non-empty occupant by construction of the tag, and every entity's cell
/// back-reference agrees with the grid.
pub(super) fn assert_occupancy_consistent(state: &WorldState) {
    for insect in state.insects.values() {
        assert!(
            matches!(
                state.cells[&insect.cell].occupant,
                Occupant::Insect(id) if id == insect.id
            ),
            "insect {} not marked on its cell",
            insect.id
        );
    }
    for body in state.bodies.values() {
        assert_eq!(state.cells[&body.cell].occupant, Occupant::Body(body.id));
    }
    for cell in state.cells.values() {
        if let Occupant::Insect(id) = cell.occupant {
            let insect = state.insects.get(&id).expect("occupant insect exists");
            // A cell held by an insect is either its position or its
            // reservation.
            assert!(
                insect.cell == cell.pos || insect.reserved_target == Some(cell.pos),
                "stray reservation at {:?}",
                cell.pos
            );
        }
    }
}
