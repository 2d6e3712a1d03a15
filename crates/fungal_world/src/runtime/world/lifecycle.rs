//! Spawn policies and world bootstrap.

use rand::Rng;

use crate::geometry::{euclidean_distance, CellPos};

use super::super::error::WorldError;
use super::super::events::{CausedBy, DomainEvent};
use super::super::state::{FungusBody, Insect, InsectStatus, SporeKind};
use super::super::types::{ParticipantId, RegionId};
use super::World;

impl World {
    /// Uniformly random empty cell of a region, or `None` when the region is
    /// full.
    pub(super) fn choose_random_empty_cell(&mut self, region_id: RegionId) -> Option<CellPos> {
        let empty: Vec<CellPos> = self.empty_cells_of(region_id);
        if empty.is_empty() {
            return None;
        }
        let index = self.rng.gen_range(0..empty.len());
        Some(empty[index])
    }

    /// Empty cell of a region closest to `anchor`; distance ties resolve to
    /// the lowest coordinate because region cells iterate in order.
    pub(super) fn choose_empty_cell_near(
        &mut self,
        region_id: RegionId,
        anchor: CellPos,
    ) -> Option<CellPos> {
        let mut best: Option<(CellPos, f64)> = None;
        for pos in self.empty_cells_of(region_id) {
            let distance = euclidean_distance(pos, anchor);
            match best {
                Some((_, best_distance)) if distance >= best_distance => {}
                _ => best = Some((pos, distance)),
            }
        }
        best.map(|(pos, _)| pos)
    }

    fn empty_cells_of(&self, region_id: RegionId) -> Vec<CellPos> {
        let Some(region) = self.state.regions.get(&region_id) else {
            return Vec::new();
        };
        region
            .cells
            .iter()
            .copied()
            .filter(|pos| {
                self.state
                    .cell(*pos)
                    .map(|cell| cell.occupant.is_empty())
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Random region satisfying `predicate`, if any.
    pub(super) fn choose_random_region(
        &mut self,
        predicate: impl Fn(&crate::runtime::Region) -> bool,
    ) -> Option<RegionId> {
        let candidates: Vec<RegionId> = self
            .state
            .regions
            .values()
            .filter(|region| predicate(region))
            .map(|region| region.id)
            .collect();
        if candidates.is_empty() {
            return None;
        }
        let index = self.rng.gen_range(0..candidates.len());
        Some(candidates[index])
    }

    pub(super) fn roll_spore_kind(&mut self) -> SporeKind {
        if self.rng.gen_bool(0.5) {
            return SporeKind::Plain;
        }
        match self.rng.gen_range(0..4u8) {
            0 => SporeKind::Haste,
            1 => SporeKind::Slowing,
            2 => SporeKind::Paralyzing,
            _ => SporeKind::Binding,
        }
    }

    pub(super) fn build_body(
        &mut self,
        owner: ParticipantId,
        region_id: RegionId,
        cell: CellPos,
    ) -> FungusBody {
        FungusBody {
            id: self.allocate_next_body_id(),
            owner,
            region_id,
            cell,
            advanced: self.sim.advanced_bodies,
            releases_done: 0,
            release_limit: self.sim.body_release_limit,
            next_release_at: self.state.time,
        }
    }

    pub(super) fn build_insect(&mut self, owner: ParticipantId, cell: CellPos) -> Insect {
        Insect {
            id: self.allocate_next_insect_id(),
            owner,
            cell,
            path: Default::default(),
            reserved_target: None,
            status: InsectStatus::Normal,
            status_expires_at: None,
        }
    }

    /// Seed the starting entities. Runs before any request is accepted, so
    /// the mature-thread requirement for body binding does not apply yet; a
    /// fresh world would otherwise never produce a first body.
    pub(super) fn bootstrap(&mut self, participants: &[ParticipantId]) -> Result<(), WorldError> {
        for participant in participants {
            let body_region = self.choose_random_region(|region| {
                !region.kind.body_prohibited() && region.body.is_none() && !region.cells.is_empty()
            });
            if let Some(region_id) = body_region {
                if let Some(cell) = self.choose_random_empty_cell(region_id) {
                    let body = self.build_body(participant.clone(), region_id, cell);
                    self.append_event(
                        DomainEvent::BodyBound {
                            region_id,
                            body,
                            cleared_spores: Vec::new(),
                        },
                        Some(CausedBy::Bootstrap),
                    )?;
                }
            }

            for _ in 0..self.sim.initial_insects_per_participant {
                let Some(region_id) = self.choose_random_region(|region| !region.cells.is_empty())
                else {
                    break;
                };
                let Some(cell) = self.choose_random_empty_cell(region_id) else {
                    continue;
                };
                let insect = self.build_insect(participant.clone(), cell);
                self.append_event(
                    DomainEvent::InsectSpawned { insect },
                    Some(CausedBy::Bootstrap),
                )?;
            }
        }
        Ok(())
    }
}
