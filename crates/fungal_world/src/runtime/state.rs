//! World state management.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::geometry::CellPos;

use super::error::WorldError;
use super::events::DomainEvent;
use super::types::{BodyId, InsectId, ParticipantId, RegionId, ThreadId, WorldTime};

/// Terrain flavor of a region. Kinds only scale local rules; they never add
/// new transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionKind {
    Standard,
    /// Threads grown from this region mature at twice the base rate.
    GrowthBoost,
    /// No fungus body may bind here.
    BodyProhibited,
    /// Insects traverse cells of this region at twice their speed.
    InsectBoost,
    /// At most one thread may touch this region.
    SingleThread,
}

impl RegionKind {
    pub fn growth_rate_multiplier(self) -> f64 {
        match self {
            RegionKind::GrowthBoost => 2.0,
            _ => 1.0,
        }
    }

    pub fn body_prohibited(self) -> bool {
        matches!(self, RegionKind::BodyProhibited)
    }

    pub fn insect_speed_multiplier(self) -> f64 {
        match self {
            RegionKind::InsectBoost => 2.0,
            _ => 1.0,
        }
    }

    pub fn single_thread(self) -> bool {
        matches!(self, RegionKind::SingleThread)
    }
}

/// Spore flavor: consuming one grants the mapped status to the insect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SporeKind {
    Plain,
    Haste,
    Slowing,
    Paralyzing,
    Binding,
}

impl SporeKind {
    pub fn status_effect(self) -> Option<InsectStatus> {
        match self {
            SporeKind::Plain => None,
            SporeKind::Haste => Some(InsectStatus::Fast),
            SporeKind::Slowing => Some(InsectStatus::Slow),
            SporeKind::Paralyzing => Some(InsectStatus::Paralyzed),
            SporeKind::Binding => Some(InsectStatus::CutBlocked),
        }
    }
}

/// Exclusive occupant of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Occupant {
    Empty,
    Body(BodyId),
    Insect(InsectId),
    Spore(SporeKind),
}

impl Occupant {
    pub fn is_empty(self) -> bool {
        matches!(self, Occupant::Empty)
    }
}

/// One placeable grid position. Boundary positions between regions are never
/// materialized, so absence from the cell map means "not walkable".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub pos: CellPos,
    pub region_id: RegionId,
    pub occupant: Occupant,
    /// Endpoints of threads touching this cell, kept symmetric with the
    /// opposite endpoint's set.
    #[serde(default)]
    pub thread_neighbors: BTreeSet<CellPos>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub kind: RegionKind,
    pub cells: BTreeSet<CellPos>,
    pub neighbors: BTreeSet<RegionId>,
    pub body: Option<BodyId>,
    pub spore_count: u32,
    pub spore_threshold: u32,
}

/// A grown connection between one cell of each of two adjacent regions.
/// Traversable only once mature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub id: ThreadId,
    pub region_a: RegionId,
    pub region_b: RegionId,
    pub cell_a: CellPos,
    pub cell_b: CellPos,
    pub owner: ParticipantId,
    #[serde(default)]
    pub origin_body: Option<BodyId>,
    pub progress: f64,
    pub created_at: WorldTime,
    #[serde(default)]
    pub decay_at: Option<WorldTime>,
}

impl Thread {
    pub fn is_mature(&self) -> bool {
        self.progress >= 1.0
    }

    pub fn joins(&self, a: RegionId, b: RegionId) -> bool {
        (self.region_a == a && self.region_b == b) || (self.region_a == b && self.region_b == a)
    }

    pub fn touches_cell(&self, pos: CellPos) -> bool {
        self.cell_a == pos || self.cell_b == pos
    }

    pub fn touches_region(&self, region_id: RegionId) -> bool {
        self.region_a == region_id || self.region_b == region_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FungusBody {
    pub id: BodyId,
    pub owner: ParticipantId,
    pub region_id: RegionId,
    pub cell: CellPos,
    pub advanced: bool,
    pub releases_done: u32,
    pub release_limit: u32,
    pub next_release_at: WorldTime,
}

/// Behavioral state of an insect; each variant fixes a speed multiplier and
/// whether the insect may cut threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsectStatus {
    Normal,
    Fast,
    Slow,
    Paralyzed,
    CutBlocked,
}

impl InsectStatus {
    pub fn speed_multiplier(self) -> f64 {
        match self {
            InsectStatus::Normal | InsectStatus::CutBlocked => 1.0,
            InsectStatus::Fast => 2.0,
            InsectStatus::Slow => 0.5,
            InsectStatus::Paralyzed => 0.0,
        }
    }

    pub fn can_cut_threads(self) -> bool {
        !matches!(self, InsectStatus::Paralyzed | InsectStatus::CutBlocked)
    }

    /// Whether the status reverts to `Normal` on its own.
    pub fn is_timed(self) -> bool {
        !matches!(self, InsectStatus::Normal)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insect {
    pub id: InsectId,
    pub owner: ParticipantId,
    pub cell: CellPos,
    #[serde(default)]
    pub path: VecDeque<CellPos>,
    #[serde(default)]
    pub reserved_target: Option<CellPos>,
    pub status: InsectStatus,
    #[serde(default)]
    pub status_expires_at: Option<WorldTime>,
}

/// The mutable state of the world. Mutated only through
/// [`WorldState::apply_domain_event`], on the authority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    pub time: WorldTime,
    pub width: i32,
    pub height: i32,
    pub regions: BTreeMap<RegionId, Region>,
    pub cells: BTreeMap<CellPos, Cell>,
    #[serde(default)]
    pub threads: BTreeMap<ThreadId, Thread>,
    #[serde(default)]
    pub bodies: BTreeMap<BodyId, FungusBody>,
    #[serde(default)]
    pub insects: BTreeMap<InsectId, Insect>,
}

impl Default for WorldState {
    fn default() -> Self {
        Self {
            time: 0,
            width: 0,
            height: 0,
            regions: BTreeMap::new(),
            cells: BTreeMap::new(),
            threads: BTreeMap::new(),
            bodies: BTreeMap::new(),
            insects: BTreeMap::new(),
        }
    }
}

impl WorldState {
    pub fn cell(&self, pos: CellPos) -> Option<&Cell> {
        self.cells.get(&pos)
    }

    fn cell_mut(&mut self, pos: CellPos) -> Result<&mut Cell, WorldError> {
        self.cells
            .get_mut(&pos)
            .ok_or(WorldError::CellMissing { cell: pos })
    }

    fn region_mut(&mut self, region_id: RegionId) -> Result<&mut Region, WorldError> {
        self.regions
            .get_mut(&region_id)
            .ok_or(WorldError::RegionMissing { region_id })
    }

    fn insect_mut(&mut self, insect_id: InsectId) -> Result<&mut Insect, WorldError> {
        self.insects
            .get_mut(&insect_id)
            .ok_or(WorldError::InsectMissing { insect_id })
    }

    pub fn apply_domain_event(
        &mut self,
        event: &DomainEvent,
        _now: WorldTime,
    ) -> Result<(), WorldError> {
        match event {
            DomainEvent::ThreadCreated { thread } => {
                let (cell_a, cell_b) = (thread.cell_a, thread.cell_b);
                self.cell_mut(cell_a)?.thread_neighbors.insert(cell_b);
                self.cell_mut(cell_b)?.thread_neighbors.insert(cell_a);
                self.threads.insert(thread.id, thread.clone());
            }
            DomainEvent::ThreadProgressed {
                thread_id,
                progress,
            } => {
                let thread = self.threads.get_mut(thread_id).ok_or(
                    WorldError::ThreadMissing {
                        thread_id: *thread_id,
                    },
                )?;
                thread.progress = progress.clamp(0.0, 1.0);
            }
            DomainEvent::ThreadRemoved {
                thread_id,
                endpoint_a,
                endpoint_b,
                ..
            } => {
                self.threads.remove(thread_id);
                if let Ok(cell) = self.cell_mut(*endpoint_a) {
                    cell.thread_neighbors.remove(endpoint_b);
                }
                if let Ok(cell) = self.cell_mut(*endpoint_b) {
                    cell.thread_neighbors.remove(endpoint_a);
                }
            }
            DomainEvent::InsectSpawned { insect } => {
                self.cell_mut(insect.cell)?.occupant = Occupant::Insect(insect.id);
                self.insects.insert(insect.id, insect.clone());
            }
            DomainEvent::InsectPathAssigned {
                insect_id,
                path,
                target,
                released_target,
            } => {
                if let Some(released) = released_target {
                    let insect_cell = self.insects.get(insect_id).map(|i| i.cell);
                    let cell = self.cell_mut(*released)?;
                    if cell.occupant == Occupant::Insect(*insect_id)
                        && insect_cell != Some(*released)
                    {
                        cell.occupant = Occupant::Empty;
                    }
                }
                self.cell_mut(*target)?.occupant = Occupant::Insect(*insect_id);
                let insect = self.insect_mut(*insect_id)?;
                insect.path = path.iter().copied().collect();
                insect.reserved_target = Some(*target);
            }
            DomainEvent::InsectMoved {
                insect_id,
                from,
                to,
            } => {
                {
                    let cell = self.cell_mut(*from)?;
                    if cell.occupant == Occupant::Insect(*insect_id) {
                        cell.occupant = Occupant::Empty;
                    }
                }
                self.cell_mut(*to)?.occupant = Occupant::Insect(*insect_id);
                let insect = self.insect_mut(*insect_id)?;
                insect.cell = *to;
                if insect.path.front() == Some(to) {
                    insect.path.pop_front();
                }
                if insect.path.is_empty() && insect.reserved_target == Some(*to) {
                    insect.reserved_target = None;
                }
            }
            DomainEvent::InsectStatusChanged {
                insect_id,
                status,
                expires_at,
            } => {
                let insect = self.insect_mut(*insect_id)?;
                insect.status = *status;
                insect.status_expires_at = *expires_at;
            }
            DomainEvent::SporePlaced {
                region_id,
                cell,
                kind,
            } => {
                self.cell_mut(*cell)?.occupant = Occupant::Spore(*kind);
                let region = self.region_mut(*region_id)?;
                region.spore_count = region.spore_count.saturating_add(1);
            }
            DomainEvent::SporeConsumed {
                region_id, cell, ..
            } => {
                let slot = self.cell_mut(*cell)?;
                if matches!(slot.occupant, Occupant::Spore(_)) {
                    slot.occupant = Occupant::Empty;
                }
                let region = self.region_mut(*region_id)?;
                region.spore_count = region.spore_count.saturating_sub(1);
            }
            DomainEvent::BodyBound {
                region_id,
                body,
                cleared_spores,
            } => {
                for pos in cleared_spores {
                    let cell = self.cell_mut(*pos)?;
                    if matches!(cell.occupant, Occupant::Spore(_)) {
                        cell.occupant = Occupant::Empty;
                    }
                }
                self.cell_mut(body.cell)?.occupant = Occupant::Body(body.id);
                let region = self.region_mut(*region_id)?;
                region.body = Some(body.id);
                region.spore_count = 0;
                self.bodies.insert(body.id, body.clone());
            }
            DomainEvent::BodyUnbound {
                region_id,
                body_id,
                cell,
            } => {
                // Clear the cell before dropping the entity so no state ever
                // shows a despawned body still occupying its cell.
                {
                    let slot = self.cell_mut(*cell)?;
                    if slot.occupant == Occupant::Body(*body_id) {
                        slot.occupant = Occupant::Empty;
                    }
                }
                let region = self.region_mut(*region_id)?;
                if region.body == Some(*body_id) {
                    region.body = None;
                }
                self.bodies.remove(body_id);
            }
            DomainEvent::SporesReleased {
                body_id,
                releases_done,
                next_release_at,
            } => {
                let body = self
                    .bodies
                    .get_mut(body_id)
                    .ok_or(WorldError::BodyMissing { body_id: *body_id })?;
                body.releases_done = *releases_done;
                body.next_release_at = *next_release_at;
            }
            DomainEvent::RequestRejected { .. } => {}
        }
        Ok(())
    }
}
