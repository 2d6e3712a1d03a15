//! The fixed simulation tick. All autonomous transitions (growth, decay,
//! status expiry, movement, threshold body spawns) happen here, after the
//! tick's pending requests have been serialized in arrival order.

use crate::geometry::CellPos;

use super::super::error::WorldError;
use super::super::events::{CausedBy, DomainEvent, ThreadRemovalReason};
use super::super::state::{InsectStatus, Occupant};
use super::super::types::{InsectId, RegionId, ThreadId};
use super::World;

/// Progress is broadcast in tenth steps; the final step to 1.0 is exact so
/// maturity gating never depends on accumulated fractions.
const PROGRESS_STEP: f64 = 0.1;

impl World {
    pub fn step(&mut self) -> Result<(), WorldError> {
        self.state.time = self.state.time.saturating_add(1);

        while let Some(envelope) = self.pending_requests.pop_front() {
            self.process_request(envelope)?;
        }

        self.advance_thread_growth()?;
        self.decay_threads()?;
        self.expire_statuses()?;
        self.advance_insects()?;
        self.spawn_threshold_bodies()?;
        Ok(())
    }

    fn advance_thread_growth(&mut self) -> Result<(), WorldError> {
        let growing: Vec<(ThreadId, f64)> = self
            .state
            .threads
            .values()
            .filter(|thread| !thread.is_mature())
            .map(|thread| {
                let multiplier = self
                    .state
                    .regions
                    .get(&thread.region_a)
                    .map(|r| r.kind.growth_rate_multiplier())
                    .unwrap_or(1.0)
                    .max(
                        self.state
                            .regions
                            .get(&thread.region_b)
                            .map(|r| r.kind.growth_rate_multiplier())
                            .unwrap_or(1.0),
                    );
                (thread.id, multiplier)
            })
            .collect();

        let growth_ticks = self.sim.thread_growth_ticks.max(1) as f64;
        for (thread_id, multiplier) in growing {
            // The accumulator counts effective growth ticks in whole units
            // (multipliers are whole), so the maturity comparison is exact.
            let accumulated = self.thread_growth.entry(thread_id).or_insert(0.0);
            *accumulated += multiplier;
            let accumulated = *accumulated;

            let broadcast = self.state.threads[&thread_id].progress;
            let next = if accumulated >= growth_ticks {
                1.0
            } else {
                (accumulated * 10.0 / growth_ticks).floor() * PROGRESS_STEP
            };
            if next > broadcast {
                self.append_event(
                    DomainEvent::ThreadProgressed {
                        thread_id,
                        progress: next,
                    },
                    Some(CausedBy::Tick),
                )?;
            }
            if accumulated >= growth_ticks {
                self.thread_growth.remove(&thread_id);
            }
        }
        Ok(())
    }

    fn decay_threads(&mut self) -> Result<(), WorldError> {
        let now = self.state.time;
        let expired: Vec<(ThreadId, CellPos, CellPos)> = self
            .state
            .threads
            .values()
            .filter(|thread| thread.decay_at.map_or(false, |deadline| deadline <= now))
            .map(|thread| (thread.id, thread.cell_a, thread.cell_b))
            .collect();
        for (thread_id, endpoint_a, endpoint_b) in expired {
            self.thread_growth.remove(&thread_id);
            self.append_event(
                DomainEvent::ThreadRemoved {
                    thread_id,
                    endpoint_a,
                    endpoint_b,
                    reason: ThreadRemovalReason::Decayed,
                },
                Some(CausedBy::Tick),
            )?;
        }
        Ok(())
    }

    fn expire_statuses(&mut self) -> Result<(), WorldError> {
        let now = self.state.time;
        let expired: Vec<InsectId> = self
            .state
            .insects
            .values()
            .filter(|insect| {
                insect
                    .status_expires_at
                    .map_or(false, |deadline| deadline <= now)
            })
            .map(|insect| insect.id)
            .collect();
        for insect_id in expired {
            self.append_event(
                DomainEvent::InsectStatusChanged {
                    insect_id,
                    status: InsectStatus::Normal,
                    expires_at: None,
                },
                Some(CausedBy::Tick),
            )?;
        }
        Ok(())
    }

    /// Advance each insect along its queued path. Every hop is re-validated
    /// against current state - a thread may have decayed or a cell filled
    /// since the path was computed. Blocked insects stall in place and drop
    /// their accumulated budget; they do not replan.
    fn advance_insects(&mut self) -> Result<(), WorldError> {
        let moving: Vec<InsectId> = self
            .state
            .insects
            .values()
            .filter(|insect| !insect.path.is_empty())
            .map(|insect| insect.id)
            .collect();

        for insect_id in moving {
            let (status, cell) = {
                let insect = &self.state.insects[&insect_id];
                (insect.status, insect.cell)
            };
            let region_multiplier = self
                .state
                .cell(cell)
                .and_then(|c| self.state.regions.get(&c.region_id))
                .map(|r| r.kind.insect_speed_multiplier())
                .unwrap_or(1.0);
            let gained =
                self.sim.insect_base_speed * status.speed_multiplier() * region_multiplier;
            let budget = self.move_budgets.entry(insect_id).or_insert(0.0);
            *budget += gained;

            while self.move_budgets.get(&insect_id).copied().unwrap_or(0.0) >= 1.0 {
                let (from, next) = {
                    let insect = &self.state.insects[&insect_id];
                    match insect.path.front() {
                        Some(&next) => (insect.cell, next),
                        None => break,
                    }
                };
                if !self.hop_is_open(from, next, insect_id) {
                    self.move_budgets.insert(insect_id, 0.0);
                    break;
                }
                self.append_event(
                    DomainEvent::InsectMoved {
                        insect_id,
                        from,
                        to: next,
                    },
                    Some(CausedBy::Tick),
                )?;
                if let Some(budget) = self.move_budgets.get_mut(&insect_id) {
                    *budget -= 1.0;
                }
            }
        }
        Ok(())
    }

    fn hop_is_open(&self, from: CellPos, to: CellPos, insect_id: InsectId) -> bool {
        let Some(cell) = self.state.cell(to) else {
            return false;
        };
        match cell.occupant {
            Occupant::Empty => {}
            Occupant::Insect(id) if id == insect_id => {}
            _ => return false,
        }
        let grid_adjacent = from.orthogonal_neighbors().contains(&to);
        if grid_adjacent {
            return true;
        }
        self.state
            .crossing_thread(from, to)
            .map_or(false, |thread| thread.is_mature())
    }

    /// A region that has accumulated enough spores, has no body, allows one,
    /// and is reachable through at least one mature thread grows exactly one
    /// body, consuming its spores.
    fn spawn_threshold_bodies(&mut self) -> Result<(), WorldError> {
        let ready: Vec<RegionId> = self
            .state
            .regions
            .values()
            .filter(|region| {
                region.spore_count >= region.spore_threshold
                    && region.body.is_none()
                    && !region.kind.body_prohibited()
            })
            .map(|region| region.id)
            .collect();

        for region_id in ready {
            if !self.state.has_mature_thread(region_id) {
                continue;
            }
            let Some(cell) = self.choose_random_empty_cell(region_id) else {
                continue;
            };
            let spore_cells: Vec<CellPos> = self.state.regions[&region_id]
                .cells
                .iter()
                .copied()
                .filter(|pos| {
                    matches!(
                        self.state.cell(*pos).map(|c| c.occupant),
                        Some(Occupant::Spore(_))
                    )
                })
                .collect();
            let owner = self.authority_participant.clone();
            let body = self.build_body(owner, region_id, cell);
            self.append_event(
                DomainEvent::BodyBound {
                    region_id,
                    body,
                    cleared_spores: spore_cells,
                },
                Some(CausedBy::Tick),
            )?;
        }
        Ok(())
    }
}
