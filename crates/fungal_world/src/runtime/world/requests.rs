//! Request validation: each pending request becomes either domain events or a
//! single journaled rejection. Rejection never mutates state and is never
//! broadcast, so resubmitting an invalid request is harmless.

use rand::Rng;

use crate::geometry::CellPos;

use super::super::error::WorldError;
use super::super::events::{CausedBy, DomainEvent, RejectReason, Request, RequestEnvelope, ThreadRemovalReason};
use super::super::graph::select_thread_endpoints;
use super::super::path::find_path;
use super::super::state::{Occupant, Thread};
use super::super::types::{BodyId, InsectId, ParticipantId, RegionId, RequestId, ThreadId};
use super::World;

impl World {
    pub(super) fn process_request(&mut self, envelope: RequestEnvelope) -> Result<(), WorldError> {
        let request_id = envelope.id;
        match envelope.request {
            Request::ConnectRegions {
                region_a,
                region_b,
                owner,
            } => self.handle_connect(request_id, region_a, region_b, owner),
            Request::DisconnectThread { thread_id, cutter } => {
                self.handle_disconnect(request_id, thread_id, cutter)
            }
            Request::MoveInsect {
                insect_id,
                target,
                requester,
            } => self.handle_move(request_id, insect_id, target, requester),
            Request::ConsumeSpore {
                insect_id,
                cell,
                requester,
            } => self.handle_consume(request_id, insect_id, cell, requester),
            Request::SpawnBody { region_id, owner } => {
                self.handle_spawn_body(request_id, region_id, owner)
            }
            Request::ReleaseSpores { body_id, requester } => {
                self.handle_release_spores(request_id, body_id, requester)
            }
            Request::SpawnInsect {
                owner,
                region_id,
                near_body,
            } => self.handle_spawn_insect(request_id, owner, region_id, near_body),
        }
    }

    fn reject(&mut self, request_id: RequestId, reason: RejectReason) -> Result<(), WorldError> {
        self.append_event(
            DomainEvent::RequestRejected { request_id, reason },
            Some(CausedBy::Request(request_id)),
        )
    }

    fn handle_connect(
        &mut self,
        request_id: RequestId,
        region_a: RegionId,
        region_b: RegionId,
        owner: ParticipantId,
    ) -> Result<(), WorldError> {
        for region_id in [region_a, region_b] {
            if !self.state.regions.contains_key(&region_id) {
                return self.reject(request_id, RejectReason::RegionNotFound { region_id });
            }
        }
        if region_a == region_b {
            return self.reject(
                request_id,
                RejectReason::SelfConnection {
                    region_id: region_a,
                },
            );
        }
        if !self.state.regions[&region_a].neighbors.contains(&region_b) {
            return self.reject(request_id, RejectReason::NotAdjacent { region_a, region_b });
        }
        if self.state.thread_between(region_a, region_b).is_some() {
            return self.reject(request_id, RejectReason::ThreadExists { region_a, region_b });
        }
        for region_id in [region_a, region_b] {
            let region = &self.state.regions[&region_id];
            if region.kind.single_thread() && !self.state.threads_touching_region(region_id).is_empty()
            {
                return self.reject(request_id, RejectReason::ThreadLimitReached { region_id });
            }
        }

        let Some((cell_a, cell_b)) = select_thread_endpoints(&self.state, region_a, region_b)
        else {
            return self.reject(
                request_id,
                RejectReason::NoFreeCell {
                    region_id: Some(region_a),
                },
            );
        };

        let growth_multiplier = self.state.regions[&region_a]
            .kind
            .growth_rate_multiplier()
            .max(self.state.regions[&region_b].kind.growth_rate_multiplier());
        let growth_ticks =
            (self.sim.thread_growth_ticks as f64 / growth_multiplier).ceil() as u64;
        let decay_window = if self.sim.thread_decay_max_ticks > self.sim.thread_decay_min_ticks {
            self.rng
                .gen_range(self.sim.thread_decay_min_ticks..self.sim.thread_decay_max_ticks)
        } else {
            self.sim.thread_decay_min_ticks
        } as u64;

        let now = self.state.time;
        let thread = Thread {
            id: self.allocate_next_thread_id(),
            region_a,
            region_b,
            cell_a,
            cell_b,
            owner,
            origin_body: self.state.regions[&region_a].body,
            progress: 0.0,
            created_at: now,
            decay_at: Some(now + growth_ticks + decay_window),
        };
        self.thread_growth.insert(thread.id, 0.0);
        self.append_event(
            DomainEvent::ThreadCreated { thread },
            Some(CausedBy::Request(request_id)),
        )
    }

    fn handle_disconnect(
        &mut self,
        request_id: RequestId,
        thread_id: ThreadId,
        cutter: Option<InsectId>,
    ) -> Result<(), WorldError> {
        let Some(thread) = self.state.threads.get(&thread_id) else {
            return self.reject(request_id, RejectReason::ThreadNotFound { thread_id });
        };
        let (endpoint_a, endpoint_b) = (thread.cell_a, thread.cell_b);

        let reason = match cutter {
            None => ThreadRemovalReason::Disconnected,
            Some(insect_id) => {
                let Some(insect) = self.state.insects.get(&insect_id) else {
                    return self.reject(request_id, RejectReason::InsectNotFound { insect_id });
                };
                let status = insect.status;
                let insect_cell = insect.cell;
                if !status.can_cut_threads() {
                    return self.reject(request_id, RejectReason::CannotCutThreads { insect_id });
                }
                let neighbors = self.state.cell_neighbors(insect_cell);
                let nearby = insect_cell == endpoint_a
                    || insect_cell == endpoint_b
                    || neighbors.contains(&endpoint_a)
                    || neighbors.contains(&endpoint_b);
                if !nearby {
                    return self.reject(request_id, RejectReason::NotNearby { cell: insect_cell });
                }
                ThreadRemovalReason::Cut { by: insect_id }
            }
        };

        self.thread_growth.remove(&thread_id);
        self.append_event(
            DomainEvent::ThreadRemoved {
                thread_id,
                endpoint_a,
                endpoint_b,
                reason,
            },
            Some(CausedBy::Request(request_id)),
        )
    }

    fn handle_move(
        &mut self,
        request_id: RequestId,
        insect_id: InsectId,
        target: CellPos,
        requester: ParticipantId,
    ) -> Result<(), WorldError> {
        let Some(insect) = self.state.insects.get(&insect_id) else {
            return self.reject(request_id, RejectReason::InsectNotFound { insect_id });
        };
        if insect.owner != requester {
            return self.reject(
                request_id,
                RejectReason::NotOwner {
                    participant: requester,
                },
            );
        }
        let start = insect.cell;
        let previous_target = insect.reserved_target;

        let Some(target_cell) = self.state.cell(target) else {
            return self.reject(request_id, RejectReason::CellNotFound { cell: target });
        };
        match target_cell.occupant {
            Occupant::Empty => {}
            Occupant::Insect(id) if id == insect_id => {}
            _ => return self.reject(request_id, RejectReason::CellOccupied { cell: target }),
        }

        let Some(route) = find_path(&self.state, start, target, insect_id) else {
            return self.reject(
                request_id,
                RejectReason::NoPath {
                    from: start,
                    to: target,
                },
            );
        };

        // The terminal cell is reserved in the same atomic event that installs
        // the path, so a concurrent move to the same cell loses cleanly.
        self.append_event(
            DomainEvent::InsectPathAssigned {
                insect_id,
                path: route[1..].to_vec(),
                target,
                released_target: previous_target.filter(|&previous| previous != target),
            },
            Some(CausedBy::Request(request_id)),
        )
    }

    fn handle_consume(
        &mut self,
        request_id: RequestId,
        insect_id: InsectId,
        cell: CellPos,
        requester: ParticipantId,
    ) -> Result<(), WorldError> {
        let Some(insect) = self.state.insects.get(&insect_id) else {
            return self.reject(request_id, RejectReason::InsectNotFound { insect_id });
        };
        if insect.owner != requester {
            return self.reject(
                request_id,
                RejectReason::NotOwner {
                    participant: requester,
                },
            );
        }
        let insect_cell = insect.cell;
        let owner = insect.owner.clone();

        let Some(target_cell) = self.state.cell(cell) else {
            return self.reject(request_id, RejectReason::CellNotFound { cell });
        };
        let region_id = target_cell.region_id;
        let Occupant::Spore(kind) = target_cell.occupant else {
            return self.reject(request_id, RejectReason::NoSpore { cell });
        };
        if cell != insect_cell && !self.state.cell_neighbors(insect_cell).contains(&cell) {
            return self.reject(request_id, RejectReason::NotNearby { cell });
        }

        self.append_event(
            DomainEvent::SporeConsumed {
                insect_id,
                region_id,
                cell,
                kind,
                score_delta: self.sim.score_per_spore,
                owner,
            },
            Some(CausedBy::Request(request_id)),
        )?;

        if let Some(status) = kind.status_effect() {
            let expires_at = self.state.time + self.sim.status_duration_ticks as u64;
            self.append_event(
                DomainEvent::InsectStatusChanged {
                    insect_id,
                    status,
                    expires_at: Some(expires_at),
                },
                Some(CausedBy::Request(request_id)),
            )?;
        }
        Ok(())
    }

    fn handle_spawn_body(
        &mut self,
        request_id: RequestId,
        region_id: RegionId,
        owner: ParticipantId,
    ) -> Result<(), WorldError> {
        let Some(region) = self.state.regions.get(&region_id) else {
            return self.reject(request_id, RejectReason::RegionNotFound { region_id });
        };
        if region.body.is_some() {
            return self.reject(request_id, RejectReason::BodyAlreadyBound { region_id });
        }
        if region.kind.body_prohibited() {
            return self.reject(request_id, RejectReason::BodyProhibitedHere { region_id });
        }
        if !self.state.has_mature_thread(region_id) {
            return self.reject(request_id, RejectReason::NoMatureThread { region_id });
        }
        let Some(cell) = self.choose_random_empty_cell(region_id) else {
            return self.reject(
                request_id,
                RejectReason::NoFreeCell {
                    region_id: Some(region_id),
                },
            );
        };

        let body = self.build_body(owner, region_id, cell);
        self.append_event(
            DomainEvent::BodyBound {
                region_id,
                body,
                cleared_spores: Vec::new(),
            },
            Some(CausedBy::Request(request_id)),
        )
    }

    fn handle_release_spores(
        &mut self,
        request_id: RequestId,
        body_id: BodyId,
        requester: ParticipantId,
    ) -> Result<(), WorldError> {
        let Some(body) = self.state.bodies.get(&body_id) else {
            return self.reject(request_id, RejectReason::BodyNotFound { body_id });
        };
        if body.owner != requester {
            return self.reject(
                request_id,
                RejectReason::NotOwner {
                    participant: requester,
                },
            );
        }
        let now = self.state.time;
        if now < body.next_release_at {
            return self.reject(
                request_id,
                RejectReason::CooldownActive {
                    ready_at: body.next_release_at,
                },
            );
        }
        if body.releases_done >= body.release_limit {
            return self.reject(request_id, RejectReason::ReleasesExhausted { body_id });
        }

        let region_id = body.region_id;
        let body_cell = body.cell;
        let advanced = body.advanced;
        let releases_done = body.releases_done + 1;
        let release_limit = body.release_limit;
        let next_release_at = now + self.sim.body_release_cooldown_ticks as u64;

        self.append_event(
            DomainEvent::SporesReleased {
                body_id,
                releases_done,
                next_release_at,
            },
            Some(CausedBy::Request(request_id)),
        )?;

        let neighbors: Vec<RegionId> = self.state.regions[&region_id]
            .neighbors
            .iter()
            .copied()
            .collect();
        if !neighbors.is_empty() {
            for _ in 0..self.sim.body_spore_amount {
                let index = self.rng.gen_range(0..neighbors.len());
                let neighbor_id = neighbors[index];
                self.place_spore(request_id, neighbor_id)?;
                if advanced {
                    let second_degree: Vec<RegionId> = self.state.regions[&neighbor_id]
                        .neighbors
                        .iter()
                        .copied()
                        .filter(|&id| id != region_id)
                        .collect();
                    for second_id in second_degree {
                        self.place_spore(request_id, second_id)?;
                    }
                }
            }
        }

        if releases_done >= release_limit {
            self.append_event(
                DomainEvent::BodyUnbound {
                    region_id,
                    body_id,
                    cell: body_cell,
                },
                Some(CausedBy::Request(request_id)),
            )?;
            self.remove_orphaned_threads(body_id, request_id)?;
        }
        Ok(())
    }

    /// Place one spore on a random empty cell of the region; full regions are
    /// skipped silently, matching the benign-contention taxonomy.
    fn place_spore(&mut self, request_id: RequestId, region_id: RegionId) -> Result<(), WorldError> {
        let Some(cell) = self.choose_random_empty_cell(region_id) else {
            return Ok(());
        };
        let kind = self.roll_spore_kind();
        self.append_event(
            DomainEvent::SporePlaced {
                region_id,
                cell,
                kind,
            },
            Some(CausedBy::Request(request_id)),
        )
    }

    /// A despawned body takes its still-growing threads with it; mature ones
    /// persist until cut or decayed.
    fn remove_orphaned_threads(
        &mut self,
        body_id: BodyId,
        request_id: RequestId,
    ) -> Result<(), WorldError> {
        let orphaned: Vec<(ThreadId, CellPos, CellPos)> = self
            .state
            .threads
            .values()
            .filter(|thread| thread.origin_body == Some(body_id) && !thread.is_mature())
            .map(|thread| (thread.id, thread.cell_a, thread.cell_b))
            .collect();
        for (thread_id, endpoint_a, endpoint_b) in orphaned {
            self.thread_growth.remove(&thread_id);
            self.append_event(
                DomainEvent::ThreadRemoved {
                    thread_id,
                    endpoint_a,
                    endpoint_b,
                    reason: ThreadRemovalReason::OriginLost,
                },
                Some(CausedBy::Request(request_id)),
            )?;
        }
        Ok(())
    }

    fn handle_spawn_insect(
        &mut self,
        request_id: RequestId,
        owner: ParticipantId,
        region_id: Option<RegionId>,
        near_body: Option<BodyId>,
    ) -> Result<(), WorldError> {
        let cell = if let Some(body_id) = near_body {
            let Some(body) = self.state.bodies.get(&body_id) else {
                return self.reject(request_id, RejectReason::BodyNotFound { body_id });
            };
            let (region, anchor) = (body.region_id, body.cell);
            let Some(cell) = self.choose_empty_cell_near(region, anchor) else {
                return self.reject(
                    request_id,
                    RejectReason::NoFreeCell {
                        region_id: Some(region),
                    },
                );
            };
            cell
        } else if let Some(region_id) = region_id {
            if !self.state.regions.contains_key(&region_id) {
                return self.reject(request_id, RejectReason::RegionNotFound { region_id });
            }
            let Some(cell) = self.choose_random_empty_cell(region_id) else {
                return self.reject(
                    request_id,
                    RejectReason::NoFreeCell {
                        region_id: Some(region_id),
                    },
                );
            };
            cell
        } else {
            let candidates: Vec<RegionId> = self
                .state
                .regions
                .values()
                .filter(|region| {
                    region.cells.iter().any(|pos| {
                        self.state
                            .cell(*pos)
                            .map(|cell| cell.occupant.is_empty())
                            .unwrap_or(false)
                    })
                })
                .map(|region| region.id)
                .collect();
            if candidates.is_empty() {
                return self.reject(request_id, RejectReason::NoFreeCell { region_id: None });
            }
            let index = self.rng.gen_range(0..candidates.len());
            match self.choose_random_empty_cell(candidates[index]) {
                Some(cell) => cell,
                None => return self.reject(request_id, RejectReason::NoFreeCell { region_id: None }),
            }
        };

        let insect = self.build_insect(owner, cell);
        self.append_event(
            DomainEvent::InsectSpawned { insect },
            Some(CausedBy::Request(request_id)),
        )
    }
}
