//! The World struct - the authority-side runtime.

mod lifecycle;
mod persistence;
mod requests;
mod step;

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{BTreeMap, VecDeque};

use crate::config::SimConfig;
use crate::worldgen::{self, derive_seed, WorldGenConfig};

use super::error::WorldError;
use super::events::{CausedBy, DomainEvent, Request, RequestEnvelope, WorldEvent};
use super::snapshot::Journal;
use super::state::WorldState;
use super::types::{BodyId, InsectId, ParticipantId, RequestId, ThreadId, WorldEventId};

const AUTHORITY_RNG_SALT: u64 = 0x03;

/// The single writer for all shared world state. Every mutation flows through
/// [`World::append_event`]; mirrors only ever see the resulting events.
#[derive(Debug)]
pub struct World {
    sim: SimConfig,
    state: WorldState,
    journal: Journal,
    pending_requests: VecDeque<RequestEnvelope>,
    next_event_id: WorldEventId,
    next_request_id: RequestId,
    next_thread_id: ThreadId,
    next_body_id: BodyId,
    next_insect_id: InsectId,
    /// Fractional thread growth between broadcast progress steps.
    thread_growth: BTreeMap<ThreadId, f64>,
    /// Fractional movement accumulated per insect; one whole unit buys one
    /// cell step. Authority-local pacing state, not replicated.
    move_budgets: BTreeMap<InsectId, f64>,
    /// Identity owning world-grown entities such as threshold bodies.
    authority_participant: ParticipantId,
    rng_seed: u64,
    rng: StdRng,
}

impl World {
    pub fn new_with_state(state: WorldState, sim: SimConfig, seed: u64) -> Self {
        let rng_seed = derive_seed(seed, AUTHORITY_RNG_SALT);
        // Allocators resume past any pre-seeded entities so ids never collide.
        let next_thread_id = state.threads.keys().max().map_or(1, |max| max + 1);
        let next_body_id = state.bodies.keys().max().map_or(1, |max| max + 1);
        let next_insect_id = state.insects.keys().max().map_or(1, |max| max + 1);
        Self {
            sim,
            state,
            journal: Journal::new(),
            pending_requests: VecDeque::new(),
            next_event_id: 1,
            next_request_id: 1,
            next_thread_id,
            next_body_id,
            next_insect_id,
            thread_growth: BTreeMap::new(),
            move_budgets: BTreeMap::new(),
            authority_participant: "authority".to_string(),
            rng_seed,
            rng: StdRng::seed_from_u64(rng_seed),
        }
    }

    /// Generate a fresh world and bootstrap the starting entities: one fungus
    /// body plus the configured insects for every participant, journaled so a
    /// snapshot taken afterwards carries the complete starting state.
    pub fn generate(
        gen: &WorldGenConfig,
        sim: SimConfig,
        participants: &[ParticipantId],
    ) -> Result<Self, WorldError> {
        let state = worldgen::generate_state(gen)?;
        let mut world = Self::new_with_state(state, sim, gen.seed);
        world.bootstrap(participants)?;
        Ok(world)
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    pub fn state(&self) -> &WorldState {
        &self.state
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    pub fn sim_config(&self) -> &SimConfig {
        &self.sim
    }

    pub fn pending_requests_len(&self) -> usize {
        self.pending_requests.len()
    }

    // ---------------------------------------------------------------------
    // Request submission
    // ---------------------------------------------------------------------

    pub fn submit_request(&mut self, request: Request) -> RequestId {
        let request_id = self.allocate_next_request_id();
        self.pending_requests.push_back(RequestEnvelope {
            id: request_id,
            request,
        });
        request_id
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    pub(crate) fn append_event(
        &mut self,
        body: DomainEvent,
        caused_by: Option<CausedBy>,
    ) -> Result<(), WorldError> {
        self.state.apply_domain_event(&body, self.state.time)?;
        let id = self.next_event_id;
        self.next_event_id = self.next_event_id.saturating_add(1);
        self.journal.append(WorldEvent {
            id,
            time: self.state.time,
            caused_by,
            body,
        });
        Ok(())
    }

    pub(super) fn replay_from(&mut self, start_index: usize) -> Result<(), WorldError> {
        let events: Vec<WorldEvent> = self.journal.events[start_index..].to_vec();
        for event in events {
            self.state.apply_domain_event(&event.body, event.time)?;
            self.state.time = event.time;
            self.next_event_id = self.next_event_id.max(event.id.saturating_add(1));
        }
        Ok(())
    }

    fn allocate_next_request_id(&mut self) -> RequestId {
        let allocated = self.next_request_id;
        self.next_request_id = self.next_request_id.saturating_add(1);
        allocated
    }

    pub(super) fn allocate_next_thread_id(&mut self) -> ThreadId {
        let allocated = self.next_thread_id;
        self.next_thread_id = self.next_thread_id.saturating_add(1);
        allocated
    }

    pub(super) fn allocate_next_body_id(&mut self) -> BodyId {
        let allocated = self.next_body_id;
        self.next_body_id = self.next_body_id.saturating_add(1);
        allocated
    }

    pub(super) fn allocate_next_insect_id(&mut self) -> InsectId {
        let allocated = self.next_insect_id;
        self.next_insect_id = self.next_insect_id.saturating_add(1);
        allocated
    }
}
