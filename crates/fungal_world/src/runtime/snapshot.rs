//! Snapshot and journal types for world state persistence.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::error::WorldError;
use super::events::{RequestEnvelope, WorldEvent};
use super::state::WorldState;
use super::types::{BodyId, InsectId, RequestId, ThreadId, WorldEventId};
use super::util::{read_json_from_path, write_json_to_path};

/// A complete snapshot of the authority at a point in time. Restoring a
/// snapshot plus the journal suffix reproduces the world exactly; only the
/// RNG stream position is reseeded, which never affects already-journaled
/// events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub state: WorldState,
    pub journal_len: usize,
    pub last_event_id: WorldEventId,
    pub next_request_id: RequestId,
    pub next_thread_id: ThreadId,
    pub next_body_id: BodyId,
    pub next_insect_id: InsectId,
    pub pending_requests: Vec<RequestEnvelope>,
    #[serde(default)]
    pub thread_growth: BTreeMap<ThreadId, f64>,
    #[serde(default)]
    pub move_budgets: BTreeMap<InsectId, f64>,
    pub rng_seed: u64,
}

impl Snapshot {
    pub fn to_json(&self) -> Result<String, WorldError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(input: &str) -> Result<Self, WorldError> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), WorldError> {
        write_json_to_path(self, path.as_ref())
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, WorldError> {
        read_json_from_path(path.as_ref())
    }
}

/// The ordered log of every world event since genesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Journal {
    pub events: Vec<WorldEvent>,
}

impl Journal {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn append(&mut self, event: WorldEvent) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), WorldError> {
        write_json_to_path(self, path.as_ref())
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, WorldError> {
        read_json_from_path(path.as_ref())
    }
}

impl Default for Journal {
    fn default() -> Self {
        Self::new()
    }
}
