use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use super::super::error::WorldError;
use super::super::snapshot::{Journal, Snapshot};
use super::World;

const JOURNAL_FILE: &str = "journal.json";
const SNAPSHOT_FILE: &str = "snapshot.json";

impl World {
    // ---------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            state: self.state.clone(),
            journal_len: self.journal.len(),
            last_event_id: self.next_event_id.saturating_sub(1),
            next_request_id: self.next_request_id,
            next_thread_id: self.next_thread_id,
            next_body_id: self.next_body_id,
            next_insect_id: self.next_insect_id,
            pending_requests: self.pending_requests.iter().cloned().collect(),
            thread_growth: self.thread_growth.clone(),
            move_budgets: self.move_budgets.clone(),
            rng_seed: self.rng_seed,
        }
    }

    pub fn save_to_dir(&self, dir: impl AsRef<Path>) -> Result<(), WorldError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        self.journal.save_json(dir.join(JOURNAL_FILE))?;
        self.snapshot().save_json(dir.join(SNAPSHOT_FILE))?;
        Ok(())
    }

    pub fn load_from_dir(
        dir: impl AsRef<Path>,
        sim: crate::config::SimConfig,
    ) -> Result<Self, WorldError> {
        let dir = dir.as_ref();
        let journal = Journal::load_json(dir.join(JOURNAL_FILE))?;
        let snapshot = Snapshot::load_json(dir.join(SNAPSHOT_FILE))?;
        Self::from_snapshot(snapshot, journal, sim)
    }

    /// Restore a world from a snapshot plus a journal that extends it; the
    /// journal suffix past the snapshot point is replayed onto the state.
    pub fn from_snapshot(
        snapshot: Snapshot,
        journal: Journal,
        sim: crate::config::SimConfig,
    ) -> Result<Self, WorldError> {
        if snapshot.journal_len > journal.len() {
            return Err(WorldError::JournalMismatch);
        }

        let mut world = Self::new_with_state(snapshot.state, sim, snapshot.rng_seed);
        world.journal = journal;
        world.next_event_id = snapshot.last_event_id.saturating_add(1);
        world.next_request_id = snapshot.next_request_id;
        world.next_thread_id = snapshot.next_thread_id;
        world.next_body_id = snapshot.next_body_id;
        world.next_insect_id = snapshot.next_insect_id;
        world.pending_requests = VecDeque::from(snapshot.pending_requests);
        world.thread_growth = snapshot.thread_growth;
        world.move_budgets = snapshot.move_budgets;
        world.rng_seed = snapshot.rng_seed;
        world.rng = StdRng::seed_from_u64(snapshot.rng_seed);
        world.replay_from(snapshot.journal_len)?;
        Ok(world)
    }
}
