//! Runtime module - the authoritative world state machine.
//!
//! This module contains the World struct and all supporting types for:
//! - World state management and the domain event vocabulary
//! - Request validation and journaling
//! - The fixed simulation tick (growth, decay, movement, spawning)
//! - Occupancy-aware pathfinding
//! - Snapshot persistence and recovery
//! - Broadcast replication to read-only mirrors

mod broadcast;
mod error;
mod events;
mod graph;
mod net;
mod path;
mod snapshot;
mod state;
mod types;
mod util;
mod world;

#[cfg(test)]
mod tests;

// Types
pub use types::{
    BodyId, InsectId, ParticipantId, RegionId, RequestId, ThreadId, WorldEventId, WorldTime,
};

// Error
pub use error::WorldError;

// Events
pub use events::{
    CausedBy, DomainEvent, RejectReason, Request, RequestEnvelope, ThreadRemovalReason, WorldEvent,
};

// State
pub use state::{
    Cell, FungusBody, Insect, InsectStatus, Occupant, Region, RegionKind, SporeKind, Thread,
    WorldState,
};

// Graph
pub use graph::select_thread_endpoints;

// Pathfinding
pub use path::find_path;

// Snapshot
pub use snapshot::{Journal, Snapshot};

// Network
pub use net::{DistributedNetwork, InMemoryNetwork};

// Broadcast / mirrors
pub use broadcast::{BroadcastFrame, EventBroadcaster, MirrorInit, MirrorWorld, RequestClient};

// Utilities
pub use util::{hash_json, sha256_hex};

// World
pub use world::World;
