pub mod config;
pub mod geometry;
pub mod runtime;
pub mod worldgen;

pub use config::{SimConfig, WorldConfig};
pub use geometry::{centroid, euclidean_distance, manhattan_distance, CellPos};
pub use runtime::{
    BodyId, BroadcastFrame, CausedBy, Cell, DistributedNetwork, DomainEvent, EventBroadcaster,
    FungusBody, InMemoryNetwork, Insect, InsectId, InsectStatus, Journal, MirrorInit, MirrorWorld,
    Occupant, ParticipantId, Region, RegionId, RegionKind, RejectReason, Request, RequestClient,
    RequestEnvelope, RequestId, Snapshot, SporeKind, Thread, ThreadId, ThreadRemovalReason, World,
    WorldError, WorldEvent, WorldEventId, WorldState, WorldTime,
};
pub use worldgen::{derive_seed, generate_state, partition, Partition, WorldGenConfig};
