//! Request and domain event types.

use serde::{Deserialize, Serialize};

use crate::geometry::CellPos;

use super::state::{FungusBody, Insect, InsectStatus, SporeKind, Thread};
use super::types::{
    BodyId, InsectId, ParticipantId, RegionId, RequestId, ThreadId, WorldEventId, WorldTime,
};

/// An envelope wrapping a request with its ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    pub id: RequestId,
    pub request: Request,
}

/// Commands participants may submit to the authority. Fire-and-forget: the
/// authority validates against current state and either applies or rejects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Request {
    ConnectRegions {
        region_a: RegionId,
        region_b: RegionId,
        owner: ParticipantId,
    },
    DisconnectThread {
        thread_id: ThreadId,
        #[serde(default)]
        cutter: Option<InsectId>,
    },
    MoveInsect {
        insect_id: InsectId,
        target: CellPos,
        requester: ParticipantId,
    },
    ConsumeSpore {
        insect_id: InsectId,
        cell: CellPos,
        requester: ParticipantId,
    },
    SpawnBody {
        region_id: RegionId,
        owner: ParticipantId,
    },
    ReleaseSpores {
        body_id: BodyId,
        requester: ParticipantId,
    },
    SpawnInsect {
        owner: ParticipantId,
        #[serde(default)]
        region_id: Option<RegionId>,
        #[serde(default)]
        near_body: Option<BodyId>,
    },
}

/// Why a thread left the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ThreadRemovalReason {
    Disconnected,
    Cut { by: InsectId },
    Decayed,
    OriginLost,
}

/// Domain events that describe state changes. One event is one atomic
/// mutation from every mirror's perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum DomainEvent {
    ThreadCreated {
        thread: Thread,
    },
    ThreadProgressed {
        thread_id: ThreadId,
        progress: f64,
    },
    ThreadRemoved {
        thread_id: ThreadId,
        endpoint_a: CellPos,
        endpoint_b: CellPos,
        reason: ThreadRemovalReason,
    },
    InsectSpawned {
        insect: Insect,
    },
    InsectPathAssigned {
        insect_id: InsectId,
        path: Vec<CellPos>,
        target: CellPos,
        #[serde(default)]
        released_target: Option<CellPos>,
    },
    InsectMoved {
        insect_id: InsectId,
        from: CellPos,
        to: CellPos,
    },
    InsectStatusChanged {
        insect_id: InsectId,
        status: InsectStatus,
        #[serde(default)]
        expires_at: Option<WorldTime>,
    },
    SporePlaced {
        region_id: RegionId,
        cell: CellPos,
        kind: SporeKind,
    },
    SporeConsumed {
        insect_id: InsectId,
        region_id: RegionId,
        cell: CellPos,
        kind: SporeKind,
        score_delta: i64,
        owner: ParticipantId,
    },
    BodyBound {
        region_id: RegionId,
        body: FungusBody,
        #[serde(default)]
        cleared_spores: Vec<CellPos>,
    },
    BodyUnbound {
        region_id: RegionId,
        body_id: BodyId,
        cell: CellPos,
    },
    SporesReleased {
        body_id: BodyId,
        releases_done: u32,
        next_release_at: WorldTime,
    },
    RequestRejected {
        request_id: RequestId,
        reason: RejectReason,
    },
}

impl DomainEvent {
    /// Rejections are journaled for audit but never broadcast to mirrors.
    pub fn is_rejection(&self) -> bool {
        matches!(self, DomainEvent::RequestRejected { .. })
    }
}

/// Reasons why a request was rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum RejectReason {
    RegionNotFound { region_id: RegionId },
    CellNotFound { cell: CellPos },
    ThreadNotFound { thread_id: ThreadId },
    InsectNotFound { insect_id: InsectId },
    BodyNotFound { body_id: BodyId },
    SelfConnection { region_id: RegionId },
    NotAdjacent { region_a: RegionId, region_b: RegionId },
    ThreadExists { region_a: RegionId, region_b: RegionId },
    ThreadLimitReached { region_id: RegionId },
    CellOccupied { cell: CellPos },
    BodyAlreadyBound { region_id: RegionId },
    BodyProhibitedHere { region_id: RegionId },
    NoMatureThread { region_id: RegionId },
    NoPath { from: CellPos, to: CellPos },
    NotOwner { participant: ParticipantId },
    CooldownActive { ready_at: WorldTime },
    ReleasesExhausted { body_id: BodyId },
    CannotCutThreads { insect_id: InsectId },
    NotNearby { cell: CellPos },
    NoSpore { cell: CellPos },
    NoFreeCell { region_id: Option<RegionId> },
}

/// The cause of an event, for audit purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CausedBy {
    Request(RequestId),
    Tick,
    Bootstrap,
}

/// A journaled event with full metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldEvent {
    pub id: WorldEventId,
    pub time: WorldTime,
    pub caused_by: Option<CausedBy>,
    pub body: DomainEvent,
}
