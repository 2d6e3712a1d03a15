//! Error types for the runtime module.

use std::io;

use crate::geometry::CellPos;

use super::types::{BodyId, InsectId, RegionId, ThreadId, WorldEventId};

/// Structural faults in world operations. Request rejection is not an error;
/// rejected requests become `DomainEvent::RequestRejected` journal entries.
#[derive(Debug, Clone, PartialEq)]
pub enum WorldError {
    JournalMismatch,
    EventGap {
        expected: WorldEventId,
        found: WorldEventId,
    },
    MirrorNotInitialized,
    RegionMissing { region_id: RegionId },
    CellMissing { cell: CellPos },
    ThreadMissing { thread_id: ThreadId },
    InsectMissing { insect_id: InsectId },
    BodyMissing { body_id: BodyId },
    GenerationInvalid { reason: String },
    Io(String),
    Serde(String),
}

impl From<serde_json::Error> for WorldError {
    fn from(error: serde_json::Error) -> Self {
        WorldError::Serde(error.to_string())
    }
}

impl From<serde_cbor::Error> for WorldError {
    fn from(error: serde_cbor::Error) -> Self {
        WorldError::Serde(error.to_string())
    }
}

impl From<io::Error> for WorldError {
    fn from(error: io::Error) -> Self {
        WorldError::Io(error.to_string())
    }
}
