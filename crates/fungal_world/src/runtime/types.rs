//! Type aliases and basic type definitions for the runtime module.

use serde::{Deserialize, Serialize};
use std::fmt;

pub type WorldTime = u64;
pub type WorldEventId = u64;
pub type RequestId = u64;
pub type ThreadId = u64;
pub type BodyId = u64;
pub type InsectId = u64;

/// Participants are addressed by an opaque string identity; the authority is
/// itself a participant.
pub type ParticipantId = String;

/// Stable region identifier assigned at world generation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct RegionId(pub u32);

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "region:{}", self.0)
    }
}
