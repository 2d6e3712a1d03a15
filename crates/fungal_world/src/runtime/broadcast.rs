//! Authority-to-mirror event distribution and mirror-side replication.
//!
//! The authority publishes the full initial state once, then every accepted
//! mutation as its domain event. Mirrors hold a read-only copy advanced
//! strictly in broadcast order; they never mutate locally and never roll
//! dice. Rejections are journaled on the authority but never broadcast, so
//! the wire carries its own contiguous sequence numbers.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use fungal_world_proto::distributed_net::DistributedNetwork;
use fungal_world_proto::{topic_event, topic_init, topic_request, NetworkSubscription};

use super::error::WorldError;
use super::events::{Request, WorldEvent};
use super::state::WorldState;
use super::types::{RequestId, WorldEventId};
use super::world::World;

type Network = Arc<dyn DistributedNetwork<WorldError> + Send + Sync>;

/// Full-state payload published on the init topic before any dynamic
/// mutation is broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MirrorInit {
    pub world_id: String,
    pub state: WorldState,
    /// Broadcast sequence already covered by this state.
    pub last_seq: u64,
}

/// One broadcast mutation. `seq` is contiguous on the wire even though
/// journaled rejection ids leave holes in the event id space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastFrame {
    pub seq: u64,
    pub event: WorldEvent,
}

/// Authority-side publisher. Tracks the last published event id so each call
/// only ships the new journal suffix.
pub struct EventBroadcaster {
    network: Network,
    world_id: String,
    published_up_to: WorldEventId,
    next_seq: u64,
}

impl EventBroadcaster {
    pub fn new(network: Network, world_id: impl Into<String>) -> Self {
        Self {
            network,
            world_id: world_id.into(),
            published_up_to: 0,
            next_seq: 1,
        }
    }

    /// Publish the complete current state. Mirrors joining later start from
    /// this payload instead of the event history.
    pub fn publish_init(&mut self, world: &World) -> Result<(), WorldError> {
        let last_event_id = world
            .journal()
            .events
            .last()
            .map(|event| event.id)
            .unwrap_or(0);
        let init = MirrorInit {
            world_id: self.world_id.clone(),
            state: world.state().clone(),
            last_seq: self.next_seq - 1,
        };
        let payload = serde_cbor::to_vec(&init)?;
        self.network.publish(&topic_init(&self.world_id), &payload)?;
        self.published_up_to = self.published_up_to.max(last_event_id);
        Ok(())
    }

    /// Ship every journal event newer than the last publication, skipping
    /// rejections (logged, no mutation, no broadcast).
    pub fn publish_new_events(&mut self, world: &World) -> Result<usize, WorldError> {
        let topic = topic_event(&self.world_id);
        let mut shipped = 0usize;
        for event in &world.journal().events {
            if event.id <= self.published_up_to {
                continue;
            }
            self.published_up_to = event.id;
            if event.body.is_rejection() {
                continue;
            }
            let frame = BroadcastFrame {
                seq: self.next_seq,
                event: event.clone(),
            };
            let payload = serde_cbor::to_vec(&frame)?;
            self.network.publish(&topic, &payload)?;
            self.next_seq += 1;
            shipped += 1;
        }
        Ok(shipped)
    }
}

/// Participant-side fire-and-forget command submission. There is no response
/// channel; outcomes arrive, if at all, as broadcast events.
pub struct RequestClient {
    network: Network,
    world_id: String,
}

impl RequestClient {
    pub fn new(network: Network, world_id: impl Into<String>) -> Self {
        Self {
            network,
            world_id: world_id.into(),
        }
    }

    pub fn submit(&self, request: &Request) -> Result<(), WorldError> {
        let payload = serde_cbor::to_vec(request)?;
        self.network
            .publish(&topic_request(&self.world_id), &payload)
    }
}

impl World {
    /// Authority-side intake: drain the request topic and enqueue everything
    /// for the next step, in arrival order.
    pub fn drain_network_requests(
        &mut self,
        subscription: &NetworkSubscription,
    ) -> Result<Vec<RequestId>, WorldError> {
        let mut accepted = Vec::new();
        for payload in subscription.drain() {
            let request: Request = serde_cbor::from_slice(&payload)?;
            accepted.push(self.submit_request(request));
        }
        Ok(accepted)
    }
}

/// A read-only replica of the world. State changes arrive exclusively through
/// the broadcast topics; there is no mutation API.
pub struct MirrorWorld {
    world_id: String,
    init_sub: NetworkSubscription,
    event_sub: NetworkSubscription,
    state: Option<WorldState>,
    last_seq: u64,
}

impl MirrorWorld {
    pub fn subscribe(network: &Network, world_id: impl Into<String>) -> Result<Self, WorldError> {
        let world_id = world_id.into();
        let init_sub = network.subscribe(&topic_init(&world_id))?;
        let event_sub = network.subscribe(&topic_event(&world_id))?;
        Ok(Self {
            world_id,
            init_sub,
            event_sub,
            state: None,
            last_seq: 0,
        })
    }

    pub fn world_id(&self) -> &str {
        &self.world_id
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    pub fn state(&self) -> Result<&WorldState, WorldError> {
        self.state.as_ref().ok_or(WorldError::MirrorNotInitialized)
    }

    pub fn last_seq(&self) -> u64 {
        self.last_seq
    }

    /// Apply everything newly published: the latest init payload first, then
    /// frames in order. Returns the number of events applied. A sequence gap
    /// means this mirror missed a broadcast and must re-init from a fresh
    /// snapshot.
    pub fn sync(&mut self) -> Result<usize, WorldError> {
        for payload in self.init_sub.drain() {
            let init: MirrorInit = serde_cbor::from_slice(&payload)?;
            self.state = Some(init.state);
            self.last_seq = init.last_seq;
        }

        let mut applied = 0usize;
        for payload in self.event_sub.drain() {
            let frame: BroadcastFrame = serde_cbor::from_slice(&payload)?;
            if frame.seq <= self.last_seq {
                continue;
            }
            let state = self
                .state
                .as_mut()
                .ok_or(WorldError::MirrorNotInitialized)?;
            if frame.seq != self.last_seq + 1 {
                return Err(WorldError::EventGap {
                    expected: self.last_seq + 1,
                    found: frame.seq,
                });
            }
            state.apply_domain_event(&frame.event.body, frame.event.time)?;
            state.time = frame.event.time;
            self.last_seq = frame.seq;
            applied += 1;
        }
        Ok(applied)
    }
}
