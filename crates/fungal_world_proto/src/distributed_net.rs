//! Transport-agnostic pub/sub abstractions shared by authority and mirrors.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

/// Pub/sub surface the simulation core depends on. `E` is the caller's error
/// type so implementations can live outside this crate.
pub trait DistributedNetwork<E> {
    fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), E>;
    fn subscribe(&self, topic: &str) -> Result<NetworkSubscription, E>;
}

/// Handle to a subscribed topic. Messages accumulate in the shared inbox until
/// drained; draining empties the topic's queue.
#[derive(Debug, Clone)]
pub struct NetworkSubscription {
    topic: String,
    inbox: Arc<Mutex<HashMap<String, Vec<Vec<u8>>>>>,
}

impl NetworkSubscription {
    pub fn new(topic: String, inbox: Arc<Mutex<HashMap<String, Vec<Vec<u8>>>>>) -> Self {
        Self { topic, inbox }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn drain(&self) -> Vec<Vec<u8>> {
        let mut inbox = self.inbox.lock().expect("lock inbox");
        inbox.remove(&self.topic).unwrap_or_default()
    }
}
