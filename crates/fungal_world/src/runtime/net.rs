//! In-process network adapter used by tests and the demo host.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use fungal_world_proto::distributed_net as proto_net;
use fungal_world_proto::{NetworkMessage, NetworkSubscription};

use super::error::WorldError;

pub trait DistributedNetwork: proto_net::DistributedNetwork<WorldError> {}

impl<T> DistributedNetwork for T where T: proto_net::DistributedNetwork<WorldError> {}

/// Loopback pub/sub: every published payload lands in the inbox of each
/// topic subscription and in a published log for inspection.
#[derive(Clone, Default)]
pub struct InMemoryNetwork {
    inbox: Arc<Mutex<HashMap<String, Vec<Vec<u8>>>>>,
    published: Arc<Mutex<Vec<NetworkMessage>>>,
}

impl InMemoryNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> Vec<NetworkMessage> {
        self.published.lock().expect("lock published").clone()
    }
}

impl proto_net::DistributedNetwork<WorldError> for InMemoryNetwork {
    fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), WorldError> {
        let message = NetworkMessage {
            topic: topic.to_string(),
            payload: payload.to_vec(),
        };
        {
            let mut published = self.published.lock().expect("lock published");
            published.push(message.clone());
        }
        let mut inbox = self.inbox.lock().expect("lock inbox");
        inbox
            .entry(topic.to_string())
            .or_default()
            .push(message.payload);
        Ok(())
    }

    fn subscribe(&self, topic: &str) -> Result<NetworkSubscription, WorldError> {
        let mut inbox = self.inbox.lock().expect("lock inbox");
        inbox.entry(topic.to_string()).or_default();
        Ok(NetworkSubscription::new(
            topic.to_string(),
            Arc::clone(&self.inbox),
        ))
    }
}

#[cfg(test)]
mod tests {
    use fungal_world_proto::distributed_net::DistributedNetwork as _;

    use super::*;

    #[test]
    fn publish_delivers_to_subscribers() {
        let network = InMemoryNetwork::new();
        let subscription = network.subscribe("fw.w1.event").expect("subscribe");

        network.publish("fw.w1.event", b"payload").expect("publish");

        let messages = subscription.drain();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0], b"payload".to_vec());
    }

    #[test]
    fn drain_empties_the_topic() {
        let network = InMemoryNetwork::new();
        let subscription = network.subscribe("fw.w1.event").expect("subscribe");
        network.publish("fw.w1.event", b"one").expect("publish");
        assert_eq!(subscription.drain().len(), 1);
        assert!(subscription.drain().is_empty());
    }
}
