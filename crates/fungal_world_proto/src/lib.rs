pub mod distributed_net;
pub mod topics;

pub use distributed_net::{DistributedNetwork, NetworkMessage, NetworkSubscription};
pub use topics::{topic_event, topic_init, topic_request};
