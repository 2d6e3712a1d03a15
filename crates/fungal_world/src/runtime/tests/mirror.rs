use std::sync::Arc;

use fungal_world_proto::distributed_net::DistributedNetwork as _;
use fungal_world_proto::topic_request;

use super::super::broadcast::{EventBroadcaster, MirrorWorld, RequestClient};
use super::super::net::InMemoryNetwork;
use super::super::*;
use super::{place_insect, pos, two_region_state, world_with};

type Network = Arc<dyn fungal_world_proto::DistributedNetwork<WorldError> + Send + Sync>;

fn network() -> Network {
    Arc::new(InMemoryNetwork::new())
}

#[test]
fn mirror_tracks_authority_through_init_and_events() {
    let network = network();
    let mut mirror = MirrorWorld::subscribe(&network, "w1").unwrap();

    let mut state = two_region_state();
    place_insect(&mut state, 101, "p1", pos(0, 0));
    let mut world = world_with(state);
    let mut broadcaster = EventBroadcaster::new(Arc::clone(&network), "w1");
    broadcaster.publish_init(&world).unwrap();

    world.submit_request(Request::ConnectRegions {
        region_a: RegionId(0),
        region_b: RegionId(1),
        owner: "p1".to_string(),
    });
    world.submit_request(Request::MoveInsect {
        insect_id: 101,
        target: pos(2, 0),
        requester: "p1".to_string(),
    });
    for _ in 0..5 {
        world.step().unwrap();
        broadcaster.publish_new_events(&world).unwrap();
    }

    let applied = mirror.sync().unwrap();
    assert!(applied > 0);
    // The mirror clock reads the last broadcast event's time; quiet ticks on
    // the authority do not move it. Everything else matches exactly.
    let mut mirrored = mirror.state().unwrap().clone();
    mirrored.time = world.state().time;
    assert_eq!(&mirrored, world.state());
}

#[test]
fn rejections_are_journaled_but_never_broadcast() {
    let network = network();
    let mut mirror = MirrorWorld::subscribe(&network, "w1").unwrap();

    let mut world = world_with(two_region_state());
    let mut broadcaster = EventBroadcaster::new(Arc::clone(&network), "w1");
    broadcaster.publish_init(&world).unwrap();

    world.submit_request(Request::ConnectRegions {
        region_a: RegionId(0),
        region_b: RegionId(0),
        owner: "p1".to_string(),
    });
    world.step().unwrap();
    let shipped = broadcaster.publish_new_events(&world).unwrap();

    assert_eq!(shipped, 0);
    assert!(world
        .journal()
        .events
        .iter()
        .any(|event| event.body.is_rejection()));
    assert_eq!(mirror.sync().unwrap(), 0);
    // The mirror still matches the authority exactly, clock aside.
    let mut mirrored = mirror.state().unwrap().clone();
    mirrored.time = world.state().time;
    assert_eq!(&mirrored, world.state());
}

#[test]
fn mirror_without_init_reports_uninitialized() {
    let network = network();
    let mut mirror = MirrorWorld::subscribe(&network, "w1").unwrap();

    let mut world = world_with(two_region_state());
    let mut broadcaster = EventBroadcaster::new(Arc::clone(&network), "w1");
    // Init is deliberately skipped.
    world.submit_request(Request::ConnectRegions {
        region_a: RegionId(0),
        region_b: RegionId(1),
        owner: "p1".to_string(),
    });
    world.step().unwrap();
    broadcaster.publish_new_events(&world).unwrap();

    assert!(matches!(
        mirror.sync(),
        Err(WorldError::MirrorNotInitialized)
    ));
}

#[test]
fn late_join_via_fresh_init_skips_already_covered_events() {
    let network = network();

    let mut world = world_with(two_region_state());
    let mut broadcaster = EventBroadcaster::new(Arc::clone(&network), "w1");
    world.submit_request(Request::ConnectRegions {
        region_a: RegionId(0),
        region_b: RegionId(1),
        owner: "p1".to_string(),
    });
    world.step().unwrap();
    broadcaster.publish_new_events(&world).unwrap();

    // A mirror joining now gets the full state plus only future events.
    let mut late = MirrorWorld::subscribe(&network, "w1").unwrap();
    broadcaster.publish_init(&world).unwrap();
    world.step().unwrap();
    broadcaster.publish_new_events(&world).unwrap();

    late.sync().unwrap();
    let mut mirrored = late.state().unwrap().clone();
    mirrored.time = world.state().time;
    assert_eq!(&mirrored, world.state());
}

#[test]
fn requests_flow_from_client_through_the_request_topic() {
    let network = network();
    let client = RequestClient::new(Arc::clone(&network), "w1");
    let intake = network.subscribe(&topic_request("w1")).unwrap();

    let mut world = world_with(two_region_state());
    client
        .submit(&Request::ConnectRegions {
            region_a: RegionId(0),
            region_b: RegionId(1),
            owner: "p1".to_string(),
        })
        .unwrap();

    let accepted = world.drain_network_requests(&intake).unwrap();
    assert_eq!(accepted.len(), 1);
    world.step().unwrap();
    assert_eq!(world.state().threads.len(), 1);
}
