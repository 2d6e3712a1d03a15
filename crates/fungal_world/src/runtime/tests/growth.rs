use super::super::*;
use super::{place_body, place_spore, place_thread, pos, two_region_state, world_with};
use crate::config::SimConfig;

fn connect(world: &mut World) {
    world.submit_request(Request::ConnectRegions {
        region_a: RegionId(0),
        region_b: RegionId(1),
        owner: "p1".to_string(),
    });
    world.step().unwrap();
}

#[test]
fn thread_progress_rises_monotonically_to_one() {
    let mut world = world_with(two_region_state());
    connect(&mut world);
    let thread_id = *world.state().threads.keys().next().unwrap();

    let mut last = world.state().threads[&thread_id].progress;
    // Growth takes 10 ticks at the test rate; one has already elapsed.
    for _ in 0..9 {
        world.step().unwrap();
        let progress = world.state().threads[&thread_id].progress;
        assert!(progress >= last);
        last = progress;
    }
    assert_eq!(last, 1.0);
    assert!(world.state().threads[&thread_id].is_mature());
}

#[test]
fn growth_boost_region_matures_threads_twice_as_fast() {
    let mut state = two_region_state();
    state.regions.get_mut(&RegionId(0)).unwrap().kind = RegionKind::GrowthBoost;
    let mut world = world_with(state);
    connect(&mut world);
    let thread_id = *world.state().threads.keys().next().unwrap();

    for _ in 0..4 {
        world.step().unwrap();
    }
    // 5 ticks at double rate covers the 10-tick base duration.
    assert!(world.state().threads[&thread_id].is_mature());
}

#[test]
fn decayed_thread_is_removed_autonomously() {
    let mut world = World::new_with_state(
        two_region_state(),
        SimConfig {
            thread_growth_ticks: 2,
            thread_decay_min_ticks: 3,
            thread_decay_max_ticks: 4,
            ..super::test_sim()
        },
        42,
    );
    connect(&mut world);
    assert_eq!(world.state().threads.len(), 1);

    // created at t=1, growth 2, decay window 3: gone once t reaches 6.
    for _ in 0..6 {
        world.step().unwrap();
    }
    assert!(world.state().threads.is_empty());
    let removal = world
        .journal()
        .events
        .iter()
        .find_map(|event| match &event.body {
            DomainEvent::ThreadRemoved { reason, .. } => Some(*reason),
            _ => None,
        });
    assert_eq!(removal, Some(ThreadRemovalReason::Decayed));
    // Adjacency links died with the thread.
    assert!(world
        .state()
        .cells
        .values()
        .all(|cell| cell.thread_neighbors.is_empty()));
}

#[test]
fn spore_release_seeds_neighbor_regions_and_respects_cooldown() {
    let mut state = two_region_state();
    place_body(&mut state, 201, "p1", RegionId(0), pos(1, 1));
    let mut world = world_with(state);

    world.submit_request(Request::ReleaseSpores {
        body_id: 201,
        requester: "p1".to_string(),
    });
    world.step().unwrap();

    // All spores land in the only neighbor, region 1.
    let region_1 = &world.state().regions[&RegionId(1)];
    assert_eq!(region_1.spore_count, 3);
    assert_eq!(world.state().regions[&RegionId(0)].spore_count, 0);
    assert_eq!(world.state().bodies[&201].releases_done, 1);

    // Second release inside the cooldown window is a benign rejection.
    world.submit_request(Request::ReleaseSpores {
        body_id: 201,
        requester: "p1".to_string(),
    });
    world.step().unwrap();
    assert_eq!(world.state().bodies[&201].releases_done, 1);
    let rejected = world
        .journal()
        .events
        .iter()
        .any(|event| {
            matches!(
                event.body,
                DomainEvent::RequestRejected {
                    reason: RejectReason::CooldownActive { .. },
                    ..
                }
            )
        });
    assert!(rejected);
}

#[test]
fn advanced_body_seeds_second_degree_neighbors() {
    let mut state = two_region_state();
    super::add_region(&mut state, RegionId(2), RegionKind::Standard, 8..=10);
    super::link_regions(&mut state, RegionId(1), RegionId(2));
    place_body(&mut state, 201, "p1", RegionId(0), pos(1, 1));
    state.bodies.get_mut(&201).unwrap().advanced = true;
    let mut world = world_with(state);

    world.submit_request(Request::ReleaseSpores {
        body_id: 201,
        requester: "p1".to_string(),
    });
    world.step().unwrap();

    // Each of the 3 spores goes to the only direct neighbor (region 1), and
    // each also seeds region 1's other neighbor (region 2).
    assert_eq!(world.state().regions[&RegionId(1)].spore_count, 3);
    assert_eq!(world.state().regions[&RegionId(2)].spore_count, 3);
    assert_eq!(world.state().regions[&RegionId(0)].spore_count, 0);
}

#[test]
fn body_self_destroys_after_final_release() {
    let mut state = two_region_state();
    place_body(&mut state, 201, "p1", RegionId(0), pos(1, 1));
    let mut world = world_with(state);

    world.submit_request(Request::ReleaseSpores {
        body_id: 201,
        requester: "p1".to_string(),
    });
    world.step().unwrap();
    // Wait out the cooldown (5 ticks in the test tuning).
    for _ in 0..5 {
        world.step().unwrap();
    }
    world.submit_request(Request::ReleaseSpores {
        body_id: 201,
        requester: "p1".to_string(),
    });
    world.step().unwrap();

    assert!(world.state().bodies.get(&201).is_none());
    assert_eq!(world.state().regions[&RegionId(0)].body, None);
    // Despawn cleared the occupant in the same event application.
    assert_eq!(
        world.state().cell(pos(1, 1)).unwrap().occupant,
        Occupant::Empty
    );
}

#[test]
fn body_despawn_takes_its_immature_threads_along() {
    let mut state = two_region_state();
    place_body(&mut state, 201, "p1", RegionId(0), pos(1, 1));
    // Mirror the SimConfig's release limit onto the fixture body, matching how
    // the runtime stamps `body_release_limit` onto bodies it builds.
    state.bodies.get_mut(&201).unwrap().release_limit = 1;
    let mut world = World::new_with_state(
        state,
        SimConfig {
            body_release_limit: 1,
            thread_growth_ticks: 1000,
            ..super::test_sim()
        },
        42,
    );

    // Thread grown out of the body's region records it as origin.
    connect(&mut world);
    let thread_id = *world.state().threads.keys().next().unwrap();
    assert_eq!(world.state().threads[&thread_id].origin_body, Some(201));

    world.submit_request(Request::ReleaseSpores {
        body_id: 201,
        requester: "p1".to_string(),
    });
    world.step().unwrap();

    assert!(world.state().bodies.get(&201).is_none());
    assert!(world.state().threads.is_empty());
    let reasons: Vec<ThreadRemovalReason> = world
        .journal()
        .events
        .iter()
        .filter_map(|event| match &event.body {
            DomainEvent::ThreadRemoved { reason, .. } => Some(*reason),
            _ => None,
        })
        .collect();
    assert_eq!(reasons, vec![ThreadRemovalReason::OriginLost]);
}

#[test]
fn threshold_spawn_waits_for_a_mature_thread() {
    let mut state = two_region_state();
    for z in 0..=2 {
        place_spore(&mut state, pos(4, z), SporeKind::Plain);
        place_spore(&mut state, pos(5, z), SporeKind::Plain);
    }
    assert_eq!(state.regions[&RegionId(1)].spore_count, 6);
    place_thread(&mut state, 501, pos(2, 1), pos(4, 1), 0.0);
    let mut world = world_with(state);

    // Over threshold but the only touching thread is immature: no body.
    world.step().unwrap();
    assert!(world.state().bodies.is_empty());

    // Let the thread mature (10 ticks at test rate), then exactly one body
    // appears and consumes the spores.
    for _ in 0..10 {
        world.step().unwrap();
    }
    assert_eq!(world.state().bodies.len(), 1);
    let body = world.state().bodies.values().next().unwrap();
    assert_eq!(body.region_id, RegionId(1));
    assert_eq!(world.state().regions[&RegionId(1)].body, Some(body.id));
    assert_eq!(world.state().regions[&RegionId(1)].spore_count, 0);
    let spores_left = world
        .state()
        .cells
        .values()
        .filter(|cell| matches!(cell.occupant, Occupant::Spore(_)))
        .count();
    assert_eq!(spores_left, 0);

    // No second body on later ticks.
    world.step().unwrap();
    assert_eq!(world.state().bodies.len(), 1);
}

#[test]
fn threshold_spawn_skips_body_prohibited_regions() {
    let mut state = two_region_state();
    state.regions.get_mut(&RegionId(1)).unwrap().kind = RegionKind::BodyProhibited;
    for z in 0..=2 {
        place_spore(&mut state, pos(4, z), SporeKind::Plain);
        place_spore(&mut state, pos(5, z), SporeKind::Plain);
    }
    place_thread(&mut state, 501, pos(2, 1), pos(4, 1), 1.0);
    let mut world = world_with(state);

    for _ in 0..3 {
        world.step().unwrap();
    }
    assert!(world.state().bodies.is_empty());
}

#[test]
fn manual_body_spawn_requires_mature_thread_and_vacancy() {
    let mut state = two_region_state();
    let mut world = world_with(state.clone());

    world.submit_request(Request::SpawnBody {
        region_id: RegionId(1),
        owner: "p1".to_string(),
    });
    world.step().unwrap();
    assert!(world.state().bodies.is_empty());

    place_thread(&mut state, 501, pos(2, 1), pos(4, 1), 1.0);
    let mut world = world_with(state);
    world.submit_request(Request::SpawnBody {
        region_id: RegionId(1),
        owner: "p1".to_string(),
    });
    world.step().unwrap();
    assert_eq!(world.state().bodies.len(), 1);

    // A second body in the same region loses to the binding invariant.
    world.submit_request(Request::SpawnBody {
        region_id: RegionId(1),
        owner: "p2".to_string(),
    });
    world.step().unwrap();
    assert_eq!(world.state().bodies.len(), 1);
    let rejected = world.journal().events.iter().any(|event| {
        matches!(
            event.body,
            DomainEvent::RequestRejected {
                reason: RejectReason::BodyAlreadyBound { .. },
                ..
            }
        )
    });
    assert!(rejected);
}
