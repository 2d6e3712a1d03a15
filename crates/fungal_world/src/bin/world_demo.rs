//! Headless demo: one authority, one mirror, a scripted session.
//!
//! Usage: world_demo [config.toml] [ticks]

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use fungal_world::runtime::{
    EventBroadcaster, InMemoryNetwork, MirrorWorld, Request, RequestClient, World, WorldError,
};
use fungal_world::WorldConfig;
use fungal_world_proto::distributed_net::DistributedNetwork as _;
use fungal_world_proto::topic_request;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("world_demo failed: {error:?}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), WorldError> {
    let mut args = std::env::args().skip(1);
    let config_path = args.next();
    let ticks: u64 = args
        .next()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(600);

    let config = WorldConfig::load_or_default(config_path.as_deref().map(Path::new))?;
    let world_id = config.world_id.clone().unwrap_or_else(|| "demo".to_string());
    let participants = vec!["p1".to_string(), "p2".to_string()];

    let mut world = World::generate(&config.generation, config.simulation.clone(), &participants)?;
    println!(
        "generated world '{world_id}': {} regions, {} cells, {} bodies, {} insects",
        world.state().regions.len(),
        world.state().cells.len(),
        world.state().bodies.len(),
        world.state().insects.len(),
    );

    let network: Arc<dyn fungal_world_proto::DistributedNetwork<WorldError> + Send + Sync> =
        Arc::new(InMemoryNetwork::new());
    let mut mirror = MirrorWorld::subscribe(&network, &world_id)?;
    let intake = network.subscribe(&topic_request(&world_id))?;
    let mut broadcaster = EventBroadcaster::new(Arc::clone(&network), &world_id);
    broadcaster.publish_init(&world)?;

    // Scripted session: each participant grows a thread out of its body's
    // region and asks a body to release spores.
    let client = RequestClient::new(Arc::clone(&network), &world_id);
    for body in world.state().bodies.values() {
        if let Some(region) = world.state().regions.get(&body.region_id) {
            if let Some(&neighbor) = region.neighbors.iter().next() {
                client.submit(&Request::ConnectRegions {
                    region_a: region.id,
                    region_b: neighbor,
                    owner: body.owner.clone(),
                })?;
            }
        }
        client.submit(&Request::ReleaseSpores {
            body_id: body.id,
            requester: body.owner.clone(),
        })?;
    }

    for _ in 0..ticks {
        world.drain_network_requests(&intake)?;
        world.step()?;
        broadcaster.publish_new_events(&world)?;
    }
    mirror.sync()?;

    let state = world.state();
    let mature = state.threads.values().filter(|t| t.is_mature()).count();
    let spores = state
        .regions
        .values()
        .map(|region| region.spore_count)
        .sum::<u32>();
    println!(
        "after {ticks} ticks: {} threads ({mature} mature), {} spores on the ground, {} journal events",
        state.threads.len(),
        spores,
        world.journal().len(),
    );
    println!(
        "mirror in sync: {}",
        mirror.state().map(|mirrored| {
            let mut normalized = mirrored.clone();
            normalized.time = state.time;
            normalized == *state
        })?
    );
    Ok(())
}
