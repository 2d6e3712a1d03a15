//! Procedural partitioning of the grid into regions.
//!
//! A fixed number of region centers is seeded at random, then relaxed with
//! Lloyd iterations so regions come out roughly equal-area. Positions on a
//! label boundary are reserved as inter-region borders and never become
//! placeable cells; interior positions are materialized and bound to their
//! region. The whole construction is reproducible from one seed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::geometry::CellPos;
use crate::runtime::{Cell, Occupant, Region, RegionId, RegionKind, WorldError, WorldState};

const PARTITION_SALT: u64 = 0x01;
const KIND_SALT: u64 = 0x02;

const REGION_KINDS: [RegionKind; 5] = [
    RegionKind::Standard,
    RegionKind::GrowthBoost,
    RegionKind::BodyProhibited,
    RegionKind::InsectBoost,
    RegionKind::SingleThread,
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldGenConfig {
    pub width: i32,
    pub height: i32,
    pub region_count: u32,
    pub relaxation_iterations: u32,
    pub spore_threshold: u32,
    pub seed: u64,
}

impl Default for WorldGenConfig {
    fn default() -> Self {
        Self {
            width: 40,
            height: 40,
            region_count: 8,
            relaxation_iterations: 5,
            spore_threshold: 5,
            seed: 7,
        }
    }
}

/// Derive a subsystem seed from the world seed, splitmix64-style, so distinct
/// consumers of randomness never share a stream.
pub fn derive_seed(world_seed: u64, salt: u64) -> u64 {
    let mut x = world_seed ^ 0x9E37_79B9_7F4A_7C15;
    x ^= salt.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    splitmix64(x)
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}

/// The label map covering every grid position, borders included.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub width: i32,
    pub height: i32,
    pub labels: Vec<u32>,
}

impl Partition {
    pub fn label_at(&self, x: i32, z: i32) -> u32 {
        self.labels[(x * self.height + z) as usize]
    }

    /// Border positions separate two regions and are never materialized as
    /// placeable cells.
    pub fn is_border(&self, x: i32, z: i32) -> bool {
        let label = self.label_at(x, z);
        (x > 0 && self.label_at(x - 1, z) != label)
            || (z > 0 && self.label_at(x, z - 1) != label)
            || (x > 0 && z > 0 && self.label_at(x - 1, z - 1) != label)
    }
}

/// Assign every grid position to a region label via Lloyd relaxation.
pub fn partition(config: &WorldGenConfig) -> Result<Partition, WorldError> {
    if config.width <= 0 || config.height <= 0 {
        return Err(WorldError::GenerationInvalid {
            reason: format!("grid {}x{} is empty", config.width, config.height),
        });
    }
    if config.region_count == 0 {
        return Err(WorldError::GenerationInvalid {
            reason: "region_count must be at least 1".to_string(),
        });
    }

    let mut rng = StdRng::seed_from_u64(derive_seed(config.seed, PARTITION_SALT));
    let count = config.region_count as usize;
    let mut centers: Vec<(i64, i64)> = (0..count)
        .map(|_| {
            (
                rng.gen_range(0..config.width) as i64,
                rng.gen_range(0..config.height) as i64,
            )
        })
        .collect();

    let mut labels = vec![0u32; (config.width * config.height) as usize];
    let passes = config.relaxation_iterations.max(1);
    for pass in 0..passes {
        let mut sums = vec![(0i64, 0i64); count];
        let mut sizes = vec![0i64; count];

        for x in 0..config.width {
            for z in 0..config.height {
                let closest = closest_center(&centers, x as i64, z as i64);
                labels[(x * config.height + z) as usize] = closest as u32;
                sums[closest].0 += x as i64;
                sums[closest].1 += z as i64;
                sizes[closest] += 1;
            }
        }

        // The final pass keeps the labels that the last centers produced.
        if pass + 1 < config.relaxation_iterations {
            for i in 0..count {
                if sizes[i] > 0 {
                    centers[i] = (sums[i].0 / sizes[i], sums[i].1 / sizes[i]);
                }
            }
        }
    }

    Ok(Partition {
        width: config.width,
        height: config.height,
        labels,
    })
}

fn closest_center(centers: &[(i64, i64)], x: i64, z: i64) -> usize {
    let mut closest = 0usize;
    let mut min_distance = i64::MAX;
    for (i, &(cx, cz)) in centers.iter().enumerate() {
        let dx = cx - x;
        let dz = cz - z;
        let distance = dx * dx + dz * dz;
        if distance < min_distance {
            min_distance = distance;
            closest = i;
        }
    }
    closest
}

/// Materialize a partition into the initial world state: one region per
/// surviving label, interior cells bound to their region, symmetric neighbor
/// sets from a perimeter walk.
pub fn generate_state(config: &WorldGenConfig) -> Result<WorldState, WorldError> {
    let partition = partition(config)?;
    let mut kind_rng = StdRng::seed_from_u64(derive_seed(config.seed, KIND_SALT));

    let mut cells: BTreeMap<CellPos, Cell> = BTreeMap::new();
    let mut members: BTreeMap<u32, BTreeSet<CellPos>> = BTreeMap::new();
    for x in 0..config.width {
        for z in 0..config.height {
            if partition.is_border(x, z) {
                continue;
            }
            let label = partition.label_at(x, z);
            let pos = CellPos::new(x, z);
            members.entry(label).or_default().insert(pos);
            cells.insert(
                pos,
                Cell {
                    pos,
                    region_id: RegionId(label),
                    occupant: Occupant::Empty,
                    thread_neighbors: BTreeSet::new(),
                },
            );
        }
    }

    let adjacency = label_adjacency(&partition);
    let survivors: BTreeSet<u32> = members.keys().copied().collect();

    let mut regions: BTreeMap<RegionId, Region> = BTreeMap::new();
    for label in 0..config.region_count {
        // Kinds are drawn for every label so survivor kinds do not shift when
        // a relaxation collapse drops an earlier label.
        let kind = REGION_KINDS[kind_rng.gen_range(0..REGION_KINDS.len())];
        let Some(region_cells) = members.get(&label) else {
            continue;
        };
        let neighbors: BTreeSet<RegionId> = adjacency
            .get(&label)
            .map(|set| {
                set.iter()
                    .filter(|other| survivors.contains(other))
                    .map(|&other| RegionId(other))
                    .collect()
            })
            .unwrap_or_default();
        regions.insert(
            RegionId(label),
            Region {
                id: RegionId(label),
                kind,
                cells: region_cells.clone(),
                neighbors,
                body: None,
                spore_count: 0,
                spore_threshold: config.spore_threshold,
            },
        );
    }

    Ok(WorldState {
        time: 0,
        width: config.width,
        height: config.height,
        regions,
        cells,
        ..WorldState::default()
    })
}

/// Perimeter walk: flood-fill each label over its own positions (8-connected)
/// and record every differing label seen across the frontier. Symmetric by
/// construction since boundary detection compares labels both ways.
fn label_adjacency(partition: &Partition) -> BTreeMap<u32, BTreeSet<u32>> {
    const DIRECTIONS: [(i32, i32); 8] = [
        (1, 0),
        (-1, 0),
        (0, 1),
        (0, -1),
        (1, 1),
        (1, -1),
        (-1, 1),
        (-1, -1),
    ];

    let mut adjacency: BTreeMap<u32, BTreeSet<u32>> = BTreeMap::new();
    let mut visited = vec![false; partition.labels.len()];

    for x in 0..partition.width {
        for z in 0..partition.height {
            let index = (x * partition.height + z) as usize;
            if visited[index] {
                continue;
            }
            let label = partition.labels[index];
            let neighbors = adjacency.entry(label).or_default();

            let mut queue = VecDeque::new();
            queue.push_back((x, z));
            visited[index] = true;
            while let Some((cx, cz)) = queue.pop_front() {
                for (dx, dz) in DIRECTIONS {
                    let nx = cx + dx;
                    let nz = cz + dz;
                    if nx < 0 || nx >= partition.width || nz < 0 || nz >= partition.height {
                        continue;
                    }
                    let neighbor_index = (nx * partition.height + nz) as usize;
                    let neighbor_label = partition.labels[neighbor_index];
                    if neighbor_label == label {
                        if !visited[neighbor_index] {
                            visited[neighbor_index] = true;
                            queue.push_back((nx, nz));
                        }
                    } else {
                        neighbors.insert(neighbor_label);
                    }
                }
            }
        }
    }
    adjacency
}
