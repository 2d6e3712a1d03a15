//! Simulation tuning knobs, loadable from TOML with per-field defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::runtime::WorldError;
use crate::worldgen::WorldGenConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Ticks for a thread to grow from 0 to mature at base rate.
    pub thread_growth_ticks: u32,
    /// Decay window rolled per thread, added after maturation.
    pub thread_decay_min_ticks: u32,
    pub thread_decay_max_ticks: u32,
    /// Cooldown between two spore releases of one body.
    pub body_release_cooldown_ticks: u32,
    /// Releases a body performs before it self-destroys.
    pub body_release_limit: u32,
    /// Spores placed per release.
    pub body_spore_amount: u32,
    /// Whether bodies also seed second-degree neighbor regions.
    pub advanced_bodies: bool,
    /// Ticks a timed insect status lasts before reverting to normal.
    pub status_duration_ticks: u32,
    /// Base insect speed in cells per tick, before multipliers.
    pub insect_base_speed: f64,
    pub initial_insects_per_participant: u32,
    pub score_per_spore: i64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            thread_growth_ticks: 300,
            thread_decay_min_ticks: 1200,
            thread_decay_max_ticks: 2400,
            body_release_cooldown_ticks: 300,
            body_release_limit: 2,
            body_spore_amount: 3,
            advanced_bodies: false,
            status_duration_ticks: 600,
            insect_base_speed: 1.0,
            initial_insects_per_participant: 2,
            score_per_spore: 1,
        }
    }
}

/// Top-level config for a hosted world; both sections are optional in the
/// file and fall back to defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub world_id: Option<String>,
    pub generation: WorldGenConfig,
    pub simulation: SimConfig,
}

impl WorldConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, WorldError> {
        toml::from_str(input).map_err(|error| WorldError::Serde(error.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, WorldError> {
        let raw = fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self, WorldError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
