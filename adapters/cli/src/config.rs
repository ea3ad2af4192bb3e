//! TOML scenario description consumed by the CLI.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;
use skirmish_core::{CellCoord, GridSettings, TerrainKind};
use skirmish_system_builder::{Config as BuilderConfig, StructureKind};
use skirmish_system_movement::DEFAULT_SPEED;
use skirmish_world::{DEFAULT_NOISE_SCALE, DEFAULT_RESEED_SEED, DEFAULT_SEED};

/// Complete scenario: grid, terrain, agents and structures.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct SimulationConfig {
    pub(crate) grid: GridSettings,
    pub(crate) generation: GenerationConfig,
    pub(crate) movement: MovementConfig,
    pub(crate) builder: BuilderConfig,
    /// Empty means the standard catalog.
    pub(crate) terrain: Vec<TerrainKind>,
    pub(crate) agents: Vec<AgentConfig>,
    pub(crate) structures: Vec<StructureConfig>,
}

impl SimulationConfig {
    /// Reads and parses the scenario stored at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("failed to parse scenario {}", path.display()))
    }

    pub(crate) fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct GenerationConfig {
    pub(crate) seed: u64,
    pub(crate) noise_scale: f32,
    pub(crate) reseed_seed: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            noise_scale: DEFAULT_NOISE_SCALE,
            reseed_seed: DEFAULT_RESEED_SEED,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct MovementConfig {
    pub(crate) speed: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            speed: DEFAULT_SPEED,
        }
    }
}

/// Agent spawned at `start`; without a target it stays put.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct AgentConfig {
    pub(crate) start: CellCoord,
    #[serde(default)]
    pub(crate) target: Option<CellCoord>,
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct StructureConfig {
    pub(crate) kind: StructureKind,
    pub(crate) origin: CellCoord,
}
