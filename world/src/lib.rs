#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative grid state management for Skirmish.

use std::{collections::BTreeSet, time::Duration};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use skirmish_core::{
    CellCoord, Command, ConfigurationError, Event, GridError, GridSettings, PathfinderId,
    TerrainCatalog, TerrainKind, WELCOME_BANNER,
};
use tracing::{debug, info, warn};

mod generation;
pub mod grid;

pub use grid::{Cell, Grid, Neighbors};

/// Seed used for the first generation when none is configured.
pub const DEFAULT_SEED: u64 = 1_337;
/// Distance in noise space between two neighbouring cells by default.
pub const DEFAULT_NOISE_SCALE: f32 = 0.1;
/// Seed of the generator that draws seeds for reshuffles by default.
pub const DEFAULT_RESEED_SEED: u64 = 0x5eed_0f_5ca1_ab1e;
/// Exclusive upper bound of seeds drawn by [`Command::RandomizeSeedAndRebuild`].
pub const RESEED_RANGE_END: u64 = 100_000;

/// Represents the authoritative Skirmish grid state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    settings: Option<GridSettings>,
    terrain: Vec<TerrainKind>,
    fallback_terrain: Option<TerrainKind>,
    seed: u64,
    noise_scale: f32,
    reseed_rng: ChaCha8Rng,
    grid: Option<Grid>,
    pathfinders: BTreeSet<PathfinderId>,
    generation: u64,
    tick_index: u64,
    elapsed: Duration,
}

impl World {
    /// Creates a world with default settings and the standard terrain catalog.
    ///
    /// No grid exists until one is generated, either explicitly or lazily by
    /// [`get_node`].
    #[must_use]
    pub fn new() -> Self {
        let mut world = Self::empty();
        world.settings = Some(GridSettings::default());
        world.terrain = TerrainCatalog::standard_kinds();
        world
    }

    /// Creates a world with neither grid settings nor terrain configured.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            banner: WELCOME_BANNER,
            settings: None,
            terrain: Vec::new(),
            fallback_terrain: None,
            seed: DEFAULT_SEED,
            noise_scale: DEFAULT_NOISE_SCALE,
            reseed_rng: ChaCha8Rng::seed_from_u64(DEFAULT_RESEED_SEED),
            grid: None,
            pathfinders: BTreeSet::new(),
            generation: 0,
            tick_index: 0,
            elapsed: Duration::ZERO,
        }
    }

    fn terrain_catalog(&self) -> Result<TerrainCatalog, ConfigurationError> {
        TerrainCatalog::with_fallback(&self.terrain, self.fallback_terrain.as_ref())
    }

    fn set_cell_occupied(&mut self, cell: CellCoord, occupied: bool, out_events: &mut Vec<Event>) {
        let result = match self.grid.as_mut() {
            Some(grid) => grid.set_occupied(cell, occupied),
            None => Err(GridError::NotInitialized),
        };

        match result {
            Ok(()) => out_events.push(Event::CellOccupancyChanged { cell, occupied }),
            Err(reason) => {
                debug!(?cell, %reason, "occupancy request rejected");
                out_events.push(Event::OccupancyRejected { cell, reason });
            }
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureGrid { settings } => {
            world.settings = Some(settings);
        }
        Command::ConfigureTerrain { kinds, fallback } => {
            world.terrain = kinds;
            world.fallback_terrain = fallback;
        }
        Command::ConfigureReseed { seed } => {
            world.reseed_rng = ChaCha8Rng::seed_from_u64(seed);
        }
        Command::GenerateGrid { seed, noise_scale } => {
            rebuild(world, seed, noise_scale, out_events);
        }
        Command::RandomizeSeedAndRebuild => {
            let seed = world.reseed_rng.gen_range(0..RESEED_RANGE_END);
            let noise_scale = world.noise_scale;
            rebuild(world, seed, noise_scale, out_events);
        }
        Command::SetCellOccupied { cell, occupied } => {
            world.set_cell_occupied(cell, occupied, out_events);
        }
        Command::RegisterPathfinder { pathfinder } => {
            let _ = world.pathfinders.insert(pathfinder);
        }
        Command::UnregisterPathfinder { pathfinder } => {
            let _ = world.pathfinders.remove(&pathfinder);
        }
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            world.elapsed = world.elapsed.saturating_add(dt);
            out_events.push(Event::TimeAdvanced { dt });
        }
    }
}

/// Rebuilds every cell from the configured settings, catalog, seed and noise scale.
///
/// On configuration errors the previous grid is kept, a warning is logged and
/// [`Event::GenerationSkipped`] is emitted. On success [`Event::GridRegenerated`]
/// is followed by one [`Event::PathfinderRefreshRequested`] per registered
/// pathfinder in ascending identifier order.
pub fn initialize_grid(world: &mut World, out_events: &mut Vec<Event>) {
    let (seed, noise_scale) = (world.seed, world.noise_scale);
    rebuild(world, seed, noise_scale, out_events);
}

/// Seed and noise scale are only stored once the grid built from them exists.
fn rebuild(world: &mut World, seed: u64, noise_scale: f32, out_events: &mut Vec<Event>) {
    let prepared = world
        .settings
        .ok_or(ConfigurationError::MissingGridSettings)
        .and_then(|settings| settings.validate().map(|()| settings))
        .and_then(|settings| {
            if noise_scale.is_finite() {
                Ok(settings)
            } else {
                Err(ConfigurationError::InvalidNoiseScale(noise_scale))
            }
        })
        .and_then(|settings| world.terrain_catalog().map(|catalog| (settings, catalog)));

    let (settings, catalog) = match prepared {
        Ok(prepared) => prepared,
        Err(reason) => {
            warn!(%reason, "grid generation skipped");
            out_events.push(Event::GenerationSkipped { reason });
            return;
        }
    };

    let discarded = world.grid.as_ref().map_or(0, Grid::occupied_count);
    world.seed = seed;
    world.noise_scale = noise_scale;
    world.generation = world.generation.saturating_add(1);
    let grid = generation::generate(settings, &catalog, seed, noise_scale, world.generation);
    info!(
        seed = world.seed,
        generation = world.generation,
        width = settings.width,
        height = settings.height,
        "grid generated"
    );
    world.grid = Some(grid);

    out_events.push(Event::GridRegenerated {
        generation: world.generation,
        seed: world.seed,
    });

    if discarded > 0 {
        warn!(cells = discarded, "regeneration discarded occupied cells");
        out_events.push(Event::OccupancyDiscarded { cells: discarded });
    }

    for &pathfinder in &world.pathfinders {
        out_events.push(Event::PathfinderRefreshRequested { pathfinder });
    }
}

/// Returns the cell at `coord`, generating the grid first if none exists.
///
/// Lazy generation uses whatever seed and settings are configured at call
/// time and appends its events to `out_events`.
pub fn get_node(
    world: &mut World,
    coord: CellCoord,
    out_events: &mut Vec<Event>,
) -> Result<Cell, GridError> {
    if world.grid.is_none() {
        initialize_grid(world, out_events);
    }

    world
        .grid
        .as_ref()
        .ok_or(GridError::NotInitialized)
        .and_then(|grid| grid.cell(coord).copied())
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::{Cell, Grid, World};
    use skirmish_core::{CellCoord, GridError, GridSettings, PathfinderId, TerrainKind};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Provides read-only access to the current grid, if one was generated.
    #[must_use]
    pub fn grid(world: &World) -> Option<&Grid> {
        world.grid.as_ref()
    }

    /// Returns the cell at `coord` without triggering generation.
    pub fn node(world: &World, coord: CellCoord) -> Result<&Cell, GridError> {
        world
            .grid
            .as_ref()
            .ok_or(GridError::NotInitialized)
            .and_then(|grid| grid.cell(coord))
    }

    /// Settings the next generation will use.
    #[must_use]
    pub fn settings(world: &World) -> Option<&GridSettings> {
        world.settings.as_ref()
    }

    /// Seed of the current grid; lazy generation reuses it.
    #[must_use]
    pub fn seed(world: &World) -> u64 {
        world.seed
    }

    /// Noise scale of the current grid; lazy generation reuses it.
    #[must_use]
    pub fn noise_scale(world: &World) -> f32 {
        world.noise_scale
    }

    /// Terrain kinds the next generation will use.
    #[must_use]
    pub fn terrain_kinds(world: &World) -> &[TerrainKind] {
        &world.terrain
    }

    /// Reports whether a structure may be placed on the cell.
    #[must_use]
    pub fn is_free_for_placement(world: &World, coord: CellCoord) -> bool {
        node(world, coord).map_or(false, |cell| cell.traversable())
    }

    /// Pathfinders notified on regeneration, in notification order.
    #[must_use]
    pub fn registered_pathfinders(world: &World) -> Vec<PathfinderId> {
        world.pathfinders.iter().copied().collect()
    }

    /// Cells currently flagged as occupied, in row-major order.
    #[must_use]
    pub fn occupied_cells(world: &World) -> Vec<CellCoord> {
        world.grid.as_ref().map_or_else(Vec::new, |grid| {
            grid.cells()
                .iter()
                .filter(|cell| cell.occupied())
                .map(Cell::coord)
                .collect()
        })
    }

    /// Number of ticks applied so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Total simulated time applied so far.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.elapsed
    }
}
