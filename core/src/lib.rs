#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Skirmish simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative grid world, and pure systems. Adapters submit [`Command`]
//! values describing desired mutations, the world executes those commands via
//! its `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query the
//! immutable grid, and respond exclusively with new command batches.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod terrain;

pub use glam::{Vec2, Vec3};
pub use terrain::{TerrainCatalog, TerrainColor, TerrainId, TerrainKind};

/// Canonical banner emitted when the simulation boots.
pub const WELCOME_BANNER: &str = "Skirmish tactical grid online.";

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the grid dimensions, cell size and plane convention.
    ///
    /// Takes effect on the next generation; the current grid is untouched.
    ConfigureGrid {
        /// Settings used by subsequent generations.
        settings: GridSettings,
    },
    /// Replaces the terrain catalog consulted during generation.
    ConfigureTerrain {
        /// Terrain kinds ordered from low to high noise bands.
        kinds: Vec<TerrainKind>,
        /// Single terrain used when `kinds` is empty.
        fallback: Option<TerrainKind>,
    },
    /// Reseeds the generator that draws seeds for [`Command::RandomizeSeedAndRebuild`].
    ConfigureReseed {
        /// Seed for the reseed generator.
        seed: u64,
    },
    /// Rebuilds the entire grid from the provided seed and noise scale.
    GenerateGrid {
        /// Seed controlling the noise sampling offsets.
        seed: u64,
        /// Distance in noise space between two neighbouring cells.
        noise_scale: f32,
    },
    /// Draws a fresh seed and rebuilds the grid with it.
    RandomizeSeedAndRebuild,
    /// Toggles the occupancy flag of a single cell.
    SetCellOccupied {
        /// Cell whose occupancy changes.
        cell: CellCoord,
        /// Whether the cell becomes occupied.
        occupied: bool,
    },
    /// Subscribes a pathfinder to regeneration notifications.
    RegisterPathfinder {
        /// Pathfinder to notify.
        pathfinder: PathfinderId,
    },
    /// Removes a pathfinder from regeneration notifications.
    UnregisterPathfinder {
        /// Pathfinder that no longer wants notifications.
        pathfinder: PathfinderId,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that every cell was rebuilt.
    GridRegenerated {
        /// Monotonic counter identifying the new grid.
        generation: u64,
        /// Seed used to build the grid.
        seed: u64,
    },
    /// Reports that a generation request was ignored.
    GenerationSkipped {
        /// Why the world refused to build.
        reason: ConfigurationError,
    },
    /// Reports that regeneration dropped occupancy recorded on the previous grid.
    ///
    /// Emitted in the same batch as [`Event::GridRegenerated`], before any
    /// system has re-applied its footprints, so occupancy may be restored by
    /// commands that follow it.
    OccupancyDiscarded {
        /// Number of occupied cells lost.
        cells: usize,
    },
    /// Asks the owner of a pathfinder to re-run its last search.
    PathfinderRefreshRequested {
        /// Pathfinder that should search again.
        pathfinder: PathfinderId,
    },
    /// Confirms that a cell's occupancy flag changed.
    CellOccupancyChanged {
        /// Cell that changed.
        cell: CellCoord,
        /// New occupancy value.
        occupied: bool,
    },
    /// Reports that an occupancy request could not be honoured.
    OccupancyRejected {
        /// Cell named by the request.
        cell: CellCoord,
        /// Specific reason the request failed.
        reason: GridError,
    },
}

/// Location of a single grid cell expressed as x and y indices.
///
/// Indices are signed because world-to-grid conversion is not bounds-checked
/// and may land outside the grid on either side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    x: i32,
    y: i32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Index along the grid's x axis.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Index along the grid's y axis.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Returns the coordinate displaced by the provided deltas.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x.saturating_add(dx), self.y.saturating_add(dy))
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

/// Which pair of world axes the grid is laid out on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plane {
    /// Grid y runs along world z; world y is up.
    #[default]
    Xz,
    /// Grid y runs along world y; world z is depth.
    Xy,
}

impl Plane {
    /// World position of the provided cell index for the given cell size.
    #[must_use]
    pub fn to_world(self, cell: CellCoord, cell_size: f32) -> Vec3 {
        let x = cell.x() as f32;
        let y = cell.y() as f32;
        match self {
            Self::Xz => Vec3::new(x, 0.0, y) * cell_size,
            Self::Xy => Vec3::new(x, y, 0.0) * cell_size,
        }
    }

    /// Extracts the two in-plane components of a world position.
    #[must_use]
    pub fn project(self, position: Vec3) -> Vec2 {
        match self {
            Self::Xz => Vec2::new(position.x, position.z),
            Self::Xy => Vec2::new(position.x, position.y),
        }
    }
}

/// Dimensions and layout of the grid.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSettings {
    /// Number of cells along x.
    pub width: u32,
    /// Number of cells along y.
    pub height: u32,
    /// Side length of a cell in world units.
    pub cell_size: f32,
    /// World axes the grid is laid out on.
    pub plane: Plane,
}

impl GridSettings {
    /// Creates settings for a `width` by `height` grid.
    #[must_use]
    pub const fn new(width: u32, height: u32, cell_size: f32, plane: Plane) -> Self {
        Self {
            width,
            height,
            cell_size,
            plane,
        }
    }

    /// Checks that the settings describe a buildable grid.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigurationError::ZeroDimensions {
                width: self.width,
                height: self.height,
            });
        }

        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(ConfigurationError::InvalidCellSize(self.cell_size));
        }

        if i32::try_from(self.width).is_err() || i32::try_from(self.height).is_err() {
            return Err(ConfigurationError::ZeroDimensions {
                width: self.width,
                height: self.height,
            });
        }

        Ok(())
    }

    /// Number of cells described by the settings.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        let cells = u64::from(self.width) * u64::from(self.height);
        usize::try_from(cells).unwrap_or(0)
    }
}

impl Default for GridSettings {
    fn default() -> Self {
        Self::new(20, 20, 1.0, Plane::Xz)
    }
}

/// Unique identifier assigned to a moving agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(u32);

impl AgentId {
    /// Creates a new agent identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a pathfinder subscribed to grid regeneration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PathfinderId(u32);

impl PathfinderId {
    /// Creates a new pathfinder identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a placed structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StructureId(u32);

impl StructureId {
    /// Creates a new structure identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the structure identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Reasons the world refuses to generate a grid.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigurationError {
    /// No grid settings were configured.
    #[error("grid settings are missing")]
    MissingGridSettings,
    /// Width or height is zero or exceeds the signed index range.
    #[error("grid dimensions {width}x{height} are not usable")]
    ZeroDimensions {
        /// Configured width.
        width: u32,
        /// Configured height.
        height: u32,
    },
    /// The cell size is not a positive finite number.
    #[error("cell size {0} must be positive and finite")]
    InvalidCellSize(f32),
    /// The noise scale is not a finite number.
    #[error("noise scale {0} must be finite")]
    InvalidNoiseScale(f32),
    /// The catalog holds no terrain and no fallback was supplied.
    #[error("terrain catalog is empty and no default terrain was supplied")]
    EmptyTerrainCatalog,
    /// An authored terrain layout does not cover the grid exactly.
    #[error("terrain layout holds {actual} cells but the grid needs {expected}")]
    LayoutMismatch {
        /// Cells required by the settings.
        expected: usize,
        /// Cells supplied by the layout.
        actual: usize,
    },
    /// A terrain declares a zero traversal weight.
    #[error("terrain '{name}' must have a positive weight")]
    ZeroWeight {
        /// Name of the offending terrain.
        name: String,
    },
}

/// Failures when addressing grid cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum GridError {
    /// The index lies outside `[0, width) x [0, height)`.
    #[error("cell ({}, {}) lies outside the {width}x{height} grid", .cell.x(), .cell.y())]
    OutOfBounds {
        /// Requested cell.
        cell: CellCoord,
        /// Grid width at the time of the request.
        width: u32,
        /// Grid height at the time of the request.
        height: u32,
    },
    /// No grid has been generated yet.
    #[error("grid has not been generated")]
    NotInitialized,
}
