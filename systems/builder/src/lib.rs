#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Structure placement system that validates footprints and emits occupancy commands.

use serde::{Deserialize, Serialize};
use skirmish_core::{CellCoord, Command, Event, StructureId};
use skirmish_world::Grid;
use thiserror::Error;
use tracing::{debug, info};

/// Kinds of static structures that can be placed on the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StructureKind {
    /// Single-cell lookout.
    Outpost,
    /// Square two by two building.
    Barracks,
    /// Three cells laid out along x.
    Wall,
}

impl StructureKind {
    /// Footprint dimensions as `(width, height)` in cells.
    #[must_use]
    pub const fn footprint(self) -> (u32, u32) {
        match self {
            Self::Outpost => (1, 1),
            Self::Barracks => (2, 2),
            Self::Wall => (3, 1),
        }
    }

    /// Cells covered when the structure is anchored at `origin`, row-major.
    pub fn cells(self, origin: CellCoord) -> impl Iterator<Item = CellCoord> {
        let (width, height) = self.footprint();
        (0..height as i32).flat_map(move |dy| {
            (0..width as i32).map(move |dx| origin.offset(dx, dy))
        })
    }
}

/// Behaviour switches for the builder.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Re-occupy every known footprint after the grid is rebuilt.
    pub reapply_after_regeneration: bool,
}

/// Structure accepted by the builder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlacedStructure {
    /// Identifier allocated on placement.
    pub id: StructureId,
    /// Kind of the structure.
    pub kind: StructureKind,
    /// Lowest cell of the footprint.
    pub origin: CellCoord,
}

/// Reasons a placement request is refused.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum PlacementError {
    /// No grid has been generated yet.
    #[error("no grid has been generated")]
    NotInitialized,
    /// Part of the footprint lies outside the grid.
    #[error("cell ({}, {}) lies outside the grid", .cell.x(), .cell.y())]
    OutOfBounds {
        /// First offending cell.
        cell: CellCoord,
    },
    /// Part of the footprint is already taken.
    #[error("cell ({}, {}) is already occupied", .cell.x(), .cell.y())]
    Occupied {
        /// First offending cell.
        cell: CellCoord,
    },
    /// Part of the footprint is on terrain that cannot hold a structure.
    #[error("cell ({}, {}) is not walkable", .cell.x(), .cell.y())]
    Unwalkable {
        /// First offending cell.
        cell: CellCoord,
    },
}

/// System that owns placed structures and translates them into occupancy.
#[derive(Debug, Clone, Default)]
pub struct Builder {
    config: Config,
    structures: Vec<PlacedStructure>,
    next_structure: u32,
}

impl Builder {
    /// Creates a builder with the provided configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Structures currently tracked, in placement order.
    #[must_use]
    pub fn structures(&self) -> &[PlacedStructure] {
        &self.structures
    }

    /// Validates the footprint and emits one occupancy command per covered cell.
    ///
    /// Cells claimed by earlier placements count as occupied even before the
    /// world has applied their commands.
    pub fn place(
        &mut self,
        kind: StructureKind,
        origin: CellCoord,
        grid: Option<&Grid>,
        out: &mut Vec<Command>,
    ) -> Result<StructureId, PlacementError> {
        let grid = grid.ok_or(PlacementError::NotInitialized)?;
        for cell in kind.cells(origin) {
            let stored = grid
                .cell(cell)
                .map_err(|_| PlacementError::OutOfBounds { cell })?;
            if !stored.walkable() {
                return Err(PlacementError::Unwalkable { cell });
            }
            if stored.occupied() || self.claims(cell) {
                return Err(PlacementError::Occupied { cell });
            }
        }

        let id = StructureId::new(self.next_structure);
        self.next_structure = self.next_structure.saturating_add(1);
        self.structures.push(PlacedStructure { id, kind, origin });
        emit_occupancy(kind, origin, out);
        debug!(structure = id.get(), ?kind, ?origin, "structure placed");
        Ok(id)
    }

    /// Reacts to regenerations according to [`Config::reapply_after_regeneration`].
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            if !matches!(event, Event::GridRegenerated { .. }) || self.structures.is_empty() {
                continue;
            }

            if self.config.reapply_after_regeneration {
                info!(
                    structures = self.structures.len(),
                    "re-applying structures after regeneration"
                );
                for structure in &self.structures {
                    emit_occupancy(structure.kind, structure.origin, out);
                }
            } else {
                info!(
                    structures = self.structures.len(),
                    "regeneration cleared all structures"
                );
                self.structures.clear();
            }
        }
    }

    fn claims(&self, cell: CellCoord) -> bool {
        self.structures
            .iter()
            .any(|structure| structure.kind.cells(structure.origin).any(|claimed| claimed == cell))
    }
}

fn emit_occupancy(kind: StructureKind, origin: CellCoord, out: &mut Vec<Command>) {
    out.extend(kind.cells(origin).map(|cell| Command::SetCellOccupied {
        cell,
        occupied: true,
    }));
}
