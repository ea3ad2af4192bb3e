//! Dense cell storage and the coordinate helpers built on it.

use skirmish_core::{
    CellCoord, ConfigurationError, GridError, GridSettings, Plane, TerrainCatalog, TerrainId, Vec3,
};

/// Single grid square carrying terrain data and occupancy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cell {
    coord: CellCoord,
    world_position: Vec3,
    walkable: bool,
    weight: u32,
    occupied: bool,
    terrain: TerrainId,
}

impl Cell {
    pub(crate) const fn new(
        coord: CellCoord,
        world_position: Vec3,
        walkable: bool,
        weight: u32,
        terrain: TerrainId,
    ) -> Self {
        Self {
            coord,
            world_position,
            walkable,
            weight,
            occupied: false,
            terrain,
        }
    }

    pub(crate) fn from_terrain(
        coord: CellCoord,
        settings: &GridSettings,
        catalog: &TerrainCatalog,
        terrain: TerrainId,
    ) -> Self {
        let world_position = settings.plane.to_world(coord, settings.cell_size);
        match catalog.get(terrain) {
            Some(kind) => Self::new(coord, world_position, kind.walkable(), kind.weight(), terrain),
            None => Self::new(coord, world_position, false, 1, terrain),
        }
    }

    /// Index of the cell within the grid.
    #[must_use]
    pub const fn coord(&self) -> CellCoord {
        self.coord
    }

    /// World-space position of the cell.
    #[must_use]
    pub const fn world_position(&self) -> Vec3 {
        self.world_position
    }

    /// Whether the terrain permits traversal at all.
    #[must_use]
    pub const fn walkable(&self) -> bool {
        self.walkable
    }

    /// Cost charged for entering the cell.
    #[must_use]
    pub const fn weight(&self) -> u32 {
        self.weight
    }

    /// Whether a structure currently blocks the cell.
    #[must_use]
    pub const fn occupied(&self) -> bool {
        self.occupied
    }

    /// Terrain the cell was generated from.
    #[must_use]
    pub const fn terrain(&self) -> TerrainId {
        self.terrain
    }

    /// Walkable and not occupied.
    #[must_use]
    pub const fn traversable(&self) -> bool {
        self.walkable && !self.occupied
    }
}

/// Rectangular, row-major array of cells produced by one generation.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    settings: GridSettings,
    seed: u64,
    noise_scale: f32,
    generation: u64,
    cells: Vec<Cell>,
}

impl Grid {
    pub(crate) fn from_cells(
        settings: GridSettings,
        seed: u64,
        noise_scale: f32,
        generation: u64,
        cells: Vec<Cell>,
    ) -> Self {
        Self {
            settings,
            seed,
            noise_scale,
            generation,
            cells,
        }
    }

    /// Builds a grid from an authored row-major terrain layout instead of noise.
    ///
    /// The result carries seed zero and generation zero. Identifiers missing
    /// from the catalog produce unwalkable cells.
    pub fn from_layout(
        settings: GridSettings,
        catalog: &TerrainCatalog,
        layout: &[TerrainId],
    ) -> Result<Self, ConfigurationError> {
        settings.validate()?;
        if layout.len() != settings.cell_count() {
            return Err(ConfigurationError::LayoutMismatch {
                expected: settings.cell_count(),
                actual: layout.len(),
            });
        }

        let width = settings.width as usize;
        let cells = layout
            .iter()
            .enumerate()
            .map(|(index, &terrain)| {
                let coord = CellCoord::new((index % width) as i32, (index / width) as i32);
                Cell::from_terrain(coord, &settings, catalog, terrain)
            })
            .collect();

        Ok(Self::from_cells(settings, 0, 0.0, 0, cells))
    }

    /// Settings the grid was built from.
    #[must_use]
    pub const fn settings(&self) -> &GridSettings {
        &self.settings
    }

    /// Number of cells along x.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.settings.width
    }

    /// Number of cells along y.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.settings.height
    }

    /// Side length of a cell in world units.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.settings.cell_size
    }

    /// World axes the grid is laid out on.
    #[must_use]
    pub const fn plane(&self) -> Plane {
        self.settings.plane
    }

    /// Seed the grid was generated from.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Noise scale the grid was generated with.
    #[must_use]
    pub const fn noise_scale(&self) -> f32 {
        self.noise_scale
    }

    /// Monotonic counter distinguishing successive regenerations.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Every cell in row-major order.
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Reports whether the index lies inside the grid.
    #[must_use]
    pub fn contains(&self, coord: CellCoord) -> bool {
        self.index_of(coord).is_some()
    }

    /// Dense array offset of the cell, if it lies inside the grid.
    #[must_use]
    pub fn index_of(&self, coord: CellCoord) -> Option<usize> {
        let x = u32::try_from(coord.x()).ok()?;
        let y = u32::try_from(coord.y()).ok()?;
        if x >= self.width() || y >= self.height() {
            return None;
        }

        let width = usize::try_from(self.width()).ok()?;
        let row = usize::try_from(y).ok()?;
        let column = usize::try_from(x).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }

    /// Returns the cell at the provided index.
    pub fn cell(&self, coord: CellCoord) -> Result<&Cell, GridError> {
        self.index_of(coord)
            .and_then(|index| self.cells.get(index))
            .ok_or(self.out_of_bounds(coord))
    }

    pub(crate) fn cell_mut(&mut self, coord: CellCoord) -> Result<&mut Cell, GridError> {
        let error = self.out_of_bounds(coord);
        let index = self.index_of(coord).ok_or(error)?;
        self.cells.get_mut(index).ok_or(error)
    }

    /// Maps a world position to the nearest cell index.
    ///
    /// Rounds half to even, matching the rounding used when authoring scenes.
    /// The result is not bounds-checked.
    #[must_use]
    pub fn xy_index(&self, position: Vec3) -> CellCoord {
        let planar = self.plane().project(position) / self.cell_size();
        CellCoord::new(
            planar.x.round_ties_even() as i32,
            planar.y.round_ties_even() as i32,
        )
    }

    /// World position of an arbitrary cell index.
    #[must_use]
    pub fn world_position(&self, coord: CellCoord) -> Vec3 {
        self.plane().to_world(coord, self.cell_size())
    }

    /// In-bounds 4-connected neighbours in `+x, -x, +y, -y` order.
    ///
    /// The order feeds the pathfinder's tie-breaking and must stay fixed.
    #[must_use]
    pub fn neighbors(&self, coord: CellCoord) -> Neighbors {
        let mut neighbors = Neighbors::default();

        for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
            let candidate = coord.offset(dx, dy);
            if self.contains(candidate) {
                neighbors.push(candidate);
            }
        }

        neighbors
    }

    /// Walkable and not occupied; false outside the grid.
    #[must_use]
    pub fn is_traversable(&self, coord: CellCoord) -> bool {
        self.cell(coord).map_or(false, Cell::traversable)
    }

    /// Number of cells currently flagged as occupied.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.occupied).count()
    }

    /// Flags or clears occupancy of a single cell; walkability is untouched.
    pub fn set_occupied(&mut self, coord: CellCoord, occupied: bool) -> Result<(), GridError> {
        self.cell_mut(coord)?.occupied = occupied;
        Ok(())
    }

    fn out_of_bounds(&self, cell: CellCoord) -> GridError {
        GridError::OutOfBounds {
            cell,
            width: self.width(),
            height: self.height(),
        }
    }
}

/// Fixed-capacity iterator over up to four neighbouring cells.
#[derive(Clone, Debug, Default)]
pub struct Neighbors {
    buffer: [Option<CellCoord>; 4],
    len: usize,
    cursor: usize,
}

impl Neighbors {
    fn push(&mut self, cell: CellCoord) {
        if self.len < self.buffer.len() {
            self.buffer[self.len] = Some(cell);
            self.len += 1;
        }
    }
}

impl Iterator for Neighbors {
    type Item = CellCoord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.len {
            return None;
        }

        let value = self.buffer[self.cursor];
        self.cursor += 1;
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_grid(width: u32, height: u32, plane: Plane, cell_size: f32) -> Grid {
        let settings = GridSettings::new(width, height, cell_size, plane);
        let mut cells = Vec::new();
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                let coord = CellCoord::new(x, y);
                cells.push(Cell::new(
                    coord,
                    plane.to_world(coord, cell_size),
                    true,
                    1,
                    TerrainId::new(0),
                ));
            }
        }
        Grid::from_cells(settings, 0, 0.1, 1, cells)
    }

    #[test]
    fn neighbors_follow_fixed_order_and_bounds() {
        let grid = open_grid(3, 3, Plane::Xz, 1.0);

        let center: Vec<_> = grid.neighbors(CellCoord::new(1, 1)).collect();
        assert_eq!(
            center,
            vec![
                CellCoord::new(2, 1),
                CellCoord::new(0, 1),
                CellCoord::new(1, 2),
                CellCoord::new(1, 0),
            ]
        );

        let corner: Vec<_> = grid.neighbors(CellCoord::new(0, 0)).collect();
        assert_eq!(corner, vec![CellCoord::new(1, 0), CellCoord::new(0, 1)]);
    }

    #[test]
    fn cell_lookup_reports_out_of_bounds() {
        let grid = open_grid(2, 2, Plane::Xz, 1.0);
        assert!(grid.cell(CellCoord::new(1, 1)).is_ok());
        assert_eq!(
            grid.cell(CellCoord::new(2, 0)),
            Err(GridError::OutOfBounds {
                cell: CellCoord::new(2, 0),
                width: 2,
                height: 2
            })
        );
        assert!(grid.cell(CellCoord::new(0, -1)).is_err());
    }

    #[test]
    fn xy_index_rounds_to_nearest_cell_per_plane() {
        let xz = open_grid(4, 4, Plane::Xz, 2.0);
        assert_eq!(xz.xy_index(Vec3::new(3.9, 50.0, 2.1)), CellCoord::new(2, 1));
        assert_eq!(xz.xy_index(Vec3::new(-3.0, 0.0, 0.0)), CellCoord::new(-2, 0));

        let xy = open_grid(4, 4, Plane::Xy, 1.0);
        assert_eq!(xy.xy_index(Vec3::new(0.5, 1.5, 9.0)), CellCoord::new(0, 2));
    }

    #[test]
    fn layout_must_cover_every_cell() {
        let settings = GridSettings::new(2, 2, 1.0, Plane::Xz);
        let catalog = TerrainCatalog::standard();
        let error = Grid::from_layout(settings, &catalog, &[TerrainId::new(2); 3])
            .expect_err("short layout");
        assert_eq!(
            error,
            ConfigurationError::LayoutMismatch {
                expected: 4,
                actual: 3
            }
        );

        let layout = [
            TerrainId::new(2),
            TerrainId::new(0),
            TerrainId::new(3),
            TerrainId::new(40),
        ];
        let grid = Grid::from_layout(settings, &catalog, &layout).expect("layout fits");
        assert!(grid.is_traversable(CellCoord::new(0, 0)));
        assert!(!grid.is_traversable(CellCoord::new(1, 0)));
        assert_eq!(grid.cell(CellCoord::new(0, 1)).map(Cell::weight), Ok(3));
        assert!(!grid.is_traversable(CellCoord::new(1, 1)));
    }

    #[test]
    fn occupancy_is_orthogonal_to_walkability() {
        let mut grid = open_grid(2, 1, Plane::Xz, 1.0);
        let cell = CellCoord::new(1, 0);
        grid.set_occupied(cell, true).expect("in bounds");

        let stored = grid.cell(cell).expect("in bounds");
        assert!(stored.walkable());
        assert!(stored.occupied());
        assert!(!stored.traversable());
        assert_eq!(grid.occupied_count(), 1);

        grid.set_occupied(cell, false).expect("in bounds");
        assert!(grid.is_traversable(cell));
        assert!(!grid.is_traversable(CellCoord::new(5, 5)));
    }
}
