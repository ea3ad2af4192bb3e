//! Deterministic noise-banded terrain generation.

use std::ops::Range;

use fastnoise_lite::{FastNoiseLite, NoiseType};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use skirmish_core::{CellCoord, GridSettings, TerrainCatalog};

use crate::grid::{Cell, Grid};

/// Interval the per-axis sampling offsets are drawn from.
const OFFSET_RANGE: Range<f32> = -1_000.0..1_000.0;

/// Coherent noise sampled in the unit interval, decorrelated per seed by offsets.
pub(crate) struct TerrainNoise {
    noise: FastNoiseLite,
    offset_x: f32,
    offset_y: f32,
    scale: f32,
}

impl TerrainNoise {
    /// Draws the sampling offsets from a generator seeded with `seed`.
    pub(crate) fn new(seed: u64, scale: f32) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let offset_x = rng.gen_range(OFFSET_RANGE);
        let offset_y = rng.gen_range(OFFSET_RANGE);

        let mut noise = FastNoiseLite::new();
        noise.set_noise_type(Some(NoiseType::Perlin));
        noise.set_frequency(Some(1.0));

        Self {
            noise,
            offset_x,
            offset_y,
            scale,
        }
    }

    /// Noise value for the cell at `(x, y)`, remapped from `[-1, 1]` into `[0, 1]`.
    pub(crate) fn sample(&self, x: i32, y: i32) -> f32 {
        let sample_x = x as f32 * self.scale + self.offset_x;
        let sample_y = y as f32 * self.scale + self.offset_y;
        let raw = self.noise.get_noise_2d(sample_x, sample_y);
        ((raw + 1.0) * 0.5).clamp(0.0, 1.0)
    }
}

/// Builds every cell of a fresh grid in row-major order.
///
/// Callers validate `settings` beforehand.
pub(crate) fn generate(
    settings: GridSettings,
    catalog: &TerrainCatalog,
    seed: u64,
    noise_scale: f32,
    generation: u64,
) -> Grid {
    let noise = TerrainNoise::new(seed, noise_scale);
    let width = i32::try_from(settings.width).unwrap_or(0);
    let height = i32::try_from(settings.height).unwrap_or(0);
    let mut cells = Vec::with_capacity(settings.cell_count());

    for y in 0..height {
        for x in 0..width {
            let coord = CellCoord::new(x, y);
            let terrain = catalog.select(noise.sample(x, y));
            cells.push(Cell::from_terrain(coord, &settings, catalog, terrain));
        }
    }

    Grid::from_cells(settings, seed, noise_scale, generation, cells)
}
