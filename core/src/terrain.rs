//! Immutable terrain definitions consumed by grid generation.

use serde::{Deserialize, Serialize};

use crate::ConfigurationError;

/// Display color of a terrain kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TerrainColor {
    red: u8,
    green: u8,
    blue: u8,
}

impl TerrainColor {
    /// Creates a new terrain color from byte RGB components.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Red component of the color.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the color.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the color.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }
}

/// Catalog entry describing one kind of terrain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainKind {
    name: String,
    walkable: bool,
    weight: u32,
    color: TerrainColor,
}

impl TerrainKind {
    /// Creates a terrain kind, rejecting zero traversal weights.
    pub fn new(
        name: impl Into<String>,
        walkable: bool,
        weight: u32,
        color: TerrainColor,
    ) -> Result<Self, ConfigurationError> {
        let name = name.into();
        if weight == 0 {
            return Err(ConfigurationError::ZeroWeight { name });
        }

        Ok(Self {
            name,
            walkable,
            weight,
            color,
        })
    }

    /// Human readable name of the terrain.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether agents may ever enter cells of this terrain.
    #[must_use]
    pub const fn walkable(&self) -> bool {
        self.walkable
    }

    /// Cost charged when entering a cell of this terrain.
    #[must_use]
    pub const fn weight(&self) -> u32 {
        self.weight
    }

    /// Display color of the terrain.
    #[must_use]
    pub const fn color(&self) -> TerrainColor {
        self.color
    }
}

/// Index of a terrain kind within its catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TerrainId(u16);

impl TerrainId {
    /// Creates a new terrain identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u16 {
        self.0
    }
}

/// Ordered, non-empty set of terrain kinds.
///
/// Order matters: generation maps the unit noise interval onto equal bands,
/// the first kind receiving the lowest noise values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TerrainCatalog {
    kinds: Vec<TerrainKind>,
}

impl TerrainCatalog {
    /// Builds a catalog from the provided kinds.
    pub fn new(kinds: Vec<TerrainKind>) -> Result<Self, ConfigurationError> {
        if kinds.is_empty() || kinds.len() > usize::from(u16::MAX) {
            return Err(ConfigurationError::EmptyTerrainCatalog);
        }

        if let Some(kind) = kinds.iter().find(|kind| kind.weight == 0) {
            return Err(ConfigurationError::ZeroWeight {
                name: kind.name.clone(),
            });
        }

        Ok(Self { kinds })
    }

    /// Builds a catalog from `kinds`, or from `fallback` alone when `kinds` is empty.
    pub fn with_fallback(
        kinds: &[TerrainKind],
        fallback: Option<&TerrainKind>,
    ) -> Result<Self, ConfigurationError> {
        match (kinds.is_empty(), fallback) {
            (false, _) => Self::new(kinds.to_vec()),
            (true, Some(fallback)) => Self::new(vec![fallback.clone()]),
            (true, None) => Err(ConfigurationError::EmptyTerrainCatalog),
        }
    }

    /// Terrain kinds used when nothing else is configured.
    #[must_use]
    pub fn standard_kinds() -> Vec<TerrainKind> {
        STANDARD_TERRAIN
            .iter()
            .map(|&(name, walkable, weight, color)| TerrainKind {
                name: name.to_owned(),
                walkable,
                weight,
                color,
            })
            .collect()
    }

    /// Catalog built from [`TerrainCatalog::standard_kinds`].
    #[must_use]
    pub fn standard() -> Self {
        Self {
            kinds: Self::standard_kinds(),
        }
    }

    /// Number of kinds in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Always false; catalogs cannot be empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Looks up a kind by identifier.
    #[must_use]
    pub fn get(&self, id: TerrainId) -> Option<&TerrainKind> {
        self.kinds.get(usize::from(id.get()))
    }

    /// Iterates kinds together with their identifiers.
    pub fn iter(&self) -> impl Iterator<Item = (TerrainId, &TerrainKind)> {
        self.kinds
            .iter()
            .enumerate()
            .map(|(index, kind)| (TerrainId::new(index as u16), kind))
    }

    /// Maps a noise sample in the unit interval onto a terrain band.
    ///
    /// Samples outside `[0, 1)` are clamped into the first or last band.
    #[must_use]
    pub fn select(&self, noise: f32) -> TerrainId {
        let last = self.kinds.len().saturating_sub(1);
        let scaled = (noise * self.kinds.len() as f32).floor();
        let index = if scaled.is_nan() || scaled < 0.0 {
            0
        } else {
            (scaled as usize).min(last)
        };
        TerrainId::new(index as u16)
    }
}

const STANDARD_TERRAIN: [(&str, bool, u32, TerrainColor); 5] = [
    ("water", false, 1, TerrainColor::from_rgb(0x2a, 0x6f, 0xdb)),
    ("sand", true, 2, TerrainColor::from_rgb(0xe3, 0xcf, 0x8a)),
    ("grass", true, 1, TerrainColor::from_rgb(0x4c, 0xa6, 0x3a)),
    ("forest", true, 3, TerrainColor::from_rgb(0x1f, 0x5e, 0x2b)),
    ("rock", false, 1, TerrainColor::from_rgb(0x7b, 0x76, 0x70)),
];
