//! Tile-map sources
//!
//! Maps are authored as a grid of atlas coordinates per layer and read from
//! JSON or RON. Collision behaviour is not stored per cell: it comes from a
//! [`TileOverrides`] table keyed by atlas coordinate and applied at load.

use std::fs;
use std::path::Path;

use glam::{IVec2, UVec2, Vec2};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use super::grid::{TileLayer, TileMap};
use super::tile::{EMPTY_ATLAS, Tile};

// ============================================================================
// Overrides
// ============================================================================

/// Per-atlas-entry collision behaviour. Unlisted entries are solid and flat.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileOverrides {
    /// Atlas entries ignored by collision
    pub non_collidable: FxHashSet<IVec2>,
    /// Atlas entries that only block from above
    pub one_way: FxHashSet<IVec2>,
    /// Atlas entries with a nonzero slope
    pub slopes: FxHashMap<IVec2, i16>,
}

impl TileOverrides {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_non_collidable(mut self, atlas: IVec2) -> Self {
        self.non_collidable.insert(atlas);
        self
    }

    #[must_use]
    pub fn with_one_way(mut self, atlas: IVec2) -> Self {
        self.one_way.insert(atlas);
        self
    }

    #[must_use]
    pub fn with_slope(mut self, atlas: IVec2, slope: i16) -> Self {
        self.slopes.insert(atlas, slope);
        self
    }

    /// Build the tile record for `atlas` placed at `cell`
    #[must_use]
    pub fn tile(&self, cell: UVec2, atlas: IVec2) -> Tile {
        if atlas == EMPTY_ATLAS {
            return Tile::empty(cell);
        }
        Tile {
            cell,
            atlas,
            collidable: !self.non_collidable.contains(&atlas),
            one_way: self.one_way.contains(&atlas),
            slope: self.slopes.get(&atlas).copied().unwrap_or(0),
        }
    }

    /// Parse overrides from a RON string
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid RON for this type
    pub fn from_ron_str(s: &str) -> Result<Self, MapError> {
        ron::from_str(s).map_err(|e| MapError::Parse(e.to_string()))
    }

    /// Load overrides from a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, MapError> {
        let content = fs::read_to_string(path).map_err(|e| MapError::Io(e.to_string()))?;
        Self::from_ron_str(&content)
    }
}

// ============================================================================
// Source format
// ============================================================================

/// One authored layer: `cells[y][x]` holds an atlas coordinate, `[-1, -1]` for empty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSource {
    pub name: String,
    pub cell_width: f32,
    pub cell_height: f32,
    pub cells: Vec<Vec<[i32; 2]>>,
}

/// Authored map, dimensions in cells
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapSource {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub layers: Vec<LayerSource>,
}

impl MapSource {
    /// Parse a map from a JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid map document
    pub fn from_json_str(s: &str) -> Result<Self, MapError> {
        serde_json::from_str(s).map_err(|e| MapError::Parse(e.to_string()))
    }

    /// Parse a map from a RON string
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid map document
    pub fn from_ron_str(s: &str) -> Result<Self, MapError> {
        ron::from_str(s).map_err(|e| MapError::Parse(e.to_string()))
    }

    /// Load a map file, choosing RON for `.ron` and JSON otherwise
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MapError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| MapError::Io(e.to_string()))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("ron") => Self::from_ron_str(&content),
            _ => Self::from_json_str(&content),
        }
    }

    /// Save the map to a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), MapError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| MapError::Serialize(e.to_string()))?;
        fs::write(path, json).map_err(|e| MapError::Io(e.to_string()))
    }

    /// Save the map to a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_ron(&self, path: impl AsRef<Path>) -> Result<(), MapError> {
        let ron_string = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| MapError::Serialize(e.to_string()))?;
        fs::write(path, ron_string).map_err(|e| MapError::Io(e.to_string()))
    }

    /// Validate the grid and build a map with `overrides` applied
    ///
    /// # Errors
    ///
    /// Returns an error on a dimension mismatch, a non-positive cell size or a
    /// negative atlas coordinate other than the empty marker
    pub fn build(&self, overrides: TileOverrides) -> Result<TileMap, MapError> {
        let mut map = TileMap::new(self.width, self.height).with_overrides(overrides);

        for source in &self.layers {
            let cell_size = Vec2::new(source.cell_width, source.cell_height);
            if !(cell_size.x > 0.0 && cell_size.y > 0.0) {
                return Err(MapError::InvalidCellSize {
                    layer: source.name.clone(),
                });
            }

            let rows = source.cells.len();
            let mismatch = rows != self.height as usize
                || source.cells.iter().any(|row| row.len() != self.width as usize);
            if mismatch {
                let columns = source.cells.first().map_or(0, Vec::len);
                return Err(MapError::DimensionMismatch {
                    layer: source.name.clone(),
                    expected: UVec2::new(self.width, self.height),
                    found: UVec2::new(columns as u32, rows as u32),
                });
            }

            let mut layer = TileLayer::new(&source.name, cell_size, self.width, self.height);
            for (y, row) in source.cells.iter().enumerate() {
                for (x, &[ax, ay]) in row.iter().enumerate() {
                    let cell = UVec2::new(x as u32, y as u32);
                    let atlas = IVec2::new(ax, ay);
                    if atlas != EMPTY_ATLAS && (ax < 0 || ay < 0) {
                        return Err(MapError::InvalidAtlas {
                            layer: source.name.clone(),
                            cell,
                            atlas,
                        });
                    }
                    layer.set(map.overrides.tile(cell, atlas));
                }
            }
            map.push_layer(layer);
        }

        Ok(map)
    }
}

// ============================================================================
// Loading into the component
// ============================================================================

impl TileMap {
    /// Load a map file and apply `overrides`
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated
    pub fn load(path: impl AsRef<Path>, overrides: TileOverrides) -> Result<Self, MapError> {
        let path = path.as_ref();
        let mut map = MapSource::load(path)?.build(overrides)?;
        map.source = Some(path.to_path_buf());
        log::debug!(
            "Loaded tile map {} ({} layers)",
            path.display(),
            map.layers().len()
        );
        Ok(map)
    }

    /// Replace this map's contents with the file at `path`, keeping the current
    /// overrides. On failure the current grid is left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated
    pub fn load_from(&mut self, path: impl AsRef<Path>) -> Result<(), MapError> {
        let loaded = Self::load(path, self.overrides.clone())?;
        *self = loaded;
        Ok(())
    }

    /// Reload from the file this map was last loaded from
    ///
    /// # Errors
    ///
    /// Returns [`MapError::NoSource`] for maps built in code, otherwise any
    /// error from [`TileMap::load_from`]
    pub fn reload(&mut self) -> Result<(), MapError> {
        let path = self.source.clone().ok_or(MapError::NoSource)?;
        self.load_from(path)
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Errors that can occur while loading tile maps
#[derive(Debug, Clone, PartialEq)]
pub enum MapError {
    /// IO error
    Io(String),
    /// Malformed document
    Parse(String),
    /// Serialization error
    Serialize(String),
    /// A layer's grid does not match the map dimensions
    DimensionMismatch {
        layer: String,
        expected: UVec2,
        found: UVec2,
    },
    /// A layer has a zero or negative cell size
    InvalidCellSize { layer: String },
    /// A negative atlas coordinate that is not the empty marker
    InvalidAtlas {
        layer: String,
        cell: UVec2,
        atlas: IVec2,
    },
    /// Reload requested for a map that was not loaded from a file
    NoSource,
}

impl std::fmt::Display for MapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {e}"),
            Self::Parse(e) => write!(f, "Parse error: {e}"),
            Self::Serialize(e) => write!(f, "Serialization error: {e}"),
            Self::DimensionMismatch {
                layer,
                expected,
                found,
            } => write!(
                f,
                "Layer '{layer}' is {}x{} cells, expected {}x{}",
                found.x, found.y, expected.x, expected.y
            ),
            Self::InvalidCellSize { layer } => {
                write!(f, "Layer '{layer}' has a non-positive cell size")
            }
            Self::InvalidAtlas { layer, cell, atlas } => write!(
                f,
                "Layer '{layer}' cell ({}, {}) has invalid atlas coordinate ({}, {})",
                cell.x, cell.y, atlas.x, atlas.y
            ),
            Self::NoSource => write!(f, "Map has no source file"),
        }
    }
}

impl std::error::Error for MapError {}
