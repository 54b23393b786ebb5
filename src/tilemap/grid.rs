//! Layered tile grids
//!
//! A [`TileMap`] is a component: its world placement comes from the owning
//! entity's transform (position + scale), so every spatial query takes that
//! origin and scale explicitly.

use std::path::{Path, PathBuf};

use glam::{IVec2, UVec2, Vec2};

use super::loader::TileOverrides;
use super::tile::Tile;
use crate::physics::Aabb;

// ============================================================================
// Layer
// ============================================================================

/// One named grid of tiles, stored row-major
#[derive(Debug, Clone, PartialEq)]
pub struct TileLayer {
    /// Layer name
    pub name: String,
    /// Unscaled size of one cell in world units
    pub cell_size: Vec2,
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
}

impl TileLayer {
    /// Create a layer filled with empty cells
    #[must_use]
    pub fn new(name: impl Into<String>, cell_size: Vec2, width: u32, height: u32) -> Self {
        let mut tiles = Vec::with_capacity((width as usize) * (height as usize));
        for y in 0..height {
            for x in 0..width {
                tiles.push(Tile::empty(UVec2::new(x, y)));
            }
        }
        Self {
            name: name.into(),
            cell_size,
            width,
            height,
            tiles,
        }
    }

    /// Width in cells
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in cells
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    fn index(&self, cell: UVec2) -> Option<usize> {
        (cell.x < self.width && cell.y < self.height)
            .then(|| (cell.y as usize) * (self.width as usize) + cell.x as usize)
    }

    /// Tile stored at `cell`, empty or not
    #[must_use]
    pub fn get(&self, cell: UVec2) -> Option<&Tile> {
        self.index(cell).map(|i| &self.tiles[i])
    }

    /// Replace the tile at its own cell; returns `false` when out of bounds
    pub fn set(&mut self, tile: Tile) -> bool {
        match self.index(tile.cell) {
            Some(i) => {
                self.tiles[i] = tile;
                true
            }
            None => false,
        }
    }

    /// All non-empty tiles
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter().filter(|t| !t.is_empty())
    }

    /// Cell containing `point` for a map placed at `origin` with `scale`
    #[must_use]
    pub fn cell_at(&self, point: Vec2, origin: Vec2, scale: Vec2) -> Option<UVec2> {
        let cell_size = self.cell_size * scale;
        if cell_size.x <= 0.0 || cell_size.y <= 0.0 {
            return None;
        }

        let local = ((point - origin) / cell_size).floor();
        if local.x < 0.0 || local.y < 0.0 {
            return None;
        }

        let cell = UVec2::new(local.x as u32, local.y as u32);
        (cell.x < self.width && cell.y < self.height).then_some(cell)
    }

    /// World-space box of `cell`
    #[must_use]
    pub fn tile_aabb(&self, cell: UVec2, origin: Vec2, scale: Vec2) -> Aabb {
        let size = self.cell_size * scale;
        Aabb {
            position: origin + cell.as_vec2() * size,
            size,
        }
    }
}

// ============================================================================
// Map component
// ============================================================================

/// A stack of tile layers sharing the same width and height in cells
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TileMap {
    width: u32,
    height: u32,
    layers: Vec<TileLayer>,
    pub(super) source: Option<PathBuf>,
    pub(super) overrides: TileOverrides,
}

impl TileMap {
    /// Create an empty map of `width` × `height` cells with no layers
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Attach atlas overrides used by [`TileMap::place`] and reloads
    #[must_use]
    pub fn with_overrides(mut self, overrides: TileOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Append an empty layer
    #[must_use]
    pub fn with_layer(mut self, name: impl Into<String>, cell_size: Vec2) -> Self {
        self.add_layer(name, cell_size);
        self
    }

    /// Append an empty layer and return its index
    pub fn add_layer(&mut self, name: impl Into<String>, cell_size: Vec2) -> usize {
        self.layers
            .push(TileLayer::new(name, cell_size, self.width, self.height));
        self.layers.len() - 1
    }

    pub(super) fn push_layer(&mut self, layer: TileLayer) {
        self.layers.push(layer);
    }

    /// Width in cells
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in cells
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn layers(&self) -> &[TileLayer] {
        &self.layers
    }

    #[must_use]
    pub fn layer(&self, index: usize) -> Option<&TileLayer> {
        self.layers.get(index)
    }

    /// Find a layer index by name
    #[must_use]
    pub fn layer_index(&self, name: &str) -> Option<usize> {
        self.layers.iter().position(|l| l.name == name)
    }

    /// File the map was loaded from, if any
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    #[must_use]
    pub fn overrides(&self) -> &TileOverrides {
        &self.overrides
    }

    /// Put the atlas entry `atlas` at `cell`, applying the map's overrides.
    ///
    /// Returns `false` if the layer or cell does not exist.
    pub fn place(&mut self, layer: usize, cell: UVec2, atlas: IVec2) -> bool {
        let tile = self.overrides.tile(cell, atlas);
        self.layers.get_mut(layer).is_some_and(|l| l.set(tile))
    }

    /// Clear the tile at `cell`
    pub fn clear(&mut self, layer: usize, cell: UVec2) -> bool {
        self.layers.get_mut(layer).is_some_and(|l| l.set(Tile::empty(cell)))
    }

    /// Cell of `layer` containing `point`
    #[must_use]
    pub fn cell_at(&self, layer: usize, point: Vec2, origin: Vec2, scale: Vec2) -> Option<UVec2> {
        self.layers.get(layer)?.cell_at(point, origin, scale)
    }

    /// Non-empty tile of `layer` under `point`
    #[must_use]
    pub fn tile_at(&self, layer: usize, point: Vec2, origin: Vec2, scale: Vec2) -> Option<&Tile> {
        let l = self.layers.get(layer)?;
        let cell = l.cell_at(point, origin, scale)?;
        l.get(cell).filter(|t| !t.is_empty())
    }

    /// World-space box of `cell` in `layer`
    #[must_use]
    pub fn tile_aabb(&self, layer: usize, cell: UVec2, origin: Vec2, scale: Vec2) -> Option<Aabb> {
        let l = self.layers.get(layer)?;
        l.get(cell)?;
        Some(l.tile_aabb(cell, origin, scale))
    }
}
