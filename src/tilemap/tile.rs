//! Tile records

use glam::{IVec2, UVec2};
use serde::{Deserialize, Serialize};

/// Atlas coordinate marking an empty cell
pub const EMPTY_ATLAS: IVec2 = IVec2::new(-1, -1);

/// Collision behaviour of a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileKind {
    /// No tile in this cell
    Empty,
    /// Present but ignored by collision
    Passable,
    /// Blocks from every side
    Solid,
    /// Floor height varies linearly across the tile
    Sloped,
    /// Blocks only downward motion from above
    OneWay,
}

/// Immutable record for one grid cell.
///
/// `slope` is a signed rise per unit run: positive rises left-to-right,
/// negative rises right-to-left, zero is flat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    /// Grid coordinate inside the layer
    pub cell: UVec2,
    /// Atlas coordinate, `(-1, -1)` for empty cells
    pub atlas: IVec2,
    pub collidable: bool,
    pub one_way: bool,
    pub slope: i16,
}

impl Tile {
    /// An empty cell
    #[must_use]
    pub const fn empty(cell: UVec2) -> Self {
        Self {
            cell,
            atlas: EMPTY_ATLAS,
            collidable: false,
            one_way: false,
            slope: 0,
        }
    }

    /// A solid, flat tile
    #[must_use]
    pub const fn solid(cell: UVec2, atlas: IVec2) -> Self {
        Self {
            cell,
            atlas,
            collidable: true,
            one_way: false,
            slope: 0,
        }
    }

    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.atlas == EMPTY_ATLAS
    }

    #[must_use]
    #[inline]
    pub fn is_sloped(&self) -> bool {
        !self.is_empty() && self.slope != 0
    }

    /// Classify the tile for collision purposes
    #[must_use]
    pub fn kind(&self) -> TileKind {
        if self.is_empty() {
            TileKind::Empty
        } else if !self.collidable {
            TileKind::Passable
        } else if self.slope != 0 {
            TileKind::Sloped
        } else if self.one_way {
            TileKind::OneWay
        } else {
            TileKind::Solid
        }
    }
}
