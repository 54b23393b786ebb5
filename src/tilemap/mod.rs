//! Tile maps
//!
//! Layered grids of immutable tile records, loaded from JSON or RON sources
//! with per-atlas collision overrides.

mod grid;
mod loader;
mod tile;

pub use grid::{TileLayer, TileMap};
pub use loader::{LayerSource, MapError, MapSource, TileOverrides};
pub use tile::{EMPTY_ATLAS, Tile, TileKind};
