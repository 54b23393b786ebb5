//! A 2D spatial and collision core built in Rust
//!
//! This crate provides:
//! - Hierarchical 2D transforms with lazy world-matrix caching
//! - Axis-aligned box colliders and a scene-owned collision registry
//! - Tile grids with solid, sloped and one-way cells
//! - Entity-vs-entity and entity-vs-tile velocity resolvers
//! - Entity Component System (ECS) storage with hecs

pub mod core;
pub mod ecs;
pub mod physics;
pub mod tilemap;

// Re-exports for convenience
pub use glam;
pub use hecs;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::core::{ConfigError, EventQueue, GameEvent, Scene, SimConfig, Time};
    pub use crate::ecs::{
        ChangeKind, Disabled, Gravity, Name, TransformId, TransformListener,
        TransformListeners, Transforms, Velocity, World,
    };
    pub use crate::physics::{
        Aabb, BoxCollider, CollisionRegistry, Mover, Side, TileMover, Trigger, TriggerHandle,
    };
    pub use crate::tilemap::{MapError, MapSource, Tile, TileKind, TileMap, TileOverrides};
    pub use glam::{Affine2, IVec2, UVec2, Vec2};
}
