//! 2D collision module
//!
//! Axis-aligned boxes, a scene-owned collision registry and two discrete
//! resolvers: [`Mover`] for entity-versus-entity and [`TileMover`] for
//! entity-versus-tile movement.

mod aabb;
mod collider;
pub mod contact;
mod mover;
mod registry;
mod tile_mover;

pub use aabb::Aabb;
pub use collider::{BoxCollider, Trigger};
pub use contact::Side;
pub use mover::Mover;
pub use registry::{CollisionRegistry, Overlap, TileHit, TileHits, TriggerHandle};
pub use tile_mover::{DEFAULT_SLOPE_STEP_LIMIT, TileMover};
