//! Entity Component System module
//!
//! Built on top of the hecs ECS library, with an arena-backed transform hierarchy

mod components;
mod hierarchy;
mod world;

pub use components::{
    Disabled, Gravity, Name, TransformHandle, TransformListener, TransformListeners, Velocity,
};
pub use hierarchy::{ChangeKind, TransformChange, TransformId, Transforms};
pub use world::World;
