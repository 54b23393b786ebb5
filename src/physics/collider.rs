//! Box collider component

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::aabb::Aabb;

/// Axis-aligned box attached to an entity.
///
/// The global box is derived from the entity's world position and scale every
/// time it is requested; rotation is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxCollider {
    /// Local rectangle: `position` is the offset from the entity, `size` the extent
    pub local: Aabb,
    /// Center the rectangle on the entity position instead of hanging it from it
    pub centered: bool,
    /// Colliders interact only with the exact same layer
    pub layer: u32,
    /// Non-collidable colliders are ignored by resolvers
    pub collidable: bool,
}

impl BoxCollider {
    /// A centered collider with no offset on layer 0
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            local: Aabb::new(0.0, 0.0, width, height),
            centered: true,
            layer: 0,
            collidable: true,
        }
    }

    /// A collider from an explicit local rectangle
    #[must_use]
    pub fn from_rect(local: Aabb) -> Self {
        Self {
            local,
            ..Self::new(0.0, 0.0)
        }
    }

    #[must_use]
    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.local.position = offset;
        self
    }

    #[must_use]
    pub fn with_centered(mut self, centered: bool) -> Self {
        self.centered = centered;
        self
    }

    #[must_use]
    pub fn with_layer(mut self, layer: u32) -> Self {
        self.layer = layer;
        self
    }

    #[must_use]
    pub fn with_collidable(mut self, collidable: bool) -> Self {
        self.collidable = collidable;
        self
    }

    /// World-space box for an owner at `position` with world `scale`
    #[must_use]
    pub fn global_aabb(&self, position: Vec2, scale: Vec2) -> Aabb {
        let size = self.local.size * scale;
        let mut origin = position + self.local.position * scale;
        if self.centered {
            origin -= size * 0.5;
        }
        Aabb {
            position: origin,
            size,
        }
    }

    /// Whether two colliders may interact
    #[must_use]
    pub fn interacts_with(&self, other: &BoxCollider) -> bool {
        self.collidable && other.collidable && self.layer == other.layer
    }
}

/// Marks an entity's collider as a trigger; scenes register it for overlap events
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Trigger;
