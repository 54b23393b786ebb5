//! Common ECS components

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::hierarchy::{ChangeKind, TransformId};

/// Links an entity to its node in the transform arena
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformHandle(pub TransformId);

/// Desired velocity in world units per second
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Velocity(pub Vec2);

impl Velocity {
    pub fn new(x: f32, y: f32) -> Self {
        Self(Vec2::new(x, y))
    }
}

/// Gravity multiplier applied by the scene step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gravity(pub f32);

impl Default for Gravity {
    fn default() -> Self {
        Self(1.0)
    }
}

/// Marker for entities excluded from simulation and collision
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Disabled;

/// Name component for debugging and lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

/// Receives transform change notifications for the owning entity.
///
/// All methods default to doing nothing. For every change the world calls
/// [`on_transform_changed`](Self::on_transform_changed) first, then the
/// kind-specific method.
pub trait TransformListener: Send + Sync + 'static {
    fn on_transform_changed(&mut self, _kind: ChangeKind) {}
    fn on_position_changed(&mut self) {}
    fn on_rotation_changed(&mut self) {}
    fn on_scale_changed(&mut self) {}
}

/// Listener components attached to an entity
#[derive(Default)]
pub struct TransformListeners(pub Vec<Box<dyn TransformListener>>);

impl TransformListeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with a single listener
    pub fn single(listener: impl TransformListener) -> Self {
        Self(vec![Box::new(listener)])
    }

    pub fn push(&mut self, listener: impl TransformListener) {
        self.0.push(Box::new(listener));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Deliver one change to every listener
    pub fn notify(&mut self, kind: ChangeKind) {
        for listener in &mut self.0 {
            listener.on_transform_changed(kind);
            match kind {
                ChangeKind::Position => listener.on_position_changed(),
                ChangeKind::Rotation => listener.on_rotation_changed(),
                ChangeKind::Scale => listener.on_scale_changed(),
            }
        }
    }
}

impl std::fmt::Debug for TransformListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformListeners")
            .field("len", &self.0.len())
            .finish()
    }
}
