//! Simulation events
//!
//! A double-buffered queue: events pushed during a step become readable after
//! the scene swaps the buffers at the end of the frame, so readers always see
//! a complete, consistent batch.
//!
//! # Example
//!
//! ```ignore
//! scene.update(frame_delta);
//! for event in scene.events.iter() {
//!     if let GameEvent::TriggerOverlap { trigger, other, .. } = event {
//!         open_door(*trigger, *other);
//!     }
//! }
//! ```

use std::collections::VecDeque;

use hecs::Entity;

use crate::physics::TriggerHandle;
use crate::tilemap::MapError;

// ============================================================================
// Event Types
// ============================================================================

/// Things that happened during a simulation step.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum GameEvent {
    // -------------------------------------------------------------------------
    // Collision Events
    // -------------------------------------------------------------------------
    /// A registered trigger's box intersects another collider.
    TriggerOverlap {
        /// Registration handle of the trigger
        handle: TriggerHandle,
        /// Entity carrying the trigger
        trigger: Entity,
        /// Entity inside the trigger
        other: Entity,
    },

    /// A mover was stopped by another collider.
    Contact {
        /// The moving entity
        entity: Entity,
        /// The collider it ran into
        other: Entity,
    },

    // -------------------------------------------------------------------------
    // Scene Events
    // -------------------------------------------------------------------------
    /// An entity joined the scene.
    EntityAdded { entity: Entity },

    /// An entity left the scene.
    EntityRemoved { entity: Entity },

    // -------------------------------------------------------------------------
    // Map Events
    // -------------------------------------------------------------------------
    /// A tile map finished loading.
    MapLoaded { map: Entity },

    /// A tile map failed to load; the previous grid is still in place.
    MapLoadFailed { map: Entity, error: MapError },
}

// ============================================================================
// Event Queue
// ============================================================================

/// Double-buffered event queue.
///
/// Push: O(1) amortized. Swap: O(1).
#[derive(Debug)]
pub struct EventQueue {
    /// Events being written this frame
    pending: VecDeque<GameEvent>,
    /// Events from the previous frame, ready for reading
    processing: VecDeque<GameEvent>,
}

impl EventQueue {
    const DEFAULT_CAPACITY: usize = 64;

    /// Create a new event queue with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Create a new event queue with the given initial capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pending: VecDeque::with_capacity(capacity),
            processing: VecDeque::with_capacity(capacity),
        }
    }

    /// Queue an event; it becomes readable after the next [`EventQueue::swap`].
    #[inline]
    pub fn push(&mut self, event: GameEvent) {
        self.pending.push_back(event);
    }

    /// Publish pending events and start a fresh pending buffer.
    ///
    /// Events that were readable before the swap are discarded.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.pending, &mut self.processing);
        self.pending.clear();
    }

    /// Iterate over published events.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &GameEvent> {
        self.processing.iter()
    }

    /// Take ownership of published events.
    #[inline]
    pub fn drain(&mut self) -> impl Iterator<Item = GameEvent> + '_ {
        self.processing.drain(..)
    }

    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.processing.is_empty()
    }

    /// Number of published events.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.processing.len()
    }

    /// Number of events waiting for the next swap.
    #[must_use]
    #[inline]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Drop both buffers.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.processing.clear();
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
