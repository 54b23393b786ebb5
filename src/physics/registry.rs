//! Scene-owned collision registry
//!
//! Non-owning indexes of the entities that take part in collision: box
//! colliders, tile maps and triggers. Each index is a `Vec` plus a hash index
//! so insertion and removal are O(1) and iteration order is deterministic
//! (insertion order, with swap-remove on unregister).

use glam::{UVec2, Vec2};
use hecs::Entity;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::aabb::Aabb;
use super::collider::BoxCollider;
use super::contact::{self, Side};
use crate::ecs::World;
use crate::tilemap::{Tile, TileMap};

// ============================================================================
// Indexed set
// ============================================================================

#[derive(Debug, Default, Clone)]
struct IndexedSet {
    items: Vec<Entity>,
    index: FxHashMap<Entity, usize>,
}

impl IndexedSet {
    fn insert(&mut self, entity: Entity) -> bool {
        if self.index.contains_key(&entity) {
            return false;
        }
        self.index.insert(entity, self.items.len());
        self.items.push(entity);
        true
    }

    fn remove(&mut self, entity: Entity) -> bool {
        let Some(slot) = self.index.remove(&entity) else {
            return false;
        };
        self.items.swap_remove(slot);
        if let Some(&moved) = self.items.get(slot) {
            self.index.insert(moved, slot);
        }
        true
    }

    fn contains(&self, entity: Entity) -> bool {
        self.index.contains_key(&entity)
    }

    fn clear(&mut self) {
        self.items.clear();
        self.index.clear();
    }
}

// ============================================================================
// Query results
// ============================================================================

/// Handle returned by [`CollisionRegistry::register_trigger`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TriggerHandle(u32);

impl TriggerHandle {
    /// Raw handle value
    #[must_use]
    pub fn id(self) -> u32 {
        self.0
    }
}

/// A non-empty tile found by a registry lookup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileHit {
    /// Map entity owning the tile
    pub map: Entity,
    /// Layer index inside the map
    pub layer: usize,
    pub tile: Tile,
    /// World-space box of the tile
    pub aabb: Aabb,
}

impl TileHit {
    /// Identity of the grid cell, for deduplication
    #[must_use]
    pub fn key(&self) -> (Entity, usize, UVec2) {
        (self.map, self.layer, self.tile.cell)
    }
}

/// A trigger whose box intersects another collider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overlap {
    pub handle: TriggerHandle,
    pub trigger: Entity,
    pub other: Entity,
}

/// Tile hits for one point; a point rarely lands on more than a few layers
pub type TileHits = SmallVec<[TileHit; 4]>;

// ============================================================================
// Registry
// ============================================================================

/// Active colliders, tile maps and triggers of one scene
#[derive(Debug, Default)]
pub struct CollisionRegistry {
    colliders: IndexedSet,
    maps: IndexedSet,
    triggers: IndexedSet,
    trigger_handles: FxHashMap<Entity, TriggerHandle>,
    next_trigger: u32,
}

impl CollisionRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Registration
    // -------------------------------------------------------------------------

    /// Add a collider owner; returns `false` if it was already registered
    pub fn register_collider(&mut self, entity: Entity) -> bool {
        let added = self.colliders.insert(entity);
        if added {
            log::trace!("Registered collider {entity:?}");
        } else {
            log::trace!("Collider {entity:?} already registered");
        }
        added
    }

    /// Remove a collider owner; returns `false` if it was not registered
    pub fn unregister_collider(&mut self, entity: Entity) -> bool {
        let removed = self.colliders.remove(entity);
        if removed {
            log::trace!("Unregistered collider {entity:?}");
        } else {
            log::trace!("Collider {entity:?} was not registered");
        }
        removed
    }

    /// Add a tile-map owner; returns `false` if it was already registered
    pub fn register_map(&mut self, entity: Entity) -> bool {
        let added = self.maps.insert(entity);
        if added {
            log::trace!("Registered tile map {entity:?}");
        } else {
            log::trace!("Tile map {entity:?} already registered");
        }
        added
    }

    /// Remove a tile-map owner; returns `false` if it was not registered
    pub fn unregister_map(&mut self, entity: Entity) -> bool {
        let removed = self.maps.remove(entity);
        if removed {
            log::trace!("Unregistered tile map {entity:?}");
        } else {
            log::trace!("Tile map {entity:?} was not registered");
        }
        removed
    }

    /// Watch `entity`'s collider for overlaps. Registering twice returns the
    /// existing handle.
    pub fn register_trigger(&mut self, entity: Entity) -> TriggerHandle {
        if let Some(&handle) = self.trigger_handles.get(&entity) {
            log::trace!("Trigger {entity:?} already registered");
            return handle;
        }
        let handle = TriggerHandle(self.next_trigger);
        self.next_trigger += 1;
        self.triggers.insert(entity);
        self.trigger_handles.insert(entity, handle);
        log::trace!("Registered trigger {entity:?} as {}", handle.0);
        handle
    }

    /// Stop watching `entity`; returns `false` if it was not a trigger
    pub fn unregister_trigger(&mut self, entity: Entity) -> bool {
        let removed = self.triggers.remove(entity);
        self.trigger_handles.remove(&entity);
        log::trace!("Unregistered trigger {entity:?}: {removed}");
        removed
    }

    /// Drop every registration of `entity`
    pub fn unregister_all(&mut self, entity: Entity) {
        self.unregister_collider(entity);
        self.unregister_map(entity);
        if self.triggers.contains(entity) {
            self.unregister_trigger(entity);
        }
    }

    /// Forget everything
    pub fn clear(&mut self) {
        self.colliders.clear();
        self.maps.clear();
        self.triggers.clear();
        self.trigger_handles.clear();
    }

    #[must_use]
    pub fn is_collider(&self, entity: Entity) -> bool {
        self.colliders.contains(entity)
    }

    #[must_use]
    pub fn is_map(&self, entity: Entity) -> bool {
        self.maps.contains(entity)
    }

    #[must_use]
    pub fn trigger_handle(&self, entity: Entity) -> Option<TriggerHandle> {
        self.trigger_handles.get(&entity).copied()
    }

    /// Registered collider owners in iteration order
    #[must_use]
    pub fn colliders(&self) -> &[Entity] {
        &self.colliders.items
    }

    /// Registered tile-map owners in iteration order
    #[must_use]
    pub fn maps(&self) -> &[Entity] {
        &self.maps.items
    }

    /// Registered triggers in iteration order
    #[must_use]
    pub fn triggers(&self) -> &[Entity] {
        &self.triggers.items
    }

    // -------------------------------------------------------------------------
    // Entity queries
    // -------------------------------------------------------------------------

    /// Global box of an entity's collider, `None` without a collider or transform
    #[must_use]
    pub fn collider_aabb(world: &World, entity: Entity) -> Option<Aabb> {
        let collider = *world.get::<BoxCollider>(entity).ok()?;
        Some(collider.global_aabb(world.position(entity)?, world.scale(entity)?))
    }

    /// One-frame-ahead touching test between two entities' colliders
    #[must_use]
    pub fn touching(world: &World, a: Entity, b: Entity, side: Side, margin: f32) -> bool {
        match (Self::collider_aabb(world, a), Self::collider_aabb(world, b)) {
            (Some(a), Some(b)) => contact::touching(&a, &b, side, margin),
            _ => false,
        }
    }

    /// Every enabled trigger intersecting another enabled collider.
    ///
    /// Layers and the `collidable` flag are ignored on both sides.
    #[must_use]
    pub fn overlaps(&self, world: &World) -> Vec<Overlap> {
        let mut out = Vec::new();
        for &trigger in &self.triggers.items {
            if !world.is_enabled(trigger) {
                continue;
            }
            let (Some(handle), Some(bounds)) = (
                self.trigger_handle(trigger),
                Self::collider_aabb(world, trigger),
            ) else {
                continue;
            };
            for &other in &self.colliders.items {
                if other == trigger || !world.is_enabled(other) {
                    continue;
                }
                if Self::collider_aabb(world, other).is_some_and(|b| bounds.intersects(&b)) {
                    out.push(Overlap {
                        handle,
                        trigger,
                        other,
                    });
                }
            }
        }
        out
    }

    // -------------------------------------------------------------------------
    // Tile queries
    // -------------------------------------------------------------------------

    fn placement(world: &World, map: Entity) -> Option<(Vec2, Vec2)> {
        Some((world.position(map)?, world.scale(map)?))
    }

    /// Every non-empty tile under `point`, across all maps and layers
    #[must_use]
    pub fn tiles_at(&self, world: &World, point: Vec2) -> TileHits {
        let mut hits = TileHits::new();
        for &map_entity in &self.maps.items {
            if !world.is_enabled(map_entity) {
                continue;
            }
            let Ok(map) = world.get::<TileMap>(map_entity) else {
                continue;
            };
            let Some((origin, scale)) = Self::placement(world, map_entity) else {
                continue;
            };
            for (layer_index, layer) in map.layers().iter().enumerate() {
                let Some(cell) = layer.cell_at(point, origin, scale) else {
                    continue;
                };
                if let Some(&tile) = layer.get(cell).filter(|t| !t.is_empty()) {
                    hits.push(TileHit {
                        map: map_entity,
                        layer: layer_index,
                        tile,
                        aabb: layer.tile_aabb(cell, origin, scale),
                    });
                }
            }
        }
        hits
    }

    /// Whether any non-empty tile lies under `point`
    #[must_use]
    pub fn is_tile_at(&self, world: &World, point: Vec2) -> bool {
        !self.tiles_at(world, point).is_empty()
    }

    /// Sloped tiles under `point`
    #[must_use]
    pub fn sloped_tiles_at(&self, world: &World, point: Vec2) -> TileHits {
        let mut hits = self.tiles_at(world, point);
        hits.retain(|hit| hit.tile.is_sloped());
        hits
    }

    /// Cell of `layer` in `map` containing `point`
    #[must_use]
    pub fn cell_at(&self, world: &World, map: Entity, layer: usize, point: Vec2) -> Option<UVec2> {
        if !self.maps.contains(map) {
            return None;
        }
        let (origin, scale) = Self::placement(world, map)?;
        world
            .get::<TileMap>(map)
            .ok()?
            .cell_at(layer, point, origin, scale)
    }
}
