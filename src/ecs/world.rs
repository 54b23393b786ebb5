//! World wrapper around hecs and the transform arena

use glam::Vec2;
use hecs::Entity;

use super::components::{Disabled, Name, TransformHandle, TransformListeners};
use super::hierarchy::{TransformId, Transforms};

/// Game world containing all entities, components and transforms.
///
/// Every entity spawned through the world owns a node in [`Transforms`].
/// Transform mutations made through the world deliver change notifications to
/// the entity's [`TransformListeners`] before returning.
pub struct World {
    /// The underlying hecs world
    pub inner: hecs::World,
    /// Transform arena
    pub transforms: Transforms,
}

impl World {
    /// Create a new empty world
    pub fn new() -> Self {
        Self {
            inner: hecs::World::new(),
            transforms: Transforms::new(),
        }
    }

    /// Spawn an entity with the given components at the origin
    pub fn spawn(&mut self, components: impl hecs::DynamicBundle) -> Entity {
        let entity = self.inner.spawn(components);
        let node = self.transforms.insert(Some(entity));
        // Spawning an entity never fails to accept a new component
        let _ = self.inner.insert_one(entity, TransformHandle(node));
        // Fresh nodes have no listeners to inform yet
        self.transforms.drain_changes();
        entity
    }

    /// Spawn an entity at a world position
    pub fn spawn_at(&mut self, position: Vec2, components: impl hecs::DynamicBundle) -> Entity {
        let entity = self.spawn(components);
        self.set_position(entity, position);
        entity
    }

    /// Despawn an entity, orphaning its children
    pub fn despawn(&mut self, entity: Entity) -> Result<(), hecs::NoSuchEntity> {
        if let Some(node) = self.transform(entity) {
            self.transforms.remove(node);
        }
        self.inner.despawn(entity)?;
        self.dispatch_transform_changes();
        Ok(())
    }

    /// Get a reference to a component
    pub fn get<T: hecs::Component>(
        &self,
        entity: Entity,
    ) -> Result<hecs::Ref<'_, T>, hecs::ComponentError> {
        self.inner.get::<&T>(entity)
    }

    /// Get a mutable reference to a component
    pub fn get_mut<T: hecs::Component>(
        &mut self,
        entity: Entity,
    ) -> Result<hecs::RefMut<'_, T>, hecs::ComponentError> {
        self.inner.get::<&mut T>(entity)
    }

    /// Check whether an entity carries a component
    pub fn has<T: hecs::Component>(&self, entity: Entity) -> bool {
        self.inner.satisfies::<&T>(entity).unwrap_or(false)
    }

    /// Check if an entity exists
    pub fn contains(&self, entity: Entity) -> bool {
        self.inner.contains(entity)
    }

    /// Get the number of entities
    pub fn len(&self) -> u32 {
        self.inner.len()
    }

    /// Check if the world is empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Clear all entities and transforms
    pub fn clear(&mut self) {
        self.inner.clear();
        self.transforms = Transforms::new();
    }

    /// Query for entities with specific components
    pub fn query<Q: hecs::Query>(&self) -> hecs::QueryBorrow<'_, Q> {
        self.inner.query::<Q>()
    }

    /// Query for entities with specific components (mutable)
    pub fn query_mut<Q: hecs::Query>(&mut self) -> hecs::QueryMut<'_, Q> {
        self.inner.query_mut::<Q>()
    }

    // -------------------------------------------------------------------------
    // Enabled State
    // -------------------------------------------------------------------------

    /// Whether an entity exists and is not disabled
    pub fn is_enabled(&self, entity: Entity) -> bool {
        self.contains(entity) && !self.has::<Disabled>(entity)
    }

    /// Enable or disable an entity
    pub fn set_enabled(&mut self, entity: Entity, enabled: bool) {
        if enabled {
            let _ = self.inner.remove_one::<Disabled>(entity);
        } else {
            let _ = self.inner.insert_one(entity, Disabled);
        }
    }

    // -------------------------------------------------------------------------
    // Hierarchy
    // -------------------------------------------------------------------------

    /// Transform node of an entity
    pub fn transform(&self, entity: Entity) -> Option<TransformId> {
        self.inner
            .get::<&TransformHandle>(entity)
            .ok()
            .map(|handle| handle.0)
    }

    /// Re-parent an entity (`None` detaches it)
    pub fn set_parent(&mut self, child: Entity, parent: Option<Entity>) -> bool {
        let Some(child_node) = self.transform(child) else {
            return false;
        };
        let parent_node = match parent {
            Some(parent) => match self.transform(parent) {
                Some(node) => Some(node),
                None => return false,
            },
            None => None,
        };
        let changed = self.transforms.set_parent(child_node, parent_node);
        self.dispatch_transform_changes();
        changed
    }

    /// Parent entity
    pub fn parent(&self, entity: Entity) -> Option<Entity> {
        let node = self.transform(entity)?;
        let parent = self.transforms.parent(node)?;
        self.transforms.owner(parent)
    }

    /// Child entities in insertion order
    pub fn children(&self, entity: Entity) -> Vec<Entity> {
        self.transform(entity)
            .map(|node| {
                self.transforms
                    .children(node)
                    .iter()
                    .filter_map(|&child| self.transforms.owner(child))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// First direct child with the given name
    pub fn find_child_by_name(&self, entity: Entity, name: &str) -> Option<Entity> {
        self.children(entity).into_iter().find(|&child| {
            self.inner
                .get::<&Name>(child)
                .is_ok_and(|child_name| child_name.0 == name)
        })
    }

    // -------------------------------------------------------------------------
    // Transform Access
    // -------------------------------------------------------------------------

    /// World position
    pub fn position(&self, entity: Entity) -> Option<Vec2> {
        self.transforms.position(self.transform(entity)?)
    }

    /// World rotation in radians
    pub fn rotation(&self, entity: Entity) -> Option<f32> {
        self.transforms.rotation(self.transform(entity)?)
    }

    /// World scale
    pub fn scale(&self, entity: Entity) -> Option<Vec2> {
        self.transforms.scale(self.transform(entity)?)
    }

    /// Local position
    pub fn local_position(&self, entity: Entity) -> Option<Vec2> {
        self.transforms.local_position(self.transform(entity)?)
    }

    /// Set the world position
    pub fn set_position(&mut self, entity: Entity, position: Vec2) {
        self.with_transform(entity, |t, id| t.set_position(id, position));
    }

    /// Set the local position
    pub fn set_local_position(&mut self, entity: Entity, position: Vec2) {
        self.with_transform(entity, |t, id| t.set_local_position(id, position));
    }

    /// Set the world rotation in radians
    pub fn set_rotation(&mut self, entity: Entity, radians: f32) {
        self.with_transform(entity, |t, id| t.set_rotation(id, radians));
    }

    /// Set the local rotation in radians
    pub fn set_local_rotation(&mut self, entity: Entity, radians: f32) {
        self.with_transform(entity, |t, id| t.set_local_rotation(id, radians));
    }

    /// Set the world scale
    pub fn set_scale(&mut self, entity: Entity, scale: Vec2) {
        self.with_transform(entity, |t, id| t.set_scale(id, scale));
    }

    /// Set the local scale
    pub fn set_local_scale(&mut self, entity: Entity, scale: Vec2) {
        self.with_transform(entity, |t, id| t.set_local_scale(id, scale));
    }

    /// Move by a world-space delta
    pub fn translate(&mut self, entity: Entity, delta: Vec2) {
        if let Some(position) = self.position(entity) {
            self.set_position(entity, position + delta);
        }
    }

    /// Run a transform mutation and deliver the resulting notifications
    pub fn with_transform<R>(
        &mut self,
        entity: Entity,
        f: impl FnOnce(&mut Transforms, TransformId) -> R,
    ) -> Option<R> {
        let node = self.transform(entity)?;
        let result = f(&mut self.transforms, node);
        self.dispatch_transform_changes();
        Some(result)
    }

    /// Deliver pending change records to listener components
    pub fn dispatch_transform_changes(&mut self) {
        if !self.transforms.has_pending_changes() {
            return;
        }
        let changes: Vec<_> = self.transforms.drain_changes().collect();
        for change in changes {
            let Some(owner) = change.owner else {
                continue;
            };
            if let Ok(mut listeners) = self.inner.get::<&mut TransformListeners>(owner) {
                listeners.notify(change.kind);
            }
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::ecs::{ChangeKind, TransformListener};

    #[derive(Default, Clone)]
    struct Counter {
        any: Arc<AtomicUsize>,
        position: Arc<AtomicUsize>,
        scale: Arc<AtomicUsize>,
    }

    impl TransformListener for Counter {
        fn on_transform_changed(&mut self, _kind: ChangeKind) {
            self.any.fetch_add(1, Ordering::SeqCst);
        }

        fn on_position_changed(&mut self) {
            self.position.fetch_add(1, Ordering::SeqCst);
        }

        fn on_scale_changed(&mut self) {
            self.scale.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_spawn_attaches_transform() {
        let mut world = World::new();
        let entity = world.spawn_at(Vec2::new(3.0, 4.0), (Name::new("crate"),));

        assert!(world.transform(entity).is_some());
        assert_eq!(world.position(entity), Some(Vec2::new(3.0, 4.0)));
    }

    #[test]
    fn test_listeners_fire_once_per_mutation() {
        let mut world = World::new();
        let counter = Counter::default();
        let entity = world.spawn((TransformListeners::single(counter.clone()),));

        world.set_local_position(entity, Vec2::new(1.0, 0.0));
        assert_eq!(counter.any.load(Ordering::SeqCst), 1);
        assert_eq!(counter.position.load(Ordering::SeqCst), 1);

        world.set_local_scale(entity, Vec2::splat(2.0));
        assert_eq!(counter.any.load(Ordering::SeqCst), 2);
        assert_eq!(counter.scale.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_children_are_notified() {
        let mut world = World::new();
        let counter = Counter::default();
        let parent = world.spawn(());
        let child = world.spawn((TransformListeners::single(counter.clone()),));
        world.set_parent(child, Some(parent));
        let _ = world.position(child);
        let before = counter.position.load(Ordering::SeqCst);

        world.set_position(parent, Vec2::new(8.0, 0.0));

        assert_eq!(counter.position.load(Ordering::SeqCst), before + 1);
        assert_eq!(world.position(child), Some(Vec2::new(8.0, 0.0)));
    }

    #[test]
    fn test_find_child_by_name() {
        let mut world = World::new();
        let parent = world.spawn(());
        let hand = world.spawn((Name::new("hand"),));
        let foot = world.spawn((Name::new("foot"),));
        world.set_parent(hand, Some(parent));
        world.set_parent(foot, Some(parent));

        assert_eq!(world.children(parent), vec![hand, foot]);
        assert_eq!(world.find_child_by_name(parent, "foot"), Some(foot));
        assert_eq!(world.find_child_by_name(parent, "tail"), None);
    }

    #[test]
    fn test_despawn_orphans_children() {
        let mut world = World::new();
        let parent = world.spawn_at(Vec2::new(10.0, 0.0), ());
        let child = world.spawn(());
        world.set_parent(child, Some(parent));
        world.set_local_position(child, Vec2::new(1.0, 0.0));

        world.despawn(parent).unwrap();

        assert_eq!(world.parent(child), None);
        assert_eq!(world.position(child), Some(Vec2::new(1.0, 0.0)));
    }

    #[test]
    fn test_enabled_toggle() {
        let mut world = World::new();
        let entity = world.spawn(());
        assert!(world.is_enabled(entity));

        world.set_enabled(entity, false);
        assert!(!world.is_enabled(entity));

        world.set_enabled(entity, true);
        assert!(world.is_enabled(entity));
    }
}
