//! Scenes: a world plus the collision state and clock that drive it
//!
//! A scene owns its [`CollisionRegistry`], so several scenes can coexist
//! without sharing collision state.

use std::path::Path;
use std::time::Duration;

use glam::Vec2;
use hecs::Entity;

use super::config::{ConfigError, SimConfig};
use super::events::{EventQueue, GameEvent};
use super::time::Time;
use crate::ecs::{Gravity, Name, Velocity, World};
use crate::physics::{BoxCollider, CollisionRegistry, Mover, TileMover, Trigger};
use crate::tilemap::{MapError, TileMap, TileOverrides};

/// A simulated scene
pub struct Scene {
    /// Scene name
    pub name: String,
    /// Entities, components and transforms
    pub world: World,
    /// Active colliders, maps and triggers
    pub registry: CollisionRegistry,
    /// Events published by the last frame
    pub events: EventQueue,
    time: Time,
    config: SimConfig,
    /// Stable processing order
    bodies: Vec<Entity>,
    paused: bool,
}

impl Scene {
    /// Create an empty scene with the default configuration
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let config = SimConfig::default();
        Self {
            name: name.into(),
            world: World::new(),
            registry: CollisionRegistry::new(),
            events: EventQueue::new(),
            time: Time::new(config.timestep(), config.max_steps_per_frame),
            config,
            bodies: Vec::new(),
            paused: false,
        }
    }

    /// Create an empty scene with a validated configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid
    pub fn with_config(name: impl Into<String>, config: SimConfig) -> Result<Self, ConfigError> {
        let mut scene = Self::new(name);
        scene.set_config(config)?;
        Ok(scene)
    }

    #[must_use]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Replace the configuration; restarts the fixed-step clock
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid; the current one is kept
    pub fn set_config(&mut self, config: SimConfig) -> Result<(), ConfigError> {
        let config = config.validate()?;
        self.time = Time::new(config.timestep(), config.max_steps_per_frame);
        self.config = config;
        Ok(())
    }

    #[must_use]
    pub fn time(&self) -> &Time {
        &self.time
    }

    // -------------------------------------------------------------------------
    // Entities
    // -------------------------------------------------------------------------

    /// Spawn an entity and register whatever collision components it carries
    pub fn add_entity(&mut self, components: impl hecs::DynamicBundle) -> Entity {
        let entity = self.world.spawn(components);
        self.register(entity);
        self.bodies.push(entity);
        self.events.push(GameEvent::EntityAdded { entity });
        log::debug!("Added entity {entity:?} to scene '{}'", self.name);
        entity
    }

    /// Spawn an entity at a world position
    pub fn add_entity_at(&mut self, position: Vec2, components: impl hecs::DynamicBundle) -> Entity {
        let entity = self.add_entity(components);
        self.world.set_position(entity, position);
        entity
    }

    /// Spawn an entity as a child of `parent`, at the parent's origin
    pub fn add_child(&mut self, parent: Entity, components: impl hecs::DynamicBundle) -> Entity {
        let child = self.add_entity(components);
        if !self.world.set_parent(child, Some(parent)) {
            log::warn!("Could not attach {child:?} to {parent:?}");
        }
        child
    }

    fn register(&mut self, entity: Entity) {
        if self.world.has::<BoxCollider>(entity) {
            self.registry.register_collider(entity);
        }
        if self.world.has::<TileMap>(entity) {
            self.registry.register_map(entity);
        }
        if self.world.has::<Trigger>(entity) {
            self.registry.register_trigger(entity);
        }
    }

    /// Unregister and despawn an entity. Its children become roots.
    pub fn remove_entity(&mut self, entity: Entity) -> bool {
        if !self.world.contains(entity) {
            return false;
        }
        self.registry.unregister_all(entity);
        self.bodies.retain(|&e| e != entity);
        let removed = self.world.despawn(entity).is_ok();
        if removed {
            self.events.push(GameEvent::EntityRemoved { entity });
            log::debug!("Removed entity {entity:?} from scene '{}'", self.name);
        }
        removed
    }

    /// Enable or disable an entity; disabled entities neither move nor block
    pub fn set_enabled(&mut self, entity: Entity, enabled: bool) {
        self.world.set_enabled(entity, enabled);
    }

    /// First entity, in insertion order, with the given name
    #[must_use]
    pub fn find_entity(&self, name: &str) -> Option<Entity> {
        self.bodies.iter().copied().find(|&e| {
            self.world
                .get::<Name>(e)
                .is_ok_and(|n| n.0 == name)
        })
    }

    /// Entities in processing order
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.bodies
    }

    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.bodies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    // -------------------------------------------------------------------------
    // Simulation
    // -------------------------------------------------------------------------

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Advance by a frame of real time, running as many fixed steps as fit in
    /// the step budget. Returns the number of steps run.
    ///
    /// Events from every step of the frame are published together.
    pub fn update(&mut self, frame_delta: Duration) -> u32 {
        if self.paused {
            return 0;
        }
        let steps = self.time.advance(frame_delta);
        let dt = self.time.fixed_delta_seconds();
        for _ in 0..steps {
            self.simulate(dt);
        }
        self.events.swap();
        steps
    }

    /// Run exactly one step of `dt` seconds and publish its events
    pub fn step(&mut self, dt: f32) {
        if self.paused {
            return;
        }
        self.simulate(dt);
        self.time.record_step(Duration::from_secs_f32(dt.max(0.0)));
        self.events.swap();
    }

    fn simulate(&mut self, dt: f32) {
        for i in 0..self.bodies.len() {
            let entity = self.bodies[i];
            self.step_body(entity, dt);
        }

        for overlap in self.registry.overlaps(&self.world) {
            self.events.push(GameEvent::TriggerOverlap {
                handle: overlap.handle,
                trigger: overlap.trigger,
                other: overlap.other,
            });
        }
    }

    fn step_body(&mut self, entity: Entity, dt: f32) {
        if !self.world.is_enabled(entity) {
            return;
        }
        let Ok(mut velocity) = self.world.get::<Velocity>(entity).map(|v| v.0) else {
            return;
        };

        if let Ok(gravity) = self.world.get::<Gravity>(entity).map(|g| g.0) {
            velocity.y += self.config.gravity * gravity * dt;
        }

        if self.world.has::<TileMover>(entity) {
            TileMover::resolve_with(
                &mut self.world,
                &self.registry,
                entity,
                &mut velocity,
                dt,
                self.config.slope_step_limit,
            );
        }

        if self.world.has::<Mover>(entity)
            && Mover::resolve(&mut self.world, &self.registry, entity, &mut velocity, dt)
            && let Ok(mover) = self.world.get::<Mover>(entity)
        {
            for &other in mover.contacts() {
                self.events.push(GameEvent::Contact { entity, other });
            }
        }

        self.world.translate(entity, velocity * dt);
        if let Ok(mut stored) = self.world.get_mut::<Velocity>(entity) {
            stored.0 = velocity;
        }
    }

    // -------------------------------------------------------------------------
    // Tile maps
    // -------------------------------------------------------------------------

    /// Load a map file into `entity`'s [`TileMap`], attaching one if missing.
    ///
    /// On failure the error is logged, a [`GameEvent::MapLoadFailed`] is queued
    /// and the previous grid stays in place.
    ///
    /// # Errors
    ///
    /// Returns the load error
    pub fn load_map(&mut self, entity: Entity, path: impl AsRef<Path>) -> Result<(), MapError> {
        let path = path.as_ref();
        let result = if self.world.has::<TileMap>(entity) {
            match self.world.get_mut::<TileMap>(entity) {
                Ok(mut map) => map.load_from(path),
                Err(e) => Err(MapError::Io(e.to_string())),
            }
        } else {
            TileMap::load(path, TileOverrides::default()).and_then(|map| {
                self.world
                    .inner
                    .insert_one(entity, map)
                    .map_err(|e| MapError::Io(e.to_string()))?;
                self.registry.register_map(entity);
                Ok(())
            })
        };
        self.finish_map_load(entity, result)
    }

    /// Reload `entity`'s map from its source file
    ///
    /// # Errors
    ///
    /// Returns the load error; the previous grid stays in place
    pub fn reload_map(&mut self, entity: Entity) -> Result<(), MapError> {
        let result = match self.world.get_mut::<TileMap>(entity) {
            Ok(mut map) => map.reload(),
            Err(_) => Err(MapError::NoSource),
        };
        self.finish_map_load(entity, result)
    }

    fn finish_map_load(&mut self, map: Entity, result: Result<(), MapError>) -> Result<(), MapError> {
        match &result {
            Ok(()) => {
                log::debug!("Tile map {map:?} loaded");
                self.events.push(GameEvent::MapLoaded { map });
            }
            Err(error) => {
                log::error!("Failed to load tile map for {map:?}: {error}");
                self.events.push(GameEvent::MapLoadFailed {
                    map,
                    error: error.clone(),
                });
            }
        }
        result
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_registers_components() {
        let mut scene = Scene::new("test");
        let body = scene.add_entity((BoxCollider::new(8.0, 8.0), Name::new("body")));
        let zone = scene.add_entity((BoxCollider::new(8.0, 8.0), Trigger));
        let map = scene.add_entity((TileMap::new(2, 2),));

        assert!(scene.registry.is_collider(body));
        assert!(scene.registry.trigger_handle(zone).is_some());
        assert!(scene.registry.is_map(map));
        assert_eq!(scene.find_entity("body"), Some(body));
        assert_eq!(scene.entities(), &[body, zone, map]);
    }

    #[test]
    fn test_remove_entity_unregisters() {
        let mut scene = Scene::new("test");
        let zone = scene.add_entity((BoxCollider::new(8.0, 8.0), Trigger));

        assert!(scene.remove_entity(zone));
        assert!(!scene.registry.is_collider(zone));
        assert!(scene.registry.trigger_handle(zone).is_none());
        assert!(scene.is_empty());
        assert!(!scene.remove_entity(zone));
    }

    #[test]
    fn test_gravity_integrates_velocity() {
        let config = SimConfig::default().with_gravity(100.0);
        let mut scene = Scene::with_config("test", config).unwrap();
        let e = scene.add_entity((Velocity::new(10.0, 0.0), Gravity::default()));

        scene.step(0.5);

        assert_eq!(scene.world.get::<Velocity>(e).unwrap().0, Vec2::new(10.0, 50.0));
        assert_eq!(scene.world.position(e), Some(Vec2::new(5.0, 25.0)));
    }

    #[test]
    fn test_paused_scene_does_not_step() {
        let mut scene = Scene::new("test");
        let e = scene.add_entity((Velocity::new(10.0, 0.0),));

        scene.pause();
        assert_eq!(scene.update(Duration::from_secs(1)), 0);
        scene.step(1.0);
        assert_eq!(scene.world.position(e), Some(Vec2::ZERO));

        scene.resume();
        assert!(scene.update(Duration::from_millis(50)) > 0);
        assert_ne!(scene.world.position(e), Some(Vec2::ZERO));
    }

    #[test]
    fn test_disabled_entities_are_frozen() {
        let mut scene = Scene::new("test");
        let e = scene.add_entity((Velocity::new(10.0, 0.0),));
        scene.set_enabled(e, false);

        scene.step(1.0);
        assert_eq!(scene.world.position(e), Some(Vec2::ZERO));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SimConfig::default().with_fixed_timestep(-1.0);
        assert!(Scene::with_config("bad", config).is_err());
    }
}
