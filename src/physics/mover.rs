//! Entity-versus-entity movement resolution
//!
//! A single discrete pass over the registered colliders. Results depend on
//! registry order: two movers approaching each other are resolved by whichever
//! moves first, and the second skips the pair because the first recorded it.

use glam::Vec2;
use hecs::Entity;
use smallvec::SmallVec;

use super::collider::BoxCollider;
use super::contact::{touching_bottom, touching_left, touching_right, touching_top};
use super::registry::CollisionRegistry;
use crate::ecs::World;

/// Resolves an entity's velocity against other box colliders.
///
/// State is rebuilt on every [`Mover::resolve`] call.
#[derive(Debug, Clone, Default)]
pub struct Mover {
    /// Landed on another collider during the last resolve
    pub on_floor: bool,
    /// Any contact during the last resolve
    pub collided_this_frame: bool,
    contacts: SmallVec<[Entity; 4]>,
}

impl Mover {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Entities resolved against during the last resolve, in contact order
    #[must_use]
    pub fn contacts(&self) -> &[Entity] {
        &self.contacts
    }

    /// Resolve then integrate: `position += velocity × dt`
    pub fn move_entity(
        world: &mut World,
        registry: &CollisionRegistry,
        entity: Entity,
        velocity: &mut Vec2,
        dt: f32,
    ) -> bool {
        let collided = Self::resolve(world, registry, entity, velocity, dt);
        world.translate(entity, *velocity * dt);
        collided
    }

    /// Clip `velocity` against every other collider on the same layer, snapping
    /// `entity` flush against whatever it would run into this step.
    ///
    /// Returns whether any contact happened. Entities without a collider, or
    /// with a non-collidable one, are left untouched.
    pub fn resolve(
        world: &mut World,
        registry: &CollisionRegistry,
        entity: Entity,
        velocity: &mut Vec2,
        dt: f32,
    ) -> bool {
        let mut on_floor = false;
        let mut contacts = SmallVec::<[Entity; 4]>::new();

        if let Ok(collider) = world.get::<BoxCollider>(entity).map(|c| *c)
            && collider.collidable
        {
            for &other in registry.colliders() {
                if other == entity || !world.is_enabled(other) {
                    continue;
                }
                let Ok(other_collider) = world.get::<BoxCollider>(other).map(|c| *c) else {
                    continue;
                };
                if !collider.interacts_with(&other_collider) {
                    continue;
                }
                // The other side already resolved this pair during the step
                if world
                    .get::<Mover>(other)
                    .is_ok_and(|m| m.contacts.contains(&entity))
                {
                    continue;
                }

                let (Some(a), Some(b)) = (
                    CollisionRegistry::collider_aabb(world, entity),
                    CollisionRegistry::collider_aabb(world, other),
                ) else {
                    continue;
                };

                let dx = velocity.x * dt;
                let dy = velocity.y * dt;
                let mut shift = Vec2::ZERO;
                let mut hit = false;

                if touching_left(&a, &b, dx) {
                    shift.x = b.left() - a.right();
                    velocity.x = 0.0;
                    hit = true;
                } else if touching_right(&a, &b, dx) {
                    shift.x = b.right() - a.left();
                    velocity.x = 0.0;
                    hit = true;
                }

                if touching_top(&a, &b, dy) {
                    shift.y = b.top() - a.bottom();
                    velocity.y = 0.0;
                    on_floor = true;
                    hit = true;
                } else if touching_bottom(&a, &b, dy) {
                    shift.y = b.bottom() - a.top();
                    velocity.y = 0.0;
                    hit = true;
                }

                if hit {
                    world.translate(entity, shift);
                    contacts.push(other);
                }
            }
        }

        let collided = !contacts.is_empty();
        if let Ok(mut mover) = world.get_mut::<Mover>(entity) {
            mover.on_floor = on_floor;
            mover.collided_this_frame = collided;
            mover.contacts = contacts;
        }
        collided
    }
}
