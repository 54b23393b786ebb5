//! Entity-versus-entity resolution through the public API

use glam::Vec2;
use tilecore::prelude::*;

fn spawn_box(
    world: &mut World,
    registry: &mut CollisionRegistry,
    at: Vec2,
    size: f32,
) -> hecs::Entity {
    let e = world.spawn_at(
        at,
        (
            BoxCollider::new(size, size).with_centered(false),
            Mover::new(),
        ),
    );
    registry.register_collider(e);
    e
}

#[test]
fn moving_box_stops_flush_against_obstacle() {
    let mut world = World::new();
    let mut registry = CollisionRegistry::new();
    let a = spawn_box(&mut world, &mut registry, Vec2::new(0.0, 0.0), 20.0);
    let b = spawn_box(&mut world, &mut registry, Vec2::new(50.0, 0.0), 20.0);

    let mut velocity = Vec2::new(100.0, 0.0);
    Mover::move_entity(&mut world, &registry, a, &mut velocity, 1.0);

    assert_eq!(velocity.x, 0.0);
    let a_box = CollisionRegistry::collider_aabb(&world, a).unwrap();
    let b_box = CollisionRegistry::collider_aabb(&world, b).unwrap();
    assert_eq!(a_box.right(), b_box.left());
    assert!(!a_box.intersects(&b_box));
}

#[test]
fn moving_left_stops_on_right_side() {
    let mut world = World::new();
    let mut registry = CollisionRegistry::new();
    let wall = spawn_box(&mut world, &mut registry, Vec2::new(0.0, 0.0), 20.0);
    let a = spawn_box(&mut world, &mut registry, Vec2::new(40.0, 5.0), 10.0);

    let mut velocity = Vec2::new(-30.0, 0.0);
    Mover::move_entity(&mut world, &registry, a, &mut velocity, 1.0);

    assert_eq!(velocity, Vec2::ZERO);
    assert_eq!(world.position(a), Some(Vec2::new(20.0, 5.0)));
    assert_eq!(world.get::<Mover>(a).unwrap().contacts(), &[wall]);
}

#[test]
fn rising_box_hits_ceiling_without_floor_flag() {
    let mut world = World::new();
    let mut registry = CollisionRegistry::new();
    spawn_box(&mut world, &mut registry, Vec2::new(0.0, 0.0), 20.0);
    let a = spawn_box(&mut world, &mut registry, Vec2::new(5.0, 30.0), 10.0);

    let mut velocity = Vec2::new(0.0, -20.0);
    Mover::resolve(&mut world, &registry, a, &mut velocity, 1.0);

    let mover = world.get::<Mover>(a).unwrap();
    assert!(mover.collided_this_frame);
    assert!(!mover.on_floor);
    assert_eq!(world.position(a), Some(Vec2::new(5.0, 20.0)));
}

#[test]
fn zero_velocity_is_idempotent() {
    let mut world = World::new();
    let mut registry = CollisionRegistry::new();
    let a = spawn_box(&mut world, &mut registry, Vec2::new(0.0, 0.0), 10.0);
    spawn_box(&mut world, &mut registry, Vec2::new(10.0, 0.0), 10.0);
    spawn_box(&mut world, &mut registry, Vec2::new(0.0, 10.0), 10.0);

    for _ in 0..10 {
        let mut velocity = Vec2::ZERO;
        Mover::move_entity(&mut world, &registry, a, &mut velocity, 1.0 / 60.0);
        assert_eq!(velocity, Vec2::ZERO);
    }
    assert_eq!(world.position(a), Some(Vec2::ZERO));
}

#[test]
fn contacts_are_cleared_each_call() {
    let mut world = World::new();
    let mut registry = CollisionRegistry::new();
    let a = spawn_box(&mut world, &mut registry, Vec2::new(0.0, 0.0), 10.0);
    spawn_box(&mut world, &mut registry, Vec2::new(15.0, 0.0), 10.0);

    let mut velocity = Vec2::new(10.0, 0.0);
    assert!(Mover::resolve(&mut world, &registry, a, &mut velocity, 1.0));

    let mut away = Vec2::new(-10.0, 0.0);
    assert!(!Mover::resolve(&mut world, &registry, a, &mut away, 1.0));
    assert!(world.get::<Mover>(a).unwrap().contacts().is_empty());
}
