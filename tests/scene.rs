//! Whole-scene behaviour: stepping, events and map loading

use std::fs;
use std::time::Duration;

use glam::{IVec2, UVec2, Vec2};
use tilecore::prelude::*;

const DT: f32 = 1.0 / 60.0;

const FLOOR_JSON: &str = r#"{
    "width": 2,
    "height": 1,
    "layers": [
        { "name": "ground", "cell_width": 16.0, "cell_height": 16.0, "cells": [[[0, 0], [-1, -1]]] }
    ]
}"#;

/// 4×4 map of 16px cells with a solid bottom row (y 48..64)
fn floor_map() -> TileMap {
    let mut map = TileMap::new(4, 4).with_layer("ground", Vec2::splat(16.0));
    for x in 0..4 {
        map.place(0, UVec2::new(x, 3), IVec2::ZERO);
    }
    map
}

#[test]
fn falling_body_lands_and_rests_on_floor() {
    let mut scene = Scene::new("floor");
    scene.add_entity((floor_map(),));
    let body = scene.add_entity_at(
        Vec2::new(20.0, 30.0),
        (
            BoxCollider::new(8.0, 8.0).with_centered(false),
            Velocity::default(),
            Gravity::default(),
            TileMover::new(),
        ),
    );

    for _ in 0..90 {
        scene.step(DT);
    }

    let aabb = CollisionRegistry::collider_aabb(&scene.world, body).unwrap();
    assert!((aabb.bottom() - 48.0).abs() < 1e-3, "bottom at {}", aabb.bottom());
    assert!(scene.world.get::<TileMover>(body).unwrap().on_floor);
    assert_eq!(scene.world.get::<Velocity>(body).unwrap().0.y, 0.0);
    assert_eq!(scene.time().steps(), 90);
}

#[test]
fn trigger_overlap_is_published_after_the_frame() {
    let mut scene = Scene::new("triggers");
    let zone = scene.add_entity_at(
        Vec2::ZERO,
        (
            Name::new("zone"),
            BoxCollider::new(16.0, 16.0).with_centered(false).with_collidable(false),
            Trigger,
        ),
    );
    let body = scene.add_entity_at(
        Vec2::new(4.0, 4.0),
        (BoxCollider::new(4.0, 4.0).with_centered(false), Velocity::default()),
    );
    let handle = scene.registry.trigger_handle(zone).unwrap();

    let steps = scene.update(Duration::from_secs_f32(DT * 2.5));
    assert_eq!(steps, 2);

    let overlaps: Vec<_> = scene
        .events
        .iter()
        .filter(|e| matches!(e, GameEvent::TriggerOverlap { .. }))
        .collect();
    // One per step, all published together
    assert_eq!(overlaps.len(), 2);
    assert!(overlaps.iter().all(|e| matches!(
        e,
        GameEvent::TriggerOverlap { handle: h, trigger, other }
            if *h == handle && *trigger == zone && *other == body
    )));

    // The next frame replaces the published batch
    scene.remove_entity(body);
    scene.step(DT);
    assert!(
        !scene
            .events
            .iter()
            .any(|e| matches!(e, GameEvent::TriggerOverlap { .. }))
    );
}

#[test]
fn blocked_mover_reports_contact() {
    let mut scene = Scene::new("contacts");
    let runner = scene.add_entity_at(
        Vec2::ZERO,
        (
            BoxCollider::new(10.0, 10.0).with_centered(false),
            Velocity::new(600.0, 0.0),
            Mover::new(),
        ),
    );
    let wall = scene.add_entity_at(
        Vec2::new(15.0, 0.0),
        (BoxCollider::new(10.0, 10.0).with_centered(false), Mover::new()),
    );

    scene.step(DT);

    assert!(scene.events.iter().any(|e| matches!(
        e,
        GameEvent::Contact { entity, other } if *entity == runner && *other == wall
    )));
    assert_eq!(scene.world.position(runner), Some(Vec2::new(5.0, 0.0)));
    assert_eq!(scene.world.get::<Velocity>(runner).unwrap().0, Vec2::ZERO);
}

#[test]
fn failed_map_load_keeps_grid_and_reports() {
    let dir = tempfile::tempdir().unwrap();
    let broken = dir.path().join("broken.json");
    fs::write(&broken, "{ \"width\": 2").unwrap();

    let mut scene = Scene::new("maps");
    let level = scene.add_entity((floor_map(),));

    assert!(scene.load_map(level, &broken).is_err());
    assert!(scene.load_map(level, dir.path().join("missing.json")).is_err());

    let map = scene.world.get::<TileMap>(level).unwrap();
    assert!(map.tile_at(0, Vec2::new(8.0, 56.0), Vec2::ZERO, Vec2::ONE).is_some());
    drop(map);

    scene.events.swap();
    let failures = scene
        .events
        .iter()
        .filter(|e| matches!(e, GameEvent::MapLoadFailed { map, .. } if *map == level))
        .count();
    assert_eq!(failures, 2);
}

#[test]
fn map_load_attaches_and_registers_grid() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("level.json");
    fs::write(&path, FLOOR_JSON).unwrap();

    let mut scene = Scene::new("maps");
    let level = scene.add_entity((Name::new("level"),));
    assert!(!scene.registry.is_map(level));

    scene.load_map(level, &path).unwrap();

    assert!(scene.registry.is_map(level));
    assert!(scene.registry.is_tile_at(&scene.world, Vec2::new(8.0, 8.0)));
    assert!(!scene.registry.is_tile_at(&scene.world, Vec2::new(24.0, 8.0)));

    // Edit on disk, then reload
    fs::write(&path, FLOOR_JSON.replace("[-1, -1]", "[0, 0]")).unwrap();
    scene.reload_map(level).unwrap();
    assert!(scene.registry.is_tile_at(&scene.world, Vec2::new(24.0, 8.0)));

    scene.events.swap();
    let loaded = scene
        .events
        .iter()
        .filter(|e| matches!(e, GameEvent::MapLoaded { map } if *map == level))
        .count();
    assert_eq!(loaded, 2);
}

#[test]
fn removed_entities_leave_lookup_and_processing() {
    let mut scene = Scene::new("lookup");
    let first = scene.add_entity((Name::new("crate"),));
    let second = scene.add_entity((Name::new("crate"),));
    scene.add_entity((Name::new("barrel"),));

    assert_eq!(scene.find_entity("crate"), Some(first));
    assert!(scene.remove_entity(first));
    assert_eq!(scene.find_entity("crate"), Some(second));
    assert_eq!(scene.find_entity("missing"), None);
    assert_eq!(scene.entity_count(), 2);
}

#[test]
fn children_follow_their_parent() {
    let mut scene = Scene::new("hierarchy");
    let ship = scene.add_entity_at(Vec2::new(10.0, 10.0), (Name::new("ship"),));
    let turret = scene.add_child(ship, (Name::new("turret"),));
    scene.world.set_local_position(turret, Vec2::new(0.0, -4.0));

    scene.world.set_position(ship, Vec2::new(50.0, 10.0));
    assert_eq!(scene.world.position(turret), Some(Vec2::new(50.0, 6.0)));
    assert_eq!(scene.world.find_child_by_name(ship, "turret"), Some(turret));

    // Orphans become roots; their local offset is now a world position
    scene.remove_entity(ship);
    assert_eq!(scene.world.parent(turret), None);
    assert_eq!(scene.world.position(turret), Some(Vec2::new(0.0, -4.0)));
}
