//! Headless demo: a body falls onto a tile floor, walks up a slope and
//! through a trigger zone.
//!
//! Usage: `tilecore [map.json|map.ron] [sim.ron]`

use std::time::Duration;

use tilecore::prelude::*;

const SOLID: IVec2 = IVec2::new(0, 0);
const RAMP: IVec2 = IVec2::new(1, 0);
const PLATFORM: IVec2 = IVec2::new(2, 0);

fn overrides() -> TileOverrides {
    TileOverrides::new()
        .with_slope(RAMP, 1)
        .with_one_way(PLATFORM)
}

/// Built-in level used when no map file is given, or when it fails to load
fn demo_map() -> TileMap {
    let mut map = TileMap::new(12, 6)
        .with_overrides(overrides())
        .with_layer("ground", Vec2::splat(16.0));
    for x in 0..12 {
        map.place(0, UVec2::new(x, 5), SOLID);
    }
    map.place(0, UVec2::new(6, 4), RAMP);
    for x in 7..12 {
        map.place(0, UVec2::new(x, 4), SOLID);
    }
    map.place(0, UVec2::new(3, 2), PLATFORM);
    map
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let map_path = args.next();
    let config = match args.next() {
        Some(path) => SimConfig::load_ron(&path).unwrap_or_else(|e| {
            log::warn!("Using default configuration: {e}");
            SimConfig::default()
        }),
        None => SimConfig::default(),
    };

    let mut scene = Scene::with_config("demo", config.clone())
        .unwrap_or_else(|e| {
            log::warn!("Using default configuration: {e}");
            Scene::new("demo")
        });

    let level = scene.add_entity((Name::new("level"), demo_map()));
    if let Some(path) = map_path {
        // A failed load is logged and leaves the built-in level in place
        let _ = scene.load_map(level, path);
    }

    let player = scene.add_entity_at(
        Vec2::new(24.0, 8.0),
        (
            Name::new("player"),
            BoxCollider::new(10.0, 14.0),
            Velocity::new(60.0, 0.0),
            Gravity::default(),
            TileMover::new(),
            Mover::new(),
        ),
    );
    scene.add_entity_at(
        Vec2::new(150.0, 60.0),
        (
            Name::new("goal"),
            BoxCollider::new(16.0, 32.0).with_collidable(false),
            Trigger,
        ),
    );

    let frame = Duration::from_secs_f32(config.fixed_timestep.max(1.0 / 240.0));
    for frame_index in 0..240 {
        scene.update(frame);

        for event in scene.events.iter() {
            if let GameEvent::TriggerOverlap { trigger, .. } = event {
                let name = scene
                    .world
                    .get::<Name>(*trigger)
                    .map(|n| n.0.clone())
                    .unwrap_or_default();
                log::info!("Player reached '{name}' at frame {frame_index}");
            }
        }

        if frame_index % 30 == 0 {
            let position = scene.world.position(player).unwrap_or_default();
            let flags = scene
                .world
                .get::<TileMover>(player)
                .map(|f| *f)
                .unwrap_or_default();
            log::info!(
                "frame {frame_index:>3}: position ({:.1}, {:.1}) floor={} slope={} wall={}",
                position.x,
                position.y,
                flags.on_floor,
                flags.on_slope,
                flags.on_wall
            );
        }
    }

    log::info!(
        "Simulated {} steps ({:.2}s)",
        scene.time().steps(),
        scene.time().elapsed().as_secs_f32()
    );
}
