//! Entity-versus-tile movement resolution
//!
//! Candidate tiles are fetched by sampling a fixed set of points around the
//! collider's current box and its box displaced by this step's velocity. The
//! sampling over-fetches neighbours for robustness; it does not prevent
//! tunnelling at speeds larger than a tile per step.

use glam::Vec2;
use hecs::Entity;
use smallvec::SmallVec;

use super::aabb::Aabb;
use super::collider::BoxCollider;
use super::contact::{
    CONTACT_EPSILON, touching_bottom, touching_left, touching_right, touching_top,
};
use super::registry::{CollisionRegistry, TileHit};
use crate::ecs::World;

/// Vertical offsets around the bottom edge probed for sloped tiles
const SLOPE_PROBES: [f32; 6] = [-8.0, -1.0, 0.0, 1.0, 8.0, 16.0];

type Candidates = SmallVec<[TileHit; 16]>;

/// Default number of tile heights a collider may sit below a slope surface
/// and still be lifted onto it
pub const DEFAULT_SLOPE_STEP_LIMIT: f32 = 1.0;

/// Resolves an entity's velocity against every registered tile map.
///
/// All flags are recomputed by each [`TileMover::resolve`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileMover {
    pub on_floor: bool,
    pub on_ceiling: bool,
    pub on_wall: bool,
    pub on_slope: bool,
    /// Standing on a slope rising left-to-right
    pub on_left_slope: bool,
    /// Standing on a slope rising right-to-left
    pub on_right_slope: bool,
    pub on_one_way: bool,
}

impl TileMover {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve then integrate: `position += velocity × dt`
    pub fn move_entity(
        world: &mut World,
        registry: &CollisionRegistry,
        entity: Entity,
        velocity: &mut Vec2,
        dt: f32,
    ) -> TileMover {
        let flags = Self::resolve(world, registry, entity, velocity, dt);
        world.translate(entity, *velocity * dt);
        flags
    }

    /// Resolve with [`DEFAULT_SLOPE_STEP_LIMIT`]
    pub fn resolve(
        world: &mut World,
        registry: &CollisionRegistry,
        entity: Entity,
        velocity: &mut Vec2,
        dt: f32,
    ) -> TileMover {
        Self::resolve_with(world, registry, entity, velocity, dt, DEFAULT_SLOPE_STEP_LIMIT)
    }

    /// Clip `velocity` against nearby tiles, snapping `entity` onto floors,
    /// slopes and platforms and away from walls and ceilings.
    ///
    /// The returned flags are also written to the entity's `TileMover`
    /// component when it has one.
    pub fn resolve_with(
        world: &mut World,
        registry: &CollisionRegistry,
        entity: Entity,
        velocity: &mut Vec2,
        dt: f32,
        slope_step_limit: f32,
    ) -> TileMover {
        let mut flags = TileMover::default();

        let collidable = world
            .get::<BoxCollider>(entity)
            .is_ok_and(|c| c.collidable);
        if collidable {
            flags.resolve_slopes(world, registry, entity, velocity, dt, slope_step_limit);
            flags.resolve_solids(world, registry, entity, velocity, dt);
        }

        if let Ok(mut component) = world.get_mut::<TileMover>(entity) {
            *component = flags;
        }
        flags
    }

    fn resolve_slopes(
        &mut self,
        world: &mut World,
        registry: &CollisionRegistry,
        entity: Entity,
        velocity: &mut Vec2,
        dt: f32,
        step_limit: f32,
    ) {
        let Some(start) = CollisionRegistry::collider_aabb(world, entity) else {
            return;
        };
        let dx = velocity.x * dt;

        let mut candidates = Candidates::new();
        for x in [start.left(), start.right()] {
            for probe in SLOPE_PROBES {
                let y = start.bottom() + probe;
                push_unique(&mut candidates, registry.sloped_tiles_at(world, Vec2::new(x, y)));
                push_unique(
                    &mut candidates,
                    registry.sloped_tiles_at(world, Vec2::new(x + dx, y)),
                );
            }
            push_unique(
                &mut candidates,
                registry.sloped_tiles_at(world, Vec2::new(x, start.top() - 1.0)),
            );
        }

        let mut best: Option<(f32, i16)> = None;
        for hit in &candidates {
            if !hit.tile.collidable {
                continue;
            }
            let Some(aabb) = CollisionRegistry::collider_aabb(world, entity) else {
                return;
            };
            let tile = hit.aabb;

            if touching_bottom(&aabb, &tile, velocity.y * dt) {
                world.translate(entity, Vec2::new(0.0, tile.bottom() - aabb.top()));
                velocity.y = 0.0;
                self.on_ceiling = true;
                continue;
            }

            let projected = aabb.translated(Vec2::new(dx, 0.0));
            if velocity.y < 0.0 || !projected.overlaps_x(&tile) {
                continue;
            }
            let height = slope_height(&projected, &tile, hit.tile.slope);
            let reaches = aabb.bottom() + velocity.y * dt >= height;
            let close_enough = aabb.bottom() - height <= step_limit * tile.height();
            if reaches && close_enough && best.is_none_or(|(h, _)| height < h) {
                best = Some((height, hit.tile.slope));
            }
        }

        if let Some((height, slope)) = best
            && let Some(aabb) = CollisionRegistry::collider_aabb(world, entity)
        {
            world.translate(entity, Vec2::new(0.0, height - aabb.bottom()));
            velocity.y = 0.0;
            self.on_slope = true;
            self.on_floor = true;
            self.on_left_slope = slope > 0;
            self.on_right_slope = slope < 0;
        }
    }

    fn resolve_solids(
        &mut self,
        world: &mut World,
        registry: &CollisionRegistry,
        entity: Entity,
        velocity: &mut Vec2,
        dt: f32,
    ) {
        let Some(start) = CollisionRegistry::collider_aabb(world, entity) else {
            return;
        };
        let dx = velocity.x * dt;
        let dy = velocity.y * dt;
        let center = start.center();

        let mut candidates = Candidates::new();
        for x in [start.left() + dx, start.right() + dx] {
            for y in [start.top(), start.bottom(), center.y] {
                push_unique(&mut candidates, registry.tiles_at(world, Vec2::new(x, y)));
            }
        }
        for y in [start.bottom() + dy, start.top() + dy] {
            for x in [start.left(), start.right(), center.x] {
                push_unique(&mut candidates, registry.tiles_at(world, Vec2::new(x, y)));
            }
        }

        for hit in &candidates {
            if !hit.tile.collidable || hit.tile.is_sloped() {
                continue;
            }
            let Some(aabb) = CollisionRegistry::collider_aabb(world, entity) else {
                return;
            };
            let tile = hit.aabb;
            let dx = velocity.x * dt;
            let dy = velocity.y * dt;

            if hit.tile.one_way {
                if touching_top(&aabb, &tile, dy)
                    && aabb.bottom() <= tile.top() + CONTACT_EPSILON
                {
                    snap_y(world, entity, tile.top() - aabb.bottom(), velocity);
                    self.on_one_way = true;
                    self.on_floor = true;
                }
                continue;
            }

            if touching_left(&aabb, &tile, dx) {
                world.translate(entity, Vec2::new(tile.left() - aabb.right(), 0.0));
                velocity.x = 0.0;
                self.on_wall = true;
            } else if touching_right(&aabb, &tile, dx) {
                world.translate(entity, Vec2::new(tile.right() - aabb.left(), 0.0));
                velocity.x = 0.0;
                self.on_wall = true;
            } else if touching_top(&aabb, &tile, dy) {
                snap_y(world, entity, tile.top() - aabb.bottom(), velocity);
                self.on_floor = true;
            } else if touching_bottom(&aabb, &tile, dy) {
                snap_y(world, entity, tile.bottom() - aabb.top(), velocity);
                self.on_ceiling = true;
            }
        }
    }
}

fn snap_y(world: &mut World, entity: Entity, shift: f32, velocity: &mut Vec2) {
    world.translate(entity, Vec2::new(0.0, shift));
    velocity.y = 0.0;
}

fn push_unique(candidates: &mut Candidates, hits: impl IntoIterator<Item = TileHit>) {
    for hit in hits {
        if !candidates.iter().any(|c| c.key() == hit.key()) {
            candidates.push(hit);
        }
    }
}

/// Surface height of a sloped tile under `collider`.
///
/// The offset is measured from the tile's high corner: the right corner for a
/// positive slope (using the collider's right edge), the left corner for a
/// negative one (using its left edge).
fn slope_height(collider: &Aabb, tile: &Aabb, slope: i16) -> f32 {
    let slope = f32::from(slope);
    let offset = if slope > 0.0 {
        collider.right().clamp(tile.left(), tile.right()) - tile.right()
    } else {
        collider.left().clamp(tile.left(), tile.right()) - tile.left()
    };
    (tile.top() - slope * offset).clamp(tile.top(), tile.bottom())
}
