//! Axis-aligned bounding boxes
//!
//! World space is y-down: `top` is the smaller y, `bottom` the larger.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Aabb {
    /// Top-left corner
    pub position: Vec2,
    /// Width and height
    pub size: Vec2,
}

impl Aabb {
    /// Create a new rectangle from its top-left corner and size
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            size: Vec2::new(width, height),
        }
    }

    /// Create a rectangle centered on a point
    #[must_use]
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        Self {
            position: center - size * 0.5,
            size,
        }
    }

    #[must_use]
    #[inline]
    pub fn left(&self) -> f32 {
        self.position.x
    }

    #[must_use]
    #[inline]
    pub fn right(&self) -> f32 {
        self.position.x + self.size.x
    }

    #[must_use]
    #[inline]
    pub fn top(&self) -> f32 {
        self.position.y
    }

    #[must_use]
    #[inline]
    pub fn bottom(&self) -> f32 {
        self.position.y + self.size.y
    }

    #[must_use]
    #[inline]
    pub fn width(&self) -> f32 {
        self.size.x
    }

    #[must_use]
    #[inline]
    pub fn height(&self) -> f32 {
        self.size.y
    }

    /// Center point
    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.position + self.size * 0.5
    }

    /// Get the bounds as (min, max)
    #[must_use]
    pub fn bounds(&self) -> (Vec2, Vec2) {
        (self.position, self.position + self.size)
    }

    /// Check if a point is inside the rectangle (max edges exclusive)
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.left()
            && point.x < self.right()
            && point.y >= self.top()
            && point.y < self.bottom()
    }

    /// Strict overlap test; boxes sharing only an edge do not intersect
    #[must_use]
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }

    /// Strict overlap on the X axis only
    #[must_use]
    pub fn overlaps_x(&self, other: &Aabb) -> bool {
        self.right() > other.left() && self.left() < other.right()
    }

    /// Strict overlap on the Y axis only
    #[must_use]
    pub fn overlaps_y(&self, other: &Aabb) -> bool {
        self.bottom() > other.top() && self.top() < other.bottom()
    }

    /// Smallest rectangle containing both
    #[must_use]
    pub fn union(&self, other: &Aabb) -> Aabb {
        let min = self.position.min(other.position);
        let max = (self.position + self.size).max(other.position + other.size);
        Aabb {
            position: min,
            size: max - min,
        }
    }

    /// Move by an offset
    #[must_use]
    pub fn translated(&self, offset: Vec2) -> Aabb {
        Aabb {
            position: self.position + offset,
            size: self.size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_edges() {
        let aabb = Aabb::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(aabb.left(), 10.0);
        assert_eq!(aabb.right(), 40.0);
        assert_eq!(aabb.top(), 20.0);
        assert_eq!(aabb.bottom(), 60.0);
        assert_eq!(aabb.center(), Vec2::new(25.0, 40.0));
    }

    #[test]
    fn test_aabb_contains() {
        let aabb = Aabb::new(10.0, 10.0, 100.0, 50.0);

        assert!(aabb.contains(Vec2::new(50.0, 30.0)));
        assert!(!aabb.contains(Vec2::new(5.0, 5.0)));
        assert!(!aabb.contains(Vec2::new(110.0, 30.0)));
    }

    #[test]
    fn test_edge_adjacent_boxes_do_not_intersect() {
        let a = Aabb::new(0.0, 0.0, 10.0, 10.0);
        let b = Aabb::new(10.0, 0.0, 10.0, 10.0);
        let c = Aabb::new(9.0, 9.0, 10.0, 10.0);

        assert!(!a.intersects(&b));
        assert!(a.intersects(&c));
        assert!(a.overlaps_y(&b));
        assert!(!a.overlaps_x(&b));
    }

    #[test]
    fn test_union() {
        let a = Aabb::new(0.0, 0.0, 10.0, 10.0);
        let b = Aabb::new(20.0, -5.0, 5.0, 5.0);
        assert_eq!(a.union(&b), Aabb::new(0.0, -5.0, 25.0, 15.0));
    }
}
