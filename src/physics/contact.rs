//! Directional touching predicates
//!
//! One-frame-ahead contact tests between two boxes. `margin` is the distance the
//! first box is about to travel along the tested axis (velocity × elapsed time).
//! A box is touching another on a side when projecting its leading edge by
//! `margin` reaches the other box, its trailing edge is still behind the other
//! box's near edge, and the two overlap strictly on the orthogonal axis.
//!
//! These are discrete tests: a box moving further than the other box's depth
//! in one step can pass through it.

use super::aabb::Aabb;

/// Overlap on the orthogonal axis must exceed this to count, so rounding
/// residue left by a snap does not turn a floor into a wall
pub const CONTACT_EPSILON: f32 = 1e-4;

fn overlap_x(a: &Aabb, b: &Aabb) -> bool {
    a.right() - b.left() > CONTACT_EPSILON && b.right() - a.left() > CONTACT_EPSILON
}

fn overlap_y(a: &Aabb, b: &Aabb) -> bool {
    a.bottom() - b.top() > CONTACT_EPSILON && b.bottom() - a.top() > CONTACT_EPSILON
}

/// Side of the second box the first box runs into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Moving right into the other box's left side
    Left,
    /// Moving left into the other box's right side
    Right,
    /// Moving down onto the other box's top
    Top,
    /// Moving up into the other box's bottom
    Bottom,
}

/// Dispatch to the predicate for `side`
#[must_use]
pub fn touching(a: &Aabb, b: &Aabb, side: Side, margin: f32) -> bool {
    match side {
        Side::Left => touching_left(a, b, margin),
        Side::Right => touching_right(a, b, margin),
        Side::Top => touching_top(a, b, margin),
        Side::Bottom => touching_bottom(a, b, margin),
    }
}

/// `a` runs into the left side of `b`
#[must_use]
pub fn touching_left(a: &Aabb, b: &Aabb, margin: f32) -> bool {
    a.right() + margin > b.left() && a.left() < b.left() && overlap_y(a, b)
}

/// `a` runs into the right side of `b`
#[must_use]
pub fn touching_right(a: &Aabb, b: &Aabb, margin: f32) -> bool {
    a.left() + margin < b.right() && a.right() > b.right() && overlap_y(a, b)
}

/// `a` lands on the top of `b`
#[must_use]
pub fn touching_top(a: &Aabb, b: &Aabb, margin: f32) -> bool {
    a.bottom() + margin > b.top() && a.top() < b.top() && overlap_x(a, b)
}

/// `a` hits the bottom of `b`
#[must_use]
pub fn touching_bottom(a: &Aabb, b: &Aabb, margin: f32) -> bool {
    a.top() + margin < b.bottom() && a.bottom() > b.bottom() && overlap_x(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touching_left_within_margin() {
        let a = Aabb::new(0.0, 0.0, 10.0, 10.0);
        let b = Aabb::new(15.0, 0.0, 10.0, 10.0);

        assert!(!touching_left(&a, &b, 4.0));
        assert!(touching_left(&a, &b, 6.0));
        // Wrong direction never reports the far side
        assert!(!touching_right(&a, &b, -6.0));
    }

    #[test]
    fn test_touching_requires_orthogonal_overlap() {
        let a = Aabb::new(0.0, 0.0, 10.0, 10.0);
        // Directly below, sharing only the edge line y = 10
        let b = Aabb::new(15.0, 10.0, 10.0, 10.0);
        assert!(!touching_left(&a, &b, 50.0));
    }

    #[test]
    fn test_touching_top_and_bottom() {
        let falling = Aabb::new(0.0, 0.0, 10.0, 10.0);
        let floor = Aabb::new(0.0, 12.0, 10.0, 10.0);
        assert!(touching_top(&falling, &floor, 3.0));
        assert!(!touching_top(&falling, &floor, 1.0));

        let rising = Aabb::new(0.0, 25.0, 10.0, 10.0);
        assert!(touching_bottom(&rising, &floor, -4.0));
        assert!(!touching_bottom(&rising, &floor, -2.0));
    }

    #[test]
    fn test_resting_contact_with_zero_margin_is_not_touching() {
        let standing = Aabb::new(0.0, 0.0, 10.0, 10.0);
        let floor = Aabb::new(0.0, 10.0, 10.0, 10.0);
        assert!(!touching_top(&standing, &floor, 0.0));
        assert!(touching_top(&standing, &floor, 0.5));
    }

    #[test]
    fn test_rounding_residue_is_not_overlap() {
        let a = Aabb::new(0.0, 0.0, 10.0, 10.000_002);
        let next_floor_tile = Aabb::new(12.0, 10.0, 10.0, 10.0);
        assert!(!touching_left(&a, &next_floor_tile, 5.0));
    }

    #[test]
    fn test_touching_dispatch() {
        let a = Aabb::new(0.0, 0.0, 10.0, 10.0);
        let b = Aabb::new(11.0, 0.0, 10.0, 10.0);
        assert_eq!(
            touching(&a, &b, Side::Left, 2.0),
            touching_left(&a, &b, 2.0)
        );
    }

    #[test]
    fn test_fast_mover_tunnels_through_thin_box() {
        let a = Aabb::new(0.0, 0.0, 10.0, 10.0);
        let thin = Aabb::new(5.0, 0.0, 1.0, 10.0);
        // Trailing edge is already past the near edge after a large step
        let after = a.translated(glam::Vec2::new(20.0, 0.0));
        assert!(!touching_left(&after, &thin, 20.0));
    }
}
