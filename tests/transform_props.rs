//! Property tests for the transform hierarchy: cached world values always
//! match a fresh composition from the root, whatever the mutation order.

use glam::{Affine2, Vec2};
use proptest::prelude::*;
use tilecore::ecs::{TransformId, Transforms};

const NODES: usize = 6;

#[derive(Debug, Clone)]
enum Op {
    Position(usize, Vec2),
    Rotation(usize, f32),
    Scale(usize, Vec2),
    Parent(usize, Option<usize>),
    WorldPosition(usize, Vec2),
    Read(usize),
}

fn vec2(range: std::ops::Range<f32>) -> impl Strategy<Value = Vec2> {
    (range.clone(), range).prop_map(|(x, y)| Vec2::new(x, y))
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..NODES, vec2(-100.0..100.0)).prop_map(|(i, v)| Op::Position(i, v)),
        (0..NODES, -3.0f32..3.0).prop_map(|(i, r)| Op::Rotation(i, r)),
        (0..NODES, vec2(0.5..2.0)).prop_map(|(i, s)| Op::Scale(i, s)),
        (0..NODES, proptest::option::of(0..NODES)).prop_map(|(i, p)| Op::Parent(i, p)),
        (0..NODES, vec2(-100.0..100.0)).prop_map(|(i, v)| Op::WorldPosition(i, v)),
        (0..NODES).prop_map(Op::Read),
    ]
}

/// World matrix rebuilt from local values only, ignoring every cache
fn from_root(transforms: &Transforms, id: TransformId) -> (Affine2, f32, Vec2) {
    let local = Affine2::from_scale_angle_translation(
        transforms.local_scale(id).unwrap(),
        transforms.local_rotation(id).unwrap(),
        transforms.local_position(id).unwrap(),
    );
    match transforms.parent(id) {
        Some(parent) => {
            let (matrix, rotation, scale) = from_root(transforms, parent);
            (
                matrix * local,
                rotation + transforms.local_rotation(id).unwrap(),
                scale * transforms.local_scale(id).unwrap(),
            )
        }
        None => (
            local,
            transforms.local_rotation(id).unwrap(),
            transforms.local_scale(id).unwrap(),
        ),
    }
}

fn close(a: Vec2, b: Vec2) -> bool {
    let tolerance = 1e-3 * (1.0 + a.abs().max_element().max(b.abs().max_element()));
    a.abs_diff_eq(b, tolerance)
}

proptest! {
    #[test]
    fn world_values_match_recomputation(ops in proptest::collection::vec(op(), 1..40)) {
        let mut transforms = Transforms::new();
        let ids: Vec<_> = (0..NODES).map(|_| transforms.insert(None)).collect();

        for op in ops {
            match op {
                Op::Position(i, v) => transforms.set_local_position(ids[i], v),
                Op::Rotation(i, r) => transforms.set_local_rotation(ids[i], r),
                Op::Scale(i, s) => transforms.set_local_scale(ids[i], s),
                Op::Parent(i, p) => {
                    transforms.set_parent(ids[i], p.map(|p| ids[p]));
                }
                Op::WorldPosition(i, v) => {
                    transforms.set_position(ids[i], v);
                    prop_assert!(close(transforms.position(ids[i]).unwrap(), v));
                }
                Op::Read(i) => {
                    let _ = transforms.position(ids[i]);
                }
            }
        }

        for &id in &ids {
            let (matrix, rotation, scale) = from_root(&transforms, id);
            prop_assert!(close(transforms.position(id).unwrap(), matrix.translation));
            prop_assert!((transforms.rotation(id).unwrap() - rotation).abs() < 1e-3);
            prop_assert!(close(transforms.scale(id).unwrap(), scale));
            prop_assert!(!transforms.is_dirty(id));
        }
    }

    #[test]
    fn reparent_then_set_position_keeps_world_position(
        start in vec2(-50.0..50.0),
        parent_at in vec2(-50.0..50.0),
        parent_rotation in -3.0f32..3.0,
        parent_scale in vec2(0.5..2.0),
    ) {
        let mut transforms = Transforms::new();
        let parent = transforms.insert(None);
        let child = transforms.insert(None);
        transforms.set_local_position(parent, parent_at);
        transforms.set_local_rotation(parent, parent_rotation);
        transforms.set_local_scale(parent, parent_scale);
        transforms.set_position(child, start);

        let before = transforms.position(child).unwrap();
        prop_assert!(transforms.set_parent(child, Some(parent)));
        transforms.set_position(child, before);

        prop_assert!(close(transforms.position(child).unwrap(), before));
        prop_assert_eq!(transforms.parent(child), Some(parent));
    }

    #[test]
    fn cycles_are_always_refused(chain in 2usize..NODES) {
        let mut transforms = Transforms::new();
        let ids: Vec<_> = (0..chain).map(|_| transforms.insert(None)).collect();
        for pair in ids.windows(2) {
            prop_assert!(transforms.set_parent(pair[1], Some(pair[0])));
        }

        let root = ids[0];
        let leaf = ids[chain - 1];
        prop_assert!(!transforms.set_parent(root, Some(leaf)));
        prop_assert!(!transforms.set_parent(root, Some(root)));
        prop_assert_eq!(transforms.parent(root), None);
    }
}
