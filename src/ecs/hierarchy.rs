//! Transform hierarchy
//!
//! An arena of 2D transforms linked by parent/child handles. World-space values
//! are cached and recomputed lazily: changing a local property marks the node and
//! its whole subtree dirty, and reading a world property rebuilds the dirty chain
//! from the nearest clean ancestor downwards.
//!
//! # Example
//!
//! ```ignore
//! let mut transforms = Transforms::new();
//! let parent = transforms.insert(None);
//! let child = transforms.insert(None);
//! transforms.set_parent(child, Some(parent));
//!
//! transforms.set_local_position(parent, Vec2::new(10.0, 0.0));
//! transforms.set_local_position(child, Vec2::new(5.0, 0.0));
//!
//! assert_eq!(transforms.position(child), Some(Vec2::new(15.0, 0.0)));
//! ```

use std::cell::Cell;

use glam::{Affine2, Vec2};
use hecs::Entity;
use smallvec::SmallVec;

// ============================================================================
// Change Kinds and Dirty Flags
// ============================================================================

/// The part of a transform affected by a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// Position (local or inherited) changed
    Position,
    /// Rotation changed
    Rotation,
    /// Scale changed
    Scale,
}

impl ChangeKind {
    const fn flag(self) -> DirtyFlags {
        match self {
            Self::Position => DirtyFlags::POSITION,
            Self::Rotation => DirtyFlags::ROTATION,
            Self::Scale => DirtyFlags::SCALE,
        }
    }
}

/// Bitmask of pending world recomputations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct DirtyFlags(u8);

impl DirtyFlags {
    const CLEAN: Self = Self(0);
    const POSITION: Self = Self(1);
    const ROTATION: Self = Self(1 << 1);
    const SCALE: Self = Self(1 << 2);
    const ALL: Self = Self(Self::POSITION.0 | Self::ROTATION.0 | Self::SCALE.0);

    #[inline]
    const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[inline]
    const fn is_clean(self) -> bool {
        self.0 == 0
    }
}

// ============================================================================
// Handles and Change Records
// ============================================================================

/// Stable handle to a node in [`Transforms`].
///
/// Handles carry a generation so a handle to a removed node never aliases a
/// node inserted later into the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransformId {
    index: u32,
    generation: u32,
}

impl TransformId {
    /// Slot index inside the arena.
    #[must_use]
    #[inline]
    pub const fn index(self) -> u32 {
        self.index
    }
}

/// A change notification recorded by a transform mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformChange {
    /// The node whose world state changed
    pub node: TransformId,
    /// Entity owning the node, if any
    pub owner: Option<Entity>,
    /// What changed
    pub kind: ChangeKind,
}

// ============================================================================
// Nodes
// ============================================================================

#[derive(Debug)]
struct Node {
    owner: Option<Entity>,
    parent: Option<TransformId>,
    children: SmallVec<[TransformId; 8]>,

    local_position: Vec2,
    local_rotation: f32,
    local_scale: Vec2,

    local_dirty: Cell<bool>,
    hierarchy_dirty: Cell<DirtyFlags>,

    local_matrix: Cell<Affine2>,
    world_matrix: Cell<Affine2>,
    world_inverse: Cell<Option<Affine2>>,

    position: Cell<Vec2>,
    rotation: Cell<f32>,
    scale: Cell<Vec2>,
}

impl Node {
    fn new(owner: Option<Entity>) -> Self {
        Self {
            owner,
            parent: None,
            children: SmallVec::new(),
            local_position: Vec2::ZERO,
            local_rotation: 0.0,
            local_scale: Vec2::ONE,
            local_dirty: Cell::new(true),
            hierarchy_dirty: Cell::new(DirtyFlags::ALL),
            local_matrix: Cell::new(Affine2::IDENTITY),
            world_matrix: Cell::new(Affine2::IDENTITY),
            world_inverse: Cell::new(None),
            position: Cell::new(Vec2::ZERO),
            rotation: Cell::new(0.0),
            scale: Cell::new(Vec2::ONE),
        }
    }
}

#[derive(Debug)]
enum Slot {
    Occupied { generation: u32, node: Node },
    Vacant { generation: u32, next_free: u32 },
}

// ============================================================================
// Transform Arena
// ============================================================================

/// Arena of hierarchical 2D transforms.
///
/// # Performance
///
/// | Operation              | Cost                                  |
/// |------------------------|---------------------------------------|
/// | `insert` / `remove`    | O(1) + O(children) on remove          |
/// | `set_local_*`          | O(newly dirtied subtree)              |
/// | world read (clean)     | O(1)                                  |
/// | world read (dirty)     | O(depth of dirty chain)               |
/// | `set_parent`           | O(old parent's children) + subtree    |
///
/// World getters take `&self`; the caches live in `Cell`s so lazy
/// recomputation works through a shared reference.
#[derive(Debug)]
pub struct Transforms {
    slots: Vec<Slot>,
    free_head: u32,
    len: usize,
    changes: Vec<TransformChange>,
    dirty_traversals: u64,
}

impl Transforms {
    /// End of the free list.
    const NONE: u32 = u32::MAX;

    /// Create an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: Self::NONE,
            len: 0,
            changes: Vec::new(),
            dirty_traversals: 0,
        }
    }

    /// Insert a root node at the origin, owned by `owner`.
    pub fn insert(&mut self, owner: Option<Entity>) -> TransformId {
        self.len += 1;
        let node = Node::new(owner);

        if self.free_head != Self::NONE {
            let index = self.free_head;
            let generation = match self.slots[index as usize] {
                Slot::Vacant {
                    generation,
                    next_free,
                } => {
                    self.free_head = next_free;
                    generation
                }
                Slot::Occupied { generation, .. } => generation,
            };
            self.slots[index as usize] = Slot::Occupied { generation, node };
            TransformId { index, generation }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot::Occupied {
                generation: 0,
                node,
            });
            TransformId {
                index,
                generation: 0,
            }
        }
    }

    /// Remove a node.
    ///
    /// The node is detached from its parent; its children become roots and are
    /// marked dirty. Returns `false` for a stale handle.
    pub fn remove(&mut self, id: TransformId) -> bool {
        let Some(node) = self.node(id) else {
            return false;
        };
        let parent = node.parent;
        let children = node.children.clone();

        if let Some(parent) = parent
            && let Some(parent_node) = self.node_mut(parent)
        {
            parent_node.children.retain(|c| *c != id);
        }

        for child in children {
            if let Some(child_node) = self.node_mut(child) {
                child_node.parent = None;
            }
            self.mark_dirty(child, ChangeKind::Position);
        }

        let slot = &mut self.slots[id.index as usize];
        *slot = Slot::Vacant {
            generation: id.generation.wrapping_add(1),
            next_free: self.free_head,
        };
        self.free_head = id.index;
        self.len -= 1;
        true
    }

    /// Check whether a handle refers to a live node.
    #[must_use]
    pub fn contains(&self, id: TransformId) -> bool {
        self.node(id).is_some()
    }

    /// Number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the arena is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Entity owning a node.
    #[must_use]
    pub fn owner(&self, id: TransformId) -> Option<Entity> {
        self.node(id).and_then(|n| n.owner)
    }

    // -------------------------------------------------------------------------
    // Hierarchy
    // -------------------------------------------------------------------------

    /// Parent of a node.
    #[must_use]
    pub fn parent(&self, id: TransformId) -> Option<TransformId> {
        self.node(id).and_then(|n| n.parent)
    }

    /// Children of a node, in insertion order.
    #[must_use]
    pub fn children(&self, id: TransformId) -> &[TransformId] {
        self.node(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Number of children.
    #[must_use]
    pub fn child_count(&self, id: TransformId) -> usize {
        self.children(id).len()
    }

    /// Child at `index`.
    #[must_use]
    pub fn child(&self, id: TransformId, index: usize) -> Option<TransformId> {
        self.children(id).get(index).copied()
    }

    /// Re-parent a node (`None` detaches it to the root).
    ///
    /// The node is removed from the old parent's child list, appended to the new
    /// one, and its subtree is marked position-dirty. Parenting a node under
    /// itself or one of its descendants is refused and returns `false`.
    pub fn set_parent(&mut self, child: TransformId, parent: Option<TransformId>) -> bool {
        let Some(old_parent) = self.node(child).map(|n| n.parent) else {
            return false;
        };

        if let Some(parent) = parent {
            if !self.contains(parent) {
                return false;
            }
            if self.is_ancestor_or_self(child, parent) {
                log::warn!(
                    "Refusing to parent transform {} under its own descendant {}",
                    child.index,
                    parent.index
                );
                return false;
            }
        }

        if old_parent == parent {
            return true;
        }

        if let Some(old) = old_parent
            && let Some(node) = self.node_mut(old)
        {
            node.children.retain(|c| *c != child);
        }
        if let Some(new) = parent
            && let Some(node) = self.node_mut(new)
        {
            node.children.push(child);
        }
        if let Some(node) = self.node_mut(child) {
            node.parent = parent;
        }

        self.mark_dirty(child, ChangeKind::Position);
        true
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    #[must_use]
    pub fn is_ancestor_or_self(&self, ancestor: TransformId, node: TransformId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    // -------------------------------------------------------------------------
    // Local Space
    // -------------------------------------------------------------------------

    /// Local position.
    #[must_use]
    pub fn local_position(&self, id: TransformId) -> Option<Vec2> {
        self.node(id).map(|n| n.local_position)
    }

    /// Local rotation in radians.
    #[must_use]
    pub fn local_rotation(&self, id: TransformId) -> Option<f32> {
        self.node(id).map(|n| n.local_rotation)
    }

    /// Local scale.
    #[must_use]
    pub fn local_scale(&self, id: TransformId) -> Option<Vec2> {
        self.node(id).map(|n| n.local_scale)
    }

    /// Set the local position. Setting the current value is a no-op.
    pub fn set_local_position(&mut self, id: TransformId, position: Vec2) {
        let Some(node) = self.node_mut(id) else {
            return;
        };
        if node.local_position == position {
            return;
        }
        node.local_position = position;
        node.local_dirty.set(true);
        self.mark_dirty(id, ChangeKind::Position);
    }

    /// Set the local rotation in radians.
    pub fn set_local_rotation(&mut self, id: TransformId, radians: f32) {
        let Some(node) = self.node_mut(id) else {
            return;
        };
        node.local_rotation = radians;
        node.local_dirty.set(true);
        self.mark_dirty(id, ChangeKind::Rotation);
    }

    /// Set the local rotation in degrees.
    pub fn set_local_rotation_degrees(&mut self, id: TransformId, degrees: f32) {
        self.set_local_rotation(id, degrees.to_radians());
    }

    /// Set the local scale.
    pub fn set_local_scale(&mut self, id: TransformId, scale: Vec2) {
        let Some(node) = self.node_mut(id) else {
            return;
        };
        node.local_scale = scale;
        node.local_dirty.set(true);
        self.mark_dirty(id, ChangeKind::Scale);
    }

    // -------------------------------------------------------------------------
    // World Space (lazy)
    // -------------------------------------------------------------------------

    /// World position.
    #[must_use]
    pub fn position(&self, id: TransformId) -> Option<Vec2> {
        self.refresh(id);
        self.node(id).map(|n| n.position.get())
    }

    /// World rotation in radians.
    #[must_use]
    pub fn rotation(&self, id: TransformId) -> Option<f32> {
        self.refresh(id);
        self.node(id).map(|n| n.rotation.get())
    }

    /// World rotation in degrees.
    #[must_use]
    pub fn rotation_degrees(&self, id: TransformId) -> Option<f32> {
        self.rotation(id).map(f32::to_degrees)
    }

    /// World scale.
    #[must_use]
    pub fn scale(&self, id: TransformId) -> Option<Vec2> {
        self.refresh(id);
        self.node(id).map(|n| n.scale.get())
    }

    /// Local-to-world matrix.
    #[must_use]
    pub fn local_to_world(&self, id: TransformId) -> Option<Affine2> {
        self.refresh(id);
        self.node(id).map(|n| n.world_matrix.get())
    }

    /// Inverse of the local-to-world matrix.
    #[must_use]
    pub fn world_inverse(&self, id: TransformId) -> Option<Affine2> {
        self.refresh(id);
        let node = self.node(id)?;
        if let Some(inverse) = node.world_inverse.get() {
            return Some(inverse);
        }
        let inverse = node.world_matrix.get().inverse();
        node.world_inverse.set(Some(inverse));
        Some(inverse)
    }

    /// Matrix mapping world space into this node's parent space.
    ///
    /// Identity for root nodes.
    #[must_use]
    pub fn world_to_local(&self, id: TransformId) -> Option<Affine2> {
        let node = self.node(id)?;
        match node.parent {
            Some(parent) => self.world_inverse(parent),
            None => Some(Affine2::IDENTITY),
        }
    }

    /// Set the world position by back-computing the local position.
    pub fn set_position(&mut self, id: TransformId, position: Vec2) {
        let Some(to_local) = self.world_to_local(id) else {
            return;
        };
        self.set_local_position(id, to_local.transform_point2(position));
    }

    /// Set the world rotation in radians.
    pub fn set_rotation(&mut self, id: TransformId, radians: f32) {
        let inherited = self
            .parent(id)
            .and_then(|p| self.rotation(p))
            .unwrap_or(0.0);
        self.set_local_rotation(id, radians - inherited);
    }

    /// Set the world rotation in degrees.
    pub fn set_rotation_degrees(&mut self, id: TransformId, degrees: f32) {
        self.set_rotation(id, degrees.to_radians());
    }

    /// Set the world scale.
    ///
    /// Axes where the inherited scale is zero keep their local value.
    pub fn set_scale(&mut self, id: TransformId, scale: Vec2) {
        let Some(current) = self.local_scale(id) else {
            return;
        };
        let inherited = self.parent(id).and_then(|p| self.scale(p)).unwrap_or(Vec2::ONE);
        let local = Vec2::select(inherited.cmpeq(Vec2::ZERO), current, scale / inherited);
        self.set_local_scale(id, local);
    }

    /// Rotate so the node faces away from `target` along its local Y axis.
    pub fn look_at(&mut self, id: TransformId, target: Vec2) {
        let Some(position) = self.position(id) else {
            return;
        };
        let away = (position - target).normalize_or_zero();
        if away == Vec2::ZERO {
            return;
        }
        let sign = if position.x > target.x { -1.0 } else { 1.0 };
        let angle = away.dot(Vec2::Y).clamp(-1.0, 1.0).acos();
        self.set_rotation(id, sign * angle);
    }

    /// Snap the world position to whole units.
    pub fn round_position(&mut self, id: TransformId) {
        if let Some(position) = self.position(id) {
            self.set_position(id, position.round());
        }
    }

    /// Copy the local state of `source` onto `target`.
    pub fn copy_from(&mut self, target: TransformId, source: TransformId) {
        let Some((position, rotation, scale)) = self
            .node(source)
            .map(|n| (n.local_position, n.local_rotation, n.local_scale))
        else {
            return;
        };
        let Some(node) = self.node_mut(target) else {
            return;
        };
        node.local_position = position;
        node.local_rotation = rotation;
        node.local_scale = scale;
        node.local_dirty.set(true);

        self.mark_dirty(target, ChangeKind::Position);
        self.mark_dirty(target, ChangeKind::Rotation);
        self.mark_dirty(target, ChangeKind::Scale);
    }

    // -------------------------------------------------------------------------
    // Cache State
    // -------------------------------------------------------------------------

    /// Whether the cached world values of a node are stale.
    #[must_use]
    pub fn is_dirty(&self, id: TransformId) -> bool {
        self.node(id)
            .is_some_and(|n| !n.hierarchy_dirty.get().is_clean())
    }

    /// Total number of nodes newly marked dirty since creation.
    #[must_use]
    pub fn dirty_traversals(&self) -> u64 {
        self.dirty_traversals
    }

    /// Take the change records produced since the last drain.
    pub fn drain_changes(&mut self) -> std::vec::Drain<'_, TransformChange> {
        self.changes.drain(..)
    }

    /// Whether change records are waiting to be drained.
    #[must_use]
    pub fn has_pending_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn node(&self, id: TransformId) -> Option<&Node> {
        match self.slots.get(id.index as usize) {
            Some(Slot::Occupied { generation, node }) if *generation == id.generation => {
                Some(node)
            }
            _ => None,
        }
    }

    fn node_mut(&mut self, id: TransformId) -> Option<&mut Node> {
        match self.slots.get_mut(id.index as usize) {
            Some(Slot::Occupied { generation, node }) if *generation == id.generation => {
                Some(node)
            }
            _ => None,
        }
    }

    /// Mark a node and its subtree dirty for `kind`.
    ///
    /// Nodes that already carry the flag are not revisited: a dirty node always
    /// has dirty descendants, so the walk stops there.
    fn mark_dirty(&mut self, id: TransformId, kind: ChangeKind) {
        let flag = kind.flag();
        let mut stack: SmallVec<[TransformId; 16]> = SmallVec::new();
        stack.push(id);

        while let Some(current) = stack.pop() {
            let Some(node) = self.node(current) else {
                continue;
            };
            let owner = node.owner;
            let flags = node.hierarchy_dirty.get();

            if flags.contains(flag) {
                if current == id {
                    self.changes.push(TransformChange {
                        node: current,
                        owner,
                        kind,
                    });
                }
                continue;
            }

            node.hierarchy_dirty.set(flags.with(flag));
            stack.extend(node.children.iter().rev().copied());

            self.dirty_traversals += 1;
            self.changes.push(TransformChange {
                node: current,
                owner,
                kind,
            });
        }
    }

    /// Recompute the dirty chain ending at `id`, root-most first.
    fn refresh(&self, id: TransformId) {
        let mut chain: SmallVec<[TransformId; 16]> = SmallVec::new();
        let mut current = Some(id);

        while let Some(cur) = current {
            let Some(node) = self.node(cur) else {
                break;
            };
            if node.hierarchy_dirty.get().is_clean() {
                break;
            }
            chain.push(cur);
            current = node.parent;
        }

        for &cur in chain.iter().rev() {
            self.recompute(cur);
        }
    }

    fn recompute(&self, id: TransformId) {
        let Some(node) = self.node(id) else {
            return;
        };

        if node.local_dirty.get() {
            node.local_matrix.set(Affine2::from_scale_angle_translation(
                node.local_scale,
                node.local_rotation,
                node.local_position,
            ));
            node.local_dirty.set(false);
        }
        let local = node.local_matrix.get();

        match node.parent.and_then(|p| self.node(p)) {
            Some(parent) => {
                node.world_matrix.set(parent.world_matrix.get() * local);
                node.rotation
                    .set(parent.rotation.get() + node.local_rotation);
                node.scale.set(parent.scale.get() * node.local_scale);
            }
            None => {
                node.world_matrix.set(local);
                node.rotation.set(node.local_rotation);
                node.scale.set(node.local_scale);
            }
        }

        node.position.set(node.world_matrix.get().translation);
        node.world_inverse.set(None);
        node.hierarchy_dirty.set(DirtyFlags::CLEAN);
    }
}

impl Default for Transforms {
    fn default() -> Self {
        Self::new()
    }
}
