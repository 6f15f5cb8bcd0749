// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core tree implementation: structure, geometry updates, queries.

use alloc::vec::Vec;
use kurbo::{Affine, Point, Rect};

use crate::types::{LocalNode, NodeId, Touchable};

/// Scene tree.
///
/// Nodes live in generational slots. Each node has at most one parent, and the
/// parent owns the ordered sequence of its children; later children are drawn
/// (and hit) on top of earlier ones.
///
/// Geometry edits take effect immediately: there is no commit step, and world
/// transforms are derived on demand by walking parent links.
///
/// ## Example
///
/// ```rust
/// use kurbo::{Point, Rect};
/// use understory_scene::{LocalNode, Tree};
///
/// let mut tree = Tree::new();
/// let root = tree.insert(None, LocalNode::with_bounds(Rect::new(0.0, 0.0, 100.0, 100.0)));
/// let child = tree.insert(Some(root), LocalNode::with_bounds(Rect::new(10.0, 10.0, 20.0, 20.0)));
///
/// assert_eq!(tree.hit_test(root, Point::new(15.0, 15.0), true), Some(child));
/// assert_eq!(tree.hit_test(root, Point::new(50.0, 50.0), true), Some(root));
/// ```
pub struct Tree {
    /// slots
    nodes: Vec<Option<Node>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
}

impl core::fmt::Debug for Tree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        let free = self.free_list.len();
        f.debug_struct("Tree")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &free)
            .finish_non_exhaustive()
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug)]
struct Node {
    generation: u32,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    local: LocalNode,
}

impl Node {
    fn new(generation: u32, local: LocalNode) -> Self {
        Self {
            generation,
            parent: None,
            children: Vec::new(),
            local,
        }
    }
}

impl Tree {
    /// Create a new empty tree.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
        }
    }

    /// Insert a new node as the last child of `parent` (or detached if `None`).
    ///
    /// A stale `parent` is ignored and the node is inserted detached.
    pub fn insert(&mut self, parent: Option<NodeId>, local: LocalNode) -> NodeId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Node::new(generation, local));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(Node::new(generation, local)));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            ((self.nodes.len() - 1) as u32, generation)
        };
        let id = NodeId::new(idx, generation);
        if let Some(p) = parent
            && self.is_alive(p)
        {
            self.link_parent(id, p);
        }
        id
    }

    /// Remove a node and its subtree.
    ///
    /// Returns the removed identifiers, the node itself first, followed by its
    /// descendants in depth-first order. Returns an empty list for stale ids.
    pub fn remove(&mut self, id: NodeId) -> Vec<NodeId> {
        let mut removed = Vec::new();
        if !self.is_alive(id) {
            return removed;
        }
        if let Some(parent) = self.node(id).parent {
            self.unlink_parent(id, parent);
        }
        let mut stack = alloc::vec![id];
        while let Some(cur) = stack.pop() {
            let Some(node) = self.nodes[cur.idx()].take() else {
                continue;
            };
            // Keep depth-first order: push children reversed so the first child pops first.
            stack.extend(node.children.iter().rev().copied());
            self.free_list.push(cur.idx());
            removed.push(cur);
        }
        removed
    }

    /// Move `id` to the end of `new_parent`'s children (or detach it if `None`).
    ///
    /// Returns `false` without changing anything if either id is stale or if the
    /// move would make a node its own ancestor.
    pub fn reparent(&mut self, id: NodeId, new_parent: Option<NodeId>) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        if let Some(p) = new_parent
            && (!self.is_alive(p) || self.is_in_subtree(p, id))
        {
            return false;
        }
        if let Some(parent) = self.node(id).parent {
            self.unlink_parent(id, parent);
        }
        if let Some(p) = new_parent {
            self.link_parent(id, p);
        }
        true
    }

    /// Returns true if `id` refers to a live node.
    ///
    /// A `NodeId` is considered live if its slot exists and its generation matches
    /// the current generation stored in that slot.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.nodes
            .get(id.idx())
            .and_then(|n| n.as_ref())
            .map(|n| n.generation == id.1)
            .unwrap_or(false)
    }

    /// Returns the parent of a node if live, or `None` for roots, detached nodes, or stale ids.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.node_opt(id).and_then(|node| node.parent)
    }

    /// Get the children of a node in draw order, or an empty slice if the node is stale.
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        match self.node_opt(id) {
            Some(node) => &node.children,
            None => &[],
        }
    }

    /// Returns the topmost ancestor of `id` (or `id` itself if it has no parent).
    pub fn root_of(&self, id: NodeId) -> Option<NodeId> {
        if !self.is_alive(id) {
            return None;
        }
        let mut cur = id;
        while let Some(p) = self.parent_of(cur) {
            cur = p;
        }
        Some(cur)
    }

    /// Returns true if `node` is `root` or a descendant of `root`.
    pub fn is_in_subtree(&self, node: NodeId, root: NodeId) -> bool {
        if !self.is_alive(node) || !self.is_alive(root) {
            return false;
        }
        let mut cur = Some(node);
        while let Some(c) = cur {
            if c == root {
                return true;
            }
            cur = self.parent_of(c);
        }
        false
    }

    /// Number of ancestors above `id`; `None` for stale ids.
    pub fn depth(&self, id: NodeId) -> Option<usize> {
        if !self.is_alive(id) {
            return None;
        }
        let mut depth = 0;
        let mut cur = id;
        while let Some(p) = self.parent_of(cur) {
            depth += 1;
            cur = p;
        }
        Some(depth)
    }

    /// Local geometry of a live node.
    pub fn local(&self, id: NodeId) -> Option<&LocalNode> {
        self.node_opt(id).map(|n| &n.local)
    }

    /// Mutable local geometry of a live node.
    pub fn local_mut(&mut self, id: NodeId) -> Option<&mut LocalNode> {
        self.node_opt_mut(id).map(|n| &mut n.local)
    }

    /// Update local transform.
    pub fn set_local_transform(&mut self, id: NodeId, tf: Affine) {
        if let Some(n) = self.node_opt_mut(id) {
            n.local.local_transform = tf;
        }
    }

    /// Update local bounds.
    pub fn set_local_bounds(&mut self, id: NodeId, bounds: Rect) {
        if let Some(n) = self.node_opt_mut(id) {
            n.local.local_bounds = bounds;
        }
    }

    /// Update hit-testing participation.
    pub fn set_touchable(&mut self, id: NodeId, touchable: Touchable) {
        if let Some(n) = self.node_opt_mut(id) {
            n.local.touchable = touchable;
        }
    }

    /// Update visibility.
    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        if let Some(n) = self.node_opt_mut(id) {
            n.local.visible = visible;
        }
    }

    /// Transform from the node's local space into the space of its topmost ancestor's parent.
    ///
    /// For a node attached under a stage root with an identity transform this
    /// is the local → stage transform. Returns `None` for stale identifiers.
    pub fn world_transform(&self, id: NodeId) -> Option<Affine> {
        let mut tf = self.node_opt(id)?.local.local_transform;
        let mut cur = self.parent_of(id);
        while let Some(p) = cur {
            let node = self.node(p);
            tf = node.local.local_transform * tf;
            cur = node.parent;
        }
        Some(tf)
    }

    /// Map a point from world space into the node's local space.
    pub fn world_to_local(&self, id: NodeId, point: Point) -> Option<Point> {
        self.world_transform(id).map(|tf| tf.inverse() * point)
    }

    /// Map a point from the node's local space into world space.
    pub fn local_to_world(&self, id: NodeId, point: Point) -> Option<Point> {
        self.world_transform(id).map(|tf| tf * point)
    }

    /// Find the topmost node under `point` within the subtree at `root`.
    ///
    /// `point` is expressed in the coordinate space of `root`'s parent (world
    /// space when `root` is a topmost node). Children are tested from last to
    /// first, so later siblings win, and a child always wins over its parent.
    ///
    /// Invisible nodes hide their whole subtree. When `respect_touchable` is
    /// set, [`Touchable::Disabled`] hides the whole subtree and
    /// [`Touchable::ChildrenOnly`] lets only descendants be hit.
    pub fn hit_test(&self, root: NodeId, point: Point, respect_touchable: bool) -> Option<NodeId> {
        let node = self.node_opt(root)?;
        if !node.local.visible {
            return None;
        }
        if respect_touchable && node.local.touchable == Touchable::Disabled {
            return None;
        }
        let local_point = node.local.local_transform.inverse() * point;
        for &child in node.children.iter().rev() {
            if let Some(hit) = self.hit_test(child, local_point, respect_touchable) {
                return Some(hit);
            }
        }
        if respect_touchable && node.local.touchable != Touchable::Enabled {
            return None;
        }
        node.local
            .local_bounds
            .contains(local_point)
            .then_some(root)
    }

    // --- internals ---

    fn node(&self, id: NodeId) -> &Node {
        self.nodes[id.idx()].as_ref().expect("dangling NodeId")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes[id.idx()].as_mut().expect("dangling NodeId")
    }

    fn node_opt(&self, id: NodeId) -> Option<&Node> {
        let n = self.nodes.get(id.idx())?.as_ref()?;
        (n.generation == id.1).then_some(n)
    }

    fn node_opt_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let n = self.nodes.get_mut(id.idx())?.as_mut()?;
        if n.generation != id.1 {
            return None;
        }
        Some(n)
    }

    fn link_parent(&mut self, id: NodeId, parent: NodeId) {
        let parent_node = self.node_mut(parent);
        parent_node.children.push(id);
        self.node_mut(id).parent = Some(parent);
    }

    fn unlink_parent(&mut self, id: NodeId, parent: NodeId) {
        let p = self.node_mut(parent);
        p.children.retain(|c| *c != id);
        self.node_mut(id).parent = None;
    }
}
