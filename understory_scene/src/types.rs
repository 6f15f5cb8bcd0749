// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the scene tree: node identifiers, touchability, and local geometry.

use kurbo::{Affine, Rect};

/// Identifier for a node in the tree (generational).
///
/// A removed node's identifier never resolves again, even after its slot is
/// reused, so holders of a stale `NodeId` can always detect that it is gone.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    /// Slot index of this identifier.
    pub const fn index(self) -> u32 {
        self.0
    }

    /// Generation of this identifier.
    pub const fn generation(self) -> u32 {
        self.1
    }
}

/// How a node participates in hit testing.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Touchable {
    /// The node and its children can be hit.
    #[default]
    Enabled,
    /// Neither the node nor its children can be hit.
    Disabled,
    /// Only the node's children can be hit; the node itself is transparent.
    ChildrenOnly,
}

/// Local geometry for a node.
#[derive(Clone, Debug)]
pub struct LocalNode {
    /// Local (untransformed) bounds used for hit testing.
    pub local_bounds: Rect,
    /// Local transform from node space into parent space.
    pub local_transform: Affine,
    /// Invisible nodes and their subtrees are never hit.
    pub visible: bool,
    /// Hit-testing participation.
    pub touchable: Touchable,
}

impl Default for LocalNode {
    fn default() -> Self {
        Self {
            local_bounds: Rect::ZERO,
            local_transform: Affine::IDENTITY,
            visible: true,
            touchable: Touchable::Enabled,
        }
    }
}

impl LocalNode {
    /// A visible, touchable node covering `bounds` with an identity transform.
    pub fn with_bounds(bounds: Rect) -> Self {
        Self {
            local_bounds: bounds,
            ..Self::default()
        }
    }
}
