// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ancestor snapshots for dispatch.
//!
//! Dispatch walks a node's ancestor chain while listeners are free to edit the
//! tree. The walker therefore copies the chain up front into an [`Ancestors`]
//! buffer: re-parenting or removing nodes afterwards is not visible through
//! the snapshot.
//!
//! [`Ancestors`] keeps up to [`INLINE_DEPTH`] entries inline, so walking a
//! typical UI hierarchy does not touch the heap.

use smallvec::SmallVec;

use crate::tree::Tree;
use crate::types::NodeId;

/// Number of ancestors stored without a heap allocation.
pub const INLINE_DEPTH: usize = 16;

/// A snapshot of an ancestor chain.
pub type Ancestors = SmallVec<[NodeId; INLINE_DEPTH]>;

impl Tree {
    /// Collect the ancestors of `node` into `out`, nearest first.
    ///
    /// `out` is cleared first. The node itself is not included; a stale or
    /// parentless node yields an empty chain.
    pub fn collect_ancestors(&self, node: NodeId, out: &mut Ancestors) {
        out.clear();
        let mut cur = self.parent_of(node);
        // Parent links are acyclic; `reparent` refuses cycles.
        while let Some(p) = cur {
            out.push(p);
            cur = self.parent_of(p);
        }
    }

    /// Snapshot the ancestors of `node`, nearest first.
    pub fn ancestors(&self, node: NodeId) -> Ancestors {
        let mut out = Ancestors::new();
        self.collect_ancestors(node, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use crate::{LocalNode, Tree};

    #[test]
    fn nearest_first_and_excludes_self() {
        let mut tree = Tree::new();
        let root = tree.insert(None, LocalNode::default());
        let a = tree.insert(Some(root), LocalNode::default());
        let b = tree.insert(Some(a), LocalNode::default());
        let target = tree.insert(Some(b), LocalNode::default());

        let chain = tree.ancestors(target);
        assert_eq!(chain.as_slice(), &[b, a, root]);
        assert!(tree.ancestors(root).is_empty());
    }

    #[test]
    fn snapshot_ignores_later_edits() {
        let mut tree = Tree::new();
        let root = tree.insert(None, LocalNode::default());
        let a = tree.insert(Some(root), LocalNode::default());
        let target = tree.insert(Some(a), LocalNode::default());

        let chain = tree.ancestors(target);
        tree.reparent(target, Some(root));
        tree.remove(a);
        assert_eq!(chain.as_slice(), &[a, root]);
        assert_eq!(tree.ancestors(target).as_slice(), &[root]);
    }

    #[test]
    fn deep_chains_spill_without_losing_order() {
        let mut tree = Tree::new();
        let mut cur = tree.insert(None, LocalNode::default());
        let mut expected = alloc::vec![cur];
        for _ in 0..(super::INLINE_DEPTH + 4) {
            cur = tree.insert(Some(cur), LocalNode::default());
            expected.push(cur);
        }
        let leaf = expected.pop().unwrap();
        expected.reverse();
        assert_eq!(tree.ancestors(leaf).as_slice(), expected.as_slice());
    }
}
