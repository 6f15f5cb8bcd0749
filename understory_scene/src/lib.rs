// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Scene: a generational scene tree with touchability-aware hit testing.
//!
//! This crate holds the structural and geometric side of a retained-mode scene:
//!
//! - Represents a hierarchy of nodes with local bounds, transforms, visibility, and touchability.
//! - Answers "which node is under this point" with [`Tree::hit_test`].
//! - Snapshots ancestor chains for event dispatch with [`Tree::collect_ancestors`].
//!
//! It does not store listeners, route events, or track focus; `understory_stage`
//! layers those on top using [`NodeId`] as the key.
//!
//! ## Not a layout engine
//!
//! This crate does not measure or arrange anything. Upstream code computes
//! positions and sizes and writes the results into each node's [`LocalNode`].
//!
//! ## Hit testing
//!
//! Hit testing walks children from last to first (later siblings are on top)
//! and prefers children over their parent. [`Touchable`] controls participation:
//!
//! - [`Touchable::Enabled`]: the node and its children can be hit.
//! - [`Touchable::Disabled`]: the whole subtree is skipped.
//! - [`Touchable::ChildrenOnly`]: the node is transparent but its children can be hit.
//!
//! Invisible nodes hide their subtree regardless of touchability.
//!
//! ## API overview
//!
//! - [`Tree::insert`] / [`Tree::remove`] / [`Tree::reparent`]
//! - [`Tree::parent_of`], [`Tree::children_of`], [`Tree::root_of`], [`Tree::is_in_subtree`]
//! - [`Tree::world_transform`], [`Tree::world_to_local`], [`Tree::local_to_world`]
//! - [`Tree::hit_test`]
//! - [`Tree::ancestors`] / [`Tree::collect_ancestors`] → [`Ancestors`]
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod ancestors;
mod tree;
mod types;

pub use ancestors::{Ancestors, INLINE_DEPTH};
pub use tree::Tree;
pub use types::{LocalNode, NodeId, Touchable};
