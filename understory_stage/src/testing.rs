// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared fixtures for unit tests.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;

use kurbo::Rect;
use understory_scene::{LocalNode, NodeId};

use crate::Stage;
use crate::handlers::{HandlerRef, handler};
use crate::listeners::{ListenerRef, listener};
use crate::types::TypeTable;

pub(crate) type Trace = Rc<RefCell<Vec<NodeId>>>;

pub(crate) fn trace() -> Trace {
    Rc::default()
}

/// Nested nodes under the root, each covering `0..100` in both axes.
/// Returns `[root, n1, ..., n_depth]`.
pub(crate) fn chain(stage: &mut Stage, depth: usize) -> Vec<NodeId> {
    let mut nodes = alloc::vec![stage.root()];
    for _ in 0..depth {
        let parent = nodes.last().copied();
        let node = stage.insert(
            parent,
            LocalNode::with_bounds(Rect::new(0.0, 0.0, 100.0, 100.0)),
            TypeTable::NODE,
        );
        nodes.push(node);
    }
    nodes
}

/// Listener that records the listening node and returns `handled`.
pub(crate) fn recording_listener(trace: &Trace, handled: bool) -> ListenerRef {
    let trace = trace.clone();
    listener(move |_, event| {
        if let Some(node) = event.listener() {
            trace.borrow_mut().push(node);
        }
        handled
    })
}

/// Handler that records the sender.
pub(crate) fn recording_handler(trace: &Trace) -> HandlerRef {
    let trace = trace.clone();
    handler(move |_, sender, _| trace.borrow_mut().push(sender))
}
