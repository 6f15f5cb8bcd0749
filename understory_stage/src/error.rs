// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types reported by dispatch, focus, and registry operations.

use core::fmt;

use understory_scene::NodeId;

use crate::registry::Capability;
use crate::types::TypeTag;

/// Errors reported before any listener or handler runs.
///
/// Listener and handler panics are never converted into these; they unwind
/// through the dispatch call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchError {
    /// A legacy event was fired (or a routed event raised) without a target.
    MissingTarget,
    /// A routed event was raised without an event kind.
    MissingKind,
    /// The target or source refers to a node that has been removed.
    StaleNode(NodeId),
    /// The event payload does not match what the event kind declares.
    CapabilityMismatch {
        /// Name of the event kind.
        kind: &'static str,
        /// Payload the kind expects.
        expected: Capability,
        /// Payload the event carried.
        found: Capability,
    },
    /// A pointer index outside `0..max`.
    PointerOutOfRange {
        /// The rejected pointer index.
        pointer: i32,
        /// Number of pointer slots.
        max: usize,
    },
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTarget => write!(f, "event has no target"),
            Self::MissingKind => write!(f, "routed event has no event kind"),
            Self::StaleNode(id) => write!(f, "node {id:?} is no longer alive"),
            Self::CapabilityMismatch {
                kind,
                expected,
                found,
            } => write!(
                f,
                "event kind {kind} expects {expected:?} arguments, got {found:?}"
            ),
            Self::PointerOutOfRange { pointer, max } => {
                write!(f, "pointer {pointer} out of range 0..{max}")
            }
        }
    }
}

impl core::error::Error for DispatchError {}

/// Errors reported by [`TypeTable::declare`](crate::types::TypeTable::declare).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeError {
    /// The parent tag was not declared by this table.
    UnknownParent(TypeTag),
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownParent(tag) => write!(f, "unknown parent type {tag:?}"),
        }
    }
}

impl core::error::Error for TypeError {}
