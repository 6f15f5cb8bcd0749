// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Routed handlers and the per-node table that stores them by event kind.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt;

use understory_scene::NodeId;

use crate::Stage;
use crate::event::RoutedEvent;
use crate::listeners::{DelayedSet, SetItem, same_rc};
use crate::registry::EventKind;

/// Handler invoked by [`Stage::raise_event`](crate::Stage::raise_event).
///
/// `sender` is the node whose table (or whose type's class handler) is
/// running; it equals [`RoutedEvent::source`].
pub trait RoutedHandler {
    /// Handle `event` at `sender`.
    fn invoke(&self, stage: &mut Stage, sender: NodeId, event: &mut RoutedEvent);
}

impl<F> RoutedHandler for F
where
    F: Fn(&mut Stage, NodeId, &mut RoutedEvent),
{
    fn invoke(&self, stage: &mut Stage, sender: NodeId, event: &mut RoutedEvent) {
        self(stage, sender, event);
    }
}

/// Shared handler reference, compared by allocation.
pub type HandlerRef = Rc<dyn RoutedHandler>;

/// Wrap a closure as a [`HandlerRef`].
pub fn handler(f: impl Fn(&mut Stage, NodeId, &mut RoutedEvent) + 'static) -> HandlerRef {
    Rc::new(f)
}

/// A handler plus its "also fires when already handled" flag.
#[derive(Clone)]
pub struct HandlerEntry {
    /// The handler.
    pub handler: HandlerRef,
    /// Invoke even when the event is already handled.
    pub handled_too: bool,
}

impl HandlerEntry {
    /// Whether this entry runs for an event in its current state.
    pub fn accepts(&self, event: &RoutedEvent) -> bool {
        self.handled_too || !event.is_handled()
    }
}

impl SetItem for HandlerEntry {
    fn same(&self, other: &Self) -> bool {
        same_rc(&self.handler, &other.handler)
    }
}

impl fmt::Debug for HandlerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerEntry")
            .field("handled_too", &self.handled_too)
            .finish_non_exhaustive()
    }
}

/// Ordered handler entries per event kind index.
#[derive(Debug, Default)]
pub struct HandlerTable {
    by_kind: Vec<Option<DelayedSet<HandlerEntry>>>,
}

impl HandlerTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `handler` for `kind`. Returns `false` if already present.
    pub fn add(&mut self, kind: EventKind, handler: HandlerRef, handled_too: bool) -> bool {
        let index = kind.index();
        if self.by_kind.len() <= index {
            self.by_kind.resize_with(index + 1, || None);
        }
        self.by_kind[index]
            .get_or_insert_with(DelayedSet::new)
            .add(HandlerEntry {
                handler,
                handled_too,
            })
    }

    /// Remove `handler` for `kind`. Returns `false` if it was not present.
    pub fn remove(&mut self, kind: EventKind, handler: &HandlerRef) -> bool {
        let probe = HandlerEntry {
            handler: Rc::clone(handler),
            handled_too: false,
        };
        self.set_mut(kind.index())
            .is_some_and(|set| set.remove(&probe))
    }

    /// Number of handlers registered for `kind`.
    pub fn count(&self, kind: EventKind) -> usize {
        self.by_kind
            .get(kind.index())
            .and_then(Option::as_ref)
            .map_or(0, DelayedSet::len)
    }

    fn set_mut(&mut self, index: usize) -> Option<&mut DelayedSet<HandlerEntry>> {
        self.by_kind.get_mut(index).and_then(Option::as_mut)
    }

    /// Start a pass over `kind`'s entries; `None` when no entry was ever added.
    pub fn begin(&mut self, kind: EventKind) -> Option<usize> {
        self.set_mut(kind.index()).map(DelayedSet::begin)
    }

    /// Entry `i` of the running pass over `kind`.
    pub fn get(&self, kind: EventKind, i: usize) -> Option<HandlerEntry> {
        self.by_kind
            .get(kind.index())
            .and_then(Option::as_ref)
            .and_then(|set| set.get(i).cloned())
    }

    /// End a pass started by a successful [`begin`](Self::begin).
    pub fn end(&mut self, kind: EventKind) {
        if let Some(set) = self.set_mut(kind.index()) {
            set.end();
        }
    }

    /// Whether a pass over `kind` is running.
    pub fn is_iterating(&self, kind: EventKind) -> bool {
        self.by_kind
            .get(kind.index())
            .and_then(Option::as_ref)
            .is_some_and(DelayedSet::is_iterating)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Capability, EventRegistry, RoutingStrategy};
    use crate::types::TypeTable;

    fn kinds() -> (EventKind, EventKind) {
        let mut registry = EventRegistry::new();
        let a = registry.register(
            "A",
            RoutingStrategy::Bubble,
            Capability::Plain,
            TypeTable::NODE,
        );
        let b = registry.register(
            "B",
            RoutingStrategy::Bubble,
            Capability::Plain,
            TypeTable::NODE,
        );
        (a, b)
    }

    #[test]
    fn entries_are_per_kind_and_unique() {
        let (a, b) = kinds();
        let h = handler(|_, _, _| {});
        let mut table = HandlerTable::new();
        assert!(table.add(b, h.clone(), false));
        assert!(!table.add(b, h.clone(), true));
        assert_eq!(table.count(a), 0);
        assert_eq!(table.count(b), 1);
        assert_eq!(table.begin(a), None);
        assert!(!table.remove(a, &h));
        assert!(table.remove(b, &h));
        assert_eq!(table.count(b), 0);
    }

    #[test]
    fn removal_during_pass_is_deferred() {
        let (a, _) = kinds();
        let h1 = handler(|_, _, _| {});
        let h2 = handler(|_, _, _| {});
        let mut table = HandlerTable::new();
        table.add(a, h1.clone(), false);
        table.add(a, h2.clone(), true);
        assert_eq!(table.begin(a), Some(2));
        table.remove(a, &h1);
        assert!(table.get(a, 0).is_some());
        assert!(table.get(a, 1).is_some_and(|e| e.handled_too));
        table.end(a);
        assert_eq!(table.count(a), 1);
        assert!(table.get(a, 0).is_some_and(|e| e.handled_too));
    }

    #[test]
    fn handled_skip_rule() {
        let entry = HandlerEntry {
            handler: handler(|_, _, _| {}),
            handled_too: false,
        };
        let mut event = RoutedEvent::default();
        assert!(entry.accepts(&event));
        event.handle();
        assert!(!entry.accepts(&event));
        let eager = HandlerEntry {
            handled_too: true,
            ..entry
        };
        assert!(eager.accepts(&event));
    }
}
