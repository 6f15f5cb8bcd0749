// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Class handlers: per event kind, one handler per node type.
//!
//! ## Forest shape
//!
//! Each event kind owns a [`ClassHandlerForest`]. A forest node maps a single
//! [`TypeTag`] to a handler; a node's children are registrations for strict
//! subtypes of its tag. Registering a handler for a tag:
//!
//! - replaces the handler when the tag is already present,
//! - otherwise becomes a child of the most specific registered supertype
//!   (or a new root),
//! - and adopts any existing siblings whose tags derive from it.
//!
//! For a node of type `T`, the applicable handlers are the path from a root
//! down to the most specific registered supertype of `T`, invoked
//! most-derived first.

use alloc::vec::Vec;

use smallvec::SmallVec;

use crate::handlers::HandlerEntry;
use crate::registry::EventKind;
use crate::types::{TypeTable, TypeTag};

/// Where class handlers run relative to a node's own handlers.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ClassHandlerOrder {
    /// Class handlers run first.
    #[default]
    BeforeInstance,
    /// Class handlers run after the node's handlers.
    AfterInstance,
    /// Class handlers never run.
    Disabled,
}

/// Buffer of applicable class handler entries.
pub type ClassHandlerList = SmallVec<[HandlerEntry; 4]>;

#[derive(Debug)]
struct ForestNode {
    tag: TypeTag,
    entry: HandlerEntry,
    children: Vec<usize>,
}

/// Class handler registrations for one event kind.
#[derive(Debug, Default)]
pub struct ClassHandlerForest {
    nodes: Vec<ForestNode>,
    roots: Vec<usize>,
}

impl ClassHandlerForest {
    /// Create an empty forest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `entry` for `tag`. Returns `true` when the tag is new and
    /// `false` when an existing registration was replaced.
    pub fn insert(&mut self, types: &TypeTable, tag: TypeTag, entry: HandlerEntry) -> bool {
        if let Some(existing) = self.nodes.iter_mut().find(|n| n.tag == tag) {
            existing.entry = entry;
            return false;
        }

        let parent = self.deepest_supertype(types, tag);
        let index = self.nodes.len();
        let level = match parent {
            Some(p) => core::mem::take(&mut self.nodes[p].children),
            None => core::mem::take(&mut self.roots),
        };
        let (adopted, mut kept): (Vec<usize>, Vec<usize>) = level
            .into_iter()
            .partition(|&c| types.is_subtype_of(self.nodes[c].tag, tag));
        kept.push(index);
        match parent {
            Some(p) => self.nodes[p].children = kept,
            None => self.roots = kept,
        }
        self.nodes.push(ForestNode {
            tag,
            entry,
            children: adopted,
        });
        true
    }

    fn deepest_supertype(&self, types: &TypeTable, tag: TypeTag) -> Option<usize> {
        let mut found = None;
        let mut level = &self.roots;
        while let Some(&next) = level
            .iter()
            .find(|&&c| types.is_subtype_of(tag, self.nodes[c].tag))
        {
            found = Some(next);
            level = &self.nodes[next].children;
        }
        found
    }

    /// Handler registered for exactly `tag`.
    pub fn get(&self, tag: TypeTag) -> Option<&HandlerEntry> {
        self.nodes.iter().find(|n| n.tag == tag).map(|n| &n.entry)
    }

    /// Forest parent of `tag`'s registration.
    pub fn parent_of(&self, tag: TypeTag) -> Option<TypeTag> {
        let index = self.nodes.iter().position(|n| n.tag == tag)?;
        self.nodes
            .iter()
            .find(|n| n.children.contains(&index))
            .map(|n| n.tag)
    }

    /// Tags registered as forest roots, in registration order.
    pub fn roots(&self) -> impl Iterator<Item = TypeTag> + '_ {
        self.roots.iter().map(|&r| self.nodes[r].tag)
    }

    /// Number of registrations.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append the handlers applicable to a node of type `tag` to `out`,
    /// most-derived first.
    pub fn collect_applicable(&self, types: &TypeTable, tag: TypeTag, out: &mut ClassHandlerList) {
        let mut path: SmallVec<[usize; 8]> = SmallVec::new();
        let mut level = &self.roots;
        while let Some(&next) = level
            .iter()
            .find(|&&c| types.is_subtype_of(tag, self.nodes[c].tag))
        {
            path.push(next);
            level = &self.nodes[next].children;
        }
        out.extend(path.iter().rev().map(|&i| self.nodes[i].entry.clone()));
    }
}

/// Class handler forests for every event kind.
#[derive(Debug, Default)]
pub struct ClassHandlers {
    by_kind: Vec<Option<ClassHandlerForest>>,
}

impl ClassHandlers {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `entry` for nodes of type `tag` receiving `kind`.
    ///
    /// Returns `false` when an existing registration for the same tag was
    /// replaced.
    pub fn register(
        &mut self,
        types: &TypeTable,
        kind: EventKind,
        tag: TypeTag,
        entry: HandlerEntry,
    ) -> bool {
        let index = kind.index();
        if self.by_kind.len() <= index {
            self.by_kind.resize_with(index + 1, || None);
        }
        self.by_kind[index]
            .get_or_insert_with(ClassHandlerForest::new)
            .insert(types, tag, entry)
    }

    /// Forest for `kind`, if any class handler was registered for it.
    pub fn forest(&self, kind: EventKind) -> Option<&ClassHandlerForest> {
        self.by_kind.get(kind.index()).and_then(Option::as_ref)
    }

    /// Append the class handlers for a node of type `tag` receiving `kind`.
    pub fn collect(
        &self,
        types: &TypeTable,
        kind: EventKind,
        tag: TypeTag,
        out: &mut ClassHandlerList,
    ) {
        if let Some(forest) = self.forest(kind) {
            forest.collect_applicable(types, tag, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::handler;
    use alloc::rc::Rc;
    use alloc::vec;

    fn entry() -> HandlerEntry {
        HandlerEntry {
            handler: handler(|_, _, _| {}),
            handled_too: false,
        }
    }

    struct Hierarchy {
        types: TypeTable,
        widget: TypeTag,
        button: TypeTag,
        toggle: TypeTag,
        label: TypeTag,
    }

    fn hierarchy() -> Hierarchy {
        let mut types = TypeTable::new();
        let widget = types.declare("Widget", TypeTable::NODE).unwrap();
        let button = types.declare("Button", widget).unwrap();
        let toggle = types.declare("Toggle", button).unwrap();
        let label = types.declare("Label", widget).unwrap();
        Hierarchy {
            types,
            widget,
            button,
            toggle,
            label,
        }
    }

    #[test]
    fn insert_replaces_existing_tag() {
        let h = hierarchy();
        let mut forest = ClassHandlerForest::new();
        let first = entry();
        let second = entry();
        assert!(forest.insert(&h.types, h.button, first));
        assert!(!forest.insert(&h.types, h.button, second.clone()));
        assert_eq!(forest.len(), 1);
        assert!(Rc::ptr_eq(&forest.get(h.button).unwrap().handler, &second.handler));
    }

    #[test]
    fn insert_nests_under_most_specific_supertype() {
        let h = hierarchy();
        let mut forest = ClassHandlerForest::new();
        forest.insert(&h.types, h.widget, entry());
        forest.insert(&h.types, h.button, entry());
        forest.insert(&h.types, h.toggle, entry());
        assert_eq!(forest.parent_of(h.toggle), Some(h.button));
        assert_eq!(forest.parent_of(h.button), Some(h.widget));
        assert_eq!(forest.roots().collect::<Vec<_>>(), vec![h.widget]);
    }

    #[test]
    fn insert_adopts_subtype_siblings() {
        let h = hierarchy();
        let mut forest = ClassHandlerForest::new();
        forest.insert(&h.types, h.toggle, entry());
        forest.insert(&h.types, h.label, entry());
        assert_eq!(forest.roots().count(), 2);

        forest.insert(&h.types, h.widget, entry());
        assert_eq!(forest.roots().collect::<Vec<_>>(), vec![h.widget]);
        assert_eq!(forest.parent_of(h.toggle), Some(h.widget));
        assert_eq!(forest.parent_of(h.label), Some(h.widget));

        // Button slots in between Widget and Toggle, leaving Label alone.
        forest.insert(&h.types, h.button, entry());
        assert_eq!(forest.parent_of(h.toggle), Some(h.button));
        assert_eq!(forest.parent_of(h.button), Some(h.widget));
        assert_eq!(forest.parent_of(h.label), Some(h.widget));
    }

    #[test]
    fn applicable_handlers_are_most_derived_first() {
        let h = hierarchy();
        let mut forest = ClassHandlerForest::new();
        let widget = entry();
        let button = entry();
        let label = entry();
        forest.insert(&h.types, h.button, button.clone());
        forest.insert(&h.types, h.widget, widget.clone());
        forest.insert(&h.types, h.label, label);

        let mut out = ClassHandlerList::new();
        forest.collect_applicable(&h.types, h.toggle, &mut out);
        assert_eq!(out.len(), 2);
        assert!(Rc::ptr_eq(&out[0].handler, &button.handler));
        assert!(Rc::ptr_eq(&out[1].handler, &widget.handler));

        out.clear();
        forest.collect_applicable(&h.types, TypeTable::GROUP, &mut out);
        assert!(out.is_empty());
    }
}
