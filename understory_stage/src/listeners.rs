// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Listener references and the deferred-mutation set that stores them.
//!
//! ## Deferred mutation
//!
//! A [`DelayedSet`] keeps insertion order and unique membership. While one or
//! more passes are iterating it (between [`begin`](DelayedSet::begin) and
//! [`end`](DelayedSet::end)), removals and additions are buffered and applied
//! when the outermost pass ends. A pass therefore invokes exactly the items
//! present when it began, in order, even if a listener removes itself or adds
//! a sibling.
//!
//! ```
//! use understory_stage::listeners::{DelayedSet, SetItem};
//!
//! #[derive(Clone, PartialEq)]
//! struct Id(u32);
//! impl SetItem for Id {
//!     fn same(&self, other: &Self) -> bool { self == other }
//! }
//!
//! let mut set = DelayedSet::new();
//! set.add(Id(1));
//! set.add(Id(2));
//!
//! let n = set.begin();
//! assert!(set.remove(&Id(1)));
//! assert!(set.add(Id(3)));
//! // The running pass still sees the original two items.
//! assert_eq!(n, 2);
//! assert!(set.get(0).is_some());
//! set.end();
//!
//! let ids: Vec<u32> = set.iter().map(|i| i.0).collect();
//! assert_eq!(ids, vec![2, 3]);
//! ```

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt;

use smallvec::SmallVec;

use crate::Stage;
use crate::event::Event;

/// Listener invoked by [`Stage::fire`](crate::Stage::fire).
///
/// Returning `true` marks the event handled.
pub trait EventListener {
    /// Handle `event` while it is delivered to [`Event::listener`].
    fn handle(&self, stage: &mut Stage, event: &mut Event) -> bool;
}

impl<F> EventListener for F
where
    F: Fn(&mut Stage, &mut Event) -> bool,
{
    fn handle(&self, stage: &mut Stage, event: &mut Event) -> bool {
        self(stage, event)
    }
}

/// Shared listener reference. Identity is the allocation, so the same
/// reference can be added to many nodes and removed by passing it again.
pub type ListenerRef = Rc<dyn EventListener>;

/// Wrap a closure as a [`ListenerRef`].
pub fn listener(f: impl Fn(&mut Stage, &mut Event) -> bool + 'static) -> ListenerRef {
    Rc::new(f)
}

/// Membership test for [`DelayedSet`] items.
pub trait SetItem: Clone {
    /// Whether `self` and `other` are the same member.
    fn same(&self, other: &Self) -> bool;
}

pub(crate) fn same_rc<T: ?Sized>(a: &Rc<T>, b: &Rc<T>) -> bool {
    core::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

impl SetItem for ListenerRef {
    fn same(&self, other: &Self) -> bool {
        same_rc(self, other)
    }
}

/// Ordered, unique set with mutation deferred while iterating.
pub struct DelayedSet<T> {
    items: Vec<T>,
    iterating: u32,
    removals: SmallVec<[usize; 4]>,
    additions: SmallVec<[T; 2]>,
}

impl<T: SetItem> DelayedSet<T> {
    /// Create an empty set.
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            iterating: 0,
            removals: SmallVec::new(),
            additions: SmallVec::new(),
        }
    }

    fn position(&self, item: &T) -> Option<usize> {
        self.items.iter().position(|x| x.same(item))
    }

    /// Whether `item` is a member, counting pending changes.
    pub fn contains(&self, item: &T) -> bool {
        match self.position(item) {
            Some(i) => !self.removals.contains(&i),
            None => self.additions.iter().any(|x| x.same(item)),
        }
    }

    /// Add `item` at the end. Returns `false` if it was already a member.
    pub fn add(&mut self, item: T) -> bool {
        if self.iterating == 0 {
            if self.position(&item).is_some() {
                return false;
            }
            self.items.push(item);
            return true;
        }
        if let Some(i) = self.position(&item) {
            // Re-adding an item pending removal keeps its original slot.
            return match self.removals.iter().position(|&r| r == i) {
                Some(r) => {
                    self.removals.swap_remove(r);
                    true
                }
                None => false,
            };
        }
        if self.additions.iter().any(|x| x.same(&item)) {
            return false;
        }
        self.additions.push(item);
        true
    }

    /// Remove `item`. Returns `false` if it was not a member.
    pub fn remove(&mut self, item: &T) -> bool {
        if let Some(a) = self.additions.iter().position(|x| x.same(item)) {
            self.additions.remove(a);
            return true;
        }
        let Some(i) = self.position(item) else {
            return false;
        };
        if self.iterating == 0 {
            self.items.remove(i);
            return true;
        }
        if self.removals.contains(&i) {
            return false;
        }
        self.removals.push(i);
        true
    }

    /// Remove every member.
    pub fn clear(&mut self) {
        self.additions.clear();
        if self.iterating == 0 {
            self.items.clear();
        } else {
            self.removals.clear();
            self.removals.extend(0..self.items.len());
        }
    }

    /// Number of members, counting pending changes.
    pub fn len(&self) -> usize {
        self.items.len() - self.removals.len() + self.additions.len()
    }

    /// Whether the set has no members, counting pending changes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Members in invocation order, counting pending changes.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.items
            .iter()
            .enumerate()
            .filter(|(i, _)| !self.removals.contains(i))
            .map(|(_, x)| x)
            .chain(self.additions.iter())
    }

    /// Start a pass. Returns the number of items the pass visits.
    pub fn begin(&mut self) -> usize {
        self.iterating += 1;
        self.items.len()
    }

    /// Item `index` of the running pass, including items removed since the
    /// pass began.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// End a pass; the outermost pass applies buffered changes.
    pub fn end(&mut self) {
        debug_assert!(self.iterating > 0, "end() without begin()");
        self.iterating = self.iterating.saturating_sub(1);
        if self.iterating > 0 {
            return;
        }
        self.removals.sort_unstable();
        for i in self.removals.drain(..).rev() {
            self.items.remove(i);
        }
        self.items.extend(self.additions.drain(..));
    }

    /// Whether a pass is running.
    pub fn is_iterating(&self) -> bool {
        self.iterating > 0
    }
}

impl<T: SetItem> Default for DelayedSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for DelayedSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelayedSet")
            .field("items", &self.items.len())
            .field("iterating", &self.iterating)
            .field("removals", &self.removals.len())
            .field("additions", &self.additions.len())
            .finish()
    }
}
