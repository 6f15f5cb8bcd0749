// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node type hierarchy used to resolve class handlers.
//!
//! A [`TypeTable`] is a single-inheritance hierarchy of [`TypeTag`]s rooted at
//! [`TypeTable::NODE`]. It is built once, before the stage, and moved into it.
//!
//! ```
//! use understory_stage::types::TypeTable;
//!
//! let mut types = TypeTable::new();
//! let button = types.declare("Button", TypeTable::GROUP).unwrap();
//! let toggle = types.declare("Toggle", button).unwrap();
//!
//! assert!(types.is_subtype_of(toggle, TypeTable::NODE));
//! assert!(!types.is_subtype_of(button, toggle));
//! let chain: Vec<_> = types.chain(toggle).collect();
//! assert_eq!(chain, vec![toggle, button, TypeTable::GROUP, TypeTable::NODE]);
//! ```

use alloc::vec::Vec;

use crate::error::TypeError;

/// Identifier of a declared node type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeTag(u32);

impl TypeTag {
    /// Declaration index of this tag.
    pub const fn index(self) -> u32 {
        self.0
    }

    const fn idx(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
struct TypeEntry {
    name: &'static str,
    parent: Option<TypeTag>,
}

/// Single-inheritance table of node types.
#[derive(Clone, Debug)]
pub struct TypeTable {
    entries: Vec<TypeEntry>,
}

impl TypeTable {
    /// Root of the hierarchy. Every declared type is a subtype of it.
    pub const NODE: TypeTag = TypeTag(0);
    /// Container nodes. The stage root is a `GROUP`.
    pub const GROUP: TypeTag = TypeTag(1);

    /// Create a table holding only [`NODE`](Self::NODE) and [`GROUP`](Self::GROUP).
    pub fn new() -> Self {
        Self {
            entries: alloc::vec![
                TypeEntry {
                    name: "Node",
                    parent: None,
                },
                TypeEntry {
                    name: "Group",
                    parent: Some(Self::NODE),
                },
            ],
        }
    }

    /// Declare a new type deriving from `parent`.
    pub fn declare(&mut self, name: &'static str, parent: TypeTag) -> Result<TypeTag, TypeError> {
        if !self.contains(parent) {
            return Err(TypeError::UnknownParent(parent));
        }
        #[allow(
            clippy::cast_possible_truncation,
            reason = "Type tags are u32; more than u32::MAX declarations is unsupported."
        )]
        let tag = TypeTag(self.entries.len() as u32);
        self.entries.push(TypeEntry {
            name,
            parent: Some(parent),
        });
        Ok(tag)
    }

    /// Whether `tag` was declared by this table.
    pub fn contains(&self, tag: TypeTag) -> bool {
        tag.idx() < self.entries.len()
    }

    /// Debug name of `tag`.
    pub fn name(&self, tag: TypeTag) -> Option<&'static str> {
        self.entries.get(tag.idx()).map(|e| e.name)
    }

    /// Direct supertype of `tag`, `None` for [`NODE`](Self::NODE) and unknown tags.
    pub fn parent_of(&self, tag: TypeTag) -> Option<TypeTag> {
        self.entries.get(tag.idx()).and_then(|e| e.parent)
    }

    /// Whether `sub` is `sup` or derives from it.
    pub fn is_subtype_of(&self, sub: TypeTag, sup: TypeTag) -> bool {
        self.chain(sub).any(|t| t == sup)
    }

    /// `tag` followed by its supertypes, most-derived first.
    ///
    /// Empty for tags this table did not declare.
    pub fn chain(&self, tag: TypeTag) -> impl Iterator<Item = TypeTag> + '_ {
        let start = self.contains(tag).then_some(tag);
        core::iter::successors(start, |t| self.parent_of(*t))
    }

    /// Number of declared types, including the two built-ins.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false; the built-in types are always present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}
