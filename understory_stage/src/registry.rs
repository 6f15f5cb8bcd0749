// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event kinds and the registry that hands them out.
//!
//! An [`EventKind`] is a small copyable identity: routing strategy, owning
//! node type, payload capability, and a registry-assigned index. Per-node
//! handler tables and the class handler registry are keyed by that index.

use alloc::vec::Vec;

use crate::types::{TypeTable, TypeTag};

/// How a routed event travels through the tree.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RoutingStrategy {
    /// Source first, then ancestors nearest to root.
    Bubble,
    /// Ancestors root to nearest, then the source.
    Tunnel,
    /// Only the source.
    Direct,
}

/// Payload an event kind carries.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    /// No payload.
    Plain,
    /// Pointer, key, or scroll payload.
    Input,
    /// Ownership transfer payload.
    Focus,
}

/// Identity of a registered event kind.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct EventKind {
    index: u32,
    strategy: RoutingStrategy,
    capability: Capability,
    owner: TypeTag,
    name: &'static str,
}

impl EventKind {
    /// Registry index; stable for the lifetime of the registry.
    pub const fn index(self) -> usize {
        self.index as usize
    }

    /// Routing strategy.
    pub const fn strategy(self) -> RoutingStrategy {
        self.strategy
    }

    /// Payload capability.
    pub const fn capability(self) -> Capability {
        self.capability
    }

    /// Type that declared this kind.
    pub const fn owner(self) -> TypeTag {
        self.owner
    }

    /// Debug name.
    pub const fn name(self) -> &'static str {
        self.name
    }
}

/// Append-only registry of event kinds.
#[derive(Clone, Debug, Default)]
pub struct EventRegistry {
    kinds: Vec<EventKind>,
}

impl EventRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new kind. Every call yields a distinct index.
    pub fn register(
        &mut self,
        name: &'static str,
        strategy: RoutingStrategy,
        capability: Capability,
        owner: TypeTag,
    ) -> EventKind {
        #[allow(
            clippy::cast_possible_truncation,
            reason = "Event kind indices are u32; more than u32::MAX kinds is unsupported."
        )]
        let kind = EventKind {
            index: self.kinds.len() as u32,
            strategy,
            capability,
            owner,
            name,
        };
        self.kinds.push(kind);
        kind
    }

    /// Look up a kind by index.
    pub fn get(&self, index: usize) -> Option<EventKind> {
        self.kinds.get(index).copied()
    }

    /// First kind registered under `name`.
    pub fn find(&self, name: &str) -> Option<EventKind> {
        self.kinds.iter().copied().find(|k| k.name == name)
    }

    /// Number of registered kinds.
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Whether no kinds are registered.
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Registered kinds in index order.
    pub fn iter(&self) -> impl Iterator<Item = EventKind> + '_ {
        self.kinds.iter().copied()
    }
}

/// Tunnel preview kind paired with its bubbling main kind.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct InputPair {
    /// Tunnel kind raised first.
    pub preview: EventKind,
    /// Bubble kind raised when the preview was not handled.
    pub main: EventKind,
}

/// Kinds raised around an ownership transfer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TransferPair {
    /// Raised at the previous owner; cancelling keeps ownership.
    pub lost: EventKind,
    /// Raised at the new owner; cancelling rolls ownership back.
    pub got: EventKind,
}

/// Kinds the stage registers for itself.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StandardEvents {
    /// Pointer pressed.
    pub touch_down: InputPair,
    /// Pointer released.
    pub touch_up: InputPair,
    /// Pressed pointer moved.
    pub touch_dragged: InputPair,
    /// Mouse moved with no button pressed.
    pub mouse_moved: InputPair,
    /// Scroll wheel.
    pub scrolled: InputPair,
    /// Key pressed.
    pub key_down: InputPair,
    /// Key released.
    pub key_up: InputPair,
    /// Character typed.
    pub key_typed: InputPair,
    /// Pointer started hovering a node.
    pub enter: EventKind,
    /// Pointer stopped hovering a node.
    pub leave: EventKind,
    /// Keyboard focus transfer.
    pub keyboard_focus: TransferPair,
    /// Scroll focus transfer.
    pub scroll_focus: TransferPair,
    /// Touch capture transfer.
    pub touch_capture: TransferPair,
}

impl StandardEvents {
    /// Register the standard kinds into `registry`, all owned by [`TypeTable::NODE`].
    pub fn register(registry: &mut EventRegistry) -> Self {
        let mut input = |preview, main| InputPair {
            preview: registry.register(
                preview,
                RoutingStrategy::Tunnel,
                Capability::Input,
                TypeTable::NODE,
            ),
            main: registry.register(
                main,
                RoutingStrategy::Bubble,
                Capability::Input,
                TypeTable::NODE,
            ),
        };
        let touch_down = input("PreviewTouchDown", "TouchDown");
        let touch_up = input("PreviewTouchUp", "TouchUp");
        let touch_dragged = input("PreviewTouchDragged", "TouchDragged");
        let mouse_moved = input("PreviewMouseMoved", "MouseMoved");
        let scrolled = input("PreviewScrolled", "Scrolled");
        let key_down = input("PreviewKeyDown", "KeyDown");
        let key_up = input("PreviewKeyUp", "KeyUp");
        let key_typed = input("PreviewKeyTyped", "KeyTyped");

        let enter = registry.register(
            "Enter",
            RoutingStrategy::Direct,
            Capability::Input,
            TypeTable::NODE,
        );
        let leave = registry.register(
            "Leave",
            RoutingStrategy::Direct,
            Capability::Input,
            TypeTable::NODE,
        );

        let mut transfer = |lost, got| TransferPair {
            lost: registry.register(
                lost,
                RoutingStrategy::Bubble,
                Capability::Focus,
                TypeTable::NODE,
            ),
            got: registry.register(
                got,
                RoutingStrategy::Bubble,
                Capability::Focus,
                TypeTable::NODE,
            ),
        };
        let keyboard_focus = transfer("LostKeyboardFocus", "GotKeyboardFocus");
        let scroll_focus = transfer("LostScrollFocus", "GotScrollFocus");
        let touch_capture = transfer("LostTouchCapture", "GotTouchCapture");

        Self {
            touch_down,
            touch_up,
            touch_dragged,
            mouse_moved,
            scrolled,
            key_down,
            key_up,
            key_typed,
            enter,
            leave,
            keyboard_focus,
            scroll_focus,
            touch_capture,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn indices_are_unique_and_monotonic() {
        let mut registry = EventRegistry::new();
        let a = registry.register(
            "A",
            RoutingStrategy::Bubble,
            Capability::Plain,
            TypeTable::NODE,
        );
        let b = registry.register(
            "B",
            RoutingStrategy::Direct,
            Capability::Plain,
            TypeTable::NODE,
        );
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(registry.get(1), Some(b));
        assert_eq!(registry.get(2), None);
        assert_eq!(registry.find("A"), Some(a));
    }

    #[test]
    fn same_name_still_gets_a_new_kind() {
        let mut registry = EventRegistry::new();
        let a = registry.register(
            "Click",
            RoutingStrategy::Bubble,
            Capability::Plain,
            TypeTable::NODE,
        );
        let b = registry.register(
            "Click",
            RoutingStrategy::Bubble,
            Capability::Plain,
            TypeTable::NODE,
        );
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn standard_kinds_have_expected_shapes() {
        let mut registry = EventRegistry::new();
        let events = StandardEvents::register(&mut registry);
        assert_eq!(registry.len(), 8 * 2 + 2 + 3 * 2);
        assert_eq!(events.touch_down.preview.strategy(), RoutingStrategy::Tunnel);
        assert_eq!(events.touch_down.main.strategy(), RoutingStrategy::Bubble);
        assert_eq!(events.enter.strategy(), RoutingStrategy::Direct);
        assert_eq!(events.keyboard_focus.got.capability(), Capability::Focus);
        let indices: Vec<_> = registry.iter().map(|k| k.index()).collect();
        assert!(indices.windows(2).all(|w| w[0] + 1 == w[1]));
    }
}
