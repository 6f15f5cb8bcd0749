// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The [`Stage`]: scene tree owner, event slot storage, and ownership state.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use hashbrown::HashMap;
use kurbo::Point;
use understory_scene::{LocalNode, NodeId, Touchable, Tree};

use crate::class_handlers::ClassHandlers;
use crate::config::StageConfig;
use crate::event::{Event, RoutedEvent};
use crate::handlers::{HandlerEntry, HandlerRef, HandlerTable};
use crate::listeners::{DelayedSet, ListenerRef};
use crate::pool::{Pool, Pooled};
use crate::registry::{EventKind, EventRegistry, StandardEvents};
use crate::types::{TypeTable, TypeTag};
use crate::viewport::{IdentityViewport, Viewport};

/// Per-node event state, shared so a running dispatch keeps it alive after
/// the node is removed.
pub(crate) struct NodeEvents {
    pub(crate) type_tag: TypeTag,
    pub(crate) bubble: RefCell<DelayedSet<ListenerRef>>,
    pub(crate) capture: RefCell<DelayedSet<ListenerRef>>,
    pub(crate) handlers: RefCell<HandlerTable>,
}

impl NodeEvents {
    fn new(type_tag: TypeTag) -> Rc<Self> {
        Rc::new(Self {
            type_tag,
            bubble: RefCell::new(DelayedSet::new()),
            capture: RefCell::new(DelayedSet::new()),
            handlers: RefCell::new(HandlerTable::new()),
        })
    }
}

/// Hover and capture bookkeeping for one pointer.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointerSlot {
    /// Pointer index reported in events; `-1` for the desktop mouse.
    pub pointer: i32,
    /// Node the pointer was last found over by [`Stage::act`].
    pub over: Option<NodeId>,
    /// Last screen position.
    pub screen: Point,
    /// Whether the pointer is pressed (or, for the mouse, has moved).
    pub live: bool,
    /// Last pressed button.
    pub button: i32,
    /// Touch capture owner.
    pub capture: Option<NodeId>,
}

impl PointerSlot {
    const fn new(pointer: i32) -> Self {
        Self {
            pointer,
            over: None,
            screen: Point::ZERO,
            live: false,
            button: -1,
            capture: None,
        }
    }
}

/// Root of a scene: owns the tree, per-node listeners and handlers, the event
/// registries, and the focus, capture, and hover holders.
///
/// ## Example
///
/// ```
/// use core::cell::Cell;
/// use std::rc::Rc;
/// use kurbo::Rect;
/// use understory_scene::LocalNode;
/// use understory_stage::{Stage, event::Event, listeners::listener, types::TypeTable};
///
/// let mut stage = Stage::default();
/// let root = stage.root();
/// let button = stage.insert(
///     Some(root),
///     LocalNode::with_bounds(Rect::new(0.0, 0.0, 10.0, 10.0)),
///     TypeTable::NODE,
/// );
///
/// let hits = Rc::new(Cell::new(0));
/// let seen = hits.clone();
/// stage.add_listener(root, listener(move |_, event| {
///     seen.set(seen.get() + 1);
///     assert!(!event.is_capture());
///     false
/// }));
///
/// let mut event = Event::new(button);
/// assert_eq!(stage.fire(&mut event), Ok(false));
/// assert_eq!(hits.get(), 1);
/// ```
pub struct Stage {
    pub(crate) tree: Tree,
    pub(crate) root: NodeId,
    pub(crate) slots: HashMap<NodeId, Rc<NodeEvents>>,
    pub(crate) types: TypeTable,
    pub(crate) registry: EventRegistry,
    pub(crate) events: StandardEvents,
    pub(crate) class_handlers: ClassHandlers,
    pub(crate) config: StageConfig,
    pub(crate) viewport: Box<dyn Viewport>,
    pub(crate) pointers: Vec<PointerSlot>,
    pub(crate) mouse: PointerSlot,
    pub(crate) keyboard_focus: Option<NodeId>,
    pub(crate) scroll_focus: Option<NodeId>,
    pub(crate) event_pool: Pool<Event>,
    pub(crate) routed_pool: Pool<RoutedEvent>,
    pub(crate) clock: f64,
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("root", &self.root)
            .field("tree", &self.tree)
            .field("slots", &self.slots.len())
            .field("kinds", &self.registry.len())
            .field("keyboard_focus", &self.keyboard_focus)
            .field("scroll_focus", &self.scroll_focus)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self::new(TypeTable::new(), EventRegistry::new(), StageConfig::default())
    }
}

impl Stage {
    /// Build a stage around prepared registries.
    ///
    /// The standard event kinds are appended to `registry`; kinds registered
    /// before this call keep their indices. The root is a [`TypeTable::GROUP`]
    /// that only its children can hit.
    pub fn new(types: TypeTable, mut registry: EventRegistry, config: StageConfig) -> Self {
        let events = StandardEvents::register(&mut registry);
        let mut tree = Tree::new();
        let root = tree.insert(
            None,
            LocalNode {
                local_bounds: config.root_bounds,
                touchable: Touchable::ChildrenOnly,
                ..LocalNode::default()
            },
        );
        let mut slots = HashMap::new();
        slots.insert(root, NodeEvents::new(TypeTable::GROUP));
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_possible_wrap,
            reason = "Pointer slot counts are small configuration values."
        )]
        let pointers = (0..config.max_pointers)
            .map(|i| PointerSlot::new(i as i32))
            .collect();
        log::debug!(
            "stage created: {} event kinds, {} pointer slots",
            registry.len(),
            config.max_pointers
        );
        Self {
            tree,
            root,
            slots,
            types,
            registry,
            events,
            class_handlers: ClassHandlers::new(),
            event_pool: Pool::new(config.pool_capacity),
            routed_pool: Pool::new(config.pool_capacity),
            config,
            viewport: Box::new(IdentityViewport),
            pointers,
            mouse: PointerSlot::new(-1),
            keyboard_focus: None,
            scroll_focus: None,
            clock: 0.0,
        }
    }

    /// Root group.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Scene tree (read-only; mutate through the stage).
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Node type hierarchy.
    pub fn types(&self) -> &TypeTable {
        &self.types
    }

    /// Event kind registry.
    pub fn registry(&self) -> &EventRegistry {
        &self.registry
    }

    /// Register an application event kind after construction.
    pub fn registry_mut(&mut self) -> &mut EventRegistry {
        &mut self.registry
    }

    /// Kinds the stage raises for device input and ownership transfers.
    pub fn events(&self) -> &StandardEvents {
        &self.events
    }

    /// Construction options.
    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    /// Replace the screen to stage projection.
    pub fn set_viewport(&mut self, viewport: impl Viewport + 'static) {
        self.viewport = Box::new(viewport);
    }

    /// Project a screen position into stage space.
    pub fn screen_to_stage(&self, screen: Point) -> Point {
        self.viewport.screen_to_stage(screen)
    }

    /// Seconds accumulated by [`act`](Self::act); used as event timestamps.
    pub fn clock(&self) -> f64 {
        self.clock
    }

    /// Topmost touchable node under `stage_point`, excluding the root.
    pub fn hit(&self, stage_point: Point, respect_touchable: bool) -> Option<NodeId> {
        self.tree
            .hit_test(self.root, stage_point, respect_touchable)
            .filter(|&n| n != self.root)
    }

    /// Whether `node` is the root or attached beneath it.
    pub fn is_on_stage(&self, node: NodeId) -> bool {
        self.tree.is_in_subtree(node, self.root)
    }

    // --- scene mutation ---

    /// Insert a node of type `type_tag` as the last child of `parent`
    /// (detached when `None` or stale).
    pub fn insert(
        &mut self,
        parent: Option<NodeId>,
        local: LocalNode,
        type_tag: TypeTag,
    ) -> NodeId {
        let id = self.tree.insert(parent, local);
        self.slots.insert(id, NodeEvents::new(type_tag));
        id
    }

    /// Remove `node` and its subtree. The root cannot be removed.
    ///
    /// Focus, capture, and hover holders referring to removed nodes are
    /// cleared without raising events. Returns the removed ids.
    pub fn remove(&mut self, node: NodeId) -> Vec<NodeId> {
        if node == self.root {
            log::warn!("refusing to remove the stage root");
            return Vec::new();
        }
        let removed = self.tree.remove(node);
        for id in &removed {
            self.slots.remove(id);
        }
        if !removed.is_empty() {
            self.forget_unreachable();
        }
        removed
    }

    /// Move `node` under `parent` (detach when `None`).
    ///
    /// Refuses stale ids, moving the root, and cycles. Holders referring to a
    /// node that ends up off stage are cleared without raising events.
    pub fn reparent(&mut self, node: NodeId, parent: Option<NodeId>) -> bool {
        if node == self.root {
            log::warn!("refusing to reparent the stage root");
            return false;
        }
        if !self.tree.reparent(node, parent) {
            log::warn!("refusing to reparent {node:?} under {parent:?}");
            return false;
        }
        if parent.is_none_or(|p| !self.is_on_stage(p)) {
            self.forget_unreachable();
        }
        true
    }

    /// Local geometry of a live node.
    pub fn local(&self, node: NodeId) -> Option<&LocalNode> {
        self.tree.local(node)
    }

    /// Mutable local geometry of a live node.
    pub fn local_mut(&mut self, node: NodeId) -> Option<&mut LocalNode> {
        self.tree.local_mut(node)
    }

    /// Declared type of a live node.
    pub fn type_of(&self, node: NodeId) -> Option<TypeTag> {
        self.slots.get(&node).map(|s| s.type_tag)
    }

    pub(crate) fn slot(&self, node: NodeId) -> Option<Rc<NodeEvents>> {
        self.slots.get(&node).cloned()
    }

    fn forget_unreachable(&mut self) {
        let root = self.root;
        let tree = &self.tree;
        let keep = |holder: &mut Option<NodeId>, what: &str| {
            if let Some(n) = *holder
                && !tree.is_in_subtree(n, root)
            {
                log::debug!("clearing {what} holder {n:?}: node left the stage");
                *holder = None;
            }
        };
        keep(&mut self.keyboard_focus, "keyboard focus");
        keep(&mut self.scroll_focus, "scroll focus");
        keep(&mut self.mouse.over, "mouse hover");
        for slot in &mut self.pointers {
            keep(&mut slot.capture, "touch capture");
            keep(&mut slot.over, "pointer hover");
        }
    }

    // --- listeners and handlers ---

    /// Add a bubble-phase listener. Returns `false` for stale nodes and
    /// duplicates.
    pub fn add_listener(&mut self, node: NodeId, listener: ListenerRef) -> bool {
        self.slots
            .get(&node)
            .is_some_and(|s| s.bubble.borrow_mut().add(listener))
    }

    /// Remove a bubble-phase listener.
    pub fn remove_listener(&mut self, node: NodeId, listener: &ListenerRef) -> bool {
        self.slots
            .get(&node)
            .is_some_and(|s| s.bubble.borrow_mut().remove(listener))
    }

    /// Add a capture-phase listener. Returns `false` for stale nodes and
    /// duplicates.
    pub fn add_capture_listener(&mut self, node: NodeId, listener: ListenerRef) -> bool {
        self.slots
            .get(&node)
            .is_some_and(|s| s.capture.borrow_mut().add(listener))
    }

    /// Remove a capture-phase listener.
    pub fn remove_capture_listener(&mut self, node: NodeId, listener: &ListenerRef) -> bool {
        self.slots
            .get(&node)
            .is_some_and(|s| s.capture.borrow_mut().remove(listener))
    }

    /// Number of bubble (or capture) listeners on `node`.
    pub fn listener_count(&self, node: NodeId, capture: bool) -> usize {
        self.slots.get(&node).map_or(0, |s| {
            if capture {
                s.capture.borrow().len()
            } else {
                s.bubble.borrow().len()
            }
        })
    }

    /// Append a routed handler for `kind` on `node`.
    ///
    /// With `handled_too` the handler also runs for events already handled.
    pub fn add_handler(
        &mut self,
        kind: EventKind,
        node: NodeId,
        handler: HandlerRef,
        handled_too: bool,
    ) -> bool {
        self.slots
            .get(&node)
            .is_some_and(|s| s.handlers.borrow_mut().add(kind, handler, handled_too))
    }

    /// Remove a routed handler for `kind` from `node`.
    pub fn remove_handler(&mut self, kind: EventKind, node: NodeId, handler: &HandlerRef) -> bool {
        self.slots
            .get(&node)
            .is_some_and(|s| s.handlers.borrow_mut().remove(kind, handler))
    }

    /// Register a class handler for `kind` on every node of type `tag` (or a
    /// subtype). Returns `false` when it replaced an earlier registration for
    /// `tag`.
    pub fn register_class_handler(
        &mut self,
        kind: EventKind,
        tag: TypeTag,
        handler: HandlerRef,
        handled_too: bool,
    ) -> bool {
        self.class_handlers.register(
            &self.types,
            kind,
            tag,
            HandlerEntry {
                handler,
                handled_too,
            },
        )
    }

    /// Class handler registrations.
    pub fn class_handlers(&self) -> &ClassHandlers {
        &self.class_handlers
    }

    // --- pools ---

    /// A cleared legacy event on loan from the stage's pool.
    pub fn obtain_event(&self) -> Pooled<Event> {
        self.event_pool.obtain()
    }

    /// A cleared routed event on loan from the stage's pool.
    pub fn obtain_routed(&self) -> Pooled<RoutedEvent> {
        self.routed_pool.obtain()
    }

    /// Legacy event pool.
    pub fn event_pool(&self) -> &Pool<Event> {
        &self.event_pool
    }

    /// Routed event pool.
    pub fn routed_pool(&self) -> &Pool<RoutedEvent> {
        &self.routed_pool
    }
}
