// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Transient event objects: legacy [`Event`]s and [`RoutedEvent`]s.
//!
//! Both flavors carry the same three flags. `cancel()` sets stopped and
//! handled; `stop()` sets only stopped. Dispatch returns as soon as an event
//! is stopped and reports whether it was cancelled.
//!
//! Instances are meant to be obtained from a [`Pool`](crate::pool::Pool) and
//! reset when the pooled guard drops.

use kurbo::{Point, Vec2};
use understory_scene::NodeId;

use crate::pool::Poolable;
use crate::registry::{Capability, EventKind};

bitflags::bitflags! {
    /// Propagation state shared by both event flavors.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct EventFlags: u8 {
        /// A listener or handler reported the event as handled.
        const HANDLED = 1 << 0;
        /// The event was cancelled; implies `HANDLED` and `STOPPED`.
        const CANCELLED = 1 << 1;
        /// Propagation ends at the current node.
        const STOPPED = 1 << 2;
    }
}

/// What kind of device input an [`InputArgs`] describes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum InputType {
    /// Not an input event.
    #[default]
    None,
    /// Pointer pressed.
    TouchDown,
    /// Pointer released.
    TouchUp,
    /// Pressed pointer moved.
    TouchDragged,
    /// Mouse moved without a press.
    MouseMoved,
    /// Pointer entered a node.
    Enter,
    /// Pointer left a node.
    Leave,
    /// Scroll wheel.
    Scrolled,
    /// Key pressed.
    KeyDown,
    /// Key released.
    KeyUp,
    /// Character typed.
    KeyTyped,
}

/// Pointer, key, and scroll payload.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct InputArgs {
    /// Kind of input.
    pub input: InputType,
    /// Position in stage coordinates.
    pub stage_point: Point,
    /// Pointer index; `-1` for the desktop mouse.
    pub pointer: i32,
    /// Button index; `-1` when not applicable.
    pub button: i32,
    /// Key code for key events.
    pub key: u32,
    /// Character for key-typed events.
    pub character: Option<char>,
    /// Scroll amount.
    pub scroll: Vec2,
    /// The other node of an enter/leave pair.
    pub related: Option<NodeId>,
    /// Stage clock when the event was created.
    pub time: f64,
}

impl Default for InputArgs {
    fn default() -> Self {
        Self {
            input: InputType::None,
            stage_point: Point::ZERO,
            pointer: 0,
            button: -1,
            key: 0,
            character: None,
            scroll: Vec2::ZERO,
            related: None,
            time: 0.0,
        }
    }
}

/// Which ownership slot a transfer concerns.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FocusScope {
    /// Keyboard focus.
    Keyboard,
    /// Scroll focus.
    Scroll,
    /// Touch capture for a pointer slot.
    Touch(usize),
}

/// Payload of the lost/got events raised during an ownership transfer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FocusArgs {
    /// Slot being transferred.
    pub scope: FocusScope,
    /// Owner before the transfer.
    pub old: Option<NodeId>,
    /// Owner after the transfer.
    pub new: Option<NodeId>,
}

/// Payload of a [`RoutedEvent`].
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum EventArgs {
    /// No payload.
    #[default]
    None,
    /// Input payload.
    Input(InputArgs),
    /// Ownership transfer payload.
    Focus(FocusArgs),
}

impl EventArgs {
    /// Capability this payload satisfies.
    pub fn capability(&self) -> Capability {
        match self {
            Self::None => Capability::Plain,
            Self::Input(_) => Capability::Input,
            Self::Focus(_) => Capability::Focus,
        }
    }

    /// Input payload, if any.
    pub fn input(&self) -> Option<&InputArgs> {
        match self {
            Self::Input(args) => Some(args),
            _ => None,
        }
    }

    /// Focus payload, if any.
    pub fn focus(&self) -> Option<&FocusArgs> {
        match self {
            Self::Focus(args) => Some(args),
            _ => None,
        }
    }
}

/// Event delivered to capture and bubble listeners by
/// [`Stage::fire`](crate::Stage::fire).
#[derive(Clone, Debug)]
pub struct Event {
    pub(crate) target: Option<NodeId>,
    pub(crate) listener: Option<NodeId>,
    pub(crate) capture: bool,
    bubbles: bool,
    flags: EventFlags,
    /// Input payload.
    pub input: InputArgs,
}

impl Default for Event {
    fn default() -> Self {
        Self {
            target: None,
            listener: None,
            capture: false,
            bubbles: true,
            flags: EventFlags::empty(),
            input: InputArgs::default(),
        }
    }
}

impl Event {
    /// A bubbling event targeted at `target`.
    pub fn new(target: NodeId) -> Self {
        Self {
            target: Some(target),
            ..Self::default()
        }
    }

    /// Set the node the event is fired at.
    pub fn set_target(&mut self, target: NodeId) {
        self.target = Some(target);
    }

    /// Node the event is fired at.
    pub fn target(&self) -> Option<NodeId> {
        self.target
    }

    /// Node whose listener is currently running.
    pub fn listener(&self) -> Option<NodeId> {
        self.listener
    }

    /// Whether the current listener runs in the capture phase.
    pub fn is_capture(&self) -> bool {
        self.capture
    }

    /// Whether the bubble phase continues past the target.
    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    /// Enable or disable the ancestor bubble phase.
    pub fn set_bubbles(&mut self, bubbles: bool) {
        self.bubbles = bubbles;
    }

    /// Current flags.
    pub fn flags(&self) -> EventFlags {
        self.flags
    }

    /// Mark handled.
    pub fn handle(&mut self) {
        self.flags.insert(EventFlags::HANDLED);
    }

    /// Stop propagation and mark handled and cancelled.
    pub fn cancel(&mut self) {
        self.flags.insert(EventFlags::all());
    }

    /// Stop propagation after the current listener set.
    pub fn stop(&mut self) {
        self.flags.insert(EventFlags::STOPPED);
    }

    /// Whether any listener handled the event.
    pub fn is_handled(&self) -> bool {
        self.flags.contains(EventFlags::HANDLED)
    }

    /// Whether the event was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.flags.contains(EventFlags::CANCELLED)
    }

    /// Whether propagation was stopped.
    pub fn is_stopped(&self) -> bool {
        self.flags.contains(EventFlags::STOPPED)
    }
}

impl Poolable for Event {
    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Event delivered to routed handlers by
/// [`Stage::raise_event`](crate::Stage::raise_event).
#[derive(Clone, Debug, Default)]
pub struct RoutedEvent {
    kind: Option<EventKind>,
    original_source: Option<NodeId>,
    pub(crate) source: Option<NodeId>,
    flags: EventFlags,
    pub(crate) handled_by: Option<NodeId>,
    /// Payload; must match the kind's [`Capability`].
    pub args: EventArgs,
}

impl RoutedEvent {
    /// An event of `kind` raised at `source`.
    pub fn new(kind: EventKind, source: NodeId, args: EventArgs) -> Self {
        let mut event = Self::default();
        event.prepare(kind, source, args);
        event
    }

    /// Reinitialize a (pooled) instance for a new raise.
    pub fn prepare(&mut self, kind: EventKind, source: NodeId, args: EventArgs) {
        self.reset();
        self.kind = Some(kind);
        self.original_source = Some(source);
        self.source = Some(source);
        self.args = args;
    }

    /// Event kind.
    pub fn kind(&self) -> Option<EventKind> {
        self.kind
    }

    /// Node the event was raised at.
    pub fn original_source(&self) -> Option<NodeId> {
        self.original_source
    }

    /// Node whose handlers are currently running.
    pub fn source(&self) -> Option<NodeId> {
        self.source
    }

    /// First node whose handler marked the event handled.
    pub fn handled_by(&self) -> Option<NodeId> {
        self.handled_by
    }

    /// Current flags.
    pub fn flags(&self) -> EventFlags {
        self.flags
    }

    /// Mark handled.
    pub fn handle(&mut self) {
        self.flags.insert(EventFlags::HANDLED);
    }

    /// Stop propagation and mark handled and cancelled.
    pub fn cancel(&mut self) {
        self.flags.insert(EventFlags::all());
    }

    /// Stop propagation after the current node.
    pub fn stop(&mut self) {
        self.flags.insert(EventFlags::STOPPED);
    }

    /// Whether a handler handled the event.
    pub fn is_handled(&self) -> bool {
        self.flags.contains(EventFlags::HANDLED)
    }

    /// Whether the event was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.flags.contains(EventFlags::CANCELLED)
    }

    /// Whether propagation was stopped.
    pub fn is_stopped(&self) -> bool {
        self.flags.contains(EventFlags::STOPPED)
    }
}

impl Poolable for RoutedEvent {
    fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_implies_handled_and_stopped() {
        let mut event = Event::default();
        event.cancel();
        assert!(event.is_handled() && event.is_stopped() && event.is_cancelled());

        let mut event = Event::default();
        event.stop();
        assert!(event.is_stopped());
        assert!(!event.is_handled());
        assert!(!event.is_cancelled());
    }

    #[test]
    fn legacy_events_bubble_by_default() {
        let event = Event::default();
        assert!(event.bubbles());
        assert_eq!(event.target(), None);
        assert_eq!(event.input.button, -1);
    }

    #[test]
    fn reset_clears_everything() {
        let mut tree = understory_scene::Tree::new();
        let node = tree.insert(None, understory_scene::LocalNode::default());
        let mut event = RoutedEvent::default();
        event.handle();
        event.handled_by = Some(node);
        event.args = EventArgs::Input(InputArgs::default());
        event.reset();
        assert_eq!(event.flags(), EventFlags::empty());
        assert_eq!(event.handled_by(), None);
        assert_eq!(event.args, EventArgs::None);
    }

    #[test]
    fn payload_capabilities() {
        assert_eq!(EventArgs::None.capability(), Capability::Plain);
        assert_eq!(
            EventArgs::Input(InputArgs::default()).capability(),
            Capability::Input
        );
        let focus = FocusArgs {
            scope: FocusScope::Keyboard,
            old: None,
            new: None,
        };
        assert_eq!(EventArgs::Focus(focus).focus(), Some(&focus));
        assert_eq!(EventArgs::Focus(focus).input(), None);
    }
}
