// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dispatch engine: legacy [`Stage::fire`] and routed [`Stage::raise_event`].

use core::cell::RefCell;

use understory_scene::NodeId;

use crate::Stage;
use crate::class_handlers::{ClassHandlerList, ClassHandlerOrder};
use crate::error::DispatchError;
use crate::event::{Event, FocusScope, InputType, RoutedEvent};
use crate::handlers::HandlerEntry;
use crate::listeners::{DelayedSet, ListenerRef};
use crate::registry::{EventKind, RoutingStrategy};
use crate::types::TypeTag;
use crate::util::OnDrop;

impl Stage {
    /// Fire a legacy event at its target.
    ///
    /// Capture listeners run on the ancestors (root first) and then on the
    /// target; bubble listeners run on the target and then, if the event
    /// bubbles, on the ancestors (nearest first). The ancestor chain is
    /// snapshotted up front, so tree edits made by listeners do not change
    /// the route; removed nodes are skipped.
    ///
    /// Returns whether the event was cancelled, as soon as it is stopped.
    pub fn fire(&mut self, event: &mut Event) -> Result<bool, DispatchError> {
        let target = event.target().ok_or(DispatchError::MissingTarget)?;
        if !self.tree.is_alive(target) {
            return Err(DispatchError::StaleNode(target));
        }
        log::trace!("fire {:?} at {target:?}", event.input.input);

        let ancestors = self.tree.ancestors(target);
        for &node in ancestors.iter().rev() {
            self.notify_node(event, node, true);
            if event.is_stopped() {
                return Ok(event.is_cancelled());
            }
        }
        self.notify_node(event, target, true);
        if event.is_stopped() {
            return Ok(event.is_cancelled());
        }
        self.notify_node(event, target, false);
        if event.is_stopped() || !event.bubbles() {
            return Ok(event.is_cancelled());
        }
        for &node in &ancestors {
            self.notify_node(event, node, false);
            if event.is_stopped() {
                return Ok(event.is_cancelled());
            }
        }
        Ok(event.is_cancelled())
    }

    /// Run one node's capture or bubble listeners for `event`.
    ///
    /// Returns whether the event is cancelled afterwards.
    pub fn notify(
        &mut self,
        event: &mut Event,
        node: NodeId,
        capture: bool,
    ) -> Result<bool, DispatchError> {
        if event.target().is_none() {
            return Err(DispatchError::MissingTarget);
        }
        self.notify_node(event, node, capture);
        Ok(event.is_cancelled())
    }

    fn notify_node(&mut self, event: &mut Event, node: NodeId, capture: bool) {
        let Some(slot) = self.slot(node) else {
            return;
        };
        let set: &RefCell<DelayedSet<ListenerRef>> = if capture {
            &slot.capture
        } else {
            &slot.bubble
        };
        let count = set.borrow_mut().begin();
        let _end = OnDrop(|| set.borrow_mut().end());
        for i in 0..count {
            let Some(listener) = set.borrow().get(i).cloned() else {
                continue;
            };
            event.listener = Some(node);
            event.capture = capture;
            if listener.handle(self, event) {
                event.handle();
                if event.input.input == InputType::TouchDown {
                    self.capture_for_listener(node, event);
                }
            }
        }
    }

    fn capture_for_listener(&mut self, node: NodeId, event: &Event) {
        let Ok(pointer) = usize::try_from(event.input.pointer) else {
            return;
        };
        let Some(slot) = self.pointers.get(pointer) else {
            return;
        };
        if slot.capture.is_some() || !self.is_on_stage(node) {
            return;
        }
        log::debug!(
            "touch capture request: listener={node:?} target={:?} pointer={pointer} button={}",
            event.target(),
            event.input.button
        );
        self.transfer(FocusScope::Touch(pointer), Some(node), false);
    }

    /// Raise a routed event from its original source.
    ///
    /// [`RoutingStrategy::Direct`] runs only the source's handlers,
    /// [`RoutingStrategy::Tunnel`] runs root to source and
    /// [`RoutingStrategy::Bubble`] runs source to root. The walk ends as soon
    /// as the event is stopped. Handlers registered without `handled_too` are
    /// skipped once the event is handled.
    ///
    /// Returns whether the event was cancelled.
    pub fn raise_event(&mut self, event: &mut RoutedEvent) -> Result<bool, DispatchError> {
        let kind = event.kind().ok_or(DispatchError::MissingKind)?;
        let source = event
            .original_source()
            .ok_or(DispatchError::MissingTarget)?;
        if !self.tree.is_alive(source) {
            return Err(DispatchError::StaleNode(source));
        }
        let found = event.args.capability();
        if found != kind.capability() {
            return Err(DispatchError::CapabilityMismatch {
                kind: kind.name(),
                expected: kind.capability(),
                found,
            });
        }
        log::trace!("raise {} at {source:?}", kind.name());

        match kind.strategy() {
            RoutingStrategy::Direct => self.invoke_handlers(source, kind, event),
            RoutingStrategy::Tunnel => {
                let ancestors = self.tree.ancestors(source);
                for &node in ancestors.iter().rev() {
                    self.invoke_handlers(node, kind, event);
                    if event.is_stopped() {
                        return Ok(event.is_cancelled());
                    }
                }
                self.invoke_handlers(source, kind, event);
            }
            RoutingStrategy::Bubble => {
                self.invoke_handlers(source, kind, event);
                if event.is_stopped() {
                    return Ok(event.is_cancelled());
                }
                let ancestors = self.tree.ancestors(source);
                for &node in &ancestors {
                    self.invoke_handlers(node, kind, event);
                    if event.is_stopped() {
                        return Ok(event.is_cancelled());
                    }
                }
            }
        }
        Ok(event.is_cancelled())
    }

    fn invoke_handlers(&mut self, node: NodeId, kind: EventKind, event: &mut RoutedEvent) {
        let Some(slot) = self.slot(node) else {
            return;
        };
        event.source = Some(node);
        let order = self.config.class_handlers;
        if order == ClassHandlerOrder::BeforeInstance {
            self.invoke_class_handlers(node, slot.type_tag, kind, event);
        }
        let started = slot.handlers.borrow_mut().begin(kind);
        if let Some(count) = started {
            let _end = OnDrop(|| slot.handlers.borrow_mut().end(kind));
            for i in 0..count {
                let Some(entry) = slot.handlers.borrow().get(kind, i) else {
                    continue;
                };
                self.invoke_entry(&entry, node, event);
            }
        }
        if order == ClassHandlerOrder::AfterInstance {
            self.invoke_class_handlers(node, slot.type_tag, kind, event);
        }
    }

    fn invoke_class_handlers(
        &mut self,
        node: NodeId,
        tag: TypeTag,
        kind: EventKind,
        event: &mut RoutedEvent,
    ) {
        let mut entries = ClassHandlerList::new();
        self.class_handlers
            .collect(&self.types, kind, tag, &mut entries);
        for entry in &entries {
            self.invoke_entry(entry, node, event);
        }
    }

    fn invoke_entry(&mut self, entry: &HandlerEntry, node: NodeId, event: &mut RoutedEvent) {
        if !entry.accepts(event) {
            return;
        }
        let was_handled = event.is_handled();
        event.source = Some(node);
        entry.handler.invoke(self, node, event);
        if !was_handled && event.is_handled() && event.handled_by.is_none() {
            event.handled_by = Some(node);
        }
    }
}
