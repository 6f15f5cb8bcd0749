// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Device input entry points and per-frame hover tracking.
//!
//! Each entry point projects the screen position into stage space, resolves
//! a target, raises the Tunnel preview kind and, unless it was handled, the
//! Bubble main kind at the same target. It returns whether either was
//! handled.
//!
//! | input            | target                                        |
//! |------------------|-----------------------------------------------|
//! | touch            | pointer's capture owner, else hit, else root |
//! | mouse move       | hit, else root                                |
//! | scroll           | scroll focus, else root                       |
//! | key              | keyboard focus, else root                     |

use kurbo::{Point, Vec2};
use understory_scene::NodeId;

use crate::Stage;
use crate::error::DispatchError;
use crate::event::{Event, EventArgs, FocusScope, InputArgs, InputType};
use crate::pool::Pooled;
use crate::registry::{EventKind, InputPair};
use crate::stage::PointerSlot;

impl Stage {
    /// A pointer was pressed at `screen`.
    ///
    /// If the press was handled and the pointer has no capture owner, the
    /// handling node takes touch capture.
    pub fn touch_down(
        &mut self,
        screen: Point,
        pointer: i32,
        button: i32,
    ) -> Result<bool, DispatchError> {
        let index = self.checked_pointer(pointer)?;
        let stage_point = self.screen_to_stage(screen);
        let slot = &mut self.pointers[index];
        slot.live = true;
        slot.screen = screen;
        slot.button = button;

        let target = self.touch_target(index, stage_point);
        let args = self.input_args(InputType::TouchDown, stage_point, pointer, button);
        let kinds = self.events.touch_down;
        let (handled, handled_by) = self.raise_input(kinds, target, args);
        if let Some(node) = handled_by
            && self.pointers[index].capture.is_none()
            && self.is_on_stage(node)
        {
            self.transfer(FocusScope::Touch(index), Some(node), false);
        }
        Ok(handled)
    }

    /// A pressed pointer moved to `screen`.
    pub fn touch_dragged(&mut self, screen: Point, pointer: i32) -> Result<bool, DispatchError> {
        let index = self.checked_pointer(pointer)?;
        let stage_point = self.screen_to_stage(screen);
        self.pointers[index].screen = screen;

        let target = self.touch_target(index, stage_point);
        let button = self.pointers[index].button;
        let args = self.input_args(InputType::TouchDragged, stage_point, pointer, button);
        let kinds = self.events.touch_dragged;
        Ok(self.raise_input(kinds, target, args).0)
    }

    /// A pointer was released at `screen`; its touch capture is released.
    pub fn touch_up(
        &mut self,
        screen: Point,
        pointer: i32,
        button: i32,
    ) -> Result<bool, DispatchError> {
        let index = self.checked_pointer(pointer)?;
        let stage_point = self.screen_to_stage(screen);
        let slot = &mut self.pointers[index];
        slot.live = false;
        slot.screen = screen;
        slot.button = button;

        let target = self.touch_target(index, stage_point);
        let args = self.input_args(InputType::TouchUp, stage_point, pointer, button);
        let kinds = self.events.touch_up;
        let (handled, _) = self.raise_input(kinds, target, args);
        self.transfer(FocusScope::Touch(index), None, false);
        Ok(handled)
    }

    /// The desktop mouse moved to `screen` with no button pressed.
    pub fn mouse_moved(&mut self, screen: Point) -> Result<bool, DispatchError> {
        let stage_point = self.screen_to_stage(screen);
        self.mouse.screen = screen;
        self.mouse.live = true;

        let target = self.hit(stage_point, true).unwrap_or(self.root);
        let args = self.input_args(InputType::MouseMoved, stage_point, -1, -1);
        let kinds = self.events.mouse_moved;
        Ok(self.raise_input(kinds, target, args).0)
    }

    /// The scroll wheel moved by `amount`.
    pub fn scrolled(&mut self, amount: Vec2) -> Result<bool, DispatchError> {
        let stage_point = self.screen_to_stage(self.mouse.screen);
        let target = self.focus_target(self.scroll_focus);
        let args = InputArgs {
            scroll: amount,
            ..self.input_args(InputType::Scrolled, stage_point, -1, -1)
        };
        let kinds = self.events.scrolled;
        Ok(self.raise_input(kinds, target, args).0)
    }

    /// A key was pressed.
    pub fn key_down(&mut self, key: u32) -> Result<bool, DispatchError> {
        self.key_input(self.events.key_down, InputType::KeyDown, key, None)
    }

    /// A key was released.
    pub fn key_up(&mut self, key: u32) -> Result<bool, DispatchError> {
        self.key_input(self.events.key_up, InputType::KeyUp, key, None)
    }

    /// A character was typed.
    pub fn key_typed(&mut self, character: char) -> Result<bool, DispatchError> {
        self.key_input(self.events.key_typed, InputType::KeyTyped, 0, Some(character))
    }

    fn key_input(
        &mut self,
        kinds: InputPair,
        input: InputType,
        key: u32,
        character: Option<char>,
    ) -> Result<bool, DispatchError> {
        let target = self.focus_target(self.keyboard_focus);
        let args = InputArgs {
            key,
            character,
            ..self.input_args(input, Point::ZERO, -1, -1)
        };
        Ok(self.raise_input(kinds, target, args).0)
    }

    /// Advance the clock and update hover state.
    ///
    /// Released pointers leave the node they were over. Pressed pointers and
    /// the mouse are hit tested again at their last position; when the node
    /// under them changed, the old node gets Leave and the new one Enter.
    pub fn act(&mut self, delta: f64) {
        self.clock += delta;
        for index in 0..self.pointers.len() {
            let slot = self.pointers[index];
            if slot.live {
                self.update_hover(Some(index));
            } else if let Some(over) = slot.over {
                self.pointers[index].over = None;
                let leave = self.events.leave;
                self.raise_hover(leave, InputType::Leave, over, &slot, None);
            }
        }
        if self.mouse.live {
            self.update_hover(None);
        }
    }

    /// Fire a legacy input event at `target` and hand it back for inspection.
    pub fn fire_input(
        &mut self,
        target: NodeId,
        args: InputArgs,
    ) -> Result<Pooled<Event>, DispatchError> {
        let mut event = self.obtain_event();
        event.set_target(target);
        event.input = args;
        self.fire(&mut event)?;
        Ok(event)
    }

    /// Slot for `pointer`; `None` outside `0..max_pointers`.
    pub fn pointer_slot(&self, pointer: i32) -> Option<&PointerSlot> {
        usize::try_from(pointer).ok().and_then(|i| self.pointers.get(i))
    }

    /// Desktop mouse slot.
    pub fn mouse_slot(&self) -> &PointerSlot {
        &self.mouse
    }

    fn checked_pointer(&self, pointer: i32) -> Result<usize, DispatchError> {
        self.pointer_index(pointer).inspect_err(|err| {
            log::warn!("ignoring input: {err}");
        })
    }

    fn touch_target(&self, index: usize, stage_point: Point) -> NodeId {
        self.pointers[index]
            .capture
            .filter(|&n| self.tree.is_alive(n))
            .or_else(|| self.hit(stage_point, true))
            .unwrap_or(self.root)
    }

    fn focus_target(&self, holder: Option<NodeId>) -> NodeId {
        holder
            .filter(|&n| self.tree.is_alive(n))
            .unwrap_or(self.root)
    }

    fn input_args(
        &self,
        input: InputType,
        stage_point: Point,
        pointer: i32,
        button: i32,
    ) -> InputArgs {
        InputArgs {
            input,
            stage_point,
            pointer,
            button,
            time: self.clock,
            ..InputArgs::default()
        }
    }

    /// Raise preview then, unless handled, main. Returns the final handled
    /// state and the node that handled it.
    fn raise_input(
        &mut self,
        kinds: InputPair,
        target: NodeId,
        args: InputArgs,
    ) -> (bool, Option<NodeId>) {
        let mut event = self.obtain_routed();
        for kind in [kinds.preview, kinds.main] {
            event.prepare(kind, target, EventArgs::Input(args));
            if let Err(err) = self.raise_event(&mut event) {
                log::warn!("dropping {}: {err}", kind.name());
                return (false, None);
            }
            if event.is_handled() {
                break;
            }
        }
        (event.is_handled(), event.handled_by())
    }

    fn update_hover(&mut self, index: Option<usize>) {
        let slot = match index {
            Some(i) => self.pointers[i],
            None => self.mouse,
        };
        let stage_point = self.screen_to_stage(slot.screen);
        let over = self.hit(stage_point, true);
        if over == slot.over {
            return;
        }
        match index {
            Some(i) => self.pointers[i].over = over,
            None => self.mouse.over = over,
        }
        if let Some(old) = slot.over
            && self.tree.is_alive(old)
        {
            let leave = self.events.leave;
            self.raise_hover(leave, InputType::Leave, old, &slot, over);
        }
        if let Some(new) = over {
            let enter = self.events.enter;
            self.raise_hover(enter, InputType::Enter, new, &slot, slot.over);
        }
    }

    fn raise_hover(
        &mut self,
        kind: EventKind,
        input: InputType,
        at: NodeId,
        slot: &PointerSlot,
        related: Option<NodeId>,
    ) {
        let stage_point = self.screen_to_stage(slot.screen);
        let args = InputArgs {
            related,
            ..self.input_args(input, stage_point, slot.pointer, slot.button)
        };
        let mut event = self.obtain_routed();
        event.prepare(kind, at, EventArgs::Input(args));
        if let Err(err) = self.raise_event(&mut event) {
            log::debug!("dropping {}: {err}", kind.name());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::RoutedEvent;
    use crate::handlers::handler;
    use crate::testing::{recording_handler, trace};
    use crate::types::TypeTable;
    use alloc::rc::Rc;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::cell::RefCell;
    use kurbo::{Affine, Rect};
    use understory_scene::LocalNode;

    /// Root with two side-by-side leaves: `a` at `0..10`, `b` at `20..30`.
    fn two_leaves() -> (Stage, NodeId, NodeId) {
        let mut stage = Stage::default();
        let root = stage.root();
        let a = stage.insert(
            Some(root),
            LocalNode::with_bounds(Rect::new(0., 0., 10., 10.)),
            TypeTable::NODE,
        );
        let b = stage.insert(
            Some(root),
            LocalNode::with_bounds(Rect::new(20., 0., 30., 10.)),
            TypeTable::NODE,
        );
        (stage, a, b)
    }

    fn claim(stage: &mut Stage, kind: EventKind, node: NodeId) {
        stage.add_handler(kind, node, handler(|_, _, event| event.handle()), false);
    }

    #[test]
    fn touch_capture_follows_the_handler() {
        let (mut stage, x, _) = two_leaves();
        let main = stage.events().touch_down.main;
        claim(&mut stage, main, x);
        let drags = trace();
        let dragged = stage.events().touch_dragged.main;
        stage.add_handler(dragged, x, recording_handler(&drags), false);

        assert_eq!(stage.touch_down(Point::new(5., 5.), 3, 0), Ok(true));
        assert_eq!(stage.touch_capture(3), Ok(Some(x)));

        // Far outside x: capture still routes the drag there.
        assert_eq!(stage.touch_dragged(Point::new(500., 500.), 3), Ok(false));
        assert_eq!(*drags.borrow(), vec![x]);

        stage.touch_up(Point::new(500., 500.), 3, 0).unwrap();
        assert_eq!(stage.touch_capture(3), Ok(None));
        assert!(!stage.pointer_slot(3).unwrap().live);
    }

    #[test]
    fn unhandled_touch_down_takes_no_capture() {
        let (mut stage, _, _) = two_leaves();
        let drags = trace();
        let dragged = stage.events().touch_dragged.main;
        stage.add_handler(dragged, stage.root(), recording_handler(&drags), false);

        assert_eq!(stage.touch_down(Point::new(5., 5.), 3, 0), Ok(false));
        assert_eq!(stage.touch_capture(3), Ok(None));
        stage.touch_dragged(Point::new(500., 500.), 3).unwrap();
        // Bubbled from the root itself: nothing under the pointer.
        assert_eq!(*drags.borrow(), vec![stage.root()]);
        stage.touch_dragged(Point::new(5., 5.), 3).unwrap();
        assert_eq!(drags.borrow().len(), 2);
    }

    #[test]
    fn preview_handled_suppresses_main() {
        let (mut stage, a, _) = two_leaves();
        let kinds = stage.events().touch_down;
        let mains = trace();
        let root = stage.root();
        claim(&mut stage, kinds.preview, root);
        stage.add_handler(kinds.main, a, recording_handler(&mains), true);

        assert_eq!(stage.touch_down(Point::new(5., 5.), 0, 0), Ok(true));
        assert!(mains.borrow().is_empty());
        // The root handled the preview, so it owns the capture.
        assert_eq!(stage.touch_capture(0), Ok(Some(root)));
    }

    #[test]
    fn invalid_pointer_is_rejected_without_side_effects() {
        let (mut stage, a, _) = two_leaves();
        let main = stage.events().touch_down.main;
        claim(&mut stage, main, a);
        let err = DispatchError::PointerOutOfRange { pointer: 20, max: 20 };
        assert_eq!(stage.touch_down(Point::new(5., 5.), 20, 0), Err(err));
        assert_eq!(
            stage.touch_up(Point::new(5., 5.), -2, 0).unwrap_err(),
            DispatchError::PointerOutOfRange { pointer: -2, max: 20 }
        );
        assert!(stage.pointers.iter().all(|p| !p.live && p.capture.is_none()));
    }

    #[test]
    fn keys_and_scroll_route_to_focus_holders() {
        let (mut stage, a, b) = two_leaves();
        let seen = trace();
        let key = stage.events().key_down.main;
        let scroll = stage.events().scrolled.main;
        stage.add_handler(key, stage.root(), recording_handler(&seen), false);
        stage.add_handler(scroll, stage.root(), recording_handler(&seen), false);

        stage.key_down(13).unwrap();
        assert_eq!(*seen.borrow(), vec![stage.root()]);

        seen.borrow_mut().clear();
        stage.set_keyboard_focus(Some(a));
        stage.set_scroll_focus(Some(b));
        stage.key_down(13).unwrap();
        stage.scrolled(Vec2::new(0., -1.)).unwrap();
        // Bubbled up from the focus holders.
        assert_eq!(*seen.borrow(), vec![stage.root(), stage.root()]);

        let typed: Rc<RefCell<Vec<(NodeId, Option<char>)>>> = Rc::default();
        let log = typed.clone();
        let kind = stage.events().key_typed.main;
        stage.add_handler(
            kind,
            a,
            handler(move |_, sender, event: &mut RoutedEvent| {
                let ch = event.args.input().and_then(|i| i.character);
                log.borrow_mut().push((sender, ch));
                event.handle();
            }),
            false,
        );
        assert_eq!(stage.key_typed('q'), Ok(true));
        assert_eq!(*typed.borrow(), vec![(a, Some('q'))]);
    }

    #[test]
    fn hover_raises_leave_then_enter() {
        let (mut stage, a, b) = two_leaves();
        let log: Rc<RefCell<Vec<(&'static str, NodeId, Option<NodeId>)>>> = Rc::default();
        for (kind, name) in [(stage.events().enter, "enter"), (stage.events().leave, "leave")] {
            for node in [a, b, stage.root()] {
                let log = log.clone();
                stage.add_handler(
                    kind,
                    node,
                    handler(move |_, sender, event: &mut RoutedEvent| {
                        let related = event.args.input().and_then(|i| i.related);
                        log.borrow_mut().push((name, sender, related));
                    }),
                    false,
                );
            }
        }

        stage.mouse_moved(Point::new(5., 5.)).unwrap();
        stage.act(0.016);
        assert_eq!(*log.borrow(), vec![("enter", a, None)]);

        stage.mouse_moved(Point::new(25., 5.)).unwrap();
        stage.act(0.016);
        assert_eq!(
            log.borrow()[1..],
            [("leave", a, Some(b)), ("enter", b, Some(a))]
        );

        // No change, no events.
        stage.act(0.016);
        assert_eq!(log.borrow().len(), 3);
        assert!((stage.clock() - 0.048).abs() < 1e-9);
    }

    #[test]
    fn released_pointer_leaves_and_clears() {
        let (mut stage, a, _) = two_leaves();
        let leaves = trace();
        let enters = trace();
        let leave = stage.events().leave;
        let enter = stage.events().enter;
        stage.add_handler(leave, a, recording_handler(&leaves), false);
        stage.add_handler(enter, a, recording_handler(&enters), false);

        stage.touch_down(Point::new(5., 5.), 1, 0).unwrap();
        stage.act(0.0);
        assert_eq!(*enters.borrow(), vec![a]);
        assert_eq!(stage.pointer_slot(1).unwrap().over, Some(a));

        stage.touch_up(Point::new(5., 5.), 1, 0).unwrap();
        stage.act(0.0);
        assert_eq!(*leaves.borrow(), vec![a]);
        assert_eq!(stage.pointer_slot(1).unwrap().over, None);
        stage.act(0.0);
        assert_eq!(leaves.borrow().len(), 1);
    }

    #[test]
    fn viewport_projects_before_hit_testing() {
        let (mut stage, _, b) = two_leaves();
        let seen = trace();
        let moved = stage.events().mouse_moved.main;
        stage.add_handler(moved, b, recording_handler(&seen), false);
        stage.set_viewport(Affine::translate((20.0, 0.0)));
        stage.mouse_moved(Point::new(5., 5.)).unwrap();
        assert_eq!(*seen.borrow(), vec![b]);
    }

    #[test]
    fn events_carry_stage_clock_and_pool_is_reused() {
        let (mut stage, a, _) = two_leaves();
        let times: Rc<RefCell<Vec<f64>>> = Rc::default();
        let log = times.clone();
        let kind = stage.events().touch_down.main;
        stage.add_handler(
            kind,
            a,
            handler(move |_, _, event: &mut RoutedEvent| {
                log.borrow_mut().push(event.args.input().map_or(-1.0, |i| i.time));
            }),
            false,
        );
        stage.act(1.5);
        stage.touch_down(Point::new(5., 5.), 0, 0).unwrap();
        assert_eq!(*times.borrow(), vec![1.5]);
        assert!(stage.routed_pool().free_len() >= 1);
        let fresh = stage.obtain_routed();
        assert_eq!(fresh.kind(), None);
        assert!(!fresh.is_handled());
    }
}
