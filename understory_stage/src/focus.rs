// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Keyboard focus, scroll focus, and touch capture ownership.
//!
//! All three holders change hands through the same transfer protocol:
//!
//! 1. If there is a previous owner, raise its Lost kind there. Cancelling it
//!    vetoes the transfer and the previous owner keeps ownership.
//! 2. Record the new owner.
//! 3. If there is a new owner, raise its Got kind there. Cancelling it
//!    transfers ownership back to the previous owner with the same protocol.
//!
//! A Got veto raised while transferring back is not rolled back again, so the
//! protocol always terminates.

use understory_scene::NodeId;

use crate::Stage;
use crate::error::DispatchError;
use crate::event::{EventArgs, FocusArgs, FocusScope};
use crate::registry::{EventKind, TransferPair};

impl Stage {
    /// Node holding keyboard focus.
    pub fn keyboard_focus(&self) -> Option<NodeId> {
        self.keyboard_focus
    }

    /// Node holding scroll focus.
    pub fn scroll_focus(&self) -> Option<NodeId> {
        self.scroll_focus
    }

    /// Touch capture owner for `pointer`.
    pub fn touch_capture(&self, pointer: i32) -> Result<Option<NodeId>, DispatchError> {
        let index = self.pointer_index(pointer)?;
        Ok(self.pointers[index].capture)
    }

    /// Move keyboard focus to `node` (clear it with `None`).
    ///
    /// Returns whether `node` holds keyboard focus afterwards.
    pub fn set_keyboard_focus(&mut self, node: Option<NodeId>) -> bool {
        self.request(FocusScope::Keyboard, node)
    }

    /// Move scroll focus to `node` (clear it with `None`).
    ///
    /// Returns whether `node` holds scroll focus afterwards.
    pub fn set_scroll_focus(&mut self, node: Option<NodeId>) -> bool {
        self.request(FocusScope::Scroll, node)
    }

    /// Move `pointer`'s touch capture to `node` (release it with `None`).
    ///
    /// Returns whether `node` holds the capture afterwards.
    pub fn set_touch_capture(
        &mut self,
        node: Option<NodeId>,
        pointer: i32,
    ) -> Result<bool, DispatchError> {
        let index = self.pointer_index(pointer)?;
        Ok(self.request(FocusScope::Touch(index), node))
    }

    /// Release touch capture for `pointer`, or for every pointer with `None`.
    ///
    /// Returns whether every affected capture is released afterwards.
    pub fn release_touch_capture(&mut self, pointer: Option<i32>) -> Result<bool, DispatchError> {
        if let Some(pointer) = pointer {
            return self.set_touch_capture(None, pointer);
        }
        let mut released = true;
        for index in 0..self.pointers.len() {
            if self.pointers[index].capture.is_some() {
                released &= self.request(FocusScope::Touch(index), None);
            }
        }
        Ok(released)
    }

    pub(crate) fn pointer_index(&self, pointer: i32) -> Result<usize, DispatchError> {
        usize::try_from(pointer)
            .ok()
            .filter(|&i| i < self.pointers.len())
            .ok_or(DispatchError::PointerOutOfRange {
                pointer,
                max: self.pointers.len(),
            })
    }

    fn request(&mut self, scope: FocusScope, node: Option<NodeId>) -> bool {
        if let Some(n) = node
            && !self.is_on_stage(n)
        {
            log::warn!("refusing {scope:?} transfer to {n:?}: node is not on the stage");
            return false;
        }
        self.transfer(scope, node, false);
        self.owner(scope) == node
    }

    pub(crate) fn owner(&self, scope: FocusScope) -> Option<NodeId> {
        match scope {
            FocusScope::Keyboard => self.keyboard_focus,
            FocusScope::Scroll => self.scroll_focus,
            FocusScope::Touch(index) => self.pointers.get(index).and_then(|p| p.capture),
        }
    }

    fn set_owner(&mut self, scope: FocusScope, node: Option<NodeId>) {
        match scope {
            FocusScope::Keyboard => self.keyboard_focus = node,
            FocusScope::Scroll => self.scroll_focus = node,
            FocusScope::Touch(index) => {
                if let Some(slot) = self.pointers.get_mut(index) {
                    slot.capture = node;
                }
            }
        }
    }

    fn transfer_kinds(&self, scope: FocusScope) -> TransferPair {
        match scope {
            FocusScope::Keyboard => self.events.keyboard_focus,
            FocusScope::Scroll => self.events.scroll_focus,
            FocusScope::Touch(_) => self.events.touch_capture,
        }
    }

    pub(crate) fn transfer(&mut self, scope: FocusScope, new: Option<NodeId>, rolling_back: bool) {
        let old = self.owner(scope);
        if old == new {
            return;
        }
        let kinds = self.transfer_kinds(scope);
        let args = FocusArgs { scope, old, new };

        if let Some(old) = old
            && self.tree.is_alive(old)
            && self.raise_transfer(kinds.lost, old, args)
        {
            log::debug!("{scope:?} transfer to {new:?} vetoed by {old:?}");
            return;
        }

        self.set_owner(scope, new);
        log::debug!("{scope:?} moved from {old:?} to {new:?}");

        if let Some(new) = new
            && self.tree.is_alive(new)
            && self.raise_transfer(kinds.got, new, args)
        {
            if rolling_back {
                log::debug!("{scope:?} rollback refused by {new:?}; keeping it");
                return;
            }
            log::debug!("{scope:?} refused by {new:?}; rolling back");
            let back = old.filter(|&o| self.is_on_stage(o));
            self.transfer(scope, back, true);
        }
    }

    /// Raise a Lost/Got kind; returns whether it was cancelled.
    fn raise_transfer(&mut self, kind: EventKind, at: NodeId, args: FocusArgs) -> bool {
        let mut event = self.obtain_routed();
        event.prepare(kind, at, EventArgs::Focus(args));
        matches!(self.raise_event(&mut event), Ok(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::RoutedEvent;
    use crate::handlers::handler;
    use crate::types::TypeTable;
    use alloc::rc::Rc;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::cell::RefCell;
    use kurbo::Rect;
    use understory_scene::LocalNode;

    type Log = Rc<RefCell<Vec<(&'static str, NodeId)>>>;

    fn stage_with_two() -> (Stage, NodeId, NodeId) {
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

    fn record(stage: &mut Stage, log: &Log, node: NodeId, veto_lost: bool, veto_got: bool) {
        let kinds = stage.events().keyboard_focus;
        let l = log.clone();
        stage.add_handler(
            kinds.lost,
            node,
            handler(move |_, sender, event: &mut RoutedEvent| {
                if event.original_source() == Some(sender) {
                    l.borrow_mut().push(("lost", sender));
                    if veto_lost {
                        event.cancel();
                    }
                }
            }),
            false,
        );
        let g = log.clone();
        stage.add_handler(
            kinds.got,
            node,
            handler(move |_, sender, event: &mut RoutedEvent| {
                if event.original_source() == Some(sender) {
                    g.borrow_mut().push(("got", sender));
                    if veto_got {
                        event.cancel();
                    }
                }
            }),
            false,
        );
    }

    #[test]
    fn plain_transfer_raises_lost_then_got() {
        let (mut stage, a, b) = stage_with_two();
        let log: Log = Rc::default();
        record(&mut stage, &log, a, false, false);
        record(&mut stage, &log, b, false, false);

        assert!(stage.set_keyboard_focus(Some(a)));
        assert!(stage.set_keyboard_focus(Some(b)));
        assert_eq!(stage.keyboard_focus(), Some(b));
        assert_eq!(*log.borrow(), vec![("got", a), ("lost", a), ("got", b)]);

        // Same owner: no events.
        assert!(stage.set_keyboard_focus(Some(b)));
        assert_eq!(log.borrow().len(), 3);
    }

    #[test]
    fn lost_veto_keeps_old_owner_and_skips_got() {
        let (mut stage, a, b) = stage_with_two();
        let log: Log = Rc::default();
        record(&mut stage, &log, a, true, false);
        record(&mut stage, &log, b, false, false);
        assert!(stage.set_keyboard_focus(Some(a)));
        log.borrow_mut().clear();

        assert!(!stage.set_keyboard_focus(Some(b)));
        assert_eq!(stage.keyboard_focus(), Some(a));
        assert_eq!(*log.borrow(), vec![("lost", a)]);
    }

    #[test]
    fn got_veto_rolls_back_to_old_owner() {
        let (mut stage, a, b) = stage_with_two();
        let log: Log = Rc::default();
        record(&mut stage, &log, a, false, false);
        record(&mut stage, &log, b, false, true);
        assert!(stage.set_keyboard_focus(Some(a)));
        log.borrow_mut().clear();

        assert!(!stage.set_keyboard_focus(Some(b)));
        assert_eq!(stage.keyboard_focus(), Some(a));
        assert_eq!(
            *log.borrow(),
            vec![("lost", a), ("got", b), ("lost", b), ("got", a)]
        );
    }

    #[test]
    fn rollback_veto_terminates() {
        let (mut stage, a, b) = stage_with_two();
        let log: Log = Rc::default();
        record(&mut stage, &log, a, false, true);
        record(&mut stage, &log, b, false, true);
        // Both refuse focus; the first grant rolls back to None.
        assert!(!stage.set_keyboard_focus(Some(a)));
        assert_eq!(stage.keyboard_focus(), None);
        log.borrow_mut().clear();

        stage.keyboard_focus = Some(a);
        assert!(!stage.set_keyboard_focus(Some(b)));
        // a refuses the rollback too; ownership stays where the rollback left it.
        assert_eq!(stage.keyboard_focus(), Some(a));
        assert_eq!(
            *log.borrow(),
            vec![("lost", a), ("got", b), ("lost", b), ("got", a)]
        );
    }

    #[test]
    fn lost_veto_during_rollback_keeps_new_owner() {
        let (mut stage, a, b) = stage_with_two();
        let log: Log = Rc::default();
        record(&mut stage, &log, a, false, false);
        record(&mut stage, &log, b, true, true);
        assert!(stage.set_keyboard_focus(Some(a)));
        log.borrow_mut().clear();

        // b refuses Got, then refuses to give focus back.
        assert!(stage.set_keyboard_focus(Some(b)));
        assert_eq!(stage.keyboard_focus(), Some(b));
        assert_eq!(*log.borrow(), vec![("lost", a), ("got", b), ("lost", b)]);
    }

    #[test]
    fn touch_capture_api_validates_pointer() {
        let (mut stage, a, _) = stage_with_two();
        assert_eq!(
            stage.set_touch_capture(Some(a), 20),
            Err(DispatchError::PointerOutOfRange { pointer: 20, max: 20 })
        );
        assert_eq!(
            stage.touch_capture(-1),
            Err(DispatchError::PointerOutOfRange { pointer: -1, max: 20 })
        );
        assert_eq!(stage.set_touch_capture(Some(a), 3), Ok(true));
        assert_eq!(stage.touch_capture(3), Ok(Some(a)));
        assert_eq!(stage.set_touch_capture(Some(a), 4), Ok(true));
        assert_eq!(stage.release_touch_capture(None), Ok(true));
        assert_eq!(stage.touch_capture(3), Ok(None));
        assert_eq!(stage.touch_capture(4), Ok(None));
    }

    #[test]
    fn detached_nodes_cannot_take_focus() {
        let (mut stage, a, _) = stage_with_two();
        let loose = stage.insert(None, LocalNode::default(), TypeTable::NODE);
        assert!(!stage.set_scroll_focus(Some(loose)));
        assert!(stage.set_scroll_focus(Some(a)));
        assert!(stage.set_scroll_focus(None));
        assert_eq!(stage.scroll_focus(), None);
    }
}
