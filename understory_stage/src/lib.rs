// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_stage --heading-base-level=0

//! Understory Stage: event routing, focus, and touch capture for an Understory scene.
//!
//! ## Overview
//!
//! A [`Stage`] owns an [`understory_scene::Tree`] and, for every node, a bubble
//! listener set, a capture listener set, and a table of routed handlers keyed
//! by [`EventKind`](registry::EventKind). Device input enters through the
//! stage, which resolves a target, raises events, and keeps keyboard focus,
//! scroll focus, touch capture, and hover state.
//!
//! ## Two dispatch models
//!
//! - [`Stage::fire`] delivers a legacy [`Event`](event::Event): capture
//!   listeners from the root down to the target, then bubble listeners from
//!   the target back up. A listener returning `true` marks the event handled.
//! - [`Stage::raise_event`] delivers a [`RoutedEvent`](event::RoutedEvent)
//!   along its kind's [`RoutingStrategy`](registry::RoutingStrategy): Tunnel
//!   (root to source), Bubble (source to root), or Direct (source only).
//!   Handlers registered without `handled_too` are skipped once the event is
//!   handled, and the first handling node is recorded in
//!   [`RoutedEvent::handled_by`](event::RoutedEvent::handled_by).
//!
//! Both models stop as soon as the event is stopped and report whether it was
//! cancelled. The route is snapshotted before listeners run, and listener
//! sets defer edits made while they are being iterated, so listeners may add
//! or remove listeners, remove nodes, or dispatch nested events.
//!
//! ## Class handlers
//!
//! [`Stage::register_class_handler`] attaches a handler to every node whose
//! [`TypeTag`](types::TypeTag) derives from a given type. For each node on a
//! route, the applicable class handlers run most-derived first, before the
//! node's own handlers by default (see
//! [`ClassHandlerOrder`](class_handlers::ClassHandlerOrder)).
//!
//! ## Ownership transfer
//!
//! Keyboard focus, scroll focus, and per-pointer touch capture move through a
//! Lost/Got protocol: cancelling Lost vetoes the move and cancelling Got
//! returns ownership to the previous holder. Removing or detaching a node
//! clears every holder that refers to it without raising events.
//!
//! ## Example
//!
//! ```
//! use kurbo::{Point, Rect};
//! use understory_scene::LocalNode;
//! use understory_stage::{Stage, handlers::handler, types::TypeTable};
//!
//! let mut stage = Stage::default();
//! let button = stage.insert(
//!     Some(stage.root()),
//!     LocalNode::with_bounds(Rect::new(0.0, 0.0, 40.0, 20.0)),
//!     TypeTable::NODE,
//! );
//! let pressed = stage.events().touch_down.main;
//! stage.add_handler(pressed, button, handler(|_, _, event| event.handle()), false);
//!
//! assert_eq!(stage.touch_down(Point::new(10.0, 10.0), 0, 0), Ok(true));
//! assert_eq!(stage.touch_capture(0), Ok(Some(button)));
//! assert_eq!(stage.touch_up(Point::new(10.0, 10.0), 0, 0), Ok(false));
//! assert_eq!(stage.touch_capture(0), Ok(None));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod class_handlers;
pub mod config;
mod dispatch;
pub mod error;
pub mod event;
mod focus;
pub mod handlers;
mod input;
pub mod listeners;
pub mod pool;
pub mod registry;
mod stage;
#[cfg(test)]
mod testing;
pub mod types;
mod util;
pub mod viewport;

pub use config::StageConfig;
pub use error::DispatchError;
pub use stage::{PointerSlot, Stage};
