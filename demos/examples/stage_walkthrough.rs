// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stage walkthrough: listeners, routed events, touch capture, and hover.
//!
//! This example shows how to:
//! - build a small scene under a `Stage`,
//! - fire a legacy event through capture and bubble listeners,
//! - route pointer input through preview/main handlers and take touch capture,
//! - track hover with `Stage::act`.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p understory_demos --example stage_walkthrough`

use kurbo::{Affine, Point, Rect, Vec2};
use understory_scene::{LocalNode, NodeId};
use understory_stage::Stage;
use understory_stage::event::{Event, RoutedEvent};
use understory_stage::handlers::handler;
use understory_stage::listeners::listener;
use understory_stage::types::TypeTable;

fn name(stage: &Stage, node: NodeId, panel: NodeId, button: NodeId) -> &'static str {
    match node {
        n if n == stage.root() => "root",
        n if n == panel => "panel",
        n if n == button => "button",
        _ => "?",
    }
}

fn main() {
    env_logger::init();

    let mut stage = Stage::default();
    let root = stage.root();

    // A panel at (50, 50) holding a button in its local space.
    let panel = stage.insert(
        Some(root),
        LocalNode {
            local_bounds: Rect::new(0.0, 0.0, 200.0, 100.0),
            local_transform: Affine::translate(Vec2::new(50.0, 50.0)),
            ..Default::default()
        },
        TypeTable::GROUP,
    );
    let button = stage.insert(
        Some(panel),
        LocalNode::with_bounds(Rect::new(10.0, 10.0, 90.0, 40.0)),
        TypeTable::NODE,
    );

    println!("== Legacy fire: capture then bubble ==");
    for node in [root, panel, button] {
        stage.add_capture_listener(
            node,
            listener(move |stage, event| {
                let me = event.listener().unwrap_or(node);
                println!("  capture at {}", name(stage, me, panel, button));
                false
            }),
        );
        stage.add_listener(
            node,
            listener(move |stage, event| {
                let me = event.listener().unwrap_or(node);
                println!("  bubble  at {}", name(stage, me, panel, button));
                false
            }),
        );
    }
    let mut event = Event::new(button);
    let cancelled = stage.fire(&mut event).expect("button is alive");
    println!("  cancelled = {cancelled}");

    println!("\n== Pointer press on the button ==");
    let down = stage.events().touch_down;
    for node in [root, panel, button] {
        stage.add_handler(
            down.preview,
            node,
            handler(move |stage, sender, _: &mut RoutedEvent| {
                println!("  preview at {}", name(stage, sender, panel, button));
            }),
            false,
        );
    }
    stage.add_handler(
        down.main,
        button,
        handler(|_, _, event: &mut RoutedEvent| {
            println!("  button handles the press");
            event.handle();
        }),
        false,
    );
    let handled = stage
        .touch_down(Point::new(70.0, 70.0), 0, 0)
        .expect("pointer 0 is valid");
    println!(
        "  handled = {handled}, capture = {:?}",
        stage.touch_capture(0).ok().flatten().map(|n| name(&stage, n, panel, button))
    );

    let drag = stage.events().touch_dragged.main;
    stage.add_handler(
        drag,
        button,
        handler(move |stage, sender, event: &mut RoutedEvent| {
            let at = event.args.input().map(|i| i.stage_point);
            println!("  drag delivered to {} at {at:?}", name(stage, sender, panel, button));
        }),
        false,
    );
    println!("\n== Drag far away: capture keeps routing to the button ==");
    stage
        .touch_dragged(Point::new(400.0, 400.0), 0)
        .expect("pointer 0 is valid");
    stage
        .touch_up(Point::new(400.0, 400.0), 0, 0)
        .expect("pointer 0 is valid");
    println!("  capture after release = {:?}", stage.touch_capture(0));

    println!("\n== Hover ==");
    let (enter, leave) = (stage.events().enter, stage.events().leave);
    for node in [panel, button] {
        for (kind, label) in [(enter, "enter"), (leave, "leave")] {
            stage.add_handler(
                kind,
                node,
                handler(move |stage, sender, _: &mut RoutedEvent| {
                    println!("  {label} {}", name(stage, sender, panel, button));
                }),
                false,
            );
        }
    }
    for point in [Point::new(70.0, 70.0), Point::new(200.0, 120.0), Point::new(10.0, 10.0)] {
        stage.mouse_moved(point).expect("mouse input never fails");
        stage.act(1.0 / 60.0);
    }
}
