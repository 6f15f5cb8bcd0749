// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Keyboard focus transfer with vetoes, and class handlers keyed by node type.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p understory_demos --example focus_and_class_handlers`

use kurbo::Rect;
use understory_scene::LocalNode;
use understory_stage::class_handlers::ClassHandlerOrder;
use understory_stage::event::{EventArgs, RoutedEvent};
use understory_stage::handlers::handler;
use understory_stage::registry::{Capability, EventRegistry, RoutingStrategy};
use understory_stage::types::TypeTable;
use understory_stage::{Stage, StageConfig};

fn main() {
    env_logger::init();

    // Types and application kinds are declared up front and moved into the stage.
    let mut types = TypeTable::new();
    let widget = types.declare("Widget", TypeTable::NODE).expect("NODE is declared");
    let text_field = types.declare("TextField", widget).expect("Widget is declared");
    let mut registry = EventRegistry::new();
    let activate = registry.register(
        "Activate",
        RoutingStrategy::Bubble,
        Capability::Plain,
        TypeTable::NODE,
    );

    let mut stage = Stage::new(
        types,
        registry,
        StageConfig::default().with_class_handlers(ClassHandlerOrder::BeforeInstance),
    );
    let root = stage.root();
    let name_field = stage.insert(
        Some(root),
        LocalNode::with_bounds(Rect::new(0.0, 0.0, 100.0, 20.0)),
        text_field,
    );
    let locked_field = stage.insert(
        Some(root),
        LocalNode::with_bounds(Rect::new(0.0, 30.0, 100.0, 50.0)),
        text_field,
    );

    println!("== Class handlers: most-derived first ==");
    stage.register_class_handler(
        activate,
        widget,
        handler(|_, sender, _: &mut RoutedEvent| {
            println!("  Widget class handler at {sender:?}");
        }),
        false,
    );
    stage.register_class_handler(
        activate,
        text_field,
        handler(|_, sender, _: &mut RoutedEvent| {
            println!("  TextField class handler at {sender:?}");
        }),
        false,
    );
    stage.add_handler(
        activate,
        name_field,
        handler(|_, _, event: &mut RoutedEvent| {
            println!("  instance handler on the name field");
            event.handle();
        }),
        false,
    );
    let mut event = RoutedEvent::new(activate, name_field, EventArgs::None);
    stage.raise_event(&mut event).expect("valid activate event");
    println!("  handled_by = {:?}", event.handled_by());

    println!("\n== Keyboard focus ==");
    let focus = stage.events().keyboard_focus;
    // The locked field refuses focus; the transfer rolls back.
    stage.add_handler(
        focus.got,
        locked_field,
        handler(move |_, sender, event: &mut RoutedEvent| {
            if event.original_source() == Some(sender) {
                println!("  locked field refuses focus");
                event.cancel();
            }
        }),
        false,
    );
    println!("  focus name field: {}", stage.set_keyboard_focus(Some(name_field)));
    println!("  focus locked field: {}", stage.set_keyboard_focus(Some(locked_field)));
    println!("  focus is now {:?}", stage.keyboard_focus());

    let typed = stage.events().key_typed.main;
    stage.add_handler(
        typed,
        name_field,
        handler(|_, _, event: &mut RoutedEvent| {
            if let Some(ch) = event.args.input().and_then(|i| i.character) {
                println!("  name field typed {ch:?}");
                event.handle();
            }
        }),
        false,
    );
    for ch in "hi".chars() {
        stage.key_typed(ch).expect("key input never fails");
    }

    println!("\n== Removing the focused node clears focus silently ==");
    stage.remove(name_field);
    println!("  focus is now {:?}", stage.keyboard_focus());
}
