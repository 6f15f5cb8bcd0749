// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stage construction options.

use kurbo::Rect;

use crate::class_handlers::ClassHandlerOrder;

/// Options fixed when a [`Stage`](crate::Stage) is built.
#[derive(Clone, Debug, PartialEq)]
pub struct StageConfig {
    /// Number of touch pointer slots. Pointer indices must be below this.
    pub max_pointers: usize,
    /// Free instances each event pool retains.
    pub pool_capacity: usize,
    /// Placement of the class handler pass.
    pub class_handlers: ClassHandlerOrder,
    /// Local bounds of the root group.
    pub root_bounds: Rect,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            max_pointers: 20,
            pool_capacity: 16,
            class_handlers: ClassHandlerOrder::BeforeInstance,
            root_bounds: Rect::ZERO,
        }
    }
}

impl StageConfig {
    /// Set the number of pointer slots.
    pub fn with_max_pointers(mut self, max_pointers: usize) -> Self {
        self.max_pointers = max_pointers;
        self
    }

    /// Set the per-pool retained capacity.
    pub fn with_pool_capacity(mut self, pool_capacity: usize) -> Self {
        self.pool_capacity = pool_capacity;
        self
    }

    /// Set class handler placement.
    pub fn with_class_handlers(mut self, order: ClassHandlerOrder) -> Self {
        self.class_handlers = order;
        self
    }

    /// Set the root group's bounds.
    pub fn with_root_bounds(mut self, bounds: Rect) -> Self {
        self.root_bounds = bounds;
        self
    }
}
