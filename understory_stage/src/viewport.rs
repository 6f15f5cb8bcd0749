// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Screen to stage projection.

use kurbo::{Affine, Point};

/// Maps device (screen) coordinates into stage coordinates.
pub trait Viewport {
    /// Project `screen` into stage space.
    fn screen_to_stage(&self, screen: Point) -> Point;
}

/// Screen and stage coordinates coincide.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct IdentityViewport;

impl Viewport for IdentityViewport {
    fn screen_to_stage(&self, screen: Point) -> Point {
        screen
    }
}

/// The affine maps screen space into stage space.
impl Viewport for Affine {
    fn screen_to_stage(&self, screen: Point) -> Point {
        *self * screen
    }
}
