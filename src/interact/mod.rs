// Pointer-driven interaction: selection, dragging, nesting.
//
// The controller is a state machine over raw pointer events:
//
//   Idle -> (down) -> Pending(dead-zone) -> Dragging -> (up) -> Idle
//
// with parallel box-select and canvas-pan paths chosen at pointer-down.
// All coordinates entering the controller are canvas-content coordinates;
// `CanvasView` owns the client-to-canvas transform plus pan/zoom state.

mod controller;
mod drag;

pub use controller::{Controller, UpOutcome};
pub use drag::{BoxDrag, DragSession, NodeDrag, PanDrag};

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, ViewMode, Viewport};

/// Pointer displacement below which a press still counts as a click.
pub const DRAG_DEAD_ZONE: f64 = 3.0;
/// Euclidean radius within which a node is a drop-target candidate.
pub const HOVER_RADIUS: f64 = 120.0;
/// Vertical offset a nested node snaps to below its parent.
pub const NEST_OFFSET_BOOK: f64 = 40.0;
pub const NEST_OFFSET_CANVAS: f64 = 120.0;
/// Canvas-mode drag clamp: the lead node stays this far inside the
/// visible viewport.
pub const CLAMP_PADDING: f64 = 20.0;
/// Fixed half-extents of a node's hit box for marquee selection.
pub const BOX_HALF_WIDTH: f64 = 30.0;
pub const BOX_HALF_HEIGHT: f64 = 15.0;

/// One raw pointer event, in both coordinate spaces the machine needs:
/// `client` for panning (screen-relative), `canvas` for everything else.
#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct PointerInput {
    pub pointer_id: i32,
    pub client: Point,
    pub canvas: Point,
}

/// Pan/zoom state of the canvas surface. Never recorded in history.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasView {
    pub offset: Point,
    pub scale: f64,
}

pub const ZOOM_MIN: f64 = 0.2;
pub const ZOOM_MAX: f64 = 2.0;
pub const ZOOM_STEP: f64 = 0.1;

impl Default for CanvasView {
    fn default() -> Self {
        Self { offset: Point::new(0.0, 0.0), scale: 1.0 }
    }
}

impl CanvasView {
    pub fn zoom_in(&mut self) {
        self.scale = (self.scale + ZOOM_STEP).min(ZOOM_MAX);
    }

    pub fn zoom_out(&mut self) {
        self.scale = (self.scale - ZOOM_STEP).max(ZOOM_MIN);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Map an element-relative client point into canvas-content
    /// coordinates. Book mode scrolls instead of panning, so only the
    /// viewport's scroll offset applies there.
    pub fn to_canvas(&self, client: Point, mode: ViewMode, viewport: &Viewport) -> Point {
        match mode {
            ViewMode::Book => Point::new(client.x, client.y + viewport.scroll_top),
            ViewMode::Canvas => Point::new(
                (client.x - self.offset.x) / self.scale,
                (client.y - self.offset.y) / self.scale,
            ),
        }
    }
}
