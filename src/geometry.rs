// Width estimation and per-mode layout constants.
//
// Every layout decision downstream (wrapping, row spacing, gap closing,
// drop-zone math) works from the same estimated width, never from measured
// text metrics. The estimate is deliberately coarse: book mode renders bare
// serif text (tight per-char width, near-zero padding) while canvas mode
// renders a bordered chip (wider per-char width, chip padding). Downstream
// code tolerates the estimation error as long as rows keep the configured
// minimum gap.

use serde::{Deserialize, Serialize};

/// Vertical offset of the first laid-out row.
pub const START_Y: f64 = 160.0;

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Axis-aligned rectangle, used for marquee selection.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Rect {
    /// Build from two arbitrary corners (drag start / drag end).
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            min_x: a.x.min(b.x),
            min_y: a.y.min(b.y),
            max_x: a.x.max(b.x),
            max_y: a.y.max(b.y),
        }
    }

    /// Whether this rectangle intersects a box of the given half-extents
    /// centered at `center`.
    pub fn intersects_box(&self, center: Point, half_w: f64, half_h: f64) -> bool {
        let left = center.x - half_w;
        let right = center.x + half_w;
        let top = center.y - half_h;
        let bottom = center.y + half_h;
        !(left > self.max_x || right < self.min_x || top > self.max_y || bottom < self.min_y)
    }
}

/// The two spatial arrangements a passage can be viewed in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// Free diagram: bordered chips on a pannable, zoomable surface.
    Canvas,
    /// Reflowing paragraph: bare serif text in a capped column.
    Book,
}

impl ViewMode {
    pub fn config(self) -> &'static ModeConfig {
        match self {
            ViewMode::Canvas => &CANVAS_CONFIG,
            ViewMode::Book => &BOOK_CONFIG,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ViewMode::Canvas => ViewMode::Book,
            ViewMode::Book => ViewMode::Canvas,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ViewMode::Canvas => "canvas",
            ViewMode::Book => "book",
        }
    }
}

/// Fixed geometry configuration for one view mode.
#[derive(Debug, Clone)]
pub struct ModeConfig {
    /// Vertical distance between consecutive rows.
    pub line_height: f64,
    /// Horizontal advance between consecutive words at layout time.
    pub word_spacing: f64,
    /// Two y-coordinates within this distance belong to the same row.
    pub row_tolerance: f64,
    /// Smallest allowed edge-to-edge gap after overlap resolution.
    pub min_gap: f64,
    /// Base font scale applied by the renderer (estimation only).
    pub font_scale: f64,
    /// Estimated rendered width per character.
    pub char_width: f64,
    /// Estimated fixed padding around the token.
    pub padding: f64,
}

pub const CANVAS_CONFIG: ModeConfig = ModeConfig {
    line_height: 80.0,
    word_spacing: 15.0,
    row_tolerance: 30.0,
    min_gap: 25.0,
    font_scale: 1.0,
    char_width: 9.0,
    padding: 24.0,
};

// 10.5px per char for 22px serif text; anything tighter clips or overlaps.
pub const BOOK_CONFIG: ModeConfig = ModeConfig {
    line_height: 48.0,
    word_spacing: 6.0,
    row_tolerance: 15.0,
    min_gap: 6.0,
    font_scale: 1.15,
    char_width: 10.5,
    padding: 2.0,
};

/// Ambient viewport state read from the host. The core never owns sizing;
/// it only derives container bounds and clamps from whatever the host
/// reports here.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    /// Vertical scroll of the book-mode column (canvas mode pans instead).
    pub scroll_top: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height, scroll_top: 0.0 }
    }
}

/// Estimated rendered pixel width of a token in the given mode.
pub fn estimate_width(text: &str, mode: ViewMode) -> f64 {
    let config = mode.config();
    text.chars().count() as f64 * config.char_width + config.padding
}

/// Width of the layout container for the given viewport and mode.
///
/// Book mode is a capped narrow column; canvas mode is near-full viewport.
pub fn container_width(viewport: &Viewport, mode: ViewMode) -> f64 {
    match mode {
        ViewMode::Book => 650.0_f64.min(viewport.width * 0.55),
        ViewMode::Canvas => {
            if viewport.width > 800.0 {
                800.0
            } else {
                viewport.width - 40.0
            }
        }
    }
}

/// Left edge of the centered layout container.
pub fn start_x(viewport: &Viewport, mode: ViewMode) -> f64 {
    (viewport.width - container_width(viewport, mode)) / 2.0
}
