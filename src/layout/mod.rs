// Deterministic text-flow layout for the annotation forest.
//
// Goals:
// - Deterministic: same tokens + mode + viewport => same positions
// - Greedy line-wrap against the mode's container width
// - Row-based normalization after edits (resolve) and compaction after
//   nesting (gaps), both keyed by the same row tolerance
//
// Submodules:
// - resolve: overlap resolution + book-mode overflow reflow
// - gaps: closes the bands vacated by nested root nodes
//
// Positions are center-of-node; width is always the estimate from
// `geometry`, never a measured value.

mod gaps;
mod resolve;

pub use gaps::{MovedRoot, close_gaps};
pub use resolve::resolve_overlaps;

use crate::geometry::{self, START_Y, ViewMode, Viewport};
use crate::model::Node;

/// Lay out nodes in order along wrapped lines, writing (x, y) in place.
///
/// The cursor starts at the container's left edge; a token that would
/// cross the right edge wraps to the next line. Identical results whether
/// triggered by initial load, a mode switch, or a reflow request.
pub fn flow_layout(nodes: &mut [Node], mode: ViewMode, viewport: &Viewport) {
    let config = mode.config();
    let container = geometry::container_width(viewport, mode);
    let sx = geometry::start_x(viewport, mode);

    let mut cursor_x = sx;
    let mut cursor_y = START_Y;

    for node in nodes.iter_mut() {
        let width = geometry::estimate_width(&node.text, mode);

        if cursor_x + width > sx + container {
            cursor_x = sx;
            cursor_y += config.line_height;
        }

        node.x = cursor_x + width / 2.0;
        node.y = cursor_y;

        cursor_x += width + config.word_spacing;
    }
}
