// Gap closing after nodes leave their row.
//
// When a root node nests under a parent it vacates a band of its old row.
// Remaining root nodes to the right of the band shift left by the band's
// width, and a row left empty collapses by pulling every lower root row up
// one line. Nested nodes are untouched throughout: they sit relative to
// their parent, not the row grid.

use crate::geometry::{self, ViewMode};
use crate::model::{Node, NodeId};

/// Where a root node sat just before it was nested. Only nodes that were
/// roots at drag start produce one of these; re-parenting an already
/// nested node does not reopen a gap.
#[derive(Debug, Clone, PartialEq)]
pub struct MovedRoot {
    pub id: NodeId,
    pub text: String,
    pub old_x: f64,
    pub old_y: f64,
}

/// Compact rows around the bands vacated by `moved`, in place.
pub fn close_gaps(nodes: &mut [Node], moved: &[MovedRoot], mode: ViewMode) {
    let config = mode.config();

    for slot in moved {
        let gap_width = geometry::estimate_width(&slot.text, mode);
        let gap_size = gap_width + config.word_spacing;

        for node in nodes.iter_mut() {
            if !node.is_root() {
                continue;
            }
            if (node.y - slot.old_y).abs() < config.row_tolerance && node.x > slot.old_x {
                node.x -= gap_size;
            }
        }

        let row_still_occupied = nodes
            .iter()
            .any(|n| n.is_root() && (n.y - slot.old_y).abs() < config.row_tolerance);

        if !row_still_occupied {
            for node in nodes.iter_mut() {
                if node.is_root() && node.y > slot.old_y {
                    node.y -= config.line_height;
                }
            }
        }
    }
}
