// Overlap resolution.
//
// Regroups an arbitrarily positioned node set into rows, re-spaces each
// row, and (book mode only) reflows overflowing tails onto following
// rows. Idempotent on an already-resolved set: rows re-bucket to the same
// membership and the spacing pass reproduces the same coordinates.
//
// Book and canvas differ deliberately:
// - book re-packs every row left-to-right at exactly min_gap and wraps
//   overflow, mirroring a reading layout with a fixed page width;
// - canvas only pushes intruding neighbors right (never pulls left) and
//   never wraps, so a free diagram may extend past the nominal width.

use tracing::debug;

use crate::geometry::{self, ViewMode, Viewport};
use crate::model::Node;

struct Row {
    /// Canonical y: the y of the first node bucketed into this row.
    y: f64,
    nodes: Vec<Node>,
}

/// Resolve overlaps and (book mode) overflow for the given node set.
/// Returns the nodes flattened back out of row order.
pub fn resolve_overlaps(nodes: Vec<Node>, mode: ViewMode, viewport: &Viewport) -> Vec<Node> {
    let config = mode.config();
    let is_book = mode == ViewMode::Book;
    let sx = geometry::start_x(viewport, mode);
    let max_right_edge = sx + geometry::container_width(viewport, mode);

    // 1. Bucket into rows, scanning in y order so the topmost member of
    // each band defines the bucket's canonical y.
    let mut sorted = nodes;
    sorted.sort_by(|a, b| a.y.partial_cmp(&b.y).unwrap_or(std::cmp::Ordering::Equal));

    let mut rows: Vec<Row> = Vec::new();
    for node in sorted {
        match rows
            .iter_mut()
            .find(|row| (row.y - node.y).abs() < config.row_tolerance)
        {
            Some(row) => row.nodes.push(node),
            None => rows.push(Row { y: node.y, nodes: vec![node] }),
        }
    }
    rows.sort_by(|a, b| a.y.partial_cmp(&b.y).unwrap_or(std::cmp::Ordering::Equal));

    // 2. Process rows top to bottom; overflow handling may insert rows
    // mid-sequence, so this is an index walk, not an iterator.
    let mut i = 0;
    while i < rows.len() {
        let row_y = rows[i].y;
        let row = &mut rows[i].nodes;

        // 3. Sort within the row and space adjacent pairs.
        row.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));

        for j in 0..row.len().saturating_sub(1) {
            let current_half = row[j].scaled_width(mode) / 2.0;
            let current_right_edge = row[j].x + current_half;
            let next_half = row[j + 1].scaled_width(mode) / 2.0;
            let next_left_edge = row[j + 1].x - next_half;

            if is_book {
                // Full re-pack: every neighbor lands exactly min_gap away.
                row[j + 1].x = current_right_edge + config.min_gap + next_half;
            } else if next_left_edge < current_right_edge + config.min_gap {
                // Non-destructive spacing: push right, never pull left.
                row[j + 1].x += (current_right_edge + config.min_gap) - next_left_edge;
            }
        }

        // 4. Book-mode overflow: wrap the tail of a too-wide row.
        if is_book && !row.is_empty() {
            let last = row.last().expect("row checked non-empty");
            let last_right = last.x + last.scaled_width(mode) / 2.0;

            if last_right > max_right_edge {
                let split_index = row
                    .iter()
                    .position(|n| n.x + n.scaled_width(mode) / 2.0 > max_right_edge);

                if let Some(split_index) = split_index {
                    // A row with exactly one node is never split, even if
                    // it overflows; wrapping it again would never settle.
                    if !(split_index == 0 && row.len() == 1) {
                        let mut overflow = row.split_off(split_index);
                        let next_y = row_y + config.line_height;
                        debug!(
                            moved = overflow.len(),
                            from_y = row_y,
                            "book row overflow, wrapping tail"
                        );

                        if i + 1 < rows.len() && (rows[i + 1].y - next_y).abs() < config.row_tolerance
                        {
                            // Merge into the close-enough next row. The
                            // large negative offset makes the moved nodes
                            // sort before every pre-existing member while
                            // keeping their relative order; the receiving
                            // row's own pass re-sorts and re-spaces.
                            let target_y = rows[i + 1].y;
                            for node in &mut overflow {
                                node.y = target_y;
                                node.x = sx - 10_000.0 + node.x;
                            }
                            rows[i + 1].nodes.extend(overflow);
                        } else {
                            // No close row: start a fresh one at the
                            // row's start x, inserted right after this
                            // row (or appended at the end).
                            for node in &mut overflow {
                                node.y = next_y;
                                node.x = sx;
                            }
                            let fresh = Row { y: next_y, nodes: overflow };
                            if i + 1 < rows.len() {
                                rows.insert(i + 1, fresh);
                            } else {
                                rows.push(fresh);
                            }
                        }
                    }
                }
            }
        }

        i += 1;
    }

    // 5. Flatten in row order.
    rows.into_iter().flat_map(|row| row.nodes).collect()
}
