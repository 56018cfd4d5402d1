// End-to-end scenario: load a short passage in book mode, drag "love"
// onto "God" through the zoned drop preview, and verify the nest commit,
// gap closing, and reflow all land where they should.

use verseaxis_core::geometry::{self, START_Y, Point, ViewMode, Viewport};
use verseaxis_core::model::Relation;
use verseaxis_core::{NodeId, Session};

const POINTER: i32 = 1;

fn node_point(session: &Session, id: NodeId) -> Point {
    let node = session.forest().get(id).unwrap();
    Point::new(node.x, node.y)
}

#[test]
fn scenario_nest_love_under_god() {
    let viewport = Viewport::new(1400.0, 900.0);
    let mut session = Session::new(viewport);
    session.load_text("Romans 5:8", "God shows his love for us");

    let forest = session.forest();
    assert_eq!(forest.len(), 6);

    // One line, starting at the container's left edge, x monotonic.
    let sx = geometry::start_x(&viewport, ViewMode::Book);
    let first = &forest.nodes()[0];
    assert_eq!(first.text, "God");
    let first_width = geometry::estimate_width("God", ViewMode::Book);
    assert!((first.x - (sx + first_width / 2.0)).abs() < 1e-9);
    for pair in forest.nodes().windows(2) {
        assert!(pair[0].x < pair[1].x);
        assert_eq!(pair[0].y, START_Y);
        assert_eq!(pair[1].y, START_Y);
    }

    let god = forest.nodes()[0].clone();
    let love = forest
        .nodes()
        .iter()
        .find(|n| n.text == "love")
        .cloned()
        .unwrap();

    // Drag "love" so the pointer lands in the 3rd of the six relation
    // zones across "God" (zone index 2 = "when").
    let god_width = geometry::estimate_width(&god.text, ViewMode::Book);
    let zone_x = (god.x - god_width / 2.0) + god_width * (2.5 / 6.0);
    let drop = Point::new(zone_x, god.y + 30.0);

    session.pointer_down(Some(love.id), POINTER, Point::new(love.x, love.y), false);
    session.pointer_move(POINTER, drop);
    session.pointer_up(POINTER, drop);

    // The edge is in place and the node snapped below its parent.
    let nested = session.forest().get(love.id).unwrap();
    assert_eq!(nested.parent_id, Some(god.id));
    assert_eq!(nested.relation, Some(Relation::When));
    assert_eq!(nested.relation.unwrap().zone(), 2);
    assert_eq!(nested.x, node_point(&session, god.id).x);
    assert_eq!(nested.y, node_point(&session, god.id).y + 40.0);

    // The remaining five roots compacted back onto one row with exactly
    // the configured minimum gap between neighbors.
    let config = ViewMode::Book.config();
    let mut roots: Vec<_> = session
        .forest()
        .nodes()
        .iter()
        .filter(|n| n.is_root())
        .collect();
    assert_eq!(roots.len(), 5);
    roots.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap());
    for pair in roots.windows(2) {
        assert_eq!(pair[0].y, START_Y);
        let gap = (pair[1].x - pair[1].scaled_width(ViewMode::Book) / 2.0)
            - (pair[0].x + pair[0].scaled_width(ViewMode::Book) / 2.0);
        assert!(
            (gap - config.min_gap).abs() < 1e-6,
            "gap between {} and {} was {gap}",
            pair[0].text,
            pair[1].text,
        );
    }

    // Undo restores the pre-drop forest.
    session.undo();
    let restored = session.forest().get(love.id).unwrap();
    assert!(restored.is_root());
    assert_eq!(restored.relation, None);
    assert!((restored.x - love.x).abs() < 1e-9);
}

#[test]
fn scenario_same_word_drag_relocates_one_occurrence() {
    let mut session = Session::new(Viewport::new(1400.0, 900.0));
    session.load_text("Test 1:1", "love bears all and love hopes all");

    let occurrences: Vec<NodeId> = session
        .forest()
        .nodes()
        .iter()
        .filter(|n| n.text == "love")
        .map(|n| n.id)
        .collect();
    assert_eq!(occurrences.len(), 2);
    let dragged = occurrences[0];
    let other = occurrences[1];
    let dragged_start = node_point(&session, dragged);
    let other_start = node_point(&session, other);

    // Clicking one occurrence selects both.
    session.pointer_down(Some(dragged), POINTER, dragged_start, false);
    assert_eq!(session.controller().selection().len(), 2);

    // Dragging far from any drop target relocates only the clicked one.
    let destination = Point::new(dragged_start.x + 10.0, dragged_start.y + 400.0);
    session.pointer_move(POINTER, destination);
    session.pointer_up(POINTER, destination);

    assert_eq!(session.controller().selection(), &[dragged]);
    let moved = node_point(&session, dragged);
    assert!((moved.y - (dragged_start.y + 400.0)).abs() < 1e-9);
    assert_eq!(node_point(&session, other), other_start);
}
