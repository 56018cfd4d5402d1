// Selection & drag state machine.
//
// Pointer-down decides the path (node drag, box select, pan) from the hit
// target and the multi-select modifier. Node motion is suppressed inside a
// small dead zone so clicks and drags disambiguate; the first movement
// past it may narrow a same-word group drag down to the primary node.
// Every move updates the live drop-target hover and its zoned relation
// preview; pointer-up commits (nest) or keeps positions. The caller runs
// gap closing / overlap resolution / history on the returned outcome.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::geometry::{self, Point, Rect, ViewMode, Viewport};
use crate::layout::MovedRoot;
use crate::model::{ConnectionMode, Forest, NodeId, Relation, normalize_word};

use super::drag::{BoxDrag, DragSession, NodeDrag, PanDrag};
use super::{
    BOX_HALF_HEIGHT, BOX_HALF_WIDTH, CLAMP_PADDING, CanvasView, DRAG_DEAD_ZONE, HOVER_RADIUS,
    NEST_OFFSET_BOOK, NEST_OFFSET_CANVAS, PointerInput,
};

#[derive(Debug, Default)]
pub struct Controller {
    /// Insertion-ordered, duplicate-free; index 0 is the primary.
    selection: Vec<NodeId>,
    drag: Option<DragSession>,
    hover_target: Option<NodeId>,
    pending_relation: Option<Relation>,
}

/// What a completed pointer-up asks the session to do.
#[derive(Debug, Clone, PartialEq)]
pub enum UpOutcome {
    /// Click, deselect, box-select or pan: nothing to normalize or record.
    None,
    /// Drag released with no drop target: nodes keep their dragged
    /// positions; record one history entry, no reflow.
    KeepPositions,
    /// Drag nested under a target: close the vacated root slots, resolve,
    /// record.
    Nested { moved_roots: Vec<MovedRoot> },
}

impl Controller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> &[NodeId] {
        &self.selection
    }

    pub fn primary(&self) -> Option<NodeId> {
        self.selection.first().copied()
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn hover_target(&self) -> Option<NodeId> {
        self.hover_target
    }

    pub fn pending_relation(&self) -> Option<Relation> {
        self.pending_relation
    }

    pub fn drag(&self) -> Option<&DragSession> {
        self.drag.as_ref()
    }

    /// Whether `id` is being translated by the active drag.
    pub fn is_moving(&self, id: NodeId) -> bool {
        matches!(&self.drag, Some(DragSession::Node(d)) if d.ids_to_move.contains(&id))
    }

    // ------------------------------------------------------------------
    // Pointer-down
    // ------------------------------------------------------------------

    pub fn pointer_down(
        &mut self,
        forest: &Forest,
        target: Option<NodeId>,
        input: PointerInput,
        multi: bool,
        view: &CanvasView,
    ) {
        match target {
            Some(node_id) => self.node_down(forest, node_id, input, multi),
            None => {
                if multi {
                    self.drag = Some(DragSession::BoxSelect(BoxDrag {
                        pointer_id: input.pointer_id,
                        start: input.canvas,
                        current: input.canvas,
                    }));
                } else {
                    self.selection.clear();
                    self.drag = Some(DragSession::Pan(PanDrag {
                        pointer_id: input.pointer_id,
                        start_client: input.client,
                        initial_offset: view.offset,
                    }));
                }
            }
        }
    }

    fn node_down(&mut self, forest: &Forest, node_id: NodeId, input: PointerInput, multi: bool) {
        let already_selected = self.selection.contains(&node_id);
        let mut pending_deselect = false;

        if multi {
            if already_selected {
                pending_deselect = true;
            } else {
                self.selection.push(node_id);
                self.drop_duplicates_of_primary(forest);
            }
        } else if !already_selected {
            // Select the clicked node and every other occurrence of the
            // same normalized word, clicked node first (primary).
            let target_word = forest
                .get(node_id)
                .map(|n| normalize_word(&n.text))
                .unwrap_or_default();
            self.selection = vec![node_id];
            self.selection.extend(
                forest
                    .nodes()
                    .iter()
                    .filter(|n| n.id != node_id && normalize_word(&n.text) == target_word)
                    .map(|n| n.id),
            );
        }

        // Moving set: the selection plus every transitive descendant.
        let mut ids_to_move: HashSet<NodeId> = self.selection.iter().copied().collect();
        for selected in self.selection.clone() {
            ids_to_move.extend(forest.descendants(selected));
        }

        let initial: HashMap<NodeId, Point> = forest
            .nodes()
            .iter()
            .filter(|n| ids_to_move.contains(&n.id))
            .map(|n| (n.id, Point::new(n.x, n.y)))
            .collect();

        debug!(main = %node_id, moving = ids_to_move.len(), "node drag armed");
        self.drag = Some(DragSession::Node(NodeDrag {
            pointer_id: input.pointer_id,
            main: node_id,
            start: input.canvas,
            ids_to_move,
            initial,
            has_moved: false,
            pending_deselect,
            pending_clear_selection: !multi && already_selected,
        }));
    }

    /// Once a modifier-click grows the selection past one distinct word,
    /// same-word duplicates of the primary (other than the primary
    /// itself) fall out: the selection becomes one instance per word.
    fn drop_duplicates_of_primary(&mut self, forest: &Forest) {
        let Some(primary) = self.primary() else { return };
        let norm_of = |id: NodeId| {
            forest
                .get(id)
                .map(|n| normalize_word(&n.text))
                .unwrap_or_default()
        };
        let primary_word = norm_of(primary);
        if primary_word.is_empty() {
            return;
        }
        let distinct: HashSet<String> = self.selection.iter().map(|id| norm_of(*id)).collect();
        if distinct.len() > 1 {
            self.selection
                .retain(|id| *id == primary || norm_of(*id) != primary_word);
        }
    }

    // ------------------------------------------------------------------
    // Pointer-move
    // ------------------------------------------------------------------

    pub fn pointer_move(
        &mut self,
        forest: &mut Forest,
        input: PointerInput,
        view: &mut CanvasView,
        viewport: &Viewport,
        mode: ViewMode,
        connection_mode: ConnectionMode,
    ) {
        // Session ownership: only the initiating pointer may advance it.
        match &self.drag {
            Some(drag) if input.pointer_id == drag.pointer_id() => {}
            _ => return,
        }

        if matches!(&self.drag, Some(DragSession::Node(_))) {
            self.node_move(forest, input, view, viewport, mode, connection_mode);
            return;
        }

        match &mut self.drag {
            Some(DragSession::BoxSelect(box_drag)) => {
                box_drag.current = input.canvas;
            }
            Some(DragSession::Pan(pan)) => {
                view.offset = Point::new(
                    pan.initial_offset.x + (input.client.x - pan.start_client.x),
                    pan.initial_offset.y + (input.client.y - pan.start_client.y),
                );
            }
            _ => {}
        }
    }

    fn node_move(
        &mut self,
        forest: &mut Forest,
        input: PointerInput,
        view: &CanvasView,
        viewport: &Viewport,
        mode: ViewMode,
        connection_mode: ConnectionMode,
    ) {
        let Some(DragSession::Node(drag)) = &mut self.drag else { return };

        let raw_dx = input.canvas.x - drag.start.x;
        let raw_dy = input.canvas.y - drag.start.y;

        if !drag.has_moved {
            if raw_dx.hypot(raw_dy) <= DRAG_DEAD_ZONE {
                return;
            }

            // Same-word narrowing at dead-zone exit: dragging a group of
            // root occurrences of one word relocates only the primary;
            // the rest snap back and leave the selection.
            let moving_roots: Vec<(NodeId, String)> = forest
                .nodes()
                .iter()
                .filter(|n| drag.ids_to_move.contains(&n.id) && n.is_root())
                .map(|n| (n.id, normalize_word(&n.text)))
                .collect();
            let same_word_group = moving_roots.len() > 1
                && moving_roots.iter().all(|(_, w)| *w == moving_roots[0].1);

            if same_word_group {
                let mut narrowed: HashSet<NodeId> = HashSet::new();
                narrowed.insert(drag.main);
                narrowed.extend(forest.descendants(drag.main));

                for node in forest.nodes_mut() {
                    if drag.ids_to_move.contains(&node.id) && !narrowed.contains(&node.id) {
                        if let Some(init) = drag.initial.get(&node.id) {
                            node.x = init.x;
                            node.y = init.y;
                        }
                    } else if narrowed.contains(&node.id) {
                        if let Some(init) = drag.initial.get(&node.id) {
                            node.x = init.x + raw_dx;
                            node.y = init.y + raw_dy;
                        }
                    }
                }
                debug!(main = %drag.main, "same-word drag narrowed to primary");
                self.selection = vec![drag.main];
                drag.has_moved = true;
                drag.ids_to_move = narrowed;
                return;
            }

            drag.has_moved = true;
        }

        // Canvas mode clamps the lead node to the visible viewport.
        let (dx, dy) = if mode == ViewMode::Canvas {
            let main_init = drag.initial[&drag.main];
            let proposed = Point::new(main_init.x + raw_dx, main_init.y + raw_dy);
            let left = -view.offset.x / view.scale + CLAMP_PADDING;
            let top = -view.offset.y / view.scale + CLAMP_PADDING;
            let right = (viewport.width - view.offset.x) / view.scale - CLAMP_PADDING;
            let bottom = (viewport.height - view.offset.y) / view.scale - CLAMP_PADDING;
            let clamped = Point::new(proposed.x.clamp(left, right), proposed.y.clamp(top, bottom));
            (clamped.x - main_init.x, clamped.y - main_init.y)
        } else {
            (raw_dx, raw_dy)
        };

        for node in forest.nodes_mut() {
            if let Some(init) = drag.initial.get(&node.id) {
                if drag.ids_to_move.contains(&node.id) {
                    node.x = init.x + dx;
                    node.y = init.y + dy;
                }
            }
        }

        // Live drop-target detection around the lead node.
        let main_position = match forest.get(drag.main) {
            Some(n) => Point::new(n.x, n.y),
            None => return,
        };
        let mut nearest: Option<(NodeId, f64)> = None;
        for node in forest.nodes() {
            if drag.ids_to_move.contains(&node.id) {
                continue;
            }
            // With connections hidden the host doesn't render nested
            // nodes, so they cannot receive drops.
            if connection_mode == ConnectionMode::Hidden && !node.is_root() {
                continue;
            }
            let distance = Point::new(node.x, node.y).distance_to(main_position);
            if distance < HOVER_RADIUS && nearest.is_none_or(|(_, best)| distance < best) {
                nearest = Some((node.id, distance));
            }
        }

        match nearest {
            Some((target_id, _)) => {
                let target = forest.get(target_id).expect("hover candidate exists");
                let word_width = geometry::estimate_width(&target.text, mode);
                let left_edge = target.x - word_width / 2.0;
                let relative_x = input.canvas.x - left_edge;
                let zone = (relative_x / word_width * Relation::ALL.len() as f64)
                    .floor()
                    .clamp(0.0, (Relation::ALL.len() - 1) as f64) as usize;
                self.hover_target = Some(target_id);
                self.pending_relation = Some(Relation::from_zone(zone));
            }
            None => {
                self.hover_target = None;
                self.pending_relation = None;
            }
        }
    }

    // ------------------------------------------------------------------
    // Pointer-up
    // ------------------------------------------------------------------

    pub fn pointer_up(&mut self, forest: &mut Forest, input: PointerInput, mode: ViewMode) -> UpOutcome {
        let Some(drag) = &self.drag else { return UpOutcome::None };
        if input.pointer_id != drag.pointer_id() {
            return UpOutcome::None;
        }

        let drag = self.drag.take().expect("drag checked above");
        let outcome = match drag {
            DragSession::Node(node_drag) => self.node_up(forest, node_drag, mode),
            DragSession::BoxSelect(box_drag) => {
                self.commit_box_select(forest, &box_drag);
                UpOutcome::None
            }
            DragSession::Pan(_) => UpOutcome::None,
        };

        self.hover_target = None;
        self.pending_relation = None;
        outcome
    }

    fn node_up(&mut self, forest: &mut Forest, drag: NodeDrag, mode: ViewMode) -> UpOutcome {
        if !drag.has_moved {
            if drag.pending_clear_selection {
                self.selection.clear();
            } else if drag.pending_deselect {
                self.selection.retain(|id| *id != drag.main);
            }
            return UpOutcome::None;
        }

        let (Some(target_id), Some(relation)) = (self.hover_target, self.pending_relation) else {
            // No drop target: everything stays where it was dragged.
            return UpOutcome::KeepPositions;
        };

        let parent = forest.get(target_id).expect("hover target exists");
        let nest_offset = match mode {
            ViewMode::Book => NEST_OFFSET_BOOK,
            ViewMode::Canvas => NEST_OFFSET_CANVAS,
        };
        let snap = Point::new(parent.x, parent.y + nest_offset);

        // Same-word drops nest only the primary, consistent with the
        // narrowing at drag start.
        let selected_moving: Vec<(NodeId, String)> = forest
            .nodes()
            .iter()
            .filter(|n| drag.ids_to_move.contains(&n.id) && self.selection.contains(&n.id))
            .map(|n| (n.id, normalize_word(&n.text)))
            .collect();
        let same_word_drop = !selected_moving.is_empty()
            && selected_moving.iter().all(|(_, w)| *w == selected_moving[0].1);
        let ids_to_nest: Vec<NodeId> = if same_word_drop {
            vec![drag.main]
        } else {
            selected_moving.iter().map(|(id, _)| *id).collect()
        };

        // Root slots vacated by this nest, for gap closing.
        let mut moved_roots = Vec::new();
        for id in &ids_to_nest {
            if let (Some(node), Some(init)) = (forest.get(*id), drag.initial.get(id)) {
                if node.is_root() {
                    moved_roots.push(MovedRoot {
                        id: *id,
                        text: node.text.clone(),
                        old_x: init.x,
                        old_y: init.y,
                    });
                }
            }
        }

        for id in drag.ids_to_move.iter().copied() {
            if ids_to_nest.contains(&id) {
                forest.set_parent(id, target_id, relation);
                if let Some(node) = forest.get_mut(id) {
                    node.x = snap.x;
                    node.y = snap.y;
                }
            } else if let Some(init) = drag.initial.get(&id) {
                // Moved but not nested: revert to the pre-drag position.
                if let Some(node) = forest.get_mut(id) {
                    node.x = init.x;
                    node.y = init.y;
                }
            }
        }

        debug!(target = %target_id, relation = relation.as_str(), nested = ids_to_nest.len(), "drop committed");
        UpOutcome::Nested { moved_roots }
    }

    fn commit_box_select(&mut self, forest: &Forest, box_drag: &BoxDrag) {
        let rect = Rect::from_corners(box_drag.start, box_drag.current);
        // Union with the existing selection, never replace.
        for node in forest.nodes() {
            if rect.intersects_box(Point::new(node.x, node.y), BOX_HALF_WIDTH, BOX_HALF_HEIGHT)
                && !self.selection.contains(&node.id)
            {
                self.selection.push(node.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::flow_layout;

    const VIEWPORT: Viewport = Viewport { width: 1400.0, height: 900.0, scroll_top: 0.0 };
    const POINTER: i32 = 7;

    fn setup(text: &str) -> (Forest, Controller, CanvasView) {
        let mut forest = Forest::from_text(text);
        flow_layout(forest.nodes_mut(), ViewMode::Book, &VIEWPORT);
        (forest, Controller::new(), CanvasView::default())
    }

    fn at(forest: &Forest, id: NodeId) -> Point {
        let node = forest.get(id).unwrap();
        Point::new(node.x, node.y)
    }

    fn input(point: Point) -> PointerInput {
        PointerInput { pointer_id: POINTER, client: point, canvas: point }
    }

    fn press(
        forest: &Forest,
        controller: &mut Controller,
        view: &CanvasView,
        id: NodeId,
        multi: bool,
    ) {
        let point = at(forest, id);
        controller.pointer_down(forest, Some(id), input(point), multi, view);
    }

    fn drag_by(
        forest: &mut Forest,
        controller: &mut Controller,
        view: &mut CanvasView,
        from: Point,
        dx: f64,
        dy: f64,
    ) {
        controller.pointer_move(
            forest,
            input(Point::new(from.x + dx, from.y + dy)),
            view,
            &VIEWPORT,
            ViewMode::Book,
            ConnectionMode::Hidden,
        );
    }

    #[test]
    fn test_click_selects_all_occurrences() {
        let (forest, mut controller, view) = setup("love sees love makes love");
        let clicked = NodeId(2);
        press(&forest, &mut controller, &view, clicked, false);

        assert_eq!(controller.selection().len(), 3);
        assert_eq!(controller.primary(), Some(clicked));
        assert!(controller.selection().contains(&NodeId(0)));
        assert!(controller.selection().contains(&NodeId(4)));
    }

    #[test]
    fn test_click_matches_ignore_punctuation() {
        let (forest, mut controller, view) = setup("Love, is love");
        press(&forest, &mut controller, &view, NodeId(0), false);
        assert_eq!(controller.selection(), &[NodeId(0), NodeId(2)]);
    }

    #[test]
    fn test_click_selected_node_clears_on_release() {
        let (mut forest, mut controller, view) = setup("peace with God");
        press(&forest, &mut controller, &view, NodeId(0), false);
        assert_eq!(controller.selection().len(), 1);

        // Press again and release without leaving the dead zone.
        press(&forest, &mut controller, &view, NodeId(0), false);
        let point = at(&forest, NodeId(0));
        let outcome = controller.pointer_up(&mut forest, input(point), ViewMode::Book);
        assert_eq!(outcome, UpOutcome::None);
        assert!(controller.selection().is_empty());
    }

    #[test]
    fn test_multi_toggle_deselects_on_release() {
        let (mut forest, mut controller, view) = setup("peace with God");
        press(&forest, &mut controller, &view, NodeId(0), true);
        let point = at(&forest, NodeId(0));
        controller.pointer_up(&mut forest, input(point), ViewMode::Book);
        assert_eq!(controller.selection(), &[NodeId(0)]);

        press(&forest, &mut controller, &view, NodeId(0), true);
        controller.pointer_up(&mut forest, input(point), ViewMode::Book);
        assert!(controller.selection().is_empty());
    }

    #[test]
    fn test_second_word_drops_primary_duplicates() {
        let (forest, mut controller, view) = setup("love sees love makes God");
        press(&forest, &mut controller, &view, NodeId(0), false);
        assert_eq!(controller.selection().len(), 2); // both "love"s

        // Modifier-click a different word: duplicate of the primary falls
        // out, keeping one instance per distinct word.
        press(&forest, &mut controller, &view, NodeId(4), true);
        assert_eq!(controller.selection(), &[NodeId(0), NodeId(4)]);
    }

    #[test]
    fn test_dead_zone_suppresses_motion() {
        let (mut forest, mut controller, mut view) = setup("peace with God");
        let start = at(&forest, NodeId(1));
        press(&forest, &mut controller, &view, NodeId(1), false);
        drag_by(&mut forest, &mut controller, &mut view, start, 2.0, 1.0);

        assert_eq!(at(&forest, NodeId(1)), start);
        let outcome =
            controller.pointer_up(&mut forest, input(Point::new(start.x + 2.0, start.y + 1.0)), ViewMode::Book);
        assert_eq!(outcome, UpOutcome::None);
    }

    #[test]
    fn test_drag_moves_descendants() {
        let (mut forest, mut controller, mut view) = setup("God shows his love");
        forest.set_parent(NodeId(1), NodeId(0), Relation::What);
        forest.set_parent(NodeId(2), NodeId(1), Relation::Who);
        let grandchild_start = at(&forest, NodeId(2));

        let start = at(&forest, NodeId(0));
        press(&forest, &mut controller, &view, NodeId(0), false);

        // Descendant inclusion: the whole subtree is in the moving set.
        if let Some(DragSession::Node(drag)) = controller.drag() {
            assert!(drag.ids_to_move.contains(&NodeId(1)));
            assert!(drag.ids_to_move.contains(&NodeId(2)));
        } else {
            panic!("expected node drag");
        }

        drag_by(&mut forest, &mut controller, &mut view, start, 50.0, 30.0);
        let moved = at(&forest, NodeId(2));
        assert_eq!(moved.x, grandchild_start.x + 50.0);
        assert_eq!(moved.y, grandchild_start.y + 30.0);
    }

    #[test]
    fn test_same_word_drag_narrows_to_primary() {
        let (mut forest, mut controller, mut view) = setup("love sees love makes love");
        let primary = NodeId(2);
        let start = at(&forest, primary);
        let other_start = at(&forest, NodeId(0));

        press(&forest, &mut controller, &view, primary, false);
        assert_eq!(controller.selection().len(), 3);

        drag_by(&mut forest, &mut controller, &mut view, start, 40.0, 0.0);

        // Only the primary moved; co-selected duplicates snapped back and
        // the selection collapsed.
        assert_eq!(controller.selection(), &[primary]);
        assert_eq!(at(&forest, primary).x, start.x + 40.0);
        assert_eq!(at(&forest, NodeId(0)), other_start);
        if let Some(DragSession::Node(drag)) = controller.drag() {
            assert_eq!(drag.ids_to_move.len(), 1);
        } else {
            panic!("expected node drag");
        }
    }

    #[test]
    fn test_hover_zone_maps_to_relation() {
        let (mut forest, mut controller, mut view) = setup("God shows his love for us");
        let target = forest.get(NodeId(0)).unwrap().clone();
        let dragged = NodeId(3);

        press(&forest, &mut controller, &view, dragged, false);

        // Land the pointer inside the 3rd of 6 zones of "God"; the lead
        // node follows the pointer because the drag started at its center.
        let width = geometry::estimate_width(&target.text, ViewMode::Book);
        let zone_x = (target.x - width / 2.0) + width * (2.5 / 6.0);
        let destination = Point::new(zone_x, target.y + 30.0);
        controller.pointer_move(
            &mut forest,
            input(destination),
            &mut view,
            &VIEWPORT,
            ViewMode::Book,
            ConnectionMode::Hidden,
        );

        assert_eq!(controller.hover_target(), Some(target.id));
        assert_eq!(controller.pending_relation(), Some(Relation::When));
    }

    #[test]
    fn test_commit_nests_primary_under_target() {
        let (mut forest, mut controller, mut view) = setup("God shows his love for us");
        let target = forest.get(NodeId(0)).unwrap().clone();
        let dragged = NodeId(3);
        let start = at(&forest, dragged);
        let old = start;

        press(&forest, &mut controller, &view, dragged, false);
        let width = geometry::estimate_width(&target.text, ViewMode::Book);
        let zone_x = (target.x - width / 2.0) + width * (2.5 / 6.0);
        let destination = Point::new(zone_x, target.y + 30.0);
        controller.pointer_move(
            &mut forest,
            input(destination),
            &mut view,
            &VIEWPORT,
            ViewMode::Book,
            ConnectionMode::Hidden,
        );

        let outcome = controller.pointer_up(&mut forest, input(destination), ViewMode::Book);
        let UpOutcome::Nested { moved_roots } = outcome else {
            panic!("expected nested outcome");
        };
        assert_eq!(moved_roots.len(), 1);
        assert_eq!(moved_roots[0].id, dragged);
        assert_eq!(moved_roots[0].old_x, old.x);

        let nested = forest.get(dragged).unwrap();
        assert_eq!(nested.parent_id, Some(target.id));
        assert_eq!(nested.relation, Some(Relation::When));
        assert_eq!(nested.x, target.x);
        assert_eq!(nested.y, target.y + NEST_OFFSET_BOOK);
        assert_eq!(controller.hover_target(), None);
    }

    #[test]
    fn test_release_without_target_keeps_positions() {
        let (mut forest, mut controller, mut view) = setup("peace with God and hope");
        let dragged = NodeId(0);
        let start = at(&forest, dragged);

        press(&forest, &mut controller, &view, dragged, false);
        // Far from everything: book rows are tight, so drop well below.
        let destination = Point::new(start.x, start.y + 500.0);
        controller.pointer_move(
            &mut forest,
            input(destination),
            &mut view,
            &VIEWPORT,
            ViewMode::Book,
            ConnectionMode::Hidden,
        );

        let outcome = controller.pointer_up(&mut forest, input(destination), ViewMode::Book);
        assert_eq!(outcome, UpOutcome::KeepPositions);
        assert_eq!(at(&forest, dragged).y, start.y + 500.0);
        assert!(forest.get(dragged).unwrap().is_root());
    }

    #[test]
    fn test_box_select_unions_with_existing() {
        let (mut forest, mut controller, view) = setup("peace with God");
        press(&forest, &mut controller, &view, NodeId(0), false);
        let up_input = input(at(&forest, NodeId(0)));
        controller.pointer_up(&mut forest, up_input, ViewMode::Book);
        assert_eq!(controller.selection(), &[NodeId(0)]);

        // Marquee over the two other words.
        let from = at(&forest, NodeId(1));
        let to = at(&forest, NodeId(2));
        controller.pointer_down(
            &forest,
            None,
            input(Point::new(from.x - 5.0, from.y - 5.0)),
            true,
            &view,
        );
        let mut view = view;
        controller.pointer_move(
            &mut forest,
            input(Point::new(to.x + 5.0, to.y + 5.0)),
            &mut view,
            &VIEWPORT,
            ViewMode::Book,
            ConnectionMode::Hidden,
        );
        controller.pointer_up(&mut forest, input(Point::new(to.x + 5.0, to.y + 5.0)), ViewMode::Book);

        assert_eq!(controller.selection(), &[NodeId(0), NodeId(1), NodeId(2)]);
    }

    #[test]
    fn test_pan_updates_offset_without_selection() {
        let (mut forest, mut controller, mut view) = setup("peace with God");
        controller.pointer_down(&forest, None, input(Point::new(500.0, 300.0)), false, &view);
        controller.pointer_move(
            &mut forest,
            input(Point::new(560.0, 340.0)),
            &mut view,
            &VIEWPORT,
            ViewMode::Canvas,
            ConnectionMode::Hidden,
        );
        let outcome =
            controller.pointer_up(&mut forest, input(Point::new(560.0, 340.0)), ViewMode::Canvas);

        assert_eq!(outcome, UpOutcome::None);
        assert_eq!(view.offset, Point::new(60.0, 40.0));
        assert!(controller.selection().is_empty());
    }

    #[test]
    fn test_foreign_pointer_is_ignored() {
        let (mut forest, mut controller, mut view) = setup("peace with God");
        let start = at(&forest, NodeId(0));
        press(&forest, &mut controller, &view, NodeId(0), false);

        let foreign = PointerInput {
            pointer_id: POINTER + 1,
            client: Point::new(start.x + 90.0, start.y),
            canvas: Point::new(start.x + 90.0, start.y),
        };
        controller.pointer_move(
            &mut forest,
            foreign,
            &mut view,
            &VIEWPORT,
            ViewMode::Book,
            ConnectionMode::Hidden,
        );
        assert_eq!(at(&forest, NodeId(0)), start);

        // Foreign release does not end the session either.
        assert_eq!(controller.pointer_up(&mut forest, foreign, ViewMode::Book), UpOutcome::None);
        assert!(controller.drag().is_some());
    }

    #[test]
    fn test_hidden_mode_excludes_nested_candidates() {
        let (mut forest, mut controller, mut view) = setup("God shows his love");
        // Nest "shows" under "God"; it sits right next to the drag path.
        forest.set_parent(NodeId(1), NodeId(0), Relation::Who);

        let dragged = NodeId(3);
        press(&forest, &mut controller, &view, dragged, false);
        let nested = at(&forest, NodeId(1));
        controller.pointer_move(
            &mut forest,
            input(Point::new(nested.x + 4.0, nested.y)),
            &mut view,
            &VIEWPORT,
            ViewMode::Book,
            ConnectionMode::Hidden,
        );
        // Nearest by distance would be the nested node, but hidden mode
        // filters it; some other root wins instead.
        assert_ne!(controller.hover_target(), Some(NodeId(1)));

        // With connections visible the nested node is a valid target.
        controller.pointer_move(
            &mut forest,
            input(Point::new(nested.x + 3.0, nested.y)),
            &mut view,
            &VIEWPORT,
            ViewMode::Book,
            ConnectionMode::Tree,
        );
        assert_eq!(controller.hover_target(), Some(NodeId(1)));
    }

    #[test]
    fn test_canvas_drag_clamps_to_viewport() {
        let (mut forest, mut controller, mut view) = setup("peace");
        // Place the node mid-viewport in canvas terms.
        forest.get_mut(NodeId(0)).unwrap().x = 400.0;
        forest.get_mut(NodeId(0)).unwrap().y = 300.0;

        let start = Point::new(400.0, 300.0);
        controller.pointer_down(&forest, Some(NodeId(0)), input(start), false, &view);
        controller.pointer_move(
            &mut forest,
            input(Point::new(-600.0, 300.0)),
            &mut view,
            &VIEWPORT,
            ViewMode::Canvas,
            ConnectionMode::Hidden,
        );

        assert_eq!(at(&forest, NodeId(0)).x, CLAMP_PADDING);
        assert_eq!(at(&forest, NodeId(0)).y, 300.0);
    }
}
