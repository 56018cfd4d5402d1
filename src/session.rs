// Session state: the single source of truth the host drives.
//
// Owns the forest, the bounded history, the interaction controller, the
// per-mode position cache and the pan/zoom view. Every committed mutation
// funnels through `commit`, which optionally reflows and then records
// exactly one history entry. Transient drag motion records nothing.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::collab::CollabError;
use crate::geometry::{Point, ViewMode, Viewport};
use crate::history::History;
use crate::interact::{CanvasView, Controller, DragSession, PointerInput, UpOutcome};
use crate::layout::{close_gaps, flow_layout, resolve_overlaps};
use crate::model::{ConnectionMode, Forest, HighlightColor, NodeId, normalize_word};

pub const DEFAULT_PASSAGE: &str = "Romans 5:1-10";
pub const DEFAULT_TEXT: &str = "Therefore, since we have been justified by faith, we have peace with God through our Lord Jesus Christ. Through him we have also obtained access by faith into this grace in which we stand, and we rejoice in hope of the glory of God. Not only that, but we rejoice in our sufferings, knowing that suffering produces endurance, and endurance produces character, and character produces hope, and hope does not put us to shame, because God's love has been poured into our hearts through the Holy Spirit who has been given to us. For while we were still weak, at the right time Christ died for the ungodly. For one will scarcely die for a righteous person—though perhaps for a good person one would dare even to die— but God shows his love for us in that while we were still sinners, Christ died for us. Since, therefore, we have now been justified by his blood, much more shall we be saved by him from the wrath of God. For if while we were enemies we were reconciled to God by the death of his Son, much more, now that we are reconciled, shall we be saved by his life.";

/// Smallest allowed per-node font scale.
pub const MIN_FONT_SCALE: f64 = 0.5;
/// Step used by the A+/A- commands.
pub const FONT_SCALE_STEP: f64 = 0.1;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleToggle {
    Bold,
    Italic,
    Underline,
}

/// Passage-fetch status surfaced to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassageState {
    Idle,
    Loading,
    Failed(String),
}

/// Analysis-call status; `Ready` text is displayed verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisState {
    Idle,
    Loading,
    Ready(String),
    Failed(String),
}

pub struct Session {
    forest: Forest,
    history: History,
    controller: Controller,
    view: CanvasView,
    viewport: Viewport,
    view_mode: ViewMode,
    connection_mode: ConnectionMode,
    multi_select: bool,
    /// Positions remembered per mode so switching back restores the
    /// arrangement instead of re-deriving it.
    position_cache: HashMap<ViewMode, HashMap<NodeId, Point>>,
    reference: String,
    last_highlight: HighlightColor,
    passage: PassageState,
    analysis: AnalysisState,
}

impl Session {
    /// A session starts in book mode with the default passage loaded,
    /// resolved, and recorded as the first history entry.
    pub fn new(viewport: Viewport) -> Self {
        let mut session = Self {
            forest: Forest::default(),
            history: History::new(),
            controller: Controller::new(),
            view: CanvasView::default(),
            viewport,
            view_mode: ViewMode::Book,
            connection_mode: ConnectionMode::Hidden,
            multi_select: false,
            position_cache: HashMap::new(),
            reference: String::new(),
            last_highlight: HighlightColor::Yellow,
            passage: PassageState::Idle,
            analysis: AnalysisState::Idle,
        };
        session.load_text(DEFAULT_PASSAGE, DEFAULT_TEXT);
        session
    }

    // ------------------------------------------------------------------
    // Accessors (used by the output layer and the host)
    // ------------------------------------------------------------------

    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn view(&self) -> &CanvasView {
        &self.view
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn connection_mode(&self) -> ConnectionMode {
        self.connection_mode
    }

    pub fn multi_select(&self) -> bool {
        self.multi_select
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn last_highlight(&self) -> HighlightColor {
        self.last_highlight
    }

    pub fn passage_state(&self) -> &PassageState {
        &self.passage
    }

    pub fn analysis_state(&self) -> &AnalysisState {
        &self.analysis
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ------------------------------------------------------------------
    // Commit plumbing
    // ------------------------------------------------------------------

    /// Normalize (optionally) and record exactly one history entry.
    fn commit(&mut self, reflow: bool) {
        if reflow {
            let mode = self.view_mode;
            let viewport = self.viewport;
            self.forest
                .rewrite(|nodes| resolve_overlaps(nodes, mode, &viewport));
        }
        self.history.record(&self.forest);
    }

    // ------------------------------------------------------------------
    // Passage loading
    // ------------------------------------------------------------------

    /// Replace the forest with a freshly tokenized passage.
    pub fn load_text(&mut self, reference: &str, text: &str) {
        self.forest = Forest::from_text(text);
        let mode = self.view_mode;
        flow_layout(self.forest.nodes_mut(), mode, &self.viewport);
        self.position_cache.clear();
        self.controller.clear_selection();
        self.view.reset();
        self.reference = reference.to_string();
        self.passage = PassageState::Idle;
        self.commit(true);
        debug!(reference, nodes = self.forest.len(), "passage loaded");
    }

    /// Offline fallback: the baked-in passage, served when no credential
    /// is configured and the reference matches it.
    pub fn offline_passage(reference: &str) -> Option<&'static str> {
        if reference.to_lowercase().contains("romans 5") {
            Some(DEFAULT_TEXT)
        } else {
            None
        }
    }

    pub fn begin_passage_load(&mut self) {
        self.passage = PassageState::Loading;
    }

    /// Resolution of the passage-source collaborator call: one synchronous
    /// forest mutation on success, a user-visible state on failure.
    pub fn complete_passage_load(&mut self, reference: &str, result: Result<String, CollabError>) {
        match result {
            Ok(text) => self.load_text(reference, &text),
            Err(err) => {
                warn!(reference, %err, "passage fetch failed");
                self.passage = PassageState::Failed(err.to_string());
            }
        }
    }

    // ------------------------------------------------------------------
    // Analysis prompts and completion
    // ------------------------------------------------------------------

    /// Prompt for whole-passage insights, built from reading order.
    pub fn insights_prompt(&self) -> String {
        let full_text = self
            .forest
            .reading_order()
            .iter()
            .map(|n| n.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        format!("Analyze the following biblical text structurally and theologically... \"{full_text}\"")
    }

    /// Prompt for a word study over the selection; None when nothing is
    /// selected.
    pub fn word_study_prompt(&self) -> Option<String> {
        let selection = self.controller.selection();
        if selection.is_empty() {
            return None;
        }
        let mut selected: Vec<_> = self
            .forest
            .nodes()
            .iter()
            .filter(|n| selection.contains(&n.id))
            .collect();
        selected.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));
        let selected_text = selected
            .iter()
            .map(|n| n.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let full_text = self
            .forest
            .nodes()
            .iter()
            .map(|n| n.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        Some(format!(
            "Perform a brief word study on \"{selected_text}\" in context: \"{full_text}\"..."
        ))
    }

    pub fn begin_analysis(&mut self) {
        self.analysis = AnalysisState::Loading;
    }

    pub fn complete_analysis(&mut self, result: Result<String, CollabError>) {
        self.analysis = match result {
            Ok(text) if text.trim().is_empty() => {
                AnalysisState::Ready("No analysis available.".to_string())
            }
            Ok(text) => AnalysisState::Ready(text),
            Err(err) => {
                warn!(%err, "analysis failed");
                AnalysisState::Failed("Error generating analysis.".to_string())
            }
        };
    }

    pub fn dismiss_analysis(&mut self) {
        self.analysis = AnalysisState::Idle;
    }

    // ------------------------------------------------------------------
    // Style commands
    // ------------------------------------------------------------------

    pub fn toggle_style(&mut self, toggle: StyleToggle) {
        let selection = self.controller.selection().to_vec();
        if selection.is_empty() {
            return;
        }
        for id in selection {
            if let Some(node) = self.forest.get_mut(id) {
                match toggle {
                    StyleToggle::Bold => node.styles.bold = !node.styles.bold,
                    StyleToggle::Italic => node.styles.italic = !node.styles.italic,
                    StyleToggle::Underline => node.styles.underline = !node.styles.underline,
                }
            }
        }
        self.commit(true);
    }

    pub fn change_font_size(&mut self, delta: f64) {
        let selection = self.controller.selection().to_vec();
        if selection.is_empty() {
            return;
        }
        for id in selection {
            if let Some(node) = self.forest.get_mut(id) {
                node.styles.scale = (node.styles.scale + delta).max(MIN_FONT_SCALE);
            }
        }
        self.commit(true);
    }

    /// Toggle a highlight color. Applying the color every affected node
    /// already carries clears it instead. A same-word selection styles
    /// only the primary, so clicking "love" and highlighting does not
    /// paint every occurrence.
    pub fn set_highlight(&mut self, color: HighlightColor) {
        let selection = self.controller.selection().to_vec();
        if selection.is_empty() {
            return;
        }
        let words: Vec<String> = selection
            .iter()
            .filter_map(|id| self.forest.get(*id))
            .map(|n| normalize_word(&n.text))
            .collect();
        let same_word = !words.is_empty() && words.iter().all(|w| *w == words[0]);
        let targets: Vec<NodeId> = if same_word { vec![selection[0]] } else { selection };

        let already_this_color = targets.iter().all(|id| {
            self.forest
                .get(*id)
                .map(|n| n.styles.highlight == Some(color))
                .unwrap_or(false)
        });
        let next = if already_this_color { None } else { Some(color) };
        if !already_this_color {
            self.last_highlight = color;
        }

        for id in targets {
            if let Some(node) = self.forest.get_mut(id) {
                node.styles.highlight = next;
            }
        }
        self.commit(true);
    }

    pub fn clear_formatting(&mut self) {
        let selection = self.controller.selection().to_vec();
        if selection.is_empty() {
            return;
        }
        for id in selection {
            if let Some(node) = self.forest.get_mut(id) {
                node.styles = Default::default();
            }
        }
        self.commit(true);
    }

    /// Explicitly clear the parent edge of every selected node.
    pub fn detach_selection(&mut self) {
        let selection = self.controller.selection().to_vec();
        if selection.is_empty() {
            return;
        }
        for id in selection {
            self.forest.detach(id);
        }
        self.commit(true);
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    pub fn undo(&mut self) {
        if let Some(forest) = self.history.undo() {
            self.forest = forest;
        }
    }

    pub fn redo(&mut self) {
        if let Some(forest) = self.history.redo() {
            self.forest = forest;
        }
    }

    // ------------------------------------------------------------------
    // Modes and view
    // ------------------------------------------------------------------

    /// Switch between book and canvas. Current positions are cached under
    /// the outgoing mode; the incoming mode rehydrates its cache (then
    /// resolves) or derives a fresh layout. Not recorded in history.
    pub fn toggle_view_mode(&mut self) {
        let current = self.view_mode;
        let next = current.toggled();

        let positions: HashMap<NodeId, Point> = self
            .forest
            .nodes()
            .iter()
            .map(|n| (n.id, Point::new(n.x, n.y)))
            .collect();
        self.position_cache.insert(current, positions);

        let cached = self.position_cache.get(&next).cloned().unwrap_or_default();
        if cached.is_empty() {
            flow_layout(self.forest.nodes_mut(), next, &self.viewport);
        } else {
            for node in self.forest.nodes_mut() {
                if let Some(cached_position) = cached.get(&node.id) {
                    node.x = cached_position.x;
                    node.y = cached_position.y;
                }
            }
            let viewport = self.viewport;
            self.forest
                .rewrite(|nodes| resolve_overlaps(nodes, next, &viewport));
        }

        self.view_mode = next;
        if next == ViewMode::Book {
            self.view.reset();
        }
        debug!(mode = next.as_str(), "view mode switched");
    }

    pub fn cycle_connection_mode(&mut self) {
        self.connection_mode = self.connection_mode.cycled();
    }

    pub fn set_multi_select(&mut self, enabled: bool) {
        self.multi_select = enabled;
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn zoom_in(&mut self) {
        self.view.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.view.zoom_out();
    }

    pub fn reset_view(&mut self) {
        self.view.reset();
    }

    // ------------------------------------------------------------------
    // Pointer events
    // ------------------------------------------------------------------

    fn pointer_input(&self, pointer_id: i32, client: Point) -> PointerInput {
        PointerInput {
            pointer_id,
            client,
            canvas: self.view.to_canvas(client, self.view_mode, &self.viewport),
        }
    }

    pub fn pointer_down(
        &mut self,
        target: Option<NodeId>,
        pointer_id: i32,
        client: Point,
        shift: bool,
    ) {
        // A stale id from the host (node removed mid-gesture) counts as
        // background.
        let target = target.filter(|id| self.forest.contains(*id));
        let input = self.pointer_input(pointer_id, client);
        let multi = self.multi_select || shift;
        self.controller
            .pointer_down(&self.forest, target, input, multi, &self.view);
    }

    pub fn pointer_move(&mut self, pointer_id: i32, client: Point) {
        let input = self.pointer_input(pointer_id, client);
        self.controller.pointer_move(
            &mut self.forest,
            input,
            &mut self.view,
            &self.viewport,
            self.view_mode,
            self.connection_mode,
        );
    }

    pub fn pointer_up(&mut self, pointer_id: i32, client: Point) {
        let input = self.pointer_input(pointer_id, client);
        let outcome = self
            .controller
            .pointer_up(&mut self.forest, input, self.view_mode);

        match outcome {
            UpOutcome::None => {}
            UpOutcome::KeepPositions => self.commit(false),
            UpOutcome::Nested { moved_roots } => {
                close_gaps(self.forest.nodes_mut(), &moved_roots, self.view_mode);
                self.commit(true);
            }
        }
    }

    /// The pointer leaving the surface ends the gesture like a release.
    pub fn pointer_leave(&mut self, pointer_id: i32, client: Point) {
        self.pointer_up(pointer_id, client);
    }

    /// Marquee rectangle of an active box-select, for the host to draw.
    pub fn marquee(&self) -> Option<(Point, Point)> {
        match self.controller.drag() {
            Some(DragSession::BoxSelect(b)) => Some((b.start, b.current)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Relation;

    fn session_with(text: &str) -> Session {
        let mut session = Session::new(Viewport::new(1400.0, 900.0));
        session.load_text("Test 1:1", text);
        session
    }

    fn select(session: &mut Session, id: NodeId) {
        let node = session.forest().get(id).unwrap();
        let point = Point::new(node.x, node.y);
        session.pointer_down(Some(id), 1, point, false);
        session.pointer_up(1, point);
    }

    #[test]
    fn test_new_session_has_default_passage() {
        let session = Session::new(Viewport::new(1400.0, 900.0));
        assert_eq!(session.reference(), DEFAULT_PASSAGE);
        assert!(!session.forest().is_empty());
        // Initial load is the first history entry; nothing to undo yet.
        assert!(!session.can_undo());
    }

    #[test]
    fn test_style_toggle_records_history() {
        let mut session = session_with("peace with God");
        select(&mut session, NodeId(0));

        session.toggle_style(StyleToggle::Bold);
        assert!(session.forest().get(NodeId(0)).unwrap().styles.bold);

        session.undo();
        assert!(!session.forest().get(NodeId(0)).unwrap().styles.bold);
        session.redo();
        assert!(session.forest().get(NodeId(0)).unwrap().styles.bold);
    }

    #[test]
    fn test_font_scale_floor() {
        let mut session = session_with("peace");
        select(&mut session, NodeId(0));
        for _ in 0..20 {
            session.change_font_size(-FONT_SCALE_STEP);
        }
        let scale = session.forest().get(NodeId(0)).unwrap().styles.scale;
        assert!((scale - MIN_FONT_SCALE).abs() < 1e-9);
    }

    #[test]
    fn test_highlight_toggles_off_and_tracks_last() {
        let mut session = session_with("peace with God");
        select(&mut session, NodeId(1));

        session.set_highlight(HighlightColor::Teal);
        assert_eq!(
            session.forest().get(NodeId(1)).unwrap().styles.highlight,
            Some(HighlightColor::Teal)
        );
        assert_eq!(session.last_highlight(), HighlightColor::Teal);

        // Same color again clears, and does not update last-used.
        session.set_highlight(HighlightColor::Teal);
        assert_eq!(session.forest().get(NodeId(1)).unwrap().styles.highlight, None);
        assert_eq!(session.last_highlight(), HighlightColor::Teal);
    }

    #[test]
    fn test_same_word_highlight_hits_primary_only() {
        let mut session = session_with("love sees love");
        select(&mut session, NodeId(0));
        // Selection is both occurrences of "love".
        assert_eq!(session.controller().selection().len(), 2);

        session.set_highlight(HighlightColor::Yellow);
        assert_eq!(
            session.forest().get(NodeId(0)).unwrap().styles.highlight,
            Some(HighlightColor::Yellow)
        );
        assert_eq!(session.forest().get(NodeId(2)).unwrap().styles.highlight, None);
    }

    #[test]
    fn test_detach_clears_edge_and_records() {
        let mut session = session_with("God shows his");
        session.forest.set_parent(NodeId(1), NodeId(0), Relation::What);
        session.commit(true);

        select(&mut session, NodeId(1));
        session.detach_selection();

        let node = session.forest().get(NodeId(1)).unwrap();
        assert_eq!(node.parent_id, None);
        assert_eq!(node.relation, None);

        session.undo();
        assert_eq!(
            session.forest().get(NodeId(1)).unwrap().relation,
            Some(Relation::What)
        );
    }

    #[test]
    fn test_clear_formatting_resets_styles() {
        let mut session = session_with("peace");
        select(&mut session, NodeId(0));
        session.toggle_style(StyleToggle::Bold);
        session.set_highlight(HighlightColor::Red);
        session.change_font_size(0.3);

        session.clear_formatting();
        let styles = &session.forest().get(NodeId(0)).unwrap().styles;
        assert!(!styles.bold && styles.highlight.is_none());
        assert!((styles.scale - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_view_mode_round_trip_restores_positions() {
        let mut session = session_with("suffering produces endurance and character");
        let book_positions: Vec<(f64, f64)> = session
            .forest()
            .nodes()
            .iter()
            .map(|n| (n.x, n.y))
            .collect();

        session.toggle_view_mode();
        assert_eq!(session.view_mode(), ViewMode::Canvas);
        let canvas_positions: Vec<(f64, f64)> =
            session.forest().nodes().iter().map(|n| (n.x, n.y)).collect();
        assert_ne!(book_positions, canvas_positions);

        // Switching back rehydrates the cached book layout; the already
        // resolved positions re-resolve to themselves.
        session.toggle_view_mode();
        assert_eq!(session.view_mode(), ViewMode::Book);
        for (node, expected) in session.forest().nodes().iter().zip(&book_positions) {
            assert!((node.x - expected.0).abs() < 1e-6);
            assert!((node.y - expected.1).abs() < 1e-6);
        }
    }

    #[test]
    fn test_mode_switch_is_not_recorded() {
        let mut session = session_with("peace with God");
        let entries = session.history.len();
        session.toggle_view_mode();
        session.toggle_view_mode();
        assert_eq!(session.history.len(), entries);
    }

    #[test]
    fn test_passage_failure_leaves_forest_unchanged() {
        let mut session = session_with("peace with God");
        let before = session.forest().clone();

        session.begin_passage_load();
        session.complete_passage_load("Job 1:1", Err(CollabError::NotFound));

        assert_eq!(session.forest(), &before);
        assert_eq!(
            session.passage_state(),
            &PassageState::Failed("passage not found".to_string())
        );
        // The reference still points at the passage on screen.
        assert_eq!(session.reference(), "Test 1:1");
    }

    #[test]
    fn test_passage_success_replaces_forest() {
        let mut session = session_with("peace with God");
        session.begin_passage_load();
        session.complete_passage_load("John 11:35", Ok("Jesus wept.".to_string()));

        assert_eq!(session.reference(), "John 11:35");
        assert_eq!(session.forest().len(), 2);
        assert_eq!(session.passage_state(), &PassageState::Idle);
        assert!(session.controller().selection().is_empty());
    }

    #[test]
    fn test_offline_passage_matches_default_only() {
        assert_eq!(Session::offline_passage("Romans 5:1-10"), Some(DEFAULT_TEXT));
        assert_eq!(Session::offline_passage("ROMANS 5:6"), Some(DEFAULT_TEXT));
        assert_eq!(Session::offline_passage("John 3:16"), None);
    }

    #[test]
    fn test_analysis_states() {
        let mut session = session_with("peace");
        session.begin_analysis();
        assert_eq!(session.analysis_state(), &AnalysisState::Loading);

        session.complete_analysis(Ok("   ".to_string()));
        assert_eq!(
            session.analysis_state(),
            &AnalysisState::Ready("No analysis available.".to_string())
        );

        session.complete_analysis(Err(CollabError::RateLimited));
        assert_eq!(
            session.analysis_state(),
            &AnalysisState::Failed("Error generating analysis.".to_string())
        );
        session.dismiss_analysis();
        assert_eq!(session.analysis_state(), &AnalysisState::Idle);
    }

    #[test]
    fn test_prompts_use_reading_and_selection_order() {
        let mut session = session_with("God shows love");
        let prompt = session.insights_prompt();
        assert!(prompt.contains("\"God shows love\""));

        select(&mut session, NodeId(2));
        let study = session.word_study_prompt().unwrap();
        assert!(study.contains("word study on \"love\""));
        assert!(study.contains("in context: \"God shows love\""));

        session.controller.clear_selection();
        assert!(session.word_study_prompt().is_none());
    }

    #[test]
    fn test_drag_commit_appends_single_history_entry() {
        let mut session = session_with("God shows his love for us");
        let dragged = session.forest().get(NodeId(3)).unwrap().clone();
        let start = Point::new(dragged.x, dragged.y);

        let entries = session.history.len();
        session.pointer_down(Some(dragged.id), 1, start, false);
        session.pointer_move(1, Point::new(start.x, start.y + 400.0));
        // Transient motion records nothing.
        assert_eq!(session.history.len(), entries);
        session.pointer_up(1, Point::new(start.x, start.y + 400.0));

        // Exactly one entry for the release; undo restores the layout.
        assert_eq!(session.history.len(), entries + 1);
        session.undo();
        let restored = session.forest().get(NodeId(3)).unwrap();
        assert_eq!(restored.y, dragged.y);
    }
}
