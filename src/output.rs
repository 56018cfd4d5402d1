//! Output types for React frontend consumption.
//!
//! These structs are serialized to JSON and sent to the React frontend
//! for rendering the scene. They carry no behavior; everything here is a
//! projection of the live session.

use serde::Serialize;

use crate::model::Node;
use crate::session::{AnalysisState, PassageState, Session};

/// A rendered node ready for React to display
#[derive(Debug, Clone, Serialize)]
pub struct NodeView {
    pub id: u32,
    pub text: String,
    /// Center-of-node coordinates.
    pub x: f64,
    pub y: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<u32>,
    /// Relation id ("who".."how"), present iff `parent` is.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relation: Option<&'static str>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight: Option<&'static str>,
    pub scale: f64,
    /// Transitive descendant count, for the badge.
    pub descendants: usize,
    pub selected: bool,
    /// First in the selection: authoritative styling target.
    pub primary: bool,
    /// Part of the active drag's moving set.
    pub moving: bool,
    /// Current drop-target candidate.
    pub hover: bool,
}

/// Marquee rectangle of an in-progress box selection
#[derive(Debug, Clone, Serialize)]
pub struct MarqueeView {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// Status of the two external collaborators
#[derive(Debug, Clone, Serialize)]
pub struct StatusView {
    pub loading: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The combined output sent to React
#[derive(Debug, Clone, Serialize)]
pub struct SceneOutput {
    pub reference: String,
    pub view_mode: &'static str,
    pub connection_mode: &'static str,
    pub multi_select: bool,
    pub offset_x: f64,
    pub offset_y: f64,
    pub scale: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<NodeView>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub selection: Vec<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hover_target: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_relation: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marquee: Option<MarqueeView>,
    pub can_undo: bool,
    pub can_redo: bool,
    pub passage: StatusView,
    pub analysis: StatusView,
}

impl SceneOutput {
    pub fn from_session(session: &Session) -> Self {
        let controller = session.controller();
        let forest = session.forest();
        let primary = controller.primary();

        let nodes = forest
            .nodes()
            .iter()
            .map(|node: &Node| NodeView {
                id: node.id.0,
                text: node.text.clone(),
                x: node.x,
                y: node.y,
                parent: node.parent_id.map(|p| p.0),
                relation: node.relation.map(|r| r.as_str()),
                bold: node.styles.bold,
                italic: node.styles.italic,
                underline: node.styles.underline,
                highlight: node.styles.highlight.map(|h| h.as_str()),
                scale: node.styles.scale,
                descendants: forest.descendants(node.id).len(),
                selected: controller.selection().contains(&node.id),
                primary: primary == Some(node.id),
                moving: controller.is_moving(node.id),
                hover: controller.hover_target() == Some(node.id),
            })
            .collect();

        let marquee = session.marquee().map(|(start, current)| MarqueeView {
            x: start.x.min(current.x),
            y: start.y.min(current.y),
            w: (current.x - start.x).abs(),
            h: (current.y - start.y).abs(),
        });

        let passage = match session.passage_state() {
            PassageState::Idle => StatusView { loading: false, text: None, error: None },
            PassageState::Loading => StatusView { loading: true, text: None, error: None },
            PassageState::Failed(message) => StatusView {
                loading: false,
                text: None,
                error: Some(message.clone()),
            },
        };
        let analysis = match session.analysis_state() {
            AnalysisState::Idle => StatusView { loading: false, text: None, error: None },
            AnalysisState::Loading => StatusView { loading: true, text: None, error: None },
            AnalysisState::Ready(text) => StatusView {
                loading: false,
                text: Some(text.clone()),
                error: None,
            },
            AnalysisState::Failed(message) => StatusView {
                loading: false,
                text: None,
                error: Some(message.clone()),
            },
        };

        SceneOutput {
            reference: session.reference().to_string(),
            view_mode: session.view_mode().as_str(),
            connection_mode: session.connection_mode().as_str(),
            multi_select: session.multi_select(),
            offset_x: session.view().offset.x,
            offset_y: session.view().offset.y,
            scale: session.view().scale,
            nodes,
            selection: controller.selection().iter().map(|id| id.0).collect(),
            hover_target: controller.hover_target().map(|id| id.0),
            pending_relation: controller.pending_relation().map(|r| r.as_str()),
            marquee,
            can_undo: session.can_undo(),
            can_redo: session.can_redo(),
            passage,
            analysis,
        }
    }
}
