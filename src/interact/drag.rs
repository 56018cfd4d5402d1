// Transient drag-session state, alive only between pointer-down and
// pointer-up. Ownership of a session is exclusive to the pointer id that
// started it; events carrying any other id are ignored.

use std::collections::{HashMap, HashSet};

use crate::geometry::Point;
use crate::model::NodeId;

#[derive(Debug, Clone)]
pub enum DragSession {
    Node(NodeDrag),
    BoxSelect(BoxDrag),
    Pan(PanDrag),
}

impl DragSession {
    pub fn pointer_id(&self) -> i32 {
        match self {
            DragSession::Node(d) => d.pointer_id,
            DragSession::BoxSelect(d) => d.pointer_id,
            DragSession::Pan(d) => d.pointer_id,
        }
    }
}

/// A group translation in progress.
#[derive(Debug, Clone)]
pub struct NodeDrag {
    pub pointer_id: i32,
    /// The node the pointer went down on; leads hover detection and
    /// same-word narrowing.
    pub main: NodeId,
    /// Canvas position at pointer-down.
    pub start: Point,
    /// Selection plus every transitive descendant of it.
    pub ids_to_move: HashSet<NodeId>,
    /// Starting position of each moved node, for revert and narrowing.
    pub initial: HashMap<NodeId, Point>,
    /// Set once displacement leaves the dead zone; distinguishes a drag
    /// from a click.
    pub has_moved: bool,
    /// Click on a multi-selected node: drop it from the selection on
    /// release unless a drag happens.
    pub pending_deselect: bool,
    /// Click on an already-selected node without modifier: clear the
    /// whole selection on release unless a drag happens.
    pub pending_clear_selection: bool,
}

/// Marquee selection in progress.
#[derive(Debug, Clone)]
pub struct BoxDrag {
    pub pointer_id: i32,
    pub start: Point,
    pub current: Point,
}

/// Canvas pan in progress; tracked in client coordinates because the pan
/// itself changes the canvas transform.
#[derive(Debug, Clone)]
pub struct PanDrag {
    pub pointer_id: i32,
    pub start_client: Point,
    pub initial_offset: Point,
}
