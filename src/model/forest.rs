// Flat node storage for the annotation forest.
//
// Nodes live in one Vec in render order; parent/child relationships are
// derived by scanning `parent_id` rather than embedding owned child lists.
// That keeps snapshotting a plain serialize of the struct and makes cycles
// impossible to own, only to mis-reference (which is a programming error,
// asserted in debug builds).

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{Node, NodeId, Relation};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Forest {
    nodes: Vec<Node>,
    next_id: u32,
}

impl Forest {
    /// Build a forest from a text body, one node per whitespace-separated
    /// token. Positions are all zero until a layout pass runs.
    pub fn from_text(text: &str) -> Self {
        let mut forest = Forest::default();
        for word in text.split_whitespace() {
            let id = forest.allocate_id();
            forest.nodes.push(Node::new(id, word));
        }
        debug!(tokens = forest.nodes.len(), "forest created from text");
        forest
    }

    fn allocate_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Direct children of `id`, in storage order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| n.parent_id == Some(id))
            .map(|n| n.id)
            .collect()
    }

    /// Full descendant set of `id`: direct children first, then each
    /// child's subtree. Undefined on a forest containing cycles (an
    /// invariant violation that `set_parent` asserts against).
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let children = self.children(id);
        let mut out = children.clone();
        for child in children {
            out.extend(self.descendants(child));
        }
        out
    }

    /// Attach `id` under `parent` with the given relation. Returns false
    /// if either end is missing.
    pub fn set_parent(&mut self, id: NodeId, parent: NodeId, relation: Relation) -> bool {
        if !self.contains(parent) {
            return false;
        }
        debug_assert!(
            id != parent && !self.descendants(id).contains(&parent),
            "re-parenting {id} under {parent} would create a cycle",
        );
        match self.get_mut(id) {
            Some(node) => {
                node.parent_id = Some(parent);
                node.relation = Some(relation);
                true
            }
            None => false,
        }
    }

    /// Clear the parent edge of `id`. Returns false if the node is missing.
    pub fn detach(&mut self, id: NodeId) -> bool {
        match self.get_mut(id) {
            Some(node) => {
                node.parent_id = None;
                node.relation = None;
                true
            }
            None => false,
        }
    }

    /// Replace the node list through a transforming pass (layout
    /// resolution reorders nodes into row order, so the pass owns the Vec).
    pub fn rewrite<F>(&mut self, f: F)
    where
        F: FnOnce(Vec<Node>) -> Vec<Node>,
    {
        let nodes = std::mem::take(&mut self.nodes);
        self.nodes = f(nodes);
        self.debug_validate();
    }

    /// Nodes in reading order: top row first, left to right within a row.
    pub fn reading_order(&self) -> Vec<&Node> {
        let mut ordered: Vec<&Node> = self.nodes.iter().collect();
        ordered.sort_by(|a, b| {
            a.y.partial_cmp(&b.y)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
        });
        ordered
    }

    pub fn to_snapshot(&self) -> String {
        serde_json::to_string(self).expect("forest serialization cannot fail")
    }

    pub fn from_snapshot(snapshot: &str) -> Result<Forest, serde_json::Error> {
        serde_json::from_str(snapshot)
    }

    /// Forest edge invariants: relation iff parent, no dangling parents,
    /// no duplicate ids. Programming errors, not runtime-recoverable.
    fn debug_validate(&self) {
        #[cfg(debug_assertions)]
        for node in &self.nodes {
            debug_assert_eq!(
                node.parent_id.is_some(),
                node.relation.is_some(),
                "node {} has relation without parent or parent without relation",
                node.id,
            );
            if let Some(parent) = node.parent_id {
                debug_assert!(self.contains(parent), "node {} has dangling parent", node.id);
            }
            debug_assert_eq!(
                self.nodes.iter().filter(|n| n.id == node.id).count(),
                1,
                "duplicate node id {}",
                node.id,
            );
        }
    }
}
