use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::{self, ViewMode};

/// Stable identifier for a node. Opaque to the host; allocated by the
/// forest and never reused within one forest's lifetime.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

// ============================================================================
// Relation registry - single source of truth for satellite categories
// ============================================================================

/// Semantic tag on a parent-child edge. The variant order is the zone
/// order: a drop target's width divides into six equal zones mapped
/// left-to-right onto these categories.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Who,
    What,
    When,
    Where,
    Why,
    How,
}

impl Relation {
    /// Zone order, left to right.
    pub const ALL: [Relation; 6] = [
        Relation::Who,
        Relation::What,
        Relation::When,
        Relation::Where,
        Relation::Why,
        Relation::How,
    ];

    /// The relation for a zone index; out-of-range indices clamp to the
    /// outermost zones.
    pub fn from_zone(index: usize) -> Relation {
        Self::ALL[index.min(Self::ALL.len() - 1)]
    }

    pub fn zone(self) -> usize {
        Self::ALL.iter().position(|r| *r == self).unwrap_or(0)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Relation::Who => "who",
            Relation::What => "what",
            Relation::When => "when",
            Relation::Where => "where",
            Relation::Why => "why",
            Relation::How => "how",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Relation::Who => "Who",
            Relation::What => "What",
            Relation::When => "When",
            Relation::Where => "Where",
            Relation::Why => "Why",
            Relation::How => "How",
        }
    }
}

/// Named highlight colors offered by the palette.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighlightColor {
    Yellow,
    Orange,
    Red,
    Green,
    Teal,
    Cyan,
    Blue,
    Indigo,
    Purple,
    Pink,
}

impl HighlightColor {
    pub fn as_str(self) -> &'static str {
        match self {
            HighlightColor::Yellow => "yellow",
            HighlightColor::Orange => "orange",
            HighlightColor::Red => "red",
            HighlightColor::Green => "green",
            HighlightColor::Teal => "teal",
            HighlightColor::Cyan => "cyan",
            HighlightColor::Blue => "blue",
            HighlightColor::Indigo => "indigo",
            HighlightColor::Purple => "purple",
            HighlightColor::Pink => "pink",
        }
    }

    pub fn from_str(s: &str) -> Option<HighlightColor> {
        match s {
            "yellow" => Some(HighlightColor::Yellow),
            "orange" => Some(HighlightColor::Orange),
            "red" => Some(HighlightColor::Red),
            "green" => Some(HighlightColor::Green),
            "teal" => Some(HighlightColor::Teal),
            "cyan" => Some(HighlightColor::Cyan),
            "blue" => Some(HighlightColor::Blue),
            "indigo" => Some(HighlightColor::Indigo),
            "purple" => Some(HighlightColor::Purple),
            "pink" => Some(HighlightColor::Pink),
            _ => None,
        }
    }
}

/// Per-node presentation flags. `scale` multiplies the estimated width
/// everywhere the layout algorithms look at it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Styles {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub highlight: Option<HighlightColor>,
    pub scale: f64,
}

impl Default for Styles {
    fn default() -> Self {
        Self {
            bold: false,
            italic: false,
            underline: false,
            highlight: None,
            scale: 1.0,
        }
    }
}

/// One word-unit with position, style, and an optional satellite edge.
///
/// `parent_id` is a weak reference into the same forest; ownership is not
/// implied and cycles are an invariant violation. `relation` is set iff
/// `parent_id` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub text: String,
    pub parent_id: Option<NodeId>,
    pub relation: Option<Relation>,
    pub styles: Styles,
    /// Center-of-node canvas coordinates.
    pub x: f64,
    pub y: f64,
    /// Reserved for subtree hiding; carried through snapshots but inert.
    pub collapsed: bool,
}

impl Node {
    pub fn new(id: NodeId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            parent_id: None,
            relation: None,
            styles: Styles::default(),
            x: 0.0,
            y: 0.0,
            collapsed: false,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Estimated width with the node's style scale applied.
    pub fn scaled_width(&self, mode: ViewMode) -> f64 {
        geometry::estimate_width(&self.text, mode) * self.styles.scale
    }
}

/// How satellite connections are presented. Only `Hidden` changes core
/// behavior: nested nodes stop being drop-target candidates (the host does
/// not render them), the rest differ purely in connector drawing.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionMode {
    Hidden,
    Tree,
    Direct,
    Step,
}

impl ConnectionMode {
    pub const ALL: [ConnectionMode; 4] = [
        ConnectionMode::Hidden,
        ConnectionMode::Tree,
        ConnectionMode::Direct,
        ConnectionMode::Step,
    ];

    pub fn cycled(self) -> ConnectionMode {
        let index = Self::ALL.iter().position(|m| *m == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionMode::Hidden => "hidden",
            ConnectionMode::Tree => "tree",
            ConnectionMode::Direct => "direct",
            ConnectionMode::Step => "step",
        }
    }
}

/// Normalized form used for same-word matching: lower-cased with
/// punctuation stripped, so "Love," and "love" compare equal.
pub fn normalize_word(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect()
}
