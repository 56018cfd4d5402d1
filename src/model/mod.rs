pub mod forest;
pub mod types;

pub use forest::Forest;
pub use types::{
    ConnectionMode, HighlightColor, Node, NodeId, Relation, Styles, normalize_word,
};
