//! VerseAxis core: the layout and interaction engine behind the passage
//! diagramming app.
//!
//! The crate is a pure, deterministic core the React host drives through
//! `wasm.rs`: text becomes a forest of word nodes, a greedy line-wrap
//! places them, pointer gestures select/drag/nest them, and row-based
//! normalization (overlap resolution + gap closing) keeps every edit
//! visually consistent. A bounded snapshot history backs undo/redo.

pub mod collab;
pub mod geometry;
pub mod history;
pub mod interact;
pub mod layout;
pub mod model;
pub mod output;
pub mod session;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use geometry::{ViewMode, Viewport};
pub use model::{Forest, Node, NodeId, Relation};
pub use session::Session;
