//! Card layout for the family tree.
//!
//! The layout engine turns the filtered relatives into card positions: a
//! tidy tree over the parent-like edges gives the horizontal order, the
//! user-assigned generation gives the row, manual drags override both and a
//! final pass removes overlaps within each generation row.

mod collision;
mod engine;
mod hierarchy;
mod manual;
pub mod tidy_tree;

pub use collision::resolve_collisions;
pub use engine::{LayoutConfig, LayoutEngine, NodePosition};
pub use hierarchy::{LayoutTree, TreeNode, TreeRoot};
pub use manual::ManualPositions;
pub use tidy_tree::{TidyTreeConfig, TidyTreeLayout, TidyTreeResult};
