//! Spatial indexing for O(log n) card hit testing.
//!
//! This module provides an R-tree based index of card rectangles so that a
//! pointer press on the canvas can be resolved to the card under it.

mod rtree;

pub use rtree::{CardRect, SpatialIndex};
