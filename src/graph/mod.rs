//! Family data model and parent/child topology.
//!
//! Relatives and relationships arrive already fetched and already filtered
//! for soft deletion. The `FamilyGraph` wraps petgraph's StableGraph and
//! holds only the parent-like edges the layout needs.

mod family;
mod relationship;
mod relative;

pub use family::FamilyGraph;
pub use relationship::{FALLBACK_COLOR, Relationship, RelationshipId, RelationshipType};
pub use relative::{Gender, Relative, RelativeId};
