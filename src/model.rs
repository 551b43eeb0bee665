pub mod active;
pub mod id;
pub mod tree;

pub use active::Active;
pub use tree::{NodeId, NodeMap, Tree};
