pub mod engine;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod layout_tree;
pub mod template;

pub use engine::{EngineOptions, LayoutAction, LayoutChange, LayoutCommand, LayoutEngine};
pub use error::{ErrorCategory, TreeError};
pub use geometry::{Point, Rect, drop_side};
pub use graph::{Direction, NodeKind, Side};
pub use layout_tree::{DropOptions, DropOutcome, LayoutTree, NodeData};
pub use template::{DropPayload, LayoutTemplate, NodeTemplate, TabData, TabTemplate};
