//! Tabbed split layouts: a tree of layouts whose leaves are tabs, with the
//! drag-and-drop operations that reshape it.

pub mod common;
pub mod layout_engine;
pub mod model;
