//! The realized tab/layout tree.
//!
//! Structure lives in a [`Tree`] arena; the payload of each node and the
//! active tab of each tab layout are components kept in sync through the
//! tree's observer hooks.

mod build;
mod mutate;
mod navigate;

use slotmap::SecondaryMap;

pub use self::mutate::{DropOptions, DropOutcome};
use crate::common::collections::HashMap;
use crate::layout_engine::graph::{Direction, NodeKind};
use crate::layout_engine::template::{LayoutTemplate, NodeTemplate, TabData, TabTemplate};
use crate::model::active::{Active, TreeEvent};
use crate::model::tree::{self, NodeId, NodeMap, Tree};

#[derive(Debug, Clone, PartialEq)]
pub struct Tab {
    pub id: String,
    pub title: String,
    pub data: TabData,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub id: String,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Tab(Tab),
    Layout(Layout),
}

impl NodeData {
    pub fn id(&self) -> &str {
        match self {
            NodeData::Tab(tab) => &tab.id,
            NodeData::Layout(layout) => &layout.id,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::Tab(_) => NodeKind::Tab,
            NodeData::Layout(_) => NodeKind::Layout,
        }
    }

    fn set_id(&mut self, id: String) {
        match self {
            NodeData::Tab(tab) => tab.id = id,
            NodeData::Layout(layout) => layout.id = id,
        }
    }
}

/// A tree of layouts whose leaves are tabs.
///
/// The root is always a layout and keeps its identity for the lifetime of the
/// tree, even when it ends up with no children.
pub struct LayoutTree {
    tree: Tree<Components>,
    root: NodeId,
}

impl LayoutTree {
    pub fn root(&self) -> NodeId { self.root }

    pub fn map(&self) -> &NodeMap { &self.tree.map }

    pub fn node(&self, node: NodeId) -> Option<&NodeData> { self.tree.data.nodes.get(node) }

    pub fn tab(&self, node: NodeId) -> Option<&Tab> {
        match self.node(node)? {
            NodeData::Tab(tab) => Some(tab),
            NodeData::Layout(_) => None,
        }
    }

    pub fn layout(&self, node: NodeId) -> Option<&Layout> {
        match self.node(node)? {
            NodeData::Layout(layout) => Some(layout),
            NodeData::Tab(_) => None,
        }
    }

    pub fn id_of(&self, node: NodeId) -> Option<&str> { self.node(node).map(NodeData::id) }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> { node.parent(self.map()) }

    pub fn children(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        node.children(self.map())
    }

    pub fn direction(&self, layout: NodeId) -> Option<Direction> {
        self.layout(layout).map(|l| l.direction)
    }

    /// The active child of a tab layout.
    pub fn active(&self, layout: NodeId) -> Option<NodeId> {
        self.tree.data.active.get(self.map(), layout)
    }

    pub fn active_tab(&self, layout: NodeId) -> Option<&Tab> {
        self.active(layout).and_then(|node| self.tab(node))
    }

    /// Number of nodes reachable from the root, the root included.
    pub fn len(&self) -> usize { self.root.traverse_preorder(self.map()).count() }

    pub fn is_empty(&self) -> bool { self.root.is_empty(self.map()) }

    /// Every tab in document order.
    pub fn tabs(&self) -> impl Iterator<Item = &Tab> + '_ {
        self.root.traverse_preorder(self.map()).filter_map(|node| self.tab(node))
    }

    /// Captures the current shape as a template that rebuilds an equivalent
    /// tree, ids and active tabs included.
    pub fn snapshot(&self) -> LayoutTemplate { self.snapshot_layout(self.root) }

    fn snapshot_layout(&self, node: NodeId) -> LayoutTemplate {
        let children = self
            .children(node)
            .filter_map(|child| match self.node(child)? {
                NodeData::Tab(tab) => Some(NodeTemplate::Tab(TabTemplate {
                    id: Some(tab.id.clone()),
                    title: tab.title.clone(),
                    data: tab.data.clone(),
                })),
                NodeData::Layout(_) => Some(NodeTemplate::Layout(self.snapshot_layout(child))),
            })
            .collect();
        LayoutTemplate {
            id: self.id_of(node).map(str::to_owned),
            direction: self.direction(node),
            active: self.active_tab(node).map(|tab| tab.id.clone()),
            children,
        }
    }

    pub fn draw_tree(&self) -> String {
        let tree = self.ascii_tree(self.root);
        let mut out = String::new();
        // Writing into a String is infallible.
        let _ = ascii_tree::write_tree(&mut out, &tree);
        out
    }

    fn ascii_tree(&self, node: NodeId) -> ascii_tree::Tree {
        let desc = match self.node(node) {
            Some(NodeData::Tab(tab)) => {
                let status = match self.parent(node) {
                    Some(parent) if self.active(parent) == Some(node) => "☒",
                    _ => "☐",
                };
                format!("{status} tab {} {:?}", tab.id, tab.title)
            }
            Some(NodeData::Layout(layout)) => {
                format!("layout {} ({})", layout.id, layout.direction)
            }
            None => format!("{node:?}"),
        };
        let children: Vec<_> = self.children(node).map(|c| self.ascii_tree(c)).collect();
        if children.is_empty() {
            ascii_tree::Tree::Leaf(vec![desc])
        } else {
            ascii_tree::Tree::Node(desc, children)
        }
    }

    /// Readable name of a node for error messages.
    fn label(&self, node: NodeId) -> String {
        self.id_of(node).map_or_else(|| format!("{node:?}"), str::to_owned)
    }

    fn set_direction(&mut self, layout: NodeId, direction: Direction) {
        if let Some(NodeData::Layout(data)) = self.tree.data.nodes.get_mut(layout) {
            data.direction = direction;
        }
    }
}

#[derive(Default)]
struct Components {
    nodes: Nodes,
    active: Active,
}

impl tree::Observer for Components {
    fn added_to_forest(&mut self, map: &NodeMap, node: NodeId) {
        self.dispatch_event(map, TreeEvent::AddedToForest(node))
    }

    fn added_to_parent(&mut self, map: &NodeMap, node: NodeId) {
        self.dispatch_event(map, TreeEvent::AddedToParent(node))
    }

    fn removing_from_parent(&mut self, map: &NodeMap, node: NodeId) {
        self.dispatch_event(map, TreeEvent::RemovingFromParent(node))
    }

    fn removed_from_forest(&mut self, map: &NodeMap, node: NodeId) {
        self.dispatch_event(map, TreeEvent::RemovedFromForest(node))
    }
}

impl Components {
    fn dispatch_event(&mut self, map: &NodeMap, event: TreeEvent) {
        let nodes = &self.nodes;
        self.active.handle_event(map, event, |node| nodes.is_tab(node));
        self.nodes.handle_event(map, event);
    }
}

/// Node payloads plus an index from id to node.
#[derive(Default)]
struct Nodes {
    data: SecondaryMap<NodeId, NodeData>,
    by_id: HashMap<String, NodeId>,
}

impl Nodes {
    fn get(&self, node: NodeId) -> Option<&NodeData> { self.data.get(node) }

    fn get_mut(&mut self, node: NodeId) -> Option<&mut NodeData> { self.data.get_mut(node) }

    fn lookup(&self, id: &str) -> Option<NodeId> { self.by_id.get(id).copied() }

    fn is_tab(&self, node: NodeId) -> bool { matches!(self.data.get(node), Some(NodeData::Tab(_))) }

    fn set(&mut self, node: NodeId, data: NodeData) {
        let id = data.id().to_owned();
        let existing = self.data.insert(node, data);
        assert!(existing.is_none(), "Attempted to overwrite data for node {node:?}");
        let previous = self.by_id.insert(id, node);
        debug_assert!(previous.is_none(), "id index already held {previous:?}");
    }

    fn rename(&mut self, node: NodeId, id: String) {
        let Some(data) = self.data.get_mut(node) else { return };
        if self.by_id.get(data.id()) == Some(&node) {
            self.by_id.remove(data.id());
        }
        self.by_id.insert(id.clone(), node);
        data.set_id(id);
    }

    fn handle_event(&mut self, map: &NodeMap, event: TreeEvent) {
        match event {
            TreeEvent::AddedToForest(_) | TreeEvent::RemovingFromParent(_) => (),
            TreeEvent::AddedToParent(node) => debug_assert!(
                !node.parent(map).is_some_and(|parent| self.is_tab(parent)),
                "Tab nodes are not allowed to have children: {node:?}"
            ),
            TreeEvent::RemovedFromForest(node) => {
                if let Some(data) = self.data.remove(node)
                    && self.by_id.get(data.id()) == Some(&node)
                {
                    self.by_id.remove(data.id());
                }
            }
        }
    }
}
