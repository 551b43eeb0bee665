use super::{LayoutTree, NodeData};
use crate::layout_engine::error::{Result, TreeError};
use crate::layout_engine::graph::NodeKind;
use crate::model::tree::NodeId;

impl LayoutTree {
    /// What `layout` holds. A layout with no children counts as a tab layout.
    pub fn kind_of(&self, layout: NodeId) -> Result<NodeKind> {
        let mut kinds =
            self.children(layout).filter_map(|child| self.node(child)).map(NodeData::kind);
        let Some(first) = kinds.next() else {
            return Ok(NodeKind::Tab);
        };
        if kinds.all(|kind| kind == first) {
            Ok(first)
        } else {
            Err(TreeError::MixedKinds { layout: self.label(layout) })
        }
    }

    /// Depth-first search for a tab anywhere below `layout`.
    pub fn find_tab(&self, id: &str, layout: NodeId) -> Option<NodeId> {
        self.children(layout).find_map(|child| match self.node(child)? {
            NodeData::Tab(tab) if tab.id == id => Some(child),
            NodeData::Tab(_) => None,
            NodeData::Layout(_) => self.find_tab(id, child),
        })
    }

    /// Searches `start` and everything below it for a layout with `id`.
    pub fn find_layout(&self, id: &str, start: NodeId) -> Option<NodeId> {
        if self.layout(start).is_some_and(|layout| layout.id == id) {
            return Some(start);
        }
        self.children(start)
            .filter(|&child| self.layout(child).is_some())
            .find_map(|child| self.find_layout(id, child))
    }

    pub fn get_root(&self, node: NodeId) -> NodeId {
        node.ancestors(self.map()).last().unwrap_or(node)
    }

    /// Layouts above `node`, nearest first. The root is always last.
    pub fn parents_hierarchy(&self, node: NodeId) -> Vec<NodeId> {
        node.ancestors(self.map()).skip(1).collect()
    }

    /// Follows `path`, a list of layout ids starting below `root`, and returns
    /// the child with `id` at its end.
    ///
    /// A segment that does not resolve is a [`TreeError::PathNotFound`]; a
    /// missing `id` at the end of a valid path is a [`TreeError::NotFound`].
    pub fn find_ui_by_path<S: AsRef<str>>(
        &self,
        id: &str,
        path: &[S],
        root: NodeId,
    ) -> Result<NodeId> {
        let incorrect = || TreeError::PathNotFound {
            path: path.iter().map(AsRef::as_ref).collect::<Vec<_>>().join("/"),
        };
        let mut current = root;
        for segment in path {
            current = self
                .children(current)
                .find(|&child| {
                    self.layout(child).is_some_and(|layout| layout.id == segment.as_ref())
                })
                .ok_or_else(incorrect)?;
        }
        self.children(current)
            .find(|&child| self.id_of(child) == Some(id))
            .ok_or_else(|| TreeError::not_found(id, format!("layout {}", self.label(current))))
    }

    /// The tab with `id` among the direct children of `layout`.
    pub fn get_tab(&self, id: &str, layout: NodeId) -> Result<NodeId> {
        self.children(layout)
            .find(|&child| self.tab(child).is_some_and(|tab| tab.id == id))
            .ok_or_else(|| TreeError::not_found(id, format!("layout {}", self.label(layout))))
    }

    /// Any node by id.
    pub fn lookup(&self, id: &str) -> Option<NodeId> {
        self.tree.data.nodes.lookup(id).filter(|&node| self.get_root(node) == self.root)
    }

    /// Number of layouts from the root down to `node`. The root sits at 1 and
    /// a tab shares the depth of its layout.
    pub fn depth(&self, node: NodeId) -> usize {
        node.ancestors(self.map()).filter(|&n| self.layout(n).is_some()).count()
    }

    /// Depth of the deepest layout in the subtree of `layout`.
    pub(super) fn subtree_depth(&self, layout: NodeId) -> usize {
        let base = self.depth(layout);
        layout
            .traverse_preorder(self.map())
            .filter(|&n| self.layout(n).is_some())
            .map(|n| base + n.ancestors(self.map()).take_while(|&a| a != layout).count())
            .max()
            .unwrap_or(base)
    }

    pub(super) fn expect_layout(&self, layout: NodeId) -> Result<()> {
        match self.layout(layout) {
            Some(_) if self.get_root(layout) == self.root => Ok(()),
            _ => Err(TreeError::not_found(&self.label(layout), "tree")),
        }
    }

    /// Ensures `layout` exists and holds tabs (or nothing).
    pub(super) fn expect_tab_layout(&self, layout: NodeId, operation: &'static str) -> Result<()> {
        self.expect_layout(layout)?;
        match self.kind_of(layout)? {
            NodeKind::Tab => Ok(()),
            NodeKind::Layout => {
                Err(TreeError::NotTabLayout { layout: self.label(layout), operation })
            }
        }
    }
}
