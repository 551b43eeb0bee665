use tracing::{debug, instrument};

use super::{Components, Layout, LayoutTree, NodeData, Tab};
use crate::common::collections::HashSet;
use crate::layout_engine::error::{Result, TreeError};
use crate::layout_engine::graph::Direction;
use crate::layout_engine::template::{LayoutTemplate, NodeTemplate, TabTemplate};
use crate::model::id::fresh_id;
use crate::model::tree::{NodeId, Tree, UnattachedNode};

impl LayoutTree {
    /// Builds a tree whose root is the layout described by `template`.
    ///
    /// The whole template is checked before anything is created: every layout
    /// must hold one or more tabs or two or more layouts, and explicit ids must
    /// be unique. Only the root may be empty.
    #[instrument(level = "debug", skip_all, fields(root = ?template.id))]
    pub fn build(template: &LayoutTemplate) -> Result<LayoutTree> {
        validate_layout(template, true, &mut HashSet::default(), &|_| false)?;
        let mut tree = Tree::with_observer(Components::default());
        let root = materialize_layout(&mut tree, template);
        let tree = LayoutTree { tree, root };
        debug!(nodes = tree.len(), "built layout tree");
        Ok(tree)
    }

    /// Checks that `template` could be materialized into this tree.
    pub fn validate(&self, template: &LayoutTemplate) -> Result<()> {
        let taken = |id: &str| self.lookup(id).is_some();
        validate_layout(template, false, &mut HashSet::default(), &taken)
    }

    /// Creates a tab from `template` without linking it anywhere.
    pub(super) fn transform_tab(&mut self, template: &TabTemplate) -> Result<NodeId> {
        self.check_id_free(template.id.as_deref())?;
        Ok(tab_node(&mut self.tree, template).into_id())
    }

    /// Creates an empty layout that is not linked anywhere.
    pub(super) fn bare_layout(&mut self, direction: Direction) -> NodeId {
        let data = NodeData::Layout(Layout { id: fresh_id(), direction });
        self.tree.new_node().with(move |node, tree| tree.data.nodes.set(node, data)).into_id()
    }

    pub(super) fn check_id_free(&self, id: Option<&str>) -> Result<()> {
        match id {
            Some(id) if self.lookup(id).is_some() => {
                Err(TreeError::DuplicateId { id: id.to_owned() })
            }
            _ => Ok(()),
        }
    }
}

fn tab_node<'a>(
    tree: &'a mut Tree<Components>,
    template: &TabTemplate,
) -> UnattachedNode<'a, Components> {
    let data = NodeData::Tab(Tab {
        id: template.id.clone().unwrap_or_else(fresh_id),
        title: template.title.clone(),
        data: template.data.clone(),
    });
    tree.new_node().with(move |node, tree| tree.data.nodes.set(node, data))
}

/// Creates the layout and its children. Assumes the template was validated.
fn materialize_layout(tree: &mut Tree<Components>, template: &LayoutTemplate) -> NodeId {
    let data = NodeData::Layout(Layout {
        id: template.id.clone().unwrap_or_else(fresh_id),
        direction: template.direction.unwrap_or_default(),
    });
    let layout = tree.new_node().with(move |node, tree| tree.data.nodes.set(node, data)).into_id();
    for child in &template.children {
        match child {
            NodeTemplate::Tab(tab) => {
                tab_node(tree, tab).push_back(layout);
            }
            NodeTemplate::Layout(sub) => {
                let sub = materialize_layout(tree, sub);
                sub.detach(tree).push_back(layout);
            }
        }
    }
    if let Some(active) = &template.active
        && let Some(tab) = tree.data.nodes.lookup(active)
    {
        tree.data.active.activate(&tree.map, tab);
    }
    layout
}

fn validate_layout<'t>(
    template: &'t LayoutTemplate,
    is_root: bool,
    seen: &mut HashSet<&'t str>,
    taken: &dyn Fn(&str) -> bool,
) -> Result<()> {
    claim(template.id.as_deref(), seen, taken)?;

    let tabs = template.children.iter().filter(|c| matches!(c, NodeTemplate::Tab(_))).count();
    let layouts = template.children.len() - tabs;
    let layout = || template.label();
    match (tabs, layouts) {
        (0, 0) if !is_root => return Err(TreeError::EmptyLayout { layout: layout() }),
        (0, 1) => return Err(TreeError::TooFewLayouts { layout: layout(), count: 1 }),
        (_, 0) | (0, _) => {}
        _ => return Err(TreeError::MixedKinds { layout: layout() }),
    }

    if let Some(active) = &template.active {
        let holds_it = template.children.iter().any(|child| {
            matches!(child, NodeTemplate::Tab(tab) if tab.id.as_ref() == Some(active))
        });
        if !holds_it {
            return Err(TreeError::NotFound {
                id: active.clone(),
                scope: format!("layout {}", layout()),
            });
        }
    }

    for child in &template.children {
        match child {
            NodeTemplate::Tab(tab) => claim(tab.id.as_deref(), seen, taken)?,
            NodeTemplate::Layout(sub) => validate_layout(sub, false, seen, taken)?,
        }
    }
    Ok(())
}

fn claim<'t>(
    id: Option<&'t str>,
    seen: &mut HashSet<&'t str>,
    taken: &dyn Fn(&str) -> bool,
) -> Result<()> {
    let Some(id) = id else { return Ok(()) };
    if taken(id) || !seen.insert(id) {
        return Err(TreeError::DuplicateId { id: id.to_owned() });
    }
    Ok(())
}
