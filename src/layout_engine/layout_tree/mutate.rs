use tracing::{debug, instrument};

use super::LayoutTree;
use crate::layout_engine::error::{Result, TreeError};
use crate::layout_engine::graph::{Direction, Placement, Side};
use crate::layout_engine::template::{DropPayload, TabData, TabTemplate};
use crate::model::tree::NodeId;

/// Decides whether two tabs show the same thing, given their data.
pub type SameTab<'a> = &'a dyn Fn(&TabData, &TabData) -> bool;

/// Turns external drop data into a tab, or declines it.
pub type TabFactory<'a> = &'a dyn Fn(&TabData) -> Option<TabTemplate>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DropOptions {
    /// Deepest layout level a split may create. Unlimited when `None`.
    pub max_depth: Option<usize>,
}

/// What a drop did to the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    /// Nothing changed.
    Ignored,
    /// The tab joined the target layout.
    Inserted,
    /// A new layout was placed next to the target.
    Nested,
    /// The target was split in two along the drop axis.
    Split,
}

impl LayoutTree {
    /// Makes tab `id` the active tab of `layout`. Returns whether anything
    /// changed.
    #[instrument(level = "debug", skip(self))]
    pub fn toggle_tab(&mut self, id: &str, layout: NodeId) -> Result<bool> {
        self.expect_tab_layout(layout, "toggle_tab")?;
        let tab = self.get_tab(id, layout)?;
        Ok(self.tree.data.active.activate(&self.tree.map, tab))
    }

    /// Removes tab `id` from `layout`.
    ///
    /// A layout left empty is removed from its parent, and a parent left with
    /// a single layout absorbs that layout's children and direction. The root
    /// is never removed; it simply becomes empty.
    #[instrument(level = "debug", skip(self))]
    pub fn close_tab(&mut self, id: &str, layout: NodeId) -> Result<()> {
        self.expect_tab_layout(layout, "close_tab")?;
        let tab = self.get_tab(id, layout)?;
        tab.detach(&mut self.tree).remove();
        if !layout.is_empty(self.map()) {
            return Ok(());
        }
        let Some(parent) = self.parent(layout) else {
            debug!("root layout is now empty");
            return Ok(());
        };
        debug!(layout = %self.label(layout), "removing emptied layout");
        layout.detach(&mut self.tree).remove();
        if parent.child_count(self.map()) == 1 {
            self.collapse_into(parent);
        }
        Ok(())
    }

    /// Adds a tab built from `template` to `layout` at `position` (clamped;
    /// appended when `None`) and makes it active.
    ///
    /// Returns `false` without changing anything when `is_duplicate` matches
    /// the new tab against one already in the layout.
    #[instrument(
        level = "debug",
        skip(self, template, is_duplicate),
        fields(title = %template.title)
    )]
    pub fn add_tab(
        &mut self,
        template: TabTemplate,
        layout: NodeId,
        position: Option<usize>,
        is_duplicate: Option<SameTab<'_>>,
    ) -> Result<bool> {
        Ok(self.insert_tab(&template, layout, position, is_duplicate)?.is_some())
    }

    /// Places dropped content relative to `layout`.
    ///
    /// A center drop adds a tab to `layout`. An edge drop either places a new
    /// single-tab layout next to `layout`, when the parent already runs along
    /// the drop axis, or splits `layout` in two. A dragged tab moves: the
    /// original is closed once the copy is placed, and the copy takes over its
    /// id.
    #[instrument(level = "debug", skip(self, payload, is_duplicate, factory, options))]
    pub fn on_drop(
        &mut self,
        payload: &DropPayload,
        layout: NodeId,
        side: Side,
        is_duplicate: Option<SameTab<'_>>,
        factory: TabFactory<'_>,
        options: DropOptions,
    ) -> Result<DropOutcome> {
        self.expect_layout(layout)?;
        let (template, source) = match payload {
            DropPayload::Tab(dragged) => {
                let missing = || TreeError::not_found(&dragged.id, "tree");
                let source = self.find_tab(&dragged.id, self.root).ok_or_else(missing)?;
                if self.parent(source) == Some(layout) && layout.child_count(self.map()) == 1 {
                    debug!("tab dropped onto its own single-tab layout");
                    return Ok(DropOutcome::Ignored);
                }
                let tab = self.tab(source).ok_or_else(missing)?;
                let template = TabTemplate {
                    id: None,
                    title: tab.title.clone(),
                    data: tab.data.clone(),
                };
                (template, Some(source))
            }
            DropPayload::External(data) => match factory(data) {
                Some(template) => (template, None),
                None => {
                    debug!("external drop declined");
                    return Ok(DropOutcome::Ignored);
                }
            },
        };

        let side = if layout.is_empty(self.map()) { Side::Center } else { side };
        let placed = match side.axis() {
            None => self
                .insert_tab(&template, layout, None, is_duplicate)?
                .map(|tab| (tab, DropOutcome::Inserted)),
            Some(axis) => {
                Some(self.split_towards(&template, layout, axis, side.placement(), options)?)
            }
        };
        let Some((tab, outcome)) = placed else {
            return Ok(DropOutcome::Ignored);
        };
        if let Some(source) = source {
            self.finish_move(source, tab)?;
        }
        debug!(?outcome, "drop applied");
        Ok(outcome)
    }

    fn insert_tab(
        &mut self,
        template: &TabTemplate,
        layout: NodeId,
        position: Option<usize>,
        is_duplicate: Option<SameTab<'_>>,
    ) -> Result<Option<NodeId>> {
        self.expect_tab_layout(layout, "add_tab")?;
        if let Some(same) = is_duplicate
            && self
                .children(layout)
                .filter_map(|child| self.tab(child))
                .any(|existing| same(&existing.data, &template.data))
        {
            debug!("matching tab already present");
            return Ok(None);
        }
        let tab = self.transform_tab(template)?;
        let count = layout.child_count(self.map());
        let index = position.unwrap_or(count).min(count);
        tab.detach(&mut self.tree).insert_at(layout, index);
        self.tree.data.active.activate(&self.tree.map, tab);
        Ok(Some(tab))
    }

    fn split_towards(
        &mut self,
        template: &TabTemplate,
        layout: NodeId,
        axis: Direction,
        placement: Placement,
        options: DropOptions,
    ) -> Result<(NodeId, DropOutcome)> {
        if let Some(parent) = self.parent(layout)
            && self.direction(parent) == Some(axis)
        {
            let (wrapper, tab) = self.tab_in_layout(template)?;
            let wrapper = wrapper.detach(&mut self.tree);
            match placement {
                Placement::Before => wrapper.insert_before(layout),
                Placement::After => wrapper.insert_after(layout),
            };
            return Ok((tab, DropOutcome::Nested));
        }

        if let Some(max_depth) = options.max_depth
            && self.subtree_depth(layout) + 1 > max_depth
        {
            return Err(TreeError::MaxDepthReached { layout: self.label(layout), max_depth });
        }
        let (dropped, tab) = self.tab_in_layout(template)?;

        let direction = self.direction(layout).unwrap_or_default();
        let active = self.active(layout);
        let existing = self.bare_layout(direction);
        let children: Vec<_> = self.children(layout).collect();
        for child in children {
            child.detach(&mut self.tree).push_back(existing);
        }
        let (first, second) = match placement {
            Placement::Before => (dropped, existing),
            Placement::After => (existing, dropped),
        };
        first.detach(&mut self.tree).push_back(layout);
        second.detach(&mut self.tree).push_back(layout);
        if let Some(active) = active {
            self.tree.data.active.activate(&self.tree.map, active);
        }
        self.tree.data.active.clear(layout);
        self.set_direction(layout, axis);
        Ok((tab, DropOutcome::Split))
    }

    /// A new single-tab layout holding a tab built from `template`; neither is
    /// linked into the tree yet.
    fn tab_in_layout(&mut self, template: &TabTemplate) -> Result<(NodeId, NodeId)> {
        let tab = self.transform_tab(template)?;
        let layout = self.bare_layout(Direction::default());
        tab.detach(&mut self.tree).push_back(layout);
        Ok((layout, tab))
    }

    /// Closes the dragged original and hands its id to the placed copy.
    fn finish_move(&mut self, source: NodeId, copy: NodeId) -> Result<()> {
        let Some(origin) = self.parent(source) else {
            return Ok(());
        };
        let Some(id) = self.id_of(source).map(str::to_owned) else {
            return Ok(());
        };
        self.close_tab(&id, origin)?;
        self.tree.data.nodes.rename(copy, id);
        Ok(())
    }

    /// Replaces the only child of `parent` with that child's own children.
    fn collapse_into(&mut self, parent: NodeId) {
        let Some(only) = parent.first_child(self.map()) else { return };
        let Some(direction) = self.direction(only) else { return };
        let active = self.active(only);
        let grandchildren: Vec<_> = self.children(only).collect();
        for child in grandchildren {
            child.detach(&mut self.tree).push_back(parent);
        }
        only.detach(&mut self.tree).remove();
        self.set_direction(parent, direction);
        match active {
            Some(tab) => {
                self.tree.data.active.activate(&self.tree.map, tab);
            }
            None => self.tree.data.active.clear(parent),
        }
        debug!(layout = %self.label(parent), "collapsed single child layout");
    }
}
