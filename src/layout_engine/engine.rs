use crossbeam_channel::{Receiver, Sender, unbounded};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, trace, warn};

use crate::common::config::Settings;
use crate::layout_engine::error::{Result, TreeError};
use crate::layout_engine::geometry::{DEFAULT_EDGE_BAND, Point, Rect, drop_side};
use crate::layout_engine::graph::Side;
use crate::layout_engine::layout_tree::{DropOptions, DropOutcome, LayoutTree};
use crate::layout_engine::template::{DropPayload, LayoutTemplate, TabData, TabTemplate};
use crate::model::tree::NodeId;

pub type CompareTabs = Box<dyn Fn(&TabData, &TabData) -> bool>;
pub type UnknownDropHandler = Box<dyn Fn(&TabData) -> Option<TabTemplate>>;

/// Host-supplied behaviour for a [`LayoutEngine`].
pub struct EngineOptions {
    /// Center drops and added tabs matching an existing tab are skipped.
    pub compare_tabs: Option<CompareTabs>,
    /// Turns external drop data into a tab. Declining ignores the drop.
    pub on_unknown_dropped: UnknownDropHandler,
    pub drop: DropOptions,
    /// See [`drop_side`].
    pub edge_band: f64,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            compare_tabs: None,
            on_unknown_dropped: Box::new(titled_tab),
            drop: DropOptions::default(),
            edge_band: DEFAULT_EDGE_BAND,
        }
    }
}

impl EngineOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        let compare_tabs: Option<CompareTabs> =
            settings.layout.dedupe_tabs.then(|| Box::new(same_data) as CompareTabs);
        EngineOptions {
            compare_tabs,
            drop: DropOptions { max_depth: settings.layout.max_depth },
            edge_band: settings.drop_zones.edge_band,
            ..Default::default()
        }
    }
}

/// Tabs match when they carry the same, non-empty data.
pub fn same_data(a: &TabData, b: &TabData) -> bool { !a.is_empty() && a == b }

/// Accepts external data with a string `title`, keeping all of it as the
/// tab's data.
pub fn titled_tab(data: &TabData) -> Option<TabTemplate> {
    let title = data.get("title")?.as_str()?;
    Some(TabTemplate::new(title).with_data(data.clone()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutAction {
    ToggleTab,
    CloseTab,
    AddTab,
    Drop,
}

/// Sent to subscribers after every mutation that changed the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutChange {
    pub revision: u64,
    pub action: LayoutAction,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum LayoutCommand {
    ToggleTab {
        id: String,
    },
    CloseTab {
        id: String,
    },
    AddTab {
        tab: TabTemplate,
        layout: String,
        #[serde(default)]
        position: Option<usize>,
    },
    Drop {
        payload: Value,
        layout: String,
        side: Side,
    },
    DropAt {
        payload: Value,
        layout: String,
        point: Point,
        bounds: Rect,
    },
    EmptyDrop {
        payload: Value,
    },
}

impl LayoutCommand {
    fn action(&self) -> LayoutAction {
        match self {
            LayoutCommand::ToggleTab { .. } => LayoutAction::ToggleTab,
            LayoutCommand::CloseTab { .. } => LayoutAction::CloseTab,
            LayoutCommand::AddTab { .. } => LayoutAction::AddTab,
            LayoutCommand::Drop { .. }
            | LayoutCommand::DropAt { .. }
            | LayoutCommand::EmptyDrop { .. } => LayoutAction::Drop,
        }
    }
}

/// Id-based front end to a [`LayoutTree`] that reports every change.
pub struct LayoutEngine {
    tree: LayoutTree,
    options: EngineOptions,
    revision: u64,
    subscribers: Vec<Sender<LayoutChange>>,
}

impl LayoutEngine {
    pub fn new(template: &LayoutTemplate, options: EngineOptions) -> Result<Self> {
        Ok(LayoutEngine {
            tree: LayoutTree::build(template)?,
            options,
            revision: 0,
            subscribers: Vec::new(),
        })
    }

    pub fn tree(&self) -> &LayoutTree { &self.tree }

    pub fn revision(&self) -> u64 { self.revision }

    pub fn snapshot(&self) -> LayoutTemplate { self.tree.snapshot() }

    /// Receives a [`LayoutChange`] for every later mutation. Dropping the
    /// receiver unsubscribes.
    pub fn subscribe(&mut self) -> Receiver<LayoutChange> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    pub fn toggle_tab(&mut self, id: &str) -> Result<bool> {
        let layout = self.owner_of(id)?;
        let changed = self.tree.toggle_tab(id, layout)?;
        if changed {
            self.notify(LayoutAction::ToggleTab);
        }
        Ok(changed)
    }

    pub fn close_tab(&mut self, id: &str) -> Result<()> {
        let layout = self.owner_of(id)?;
        self.tree.close_tab(id, layout)?;
        self.notify(LayoutAction::CloseTab);
        Ok(())
    }

    pub fn add_tab(
        &mut self,
        tab: TabTemplate,
        layout: &str,
        position: Option<usize>,
    ) -> Result<bool> {
        let layout = self.layout_by_id(layout)?;
        let added =
            self.tree.add_tab(tab, layout, position, self.options.compare_tabs.as_deref())?;
        if added {
            self.notify(LayoutAction::AddTab);
        }
        Ok(added)
    }

    #[instrument(level = "debug", skip(self, payload))]
    pub fn on_drop(
        &mut self,
        payload: &DropPayload,
        layout: &str,
        side: Side,
    ) -> Result<DropOutcome> {
        let layout = self.layout_by_id(layout)?;
        let outcome = self
            .tree
            .on_drop(
                payload,
                layout,
                side,
                self.options.compare_tabs.as_deref(),
                &*self.options.on_unknown_dropped,
                self.options.drop,
            )
            .inspect_err(|err| {
                if let TreeError::MaxDepthReached { layout, max_depth } = err {
                    warn!(%layout, max_depth, "drop would nest layouts too deeply");
                }
            })?;
        if outcome != DropOutcome::Ignored {
            self.notify(LayoutAction::Drop);
        }
        Ok(outcome)
    }

    /// Like [`on_drop`](Self::on_drop), with the side taken from where the
    /// pointer is over the layout's on-screen `bounds`.
    pub fn on_drop_at(
        &mut self,
        payload: &DropPayload,
        layout: &str,
        point: Point,
        bounds: Rect,
    ) -> Result<DropOutcome> {
        match drop_side(point, bounds, self.options.edge_band) {
            Some(side) => self.on_drop(payload, layout, side),
            None => {
                debug!(?point, ?bounds, "pointer outside drop target");
                Ok(DropOutcome::Ignored)
            }
        }
    }

    /// Handles a drop onto the empty root. Ignored once the tree has content.
    pub fn on_empty_drop(&mut self, payload: &DropPayload) -> Result<DropOutcome> {
        if !self.tree.is_empty() {
            debug!("empty drop on a non-empty tree");
            return Ok(DropOutcome::Ignored);
        }
        let root = self.tree.root();
        let root_id = self.tree.id_of(root).unwrap_or_default().to_owned();
        self.on_drop(payload, &root_id, Side::Center)
    }

    /// Applies a serialized command. Returns the change it caused, if any.
    #[instrument(name = "layout_engine::handle_command", skip(self))]
    pub fn handle_command(&mut self, command: LayoutCommand) -> Result<Option<LayoutChange>> {
        let before = self.revision;
        let action = command.action();
        match command {
            LayoutCommand::ToggleTab { id } => {
                self.toggle_tab(&id)?;
            }
            LayoutCommand::CloseTab { id } => self.close_tab(&id)?,
            LayoutCommand::AddTab { tab, layout, position } => {
                self.add_tab(tab, &layout, position)?;
            }
            LayoutCommand::Drop { payload, layout, side } => {
                self.on_drop(&DropPayload::classify(payload), &layout, side)?;
            }
            LayoutCommand::DropAt { payload, layout, point, bounds } => {
                self.on_drop_at(&DropPayload::classify(payload), &layout, point, bounds)?;
            }
            LayoutCommand::EmptyDrop { payload } => {
                self.on_empty_drop(&DropPayload::classify(payload))?;
            }
        }
        Ok((self.revision != before).then(|| LayoutChange { revision: self.revision, action }))
    }

    /// The layout directly holding tab `id`.
    fn owner_of(&self, id: &str) -> Result<NodeId> {
        self.tree
            .find_tab(id, self.tree.root())
            .and_then(|tab| self.tree.parent(tab))
            .ok_or_else(|| TreeError::not_found(id, "tree"))
    }

    fn layout_by_id(&self, id: &str) -> Result<NodeId> {
        self.tree
            .find_layout(id, self.tree.root())
            .ok_or_else(|| TreeError::not_found(id, "tree"))
    }

    fn notify(&mut self, action: LayoutAction) {
        self.revision += 1;
        let change = LayoutChange { revision: self.revision, action };
        trace!(?change, "layout changed");
        debug!("Tree:\n{}", self.tree.draw_tree().trim());
        self.subscribers.retain(|tx| tx.send(change.clone()).is_ok());
    }
}
