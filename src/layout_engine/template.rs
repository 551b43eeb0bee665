//! Declarative descriptions of layouts, used to build a tree and to snapshot
//! one back out.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::layout_engine::graph::Direction;

/// Opaque per-tab payload owned by the host application.
pub type TabData = Map<String, Value>;

/// Marker carried by payloads that refer to a tab already in the tree.
pub const DRAGGED_SIGNATURE: &str = "__dragged__tab__";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct TabTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub data: TabData,
}

impl TabTemplate {
    pub fn new(title: impl Into<String>) -> Self {
        TabTemplate { title: title.into(), ..Default::default() }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_data(mut self, data: TabData) -> Self {
        self.data = data;
        self
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct LayoutTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    /// Id of the tab that starts out active. Defaults to the first tab.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<String>,
    #[serde(default)]
    pub children: Vec<NodeTemplate>,
}

impl LayoutTemplate {
    pub fn tabs(tabs: impl IntoIterator<Item = TabTemplate>) -> Self {
        LayoutTemplate {
            children: tabs.into_iter().map(NodeTemplate::Tab).collect(),
            ..Default::default()
        }
    }

    pub fn layouts(layouts: impl IntoIterator<Item = LayoutTemplate>) -> Self {
        LayoutTemplate {
            children: layouts.into_iter().map(NodeTemplate::Layout).collect(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn with_active(mut self, active: impl Into<String>) -> Self {
        self.active = Some(active.into());
        self
    }

    /// Name used in error messages for a layout that may not have an id yet.
    pub(crate) fn label(&self) -> String {
        self.id.clone().unwrap_or_else(|| "<unnamed>".to_owned())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeTemplate {
    Tab(TabTemplate),
    Layout(LayoutTemplate),
}

impl NodeTemplate {
    pub fn id(&self) -> Option<&str> {
        match self {
            NodeTemplate::Tab(tab) => tab.id.as_deref(),
            NodeTemplate::Layout(layout) => layout.id.as_deref(),
        }
    }
}

impl From<TabTemplate> for NodeTemplate {
    fn from(tab: TabTemplate) -> Self { NodeTemplate::Tab(tab) }
}

impl From<LayoutTemplate> for NodeTemplate {
    fn from(layout: LayoutTemplate) -> Self { NodeTemplate::Layout(layout) }
}

/// Reference to a tab that is being dragged inside the tree.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DraggedTab {
    pub signature: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub data: TabData,
}

/// What was dropped onto a layout.
#[derive(Debug, Clone, PartialEq)]
pub enum DropPayload {
    /// A tab that already lives in the tree and should move.
    Tab(DraggedTab),
    /// Anything else; turned into a tab by the host's factory, if at all.
    External(TabData),
}

impl DropPayload {
    pub fn dragged(id: impl Into<String>) -> Self {
        DropPayload::Tab(DraggedTab {
            signature: DRAGGED_SIGNATURE.to_owned(),
            id: id.into(),
            data: TabData::new(),
        })
    }

    /// Sorts raw drop data into a tab reference or external data.
    ///
    /// Objects that carry the drag signature and a string id are tab
    /// references. Every other object is external. Non-object values are
    /// wrapped under a `value` key.
    pub fn classify(value: Value) -> Self {
        let object = match value {
            Value::Object(object) => object,
            other => {
                let mut wrapped = TabData::new();
                wrapped.insert("value".to_owned(), other);
                return DropPayload::External(wrapped);
            }
        };
        let signed = object.get("signature").and_then(Value::as_str) == Some(DRAGGED_SIGNATURE);
        if signed && object.get("id").is_some_and(Value::is_string) {
            match serde_json::from_value(Value::Object(object.clone())) {
                Ok(dragged) => return DropPayload::Tab(dragged),
                Err(err) => tracing::debug!(?err, "malformed dragged tab, treating as external"),
            }
        }
        DropPayload::External(object)
    }
}
