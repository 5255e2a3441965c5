//! Hierarchical graph exchanged with the computation backend.
//!
//! The backend speaks a textual protocol: nodes are `{id, width, height,
//! children?, edges?}` with string-keyed, string-valued layout options, and
//! the result comes back as the same tree annotated with `x`/`y` per node and
//! routing `sections` per edge. Everything the protocol leaves optional stays
//! optional here; the reconciler converts eagerly into strict types at the
//! boundary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ir::Point;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutGraph {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<LayoutGraph>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub edges: Vec<LayoutGraphEdge>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub layout_options: BTreeMap<String, String>,
}

impl LayoutGraph {
    pub fn leaf(id: impl Into<String>, width: f32, height: f32) -> Self {
        Self {
            id: id.into(),
            width: Some(width),
            height: Some(height),
            x: None,
            y: None,
            children: Vec::new(),
            edges: Vec::new(),
            layout_options: BTreeMap::new(),
        }
    }

    pub fn container(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            width: None,
            height: None,
            x: None,
            y: None,
            children: Vec::new(),
            edges: Vec::new(),
            layout_options: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutGraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<EdgeSection>,
}

impl LayoutGraphEdge {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            sections: Vec::new(),
        }
    }
}

/// One routed stretch of an edge. The backend may omit endpoints; bend points
/// are the intermediate turns, in traversal order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_point: Option<Point>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_point: Option<Point>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bend_points: Vec<Point>,
}
