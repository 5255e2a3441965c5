use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Node size applied when a node has not been measured yet.
pub const DEFAULT_NODE_WIDTH: f32 = 160.0;
pub const DEFAULT_NODE_HEIGHT: f32 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A diagram node. Top-left position in diagram coordinates. A node with
/// `children` present is a group container; its children define a nested
/// coordinate frame. Deeper nesting than one level is not supported.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: Option<f32>,
    pub height: Option<f32>,
    /// Id of the group this node belongs to, if any.
    pub group: Option<String>,
    /// Ordered child ids; present iff this node is a group.
    pub children: Option<Vec<String>>,
}

impl Node {
    pub fn new(id: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            width: None,
            height: None,
            group: None,
            children: None,
        }
    }

    pub fn is_group(&self) -> bool {
        self.children.is_some()
    }

    /// Measured size, with defaults applied when unmeasured.
    pub fn size(&self) -> (f32, f32) {
        (
            self.width.unwrap_or(DEFAULT_NODE_WIDTH),
            self.height.unwrap_or(DEFAULT_NODE_HEIGHT),
        )
    }
}

/// Which side of a node's bounding box an edge touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

/// Where an edge touches a node's border: a side plus a normalized offset
/// along that side, so the anchor stays valid if the node moves slightly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub side: Side,
    /// 0.0 at the side's start (left or top corner), 1.0 at its end.
    pub offset: f32,
}

static WAYPOINT_SEQ: AtomicU64 = AtomicU64::new(0);

/// An intermediate point on an edge's route, in absolute diagram coordinates.
/// Ids are generated fresh on every layout pass; only positions persist.
#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    pub id: String,
    pub x: f32,
    pub y: f32,
}

impl Waypoint {
    pub fn at(x: f32, y: f32) -> Self {
        let seq = WAYPOINT_SEQ.fetch_add(1, Ordering::Relaxed);
        Self {
            id: format!("wp-{seq}"),
            x,
            y,
        }
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Rendering hint derived from the layout direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveStyle {
    /// Orthogonal step curve, for the four axis-aligned directions.
    Step,
    /// Smooth curve, for radial layouts.
    Smooth,
}

/// Edge routing state. `Floating` edges have no fixed route; the renderer
/// recomputes their path from current node positions. `Waypoint` edges carry
/// the fixed route produced by the last layout pass. Anchors can only ever
/// accompany the `Waypoint` variant.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EdgePath {
    #[default]
    Floating,
    Waypoint {
        waypoints: Vec<Waypoint>,
        source_anchor: Option<Anchor>,
        target_anchor: Option<Anchor>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub path: EdgePath,
    pub curve: Option<CurveStyle>,
}

impl Edge {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            path: EdgePath::Floating,
            curve: None,
        }
    }
}
