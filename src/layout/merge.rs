//! Blending a partial (selection-only) layout back into an untouched diagram.
//!
//! The freshly laid-out subgraph keeps its original center of mass: both
//! bounding-box centers are computed from the same selected ids and the
//! difference is applied uniformly to every new position and waypoint, so
//! nothing outside the selection appears to move.

use std::collections::{HashMap, HashSet};

use crate::ir::{Edge, EdgePath, Node, Point};

#[derive(Debug, Clone, Copy)]
struct Bounds {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl Bounds {
    fn of(points: impl Iterator<Item = (f32, f32)>) -> Option<Self> {
        let mut bounds: Option<Bounds> = None;
        for (x, y) in points {
            bounds = Some(match bounds {
                None => Bounds {
                    min_x: x,
                    min_y: y,
                    max_x: x,
                    max_y: y,
                },
                Some(b) => Bounds {
                    min_x: b.min_x.min(x),
                    min_y: b.min_y.min(y),
                    max_x: b.max_x.max(x),
                    max_y: b.max_y.max(y),
                },
            });
        }
        bounds
    }

    fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) * 0.5,
            (self.min_y + self.max_y) * 0.5,
        )
    }
}

/// Translation that maps the new subgraph center back onto the original one.
/// An empty selection yields the neutral transform, never NaN.
fn centering_translation(original: &[&Node], updated: &[&Node]) -> Point {
    let before = Bounds::of(original.iter().map(|n| (n.x, n.y)));
    let after = Bounds::of(updated.iter().map(|n| (n.x, n.y)));
    match (before, after) {
        (Some(before), Some(after)) => {
            let before = before.center();
            let after = after.center();
            Point::new(before.x - after.x, before.y - after.y)
        }
        _ => Point::new(0.0, 0.0),
    }
}

/// Merge a partial layout result into the full diagram. `selected` is the set
/// of node ids that were laid out; `new_nodes`/`new_edges` is the reconciled
/// replacement set for exactly that scope.
pub fn merge_partial(
    nodes: &[Node],
    edges: &[Edge],
    selected: &HashSet<String>,
    new_nodes: Vec<Node>,
    new_edges: Vec<Edge>,
) -> (Vec<Node>, Vec<Edge>) {
    let originals: Vec<&Node> = nodes.iter().filter(|n| selected.contains(&n.id)).collect();
    let updated: Vec<&Node> = new_nodes.iter().filter(|n| selected.contains(&n.id)).collect();
    let shift = centering_translation(&originals, &updated);

    let mut shifted_nodes: HashMap<String, Node> = HashMap::with_capacity(new_nodes.len());
    for mut node in new_nodes {
        node.x += shift.x;
        node.y += shift.y;
        shifted_nodes.insert(node.id.clone(), node);
    }

    let mut shifted_edges: HashMap<String, Edge> = HashMap::with_capacity(new_edges.len());
    for mut edge in new_edges {
        if let EdgePath::Waypoint { waypoints, .. } = &mut edge.path {
            for waypoint in waypoints {
                waypoint.x += shift.x;
                waypoint.y += shift.y;
            }
        }
        shifted_edges.insert(edge.id.clone(), edge);
    }

    let merged_nodes = nodes
        .iter()
        .map(|node| shifted_nodes.remove(&node.id).unwrap_or_else(|| node.clone()))
        .collect();
    let merged_edges = edges
        .iter()
        .map(|edge| shifted_edges.remove(&edge.id).unwrap_or_else(|| edge.clone()))
        .collect();
    (merged_nodes, merged_edges)
}
