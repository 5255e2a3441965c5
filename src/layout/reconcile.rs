//! Conversion of the backend's result graph back into diagram positions and
//! edge routes.
//!
//! Positions inside compound nodes are relative to their container, so
//! absolute extraction is a depth-first accumulation of ancestor offsets
//! (explicit stack, the result tree comes from outside). Edge sections are
//! relative to the container that declares the edge and get the same offset
//! treatment. Everything optional in the wire format collapses here, at the
//! boundary, into either a routed edge or the explicit floating variant.

use std::collections::HashMap;

use log::trace;

use crate::config::LayoutConfig;
use crate::ir::{Anchor, Edge, EdgePath, Node, Point, Side, Waypoint};

use super::convert::curve_for_direction;
use super::graph::LayoutGraph;

/// Twice-the-triangle-area threshold below which a middle waypoint is
/// considered collinear with its neighbors and dropped.
const COLLINEAR_TOLERANCE: f32 = 0.5;

#[derive(Debug, Clone, Copy)]
struct Placement {
    pos: Point,
    width: Option<f32>,
    height: Option<f32>,
}

#[derive(Debug, Clone)]
struct RawRoute {
    source_pt: Option<Point>,
    target_pt: Option<Point>,
    bends: Vec<Point>,
}

/// Replacement node/edge set produced from one layout result.
#[derive(Debug, Clone)]
pub struct Reconciled {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

pub fn reconcile(
    result: &LayoutGraph,
    nodes: &[Node],
    edges: &[Edge],
    config: &LayoutConfig,
) -> Reconciled {
    let placements = extract_positions(result);
    let routes = extract_routes(result);

    let mut out_nodes = Vec::with_capacity(nodes.len());
    for node in nodes {
        let mut updated = node.clone();
        if let Some(placement) = placements.get(node.id.as_str()) {
            updated.x = placement.pos.x;
            updated.y = placement.pos.y;
            if node.is_group() {
                // Compound sizes are an output of the layout, not an input.
                if let Some(width) = placement.width {
                    updated.width = Some(width);
                }
                if let Some(height) = placement.height {
                    updated.height = Some(height);
                }
            }
        } else {
            trace!("node {} absent from layout result, keeping position", node.id);
        }
        out_nodes.push(updated);
    }

    let node_rects: HashMap<&str, (Point, f32, f32)> = out_nodes
        .iter()
        .map(|n| (n.id.as_str(), (Point::new(n.x, n.y), n.size().0, n.size().1)))
        .collect();

    let curve = curve_for_direction(config.direction);
    let mut out_edges = Vec::with_capacity(edges.len());
    for edge in edges {
        let mut updated = edge.clone();
        let routed = routes.get(edge.id.as_str()).and_then(|route| {
            build_path(route, edge, &node_rects)
        });
        match routed {
            Some(path) => {
                updated.path = path;
                updated.curve = Some(curve);
            }
            None => {
                updated.path = EdgePath::Floating;
                updated.curve = None;
            }
        }
        out_edges.push(updated);
    }

    Reconciled {
        nodes: out_nodes,
        edges: out_edges,
    }
}

fn extract_positions(result: &LayoutGraph) -> HashMap<String, Placement> {
    let mut placements = HashMap::new();
    // The synthetic root contributes no offset of its own.
    let mut stack: Vec<(&LayoutGraph, Point)> = vec![(result, Point::new(0.0, 0.0))];
    while let Some((container, offset)) = stack.pop() {
        for child in &container.children {
            let abs = Point::new(
                offset.x + child.x.unwrap_or(0.0),
                offset.y + child.y.unwrap_or(0.0),
            );
            placements.insert(
                child.id.clone(),
                Placement {
                    pos: abs,
                    width: child.width,
                    height: child.height,
                },
            );
            if !child.children.is_empty() {
                stack.push((child, abs));
            }
        }
    }
    placements
}

fn extract_routes(result: &LayoutGraph) -> HashMap<String, RawRoute> {
    let mut routes = HashMap::new();
    let mut stack: Vec<(&LayoutGraph, Point)> = vec![(result, Point::new(0.0, 0.0))];
    while let Some((container, offset)) = stack.pop() {
        for edge in &container.edges {
            if edge.sections.is_empty() {
                continue;
            }
            let shift = |p: Point| Point::new(p.x + offset.x, p.y + offset.y);
            let source_pt = edge
                .sections
                .iter()
                .find_map(|s| s.start_point)
                .map(shift);
            let target_pt = edge
                .sections
                .iter()
                .rev()
                .find_map(|s| s.end_point)
                .map(shift);
            let bends: Vec<Point> = edge
                .sections
                .iter()
                .flat_map(|s| s.bend_points.iter().copied())
                .map(shift)
                .collect();
            routes.insert(edge.id.clone(), RawRoute {
                source_pt,
                target_pt,
                bends,
            });
        }
        for child in &container.children {
            if child.children.is_empty() && child.edges.is_empty() {
                continue;
            }
            let abs = Point::new(
                offset.x + child.x.unwrap_or(0.0),
                offset.y + child.y.unwrap_or(0.0),
            );
            stack.push((child, abs));
        }
    }
    routes
}

/// Collapse a raw route into the edge's new path, or `None` when the route
/// carries nothing and the edge should float.
fn build_path(
    route: &RawRoute,
    edge: &Edge,
    node_rects: &HashMap<&str, (Point, f32, f32)>,
) -> Option<EdgePath> {
    // Anchors come in pairs or not at all; a half-anchored edge would drift
    // apart the moment one endpoint moves.
    let source_anchor = route
        .source_pt
        .and_then(|p| anchor_for(p, edge.source.as_str(), node_rects));
    let target_anchor = route
        .target_pt
        .and_then(|p| anchor_for(p, edge.target.as_str(), node_rects));
    let (source_anchor, target_anchor) = match (source_anchor, target_anchor) {
        (Some(s), Some(t)) => (Some(s), Some(t)),
        _ => (None, None),
    };

    // Run the collinearity pass with anchor points as context so a bend that
    // merely continues the anchor-to-anchor line is dropped too.
    let context = match (source_anchor, route.source_pt, route.target_pt) {
        (Some(_), Some(start), Some(end)) => Some((start, end)),
        _ => None,
    };
    let mut run: Vec<Point> = Vec::with_capacity(route.bends.len() + 2);
    if let Some((start, _)) = context {
        run.push(start);
    }
    run.extend(route.bends.iter().copied());
    if let Some((_, end)) = context {
        run.push(end);
    }
    let mut simplified = simplify_waypoints(&run);
    if context.is_some() {
        simplified.remove(0);
        simplified.pop();
    }

    if simplified.is_empty() && source_anchor.is_none() {
        return None;
    }
    Some(EdgePath::Waypoint {
        waypoints: simplified.into_iter().map(|p| Waypoint::at(p.x, p.y)).collect(),
        source_anchor,
        target_anchor,
    })
}

fn anchor_for(
    point: Point,
    node_id: &str,
    node_rects: &HashMap<&str, (Point, f32, f32)>,
) -> Option<Anchor> {
    let (pos, width, height) = node_rects.get(node_id)?;
    Some(project_onto_perimeter(point, *pos, *width, *height))
}

/// Project an absolute point onto the perimeter of a node's bounding box,
/// yielding the nearest side and a normalized offset along it.
pub(super) fn project_onto_perimeter(point: Point, pos: Point, width: f32, height: f32) -> Anchor {
    let left = (point.x - pos.x).abs();
    let right = (point.x - (pos.x + width)).abs();
    let top = (point.y - pos.y).abs();
    let bottom = (point.y - (pos.y + height)).abs();

    let mut side = Side::Left;
    let mut best = left;
    for (candidate, distance) in [
        (Side::Right, right),
        (Side::Top, top),
        (Side::Bottom, bottom),
    ] {
        if distance < best {
            best = distance;
            side = candidate;
        }
    }

    let offset = match side {
        Side::Top | Side::Bottom => {
            if width > 0.0 {
                ((point.x - pos.x) / width).clamp(0.0, 1.0)
            } else {
                0.5
            }
        }
        Side::Left | Side::Right => {
            if height > 0.0 {
                ((point.y - pos.y) / height).clamp(0.0, 1.0)
            } else {
                0.5
            }
        }
    };
    Anchor { side, offset }
}

/// Drop middle points of collinear runs in a single O(n) pass. A middle point
/// survives only if the triangle it forms with its kept predecessor and its
/// successor is larger than the tolerance.
pub fn simplify_waypoints(points: &[Point]) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }
    let mut out = Vec::with_capacity(points.len());
    out.push(points[0]);
    for i in 1..points.len() - 1 {
        let a = out[out.len() - 1];
        let b = points[i];
        let c = points[i + 1];
        let cross = (b.x - a.x) * (c.y - b.y) - (b.y - a.y) * (c.x - b.x);
        if cross.abs() > COLLINEAR_TOLERANCE {
            out.push(b);
        }
    }
    out.push(points[points.len() - 1]);
    out
}
