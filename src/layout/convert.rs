//! Diagram-to-layout-graph conversion.
//!
//! Groups fold into compound children of the root graph; edges internal to a
//! group live on the group, everything else (including cross-group edges) on
//! the root so the algorithm can see both endpoints. The diagram itself is
//! never mutated here.

use std::collections::{BTreeMap, HashMap, HashSet};

use log::warn;

use crate::config::{Direction, LayoutConfig};
use crate::ir::{Edge, Node};

use super::graph::{LayoutGraph, LayoutGraphEdge};

/// Spacing scale applied inside group sub-graphs so members sit tighter than
/// top-level branches.
const GROUP_SPACING_SCALE: f32 = 0.5;

pub fn build_layout_graph(nodes: &[Node], edges: &[Edge], config: &LayoutConfig) -> LayoutGraph {
    let by_id: HashMap<&str, &Node> = nodes.iter().map(|n| (n.id.as_str(), n)).collect();

    let mut root = LayoutGraph::container("root");
    root.layout_options = layout_options(config, false);

    // Resolve each group's children first so membership decides what is left
    // at the root level. A bad child reference never fails the conversion.
    let mut grouped: HashSet<&str> = HashSet::new();
    let mut group_members: Vec<(&Node, Vec<&Node>)> = Vec::new();
    for group in nodes.iter().filter(|n| n.is_group()) {
        let child_ids = group.children.as_deref().unwrap_or_default();
        let mut members = Vec::with_capacity(child_ids.len());
        for child_id in child_ids {
            let Some(child) = by_id.get(child_id.as_str()) else {
                warn!("group {} references unknown child {child_id}, skipping", group.id);
                continue;
            };
            if child.is_group() {
                warn!(
                    "group {} nests group {child_id}; nested groups are flattened to the root",
                    group.id
                );
                continue;
            }
            if !grouped.insert(child.id.as_str()) {
                warn!("node {child_id} already belongs to a group, skipping duplicate membership");
                continue;
            }
            members.push(*child);
        }
        group_members.push((group, members));
    }

    for (group, members) in &group_members {
        let member_set: HashSet<&str> = members.iter().map(|n| n.id.as_str()).collect();
        let mut sub = LayoutGraph::container(group.id.clone());
        sub.layout_options = layout_options(config, true);
        for member in members {
            let (width, height) = member.size();
            sub.children.push(LayoutGraph::leaf(member.id.clone(), width, height));
        }
        for edge in edges {
            if member_set.contains(edge.source.as_str()) && member_set.contains(edge.target.as_str())
            {
                sub.edges
                    .push(LayoutGraphEdge::new(edge.id.clone(), edge.source.clone(), edge.target.clone()));
            }
        }
        root.children.push(sub);
    }

    for node in nodes {
        if node.is_group() || grouped.contains(node.id.as_str()) {
            continue;
        }
        let (width, height) = node.size();
        root.children.push(LayoutGraph::leaf(node.id.clone(), width, height));
    }

    // Everything not internal to a single group routes at the outer level.
    let same_group =
        |edge: &Edge| -> bool {
            group_members.iter().any(|(_, members)| {
                let mut source_in = false;
                let mut target_in = false;
                for member in members {
                    source_in |= member.id == edge.source;
                    target_in |= member.id == edge.target;
                }
                source_in && target_in
            })
        };
    for edge in edges {
        if same_group(edge) {
            continue;
        }
        root.edges
            .push(LayoutGraphEdge::new(edge.id.clone(), edge.source.clone(), edge.target.clone()));
    }

    root
}

fn layout_options(config: &LayoutConfig, tight: bool) -> BTreeMap<String, String> {
    let scale = if tight { GROUP_SPACING_SCALE } else { 1.0 };
    let mut options = BTreeMap::new();
    if config.direction.is_radial() {
        options.insert("elk.algorithm".into(), "radial".into());
    } else {
        options.insert("elk.algorithm".into(), "layered".into());
        options.insert("elk.direction".into(), config.direction.option_token().into());
        options.insert("elk.edgeRouting".into(), "ORTHOGONAL".into());
        options.insert(
            "elk.layered.spacing.nodeNodeBetweenLayers".into(),
            format_spacing(config.layer_spacing * scale),
        );
    }
    options.insert(
        "elk.spacing.nodeNode".into(),
        format_spacing(config.node_spacing * scale),
    );
    options
}

fn format_spacing(value: f32) -> String {
    // The option protocol is textual; keep values terse but lossless enough.
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Curve hint exposed to the renderer for edges produced under `direction`.
pub fn curve_for_direction(direction: Direction) -> crate::ir::CurveStyle {
    if direction.is_radial() {
        crate::ir::CurveStyle::Smooth
    } else {
        crate::ir::CurveStyle::Step
    }
}
