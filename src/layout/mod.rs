//! Graph auto-layout coordination.
//!
//! One pass flows diagram state through the converter, out to the worker-hosted
//! computation backend, and back through the reconciler (plus the merger when
//! only a selection was laid out). The diagram itself is only ever replaced
//! wholesale by the caller with the returned set; nothing here mutates it.

pub mod backend;
pub mod convert;
pub mod error;
pub mod graph;
pub mod merge;
pub mod reconcile;

use std::collections::HashSet;

use log::debug;

use crate::config::LayoutConfig;
use crate::ir::{Edge, Node};

use backend::Backend;
use error::LayoutError;

/// One layout invocation: the full diagram plus an optional selection to
/// restrict the pass to.
#[derive(Debug, Clone)]
pub struct LayoutRequest {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub config: LayoutConfig,
    pub selection: Option<HashSet<String>>,
}

/// Full replacement node/edge set, same ids, updated positions and routes.
#[derive(Debug, Clone)]
pub struct LayoutUpdate {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

pub struct LayoutService {
    backend: Backend,
}

impl LayoutService {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    pub fn layout(&self, request: LayoutRequest) -> Result<LayoutUpdate, LayoutError> {
        let LayoutRequest {
            nodes,
            edges,
            config,
            selection,
        } = request;

        if nodes.is_empty() {
            // Nothing to place; do not even initialize the backend.
            return Ok(LayoutUpdate { nodes, edges });
        }

        let scope = selection.map(|sel| effective_selection(&nodes, &sel));
        if scope.as_ref().is_some_and(HashSet::is_empty) {
            return Ok(LayoutUpdate { nodes, edges });
        }

        let (scoped_nodes, scoped_edges): (Vec<Node>, Vec<Edge>) = match &scope {
            Some(scope) => (
                nodes.iter().filter(|n| scope.contains(&n.id)).cloned().collect(),
                edges
                    .iter()
                    .filter(|e| scope.contains(&e.source) && scope.contains(&e.target))
                    .cloned()
                    .collect(),
            ),
            None => (nodes.clone(), edges.clone()),
        };

        debug!(
            "layout pass: {} nodes, {} edges ({})",
            scoped_nodes.len(),
            scoped_edges.len(),
            if scope.is_some() { "selection" } else { "full" }
        );

        let input = convert::build_layout_graph(&scoped_nodes, &scoped_edges, &config);
        let result = self.backend.layout(input)?;
        let reconciled = reconcile::reconcile(&result, &scoped_nodes, &scoped_edges, &config);

        match scope {
            Some(scope) => {
                let (merged_nodes, merged_edges) =
                    merge::merge_partial(&nodes, &edges, &scope, reconciled.nodes, reconciled.edges);
                Ok(LayoutUpdate {
                    nodes: merged_nodes,
                    edges: merged_edges,
                })
            }
            None => Ok(LayoutUpdate {
                nodes: reconciled.nodes,
                edges: reconciled.edges,
            }),
        }
    }
}

/// Selection scope: the ids the user picked plus the members of any picked
/// group, so a selected group moves as one piece.
fn effective_selection(nodes: &[Node], selection: &HashSet<String>) -> HashSet<String> {
    let mut scope: HashSet<String> = HashSet::with_capacity(selection.len());
    for node in nodes {
        if !selection.contains(&node.id) {
            continue;
        }
        scope.insert(node.id.clone());
        if let Some(children) = &node.children {
            scope.extend(children.iter().cloned());
        }
    }
    scope
}
