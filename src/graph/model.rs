//! Node/edge store derived from the payment list.
//!
//! Nodes are merged incrementally so their simulated positions survive
//! updates; edges are rebuilt wholesale from the current payments.

use super::types::{GraphEdge, GraphNode, NodeKind, Payment};
use egui::{Pos2, Vec2};
use rand::Rng;
use std::collections::{HashMap, HashSet};

/// Side length of the square around the canvas center where new nodes appear
const INITIAL_SPREAD: f32 = 100.0;

/// Outcome of one reconcile pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    pub nodes_added: usize,
    pub edges: usize,
    pub skipped: usize,
}

#[derive(Debug, Default)]
pub struct GraphModel {
    nodes: Vec<GraphNode>,
    /// Node key -> index in `nodes`
    index: HashMap<String, usize>,
    edges: Vec<GraphEdge>,
}

impl GraphModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge nodes for every payment and rebuild the edge list.
    ///
    /// Existing nodes keep their position and velocity. An edge is marked new
    /// only when its payment id was absent from the previous edge list and the
    /// payment is live.
    pub fn reconcile<R: Rng>(
        &mut self,
        payments: &[Payment],
        canvas_size: Vec2,
        rng: &mut R,
    ) -> ReconcileStats {
        let mut stats = ReconcileStats::default();
        let center = (canvas_size / 2.0).to_pos2();

        for payment in payments {
            if !payment.is_well_formed() {
                continue;
            }
            if self.ensure_node(&payment.user.id, &payment.user.name, NodeKind::User, center, rng) {
                stats.nodes_added += 1;
            }
            if self.ensure_node(
                &payment.description,
                &payment.description,
                NodeKind::Retailer,
                center,
                rng,
            ) {
                stats.nodes_added += 1;
            }
        }

        let previous: HashSet<&str> = self.edges.iter().map(|e| e.id.as_str()).collect();
        let mut edges = Vec::with_capacity(payments.len());
        for payment in payments {
            if !payment.is_well_formed() {
                tracing::debug!(payment = %payment.id, "skipping payment without user id or description");
                stats.skipped += 1;
                continue;
            }
            edges.push(GraphEdge {
                id: payment.id.clone(),
                source: payment.user.id.clone(),
                target: payment.description.clone(),
                payment: payment.clone(),
                is_new: payment.is_live && !previous.contains(payment.id.as_str()),
            });
        }

        stats.edges = edges.len();
        self.edges = edges;
        stats
    }

    /// Insert a node at a random point near `center` unless the key exists.
    /// Returns whether a node was created.
    fn ensure_node<R: Rng>(
        &mut self,
        id: &str,
        label: &str,
        kind: NodeKind,
        center: Pos2,
        rng: &mut R,
    ) -> bool {
        if self.index.contains_key(id) {
            return false;
        }
        let pos = Pos2::new(
            center.x + (rng.gen::<f32>() - 0.5) * INITIAL_SPREAD,
            center.y + (rng.gen::<f32>() - 0.5) * INITIAL_SPREAD,
        );
        self.index.insert(id.to_string(), self.nodes.len());
        self.nodes.push(GraphNode::new(id, label, kind, pos));
        true
    }

    /// Replace every node's highlight flag from the given key set
    pub fn set_highlighted(&mut self, ids: &HashSet<String>) {
        for node in &mut self.nodes {
            node.highlighted = ids.contains(&node.id);
        }
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [GraphNode] {
        &mut self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn edges_mut(&mut self) -> &mut [GraphEdge] {
        &mut self.edges
    }

    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.node_index(id).map(|i| &self.nodes[i])
    }

    pub fn edge(&self, id: &str) -> Option<&GraphEdge> {
        self.edges.iter().find(|e| e.id == id)
    }

    /// Keys of every node sharing an edge with `id`
    pub fn neighbors(&self, id: &str) -> HashSet<&str> {
        let mut out = HashSet::new();
        for edge in &self.edges {
            if edge.source == id {
                out.insert(edge.target.as_str());
            } else if edge.target == id {
                out.insert(edge.source.as_str());
            }
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Model holding exactly the given nodes and no edges
    #[cfg(test)]
    pub(crate) fn from_nodes(nodes: Vec<GraphNode>) -> Self {
        let index = nodes.iter().enumerate().map(|(i, n)| (n.id.clone(), i)).collect();
        Self {
            nodes,
            index,
            edges: Vec::new(),
        }
    }

    /// Replace the edge list without touching nodes, dangling endpoints allowed
    #[cfg(test)]
    pub(crate) fn with_edges(mut self, edges: Vec<GraphEdge>) -> Self {
        self.edges = edges;
        self
    }
}
