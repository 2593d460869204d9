//! Pointer handling: hit testing, selection and hover.

use super::model::GraphModel;
use super::scene::Scene;
use super::types::Payment;
use egui::Pos2;

/// Extra pixels around an edge stroke that still count as a hit
const EDGE_HIT_TOLERANCE: f32 = 4.0;

/// What the pointer is over
#[derive(Debug, Clone, PartialEq)]
pub enum PointerTarget {
    Node(String),
    /// Payment id of the edge
    Edge(String),
    Empty,
}

/// Outbound notifications for the hosting view
#[derive(Debug, Clone, PartialEq)]
pub enum GraphEvent {
    /// An edge was clicked
    TransactionClicked(Payment),
    /// Selection changed, `None` when cleared
    NodeSelected(Option<String>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    Unselected,
    Selected(String),
}

#[derive(Debug, Default)]
pub struct InteractionController {
    selection: Selection,
    hovered: Option<String>,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selected(&self) -> Option<&str> {
        match &self.selection {
            Selection::Selected(id) => Some(id),
            Selection::Unselected => None,
        }
    }

    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    /// Apply a click and report what the host should hear about.
    ///
    /// Node clicks toggle or replace the selection, empty clicks clear it,
    /// edge clicks leave it alone and surface the payment.
    pub fn click(&mut self, target: PointerTarget, model: &GraphModel) -> Option<GraphEvent> {
        match target {
            PointerTarget::Empty => Some(self.clear_selection()),
            PointerTarget::Node(id) => {
                self.selection = match &self.selection {
                    Selection::Selected(current) if *current == id => Selection::Unselected,
                    _ => Selection::Selected(id),
                };
                Some(GraphEvent::NodeSelected(self.selected().map(str::to_owned)))
            }
            PointerTarget::Edge(id) => model
                .edge(&id)
                .map(|edge| GraphEvent::TransactionClicked(edge.payment.clone())),
        }
    }

    pub fn clear_selection(&mut self) -> GraphEvent {
        self.selection = Selection::Unselected;
        GraphEvent::NodeSelected(None)
    }

    pub fn hover(&mut self, node: Option<String>) {
        self.hovered = node;
    }

    /// Forget selection and hover, e.g. when the view is torn down
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Find what lies under `pos` in canvas coordinates.
///
/// Nodes are drawn above edges, so they win; among nodes the last drawn wins.
pub fn hit_test(scene: &Scene, pos: Pos2) -> PointerTarget {
    if let Some(node) = scene
        .nodes
        .iter()
        .rev()
        .find(|n| n.center.distance(pos) <= n.radius)
    {
        return PointerTarget::Node(node.id.clone());
    }

    scene
        .edges
        .iter()
        .map(|e| (e, distance_to_segment(pos, e.from, e.to)))
        .filter(|(e, d)| *d <= e.width / 2.0 + EDGE_HIT_TOLERANCE)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map_or(PointerTarget::Empty, |(e, _)| PointerTarget::Edge(e.id.clone()))
}

/// Node under `pos`, for hover tracking
pub fn node_at(scene: &Scene, pos: Pos2) -> Option<String> {
    match hit_test(scene, pos) {
        PointerTarget::Node(id) => Some(id),
        _ => None,
    }
}

fn distance_to_segment(p: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_sq();
    if len_sq <= 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}
