//! Declarative per-frame scene built from graph and interaction state.
//!
//! The painter in `app` only draws what [`project`] returns, so the same
//! model and selection always produce the same picture.

use super::interaction::InteractionController;
use super::model::GraphModel;
use super::types::{NodeKind, PaymentStatus};
use crate::theme;
use egui::{Color32, Pos2, Vec2};
use std::collections::{HashMap, HashSet};

/// Length of the one-shot entrance pulse on new edges, in seconds
pub const PULSE_DURATION: f64 = 1.5;

/// Tooltip offset from the hovered node center
const TOOLTIP_OFFSET: Vec2 = Vec2::new(15.0, -15.0);

/// Node radius by role
pub mod radius {
    pub const SELECTED: f32 = 14.0;
    pub const USER: f32 = 12.0;
    pub const RETAILER: f32 = 8.0;
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeShape {
    /// Payment id
    pub id: String,
    pub from: Pos2,
    pub to: Pos2,
    pub status: PaymentStatus,
    pub color: Color32,
    pub width: f32,
    pub opacity: f32,
    pub focused: bool,
    /// Start the entrance pulse this frame
    pub pulse: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeShape {
    pub id: String,
    pub center: Pos2,
    pub radius: f32,
    pub fill: Color32,
    pub stroke: Color32,
    pub stroke_width: f32,
    pub opacity: f32,
    pub selected: bool,
    pub highlighted: bool,
    pub focused: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub anchor: Pos2,
    pub label: String,
    pub kind: NodeKind,
}

/// Everything needed to draw one frame, edges first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    pub edges: Vec<EdgeShape>,
    pub nodes: Vec<NodeShape>,
    pub tooltip: Option<Tooltip>,
}

#[cfg(test)]
impl Scene {
    pub fn node(&self, id: &str) -> Option<&NodeShape> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn edge(&self, id: &str) -> Option<&EdgeShape> {
        self.edges.iter().find(|e| e.id == id)
    }
}

/// Build the scene for the current positions and interaction state.
///
/// Consumes every edge's `is_new` flag: the first projection that sees it
/// emits `pulse = true`, later ones do not.
pub fn project(model: &mut GraphModel, interaction: &InteractionController) -> Scene {
    let selected = interaction.selected();
    let focus: Option<HashSet<String>> = selected.map(|id| {
        let mut set: HashSet<String> = model.neighbors(id).into_iter().map(str::to_owned).collect();
        set.insert(id.to_owned());
        set
    });
    let is_focused = |id: &str| focus.as_ref().map_or(true, |f| f.contains(id));

    let mut edges = Vec::with_capacity(model.edges().len());
    let mut consumed = Vec::new();
    for (i, edge) in model.edges().iter().enumerate() {
        let (Some(source), Some(target)) = (model.node(&edge.source), model.node(&edge.target)) else {
            continue;
        };
        let touches_selected =
            selected.map_or(false, |id| edge.source == id || edge.target == id);
        let focused = selected.is_none() || touches_selected;
        if edge.is_new {
            consumed.push(i);
        }
        edges.push(EdgeShape {
            id: edge.id.clone(),
            from: source.pos,
            to: target.pos,
            status: edge.payment.status,
            color: edge.payment.status.color(),
            width: if touches_selected { 2.5 } else { 1.5 },
            opacity: if focused { 0.6 } else { 0.1 },
            focused,
            pulse: edge.is_new,
        });
    }
    for i in consumed {
        model.edges_mut()[i].is_new = false;
    }

    let nodes = model
        .nodes()
        .iter()
        .map(|node| {
            let is_selected = selected == Some(node.id.as_str());
            let focused = is_focused(&node.id);
            let (fill, mut stroke) = match node.kind {
                NodeKind::User => (theme::node::USER_FILL, theme::node::USER_STROKE),
                NodeKind::Retailer => (theme::node::RETAILER_FILL, theme::node::RETAILER_STROKE),
            };
            let mut stroke_width = if is_selected { 3.0 } else { 2.0 };
            if node.highlighted {
                stroke = theme::node::HIGHLIGHT_STROKE;
                stroke_width = 3.0;
            }
            NodeShape {
                id: node.id.clone(),
                center: node.pos,
                radius: match (is_selected, node.kind) {
                    (true, _) => radius::SELECTED,
                    (false, NodeKind::User) => radius::USER,
                    (false, NodeKind::Retailer) => radius::RETAILER,
                },
                fill,
                stroke,
                stroke_width,
                opacity: if focused { 1.0 } else { 0.2 },
                selected: is_selected,
                highlighted: node.highlighted,
                focused,
            }
        })
        .collect();

    let tooltip = interaction.hovered().and_then(|id| model.node(id)).map(|node| Tooltip {
        anchor: node.pos + TOOLTIP_OFFSET,
        label: node.label.clone(),
        kind: node.kind,
    });

    Scene {
        edges,
        nodes,
        tooltip,
    }
}

/// Opacity of a pulsing edge `t` seconds into its entrance animation:
/// 0.1 → 0.8 → 0.1, linear in each half
pub fn pulse_opacity(t: f64) -> f32 {
    let half = PULSE_DURATION / 2.0;
    let t = t.clamp(0.0, PULSE_DURATION);
    let phase = if t <= half { t / half } else { (PULSE_DURATION - t) / half };
    (0.1 + 0.7 * phase) as f32
}

/// Alpha multiplier for the highlight stroke, cycling once per second
pub fn highlight_alpha(time: f64) -> f32 {
    (0.65 + 0.35 * (time * std::f64::consts::TAU).sin()) as f32
}

/// Running entrance pulses, keyed by payment id
#[derive(Debug, Default)]
pub struct EdgePulses {
    started: HashMap<String, f64>,
}

impl EdgePulses {
    /// Register pulses requested by the scene and drop finished ones
    pub fn update(&mut self, scene: &Scene, now: f64) {
        self.started.retain(|_, start| now - *start < PULSE_DURATION);
        for edge in scene.edges.iter().filter(|e| e.pulse) {
            self.started.insert(edge.id.clone(), now);
        }
    }

    /// Opacity override for an edge while its pulse runs
    pub fn opacity(&self, id: &str, now: f64) -> Option<f32> {
        let start = self.started.get(id)?;
        let t = now - start;
        (t < PULSE_DURATION).then(|| pulse_opacity(t))
    }

    pub fn is_animating(&self) -> bool {
        !self.started.is_empty()
    }

    pub fn clear(&mut self) {
        self.started.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::interaction::PointerTarget;
    use crate::graph::model::tests::payment;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn model() -> GraphModel {
        let mut rng = StdRng::seed_from_u64(11);
        let mut model = GraphModel::new();
        model.reconcile(
            &[
                payment("p1", "userA", "retailerB", false),
                payment("p2", "userC", "retailerD", true),
            ],
            Vec2::new(800.0, 600.0),
            &mut rng,
        );
        model
    }

    #[test]
    fn is_new_is_consumed_by_the_first_projection() {
        let mut model = model();
        let interaction = InteractionController::new();

        let first = project(&mut model, &interaction);
        assert!(first.edge("p2").unwrap().pulse);
        assert!(!first.edge("p1").unwrap().pulse);
        assert!(!model.edge("p2").unwrap().is_new);

        let second = project(&mut model, &interaction);
        assert!(!second.edge("p2").unwrap().pulse);
    }

    #[test]
    fn everything_is_focused_without_selection() {
        let mut model = model();
        let scene = project(&mut model, &InteractionController::new());

        assert!(scene.edges.iter().all(|e| e.focused && e.opacity == 0.6 && e.width == 1.5));
        assert!(scene.nodes.iter().all(|n| n.focused && n.opacity == 1.0));
        assert_eq!(scene.node("userA").unwrap().radius, radius::USER);
        assert_eq!(scene.node("retailerB").unwrap().radius, radius::RETAILER);
    }

    #[test]
    fn selection_dims_everything_outside_the_focus_set() {
        let mut model = model();
        let mut interaction = InteractionController::new();
        interaction.click(PointerTarget::Node("userA".into()), &model);

        let scene = project(&mut model, &interaction);
        let selected = scene.node("userA").unwrap();
        assert!(selected.selected);
        assert_eq!(selected.radius, radius::SELECTED);
        assert_eq!(selected.stroke_width, 3.0);
        assert!(scene.node("retailerB").unwrap().focused);
        let far = scene.node("userC").unwrap();
        assert!(!far.focused);
        assert_eq!(far.opacity, 0.2);

        let near_edge = scene.edge("p1").unwrap();
        assert_eq!((near_edge.width, near_edge.opacity), (2.5, 0.6));
        let far_edge = scene.edge("p2").unwrap();
        assert_eq!((far_edge.width, far_edge.opacity), (1.5, 0.1));
        // Dimmed shapes stay in the scene
        assert_eq!(scene.nodes.len(), 4);
        assert_eq!(scene.edges.len(), 2);
    }

    #[test]
    fn highlight_is_independent_of_selection() {
        let mut model = model();
        model.set_highlighted(&HashSet::from(["userC".to_string()]));
        let scene = project(&mut model, &InteractionController::new());

        let node = scene.node("userC").unwrap();
        assert!(node.highlighted && !node.selected);
        assert_eq!(node.stroke, theme::node::HIGHLIGHT_STROKE);
        assert_eq!(node.stroke_width, 3.0);
    }

    #[test]
    fn edge_color_follows_status() {
        let mut model = model();
        let scene = project(&mut model, &InteractionController::new());
        assert_eq!(scene.edge("p1").unwrap().color, PaymentStatus::Settled.color());
    }

    #[test]
    fn tooltip_tracks_hovered_node() {
        let mut model = model();
        let mut interaction = InteractionController::new();
        interaction.hover(Some("retailerB".into()));

        let scene = project(&mut model, &interaction);
        let tooltip = scene.tooltip.unwrap();
        let pos = model.node("retailerB").unwrap().pos;
        assert_eq!(tooltip.anchor, Pos2::new(pos.x + 15.0, pos.y - 15.0));
        assert_eq!(tooltip.kind, NodeKind::Retailer);
    }

    #[test]
    fn edges_with_missing_endpoints_are_left_out() {
        use crate::graph::types::{GraphEdge, GraphNode};

        let dangling = GraphEdge {
            id: "p9".into(),
            source: "userA".into(),
            target: "nowhere".into(),
            payment: payment("p9", "userA", "nowhere", true),
            is_new: true,
        };
        let mut model = GraphModel::from_nodes(vec![GraphNode::new(
            "userA",
            "userA name",
            NodeKind::User,
            Pos2::new(100.0, 100.0),
        )])
        .with_edges(vec![dangling]);

        let scene = project(&mut model, &InteractionController::new());
        assert!(scene.edges.is_empty());
        assert_eq!(scene.nodes.len(), 1);
    }

    #[test]
    fn pulse_rises_then_falls() {
        assert!((pulse_opacity(0.0) - 0.1).abs() < 1e-6);
        assert!((pulse_opacity(0.75) - 0.8).abs() < 1e-6);
        assert!((pulse_opacity(1.5) - 0.1).abs() < 1e-6);
    }

    #[test]
    fn pulses_expire() {
        let mut model = model();
        let scene = project(&mut model, &InteractionController::new());
        let mut pulses = EdgePulses::default();
        pulses.update(&scene, 10.0);

        assert!(pulses.opacity("p2", 10.75).is_some());
        assert!(pulses.opacity("p1", 10.75).is_none());

        let quiet = project(&mut model, &InteractionController::new());
        pulses.update(&quiet, 12.0);
        assert!(pulses.opacity("p2", 12.0).is_none());
        assert!(!pulses.is_animating());
    }
}
