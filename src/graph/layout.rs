//! Force-directed graph layout algorithm.
//!
//! One tick applies, in order:
//! - Repulsion between every ordered pair of nodes (inverse square)
//! - Gravity toward the canvas center
//! - Spring attraction along edges toward `link_distance`
//! - Velocity damping and integration
//! - Clamping positions inside the canvas margin

use super::model::GraphModel;
use super::quadtree::Quadtree;
use egui::{Pos2, Vec2};
use serde::{Deserialize, Serialize};

/// How pairwise repulsion is evaluated
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RepulsionMode {
    /// Every ordered pair, O(n²)
    Exact,
    /// Quadtree approximation, O(n log n)
    BarnesHut { theta: f32 },
}

impl Default for RepulsionMode {
    fn default() -> Self {
        RepulsionMode::Exact
    }
}

/// Simulation parameters, fixed for the lifetime of a layout
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Pairwise repulsive force coefficient
    pub repulsion: f32,
    /// Rest length for edge springs
    pub link_distance: f32,
    /// Fraction of the center-seeking offset added to velocity per tick
    pub gravity: f32,
    /// Per-tick velocity multiplier in [0, 1]
    pub friction: f32,
    /// Spring stiffness along edges
    pub spring_constant: f32,
    /// Minimum distance kept between a node and the canvas edges
    pub margin: f32,
    pub repulsion_mode: RepulsionMode,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            repulsion: 300.0,
            link_distance: 120.0,
            gravity: 0.05,
            friction: 0.8,
            spring_constant: 0.01,
            margin: 15.0,
            repulsion_mode: RepulsionMode::Exact,
        }
    }
}

/// Force-directed layout stepping a [`GraphModel`] in place
#[derive(Debug, Clone, Default)]
pub struct ForceLayout {
    config: SimulationConfig,
}

impl ForceLayout {
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    /// Advance every node by one tick.
    ///
    /// Does nothing until both canvas dimensions are known.
    pub fn step(&self, model: &mut GraphModel, canvas_size: Vec2) {
        if canvas_size.x <= 0.0 || canvas_size.y <= 0.0 || model.is_empty() {
            return;
        }
        let cfg = &self.config;
        let center = (canvas_size / 2.0).to_pos2();

        // Forces only read positions, so they can be computed up front
        let positions: Vec<Pos2> = model.nodes().iter().map(|n| n.pos).collect();
        let mut deltas = match cfg.repulsion_mode {
            RepulsionMode::Exact => self.exact_repulsion(&positions),
            RepulsionMode::BarnesHut { theta } => {
                let tree = Quadtree::build(&positions, theta);
                positions
                    .iter()
                    .map(|&pos| tree.calculate_force(pos, cfg.repulsion))
                    .collect()
            }
        };

        for (delta, &pos) in deltas.iter_mut().zip(&positions) {
            *delta += (center - pos) * cfg.gravity;
        }

        for edge in model.edges() {
            let (Some(s), Some(t)) = (model.node_index(&edge.source), model.node_index(&edge.target))
            else {
                continue;
            };
            let offset = positions[t] - positions[s];
            let distance = offset.length();
            if distance <= 0.0 {
                continue;
            }
            let force = offset / distance * ((distance - cfg.link_distance) * cfg.spring_constant);
            deltas[s] += force;
            deltas[t] -= force;
        }

        let max = canvas_size - Vec2::splat(cfg.margin);
        for (node, delta) in model.nodes_mut().iter_mut().zip(deltas) {
            node.vel = (node.vel + delta) * cfg.friction;
            node.pos += node.vel;
            // Clip position only; velocity keeps pushing against the wall
            node.pos.x = cfg.margin.max(max.x.min(node.pos.x));
            node.pos.y = cfg.margin.max(max.y.min(node.pos.y));
        }
    }

    /// Velocity change on each node from every other node.
    ///
    /// Each unordered pair is visited twice, once per direction, and each
    /// visit only pushes the first node of the pair.
    fn exact_repulsion(&self, positions: &[Pos2]) -> Vec<Vec2> {
        let mut deltas = vec![Vec2::ZERO; positions.len()];
        for (i, &a) in positions.iter().enumerate() {
            for (j, &b) in positions.iter().enumerate() {
                if i == j {
                    continue;
                }
                let offset = b - a;
                let distance = offset.length();
                if distance > 0.0 {
                    let magnitude = self.config.repulsion / (distance * distance);
                    deltas[i] -= offset / distance * magnitude;
                }
            }
        }
        deltas
    }

    /// Sum of squared speeds, useful to tell a settled layout from a moving one
    pub fn kinetic_energy(model: &GraphModel) -> f32 {
        model.nodes().iter().map(|n| n.vel.length_sq()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::model::tests::payment;
    use crate::graph::types::{GraphEdge, GraphNode, NodeKind};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const CANVAS: Vec2 = Vec2::new(1000.0, 800.0);

    /// Model with nodes pinned at exact coordinates
    fn model_with(points: &[(&str, f32, f32)], edges: &[(&str, &str, &str)]) -> GraphModel {
        let mut rng = StdRng::seed_from_u64(0);
        let mut model = GraphModel::new();
        let payments: Vec<_> = edges
            .iter()
            .map(|(id, user, retailer)| payment(id, user, retailer, false))
            .collect();
        model.reconcile(&payments, CANVAS, &mut rng);
        for &(id, x, y) in points {
            if let Some(i) = model.node_index(id) {
                let node = &mut model.nodes_mut()[i];
                node.pos = Pos2::new(x, y);
                node.vel = Vec2::ZERO;
            }
        }
        model
    }

    /// Two nodes with no edge between them
    fn lone_pair(a: Pos2, b: Pos2) -> GraphModel {
        GraphModel::from_nodes(vec![
            GraphNode::new("a", "a", NodeKind::User, a),
            GraphNode::new("b", "b", NodeKind::Retailer, b),
        ])
    }

    fn no_gravity() -> SimulationConfig {
        SimulationConfig {
            gravity: 0.0,
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn test_repulsion_is_equal_and_opposite() {
        let mut model = lone_pair(Pos2::new(450.0, 400.0), Pos2::new(550.0, 400.0));
        let layout = ForceLayout::new(no_gravity());
        layout.step(&mut model, CANVAS);

        let va = model.node("a").unwrap().vel;
        let vb = model.node("b").unwrap().vel;
        assert!((va + vb).length() < 1e-6, "{va:?} vs {vb:?}");
        // 300 / 100² = 0.03, damped by 0.8
        assert!((va.length() - 0.024).abs() < 1e-6, "{va:?}");
        assert!(va.x < 0.0 && vb.x > 0.0);
    }

    #[test]
    fn test_coincident_nodes_get_no_repulsion() {
        let mut model = lone_pair(Pos2::new(500.0, 400.0), Pos2::new(500.0, 400.0));
        let layout = ForceLayout::new(no_gravity());
        layout.step(&mut model, CANVAS);

        for node in model.nodes() {
            assert_eq!(node.vel, Vec2::ZERO);
            assert!(node.pos.x.is_finite() && node.pos.y.is_finite());
        }
    }

    #[test]
    fn test_spring_converges_to_link_distance() {
        let mut model = model_with(
            &[("userA", 350.0, 400.0), ("retailerB", 650.0, 400.0)],
            &[("p1", "userA", "retailerB")],
        );
        let layout = ForceLayout::new(SimulationConfig {
            repulsion: 0.0,
            gravity: 0.0,
            ..SimulationConfig::default()
        });
        let separation = |m: &GraphModel| {
            m.node("userA").unwrap().pos.distance(m.node("retailerB").unwrap().pos)
        };

        let mut previous = separation(&model);
        for _ in 0..300 {
            layout.step(&mut model, CANVAS);
            let current = separation(&model);
            if previous > 122.0 {
                assert!(current <= previous, "separation grew from {previous} to {current}");
            }
            previous = current;
        }
        assert!((previous - 120.0).abs() < 0.5, "settled at {previous}");
    }

    fn edge(id: &str, source: &str, target: &str) -> GraphEdge {
        GraphEdge {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            payment: payment(id, source, target, false),
            is_new: false,
        }
    }

    #[test]
    fn test_spring_between_coincident_nodes_is_skipped() {
        let mut model = lone_pair(Pos2::new(500.0, 400.0), Pos2::new(500.0, 400.0))
            .with_edges(vec![edge("p1", "a", "b")]);
        ForceLayout::new(no_gravity()).step(&mut model, CANVAS);

        for node in model.nodes() {
            assert_eq!(node.vel, Vec2::ZERO);
            assert_eq!(node.pos, Pos2::new(500.0, 400.0));
        }
    }

    #[test]
    fn test_edge_with_missing_endpoint_is_skipped() {
        let mut model = GraphModel::from_nodes(vec![GraphNode::new(
            "a",
            "a",
            NodeKind::User,
            Pos2::new(300.0, 300.0),
        )])
        .with_edges(vec![edge("p1", "a", "ghost"), edge("p2", "ghost", "a")]);
        ForceLayout::new(no_gravity()).step(&mut model, CANVAS);

        let node = model.node("a").unwrap();
        assert_eq!(node.vel, Vec2::ZERO);
        assert_eq!(node.pos, Pos2::new(300.0, 300.0));
    }

    #[test]
    fn test_gravity_pulls_toward_center() {
        let mut model = lone_pair(Pos2::new(100.0, 100.0), Pos2::new(100.0, 100.0));
        let layout = ForceLayout::new(SimulationConfig::default());
        layout.step(&mut model, CANVAS);

        let node = model.node("a").unwrap();
        assert!(node.vel.x > 0.0 && node.vel.y > 0.0);
    }

    #[test]
    fn test_boundary_clamp_keeps_velocity() {
        let mut model = lone_pair(Pos2::new(990.0, 400.0), Pos2::new(500.0, 400.0));
        let i = model.node_index("a").unwrap();
        model.nodes_mut()[i].vel = Vec2::new(50.0, 0.0);
        let layout = ForceLayout::new(SimulationConfig {
            repulsion: 0.0,
            gravity: 0.0,
            ..SimulationConfig::default()
        });
        layout.step(&mut model, CANVAS);

        let node = model.node("a").unwrap();
        assert_eq!(node.pos.x, 985.0);
        assert_eq!(node.vel, Vec2::new(40.0, 0.0));
    }

    #[test]
    fn test_zero_canvas_is_a_no_op() {
        let mut model = lone_pair(Pos2::new(10.0, 10.0), Pos2::new(20.0, 20.0));
        let before: Vec<_> = model.nodes().iter().map(|n| n.pos).collect();
        ForceLayout::default().step(&mut model, Vec2::ZERO);
        let after: Vec<_> = model.nodes().iter().map(|n| n.pos).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_step_is_deterministic() {
        let edges = [("p1", "userA", "retailerB"), ("p2", "userC", "retailerB")];
        let points = [
            ("userA", 300.0, 300.0),
            ("userC", 700.0, 500.0),
            ("retailerB", 520.0, 380.0),
        ];
        let mut first = model_with(&points, &edges);
        let mut second = model_with(&points, &edges);
        let layout = ForceLayout::default();
        for _ in 0..20 {
            layout.step(&mut first, CANVAS);
            layout.step(&mut second, CANVAS);
        }
        for (a, b) in first.nodes().iter().zip(second.nodes()) {
            assert_eq!(a.pos, b.pos);
            assert_eq!(a.vel, b.vel);
        }
    }

    #[test]
    fn test_barnes_hut_pushes_the_same_way() {
        let trio = || {
            GraphModel::from_nodes(vec![
                GraphNode::new("a", "a", NodeKind::User, Pos2::new(450.0, 400.0)),
                GraphNode::new("b", "b", NodeKind::Retailer, Pos2::new(550.0, 400.0)),
                GraphNode::new("c", "c", NodeKind::User, Pos2::new(500.0, 300.0)),
            ])
        };
        let mut exact = trio();
        let mut approx = trio();

        ForceLayout::new(no_gravity()).step(&mut exact, CANVAS);
        ForceLayout::new(SimulationConfig {
            repulsion_mode: RepulsionMode::BarnesHut { theta: 0.5 },
            ..no_gravity()
        })
        .step(&mut approx, CANVAS);

        for (e, a) in exact.nodes().iter().zip(approx.nodes()) {
            assert!(e.vel.dot(a.vel) > 0.0, "{:?} vs {:?}", e.vel, a.vel);
        }
    }

    #[test]
    fn test_barnes_hut_coarse_theta_ignores_own_mass() {
        // At theta 1 the root cell is wide enough to be approximated from
        // inside; each node must still only feel its partner
        let pair = || lone_pair(Pos2::new(450.0, 400.0), Pos2::new(550.0, 400.0));
        let mut exact = pair();
        let mut approx = pair();

        ForceLayout::new(no_gravity()).step(&mut exact, CANVAS);
        ForceLayout::new(SimulationConfig {
            repulsion_mode: RepulsionMode::BarnesHut { theta: 1.0 },
            ..no_gravity()
        })
        .step(&mut approx, CANVAS);

        for (e, a) in exact.nodes().iter().zip(approx.nodes()) {
            assert!((e.vel - a.vel).length() < 1e-4, "{:?} vs {:?}", e.vel, a.vel);
        }
    }

    #[test]
    fn test_config_defaults_fill_missing_fields() {
        let cfg: SimulationConfig = serde_json::from_str(r#"{"gravity": 0.1}"#).unwrap();
        assert_eq!(cfg.gravity, 0.1);
        assert_eq!(cfg.link_distance, 120.0);
        assert_eq!(cfg.repulsion_mode, RepulsionMode::Exact);

        let cfg: SimulationConfig =
            serde_json::from_str(r#"{"repulsion_mode": {"kind": "barnes_hut", "theta": 0.8}}"#).unwrap();
        assert_eq!(cfg.repulsion_mode, RepulsionMode::BarnesHut { theta: 0.8 });
    }
}
