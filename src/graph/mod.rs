//! Payment relationship graph: model, force layout, scene projection and
//! pointer interaction, owned together by [`LedgerGraph`].

pub mod interaction;
pub mod layout;
pub mod model;
pub mod quadtree;
pub mod scene;
pub mod types;

pub use interaction::GraphEvent;
pub use layout::SimulationConfig;

use interaction::InteractionController;
use layout::ForceLayout;
use model::GraphModel;
use scene::{EdgePulses, Scene};
use types::Payment;

use egui::{Pos2, Vec2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;

/// Graph state for one mounted visualization.
///
/// Created when the view appears and reset or dropped when it goes away, so
/// nothing leaks between unrelated instances.
pub struct LedgerGraph {
    model: GraphModel,
    layout: ForceLayout,
    interaction: InteractionController,
    pulses: EdgePulses,
    rng: StdRng,
    canvas_size: Vec2,
    /// Node ids flagged by anomaly detection, reapplied to nodes created later
    highlighted: HashSet<String>,
    /// Payments changed since the last reconcile
    dirty: bool,
}

impl LedgerGraph {
    pub fn new(config: SimulationConfig, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            model: GraphModel::new(),
            layout: ForceLayout::new(config),
            interaction: InteractionController::new(),
            pulses: EdgePulses::default(),
            rng,
            canvas_size: Vec2::ZERO,
            highlighted: HashSet::new(),
            dirty: true,
        }
    }

    /// Merge the current payment list into the graph
    pub fn sync(&mut self, payments: &[Payment]) {
        let stats = self.model.reconcile(payments, self.canvas_size, &mut self.rng);
        if stats.nodes_added > 0 {
            self.model.set_highlighted(&self.highlighted);
        }
        self.dirty = false;
        if stats.nodes_added > 0 || stats.skipped > 0 {
            tracing::debug!(
                nodes_added = stats.nodes_added,
                edges = stats.edges,
                skipped = stats.skipped,
                total_nodes = self.model.nodes().len(),
                "graph reconciled"
            );
        }
    }

    /// Flag that the payment list changed; the next frame reconciles
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_canvas_size(&mut self, size: Vec2) {
        if size != self.canvas_size {
            tracing::debug!(width = size.x, height = size.y, "canvas resized");
            self.canvas_size = size;
        }
    }

    /// Flag these node ids, including ones that only appear on a later sync
    pub fn set_highlighted(&mut self, ids: &HashSet<String>) {
        self.highlighted.clone_from(ids);
        self.model.set_highlighted(&self.highlighted);
    }

    /// One simulation step followed by the scene for this frame
    pub fn frame(&mut self, now: f64, simulate: bool) -> Scene {
        if simulate {
            self.layout.step(&mut self.model, self.canvas_size);
        }
        let scene = scene::project(&mut self.model, &self.interaction);
        self.pulses.update(&scene, now);
        scene
    }

    /// Route a click at canvas-local `pos`
    pub fn click(&mut self, scene: &Scene, pos: Pos2) -> Option<GraphEvent> {
        let target = interaction::hit_test(scene, pos);
        self.interaction.click(target, &self.model)
    }

    /// Track the node under the pointer, `None` when the pointer left
    pub fn hover(&mut self, scene: &Scene, pos: Option<Pos2>) {
        let node = pos.and_then(|p| interaction::node_at(scene, p));
        self.interaction.hover(node);
    }

    pub fn clear_selection(&mut self) -> GraphEvent {
        self.interaction.clear_selection()
    }

    pub fn selected(&self) -> Option<&str> {
        self.interaction.selected()
    }

    pub fn pulses(&self) -> &EdgePulses {
        &self.pulses
    }

    pub fn model(&self) -> &GraphModel {
        &self.model
    }

    pub fn kinetic_energy(&self) -> f32 {
        ForceLayout::kinetic_energy(&self.model)
    }

    /// Drop all nodes, edges and interaction state
    pub fn reset(&mut self) {
        self.model = GraphModel::new();
        self.interaction.reset();
        self.pulses.clear();
        self.highlighted.clear();
        self.dirty = true;
        tracing::info!("graph reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::model::tests::payment;

    #[test]
    fn frame_consumes_pulses_once_and_keeps_them_animating() {
        let mut graph = LedgerGraph::new(SimulationConfig::default(), Some(3));
        graph.set_canvas_size(Vec2::new(800.0, 600.0));
        graph.sync(&[payment("p1", "userA", "retailerB", true)]);

        let first = graph.frame(0.0, true);
        assert!(first.edge("p1").unwrap().pulse);
        assert!(graph.pulses().opacity("p1", 0.5).is_some());

        let second = graph.frame(0.016, true);
        assert!(!second.edge("p1").unwrap().pulse);
        assert!(graph.pulses().is_animating());
    }

    #[test]
    fn click_on_node_then_empty_space() {
        let mut graph = LedgerGraph::new(SimulationConfig::default(), Some(4));
        graph.set_canvas_size(Vec2::new(800.0, 600.0));
        graph.sync(&[payment("p1", "userA", "retailerB", false)]);
        // Let the pair spread out so their circles do not overlap
        for i in 0..200 {
            graph.frame(i as f64 / 60.0, true);
        }
        let scene = graph.frame(4.0, false);

        let user = scene.node("userA").unwrap().center;
        let event = graph.click(&scene, user);
        assert_eq!(event, Some(GraphEvent::NodeSelected(Some("userA".into()))));
        assert_eq!(graph.selected(), Some("userA"));

        let event = graph.click(&scene, Pos2::new(5.0, 5.0));
        assert_eq!(event, Some(GraphEvent::NodeSelected(None)));
        assert_eq!(graph.selected(), None);
    }

    #[test]
    fn highlight_set_before_sync_reaches_new_nodes() {
        let mut graph = LedgerGraph::new(SimulationConfig::default(), Some(6));
        graph.set_canvas_size(Vec2::new(800.0, 600.0));
        graph.set_highlighted(&HashSet::from(["userA".to_string()]));
        graph.sync(&[payment("p1", "userA", "retailerB", false)]);

        let scene = graph.frame(0.0, true);
        assert!(scene.node("userA").unwrap().highlighted);
        assert!(!scene.node("retailerB").unwrap().highlighted);

        // Later nodes pick up the stored set too
        graph.set_highlighted(&HashSet::from(["userA".to_string(), "userC".to_string()]));
        graph.sync(&[
            payment("p1", "userA", "retailerB", false),
            payment("p2", "userC", "retailerB", false),
        ]);
        let scene = graph.frame(0.016, true);
        assert!(scene.node("userC").unwrap().highlighted);
    }

    #[test]
    fn reset_forgets_everything() {
        let mut graph = LedgerGraph::new(SimulationConfig::default(), Some(5));
        graph.set_canvas_size(Vec2::new(800.0, 600.0));
        graph.sync(&[payment("p1", "userA", "retailerB", false)]);
        assert!(!graph.is_dirty());

        graph.reset();
        assert!(graph.model().is_empty());
        assert!(graph.is_dirty());
        assert_eq!(graph.selected(), None);
    }
}
