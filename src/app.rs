//! Main application state and UI.

use crate::anomaly::{self, Anomaly};
use crate::feed::{self, PaymentFeed};
use crate::graph::scene::{highlight_alpha, Scene};
use crate::graph::types::{NodeKind, Payment, PaymentStatus};
use crate::graph::{GraphEvent, LedgerGraph};
use crate::settings::Settings;
use crate::theme;
use eframe::egui::{self, Color32, Pos2, Stroke, Vec2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;

/// Startup overrides from the command line; never written back to settings
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    pub payments: Option<PathBuf>,
    pub seed: Option<u64>,
    pub no_live: bool,
    pub mock_count: Option<usize>,
}

pub struct LedgerApp {
    feed: PaymentFeed,
    graph: LedgerGraph,
    anomalies: Vec<Anomaly>,

    /// Scene painted last frame; pointer input is matched against it
    last_scene: Option<Scene>,
    /// Payment shown in the detail window
    detail: Option<Payment>,
    paused: bool,

    // Settings persistence
    settings: Settings,
    settings_dirty: bool,
}

impl LedgerApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, options: LaunchOptions) -> Self {
        let settings = Settings::load();

        let mut feed_config = settings.feed.clone();
        if options.no_live {
            feed_config.live_enabled = false;
        }
        if let Some(count) = options.mock_count {
            feed_config.mock_payment_count = count;
        }

        let feed_rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let feed = match options.payments.as_deref().map(feed::load_payments) {
            Some(Ok(payments)) => PaymentFeed::with_payments(payments, feed_config, feed_rng),
            Some(Err(e)) => {
                tracing::warn!("{e:#}, falling back to mock payments");
                PaymentFeed::mock(feed_config, feed_rng)
            }
            None => PaymentFeed::mock(feed_config, feed_rng),
        };

        let graph = LedgerGraph::new(settings.simulation, options.seed.map(|s| s.wrapping_add(1)));

        Self {
            feed,
            graph,
            anomalies: Vec::new(),
            last_scene: None,
            detail: None,
            paused: false,
            settings,
            settings_dirty: false,
        }
    }

    fn refresh_anomalies(&mut self) {
        let anomalies = anomaly::detect(self.feed.payments(), &self.settings.anomaly);
        if anomalies.len() != self.anomalies.len() {
            tracing::debug!(count = anomalies.len(), "anomalies updated");
        }
        self.graph.set_highlighted(&anomaly::highlighted_ids(&anomalies));
        self.anomalies = anomalies;
    }

    fn handle_event(&mut self, event: GraphEvent) {
        match event {
            GraphEvent::TransactionClicked(payment) => {
                tracing::info!(id = %payment.id, "transaction selected");
                self.detail = Some(payment);
            }
            GraphEvent::NodeSelected(Some(id)) => tracing::debug!(%id, "node focused"),
            GraphEvent::NodeSelected(None) => tracing::debug!("focus cleared"),
        }
    }

    fn render_sidebar(&mut self, ui: &mut egui::Ui) {
        ui.heading("Ledger Visualizer");
        ui.add_space(10.0);

        let model = self.graph.model();
        ui.label(format!("Payments: {}", self.feed.payments().len()));
        ui.label(format!(
            "Nodes: {}   Edges: {}",
            model.nodes().len(),
            model.edges().len()
        ));
        ui.colored_label(
            theme::text::MUTED,
            format!("Energy: {:.2}", self.graph.kinetic_energy()),
        );
        ui.add_space(10.0);

        ui.horizontal(|ui| {
            if ui.checkbox(&mut self.paused, "Pause").changed() {
                self.feed.set_paused(self.paused);
                tracing::info!(paused = self.paused, "simulation toggled");
            }
            let focused = self.graph.selected().is_some();
            if ui.add_enabled(focused, egui::Button::new("Clear focus")).clicked() {
                let event = self.graph.clear_selection();
                self.handle_event(event);
            }
        });

        if let Some(label) = self
            .graph
            .selected()
            .and_then(|id| self.graph.model().node(id))
            .map(|n| n.label.clone())
        {
            ui.colored_label(theme::accent::CYAN, format!("Focus: {label}"));
        }
        ui.add_space(10.0);

        egui::CollapsingHeader::new("Display")
            .default_open(false)
            .show(ui, |ui| {
                if ui.checkbox(&mut self.settings.show_legend, "Legend").changed() {
                    self.settings_dirty = true;
                }
                if ui.checkbox(&mut self.settings.show_anomalies, "Anomalies").changed() {
                    self.settings_dirty = true;
                }
            });

        if self.settings.show_legend {
            egui::CollapsingHeader::new("Legend")
                .default_open(true)
                .show(ui, |ui| {
                    for status in PaymentStatus::ALL {
                        legend_row(ui, status.color(), None, status.label());
                    }
                    ui.add_space(5.0);
                    legend_row(ui, theme::node::USER_FILL, Some(theme::node::USER_STROKE), "User");
                    legend_row(
                        ui,
                        theme::node::RETAILER_FILL,
                        Some(theme::node::RETAILER_STROKE),
                        "Retailer",
                    );
                    legend_row(
                        ui,
                        theme::bg::GRAPH,
                        Some(theme::node::HIGHLIGHT_STROKE),
                        "Anomalous user",
                    );
                });
        }

        if self.settings.show_anomalies {
            egui::CollapsingHeader::new(format!("Anomalies ({})", self.anomalies.len()))
                .default_open(true)
                .show(ui, |ui| {
                    let mut changed = false;
                    changed |= ui
                        .add(egui::Slider::new(&mut self.settings.anomaly.min_failures, 1..=10).text("Min failures"))
                        .changed();
                    changed |= ui
                        .add(egui::Slider::new(&mut self.settings.anomaly.failure_rate, 0.0..=1.0).text("Failure rate"))
                        .changed();
                    if changed {
                        self.settings_dirty = true;
                        self.refresh_anomalies();
                    }

                    ui.add_space(5.0);
                    if self.anomalies.is_empty() {
                        ui.colored_label(theme::text::MUTED, "Nothing unusual");
                    }
                    for anomaly in &self.anomalies {
                        ui.colored_label(theme::accent::WARNING, &anomaly.user_name);
                        for reason in &anomaly.reasons {
                            ui.colored_label(theme::text::SECONDARY, format!("  {reason}"));
                        }
                    }
                });
        }
    }

    fn render_graph(&mut self, ui: &mut egui::Ui) {
        let (response, painter) = ui.allocate_painter(ui.available_size(), egui::Sense::click());
        let rect = response.rect;
        let origin = rect.min.to_vec2();
        let now = ui.input(|i| i.time);

        self.graph.set_canvas_size(rect.size());
        if self.graph.is_dirty() {
            self.graph.sync(self.feed.payments());
            self.refresh_anomalies();
        }

        // Input is matched against what was on screen when the user acted
        let mut event = None;
        if let Some(scene) = &self.last_scene {
            let local = |p: Pos2| p - origin;
            self.graph.hover(scene, response.hover_pos().map(local));
            if response.clicked() {
                event = response
                    .interact_pointer_pos()
                    .and_then(|pos| self.graph.click(scene, local(pos)));
            }
        }
        if let Some(event) = event {
            self.handle_event(event);
        }

        let scene = self.graph.frame(now, !self.paused);

        // Edges first, beneath nodes
        for edge in &scene.edges {
            let opacity = self.graph.pulses().opacity(&edge.id, now).unwrap_or(edge.opacity);
            painter.line_segment(
                [edge.from + origin, edge.to + origin],
                Stroke::new(edge.width, theme::faded(edge.color, opacity)),
            );
        }

        let ring = highlight_alpha(now);
        for node in &scene.nodes {
            let center = node.center + origin;
            painter.circle_filled(center, node.radius, theme::faded(node.fill, node.opacity));
            let stroke_opacity = if node.highlighted { node.opacity * ring } else { node.opacity };
            painter.circle_stroke(
                center,
                node.radius,
                Stroke::new(node.stroke_width, theme::faded(node.stroke, stroke_opacity)),
            );
        }

        if let Some(tooltip) = &scene.tooltip {
            let text = format!("{}\n{}", truncate(&tooltip.label, 48), tooltip.kind.label());
            let galley = painter.layout_no_wrap(text, egui::FontId::default(), theme::text::PRIMARY);
            let anchor = tooltip.anchor + origin;
            let tooltip_rect = egui::Rect::from_min_size(anchor, galley.size() + Vec2::splat(12.0));
            painter.rect_filled(tooltip_rect, 4.0, theme::faded(theme::bg::SURFACE, 0.9));
            let accent = match tooltip.kind {
                NodeKind::User => theme::node::USER_STROKE,
                NodeKind::Retailer => theme::node::RETAILER_STROKE,
            };
            painter.rect_stroke(tooltip_rect, 4.0, Stroke::new(1.0, accent));
            painter.galley(anchor + Vec2::splat(6.0), galley, theme::text::PRIMARY);
        }

        if scene.nodes.is_empty() {
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "Waiting for payments...",
                egui::FontId::proportional(20.0),
                theme::text::MUTED,
            );
        }

        self.last_scene = Some(scene);
    }

    fn render_detail(&mut self, ctx: &egui::Context) {
        let Some(payment) = &self.detail else {
            return;
        };
        let mut open = true;
        egui::Window::new("Payment details")
            .open(&mut open)
            .collapsible(false)
            .resizable(true)
            .default_width(420.0)
            .show(ctx, |ui| payment_details(ui, payment));
        if !open {
            self.detail = None;
        }
    }
}

impl eframe::App for LedgerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = ctx.input(|i| i.time);
        if self.feed.poll(now) {
            self.graph.mark_dirty();
        }

        // Keep animating while the simulation runs or an entrance pulse is finishing
        if !self.paused || self.graph.pulses().is_animating() {
            ctx.request_repaint();
        }

        ctx.set_visuals(egui::Visuals::dark());

        egui::SidePanel::left("sidebar")
            .min_width(240.0)
            .frame(
                egui::Frame::none()
                    .fill(theme::bg::PANEL)
                    .inner_margin(egui::Margin::same(12.0)),
            )
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.render_sidebar(ui);
                });
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(theme::bg::GRAPH))
            .show(ctx, |ui| {
                self.render_graph(ui);
            });

        self.render_detail(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        tracing::info!("shutting down");
        if self.settings_dirty {
            self.settings.save();
        }
        self.last_scene = None;
        self.graph.reset();
    }
}

fn legend_row(ui: &mut egui::Ui, fill: Color32, stroke: Option<Color32>, label: &str) {
    ui.horizontal(|ui| {
        let (rect, _) = ui.allocate_exact_size(Vec2::splat(14.0), egui::Sense::hover());
        match stroke {
            Some(stroke) => {
                ui.painter().circle_filled(rect.center(), 5.0, fill);
                ui.painter().circle_stroke(rect.center(), 5.0, Stroke::new(2.0, stroke));
            }
            None => {
                ui.painter().line_segment(
                    [rect.left_center(), rect.right_center()],
                    Stroke::new(2.5, fill),
                );
            }
        }
        ui.label(label);
    });
}

fn payment_details(ui: &mut egui::Ui, payment: &Payment) {
    if payment.is_live {
        ui.colored_label(theme::accent::LIVE, "● Live on-chain payment");
    }
    if let Some(flag) = &payment.ai_flag {
        ui.colored_label(theme::accent::WARNING, format!("AI flag: {}", flag.reason));
    }

    egui::Grid::new("payment_details")
        .num_columns(2)
        .spacing([12.0, 4.0])
        .striped(true)
        .show(ui, |ui| {
            let row = |ui: &mut egui::Ui, key: &str, value: String| {
                ui.colored_label(theme::text::SECONDARY, key);
                ui.label(value);
                ui.end_row();
            };
            row(ui, "Transaction", truncate(&payment.id, 24));
            row(ui, "User", format!("{} ({})", payment.user.name, truncate(&payment.user.id, 14)));
            row(ui, "Retailer", payment.description.clone());
            row(
                ui,
                "Amount",
                format!(
                    "{:.2} tokens / ${:.2}",
                    payment.amount.amount_in_tokens,
                    payment.amount.amount_in_usd_cents as f64 / 100.0
                ),
            );
            ui.colored_label(theme::text::SECONDARY, "Status");
            ui.colored_label(payment.status.color(), payment.status.label());
            ui.end_row();
            row(ui, "Priority", format!("{:?}", payment.priority));
            row(ui, "Created", payment.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string());
            row(ui, "Updated", payment.updated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string());
            row(ui, "Settlement", payment.settlement_data.status.clone());
            if let Some(hash) = &payment.settlement_data.blockchain_tx_hash {
                row(ui, "Chain tx", truncate(hash, 24));
            }
            row(ui, "Block", payment.settlement_data.block_number.to_string());
        });

    for note in &payment.settlement_data.notes {
        ui.colored_label(theme::text::MUTED, note);
    }

    if !payment.routing_trace.is_empty() {
        ui.add_space(8.0);
        egui::CollapsingHeader::new("Routing trace")
            .default_open(false)
            .show(ui, |ui| {
                for hop in &payment.routing_trace {
                    ui.label(format!(
                        "{}  {} → {} ({:?})",
                        hop.timestamp.format("%H:%M:%S"),
                        hop.service,
                        hop.action,
                        hop.status
                    ));
                }
            });
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{}...", truncated)
    } else {
        s.to_string()
    }
}
