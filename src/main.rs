//! Native Ledger Visualizer
//!
//! Force-directed view of who pays whom on the settlement ledger.

mod anomaly;
mod app;
mod feed;
mod graph;
mod settings;
mod theme;

use clap::Parser;
use eframe::egui;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Seed the graph from a JSON array of payments instead of mock data
    #[arg(long, value_name = "FILE")]
    payments: Option<PathBuf>,

    /// Seed for node placement and the mock feed
    #[arg(long)]
    seed: Option<u64>,

    /// Disable the simulated live purchase feed
    #[arg(long)]
    no_live: bool,

    /// Number of mock payments generated at startup
    #[arg(long, value_name = "N")]
    mock_count: Option<usize>,
}

fn main() -> eframe::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_title("Ledger Visualizer"),
        persist_window: true,
        ..Default::default()
    };

    let launch = app::LaunchOptions {
        payments: cli.payments,
        seed: cli.seed,
        no_live: cli.no_live,
        mock_count: cli.mock_count,
    };

    eframe::run_native(
        "Ledger Visualizer",
        options,
        Box::new(move |cc| Ok(Box::new(app::LedgerApp::new(cc, launch)))),
    )
}
