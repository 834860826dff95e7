mod app;

use std::path::PathBuf;

use anyhow::{Context, anyhow};
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use network_explorer::config::{CanvasSize, LayoutConfig};
use network_explorer::focus::Threshold;

/// Share of the window width left to the graph once the side panels are laid out.
const GRAPH_WIDTH_SHARE: f32 = 0.6;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Dataset JSON files; the first one is shown at startup.
    #[arg(required = true)]
    datasets: Vec<PathBuf>,

    /// JSON file overriding the layout forces and limits.
    #[arg(long)]
    layout_config: Option<PathBuf>,

    /// Start with every affiliation sharing the canvas center.
    #[arg(long)]
    no_cluster: bool,

    /// What stays visible around a focused person: 0 = the person, 1 = neighbors, 2 = everyone.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..=2))]
    threshold: u8,

    /// Synchronous layout ticks run before the first frame.
    #[arg(long)]
    warmup_ticks: Option<usize>,

    #[arg(long, default_value_t = 1440.0)]
    width: f32,

    #[arg(long, default_value_t = 920.0)]
    height: f32,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();

    let mut config = match &args.layout_config {
        Some(path) => LayoutConfig::load(path)?,
        None => LayoutConfig::default(),
    };
    if let Some(ticks) = args.warmup_ticks {
        config.warmup_ticks = ticks;
    }
    let threshold = Threshold::from_rank(args.threshold)
        .with_context(|| format!("unsupported threshold {}", args.threshold))?;
    let initial_canvas = CanvasSize::new(args.width * GRAPH_WIDTH_SHARE, args.height - 40.0)
        .context("window size leaves no room for the graph")?;

    let settings = app::Settings {
        datasets: args.datasets,
        config,
        clustering: !args.no_cluster,
        threshold,
        initial_canvas,
    };
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([args.width, args.height]),
        ..Default::default()
    };

    eframe::run_native(
        "network-explorer",
        options,
        Box::new(move |cc| Ok(Box::new(app::ExplorerApp::new(cc, settings)))),
    )
    .map_err(|error| anyhow!("failed to run the explorer window: {error}"))
}
