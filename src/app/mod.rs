use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use anyhow::Context as _;
use eframe::egui::{self, Context};
use tracing::{info, warn};

use network_explorer::config::{CanvasSize, LayoutConfig};
use network_explorer::context::{PersonInfo, SimulationContext};
use network_explorer::dataset::load_dataset;
use network_explorer::focus::Threshold;
use network_explorer::interaction::InteractionController;
use network_explorer::physics::WarmUp;

mod graph;
mod render_utils;
mod ui;

/// Startup choices taken from the command line.
#[derive(Clone, Debug)]
pub struct Settings {
    pub datasets: Vec<PathBuf>,
    pub config: LayoutConfig,
    pub clustering: bool,
    pub threshold: Threshold,
    /// Canvas assumed for the first warm-up, before any frame was measured.
    pub initial_canvas: CanvasSize,
}

type LoadResult = Result<SimulationContext, String>;

pub struct ExplorerApp {
    settings: Settings,
    active: usize,
    canvas: CanvasSize,
    state: AppState,
    cancel: Arc<AtomicBool>,
}

enum AppState {
    Loading { rx: Receiver<LoadResult> },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    context: SimulationContext,
    controller: InteractionController,
    dataset_label: String,
    search: String,
    info: Option<PersonInfo>,
    clustering: bool,
    threshold: Threshold,
}

/// What the panels asked the app to do this frame.
#[derive(Default)]
struct AppRequest {
    switch_dataset: Option<usize>,
}

fn dataset_label(path: &std::path::Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn load_context(
    path: PathBuf,
    settings: &Settings,
    canvas: CanvasSize,
    cancel: &AtomicBool,
) -> anyhow::Result<Option<SimulationContext>> {
    let dataset = load_dataset(&path)?;
    let mut context = SimulationContext::from_dataset(
        &dataset,
        &settings.config,
        canvas,
        settings.clustering,
        settings.threshold,
    )
    .with_context(|| format!("failed to build the graph for {}", path.display()))?;

    match context.warm_up(cancel) {
        WarmUp::Completed { ticks } => {
            info!(path = %path.display(), ticks, "dataset ready");
            Ok(Some(context))
        }
        WarmUp::Cancelled { .. } => Ok(None),
    }
}

impl ExplorerApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, settings: Settings) -> Self {
        let canvas = settings.initial_canvas;
        let cancel = Arc::new(AtomicBool::new(false));
        let state = Self::start_load(&settings, 0, canvas, Arc::clone(&cancel));
        Self {
            settings,
            active: 0,
            canvas,
            state,
            cancel,
        }
    }

    fn spawn_load(
        settings: &Settings,
        index: usize,
        canvas: CanvasSize,
        cancel: Arc<AtomicBool>,
    ) -> Receiver<LoadResult> {
        let (tx, rx) = mpsc::channel();
        let path = settings.datasets[index].clone();
        let settings = settings.clone();

        thread::spawn(move || {
            let result = match load_context(path, &settings, canvas, &cancel) {
                Ok(Some(context)) => Ok(context),
                // Superseded by another load; nobody is listening.
                Ok(None) => return,
                Err(error) => Err(format!("{error:#}")),
            };
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(
        settings: &Settings,
        index: usize,
        canvas: CanvasSize,
        cancel: Arc<AtomicBool>,
    ) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(settings, index, canvas, cancel),
        }
    }

    /// Cancels whatever is loading and starts on dataset `index`.
    fn switch_dataset(&mut self, index: usize) -> AppState {
        self.cancel.store(true, Ordering::Relaxed);
        self.cancel = Arc::new(AtomicBool::new(false));
        self.active = index.min(self.settings.datasets.len().saturating_sub(1));
        info!(dataset = %self.settings.datasets[self.active].display(), "switching dataset");
        Self::start_load(&self.settings, self.active, self.canvas, Arc::clone(&self.cancel))
    }

    fn ready(&self, context: SimulationContext) -> AppState {
        AppState::Ready(Box::new(ViewModel::new(
            context,
            dataset_label(&self.settings.datasets[self.active]),
        )))
    }
}

impl eframe::App for ExplorerApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(result) => transition = Some(result),
                    Err(TryRecvError::Empty) => ctx.request_repaint(),
                    Err(TryRecvError::Disconnected) => {
                        transition = Some(Err("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading correspondence network...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                let mut retry = false;
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load the dataset");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        retry = true;
                    }
                });
                if retry {
                    let state = self.switch_dataset(self.active);
                    self.state = state;
                }
                return;
            }
            AppState::Ready(model) => {
                let mut request = AppRequest::default();
                model.show(ctx, &self.settings.datasets, self.active, &mut request);
                self.canvas = model.context.canvas();
                self.settings.clustering = model.clustering;
                self.settings.threshold = model.threshold;

                if let Some(index) = request.switch_dataset {
                    let state = self.switch_dataset(index);
                    self.state = state;
                }
                return;
            }
        }

        if let Some(result) = transition {
            self.state = match result {
                Ok(context) => self.ready(context),
                Err(error) => {
                    warn!(%error, "dataset failed to load");
                    AppState::Error(error)
                }
            };
        }
    }
}
