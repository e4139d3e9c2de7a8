use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use anyhow::Context as _;
use eframe::egui::{self, Context, Vec2};
use relgraph::{Dataset, EngineConfig, EntityId, ForceConfig, GraphEngine, IndexDiagnostics};
use tracing::{info, warn};

mod graph;
mod highlight;
mod render_utils;
mod ui;

type LoadResult = Result<Dataset, String>;

/// What the viewer was asked to show at startup.
#[derive(Clone, Debug)]
pub struct LaunchOptions {
    pub config: EngineConfig,
    pub data_path: PathBuf,
    pub focus: Option<String>,
    pub relation_type: Option<String>,
}

pub struct RelGraphApp {
    launch: LaunchOptions,
    state: AppState,
    reload_rx: Option<Receiver<LoadResult>>,
}

enum AppState {
    Loading { rx: Receiver<LoadResult> },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    engine: GraphEngine,
    data_path: PathBuf,
    diagnostics: IndexDiagnostics,
    relation_types: Vec<String>,
    search: String,
    status: Option<String>,
    selected: Option<EntityId>,
    hovered: Option<EntityId>,
    pan: Vec2,
    zoom: f32,
    forces: ForceConfig,
    show_labels: bool,
    show_arrows: bool,
}

impl RelGraphApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, launch: LaunchOptions) -> Self {
        let state = Self::start_load(&launch.data_path);
        Self {
            launch,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(path: &Path) -> Receiver<LoadResult> {
        let (tx, rx) = mpsc::channel();
        let path = path.to_path_buf();

        thread::spawn(move || {
            let result = Dataset::load(&path)
                .with_context(|| format!("failed to load {}", path.display()))
                .map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(path: &Path) -> AppState {
        info!(path = %path.display(), "loading dataset");
        AppState::Loading {
            rx: Self::spawn_load(path),
        }
    }

    fn ready(&self, dataset: Dataset) -> AppState {
        AppState::Ready(Box::new(ViewModel::new(dataset, &self.launch)))
    }
}

impl eframe::App for RelGraphApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(Ok(dataset)) => transition = Some(Ok(dataset)),
                    Ok(Err(error)) => transition = Some(Err(error)),
                    Err(TryRecvError::Empty) => ctx.request_repaint(),
                    Err(TryRecvError::Disconnected) => {
                        transition = Some(Err("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading relationship graph...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                let mut retry = false;
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load relationship graph");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    retry = ui.button("Retry").clicked();
                });
                if retry {
                    self.state = Self::start_load(&self.launch.data_path);
                    return;
                }
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                model.show(ctx, &mut reload_requested, self.reload_rx.is_some());

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(&self.launch.data_path));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(Ok(dataset)) => model.reload(dataset),
                        Ok(Err(error)) => {
                            warn!(%error, "reload failed; keeping the current dataset");
                            model.status = Some(error);
                        }
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint();
                        }
                        Err(TryRecvError::Disconnected) => {
                            model.status = Some("Background load worker disconnected".to_owned());
                        }
                    }
                }
            }
        }

        match transition {
            Some(Ok(dataset)) => self.state = self.ready(dataset),
            Some(Err(error)) => self.state = AppState::Error(error),
            None => {}
        }
    }
}
