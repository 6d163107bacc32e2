use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context};

use crate::atlas::{Atlas, AtlasSource, NodeId, load_atlas};

mod graph_view;
mod nav;
mod proximity;
mod render_utils;
mod search;
mod ui;
mod viewport;

use nav::{NavEvent, Navigator, ViewState};
use search::SearchBox;
use viewport::Viewport;

pub struct AtlasApp {
    source: AtlasSource,
    state: AppState,
    reload_rx: Option<Receiver<Result<Atlas, String>>>,
}

enum AppState {
    Loading {
        rx: Receiver<Result<Atlas, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum HoverTarget {
    Summary(usize),
    Node(NodeId),
}

struct ViewModel {
    atlas: Atlas,
    viewport: Viewport,
    nav: Navigator,
    search: SearchBox,
    hovered: Option<HoverTarget>,
    focus_search: bool,
    visible_node_count: usize,
    visible_edge_count: usize,
}

impl AtlasApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, source: AtlasSource) -> Self {
        let state = Self::start_load(source.clone());
        Self {
            source,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(source: AtlasSource) -> Receiver<Result<Atlas, String>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_atlas(&source).map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(source: AtlasSource) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(source),
        }
    }

    fn ready_state(source: &AtlasSource, atlas: Atlas) -> AppState {
        let mut model = ViewModel::new(atlas);
        if let Some(slug) = &source.subject {
            model.open_subject(slug);
        }
        AppState::Ready(Box::new(model))
    }
}

impl eframe::App for AtlasApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                if let Ok(result) = rx.try_recv() {
                    transition = Some(match result {
                        Ok(atlas) => Self::ready_state(&self.source, atlas),
                        Err(error) => AppState::Error(error),
                    });
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading knowledge atlas...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
                ctx.request_repaint();
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load the knowledge atlas");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(self.source.clone()));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(self.source.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(result) => {
                            transition = Some(match result {
                                Ok(atlas) => Self::ready_state(&self.source, atlas),
                                Err(error) => AppState::Error(error),
                            });
                        }
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition =
                                Some(AppState::Error("Background load worker disconnected".to_owned()));
                        }
                    }
                }
            }
        }

        if let Some(next_state) = transition {
            self.reload_rx = None;
            self.state = next_state;
        }
    }
}
