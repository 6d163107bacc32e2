use eframe::egui::{self, Align, Context, Key, Layout};

use crate::atlas::Atlas;

use super::super::nav::Navigator;
use super::super::search::SearchBox;
use super::super::viewport::Viewport;
use super::super::{HoverTarget, NavEvent, ViewModel, ViewState};

/// Connection shortcuts live on the home row, in this order.
pub(in crate::app) const CONNECTION_KEYS: [Key; 8] = [
    Key::Q,
    Key::W,
    Key::E,
    Key::R,
    Key::T,
    Key::Y,
    Key::U,
    Key::I,
];
pub(in crate::app) const CONNECTION_KEY_LABELS: [char; 8] =
    ['q', 'w', 'e', 'r', 't', 'y', 'u', 'i'];

const DIGIT_KEYS: [Key; 9] = [
    Key::Num1,
    Key::Num2,
    Key::Num3,
    Key::Num4,
    Key::Num5,
    Key::Num6,
    Key::Num7,
    Key::Num8,
    Key::Num9,
];

impl ViewModel {
    pub(in crate::app) fn new(atlas: Atlas) -> Self {
        let search = SearchBox::new(&atlas);
        Self {
            atlas,
            viewport: Viewport::default(),
            nav: Navigator::default(),
            search,
            hovered: None,
            focus_search: false,
            visible_node_count: 0,
            visible_edge_count: 0,
        }
    }

    /// Opens a subject by its slug, as the `--subject` flag requests.
    pub(in crate::app) fn open_subject(&mut self, slug: &str) {
        match self
            .atlas
            .clusters
            .iter()
            .position(|cluster| cluster.slug == slug)
        {
            Some(index) => {
                self.nav
                    .handle(NavEvent::ClickSummary(index), &self.atlas, &mut self.viewport, 0.0);
            }
            None => log::warn!("no subject with slug {slug:?}, staying on the overview"),
        }
    }

    pub(in crate::app) fn show(&mut self, ctx: &Context, reload_requested: &mut bool, is_loading: bool) {
        let now = ctx.input(|input| input.time);

        // The pending cross-cluster target resolves only after a frame of the
        // destination cluster has been drawn.
        self.nav.resolve_pending(&self.atlas, &mut self.viewport);

        self.search.tick(now);
        if self.search.busy() {
            ctx.request_repaint();
        }

        self.handle_keyboard(ctx, now);

        let mut events: Vec<NavEvent> = Vec::new();

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("atlas-canvas");
                    ui.separator();
                    match self.nav.state {
                        ViewState::HighLevel => {
                            ui.label(format!("{} subjects", self.atlas.clusters.len()));
                        }
                        ViewState::Cluster(cluster) => {
                            let name = self
                                .atlas
                                .clusters
                                .get(cluster)
                                .map(|info| info.name.as_str())
                                .unwrap_or("?");
                            ui.label(name);
                        }
                    }
                    ui.label(format!("nodes: {}", self.atlas.node_count()));
                    ui.label(format!("edges: {}", self.atlas.edge_count()));

                    let reload_button = ui.add_enabled(!is_loading, egui::Button::new("Reload"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    if ui.button("Reset view").clicked() {
                        self.viewport.reset();
                    }

                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(format!(
                            "visible: {} nodes, {} edges | zoom {:.2}",
                            self.visible_node_count, self.visible_edge_count, self.viewport.scale
                        ));
                        if let Some(text) = self.hovered_text() {
                            ui.label(text);
                        }
                    });
                });
            });

        egui::SidePanel::left("explorer")
            .resizable(true)
            .default_width(280.0)
            .show(ctx, |ui| self.draw_explorer(ui, &mut events));

        if self.nav.selected.is_some() {
            egui::SidePanel::right("details")
                .resizable(true)
                .default_width(320.0)
                .show(ctx, |ui| self.draw_details(ui, &mut events));
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            if is_loading {
                ui.vertical_centered(|ui| {
                    ui.add_space(120.0);
                    ui.heading("Reloading knowledge atlas...");
                    ui.add_space(8.0);
                    ui.spinner();
                });
            } else {
                self.draw_graph(ui);
            }
        });

        self.draw_expanded_content(ctx, &mut events);

        for event in events {
            self.nav
                .handle(event, &self.atlas, &mut self.viewport, now);
        }

        if self.nav.exit_prompt_active(now) {
            egui::Area::new(egui::Id::new("exit_prompt"))
                .anchor(egui::Align2::CENTER_BOTTOM, egui::vec2(0.0, -24.0))
                .show(ctx, |ui| {
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        ui.label("Press Escape again to return to the overview");
                    });
                });
            // Keep repainting so the prompt disappears when it expires.
            ctx.request_repaint();
        }
    }

    /// Previous frame's hover, for the top bar readout.
    fn hovered_text(&self) -> Option<String> {
        match self.hovered? {
            HoverTarget::Summary(index) => {
                self.atlas.summaries.get(index).map(|summary| summary.text.clone())
            }
            HoverTarget::Node(id) => self.atlas.node(id).map(|node| node.text.clone()),
        }
    }

    fn handle_keyboard(&mut self, ctx: &Context, now: f64) {
        if ctx.wants_keyboard_input() {
            return;
        }

        let pressed: Vec<Key> = ctx.input(|input| {
            input
                .events
                .iter()
                .filter_map(|event| match event {
                    egui::Event::Key {
                        key, pressed: true, ..
                    } => Some(*key),
                    _ => None,
                })
                .collect()
        });

        for key in pressed {
            let event = if let Some(index) = DIGIT_KEYS.iter().position(|&k| k == key) {
                Some(NavEvent::SelectChild(index))
            } else if let Some(index) = CONNECTION_KEYS.iter().position(|&k| k == key) {
                Some(NavEvent::SelectConnection(index))
            } else {
                match key {
                    Key::Escape => Some(NavEvent::Escape),
                    Key::Enter => Some(NavEvent::OpenExpanded),
                    Key::B => Some(NavEvent::SelectParent),
                    Key::ArrowRight | Key::ArrowDown => Some(NavEvent::AdvancePath),
                    Key::ArrowLeft | Key::ArrowUp => Some(NavEvent::RetreatPath),
                    Key::Slash => {
                        self.focus_search = true;
                        None
                    }
                    _ => None,
                }
            };

            if let Some(event) = event {
                self.nav
                    .handle(event, &self.atlas, &mut self.viewport, now);
            }
        }
    }

    fn draw_explorer(&mut self, ui: &mut egui::Ui, events: &mut Vec<NavEvent>) {
        let now = ui.ctx().input(|input| input.time);

        ui.add_space(6.0);
        ui.horizontal(|ui| {
            ui.label("Search");
            let response = ui.text_edit_singleline(&mut self.search.input);
            if self.focus_search {
                response.request_focus();
                self.focus_search = false;
            }
            if response.changed() {
                self.search.edited(now);
            }
            if ui.small_button("x").clicked() {
                self.search.clear();
            }
        });

        if !self.search.results.is_empty() {
            ui.add_space(4.0);
            egui::ScrollArea::vertical()
                .id_salt("search_results")
                .max_height(220.0)
                .show(ui, |ui| {
                    for hit in &self.search.results {
                        let label = format!("{} — {}", hit.text, hit.cluster_name);
                        if ui.selectable_label(false, label).clicked() {
                            events.push(NavEvent::JumpTo(hit.id));
                        }
                    }
                });
        }

        ui.add_space(8.0);
        ui.separator();

        match self.nav.state {
            ViewState::HighLevel => {
                ui.label("Click a subject to enter it.");
                ui.add_space(4.0);
                for (index, cluster) in self.atlas.clusters.iter().enumerate() {
                    let mut row = ui.selectable_label(false, &cluster.name);
                    if !cluster.description.is_empty() {
                        row = row.on_hover_text(&cluster.description);
                    }
                    if row.clicked() {
                        events.push(NavEvent::ClickSummary(index));
                    }
                }
            }
            ViewState::Cluster(cluster) => {
                ui.heading("Learning paths");
                ui.add_space(4.0);

                let active = self.nav.active_path;
                let mut any = false;
                for (index, path) in self.atlas.paths_for(cluster) {
                    any = true;
                    let is_active = active == Some(index);
                    if ui.selectable_label(is_active, &path.name).clicked() && !is_active {
                        events.push(NavEvent::StartPath(index));
                    }

                    if is_active {
                        ui.indent(("path_stops", path.id.as_str()), |ui| {
                            ui.label(format!(
                                "stop {} of {}",
                                self.nav.path_position + 1,
                                path.stops.len()
                            ));
                            for (stop_index, &stop) in path.stops.iter().enumerate() {
                                let text = self
                                    .atlas
                                    .node(stop)
                                    .map(|node| node.text.as_str())
                                    .unwrap_or("?");
                                let current = stop_index == self.nav.path_position;
                                if ui.selectable_label(current, text).clicked() {
                                    events.push(NavEvent::JumpTo(stop));
                                }
                            }
                            ui.horizontal(|ui| {
                                if ui.button("< Prev").clicked() {
                                    events.push(NavEvent::RetreatPath);
                                }
                                if ui.button("Next >").clicked() {
                                    events.push(NavEvent::AdvancePath);
                                }
                            });
                        });
                    }
                }
                if !any {
                    ui.label("No learning paths for this subject.");
                }

                ui.add_space(8.0);
                ui.separator();
                ui.label("Escape backs out one level at a time.");
                ui.label("1-9 subtopics, q-i connections, b parent.");
                ui.label("Arrows walk the active path, Enter expands.");
            }
        }
    }
}
