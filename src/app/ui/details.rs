use eframe::egui::{self, Context, RichText, Ui};

use super::super::{NavEvent, ViewModel};
use super::panels::CONNECTION_KEY_LABELS;

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui, events: &mut Vec<NavEvent>) {
        let Some(node) = self.nav.selected.and_then(|id| self.atlas.node(id)) else {
            ui.label("Nothing selected.");
            return;
        };

        ui.add_space(6.0);
        ui.heading(&node.text);
        if !node.details.is_empty() {
            ui.add_space(4.0);
            ui.label(&node.details);
        }

        ui.add_space(8.0);
        if !node.full_content.is_empty() && ui.button("Expand  [Enter]").clicked() {
            events.push(NavEvent::OpenExpanded);
        }

        if let Some(parent) = node.parent {
            let parent_text = self
                .atlas
                .node(parent)
                .map(|parent| parent.text.as_str())
                .unwrap_or("?");
            ui.add_space(8.0);
            if ui.button(format!("[b] Up to {parent_text}")).clicked() {
                events.push(NavEvent::SelectParent);
            }
        }

        let children = self.atlas.children_of(node.id);
        if !children.is_empty() {
            ui.add_space(10.0);
            ui.label(RichText::new("Subtopics").strong());
            for (index, child) in children.iter().enumerate() {
                let text = self
                    .atlas
                    .node(*child)
                    .map(|child| child.text.as_str())
                    .unwrap_or("?");
                let label = if index < 9 {
                    format!("[{}] {text}", index + 1)
                } else {
                    text.to_owned()
                };
                if ui.selectable_label(false, label).clicked() {
                    events.push(NavEvent::SelectChild(index));
                }
            }
        }

        let connections = self.atlas.connections_of(node.id);
        if !connections.is_empty() {
            ui.add_space(10.0);
            ui.label(RichText::new("Connections").strong());
            for (index, peer) in connections.iter().enumerate() {
                let text = self
                    .atlas
                    .node(*peer)
                    .map(|peer| peer.text.as_str())
                    .unwrap_or("?");
                let label = match CONNECTION_KEY_LABELS.get(index) {
                    Some(key) => format!("[{key}] {text}"),
                    None => text.to_owned(),
                };
                if ui.selectable_label(false, label).clicked() {
                    events.push(NavEvent::SelectConnection(index));
                }
            }
        }

        if let Some(path) = self.atlas.path_starting_at(node.id)
            && self.nav.active_path.is_none()
        {
            ui.add_space(10.0);
            let name = &self.atlas.paths[path].name;
            if ui.button(format!("Start path: {name}")).clicked() {
                events.push(NavEvent::StartPath(path));
            }
        }
    }

    /// Full-content reader for the selected node, shown as a closable window
    /// above the canvas.
    pub(in crate::app) fn draw_expanded_content(&mut self, ctx: &Context, events: &mut Vec<NavEvent>) {
        if !self.nav.expanded {
            return;
        }
        let Some(node) = self.nav.selected.and_then(|id| self.atlas.node(id)) else {
            self.nav.expanded = false;
            return;
        };

        let mut open = true;
        egui::Window::new(&node.text)
            .open(&mut open)
            .collapsible(false)
            .default_width(520.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().max_height(420.0).show(ui, |ui| {
                    if node.full_content.is_empty() {
                        ui.label(&node.details);
                    } else {
                        ui.label(&node.full_content);
                    }
                });
            });

        if !open {
            events.push(NavEvent::Escape);
        }
    }
}
