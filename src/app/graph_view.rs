use std::collections::HashSet;

use eframe::egui::{
    self, Align2, Color32, FontId, MouseWheelUnit, Pos2, Rect, Sense, Shape, Stroke, Ui, vec2,
};

use crate::atlas::NodeId;

use super::proximity::{label_opacity, proximity_opacity};
use super::render_utils::{
    blend_color, circle_visible, dash_lengths, draw_background, edge_stroke, edge_visible,
    node_diameter, with_alpha,
};
use super::viewport::WheelUnit;
use super::{HoverTarget, NavEvent, ViewModel, ViewState};

const HIGHLIGHT_COLOR: Color32 = Color32::from_rgb(246, 206, 104);
const SELECTION_COLOR: Color32 = Color32::from_rgb(245, 206, 93);
const HIERARCHY_EDGE_COLOR: Color32 = Color32::from_rgba_premultiplied(96, 104, 140, 150);
const CONNECTION_EDGE_COLOR: Color32 = Color32::from_rgba_premultiplied(80, 130, 160, 130);
const LABEL_COLOR: Color32 = Color32::from_gray(238);
/// Top-level parent titles only read well in a mid-zoom band.
const TITLE_SCALE_MIN: f32 = 0.5;
const TITLE_SCALE_MAX: f32 = 1.5;

impl ViewModel {
    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        let now = ui.ctx().input(|input| input.time);

        self.handle_zoom(ui, rect, &response, now);
        self.handle_pan(&response);

        draw_background(
            &painter,
            rect,
            self.viewport.offset * self.viewport.scale,
            self.viewport.scale,
        );

        self.hovered = None;
        match self.nav.state {
            ViewState::HighLevel => self.draw_summaries(ui, &painter, rect, &response, now),
            ViewState::Cluster(cluster) => {
                self.draw_cluster(ui, &painter, rect, &response, cluster, now);
            }
        }
    }

    fn handle_zoom(&mut self, ui: &Ui, rect: Rect, response: &egui::Response, now: f64) {
        if !response.hovered() {
            return;
        }

        let cursor = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let ticks: Vec<(MouseWheelUnit, f32)> = ui.input(|input| {
            input
                .events
                .iter()
                .filter_map(|event| match event {
                    egui::Event::MouseWheel { unit, delta, .. } => Some((*unit, delta.y)),
                    _ => None,
                })
                .collect()
        });

        for (unit, delta_y) in ticks {
            let unit = match unit {
                MouseWheelUnit::Point => WheelUnit::Pixel,
                MouseWheelUnit::Line => WheelUnit::Line,
                MouseWheelUnit::Page => WheelUnit::Page,
            };
            // egui reports scroll-up as positive; the zoom math expects the
            // wheel convention where scroll-up (zoom in) is negative.
            self.viewport.wheel(-delta_y, unit, cursor, rect, now);
        }
    }

    fn handle_pan(&mut self, response: &egui::Response) {
        if response.drag_started_by(egui::PointerButton::Primary) {
            if let Some(pos) = response.interact_pointer_pos() {
                self.viewport.begin_drag(pos);
            }
        } else if response.dragged_by(egui::PointerButton::Primary) {
            if let Some(pos) = response.interact_pointer_pos() {
                self.viewport.drag_to(pos);
            }
        }
        if response.drag_stopped_by(egui::PointerButton::Primary) {
            self.viewport.end_drag();
        }
    }

    fn draw_summaries(
        &mut self,
        ui: &Ui,
        painter: &egui::Painter,
        rect: Rect,
        response: &egui::Response,
        now: f64,
    ) {
        let scale = self.viewport.scale;
        let positions: Vec<Pos2> = self
            .atlas
            .summaries
            .iter()
            .map(|summary| self.viewport.world_to_screen(summary.pos, rect))
            .collect();
        let radii: Vec<f32> = self
            .atlas
            .summaries
            .iter()
            .map(|summary| node_diameter(summary.size, scale) * 0.5)
            .collect();

        let hovered = hovered_index(ui, &positions, &radii);
        if let Some(index) = hovered {
            self.hovered = Some(HoverTarget::Summary(index));
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::PointingHand);
        }

        let mut visible = 0usize;
        for (index, summary) in self.atlas.summaries.iter().enumerate() {
            let position = positions[index];
            let radius = radii[index];
            if !circle_visible(rect, position, radius) {
                continue;
            }
            visible += 1;

            let is_hovered = hovered == Some(index);
            let color = if is_hovered {
                blend_color(summary.color, Color32::WHITE, 0.25)
            } else {
                summary.color
            };
            painter.circle_filled(position, radius, color);
            painter.circle_stroke(
                position,
                radius,
                Stroke::new(1.5, Color32::from_rgba_unmultiplied(15, 15, 15, 190)),
            );
            if is_hovered {
                painter.circle_stroke(position, radius + 4.0, Stroke::new(2.0, HIGHLIGHT_COLOR));
            }

            painter.text(
                position + vec2(0.0, radius + 6.0),
                Align2::CENTER_TOP,
                &summary.text,
                FontId::proportional(14.0),
                LABEL_COLOR,
            );
        }
        self.visible_node_count = visible;
        self.visible_edge_count = 0;

        if let Some(index) = hovered {
            let summary = &self.atlas.summaries[index];
            let strip = if summary.details.is_empty() {
                summary.text.clone()
            } else {
                format!("{}  |  {}", summary.text, summary.details)
            };
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                strip,
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }

        if response.clicked_by(egui::PointerButton::Primary)
            && let Some(index) = hovered
        {
            let event = NavEvent::ClickSummary(self.atlas.summaries[index].cluster);
            self.nav
                .handle(event, &self.atlas, &mut self.viewport, now);
        }
    }

    fn draw_cluster(
        &mut self,
        ui: &Ui,
        painter: &egui::Painter,
        rect: Rect,
        response: &egui::Response,
        cluster: usize,
        now: f64,
    ) {
        let scale = self.viewport.scale;
        let nodes = self.atlas.cluster_nodes(cluster);
        let positions: Vec<Pos2> = nodes
            .iter()
            .map(|node| self.viewport.world_to_screen(node.pos, rect))
            .collect();
        let radii: Vec<f32> = nodes
            .iter()
            .map(|node| node_diameter(node.size, scale) * 0.5)
            .collect();

        let hovered = hovered_index(ui, &positions, &radii);
        let hovered_id = hovered.map(|index| nodes[index].id);
        if let Some(id) = hovered_id {
            self.hovered = Some(HoverTarget::Node(id));
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::PointingHand);
        }

        let subtopics: HashSet<NodeId> = hovered_id
            .map(|id| self.atlas.children_of(id).into_iter().collect())
            .unwrap_or_default();

        self.visible_node_count = positions
            .iter()
            .zip(&radii)
            .filter(|(position, radius)| circle_visible(rect, **position, **radius))
            .count();
        self.visible_edge_count =
            self.draw_edges(painter, rect, cluster, hovered_id, self.nav.selected);

        let mut draw_order: Vec<usize> = (0..nodes.len()).collect();
        draw_order.sort_by(|&a, &b| nodes[a].size.total_cmp(&nodes[b].size));

        let cursor = ui.input(|input| input.pointer.hover_pos());
        let dragging = self.viewport.dragging();
        let titles_in_band = scale > TITLE_SCALE_MIN && scale < TITLE_SCALE_MAX;

        for index in draw_order {
            let node = &nodes[index];
            let position = positions[index];
            let radius = radii[index];
            if !circle_visible(rect, position, radius) {
                continue;
            }

            let is_selected = self.nav.selected == Some(node.id);
            let is_hovered = hovered == Some(index);
            let is_subtopic = subtopics.contains(&node.id);

            let color = if is_hovered {
                blend_color(node.color, Color32::WHITE, 0.25)
            } else if is_subtopic {
                blend_color(node.color, HIGHLIGHT_COLOR, 0.35)
            } else {
                node.color
            };
            painter.circle_filled(position, radius, color);
            painter.circle_stroke(
                position,
                radius,
                Stroke::new(1.0, Color32::from_rgba_unmultiplied(15, 15, 15, 190)),
            );

            if is_selected {
                painter.circle_stroke(position, radius + 3.0, Stroke::new(2.5, SELECTION_COLOR));
                painter.circle_stroke(
                    position,
                    radius + 8.0,
                    Stroke::new(1.0, with_alpha(SELECTION_COLOR, 0.4)),
                );
            } else if is_hovered {
                painter.circle_stroke(position, radius + 3.0, Stroke::new(1.5, HIGHLIGHT_COLOR));
            }

            let proximity = cursor
                .map(|cursor| proximity_opacity(position, cursor, scale))
                .unwrap_or(0.0);
            let opacity = label_opacity(
                proximity,
                is_subtopic,
                hovered.is_some(),
                is_hovered,
                dragging,
            );

            if let Some(opacity) = opacity {
                painter.text(
                    position + vec2(0.0, radius + 5.0),
                    Align2::CENTER_TOP,
                    &node.text,
                    FontId::proportional(12.0),
                    with_alpha(LABEL_COLOR, opacity),
                );
            } else if node.is_parent && node.level == 0 && titles_in_band && !dragging {
                painter.text(
                    position + vec2(0.0, radius + 5.0),
                    Align2::CENTER_TOP,
                    &node.text,
                    FontId::proportional(13.0),
                    with_alpha(LABEL_COLOR, 0.85),
                );
            }
        }

        if let Some(index) = hovered {
            let node = &nodes[index];
            let summary = if node.details.is_empty() {
                node.text.clone()
            } else {
                format!("{}  |  {}", node.text, node.details)
            };
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                summary,
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }

        if response.clicked_by(egui::PointerButton::Primary)
            && let Some(id) = hovered_id
        {
            self.nav
                .handle(NavEvent::ClickNode(id), &self.atlas, &mut self.viewport, now);
        }
    }

    /// Plain edges first, highlighted ones in a second pass so they always
    /// sit on top. Edges touching the hovered or selected node highlight.
    fn draw_edges(
        &self,
        painter: &egui::Painter,
        rect: Rect,
        cluster: usize,
        hovered: Option<NodeId>,
        selected: Option<NodeId>,
    ) -> usize {
        let scale = self.viewport.scale;
        let is_highlighted = |a: NodeId, b: NodeId| {
            hovered.is_some_and(|id| id == a || id == b)
                || selected.is_some_and(|id| id == a || id == b)
        };
        let endpoints = |a: NodeId, b: NodeId| -> Option<(Pos2, Pos2)> {
            // A dangling endpoint just drops the edge.
            let start = self.atlas.node(a)?;
            let end = self.atlas.node(b)?;
            let start = self.viewport.world_to_screen(start.pos, rect);
            let end = self.viewport.world_to_screen(end.pos, rect);
            edge_visible(rect, start, end, 2.5).then_some((start, end))
        };

        let mut drawn = 0usize;
        let mut highlighted: Vec<(Pos2, Pos2, bool)> = Vec::new();

        for &(parent, child) in &self.atlas.hierarchical {
            if parent.cluster != cluster {
                continue;
            }
            let Some((start, end)) = endpoints(parent, child) else {
                continue;
            };
            drawn += 1;
            if is_highlighted(parent, child) {
                highlighted.push((start, end, false));
            } else {
                painter
                    .line_segment([start, end], edge_stroke(1.5, scale, HIERARCHY_EDGE_COLOR));
            }
        }

        let (dash, gap) = dash_lengths(scale);
        for &(a, b) in &self.atlas.connections {
            if a.cluster != cluster {
                continue;
            }
            let Some((start, end)) = endpoints(a, b) else {
                continue;
            };
            drawn += 1;
            if is_highlighted(a, b) {
                highlighted.push((start, end, true));
            } else {
                painter.extend(Shape::dashed_line(
                    &[start, end],
                    edge_stroke(1.0, scale, CONNECTION_EDGE_COLOR),
                    dash,
                    gap,
                ));
            }
        }

        for (start, end, dashed) in highlighted {
            let stroke = edge_stroke(2.0, scale, HIGHLIGHT_COLOR);
            if dashed {
                painter.extend(Shape::dashed_line(&[start, end], stroke, dash, gap));
            } else {
                painter.line_segment([start, end], stroke);
            }
        }

        drawn
    }
}

fn hovered_index(ui: &Ui, positions: &[Pos2], radii: &[f32]) -> Option<usize> {
    let pointer = ui.input(|input| input.pointer.hover_pos())?;
    positions
        .iter()
        .zip(radii)
        .enumerate()
        .filter_map(|(index, (position, radius))| {
            let distance = position.distance(pointer);
            (distance <= *radius).then_some((index, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(index, _)| index)
}
