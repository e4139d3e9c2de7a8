use eframe::egui::{self, Align2, Color32, FontId, Sense, Shape, Stroke, Ui, vec2};
use relgraph::Surface;

use super::super::ViewModel;
use super::super::highlight::build_highlight_state;
use super::super::render_utils::{
    ViewTransform, arrow_head, blend_color, circle_visible, dim_color, draw_background,
};

const SELECTED_COLOR: Color32 = Color32::from_rgb(245, 206, 93);
const PIN_COLOR: Color32 = Color32::from_rgb(236, 236, 236);

impl ViewModel {
    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        self.engine.resize(Surface::new(rect.width(), rect.height()));

        let transform = ViewTransform {
            rect,
            origin: self.engine.surface().center(),
            pan: self.pan,
            zoom: self.zoom,
        };

        self.handle_graph_zoom(ui, transform, &response);
        self.handle_graph_pan(&response);
        let transform = ViewTransform {
            pan: self.pan,
            zoom: self.zoom,
            ..transform
        };
        self.handle_node_drag(ui, transform, &response);
        self.handle_node_clicks(transform, &response);

        let delta = ui.input(|input| input.stable_dt).min(0.1);
        self.engine.advance(delta);
        self.update_hovered(transform, &response);

        let painter = ui.painter_at(rect);
        draw_background(&painter, transform);

        let scene = self.engine.scene();
        if scene.is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "Nothing to show for the current filters",
                FontId::proportional(15.0),
                Color32::from_gray(180),
            );
            return;
        }

        let highlight = self
            .hovered
            .as_ref()
            .and_then(|id| build_highlight_state(scene, id));
        let node_scale = self.zoom.powf(0.5);
        let line_width = (1.2 * node_scale).clamp(0.6, 3.0);

        for (slot, edge) in scene.edges().iter().enumerate() {
            let from = transform.world_to_screen(edge.from);
            let to = transform.world_to_screen(edge.to);
            if !rect.intersects(egui::Rect::from_two_pos(from, to).expand(4.0)) {
                continue;
            }

            let color = match &highlight {
                Some(state) if state.contains_edge(slot) => blend_color(edge.stroke, Color32::WHITE, 0.35),
                Some(_) => dim_color(edge.stroke, 0.30),
                None => edge.stroke,
            };
            let width = if highlight.as_ref().is_some_and(|state| state.contains_edge(slot)) {
                line_width * 1.8
            } else {
                line_width
            };
            painter.line_segment([from, to], Stroke::new(width, color));

            if self.show_arrows
                && let Some(target) = scene.shape(edge.target)
                && let Some(points) =
                    arrow_head(from, to, target.radius * node_scale, (7.0 * node_scale).clamp(4.0, 14.0))
            {
                painter.add(Shape::convex_polygon(points.to_vec(), color, Stroke::NONE));
            }
        }

        for shape in scene.shapes() {
            let position = transform.world_to_screen(shape.center);
            let radius = (shape.radius * node_scale).clamp(2.5, 48.0);
            if !circle_visible(rect, position, radius) {
                continue;
            }

            let handle = scene.handle(&shape.id);
            let is_selected = self.selected.as_ref() == Some(&shape.id);
            let is_hovered = self.hovered.as_ref() == Some(&shape.id);
            let is_related = match (&highlight, handle) {
                (Some(state), Some(handle)) => state.contains_node(handle),
                _ => false,
            };

            let fill = if is_selected {
                blend_color(shape.fill, SELECTED_COLOR, 0.65)
            } else if highlight.is_some() && !is_related {
                dim_color(shape.fill, 0.40)
            } else {
                shape.fill
            };
            painter.circle_filled(position, radius, fill);
            painter.circle_stroke(
                position,
                radius,
                Stroke::new(
                    if is_hovered { 2.0 } else { 1.0 },
                    Color32::from_rgba_unmultiplied(12, 12, 12, 200),
                ),
            );
            if shape.pinned {
                painter.circle_stroke(position, radius + 3.0, Stroke::new(1.5, PIN_COLOR));
            }

            let focal = self.engine.focal() == Some(&shape.id);
            let should_label = is_selected
                || is_hovered
                || focal
                || (self.show_labels && (is_related || highlight.is_none()) && self.zoom > 0.45);
            if should_label {
                painter.text(
                    position + vec2(radius + 5.0, 0.0),
                    Align2::LEFT_CENTER,
                    &shape.label,
                    FontId::proportional(12.0),
                    Color32::from_gray(if highlight.is_some() && !is_related { 150 } else { 236 }),
                );
            }
        }

        if let Some(hovered) = &self.hovered
            && let Some(index) = self.engine.index()
            && let Some(entity) = index.entity(hovered)
        {
            let panel_text = format!(
                "{}  |  {}  |  relations {}",
                entity.display_name,
                entity.group_tag.as_deref().unwrap_or("ungrouped"),
                index.degree(hovered)
            );
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                panel_text,
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }

        if self.engine.is_animating() || self.engine.dragged().is_some() {
            ui.ctx().request_repaint();
        }
    }
}
