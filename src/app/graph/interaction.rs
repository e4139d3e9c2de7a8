use eframe::egui::{self, PointerButton, Pos2, Response, Ui};
use relgraph::EntityId;

use super::super::ViewModel;
use super::super::render_utils::ViewTransform;

impl ViewModel {
    pub(in crate::app) fn handle_graph_zoom(
        &mut self,
        ui: &Ui,
        transform: ViewTransform,
        response: &Response,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| transform.rect.center());
        let world_before = transform.screen_to_world(pointer);

        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.zoom = (self.zoom * zoom_factor).clamp(0.1, 6.0);
        self.pan = pointer - transform.rect.center() - (world_before - transform.origin) * self.zoom;
    }

    pub(in crate::app) fn handle_graph_pan(&mut self, response: &Response) {
        if response.dragged_by(PointerButton::Secondary)
            || response.dragged_by(PointerButton::Middle)
        {
            self.pan += response.drag_delta();
        }
    }

    /// Feeds primary-button drag gestures to the engine in canvas
    /// coordinates.
    pub(in crate::app) fn handle_node_drag(
        &mut self,
        ui: &Ui,
        transform: ViewTransform,
        response: &Response,
    ) {
        let pointer = response.interact_pointer_pos().map(|pos| transform.screen_to_world(pos));

        // Hit-test where the press began, not where the drag threshold was crossed.
        let press_origin = ui
            .input(|input| input.pointer.press_origin())
            .map(|pos| transform.screen_to_world(pos))
            .or(pointer);
        if response.drag_started_by(PointerButton::Primary)
            && let Some(origin) = press_origin
            && let Some(id) = self.engine.pointer_down(origin)
        {
            self.set_selected(Some(id));
        }

        if response.dragged_by(PointerButton::Primary)
            && let Some(pointer) = pointer
        {
            self.engine.pointer_move(pointer);
        }

        if response.drag_stopped_by(PointerButton::Primary) {
            self.engine.pointer_up();
        }

        // The release can land outside the window; don't leave the node pinned.
        let primary_down = ui.input(|input| input.pointer.primary_down());
        if !primary_down
            && let Some(dragged) = self.engine.dragged().cloned()
        {
            self.engine.cancel_drag(&dragged);
        }
    }

    pub(in crate::app) fn handle_node_clicks(&mut self, transform: ViewTransform, response: &Response) {
        let hit = response
            .interact_pointer_pos()
            .and_then(|pos| self.node_under(transform, pos));

        if response.double_clicked() {
            if let Some(id) = hit {
                self.set_selected(Some(id.clone()));
                self.focus_on(Some(id));
            }
        } else if response.clicked() {
            self.set_selected(hit);
        } else if response.secondary_clicked()
            && let Some(id) = hit
        {
            self.engine.toggle_pin(&id);
        }
    }

    pub(in crate::app) fn update_hovered(&mut self, transform: ViewTransform, response: &Response) {
        let dragging = self.engine.dragged().cloned();
        self.hovered = match dragging {
            Some(id) => Some(id),
            None => response
                .hover_pos()
                .and_then(|pos| self.node_under(transform, pos)),
        };

        if self.hovered.is_some() {
            let cursor = if self.engine.dragged().is_some() {
                egui::CursorIcon::Grabbing
            } else {
                egui::CursorIcon::PointingHand
            };
            response.ctx.set_cursor_icon(cursor);
        }
    }

    fn node_under(&self, transform: ViewTransform, screen: Pos2) -> Option<EntityId> {
        let pointer = transform.screen_to_world(screen);
        let slop = self.engine.config().hit_slop / self.zoom;
        self.engine
            .scene()
            .node_at(pointer, slop)
            .map(|shape| shape.id.clone())
    }
}
