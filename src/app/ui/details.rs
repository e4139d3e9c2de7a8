use eframe::egui::{self, RichText, Ui};
use relgraph::EntityId;

use super::super::ViewModel;

struct RelationRow {
    other: EntityId,
    other_name: String,
    relation_type: String,
    outgoing: bool,
    in_view: bool,
}

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection Details");
        ui.add_space(6.0);

        let Some(selected_id) = self.selected.clone() else {
            ui.label("Select a node in the graph, or focus on one from the controls.");
            return;
        };

        let Some(index) = self.engine.index() else {
            return;
        };
        let Some(entity) = index.entity(&selected_id) else {
            ui.label("Selected entity is no longer in the dataset.");
            return;
        };

        let display_name = entity.display_name.clone();
        let group_tag = entity.group_tag.clone();
        let degree = index.degree(&selected_id);
        let in_view = self.engine.scene().handle(&selected_id).is_some();
        let rows = index
            .links_of(&selected_id)
            .iter()
            .filter_map(|&link| {
                let relation = &index.relations()[link];
                let other = relation.other_end(&selected_id)?.clone();
                Some(RelationRow {
                    other_name: index
                        .entity(&other)
                        .map_or_else(|| other.to_string(), |entity| entity.display_name.clone()),
                    in_view: self.engine.scene().handle(&other).is_some(),
                    relation_type: relation.relation_type.clone(),
                    outgoing: relation.source_id == selected_id,
                    other,
                })
            })
            .collect::<Vec<_>>();

        ui.label(RichText::new(display_name).strong());
        ui.small(selected_id.as_str());
        ui.add_space(6.0);

        ui.label(format!("Group: {}", group_tag.as_deref().unwrap_or("none")));
        ui.label(format!("Relations: {degree}"));
        ui.label(if in_view { "In view" } else { "Outside the current view" });

        ui.horizontal(|ui| {
            let is_focal = self.engine.focal() == Some(&selected_id);
            if ui
                .add_enabled(!is_focal, egui::Button::new("Focus"))
                .on_hover_text("Show this entity and its direct relations.")
                .clicked()
            {
                self.focus_on(Some(selected_id.clone()));
            }

            let pin_label = if self.engine.is_pinned(&selected_id) {
                "Unpin"
            } else {
                "Pin"
            };
            if ui
                .add_enabled(in_view, egui::Button::new(pin_label))
                .on_hover_text("Keep this node where it is while the layout moves.")
                .clicked()
            {
                self.engine.toggle_pin(&selected_id);
            }
        });

        ui.separator();
        ui.label(RichText::new("Relations").strong());
        if rows.is_empty() {
            ui.label("No relations.");
            return;
        }

        let mut clicked = None;
        egui::ScrollArea::vertical()
            .id_salt("relations_scroll")
            .auto_shrink([false, false])
            .show_rows(ui, 22.0, rows.len(), |ui, row_range| {
                for row in &rows[row_range] {
                    let arrow = if row.outgoing { "->" } else { "<-" };
                    let mut text = RichText::new(format!(
                        "{arrow} {}  ({})",
                        row.other_name, row.relation_type
                    ));
                    if !row.in_view {
                        text = text.weak();
                    }
                    if ui.link(text).on_hover_text(row.other.as_str()).clicked() {
                        clicked = Some(row.other.clone());
                    }
                }
            });

        if let Some(other) = clicked {
            self.set_selected(Some(other));
        }
    }
}
