use eframe::egui::{self, Ui};
use relgraph::EntityId;
use relgraph::search::{resolve_entity, suggestions};
use relgraph::simulation::CollideForce;

use super::super::ViewModel;

const SUGGESTION_LIMIT: usize = 8;

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Graph Controls");
        ui.separator();
        ui.add_space(4.0);

        self.draw_focus_controls(ui);
        ui.separator();
        self.draw_relation_filter(ui);
        ui.separator();
        self.draw_force_controls(ui);
        ui.separator();

        ui.checkbox(&mut self.show_labels, "Show labels")
            .on_hover_text("Draw entity names next to their nodes.");
        ui.checkbox(&mut self.show_arrows, "Show arrows")
            .on_hover_text("Mark relation direction at the target end of each link.");

        ui.add_space(8.0);
        ui.small("Drag a node to move it. Right-click a node to pin it in place.");
        ui.small("Double-click a node to focus on it. Scroll to zoom, right-drag to pan.");
    }

    fn draw_focus_controls(&mut self, ui: &mut Ui) {
        ui.label("Focus (id or name)")
            .on_hover_text("Show one entity and its direct relations.");
        let search_response = ui.text_edit_singleline(&mut self.search);
        let submitted =
            search_response.lost_focus() && ui.input(|input| input.key_pressed(egui::Key::Enter));

        let mut picked: Option<EntityId> = None;
        if !self.search.trim().is_empty()
            && let Some(index) = self.engine.index()
        {
            for (id, name) in suggestions(index, self.search.trim(), SUGGESTION_LIMIT) {
                if ui.link(name).on_hover_text(id.as_str()).clicked() {
                    picked = Some(id.clone());
                }
            }
        }

        ui.horizontal(|ui| {
            if ui.button("Focus").clicked() || submitted {
                self.focus_search();
            }
            if ui
                .add_enabled(self.engine.focal().is_some(), egui::Button::new("Show all"))
                .clicked()
            {
                self.search.clear();
                self.focus_on(None);
            }
        });

        if let Some(focal) = self.engine.focal() {
            let name = self
                .engine
                .index()
                .and_then(|index| index.entity(focal))
                .map_or(focal.as_str(), |entity| entity.display_name.as_str());
            ui.small(format!("focused on {name}"));
        }

        if let Some(id) = picked {
            self.search = self
                .engine
                .index()
                .and_then(|index| index.entity(&id))
                .map_or_else(|| id.to_string(), |entity| entity.display_name.clone());
            self.set_selected(Some(id.clone()));
            self.focus_on(Some(id));
        }
    }

    fn focus_search(&mut self) {
        let query = self.search.trim();
        if query.is_empty() {
            self.focus_on(None);
            return;
        }
        let Some(index) = self.engine.index() else {
            return;
        };
        match resolve_entity(index, query) {
            Ok(id) => {
                self.set_selected(Some(id.clone()));
                self.focus_on(Some(id));
            }
            Err(error) => self.status = Some(error.to_string()),
        }
    }

    fn draw_relation_filter(&mut self, ui: &mut Ui) {
        let current = self.engine.relation_type().map(str::to_owned);
        let mut chosen = current.clone();

        egui::ComboBox::from_label("Relation type")
            .selected_text(current.as_deref().unwrap_or("All relations"))
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut chosen, None, "All relations");
                for kind in &self.relation_types {
                    ui.selectable_value(&mut chosen, Some(kind.clone()), kind.as_str());
                }
            });

        if chosen != current {
            match self.engine.set_relation_type_filter(chosen) {
                Ok(_) => self.status = None,
                Err(error) => self.status = Some(error.to_string()),
            }
        }
    }

    fn draw_force_controls(&mut self, ui: &mut Ui) {
        let mut changed = false;

        ui.collapsing("Layout forces", |ui| {
            changed |= ui
                .add(egui::Slider::new(&mut self.forces.many_body.strength, -600.0..=0.0).text("Charge"))
                .on_hover_text("Node repulsion; more negative pushes nodes further apart.")
                .changed();
            changed |= ui
                .add(egui::Slider::new(&mut self.forces.link.distance, 10.0..=300.0).text("Link distance"))
                .on_hover_text("Rest length of every link.")
                .changed();
            changed |= ui
                .add(
                    egui::Slider::new(&mut self.forces.center_strength, 0.0..=0.5)
                        .text("Centering"),
                )
                .on_hover_text("Pull toward the middle of the canvas.")
                .changed();

            let mut collide = self.forces.collide.is_some();
            if ui
                .checkbox(&mut collide, "Prevent overlap")
                .on_hover_text("Push overlapping nodes apart.")
                .changed()
            {
                self.forces.collide = collide.then(CollideForce::default);
                changed = true;
            }
            if let Some(collide) = self.forces.collide.as_mut() {
                changed |= ui
                    .add(egui::Slider::new(&mut collide.padding, 0.0..=24.0).text("Padding"))
                    .changed();
            }
        });

        if changed {
            self.engine.set_force_config(self.forces);
        }

        ui.horizontal(|ui| {
            if ui
                .button("Reheat")
                .on_hover_text("Restart the layout from its current positions.")
                .clicked()
            {
                self.engine.restart();
            }
            if ui.button("Reset view").clicked() {
                self.pan = egui::Vec2::ZERO;
                self.zoom = 1.0;
            }
            if self.engine.is_animating() {
                ui.spinner();
            }
        });
    }
}
