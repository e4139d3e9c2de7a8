use eframe::egui::{self, Align, Context, Layout, Vec2};
use relgraph::search::resolve_entity;
use relgraph::{Dataset, EntityId, GraphEngine, Surface};
use tracing::{info, warn};

use super::super::{LaunchOptions, ViewModel};

impl ViewModel {
    pub(in crate::app) fn new(dataset: Dataset, launch: &LaunchOptions) -> Self {
        let mut engine = GraphEngine::new(Surface::new(960.0, 720.0), launch.config);
        let (entities, relations) = dataset.into_parts();
        let diagnostics = engine.load(entities, relations);
        let relation_types = engine
            .index()
            .map(|index| index.relation_types())
            .unwrap_or_default();

        let mut model = Self {
            forces: launch.config.forces,
            engine,
            data_path: launch.data_path.clone(),
            diagnostics,
            relation_types,
            search: String::new(),
            status: None,
            selected: None,
            hovered: None,
            pan: Vec2::ZERO,
            zoom: 1.0,
            show_labels: true,
            show_arrows: true,
        };
        model.apply_launch_filters(launch);
        model
    }

    fn apply_launch_filters(&mut self, launch: &LaunchOptions) {
        let focal = match (&launch.focus, self.engine.index()) {
            (Some(query), Some(index)) => match resolve_entity(index, query) {
                Ok(id) => Some(id),
                Err(error) => {
                    warn!(%error, "ignoring --focus");
                    self.status = Some(error.to_string());
                    None
                }
            },
            _ => None,
        };
        let relation_type = launch
            .relation_type
            .clone()
            .filter(|kind| self.relation_types.contains(kind));
        if launch.relation_type.is_some() && relation_type.is_none() {
            warn!(relation_type = ?launch.relation_type, "ignoring unknown --relation-type");
        }

        if let Some(id) = &focal {
            self.search = id.to_string();
        }
        self.selected = focal.clone();
        self.apply_filters(focal, relation_type);
    }

    pub(in crate::app) fn reload(&mut self, dataset: Dataset) {
        let (entities, relations) = dataset.into_parts();
        self.diagnostics = self.engine.load(entities, relations);
        self.relation_types = self
            .engine
            .index()
            .map(|index| index.relation_types())
            .unwrap_or_default();

        if let Some(kind) = self.engine.relation_type()
            && !self.relation_types.iter().any(|known| known == kind)
        {
            let focal = self.engine.focal().cloned();
            self.apply_filters(focal, None);
        }

        if let Some(selected) = &self.selected
            && self
                .engine
                .index()
                .is_none_or(|index| !index.contains(selected))
        {
            self.selected = None;
        }
        self.hovered = None;
        info!(path = %self.data_path.display(), "dataset reloaded");
    }

    pub(in crate::app) fn apply_filters(
        &mut self,
        focal: Option<EntityId>,
        relation_type: Option<String>,
    ) {
        match self.engine.set_filters(focal, relation_type) {
            Ok(_) => self.status = None,
            Err(error) => {
                warn!(%error, "filter change rejected");
                self.status = Some(error.to_string());
            }
        }
    }

    pub(in crate::app) fn focus_on(&mut self, id: Option<EntityId>) {
        match self.engine.set_focal_entity(id) {
            Ok(_) => self.status = None,
            Err(error) => {
                warn!(%error, "focus change rejected");
                self.status = Some(error.to_string());
            }
        }
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        reload_requested: &mut bool,
        is_reloading: bool,
    ) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("relgraph");
                    ui.separator();
                    ui.label(format!("data: {}", self.data_path.display()));
                    if let Some(index) = self.engine.index() {
                        ui.label(format!("entities: {}", index.entity_count()));
                        ui.label(format!("relations: {}", index.relation_count()));
                    }
                    if !self.diagnostics.is_clean() {
                        ui.label(format!(
                            "dropped: {} relations, {} duplicate entities",
                            self.diagnostics.dropped_relations, self.diagnostics.duplicate_entities
                        ))
                        .on_hover_text("Relations with unknown endpoints and repeated entity ids are ignored.");
                    }
                    let reload_button =
                        ui.add_enabled(!is_reloading, egui::Button::new("Reload data"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if let Some(summary) = self.engine.summary() {
                            ui.label(format!(
                                "visible: {} nodes, {} links",
                                summary.nodes, summary.links
                            ));
                        }
                        if let Some(status) = &self.status {
                            ui.colored_label(egui::Color32::from_rgb(236, 120, 104), status.as_str());
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_graph(ui));
    }

    pub(in crate::app) fn set_selected(&mut self, selected: Option<EntityId>) {
        self.selected = selected;
    }
}
