//! Host-facing engine: owns the index, the active simulation, its render
//! scene and the drag controller, and swaps all of them together whenever
//! the visible subgraph changes.

use std::collections::{HashMap, HashSet};

use eframe::egui::{Pos2, Vec2, pos2, vec2};
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::drag::{DragController, DragState};
use crate::error::EngineError;
use crate::filter::{Subgraph, compute_subgraph};
use crate::model::{Entity, EntityId, GraphIndex, IndexDiagnostics, Relation, build_index};
use crate::render::RenderScene;
use crate::simulation::{
    CenterForce, CollideForce, DriverConfig, Force, GraphNode, LinkForce, LinkSpec,
    ManyBodyForce, Simulation, SimulationParams, TickDriver, TickReport,
};
use crate::util::{normalize_log, phyllotaxis_offset};

const SEED_SPACING: f32 = 14.0;

/// The drawing area handed to the engine, in canvas pixels. Simulation
/// coordinates are canvas coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Surface {
    pub width: f32,
    pub height: f32,
}

impl Surface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }

    pub fn center(self) -> Pos2 {
        pos2(self.width * 0.5, self.height * 0.5)
    }

    pub fn size(self) -> Vec2 {
        vec2(self.width, self.height)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ForceConfig {
    pub center_strength: f32,
    pub many_body: ManyBodyForce,
    pub link: LinkForce,
    pub collide: Option<CollideForce>,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            center_strength: CenterForce::default().strength,
            many_body: ManyBodyForce::default(),
            link: LinkForce::default(),
            collide: Some(CollideForce::default()),
        }
    }
}

impl ForceConfig {
    pub fn build(&self, surface: Surface) -> Vec<Force> {
        let mut forces = vec![
            Force::Center(CenterForce {
                center: surface.center(),
                strength: self.center_strength,
            }),
            Force::ManyBody(self.many_body),
            Force::Link(self.link),
        ];
        if let Some(collide) = self.collide {
            forces.push(Force::Collide(collide));
        }
        forces
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub forces: ForceConfig,
    pub simulation: SimulationParams,
    pub driver: DriverConfig,
    /// Alpha target held while a node is dragged.
    pub drag_alpha_target: f32,
    /// Extra pointer tolerance, in canvas pixels, when hit-testing nodes.
    pub hit_slop: f32,
    pub min_node_radius: f32,
    pub max_node_radius: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            forces: ForceConfig::default(),
            simulation: SimulationParams::default(),
            driver: DriverConfig::default(),
            drag_alpha_target: 0.3,
            hit_slop: 3.0,
            min_node_radius: 6.0,
            max_node_radius: 20.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubgraphSummary {
    pub nodes: usize,
    pub links: usize,
    pub focal: Option<EntityId>,
    pub relation_type: Option<String>,
}

pub struct GraphEngine {
    surface: Surface,
    config: EngineConfig,
    index: Option<GraphIndex>,
    focal: Option<EntityId>,
    relation_type: Option<String>,
    simulation: Option<Simulation>,
    driver: TickDriver,
    scene: RenderScene,
    drag: DragController,
    sticky_pins: HashSet<EntityId>,
}

impl GraphEngine {
    pub fn new(surface: Surface, config: EngineConfig) -> Self {
        Self {
            surface,
            config,
            index: None,
            focal: None,
            relation_type: None,
            simulation: None,
            driver: TickDriver::new(config.driver),
            scene: RenderScene::new(),
            drag: DragController::new(config.drag_alpha_target),
            sticky_pins: HashSet::new(),
        }
    }

    pub fn surface(&self) -> Surface {
        self.surface
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn index(&self) -> Option<&GraphIndex> {
        self.index.as_ref()
    }

    pub fn simulation(&self) -> Option<&Simulation> {
        self.simulation.as_ref()
    }

    pub fn scene(&self) -> &RenderScene {
        &self.scene
    }

    pub fn focal(&self) -> Option<&EntityId> {
        self.focal.as_ref()
    }

    pub fn relation_type(&self) -> Option<&str> {
        self.relation_type.as_deref()
    }

    pub fn drag_state(&self) -> &DragState {
        self.drag.state()
    }

    pub fn dragged(&self) -> Option<&EntityId> {
        self.drag.dragged()
    }

    pub fn is_pinned(&self, id: &EntityId) -> bool {
        self.sticky_pins.contains(id)
    }

    /// Whether the host should keep driving frames.
    pub fn is_animating(&self) -> bool {
        self.simulation.as_ref().is_some_and(Simulation::is_active)
    }

    pub fn summary(&self) -> Option<SubgraphSummary> {
        let simulation = self.simulation.as_ref()?;
        Some(SubgraphSummary {
            nodes: simulation.nodes().len(),
            links: simulation.links().len(),
            focal: self.focal.clone(),
            relation_type: self.relation_type.clone(),
        })
    }

    /// Replaces the dataset. Filters that no longer resolve are cleared; the
    /// previous layout is discarded.
    pub fn load(&mut self, entities: Vec<Entity>, relations: Vec<Relation>) -> IndexDiagnostics {
        self.teardown();
        let (index, diagnostics) = build_index(entities, relations);

        if let Some(focal) = &self.focal
            && !index.contains(focal)
        {
            debug!(%focal, "focal entity missing from new dataset; clearing focus");
            self.focal = None;
        }
        self.sticky_pins.retain(|id| index.contains(id));
        self.index = Some(index);

        let focal = self.focal.clone();
        let relation_type = self.relation_type.clone();
        if let Err(error) = self.rebuild(focal, relation_type, false) {
            // Only a contract violation can get here; the filters were checked above.
            error!(%error, "failed to build the initial subgraph");
        }
        diagnostics
    }

    /// Focuses the view on `focal` and its direct relations, or shows the
    /// whole dataset for `None`. An unknown id leaves the current view as it
    /// is and reports [`crate::error::LookupError::EntityNotFound`].
    pub fn set_focal_entity(
        &mut self,
        focal: Option<EntityId>,
    ) -> Result<SubgraphSummary, EngineError> {
        let relation_type = self.relation_type.clone();
        self.rebuild(focal, relation_type, true)
    }

    pub fn set_relation_type_filter(
        &mut self,
        relation_type: Option<String>,
    ) -> Result<SubgraphSummary, EngineError> {
        let focal = self.focal.clone();
        self.rebuild(focal, relation_type, true)
    }

    /// Sets both filters with a single rebuild.
    pub fn set_filters(
        &mut self,
        focal: Option<EntityId>,
        relation_type: Option<String>,
    ) -> Result<SubgraphSummary, EngineError> {
        self.rebuild(focal, relation_type, true)
    }

    /// Stops ticking and releases everything derived from the dataset.
    pub fn destroy(&mut self) {
        self.teardown();
        self.index = None;
        self.focal = None;
        self.relation_type = None;
        self.sticky_pins.clear();
        info!("graph engine destroyed");
    }

    fn teardown(&mut self) {
        if let Some(mut simulation) = self.simulation.take() {
            simulation.stop();
        }
        self.driver.reset();
        self.scene.clear();
        self.drag = DragController::new(self.config.drag_alpha_target);
    }

    /// Runs due ticks for `delta_seconds` of frame time and syncs the scene
    /// after each one.
    pub fn advance(&mut self, delta_seconds: f32) -> TickReport {
        let Some(simulation) = self.simulation.as_mut() else {
            return TickReport::default();
        };
        let scene = &mut self.scene;
        self.driver
            .advance(simulation, delta_seconds, |simulation| scene.sync(simulation))
    }

    pub fn restart(&mut self) {
        if let Some(simulation) = self.simulation.as_mut() {
            simulation.restart();
        }
    }

    pub fn resize(&mut self, surface: Surface) {
        if surface == self.surface {
            return;
        }
        self.surface = surface;
        self.reseed_forces();
    }

    pub fn set_force_config(&mut self, forces: ForceConfig) {
        if forces == self.config.forces {
            return;
        }
        self.config.forces = forces;
        self.reseed_forces();
    }

    fn reseed_forces(&mut self) {
        if let Some(simulation) = self.simulation.as_mut() {
            simulation.set_forces(self.config.forces.build(self.surface));
            simulation.restart();
        }
    }

    /// Starts dragging the node under `point`, if any.
    pub fn pointer_down(&mut self, point: Pos2) -> Option<EntityId> {
        let id = self.scene.node_at(point, self.config.hit_slop)?.id.clone();
        let simulation = self.simulation.as_mut()?;
        if !self.drag.pointer_down(simulation, &id) {
            return None;
        }
        self.scene.sync(simulation);
        Some(id)
    }

    pub fn pointer_move(&mut self, point: Pos2) -> bool {
        let Some(simulation) = self.simulation.as_mut() else {
            return false;
        };
        let moved = self.drag.pointer_move(simulation, point);
        if moved {
            self.scene.sync(simulation);
        }
        moved
    }

    pub fn pointer_up(&mut self) -> Option<EntityId> {
        let simulation = self.simulation.as_mut()?;
        let released = self.drag.pointer_up(simulation)?;
        self.repin_if_sticky(&released);
        Some(released)
    }

    pub fn cancel_drag(&mut self, id: &EntityId) -> bool {
        let Some(simulation) = self.simulation.as_mut() else {
            return false;
        };
        if !self.drag.cancel_drag(simulation, id) {
            return false;
        }
        self.repin_if_sticky(id);
        true
    }

    fn repin_if_sticky(&mut self, id: &EntityId) {
        let Some(simulation) = self.simulation.as_mut() else {
            return;
        };
        if self.sticky_pins.contains(id)
            && let Some(position) = simulation.node(id).map(|node| node.position)
        {
            simulation.pin(id, position);
        }
        self.scene.sync(simulation);
    }

    /// Toggles a pin that outlives drag gestures and filter changes. Returns
    /// the new pinned state, or `None` when `id` is not in the current view.
    pub fn toggle_pin(&mut self, id: &EntityId) -> Option<bool> {
        let simulation = self.simulation.as_mut()?;
        let position = simulation.node(id)?.position;

        let pinned = if self.sticky_pins.remove(id) {
            if self.drag.dragged() != Some(id) {
                simulation.unpin(id);
            }
            false
        } else {
            self.sticky_pins.insert(id.clone());
            simulation.pin(id, position);
            true
        };
        simulation.restart();
        self.scene.sync(simulation);
        Some(pinned)
    }

    fn rebuild(
        &mut self,
        focal: Option<EntityId>,
        relation_type: Option<String>,
        carry_over: bool,
    ) -> Result<SubgraphSummary, EngineError> {
        let index = self.index.as_ref().ok_or(EngineError::NotLoaded)?;
        let subgraph = compute_subgraph(index, focal.as_ref(), relation_type.as_deref())?;

        let previous = match (&self.simulation, carry_over) {
            (Some(simulation), true) => simulation
                .nodes()
                .iter()
                .map(|node| (&node.id, node))
                .collect::<HashMap<_, _>>(),
            _ => HashMap::new(),
        };
        let nodes = self.seed_nodes(index, &subgraph, focal.as_ref(), &previous);
        let links = subgraph
            .links
            .iter()
            .map(|relation| {
                LinkSpec::new(
                    relation.source_id.clone(),
                    relation.target_id.clone(),
                    relation.relation_type.clone(),
                )
            })
            .collect();
        let carried = previous.len();
        drop(previous);

        let mut simulation = Simulation::new(
            nodes,
            links,
            self.config.forces.build(self.surface),
            self.config.simulation,
        )?;
        if let Some(dragged) = self.drag.dragged()
            && simulation.node(dragged).is_some()
        {
            simulation.set_alpha_target(self.config.drag_alpha_target);
        }

        if let Some(mut old) = self.simulation.take() {
            old.stop();
        }
        self.driver.reset();
        self.drag.retain(&simulation);
        self.scene.rebuild(&simulation, index);
        self.simulation = Some(simulation);
        self.focal = focal;
        self.relation_type = relation_type;

        let summary = self.summary().ok_or(EngineError::NotLoaded)?;
        info!(
            nodes = summary.nodes,
            links = summary.links,
            carried,
            focal = ?summary.focal,
            relation_type = ?summary.relation_type,
            "subgraph rebuilt"
        );
        Ok(summary)
    }

    fn seed_nodes(
        &self,
        index: &GraphIndex,
        subgraph: &Subgraph<'_>,
        focal: Option<&EntityId>,
        previous: &HashMap<&EntityId, &GraphNode>,
    ) -> Vec<GraphNode> {
        let mut visible_degree = HashMap::<&EntityId, usize>::new();
        for relation in &subgraph.links {
            *visible_degree.entry(&relation.source_id).or_default() += 1;
            if relation.target_id != relation.source_id {
                *visible_degree.entry(&relation.target_id).or_default() += 1;
            }
        }
        let degrees = subgraph
            .nodes
            .iter()
            .map(|entity| visible_degree.get(&entity.id).copied().unwrap_or(0))
            .collect::<Vec<_>>();
        let min_degree = degrees.iter().copied().min().unwrap_or(0);
        let max_degree = degrees.iter().copied().max().unwrap_or(0);
        let radius_span = (self.config.max_node_radius - self.config.min_node_radius).max(0.0);
        let center = self.surface.center().to_vec2();

        let mut fresh = 0usize;
        let mut nodes = Vec::with_capacity(subgraph.nodes.len());
        for (entity, degree) in subgraph.nodes.iter().zip(degrees) {
            let radius = if focal == Some(&entity.id) {
                self.config.max_node_radius
            } else {
                self.config.min_node_radius
                    + normalize_log(degree, min_degree, max_degree) * radius_span
            };

            let mut node = match previous.get(&entity.id) {
                Some(prior) => {
                    let mut node = GraphNode::new(entity.id.clone(), prior.position, radius);
                    node.velocity = prior.velocity;
                    node.fixed = prior.fixed;
                    node
                }
                None => {
                    let anchor = Self::surviving_neighbor(index, subgraph, &entity.id, previous)
                        .unwrap_or(center);
                    let offset = phyllotaxis_offset(fresh, SEED_SPACING);
                    fresh += 1;
                    GraphNode::new(entity.id.clone(), anchor + offset, radius)
                }
            };
            if self.sticky_pins.contains(&entity.id) && node.fixed.is_none() {
                node.fixed = Some(node.position);
            }
            nodes.push(node);
        }
        nodes
    }

    /// Position of a node that stays visible and is linked to `id`, so
    /// entering nodes appear next to their neighbours.
    fn surviving_neighbor(
        index: &GraphIndex,
        subgraph: &Subgraph<'_>,
        id: &EntityId,
        previous: &HashMap<&EntityId, &GraphNode>,
    ) -> Option<Vec2> {
        if previous.is_empty() {
            return None;
        }
        subgraph
            .links
            .iter()
            .filter_map(|relation| relation.other_end(id))
            .chain(
                index
                    .links_of(id)
                    .iter()
                    .filter_map(|&link| index.relations()[link].other_end(id)),
            )
            .find_map(|neighbor| previous.get(neighbor).map(|node| node.position))
    }
}
