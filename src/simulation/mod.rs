//! Force-directed simulation over the active subgraph.
//!
//! The simulation owns per-node kinematic state and advances it one tick at a
//! time: alpha cools toward its target, every configured [`Force`] adds to
//! node velocities, then velocities are damped and integrated. Pinned nodes
//! are held exactly at their fixed point.

mod driver;
mod forces;
mod quadtree;

use std::collections::HashMap;

use eframe::egui::Vec2;
use serde::Deserialize;
use tracing::{debug, trace};

use crate::error::SimulationError;
use crate::model::EntityId;

pub use driver::{DriverConfig, TickDriver, TickReport};
pub use forces::{CenterForce, CollideForce, Force, ForceContext, LinkForce, ManyBodyForce};
use forces::ForceScratch;

#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
    pub id: EntityId,
    pub position: Vec2,
    pub velocity: Vec2,
    /// Pinned position. While set, the node is held here and never
    /// integrates velocity.
    pub fixed: Option<Vec2>,
    pub radius: f32,
}

impl GraphNode {
    pub fn new(id: EntityId, position: Vec2, radius: f32) -> Self {
        Self {
            id,
            position,
            velocity: Vec2::ZERO,
            fixed: None,
            radius,
        }
    }

    pub fn is_pinned(&self) -> bool {
        self.fixed.is_some()
    }
}

/// A link to be resolved against the node set when a simulation is built.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkSpec {
    pub source: EntityId,
    pub target: EntityId,
    pub relation_type: String,
    pub distance: Option<f32>,
    pub strength: Option<f32>,
}

impl LinkSpec {
    pub fn new(
        source: impl Into<EntityId>,
        target: impl Into<EntityId>,
        relation_type: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            relation_type: relation_type.into(),
            distance: None,
            strength: None,
        }
    }
}

/// A link resolved to node indices of the owning simulation.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphLink {
    pub source: usize,
    pub target: usize,
    pub relation_type: String,
    pub distance: Option<f32>,
    pub strength: Option<f32>,
    pub(crate) degree_strength: f32,
    /// Share of the correction applied to the target.
    pub(crate) bias: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    pub alpha_min: f32,
    pub alpha_decay: f32,
    /// Fraction of velocity lost per tick.
    pub velocity_decay: f32,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            alpha_min: 0.001,
            alpha_decay: 1.0 - 0.001_f32.powf(1.0 / 300.0),
            velocity_decay: 0.4,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RunState {
    Running,
    Suspended,
    Stopped,
}

pub struct Simulation {
    nodes: Vec<GraphNode>,
    links: Vec<GraphLink>,
    forces: Vec<Force>,
    index_by_id: HashMap<EntityId, usize>,
    params: SimulationParams,
    alpha: f32,
    alpha_target: f32,
    run_state: RunState,
    tick_count: u64,
    scratch: ForceScratch,
}

impl Simulation {
    pub fn new(
        nodes: Vec<GraphNode>,
        links: Vec<LinkSpec>,
        forces: Vec<Force>,
        params: SimulationParams,
    ) -> Result<Self, SimulationError> {
        let mut index_by_id = HashMap::with_capacity(nodes.len());
        for (index, node) in nodes.iter().enumerate() {
            if index_by_id.insert(node.id.clone(), index).is_some() {
                return Err(SimulationError::DuplicateNode(node.id.clone()));
            }
        }

        let mut resolved = Vec::with_capacity(links.len());
        for link in links {
            let (Some(&source), Some(&target)) =
                (index_by_id.get(&link.source), index_by_id.get(&link.target))
            else {
                return Err(SimulationError::UnknownLinkEndpoint {
                    source_id: link.source,
                    target_id: link.target,
                });
            };
            resolved.push((source, target, link));
        }

        let mut degree = vec![0usize; nodes.len()];
        for &(source, target, _) in &resolved {
            degree[source] += 1;
            degree[target] += 1;
        }

        let links = resolved
            .into_iter()
            .map(|(source, target, spec)| {
                let source_degree = degree[source] as f32;
                let target_degree = degree[target] as f32;
                GraphLink {
                    source,
                    target,
                    relation_type: spec.relation_type,
                    distance: spec.distance,
                    strength: spec.strength,
                    degree_strength: 1.0 / source_degree.min(target_degree),
                    bias: source_degree / (source_degree + target_degree),
                }
            })
            .collect::<Vec<_>>();

        let mut simulation = Self {
            nodes,
            links,
            forces,
            index_by_id,
            params,
            alpha: 1.0,
            alpha_target: 0.0,
            run_state: RunState::Running,
            tick_count: 0,
            scratch: ForceScratch::default(),
        };
        for node in &mut simulation.nodes {
            if let Some(fixed) = node.fixed {
                node.position = fixed;
                node.velocity = Vec2::ZERO;
            }
        }
        debug!(
            nodes = simulation.nodes.len(),
            links = simulation.links.len(),
            forces = simulation.forces.len(),
            "simulation created"
        );
        Ok(simulation)
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn links(&self) -> &[GraphLink] {
        &self.links
    }

    pub fn forces(&self) -> &[Force] {
        &self.forces
    }

    pub fn node_index(&self, id: &EntityId) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn node(&self, id: &EntityId) -> Option<&GraphNode> {
        self.node_index(id).map(|index| &self.nodes[index])
    }

    pub fn node_mut(&mut self, id: &EntityId) -> Option<&mut GraphNode> {
        self.node_index(id).map(move |index| &mut self.nodes[index])
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn alpha_min(&self) -> f32 {
        self.params.alpha_min
    }

    pub fn alpha_target(&self) -> f32 {
        self.alpha_target
    }

    pub fn params(&self) -> SimulationParams {
        self.params
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn is_settled(&self) -> bool {
        self.alpha <= self.params.alpha_min
    }

    /// Whether a driver should keep ticking this simulation.
    pub fn is_active(&self) -> bool {
        self.run_state == RunState::Running
    }

    pub fn is_stopped(&self) -> bool {
        self.run_state == RunState::Stopped
    }

    /// Reheats the layout and resumes a suspended or stopped driver.
    pub fn restart(&mut self) {
        self.alpha = 1.0;
        self.run_state = RunState::Running;
    }

    pub fn stop(&mut self) {
        self.run_state = RunState::Stopped;
    }

    pub(crate) fn suspend(&mut self) {
        if self.run_state == RunState::Running {
            debug!(ticks = self.tick_count, "simulation settled");
            self.run_state = RunState::Suspended;
        }
    }

    /// Sets the value alpha cools toward. Raising the target above the current
    /// alpha counts as a perturbation and lifts alpha with it.
    pub fn set_alpha_target(&mut self, target: f32) {
        self.alpha_target = target.clamp(0.0, 1.0);
        if self.alpha < self.alpha_target {
            self.alpha = self.alpha_target;
        }
    }

    pub fn set_forces(&mut self, forces: Vec<Force>) {
        self.forces = forces;
    }

    pub fn pin(&mut self, id: &EntityId, point: Vec2) -> bool {
        let Some(node) = self.node_mut(id) else {
            return false;
        };
        node.fixed = Some(point);
        node.position = point;
        node.velocity = Vec2::ZERO;
        true
    }

    pub fn unpin(&mut self, id: &EntityId) -> bool {
        match self.node_mut(id) {
            Some(node) => node.fixed.take().is_some(),
            None => false,
        }
    }

    pub fn tick(&mut self) {
        self.alpha = (self.alpha + (self.alpha_target - self.alpha) * self.params.alpha_decay)
            .clamp(self.params.alpha_min, 1.0);

        let mut ctx = ForceContext {
            nodes: &mut self.nodes,
            links: &self.links,
            alpha: self.alpha,
            scratch: &mut self.scratch,
        };
        for force in &self.forces {
            force.apply(&mut ctx);
        }

        let keep = 1.0 - self.params.velocity_decay;
        for node in &mut self.nodes {
            match node.fixed {
                Some(fixed) => {
                    node.position = fixed;
                    node.velocity = Vec2::ZERO;
                }
                None => {
                    node.velocity *= keep;
                    node.position += node.velocity;
                }
            }
        }

        self.tick_count += 1;
        trace!(tick = self.tick_count, alpha = self.alpha, "tick");
    }
}
