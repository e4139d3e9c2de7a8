//! Render primitives kept in step with the simulation.
//!
//! [`RenderScene::rebuild`] creates one shape per node and one edge per link
//! whenever the subgraph changes; [`RenderScene::sync`] runs after every tick
//! and only copies positions.

use std::collections::HashMap;

use eframe::egui::{Color32, Pos2};
use tracing::warn;

use crate::model::{EntityId, GraphIndex};
use crate::simulation::Simulation;
use crate::util::{short_label, stable_hash};

const PALETTE: [Color32; 10] = [
    Color32::from_rgb(0x1f, 0x77, 0xb4),
    Color32::from_rgb(0xff, 0x7f, 0x0e),
    Color32::from_rgb(0x2c, 0xa0, 0x2c),
    Color32::from_rgb(0xd6, 0x27, 0x28),
    Color32::from_rgb(0x94, 0x67, 0xbd),
    Color32::from_rgb(0x8c, 0x56, 0x4b),
    Color32::from_rgb(0xe3, 0x77, 0xc2),
    Color32::from_rgb(0x7f, 0x7f, 0x7f),
    Color32::from_rgb(0xbc, 0xbd, 0x22),
    Color32::from_rgb(0x17, 0xbe, 0xcf),
];

const UNGROUPED_FILL: Color32 = Color32::from_rgb(120, 140, 160);
const LABEL_MAX_CHARS: usize = 28;

pub fn group_color(group_tag: Option<&str>) -> Color32 {
    match group_tag {
        Some(tag) => PALETTE[(stable_hash(tag) % PALETTE.len() as u64) as usize],
        None => UNGROUPED_FILL,
    }
}

/// Edge stroke for a relation type: the palette colour, desaturated toward
/// grey so nodes stay the dominant marks.
pub fn relation_color(relation_type: &str) -> Color32 {
    let base = PALETTE[(stable_hash(relation_type) % PALETTE.len() as u64) as usize];
    let mix = |channel: u8| ((channel as u16 + 150) / 2) as u8;
    Color32::from_rgb(mix(base.r()), mix(base.g()), mix(base.b()))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShapeHandle(usize);

impl ShapeHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeShape {
    pub id: EntityId,
    pub center: Pos2,
    pub radius: f32,
    pub fill: Color32,
    pub label: String,
    pub pinned: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeShape {
    pub source: ShapeHandle,
    pub target: ShapeHandle,
    pub relation_type: String,
    pub stroke: Color32,
    pub from: Pos2,
    pub to: Pos2,
}

#[derive(Debug, Default)]
pub struct RenderScene {
    shapes: Vec<NodeShape>,
    edges: Vec<EdgeShape>,
    handle_by_id: HashMap<EntityId, ShapeHandle>,
    revision: u64,
}

impl RenderScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shapes(&self) -> &[NodeShape] {
        &self.shapes
    }

    pub fn edges(&self) -> &[EdgeShape] {
        &self.edges
    }

    pub fn handle(&self, id: &EntityId) -> Option<ShapeHandle> {
        self.handle_by_id.get(id).copied()
    }

    pub fn shape(&self, handle: ShapeHandle) -> Option<&NodeShape> {
        self.shapes.get(handle.0)
    }

    pub fn shape_for(&self, id: &EntityId) -> Option<&NodeShape> {
        self.handle(id).and_then(|handle| self.shape(handle))
    }

    /// Bumped on every rebuild; unchanged by [`Self::sync`].
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn clear(&mut self) {
        self.shapes.clear();
        self.edges.clear();
        self.handle_by_id.clear();
        self.revision = self.revision.wrapping_add(1);
    }

    pub fn rebuild(&mut self, simulation: &Simulation, index: &GraphIndex) {
        self.shapes.clear();
        self.edges.clear();
        self.handle_by_id.clear();
        self.revision = self.revision.wrapping_add(1);

        for (slot, node) in simulation.nodes().iter().enumerate() {
            let entity = index.entity(&node.id);
            let label = entity
                .map(|entity| short_label(&entity.display_name, LABEL_MAX_CHARS))
                .unwrap_or_else(|| node.id.to_string());
            let fill = group_color(entity.and_then(|entity| entity.group_tag.as_deref()));

            self.handle_by_id.insert(node.id.clone(), ShapeHandle(slot));
            self.shapes.push(NodeShape {
                id: node.id.clone(),
                center: node.position.to_pos2(),
                radius: node.radius,
                fill,
                label,
                pinned: node.is_pinned(),
            });
        }

        for link in simulation.links() {
            self.edges.push(EdgeShape {
                source: ShapeHandle(link.source),
                target: ShapeHandle(link.target),
                relation_type: link.relation_type.clone(),
                stroke: relation_color(&link.relation_type),
                from: self.shapes[link.source].center,
                to: self.shapes[link.target].center,
            });
        }
    }

    pub fn sync(&mut self, simulation: &Simulation) {
        let nodes = simulation.nodes();
        if nodes.len() != self.shapes.len() || simulation.links().len() != self.edges.len() {
            warn!(
                nodes = nodes.len(),
                shapes = self.shapes.len(),
                "render scene out of step with simulation; skipping sync"
            );
            return;
        }

        for (shape, node) in self.shapes.iter_mut().zip(nodes) {
            shape.center = node.position.to_pos2();
            shape.pinned = node.is_pinned();
        }
        for edge in &mut self.edges {
            edge.from = self.shapes[edge.source.0].center;
            edge.to = self.shapes[edge.target.0].center;
        }
    }

    /// Topmost shape under `point`, checked in reverse draw order.
    pub fn node_at(&self, point: Pos2, slop: f32) -> Option<&NodeShape> {
        self.shapes
            .iter()
            .rev()
            .find(|shape| shape.center.distance(point) <= shape.radius + slop)
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::*;
    use crate::model::{Entity, Relation, build_index};
    use crate::simulation::{Force, GraphNode, LinkSpec, ManyBodyForce, SimulationParams};

    fn fixture() -> (GraphIndex, Simulation) {
        let (index, _) = build_index(
            vec![
                Entity::new("a", "Acme").with_group("company"),
                Entity::new("b", "Bolt"),
            ],
            vec![Relation::new("a", "b", "partner")],
        );
        let simulation = Simulation::new(
            vec![
                GraphNode::new("a".into(), vec2(10.0, 10.0), 8.0),
                GraphNode::new("b".into(), vec2(40.0, 10.0), 6.0),
            ],
            vec![LinkSpec::new("a", "b", "partner")],
            vec![Force::ManyBody(ManyBodyForce::default())],
            SimulationParams::default(),
        )
        .unwrap();
        (index, simulation)
    }

    #[test]
    fn rebuild_encodes_entities_once() {
        let (index, simulation) = fixture();
        let mut scene = RenderScene::new();
        scene.rebuild(&simulation, &index);

        let acme = scene.shape_for(&"a".into()).unwrap();
        assert_eq!(acme.label, "Acme");
        assert_eq!(acme.fill, group_color(Some("company")));
        assert_eq!(acme.radius, 8.0);
        assert_eq!(scene.shape_for(&"b".into()).unwrap().fill, UNGROUPED_FILL);
        assert_eq!(scene.edges().len(), 1);
        assert_eq!(scene.edges()[0].stroke, relation_color("partner"));
        assert_eq!(scene.revision(), 1);
    }

    #[test]
    fn sync_moves_shapes_without_rebuilding() {
        let (index, mut simulation) = fixture();
        let mut scene = RenderScene::new();
        scene.rebuild(&simulation, &index);
        let handle = scene.handle(&"b".into()).unwrap();

        for _ in 0..5 {
            simulation.tick();
            scene.sync(&simulation);
        }

        let node = simulation.node(&"b".into()).unwrap();
        assert_eq!(scene.handle(&"b".into()), Some(handle));
        assert_eq!(scene.shape(handle).unwrap().center, node.position.to_pos2());
        assert_eq!(scene.edges()[0].to, node.position.to_pos2());
        assert_eq!(scene.revision(), 1);
    }

    #[test]
    fn hit_test_prefers_topmost_shape() {
        let (index, mut simulation) = fixture();
        simulation.pin(&"b".into(), vec2(12.0, 10.0));
        let mut scene = RenderScene::new();
        scene.rebuild(&simulation, &index);

        let hit = scene.node_at(Pos2::new(11.0, 10.0), 0.0).unwrap();
        assert_eq!(hit.id.as_str(), "b");
        assert!(hit.pinned);
        assert!(scene.node_at(Pos2::new(200.0, 200.0), 2.0).is_none());
    }
}
