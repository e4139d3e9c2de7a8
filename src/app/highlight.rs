use std::collections::HashSet;

use relgraph::EntityId;
use relgraph::render::{RenderScene, ShapeHandle};

/// The hovered node and everything one link away from it.
pub(super) struct HighlightState {
    pub(super) nodes: HashSet<ShapeHandle>,
    pub(super) edges: HashSet<usize>,
}

impl HighlightState {
    pub(super) fn contains_node(&self, handle: ShapeHandle) -> bool {
        self.nodes.contains(&handle)
    }

    pub(super) fn contains_edge(&self, edge: usize) -> bool {
        self.edges.contains(&edge)
    }
}

pub(super) fn build_highlight_state(scene: &RenderScene, id: &EntityId) -> Option<HighlightState> {
    let center = scene.handle(id)?;
    let mut nodes = HashSet::from([center]);
    let mut edges = HashSet::new();

    for (slot, edge) in scene.edges().iter().enumerate() {
        if edge.source == center || edge.target == center {
            nodes.insert(edge.source);
            nodes.insert(edge.target);
            edges.insert(slot);
        }
    }

    Some(HighlightState { nodes, edges })
}
