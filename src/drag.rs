use eframe::egui::Pos2;
use tracing::debug;

use crate::model::EntityId;
use crate::simulation::Simulation;

#[derive(Clone, Debug, Default, PartialEq)]
pub enum DragState {
    #[default]
    Free,
    Dragging {
        node: EntityId,
    },
}

/// Pins a node to the pointer for the length of a drag gesture.
///
/// While dragging, the simulation's alpha target is held at `alpha_target` so
/// neighbours keep reacting; releasing clears the pin and lets the layout
/// cool again.
#[derive(Clone, Debug)]
pub struct DragController {
    state: DragState,
    alpha_target: f32,
}

impl DragController {
    pub fn new(alpha_target: f32) -> Self {
        Self {
            state: DragState::Free,
            alpha_target,
        }
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn dragged(&self) -> Option<&EntityId> {
        match &self.state {
            DragState::Free => None,
            DragState::Dragging { node } => Some(node),
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragged().is_some()
    }

    /// Starts dragging `id`. The node is pinned where it currently is, not at
    /// the pointer, so grabbing it off-centre does not make it jump.
    pub fn pointer_down(&mut self, simulation: &mut Simulation, id: &EntityId) -> bool {
        if self.is_dragging() {
            self.pointer_up(simulation);
        }

        let Some(position) = simulation.node(id).map(|node| node.position) else {
            debug!(%id, "pointer down on a node outside the simulation");
            return false;
        };

        simulation.pin(id, position);
        simulation.set_alpha_target(self.alpha_target);
        simulation.restart();
        self.state = DragState::Dragging { node: id.clone() };
        true
    }

    pub fn pointer_move(&mut self, simulation: &mut Simulation, pointer: Pos2) -> bool {
        let DragState::Dragging { node } = &self.state else {
            return false;
        };
        simulation.pin(node, pointer.to_vec2())
    }

    /// Ends the gesture and returns the released node. A release with no
    /// matching press is ignored.
    pub fn pointer_up(&mut self, simulation: &mut Simulation) -> Option<EntityId> {
        let DragState::Dragging { node } = std::mem::take(&mut self.state) else {
            debug!("pointer up without an active drag");
            return None;
        };

        simulation.unpin(&node);
        simulation.set_alpha_target(0.0);
        Some(node)
    }

    /// Releases `id` if it is the node being dragged, for hosts that may
    /// lose the release event.
    pub fn cancel_drag(&mut self, simulation: &mut Simulation, id: &EntityId) -> bool {
        if self.dragged() != Some(id) {
            return false;
        }
        self.pointer_up(simulation).is_some()
    }

    /// Forgets a drag whose node is gone from `simulation`, e.g. after the
    /// subgraph was swapped.
    pub fn retain(&mut self, simulation: &Simulation) {
        if let Some(node) = self.dragged()
            && simulation.node(node).is_none()
        {
            debug!(%node, "dragged node left the subgraph");
            self.state = DragState::Free;
        }
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::{Vec2, vec2};

    use super::*;
    use crate::simulation::{
        CenterForce, Force, GraphNode, LinkSpec, ManyBodyForce, SimulationParams,
    };

    fn simulation() -> Simulation {
        Simulation::new(
            vec![
                GraphNode::new("a".into(), vec2(100.0, 100.0), 8.0),
                GraphNode::new("b".into(), vec2(140.0, 100.0), 8.0),
            ],
            vec![LinkSpec::new("a", "b", "partner")],
            vec![
                Force::Center(CenterForce {
                    center: Pos2::new(120.0, 100.0),
                    strength: 0.1,
                }),
                Force::ManyBody(ManyBodyForce::default()),
            ],
            SimulationParams::default(),
        )
        .unwrap()
    }

    #[test]
    fn drag_lifecycle_tracks_pointer_then_frees_node() {
        let mut simulation = simulation();
        let mut drag = DragController::new(0.3);
        let id = EntityId::from("a");
        for _ in 0..200 {
            simulation.tick();
        }
        let start = simulation.node(&id).unwrap().position;

        assert!(drag.pointer_down(&mut simulation, &id));
        assert_eq!(simulation.node(&id).unwrap().fixed, Some(start));
        assert_eq!(simulation.alpha(), 1.0);

        for step in 1..=10 {
            let pointer = Pos2::new(100.0 + step as f32 * 7.0, 50.0 - step as f32);
            assert!(drag.pointer_move(&mut simulation, pointer));
            assert_eq!(simulation.node(&id).unwrap().position, pointer.to_vec2());
            simulation.tick();
            assert_eq!(simulation.node(&id).unwrap().position, pointer.to_vec2());
        }

        assert_eq!(drag.pointer_up(&mut simulation), Some(id.clone()));
        assert_eq!(drag.state(), &DragState::Free);
        let node = simulation.node(&id).unwrap();
        assert_eq!(node.fixed, None);
        assert_eq!(node.velocity, Vec2::ZERO);
        assert_eq!(simulation.alpha_target(), 0.0);
    }

    #[test]
    fn stray_release_is_a_no_op() {
        let mut simulation = simulation();
        let mut drag = DragController::new(0.3);

        assert_eq!(drag.pointer_up(&mut simulation), None);
        assert!(!drag.pointer_move(&mut simulation, Pos2::new(1.0, 1.0)));
        assert!(simulation.nodes().iter().all(|node| node.fixed.is_none()));
    }

    #[test]
    fn cancel_only_releases_the_dragged_node() {
        let mut simulation = simulation();
        let mut drag = DragController::new(0.3);
        let a = EntityId::from("a");
        drag.pointer_down(&mut simulation, &a);

        assert!(!drag.cancel_drag(&mut simulation, &"b".into()));
        assert!(drag.is_dragging());
        assert!(drag.cancel_drag(&mut simulation, &a));
        assert!(!drag.is_dragging());
        assert!(simulation.node(&a).unwrap().fixed.is_none());
    }

    #[test]
    fn unknown_node_does_not_start_a_drag() {
        let mut simulation = simulation();
        let mut drag = DragController::new(0.3);

        assert!(!drag.pointer_down(&mut simulation, &"ghost".into()));
        assert_eq!(drag.state(), &DragState::Free);
    }

    #[test]
    fn second_press_releases_the_first_node() {
        let mut simulation = simulation();
        let mut drag = DragController::new(0.3);
        let a = EntityId::from("a");
        let b = EntityId::from("b");

        drag.pointer_down(&mut simulation, &a);
        drag.pointer_down(&mut simulation, &b);

        assert_eq!(drag.dragged(), Some(&b));
        assert!(simulation.node(&a).unwrap().fixed.is_none());
        assert!(simulation.node(&b).unwrap().fixed.is_some());
    }
}
