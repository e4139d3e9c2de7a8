use eframe::egui::{Vec2, pos2};
use relgraph::error::LookupError;
use relgraph::{Dataset, EngineConfig, EngineError, Entity, EntityId, GraphEngine, Relation, Surface};

fn engine_with(entities: Vec<Entity>, relations: Vec<Relation>) -> GraphEngine {
    let mut engine = GraphEngine::new(Surface::new(800.0, 600.0), EngineConfig::default());
    engine.load(entities, relations);
    engine
}

fn abcd() -> GraphEngine {
    engine_with(
        vec![
            Entity::new("A", "Alpha"),
            Entity::new("B", "Beta"),
            Entity::new("C", "Gamma"),
            Entity::new("D", "Delta"),
        ],
        vec![
            Relation::new("A", "B", "partner"),
            Relation::new("A", "C", "supplier"),
            Relation::new("C", "D", "partner"),
        ],
    )
}

fn settle(engine: &mut GraphEngine) {
    for _ in 0..2000 {
        if !engine.is_animating() {
            return;
        }
        engine.advance(1.0);
    }
    panic!("layout did not settle");
}

fn visible(engine: &GraphEngine) -> Vec<&str> {
    let mut ids = engine
        .scene()
        .shapes()
        .iter()
        .map(|shape| shape.id.as_str())
        .collect::<Vec<_>>();
    ids.sort_unstable();
    ids
}

#[test]
fn focal_and_type_filters_narrow_the_view() {
    let mut engine = abcd();

    let summary = engine
        .set_filters(Some("A".into()), Some("partner".into()))
        .unwrap();
    assert_eq!((summary.nodes, summary.links), (2, 1));
    assert_eq!(visible(&engine), ["A", "B"]);

    let summary = engine.set_relation_type_filter(None).unwrap();
    assert_eq!((summary.nodes, summary.links), (3, 2));
    assert_eq!(visible(&engine), ["A", "B", "C"]);

    let summary = engine.set_focal_entity(None).unwrap();
    assert_eq!((summary.nodes, summary.links), (4, 3));
}

#[test]
fn unknown_focal_is_reported_and_view_is_kept() {
    let mut engine = abcd();
    engine.set_focal_entity(Some("A".into())).unwrap();

    let error = engine.set_focal_entity(Some("Z".into())).unwrap_err();
    assert!(matches!(
        error,
        EngineError::Lookup(LookupError::EntityNotFound(ref id)) if id.as_str() == "Z"
    ));
    assert_eq!(engine.focal(), Some(&EntityId::from("A")));
    assert_eq!(visible(&engine), ["A", "B", "C"]);
}

#[test]
fn unmatched_relation_type_leaves_only_the_focal_node() {
    let mut engine = abcd();
    let summary = engine
        .set_filters(Some("B".into()), Some("investor".into()))
        .unwrap();

    assert_eq!((summary.nodes, summary.links), (1, 0));
}

#[test]
fn dragged_node_follows_pointer_and_is_released() {
    let mut engine = abcd();
    settle(&mut engine);
    let id = EntityId::from("D");
    let start = engine.scene().shape_for(&id).unwrap().center;

    assert_eq!(engine.pointer_down(start), Some(id.clone()));
    assert!(engine.is_animating());

    let mut pointer = start;
    for _ in 0..30 {
        pointer += Vec2::new(4.0, -2.0);
        assert!(engine.pointer_move(pointer));
        engine.advance(1.0 / 60.0);
        assert_eq!(engine.scene().shape_for(&id).unwrap().center, pointer);
    }

    assert_eq!(engine.pointer_up(), Some(id.clone()));
    assert!(engine.dragged().is_none());
    let node = engine.simulation().unwrap().node(&id).unwrap();
    assert!(node.fixed.is_none());
    assert_eq!(engine.simulation().unwrap().alpha_target(), 0.0);

    settle(&mut engine);
    assert!(!engine.is_animating());
}

#[test]
fn lost_release_can_be_cancelled() {
    let mut engine = abcd();
    settle(&mut engine);
    let id = EntityId::from("B");
    let start = engine.scene().shape_for(&id).unwrap().center;
    engine.pointer_down(start);

    assert!(!engine.cancel_drag(&"A".into()));
    assert!(engine.cancel_drag(&id));
    assert!(engine.simulation().unwrap().node(&id).unwrap().fixed.is_none());
}

#[test]
fn pinned_nodes_hold_position_while_others_move() {
    let mut engine = abcd();
    let id = EntityId::from("C");
    assert_eq!(engine.toggle_pin(&id), Some(true));
    let pinned_at = engine.simulation().unwrap().node(&id).unwrap().position;

    for _ in 0..120 {
        engine.advance(1.0 / 60.0);
        let node = engine.simulation().unwrap().node(&id).unwrap();
        assert_eq!(node.position, pinned_at);
        assert_eq!(node.velocity, Vec2::ZERO);
    }
    assert!(engine.scene().shape_for(&id).unwrap().pinned);
}

#[test]
fn layout_cools_down_and_stops_ticking() {
    let mut engine = abcd();
    settle(&mut engine);

    let simulation = engine.simulation().unwrap();
    assert!(simulation.alpha() <= simulation.alpha_min());
    let ticks = simulation.tick_count();
    assert_eq!(engine.advance(1.0).ticks, 0);
    assert_eq!(engine.simulation().unwrap().tick_count(), ticks);

    engine.restart();
    assert!(engine.advance(1.0).ticks > 0);
}

#[test]
fn entering_nodes_start_near_their_neighbours() {
    let mut engine = abcd();
    engine.set_focal_entity(Some("D".into())).unwrap();
    settle(&mut engine);
    let anchor = engine.scene().shape_for(&"C".into()).unwrap().center;

    engine.set_focal_entity(Some("C".into())).unwrap();
    let entered = engine.scene().shape_for(&"A".into()).unwrap().center;
    assert!(entered.distance(anchor) < 60.0);
    assert_eq!(engine.scene().shape_for(&"C".into()).unwrap().center, anchor);
}

#[test]
fn sample_dataset_loads() {
    let raw = include_str!("../demos/sample.json");
    let (entities, relations) = Dataset::from_json(raw).unwrap().into_parts();
    let mut engine = engine_with(entities, relations);

    let summary = engine.summary().unwrap();
    assert_eq!((summary.nodes, summary.links), (7, 8));
    let summary = engine.set_focal_entity(Some("7".into())).unwrap();
    assert_eq!((summary.nodes, summary.links), (2, 1));

    let index = engine.index().unwrap();
    assert_eq!(index.relation_types(), ["director", "investor", "partner", "supplier"]);
    assert!(engine.scene().node_at(pos2(-1000.0, -1000.0), 0.0).is_none());
}
