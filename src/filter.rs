//! One-hop neighbourhood filtering over a [`GraphIndex`].

use std::collections::HashSet;

use crate::error::LookupError;
use crate::model::{Entity, EntityId, GraphIndex, Relation};

/// The visible part of the dataset. Borrows from the index it was computed
/// from; every link's endpoints are in `nodes`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Subgraph<'a> {
    pub nodes: Vec<&'a Entity>,
    pub links: Vec<&'a Relation>,
}

impl Subgraph<'_> {
    pub fn node_ids(&self) -> HashSet<&EntityId> {
        self.nodes.iter().map(|entity| &entity.id).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

fn type_matches(relation: &Relation, relation_type: Option<&str>) -> bool {
    relation_type.is_none_or(|wanted| relation.relation_type == wanted)
}

pub fn compute_subgraph<'a>(
    index: &'a GraphIndex,
    focal: Option<&EntityId>,
    relation_type: Option<&str>,
) -> Result<Subgraph<'a>, LookupError> {
    let Some(focal) = focal else {
        return Ok(Subgraph {
            nodes: index.entities().iter().collect(),
            links: index
                .relations()
                .iter()
                .filter(|relation| type_matches(relation, relation_type))
                .collect(),
        });
    };

    if !index.contains(focal) {
        return Err(LookupError::EntityNotFound(focal.clone()));
    }

    let relations = index.relations();
    let mut included = HashSet::new();
    included.insert(focal);
    let mut links = Vec::new();
    for &relation_index in index.links_of(focal) {
        let relation = &relations[relation_index];
        if !type_matches(relation, relation_type) {
            continue;
        }
        if let Some(neighbor) = relation.other_end(focal) {
            included.insert(neighbor);
        }
        links.push(relation);
    }

    let nodes = index
        .entities()
        .iter()
        .filter(|entity| included.contains(&entity.id))
        .collect();

    Ok(Subgraph { nodes, links })
}
