//! Entities, relations and the read-only lookup index built over them.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info, warn};

/// Stable entity identifier. Integer ids from the wire are kept in their
/// decimal form so `1` and `"1"` name the same entity.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<u64> for EntityId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => Self(text),
            RawId::Signed(value) => Self(value.to_string()),
            RawId::Unsigned(value) => Self(value.to_string()),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Entity {
    pub id: EntityId,
    #[serde(rename = "name")]
    pub display_name: String,
    #[serde(default, rename = "group")]
    pub group_tag: Option<String>,
}

impl Entity {
    pub fn new(id: impl Into<EntityId>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            group_tag: None,
        }
    }

    pub fn with_group(mut self, group_tag: impl Into<String>) -> Self {
        self.group_tag = Some(group_tag.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    pub source_id: EntityId,
    pub target_id: EntityId,
    pub relation_type: String,
}

impl Relation {
    pub fn new(
        source_id: impl Into<EntityId>,
        target_id: impl Into<EntityId>,
        relation_type: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            relation_type: relation_type.into(),
        }
    }

    pub fn touches(&self, id: &EntityId) -> bool {
        &self.source_id == id || &self.target_id == id
    }

    /// The endpoint opposite to `id`, or `None` when the relation does not
    /// touch `id`.
    pub fn other_end(&self, id: &EntityId) -> Option<&EntityId> {
        if &self.source_id == id {
            Some(&self.target_id)
        } else if &self.target_id == id {
            Some(&self.source_id)
        } else {
            None
        }
    }
}

/// What `build_index` had to discard from an inconsistent data source.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexDiagnostics {
    pub dropped_relations: usize,
    pub duplicate_entities: usize,
}

impl IndexDiagnostics {
    pub fn is_clean(&self) -> bool {
        self.dropped_relations == 0 && self.duplicate_entities == 0
    }
}

#[derive(Clone, Debug, Default)]
pub struct GraphIndex {
    entities: Vec<Entity>,
    relations: Vec<Relation>,
    nodes_by_id: HashMap<EntityId, usize>,
    links_by_node_id: HashMap<EntityId, Vec<usize>>,
}

impl GraphIndex {
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub fn entity(&self, id: &EntityId) -> Option<&Entity> {
        self.nodes_by_id.get(id).map(|&index| &self.entities[index])
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.nodes_by_id.contains_key(id)
    }

    /// Indices into `relations()` of every relation touching `id`, in
    /// dataset order. A self-relation is listed once.
    pub fn links_of(&self, id: &EntityId) -> &[usize] {
        self.links_by_node_id
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn degree(&self, id: &EntityId) -> usize {
        self.links_of(id).len()
    }

    pub fn relation_types(&self) -> Vec<String> {
        self.relations
            .iter()
            .map(|relation| relation.relation_type.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_owned)
            .collect()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }
}

pub fn build_index(
    entities: Vec<Entity>,
    relations: Vec<Relation>,
) -> (GraphIndex, IndexDiagnostics) {
    let mut diagnostics = IndexDiagnostics::default();

    let mut kept_entities = Vec::with_capacity(entities.len());
    let mut nodes_by_id = HashMap::with_capacity(entities.len());
    for entity in entities {
        if nodes_by_id.contains_key(&entity.id) {
            debug!(id = %entity.id, "ignoring duplicate entity");
            diagnostics.duplicate_entities += 1;
            continue;
        }
        nodes_by_id.insert(entity.id.clone(), kept_entities.len());
        kept_entities.push(entity);
    }

    let mut kept_relations = Vec::with_capacity(relations.len());
    let mut links_by_node_id: HashMap<EntityId, Vec<usize>> = HashMap::new();
    for relation in relations {
        if !nodes_by_id.contains_key(&relation.source_id)
            || !nodes_by_id.contains_key(&relation.target_id)
        {
            debug!(
                source = %relation.source_id,
                target = %relation.target_id,
                relation_type = %relation.relation_type,
                "dropping relation with unknown endpoint"
            );
            diagnostics.dropped_relations += 1;
            continue;
        }

        let index = kept_relations.len();
        links_by_node_id
            .entry(relation.source_id.clone())
            .or_default()
            .push(index);
        if relation.target_id != relation.source_id {
            links_by_node_id
                .entry(relation.target_id.clone())
                .or_default()
                .push(index);
        }
        kept_relations.push(relation);
    }

    if diagnostics.dropped_relations > 0 {
        warn!(
            dropped = diagnostics.dropped_relations,
            "relations referencing unknown entities were dropped"
        );
    }
    if diagnostics.duplicate_entities > 0 {
        warn!(
            duplicates = diagnostics.duplicate_entities,
            "duplicate entity ids were ignored"
        );
    }
    info!(
        entities = kept_entities.len(),
        relations = kept_relations.len(),
        "graph index built"
    );

    (
        GraphIndex {
            entities: kept_entities,
            relations: kept_relations,
            nodes_by_id,
            links_by_node_id,
        },
        diagnostics,
    )
}
