use std::path::PathBuf;

use thiserror::Error;

use crate::model::EntityId;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read dataset {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid dataset JSON")]
    Json(#[from] serde_json::Error),
}

/// A focal entity that the index does not know about. Expected for
/// user-typed searches, so callers decide how to present it.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("entity {0} not found")]
    EntityNotFound(EntityId),
    #[error("no entity matches {0:?}")]
    NoMatch(String),
}

/// Contract violations raised while building a simulation. These point at a
/// bug in subgraph construction, not at bad input data.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SimulationError {
    #[error("node {0} appears more than once in the simulation")]
    DuplicateNode(EntityId),
    #[error("link {source_id} -> {target_id} references a node outside the simulation")]
    UnknownLinkEndpoint {
        source_id: EntityId,
        target_id: EntityId,
    },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error("failed to rebuild the simulation")]
    Simulation(#[from] SimulationError),
    #[error("no dataset loaded")]
    NotLoaded,
}
