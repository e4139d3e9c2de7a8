//! Force-directed relationship graph engine.
//!
//! Entities and typed relations are indexed once ([`model::build_index`]),
//! filtered to a one-hop neighbourhood on demand ([`filter::compute_subgraph`]),
//! laid out by a tick-driven [`simulation::Simulation`] and mirrored into a
//! [`render::RenderScene`] for drawing. [`engine::GraphEngine`] ties these
//! together behind the operations a host needs.

pub mod dataset;
pub mod drag;
pub mod engine;
pub mod error;
pub mod filter;
pub mod model;
pub mod render;
pub mod search;
pub mod simulation;
pub mod util;

pub use dataset::Dataset;
pub use engine::{EngineConfig, ForceConfig, GraphEngine, Surface, SubgraphSummary};
pub use error::{DatasetError, EngineError, LookupError, SimulationError};
pub use model::{Entity, EntityId, GraphIndex, IndexDiagnostics, Relation};
