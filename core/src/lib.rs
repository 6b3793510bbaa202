//! graph-filter-core: visibility filtering over an in-memory node/link graph.
//!
//! Given a precomputed graph (neighbour sets, component ids, provenance
//! entries per node), the engine decides which nodes and links are visible
//! for each selection gesture and records why (the self-centric mode).
//! Rendering, selection UI and tables sit behind traits; nothing here
//! performs I/O.

mod collaborators;
mod colors;
mod config;
mod engine;
mod error;
mod model;
mod neighbour;
mod snapshot;

pub use collaborators::{
    OriginSource, PendingOrigin, RowFilter, SelectionSet, SelectionSource, TableRow, TableRows,
    TableView,
};
pub use colors::{
    color_at, rainbow, CategoricalColorAssigner, ColorMap, GraphView, PALETTE_SIZE, TABLEAU_10,
};
pub use config::{EngineConfig, ProvenanceWalk};
pub use engine::{
    EngineState, Operation, SelfCentricMode, VisibilityChange, VisibilityFilterEngine,
    VisibilityObserver, ALL_COMPONENTS,
};
pub use error::{FilterError, FilterResult};
pub use model::{Component, ComponentId, EntryId, GraphModel, Link, Node, NodeId, NodeIndex};
pub use neighbour::{
    is_qualifying_neighbour, mutual_neighbours, mutual_neighbours_anchored_to_origin,
    NeighbourRule,
};
pub use snapshot::{ComponentRecord, GraphSnapshot, LinkRecord, NodeRecord};

/// Engine wired to the in-memory collaborators.
pub type InMemoryEngine = VisibilityFilterEngine<SelectionSet, PendingOrigin, TableRows>;
