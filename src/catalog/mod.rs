//! Catalog reconciliation engine
//!
//! The stages run strictly left to right, each on the complete output of
//! the previous one:
//!
//! 1. [`graph`] builds the scope/reference mappings from manifests,
//! 2. [`resolve`] turns (scope, reference) pairs into assignment records,
//! 3. [`aggregate`] fetches and expands the referenced definitions,
//! 4. [`rows`] joins records and definitions into the two report tables.

pub mod aggregate;
pub mod graph;
pub mod ident;
pub mod model;
pub mod resolve;
pub mod rows;

pub use aggregate::{aggregate_definitions, DefinitionCatalog};
pub use graph::ArchetypeGraph;
pub use model::{
    AssignmentRecord, DefinitionKind, InitiativeDefinition, PolicyDefinition, ScopeManifest,
    TargetKind,
};
pub use resolve::resolve_assignments;
pub use rows::{composite_key, materialize_rows, InitiativeRow, PolicyRow, Provenance};
