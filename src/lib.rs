//! Policat - cloud governance policy catalog extractor
//!
//! Reconciles three independently-shaped data sources describing a cloud
//! governance catalog — archetype manifests, assignment records, and a
//! definition catalog — into two cross-referenced report tables: one row
//! per (assignment, scope) for initiatives, one row per (policy,
//! containing-initiative-or-none, scope) for policies.
//!
//! ## Data flow
//!
//! ```text
//! ManifestSource ──► ArchetypeGraph ──► resolve_assignments ──┐
//!                        (scope ↔ reference maps)             │
//! AssignmentSource ───────────────────────────────────────────┤
//!                                                             ▼
//! DefinitionSource ──► aggregate_definitions ──► materialize_rows ──► ReportSink
//!                        (two-set expansion closure)   (composite initiative|scope key)
//! ```
//!
//! Stages run strictly left to right once per invocation; every run is a
//! full stateless rebuild. Definitions that cannot be fetched degrade to
//! identifier-only placeholder rows rather than disappearing.
//!
//! ## Modules
//!
//! - [`catalog`]: the resolution and aggregation engine
//! - [`sources`]: data-source interfaces and the GitHub/AzAdvertizer adapters
//! - [`report`]: report assembly, the scope-aware query, and sinks
//! - [`pipeline`]: stage orchestration
//! - [`config`]: configuration management

pub mod catalog;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod sources;

pub use config::PolicatConfig;
pub use error::{Error, Result};
