//! Core data model and interface boundary for the sharedpack
//! deduplication engine.
//!
//! The engine crate consumes these types. The host build pipeline implements
//! [`snapshot::SnapshotProvider`] (computing the bundle/item reference graph)
//! and [`store::SettingsStore`] (the persistent build-configuration store).
//! [`in_memory::InMemoryProject`] implements both for tests and dry runs.

pub mod diagnostic;
pub mod hash;
pub mod in_memory;
pub mod snapshot;
pub mod store;
pub mod types;
