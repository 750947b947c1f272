//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the domain core
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`ICredentialProvider`] - Bearer token acquisition per audience (§4A)
//! - [`IRecordStore`] - Append-only per-class local artifact (§4B)
//! - [`IGraphWriter`] - Serialized MERGE-upsert queue over the graph driver (§4I)

pub mod credential_provider;
pub mod graph_writer;
pub mod record_store;

pub use credential_provider::ICredentialProvider;
pub use graph_writer::IGraphWriter;
pub use record_store::IRecordStore;
