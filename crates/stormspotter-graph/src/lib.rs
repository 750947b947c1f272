//! Stormspotter Graph - entity model, relationship derivation, and the
//! graph writer (§4H, §4I).

pub mod entity;
pub mod errors;
pub mod ingestor;
pub mod sanitize;
pub mod writer;

pub use entity::derive_entities;
pub use errors::IngestError;
pub use ingestor::{ingest_archive, IngestSummary};
pub use writer::Neo4jGraphWriter;
