//! Use cases (interactors) for Stormspotter
//!
//! This module contains the pure orchestration logic that sits between the
//! domain types and the ports: the pieces of §4 that are specified
//! precisely enough to implement once and reuse from every adapter that
//! needs them, rather than leaving each adapter to reinvent the algorithm.
//!
//! ## Use Cases
//!
//! - [`TokenGate`] - pauses an enumerator's requests across token rotation (§4C)
//! - [`negotiate_api_version`] - ARM api-version retry algorithm (§4E)
//! - [`flatten_tags`], [`normalize_id`], [`normalize_display_name`] - entity canonicalization (§4H)

pub mod canonicalize;
pub mod negotiate_api_version;
pub mod token_gate;

pub use canonicalize::{flatten_tags, normalize_display_name, normalize_id};
pub use negotiate_api_version::{negotiate_api_version, parse_suggested_versions};
pub use token_gate::TokenGate;
