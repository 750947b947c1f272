//! Stormspotter Core - Domain logic and business rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `Record`, `Token`, `GraphNode`, `GraphEdge`, the identity newtypes
//! - **Use cases** - `TokenGate`, `negotiate_api_version`, the entity canonicalization helpers
//! - **Port definitions** - Traits for adapters: `ICredentialProvider`, `IRecordStore`, `IGraphWriter`
//! - **Configuration** - the layered `Config`/`ConfigBuilder` shared by every binary
//!
//! # Architecture
//!
//! This crate follows the hexagonal (ports & adapters) architecture pattern.
//! The domain module contains pure business logic with no external dependencies.
//! Ports define trait interfaces that adapter crates implement.
//! Use cases orchestrate domain entities through port interfaces.

pub mod config;
pub mod domain;
pub mod ports;
pub mod usecases;
