//! Stormspotter Collect - the Collector Orchestrator
//!
//! Composes the AAD and ARM enumerators (`stormspotter-azure`) over a
//! shared record store (`stormspotter-cache`) and packages the result
//! into an archive (§4G).

pub mod archive;
pub mod orchestrator;

pub use orchestrator::{CollectSummary, CollectorOrchestrator};
