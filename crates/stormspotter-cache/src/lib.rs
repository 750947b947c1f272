//! Stormspotter Cache - local record persistence
//!
//! SQLite-based [`IRecordStore`](stormspotter_core::ports::IRecordStore)
//! implementation: one append-only `.sqlite` file per object class,
//! written during a collection run and later archived (§4B, §6).

pub mod errors;
pub mod pool;
pub mod record_store;

pub use errors::CacheError;
pub use record_store::{read_class_file, SqliteRecordStore};
