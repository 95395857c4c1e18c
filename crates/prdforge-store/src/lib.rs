//! File-backed cached store
//!
//! [`CachedFileStore`] keeps small files in memory in front of the disk:
//!
//! - reads are served from memory while an entry's TTL has not elapsed;
//! - writes go to disk first (atomically) and only then refresh the entry;
//! - the map never holds more than `max_entries` paths, evicting the entry
//!   with the earliest expiry when a new path arrives at capacity;
//! - an optional background sweeper expires stale entries and deletes old
//!   artifacts from a retention directory on a fixed interval.

mod cache;
mod stats;
mod sweep;

pub use cache::{CacheOptions, CachedFileStore, DEFAULT_FILE_MODE};
pub use stats::{CacheStats, StorageStats, storage_stats};
pub use sweep::{SweepPolicy, SweepReport};
