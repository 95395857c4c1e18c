//! Configuration management for prdforge
//!
//! Precedence: explicit file > `.prdforge/config.toml` discovered upward from
//! the start directory > `$PRDFORGE_HOME/config.toml` > built-in defaults.
//! Every section is optional:
//!
//! ```toml
//! [paths]
//! home = "/srv/prdforge"
//!
//! [cache]
//! max_entries = 100
//! ttl_secs = 900
//! max_entry_bytes = 1048576
//!
//! [sweep]
//! enabled = true
//! interval_secs = 300
//! retention_days = 30
//! extension = "md"
//!
//! [logging]
//! verbose = false
//! format = "compact"
//! ```

mod builder;
mod discovery;
mod model;
mod validation;

pub use builder::ConfigBuilder;
pub use model::*;
