pub mod atomic_write;
pub mod error;
pub mod logging;
pub mod paths;
pub mod types;
