//! spatial-schema: host layer for the SpatialOS schema front end
//!
//! `schema-core` does the language work and never touches the disk. This
//! crate supplies what a tool around it needs:
//! - Search-root configuration (`config`)
//! - A disk-backed `SchemaFs` (`fs`)
//! - A `Workspace` that loads and checks files (`workspace`)
//! - Rust-style diagnostic rendering (`format`)
//!
//! The `schema_cli` binary (feature `cli`) is built on these.

pub mod config;
pub mod error;
pub mod format;
pub mod fs;
pub mod workspace;

pub use config::{ConfigLoader, SearchRoots};
pub use error::{ConfigError, SchemaError, SchemaResult};
pub use format::RustStyleFormatter;
pub use fs::DiskFs;
pub use workspace::{discover, FileReport, Workspace};

// Re-export the front end
pub use schema_core;
