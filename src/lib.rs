// workspace load files from a GDC download manifest
pub mod config;
pub mod core;
pub mod io;
pub mod metadata;

pub use crate::config::RunConfig;
pub use crate::core::graph::EntityGraph;
pub use crate::core::run::{IngestError, LoadRun, RunSummary};
