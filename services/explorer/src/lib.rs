//! Terminal explorer for a raster tile backend.
//!
//! Wraps the HTTP client, metadata cache and layer state machine in a
//! single [`Explorer`] session that the binary drives either one command
//! at a time or from an interactive loop.

pub mod command;
pub mod config;
pub mod repl;
pub mod report;
pub mod session;

pub use command::{parse_command, Command};
pub use config::ExplorerConfig;
pub use report::Report;
pub use session::Explorer;
