//! # dockhand-mcp
//!
//! MCP server exposing Docker container, image, network, volume, Compose,
//! and system operations as agent tools.
//!
//! Container run requests pass through the spec compiler in
//! [`dockhand-spec`](dockhand_spec) before anything reaches the daemon; a
//! rejected request reports every validation problem at once.

pub mod http;

mod config;
mod server;
mod types;

pub use config::{DockhandConfig, TransportMode, MAX_LOG_TAIL_LINES};
pub use server::DockhandServer;
