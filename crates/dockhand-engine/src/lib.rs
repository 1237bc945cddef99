//! # dockhand-engine
//!
//! Docker runtime invocation layer for Dockhand.
//!
//! This crate is deliberately thin: container requests are validated by
//! [`dockhand-spec`](dockhand_spec) before anything touches the daemon, and
//! everything after that is a pass-through to the Docker API (via `bollard`)
//! or to the `docker compose` CLI.
//!
//! ```text
//! ContainerRequest ──compile()──▶ ContainerSpec ──▶ DockerClient ──▶ daemon
//!                       │
//!                       └──err──▶ ValidationErrors (never reaches daemon)
//! ```

mod client;
mod compose;
mod error;

pub use client::{
    ContainerInfo, DockerClient, ImageInfo, NetworkInfo, RunOutcome, VersionInfo, VolumeInfo,
};
pub use compose::{ComposeOutput, ComposeRunner};
pub use error::{EngineError, Result};
