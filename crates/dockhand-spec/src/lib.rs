//! # dockhand-spec
//!
//! Container-configuration compiler and security validator for Dockhand.
//!
//! This crate turns a loosely-typed, user-supplied [`ContainerRequest`]
//! (string-encoded port/volume/device/ulimit mappings, free-form security
//! options, human-readable resource limits) into a validated
//! [`ContainerSpec`] ready to hand to a container runtime — or into an
//! ordered list of every validation error found.
//!
//! ## Pipeline
//!
//! ```text
//! ContainerRequest
//!   │
//!   ├── parse      host:container[/proto], host:container[:mode], ...
//!   ├── resources  "512m" -> bytes, cpus -> nano-CPUs
//!   ├── security   capability whitelist, secopt prefixes,
//!   │              device blacklist, non-root user policy
//!   ▼
//! compile() ──ok──▶ ContainerSpec
//!           ──err─▶ ValidationErrors (all problems, one pass)
//! ```
//!
//! Everything here is pure and synchronous: no I/O, no locks, no shared
//! mutable state. The policy tables ([`security::KNOWN_CAPABILITIES`] and
//! friends) are process-wide immutable constants.
//!
//! ## Quick start
//!
//! ```
//! use dockhand_spec::{compile, ContainerRequest};
//!
//! let request = ContainerRequest {
//!     image: "nginx:1.27".to_string(),
//!     ports: vec!["8080:80".to_string()],
//!     memory: Some("512m".to_string()),
//!     ..Default::default()
//! };
//!
//! let spec = compile(&request).expect("valid request");
//! assert_eq!(spec.ports[0].host_port, 8080);
//! assert_eq!(spec.resources.memory_bytes, Some(536_870_912));
//! ```

mod compile;
mod error;
pub mod parse;
pub mod resources;
pub mod security;

pub use compile::{compile, ContainerRequest, ContainerSpec, RestartPolicy};
pub use error::{ErrorKind, ValidationError, ValidationErrors};
pub use parse::{
    DeviceMapping, DevicePermissions, ExtraHost, MountMode, PortMapping, Protocol, TmpfsEntry,
    UlimitSpec, VolumeMapping,
};
pub use resources::ResourceLimits;
pub use security::SecurityProfile;
