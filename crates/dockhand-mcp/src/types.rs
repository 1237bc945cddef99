//! Tool parameter and response types for MCP tools.
//!
//! These types use serde for serialization and schemars for automatic
//! JSON Schema generation required by MCP. The `run_container` tool takes
//! [`dockhand_spec::ContainerRequest`] directly, so its schema is the
//! compiler's own input contract.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Generic success acknowledgement.
#[derive(Debug, Serialize, JsonSchema)]
pub struct OpResult {
    /// Whether the operation succeeded.
    pub success: bool,
}

// ============================================================================
// Containers
// ============================================================================

/// Result of running a container.
#[derive(Debug, Serialize, JsonSchema)]
pub struct RunContainerResult {
    /// Container ID assigned by the daemon.
    pub container_id: String,

    /// Daemon warnings, if any.
    pub warnings: Vec<String>,
}

/// Parameters for listing containers.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct ListContainersParams {
    /// Include stopped containers (default: false).
    #[serde(default)]
    pub all: bool,
}

/// Result of listing containers.
#[derive(Debug, Serialize, JsonSchema)]
pub struct ListContainersResult {
    /// Containers known to the daemon.
    pub containers: Vec<ContainerSummary>,
}

/// Summary of one container.
#[derive(Debug, Serialize, JsonSchema)]
pub struct ContainerSummary {
    /// Container ID.
    pub id: String,
    /// Container names.
    pub names: Vec<String>,
    /// Image reference.
    pub image: String,
    /// Lifecycle state (running, exited, ...).
    pub state: String,
    /// Human-readable status line.
    pub status: String,
}

/// Parameters for stopping a container.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct StopContainerParams {
    /// Container ID or name.
    pub id: String,

    /// Seconds to wait before killing (default: daemon default).
    #[serde(default)]
    pub timeout_secs: Option<i64>,
}

/// Parameters for removing a container.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct RemoveContainerParams {
    /// Container ID or name.
    pub id: String,

    /// Remove even if running (default: false).
    #[serde(default)]
    pub force: bool,
}

/// Parameters for inspecting a container.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct InspectContainerParams {
    /// Container ID or name.
    pub id: String,
}

/// Result of inspecting a container.
#[derive(Debug, Serialize, JsonSchema)]
pub struct InspectContainerResult {
    /// The daemon's full inspect report.
    pub details: serde_json::Value,
}

/// Parameters for fetching container logs.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ContainerLogsParams {
    /// Container ID or name.
    pub id: String,

    /// Number of trailing lines to return (default: all).
    #[serde(default)]
    pub tail: Option<u32>,
}

/// Result of fetching container logs.
#[derive(Debug, Serialize, JsonSchema)]
pub struct ContainerLogsResult {
    /// Combined stdout and stderr output.
    pub logs: String,
}

// ============================================================================
// Images
// ============================================================================

/// Parameters for pulling an image.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct PullImageParams {
    /// Image reference to pull (e.g. `nginx:1.27`).
    pub image: String,
}

/// Result of listing images.
#[derive(Debug, Serialize, JsonSchema)]
pub struct ListImagesResult {
    /// Local images.
    pub images: Vec<ImageSummary>,
}

/// Summary of one image.
#[derive(Debug, Serialize, JsonSchema)]
pub struct ImageSummary {
    /// Image ID.
    pub id: String,
    /// Repo tags.
    pub tags: Vec<String>,
    /// Size in bytes.
    pub size: i64,
}

/// Parameters for removing an image.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct RemoveImageParams {
    /// Image reference or ID.
    pub image: String,

    /// Force removal (default: false).
    #[serde(default)]
    pub force: bool,
}

// ============================================================================
// Networks and volumes
// ============================================================================

/// Parameters for creating a network.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateNetworkParams {
    /// Network name.
    pub name: String,

    /// Network driver (default: bridge).
    #[serde(default)]
    pub driver: Option<String>,
}

/// Result of listing networks.
#[derive(Debug, Serialize, JsonSchema)]
pub struct ListNetworksResult {
    /// Networks known to the daemon.
    pub networks: Vec<NetworkSummary>,
}

/// Summary of one network.
#[derive(Debug, Serialize, JsonSchema)]
pub struct NetworkSummary {
    /// Network ID.
    pub id: String,
    /// Network name.
    pub name: String,
    /// Driver in use.
    pub driver: String,
}

/// Parameters for removing a network.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct RemoveNetworkParams {
    /// Network name or ID.
    pub name: String,
}

/// Parameters for creating a volume.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateVolumeParams {
    /// Volume name.
    pub name: String,
}

/// Result of listing volumes.
#[derive(Debug, Serialize, JsonSchema)]
pub struct ListVolumesResult {
    /// Volumes known to the daemon.
    pub volumes: Vec<VolumeSummary>,
}

/// Summary of one volume.
#[derive(Debug, Serialize, JsonSchema)]
pub struct VolumeSummary {
    /// Volume name.
    pub name: String,
    /// Driver in use.
    pub driver: String,
    /// Host mountpoint.
    pub mountpoint: String,
}

/// Parameters for removing a volume.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct RemoveVolumeParams {
    /// Volume name.
    pub name: String,

    /// Force removal (default: false).
    #[serde(default)]
    pub force: bool,
}

// ============================================================================
// Compose and system
// ============================================================================

/// Parameters naming a Compose file.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ComposeParams {
    /// Path to the Compose file.
    pub file: String,
}

/// Captured output of a Compose invocation.
#[derive(Debug, Serialize, JsonSchema)]
pub struct ComposeResult {
    /// Captured stdout.
    pub stdout: String,
    /// Captured stderr.
    pub stderr: String,
}

/// Daemon version report.
#[derive(Debug, Serialize, JsonSchema)]
pub struct VersionResult {
    /// Daemon version.
    pub version: String,
    /// API version.
    pub api_version: String,
    /// Daemon operating system.
    pub os: String,
    /// Daemon architecture.
    pub arch: String,
}

/// Full daemon info report.
#[derive(Debug, Serialize, JsonSchema)]
pub struct InfoResult {
    /// The daemon's info report.
    pub info: serde_json::Value,
}
