//! Configuration for the MCP server.
//!
//! Configuration is loaded from environment variables with sensible defaults.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Maximum log tail a tool call may request.
pub const MAX_LOG_TAIL_LINES: u32 = 10_000;

/// Transport mode for the MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportMode {
    /// Stdio only (for local AI tools like Claude Desktop)
    Stdio,
    /// HTTP/SSE only (for remote AI agents)
    Http,
    /// Both stdio and HTTP (default - maximum compatibility)
    #[default]
    Both,
}

impl TransportMode {
    /// Parse from string (case-insensitive).
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "stdio" => Self::Stdio,
            "http" | "sse" | "remote" => Self::Http,
            _ => Self::Both,
        }
    }

    /// Check if stdio transport should be enabled.
    pub fn stdio_enabled(&self) -> bool {
        matches!(self, Self::Stdio | Self::Both)
    }

    /// Check if HTTP transport should be enabled.
    pub fn http_enabled(&self) -> bool {
        matches!(self, Self::Http | Self::Both)
    }
}

/// Configuration for the Dockhand MCP server.
#[derive(Debug, Clone)]
pub struct DockhandConfig {
    /// Docker daemon address. `None` uses the platform defaults
    /// (`/var/run/docker.sock` on Unix).
    pub docker_host: Option<String>,

    /// Command used for Compose operations.
    pub compose_command: String,

    /// Transport mode (default: both stdio and HTTP).
    pub transport_mode: TransportMode,

    /// HTTP server bind address.
    pub http_addr: SocketAddr,
}

impl Default for DockhandConfig {
    fn default() -> Self {
        Self {
            docker_host: None,
            compose_command: "docker compose".to_string(),
            transport_mode: TransportMode::Both,
            http_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), 8080),
        }
    }
}

impl DockhandConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `DOCKHAND_DOCKER_HOST` | platform default socket |
    /// | `DOCKHAND_COMPOSE_BIN` | `docker compose` |
    /// | `DOCKHAND_TRANSPORT` | `both` (stdio, http, both) |
    /// | `DOCKHAND_HTTP_HOST` | `0.0.0.0` |
    /// | `DOCKHAND_HTTP_PORT` | `8080` |
    pub fn from_env() -> Self {
        let default = Self::default();

        let http_host: IpAddr = std::env::var("DOCKHAND_HTTP_HOST")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));

        let http_port: u16 = std::env::var("DOCKHAND_HTTP_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8080);

        Self {
            docker_host: std::env::var("DOCKHAND_DOCKER_HOST").ok(),
            compose_command: std::env::var("DOCKHAND_COMPOSE_BIN")
                .unwrap_or(default.compose_command),
            transport_mode: std::env::var("DOCKHAND_TRANSPORT")
                .map(|v| TransportMode::parse(&v))
                .unwrap_or(default.transport_mode),
            http_addr: SocketAddr::new(http_host, http_port),
        }
    }

    /// Warn about configuration that looks unreachable.
    ///
    /// Call at startup for clear messages; the daemon itself is only
    /// contacted when a tool runs.
    pub fn validate_warn(&self) {
        if let Some(host) = &self.docker_host {
            let is_socket_path = !host.starts_with("tcp://") && !host.starts_with("http://");
            if is_socket_path {
                let path = host.strip_prefix("unix://").unwrap_or(host);
                if !std::path::Path::new(path).exists() {
                    tracing::warn!("Docker socket not found: {path}");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DockhandConfig::default();
        assert!(config.docker_host.is_none());
        assert_eq!(config.compose_command, "docker compose");
        assert_eq!(config.transport_mode, TransportMode::Both);
        assert_eq!(config.http_addr.port(), 8080);
    }

    #[test]
    fn test_transport_mode_parsing() {
        assert_eq!(TransportMode::parse("stdio"), TransportMode::Stdio);
        assert_eq!(TransportMode::parse("STDIO"), TransportMode::Stdio);
        assert_eq!(TransportMode::parse("http"), TransportMode::Http);
        assert_eq!(TransportMode::parse("sse"), TransportMode::Http);
        assert_eq!(TransportMode::parse("both"), TransportMode::Both);
        assert_eq!(TransportMode::parse("anything"), TransportMode::Both);
    }

    #[test]
    fn test_transport_mode_flags() {
        assert!(TransportMode::Stdio.stdio_enabled());
        assert!(!TransportMode::Stdio.http_enabled());

        assert!(!TransportMode::Http.stdio_enabled());
        assert!(TransportMode::Http.http_enabled());

        assert!(TransportMode::Both.stdio_enabled());
        assert!(TransportMode::Both.http_enabled());
    }
}
