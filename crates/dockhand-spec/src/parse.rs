//! Parsers for Docker's delimited string encodings.
//!
//! Each function takes one user-supplied string (`host:container[:options]`
//! and friends) and returns a typed record or a [`ValidationError`] naming
//! the field and the expected pattern. All parsers are pure: no I/O, no
//! external state, same input always yields the same result.

use crate::error::{ErrorKind, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Transport protocol for a published port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => write!(f, "tcp"),
            Self::Udp => write!(f, "udp"),
        }
    }
}

/// A validated `host:container[/proto]` port publication.
///
/// Both ports are in [1, 65535].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PortMapping {
    pub host_port: u16,
    pub container_port: u16,
    pub protocol: Protocol,
}

/// Mount mode for a bind mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MountMode {
    #[default]
    ReadWrite,
    ReadOnly,
}

impl fmt::Display for MountMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadWrite => write!(f, "rw"),
            Self::ReadOnly => write!(f, "ro"),
        }
    }
}

/// A validated `host:container[:mode]` bind mount.
///
/// The container path is always absolute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VolumeMapping {
    pub host_path: String,
    pub container_path: String,
    pub mode: MountMode,
}

/// Cgroup permission set for a device mapping: some non-empty subset of
/// read, write, mknod with no flag repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DevicePermissions {
    pub read: bool,
    pub write: bool,
    pub mknod: bool,
}

impl DevicePermissions {
    /// Render as the cgroup permission string Docker expects (`rwm` order).
    pub fn as_cgroup_string(&self) -> String {
        let mut s = String::with_capacity(3);
        if self.read {
            s.push('r');
        }
        if self.write {
            s.push('w');
        }
        if self.mknod {
            s.push('m');
        }
        s
    }
}

impl Default for DevicePermissions {
    fn default() -> Self {
        // Docker's default when no permission string is given.
        Self {
            read: true,
            write: true,
            mknod: true,
        }
    }
}

/// A validated `host:container[:perms]` device mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceMapping {
    pub host_path: String,
    pub container_path: String,
    pub permissions: DevicePermissions,
}

/// A validated `name=soft:hard` ulimit with soft <= hard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UlimitSpec {
    pub name: String,
    pub soft: u64,
    pub hard: u64,
}

/// A validated `path[:options]` tmpfs entry. Empty options are allowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TmpfsEntry {
    pub container_path: String,
    pub options: String,
}

/// A validated `hostname:ip` extra-hosts entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtraHost {
    pub hostname: String,
    pub ip: String,
}

fn malformed(field: &str, reason: impl Into<String>) -> ValidationError {
    ValidationError::new(field, ErrorKind::MalformedFormat, reason)
}

fn parse_port_number(field: &str, s: &str) -> Result<u16, ValidationError> {
    let n: u32 = s
        .parse()
        .map_err(|_| malformed(field, format!("'{s}' is not a valid port number")))?;
    if !(1..=65535).contains(&n) {
        return Err(malformed(field, format!("port {n} is out of range [1, 65535]")));
    }
    Ok(n as u16)
}

/// Parse a `host:container[/proto]` port publication.
///
/// Exactly two `:`-separated segments; the container segment may carry a
/// `/tcp` or `/udp` suffix (default tcp).
pub fn parse_port(field: &str, input: &str) -> Result<PortMapping, ValidationError> {
    let parts: Vec<&str> = input.split(':').collect();
    if parts.len() != 2 {
        return Err(malformed(
            field,
            format!("'{input}' does not match host_port:container_port[/proto]"),
        ));
    }

    let host_port = parse_port_number(field, parts[0])?;

    let (container_str, protocol) = match parts[1].split_once('/') {
        Some((port, "tcp")) => (port, Protocol::Tcp),
        Some((port, "udp")) => (port, Protocol::Udp),
        Some((_, other)) => {
            return Err(malformed(
                field,
                format!("unknown protocol '{other}', expected tcp or udp"),
            ))
        }
        None => (parts[1], Protocol::Tcp),
    };
    let container_port = parse_port_number(field, container_str)?;

    Ok(PortMapping {
        host_port,
        container_port,
        protocol,
    })
}

/// Parse a `host:container[:mode]` bind mount.
///
/// Mode is `ro` or `rw` (default rw). The container path must be absolute;
/// container paths are Linux paths regardless of host platform.
pub fn parse_volume(field: &str, input: &str) -> Result<VolumeMapping, ValidationError> {
    let parts: Vec<&str> = input.split(':').collect();
    let mode = match parts.len() {
        2 => MountMode::ReadWrite,
        3 => match parts[2] {
            "rw" => MountMode::ReadWrite,
            "ro" => MountMode::ReadOnly,
            other => {
                return Err(malformed(
                    field,
                    format!("mount mode must be 'ro' or 'rw', got '{other}'"),
                ))
            }
        },
        _ => {
            return Err(malformed(
                field,
                format!("'{input}' does not match host_path:container_path[:mode]"),
            ))
        }
    };

    let (host_path, container_path) = (parts[0], parts[1]);
    if host_path.is_empty() {
        return Err(malformed(field, "host path must not be empty"));
    }
    if !container_path.starts_with('/') {
        return Err(malformed(
            field,
            format!("container path '{container_path}' must be absolute"),
        ));
    }

    Ok(VolumeMapping {
        host_path: host_path.to_string(),
        container_path: container_path.to_string(),
        mode,
    })
}

/// Parse a device permission string: a non-empty subset of `rwm` with no
/// character repeated.
pub fn parse_device_permissions(field: &str, input: &str) -> Result<DevicePermissions, ValidationError> {
    if input.is_empty() {
        return Err(malformed(field, "device permissions must not be empty"));
    }
    let mut perms = DevicePermissions {
        read: false,
        write: false,
        mknod: false,
    };
    for c in input.chars() {
        let flag = match c {
            'r' => &mut perms.read,
            'w' => &mut perms.write,
            'm' => &mut perms.mknod,
            other => {
                return Err(malformed(
                    field,
                    format!("invalid device permission '{other}', expected a subset of 'rwm'"),
                ))
            }
        };
        if *flag {
            return Err(malformed(
                field,
                format!("duplicate device permission '{c}' in '{input}'"),
            ));
        }
        *flag = true;
    }
    Ok(perms)
}

/// Parse a `host:container[:perms]` device mapping.
///
/// Note: this checks syntax only. The dangerous-device blacklist lives in
/// [`crate::security`].
pub fn parse_device(field: &str, input: &str) -> Result<DeviceMapping, ValidationError> {
    let parts: Vec<&str> = input.split(':').collect();
    let permissions = match parts.len() {
        2 => DevicePermissions::default(),
        3 => parse_device_permissions(field, parts[2])?,
        _ => {
            return Err(malformed(
                field,
                format!("'{input}' does not match host_path:container_path[:permissions]"),
            ))
        }
    };

    let (host_path, container_path) = (parts[0], parts[1]);
    if host_path.is_empty() || container_path.is_empty() {
        return Err(malformed(field, "device paths must not be empty"));
    }

    Ok(DeviceMapping {
        host_path: host_path.to_string(),
        container_path: container_path.to_string(),
        permissions,
    })
}

/// Parse a `name=soft:hard` ulimit.
///
/// Soft and hard are non-negative integers with soft <= hard.
pub fn parse_ulimit(field: &str, input: &str) -> Result<UlimitSpec, ValidationError> {
    let (name, limits) = input
        .split_once('=')
        .ok_or_else(|| malformed(field, format!("'{input}' does not match name=soft:hard")))?;
    if name.is_empty() {
        return Err(malformed(field, "ulimit name must not be empty"));
    }
    let (soft_str, hard_str) = limits
        .split_once(':')
        .ok_or_else(|| malformed(field, format!("'{limits}' does not match soft:hard")))?;

    let soft: u64 = soft_str
        .parse()
        .map_err(|_| malformed(field, format!("soft limit '{soft_str}' is not a non-negative integer")))?;
    let hard: u64 = hard_str
        .parse()
        .map_err(|_| malformed(field, format!("hard limit '{hard_str}' is not a non-negative integer")))?;
    if soft > hard {
        return Err(malformed(
            field,
            format!("soft limit {soft} exceeds hard limit {hard}"),
        ));
    }

    Ok(UlimitSpec {
        name: name.to_string(),
        soft,
        hard,
    })
}

/// Parse a `path[:options]` tmpfs entry.
///
/// Splits on the first `:`; a missing or empty options segment means default
/// mount options.
pub fn parse_tmpfs(field: &str, input: &str) -> Result<TmpfsEntry, ValidationError> {
    let (path, options) = match input.split_once(':') {
        Some((p, o)) => (p, o),
        None => (input, ""),
    };
    if !path.starts_with('/') {
        return Err(malformed(field, format!("tmpfs path '{path}' must be absolute")));
    }
    Ok(TmpfsEntry {
        container_path: path.to_string(),
        options: options.to_string(),
    })
}

/// Parse a `hostname:ip` extra-hosts entry.
pub fn parse_extra_host(field: &str, input: &str) -> Result<ExtraHost, ValidationError> {
    let (hostname, ip) = input
        .split_once(':')
        .ok_or_else(|| malformed(field, format!("'{input}' does not match hostname:ip")))?;
    if hostname.is_empty() || ip.is_empty() {
        return Err(malformed(field, "hostname and ip must both be non-empty"));
    }
    Ok(ExtraHost {
        hostname: hostname.to_string(),
        ip: ip.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_port_default_tcp() {
        let p = parse_port("ports", "8080:80").unwrap();
        assert_eq!(p.host_port, 8080);
        assert_eq!(p.container_port, 80);
        assert_eq!(p.protocol, Protocol::Tcp);
    }

    #[test]
    fn test_parse_port_udp_suffix() {
        let p = parse_port("ports", "8080:80/udp").unwrap();
        assert_eq!(p.protocol, Protocol::Udp);
    }

    #[test]
    fn test_parse_port_rejects_out_of_range() {
        for input in ["0:80", "8080:0", "65536:80", "8080:70000"] {
            let e = parse_port("ports", input).unwrap_err();
            assert_eq!(e.kind, ErrorKind::MalformedFormat, "input: {input}");
        }
    }

    #[test]
    fn test_parse_port_rejects_bad_shapes() {
        for input in ["8080", "8080:80:90", "abc:80", "8080:80/sctp", ""] {
            assert!(parse_port("ports", input).is_err(), "input: {input}");
        }
    }

    #[test]
    fn test_parse_volume_defaults_rw() {
        let v = parse_volume("volumes", "/data:/var/lib/data").unwrap();
        assert_eq!(v.host_path, "/data");
        assert_eq!(v.container_path, "/var/lib/data");
        assert_eq!(v.mode, MountMode::ReadWrite);
    }

    #[test]
    fn test_parse_volume_ro_mode() {
        let v = parse_volume("volumes", "/data:/var/lib/data:ro").unwrap();
        assert_eq!(v.mode, MountMode::ReadOnly);
    }

    #[test]
    fn test_parse_volume_named_volume_host_side() {
        // Named volumes are legal on the host side; only the container path
        // must be absolute.
        let v = parse_volume("volumes", "pgdata:/var/lib/postgresql/data").unwrap();
        assert_eq!(v.host_path, "pgdata");
    }

    #[test]
    fn test_parse_volume_rejects_relative_container_path() {
        let e = parse_volume("volumes", "/data:relative/path").unwrap_err();
        assert_eq!(e.kind, ErrorKind::MalformedFormat);
    }

    #[test]
    fn test_parse_volume_rejects_bad_mode() {
        assert!(parse_volume("volumes", "/a:/b:rx").is_err());
        assert!(parse_volume("volumes", "/a:/b:ro:extra").is_err());
    }

    #[test]
    fn test_parse_device_default_permissions() {
        let d = parse_device("devices", "/dev/snd:/dev/snd").unwrap();
        assert_eq!(d.permissions.as_cgroup_string(), "rwm");
    }

    #[test]
    fn test_parse_device_explicit_permissions() {
        let d = parse_device("devices", "/dev/snd:/dev/snd:rw").unwrap();
        assert!(d.permissions.read);
        assert!(d.permissions.write);
        assert!(!d.permissions.mknod);
    }

    #[test]
    fn test_parse_device_rejects_duplicate_flag() {
        let e = parse_device("devices", "/dev/sda:/dev/sda:rrw").unwrap_err();
        assert_eq!(e.kind, ErrorKind::MalformedFormat);
    }

    #[test]
    fn test_parse_device_permissions_rejects_unknown_and_empty() {
        assert!(parse_device_permissions("devices", "x").is_err());
        assert!(parse_device_permissions("devices", "").is_err());
    }

    #[test]
    fn test_parse_ulimit_ok() {
        let u = parse_ulimit("ulimits", "nofile=1024:4096").unwrap();
        assert_eq!(u.name, "nofile");
        assert_eq!(u.soft, 1024);
        assert_eq!(u.hard, 4096);
    }

    #[test]
    fn test_parse_ulimit_soft_above_hard() {
        assert!(parse_ulimit("ulimits", "nofile=4096:1024").is_err());
    }

    #[test]
    fn test_parse_ulimit_rejects_negative_and_garbage() {
        assert!(parse_ulimit("ulimits", "nofile=-1:10").is_err());
        assert!(parse_ulimit("ulimits", "nofile=1024").is_err());
        assert!(parse_ulimit("ulimits", "=1:2").is_err());
        assert!(parse_ulimit("ulimits", "nofile=a:b").is_err());
    }

    #[test]
    fn test_parse_tmpfs_with_and_without_options() {
        let t = parse_tmpfs("tmpfs", "/run:rw,size=64m").unwrap();
        assert_eq!(t.container_path, "/run");
        assert_eq!(t.options, "rw,size=64m");

        let t = parse_tmpfs("tmpfs", "/run").unwrap();
        assert_eq!(t.options, "");

        // Empty second segment is allowed.
        let t = parse_tmpfs("tmpfs", "/run:").unwrap();
        assert_eq!(t.options, "");
    }

    #[test]
    fn test_parse_tmpfs_rejects_relative_path() {
        assert!(parse_tmpfs("tmpfs", "run:size=1m").is_err());
    }

    #[test]
    fn test_parse_extra_host() {
        let h = parse_extra_host("extra_hosts", "db.local:10.0.0.5").unwrap();
        assert_eq!(h.hostname, "db.local");
        assert_eq!(h.ip, "10.0.0.5");

        assert!(parse_extra_host("extra_hosts", "db.local").is_err());
        assert!(parse_extra_host("extra_hosts", ":10.0.0.5").is_err());
    }

    #[test]
    fn test_parsers_are_deterministic() {
        // Same input twice yields identical output.
        let a = parse_port("ports", "8080:80/udp").unwrap();
        let b = parse_port("ports", "8080:80/udp").unwrap();
        assert_eq!(a, b);

        let a = parse_volume("volumes", "/x:/y:ro").unwrap();
        let b = parse_volume("volumes", "/x:/y:ro").unwrap();
        assert_eq!(a, b);
    }
}
