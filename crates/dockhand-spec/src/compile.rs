//! The spec compiler: turns a loosely-typed [`ContainerRequest`] into a
//! validated [`ContainerSpec`] or a non-empty, ordered error list.
//!
//! Compilation is fail-accumulate, not fail-fast: every independently
//! detectable problem is collected in one pass so a caller can fix all of
//! them without repeated round-trips. The compiler is synchronous, stateless,
//! and side-effect-free.

use crate::error::{ErrorKind, ValidationError, ValidationErrors};
use crate::parse::{
    parse_device, parse_extra_host, parse_port, parse_tmpfs, parse_ulimit, parse_volume,
    DeviceMapping, ExtraHost, PortMapping, TmpfsEntry, UlimitSpec, VolumeMapping,
};
use crate::resources::{normalize_cpus, parse_memory_limit, ResourceLimits};
use crate::security::{validate_security, SecurityProfile};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Restart policy for a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RestartPolicy {
    No,
    Always,
    UnlessStopped,
    OnFailure,
}

impl RestartPolicy {
    /// Parse a restart-policy name.
    ///
    /// Unrecognized names are a validation error rather than a silent
    /// fallback to `no`: the compiler rejects malformed input, it does not
    /// rewrite it.
    pub fn parse(field: &str, input: &str) -> Result<Self, ValidationError> {
        match input {
            "no" => Ok(Self::No),
            "always" => Ok(Self::Always),
            "unless-stopped" => Ok(Self::UnlessStopped),
            "on-failure" => Ok(Self::OnFailure),
            other => Err(ValidationError::new(
                field,
                ErrorKind::MalformedFormat,
                format!("'{other}' is not one of no, always, unless-stopped, on-failure"),
            )),
        }
    }
}

impl fmt::Display for RestartPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::No => write!(f, "no"),
            Self::Always => write!(f, "always"),
            Self::UnlessStopped => write!(f, "unless-stopped"),
            Self::OnFailure => write!(f, "on-failure"),
        }
    }
}

/// User-supplied container request, as it arrives from the tool layer.
///
/// Every list field defaults to empty; string encodings (`host:container`
/// and friends) are untouched until [`compile`] runs.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ContainerRequest {
    /// Image reference (e.g. `nginx:1.27`).
    pub image: String,

    /// Optional container name.
    #[serde(default)]
    pub name: Option<String>,

    /// Command and arguments to run instead of the image default.
    #[serde(default)]
    pub command: Vec<String>,

    /// Environment entries, `KEY=value` (a bare `KEY` passes the key through).
    #[serde(default)]
    pub env: Vec<String>,

    /// Port publications, `host:container[/tcp|/udp]`.
    #[serde(default)]
    pub ports: Vec<String>,

    /// Bind mounts, `host:container[:ro|:rw]`.
    #[serde(default)]
    pub volumes: Vec<String>,

    /// Device mappings, `host:container[:rwm-subset]`.
    #[serde(default)]
    pub devices: Vec<String>,

    /// DNS servers.
    #[serde(default)]
    pub dns: Vec<String>,

    /// Extra hosts entries, `hostname:ip`.
    #[serde(default)]
    pub extra_hosts: Vec<String>,

    /// Tmpfs mounts, `path[:options]`.
    #[serde(default)]
    pub tmpfs: Vec<String>,

    /// Ulimits, `name=soft:hard`.
    #[serde(default)]
    pub ulimits: Vec<String>,

    /// Security options (apparmor:, seccomp:, label:, no-new-privileges,
    /// systempaths=, proc-opts=).
    #[serde(default)]
    pub security_opts: Vec<String>,

    /// Capabilities to add (with or without the CAP_ prefix, or ALL).
    #[serde(default)]
    pub cap_add: Vec<String>,

    /// Capabilities to drop.
    #[serde(default)]
    pub cap_drop: Vec<String>,

    /// Memory limit, e.g. `512m`, `1g`, or a bare byte count.
    #[serde(default)]
    pub memory: Option<String>,

    /// CPU count, e.g. 1.5.
    #[serde(default)]
    pub cpus: Option<f64>,

    /// Labels to set on the container.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,

    /// Container user, `user[:group]` or `uid[:gid]`. Root is rejected.
    #[serde(default)]
    pub user: Option<String>,

    /// Network mode (bridge, host, none, or a network name).
    #[serde(default)]
    pub network_mode: Option<String>,

    /// Restart policy: no, always, unless-stopped, on-failure.
    #[serde(default)]
    pub restart_policy: Option<String>,

    /// Run detached.
    #[serde(default)]
    pub detach: bool,

    /// Remove the container when it exits.
    #[serde(default)]
    pub auto_remove: bool,

    /// Keep stdin open.
    #[serde(default)]
    pub interactive: bool,

    /// Allocate a pseudo-TTY.
    #[serde(default)]
    pub tty: bool,

    /// Mount the root filesystem read-only.
    #[serde(default)]
    pub read_only: bool,

    /// Run privileged.
    #[serde(default)]
    pub privileged: bool,
}

/// Fully validated container specification, ready for the runtime layer.
///
/// Produced only by [`compile`]; immutable by convention once handed to the
/// caller. Optional list fields are always empty collections, never absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContainerSpec {
    pub image: String,
    pub name: Option<String>,
    pub command: Vec<String>,
    /// Sanitized `KEY=value` entries with upper-cased keys.
    pub env: Vec<String>,
    pub ports: Vec<PortMapping>,
    pub volumes: Vec<VolumeMapping>,
    pub devices: Vec<DeviceMapping>,
    pub dns: Vec<String>,
    pub extra_hosts: Vec<ExtraHost>,
    pub tmpfs: Vec<TmpfsEntry>,
    pub ulimits: Vec<UlimitSpec>,
    pub resources: ResourceLimits,
    pub security: SecurityProfile,
    pub labels: BTreeMap<String, String>,
    pub network_mode: Option<String>,
    pub restart_policy: Option<RestartPolicy>,
    pub detach: bool,
    pub auto_remove: bool,
    pub interactive: bool,
    pub tty: bool,
}

/// Sanitize one environment entry.
///
/// The key must match `[A-Za-z_][A-Za-z0-9_]*` and is upper-cased; the value
/// is passed through untouched. A bare `KEY` (no `=`) is Docker's
/// pass-from-host form and is kept as a bare key.
pub fn sanitize_env_entry(field: &str, input: &str) -> Result<String, ValidationError> {
    let (key, value) = match input.split_once('=') {
        Some((k, v)) => (k, Some(v)),
        None => (input, None),
    };

    let valid = !key.is_empty()
        && key
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(ValidationError::new(
            field,
            ErrorKind::InvalidEnvironmentKey,
            format!("'{key}' does not match [A-Za-z_][A-Za-z0-9_]*"),
        ));
    }

    let key = key.to_ascii_uppercase();
    Ok(match value {
        Some(v) => format!("{key}={v}"),
        None => key,
    })
}

/// Run a parser over every entry of a list field, pushing failures into the
/// accumulator and keeping successes.
fn collect_parsed<T>(
    field: &str,
    inputs: &[String],
    errors: &mut Vec<ValidationError>,
    parser: impl Fn(&str, &str) -> Result<T, ValidationError>,
) -> Vec<T> {
    let mut out = Vec::with_capacity(inputs.len());
    for (i, input) in inputs.iter().enumerate() {
        match parser(&format!("{field}[{i}]"), input) {
            Ok(v) => out.push(v),
            Err(e) => errors.push(e),
        }
    }
    out
}

/// Compile a request into a validated spec, or every error found.
///
/// Exactly one of the two outcomes is produced: a spec with no errors, or a
/// non-empty ordered error list and no spec.
pub fn compile(request: &ContainerRequest) -> Result<ContainerSpec, ValidationErrors> {
    let mut errors = Vec::new();

    if request.image.trim().is_empty() {
        errors.push(ValidationError::new(
            "image",
            ErrorKind::MalformedFormat,
            "image reference must not be empty",
        ));
    }

    let env = collect_parsed("env", &request.env, &mut errors, sanitize_env_entry);
    let ports = collect_parsed("ports", &request.ports, &mut errors, parse_port);
    let volumes = collect_parsed("volumes", &request.volumes, &mut errors, parse_volume);
    let devices = collect_parsed("devices", &request.devices, &mut errors, parse_device);
    let extra_hosts = collect_parsed("extra_hosts", &request.extra_hosts, &mut errors, parse_extra_host);
    let tmpfs = collect_parsed("tmpfs", &request.tmpfs, &mut errors, parse_tmpfs);
    let ulimits = collect_parsed("ulimits", &request.ulimits, &mut errors, parse_ulimit);

    let memory_bytes = match &request.memory {
        Some(m) => match parse_memory_limit("memory", m) {
            Ok(b) => Some(b),
            Err(e) => {
                errors.push(e);
                None
            }
        },
        None => None,
    };
    let nano_cpus = match request.cpus {
        Some(c) => match normalize_cpus("cpus", c) {
            Ok(n) => Some(n),
            Err(e) => {
                errors.push(e);
                None
            }
        },
        None => None,
    };

    let security = validate_security(
        &request.cap_add,
        &request.cap_drop,
        &request.security_opts,
        request.user.as_deref(),
        &devices,
        request.read_only,
        request.privileged,
        &mut errors,
    );

    let restart_policy = match request.restart_policy.as_deref() {
        Some(name) => match RestartPolicy::parse("restart_policy", name) {
            Ok(p) => Some(p),
            Err(e) => {
                errors.push(e);
                None
            }
        },
        None => None,
    };

    if let Some(errs) = ValidationErrors::from_vec(errors) {
        return Err(errs);
    }

    Ok(ContainerSpec {
        image: request.image.clone(),
        name: request.name.clone(),
        command: request.command.clone(),
        env,
        ports,
        volumes,
        devices,
        dns: request.dns.clone(),
        extra_hosts,
        tmpfs,
        ulimits,
        resources: ResourceLimits {
            memory_bytes,
            nano_cpus,
        },
        security,
        labels: request.labels.clone(),
        network_mode: request.network_mode.clone(),
        restart_policy,
        detach: request.detach,
        auto_remove: request.auto_remove,
        interactive: request.interactive,
        tty: request.tty,
    })
}
