//! Security policy: capability whitelist, security-option prefixes,
//! dangerous-device blacklist, and the non-root user rule.
//!
//! The tables here are process-wide immutable constants. The validator is a
//! pure gate with no state of its own.

use crate::error::{ErrorKind, ValidationError};
use crate::parse::DeviceMapping;
use serde::Serialize;

/// The known Linux capabilities, in `CAP_*` form.
pub const KNOWN_CAPABILITIES: &[&str] = &[
    "CAP_AUDIT_CONTROL",
    "CAP_AUDIT_READ",
    "CAP_AUDIT_WRITE",
    "CAP_BLOCK_SUSPEND",
    "CAP_CHOWN",
    "CAP_DAC_OVERRIDE",
    "CAP_DAC_READ_SEARCH",
    "CAP_FOWNER",
    "CAP_FSETID",
    "CAP_IPC_LOCK",
    "CAP_IPC_OWNER",
    "CAP_KILL",
    "CAP_LEASE",
    "CAP_LINUX_IMMUTABLE",
    "CAP_MAC_ADMIN",
    "CAP_MAC_OVERRIDE",
    "CAP_MKNOD",
    "CAP_NET_ADMIN",
    "CAP_NET_BIND_SERVICE",
    "CAP_NET_BROADCAST",
    "CAP_NET_RAW",
    "CAP_SETFCAP",
    "CAP_SETGID",
    "CAP_SETPCAP",
    "CAP_SETUID",
    "CAP_SYSLOG",
    "CAP_SYS_ADMIN",
    "CAP_SYS_BOOT",
    "CAP_SYS_CHROOT",
    "CAP_SYS_MODULE",
    "CAP_SYS_NICE",
    "CAP_SYS_PACCT",
    "CAP_SYS_PTRACE",
    "CAP_SYS_RAWIO",
    "CAP_SYS_RESOURCE",
    "CAP_SYS_TIME",
    "CAP_SYS_TTY_CONFIG",
    "CAP_WAKE_ALARM",
];

/// Allowed prefixes for `--security-opt` style entries.
pub const ALLOWED_SECURITY_OPT_PREFIXES: &[&str] = &[
    "apparmor:",
    "seccomp:",
    "label:",
    "no-new-privileges",
    "systempaths=",
    "proc-opts=",
];

/// Host-device path prefixes that are never allowed into a container:
/// raw memory access and whole-disk device classes.
pub const DANGEROUS_DEVICE_PREFIXES: &[&str] = &[
    "/dev/mem",
    "/dev/kmem",
    "/dev/port",
    "/dev/sd",
    "/dev/hd",
    "/dev/nvme",
    "/dev/vd",
    "/dev/xvd",
    "/dev/dm-",
    "/dev/mapper",
    "/dev/md",
    "/dev/loop",
];

/// User assigned when the request does not name one.
pub const DEFAULT_USER: &str = "1000:1000";

/// Validated security settings for one container.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SecurityProfile {
    /// Capabilities to add, normalized to `CAP_*` form (or the literal `ALL`).
    pub cap_add: Vec<String>,
    /// Capabilities to drop, normalized the same way.
    pub cap_drop: Vec<String>,
    /// Security options, each matching an allowed prefix.
    pub security_opts: Vec<String>,
    /// Resolved `user[:group]`, never root.
    pub user: String,
    /// Mount the root filesystem read-only.
    pub read_only_rootfs: bool,
    /// Run privileged. Carried through as requested; policy on whether to
    /// permit it belongs to the caller.
    pub privileged: bool,
}

/// Normalize and validate one capability name.
///
/// Entries are upper-cased and prefixed with `CAP_` when the prefix is
/// absent; the literal `ALL` is accepted as-is.
pub fn validate_capability(field: &str, input: &str) -> Result<String, ValidationError> {
    let upper = input.trim().to_ascii_uppercase();
    if upper == "ALL" {
        return Ok(upper);
    }
    let normalized = if upper.starts_with("CAP_") {
        upper
    } else {
        format!("CAP_{upper}")
    };
    if KNOWN_CAPABILITIES.contains(&normalized.as_str()) {
        Ok(normalized)
    } else {
        Err(ValidationError::new(
            field,
            ErrorKind::UnknownCapability,
            format!("'{input}' is not a known Linux capability"),
        ))
    }
}

/// Validate one security option against the allowed-prefix whitelist.
pub fn validate_security_opt(field: &str, input: &str) -> Result<String, ValidationError> {
    if ALLOWED_SECURITY_OPT_PREFIXES
        .iter()
        .any(|p| input.starts_with(p))
    {
        Ok(input.to_string())
    } else {
        Err(ValidationError::new(
            field,
            ErrorKind::InvalidSecurityOption,
            format!(
                "'{input}' does not start with an allowed prefix ({})",
                ALLOWED_SECURITY_OPT_PREFIXES.join(", ")
            ),
        ))
    }
}

/// Resolve the container user, enforcing the non-root policy.
///
/// An absent user resolves to [`DEFAULT_USER`]. `root`, `0`, and any `0:gid`
/// form are rejected outright, not warned about.
pub fn resolve_user(field: &str, input: Option<&str>) -> Result<String, ValidationError> {
    let user = match input {
        None => return Ok(DEFAULT_USER.to_string()),
        Some(u) => u.trim(),
    };
    if user.is_empty() {
        return Ok(DEFAULT_USER.to_string());
    }
    if user == "root" || user == "0" || user.starts_with("0:") {
        return Err(ValidationError::new(
            field,
            ErrorKind::ProhibitedRootUser,
            format!("running as root ('{user}') is not permitted"),
        ));
    }
    let parts: Vec<&str> = user.split(':').collect();
    if parts.len() > 2 || parts.iter().any(|p| p.is_empty()) {
        return Err(ValidationError::new(
            field,
            ErrorKind::MalformedFormat,
            format!("'{user}' does not match user[:group]"),
        ));
    }
    Ok(user.to_string())
}

/// Check a parsed device mapping against the dangerous-device blacklist.
pub fn check_device_safety(field: &str, device: &DeviceMapping) -> Result<(), ValidationError> {
    if let Some(prefix) = DANGEROUS_DEVICE_PREFIXES
        .iter()
        .find(|p| device.host_path.starts_with(*p))
    {
        return Err(ValidationError::new(
            field,
            ErrorKind::DangerousDevice,
            format!(
                "host device '{}' matches blacklisted prefix '{prefix}'",
                device.host_path
            ),
        ));
    }
    Ok(())
}

/// Batch-validate all security-related fields, collecting every violation.
///
/// Device syntax is checked by [`crate::parse::parse_device`] before the
/// mappings reach this gate; only the blacklist is applied here.
#[allow(clippy::too_many_arguments)]
pub fn validate_security(
    cap_add: &[String],
    cap_drop: &[String],
    security_opts: &[String],
    user: Option<&str>,
    devices: &[DeviceMapping],
    read_only_rootfs: bool,
    privileged: bool,
    errors: &mut Vec<ValidationError>,
) -> SecurityProfile {
    let mut profile = SecurityProfile {
        read_only_rootfs,
        privileged,
        ..Default::default()
    };

    for (i, cap) in cap_add.iter().enumerate() {
        match validate_capability(&format!("cap_add[{i}]"), cap) {
            Ok(c) => profile.cap_add.push(c),
            Err(e) => errors.push(e),
        }
    }
    for (i, cap) in cap_drop.iter().enumerate() {
        match validate_capability(&format!("cap_drop[{i}]"), cap) {
            Ok(c) => profile.cap_drop.push(c),
            Err(e) => errors.push(e),
        }
    }
    for (i, opt) in security_opts.iter().enumerate() {
        match validate_security_opt(&format!("security_opts[{i}]"), opt) {
            Ok(o) => profile.security_opts.push(o),
            Err(e) => errors.push(e),
        }
    }
    match resolve_user("user", user) {
        Ok(u) => profile.user = u,
        Err(e) => errors.push(e),
    }
    for (i, device) in devices.iter().enumerate() {
        if let Err(e) = check_device_safety(&format!("devices[{i}]"), device) {
            errors.push(e);
        }
    }

    profile
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_device;

    #[test]
    fn test_capability_table_size() {
        assert_eq!(KNOWN_CAPABILITIES.len(), 38);
    }

    #[test]
    fn test_capability_normalization() {
        assert_eq!(
            validate_capability("cap_add[0]", "net_admin").unwrap(),
            "CAP_NET_ADMIN"
        );
        assert_eq!(
            validate_capability("cap_add[0]", "CAP_SYS_PTRACE").unwrap(),
            "CAP_SYS_PTRACE"
        );
        assert_eq!(validate_capability("cap_drop[0]", "all").unwrap(), "ALL");
    }

    #[test]
    fn test_capability_unknown_rejected() {
        let e = validate_capability("cap_add[0]", "made_up").unwrap_err();
        assert_eq!(e.kind, ErrorKind::UnknownCapability);
    }

    #[test]
    fn test_security_opt_prefixes() {
        assert!(validate_security_opt("security_opts[0]", "seccomp:unconfined").is_ok());
        assert!(validate_security_opt("security_opts[0]", "apparmor:docker-default").is_ok());
        assert!(validate_security_opt("security_opts[0]", "no-new-privileges").is_ok());
        assert!(validate_security_opt("security_opts[0]", "label:disable").is_ok());
        assert!(validate_security_opt("security_opts[0]", "systempaths=unconfined").is_ok());
        assert!(validate_security_opt("security_opts[0]", "proc-opts=hidepid=2").is_ok());

        let e = validate_security_opt("security_opts[0]", "selinux:whatever").unwrap_err();
        assert_eq!(e.kind, ErrorKind::InvalidSecurityOption);
    }

    #[test]
    fn test_user_defaults_to_non_root() {
        assert_eq!(resolve_user("user", None).unwrap(), DEFAULT_USER);
        assert_eq!(resolve_user("user", Some("")).unwrap(), DEFAULT_USER);
    }

    #[test]
    fn test_root_users_rejected() {
        for user in ["root", "0", "0:0", "0:1000"] {
            let e = resolve_user("user", Some(user)).unwrap_err();
            assert_eq!(e.kind, ErrorKind::ProhibitedRootUser, "user: {user}");
        }
    }

    #[test]
    fn test_valid_users_accepted() {
        assert_eq!(resolve_user("user", Some("1000:1000")).unwrap(), "1000:1000");
        assert_eq!(resolve_user("user", Some("app")).unwrap(), "app");
        assert_eq!(resolve_user("user", Some("app:app")).unwrap(), "app:app");
    }

    #[test]
    fn test_user_shape_rejected() {
        for user in ["a:b:c", "a:", ":b"] {
            let e = resolve_user("user", Some(user)).unwrap_err();
            assert_eq!(e.kind, ErrorKind::MalformedFormat, "user: {user}");
        }
    }

    #[test]
    fn test_dangerous_devices_rejected() {
        for dev in ["/dev/mem:/dev/mem", "/dev/sda:/dev/sda", "/dev/nvme0n1:/dev/disk"] {
            let mapping = parse_device("devices", dev).unwrap();
            let e = check_device_safety("devices[0]", &mapping).unwrap_err();
            assert_eq!(e.kind, ErrorKind::DangerousDevice, "device: {dev}");
        }
    }

    #[test]
    fn test_safe_device_accepted() {
        let mapping = parse_device("devices", "/dev/snd:/dev/snd:rw").unwrap();
        assert!(check_device_safety("devices[0]", &mapping).is_ok());
    }

    #[test]
    fn test_batch_validation_collects_all_violations() {
        let mut errors = Vec::new();
        let devices = vec![parse_device("devices", "/dev/mem:/dev/mem").unwrap()];
        let profile = validate_security(
            &["made_up".into(), "net_admin".into()],
            &[],
            &["bogus:opt".into()],
            Some("root"),
            &devices,
            false,
            false,
            &mut errors,
        );
        // Unknown cap + bad secopt + root user + dangerous device.
        assert_eq!(errors.len(), 4);
        // The valid capability still lands in the profile.
        assert_eq!(profile.cap_add, vec!["CAP_NET_ADMIN".to_string()]);
    }
}
