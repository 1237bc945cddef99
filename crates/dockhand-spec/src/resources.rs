//! Resource-limit normalization.
//!
//! Converts human-readable memory strings (`512m`, `1g`) to byte counts and
//! fractional CPU counts to the nano-CPU units the Docker API expects.

use crate::error::{ErrorKind, ValidationError};
use serde::Serialize;

/// One nano-CPU is one-billionth of a CPU core.
pub const NANO_CPUS_PER_CPU: f64 = 1_000_000_000.0;

/// Normalized resource limits, in the units the Docker API consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ResourceLimits {
    /// Memory ceiling in bytes.
    pub memory_bytes: Option<i64>,
    /// CPU ceiling in nano-CPUs.
    pub nano_cpus: Option<i64>,
}

fn invalid(field: &str, reason: impl Into<String>) -> ValidationError {
    ValidationError::new(field, ErrorKind::InvalidResourceLimit, reason)
}

/// Parse a human-readable memory limit into bytes.
///
/// Suffixes `k`, `m`, `g`, `t` (case-insensitive) denote powers of 1024; a
/// bare number is raw bytes.
pub fn parse_memory_limit(field: &str, input: &str) -> Result<i64, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(invalid(field, "memory limit must not be empty"));
    }

    let (number, multiplier) = match trimmed.chars().last() {
        Some(c) if c.is_ascii_alphabetic() => {
            let mult: i64 = match c.to_ascii_lowercase() {
                'k' => 1024,
                'm' => 1024 * 1024,
                'g' => 1024 * 1024 * 1024,
                't' => 1024_i64.pow(4),
                other => {
                    return Err(invalid(
                        field,
                        format!("unknown memory suffix '{other}', expected one of k, m, g, t"),
                    ))
                }
            };
            (&trimmed[..trimmed.len() - 1], mult)
        }
        _ => (trimmed, 1),
    };

    if number.is_empty() {
        return Err(invalid(field, format!("memory limit '{trimmed}' has no numeric prefix")));
    }
    let value: i64 = number
        .parse()
        .map_err(|_| invalid(field, format!("'{number}' is not a valid integer")))?;
    if value < 0 {
        return Err(invalid(field, "memory limit must not be negative"));
    }

    value
        .checked_mul(multiplier)
        .ok_or_else(|| invalid(field, format!("memory limit '{trimmed}' overflows")))
}

/// Convert a fractional CPU count to nano-CPUs.
///
/// Rejects negative and non-finite input.
pub fn normalize_cpus(field: &str, cpus: f64) -> Result<i64, ValidationError> {
    if !cpus.is_finite() {
        return Err(invalid(field, "cpu count must be finite"));
    }
    if cpus < 0.0 {
        return Err(invalid(field, "cpu count must not be negative"));
    }
    let nanos = cpus * NANO_CPUS_PER_CPU;
    if nanos > i64::MAX as f64 {
        return Err(invalid(field, "cpu count is too large"));
    }
    Ok(nanos.round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_suffixes() {
        assert_eq!(parse_memory_limit("memory", "2k").unwrap(), 2048);
        assert_eq!(parse_memory_limit("memory", "512m").unwrap(), 536_870_912);
        assert_eq!(parse_memory_limit("memory", "1g").unwrap(), 1_073_741_824);
        assert_eq!(parse_memory_limit("memory", "1t").unwrap(), 1_099_511_627_776);
    }

    #[test]
    fn test_memory_suffixes_case_insensitive() {
        assert_eq!(parse_memory_limit("memory", "512M").unwrap(), 536_870_912);
        assert_eq!(parse_memory_limit("memory", "1G").unwrap(), 1_073_741_824);
    }

    #[test]
    fn test_memory_bare_number_is_bytes() {
        assert_eq!(parse_memory_limit("memory", "100").unwrap(), 100);
        assert_eq!(parse_memory_limit("memory", "0").unwrap(), 0);
    }

    #[test]
    fn test_memory_rejects_suffix_without_prefix() {
        let e = parse_memory_limit("memory", "g").unwrap_err();
        assert_eq!(e.kind, ErrorKind::InvalidResourceLimit);
    }

    #[test]
    fn test_memory_rejects_garbage() {
        for input in ["", "abc", "1.5g", "12x", "--3m"] {
            let e = parse_memory_limit("memory", input).unwrap_err();
            assert_eq!(e.kind, ErrorKind::InvalidResourceLimit, "input: {input}");
        }
    }

    #[test]
    fn test_normalize_cpus() {
        assert_eq!(normalize_cpus("cpus", 1.5).unwrap(), 1_500_000_000);
        assert_eq!(normalize_cpus("cpus", 0.25).unwrap(), 250_000_000);
        assert_eq!(normalize_cpus("cpus", 0.0).unwrap(), 0);
    }

    #[test]
    fn test_normalize_cpus_rejects_invalid() {
        assert!(normalize_cpus("cpus", -1.0).is_err());
        assert!(normalize_cpus("cpus", f64::NAN).is_err());
        assert!(normalize_cpus("cpus", f64::INFINITY).is_err());
    }
}
