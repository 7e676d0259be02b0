//! Resource limits of a submission
//!
//! Request limits arrive in user-facing units (ms / MB / KB), are checked
//! against hard validity ranges and resolved to base units before any sandbox
//! is created.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use crate::error::{JudgeError, Result};
use crate::languages::Language;

pub const TIME_LIMIT_MS_RANGE: RangeInclusive<f64> = 1.0..=30_000.0;
pub const MEMORY_LIMIT_MB_RANGE: RangeInclusive<f64> = 32.0..=512.0;
pub const OUTPUT_LIMIT_KB_RANGE: RangeInclusive<f64> = 1.0..=1024.0;

/// Limits as supplied by the caller; omitted fields fall back to the
/// language defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JudgeLimits {
    #[serde(default)]
    pub time_limit_ms: Option<f64>,
    #[serde(default)]
    pub memory_limit_mb: Option<f64>,
    #[serde(default)]
    pub output_limit_kb: Option<f64>,
}

/// Per-language defaults, in request units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultLimits {
    pub time_limit_ms: u64,
    pub memory_limit_mb: u64,
    pub output_limit_kb: u64,
}

/// Validated limits in base units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedLimits {
    pub time_ms: u64,
    pub memory_bytes: u64,
    pub output_bytes: u64,
}

impl ResolvedLimits {
    pub fn memory_mb(&self) -> u64 {
        self.memory_bytes / (1024 * 1024)
    }
}

fn resolve_field(
    name: &str,
    value: Option<f64>,
    default: u64,
    range: RangeInclusive<f64>,
) -> Result<u64> {
    let value = match value {
        Some(v) => v,
        None => return Ok(default),
    };

    if !value.is_finite() {
        return Err(JudgeError::InvalidLimits(format!(
            "{} must be a finite number",
            name
        )));
    }
    if !range.contains(&value) {
        return Err(JudgeError::InvalidLimits(format!(
            "{} must be within {}..={}, got {}",
            name,
            range.start(),
            range.end(),
            value
        )));
    }

    Ok(value.trunc() as u64)
}

/// Check request limits and convert them to base units.
///
/// Pure: no sandbox or filesystem is touched.
pub fn validate_and_resolve_limits(
    language: Language,
    limits: &JudgeLimits,
) -> Result<ResolvedLimits> {
    let defaults = language.adapter().default_limits();

    let time_ms = resolve_field(
        "time_limit_ms",
        limits.time_limit_ms,
        defaults.time_limit_ms,
        TIME_LIMIT_MS_RANGE,
    )?;
    let memory_mb = resolve_field(
        "memory_limit_mb",
        limits.memory_limit_mb,
        defaults.memory_limit_mb,
        MEMORY_LIMIT_MB_RANGE,
    )?;
    let output_kb = resolve_field(
        "output_limit_kb",
        limits.output_limit_kb,
        defaults.output_limit_kb,
        OUTPUT_LIMIT_KB_RANGE,
    )?;

    Ok(ResolvedLimits {
        time_ms,
        memory_bytes: memory_mb * 1024 * 1024,
        output_bytes: output_kb * 1024,
    })
}
