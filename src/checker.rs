//! Output checkers
//!
//! Pure comparison policies between a program's actual output and the
//! expected output of a test case. No I/O happens here.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Epsilon used when a float checker carries no usable tolerance
pub const DEFAULT_FLOAT_EPSILON: f64 = 1e-6;

/// Checker selection as supplied in the request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CheckerSpec {
    Exact,
    Whitespace,
    Float {
        #[serde(default)]
        epsilon: Option<f64>,
    },
}

/// Normalized checker, ready to run
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Checker {
    Exact,
    #[default]
    Whitespace,
    Float { epsilon: f64 },
}

impl Checker {
    /// Resolve the request's checker: whitespace when unspecified, float
    /// epsilon clamped to the default when outside `(0, 1]`
    pub fn from_spec(spec: Option<&CheckerSpec>) -> Self {
        match spec {
            None | Some(CheckerSpec::Whitespace) => Checker::Whitespace,
            Some(CheckerSpec::Exact) => Checker::Exact,
            Some(CheckerSpec::Float { epsilon }) => {
                let epsilon = match *epsilon {
                    Some(e) if e > 0.0 && e <= 1.0 => e,
                    other => {
                        if other.is_some() {
                            warn!(
                                "Float checker epsilon {:?} out of range, using {}",
                                other, DEFAULT_FLOAT_EPSILON
                            );
                        }
                        DEFAULT_FLOAT_EPSILON
                    }
                };
                Checker::Float { epsilon }
            }
        }
    }

    pub fn check(&self, actual: &str, expected: &str) -> bool {
        match *self {
            Checker::Exact => check_exact(actual, expected),
            Checker::Whitespace => check_whitespace(actual, expected),
            Checker::Float { epsilon } => check_float(actual, expected, epsilon),
        }
    }
}

fn normalize_line_endings(s: &str) -> String {
    s.replace("\r\n", "\n")
}

/// Normalize for exact comparison: CRLF to LF, trailing whitespace of every
/// line and trailing blank lines removed. Internal whitespace is kept.
fn normalize_exact(s: &str) -> Vec<String> {
    let normalized = normalize_line_endings(s);
    let mut lines: Vec<String> = normalized
        .split('\n')
        .map(|line| line.trim_end().to_string())
        .collect();

    while lines.last().map(|l| l.is_empty()).unwrap_or(false) {
        lines.pop();
    }
    lines
}

fn tokenize(s: &str) -> Vec<&str> {
    s.split_whitespace().collect()
}

/// Line-by-line comparison after CRLF normalization. Trailing whitespace is
/// trimmed on every line, not just at the end of the output, and trailing
/// blank lines are ignored.
pub fn check_exact(actual: &str, expected: &str) -> bool {
    normalize_exact(actual) == normalize_exact(expected)
}

/// Token sequences must match; spacing between tokens is irrelevant
pub fn check_whitespace(actual: &str, expected: &str) -> bool {
    let actual = normalize_line_endings(actual);
    let expected = normalize_line_endings(expected);
    tokenize(&actual) == tokenize(&expected)
}

/// Token-wise comparison where numeric pairs may differ by a scale-relative
/// `epsilon`; any other token must match exactly
pub fn check_float(actual: &str, expected: &str, epsilon: f64) -> bool {
    let actual = normalize_line_endings(actual);
    let expected = normalize_line_endings(expected);
    let actual_tokens = tokenize(&actual);
    let expected_tokens = tokenize(&expected);

    if actual_tokens.len() != expected_tokens.len() {
        return false;
    }

    actual_tokens
        .iter()
        .zip(expected_tokens.iter())
        .all(|(a, e)| match (parse_number(a), parse_number(e)) {
            (Some(x), Some(y)) => nearly_equal(x, y, epsilon),
            _ => a == e,
        })
}

fn nearly_equal(a: f64, b: f64, epsilon: f64) -> bool {
    if a == b {
        return true;
    }
    // A literal that overflows to infinity would otherwise scale the
    // tolerance to infinity
    if !a.is_finite() || !b.is_finite() {
        return false;
    }
    let scale = 1f64.max(a.abs()).max(b.abs());
    (a - b).abs() <= epsilon * scale
}

/// Parse an integer, decimal or exponential literal.
///
/// Rejects what `f64::from_str` would otherwise accept as words
/// (`inf`, `NaN`, `infinity`), so those stay textual tokens.
fn parse_number(token: &str) -> Option<f64> {
    let bytes = token.as_bytes();
    let mut i = 0;

    if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
        i += 1;
    }

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;

    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        digits += i - frac_start;
    }

    if digits == 0 {
        return None;
    }

    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        i += 1;
        if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
            i += 1;
        }
        let exp_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return None;
        }
    }

    if i != bytes.len() {
        return None;
    }

    token.parse::<f64>().ok()
}
