use serde::{Deserialize, Serialize};
use std::fmt;

/// Verdict of a compile or run step.
///
/// Variants are declared in severity order, so the derived `Ord` is the
/// aggregation order `AC < WA < TLE < MLE < RE < CE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Verdict {
    #[default]
    #[serde(rename = "AC")]
    Accepted,
    #[serde(rename = "WA")]
    WrongAnswer,
    #[serde(rename = "TLE")]
    TimeLimitExceeded,
    #[serde(rename = "MLE")]
    MemoryLimitExceeded,
    #[serde(rename = "RE")]
    RuntimeError,
    #[serde(rename = "CE")]
    CompileError,
}

impl Verdict {
    /// Keep the more severe of the two verdicts
    pub fn worsen(self, other: Verdict) -> Verdict {
        self.max(other)
    }

    pub fn is_accepted(self) -> bool {
        self == Verdict::Accepted
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Accepted => "AC",
            Verdict::WrongAnswer => "WA",
            Verdict::TimeLimitExceeded => "TLE",
            Verdict::MemoryLimitExceeded => "MLE",
            Verdict::RuntimeError => "RE",
            Verdict::CompileError => "CE",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Verdict; 6] = [
        Verdict::Accepted,
        Verdict::WrongAnswer,
        Verdict::TimeLimitExceeded,
        Verdict::MemoryLimitExceeded,
        Verdict::RuntimeError,
        Verdict::CompileError,
    ];

    #[test]
    fn test_severity_order() {
        for pair in ALL.windows(2) {
            assert!(pair[0] < pair[1], "{} should be less severe than {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_worsen_never_decreases() {
        for a in ALL {
            for b in ALL {
                let w = a.worsen(b);
                assert!(w >= a && w >= b);
                assert_eq!(w, b.worsen(a));
            }
        }
    }

    #[test]
    fn test_fold_equals_maximum() {
        // Every sequence of length 3 over the six verdicts
        for a in ALL {
            for b in ALL {
                for c in ALL {
                    let seq = [a, b, c];
                    let folded = seq.iter().fold(Verdict::Accepted, |acc, v| acc.worsen(*v));
                    assert_eq!(folded, *seq.iter().max().unwrap());
                }
            }
        }
    }

    #[test]
    fn test_serde_names() {
        for v in ALL {
            let json = serde_json::to_string(&v).unwrap();
            assert_eq!(json, format!("\"{}\"", v));
        }
        let parsed: Verdict = serde_json::from_str("\"MLE\"").unwrap();
        assert_eq!(parsed, Verdict::MemoryLimitExceeded);
    }
}
