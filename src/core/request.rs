//! Judge request shape and validation

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::checker::CheckerSpec;
use crate::core::limits::JudgeLimits;
use crate::error::{JudgeError, Result};
use crate::languages::Language;

/// Hard cap on the raw request read from stdin
pub const MAX_REQUEST_BYTES: usize = 2 * 1024 * 1024;
pub const MAX_SOURCE_BYTES: usize = 1024 * 1024;
pub const MAX_TESTS: usize = 200;
/// Cap on each test's input and expected output
pub const MAX_TEST_FIELD_BYTES: usize = 256 * 1024;

/// Identifier the caller may send as a string or any JSON number; echoed
/// back as-is
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonId {
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for JsonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsonId::Number(n) => write!(f, "{}", n),
            JsonId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub id: JsonId,
    #[serde(default)]
    pub input: String,
    pub output: String,
    #[serde(default)]
    pub hidden: bool,
}

fn default_run_all() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeRequest {
    pub submission_id: JsonId,
    pub language: Language,
    pub source: String,
    pub tests: Vec<TestCase>,
    #[serde(default)]
    pub limits: Option<JudgeLimits>,
    #[serde(default)]
    pub checker: Option<CheckerSpec>,
    #[serde(default)]
    pub debug: bool,
    /// Keep running after the first non-AC test
    #[serde(default = "default_run_all")]
    pub run_all: bool,
}

impl JudgeRequest {
    /// Parse request text in two phases so that malformed JSON and a
    /// well-formed but wrongly shaped request get different error kinds
    pub fn parse(text: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| JudgeError::InvalidJson(e.to_string()))?;
        serde_json::from_value(value).map_err(|e| JudgeError::InvalidRequest(e.to_string()))
    }

    /// Check bounds that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.source.trim().is_empty() {
            return Err(JudgeError::InvalidRequest("source is empty".into()));
        }
        if self.source.len() > MAX_SOURCE_BYTES {
            return Err(JudgeError::InvalidRequest(format!(
                "source exceeds {} bytes",
                MAX_SOURCE_BYTES
            )));
        }

        if self.tests.is_empty() {
            return Err(JudgeError::InvalidRequest("tests must not be empty".into()));
        }
        if self.tests.len() > MAX_TESTS {
            return Err(JudgeError::InvalidRequest(format!(
                "at most {} tests are allowed, got {}",
                MAX_TESTS,
                self.tests.len()
            )));
        }
        for test in &self.tests {
            if test.input.len() > MAX_TEST_FIELD_BYTES {
                return Err(JudgeError::InvalidRequest(format!(
                    "input of test {} exceeds {} bytes",
                    test.id, MAX_TEST_FIELD_BYTES
                )));
            }
            if test.output.len() > MAX_TEST_FIELD_BYTES {
                return Err(JudgeError::InvalidRequest(format!(
                    "output of test {} exceeds {} bytes",
                    test.id, MAX_TEST_FIELD_BYTES
                )));
            }
        }

        if self.limits.is_none() {
            return Err(JudgeError::InvalidRequest("limits are required".into()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base_request() -> serde_json::Value {
        json!({
            "submission_id": "sub-1",
            "language": "python",
            "source": "print(1)",
            "tests": [{"id": 1, "input": "", "output": "1"}],
            "limits": {"time_limit_ms": 1000}
        })
    }

    fn parse_value(value: serde_json::Value) -> Result<JudgeRequest> {
        JudgeRequest::parse(&value.to_string())
    }

    #[test]
    fn test_parse_defaults() {
        let req = parse_value(base_request()).unwrap();
        assert_eq!(req.submission_id, JsonId::Text("sub-1".into()));
        assert_eq!(req.language, Language::Python);
        assert!(req.run_all);
        assert!(!req.debug);
        assert!(req.checker.is_none());
        assert_eq!(req.tests[0].id, JsonId::Number(1.into()));
        assert!(!req.tests[0].hidden);
        req.validate().unwrap();
    }

    #[test]
    fn test_numeric_ids_echo_back() {
        let mut value = base_request();
        value["submission_id"] = json!(18446744073709551615u64);
        value["tests"] = json!([{"id": 2.5, "output": "1"}]);
        let req = parse_value(value).unwrap();

        assert_eq!(req.submission_id.to_string(), "18446744073709551615");
        assert_eq!(
            serde_json::to_value(&req.tests[0].id).unwrap(),
            json!(2.5)
        );
        assert_eq!(
            serde_json::to_string(&req.submission_id).unwrap(),
            "18446744073709551615"
        );
    }

    #[test]
    fn test_input_defaults_to_empty() {
        let mut value = base_request();
        value["tests"] = json!([{"id": "a", "output": "1"}]);
        let req = parse_value(value).unwrap();
        assert_eq!(req.tests[0].input, "");
    }

    #[test]
    fn test_malformed_json() {
        let err = JudgeRequest::parse("{\"submission_id\": ").unwrap_err();
        assert_eq!(err.code(), "INVALID_JSON");
    }

    #[test]
    fn test_unknown_language_is_invalid_request() {
        let mut value = base_request();
        value["language"] = json!("rust");
        assert_eq!(parse_value(value).unwrap_err().code(), "INVALID_REQUEST");
    }

    #[test]
    fn test_missing_output_is_invalid_request() {
        let mut value = base_request();
        value["tests"] = json!([{"id": 1, "input": "5"}]);
        assert_eq!(parse_value(value).unwrap_err().code(), "INVALID_REQUEST");
    }

    #[test]
    fn test_validate_rejects_bad_bounds() {
        let mut empty_source = parse_value(base_request()).unwrap();
        empty_source.source = "   \n".into();
        assert_eq!(empty_source.validate().unwrap_err().code(), "INVALID_REQUEST");

        let mut big_source = parse_value(base_request()).unwrap();
        big_source.source = "x".repeat(MAX_SOURCE_BYTES + 1);
        assert_eq!(big_source.validate().unwrap_err().code(), "INVALID_REQUEST");

        let mut no_tests = parse_value(base_request()).unwrap();
        no_tests.tests.clear();
        assert_eq!(no_tests.validate().unwrap_err().code(), "INVALID_REQUEST");

        let mut many_tests = parse_value(base_request()).unwrap();
        let test = many_tests.tests[0].clone();
        many_tests.tests = vec![test; MAX_TESTS + 1];
        assert_eq!(many_tests.validate().unwrap_err().code(), "INVALID_REQUEST");

        let mut big_input = parse_value(base_request()).unwrap();
        big_input.tests[0].input = "1".repeat(MAX_TEST_FIELD_BYTES + 1);
        assert_eq!(big_input.validate().unwrap_err().code(), "INVALID_REQUEST");

        let mut no_limits = parse_value(base_request()).unwrap();
        no_limits.limits = None;
        assert_eq!(no_limits.validate().unwrap_err().code(), "INVALID_REQUEST");
    }

    #[test]
    fn test_max_tests_accepted() {
        let mut req = parse_value(base_request()).unwrap();
        let test = req.tests[0].clone();
        req.tests = vec![test; MAX_TESTS];
        req.validate().unwrap();
    }
}
