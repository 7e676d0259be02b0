use serde::{Deserialize, Serialize};

use crate::core::request::JsonId;
use crate::core::verdict::Verdict;

/// Outcome of the compile stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileResult {
    pub verdict: Verdict,
    pub time_ms: u64,
    /// Absent when the memory accounting file was unreadable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_kb: Option<u64>,
    pub message: String,
    /// Compiler output, truncated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
}

/// Outcome of one test case.
///
/// The diagnostic fields are only populated for visible tests or in debug
/// mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestRunResult {
    pub id: JsonId,
    pub verdict: Verdict,
    pub time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_kb: Option<u64>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeResponse {
    pub submission_id: JsonId,
    /// Aggregate over compile and every executed test
    pub verdict: Verdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compile: Option<CompileResult>,
    pub tests: Vec<TestRunResult>,
    /// Sum of per-test wall times
    pub time_ms: u64,
    /// Largest peak observed across tests
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_kb: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Top-level failure shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redacted_result_omits_details() {
        let result = TestRunResult {
            id: JsonId::Number(3.into()),
            verdict: Verdict::WrongAnswer,
            time_ms: 12,
            memory_kb: None,
            message: "Wrong answer".into(),
            input: None,
            expected: None,
            actual: None,
            stderr: None,
        };
        let value = serde_json::to_value(&result).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object["verdict"], "WA");
        for field in ["input", "expected", "actual", "stderr", "memory_kb"] {
            assert!(!object.contains_key(field), "{} should be omitted", field);
        }
    }

    #[test]
    fn test_error_response_shape() {
        let json = serde_json::to_string(&ErrorResponse {
            error: "INVALID_JSON: eof".into(),
        })
        .unwrap();
        assert_eq!(json, r#"{"error":"INVALID_JSON: eof"}"#);
    }
}
