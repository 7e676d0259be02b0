//! Top-level error taxonomy
//!
//! These are protocol-level failures that abort the whole request with an
//! `{"error": ...}` response. Per-test failures (WA/TLE/MLE/RE/CE) are not
//! errors; they are verdicts carried inside a normal response.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum JudgeError {
    /// Standard input exceeded the hard cap before parsing started
    #[error("INPUT_TOO_LARGE: request exceeds {limit} bytes")]
    InputTooLarge { limit: usize },

    #[error("INVALID_JSON: {0}")]
    InvalidJson(String),

    /// Structurally or semantically invalid request
    #[error("INVALID_REQUEST: {0}")]
    InvalidRequest(String),

    #[error("INVALID_LIMITS: {0}")]
    InvalidLimits(String),

    /// Malformed environment configuration
    #[error("CONFIG_ERROR: {0}")]
    Config(String),

    /// The isolation tool could not be driven (spawn failure, broken pipes)
    #[error("SANDBOX_ERROR: {0:#}")]
    Sandbox(anyhow::Error),

    #[error("IO_ERROR: {0}")]
    Io(#[from] std::io::Error),
}

impl JudgeError {
    /// Stable name of the error kind
    pub fn code(&self) -> &'static str {
        match self {
            JudgeError::InputTooLarge { .. } => "INPUT_TOO_LARGE",
            JudgeError::InvalidJson(_) => "INVALID_JSON",
            JudgeError::InvalidRequest(_) => "INVALID_REQUEST",
            JudgeError::InvalidLimits(_) => "INVALID_LIMITS",
            JudgeError::Config(_) => "CONFIG_ERROR",
            JudgeError::Sandbox(_) => "SANDBOX_ERROR",
            JudgeError::Io(_) => "IO_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, JudgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_starts_with_code() {
        let errors = [
            JudgeError::InputTooLarge { limit: 10 },
            JudgeError::InvalidJson("eof".into()),
            JudgeError::InvalidRequest("bad language".into()),
            JudgeError::InvalidLimits("time".into()),
            JudgeError::Config("NSJAIL_PATH".into()),
            JudgeError::Sandbox(anyhow::anyhow!("spawn failed")),
        ];

        for err in errors {
            assert!(err.to_string().starts_with(err.code()), "{}", err);
        }
    }

    #[test]
    fn test_sandbox_error_keeps_context_chain() {
        let err = JudgeError::Sandbox(
            anyhow::anyhow!("No such file or directory").context("Failed to spawn nsjail"),
        );
        assert_eq!(
            err.to_string(),
            "SANDBOX_ERROR: Failed to spawn nsjail: No such file or directory"
        );
    }
}
