//! Shared vocabulary: verdicts, limits, request and response shapes

pub mod limits;
pub mod request;
pub mod response;
pub mod utils;
pub mod verdict;

pub use limits::{validate_and_resolve_limits, ResolvedLimits};
pub use request::{JudgeRequest, TestCase};
pub use response::{CompileResult, ErrorResponse, JudgeResponse, TestRunResult};
pub use verdict::Verdict;
