//! Runtime verdict classification
//!
//! Turns a raw `ExecutionOutcome` into a verdict before any output
//! comparison happens. Pure functions only.

use crate::core::verdict::Verdict;
use crate::executer::ExecutionOutcome;

/// Substrings that suggest the program died from memory exhaustion
const OOM_MARKERS: [&str; 3] = ["oom", "out of memory", "memory"];

/// HEURISTIC: decide from stderr text whether a killed program ran out of
/// memory.
///
/// Approximate by nature: a program printing "memory" to stderr can be
/// misread as MLE, and a sandbox that swallows stderr hides real OOM kills.
/// Replace with a cgroup OOM-kill signal where one is available.
pub fn looks_like_oom(stderr: &str) -> bool {
    let lowered = stderr.to_lowercase();
    OOM_MARKERS.iter().any(|marker| lowered.contains(marker))
}

/// Classify a finished run; `Accepted` means "ran cleanly", the checker
/// still has to compare output
pub fn map_runtime_to_verdict(outcome: &ExecutionOutcome) -> Verdict {
    if outcome.timed_out {
        Verdict::TimeLimitExceeded
    } else if outcome.output_limit_exceeded {
        Verdict::RuntimeError
    } else if outcome.is_success() {
        Verdict::Accepted
    } else if outcome.was_killed() && looks_like_oom(&outcome.stderr) {
        Verdict::MemoryLimitExceeded
    } else {
        Verdict::RuntimeError
    }
}

/// Human-readable message for a runtime verdict
pub fn runtime_message(outcome: &ExecutionOutcome, verdict: Verdict) -> String {
    match verdict {
        Verdict::Accepted => "Accepted".to_string(),
        Verdict::WrongAnswer => "Wrong answer".to_string(),
        Verdict::TimeLimitExceeded => "Time limit exceeded".to_string(),
        Verdict::MemoryLimitExceeded => "Memory limit exceeded".to_string(),
        Verdict::CompileError => "Compilation error".to_string(),
        Verdict::RuntimeError => {
            if outcome.output_limit_exceeded {
                "Output limit exceeded".to_string()
            } else if let Some(signal) = outcome.terminating_signal() {
                format!("Runtime error ({})", signal)
            } else {
                match outcome.exit_code {
                    Some(code) => format!("Runtime error (exit code {})", code),
                    None => "Runtime error".to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome() -> ExecutionOutcome {
        ExecutionOutcome {
            exit_code: Some(0),
            ..Default::default()
        }
    }

    #[test]
    fn test_clean_exit_is_accepted() {
        assert_eq!(map_runtime_to_verdict(&outcome()), Verdict::Accepted);
    }

    #[test]
    fn test_timeout_wins_over_everything() {
        let o = ExecutionOutcome {
            timed_out: true,
            output_limit_exceeded: true,
            exit_code: None,
            signal: Some(9),
            stderr: "out of memory".into(),
            ..Default::default()
        };
        assert_eq!(map_runtime_to_verdict(&o), Verdict::TimeLimitExceeded);
    }

    #[test]
    fn test_output_limit_is_runtime_error() {
        let o = ExecutionOutcome {
            output_limit_exceeded: true,
            exit_code: None,
            signal: Some(9),
            ..Default::default()
        };
        assert_eq!(map_runtime_to_verdict(&o), Verdict::RuntimeError);
        assert_eq!(runtime_message(&o, Verdict::RuntimeError), "Output limit exceeded");
    }

    #[test]
    fn test_killed_with_oom_stderr_is_mle() {
        let by_code = ExecutionOutcome {
            exit_code: Some(137),
            stderr: "std::bad_alloc: Out Of Memory".into(),
            ..Default::default()
        };
        assert_eq!(map_runtime_to_verdict(&by_code), Verdict::MemoryLimitExceeded);

        let by_signal = ExecutionOutcome {
            exit_code: None,
            signal: Some(9),
            stderr: "oom-kill".into(),
            ..Default::default()
        };
        assert_eq!(map_runtime_to_verdict(&by_signal), Verdict::MemoryLimitExceeded);
    }

    #[test]
    fn test_killed_without_oom_stderr_is_re() {
        let o = ExecutionOutcome {
            exit_code: Some(137),
            stderr: String::new(),
            ..Default::default()
        };
        assert_eq!(map_runtime_to_verdict(&o), Verdict::RuntimeError);
    }

    #[test]
    fn test_oom_text_without_kill_is_re() {
        let o = ExecutionOutcome {
            exit_code: Some(1),
            stderr: "java.lang.OutOfMemoryError: Java heap space".into(),
            ..Default::default()
        };
        assert_eq!(map_runtime_to_verdict(&o), Verdict::RuntimeError);
    }

    #[test]
    fn test_looks_like_oom() {
        assert!(looks_like_oom("OOM"));
        assert!(looks_like_oom("Cannot allocate memory"));
        assert!(!looks_like_oom("Segmentation fault"));
        assert!(!looks_like_oom(""));
    }

    #[test]
    fn test_runtime_messages() {
        let segv = ExecutionOutcome {
            exit_code: Some(139),
            ..Default::default()
        };
        assert_eq!(runtime_message(&segv, Verdict::RuntimeError), "Runtime error (SIGSEGV)");

        let exited = ExecutionOutcome {
            exit_code: Some(2),
            ..Default::default()
        };
        assert_eq!(
            runtime_message(&exited, Verdict::RuntimeError),
            "Runtime error (exit code 2)"
        );
        assert_eq!(runtime_message(&outcome(), Verdict::WrongAnswer), "Wrong answer");
    }
}
