//! Error types for the tools module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while running external tools.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Program binary not found.
    #[error("Program not found: {program}")]
    ProgramNotFound { program: PathBuf },

    /// Program ran but reported failure.
    #[error("{tool} failed with exit code {}{}", .code.map(|c| c.to_string()).unwrap_or_else(|| "none".to_string()), .stderr.as_deref().map(|s| format!(": {}", s)).unwrap_or_default())]
    NonZeroExit {
        tool: String,
        code: Option<i32>,
        stderr: Option<String>,
    },

    /// Program did not finish in time.
    #[error("{tool} timed out after {timeout_secs} seconds")]
    Timeout { tool: String, timeout_secs: u64 },

    /// Program output could not be interpreted.
    #[error("Unexpected output from {tool}: {reason}")]
    UnexpectedOutput { tool: String, reason: String },

    /// I/O error while spawning or waiting.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ToolError {
    /// Creates a non-zero exit error, keeping only the tail of stderr.
    pub fn non_zero_exit(tool: impl Into<String>, code: Option<i32>, stderr: &str) -> Self {
        let trimmed = stderr.trim();
        let stderr = if trimmed.is_empty() {
            None
        } else {
            let tail: Vec<&str> = trimmed.lines().rev().take(20).collect();
            Some(tail.into_iter().rev().collect::<Vec<_>>().join("\n"))
        };
        Self::NonZeroExit {
            tool: tool.into(),
            code,
            stderr,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_zero_exit_message() {
        let err = ToolError::non_zero_exit("merger", Some(2), "  boom\n");
        assert_eq!(err.to_string(), "merger failed with exit code 2: boom");
    }

    #[test]
    fn test_non_zero_exit_without_stderr() {
        let err = ToolError::non_zero_exit("docker", None, "");
        assert_eq!(err.to_string(), "docker failed with exit code none");
    }

    #[test]
    fn test_non_zero_exit_keeps_stderr_tail() {
        let stderr: String = (0..50).map(|i| format!("line {}\n", i)).collect();
        match ToolError::non_zero_exit("linker", Some(1), &stderr) {
            ToolError::NonZeroExit { stderr: Some(s), .. } => {
                assert_eq!(s.lines().count(), 20);
                assert!(s.starts_with("line 30"));
                assert!(s.ends_with("line 49"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
