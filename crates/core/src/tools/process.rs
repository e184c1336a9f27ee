//! Process-based command runner.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::debug;

use super::error::ToolError;
use super::traits::CommandRunner;
use super::types::{CommandOutput, CommandSpec};

/// Bytes of stdout and stderr kept per command; earlier output is discarded.
pub const DEFAULT_OUTPUT_LIMIT: usize = 64 * 1024;

/// Runs commands as child processes of this one.
pub struct ProcessRunner {
    timeout: Option<Duration>,
    output_limit: usize,
}

impl ProcessRunner {
    /// Creates a runner that kills commands exceeding `timeout`.
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            timeout,
            output_limit: DEFAULT_OUTPUT_LIMIT,
        }
    }

    /// Keeps at most `bytes` of the end of each output stream.
    pub fn with_output_limit(mut self, bytes: usize) -> Self {
        self.output_limit = bytes;
        self
    }

    /// Creates a runner without a timeout.
    pub fn with_defaults() -> Self {
        Self::new(None)
    }

    fn build_command(spec: &CommandSpec) -> Command {
        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &spec.current_dir {
            command.current_dir(dir);
        }
        command
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    fn name(&self) -> &str {
        "process"
    }

    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ToolError> {
        let start = Instant::now();
        debug!(tool = %spec.tool, command = %spec.display(), "Running command");

        let mut child = Self::build_command(spec).spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ToolError::ProgramNotFound {
                    program: spec.program.clone(),
                }
            } else {
                ToolError::Io(e)
            }
        })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let output_limit = self.output_limit;
        let finished = async {
            tokio::try_join!(
                read_tail(stdout, output_limit),
                read_tail(stderr, output_limit),
                child.wait()
            )
        };

        // On timeout the child is dropped on return, which kills it.
        let (stdout, stderr, status) = match self.timeout {
            Some(limit) => timeout(limit, finished)
                .await
                .map_err(|_| ToolError::Timeout {
                    tool: spec.tool.clone(),
                    timeout_secs: limit.as_secs(),
                })??,
            None => finished.await?,
        };

        let result = CommandOutput {
            code: status.code(),
            stdout: String::from_utf8_lossy(&stdout).to_string(),
            stderr: String::from_utf8_lossy(&stderr).to_string(),
            duration_ms: start.elapsed().as_millis() as u64,
        };

        debug!(
            tool = %spec.tool,
            code = ?result.code,
            duration_ms = result.duration_ms,
            "Command finished"
        );
        Ok(result)
    }
}

/// Drains `reader`, keeping only its last `limit` bytes.
async fn read_tail<R>(reader: Option<R>, limit: usize) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let Some(mut reader) = reader else {
        return Ok(Vec::new());
    };

    let mut tail = Vec::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        tail.extend_from_slice(&buf[..n]);
        // Trimmed lazily; the check after the loop enforces the limit.
        if tail.len() > limit.saturating_mul(2).max(buf.len()) {
            tail.drain(..tail.len() - limit);
        }
    }
    if tail.len() > limit {
        tail.drain(..tail.len() - limit);
    }
    Ok(tail)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_tail_keeps_end_of_stream() {
        let data: Vec<u8> = (0..50_000u32).flat_map(|i| i.to_le_bytes()).collect();
        let tail = read_tail(Some(data.as_slice()), 100).await.unwrap();
        assert_eq!(tail, &data[data.len() - 100..]);
    }

    #[tokio::test]
    async fn test_read_tail_short_stream_is_whole() {
        let tail = read_tail(Some(&b"short"[..]), 100).await.unwrap();
        assert_eq!(tail, b"short");
    }

    #[tokio::test]
    async fn test_read_tail_without_pipe() {
        let tail = read_tail(None::<&[u8]>, 100).await.unwrap();
        assert!(tail.is_empty());
    }

    #[tokio::test]
    async fn test_run_captures_stdout_and_code() {
        let runner = ProcessRunner::with_defaults();
        let spec = CommandSpec::new("sh", "sh").args(["-c", "echo hello; echo oops >&2; exit 3"]);

        let output = runner.run(&spec).await.unwrap();
        assert_eq!(output.code, Some(3));
        assert_eq!(output.stdout.trim(), "hello");
        assert_eq!(output.stderr.trim(), "oops");
        assert!(!output.success());
    }

    #[tokio::test]
    async fn test_run_missing_program() {
        let runner = ProcessRunner::with_defaults();
        let spec = CommandSpec::new("ghost", "/nonexistent/bin/ghost-tool");

        let err = runner.run(&spec).await.unwrap_err();
        assert!(matches!(err, ToolError::ProgramNotFound { .. }));
    }

    #[tokio::test]
    async fn test_run_respects_current_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let runner = ProcessRunner::with_defaults();
        let spec = CommandSpec::new("pwd", "pwd").current_dir(dir.path());

        let output = runner.run(&spec).await.unwrap();
        let reported = std::fs::canonicalize(output.stdout.trim()).unwrap();
        assert_eq!(reported, std::fs::canonicalize(dir.path()).unwrap());
    }

    #[tokio::test]
    async fn test_run_keeps_bounded_output_tail() {
        let runner = ProcessRunner::with_defaults().with_output_limit(16);
        let spec = CommandSpec::new("sh", "sh")
            .args(["-c", "seq 1 20000; seq 1 20000 >&2; echo last-line >&2; exit 1"]);

        let output = runner.run(&spec).await.unwrap();
        assert_eq!(output.code, Some(1));
        assert_eq!(output.stdout.len(), 16);
        assert!(output.stdout.ends_with("19999\n20000\n"));
        assert!(output.stderr.len() <= 16);
        assert!(output.stderr.ends_with("last-line\n"));
    }

    #[tokio::test]
    async fn test_run_timeout() {
        let runner = ProcessRunner::new(Some(Duration::from_millis(100)));
        let spec = CommandSpec::new("sleep", "sleep").arg("5");

        let err = runner.run(&spec).await.unwrap_err();
        assert!(matches!(err, ToolError::Timeout { ref tool, .. } if tool == "sleep"));
    }
}
