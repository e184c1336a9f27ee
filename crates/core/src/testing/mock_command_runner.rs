//! Mock command runner for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::tools::{CommandOutput, CommandRunner, CommandSpec, ToolError};

/// Side effect executed when a command for a given tool runs, e.g. creating
/// the files the real tool would have produced.
pub type CommandHook = Arc<dyn Fn(&CommandSpec) -> std::io::Result<()> + Send + Sync>;

/// Mock implementation of the CommandRunner trait.
///
/// Provides controllable behavior for testing:
/// - Track executed commands for assertions
/// - Configure exit code and output per tool
/// - Simulate a tool's filesystem side effects with hooks
/// - Inject spawn failures
///
/// Commands are keyed by [`CommandSpec::tool`]. Tools without a configured
/// output succeed silently.
///
/// # Example
///
/// ```rust,ignore
/// use seqmerge_core::testing::MockCommandRunner;
///
/// let runner = MockCommandRunner::new();
/// runner.set_output("merger", CommandOutput::failed(1, "bad plan")).await;
/// runner.on_run("file_linker", |spec| std::fs::write("/tmp/linked", b"")).await;
///
/// // ... run the pipeline ...
///
/// assert_eq!(runner.recorded_tools().await, vec!["file_linker", "merger"]);
/// ```
#[derive(Clone)]
pub struct MockCommandRunner {
    /// Commands in execution order.
    recorded: Arc<RwLock<Vec<CommandSpec>>>,
    /// Configured outputs by tool name.
    outputs: Arc<RwLock<HashMap<String, CommandOutput>>>,
    /// Side effects by tool name.
    hooks: Arc<RwLock<HashMap<String, CommandHook>>>,
    /// If set, the next run fails with this error.
    next_error: Arc<RwLock<Option<ToolError>>>,
}

impl Default for MockCommandRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCommandRunner {
    /// Create a new mock runner.
    pub fn new() -> Self {
        Self {
            recorded: Arc::new(RwLock::new(Vec::new())),
            outputs: Arc::new(RwLock::new(HashMap::new())),
            hooks: Arc::new(RwLock::new(HashMap::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Get all recorded commands.
    pub async fn recorded_commands(&self) -> Vec<CommandSpec> {
        self.recorded.read().await.clone()
    }

    /// Tool names of the recorded commands, in order.
    pub async fn recorded_tools(&self) -> Vec<String> {
        self.recorded
            .read()
            .await
            .iter()
            .map(|spec| spec.tool.clone())
            .collect()
    }

    /// Get the number of commands run.
    pub async fn command_count(&self) -> usize {
        self.recorded.read().await.len()
    }

    /// Whether a command for `tool` was run.
    pub async fn ran(&self, tool: &str) -> bool {
        self.recorded.read().await.iter().any(|spec| spec.tool == tool)
    }

    /// Configure the output returned for every run of `tool`.
    pub async fn set_output(&self, tool: impl Into<String>, output: CommandOutput) {
        self.outputs.write().await.insert(tool.into(), output);
    }

    /// Register a side effect for every run of `tool`.
    pub async fn on_run<F>(&self, tool: impl Into<String>, hook: F)
    where
        F: Fn(&CommandSpec) -> std::io::Result<()> + Send + Sync + 'static,
    {
        self.hooks.write().await.insert(tool.into(), Arc::new(hook));
    }

    /// Configure the next run to fail with the given error.
    pub async fn set_next_error(&self, error: ToolError) {
        *self.next_error.write().await = Some(error);
    }

    /// Take the next error if set.
    async fn take_error(&self) -> Option<ToolError> {
        self.next_error.write().await.take()
    }
}

#[async_trait]
impl CommandRunner for MockCommandRunner {
    fn name(&self) -> &str {
        "mock"
    }

    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ToolError> {
        self.recorded.write().await.push(spec.clone());

        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        let hook = self.hooks.read().await.get(&spec.tool).cloned();
        if let Some(hook) = hook {
            hook(spec)?;
        }

        Ok(self
            .outputs
            .read()
            .await
            .get(&spec.tool)
            .cloned()
            .unwrap_or_else(CommandOutput::ok))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_default_output_is_success() {
        let runner = MockCommandRunner::new();
        let output = runner.run(&CommandSpec::new("x", "x")).await.unwrap();
        assert!(output.success());
        assert_eq!(runner.command_count().await, 1);
        assert!(runner.ran("x").await);
    }

    #[tokio::test]
    async fn test_configured_output() {
        let runner = MockCommandRunner::new();
        runner.set_output("merger", CommandOutput::failed(2, "nope")).await;

        let output = runner.run(&CommandSpec::new("merger", "python")).await.unwrap();
        assert_eq!(output.code, Some(2));
        assert_eq!(output.stderr, "nope");
    }

    #[tokio::test]
    async fn test_hook_runs_with_spec() {
        let dir = tempfile::TempDir::new().unwrap();
        let marker = dir.path().join("marker");
        let runner = MockCommandRunner::new();
        runner
            .on_run("linker", |spec| {
                std::fs::write(PathBuf::from(&spec.args[0]), b"linked")
            })
            .await;

        runner
            .run(&CommandSpec::new("linker", "ln").arg(marker.to_string_lossy()))
            .await
            .unwrap();
        assert_eq!(std::fs::read(&marker).unwrap(), b"linked");
    }

    #[tokio::test]
    async fn test_error_injection_is_consumed() {
        let runner = MockCommandRunner::new();
        runner
            .set_next_error(ToolError::ProgramNotFound {
                program: PathBuf::from("docker"),
            })
            .await;

        assert!(runner.run(&CommandSpec::new("docker", "docker")).await.is_err());
        assert!(runner.run(&CommandSpec::new("docker", "docker")).await.is_ok());
        assert_eq!(runner.recorded_tools().await, vec!["docker", "docker"]);
    }
}
