//! Trait definitions for the tools module.

use async_trait::async_trait;

use super::error::ToolError;
use super::types::{CommandOutput, CommandSpec};

/// Runs external commands to completion.
///
/// A non-zero exit is not an error at this level: the output carries the
/// exit code and callers decide what it means.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Returns the name of this runner implementation.
    fn name(&self) -> &str;

    /// Runs the command and captures its output.
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ToolError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoRunner;

    #[async_trait]
    impl CommandRunner for EchoRunner {
        fn name(&self) -> &str {
            "echo"
        }

        async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ToolError> {
            Ok(CommandOutput {
                code: Some(0),
                stdout: spec.args.join(" "),
                ..Default::default()
            })
        }
    }

    #[tokio::test]
    async fn test_runner_as_trait_object() {
        let runner: Box<dyn CommandRunner> = Box::new(EchoRunner);
        let spec = CommandSpec::new("echo", "echo").args(["a", "b"]);
        let output = runner.run(&spec).await.unwrap();
        assert_eq!(runner.name(), "echo");
        assert_eq!(output.stdout, "a b");
        assert!(output.success());
    }
}
