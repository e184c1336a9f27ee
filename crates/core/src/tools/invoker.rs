//! Invocations of the external linker, merger and assembly tools.

use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use super::config::{AssemblyConfig, ToolsConfig};
use super::error::ToolError;
use super::traits::CommandRunner;
use super::types::{CommandOutput, CommandSpec};

/// Mount point of the merged reads inside the assembly container.
pub const SEQUENCES_MOUNT: &str = "/sequences";
/// Mount point of the SPAdes support files inside the assembly container.
pub const SPADES_FILES_MOUNT: &str = "/spadesfiles";
/// Mount point of the reference files inside the assembly container.
pub const PIPELINE_FILES_MOUNT: &str = "/pipelinefiles";

/// Builds and runs the external tool command lines.
pub struct ExternalTools<R: CommandRunner> {
    runner: Arc<R>,
    tools: ToolsConfig,
    assembly: AssemblyConfig,
}

impl<R: CommandRunner> ExternalTools<R> {
    pub fn new(runner: Arc<R>, tools: ToolsConfig, assembly: AssemblyConfig) -> Self {
        Self {
            runner,
            tools,
            assembly,
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// `<linker> <list file> <output dir>`
    pub fn link_files_command(&self, list_path: &Path, output_dir: &Path) -> CommandSpec {
        CommandSpec::new("file_linker", &self.tools.file_linker.program)
            .args(self.tools.file_linker.args.iter().cloned())
            .arg(list_path.to_string_lossy())
            .arg(output_dir.to_string_lossy())
    }

    /// `<merger> -f <plan file> -d <delimiter> <work dir>`
    pub fn merge_files_command(
        &self,
        plan_path: &Path,
        delimiter: char,
        work_dir: &Path,
    ) -> CommandSpec {
        CommandSpec::new("merger", &self.tools.merger.program)
            .args(self.tools.merger.args.iter().cloned())
            .arg("-f")
            .arg(plan_path.to_string_lossy())
            .arg("-d")
            .arg(delimiter.to_string())
            .arg(work_dir.to_string_lossy())
    }

    /// `docker rm -f <container>`
    pub fn remove_container_command(&self) -> CommandSpec {
        CommandSpec::new("docker", &self.assembly.docker_path).args([
            "rm",
            "-f",
            self.assembly.container_name.as_str(),
        ])
    }

    /// `docker run -i -u <user> -v ... --name <container> <image> <entrypoint> /sequences -r /pipelinefiles`
    pub fn assembly_command(&self, sequences_dir: &Path, user: &str) -> CommandSpec {
        let volume = |host: &Path, mount: &str| format!("{}:{}", host.display(), mount);

        CommandSpec::new("assembly", &self.assembly.docker_path)
            .args(["run", "-i", "-u", user])
            .args([
                "-v".to_string(),
                volume(&self.assembly.spades_files_dir, SPADES_FILES_MOUNT),
                "-v".to_string(),
                volume(&self.assembly.pipeline_files_dir, PIPELINE_FILES_MOUNT),
                "-v".to_string(),
                volume(sequences_dir, SEQUENCES_MOUNT),
            ])
            .args(["--name", self.assembly.container_name.as_str()])
            .arg(self.assembly.image.as_str())
            .arg(self.assembly.entrypoint.as_str())
            .args([SEQUENCES_MOUNT, "-r", PIPELINE_FILES_MOUNT])
    }

    /// Runs a command and fails on a non-zero exit.
    async fn run_checked(&self, spec: &CommandSpec) -> Result<CommandOutput, ToolError> {
        let output = self.runner.run(spec).await?;
        if !output.success() {
            return Err(ToolError::non_zero_exit(
                spec.tool.clone(),
                output.code,
                &output.stderr,
            ));
        }
        Ok(output)
    }

    /// Links the raw reads of every listed identifier into `output_dir`.
    pub async fn link_files(&self, list_path: &Path, output_dir: &Path) -> Result<(), ToolError> {
        let output = self
            .run_checked(&self.link_files_command(list_path, output_dir))
            .await?;
        info!(duration_ms = output.duration_ms, "File linker finished");
        Ok(())
    }

    /// Merges the linked reads according to the canonical plan file.
    pub async fn merge_files(
        &self,
        plan_path: &Path,
        delimiter: char,
        work_dir: &Path,
    ) -> Result<(), ToolError> {
        let output = self
            .run_checked(&self.merge_files_command(plan_path, delimiter, work_dir))
            .await?;
        info!(duration_ms = output.duration_ms, "Merger finished");
        Ok(())
    }

    /// Force-removes the assembly container.
    ///
    /// Docker exits non-zero when no such container exists; that is not an
    /// error here, so calling this repeatedly is safe.
    pub async fn remove_container(&self) -> Result<(), ToolError> {
        let output = self.runner.run(&self.remove_container_command()).await?;
        if !output.success() {
            warn!(
                container = %self.assembly.container_name,
                code = ?output.code,
                stderr = %output.stderr.trim(),
                "Container removal reported failure, continuing"
            );
        }
        Ok(())
    }

    /// User the container runs as: configured value, else `id -u`.
    pub async fn resolve_user(&self) -> Result<String, ToolError> {
        if let Some(user) = &self.assembly.user {
            return Ok(user.clone());
        }

        let spec = CommandSpec::new("id", "id").arg("-u");
        let output = self.run_checked(&spec).await?;
        let uid = output.stdout.trim();
        if uid.is_empty() || !uid.chars().all(|c| c.is_ascii_digit()) {
            return Err(ToolError::UnexpectedOutput {
                tool: "id".to_string(),
                reason: format!("expected a numeric uid, got '{}'", uid),
            });
        }
        Ok(uid.to_string())
    }

    /// Runs the assembly container once against `sequences_dir`.
    pub async fn run_assembly(&self, sequences_dir: &Path) -> Result<(), ToolError> {
        let user = self.resolve_user().await?;
        let output = self
            .run_checked(&self.assembly_command(sequences_dir, &user))
            .await?;
        info!(duration_ms = output.duration_ms, "Assembly container finished");
        Ok(())
    }

    /// Removes any stale container, runs the assembly, then removes the
    /// container again whether or not the assembly succeeded.
    pub async fn assemble(&self, sequences_dir: &Path) -> Result<(), ToolError> {
        self.remove_container().await?;
        let result = self.run_assembly(sequences_dir).await;
        let cleanup = self.remove_container().await;

        result?;
        cleanup
    }
}
