//! Configuration for the tools module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A program plus the fixed leading arguments it is always invoked with
/// (typically an interpreter and a script path).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCommand {
    pub program: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
}

impl ToolCommand {
    pub fn new(program: impl Into<PathBuf>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Configuration for the file linker and merger tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Resolves identifiers to raw FASTQ files: `<cmd> <list file> <output dir>`.
    #[serde(default = "default_file_linker")]
    pub file_linker: ToolCommand,

    /// Concatenates FASTQ files per plan row: `<cmd> -f <plan> -d <delim> <dir>`.
    #[serde(default = "default_merger")]
    pub merger: ToolCommand,

    /// Timeout applied to every external command. No timeout when unset.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_file_linker() -> ToolCommand {
    ToolCommand::new("python2", &["/mnt/nas/MiSeq_Backup/file_linker.py"])
}

fn default_merger() -> ToolCommand {
    ToolCommand::new(
        "python",
        &["/mnt/nas/Redmine/OLCRedmineAutomator/automators/merger.py"],
    )
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            file_linker: default_file_linker(),
            merger: default_merger(),
            timeout_secs: None,
        }
    }
}

/// Configuration for the containerized assembly pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyConfig {
    /// Path to the docker binary.
    #[serde(default = "default_docker_path")]
    pub docker_path: PathBuf,

    /// Name given to the assembly container; removed before and after each run.
    #[serde(default = "default_container_name")]
    pub container_name: String,

    /// Image tag of the assembly pipeline.
    #[serde(default = "default_image")]
    pub image: String,

    /// Host directory mounted at `/spadesfiles`.
    #[serde(default = "default_spades_files_dir")]
    pub spades_files_dir: PathBuf,

    /// Host directory with reference files, mounted at `/pipelinefiles`.
    #[serde(default = "default_pipeline_files_dir")]
    pub pipeline_files_dir: PathBuf,

    /// Command run inside the container.
    #[serde(default = "default_entrypoint")]
    pub entrypoint: String,

    /// User (uid) the container runs as. Resolved with `id -u` when unset.
    #[serde(
        default,
        deserialize_with = "crate::config::de::option_string_or_number"
    )]
    pub user: Option<String>,
}

fn default_docker_path() -> PathBuf {
    PathBuf::from("docker")
}

fn default_container_name() -> String {
    "spadespipeline".to_string()
}

fn default_image() -> String {
    "pipeline:0.1.5".to_string()
}

fn default_spades_files_dir() -> PathBuf {
    PathBuf::from("/mnt/nas/Adam/spadespipeline/OLCspades/")
}

fn default_pipeline_files_dir() -> PathBuf {
    PathBuf::from("/mnt/nas/Adam/assemblypipeline/")
}

fn default_entrypoint() -> String {
    "OLCspades.py".to_string()
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            docker_path: default_docker_path(),
            container_name: default_container_name(),
            image: default_image(),
            spades_files_dir: default_spades_files_dir(),
            pipeline_files_dir: default_pipeline_files_dir(),
            entrypoint: default_entrypoint(),
            user: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tools_config() {
        let config = ToolsConfig::default();
        assert_eq!(config.file_linker.program, PathBuf::from("python2"));
        assert_eq!(config.merger.args.len(), 1);
        assert!(config.timeout_secs.is_none());
    }

    #[test]
    fn test_default_assembly_config() {
        let config = AssemblyConfig::default();
        assert_eq!(config.docker_path, PathBuf::from("docker"));
        assert_eq!(config.container_name, "spadespipeline");
        assert_eq!(config.image, "pipeline:0.1.5");
        assert!(config.user.is_none());
    }

    #[test]
    fn test_numeric_assembly_user() {
        let config: AssemblyConfig = toml::from_str("user = 1000").unwrap();
        assert_eq!(config.user.as_deref(), Some("1000"));
    }

    #[test]
    fn test_partial_tool_command_from_toml() {
        let config: ToolsConfig = toml::from_str(
            r#"
timeout_secs = 600

[merger]
program = "/usr/local/bin/fastq-merge"
"#,
        )
        .unwrap();
        assert_eq!(config.timeout_secs, Some(600));
        assert_eq!(config.merger.program, PathBuf::from("/usr/local/bin/fastq-merge"));
        assert!(config.merger.args.is_empty());
        assert_eq!(config.file_linker, default_file_linker());
    }
}
