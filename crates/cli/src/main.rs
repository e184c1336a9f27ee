use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use seqmerge_core::{
    load_config, validate_config, Config, MergePipeline, MergeRequest, PipelineOutcome,
    ProcessRunner, RedmineClient, SanitizedConfig, TicketId,
};

/// Merge FASTQ files requested through a Redmine ticket and assemble them.
#[derive(Debug, Parser)]
#[command(name = "seqmerge", version, about)]
struct Cli {
    /// Configuration file.
    #[arg(
        long,
        global = true,
        env = "SEQMERGE_CONFIG",
        default_value = "config.toml"
    )]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the merge for one ticket.
    Run(RunArgs),
    /// Load and validate the configuration, then print it with secrets redacted.
    Check,
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Redmine issue id.
    #[arg(long)]
    ticket: TicketId,

    /// Scratch directory for this ticket.
    #[arg(long)]
    work_dir: PathBuf,

    /// File holding the ticket description.
    #[arg(long)]
    description: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("Fatal error: {:#}", e);
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<i32> {
    let config = load(&cli.config)?;

    match cli.command {
        Command::Check => check(&config),
        Command::Run(args) => run_merge(&config, args).await,
    }
}

fn load(path: &Path) -> Result<Config> {
    info!("Loading configuration from {:?}", path);
    let config =
        load_config(path).with_context(|| format!("Failed to load config from {:?}", path))?;
    validate_config(&config).context("Configuration validation failed")?;
    Ok(config)
}

fn check(config: &Config) -> Result<i32> {
    RedmineClient::new(config.redmine.clone()).context("Failed to create Redmine client")?;

    let sanitized = SanitizedConfig::from(config);
    let json = serde_json::to_string_pretty(&sanitized).context("Failed to render config")?;
    println!("{}", json);
    info!("Configuration OK");
    Ok(0)
}

async fn run_merge(config: &Config, args: RunArgs) -> Result<i32> {
    let tickets =
        RedmineClient::new(config.redmine.clone()).context("Failed to create Redmine client")?;
    info!("Using Redmine at {}", config.redmine.url);

    let runner = ProcessRunner::new(config.tools.timeout_secs.map(Duration::from_secs));
    let pipeline = MergePipeline::from_config(Arc::new(tickets), Arc::new(runner), config);

    let mut request = MergeRequest::new(args.ticket, args.work_dir);
    if let Some(path) = &args.description {
        let description = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read description from {:?}", path))?;
        request = request.with_description(description);
    }

    let outcome = pipeline.run(&request).await;
    println!(
        "{}",
        serde_json::to_string(&outcome).context("Failed to render outcome")?
    );

    Ok(exit_code(&outcome))
}

fn exit_code(outcome: &PipelineOutcome) -> i32 {
    if outcome.is_completed() {
        0
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use seqmerge_core::Stage;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from([
            "seqmerge",
            "--config",
            "/etc/seqmerge.toml",
            "run",
            "--ticket",
            "42",
            "--work-dir",
            "/work/42",
        ])
        .unwrap();

        assert_eq!(cli.config, PathBuf::from("/etc/seqmerge.toml"));
        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.ticket, 42);
                assert_eq!(args.work_dir, PathBuf::from("/work/42"));
                assert!(args.description.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_config_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["seqmerge", "check", "--config", "other.toml"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("other.toml"));
        assert!(matches!(cli.command, Command::Check));
    }

    #[test]
    fn test_run_requires_ticket() {
        assert!(Cli::try_parse_from(["seqmerge", "run", "--work-dir", "/w"]).is_err());
        assert!(Cli::try_parse_from(["seqmerge", "run", "--ticket", "x", "--work-dir", "/w"]).is_err());
    }

    #[test]
    fn test_exit_codes() {
        let halted = PipelineOutcome::Halted {
            ticket_id: 1,
            stage: Stage::CollectMerged,
            reason: "none".to_string(),
        };
        assert_eq!(exit_code(&halted), 1);
    }

    #[test]
    fn test_load_rejects_invalid_config() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[redmine]\nurl = \"ftp://redmine.local\"\napi_key = \"k\"\n",
        )
        .unwrap();

        assert!(load(&path).is_err());
        assert!(load(&dir.path().join("missing.toml")).is_err());
    }
}
