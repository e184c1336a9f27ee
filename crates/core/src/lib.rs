pub mod config;
pub mod pipeline;
pub mod plan;
pub mod staging;
pub mod testing;
pub mod ticket;
pub mod tools;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, RedmineConfig,
    SanitizedConfig, StatusIdsConfig,
};
pub use pipeline::{MergePipeline, MergeRequest, PipelineError, PipelineOutcome, Stage, WorkLayout};
pub use plan::{MergePlan, PlanConfig, PlanError};
pub use staging::{StagingError, StorageConfig};
pub use ticket::{RedmineClient, TicketClient, TicketClientError, TicketId, TicketStatus};
pub use tools::{
    AssemblyConfig, CommandRunner, ExternalTools, ProcessRunner, ToolError, ToolsConfig,
};
