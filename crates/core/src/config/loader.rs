use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix for environment variable overrides, e.g. `SEQMERGE_REDMINE__API_KEY`.
pub const ENV_PREFIX: &str = "SEQMERGE_";

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[redmine]
url = "https://redmine.example.org"
api_key = "abc"

[storage]
results_dir = "/data/results"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.storage.results_dir.to_str().unwrap(), "/data/results");
    }

    #[test]
    fn test_load_config_from_str_missing_redmine() {
        let toml = r#"
[storage]
backup_dir = "/backup"
"#;
        let result = load_config_from_str(toml);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/seqmerge.toml"));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_config_from_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "seqmerge.toml",
                r#"
[redmine]
url = "http://127.0.0.1:3000"
api_key = "from-file"
timeout_secs = 15
"#,
            )?;

            let config = load_config(Path::new("seqmerge.toml")).map_err(|e| e.to_string())?;
            assert_eq!(config.redmine.url, "http://127.0.0.1:3000");
            assert_eq!(config.redmine.timeout_secs, 15);
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file_values() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "seqmerge.toml",
                r#"
[redmine]
url = "http://127.0.0.1:3000"
api_key = "from-file"

[assembly]
image = "pipeline:0.1.5"
"#,
            )?;
            jail.set_env("SEQMERGE_REDMINE__API_KEY", "123456");
            jail.set_env("SEQMERGE_REDMINE__TIMEOUT_SECS", "5");
            jail.set_env("SEQMERGE_ASSEMBLY__USER", "1000");

            let config = load_config(Path::new("seqmerge.toml")).map_err(|e| e.to_string())?;
            assert_eq!(config.redmine.url, "http://127.0.0.1:3000");
            assert_eq!(config.redmine.api_key, "123456");
            assert_eq!(config.redmine.timeout_secs, 5);
            assert_eq!(config.assembly.user.as_deref(), Some("1000"));
            assert_eq!(config.assembly.image, "pipeline:0.1.5");
            Ok(())
        });
    }

    #[test]
    fn test_env_override_with_wrong_type_fails() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "seqmerge.toml",
                "[redmine]\nurl = \"http://127.0.0.1:3000\"\napi_key = \"k\"\n",
            )?;
            jail.set_env("SEQMERGE_REDMINE__TIMEOUT_SECS", "soon");

            let err = load_config(Path::new("seqmerge.toml")).unwrap_err();
            assert!(matches!(err, ConfigError::ParseError(_)));
            Ok(())
        });
    }
}
