use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Redmine URL is an absolute http(s) URL and the API key is set
/// - Spreadsheet column names are set and distinct
/// - Assembly container name and image are set
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Redmine validation
    let url = reqwest::Url::parse(&config.redmine.url).map_err(|e| {
        ConfigError::ValidationError(format!("redmine.url is not a valid URL: {}", e))
    })?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::ValidationError(format!(
            "redmine.url must use http or https, got {}",
            url.scheme()
        )));
    }
    if config.redmine.api_key.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "redmine.api_key cannot be empty".to_string(),
        ));
    }

    // Plan validation
    if config.plan.name_column.is_empty() || config.plan.merge_column.is_empty() {
        return Err(ConfigError::ValidationError(
            "plan column names cannot be empty".to_string(),
        ));
    }
    if config.plan.name_column == config.plan.merge_column {
        return Err(ConfigError::ValidationError(
            "plan.name_column and plan.merge_column must differ".to_string(),
        ));
    }

    // Assembly validation
    if config.assembly.container_name.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "assembly.container_name cannot be empty".to_string(),
        ));
    }
    if config.assembly.image.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "assembly.image cannot be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;

    fn base_config() -> Config {
        load_config_from_str(
            r#"
[redmine]
url = "https://redmine.example.org"
api_key = "abc"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&base_config()).is_ok());
    }

    #[test]
    fn test_validate_bad_url_fails() {
        let mut config = base_config();
        config.redmine.url = "not a url".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_non_http_scheme_fails() {
        let mut config = base_config();
        config.redmine.url = "ftp://redmine.example.org".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_empty_api_key_fails() {
        let mut config = base_config();
        config.redmine.api_key = "  ".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_identical_columns_fail() {
        let mut config = base_config();
        config.plan.merge_column = config.plan.name_column.clone();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_empty_container_name_fails() {
        let mut config = base_config();
        config.assembly.container_name = String::new();
        assert!(validate_config(&config).is_err());
    }
}
