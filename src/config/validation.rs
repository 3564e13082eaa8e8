use crate::config::types::JobConfig;
use crate::ConfigError;

/// Validates a crawl job before any network call is made
///
/// Every rule here is fail-fast: a job that passes validation can be
/// handed to the orchestrator without further credential or field checks.
pub fn validate(config: &JobConfig) -> Result<(), ConfigError> {
    if config.query.trim().is_empty() {
        return Err(ConfigError::Validation(
            "query must be a non-empty string".to_string(),
        ));
    }

    if config.sources.is_empty() {
        return Err(ConfigError::Validation(
            "sources must name at least one source".to_string(),
        ));
    }

    if config.max_results == Some(0) {
        return Err(ConfigError::Validation(
            "max-results must be a positive integer or absent".to_string(),
        ));
    }

    if config.csv_file.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "csv-file cannot be empty".to_string(),
        ));
    }

    if config.log_file.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "log-file cannot be empty".to_string(),
        ));
    }

    if config.needs_api_credentials() {
        if config.api_key.as_deref().unwrap_or("").is_empty() {
            return Err(ConfigError::MissingCredential(
                "api-key is required when an API-backed source is selected".to_string(),
            ));
        }
        if config.cse_id.as_deref().unwrap_or("").is_empty() {
            return Err(ConfigError::MissingCredential(
                "cse-id is required when an API-backed source is selected".to_string(),
            ));
        }
    }

    Ok(())
}
