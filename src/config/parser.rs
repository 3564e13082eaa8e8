use crate::config::types::JobConfig;
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::Path;

/// Parses a TOML job file without validating it
///
/// Command-line overrides are applied between parsing and validation, so
/// the two steps are exposed separately; use [`load_config`] when there is
/// nothing to override.
pub fn parse_config(path: &Path) -> Result<JobConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: JobConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Loads and validates a job file in one step
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use paperfetch::config::load_config;
///
/// let config = load_config(Path::new("job.toml")).unwrap();
/// println!("Query: {}", config.query);
/// ```
pub fn load_config(path: &Path) -> Result<JobConfig, ConfigError> {
    let config = parse_config(path)?;
    validate(&config)?;
    Ok(config)
}
