//! Job configuration for paperfetch
//!
//! This module handles loading, parsing, and validating the TOML job file.
//! Command-line overrides are merged by the binary between [`parse_config`]
//! and [`validate`].
//!
//! # Example
//!
//! ```no_run
//! use paperfetch::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("job.toml")).unwrap();
//! println!("Harvesting '{}' from {} sources", config.query, config.sources.len());
//! ```

mod parser;
mod types;
mod validation;

pub use parser::{load_config, parse_config};
pub use types::JobConfig;
pub use validation::validate;
