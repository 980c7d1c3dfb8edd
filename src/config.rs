//! Solver configuration loaded from JSON.
//!
//! ```json
//! {
//!   "search": { "clone_ceiling": 32, "branch": { "fork_on_first_placement": true } },
//!   "log_level": "debug"
//! }
//! ```
//!
//! Every field is optional; missing ones take their defaults. CLI flags override
//! whatever the file sets.

use crate::error::{Error, Result};
use crate::heuristics::search::SearchConfig;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub search: SearchConfig,
    /// `off`, `error`, `warn`, `info`, `debug` or `trace`
    pub log_level: String,
    pub log_timestamps: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            search: SearchConfig::default(),
            log_level: "info".to_string(),
            log_timestamps: false,
        }
    }
}

impl SolverConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: SolverConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that cannot be clamped into something meaningful
    pub fn validate(&self) -> Result<()> {
        self.level_filter()?;
        if self.search.max_iterations == Some(0) {
            return Err(Error::config("max_iterations must be at least 1"));
        }
        Ok(())
    }

    pub fn level_filter(&self) -> Result<LevelFilter> {
        LevelFilter::from_str(&self.log_level)
            .map_err(|_| Error::config(format!("unknown log level `{}`", self.log_level)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = SolverConfig::from_json(r#"{ "search": { "clone_ceiling": 8 } }"#).unwrap();
        assert_eq!(config.search.clone_ceiling, Some(8));
        assert!(!config.search.branch.relocation);
        assert!(!config.search.branch.fork_on_first_placement);
        assert_eq!(config.search.max_iterations, None);
        assert_eq!(config.level_filter().unwrap(), LevelFilter::Info);
    }

    #[test]
    fn test_empty_object_is_default() {
        let config = SolverConfig::from_json("{}").unwrap();
        assert_eq!(config, SolverConfig::default());
        assert_eq!(config.search.clone_ceiling, None);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            SolverConfig::from_json(r#"{ "log_level": "loud" }"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            SolverConfig::from_json(r#"{ "search": { "max_iterations": 0 } }"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(SolverConfig::from_json("not json"), Err(Error::Json(_))));
    }
}
