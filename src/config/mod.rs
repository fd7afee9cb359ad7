mod defaults;
mod types;

pub use types::*;

use crate::error::ConfigError;
use defaults::*;
use std::path::Path;

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            report_dir: default_report_dir(),
            scoring: ScoringConfig::default(),
            template_lookup: TemplateLookup::default(),
            strict_association_counts: false,
            retry: RetryConfig::default(),
        }
    }
}

impl Config {
    /// Load config from a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Validate the config
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != default_version() {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {} (expected {})",
                self.version,
                default_version()
            )));
        }

        let max_score = self.scoring.max_score;
        if !max_score.is_finite() || max_score <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "scoring.max_score must be a positive number, got {}",
                max_score
            )));
        }

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
