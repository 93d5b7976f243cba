use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to parse amr config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("minimum level {min} exceeds maximum level {max}")]
    InvalidLevelRange { min: usize, max: usize },
}

/// Tuning parameters for an adaptation cycle.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmrConfig {
    /// Maximum number of balancing passes. If unset, the bound implied by the number
    /// of tracked nodes is used.
    pub max_iterations: Option<usize>,
    /// Nodes at or below this level are never coarsened.
    pub min_level: Option<usize>,
    /// Nodes at or above this level are never refined.
    pub max_level: Option<usize>,
}

impl AmrConfig {
    /// Parses and validates a config from a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match (self.min_level, self.max_level) {
            (Some(min), Some(max)) if min > max => Err(ConfigError::InvalidLevelRange { min, max }),
            _ => Ok(()),
        }
    }

    /// Iteration guard for a state tracking `num_tracked` nodes.
    pub(crate) fn iteration_limit(&self, num_tracked: usize) -> usize {
        self.max_iterations.unwrap_or(2 * num_tracked + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse() -> eyre::Result<()> {
        let config = AmrConfig::from_toml_str("")?;
        assert_eq!(config, AmrConfig::default());
        assert_eq!(config.iteration_limit(10), 21);

        let config = AmrConfig::from_toml_str(
            r#"
            max_iterations = 4
            min_level = 1
            max_level = 6
            "#,
        )?;
        assert_eq!(config.max_iterations, Some(4));
        assert_eq!(config.min_level, Some(1));
        assert_eq!(config.max_level, Some(6));
        assert_eq!(config.iteration_limit(10), 4);

        Ok(())
    }

    #[test]
    fn invalid() {
        assert!(matches!(
            AmrConfig::from_toml_str("min_level = 5\nmax_level = 2"),
            Err(ConfigError::InvalidLevelRange { min: 5, max: 2 })
        ));
        assert!(matches!(
            AmrConfig::from_toml_str("max_level = \"deep\""),
            Err(ConfigError::Parse(_))
        ));
    }
}
