//! Configuration for the path engine

use serde::{Deserialize, Serialize};

/// Path engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Calculation limits
    pub calc: CalcConfig,

    /// Metrics configuration
    pub metrics: MetricsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "path-engine".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            calc: CalcConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

/// Calculation limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalcConfig {
    /// Passes before a calculation gives up with `telFAILED_PROCESSING`
    pub max_passes: usize,

    /// Longest explicit path accepted
    pub max_path_steps: usize,
}

impl Default for CalcConfig {
    fn default() -> Self {
        Self {
            max_passes: 1000,
            max_path_steps: 8,
        }
    }
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Record metrics
    pub enabled: bool,

    /// Metric name prefix
    pub namespace: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            namespace: "path_engine".to_string(),
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(passes) = std::env::var("PATH_ENGINE_MAX_PASSES") {
            config.calc.max_passes = passes
                .parse()
                .map_err(|e| crate::Error::Config(format!("PATH_ENGINE_MAX_PASSES: {}", e)))?;
        }

        if let Ok(steps) = std::env::var("PATH_ENGINE_MAX_PATH_STEPS") {
            config.calc.max_path_steps = steps
                .parse()
                .map_err(|e| crate::Error::Config(format!("PATH_ENGINE_MAX_PATH_STEPS: {}", e)))?;
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> crate::Result<()> {
        if self.calc.max_passes == 0 {
            return Err(crate::Error::Config("max_passes must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service_name, "path-engine");
        assert_eq!(config.calc.max_passes, 1000);
        assert_eq!(config.calc.max_path_steps, 8);
        assert!(config.metrics.enabled);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
service_name = "router"
service_version = "1.2.3"

[calc]
max_passes = 25
max_path_steps = 4

[metrics]
enabled = false
namespace = "router"
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.service_name, "router");
        assert_eq!(config.calc.max_passes, 25);
        assert_eq!(config.calc.max_path_steps, 4);
        assert!(!config.metrics.enabled);
    }

    #[test]
    fn test_from_file_rejects_zero_passes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
service_name = "router"
service_version = "1.2.3"

[calc]
max_passes = 0
max_path_steps = 4

[metrics]
enabled = true
namespace = "router"
"#
        )
        .unwrap();

        assert!(matches!(
            Config::from_file(file.path()),
            Err(crate::Error::Config(_))
        ));
    }
}
