//! Configuration types for lookout.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Library configuration loaded from a YAML file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AutomationConfig {
    /// Template asset settings
    pub assets: AssetSettings,
    /// Detection settings
    pub detection: DetectionSettings,
}

impl AutomationConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: AutomationConfig =
            serde_yaml::from_str(yaml).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        self.detection.validate()
    }
}

/// Template asset settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AssetSettings {
    /// Directories searched for template images, in priority order
    pub search_dirs: Vec<PathBuf>,
}

/// Detection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionSettings {
    /// Default wait timeout in milliseconds
    pub default_timeout_ms: u64,
    /// Default polling interval in milliseconds
    pub default_poll_interval_ms: u64,
    /// Mutual overlap fraction above which two matches count as the same
    /// screen region
    pub min_overlap: f64,
    /// Margin in pixels added around a previous match when re-probing an
    /// element's state
    pub reprobe_margin_px: u32,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            default_timeout_ms: 30_000,
            default_poll_interval_ms: 500,
            min_overlap: 0.9,
            reprobe_margin_px: 15,
        }
    }
}

impl DetectionSettings {
    /// Default wait timeout as a [`Duration`].
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }

    /// Default polling interval as a [`Duration`].
    pub fn default_poll_interval(&self) -> Duration {
        Duration::from_millis(self.default_poll_interval_ms)
    }

    /// Validate settings values.
    pub fn validate(&self) -> Result<()> {
        if self.default_timeout_ms == 0 {
            return Err(Error::Config(
                "detection.default_timeout_ms must be > 0".to_string(),
            ));
        }
        if self.default_poll_interval_ms == 0 {
            return Err(Error::Config(
                "detection.default_poll_interval_ms must be > 0".to_string(),
            ));
        }
        if self.default_poll_interval_ms > self.default_timeout_ms {
            return Err(Error::Config(
                "detection.default_poll_interval_ms must not exceed default_timeout_ms"
                    .to_string(),
            ));
        }
        if self.min_overlap <= 0.0 || self.min_overlap > 1.0 {
            return Err(Error::Config(
                "detection.min_overlap must be in (0, 1]".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AutomationConfig::default();
        assert!(config.assets.search_dirs.is_empty());
        assert_eq!(config.detection.default_timeout_ms, 30_000);
        assert_eq!(config.detection.default_poll_interval_ms, 500);
        assert_eq!(config.detection.reprobe_margin_px, 15);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
assets:
  search_dirs:
    - /opt/app/templates
    - /opt/app/templates/win11

detection:
  default_timeout_ms: 10000
  default_poll_interval_ms: 250
  min_overlap: 0.8
  reprobe_margin_px: 20
"#;

        let config = AutomationConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.assets.search_dirs.len(), 2);
        assert_eq!(
            config.assets.search_dirs[0],
            PathBuf::from("/opt/app/templates")
        );
        assert_eq!(config.detection.default_timeout_ms, 10_000);
        assert_eq!(config.detection.default_poll_interval_ms, 250);
        assert!((config.detection.min_overlap - 0.8).abs() < f64::EPSILON);
        assert_eq!(config.detection.reprobe_margin_px, 20);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = r#"
assets:
  search_dirs:
    - /opt/app/templates
"#;

        let config = AutomationConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.detection.default_timeout_ms, 30_000);
    }

    #[test]
    fn test_invalid_zero_timeout() {
        let mut config = AutomationConfig::default();
        config.detection.default_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_zero_interval() {
        let mut config = AutomationConfig::default();
        config.detection.default_poll_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_interval_exceeding_timeout() {
        let mut config = AutomationConfig::default();
        config.detection.default_timeout_ms = 100;
        config.detection.default_poll_interval_ms = 200;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_min_overlap() {
        let mut config = AutomationConfig::default();
        config.detection.min_overlap = 0.0;
        assert!(config.validate().is_err());
        config.detection.min_overlap = 1.5;
        assert!(config.validate().is_err());
        config.detection.min_overlap = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_duration_accessors() {
        let settings = DetectionSettings::default();
        assert_eq!(settings.default_timeout(), Duration::from_secs(30));
        assert_eq!(settings.default_poll_interval(), Duration::from_millis(500));
    }
}
