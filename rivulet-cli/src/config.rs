use anyhow::{Context, Result};
use rivulet::RetryConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Demo runner configuration, loaded from YAML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub logging: LoggingConfig,
    pub timing: TimingConfig,
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `text` or `json`
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Period of interval and timer sources
    pub tick_ms: u64,
    /// Delay before the second subscriber joins the cold demo
    pub second_subscriber_delay_ms: u64,
    /// Start offset of the second merged timer
    pub merge_offset_ms: u64,
    /// How long never-ending demos run before unsubscribing
    pub run_for_ms: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_ms: 1000,
            second_subscriber_delay_ms: 2000,
            merge_offset_ms: 500,
            run_for_ms: 5000,
        }
    }
}

impl TimingConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn second_subscriber_delay(&self) -> Duration {
        Duration::from_millis(self.second_subscriber_delay_ms)
    }

    pub fn merge_offset(&self) -> Duration {
        Duration::from_millis(self.merge_offset_ms)
    }

    pub fn run_for(&self) -> Duration {
        Duration::from_millis(self.run_for_ms)
    }
}

impl DemoConfig {
    /// Load configuration from YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }
}
