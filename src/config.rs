use serde::{Deserialize, Deserializer};
use std::{path::Path, time::Duration};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Couldn't read configuration file")]
    Io(#[from] std::io::Error),

    #[error("Couldn't parse configuration: {}", .0)]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {}", .0)]
    Invalid(&'static str),
}

/// Driver settings.
///
/// Every field has a default so a YAML file only needs to name
/// what differs, e.g.:
///
/// ```yaml
/// device_name: X-Touch-Ext
/// hold_ms: 800
/// speed_thresholds: [20.0, 1000.0]
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Substring looked up in MIDI port names during discovery.
    pub device_name: String,
    /// MIDI client name, also used to leave our own ports out of the scan.
    pub client_name: String,

    #[serde(rename = "hold_ms", deserialize_with = "millis")]
    pub hold_duration: Duration,
    #[serde(rename = "double_press_ms", deserialize_with = "millis")]
    pub double_press_window: Duration,

    /// Input drain cadence.
    #[serde(rename = "fast_period_ms", deserialize_with = "millis")]
    pub fast_period: Duration,
    /// Blink cadence.
    #[serde(rename = "slow_period_ms", deserialize_with = "millis")]
    pub slow_period: Duration,
    #[serde(rename = "vu_refresh_ms", deserialize_with = "millis")]
    pub vu_refresh_period: Duration,

    /// Ascending rotary velocity thresholds, in ticks per second.
    pub speed_thresholds: Vec<f64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device_name: "X-Touch-Ext".to_string(),
            client_name: "xtouch-ext-driver".to_string(),
            hold_duration: Duration::from_secs(1),
            double_press_window: Duration::from_millis(500),
            fast_period: Duration::from_millis(10),
            slow_period: Duration::from_millis(100),
            vu_refresh_period: Duration::from_millis(100),
            speed_thresholds: vec![20.0, 1000.0],
        }
    }
}

impl Config {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, Error> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;

        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.fast_period.is_zero() || self.slow_period.is_zero() {
            return Err(Error::Invalid("cycle periods must be non-zero"));
        }

        if self.vu_refresh_period.is_zero() {
            return Err(Error::Invalid("VU refresh period must be non-zero"));
        }

        if self.speed_thresholds.iter().any(|t| !t.is_finite()) {
            return Err(Error::Invalid("speed thresholds must be finite"));
        }

        if self.speed_thresholds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::Invalid("speed thresholds must be ascending"));
        }

        Ok(())
    }
}

fn millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    u64::deserialize(deserializer).map(Duration::from_millis)
}
