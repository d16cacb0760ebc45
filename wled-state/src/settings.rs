//! Persisted device settings
//!
//! Devices paired by older releases stored the address under `ip` and the
//! poll interval in seconds under `pollInterval`. Both are read as fallbacks
//! when loading and normalized once into a [`DeviceConfig`]; the canonical
//! keys are `address` and `polling_interval` (milliseconds).

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::config::EngineConfig;

/// Settings keys understood by the engine
pub mod keys {
    pub const ADDRESS: &str = "address";
    pub const IP: &str = "ip";
    pub const POLLING_INTERVAL: &str = "polling_interval";
    pub const POLL_INTERVAL_SECS: &str = "pollInterval";
    pub const FXCOUNT: &str = "fxcount";
    pub const PALCOUNT: &str = "palcount";
    pub const PRESETCOUNT: &str = "presetcount";

    /// Keys whose change requires re-polling and re-fetching metadata
    pub const CONNECTION: [&str; 4] = [ADDRESS, IP, POLLING_INTERVAL, POLL_INTERVAL_SECS];
}

/// True if any changed key affects how the device is reached
pub fn touches_connection<S: AsRef<str>>(changed_keys: &[S]) -> bool {
    changed_keys
        .iter()
        .any(|key| keys::CONNECTION.contains(&key.as_ref()))
}

/// Settings object as persisted by the host
///
/// Numbers may arrive as JSON numbers or numeric strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceSettings {
    #[serde(deserialize_with = "lenient_string")]
    pub address: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub ip: Option<String>,
    /// Poll interval in milliseconds
    #[serde(deserialize_with = "lenient_number")]
    pub polling_interval: Option<f64>,
    /// Legacy poll interval in seconds
    #[serde(rename = "pollInterval", deserialize_with = "lenient_number")]
    pub poll_interval_secs: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub fxcount: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub palcount: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub presetcount: Option<f64>,
}

impl DeviceSettings {
    /// Parse a host settings object, ignoring keys it does not know
    pub fn from_map(settings: &Map<String, Value>) -> Self {
        match serde_json::from_value(Value::Object(settings.clone())) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "Unreadable device settings, using defaults");
                Self::default()
            }
        }
    }

    /// Configured address, preferring the canonical key
    pub fn address(&self) -> Option<&str> {
        [self.address.as_deref(), self.ip.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|a| !a.is_empty())
    }

    /// Poll interval, preferring milliseconds over the legacy seconds key
    pub fn poll_interval(&self) -> Option<Duration> {
        let positive = |v: &f64| v.is_finite() && *v > 0.0;

        self.polling_interval
            .filter(positive)
            .map(|ms| Duration::from_millis(ms.round() as u64))
            .or_else(|| {
                self.poll_interval_secs
                    .filter(positive)
                    .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            })
            .filter(|d| !d.is_zero())
    }

    /// Resolve the effective engine-side configuration for this device
    pub fn normalize(&self, config: &EngineConfig) -> DeviceConfig {
        let max_id = |count: Option<f64>| match count {
            Some(count) if count.is_finite() && count >= 1.0 => count.trunc() as i64 - 1,
            _ => config.default_max_id,
        };

        DeviceConfig {
            address: self.address().map(str::to_string),
            poll_interval: self.poll_interval().unwrap_or(config.base_poll_interval),
            max_effect_id: max_id(self.fxcount),
            max_palette_id: max_id(self.palcount),
            max_preset_id: max_id(self.presetcount),
        }
    }
}

/// Normalized per-device configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    pub address: Option<String>,
    pub poll_interval: Duration,
    pub max_effect_id: i64,
    pub max_palette_id: i64,
    pub max_preset_id: i64,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}
