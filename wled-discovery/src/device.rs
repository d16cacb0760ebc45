//! Device identity and pairing lookups.
//!
//! A paired device is identified by its MAC address when the controller
//! reports one, falling back to an id derived from its IP address. Both forms
//! are fixed at pairing time.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use wled_client::types::decode;
use wled_client::{paths, DeviceInfo, Transport};

use crate::error::{DiscoveryError, Result};
use crate::registry::DiscoveryRegistry;
use crate::Announcement;

/// Timeout used for `/json/info` lookups while pairing
pub const PAIRING_TIMEOUT: Duration = Duration::from_secs(3);

/// Default poll interval written into fresh pairing settings, in milliseconds
const DEFAULT_POLL_INTERVAL_MS: u64 = 5000;

/// Stock name WLED ships with; treated as "no custom name"
const STOCK_NAME: &str = "WLED";

/// Stable identifier of a paired WLED device
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceId(String);

impl DeviceId {
    /// Wrap an already-derived id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// `wled-<mac>` with separators stripped and lowercased
    ///
    /// Returns `None` for an empty MAC.
    pub fn from_mac(mac: &str) -> Option<Self> {
        let normalized: String = mac
            .chars()
            .filter(|c| *c != ':' && *c != '-')
            .collect::<String>()
            .to_lowercase();

        if normalized.is_empty() {
            None
        } else {
            Some(Self(format!("wled-{}", normalized)))
        }
    }

    /// `wled-<address with dots replaced by dashes>`
    pub fn from_address(address: &str) -> Self {
        Self(format!("wled-{}", address.trim().replace('.', "-")))
    }

    /// MAC-based id when available, address-based otherwise
    pub fn from_identity(mac: Option<&str>, address: &str) -> Self {
        mac.and_then(Self::from_mac)
            .unwrap_or_else(|| Self::from_address(address))
    }

    /// Whether a discovery announcement refers to this device
    pub fn matches_announcement(&self, announcement: &Announcement) -> bool {
        self.0 == format!("wled-{}", announcement.id.replace('.', "-"))
            || self.0 == announcement.id
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(s: &str) -> Self {
        DeviceId::new(s)
    }
}

/// Initial settings stored with a freshly paired device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairingSettings {
    pub address: String,
    /// Poll interval in milliseconds
    pub polling_interval: u64,
    pub version: String,
    pub fxcount: u32,
    pub palcount: u32,
    pub led_count: u32,
}

/// Everything the host needs to create a device record
#[derive(Debug, Clone, PartialEq)]
pub struct PairingRecord {
    pub name: String,
    pub id: DeviceId,
    pub settings: PairingSettings,
}

impl PairingRecord {
    /// Build a record from an `/json/info` response for `address`
    pub fn from_info(address: &str, info: &DeviceInfo) -> Self {
        Self {
            name: derive_display_name(info),
            id: DeviceId::from_identity(info.mac.as_deref(), address),
            settings: PairingSettings {
                address: address.to_string(),
                polling_interval: DEFAULT_POLL_INTERVAL_MS,
                version: info.ver.clone().unwrap_or_default(),
                fxcount: info.fxcount.unwrap_or(0),
                palcount: info.palcount.unwrap_or(0),
                led_count: info.led_count(),
            },
        }
    }
}

/// Friendly name for a device
///
/// Prefers a custom name, then the hostname, then `WLED-<last 6 of mac>`.
pub fn derive_display_name(info: &DeviceInfo) -> String {
    let non_empty = |value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    if let Some(name) = non_empty(&info.name).filter(|name| name != STOCK_NAME) {
        return name;
    }
    if let Some(host) = non_empty(&info.host) {
        return host;
    }
    if let Some(mac) = non_empty(&info.mac) {
        let start = mac.len().saturating_sub(6);
        return format!("WLED-{}", mac.get(start..).unwrap_or(&mac));
    }
    STOCK_NAME.to_string()
}

/// Ask the device at `address` for its identity and build a pairing record
pub async fn fetch_pairing_record(transport: &dyn Transport, address: &str) -> Result<PairingRecord> {
    let address = address.trim();
    if address.is_empty() {
        return Err(DiscoveryError::InvalidAnnouncement("empty address".to_string()));
    }

    let value = transport
        .get(address, paths::INFO, Some(PAIRING_TIMEOUT))
        .await?;
    let info: DeviceInfo = decode(value, "info")?;

    let record = PairingRecord::from_info(address, &info);
    tracing::debug!(id = %record.id, name = %record.name, address, "Resolved pairing record");
    Ok(record)
}

/// Resolve every registry entry into a pairing record
///
/// Devices that fail to answer are skipped.
pub async fn list_pairing_candidates(
    registry: &DiscoveryRegistry,
    transport: &dyn Transport,
) -> Vec<PairingRecord> {
    let entries = registry.snapshot();
    tracing::info!(count = entries.len(), "Resolving discovered devices for pairing");

    let mut records = Vec::with_capacity(entries.len());
    for entry in entries {
        match fetch_pairing_record(transport, &entry.address).await {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!(address = %entry.address, error = %e, "Error getting device info");
            }
        }
    }
    records
}
