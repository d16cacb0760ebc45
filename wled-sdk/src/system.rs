//! WledSystem - Main entry point for the SDK
//!
//! Owns one [`SyncEngine`] per paired device, plus the discovery registry
//! used while pairing.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};
use wled_client::{HttpTransport, Transport};
use wled_discovery::{
    fetch_pairing_record, list_pairing_candidates, Announcement, DeviceId, DiscoveryRegistry,
    PairingRecord, RegistryUpdate,
};
use wled_state::{DeviceHost, EngineConfig, MemoryHost, SyncEngine};

use crate::flow::{AutocompleteItem, FlowAction};
use crate::{Device, SdkError};

/// Main system entry point
///
/// # Example
///
/// ```rust,ignore
/// use wled_sdk::WledSystem;
///
/// let system = WledSystem::new()?;
///
/// // Pair by address, or from discovery announcements
/// let strip = system.pair("192.168.1.50").await?;
/// for candidate in system.pairing_candidates().await {
///     system.add_device(candidate)?;
/// }
///
/// strip.set(Capability::Dim, 0.4.into()).await?;
///
/// // Devices poll in the background until removed
/// system.remove(&strip.id);
/// ```
pub struct WledSystem {
    transport: Arc<dyn Transport>,
    config: EngineConfig,
    registry: DiscoveryRegistry,
    devices: RwLock<HashMap<DeviceId, Device>>,
}

impl WledSystem {
    /// Create a system talking HTTP with the default engine configuration
    pub fn new() -> Result<Self, SdkError> {
        let transport = HttpTransport::new()?;
        Self::with_transport(Arc::new(transport), EngineConfig::default())
    }

    /// Create a system with a custom transport and engine configuration
    pub fn with_transport(
        transport: Arc<dyn Transport>,
        config: EngineConfig,
    ) -> Result<Self, SdkError> {
        config.validate()?;

        Ok(Self {
            transport,
            config,
            registry: DiscoveryRegistry::new(),
            devices: RwLock::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &DiscoveryRegistry {
        &self.registry
    }

    // ========================================================================
    // Discovery and pairing
    // ========================================================================

    /// Record a discovery announcement
    ///
    /// When the announcement belongs to a paired device whose address has
    /// changed, the device's address setting follows it.
    pub async fn announce(&self, announcement: Announcement) -> RegistryUpdate {
        let update = self.registry.announce(announcement.clone());
        if update == RegistryUpdate::Ignored {
            return update;
        }

        let paired = self
            .devices
            .read()
            .values()
            .find(|d| d.id.matches_announcement(&announcement))
            .cloned();

        if let Some(device) = paired {
            let current = device.snapshot().address;
            if current.as_deref() != Some(announcement.address.as_str()) {
                tracing::info!(
                    device = %device.id,
                    address = %announcement.address,
                    "Paired device announced a new address"
                );
                let mut patch = Map::new();
                patch.insert("address".to_string(), Value::from(announcement.address));
                if let Err(e) = self.update_settings(&device.id, patch).await {
                    tracing::warn!(device = %device.id, error = %e, "Could not follow address change");
                }
            }
        }

        update
    }

    /// Resolve discovered, not yet paired devices into pairing records
    pub async fn pairing_candidates(&self) -> Vec<PairingRecord> {
        let records = list_pairing_candidates(&self.registry, self.transport.as_ref()).await;
        let devices = self.devices.read();
        records
            .into_iter()
            .filter(|record| !devices.contains_key(&record.id))
            .collect()
    }

    /// Look up the device at `address` and add it
    pub async fn pair(&self, address: &str) -> Result<Device, SdkError> {
        let record = fetch_pairing_record(self.transport.as_ref(), address).await?;
        self.add_device(record)
    }

    // ========================================================================
    // Device lifecycle
    // ========================================================================

    /// Add a paired device and start syncing it
    ///
    /// Adding an id that is already present returns the existing device.
    /// Must be called within a tokio runtime for polling to start.
    pub fn add_device(&self, record: PairingRecord) -> Result<Device, SdkError> {
        let mut devices = self.devices.write();
        if let Some(existing) = devices.get(&record.id) {
            tracing::debug!(device = %record.id, "Device already paired");
            return Ok(existing.clone());
        }

        let settings = match serde_json::to_value(&record.settings) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        let host = Arc::new(MemoryHost::with_settings(settings));
        let engine = SyncEngine::new(
            record.id.clone(),
            Arc::clone(&self.transport),
            host.clone(),
            self.config.clone(),
        );
        engine.initialize();

        let device = Device::new(record.id.clone(), record.name, engine, host);
        tracing::info!(device = %device.id, name = %device.name, "Device added");
        devices.insert(record.id, device.clone());
        Ok(device)
    }

    /// Stop syncing a device and forget it
    pub fn remove(&self, id: &DeviceId) -> Option<Device> {
        let device = self.devices.write().remove(id)?;
        device.engine().dispose();
        tracing::info!(device = %id, "Device removed");
        Some(device)
    }

    /// Dispose every engine
    pub fn shutdown(&self) {
        let devices: Vec<Device> = self.devices.write().drain().map(|(_, d)| d).collect();
        for device in &devices {
            device.engine().dispose();
        }
        if !devices.is_empty() {
            tracing::info!(count = devices.len(), "All devices stopped");
        }
    }

    /// Apply a user settings change to a device
    ///
    /// Returns the keys that actually changed. Connection keys take effect
    /// immediately.
    pub async fn update_settings(
        &self,
        id: &DeviceId,
        patch: Map<String, Value>,
    ) -> Result<Vec<String>, SdkError> {
        let device = self
            .device(id)
            .ok_or_else(|| SdkError::DeviceNotFound(id.to_string()))?;

        let changed = device.host().update_settings(patch);
        if !changed.is_empty() {
            device
                .engine()
                .on_settings_changed(&changed, &device.host().settings())
                .await;
        }
        Ok(changed)
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    pub fn device(&self, id: &DeviceId) -> Option<Device> {
        self.devices.read().get(id).cloned()
    }

    pub fn device_by_name(&self, name: &str) -> Option<Device> {
        self.devices
            .read()
            .values()
            .find(|d| d.name == name)
            .cloned()
    }

    /// All paired devices, ordered by name
    pub fn devices(&self) -> Vec<Device> {
        let mut devices: Vec<Device> = self.devices.read().values().cloned().collect();
        devices.sort_by(|a, b| a.name.cmp(&b.name));
        devices
    }

    pub fn len(&self) -> usize {
        self.devices.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.read().is_empty()
    }

    // ========================================================================
    // Flow actions
    // ========================================================================

    /// Run `action` on the device with `id`
    pub async fn run_action(
        &self,
        action: FlowAction,
        id: &DeviceId,
        option_id: &str,
    ) -> Result<(), SdkError> {
        let device = self
            .device(id)
            .ok_or_else(|| SdkError::DeviceNotFound(id.to_string()))?;
        action.run(&device, option_id).await
    }

    /// Autocomplete the argument of `action` for the device with `id`
    pub async fn autocomplete(
        &self,
        action: FlowAction,
        id: &DeviceId,
        query: &str,
    ) -> Result<Vec<AutocompleteItem>, SdkError> {
        let device = self
            .device(id)
            .ok_or_else(|| SdkError::DeviceNotFound(id.to_string()))?;
        Ok(action.autocomplete(&device, query).await)
    }
}

impl Drop for WledSystem {
    fn drop(&mut self) {
        self.shutdown();
    }
}
