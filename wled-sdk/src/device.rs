//! Handle to a paired device

use std::fmt;
use std::sync::Arc;

use wled_discovery::DeviceId;
use wled_state::{
    Availability, Capability, CapabilityOption, CapabilityValue, DeviceHost, DeviceStateSnapshot,
    MemoryHost, OptionKind, SyncEngine,
};

use crate::SdkError;

/// A paired WLED device
///
/// Cheap to clone; every clone talks to the same engine and host.
///
/// # Example
///
/// ```rust,ignore
/// let strip = system.device_by_name("Desk Strip").expect("paired");
///
/// strip.set(Capability::OnOff, true.into()).await?;
/// strip.set(Capability::Effect, "9".into()).await?;
///
/// if let Some(level) = strip.get(Capability::Dim) {
///     println!("brightness: {:?}", level.as_f64());
/// }
/// ```
#[derive(Clone)]
pub struct Device {
    /// Stable device identifier
    pub id: DeviceId,
    /// Display name chosen at pairing
    pub name: String,
    engine: Arc<SyncEngine>,
    host: Arc<MemoryHost>,
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Device {
    pub(crate) fn new(
        id: DeviceId,
        name: String,
        engine: Arc<SyncEngine>,
        host: Arc<MemoryHost>,
    ) -> Self {
        Self {
            id,
            name,
            engine,
            host,
        }
    }

    /// Last value mirrored from the device or written by a command
    pub fn get(&self, capability: Capability) -> Option<CapabilityValue> {
        self.host.capability_value(capability)
    }

    /// Write a capability, sending the matching command to the device
    ///
    /// The engine mirrors the value it actually sent, so clamped levels are
    /// stored clamped.
    pub async fn set(&self, capability: Capability, value: CapabilityValue) -> Result<(), SdkError> {
        self.engine.handle_capability(capability, value).await?;
        Ok(())
    }

    /// Current options of `kind` matching `query`
    pub async fn options(&self, kind: OptionKind, query: &str) -> Vec<CapabilityOption> {
        self.engine.list_options(kind, query).await
    }

    pub fn availability(&self) -> Availability {
        self.host.availability()
    }

    pub fn snapshot(&self) -> DeviceStateSnapshot {
        self.engine.snapshot()
    }

    /// The underlying engine, for direct command access
    pub fn engine(&self) -> &Arc<SyncEngine> {
        &self.engine
    }

    /// The in-memory host backing this device
    pub fn host(&self) -> &Arc<MemoryHost> {
        &self.host
    }
}
