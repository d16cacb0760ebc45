//! # WLED SDK - device manager and automation actions for WLED controllers
//!
//! Pairs WLED devices, keeps each one in sync in the background and exposes
//! the effect, palette and preset actions automations use:
//!
//! ```rust,no_run
//! use wled_sdk::{Capability, FlowAction, WledSystem};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), wled_sdk::SdkError> {
//!     let system = WledSystem::new()?;
//!     let strip = system.pair("192.168.1.50").await?;
//!
//!     // Capabilities mirror the device and send commands when written
//!     strip.set(Capability::OnOff, true.into()).await?;
//!     println!("brightness: {:?}", strip.get(Capability::Dim));
//!
//!     // Actions with autocompleted arguments
//!     let matches = FlowAction::SetEffect.autocomplete(&strip, "rain").await;
//!     if let Some(rainbow) = matches.first() {
//!         FlowAction::SetEffect.run(&strip, &rainbow.id).await?;
//!     }
//!
//!     system.remove(&strip.id);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! wled-sdk (WledSystem, Device, FlowAction)
//!     ↓
//! wled-state (SyncEngine per device, MemoryHost)
//!     ↓
//! wled-discovery (registry, pairing)   wled-client (Transport, wire models)
//! ```

pub use device::Device;
pub use error::SdkError;
pub use flow::{AutocompleteItem, FlowAction};
pub use system::WledSystem;

// Re-export commonly used types from the lower layers
pub use wled_client::{HttpTransport, Transport};
pub use wled_discovery::{Announcement, DeviceId, PairingRecord, RegistryUpdate};
pub use wled_state::{
    init_logging, init_logging_from_env, Availability, Capability, CapabilityOption,
    CapabilityValue, EngineConfig, LoggingMode, OptionKind,
};

mod device;
mod error;
mod flow;
mod system;
