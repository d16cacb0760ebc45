//! WLED device discovery registry and pairing lookups
//!
//! The network discovery transport (mDNS) is owned by the host platform and
//! pushes announcements into a [`DiscoveryRegistry`]. The registry is a pure
//! cache keyed by announcement id: no polling, no retries, last write wins.
//!
//! Pairing turns an address into a [`PairingRecord`] by asking the device for
//! its identity over `/json/info`.
//!
//! # Quick Start
//!
//! ```no_run
//! use wled_discovery::{Announcement, DiscoveryRegistry};
//!
//! let registry = DiscoveryRegistry::new();
//! registry.announce(Announcement::new("wled-kitchen", "192.168.1.50", Some("Kitchen".into())));
//!
//! for entry in registry.snapshot() {
//!     println!("Found {} at {}", entry.id, entry.address);
//! }
//! ```

mod error;
pub mod device;
mod registry;

pub use device::{
    derive_display_name, fetch_pairing_record, list_pairing_candidates, DeviceId, PairingRecord,
    PairingSettings, PAIRING_TIMEOUT,
};
pub use error::{DiscoveryError, Result};
pub use registry::{DiscoveryRegistry, RegistryUpdate};

/// A discovery announcement pushed by the host's discovery transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    /// Transport-level identifier of the announcing device
    pub id: String,
    /// Network address (IP or hostname), empty if the transport did not resolve one
    pub address: String,
    /// Advertised name, if any
    pub name: Option<String>,
}

impl Announcement {
    /// Build an announcement
    pub fn new(id: impl Into<String>, address: impl Into<String>, name: Option<String>) -> Self {
        Self {
            id: id.into(),
            address: address.into(),
            name,
        }
    }
}
