//! WLED device state synchronization
//!
//! Keeps a home-automation host's view of a WLED controller in sync with the
//! device: power, brightness, color, color temperature and the selected
//! effect, palette and preset.
//!
//! # Architecture
//!
//! ```text
//! DeviceHost (capabilities, options, settings)
//!      ▲  │
//!      │  ▼
//!   SyncEngine ──► Transport ──► WLED JSON API
//!   (poll loop, backoff, commands)
//! ```
//!
//! Each paired device gets its own [`SyncEngine`]. Engines share nothing, so
//! devices are polled fully independently.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use wled_client::HttpTransport;
//! use wled_discovery::DeviceId;
//! use wled_state::{EngineConfig, MemoryHost, SyncEngine};
//!
//! let host = Arc::new(MemoryHost::with_settings(settings));
//! let engine = SyncEngine::new(
//!     DeviceId::from_address("192.168.1.50"),
//!     Arc::new(HttpTransport::new()?),
//!     host.clone(),
//!     EngineConfig::default(),
//! );
//! engine.initialize();
//!
//! engine.set_effect("9").await?;
//! engine.dispose();
//! ```

pub mod color;
pub mod config;
pub mod engine;
pub mod error;
pub mod host;
pub mod logging;
pub mod options;
pub mod settings;

pub use color::{hsv_to_rgb, rgb_to_hsv, Hsv, Rgb};
pub use config::{compute_backoff, EngineConfig};
pub use engine::{DeviceStateSnapshot, SyncEngine, CONNECTION_LOST_REASON, NO_ADDRESS_REASON};
pub use error::{Result, SyncError, ValidationError};
pub use host::{Availability, Capability, CapabilityValue, DeviceHost, MemoryHost};
pub use logging::{init_logging, init_logging_from_env, LoggingError, LoggingMode};
pub use options::{CapabilityOption, OptionKind};
pub use settings::{DeviceConfig, DeviceSettings};
