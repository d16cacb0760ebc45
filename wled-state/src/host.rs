//! Boundary to the home-automation host
//!
//! The host owns capability values, capability option lists, device settings
//! and availability. The engine only reads and writes them through
//! [`DeviceHost`]; [`MemoryHost`] is an in-process implementation.

use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::options::{from_host_options, to_host_options, CapabilityOption, OptionKind};

/// Capabilities a WLED device exposes to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    OnOff,
    Dim,
    LightHue,
    LightSaturation,
    LightTemperature,
    Effect,
    Palette,
    Preset,
}

impl Capability {
    pub const ALL: [Capability; 8] = [
        Capability::OnOff,
        Capability::Dim,
        Capability::LightHue,
        Capability::LightSaturation,
        Capability::LightTemperature,
        Capability::Effect,
        Capability::Palette,
        Capability::Preset,
    ];

    /// Host-side capability name
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::OnOff => "onoff",
            Capability::Dim => "dim",
            Capability::LightHue => "light_hue",
            Capability::LightSaturation => "light_saturation",
            Capability::LightTemperature => "light_temperature",
            Capability::Effect => "wled_effect",
            Capability::Palette => "wled_palette",
            Capability::Preset => "wled_preset",
        }
    }

    /// Look a capability up by its host-side name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A capability value: boolean, 0-1 level, or string-encoded id
#[derive(Debug, Clone, PartialEq)]
pub enum CapabilityValue {
    Bool(bool),
    Number(f64),
    Id(String),
}

impl CapabilityValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CapabilityValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CapabilityValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_id(&self) -> Option<&str> {
        match self {
            CapabilityValue::Id(id) => Some(id),
            _ => None,
        }
    }
}

impl From<bool> for CapabilityValue {
    fn from(value: bool) -> Self {
        CapabilityValue::Bool(value)
    }
}

impl From<f64> for CapabilityValue {
    fn from(value: f64) -> Self {
        CapabilityValue::Number(value)
    }
}

impl From<String> for CapabilityValue {
    fn from(value: String) -> Self {
        CapabilityValue::Id(value)
    }
}

impl From<&str> for CapabilityValue {
    fn from(value: &str) -> Self {
        CapabilityValue::Id(value.to_string())
    }
}

/// Whether the host should show the device as reachable
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Availability {
    #[default]
    Available,
    Unavailable(String),
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }

    /// Reason shown to the user, if unavailable
    pub fn reason(&self) -> Option<&str> {
        match self {
            Availability::Available => None,
            Availability::Unavailable(reason) => Some(reason),
        }
    }
}

/// Per-device storage provided by the host
///
/// Writes of an option list replace the whole list for that kind.
pub trait DeviceHost: Send + Sync {
    fn capability_value(&self, capability: Capability) -> Option<CapabilityValue>;

    fn set_capability_value(&self, capability: Capability, value: CapabilityValue);

    fn capability_options(&self, kind: OptionKind) -> Vec<CapabilityOption>;

    fn set_capability_options(&self, kind: OptionKind, options: Vec<CapabilityOption>);

    /// Current persisted settings object
    fn settings(&self) -> Map<String, Value>;

    /// Merge `patch` into the persisted settings
    ///
    /// Device-initiated writes; these do not raise a settings-changed
    /// notification.
    fn set_settings(&self, patch: Map<String, Value>);

    fn set_available(&self);

    fn set_unavailable(&self, reason: &str);
}

#[derive(Debug, Default)]
struct HostState {
    values: HashMap<Capability, CapabilityValue>,
    /// Stored in the host's `{"values": [...]}` JSON format
    options: HashMap<OptionKind, Value>,
    settings: Map<String, Value>,
    availability: Availability,
}

/// In-memory [`DeviceHost`]
#[derive(Debug, Default)]
pub struct MemoryHost {
    state: RwLock<HostState>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Host pre-populated with settings, as after pairing
    pub fn with_settings(settings: Map<String, Value>) -> Self {
        let host = Self::default();
        host.state.write().settings = settings;
        host
    }

    pub fn availability(&self) -> Availability {
        self.state.read().availability.clone()
    }

    /// Raw option list as the host stores it
    pub fn raw_options(&self, kind: OptionKind) -> Option<Value> {
        self.state.read().options.get(&kind).cloned()
    }

    /// User-initiated settings change
    ///
    /// Returns the keys whose value actually changed, to be forwarded to the
    /// engine's settings handler.
    pub fn update_settings(&self, patch: Map<String, Value>) -> Vec<String> {
        let mut state = self.state.write();
        let mut changed = Vec::new();
        for (key, value) in patch {
            if state.settings.get(&key) != Some(&value) {
                changed.push(key.clone());
                state.settings.insert(key, value);
            }
        }
        changed
    }
}

impl DeviceHost for MemoryHost {
    fn capability_value(&self, capability: Capability) -> Option<CapabilityValue> {
        self.state.read().values.get(&capability).cloned()
    }

    fn set_capability_value(&self, capability: Capability, value: CapabilityValue) {
        self.state.write().values.insert(capability, value);
    }

    fn capability_options(&self, kind: OptionKind) -> Vec<CapabilityOption> {
        self.state
            .read()
            .options
            .get(&kind)
            .map(from_host_options)
            .unwrap_or_default()
    }

    fn set_capability_options(&self, kind: OptionKind, options: Vec<CapabilityOption>) {
        let value = to_host_options(&options);
        self.state.write().options.insert(kind, value);
    }

    fn settings(&self) -> Map<String, Value> {
        self.state.read().settings.clone()
    }

    fn set_settings(&self, patch: Map<String, Value>) {
        self.state.write().settings.extend(patch);
    }

    fn set_available(&self) {
        self.state.write().availability = Availability::Available;
    }

    fn set_unavailable(&self, reason: &str) {
        self.state.write().availability = Availability::Unavailable(reason.to_string());
    }
}
