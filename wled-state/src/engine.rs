//! Per-device synchronization engine
//!
//! One [`SyncEngine`] owns one paired device. It polls `/json/state` on a
//! reschedule-on-completion loop, mirrors the result into host capabilities,
//! backs off exponentially while the device is unreachable, and keeps the
//! effect/palette/preset option lists in sync with what the device reports.
//!
//! # Lifecycle
//!
//! ```text
//! new() ──► initialize() ──► poll loop ⇄ backoff ──► dispose()
//!                  └──► deferred metadata fetch
//! ```
//!
//! Poll failures never escape the engine: they are logged and folded into
//! the error count and availability. Command methods (`set_*`) return their
//! errors so the caller can report them.
//!
//! The engine holds clones of its own `Arc` inside the spawned tasks, so it
//! stays alive until [`SyncEngine::dispose`] is called.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::{Map, Value};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use wled_client::types::decode;
use wled_client::{paths, DeviceDescriptor, StatePatch, Transport, TransportError, WledState};
use wled_discovery::DeviceId;

use crate::color::{hsv_to_rgb, rgb_to_hsv, Hsv};
use crate::config::{compute_backoff, EngineConfig};
use crate::error::{Result, SyncError, ValidationError};
use crate::host::{Availability, Capability, CapabilityValue, DeviceHost};
use crate::options::{
    default_options, filter_options, indexed_options, parse_presets, preset_options,
    CapabilityOption, OptionKind, NO_PRESET_ID,
};
use crate::settings::{keys, touches_connection, DeviceConfig, DeviceSettings};

/// Unavailability reason when no address is configured
pub const NO_ADDRESS_REASON: &str = "No IP address configured";

/// Unavailability reason after a connectivity failure
pub const CONNECTION_LOST_REASON: &str = "Cannot connect to device";

/// Mutable per-device state, only touched under the engine's lock
#[derive(Debug)]
struct DeviceState {
    device: DeviceConfig,
    consecutive_errors: u32,
    availability: Availability,
    last_update: Option<Instant>,
    options_fetched: bool,
    next_delay: Duration,
}

/// Point-in-time view of an engine, for diagnostics
#[derive(Debug, Clone)]
pub struct DeviceStateSnapshot {
    pub address: Option<String>,
    pub poll_interval: Duration,
    pub consecutive_errors: u32,
    pub availability: Availability,
    pub max_effect_id: i64,
    pub max_palette_id: i64,
    pub max_preset_id: i64,
    pub options_fetched: bool,
    pub fetch_in_flight: bool,
    /// Time of the last successful poll
    pub last_update: Option<Instant>,
    /// Delay the loop will wait before the next poll
    pub next_delay: Duration,
    pub is_running: bool,
    pub is_disposed: bool,
}

/// Clears the in-flight flag on every exit path, including cancellation
struct FetchGuard<'a>(&'a AtomicBool);

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Synchronization engine for a single WLED device
pub struct SyncEngine {
    /// Handle to the owning `Arc`, for spawning background work
    me: Weak<SyncEngine>,
    id: DeviceId,
    transport: Arc<dyn Transport>,
    host: Arc<dyn DeviceHost>,
    config: EngineConfig,
    state: Mutex<DeviceState>,
    fetch_in_flight: AtomicBool,
    running: AtomicBool,
    disposed: AtomicBool,
    /// Wakes the poll loop before its timer expires
    repoll: Notify,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncEngine")
            .field("id", &self.id)
            .field("state", &*self.state.lock())
            .field("running", &self.running.load(Ordering::Relaxed))
            .field("disposed", &self.disposed.load(Ordering::Relaxed))
            .finish()
    }
}

impl SyncEngine {
    /// Create an engine for a paired device
    ///
    /// Settings are read from the host right away; selector id ceilings come
    /// from the persisted counts, or `config.default_max_id` without them.
    /// Nothing talks to the device until [`initialize`](Self::initialize).
    pub fn new(
        id: DeviceId,
        transport: Arc<dyn Transport>,
        host: Arc<dyn DeviceHost>,
        config: EngineConfig,
    ) -> Arc<Self> {
        let device = DeviceSettings::from_map(&host.settings()).normalize(&config);
        let next_delay = device.poll_interval;

        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            id,
            transport,
            host,
            config,
            state: Mutex::new(DeviceState {
                device,
                consecutive_errors: 0,
                availability: Availability::Available,
                last_update: None,
                options_fetched: false,
                next_delay,
            }),
            fetch_in_flight: AtomicBool::new(false),
            running: AtomicBool::new(false),
            disposed: AtomicBool::new(false),
            repoll: Notify::new(),
            tasks: Mutex::new(Vec::new()),
        })
    }

    pub fn id(&self) -> &DeviceId {
        &self.id
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Seed capability defaults and start the poll loop
    ///
    /// The first poll runs after `initial_poll_delay`, the first metadata
    /// fetch after `metadata_fetch_delay`. Problems are logged, never
    /// returned; a device without an address keeps polling (and staying
    /// unavailable) until its settings are fixed. Calling this twice is a
    /// no-op.
    pub fn initialize(self: &Arc<Self>) {
        if self.is_disposed() {
            tracing::warn!(device = %self.id, "Ignoring initialize on a disposed engine");
            return;
        }
        if self.running.swap(true, Ordering::AcqRel) {
            tracing::debug!(device = %self.id, "Engine already running");
            return;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                tracing::error!(device = %self.id, error = %e, "Cannot start device engine outside a tokio runtime");
                self.running.store(false, Ordering::Release);
                return;
            }
        };

        self.seed_defaults();
        if self.state.lock().device.address.is_none() {
            tracing::warn!(device = %self.id, "No IP address set for WLED device");
        }

        let engine = Arc::clone(self);
        let poll_loop = runtime.spawn(async move { engine.run_poll_loop().await });

        let engine = Arc::clone(self);
        let delay = self.config.metadata_fetch_delay;
        let first_fetch = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            engine.fetch_capability_metadata().await;
        });

        self.tasks.lock().extend([poll_loop, first_fetch]);
        tracing::info!(device = %self.id, "Device engine started");
    }

    /// Stop polling; no transport calls are issued afterwards
    ///
    /// Results of requests already in flight are discarded. Commands fail
    /// with [`SyncError::Disposed`]. Idempotent.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
        self.running.store(false, Ordering::Release);
        tracing::info!(device = %self.id, "Device engine disposed");
    }

    pub fn snapshot(&self) -> DeviceStateSnapshot {
        let state = self.state.lock();
        DeviceStateSnapshot {
            address: state.device.address.clone(),
            poll_interval: state.device.poll_interval,
            consecutive_errors: state.consecutive_errors,
            availability: state.availability.clone(),
            max_effect_id: state.device.max_effect_id,
            max_palette_id: state.device.max_palette_id,
            max_preset_id: state.device.max_preset_id,
            options_fetched: state.options_fetched,
            fetch_in_flight: self.fetch_in_flight.load(Ordering::Acquire),
            last_update: state.last_update,
            next_delay: state.next_delay,
            is_running: self.is_running(),
            is_disposed: self.is_disposed(),
        }
    }

    async fn run_poll_loop(self: Arc<Self>) {
        let mut delay = self.config.initial_poll_delay;
        tracing::debug!(device = %self.id, delay_ms = delay.as_millis() as u64, "Poll loop started");

        loop {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = self.repoll.notified() => {
                    tracing::debug!(device = %self.id, "Immediate poll requested");
                }
            }

            if self.is_disposed() {
                break;
            }
            delay = self.poll().await;
        }

        tracing::debug!(device = %self.id, "Poll loop ended");
    }

    /// Run one poll cycle and return the delay before the next one
    ///
    /// Success resets the error count and marks the device available.
    /// Failure increments the error count and returns the backoff delay;
    /// connectivity failures also mark the device unavailable.
    pub async fn poll(&self) -> Duration {
        if self.is_disposed() {
            return self.state.lock().next_delay;
        }

        let address = self.state.lock().device.address.clone();
        let Some(address) = address else {
            tracing::warn!(device = %self.id, "No IP address in settings, cannot update state");
            self.mark_unavailable(NO_ADDRESS_REASON);
            return self.schedule_base_interval();
        };

        let result = self
            .transport
            .get(&address, paths::STATE, Some(self.config.request_timeout))
            .await
            .and_then(|value| decode::<WledState>(value, "state"));

        if self.is_disposed() {
            tracing::debug!(device = %self.id, "Discarding poll result of disposed engine");
            return self.state.lock().next_delay;
        }

        match result {
            Ok(state) => {
                self.on_poll_success(&state).await;
                self.schedule_base_interval()
            }
            Err(err) => self.on_poll_failure(&address, err),
        }
    }

    fn schedule_base_interval(&self) -> Duration {
        let mut state = self.state.lock();
        state.next_delay = state.device.poll_interval;
        state.next_delay
    }

    async fn on_poll_success(&self, state: &WledState) {
        let recovered = {
            let mut s = self.state.lock();
            s.consecutive_errors = 0;
            let recovered = !s.availability.is_available();
            s.availability = Availability::Available;
            recovered
        };
        self.host.set_available();
        if recovered {
            tracing::info!(device = %self.id, "Device reachable again");
        }

        self.apply_state(state);
        self.reconcile_preset(state.ps).await;
        if self.is_disposed() {
            return;
        }

        let needs_fetch = {
            let mut s = self.state.lock();
            s.last_update = Some(Instant::now());
            !s.options_fetched
        };
        if needs_fetch && !self.fetch_in_flight.load(Ordering::Acquire) {
            self.spawn_metadata_fetch();
        }
    }

    /// Fetch options in the background so the poll cycle is not held up
    fn spawn_metadata_fetch(&self) {
        let Some(engine) = self.me.upgrade() else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };

        let mut tasks = self.tasks.lock();
        if self.is_disposed() {
            return;
        }
        tasks.retain(|task| !task.is_finished());
        tasks.push(runtime.spawn(async move {
            if !engine.state.lock().options_fetched {
                engine.fetch_capability_metadata().await;
            }
        }));
    }

    fn on_poll_failure(&self, address: &str, err: TransportError) -> Duration {
        let (errors, delay) = {
            let mut s = self.state.lock();
            s.consecutive_errors = s.consecutive_errors.saturating_add(1);
            s.next_delay = compute_backoff(
                s.device.poll_interval,
                s.consecutive_errors,
                self.config.max_backoff,
            );
            (s.consecutive_errors, s.next_delay)
        };

        if err.is_connectivity() {
            tracing::warn!(
                device = %self.id,
                address,
                errors,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Connection error"
            );
            self.mark_unavailable(CONNECTION_LOST_REASON);
        } else {
            tracing::warn!(
                device = %self.id,
                address,
                errors,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Unexpected response from device"
            );
        }

        delay
    }

    fn mark_unavailable(&self, reason: &str) {
        self.state.lock().availability = Availability::Unavailable(reason.to_string());
        self.host.set_unavailable(reason);
    }

    /// Mirror polled device state into host capabilities
    fn apply_state(&self, state: &WledState) {
        let (max_effect_id, max_palette_id) = {
            let s = self.state.lock();
            (s.device.max_effect_id, s.device.max_palette_id)
        };

        self.host
            .set_capability_value(Capability::OnOff, state.on.unwrap_or(false).into());

        if let Some(bri) = state.bri {
            let level = (bri as f64 / 255.0).clamp(0.0, 1.0);
            self.host.set_capability_value(Capability::Dim, level.into());
        }

        let Some(segment) = state.primary_segment() else {
            return;
        };

        if let Some(rgb) = segment.primary_rgb() {
            let hsv = rgb_to_hsv(rgb.into());
            self.host.set_capability_value(Capability::LightHue, hsv.h.into());
            self.host
                .set_capability_value(Capability::LightSaturation, hsv.s.into());
        }

        if let Some(fx) = segment.fx {
            self.mirror_selector(OptionKind::Effect, fx, max_effect_id);
        }
        if let Some(pal) = segment.pal {
            self.mirror_selector(OptionKind::Palette, pal, max_palette_id);
        }

        if let Some(cct) = segment.cct {
            let level = (cct as f64 / 255.0).clamp(0.0, 1.0);
            self.host
                .set_capability_value(Capability::LightTemperature, level.into());
        }
    }

    /// Out-of-range ids leave the current value alone
    fn mirror_selector(&self, kind: OptionKind, id: i64, max_id: i64) {
        if (0..=max_id).contains(&id) {
            self.host
                .set_capability_value(kind.capability(), id.to_string().into());
        } else {
            tracing::info!(device = %self.id, %kind, id, max_id, "Selector id out of range");
        }
    }

    /// Mirror the active preset, refreshing options if it is unknown
    async fn reconcile_preset(&self, ps: Option<i64>) {
        let Some(ps) = ps else {
            return;
        };
        if ps != -1 && ps < 1 {
            tracing::debug!(device = %self.id, preset = ps, "Ignoring invalid active preset");
            return;
        }
        let id = ps.to_string();

        let options = self.host.capability_options(OptionKind::Preset);
        let known = options.iter().any(|o| o.id == id);

        if options.is_empty() || (!known && ps > 0) {
            tracing::debug!(device = %self.id, preset = ps, "Unknown preset, refreshing options");
            self.fetch_capability_metadata().await;
            if self.is_disposed() {
                return;
            }
            let now_known = self
                .host
                .capability_options(OptionKind::Preset)
                .iter()
                .any(|o| o.id == id);
            if now_known {
                self.host.set_capability_value(Capability::Preset, id.into());
            }
        } else {
            self.host.set_capability_value(Capability::Preset, id.into());
        }
    }

    /// Refresh effect, palette and preset options from the device
    ///
    /// At most one fetch runs at a time; a call while one is in flight
    /// returns `false` immediately. Each category falls back to its
    /// built-in list on its own. Returns `true` when `/json` answered.
    pub async fn fetch_capability_metadata(&self) -> bool {
        if self.is_disposed() {
            return false;
        }
        if self
            .fetch_in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!(device = %self.id, "Metadata fetch already in flight");
            return false;
        }
        let _guard = FetchGuard(&self.fetch_in_flight);

        let fetched = self.fetch_metadata().await;
        if fetched {
            self.state.lock().options_fetched = true;
        }
        fetched
    }

    async fn fetch_metadata(&self) -> bool {
        let address = self.state.lock().device.address.clone();
        let Some(address) = address else {
            tracing::warn!(device = %self.id, "No IP address in settings, using built-in option lists");
            for kind in OptionKind::ALL {
                self.host.set_capability_options(kind, default_options(kind));
            }
            return false;
        };

        let timeout = Some(self.config.request_timeout);
        let descriptor = self
            .transport
            .get(&address, paths::DESCRIPTOR, timeout)
            .await
            .and_then(|value| decode::<DeviceDescriptor>(value, "descriptor"));
        if self.is_disposed() {
            return false;
        }

        let presets = self.transport.get(&address, paths::PRESETS, timeout).await;
        if self.is_disposed() {
            return false;
        }

        let descriptor = match descriptor {
            Ok(descriptor) => Some(descriptor),
            Err(e) => {
                tracing::warn!(device = %self.id, error = %e, "Error fetching effects and palettes");
                None
            }
        };

        self.store_indexed(
            OptionKind::Effect,
            descriptor.as_ref().and_then(DeviceDescriptor::effect_names),
        );
        self.store_indexed(
            OptionKind::Palette,
            descriptor.as_ref().and_then(DeviceDescriptor::palette_names),
        );
        self.store_presets(presets);

        if let Some(descriptor) = &descriptor {
            self.write_back_settings(descriptor);
        }

        let fetched = descriptor.is_some();
        tracing::debug!(device = %self.id, fetched, "Capability options updated");
        fetched
    }

    fn store_indexed(&self, kind: OptionKind, names: Option<Vec<String>>) {
        let Some(names) = names else {
            tracing::debug!(device = %self.id, %kind, "No list from device, using built-in names");
            self.host.set_capability_options(kind, default_options(kind));
            return;
        };

        let max_id = names.len() as i64 - 1;
        {
            let mut s = self.state.lock();
            match kind {
                OptionKind::Effect => s.device.max_effect_id = max_id,
                OptionKind::Palette => s.device.max_palette_id = max_id,
                OptionKind::Preset => {}
            }
        }
        self.host
            .set_capability_options(kind, indexed_options(kind, &names));
    }

    fn store_presets(&self, presets: std::result::Result<Value, TransportError>) {
        let parsed = match presets {
            Ok(document) => parse_presets(&document),
            Err(e) => {
                tracing::warn!(device = %self.id, error = %e, "Error fetching presets");
                None
            }
        };

        let options = match parsed {
            Some(parsed) => {
                self.state.lock().device.max_preset_id = parsed.max_id;
                preset_options(&parsed.presets)
            }
            None => preset_options(&[]),
        };
        self.host
            .set_capability_options(OptionKind::Preset, options);
    }

    /// Persist discovered counts and the canonical address key
    fn write_back_settings(&self, descriptor: &DeviceDescriptor) {
        let current = DeviceSettings::from_map(&self.host.settings());
        let mut patch = Map::new();

        let has_address = current
            .address
            .as_deref()
            .is_some_and(|a| !a.trim().is_empty());
        if !has_address {
            if let Some(ip) = current.ip.as_deref().filter(|ip| !ip.trim().is_empty()) {
                patch.insert(keys::ADDRESS.to_string(), Value::from(ip.trim()));
            }
        }

        let counts = [
            (keys::FXCOUNT, descriptor.effect_count(), current.fxcount),
            (keys::PALCOUNT, descriptor.palette_count(), current.palcount),
        ];
        for (key, reported, stored) in counts {
            if let Some(reported) = reported.filter(|c| *c > 0) {
                if stored != Some(f64::from(reported)) {
                    patch.insert(key.to_string(), Value::from(reported));
                }
            }
        }

        if !patch.is_empty() {
            tracing::debug!(device = %self.id, keys = ?patch.keys().collect::<Vec<_>>(), "Updating device settings");
            self.host.set_settings(patch);
        }
    }

    /// Current options of `kind` whose name contains `query`
    ///
    /// An empty store triggers a metadata fetch first; if that leaves it
    /// empty, the built-in list is used.
    pub async fn list_options(&self, kind: OptionKind, query: &str) -> Vec<CapabilityOption> {
        let mut options = self.host.capability_options(kind);

        if options.is_empty() && !self.is_disposed() {
            self.fetch_capability_metadata().await;
            options = self.host.capability_options(kind);
        }
        if options.is_empty() {
            options = default_options(kind);
        }

        filter_options(&options, query)
    }

    /// React to a user settings change
    ///
    /// Only address and poll-interval keys matter. The pending poll is
    /// pre-empted so the new settings take effect immediately, and the
    /// option lists are fetched again since the address may now point at a
    /// different device.
    pub async fn on_settings_changed<S: AsRef<str>>(
        &self,
        changed_keys: &[S],
        new_settings: &Map<String, Value>,
    ) {
        if self.is_disposed() || !touches_connection(changed_keys) {
            return;
        }

        let updated = DeviceSettings::from_map(new_settings).normalize(&self.config);
        tracing::info!(
            device = %self.id,
            address = ?updated.address,
            interval_ms = updated.poll_interval.as_millis() as u64,
            "Device connection settings changed"
        );
        {
            let mut s = self.state.lock();
            s.device.address = updated.address;
            s.device.poll_interval = updated.poll_interval;
            s.consecutive_errors = 0;
        }

        if self.is_running() {
            self.repoll.notify_one();
        } else {
            self.poll().await;
        }
        self.fetch_capability_metadata().await;
    }

    /// Route a host capability write to the matching command
    pub async fn handle_capability(&self, capability: Capability, value: CapabilityValue) -> Result<()> {
        let name = capability.as_str();
        let level = |value: &CapabilityValue| {
            value.as_f64().ok_or(ValidationError::WrongValueType {
                capability: name,
                expected: "a number",
            })
        };

        match capability {
            Capability::OnOff => {
                let on = value.as_bool().ok_or(ValidationError::WrongValueType {
                    capability: name,
                    expected: "a boolean",
                })?;
                self.set_on_off(on).await
            }
            Capability::Dim => self.set_brightness(level(&value)?).await,
            Capability::LightHue => self.set_color(Some(level(&value)?), None).await,
            Capability::LightSaturation => self.set_color(None, Some(level(&value)?)).await,
            Capability::LightTemperature => self.set_color_temperature(level(&value)?).await,
            Capability::Effect | Capability::Palette | Capability::Preset => {
                let id = match &value {
                    CapabilityValue::Id(id) => id.clone(),
                    CapabilityValue::Number(n) => n.to_string(),
                    CapabilityValue::Bool(_) => {
                        return Err(ValidationError::WrongValueType {
                            capability: name,
                            expected: "an id",
                        }
                        .into())
                    }
                };
                match capability {
                    Capability::Effect => self.set_effect(&id).await,
                    Capability::Palette => self.set_palette(&id).await,
                    _ => self.set_preset(&id).await,
                }
            }
        }
    }

    pub async fn set_on_off(&self, on: bool) -> Result<()> {
        self.send(StatePatch::power(on), "on/off").await?;
        self.host.set_capability_value(Capability::OnOff, on.into());
        Ok(())
    }

    /// Set brightness from a 0-1 level; out-of-range levels are clamped
    pub async fn set_brightness(&self, level: f64) -> Result<()> {
        let level = unit_input(Capability::Dim, level)?;
        self.send(StatePatch::brightness(to_byte(level)), "brightness")
            .await?;
        self.host.set_capability_value(Capability::Dim, level.into());
        Ok(())
    }

    /// Set the segment color from hue and saturation at full value
    ///
    /// A missing component is taken from the current capability value.
    /// Both components are written back once the device accepted the color.
    pub async fn set_color(&self, hue: Option<f64>, saturation: Option<f64>) -> Result<()> {
        let hue = match hue {
            Some(hue) => unit_input(Capability::LightHue, hue)?,
            None => self.current_level(Capability::LightHue),
        };
        let saturation = match saturation {
            Some(saturation) => unit_input(Capability::LightSaturation, saturation)?,
            None => self.current_level(Capability::LightSaturation),
        };

        let rgb = hsv_to_rgb(Hsv::new(hue, saturation, 1.0));
        self.send(StatePatch::color(rgb.to_array()), "color").await?;
        self.host.set_capability_value(Capability::LightHue, hue.into());
        self.host
            .set_capability_value(Capability::LightSaturation, saturation.into());
        Ok(())
    }

    /// Set color temperature from a 0-1 level (0 warm, 1 cold)
    pub async fn set_color_temperature(&self, level: f64) -> Result<()> {
        let level = unit_input(Capability::LightTemperature, level)?;
        self.send(
            StatePatch::color_temperature(to_byte(level)),
            "color temperature",
        )
        .await?;
        self.host
            .set_capability_value(Capability::LightTemperature, level.into());
        Ok(())
    }

    /// Select an effect by id, within `[0, max_effect_id]`
    pub async fn set_effect(&self, id: &str) -> Result<()> {
        let id = self.validate_indexed(OptionKind::Effect, id)?;
        self.send(StatePatch::effect(id), "effect").await?;
        self.host
            .set_capability_value(Capability::Effect, id.to_string().into());
        Ok(())
    }

    /// Select a palette by id, within `[0, max_palette_id]`
    pub async fn set_palette(&self, id: &str) -> Result<()> {
        let id = self.validate_indexed(OptionKind::Palette, id)?;
        self.send(StatePatch::palette(id), "palette").await?;
        self.host
            .set_capability_value(Capability::Palette, id.to_string().into());
        Ok(())
    }

    /// Activate a preset, or clear it with `-1`
    ///
    /// Positive ids are not checked against the cached preset list; the
    /// device may have presets that were added since the last fetch.
    pub async fn set_preset(&self, id: &str) -> Result<()> {
        let id = parse_id(OptionKind::Preset, id)?;
        if id != -1 && id < 1 {
            return Err(ValidationError::InvalidPreset(id).into());
        }

        self.send(StatePatch::preset(id), "preset").await?;
        self.host
            .set_capability_value(Capability::Preset, id.to_string().into());
        Ok(())
    }

    fn validate_indexed(&self, kind: OptionKind, raw: &str) -> Result<i64> {
        let id = parse_id(kind, raw)?;
        let max = {
            let s = self.state.lock();
            match kind {
                OptionKind::Effect => s.device.max_effect_id,
                OptionKind::Palette => s.device.max_palette_id,
                OptionKind::Preset => s.device.max_preset_id,
            }
        };

        if !(0..=max).contains(&id) {
            return Err(ValidationError::OutOfRange {
                kind,
                id,
                min: 0,
                max,
            }
            .into());
        }
        Ok(id)
    }

    fn current_level(&self, capability: Capability) -> f64 {
        self.host
            .capability_value(capability)
            .and_then(|v| v.as_f64())
            .filter(|v| v.is_finite())
            .map_or(0.0, |v| v.clamp(0.0, 1.0))
    }

    async fn send(&self, patch: StatePatch, what: &'static str) -> Result<()> {
        if self.is_disposed() {
            return Err(SyncError::Disposed);
        }

        let address = self.state.lock().device.address.clone();
        let Some(address) = address else {
            tracing::error!(device = %self.id, command = what, "No IP address configured");
            return Err(SyncError::Configuration(NO_ADDRESS_REASON.to_string()));
        };

        let body = patch.to_value();
        self.transport
            .post(&address, paths::STATE, &body, Some(self.config.request_timeout))
            .await
            .map_err(|e| {
                tracing::error!(device = %self.id, command = what, error = %e, "Error sending command");
                SyncError::from(e)
            })?;

        tracing::debug!(device = %self.id, command = what, %body, "Command sent");
        Ok(())
    }

    fn seed_defaults(&self) {
        let defaults: [(Capability, CapabilityValue); 6] = [
            (Capability::Effect, "0".into()),
            (Capability::Palette, "0".into()),
            (Capability::Preset, NO_PRESET_ID.into()),
            (Capability::LightTemperature, 0.5.into()),
            (Capability::LightHue, 0.0.into()),
            (Capability::LightSaturation, 0.0.into()),
        ];

        for (capability, value) in defaults {
            if self.host.capability_value(capability).is_none() {
                self.host.set_capability_value(capability, value);
            }
        }
    }
}

fn parse_id(kind: OptionKind, raw: &str) -> Result<i64> {
    raw.trim().parse::<i64>().map_err(|_| {
        ValidationError::NotNumeric {
            kind,
            value: raw.to_string(),
        }
        .into()
    })
}

fn unit_input(capability: Capability, value: f64) -> Result<f64> {
    if !value.is_finite() {
        return Err(ValidationError::InvalidLevel {
            capability: capability.as_str(),
            value,
        }
        .into());
    }
    Ok(value.clamp(0.0, 1.0))
}

fn to_byte(level: f64) -> u8 {
    (level * 255.0).round().clamp(0.0, 255.0) as u8
}
