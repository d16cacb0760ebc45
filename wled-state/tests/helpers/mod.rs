//! Shared fixtures for engine tests
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use wled_client::{NetworkErrorKind, Transport, TransportError};
use wled_discovery::DeviceId;
use wled_state::{EngineConfig, MemoryHost, SyncEngine};

/// How the scripted device answers one request
#[derive(Debug, Clone)]
pub enum Reply {
    Json(Value),
    Refused,
    Timeout,
}

/// A request the engine made
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: &'static str,
    pub address: String,
    pub path: String,
    pub body: Option<Value>,
}

/// In-memory transport with per-route replies and a call log
///
/// Unscripted GETs are refused; unscripted POSTs succeed.
#[derive(Default)]
pub struct ScriptedTransport {
    defaults: Mutex<HashMap<String, Reply>>,
    queued: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<Call>>,
    latency: Duration,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Every request takes `latency` before answering
    pub fn with_latency(latency: Duration) -> Arc<Self> {
        Arc::new(Self {
            latency,
            ..Default::default()
        })
    }

    fn route(method: &str, path: &str) -> String {
        format!("{} {}", method, path)
    }

    /// Answer every GET of `path` with `reply`
    pub fn respond(&self, path: &str, reply: Reply) {
        self.defaults.lock().insert(Self::route("GET", path), reply);
    }

    /// Answer the next GET of `path` with `reply`, before the default
    pub fn respond_once(&self, path: &str, reply: Reply) {
        self.queued
            .lock()
            .entry(Self::route("GET", path))
            .or_default()
            .push_back(reply);
    }

    /// Answer every POST of `path` with `reply`
    pub fn respond_post(&self, path: &str, reply: Reply) {
        self.defaults.lock().insert(Self::route("POST", path), reply);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn count(&self, method: &str, path: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.method == method && c.path == path)
            .count()
    }

    /// Bodies of every POST, in order
    pub fn posted(&self) -> Vec<Value> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| c.body.clone())
            .collect()
    }

    async fn answer(&self, call: Call) -> wled_client::Result<Value> {
        let route = Self::route(call.method, &call.path);
        let method = call.method;
        self.calls.lock().push(call);

        if self.latency.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.latency).await;
        }

        let queued = self.queued.lock().get_mut(&route).and_then(VecDeque::pop_front);
        let reply = queued.or_else(|| self.defaults.lock().get(&route).cloned());

        match reply {
            Some(Reply::Json(value)) => Ok(value),
            Some(Reply::Timeout) => Err(TransportError::network(
                NetworkErrorKind::Timeout,
                "request timed out",
            )),
            Some(Reply::Refused) => Err(TransportError::network(
                NetworkErrorKind::Refused,
                "connection refused",
            )),
            None if method == "POST" => Ok(json!({"success": true})),
            None => Err(TransportError::network(
                NetworkErrorKind::Refused,
                "connection refused",
            )),
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(
        &self,
        address: &str,
        path: &str,
        _timeout: Option<Duration>,
    ) -> wled_client::Result<Value> {
        self.answer(Call {
            method: "GET",
            address: address.to_string(),
            path: path.to_string(),
            body: None,
        })
        .await
    }

    async fn post(
        &self,
        address: &str,
        path: &str,
        body: &Value,
        _timeout: Option<Duration>,
    ) -> wled_client::Result<Value> {
        self.answer(Call {
            method: "POST",
            address: address.to_string(),
            path: path.to_string(),
            body: Some(body.clone()),
        })
        .await
    }
}

pub fn settings(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {}", other),
    }
}

pub fn host(value: Value) -> Arc<MemoryHost> {
    Arc::new(MemoryHost::with_settings(settings(value)))
}

pub fn engine(transport: &Arc<ScriptedTransport>, host: &Arc<MemoryHost>) -> Arc<SyncEngine> {
    SyncEngine::new(
        DeviceId::from_address("10.0.0.2"),
        transport.clone(),
        host.clone(),
        EngineConfig::default(),
    )
}

/// Red at half brightness running effect 5 on palette 2
pub fn red_effect_state() -> Value {
    json!({
        "on": true,
        "bri": 128,
        "seg": [{"fx": 5, "pal": 2, "col": [[255, 0, 0]]}]
    })
}

pub fn descriptor(effects: &[&str], palettes: &[&str]) -> Value {
    json!({
        "effects": effects,
        "palettes": palettes,
        "info": {"fxcount": effects.len(), "palcount": palettes.len()}
    })
}
