//! Scheduling of the background poll loop, on paused tokio time

mod helpers;

use std::time::Duration;

use helpers::{descriptor, engine, host, red_effect_state, Reply, ScriptedTransport};
use serde_json::json;
use tokio::time::sleep;
use wled_client::paths;
use wled_state::{Capability, CapabilityValue, DeviceHost, NO_ADDRESS_REASON};

fn scripted_device() -> std::sync::Arc<ScriptedTransport> {
    let transport = ScriptedTransport::new();
    transport.respond(paths::STATE, Reply::Json(red_effect_state()));
    transport.respond(paths::DESCRIPTOR, Reply::Json(descriptor(&["Solid"], &["Default"])));
    transport.respond(paths::PRESETS, Reply::Json(json!({})));
    transport
}

#[tokio::test(start_paused = true)]
async fn test_loop_polls_on_base_interval_until_disposed() {
    let transport = scripted_device();
    let host = host(json!({"address": "10.0.0.2"}));
    let engine = engine(&transport, &host);

    engine.initialize();
    assert!(engine.is_running());

    sleep(Duration::from_millis(500)).await;
    assert_eq!(transport.count("GET", paths::STATE), 0);

    sleep(Duration::from_millis(1_000)).await;
    assert_eq!(transport.count("GET", paths::STATE), 1);

    sleep(Duration::from_millis(5_000)).await;
    assert_eq!(transport.count("GET", paths::STATE), 2);

    engine.dispose();
    assert!(!engine.is_running());
    let calls = transport.calls().len();
    sleep(Duration::from_secs(30)).await;
    assert_eq!(transport.calls().len(), calls);
}

#[tokio::test(start_paused = true)]
async fn test_loop_backs_off_while_unreachable() {
    let transport = ScriptedTransport::new();
    transport.respond(paths::STATE, Reply::Refused);
    let host = host(json!({"address": "10.0.0.2"}));
    let engine = engine(&transport, &host);

    engine.initialize();

    // Polls at 1s, 6s, 16s and 36s
    sleep(Duration::from_millis(36_500)).await;
    assert_eq!(transport.count("GET", paths::STATE), 4);
    assert_eq!(engine.snapshot().next_delay, Duration::from_secs(40));

    sleep(Duration::from_secs(30)).await;
    assert_eq!(transport.count("GET", paths::STATE), 4);

    engine.dispose();
}

#[tokio::test(start_paused = true)]
async fn test_settings_change_preempts_pending_poll() {
    let transport = scripted_device();
    let host = host(json!({"address": "10.0.0.2"}));
    let engine = engine(&transport, &host);

    engine.initialize();
    sleep(Duration::from_millis(1_500)).await;
    assert_eq!(transport.count("GET", paths::STATE), 1);

    let changed = host.update_settings(helpers::settings(json!({"address": "10.0.0.9"})));
    assert_eq!(changed, vec!["address".to_string()]);
    engine.on_settings_changed(&changed, &host.settings()).await;

    sleep(Duration::from_millis(100)).await;
    let polls: Vec<String> = transport
        .calls()
        .into_iter()
        .filter(|c| c.path == paths::STATE)
        .map(|c| c.address)
        .collect();
    assert_eq!(polls, vec!["10.0.0.2", "10.0.0.9"]);

    engine.dispose();
}

#[tokio::test(start_paused = true)]
async fn test_initialize_seeds_missing_defaults_only() {
    let transport = scripted_device();
    let host = host(json!({"address": "10.0.0.2"}));
    host.set_capability_value(Capability::Palette, "4".into());
    let engine = engine(&transport, &host);

    engine.initialize();
    engine.initialize();

    assert_eq!(
        host.capability_value(Capability::Effect),
        Some(CapabilityValue::Id("0".into()))
    );
    assert_eq!(
        host.capability_value(Capability::Palette),
        Some(CapabilityValue::Id("4".into()))
    );
    assert_eq!(
        host.capability_value(Capability::Preset),
        Some(CapabilityValue::Id("-1".into()))
    );
    assert_eq!(
        host.capability_value(Capability::LightTemperature),
        Some(CapabilityValue::Number(0.5))
    );

    sleep(Duration::from_millis(1_500)).await;
    assert_eq!(transport.count("GET", paths::STATE), 1);

    engine.dispose();
}

#[tokio::test(start_paused = true)]
async fn test_deferred_fetch_runs_without_successful_poll() {
    let transport = ScriptedTransport::new();
    transport.respond(paths::DESCRIPTOR, Reply::Json(descriptor(&["Solid", "Blink"], &["Default"])));
    transport.respond(paths::PRESETS, Reply::Json(json!({})));
    let host = host(json!({"address": "10.0.0.2"}));
    let engine = engine(&transport, &host);

    engine.initialize();
    sleep(Duration::from_millis(2_500)).await;

    assert_eq!(transport.count("GET", paths::DESCRIPTOR), 1);
    assert!(engine.snapshot().options_fetched);

    engine.dispose();
}

#[tokio::test(start_paused = true)]
async fn test_loop_without_address_stays_unavailable() {
    let transport = ScriptedTransport::new();
    let host = host(json!({}));
    let engine = engine(&transport, &host);

    engine.initialize();
    sleep(Duration::from_secs(12)).await;

    assert!(transport.calls().is_empty());
    assert_eq!(host.availability().reason(), Some(NO_ADDRESS_REASON));
    assert_eq!(engine.snapshot().consecutive_errors, 0);

    engine.dispose();
}

#[tokio::test]
async fn test_disposed_engine_cannot_be_initialized() {
    let transport = scripted_device();
    let host = host(json!({"address": "10.0.0.2"}));
    let engine = engine(&transport, &host);

    engine.dispose();
    engine.initialize();

    assert!(!engine.is_running());
    assert_eq!(host.capability_value(Capability::Effect), None);
}
