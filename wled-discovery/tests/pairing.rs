//! Pairing lookups against scripted and mocked devices

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use mockito::Server;
use rstest::rstest;
use serde_json::{json, Value};
use wled_client::{HttpTransport, NetworkErrorKind, Transport, TransportError};
use wled_discovery::{
    fetch_pairing_record, list_pairing_candidates, Announcement, DiscoveryError, DiscoveryRegistry,
    PAIRING_TIMEOUT,
};

/// Answers `/json/info` per address; unknown addresses refuse the connection
struct InfoTable {
    infos: HashMap<String, Value>,
}

impl InfoTable {
    fn new(entries: &[(&str, Value)]) -> Self {
        Self {
            infos: entries
                .iter()
                .map(|(address, info)| (address.to_string(), info.clone()))
                .collect(),
        }
    }
}

#[async_trait]
impl Transport for InfoTable {
    async fn get(
        &self,
        address: &str,
        path: &str,
        timeout: Option<Duration>,
    ) -> wled_client::Result<Value> {
        assert_eq!(path, "/json/info");
        assert_eq!(timeout, Some(PAIRING_TIMEOUT));
        self.infos
            .get(address)
            .cloned()
            .ok_or_else(|| TransportError::network(NetworkErrorKind::Refused, "connection refused"))
    }

    async fn post(
        &self,
        _address: &str,
        _path: &str,
        _body: &Value,
        _timeout: Option<Duration>,
    ) -> wled_client::Result<Value> {
        panic!("pairing never writes to the device");
    }
}

#[rstest]
#[case(json!({"name": "Shelf", "mac": "aabbccddeeff"}), "Shelf", "wled-aabbccddeeff")]
#[case(json!({"name": "WLED", "host": "wled-shelf", "mac": "AA:BB:CC:DD:EE:FF"}), "wled-shelf", "wled-aabbccddeeff")]
#[case(json!({"name": "WLED", "mac": "aabbcc112233"}), "WLED-112233", "wled-aabbcc112233")]
#[case(json!({"name": "Shelf"}), "Shelf", "wled-192-168-1-20")]
#[tokio::test]
async fn test_pairing_name_and_id(
    #[case] info: Value,
    #[case] expected_name: &str,
    #[case] expected_id: &str,
) {
    let transport = InfoTable::new(&[("192.168.1.20", info)]);

    let record = fetch_pairing_record(&transport, "192.168.1.20").await.unwrap();
    assert_eq!(record.name, expected_name);
    assert_eq!(record.id.as_str(), expected_id);
}

#[tokio::test]
async fn test_pairing_settings_from_info() {
    let transport = InfoTable::new(&[(
        "10.0.0.7",
        json!({
            "name": "Desk",
            "mac": "001122334455",
            "ver": "0.14.0",
            "fxcount": 187,
            "palcount": 71,
            "leds": {"count": 150}
        }),
    )]);

    let record = fetch_pairing_record(&transport, "10.0.0.7").await.unwrap();
    let settings = record.settings;
    assert_eq!(settings.address, "10.0.0.7");
    assert_eq!(settings.polling_interval, 5000);
    assert_eq!(settings.version, "0.14.0");
    assert_eq!(settings.fxcount, 187);
    assert_eq!(settings.palcount, 71);
    assert_eq!(settings.led_count, 150);
}

#[tokio::test]
async fn test_empty_address_is_rejected() {
    let transport = InfoTable::new(&[]);
    let result = fetch_pairing_record(&transport, "  ").await;
    assert!(matches!(result, Err(DiscoveryError::InvalidAnnouncement(_))));
}

#[tokio::test]
async fn test_candidates_skip_unreachable_devices() {
    let registry = DiscoveryRegistry::new();
    registry.announce(Announcement::new("a", "10.0.0.1", None));
    registry.announce(Announcement::new("b", "10.0.0.2", None));
    registry.announce(Announcement::new("c", "10.0.0.3", None));

    let transport = InfoTable::new(&[
        ("10.0.0.1", json!({"name": "One", "mac": "000000000001"})),
        ("10.0.0.3", json!({"name": "Three", "mac": "000000000003"})),
    ]);

    let records = list_pairing_candidates(&registry, &transport).await;
    let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["One", "Three"]);
}

#[tokio::test]
async fn test_pairing_over_http() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/json/info")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"name":"Living Room","mac":"a8032a6b1cf0","ver":"0.15.0","leds":{"count":60}}"#)
        .create_async()
        .await;

    let transport = HttpTransport::new().unwrap();
    let address = server.host_with_port();
    let record = fetch_pairing_record(&transport, &address).await.unwrap();

    assert_eq!(record.name, "Living Room");
    assert_eq!(record.id.as_str(), "wled-a8032a6b1cf0");
    assert_eq!(record.settings.address, address);
    assert_eq!(record.settings.led_count, 60);
    mock.assert_async().await;
}
