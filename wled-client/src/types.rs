//! Typed models for the WLED JSON API
//!
//! Inbound models are lenient: every field is optional and unknown fields are
//! ignored, because WLED firmware versions disagree on what they report.
//! Outbound patches only serialize the fields that are set.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, TransportError};

/// Decode a JSON value into one of the typed models
pub fn decode<T: serde::de::DeserializeOwned>(value: Value, what: &str) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| TransportError::Protocol(format!("unexpected {} payload: {}", what, e)))
}

/// Response of `GET /json/state`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WledState {
    pub on: Option<bool>,
    pub bri: Option<i64>,
    #[serde(default)]
    pub seg: Vec<Segment>,
    /// Active preset, `-1` when none
    pub ps: Option<i64>,
    /// Active playlist, `-1` when none
    pub pl: Option<i64>,
}

impl WledState {
    /// Segment 0, the only segment this SDK manipulates
    pub fn primary_segment(&self) -> Option<&Segment> {
        self.seg.first()
    }
}

/// One entry of the `seg` array
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Segment {
    #[serde(default)]
    pub col: Vec<Value>,
    pub fx: Option<i64>,
    pub pal: Option<i64>,
    pub cct: Option<i64>,
}

impl Segment {
    /// First color slot as an RGB triple
    ///
    /// Accepts RGB and RGBW slots; channel values are clamped to 0-255.
    pub fn primary_rgb(&self) -> Option<[u8; 3]> {
        let slot = self.col.first()?.as_array()?;
        if slot.len() < 3 {
            return None;
        }

        let mut rgb = [0u8; 3];
        for (channel, value) in rgb.iter_mut().zip(slot.iter()) {
            *channel = value.as_f64()?.round().clamp(0.0, 255.0) as u8;
        }
        Some(rgb)
    }
}

/// Response of `GET /json`
///
/// Only the parts needed to build effect/palette option lists are modelled.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceDescriptor {
    pub effects: Option<Value>,
    pub palettes: Option<Value>,
    pub fxcount: Option<u32>,
    pub palcount: Option<u32>,
    pub info: Option<DeviceInfo>,
}

impl DeviceDescriptor {
    /// Effect names by index, if the device reported an effect array
    pub fn effect_names(&self) -> Option<Vec<String>> {
        string_array(self.effects.as_ref())
    }

    /// Palette names by index, if the device reported a palette array
    pub fn palette_names(&self) -> Option<Vec<String>> {
        string_array(self.palettes.as_ref())
    }

    /// Effect count, from the top level or the embedded info block
    pub fn effect_count(&self) -> Option<u32> {
        self.fxcount
            .or_else(|| self.info.as_ref().and_then(|info| info.fxcount))
    }

    /// Palette count, from the top level or the embedded info block
    pub fn palette_count(&self) -> Option<u32> {
        self.palcount
            .or_else(|| self.info.as_ref().and_then(|info| info.palcount))
    }
}

/// Non-string entries become empty names so indices stay aligned
fn string_array(value: Option<&Value>) -> Option<Vec<String>> {
    let items = value?.as_array()?;
    Some(
        items
            .iter()
            .map(|item| item.as_str().unwrap_or_default().to_string())
            .collect(),
    )
}

/// Response of `GET /json/info`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DeviceInfo {
    pub name: Option<String>,
    pub host: Option<String>,
    pub mac: Option<String>,
    pub ver: Option<String>,
    pub brand: Option<String>,
    pub leds: Option<LedInfo>,
    pub fxcount: Option<u32>,
    pub palcount: Option<u32>,
}

impl DeviceInfo {
    /// Number of LEDs driven by the controller, 0 if unknown
    pub fn led_count(&self) -> u32 {
        self.leds.as_ref().map(|leds| leds.count).unwrap_or(0)
    }
}

/// The `leds` block of `/json/info`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LedInfo {
    pub count: u32,
}

/// Partial state sent with `POST /json/state`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bri: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seg: Option<Vec<SegmentPatch>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ps: Option<i64>,
}

/// Segment part of a [`StatePatch`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SegmentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub col: Option<Vec<[u8; 3]>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cct: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fx: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pal: Option<i64>,
}

impl StatePatch {
    /// `{"on": on}`
    pub fn power(on: bool) -> Self {
        Self {
            on: Some(on),
            ..Default::default()
        }
    }

    /// `{"bri": bri}`
    pub fn brightness(bri: u8) -> Self {
        Self {
            bri: Some(bri),
            ..Default::default()
        }
    }

    /// `{"seg": [{"col": [[r, g, b]]}]}`
    pub fn color(rgb: [u8; 3]) -> Self {
        Self::segment(SegmentPatch {
            col: Some(vec![rgb]),
            ..Default::default()
        })
    }

    /// `{"seg": [{"col": [[255, 255, 255]], "cct": cct}]}`
    ///
    /// CCT simulation on RGB strips only works over a white base color.
    pub fn color_temperature(cct: u8) -> Self {
        Self::segment(SegmentPatch {
            col: Some(vec![[255, 255, 255]]),
            cct: Some(cct),
            ..Default::default()
        })
    }

    /// `{"seg": [{"fx": id}]}`
    pub fn effect(id: i64) -> Self {
        Self::segment(SegmentPatch {
            fx: Some(id),
            ..Default::default()
        })
    }

    /// `{"seg": [{"pal": id}]}`
    pub fn palette(id: i64) -> Self {
        Self::segment(SegmentPatch {
            pal: Some(id),
            ..Default::default()
        })
    }

    /// `{"ps": id}`
    pub fn preset(id: i64) -> Self {
        Self {
            ps: Some(id),
            ..Default::default()
        }
    }

    fn segment(segment: SegmentPatch) -> Self {
        Self {
            seg: Some(vec![segment]),
            ..Default::default()
        }
    }

    /// Serialize to the JSON body sent to the device
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_full_state() {
        let state: WledState = decode(
            json!({
                "on": true,
                "bri": 128,
                "ps": -1,
                "seg": [{"fx": 5, "pal": 2, "cct": 127, "col": [[255, 0, 0], [0, 0, 0], [0, 0, 0]]}]
            }),
            "state",
        )
        .unwrap();

        assert_eq!(state.on, Some(true));
        assert_eq!(state.bri, Some(128));
        assert_eq!(state.ps, Some(-1));
        let segment = state.primary_segment().unwrap();
        assert_eq!(segment.fx, Some(5));
        assert_eq!(segment.pal, Some(2));
        assert_eq!(segment.cct, Some(127));
        assert_eq!(segment.primary_rgb(), Some([255, 0, 0]));
    }

    #[test]
    fn test_decode_rejects_wrong_shape() {
        let result: Result<WledState> = decode(json!({"on": "yes"}), "state");
        assert!(matches!(result, Err(TransportError::Protocol(_))));
    }

    #[test]
    fn test_primary_rgb_accepts_rgbw_and_rejects_short_slots() {
        let segment = Segment {
            col: vec![json!([10, 20, 30, 40])],
            ..Default::default()
        };
        assert_eq!(segment.primary_rgb(), Some([10, 20, 30]));

        let segment = Segment {
            col: vec![json!([10, 20])],
            ..Default::default()
        };
        assert_eq!(segment.primary_rgb(), None);
    }

    #[test]
    fn test_descriptor_names_and_counts() {
        let descriptor: DeviceDescriptor = decode(
            json!({
                "effects": ["Solid", 7, "Breathe"],
                "palettes": "not-an-array",
                "info": {"fxcount": 3, "palcount": 71}
            }),
            "descriptor",
        )
        .unwrap();

        assert_eq!(
            descriptor.effect_names(),
            Some(vec!["Solid".to_string(), String::new(), "Breathe".to_string()])
        );
        assert_eq!(descriptor.palette_names(), None);
        assert_eq!(descriptor.effect_count(), Some(3));
        assert_eq!(descriptor.palette_count(), Some(71));
    }

    #[test]
    fn test_patch_serialization() {
        assert_eq!(StatePatch::power(false).to_value(), json!({"on": false}));
        assert_eq!(StatePatch::brightness(128).to_value(), json!({"bri": 128}));
        assert_eq!(StatePatch::effect(12).to_value(), json!({"seg": [{"fx": 12}]}));
        assert_eq!(StatePatch::palette(3).to_value(), json!({"seg": [{"pal": 3}]}));
        assert_eq!(StatePatch::preset(-1).to_value(), json!({"ps": -1}));
        assert_eq!(
            StatePatch::color([0, 128, 255]).to_value(),
            json!({"seg": [{"col": [[0, 128, 255]]}]})
        );
        assert_eq!(
            StatePatch::color_temperature(200).to_value(),
            json!({"seg": [{"col": [[255, 255, 255]], "cct": 200}]})
        );
    }
}
