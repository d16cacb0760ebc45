//! Selectable options for the effect, palette and preset capabilities
//!
//! Options are kept in one internal shape, [`CapabilityOption`], and only
//! translated to the host's JSON format at the boundary.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::host::Capability;

/// Id of the "no preset" entry
pub const NO_PRESET_ID: &str = "-1";

/// Preset ids that are always offered, even if the device reports fewer
const MIN_PRESET_SLOTS: i64 = 10;

/// Which selector an option list belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    Effect,
    Palette,
    Preset,
}

impl OptionKind {
    pub const ALL: [OptionKind; 3] = [OptionKind::Effect, OptionKind::Palette, OptionKind::Preset];

    /// Capitalized label used for fallback display names
    pub fn label(&self) -> &'static str {
        match self {
            OptionKind::Effect => "Effect",
            OptionKind::Palette => "Palette",
            OptionKind::Preset => "Preset",
        }
    }

    /// The capability whose value selects from this list
    pub fn capability(&self) -> Capability {
        match self {
            OptionKind::Effect => Capability::Effect,
            OptionKind::Palette => Capability::Palette,
            OptionKind::Preset => Capability::Preset,
        }
    }
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionKind::Effect => write!(f, "effect"),
            OptionKind::Palette => write!(f, "palette"),
            OptionKind::Preset => write!(f, "preset"),
        }
    }
}

/// One selectable entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityOption {
    /// Device-native index as a string
    pub id: String,
    #[serde(rename = "name")]
    pub display_name: String,
}

impl CapabilityOption {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }

    /// Host representation: `{"id": "...", "title": {"en": "..."}}`
    pub fn to_host_value(&self) -> Value {
        json!({ "id": self.id, "title": { "en": self.display_name } })
    }

    /// Read an option from any of the shapes hosts have stored
    ///
    /// Accepts `title.en`, a string `title`, or `name`, falling back to
    /// `"Option <id>"`. Entries without an id are skipped.
    pub fn from_host_value(value: &Value) -> Option<Self> {
        let id = match value.get("id")? {
            Value::String(id) => id.clone(),
            Value::Number(id) => id.to_string(),
            _ => return None,
        };

        let name = match value.get("title") {
            Some(Value::Object(title)) => title.get("en").and_then(Value::as_str),
            Some(Value::String(title)) => Some(title.as_str()),
            _ => None,
        }
        .or_else(|| value.get("name").and_then(Value::as_str))
        .filter(|name| !name.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Option {}", id));

        Some(Self::new(id, name))
    }
}

/// Serialize a whole option list as `{"values": [...]}`
pub fn to_host_options(options: &[CapabilityOption]) -> Value {
    json!({ "values": options.iter().map(CapabilityOption::to_host_value).collect::<Vec<_>>() })
}

/// Parse a `{"values": [...]}` option list, skipping malformed entries
pub fn from_host_options(value: &Value) -> Vec<CapabilityOption> {
    value
        .get("values")
        .and_then(Value::as_array)
        .map(|values| values.iter().filter_map(CapabilityOption::from_host_value).collect())
        .unwrap_or_default()
}

/// Build a sorted option list from names indexed by device id
///
/// Id `"0"` stays first; everything else is ordered by name,
/// case-insensitively. Empty names become `"<Kind> <id>"`.
pub fn indexed_options<S: AsRef<str>>(kind: OptionKind, names: &[S]) -> Vec<CapabilityOption> {
    let mut options: Vec<CapabilityOption> = names
        .iter()
        .enumerate()
        .map(|(id, name)| {
            let name = name.as_ref().trim();
            let name = if name.is_empty() {
                format!("{} {}", kind.label(), id)
            } else {
                name.to_string()
            };
            CapabilityOption::new(id.to_string(), name)
        })
        .collect();

    options.sort_by(|a, b| match (a.id == "0", b.id == "0") {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a
            .display_name
            .to_lowercase()
            .cmp(&b.display_name.to_lowercase()),
    });
    options
}

/// Build the preset option list
///
/// Always starts with "No Preset" (`-1`), contains at least ids `1..=10`,
/// and is ordered numerically by id. Duplicate ids keep the first entry.
pub fn preset_options(presets: &[CapabilityOption]) -> Vec<CapabilityOption> {
    let mut options = vec![CapabilityOption::new(NO_PRESET_ID, "No Preset")];

    for preset in presets {
        if !options.iter().any(|o| o.id == preset.id) {
            options.push(preset.clone());
        }
    }

    for id in 1..=MIN_PRESET_SLOTS {
        let id = id.to_string();
        if !options.iter().any(|o| o.id == id) {
            options.push(CapabilityOption::new(id.clone(), format!("Preset {}", id)));
        }
    }

    options.sort_by_key(|o| {
        if o.id == NO_PRESET_ID {
            i64::MIN
        } else {
            o.id.parse::<i64>().unwrap_or(i64::MAX)
        }
    });
    options
}

/// Presets read from `/presets.json`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedPresets {
    /// Valid presets, unsorted and without the "No Preset" entry
    pub presets: Vec<CapabilityOption>,
    /// Highest valid preset id, 0 if there are none
    pub max_id: i64,
}

/// Extract valid presets from a `/presets.json` document
///
/// Keeps entries whose value is a non-empty object and whose key is a
/// strictly positive integer; underscore-prefixed keys are metadata. The
/// name comes from `n`, then `name`, then `"Preset <id>"`. Returns `None`
/// when the document is not an object.
pub fn parse_presets(document: &Value) -> Option<ParsedPresets> {
    let entries = document.as_object()?;

    let mut presets: Vec<CapabilityOption> = entries
        .iter()
        .filter(|(key, _)| !key.starts_with('_'))
        .filter_map(|(key, preset)| {
            let body = preset.as_object().filter(|body| !body.is_empty())?;
            let id = key.trim().parse::<i64>().ok().filter(|id| *id > 0)?;

            let name = ["n", "name"]
                .iter()
                .filter_map(|field| body.get(*field).and_then(Value::as_str))
                .map(str::trim)
                .find(|name| !name.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("Preset {}", id));

            Some(CapabilityOption::new(id.to_string(), name))
        })
        .collect();
    presets.sort_by_key(|p| p.id.parse::<i64>().unwrap_or(i64::MAX));

    let max_id = presets
        .iter()
        .filter_map(|p| p.id.parse::<i64>().ok())
        .max()
        .unwrap_or(0);

    Some(ParsedPresets { presets, max_id })
}

/// Built-in option list used when the device cannot be asked
pub fn default_options(kind: OptionKind) -> Vec<CapabilityOption> {
    match kind {
        OptionKind::Effect => indexed_options(kind, &DEFAULT_EFFECTS),
        OptionKind::Palette => indexed_options(kind, &DEFAULT_PALETTES),
        OptionKind::Preset => preset_options(&[]),
    }
}

/// Options whose name contains `query`, case-insensitively
///
/// An empty query matches everything.
pub fn filter_options(options: &[CapabilityOption], query: &str) -> Vec<CapabilityOption> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return options.to_vec();
    }

    options
        .iter()
        .filter(|o| o.display_name.to_lowercase().contains(&query))
        .cloned()
        .collect()
}

/// Effect names of the classic WLED firmware, by id
pub const DEFAULT_EFFECTS: [&str; 80] = [
    "Solid", "Blink", "Breathe", "Wipe", "Wipe Random", "Random Colors", "Sweep", "Dynamic",
    "Colorloop", "Rainbow", "Scan", "Dual Scan", "Fade", "Chase", "Chase Rainbow", "Running",
    "Saw", "Twinkle", "Dissolve", "Dissolve Rnd", "Sparkle", "Dark Sparkle", "Sparkle+",
    "Strobe", "Strobe Rainbow", "Mega Strobe", "Blink Rainbow", "Android", "Chase",
    "Chase Random", "Chase Rainbow", "Chase Flash", "Chase Flash Rnd", "Rainbow Runner",
    "Colorful", "Traffic Light", "Sweep Random", "Running 2", "Red & Blue", "Stream",
    "Scanner", "Lighthouse", "Fireworks", "Rain", "Merry Christmas", "Fire Flicker",
    "Gradient", "Loading", "In Out", "In In", "Out Out", "Out In", "Circus", "Halloween",
    "Tri Chase", "Tri Wipe", "Tri Fade", "Lightning", "ICU", "Multi Comet", "Dual Scanner",
    "Stream 2", "Oscillate", "Pride 2015", "Juggle", "Palette", "Fire 2012", "Colorwaves",
    "BPM", "Fill Noise", "Noise 1", "Noise 2", "Noise 3", "Noise 4", "Colortwinkle", "Lake",
    "Meteor", "Smooth Meteor", "Railway", "Ripple",
];

/// Palette names of the classic WLED firmware, by id
pub const DEFAULT_PALETTES: [&str; 47] = [
    "Default", "Random Cycle", "Primary Color", "Based on Primary", "Set Colors",
    "Based on Set", "Party", "Cloud", "Lava", "Ocean", "Forest", "Rainbow", "Rainbow Bands",
    "Sunset", "Rivendell", "Breeze", "Red & Blue", "Yellowout", "Analogous", "Splash",
    "Pastel", "Sunset 2", "Beech", "Vintage", "Departure", "Landscape", "Beach", "Sherbet",
    "Hult", "Hult 64", "Drywet", "Jul", "Grintage", "Rewhi", "Tertiary", "Fire", "Icefire",
    "Cyane", "Light Pink", "Autumn", "Magenta", "Magred", "Yelmag", "Yelblu", "Orange & Teal",
    "Tiamat", "April Night",
];

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(options: &[CapabilityOption]) -> Vec<&str> {
        options.iter().map(|o| o.id.as_str()).collect()
    }

    fn names(options: &[CapabilityOption]) -> Vec<&str> {
        options.iter().map(|o| o.display_name.as_str()).collect()
    }

    #[test]
    fn test_id_zero_is_pinned_first() {
        let options = indexed_options(OptionKind::Effect, &["Solid", "Zzz", "Aaa"]);
        assert_eq!(names(&options), vec!["Solid", "Aaa", "Zzz"]);
        assert_eq!(ids(&options), vec!["0", "2", "1"]);

        let options = indexed_options(OptionKind::Palette, &["Zebra", "apple", "Banana"]);
        assert_eq!(names(&options), vec!["Zebra", "apple", "Banana"]);
    }

    #[test]
    fn test_empty_names_fall_back_to_kind_label() {
        let options = indexed_options(OptionKind::Palette, &["Default", "", "  "]);
        assert_eq!(names(&options), vec!["Default", "Palette 1", "Palette 2"]);
    }

    #[test]
    fn test_presets_always_have_no_preset_and_ten_slots() {
        let options = preset_options(&[CapabilityOption::new("3", "Evening")]);
        assert_eq!(
            ids(&options),
            vec!["-1", "1", "2", "3", "4", "5", "6", "7", "8", "9", "10"]
        );
        assert_eq!(options[0].display_name, "No Preset");
        assert_eq!(options[3].display_name, "Evening");
    }

    #[test]
    fn test_presets_sort_numerically() {
        let options = preset_options(&[
            CapabilityOption::new("12", "Twelve"),
            CapabilityOption::new("2", "Two"),
        ]);
        assert_eq!(ids(&options).last(), Some(&"12"));
        assert_eq!(options[2].display_name, "Two");
        assert_eq!(options.len(), 12);
    }

    #[test]
    fn test_parse_presets_filters_invalid_entries() {
        let document = json!({
            "0": {},
            "1": {"n": "Warm", "on": true},
            "2": {"name": "Party"},
            "4": {"n": "", "bri": 80},
            "5": {},
            "-3": {"n": "Negative"},
            "_meta": {"n": "ignored"},
            "abc": {"n": "Not a number"},
            "7": "not-an-object"
        });

        let parsed = parse_presets(&document).unwrap();
        assert_eq!(ids(&parsed.presets), vec!["1", "2", "4"]);
        assert_eq!(names(&parsed.presets), vec!["Warm", "Party", "Preset 4"]);
        assert_eq!(parsed.max_id, 4);
    }

    #[test]
    fn test_parse_presets_without_valid_entries() {
        let parsed = parse_presets(&json!({"0": {}})).unwrap();
        assert!(parsed.presets.is_empty());
        assert_eq!(parsed.max_id, 0);

        assert!(parse_presets(&json!(null)).is_none());
        assert!(parse_presets(&json!([1, 2])).is_none());
    }

    #[test]
    fn test_default_lists() {
        let effects = default_options(OptionKind::Effect);
        assert_eq!(effects.len(), 80);
        assert_eq!(effects[0].display_name, "Solid");

        let palettes = default_options(OptionKind::Palette);
        assert_eq!(palettes.len(), 47);
        assert_eq!(palettes[0].display_name, "Default");

        let presets = default_options(OptionKind::Preset);
        assert_eq!(presets.len(), 11);
    }

    #[test]
    fn test_filter_is_case_insensitive() {
        let options = default_options(OptionKind::Effect);
        let matches = filter_options(&options, "NOISE");
        assert_eq!(
            names(&matches),
            vec!["Fill Noise", "Noise 1", "Noise 2", "Noise 3", "Noise 4"]
        );
        assert_eq!(filter_options(&options, "").len(), 80);
        assert!(filter_options(&options, "no such effect").is_empty());
    }

    #[test]
    fn test_host_format_round_trip() {
        let options = vec![CapabilityOption::new("0", "Solid"), CapabilityOption::new("1", "Blink")];
        let host = to_host_options(&options);
        assert_eq!(host["values"][1], json!({"id": "1", "title": {"en": "Blink"}}));
        assert_eq!(from_host_options(&host), options);
    }

    #[test]
    fn test_host_format_variants() {
        let host = json!({"values": [
            {"id": "1", "title": "Plain title"},
            {"id": "2", "name": "Named"},
            {"id": 3},
            {"title": {"en": "no id"}}
        ]});
        let options = from_host_options(&host);
        assert_eq!(ids(&options), vec!["1", "2", "3"]);
        assert_eq!(names(&options), vec!["Plain title", "Named", "Option 3"]);
    }
}
