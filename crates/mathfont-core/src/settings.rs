use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;

/// Fonts offered in the selection UI when the user hasn't edited the list.
pub const DEFAULT_FONT_FAMILY_LIST: &str = "Asana Math, Cambria Math, DejaVu Math TeX Gyre, \
Latin Modern Math, Libertinus Math, Lucida Bright Math, Minion Math, STIX Two Math, \
TeX Gyre Bonum Math, TeX Gyre Pagella Math, TeX Gyre Schola Math, TeX Gyre Termes Math, XITS Math";

/// Scale percentage that leaves the page's own font size alone.
pub const UNSCALED: i64 = 100;

/// The fixed set of keys the settings record is made of.
///
/// Storage areas may hold other keys; those are never read into the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SettingKey {
    MathFontFamilyList,
    MathFontFamily,
    MathFontScale,
    MathFontImportant,
}

impl SettingKey {
    pub const ALL: [SettingKey; 4] = [
        SettingKey::MathFontFamilyList,
        SettingKey::MathFontFamily,
        SettingKey::MathFontScale,
        SettingKey::MathFontImportant,
    ];

    /// Name of the key in the storage area.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MathFontFamilyList => "mathFontFamilyList",
            Self::MathFontFamily => "mathFontFamily",
            Self::MathFontScale => "mathFontScale",
            Self::MathFontImportant => "mathFontImportant",
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| CoreError::UnknownKey(s.to_string()))
    }
}

/// The canonical settings record. Always fully populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Comma-separated family names for the selection UI. Not rendered.
    pub math_font_family_list: String,
    /// Selected override family. Empty = no override.
    pub math_font_family: String,
    /// Percentage. 0 and 100 = no override.
    pub math_font_scale: i64,
    /// Whether generated declarations carry `!important`.
    pub math_font_important: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            math_font_family_list: DEFAULT_FONT_FAMILY_LIST.to_string(),
            math_font_family: String::new(),
            math_font_scale: UNSCALED,
            math_font_important: true,
        }
    }
}

impl Settings {
    /// Build the record from a raw storage map.
    ///
    /// Keys absent from `stored` take their default. Present keys are decoded
    /// as they are, never replaced by the default even when malformed.
    pub fn from_storage(stored: &Map<String, Value>) -> Self {
        let mut settings = Self::default();
        for key in SettingKey::ALL {
            if let Some(value) = stored.get(key.as_str()) {
                settings.apply(key, value);
            }
        }
        settings
    }

    /// Keys of the record that `stored` doesn't carry.
    pub fn missing_keys(stored: &Map<String, Value>) -> Vec<SettingKey> {
        SettingKey::ALL
            .into_iter()
            .filter(|key| !stored.contains_key(key.as_str()))
            .collect()
    }

    /// Overwrite one field with a raw stored value.
    pub fn apply(&mut self, key: SettingKey, value: &Value) {
        match key {
            SettingKey::MathFontFamilyList => self.math_font_family_list = decode_text(value),
            SettingKey::MathFontFamily => self.math_font_family = decode_text(value),
            SettingKey::MathFontScale => self.math_font_scale = decode_scale(value),
            SettingKey::MathFontImportant => self.math_font_important = decode_flag(value),
        }
    }

    /// Put one field back to its default.
    pub fn reset(&mut self, key: SettingKey) {
        let defaults = Self::default();
        match key {
            SettingKey::MathFontFamilyList => {
                self.math_font_family_list = defaults.math_font_family_list
            }
            SettingKey::MathFontFamily => self.math_font_family = defaults.math_font_family,
            SettingKey::MathFontScale => self.math_font_scale = defaults.math_font_scale,
            SettingKey::MathFontImportant => {
                self.math_font_important = defaults.math_font_important
            }
        }
    }

    pub fn get(&self, key: SettingKey) -> Value {
        match key {
            SettingKey::MathFontFamilyList => Value::from(self.math_font_family_list.as_str()),
            SettingKey::MathFontFamily => Value::from(self.math_font_family.as_str()),
            SettingKey::MathFontScale => Value::from(self.math_font_scale),
            SettingKey::MathFontImportant => Value::from(self.math_font_important),
        }
    }

    /// Keys whose value differs between `self` and `other`.
    pub fn diff(&self, other: &Settings) -> Vec<SettingKey> {
        SettingKey::ALL
            .into_iter()
            .filter(|key| self.get(*key) != other.get(*key))
            .collect()
    }
}

/// A partial record, as written by the settings page or a menu selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub math_font_family_list: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub math_font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub math_font_scale: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub math_font_important: Option<bool>,
}

impl SettingsPatch {
    pub fn family(family: impl Into<String>) -> Self {
        Self {
            math_font_family: Some(family.into()),
            ..Self::default()
        }
    }

    pub fn scale(scale: i64) -> Self {
        Self {
            math_font_scale: Some(scale),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_storage().is_empty()
    }

    /// The raw key/value pairs to hand to a storage area.
    pub fn to_storage(&self) -> Map<String, Value> {
        let mut map = Map::new();
        if let Some(list) = &self.math_font_family_list {
            map.insert(
                SettingKey::MathFontFamilyList.to_string(),
                Value::from(list.as_str()),
            );
        }
        if let Some(family) = &self.math_font_family {
            map.insert(
                SettingKey::MathFontFamily.to_string(),
                Value::from(family.as_str()),
            );
        }
        if let Some(scale) = self.math_font_scale {
            map.insert(SettingKey::MathFontScale.to_string(), Value::from(scale));
        }
        if let Some(important) = self.math_font_important {
            map.insert(
                SettingKey::MathFontImportant.to_string(),
                Value::from(important),
            );
        }
        map
    }
}

/// What one storage notification did to the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsUpdate {
    pub previous: Settings,
    pub current: Settings,
    /// Keys named by the notification, in [`SettingKey::ALL`] order.
    pub changed: Vec<SettingKey>,
}

impl SettingsUpdate {
    pub fn touches(&self, key: SettingKey) -> bool {
        self.changed.contains(&key)
    }
}

fn decode_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

// The settings page stores the scale as typed text, so numeric strings count.
// Anything else lands on 0, which synthesis treats as "no override". Fractions
// are truncated: the record holds whole percents.
fn decode_scale(value: &Value) -> i64 {
    let number = match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => return i,
            None => n.as_f64(),
        },
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match number {
        Some(f) if f.is_finite() => f.trunc() as i64,
        _ => 0,
    }
}

fn decode_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Null => false,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
