use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BuildError, Result};
use crate::parser::ConstValue;

/// Replacement value for a numeric `const int|float` declaration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericSetting {
    Int(i64),
    Float(f32),
}

impl NumericSetting {
    pub fn to_value(self) -> ConstValue {
        match self {
            NumericSetting::Int(value) => ConstValue::Int(value),
            NumericSetting::Float(value) => ConstValue::Float(value),
        }
    }
}

/// One entry of a settings file: booleans drive `#if`, numbers replace
/// constant values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Number(NumericSetting),
}

/// Override tables applied to the entry file and every include.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildSettings {
    pub booleans: HashMap<String, bool>,
    pub numbers: HashMap<String, NumericSetting>,
}

impl BuildSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bool(mut self, name: &str, value: bool) -> Self {
        self.set(name, SettingValue::Bool(value));
        self
    }

    pub fn with_int(mut self, name: &str, value: i64) -> Self {
        self.set(name, SettingValue::Number(NumericSetting::Int(value)));
        self
    }

    pub fn with_float(mut self, name: &str, value: f32) -> Self {
        self.set(name, SettingValue::Number(NumericSetting::Float(value)));
        self
    }

    /// A name holds either a boolean or a number, never both.
    pub fn set(&mut self, name: &str, value: SettingValue) {
        match value {
            SettingValue::Bool(value) => {
                self.numbers.remove(name);
                self.booleans.insert(name.to_string(), value);
            }
            SettingValue::Number(value) => {
                self.booleans.remove(name);
                self.numbers.insert(name.to_string(), value);
            }
        }
    }

    /// Entries from `other` win.
    pub fn merge(&mut self, other: BuildSettings) {
        for (name, value) in other.booleans {
            self.set(&name, SettingValue::Bool(value));
        }
        for (name, value) in other.numbers {
            self.set(&name, SettingValue::Number(value));
        }
    }

    /// `{"DEBUG": true, "LIGHTS": 4, "SCALE": 0.5}`
    pub fn from_json(text: &str) -> Result<Self> {
        let entries: HashMap<String, SettingValue> = serde_json::from_str(text)?;
        let mut settings = BuildSettings::new();
        for (name, value) in entries {
            settings.set(&name, value);
        }
        Ok(settings)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| BuildError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// `DEBUG=true LIGHTS=4 "SCALE=0.5"`, split with shell quoting rules.
    pub fn from_assignments(text: &str) -> Result<Self> {
        let words = shlex::split(text).ok_or_else(|| BuildError::InvalidSetting(text.to_string()))?;
        let mut settings = BuildSettings::new();
        for word in words {
            let (name, raw) = word
                .split_once('=')
                .ok_or_else(|| BuildError::InvalidSetting(word.clone()))?;
            let name = name.trim();
            if name.is_empty() {
                return Err(BuildError::InvalidSetting(word.clone()));
            }
            let value = parse_setting_value(raw.trim())
                .ok_or_else(|| BuildError::InvalidSetting(word.clone()))?;
            settings.set(name, value);
        }
        Ok(settings)
    }
}

fn parse_setting_value(raw: &str) -> Option<SettingValue> {
    match raw {
        "true" => return Some(SettingValue::Bool(true)),
        "false" => return Some(SettingValue::Bool(false)),
        _ => {}
    }
    if let Ok(value) = raw.parse::<i64>() {
        return Some(SettingValue::Number(NumericSetting::Int(value)));
    }
    raw.parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| SettingValue::Number(NumericSetting::Float(v)))
}
