//! Game configuration.
//!
//! A configuration is a flat map of option id to resolved value. The core
//! only ever reads resolved values; the companion [`OptionDescriptor`] list
//! exists for the surrounding UI to render controls and is never consulted
//! by game logic.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A resolved option value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Text(String),
    Number(f64),
    Null,
}

/// Flat map of option id to resolved value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GameConfig {
    values: BTreeMap<String, ConfigValue>,
}

impl GameConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, replacing any previous one
    pub fn set(mut self, id: impl Into<String>, value: ConfigValue) -> Self {
        self.values.insert(id.into(), value);
        self
    }

    pub fn get(&self, id: &str) -> Option<&ConfigValue> {
        self.values.get(id)
    }

    /// Boolean option, with a default for absent/null/mistyped values
    pub fn bool_or(&self, id: &str, default: bool) -> bool {
        match self.values.get(id) {
            Some(ConfigValue::Bool(v)) => *v,
            _ => default,
        }
    }

    /// Numeric option, with a default
    pub fn number_or(&self, id: &str, default: f64) -> f64 {
        match self.values.get(id) {
            Some(ConfigValue::Number(v)) => *v,
            _ => default,
        }
    }

    /// Numeric option truncated to an integer, with a default
    pub fn integer_or(&self, id: &str, default: i64) -> i64 {
        match self.values.get(id) {
            Some(ConfigValue::Number(v)) => *v as i64,
            _ => default,
        }
    }

    /// Text option, with a default
    pub fn text_or<'a>(&'a self, id: &str, default: &'a str) -> &'a str {
        match self.values.get(id) {
            Some(ConfigValue::Text(v)) => v,
            _ => default,
        }
    }
}

/// Control type a UI should render for an option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum OptionKind {
    /// On/off switch
    Toggle,
    /// One of a fixed list of choices
    Choice { choices: Vec<String> },
    /// Free-form text entry
    TextInput,
    /// Numeric entry within bounds
    NumberInput { min: f64, max: f64 },
}

/// UI-facing description of one configurable option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionDescriptor {
    pub id: String,
    pub label: String,
    #[serde(flatten)]
    pub kind: OptionKind,
    pub default: ConfigValue,
}

impl OptionDescriptor {
    pub fn new(id: impl Into<String>, label: impl Into<String>, kind: OptionKind, default: ConfigValue) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind,
            default,
        }
    }
}
