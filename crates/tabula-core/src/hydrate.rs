//! Hydration and validation of raw wire payloads.
//!
//! Every persisted entity has two representations: a plain, schema-checked
//! JSON shape (the raw record) and a behavior-bearing Rust value (the
//! hydrated object). This module provides:
//! - [`Schema`]: a declarative description of the expected shape
//! - [`SchemaError`]: the rejection carrying *every* failing field
//! - [`Hydrate`]: the trait tying the two representations together
//!
//! Hydration clones; it never mutates the raw record, and hydrating the same
//! record twice yields equal values. `dehydrate` returns a fresh structural
//! copy, never a reference into the hydrated object.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Expected shape of a single JSON value.
#[derive(Debug, Clone, PartialEq)]
pub enum Kind {
    /// JSON boolean
    Bool,
    /// JSON string
    Text,
    /// Any JSON number
    Number,
    /// A number with no fractional part
    Integer,
    /// JSON null
    Null,
    /// Any value accepted unchecked
    Any,
    /// Array whose elements all match the inner kind
    Array(Box<Kind>),
    /// Object matching a nested schema
    Object(Box<Schema>),
    /// Any JSON object, fields unchecked
    Map,
}

impl Kind {
    fn matches(&self, value: &Value, path: &str, failures: &mut Vec<FieldFailure>) {
        match self {
            Kind::Bool if value.is_boolean() => {}
            Kind::Text if value.is_string() => {}
            Kind::Number if value.is_number() => {}
            Kind::Integer if value.is_i64() || value.is_u64() => {}
            Kind::Null if value.is_null() => {}
            Kind::Any => {}
            Kind::Map if value.is_object() => {}
            Kind::Array(inner) => match value.as_array() {
                Some(items) => {
                    for (i, item) in items.iter().enumerate() {
                        inner.matches(item, &format!("{path}[{i}]"), failures);
                    }
                }
                None => failures.push(FieldFailure::expected(path, "array", value)),
            },
            Kind::Object(schema) => match value.as_object() {
                Some(_) => schema.check_at(value, path, failures),
                None => failures.push(FieldFailure::expected(path, "object", value)),
            },
            _ => failures.push(FieldFailure::expected(path, self.describe(), value)),
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Kind::Bool => "boolean",
            Kind::Text => "string",
            Kind::Number => "number",
            Kind::Integer => "integer",
            Kind::Null => "null",
            Kind::Any => "any",
            Kind::Array(_) => "array",
            Kind::Object(_) => "object",
            Kind::Map => "object",
        }
    }
}

/// One field that failed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFailure {
    /// Dotted path to the field (`players[2].bid`)
    pub field: String,
    /// What went wrong
    pub message: String,
}

impl FieldFailure {
    fn expected(path: &str, kind: &str, got: &Value) -> Self {
        Self {
            field: path.to_string(),
            message: format!("expected {kind}, got {}", type_name(got)),
        }
    }

    fn missing(path: &str) -> Self {
        Self {
            field: path.to_string(),
            message: "required field is missing".to_string(),
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Raw payload rejected at the hydration boundary.
///
/// Lists every failing field, not just the first, so a caller can surface a
/// complete diagnosis in one round trip.
#[derive(Debug, Clone, PartialEq, Error)]
pub struct SchemaError {
    /// Name of the schema that rejected the payload
    pub schema: String,
    /// All failing fields
    pub failures: Vec<FieldFailure>,
}

impl SchemaError {
    /// Wrap a serde decode failure that slipped past the shape check
    pub fn decode(schema: &str, err: serde_json::Error) -> Self {
        Self {
            schema: schema.to_string(),
            failures: vec![FieldFailure {
                field: "<root>".to_string(),
                message: err.to_string(),
            }],
        }
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "schema '{}' rejected payload:", self.schema)?;
        for failure in &self.failures {
            write!(f, " [{}: {}]", failure.field, failure.message)?;
        }
        Ok(())
    }
}

/// One field rule inside a schema.
#[derive(Debug, Clone, PartialEq)]
struct FieldRule {
    name: &'static str,
    kind: Kind,
    required: bool,
}

/// Declarative description of an expected JSON object.
///
/// Built fluently:
/// ```
/// use tabula_core::hydrate::{Kind, Schema};
///
/// let schema = Schema::object("bid")
///     .field("playerId", Kind::Text)
///     .field("amount", Kind::Integer)
///     .optional("note", Kind::Text);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    name: &'static str,
    fields: Vec<FieldRule>,
    allow_unknown: bool,
}

impl Schema {
    /// Start a schema for a named object shape
    pub fn object(name: &'static str) -> Self {
        Self {
            name,
            fields: Vec::new(),
            allow_unknown: true,
        }
    }

    /// Name of this schema
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Add a required field
    pub fn field(mut self, name: &'static str, kind: Kind) -> Self {
        self.fields.push(FieldRule {
            name,
            kind,
            required: true,
        });
        self
    }

    /// Add an optional field (absent and `null` both accepted)
    pub fn optional(mut self, name: &'static str, kind: Kind) -> Self {
        self.fields.push(FieldRule {
            name,
            kind,
            required: false,
        });
        self
    }

    /// Reject fields not named by the schema
    pub fn deny_unknown(mut self) -> Self {
        self.allow_unknown = false;
        self
    }

    /// Validate a raw value, collecting every failing field.
    pub fn check(&self, raw: &Value) -> Result<(), SchemaError> {
        let mut failures = Vec::new();
        self.check_at(raw, "", &mut failures);
        if failures.is_empty() {
            Ok(())
        } else {
            Err(SchemaError {
                schema: self.name.to_string(),
                failures,
            })
        }
    }

    fn check_at(&self, raw: &Value, path: &str, failures: &mut Vec<FieldFailure>) {
        let object = match raw.as_object() {
            Some(o) => o,
            None => {
                let at = if path.is_empty() { "<root>" } else { path };
                failures.push(FieldFailure::expected(at, "object", raw));
                return;
            }
        };

        for rule in &self.fields {
            let field_path = if path.is_empty() {
                rule.name.to_string()
            } else {
                format!("{path}.{}", rule.name)
            };
            match object.get(rule.name) {
                Some(Value::Null) if !rule.required => {}
                Some(value) => rule.kind.matches(value, &field_path, failures),
                None if rule.required => failures.push(FieldFailure::missing(&field_path)),
                None => {}
            }
        }

        if !self.allow_unknown {
            for key in object.keys() {
                if !self.fields.iter().any(|rule| rule.name == key) {
                    let field_path = if path.is_empty() {
                        key.clone()
                    } else {
                        format!("{path}.{key}")
                    };
                    failures.push(FieldFailure {
                        field: field_path,
                        message: "unknown field".to_string(),
                    });
                }
            }
        }
    }
}

/// A type with a raw record representation.
///
/// `hydrate` is the only place malformed data is rejected; everything past
/// it operates on well-shaped values. Nested hydratable fields hydrate and
/// dehydrate recursively through their serde implementations.
pub trait Hydrate: Sized + Serialize + DeserializeOwned {
    /// The shape `hydrate` accepts
    fn schema() -> Schema;

    /// Validate a raw record and wrap it. Clones; the raw value is never
    /// mutated and can be hydrated again.
    fn hydrate(raw: &Value) -> Result<Self, SchemaError> {
        let schema = Self::schema();
        schema.check(raw)?;
        serde_json::from_value(raw.clone()).map_err(|err| SchemaError::decode(schema.name, err))
    }

    /// Extract a fresh plain copy of the current field values.
    fn dehydrate(&self) -> Value {
        // Serde-derived types with string-keyed maps cannot fail here.
        serde_json::to_value(self).expect("hydrated values always serialize")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Wager {
        player: String,
        amount: u64,
        note: Option<String>,
    }

    impl Hydrate for Wager {
        fn schema() -> Schema {
            Schema::object("wager")
                .field("player", Kind::Text)
                .field("amount", Kind::Integer)
                .optional("note", Kind::Text)
        }
    }

    #[test]
    fn test_hydrate_round_trip() {
        let raw = json!({"player": "p1", "amount": 12, "note": "opening"});
        let wager = Wager::hydrate(&raw).unwrap();
        assert_eq!(wager.amount, 12);
        assert_eq!(wager.dehydrate(), raw);
    }

    #[test]
    fn test_hydrate_is_idempotent_and_copies() {
        let raw = json!({"player": "p1", "amount": 3, "note": null});
        let first = Wager::hydrate(&raw).unwrap();
        let second = Wager::hydrate(&raw).unwrap();
        assert_eq!(first, second);
        // Raw record untouched by hydration
        assert_eq!(raw["amount"], json!(3));
    }

    #[test]
    fn test_all_failures_collected() {
        let raw = json!({"player": 7, "amount": "lots"});
        let err = Wager::hydrate(&raw).unwrap_err();
        assert_eq!(err.failures.len(), 2);
        let fields: Vec<&str> = err.failures.iter().map(|f| f.field.as_str()).collect();
        assert!(fields.contains(&"player"));
        assert!(fields.contains(&"amount"));
    }

    #[test]
    fn test_missing_required_field() {
        let err = Wager::hydrate(&json!({"player": "p1"})).unwrap_err();
        assert_eq!(err.failures.len(), 1);
        assert_eq!(err.failures[0].field, "amount");
    }

    #[test]
    fn test_optional_null_accepted() {
        let raw = json!({"player": "p1", "amount": 1, "note": null});
        let wager = Wager::hydrate(&raw).unwrap();
        assert_eq!(wager.note, None);
    }

    #[test]
    fn test_nested_paths_in_failures() {
        let schema = Schema::object("table").field(
            "seats",
            Kind::Array(Box::new(Kind::Object(Box::new(
                Schema::object("seat").field("player", Kind::Text),
            )))),
        );
        let err = schema
            .check(&json!({"seats": [{"player": "a"}, {"player": 9}]}))
            .unwrap_err();
        assert_eq!(err.failures.len(), 1);
        assert_eq!(err.failures[0].field, "seats[1].player");
    }

    #[test]
    fn test_deny_unknown() {
        let schema = Schema::object("strict")
            .field("a", Kind::Bool)
            .deny_unknown();
        let err = schema.check(&json!({"a": true, "b": 1})).unwrap_err();
        assert_eq!(err.failures[0].field, "b");
    }

    #[test]
    fn test_non_object_root() {
        let err = Wager::hydrate(&json!([1, 2, 3])).unwrap_err();
        assert_eq!(err.failures[0].field, "<root>");
    }

    proptest! {
        #[test]
        fn prop_round_trip(
            player in "[a-z]{1,8}",
            amount: u64,
            note in proptest::option::of("[a-z]{0,12}"),
        ) {
            let wager = Wager { player, amount, note };
            let raw = wager.dehydrate();
            prop_assert_eq!(Wager::hydrate(&raw).unwrap(), wager);
        }
    }
}
