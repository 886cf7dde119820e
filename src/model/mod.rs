//! # Document Model
//!
//! The input representation for the generator. A document is an ordered list
//! of fields; each field has a name and a value, and a value is text, a nested
//! mapping, or a list of values.
//!
//! JSON numbers, booleans and null parse into [`Value::Unsupported`] instead of
//! failing the parse. The layout engine rejects them when it reaches them,
//! which lets the error name the exact path of the offending value.
//!
//! `serde_json::Map` keeps only the last of several duplicate keys, so raw
//! JSON goes through our own [`Deserialize`] implementation, which keeps every
//! entry in source order.

use std::fmt;

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};

use crate::error::{GenerationError, Result};

/// The kind of a JSON value, used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Mapping,
    List,
    Number,
    Boolean,
    Null,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Text => "string",
            ValueKind::Mapping => "object",
            ValueKind::List => "array",
            ValueKind::Number => "number",
            ValueKind::Boolean => "boolean",
            ValueKind::Null => "null",
        };
        f.write_str(name)
    }
}

/// A value inside a document.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Drawn as an answer line.
    Text(String),
    /// Nested fields, drawn in place.
    Mapping(Vec<Field>),
    /// Elements drawn in order, with no heading per element.
    List(Vec<Value>),
    /// A scalar that has no text rendering.
    Unsupported(ValueKind),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Text(_) => ValueKind::Text,
            Value::Mapping(_) => ValueKind::Mapping,
            Value::List(_) => ValueKind::List,
            Value::Unsupported(kind) => *kind,
        }
    }
}

/// One named entry of a mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub key: String,
    pub value: Value,
}

impl Field {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    /// Shorthand for a field holding a text value.
    pub fn text(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(key, Value::Text(text.into()))
    }
}

/// A complete document ready for layout: the fields of the root JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub fields: Vec<Field>,
}

impl Document {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Parse raw JSON text, keeping duplicate keys and source order.
    ///
    /// Nesting depth is not limited: the parser grows its stack as needed.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut deserializer = serde_json::Deserializer::from_str(json);
        deserializer.disable_recursion_limit();
        let value = Value::deserialize(serde_stacker::Deserializer::new(&mut deserializer))?;
        deserializer.end()?;
        Self::try_from(value)
    }
}

impl TryFrom<Value> for Document {
    type Error = GenerationError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Mapping(fields) => Ok(Document { fields }),
            other => Err(GenerationError::UnsupportedValueKind {
                kind: other.kind(),
                path: "$".to_string(),
            }),
        }
    }
}

impl TryFrom<serde_json::Value> for Document {
    type Error = GenerationError;

    fn try_from(value: serde_json::Value) -> Result<Self> {
        Document::try_from(Value::from(value))
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Object(map) => Value::Mapping(
                map.into_iter()
                    .map(|(key, value)| Field::new(key, Value::from(value)))
                    .collect(),
            ),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Number(_) => Value::Unsupported(ValueKind::Number),
            serde_json::Value::Bool(_) => Value::Unsupported(ValueKind::Boolean),
            serde_json::Value::Null => Value::Unsupported(ValueKind::Null),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Value, E> {
        Ok(Value::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<Value, E> {
        Ok(Value::Text(v))
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> std::result::Result<Value, E> {
        Ok(Value::Unsupported(ValueKind::Boolean))
    }

    fn visit_i64<E: de::Error>(self, _: i64) -> std::result::Result<Value, E> {
        Ok(Value::Unsupported(ValueKind::Number))
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> std::result::Result<Value, E> {
        Ok(Value::Unsupported(ValueKind::Number))
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> std::result::Result<Value, E> {
        Ok(Value::Unsupported(ValueKind::Number))
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Value, E> {
        Ok(Value::Unsupported(ValueKind::Null))
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<Value, E> {
        Ok(Value::Unsupported(ValueKind::Null))
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element::<Value>()? {
            items.push(item);
        }
        Ok(Value::List(items))
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut fields = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, value)) = map.next_entry::<String, Value>()? {
            fields.push(Field { key, value });
        }
        Ok(Value::Mapping(fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(doc: &Document) -> Vec<&str> {
        doc.fields.iter().map(|f| f.key.as_str()).collect()
    }

    #[test]
    fn keys_keep_source_order() {
        let doc = Document::from_json_str(r#"{"zeta":"1","alpha":"2","mid":"3"}"#).unwrap();
        assert_eq!(keys(&doc), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn duplicate_keys_are_all_kept() {
        let doc = Document::from_json_str(r#"{"Name":"a","Name":"b"}"#).unwrap();
        assert_eq!(
            doc.fields,
            vec![Field::text("Name", "a"), Field::text("Name", "b")]
        );
    }

    #[test]
    fn scalars_parse_as_unsupported() {
        let doc = Document::from_json_str(r#"{"n":1.5,"b":true,"z":null,"i":-3}"#).unwrap();
        let kinds: Vec<ValueKind> = doc.fields.iter().map(|f| f.value.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                ValueKind::Number,
                ValueKind::Boolean,
                ValueKind::Null,
                ValueKind::Number
            ]
        );
    }

    #[test]
    fn nested_lists_and_objects() {
        let doc = Document::from_json_str(r#"{"A":[{"X":"1"},"two",["three"]]}"#).unwrap();
        let expected = Value::List(vec![
            Value::Mapping(vec![Field::text("X", "1")]),
            Value::Text("two".to_string()),
            Value::List(vec![Value::Text("three".to_string())]),
        ]);
        assert_eq!(doc.fields[0].value, expected);
    }

    #[test]
    fn root_must_be_an_object() {
        let err = Document::from_json_str(r#"["a","b"]"#).unwrap_err();
        match err {
            GenerationError::UnsupportedValueKind { kind, path } => {
                assert_eq!(kind, ValueKind::List);
                assert_eq!(path, "$");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn malformed_json_is_invalid_json() {
        let err = Document::from_json_str(r#"{"a": "#).unwrap_err();
        assert!(matches!(err, GenerationError::InvalidJson { .. }));
    }

    #[test]
    fn trailing_characters_are_invalid_json() {
        let err = Document::from_json_str(r#"{"a":"1"} extra"#).unwrap_err();
        assert!(matches!(err, GenerationError::InvalidJson { .. }));
    }

    #[test]
    fn nesting_deeper_than_serde_json_default_limit() {
        let depth = 1000;
        let json = format!("{}\"leaf\"{}", "{\"a\":".repeat(depth), "}".repeat(depth));
        let doc = Document::from_json_str(&json).unwrap();

        let mut value = &doc.fields[0].value;
        let mut levels = 1;
        while let Value::Mapping(fields) = value {
            value = &fields[0].value;
            levels += 1;
        }
        assert_eq!(levels, depth);
        assert_eq!(value, &Value::Text("leaf".to_string()));
    }

    #[test]
    fn converts_from_parsed_serde_value() {
        let parsed: serde_json::Value =
            serde_json::from_str(r#"{"b":"1","a":{"c":"2"}}"#).unwrap();
        let doc = Document::try_from(parsed).unwrap();
        assert_eq!(keys(&doc), vec!["b", "a"]);
        assert_eq!(
            doc.fields[1].value,
            Value::Mapping(vec![Field::text("c", "2")])
        );
    }
}
