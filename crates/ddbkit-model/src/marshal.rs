//! Bridge between `serde` records and typed store items.
//!
//! Records are converted through [`serde_json::Value`]: JSON strings become
//! `S`, numbers `N`, booleans `BOOL`, `null` becomes `NULL`, arrays `L` and
//! objects `M`. The reverse direction also accepts the store-only types
//! (sets and binary), rendering binary as base64 text.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};

use crate::attribute_value::{AttributeValue, Item};

/// Errors raised while converting between records and typed items.
#[derive(Debug, thiserror::Error)]
pub enum MarshalError {
    /// The record did not serialize to a JSON object.
    #[error("record must serialize to an object, got {found}")]
    NotAnObject {
        /// The JSON kind that was produced instead.
        found: &'static str,
    },
    /// A number attribute could not be represented as a JSON number.
    #[error("number attribute is not representable: {value}")]
    InvalidNumber {
        /// The string-encoded number.
        value: String,
    },
    /// `serde` failed to encode or decode the record.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Marshal a record into a typed item.
pub fn to_item<T: Serialize + ?Sized>(record: &T) -> Result<Item, MarshalError> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(json_to_item(map)),
        other => Err(MarshalError::NotAnObject {
            found: json_kind(&other),
        }),
    }
}

/// Unmarshal a typed item into a record.
#[allow(clippy::implicit_hasher)]
pub fn from_item<T: DeserializeOwned>(item: &Item) -> Result<T, MarshalError> {
    let map = item_to_json(item)?;
    Ok(serde_json::from_value(Value::Object(map))?)
}

/// Convert a JSON object into a typed item.
#[must_use]
pub fn json_to_item(map: Map<String, Value>) -> Item {
    map.into_iter()
        .map(|(k, v)| (k, json_to_value(v)))
        .collect()
}

/// Convert a typed item into a JSON object.
#[allow(clippy::implicit_hasher)]
pub fn item_to_json(item: &Item) -> Result<Map<String, Value>, MarshalError> {
    let mut map = Map::with_capacity(item.len());
    for (name, value) in item {
        map.insert(name.clone(), value_to_json(value)?);
    }
    Ok(map)
}

/// Convert a JSON value into a typed attribute value.
#[must_use]
pub fn json_to_value(value: Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s),
        Value::Array(list) => AttributeValue::L(list.into_iter().map(json_to_value).collect()),
        Value::Object(map) => AttributeValue::M(json_to_item(map)),
    }
}

/// Convert a typed attribute value into a JSON value.
pub fn value_to_json(value: &AttributeValue) -> Result<Value, MarshalError> {
    let json = match value {
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::N(n) => Value::Number(parse_number(n)?),
        AttributeValue::B(b) => Value::String(BASE64.encode(b)),
        AttributeValue::Ss(v) => Value::Array(v.iter().cloned().map(Value::String).collect()),
        AttributeValue::Ns(v) => Value::Array(
            v.iter()
                .map(|n| parse_number(n).map(Value::Number))
                .collect::<Result<_, _>>()?,
        ),
        AttributeValue::Bs(v) => {
            Value::Array(v.iter().map(|b| Value::String(BASE64.encode(b))).collect())
        }
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::L(list) => {
            Value::Array(list.iter().map(value_to_json).collect::<Result<_, _>>()?)
        }
        AttributeValue::M(map) => Value::Object(item_to_json(map)?),
    };
    Ok(json)
}

impl From<Value> for AttributeValue {
    fn from(value: Value) -> Self {
        json_to_value(value)
    }
}

impl TryFrom<&AttributeValue> for Value {
    type Error = MarshalError;

    fn try_from(value: &AttributeValue) -> Result<Self, Self::Error> {
        value_to_json(value)
    }
}

impl TryFrom<AttributeValue> for Value {
    type Error = MarshalError;

    fn try_from(value: AttributeValue) -> Result<Self, Self::Error> {
        value_to_json(&value)
    }
}

fn parse_number(raw: &str) -> Result<Number, MarshalError> {
    let invalid = || MarshalError::InvalidNumber {
        value: raw.to_owned(),
    };
    if let Ok(i) = raw.parse::<i64>() {
        return Ok(Number::from(i));
    }
    if let Ok(u) = raw.parse::<u64>() {
        return Ok(Number::from(u));
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .ok_or_else(invalid)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    struct Profile {
        id: String,
        age: u32,
        active: bool,
        tags: Vec<String>,
        nickname: Option<String>,
    }

    #[test]
    fn test_should_marshal_record_into_typed_item() {
        let profile = Profile {
            id: "USER#1".to_owned(),
            age: 42,
            active: true,
            tags: vec!["a".to_owned()],
            nickname: None,
        };
        let item = to_item(&profile).unwrap();
        assert_eq!(item["Id"], AttributeValue::S("USER#1".to_owned()));
        assert_eq!(item["Age"], AttributeValue::N("42".to_owned()));
        assert_eq!(item["Active"], AttributeValue::Bool(true));
        assert_eq!(
            item["Tags"],
            AttributeValue::L(vec![AttributeValue::S("a".to_owned())])
        );
        assert_eq!(item["Nickname"], AttributeValue::Null(true));

        let back: Profile = from_item(&item).unwrap();
        assert_eq!(back, profile);
    }

    #[test]
    fn test_should_reject_non_object_record() {
        let err = to_item(&vec![1, 2]).unwrap_err();
        assert!(matches!(err, MarshalError::NotAnObject { found: "array" }));
    }

    #[test]
    fn test_should_render_number_sets_as_json_numbers() {
        let value = AttributeValue::Ns(vec!["1".to_owned(), "2.5".to_owned()]);
        assert_eq!(value_to_json(&value).unwrap(), serde_json::json!([1, 2.5]));
    }

    #[test]
    fn test_should_reject_unrepresentable_number() {
        let err = value_to_json(&AttributeValue::N("not-a-number".to_owned())).unwrap_err();
        assert!(matches!(err, MarshalError::InvalidNumber { .. }));
    }

    #[test]
    fn test_should_convert_json_values_through_try_from() {
        let json = serde_json::json!({"name": "a", "scores": [1, 2]});
        let value = AttributeValue::from(json.clone());
        assert_eq!(value.type_descriptor(), "M");
        let back = Value::try_from(value).unwrap();
        assert_eq!(back, json);
    }
}
