// src/raw.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Flat record of counts as it appears in the feed (`today`, `total`, ...).
pub type Record = serde_json::Map<String, Value>;

/// Parsed `disease_h5` payload.
///
/// Members are kept as untyped JSON: any payload object parses, and the
/// reshaper checks the shape it needs, reporting a wrong or absent member
/// as `MalformedInput` with its JSON path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTree {
    #[serde(default)]
    pub area_tree: Option<Value>,
    #[serde(default)]
    pub china_total: Option<Value>,
    #[serde(default)]
    pub china_add: Option<Value>,
    #[serde(default)]
    pub last_update_time: Option<Value>,
    #[serde(default)]
    pub article_list: Option<Value>,
}

/// A country, province or city in `areaTree`: an object, otherwise unchecked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaNode<'r>(&'r Record);

impl<'r> AreaNode<'r> {
    pub fn from_value(value: &'r Value) -> Option<Self> {
        value.as_object().map(AreaNode)
    }

    /// Member `key`; `null` counts as absent.
    pub fn member(&self, key: &str) -> Option<&'r Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    pub fn name(&self) -> Option<&'r Value> {
        self.member("name")
    }

    pub fn today(&self) -> Option<&'r Record> {
        self.member("today").and_then(Value::as_object)
    }

    pub fn total(&self) -> Option<&'r Record> {
        self.member("total").and_then(Value::as_object)
    }

    pub fn children(&self) -> Option<&'r Value> {
        self.member("children")
    }
}

/// Borrow `value` as a record if it is a JSON object.
pub fn as_record(value: &Option<Value>) -> Option<&Record> {
    value.as_ref().and_then(Value::as_object)
}

/// JSON type name for error messages.
pub fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl RawTree {
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}
