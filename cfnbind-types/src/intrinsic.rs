//! Intrinsic - values that are either literals or deferred template expressions
//!
//! CloudFormation accepts an intrinsic function (`Ref`, `Fn::GetAtt`, `Fn::Sub`, ...)
//! wherever a scalar property value is expected. Bindings carry such expressions
//! untouched; evaluating them is the template engine's job.

use std::fmt;

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Returns true if `key` names an intrinsic function or condition reference
pub fn is_intrinsic_key(key: &str) -> bool {
    key == "Ref" || key == "Condition" || key.starts_with("Fn::")
}

/// A deferred expression, serialized as a single-key object such as `{"Ref": "MyBucket"}`
#[derive(Debug, Clone, PartialEq)]
pub struct Intrinsic {
    function: String,
    argument: Value,
}

impl Intrinsic {
    /// Build an intrinsic from a function name and its argument.
    /// Returns None when `function` is not an intrinsic key.
    pub fn function(function: impl Into<String>, argument: Value) -> Option<Self> {
        let function = function.into();
        if is_intrinsic_key(&function) {
            Some(Self { function, argument })
        } else {
            None
        }
    }

    /// `{"Ref": logical_id}`
    pub fn reference(logical_id: impl Into<String>) -> Self {
        Self {
            function: "Ref".to_string(),
            argument: Value::String(logical_id.into()),
        }
    }

    /// `{"Fn::GetAtt": [logical_id, attribute]}`
    pub fn get_att(logical_id: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            function: "Fn::GetAtt".to_string(),
            argument: Value::Array(vec![
                Value::String(logical_id.into()),
                Value::String(attribute.into()),
            ]),
        }
    }

    /// `{"Fn::Sub": template}`
    pub fn sub(template: impl Into<String>) -> Self {
        Self {
            function: "Fn::Sub".to_string(),
            argument: Value::String(template.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.function
    }

    pub fn argument(&self) -> &Value {
        &self.argument
    }
}

impl fmt::Display for Intrinsic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.function, self.argument)
    }
}

impl Serialize for Intrinsic {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.function, &self.argument)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for Intrinsic {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = serde_json::Map::<String, Value>::deserialize(deserializer)?;
        if map.len() != 1 {
            return Err(de::Error::custom(format!(
                "intrinsic function object must have exactly one key, found {}",
                map.len()
            )));
        }
        let Some((function, argument)) = map.into_iter().next() else {
            return Err(de::Error::custom("empty intrinsic function object"));
        };
        Intrinsic::function(function.clone(), argument)
            .ok_or_else(|| de::Error::custom(format!("'{}' is not an intrinsic function", function)))
    }
}

/// A property value: a literal of `T` or an expression resolved later by CloudFormation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue<T> {
    /// Tried first so that `{"Ref": ..}` is never mistaken for a map literal
    Deferred(Intrinsic),
    Literal(T),
}

impl<T> FieldValue<T> {
    pub fn literal(value: T) -> Self {
        FieldValue::Literal(value)
    }

    pub fn deferred(expression: Intrinsic) -> Self {
        FieldValue::Deferred(expression)
    }

    pub fn as_literal(&self) -> Option<&T> {
        match self {
            FieldValue::Literal(v) => Some(v),
            FieldValue::Deferred(_) => None,
        }
    }

    pub fn as_intrinsic(&self) -> Option<&Intrinsic> {
        match self {
            FieldValue::Deferred(i) => Some(i),
            FieldValue::Literal(_) => None,
        }
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, FieldValue::Deferred(_))
    }
}

impl<T> From<T> for FieldValue<T> {
    fn from(value: T) -> Self {
        FieldValue::Literal(value)
    }
}
