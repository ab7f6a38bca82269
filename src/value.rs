//! Dynamic JSON values.
//!
//! `JsonValue` is what the codec works on between the byte boundary and the
//! typed records. Object members keep their order because serialization
//! follows it; equality is structural, so two objects holding the same
//! members in a different order still compare equal.
//!
//! Raw input is turned into a `JsonValue` by [`probe`], which picks each
//! variant by trying the candidate kinds in a fixed order.
pub mod probe;

use std::fmt;

use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

pub use probe::{parse_document, Probe, ELEMENT_ORDER, MEMBER_ORDER};

/// Object members in insertion order.
pub type Members = IndexMap<String, JsonValue>;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum JsonValue {
    #[default]
    Null,
    Bool(bool),
    /// Floating point number.
    Number(OrderedFloat<f64>),
    Integer(i64),
    String(String),
    Array(Vec<JsonValue>),
    Object(Members),
}

impl JsonValue {
    pub fn is_null(&self) -> bool {
        matches!(self, JsonValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            JsonValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            JsonValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Integers widen to floats here; floats never narrow in `as_i64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            JsonValue::Integer(i) => Some(*i as f64),
            JsonValue::Number(n) => Some(n.0),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            JsonValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<JsonValue>> {
        match self {
            JsonValue::Array(xs) => Some(xs),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Members> {
        match self {
            JsonValue::Object(m) => Some(m),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.as_object().and_then(|m| m.get(key))
    }

    /// Member names of an object in serialization order; empty otherwise.
    pub fn member_names(&self) -> Vec<&str> {
        match self {
            JsonValue::Object(m) => m.keys().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            JsonValue::Null => "null",
            JsonValue::Bool(_) => "boolean",
            JsonValue::Number(_) => "number",
            JsonValue::Integer(_) => "integer",
            JsonValue::String(_) => "string",
            JsonValue::Array(_) => "array",
            JsonValue::Object(_) => "object",
        }
    }

    /// Capture any serializable value.
    ///
    /// Integers outside the `i64` range are rejected: they would come back as
    /// floats and no longer decode into the field that produced them.
    pub fn from_serialize<S: Serialize + ?Sized>(value: &S) -> Result<Self, serde_json::Error> {
        let value = serde_json::to_value(value)?;
        check_integer_range(&value)?;
        Ok(JsonValue::from(value))
    }

    /// Equal and, for every object on the way down, in the same member order.
    pub fn same_layout(&self, other: &JsonValue) -> bool {
        match (self, other) {
            (JsonValue::Array(a), JsonValue::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_layout(y))
            }
            (JsonValue::Object(a), JsonValue::Object(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b).all(|((ka, va), (kb, vb))| ka == kb && va.same_layout(vb))
            }
            _ => self == other,
        }
    }
}

impl fmt::Display for JsonValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

// ------------------------------ Conversions ------------------------------- //

impl From<bool> for JsonValue {
    fn from(b: bool) -> Self {
        JsonValue::Bool(b)
    }
}

impl From<i64> for JsonValue {
    fn from(i: i64) -> Self {
        JsonValue::Integer(i)
    }
}

impl From<i32> for JsonValue {
    fn from(i: i32) -> Self {
        JsonValue::Integer(i64::from(i))
    }
}

impl From<f64> for JsonValue {
    fn from(f: f64) -> Self {
        JsonValue::Number(OrderedFloat(f))
    }
}

impl From<&str> for JsonValue {
    fn from(s: &str) -> Self {
        JsonValue::String(s.to_owned())
    }
}

impl From<String> for JsonValue {
    fn from(s: String) -> Self {
        JsonValue::String(s)
    }
}

impl From<Vec<JsonValue>> for JsonValue {
    fn from(xs: Vec<JsonValue>) -> Self {
        JsonValue::Array(xs)
    }
}

impl From<Members> for JsonValue {
    fn from(m: Members) -> Self {
        JsonValue::Object(m)
    }
}

impl From<serde_json::Value> for JsonValue {
    fn from(v: serde_json::Value) -> Self {
        use serde_json::Value;
        match v {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => JsonValue::Integer(i),
                // u64 above i64::MAX lands here too; precision beyond f64 is not kept
                None => JsonValue::Number(OrderedFloat(n.as_f64().unwrap_or(f64::NAN))),
            },
            Value::String(s) => JsonValue::String(s),
            Value::Array(xs) => JsonValue::Array(xs.into_iter().map(JsonValue::from).collect()),
            Value::Object(m) => {
                JsonValue::Object(m.into_iter().map(|(k, v)| (k, JsonValue::from(v))).collect())
            }
        }
    }
}

impl From<JsonValue> for serde_json::Value {
    fn from(v: JsonValue) -> Self {
        use serde_json::Value;
        match v {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Integer(i) => Value::from(i),
            JsonValue::Number(n) => serde_json::Number::from_f64(n.0)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            JsonValue::String(s) => Value::String(s),
            JsonValue::Array(xs) => Value::Array(xs.into_iter().map(Value::from).collect()),
            JsonValue::Object(m) => {
                Value::Object(m.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

fn check_integer_range(value: &serde_json::Value) -> Result<(), serde_json::Error> {
    use serde_json::Value;
    match value {
        Value::Number(n) if n.is_u64() && n.as_i64().is_none() => Err(serde::ser::Error::custom(
            format!("integer {n} is outside the signed 64-bit range"),
        )),
        Value::Array(xs) => xs.iter().try_for_each(check_integer_range),
        Value::Object(m) => m.values().try_for_each(check_integer_range),
        _ => Ok(()),
    }
}

// -------------------------------- Serde ----------------------------------- //

impl Serialize for JsonValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            JsonValue::Null => serializer.serialize_unit(),
            JsonValue::Bool(b) => serializer.serialize_bool(*b),
            JsonValue::Number(n) => serializer.serialize_f64(n.0),
            JsonValue::Integer(i) => serializer.serialize_i64(*i),
            JsonValue::String(s) => serializer.serialize_str(s),
            JsonValue::Array(xs) => {
                let mut seq = serializer.serialize_seq(Some(xs.len()))?;
                for x in xs {
                    seq.serialize_element(x)?;
                }
                seq.end()
            }
            JsonValue::Object(m) => {
                let mut map = serializer.serialize_map(Some(m.len()))?;
                for (k, v) in m {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for JsonValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = JsonValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<JsonValue, E> {
        Ok(JsonValue::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<JsonValue, E> {
        Ok(JsonValue::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<JsonValue, D::Error> {
        JsonValue::deserialize(d)
    }

    fn visit_bool<E: de::Error>(self, b: bool) -> Result<JsonValue, E> {
        Ok(JsonValue::Bool(b))
    }

    fn visit_i64<E: de::Error>(self, i: i64) -> Result<JsonValue, E> {
        Ok(JsonValue::Integer(i))
    }

    fn visit_u64<E: de::Error>(self, u: u64) -> Result<JsonValue, E> {
        Ok(match i64::try_from(u) {
            Ok(i) => JsonValue::Integer(i),
            Err(_) => JsonValue::Number(OrderedFloat(u as f64)),
        })
    }

    fn visit_f64<E: de::Error>(self, f: f64) -> Result<JsonValue, E> {
        Ok(JsonValue::Number(OrderedFloat(f)))
    }

    fn visit_str<E: de::Error>(self, s: &str) -> Result<JsonValue, E> {
        Ok(JsonValue::String(s.to_owned()))
    }

    fn visit_string<E: de::Error>(self, s: String) -> Result<JsonValue, E> {
        Ok(JsonValue::String(s))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<JsonValue, A::Error> {
        let mut out = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(x) = seq.next_element()? {
            out.push(x);
        }
        Ok(JsonValue::Array(out))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<JsonValue, A::Error> {
        let mut out = Members::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((k, v)) = map.next_entry::<String, JsonValue>()? {
            out.insert(k, v);
        }
        Ok(JsonValue::Object(out))
    }
}
