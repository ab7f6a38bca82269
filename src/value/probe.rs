//! Probe-order decoding of unknown-shaped JSON.
//!
//! The raw reader hands us unparsed text for every member and element. Which
//! `JsonValue` variant it becomes is decided by attempting each kind in turn;
//! the first attempt that succeeds wins. `1` is therefore an integer (integer
//! is tried before float) and `"true"` is a string (the bool attempt rejects
//! the quotes).
//!
//! Object members and array elements use different orders. For well-formed
//! JSON the two orders pick the same variant; only the number of failed
//! attempts differs.
use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use serde_json::value::RawValue;

use crate::config::Limits;
use crate::error::CodecError;
use crate::path_de::Path;
use crate::value::{JsonValue, Members};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Probe {
    Bool,
    Integer,
    String,
    Number,
    Object,
    Array,
}

/// Attempt order for a single object member (and for the document root).
pub const MEMBER_ORDER: [Probe; 6] =
    [Probe::Bool, Probe::Integer, Probe::String, Probe::Number, Probe::Object, Probe::Array];

/// Attempt order for a single array element.
pub const ELEMENT_ORDER: [Probe; 6] =
    [Probe::Bool, Probe::Integer, Probe::Number, Probe::String, Probe::Array, Probe::Object];

/// Parse a whole document.
pub fn parse_document(bytes: &[u8], limits: &Limits) -> Result<JsonValue, CodecError> {
    let raw: Box<RawValue> = crate::path_de::from_slice_with_path(bytes)?;
    Prober::new(limits).probe(&raw, &MEMBER_ORDER)
}

/// Decode one raw object member.
pub fn probe_member(raw: &RawValue, limits: &Limits) -> Result<JsonValue, CodecError> {
    Prober::new(limits).probe(raw, &MEMBER_ORDER)
}

/// Decode one raw array element.
pub fn probe_element(raw: &RawValue, limits: &Limits) -> Result<JsonValue, CodecError> {
    Prober::new(limits).probe(raw, &ELEMENT_ORDER)
}

struct Prober<'a> {
    limits: &'a Limits,
    path: Path,
    depth: usize,
}

impl<'a> Prober<'a> {
    fn new(limits: &'a Limits) -> Self {
        Self { limits, path: Path::root(), depth: 0 }
    }

    fn probe(&mut self, raw: &RawValue, order: &[Probe]) -> Result<JsonValue, CodecError> {
        let text = raw.get().trim();
        if text == "null" {
            return Ok(JsonValue::Null);
        }
        for probe in order {
            if let Some(value) = self.attempt(*probe, text)? {
                return Ok(value);
            }
        }
        Err(CodecError::MalformedContainer {
            reason: format!("no probe accepted `{}`", snippet(text)),
            path: self.path.clone(),
        })
    }

    // A failed attempt is not an error, just the next candidate.
    fn attempt(&mut self, probe: Probe, text: &str) -> Result<Option<JsonValue>, CodecError> {
        let value = match probe {
            Probe::Bool => serde_json::from_str::<bool>(text).ok().map(JsonValue::Bool),
            Probe::Integer => serde_json::from_str::<i64>(text).ok().map(JsonValue::Integer),
            Probe::String => serde_json::from_str::<String>(text).ok().map(JsonValue::String),
            Probe::Number => serde_json::from_str::<f64>(text)
                .ok()
                .map(|f| JsonValue::Number(OrderedFloat(f))),
            Probe::Object => match serde_json::from_str::<IndexMap<String, Box<RawValue>>>(text) {
                Ok(members) => Some(self.object(&members)?),
                Err(_) => None,
            },
            Probe::Array => match serde_json::from_str::<Vec<Box<RawValue>>>(text) {
                Ok(elements) => Some(self.array(&elements)?),
                Err(_) => None,
            },
        };
        Ok(value)
    }

    fn descend(&mut self) -> Result<(), CodecError> {
        if self.depth >= self.limits.max_depth {
            return Err(CodecError::DepthExceeded {
                limit: self.limits.max_depth,
                path: self.path.clone(),
                discriminator: None,
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn object(
        &mut self,
        members: &IndexMap<String, Box<RawValue>>,
    ) -> Result<JsonValue, CodecError> {
        self.descend()?;
        let mut out = Members::with_capacity(members.len());
        for (key, raw) in members {
            self.path.push_key(key);
            let value = self.probe(raw, &MEMBER_ORDER)?;
            self.path.pop();
            out.insert(key.clone(), value);
        }
        self.depth -= 1;
        Ok(JsonValue::Object(out))
    }

    fn array(&mut self, elements: &[Box<RawValue>]) -> Result<JsonValue, CodecError> {
        self.descend()?;
        let mut out = Vec::with_capacity(elements.len());
        for (index, raw) in elements.iter().enumerate() {
            self.path.push_index(index);
            let value = self.probe(raw, &ELEMENT_ORDER)?;
            self.path.pop();
            out.push(value);
        }
        self.depth -= 1;
        Ok(JsonValue::Array(out))
    }
}

fn snippet(text: &str) -> String {
    text.chars().take(32).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(text: &str) -> Box<RawValue> {
        RawValue::from_string(text.to_owned()).unwrap()
    }

    fn member(text: &str) -> JsonValue {
        probe_member(&raw(text), &Limits::default()).unwrap()
    }

    fn element(text: &str) -> JsonValue {
        probe_element(&raw(text), &Limits::default()).unwrap()
    }

    #[test]
    fn bare_numeral_member_is_integer() {
        assert_eq!(member("1"), JsonValue::Integer(1));
        assert_eq!(element("1"), JsonValue::Integer(1));
    }

    #[test]
    fn quoted_true_is_string() {
        assert_eq!(member(r#""true""#), JsonValue::String("true".into()));
        assert_eq!(member("true"), JsonValue::Bool(true));
    }

    #[test]
    fn float_and_exponent_forms_are_numbers() {
        assert_eq!(member("1.0"), JsonValue::from(1.0));
        assert_eq!(element("1e3"), JsonValue::from(1000.0));
        assert!(matches!(member("18446744073709551615"), JsonValue::Number(_)));
    }

    #[test]
    fn orders_differ_only_in_attempt_sequence() {
        assert_eq!(MEMBER_ORDER[2], Probe::String);
        assert_eq!(ELEMENT_ORDER[2], Probe::Number);
        for text in ["0", "-7", "2.5", r#""x""#, "[1,{}]", r#"{"a":[true]}"#, "false"] {
            assert_eq!(member(text), element(text), "{text}");
        }
    }

    #[test]
    fn nested_containers_keep_member_order() {
        let input = br#" {"b": [1, "2", 3.5, null], "a": {"z": true, "y": "t"}} "#;
        let v = parse_document(input, &Limits::default()).unwrap();
        assert_eq!(v.member_names(), vec!["b", "a"]);
        assert_eq!(v.get("a").unwrap().member_names(), vec!["z", "y"]);
        let b = v.get("b").unwrap().as_array().unwrap();
        assert_eq!(b[0], JsonValue::Integer(1));
        assert_eq!(b[1], JsonValue::String("2".into()));
        assert_eq!(b[2], JsonValue::from(3.5));
        assert!(b[3].is_null());
    }

    #[test]
    fn depth_guard_trips_before_recursion_runs_away() {
        let text = format!("{}{}", "[".repeat(20), "]".repeat(20));
        let err = parse_document(text.as_bytes(), &Limits { max_depth: 10 }).unwrap_err();
        match err {
            CodecError::DepthExceeded { limit, path, .. } => {
                assert_eq!(limit, 10);
                assert_eq!(path.segments().len(), 10);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(parse_document(text.as_bytes(), &Limits { max_depth: 20 }).is_ok());
    }

    #[test]
    fn broken_input_is_malformed() {
        let err = parse_document(br#"{"a": [1, 2"#, &Limits::default()).unwrap_err();
        assert!(matches!(err, CodecError::MalformedContainer { .. }));
    }
}
