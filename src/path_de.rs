//! Field paths and path-aware structural decoding.
//!
//! Every decode error names the member it failed on. Inside the polymorphic
//! pipeline the path is tracked by hand; for plain serde types it comes from
//! `serde_path_to_error` and is grafted onto the path of the enclosing field.
use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::error::Category;

use crate::error::CodecError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
}

/// Location of a value inside a document, rendered as `$.items[2].type`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn push_key(&mut self, key: &str) {
        self.segments.push(Segment::Key(key.to_owned()));
    }

    pub fn push_index(&mut self, index: usize) {
        self.segments.push(Segment::Index(index));
    }

    pub fn pop(&mut self) {
        self.segments.pop();
    }

    pub fn child_key(&self, key: &str) -> Self {
        let mut out = self.clone();
        out.push_key(key);
        out
    }

    pub fn child_index(&self, index: usize) -> Self {
        let mut out = self.clone();
        out.push_index(index);
        out
    }

    /// Append the segments recorded by `serde_path_to_error`.
    fn graft(&self, tail: &serde_path_to_error::Path) -> Self {
        use serde_path_to_error::Segment as S;
        let mut out = self.clone();
        for segment in tail.iter() {
            match segment {
                S::Seq { index } => out.push_index(*index),
                S::Map { key } => out.push_key(key),
                S::Enum { variant } => out.push_key(variant),
                _ => {}
            }
        }
        out
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for segment in &self.segments {
            match segment {
                Segment::Key(key) => write!(f, ".{key}")?,
                Segment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

/// Deserialize a concrete type from bytes, reporting failures with their path.
pub fn from_slice_with_path<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    let de = &mut serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize::<_, T>(de)
        .map_err(|err| classify(&Path::root(), None, err))
}

/// Deserialize a field value that already lives at `base`.
pub fn from_value_with_path<T: DeserializeOwned>(
    value: serde_json::Value,
    base: &Path,
    discriminator: Option<&str>,
) -> Result<T, CodecError> {
    serde_path_to_error::deserialize::<_, T>(value)
        .map_err(|err| classify(base, discriminator, err))
}

fn classify(
    base: &Path,
    discriminator: Option<&str>,
    err: serde_path_to_error::Error<serde_json::Error>,
) -> CodecError {
    let path = base.graft(err.path());
    let inner = err.into_inner();
    let discriminator = discriminator.map(str::to_owned);
    match inner.classify() {
        Category::Data => {
            let message = inner.to_string();
            match missing_field_name(&message) {
                Some(field) => CodecError::MissingRequiredField {
                    path: path.child_key(field),
                    field: field.to_owned(),
                    discriminator,
                },
                None => {
                    let (expected, found) = split_mismatch(strip_position(&message));
                    CodecError::TypeMismatch {
                        expected: expected.to_owned(),
                        found: found.to_owned(),
                        path,
                        discriminator,
                    }
                }
            }
        }
        Category::Io | Category::Syntax | Category::Eof => CodecError::MalformedContainer {
            reason: inner.to_string(),
            path,
        },
    }
}

// serde reports missing fields as "missing field `name`" followed by a position.
fn missing_field_name(message: &str) -> Option<&str> {
    let rest = message.strip_prefix("missing field `")?;
    rest.split('`').next()
}

fn strip_position(message: &str) -> &str {
    message.split(" at line ").next().unwrap_or(message)
}

// "invalid type: string \"big\", expected u64" splits into ("u64", "string \"big\"").
fn split_mismatch(message: &str) -> (&str, &str) {
    match message.rsplit_once(", expected ") {
        Some((found, expected)) => {
            let found = found
                .strip_prefix("invalid type: ")
                .or_else(|| found.strip_prefix("invalid value: "))
                .unwrap_or(found);
            (expected, found)
        }
        None => (message, "unexpected value"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Inner {
        size: u64,
    }

    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Outer {
        name: String,
        inner: Vec<Inner>,
    }

    #[test]
    fn renders_dotted_and_indexed_segments() {
        let path = Path::root().child_key("items").child_index(2).child_key("type");
        assert_eq!(path.to_string(), "$.items[2].type");
        assert_eq!(Path::root().to_string(), "$");
    }

    #[test]
    fn concrete_missing_field_reports_path() {
        let input = br#"{"name":"a","inner":[{"size":1},{}]}"#;
        let err = from_slice_with_path::<Outer>(input).unwrap_err();
        match err {
            CodecError::MissingRequiredField { field, path, .. } => {
                assert_eq!(field, "size");
                assert_eq!(path.to_string(), "$.inner[1].size");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn concrete_type_mismatch_reports_path() {
        let input = br#"{"name":"a","inner":[{"size":"big"}]}"#;
        let err = from_slice_with_path::<Outer>(input).unwrap_err();
        assert_eq!(err.path().map(ToString::to_string).as_deref(), Some("$.inner[0].size"));
        match err {
            CodecError::TypeMismatch { expected, found, .. } => {
                assert_eq!(expected, "u64");
                assert_eq!(found, "string \"big\"");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn mismatch_names_what_was_found() {
        let err =
            from_value_with_path::<u64>(serde_json::json!(1.5), &Path::root(), None).unwrap_err();
        match err {
            CodecError::TypeMismatch { expected, found, .. } => {
                assert_eq!(expected, "u64");
                assert!(found.starts_with("floating point"), "{found}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unrecognised_messages_keep_their_text() {
        assert_eq!(split_mismatch("something odd"), ("something odd", "unexpected value"));
        assert_eq!(
            split_mismatch("invalid value: integer `-1`, expected u64"),
            ("u64", "integer `-1`")
        );
    }

    #[test]
    fn truncated_input_is_malformed() {
        let err = from_slice_with_path::<Outer>(br#"{"name":"a","inner":["#).unwrap_err();
        assert!(matches!(err, CodecError::MalformedContainer { .. }));
    }

    #[test]
    fn field_values_graft_onto_base_path() {
        let base = Path::root().child_key("meta");
        let value = serde_json::json!({"size": -1});
        let err = from_value_with_path::<Inner>(value, &base, Some("answer")).unwrap_err();
        assert_eq!(err.path().map(ToString::to_string).as_deref(), Some("$.meta.size"));
        assert_eq!(err.discriminator(), Some("answer"));
    }
}
