//! Keyed member access for variant decoders and encoders.
//!
//! [`FieldReader`] hands out members of one object, tracking which ones were
//! consumed so a decoder can keep whatever it did not understand.
//! [`ObjectWriter`] collects members in any order and sorts them by the
//! variant's [`KeyLayout`] when the object is finished.
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CodecError;
use crate::ordered_key::KeyLayout;
use crate::path_de::{self, Path};
use crate::registry::{Factory, Polymorphic};
use crate::value::{JsonValue, Members};

pub struct FieldReader<'a> {
    members: &'a Members,
    consumed: Vec<bool>,
    path: Path,
    discriminator: Option<&'a str>,
    depth: usize,
}

impl<'a> FieldReader<'a> {
    pub fn new(members: &'a Members, path: Path, depth: usize) -> Self {
        Self { members, consumed: vec![false; members.len()], path, discriminator: None, depth }
    }

    /// Record the discriminator; its member counts as consumed.
    pub fn with_discriminator(mut self, field: &str, discriminator: &'a str) -> Self {
        if let Some(index) = self.members.get_index_of(field) {
            self.consumed[index] = true;
        }
        self.discriminator = Some(discriminator);
        self
    }

    pub fn discriminator(&self) -> Option<&'a str> {
        self.discriminator
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw member, marked as consumed.
    pub fn get(&mut self, name: &str) -> Option<&'a JsonValue> {
        let (index, _, value) = self.members.get_full(name)?;
        self.consumed[index] = true;
        Some(value)
    }

    pub fn required<T: DeserializeOwned>(&mut self, name: &str) -> Result<T, CodecError> {
        match self.get(name) {
            Some(value) => self.convert(name, value),
            None => Err(self.missing(name)),
        }
    }

    /// Absent and `null` both read as `None`.
    pub fn optional<T: DeserializeOwned>(&mut self, name: &str) -> Result<Option<T>, CodecError> {
        match self.get(name) {
            None | Some(JsonValue::Null) => Ok(None),
            Some(value) => self.convert(name, value).map(Some),
        }
    }

    pub fn required_string(&mut self, name: &str) -> Result<String, CodecError> {
        match self.get(name) {
            Some(JsonValue::String(s)) => Ok(s.clone()),
            Some(other) => Err(self.mismatch(name, "string", other)),
            None => Err(self.missing(name)),
        }
    }

    /// Nested polymorphic object decoded through the registry of `T`.
    pub fn polymorphic<T: ?Sized + Polymorphic>(
        &mut self,
        name: &str,
        factory: &Factory,
    ) -> Result<Box<T>, CodecError> {
        let value = self.get(name).ok_or_else(|| self.missing(name))?;
        factory.decode_at::<T>(value, self.path.child_key(name), self.depth + 1)
    }

    /// Array of polymorphic objects; every element names its own variant.
    pub fn polymorphic_seq<T: ?Sized + Polymorphic>(
        &mut self,
        name: &str,
        factory: &Factory,
    ) -> Result<Vec<Box<T>>, CodecError> {
        let value = self.get(name).ok_or_else(|| self.missing(name))?;
        factory.decode_sequence_at::<T>(value, self.path.child_key(name), self.depth + 1)
    }

    /// Members nobody asked for, in first-seen order.
    pub fn remaining(&self) -> Members {
        self.members
            .iter()
            .zip(&self.consumed)
            .filter(|(_, consumed)| !**consumed)
            .map(|((k, v), _)| (k.clone(), v.clone()))
            .collect()
    }

    fn convert<T: DeserializeOwned>(&self, name: &str, value: &JsonValue) -> Result<T, CodecError> {
        path_de::from_value_with_path(
            serde_json::Value::from(value.clone()),
            &self.path.child_key(name),
            self.discriminator,
        )
    }

    fn missing(&self, name: &str) -> CodecError {
        CodecError::MissingRequiredField {
            field: name.to_owned(),
            path: self.path.child_key(name),
            discriminator: self.discriminator.map(str::to_owned),
        }
    }

    fn mismatch(&self, name: &str, expected: &str, found: &JsonValue) -> CodecError {
        CodecError::TypeMismatch {
            expected: expected.to_owned(),
            found: found.type_name().to_owned(),
            path: self.path.child_key(name),
            discriminator: self.discriminator.map(str::to_owned),
        }
    }
}

pub struct ObjectWriter<'a> {
    factory: &'a Factory,
    members: Members,
}

impl<'a> ObjectWriter<'a> {
    pub fn new(factory: &'a Factory) -> Self {
        Self { factory, members: Members::new() }
    }

    pub fn factory(&self) -> &'a Factory {
        self.factory
    }

    pub fn value(&mut self, name: &str, value: JsonValue) {
        self.members.insert(name.to_owned(), value);
    }

    pub fn field<S: Serialize + ?Sized>(
        &mut self,
        name: &str,
        value: &S,
    ) -> Result<(), CodecError> {
        let value = JsonValue::from_serialize(value).map_err(CodecError::Encode)?;
        self.value(name, value);
        Ok(())
    }

    /// `None` writes nothing.
    pub fn optional<S: Serialize>(
        &mut self,
        name: &str,
        value: Option<&S>,
    ) -> Result<(), CodecError> {
        match value {
            Some(v) => self.field(name, v),
            None => Ok(()),
        }
    }

    pub fn polymorphic<T: ?Sized + Polymorphic>(
        &mut self,
        name: &str,
        value: &T,
    ) -> Result<(), CodecError> {
        let encoded = self.factory.encode(value)?;
        self.value(name, encoded);
        Ok(())
    }

    pub fn polymorphic_seq<T: ?Sized + Polymorphic>(
        &mut self,
        name: &str,
        values: &[Box<T>],
    ) -> Result<(), CodecError> {
        let encoded = values
            .iter()
            .map(|v| self.factory.encode(&**v))
            .collect::<Result<Vec<_>, _>>()?;
        self.value(name, JsonValue::Array(encoded));
        Ok(())
    }

    /// Re-emit preserved members; names already written are left alone.
    pub fn undeclared(&mut self, members: &Members) {
        for (k, v) in members {
            if !self.members.contains_key(k) {
                self.members.insert(k.clone(), v.clone());
            }
        }
    }

    pub fn finish(self, layout: &KeyLayout) -> Members {
        layout.sort_members(self.members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CodecConfig;

    fn members(text: &str) -> Members {
        match serde_json::from_str::<JsonValue>(text).unwrap() {
            JsonValue::Object(m) => m,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn reader_tracks_consumed_members() {
        let m = members(r#"{"id":"a","type":"answer","value":3,"extra":true,"more":[1]}"#);
        let mut reader = FieldReader::new(&m, Path::root(), 0).with_discriminator("type", "answer");
        assert_eq!(reader.required_string("id").unwrap(), "a");
        assert_eq!(reader.required::<i64>("value").unwrap(), 3);
        let rest = reader.remaining();
        assert_eq!(rest.keys().collect::<Vec<_>>(), vec!["extra", "more"]);
    }

    #[test]
    fn reader_errors_carry_path_and_discriminator() {
        let m = members(r#"{"id":7}"#);
        let mut reader = FieldReader::new(&m, Path::root().child_key("items").child_index(1), 1)
            .with_discriminator("type", "file");
        let err = reader.required_string("id").unwrap_err();
        assert_eq!(
            err.to_string(),
            "type mismatch at $.items[1].id (in `file`): expected string, found integer"
        );
        let err = reader.required::<String>("path").unwrap_err();
        assert!(matches!(err, CodecError::MissingRequiredField { .. }));
        assert_eq!(err.path().unwrap().to_string(), "$.items[1].path");
    }

    #[test]
    fn optional_accepts_null_and_absence() {
        let m = members(r#"{"a":null}"#);
        let mut reader = FieldReader::new(&m, Path::root(), 0);
        assert_eq!(reader.optional::<f64>("a").unwrap(), None);
        assert_eq!(reader.optional::<f64>("b").unwrap(), None);
    }

    #[test]
    fn writer_sorts_by_layout_and_keeps_undeclared_last() {
        let factory = Factory::new(CodecConfig::default());
        let mut writer = ObjectWriter::new(&factory);
        writer.field("value", &3).unwrap();
        writer.undeclared(&members(r#"{"extra":1,"value":99}"#));
        writer.field("id", "x").unwrap();
        writer.value("type", JsonValue::from("answer"));
        let out = JsonValue::Object(writer.finish(&KeyLayout::declared(["id", "type", "value"])));
        assert_eq!(out.member_names(), vec!["id", "type", "value", "extra"]);
        assert_eq!(out.get("value"), Some(&JsonValue::Integer(3)));
    }
}
