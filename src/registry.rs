//! Discriminator registries.
//!
//! A [`Registry`] serves one interface: a family of types that share a trait
//! and are told apart at runtime by a string discriminator. Types opt into the
//! engine through small capability traits:
//!
//! - [`Discriminated`] - the instance knows its own discriminator
//! - [`EncodeFields`] - the instance writes its members and declares their order
//! - [`Variant`] - the type can be decoded, described and exemplified, which is
//!   what a [`TypeDescriptor`] is built from
//!
//! Registries are assembled during setup and then installed in a [`Factory`].
//! After that they are only read; sharing a `&Factory` across threads is the
//! supported way to decode concurrently.
pub mod descriptor;
pub mod factory;

use indexmap::IndexMap;

use crate::config::DEFAULT_DISCRIMINATOR_FIELD;
use crate::error::CodecError;
use crate::fields::{FieldReader, ObjectWriter};
use crate::ordered_key::KeyLayout;
use crate::path_de::Path;
use crate::schema::SchemaBuilder;
use crate::value::JsonValue;

pub use descriptor::TypeDescriptor;
pub use factory::Factory;

/// Identity of a polymorphic instance.
pub trait Discriminated {
    fn discriminator(&self) -> &str;
}

/// Ordered member encoding.
pub trait EncodeFields {
    fn key_layout(&self) -> &KeyLayout;

    /// Write every member except the discriminator, which the registry adds.
    fn encode_fields(&self, writer: &mut ObjectWriter<'_>) -> Result<(), CodecError>;
}

/// Anything a registry can hold. Implemented for every interface trait object
/// whose trait extends `Discriminated + EncodeFields + Send + Sync`.
pub trait Polymorphic: Discriminated + EncodeFields + Send + Sync + 'static {}

impl<T: ?Sized + Discriminated + EncodeFields + Send + Sync + 'static> Polymorphic for T {}

/// A concrete type registered under interface `T`.
pub trait Variant<T: ?Sized>: Sized + 'static {
    const DISCRIMINATOR: &'static str;

    fn layout() -> &'static KeyLayout;

    /// Decode from the full object, discriminator member included.
    fn decode(reader: &mut FieldReader<'_>, factory: &Factory) -> Result<Self, CodecError>;

    fn describe(schema: &mut SchemaBuilder);

    /// Instances the schema generator round-trips before publishing them.
    fn examples() -> Vec<Self>;

    fn into_boxed(self) -> Box<T>;
}

pub struct Registry<T: ?Sized> {
    interface: String,
    discriminator_field: String,
    descriptors: IndexMap<String, TypeDescriptor<T>>,
    default: Option<TypeDescriptor<T>>,
}

impl<T: ?Sized + Polymorphic> Registry<T> {
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            discriminator_field: DEFAULT_DISCRIMINATOR_FIELD.to_owned(),
            descriptors: IndexMap::new(),
            default: None,
        }
    }

    pub fn with_discriminator_field(mut self, field: impl Into<String>) -> Self {
        self.discriminator_field = field.into();
        self
    }

    pub fn with<V: Variant<T>>(mut self) -> Self {
        self.register(TypeDescriptor::of::<V>());
        self
    }

    pub fn with_default<V: Variant<T>>(mut self) -> Self {
        self.set_default(TypeDescriptor::of::<V>());
        self
    }

    /// Insert or overwrite by discriminator. Last write wins; the replaced
    /// descriptor is handed back so callers can detect collisions.
    pub fn register(&mut self, descriptor: TypeDescriptor<T>) -> Option<TypeDescriptor<T>> {
        let key = descriptor.discriminator().to_owned();
        let replaced = self.descriptors.insert(key.clone(), descriptor);
        if replaced.is_some() {
            tracing::warn!(
                interface = %self.interface,
                discriminator = %key,
                "descriptor overwritten"
            );
        } else {
            tracing::debug!(
                interface = %self.interface,
                discriminator = %key,
                "descriptor registered"
            );
        }
        replaced
    }

    /// Descriptor used when no registered discriminator matches.
    pub fn set_default(&mut self, descriptor: TypeDescriptor<T>) {
        tracing::debug!(
            interface = %self.interface,
            discriminator = %descriptor.discriminator(),
            "default descriptor set"
        );
        self.default = Some(descriptor);
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    pub fn discriminator_field(&self) -> &str {
        &self.discriminator_field
    }

    /// Registered descriptors in registration order (the default excluded).
    pub fn descriptors(&self) -> impl Iterator<Item = &TypeDescriptor<T>> {
        self.descriptors.values()
    }

    pub fn default_descriptor(&self) -> Option<&TypeDescriptor<T>> {
        self.default.as_ref()
    }

    pub fn get(&self, discriminator: &str) -> Option<&TypeDescriptor<T>> {
        self.descriptors.get(discriminator)
    }

    pub fn resolve(&self, discriminator: &str) -> Result<&TypeDescriptor<T>, CodecError> {
        self.resolve_at(discriminator, &Path::root())
    }

    pub fn decode(&self, value: &JsonValue, factory: &Factory) -> Result<Box<T>, CodecError> {
        self.decode_at(value, factory, Path::root(), 0)
    }

    /// All-or-nothing: the first failing element aborts the call.
    pub fn decode_sequence(
        &self,
        value: &JsonValue,
        factory: &Factory,
    ) -> Result<Vec<Box<T>>, CodecError> {
        self.decode_sequence_at(value, factory, Path::root(), 0)
    }

    pub fn encode(&self, instance: &T, factory: &Factory) -> Result<JsonValue, CodecError> {
        let mut writer = ObjectWriter::new(factory);
        writer.value(&self.discriminator_field, JsonValue::from(instance.discriminator()));
        instance.encode_fields(&mut writer)?;
        Ok(JsonValue::Object(writer.finish(instance.key_layout())))
    }

    fn resolve_at(
        &self,
        discriminator: &str,
        path: &Path,
    ) -> Result<&TypeDescriptor<T>, CodecError> {
        if let Some(descriptor) = self.descriptors.get(discriminator) {
            return Ok(descriptor);
        }
        match &self.default {
            Some(descriptor) => {
                tracing::debug!(
                    interface = %self.interface,
                    discriminator,
                    %path,
                    "unknown discriminator decoded through default"
                );
                Ok(descriptor)
            }
            None => Err(CodecError::UnknownDiscriminator {
                interface: self.interface.clone(),
                discriminator: discriminator.to_owned(),
                path: path.child_key(&self.discriminator_field),
            }),
        }
    }

    pub(crate) fn decode_at(
        &self,
        value: &JsonValue,
        factory: &Factory,
        path: Path,
        depth: usize,
    ) -> Result<Box<T>, CodecError> {
        let limit = factory.config().limits.max_depth;
        if depth >= limit {
            return Err(CodecError::DepthExceeded { limit, path, discriminator: None });
        }
        let JsonValue::Object(members) = value else {
            return Err(CodecError::TypeMismatch {
                expected: "object".into(),
                found: value.type_name().into(),
                path,
                discriminator: None,
            });
        };
        let discriminator = match members.get(&self.discriminator_field) {
            Some(JsonValue::String(s)) => s.as_str(),
            Some(other) => {
                return Err(CodecError::TypeMismatch {
                    expected: "string".into(),
                    found: other.type_name().into(),
                    path: path.child_key(&self.discriminator_field),
                    discriminator: None,
                });
            }
            None => {
                return Err(CodecError::MissingRequiredField {
                    field: self.discriminator_field.clone(),
                    path: path.child_key(&self.discriminator_field),
                    discriminator: None,
                });
            }
        };
        let descriptor = self.resolve_at(discriminator, &path)?;
        let mut reader = FieldReader::new(members, path, depth)
            .with_discriminator(&self.discriminator_field, discriminator);
        descriptor
            .decode(&mut reader, factory)
            .map_err(|err| err.observed_in(discriminator))
    }

    pub(crate) fn decode_sequence_at(
        &self,
        value: &JsonValue,
        factory: &Factory,
        path: Path,
        depth: usize,
    ) -> Result<Vec<Box<T>>, CodecError> {
        let JsonValue::Array(items) = value else {
            return Err(CodecError::TypeMismatch {
                expected: "array".into(),
                found: value.type_name().into(),
                path,
                discriminator: None,
            });
        };
        items
            .iter()
            .enumerate()
            .map(|(index, item)| self.decode_at(item, factory, path.child_index(index), depth + 1))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CodecConfig;
    use crate::records::{self, Answer, FileResult, Record, UnknownRecord};
    use pretty_assertions::assert_eq;

    fn parse(text: &str) -> JsonValue {
        serde_json::from_str(text).unwrap()
    }

    fn bare_factory() -> Factory {
        let mut factory = Factory::new(CodecConfig::default());
        let registry = factory
            .new_registry::<dyn Record>("Record")
            .with::<Answer>()
            .with::<FileResult>();
        factory.insert(registry);
        factory
    }

    #[test]
    fn last_registration_wins() {
        let mut registry = Registry::<dyn Record>::new("Record").with::<Answer>();
        let shadow = TypeDescriptor::<dyn Record>::new(
            "answer",
            KeyLayout::declared(["id"]),
            |reader, _| {
                Ok(Box::new(UnknownRecord {
                    kind: "shadow".into(),
                    id: reader.required_string("id")?,
                    extra: Default::default(),
                }))
            },
            |_| {},
            Vec::new,
        );
        let replaced = registry.register(shadow);
        assert_eq!(replaced.map(|d| d.discriminator().to_owned()), Some("answer".to_owned()));
        assert_eq!(registry.descriptors().count(), 1);

        let factory = Factory::default().with(registry);
        let decoded = factory
            .decode::<dyn Record>(&parse(r#"{"type":"answer","id":"x"}"#))
            .unwrap();
        assert_eq!(decoded.discriminator(), "shadow");
    }

    #[test]
    fn unknown_discriminator_without_default_fails() {
        let factory = bare_factory();
        let err = factory
            .decode::<dyn Record>(&parse(r#"{"type":"mystery","id":"x"}"#))
            .unwrap_err();
        match err {
            CodecError::UnknownDiscriminator { interface, discriminator, path } => {
                assert_eq!(interface, "Record");
                assert_eq!(discriminator, "mystery");
                assert_eq!(path.to_string(), "$.type");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_discriminator_uses_default() {
        let factory = records::factory(CodecConfig::default());
        let decoded = factory
            .decode::<dyn Record>(&parse(r#"{"type":"mystery","id":"x","pages":3}"#))
            .unwrap();
        let unknown = decoded.downcast_ref::<UnknownRecord>().unwrap();
        assert_eq!(unknown.kind, "mystery");
        assert_eq!(unknown.extra.get("pages"), Some(&JsonValue::Integer(3)));
    }

    #[test]
    fn missing_discriminator_is_reported_even_with_default() {
        let factory = records::factory(CodecConfig::default());
        let err = factory.decode::<dyn Record>(&parse(r#"{"id":"x"}"#)).unwrap_err();
        assert!(matches!(
            err,
            CodecError::MissingRequiredField { ref field, .. } if field == "type"
        ));
    }

    #[test]
    fn non_string_discriminator_is_a_type_mismatch() {
        let factory = bare_factory();
        let err = factory.decode::<dyn Record>(&parse(r#"{"type":3,"id":"x"}"#)).unwrap_err();
        assert!(matches!(err, CodecError::TypeMismatch { .. }));
        assert_eq!(err.path().unwrap().to_string(), "$.type");
    }

    #[test]
    fn sequence_keeps_order_and_fails_whole() {
        let factory = bare_factory();
        let items = parse(concat!(
            r#"[{"type":"file","id":"f","path":"p","size":1},"#,
            r#"{"type":"answer","id":"a","value":null}]"#,
        ));
        let decoded = factory.decode_sequence::<dyn Record>(&items).unwrap();
        let kinds: Vec<&str> = decoded.iter().map(|r| r.discriminator()).collect();
        assert_eq!(kinds, vec!["file", "answer"]);

        let broken = parse(r#"[{"type":"answer","id":"a","value":1},{"type":"file","id":"f"}]"#);
        let err = factory.decode_sequence::<dyn Record>(&broken).unwrap_err();
        assert_eq!(err.path().unwrap().to_string(), "$[1].path");
        assert_eq!(err.discriminator(), Some("file"));
    }

    #[test]
    fn encode_writes_discriminator_in_layout_position() {
        let factory = bare_factory();
        let answer = Answer::new("a", 1).with_extra("note", "n");
        let value = factory.encode::<dyn Record>(&answer).unwrap();
        assert_eq!(value.member_names(), vec!["id", "type", "value", "note"]);
        assert_eq!(value.get("type"), Some(&JsonValue::from("answer")));
    }

    #[test]
    fn unregistered_interface() {
        let factory = Factory::default();
        let err = factory.decode::<dyn Record>(&parse("{}")).unwrap_err();
        assert!(matches!(err, CodecError::UnregisteredInterface { .. }));
    }

    #[test]
    fn depth_limit_applies_to_nested_records() {
        let config = CodecConfig::default().with_limits(crate::config::Limits { max_depth: 2 });
        let factory = records::factory(config);
        let nested = parse(
            r#"{"type":"collection","id":"1","items":[{"type":"collection","id":"2","items":[]}]}"#,
        );
        let err = factory.decode::<dyn Record>(&nested).unwrap_err();
        assert!(matches!(err, CodecError::DepthExceeded { limit: 2, .. }));
        assert_eq!(err.path().unwrap().to_string(), "$.items[0]");
        assert_eq!(err.discriminator(), Some("collection"));
    }
}
