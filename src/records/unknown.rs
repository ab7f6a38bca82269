use std::any::Any;

use super::{describe_base, Record, BASE_LAYOUT};
use crate::error::CodecError;
use crate::fields::{FieldReader, ObjectWriter};
use crate::ordered_key::KeyLayout;
use crate::registry::{Discriminated, EncodeFields, Factory, Variant};
use crate::schema::SchemaBuilder;
use crate::value::Members;

/// Fallback for discriminators no registered type claims. Keeps the original
/// discriminator and every other member so the record re-encodes unchanged.
#[derive(Clone, Debug, PartialEq)]
pub struct UnknownRecord {
    pub kind: String,
    pub id: String,
    pub extra: Members,
}

impl Discriminated for UnknownRecord {
    fn discriminator(&self) -> &str {
        &self.kind
    }
}

impl EncodeFields for UnknownRecord {
    fn key_layout(&self) -> &KeyLayout {
        &BASE_LAYOUT
    }

    fn encode_fields(&self, writer: &mut ObjectWriter<'_>) -> Result<(), CodecError> {
        writer.field("id", &self.id)?;
        writer.undeclared(&self.extra);
        Ok(())
    }
}

impl Record for UnknownRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn deep_copy(&self) -> Box<dyn Record> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Variant<dyn Record> for UnknownRecord {
    const DISCRIMINATOR: &'static str = "unknown";

    fn layout() -> &'static KeyLayout {
        &BASE_LAYOUT
    }

    fn decode(reader: &mut FieldReader<'_>, _factory: &Factory) -> Result<Self, CodecError> {
        let kind = reader.discriminator().unwrap_or(Self::DISCRIMINATOR).to_owned();
        let id = reader.required_string("id")?;
        Ok(Self { kind, id, extra: reader.remaining() })
    }

    fn describe(schema: &mut SchemaBuilder) {
        describe_base(schema);
    }

    fn examples() -> Vec<Self> {
        let mut extra = Members::new();
        extra.insert("pages".into(), 12.into());
        vec![UnknownRecord { kind: "legacy-report".into(), id: "u-1".into(), extra }]
    }

    fn into_boxed(self) -> Box<dyn Record> {
        Box::new(self)
    }
}
