use std::any::Any;

use once_cell::sync::Lazy;

use super::{describe_base, Answer, Record, BASE_LAYOUT, RECORD_INTERFACE};
use crate::error::CodecError;
use crate::fields::{FieldReader, ObjectWriter};
use crate::ordered_key::KeyLayout;
use crate::registry::{Discriminated, EncodeFields, Factory, Variant};
use crate::schema::{JsonType, SchemaBuilder};

const KIND: &str = "collection";

static LAYOUT: Lazy<KeyLayout> = Lazy::new(|| BASE_LAYOUT.extend(1, ["items"]));

/// Ordered group of records of any kind.
#[derive(Clone, Debug)]
pub struct Collection {
    pub id: String,
    pub items: Vec<Box<dyn Record>>,
}

impl Discriminated for Collection {
    fn discriminator(&self) -> &str {
        KIND
    }
}

impl EncodeFields for Collection {
    fn key_layout(&self) -> &KeyLayout {
        &LAYOUT
    }

    fn encode_fields(&self, writer: &mut ObjectWriter<'_>) -> Result<(), CodecError> {
        writer.field("id", &self.id)?;
        writer.polymorphic_seq("items", &self.items)
    }
}

impl Record for Collection {
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

impl Variant<dyn Record> for Collection {
    const DISCRIMINATOR: &'static str = KIND;

    fn layout() -> &'static KeyLayout {
        &LAYOUT
    }

    fn decode(reader: &mut FieldReader<'_>, factory: &Factory) -> Result<Self, CodecError> {
        Ok(Self {
            id: reader.required_string("id")?,
            items: reader.polymorphic_seq("items", factory)?,
        })
    }

    fn describe(schema: &mut SchemaBuilder) {
        describe_base(schema);
        schema.property(
            "items",
            JsonType::array(JsonType::interface(RECORD_INTERFACE)),
            "Member records; each names its own type",
        );
    }

    fn examples() -> Vec<Self> {
        vec![Collection {
            id: "c-1".into(),
            items: vec![
                Box::new(Answer::new("a-1", true)),
                Box::new(Collection { id: "c-2".into(), items: Vec::new() }),
            ],
        }]
    }

    fn into_boxed(self) -> Box<dyn Record> {
        Box::new(self)
    }
}
