use std::any::Any;

use once_cell::sync::Lazy;

use super::{describe_base, Record, BASE_LAYOUT};
use crate::error::CodecError;
use crate::fields::{FieldReader, ObjectWriter};
use crate::ordered_key::KeyLayout;
use crate::registry::{Discriminated, EncodeFields, Factory, Variant};
use crate::schema::{JsonType, SchemaBuilder};

const KIND: &str = "file";

static LAYOUT: Lazy<KeyLayout> = Lazy::new(|| BASE_LAYOUT.extend(1, ["path", "size", "mime"]));

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileResult {
    pub id: String,
    pub path: String,
    pub size: u64,
    pub mime: Option<String>,
}

impl Discriminated for FileResult {
    fn discriminator(&self) -> &str {
        KIND
    }
}

impl EncodeFields for FileResult {
    fn key_layout(&self) -> &KeyLayout {
        &LAYOUT
    }

    fn encode_fields(&self, writer: &mut ObjectWriter<'_>) -> Result<(), CodecError> {
        writer.field("id", &self.id)?;
        writer.field("path", &self.path)?;
        writer.field("size", &self.size)?;
        writer.optional("mime", self.mime.as_ref())
    }
}

impl Record for FileResult {
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

impl Variant<dyn Record> for FileResult {
    const DISCRIMINATOR: &'static str = KIND;

    fn layout() -> &'static KeyLayout {
        &LAYOUT
    }

    fn decode(reader: &mut FieldReader<'_>, _factory: &Factory) -> Result<Self, CodecError> {
        Ok(Self {
            id: reader.required_string("id")?,
            path: reader.required_string("path")?,
            size: reader.required("size")?,
            mime: reader.optional("mime")?,
        })
    }

    fn describe(schema: &mut SchemaBuilder) {
        describe_base(schema);
        schema
            .property("path", JsonType::String, "Location of the produced file")
            .property("size", JsonType::Integer, "Size in bytes")
            .optional("mime", JsonType::String, "Media type, when known");
    }

    fn examples() -> Vec<Self> {
        vec![FileResult {
            id: "f-1".into(),
            path: "out/report.csv".into(),
            size: 2048,
            mime: Some("text/csv".into()),
        }]
    }

    fn into_boxed(self) -> Box<dyn Record> {
        Box::new(self)
    }
}
