use std::any::Any;

use once_cell::sync::Lazy;

use super::{describe_base, Record, BASE_LAYOUT};
use crate::error::CodecError;
use crate::fields::{FieldReader, ObjectWriter};
use crate::ordered_key::KeyLayout;
use crate::registry::{Discriminated, EncodeFields, Factory, Variant};
use crate::schema::{JsonType, SchemaBuilder};
use crate::value::{JsonValue, Members};

const KIND: &str = "answer";

static LAYOUT: Lazy<KeyLayout> = Lazy::new(|| BASE_LAYOUT.extend(1, ["value", "confidence"]));

/// A computed answer. Members it does not know are kept in `extra` and
/// written back after the declared ones.
#[derive(Clone, Debug, PartialEq)]
pub struct Answer {
    pub id: String,
    pub value: JsonValue,
    pub confidence: Option<f64>,
    pub extra: Members,
}

impl Answer {
    pub fn new(id: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Self { id: id.into(), value: value.into(), confidence: None, extra: Members::new() }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_extra(mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }
}

impl Discriminated for Answer {
    fn discriminator(&self) -> &str {
        KIND
    }
}

impl EncodeFields for Answer {
    fn key_layout(&self) -> &KeyLayout {
        &LAYOUT
    }

    fn encode_fields(&self, writer: &mut ObjectWriter<'_>) -> Result<(), CodecError> {
        writer.field("id", &self.id)?;
        writer.value("value", self.value.clone());
        writer.optional("confidence", self.confidence.as_ref())?;
        writer.undeclared(&self.extra);
        Ok(())
    }
}

impl Record for Answer {
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

impl Variant<dyn Record> for Answer {
    const DISCRIMINATOR: &'static str = KIND;

    fn layout() -> &'static KeyLayout {
        &LAYOUT
    }

    fn decode(reader: &mut FieldReader<'_>, _factory: &Factory) -> Result<Self, CodecError> {
        let id = reader.required_string("id")?;
        let value = reader.required::<JsonValue>("value")?;
        let confidence = reader.optional("confidence")?;
        Ok(Self { id, value, confidence, extra: reader.remaining() })
    }

    fn describe(schema: &mut SchemaBuilder) {
        describe_base(schema);
        schema
            .property("value", JsonType::Any, "The answer itself; any JSON value")
            .optional("confidence", JsonType::Number, "Confidence between 0 and 1");
    }

    fn examples() -> Vec<Self> {
        vec![
            Answer::new("a-1", 42).with_confidence(0.75),
            Answer::new("a-2", "forty-two").with_extra("source", "cache"),
        ]
    }

    fn into_boxed(self) -> Box<dyn Record> {
        Box::new(self)
    }
}
