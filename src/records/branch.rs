use std::any::Any;

use once_cell::sync::Lazy;

use super::{describe_base, Answer, FileResult, Message, Record, Step, ToolCall, BASE_LAYOUT};
use super::{RECORD_INTERFACE, STEP_INTERFACE};
use crate::error::CodecError;
use crate::fields::{FieldReader, ObjectWriter};
use crate::ordered_key::KeyLayout;
use crate::registry::{Discriminated, EncodeFields, Factory, Variant};
use crate::schema::{JsonType, SchemaBuilder};

const KIND: &str = "branch";

// Relative index 2: sorts after anything a group-1 layer would declare.
static LAYOUT: Lazy<KeyLayout> =
    Lazy::new(|| BASE_LAYOUT.extend(2, ["stepHistory", "asyncResults", "path"]));

/// A speculative branch: the steps that led to it and the records it produced.
#[derive(Clone, Debug)]
pub struct Branch {
    pub id: String,
    pub step_history: Vec<Box<dyn Step>>,
    pub async_results: Vec<Box<dyn Record>>,
    pub path: Vec<String>,
}

impl Discriminated for Branch {
    fn discriminator(&self) -> &str {
        KIND
    }
}

impl EncodeFields for Branch {
    fn key_layout(&self) -> &KeyLayout {
        &LAYOUT
    }

    fn encode_fields(&self, writer: &mut ObjectWriter<'_>) -> Result<(), CodecError> {
        writer.field("path", &self.path)?;
        writer.polymorphic_seq("asyncResults", &self.async_results)?;
        writer.polymorphic_seq("stepHistory", &self.step_history)?;
        writer.field("id", &self.id)
    }
}

impl Record for Branch {
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

impl Variant<dyn Record> for Branch {
    const DISCRIMINATOR: &'static str = KIND;

    fn layout() -> &'static KeyLayout {
        &LAYOUT
    }

    fn decode(reader: &mut FieldReader<'_>, factory: &Factory) -> Result<Self, CodecError> {
        Ok(Self {
            id: reader.required_string("id")?,
            step_history: reader.polymorphic_seq("stepHistory", factory)?,
            async_results: reader.polymorphic_seq("asyncResults", factory)?,
            path: reader.required("path")?,
        })
    }

    fn describe(schema: &mut SchemaBuilder) {
        describe_base(schema);
        schema
            .property(
                "stepHistory",
                JsonType::array(JsonType::interface(STEP_INTERFACE)),
                "Steps taken before the branch split off",
            )
            .property(
                "asyncResults",
                JsonType::array(JsonType::interface(RECORD_INTERFACE)),
                "Records produced while the branch ran",
            )
            .property("path", JsonType::array(JsonType::String), "Branch names from the root");
    }

    fn examples() -> Vec<Self> {
        vec![Branch {
            id: "b-1".into(),
            step_history: vec![
                Box::new(Message { role: "user".into(), text: "Summarize the logs".into() }),
                Box::new(ToolCall { name: "read".into(), arguments: "logs/today.txt".into() }),
            ],
            async_results: vec![
                Box::new(Answer::new("a-9", 3).with_confidence(0.5)),
                Box::new(FileResult {
                    id: "f-9".into(),
                    path: "summary.md".into(),
                    size: 512,
                    mime: None,
                }),
            ],
            path: vec!["root".into(), "left".into()],
        }]
    }

    fn into_boxed(self) -> Box<dyn Record> {
        Box::new(self)
    }
}
