//! Entries of a branch's step history, a second interface sharing the
//! factory with [`Record`](super::Record).
use std::any::Any;
use std::fmt;

use once_cell::sync::Lazy;

use crate::error::CodecError;
use crate::fields::{FieldReader, ObjectWriter};
use crate::ordered_key::KeyLayout;
use crate::registry::{Discriminated, EncodeFields, Factory, Variant};
use crate::schema::{JsonType, SchemaBuilder};
use crate::value::JsonValue;

static TOOL_CALL_LAYOUT: Lazy<KeyLayout> =
    Lazy::new(|| KeyLayout::declared(["type"]).group(1, ["name", "arguments"]));

static MESSAGE_LAYOUT: Lazy<KeyLayout> =
    Lazy::new(|| KeyLayout::declared(["type"]).group(1, ["role", "text"]));

pub trait Step: Discriminated + EncodeFields + Send + Sync + Any + fmt::Debug {
    fn deep_copy(&self) -> Box<dyn Step>;

    fn as_any(&self) -> &dyn Any;
}

impl dyn Step {
    pub fn downcast_ref<V: Step>(&self) -> Option<&V> {
        self.as_any().downcast_ref()
    }
}

impl Clone for Box<dyn Step> {
    fn clone(&self) -> Self {
        self.deep_copy()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolCall {
    pub name: String,
    pub arguments: JsonValue,
}

impl Discriminated for ToolCall {
    fn discriminator(&self) -> &str {
        <Self as Variant<dyn Step>>::DISCRIMINATOR
    }
}

impl EncodeFields for ToolCall {
    fn key_layout(&self) -> &KeyLayout {
        &TOOL_CALL_LAYOUT
    }

    fn encode_fields(&self, writer: &mut ObjectWriter<'_>) -> Result<(), CodecError> {
        writer.field("name", &self.name)?;
        writer.value("arguments", self.arguments.clone());
        Ok(())
    }
}

impl Step for ToolCall {
    fn deep_copy(&self) -> Box<dyn Step> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Variant<dyn Step> for ToolCall {
    const DISCRIMINATOR: &'static str = "tool-call";

    fn layout() -> &'static KeyLayout {
        &TOOL_CALL_LAYOUT
    }

    fn decode(reader: &mut FieldReader<'_>, _factory: &Factory) -> Result<Self, CodecError> {
        Ok(Self {
            name: reader.required_string("name")?,
            arguments: reader.get("arguments").cloned().unwrap_or(JsonValue::Null),
        })
    }

    fn describe(schema: &mut SchemaBuilder) {
        schema
            .property("name", JsonType::String, "Tool that was invoked")
            .optional("arguments", JsonType::Any, "Arguments passed to the tool");
    }

    fn examples() -> Vec<Self> {
        let arguments = serde_json::json!({"query": "weather", "limit": 3});
        vec![ToolCall { name: "search".into(), arguments: arguments.into() }]
    }

    fn into_boxed(self) -> Box<dyn Step> {
        Box::new(self)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub role: String,
    pub text: String,
}

impl Discriminated for Message {
    fn discriminator(&self) -> &str {
        <Self as Variant<dyn Step>>::DISCRIMINATOR
    }
}

impl EncodeFields for Message {
    fn key_layout(&self) -> &KeyLayout {
        &MESSAGE_LAYOUT
    }

    fn encode_fields(&self, writer: &mut ObjectWriter<'_>) -> Result<(), CodecError> {
        writer.field("role", &self.role)?;
        writer.field("text", &self.text)
    }
}

impl Step for Message {
    fn deep_copy(&self) -> Box<dyn Step> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Variant<dyn Step> for Message {
    const DISCRIMINATOR: &'static str = "message";

    fn layout() -> &'static KeyLayout {
        &MESSAGE_LAYOUT
    }

    fn decode(reader: &mut FieldReader<'_>, _factory: &Factory) -> Result<Self, CodecError> {
        Ok(Self { role: reader.required_string("role")?, text: reader.required_string("text")? })
    }

    fn describe(schema: &mut SchemaBuilder) {
        schema
            .property("role", JsonType::String, "Author of the message")
            .property("text", JsonType::String, "Message body");
    }

    fn examples() -> Vec<Self> {
        vec![Message { role: "user".into(), text: "What is the weather?".into() }]
    }

    fn into_boxed(self) -> Box<dyn Step> {
        Box::new(self)
    }
}
