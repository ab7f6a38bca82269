//! Schema documents.
//!
//! A document describes the JSON shape of one variant or of a whole
//! interface: ordered properties with their type, required flag and
//! description, the discriminator as a constant, references to nested named
//! types, and examples that have been round-tripped through the codec.
pub mod generator;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::ordered_key::KeyLayout;
use crate::value::JsonValue;

pub use generator::SchemaGenerator;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JsonType {
    Any,
    Boolean,
    Integer,
    Number,
    String,
    Object,
    Array(Box<JsonType>),
    /// A polymorphic interface; members carry their own discriminator.
    Interface(String),
    /// A named concrete type.
    Named(String),
}

impl JsonType {
    pub fn array(item: JsonType) -> Self {
        JsonType::Array(Box::new(item))
    }

    pub fn interface(name: impl Into<String>) -> Self {
        JsonType::Interface(name.into())
    }

    pub fn named(name: impl Into<String>) -> Self {
        JsonType::Named(name.into())
    }

    /// Name of the referenced type, looking through arrays.
    pub fn reference(&self) -> Option<&str> {
        match self {
            JsonType::Array(item) => item.reference(),
            JsonType::Interface(name) | JsonType::Named(name) => Some(name),
            _ => None,
        }
    }

    fn primitive_name(&self) -> Option<&'static str> {
        Some(match self {
            JsonType::Any => "any",
            JsonType::Boolean => "boolean",
            JsonType::Integer => "integer",
            JsonType::Number => "number",
            JsonType::String => "string",
            JsonType::Object => "object",
            _ => return None,
        })
    }
}

// Primitives render as their name; composites as a small object.
impl Serialize for JsonType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if let Some(name) = self.primitive_name() {
            return serializer.serialize_str(name);
        }
        let mut map = serializer.serialize_map(None)?;
        match self {
            JsonType::Array(item) => {
                map.serialize_entry("type", "array")?;
                map.serialize_entry("items", item)?;
            }
            JsonType::Interface(name) => {
                map.serialize_entry("$ref", name)?;
                map.serialize_entry("polymorphic", &true)?;
            }
            JsonType::Named(name) => {
                map.serialize_entry("$ref", name)?;
            }
            _ => {}
        }
        map.end()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct PropertySchema {
    pub name: String,
    #[serde(rename = "type")]
    pub json_type: JsonType,
    pub required: bool,
    pub description: String,
    #[serde(rename = "const", skip_serializing_if = "Option::is_none")]
    pub const_value: Option<JsonValue>,
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<JsonValue>,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct SchemaDocument {
    pub title: String,
    pub properties: Vec<PropertySchema>,
    pub required: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,
    pub examples: Vec<JsonValue>,
    /// Per-variant documents of an interface document.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<SchemaDocument>,
}

impl SchemaDocument {
    pub fn property(&self, name: &str) -> Option<&PropertySchema> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn variant(&self, title: &str) -> Option<&SchemaDocument> {
        self.variants.iter().find(|v| v.title == title)
    }
}

/// Collects the properties a variant describes about itself.
#[derive(Clone, Debug, Default)]
pub struct SchemaBuilder {
    properties: Vec<PropertySchema>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn property(&mut self, name: &str, json_type: JsonType, description: &str) -> &mut Self {
        self.push(name, json_type, true, description, None)
    }

    pub fn optional(&mut self, name: &str, json_type: JsonType, description: &str) -> &mut Self {
        self.push(name, json_type, false, description, None)
    }

    /// A required property whose value is fixed.
    pub fn constant(
        &mut self,
        name: &str,
        value: impl Into<JsonValue>,
        description: &str,
    ) -> &mut Self {
        let value = value.into();
        let json_type = match &value {
            JsonValue::Bool(_) => JsonType::Boolean,
            JsonValue::Integer(_) => JsonType::Integer,
            JsonValue::Number(_) => JsonType::Number,
            JsonValue::String(_) => JsonType::String,
            JsonValue::Array(_) => JsonType::array(JsonType::Any),
            JsonValue::Object(_) => JsonType::Object,
            JsonValue::Null => JsonType::Any,
        };
        self.push(name, json_type, true, description, Some(value))
    }

    pub fn has(&self, name: &str) -> bool {
        self.properties.iter().any(|p| p.name == name)
    }

    pub fn required_names(&self) -> Vec<String> {
        self.properties.iter().filter(|p| p.required).map(|p| p.name.clone()).collect()
    }

    pub(crate) fn properties_mut(&mut self) -> &mut Vec<PropertySchema> {
        &mut self.properties
    }

    /// Properties in the order the layout would encode them.
    pub fn into_properties(self, layout: &KeyLayout) -> Vec<PropertySchema> {
        let order = layout.order(self.properties.iter().map(|p| p.name.as_str()));
        let mut remaining = self.properties;
        let mut out = Vec::with_capacity(remaining.len());
        for key in order {
            if let Some(pos) = remaining.iter().position(|p| p.name == key.name) {
                out.push(remaining.remove(pos));
            }
        }
        out
    }

    fn push(
        &mut self,
        name: &str,
        json_type: JsonType,
        required: bool,
        description: &str,
        const_value: Option<JsonValue>,
    ) -> &mut Self {
        self.properties.retain(|p| p.name != name);
        self.properties.push(PropertySchema {
            name: name.to_owned(),
            json_type,
            required,
            description: description.to_owned(),
            const_value,
            enum_values: Vec::new(),
        });
        self
    }
}
