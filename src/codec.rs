//! Byte-level decode and encode.
//!
//! Concrete targets (anything `DeserializeOwned`) are decoded structurally
//! with serde and never touch a registry. Interface targets are parsed into a
//! [`JsonValue`] by probing and then routed through the registry that owns
//! the interface.
//!
//! A polymorphic value inside an object is encoded by its container, which
//! writes the discriminator for each nested element. A polymorphic root has no
//! container, so it has to be wrapped in [`Tagged`]; `dyn Interface` does not
//! implement `Serialize`, so the plain `encode` cannot be used by mistake.
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CodecError;
use crate::path_de;
use crate::registry::{Discriminated, Factory, Polymorphic};
use crate::value::{self, JsonValue};

#[derive(Clone, Copy, Debug)]
pub struct Codec<'f> {
    factory: &'f Factory,
}

/// A polymorphic root value paired with the discriminator to write for it.
pub struct Tagged<'a, T: ?Sized> {
    discriminator: &'a str,
    payload: &'a T,
}

impl<'a, T: ?Sized + Discriminated> Tagged<'a, T> {
    pub fn new(payload: &'a T) -> Self {
        Self { discriminator: payload.discriminator(), payload }
    }
}

impl<'a, T: ?Sized> Tagged<'a, T> {
    pub fn with_discriminator(discriminator: &'a str, payload: &'a T) -> Self {
        Self { discriminator, payload }
    }

    pub fn discriminator(&self) -> &str {
        self.discriminator
    }

    pub fn payload(&self) -> &T {
        self.payload
    }
}

impl<'f> Codec<'f> {
    pub fn new(factory: &'f Factory) -> Self {
        Self { factory }
    }

    pub fn factory(&self) -> &'f Factory {
        self.factory
    }

    /// Parse bytes into a dynamic value, within the configured depth limit.
    pub fn parse(&self, bytes: &[u8]) -> Result<JsonValue, CodecError> {
        value::parse_document(bytes, &self.factory.config().limits)
    }

    /// Structural decode of a concrete type.
    pub fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        path_de::from_slice_with_path(bytes)
    }

    pub fn decode_polymorphic<T: ?Sized + Polymorphic>(
        &self,
        bytes: &[u8],
    ) -> Result<Box<T>, CodecError> {
        let value = self.parse(bytes)?;
        self.factory.decode::<T>(&value)
    }

    pub fn decode_sequence<T: ?Sized + Polymorphic>(
        &self,
        bytes: &[u8],
    ) -> Result<Vec<Box<T>>, CodecError> {
        let value = self.parse(bytes)?;
        self.factory.decode_sequence::<T>(&value)
    }

    pub fn encode<S: Serialize + ?Sized>(&self, value: &S) -> Result<Vec<u8>, CodecError> {
        let bytes = if self.factory.config().pretty {
            serde_json::to_vec_pretty(value)
        } else {
            serde_json::to_vec(value)
        };
        bytes.map_err(CodecError::Encode)
    }

    pub fn encode_tagged<T: ?Sized + Polymorphic>(
        &self,
        tagged: &Tagged<'_, T>,
    ) -> Result<Vec<u8>, CodecError> {
        let value = self.tagged_value(tagged)?;
        self.encode(&value)
    }

    /// Each element goes through the registry, so a root array needs no wrapper.
    pub fn encode_sequence<T: ?Sized + Polymorphic>(
        &self,
        items: &[Box<T>],
    ) -> Result<Vec<u8>, CodecError> {
        let values = items
            .iter()
            .map(|item| self.factory.encode(&**item))
            .collect::<Result<Vec<_>, _>>()?;
        self.encode(&JsonValue::Array(values))
    }

    pub fn tagged_value<T: ?Sized + Polymorphic>(
        &self,
        tagged: &Tagged<'_, T>,
    ) -> Result<JsonValue, CodecError> {
        let registry = self.factory.registry_of::<T>()?;
        let mut value = registry.encode(tagged.payload, self.factory)?;
        if let JsonValue::Object(members) = &mut value {
            // the member keeps its sorted position
            let field = registry.discriminator_field().to_owned();
            members.insert(field, JsonValue::from(tagged.discriminator));
        }
        Ok(value)
    }
}
