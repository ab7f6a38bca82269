//! The umbrella factory: one registry per interface, keyed by the interface's
//! type identity, plus the codec configuration every call runs under.
use std::any::{type_name, Any, TypeId};
use std::fmt;

use indexmap::IndexMap;

use crate::config::CodecConfig;
use crate::error::{CodecError, SchemaError};
use crate::path_de::Path;
use crate::registry::{Polymorphic, Registry};
use crate::schema::{SchemaDocument, SchemaGenerator};
use crate::value::JsonValue;

/// Type-erased view of a `Registry<T>`.
pub(crate) trait ErasedRegistry: Any + Send + Sync {
    fn interface(&self) -> &str;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn document(
        &self,
        generator: &SchemaGenerator<'_>,
        keep: &dyn Fn(&str) -> bool,
    ) -> Result<SchemaDocument, SchemaError>;
    fn canonicalize(&self, value: &JsonValue, factory: &Factory) -> Result<JsonValue, CodecError>;
}

impl<T: ?Sized + Polymorphic> ErasedRegistry for Registry<T> {
    fn interface(&self) -> &str {
        Registry::interface(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn document(
        &self,
        generator: &SchemaGenerator<'_>,
        keep: &dyn Fn(&str) -> bool,
    ) -> Result<SchemaDocument, SchemaError> {
        generator.registry_document(self, keep)
    }

    fn canonicalize(&self, value: &JsonValue, factory: &Factory) -> Result<JsonValue, CodecError> {
        let instance = self.decode(value, factory)?;
        self.encode(&*instance, factory)
    }
}

#[derive(Default)]
pub struct Factory {
    config: CodecConfig,
    registries: IndexMap<TypeId, Box<dyn ErasedRegistry>>,
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factory")
            .field("config", &self.config)
            .field("interfaces", &self.interfaces().collect::<Vec<_>>())
            .finish()
    }
}

impl Factory {
    pub fn new(config: CodecConfig) -> Self {
        Self { config, registries: IndexMap::new() }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Start a registry that uses the configured discriminator field.
    pub fn new_registry<T: ?Sized + Polymorphic>(
        &self,
        interface: impl Into<String>,
    ) -> Registry<T> {
        Registry::new(interface).with_discriminator_field(self.config.discriminator_field.clone())
    }

    /// Install the registry for interface `T`, replacing any previous one.
    pub fn insert<T: ?Sized + Polymorphic>(&mut self, registry: Registry<T>) -> &mut Self {
        tracing::debug!(
            interface = %registry.interface(),
            variants = registry.descriptors().count(),
            "registry installed"
        );
        self.registries.insert(TypeId::of::<T>(), Box::new(registry));
        self
    }

    pub fn with<T: ?Sized + Polymorphic>(mut self, registry: Registry<T>) -> Self {
        self.insert(registry);
        self
    }

    pub fn registry<T: ?Sized + Polymorphic>(&self) -> Option<&Registry<T>> {
        self.registries
            .get(&TypeId::of::<T>())?
            .as_any()
            .downcast_ref::<Registry<T>>()
    }

    /// Setup-phase access for late registrations.
    pub fn registry_mut<T: ?Sized + Polymorphic>(&mut self) -> Option<&mut Registry<T>> {
        self.registries
            .get_mut(&TypeId::of::<T>())?
            .as_any_mut()
            .downcast_mut::<Registry<T>>()
    }

    pub fn registry_of<T: ?Sized + Polymorphic>(&self) -> Result<&Registry<T>, CodecError> {
        self.registry::<T>().ok_or_else(|| CodecError::UnregisteredInterface {
            interface: type_name::<T>().to_owned(),
        })
    }

    /// Interface names in installation order.
    pub fn interfaces(&self) -> impl Iterator<Item = &str> {
        self.registries.values().map(|r| r.interface())
    }

    pub fn decode<T: ?Sized + Polymorphic>(&self, value: &JsonValue) -> Result<Box<T>, CodecError> {
        self.registry_of::<T>()?.decode(value, self)
    }

    pub fn decode_sequence<T: ?Sized + Polymorphic>(
        &self,
        value: &JsonValue,
    ) -> Result<Vec<Box<T>>, CodecError> {
        self.registry_of::<T>()?.decode_sequence(value, self)
    }

    pub fn encode<T: ?Sized + Polymorphic>(&self, instance: &T) -> Result<JsonValue, CodecError> {
        self.registry_of::<T>()?.encode(instance, self)
    }

    /// Decode `value` as the interface named `interface` and encode it again.
    pub fn canonicalize(
        &self,
        interface: &str,
        value: &JsonValue,
    ) -> Result<JsonValue, CodecError> {
        let registry = self
            .registries
            .values()
            .find(|r| r.interface() == interface)
            .ok_or_else(|| CodecError::UnregisteredInterface { interface: interface.to_owned() })?;
        registry.canonicalize(value, self)
    }

    pub(crate) fn erased(&self) -> impl Iterator<Item = &dyn ErasedRegistry> {
        self.registries.values().map(|r| r.as_ref())
    }

    pub(crate) fn decode_at<T: ?Sized + Polymorphic>(
        &self,
        value: &JsonValue,
        path: Path,
        depth: usize,
    ) -> Result<Box<T>, CodecError> {
        self.registry_of::<T>()?.decode_at(value, self, path, depth)
    }

    pub(crate) fn decode_sequence_at<T: ?Sized + Polymorphic>(
        &self,
        value: &JsonValue,
        path: Path,
        depth: usize,
    ) -> Result<Vec<Box<T>>, CodecError> {
        self.registry_of::<T>()?.decode_sequence_at(value, self, path, depth)
    }
}
