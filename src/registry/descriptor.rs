use std::fmt;

use crate::error::CodecError;
use crate::fields::FieldReader;
use crate::ordered_key::KeyLayout;
use crate::registry::{Factory, Variant};
use crate::schema::SchemaBuilder;

pub type DecodeFn<T> = fn(&mut FieldReader<'_>, &Factory) -> Result<Box<T>, CodecError>;
pub type DescribeFn = fn(&mut SchemaBuilder);
pub type ExamplesFn<T> = fn() -> Vec<Box<T>>;

/// Everything a registry knows about one discriminator. Immutable once built.
///
/// Encoding is not stored here: an instance encodes itself through
/// [`EncodeFields`](crate::registry::EncodeFields), so the registry never has
/// to look its descriptor up on the way out.
pub struct TypeDescriptor<T: ?Sized> {
    discriminator: String,
    layout: KeyLayout,
    required: Vec<String>,
    decode: DecodeFn<T>,
    describe: DescribeFn,
    examples: ExamplesFn<T>,
}

impl<T: ?Sized> TypeDescriptor<T> {
    pub fn new(
        discriminator: impl Into<String>,
        layout: KeyLayout,
        decode: DecodeFn<T>,
        describe: DescribeFn,
        examples: ExamplesFn<T>,
    ) -> Self {
        let mut schema = SchemaBuilder::new();
        describe(&mut schema);
        Self {
            discriminator: discriminator.into(),
            layout,
            required: schema.required_names(),
            decode,
            describe,
            examples,
        }
    }

    pub fn of<V: Variant<T>>() -> Self {
        Self::new(
            V::DISCRIMINATOR,
            V::layout().clone(),
            decode_variant::<T, V>,
            V::describe,
            examples_of::<T, V>,
        )
    }

    pub fn discriminator(&self) -> &str {
        &self.discriminator
    }

    pub fn layout(&self) -> &KeyLayout {
        &self.layout
    }

    /// Names the schema marks as required.
    pub fn required(&self) -> &[String] {
        &self.required
    }

    pub fn decode(
        &self,
        reader: &mut FieldReader<'_>,
        factory: &Factory,
    ) -> Result<Box<T>, CodecError> {
        (self.decode)(reader, factory)
    }

    pub fn describe(&self, schema: &mut SchemaBuilder) {
        (self.describe)(schema)
    }

    pub fn examples(&self) -> Vec<Box<T>> {
        (self.examples)()
    }
}

impl<T: ?Sized> Clone for TypeDescriptor<T> {
    fn clone(&self) -> Self {
        Self {
            discriminator: self.discriminator.clone(),
            layout: self.layout.clone(),
            required: self.required.clone(),
            decode: self.decode,
            describe: self.describe,
            examples: self.examples,
        }
    }
}

impl<T: ?Sized> fmt::Debug for TypeDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("discriminator", &self.discriminator)
            .field("layout", &self.layout)
            .field("required", &self.required)
            .finish_non_exhaustive()
    }
}

fn decode_variant<T: ?Sized, V: Variant<T>>(
    reader: &mut FieldReader<'_>,
    factory: &Factory,
) -> Result<Box<T>, CodecError> {
    V::decode(reader, factory).map(V::into_boxed)
}

fn examples_of<T: ?Sized, V: Variant<T>>() -> Vec<Box<T>> {
    V::examples().into_iter().map(V::into_boxed).collect()
}
