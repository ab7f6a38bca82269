//! Polymorphic JSON codec with generated schema documents.
//!
//! Values whose concrete type is only known at runtime carry a string
//! discriminator (by default the `type` member). Registries map each
//! discriminator to decode logic for one interface family; an umbrella
//! [`Factory`] owns one registry per interface and is threaded explicitly
//! through every decode, encode and schema call.
//!
//! - [`value`] - dynamic JSON values and probe-order decoding
//! - [`ordered_key`] - deterministic member ordering
//! - [`registry`] - capability traits, descriptors, registries, factory
//! - [`codec`] - byte-level decode/encode entry points
//! - [`schema`] - schema documents and the self-checking generator
//! - [`records`] - a sample record family built on the engine
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod codec;
pub mod config;
pub mod error;
pub mod fields;
pub mod ordered_key;
pub mod path_de;
pub mod records;
pub mod registry;
pub mod schema;
pub mod value;

pub use codec::{Codec, Tagged};
pub use config::{CodecConfig, Limits};
pub use error::{CodecError, SchemaError};
pub use fields::{FieldReader, ObjectWriter};
pub use ordered_key::{KeyLayout, OrderedKey};
pub use path_de::Path;
pub use registry::{
    Discriminated, EncodeFields, Factory, Polymorphic, Registry, TypeDescriptor, Variant,
};
pub use schema::{JsonType, PropertySchema, SchemaBuilder, SchemaDocument, SchemaGenerator};
pub use value::{JsonValue, Members};
