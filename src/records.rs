//! Sample record family.
//!
//! Two interfaces built on the engine: [`Record`] (results a run produces) and
//! [`Step`] (entries of a branch's step history). They exist to exercise the
//! codec end to end and back the command line tool; nothing in the engine
//! depends on them.
mod answer;
mod branch;
mod collection;
mod file;
mod step;
mod unknown;

use std::any::Any;
use std::fmt;

use once_cell::sync::Lazy;

use crate::config::CodecConfig;
use crate::ordered_key::KeyLayout;
use crate::registry::{Discriminated, EncodeFields, Factory};
use crate::schema::{JsonType, SchemaBuilder};

pub use answer::Answer;
pub use branch::Branch;
pub use collection::Collection;
pub use file::FileResult;
pub use step::{Message, Step, ToolCall};
pub use unknown::UnknownRecord;

pub const RECORD_INTERFACE: &str = "Record";
pub const STEP_INTERFACE: &str = "Step";

/// Keys every record starts with.
pub static BASE_LAYOUT: Lazy<KeyLayout> = Lazy::new(|| KeyLayout::declared(["id", "type"]));

pub trait Record: Discriminated + EncodeFields + Send + Sync + Any + fmt::Debug {
    fn id(&self) -> &str;

    /// Independent copy, nested records included.
    fn deep_copy(&self) -> Box<dyn Record>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl dyn Record {
    pub fn downcast_ref<V: Record>(&self) -> Option<&V> {
        self.as_any().downcast_ref()
    }

    pub fn downcast_mut<V: Record>(&mut self) -> Option<&mut V> {
        self.as_any_mut().downcast_mut()
    }
}

impl Clone for Box<dyn Record> {
    fn clone(&self) -> Self {
        self.deep_copy()
    }
}

fn describe_base(schema: &mut SchemaBuilder) {
    schema.property("id", JsonType::String, "Identifier, unique within a document");
}

/// Both sample registries installed in a factory built from `config`.
pub fn factory(config: CodecConfig) -> Factory {
    let mut factory = Factory::new(config);
    let records = factory
        .new_registry::<dyn Record>(RECORD_INTERFACE)
        .with::<Answer>()
        .with::<FileResult>()
        .with::<Collection>()
        .with::<Branch>()
        .with_default::<UnknownRecord>();
    let steps = factory
        .new_registry::<dyn Step>(STEP_INTERFACE)
        .with::<ToolCall>()
        .with::<Message>();
    factory.insert(records).insert(steps);
    factory
}
