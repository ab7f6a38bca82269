//! Deterministic member ordering.
//!
//! A type declares its keys in groups. Every group carries a relative index
//! that reserves its own band of sort positions, so a subtype can place its
//! keys after a base type's keys without restating them:
//!
//! ```text
//! sort_index = declared_position + relative_index * GROUP_BAND   (declared)
//! sort_index = first_seen_position + UNDECLARED_OFFSET           (undeclared)
//! ```
//!
//! Undeclared keys always come after declared ones, in the order first seen.
use crate::value::{JsonValue, Members};

pub const GROUP_BAND: i64 = 1_000;
pub const UNDECLARED_OFFSET: i64 = 1_000_000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderedKey {
    pub name: String,
    pub sort_index: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyGroup {
    pub relative_index: i64,
    pub keys: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyLayout {
    groups: Vec<KeyGroup>,
}

impl KeyLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// A single group at relative index 0.
    pub fn declared<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new().group(0, keys)
    }

    pub fn group<I, S>(mut self, relative_index: i64, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups.push(KeyGroup {
            relative_index,
            keys: keys.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Copy of this layout with one more group; used for subtypes.
    pub fn extend<I, S>(&self, relative_index: i64, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.clone().group(relative_index, keys)
    }

    pub fn groups(&self) -> &[KeyGroup] {
        &self.groups
    }

    /// Sort index of a declared key; the first group naming it wins.
    pub fn declared_index(&self, name: &str) -> Option<i64> {
        self.groups.iter().find_map(|group| {
            group
                .keys
                .iter()
                .position(|k| k == name)
                .map(|pos| pos as i64 + group.relative_index * GROUP_BAND)
        })
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.declared_index(name).is_some()
    }

    pub fn resolve(&self, name: &str, first_seen: usize) -> OrderedKey {
        let sort_index = self
            .declared_index(name)
            .unwrap_or(first_seen as i64 + UNDECLARED_OFFSET);
        OrderedKey { name: name.to_owned(), sort_index }
    }

    /// Resolve `names` (given in discovery order) and sort them.
    pub fn order<'a, I>(&self, names: I) -> Vec<OrderedKey>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut keys: Vec<OrderedKey> = names
            .into_iter()
            .enumerate()
            .map(|(seen, name)| self.resolve(name, seen))
            .collect();
        keys.sort_by_key(|k| k.sort_index);
        keys
    }

    /// Declared keys in output order.
    pub fn declared_keys(&self) -> Vec<String> {
        let mut keys: Vec<(i64, &String)> = Vec::new();
        for group in &self.groups {
            for name in &group.keys {
                if keys.iter().all(|(_, k)| *k != name) {
                    keys.push((self.declared_index(name).unwrap_or(UNDECLARED_OFFSET), name));
                }
            }
        }
        keys.sort_by_key(|(idx, _)| *idx);
        keys.into_iter().map(|(_, k)| k.clone()).collect()
    }

    /// Reorder object members; insertion order is the discovery order.
    pub fn sort_members(&self, members: Members) -> Members {
        let mut entries: Vec<(i64, (String, JsonValue))> = members
            .into_iter()
            .enumerate()
            .map(|(seen, (k, v))| (self.resolve(&k, seen).sort_index, (k, v)))
            .collect();
        entries.sort_by_key(|(idx, _)| *idx);
        entries.into_iter().map(|(_, kv)| kv).collect()
    }
}
