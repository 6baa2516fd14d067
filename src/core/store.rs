//! The raw tag store collaborator and an in-memory implementation.

use std::collections::BTreeMap;
use std::io;

use crate::models::{Namespace, RawValue, TagId};

/// Namespaced tag storage backing a metadata record.
///
/// Implementations own parsing and serialization of the underlying medium;
/// callers only see raw values keyed by tag.
pub trait RawStore {
    /// Tags currently present in `namespace`.
    fn keys(&self, namespace: Namespace) -> Vec<TagId>;

    fn get(&self, tag: &TagId) -> Option<&RawValue>;

    fn set(&mut self, tag: TagId, value: RawValue);

    fn remove(&mut self, tag: &TagId) -> Option<RawValue>;

    /// Write every tag back to the backing medium as one unit.
    fn persist(&mut self) -> io::Result<()>;

    fn contains(&self, tag: &TagId) -> bool {
        self.get(tag).is_some()
    }
}

/// Store held entirely in memory. `persist` always succeeds.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemoryStore {
    tags: BTreeMap<TagId, RawValue>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tags(tags: impl IntoIterator<Item = (TagId, RawValue)>) -> Self {
        Self {
            tags: tags.into_iter().collect(),
        }
    }

    pub fn with(mut self, tag: TagId, value: RawValue) -> Self {
        self.tags.insert(tag, value);
        self
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TagId, &RawValue)> {
        self.tags.iter()
    }
}

impl RawStore for MemoryStore {
    fn keys(&self, namespace: Namespace) -> Vec<TagId> {
        self.tags
            .keys()
            .filter(|tag| tag.namespace() == namespace)
            .cloned()
            .collect()
    }

    fn get(&self, tag: &TagId) -> Option<&RawValue> {
        self.tags.get(tag)
    }

    fn set(&mut self, tag: TagId, value: RawValue) {
        self.tags.insert(tag, value);
    }

    fn remove(&mut self, tag: &TagId) -> Option<RawValue> {
        self.tags.remove(tag)
    }

    fn persist(&mut self) -> io::Result<()> {
        Ok(())
    }
}
