use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::StoreConfig;
use crate::core::adapter;
use crate::core::catalog;
use crate::core::file_store::FileStore;
use crate::core::store::RawStore;
use crate::models::{Namespace, SemanticField, TagId, TagValue};

#[derive(Debug)]
pub enum MetadataError {
    InvalidCoordinate(String),
    UnsupportedValueType { tag: TagId, reason: String },
    UnknownTagType { tag: TagId, kind: String },
    PersistFailed(std::io::Error),
    FileNotFound(PathBuf),
    InvalidTagKey(String),
    UnknownField(String),
    InvalidFieldValue { field: SemanticField, reason: String },
    Io(std::io::Error),
    Serialization(serde_json::Error),
}

impl fmt::Display for MetadataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCoordinate(reason) => write!(f, "invalid coordinate: {reason}"),
            Self::UnsupportedValueType { tag, reason } => {
                write!(f, "unsupported value for {tag}: {reason}")
            }
            Self::UnknownTagType { tag, kind } => write!(f, "{tag} holds an unknown {kind}"),
            Self::PersistFailed(err) => write!(f, "failed to persist metadata: {err}"),
            Self::FileNotFound(path) => write!(f, "file not found: {}", path.display()),
            Self::InvalidTagKey(key) => write!(f, "invalid metadata tag key: {key}"),
            Self::UnknownField(name) => write!(f, "unknown metadata field: {name}"),
            Self::InvalidFieldValue { field, reason } => {
                write!(f, "invalid value for {field}: {reason}")
            }
            Self::Io(err) => write!(f, "io error: {err}"),
            Self::Serialization(err) => write!(f, "metadata serialization error: {err}"),
        }
    }
}

impl std::error::Error for MetadataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::PersistFailed(err) | Self::Io(err) => Some(err),
            Self::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for MetadataError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for MetadataError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

pub type Result<T> = std::result::Result<T, MetadataError>;

type DirtyObserver = Box<dyn FnMut(bool)>;

/// Semantic field access over one raw tag store.
///
/// Reads take the first catalog candidate present; writes go to every
/// candidate so the namespaces stay consistent. Mutations that change
/// something mark the record dirty until the next successful [`save`].
///
/// [`save`]: MetadataRecord::save
pub struct MetadataRecord<S: RawStore> {
    store: S,
    dirty: bool,
    observers: Vec<DirtyObserver>,
}

impl MetadataRecord<FileStore> {
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_config(path, StoreConfig::default())
    }

    pub fn open_with_config(path: &Path, config: StoreConfig) -> Result<Self> {
        let store = FileStore::open_with_config(path, config)?;
        log::debug!("opened metadata record for {}", path.display());
        Ok(Self::new(store))
    }

    pub fn path(&self) -> &Path {
        self.store.path()
    }
}

impl<S: RawStore> MetadataRecord<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            dirty: false,
            observers: Vec::new(),
        }
    }

    pub fn get_field(&self, field: SemanticField) -> Result<Option<TagValue>> {
        for tag in catalog::candidates_for(field) {
            if let Some(value) = adapter::read_tag(&self.store, tag)? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    pub fn set_field(&mut self, field: SemanticField, value: TagValue) -> Result<()> {
        if let Some(current) = self.get_field(field)? {
            if current.same_content(&value) {
                return Ok(());
            }
        }

        let mut writes = Vec::new();
        for tag in catalog::candidates_for(field) {
            writes.extend(adapter::encode_tag(tag, &value)?);
        }
        for (tag, raw) in writes {
            self.store.set(tag, raw);
        }

        log::debug!("set {field} to {value}");
        self.set_dirty(true);
        Ok(())
    }

    /// Remove every candidate tag of `field`. Returns whether any was present.
    pub fn delete_field(&mut self, field: SemanticField) -> bool {
        let mut removed = false;
        for tag in catalog::candidates_for(field) {
            removed |= adapter::remove_tag(&mut self.store, tag);
        }

        if removed {
            log::debug!("deleted {field}");
            self.set_dirty(true);
        }
        removed
    }

    pub fn has_geotag(&self) -> bool {
        catalog::candidates_for(SemanticField::Latitude)
            .iter()
            .any(|tag| self.store.contains(tag))
    }

    /// Copy every raw tag of `namespaces` from `other`. Returns how many
    /// tags changed.
    pub fn copy_from<T: RawStore>(
        &mut self,
        other: &MetadataRecord<T>,
        namespaces: &[Namespace],
    ) -> usize {
        let mut changed = 0;
        for namespace in namespaces {
            for tag in other.store.keys(*namespace) {
                let Some(value) = other.store.get(&tag) else {
                    continue;
                };
                if self.store.get(&tag) != Some(value) {
                    self.store.set(tag, value.clone());
                    changed += 1;
                }
            }
        }

        if changed > 0 {
            log::debug!("copied {changed} tags");
            self.set_dirty(true);
        }
        changed
    }

    /// Persist the store if anything changed since the last save.
    pub fn save(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }

        self.store.persist().map_err(MetadataError::PersistFailed)?;
        log::info!("metadata saved");
        self.set_dirty(false);
        Ok(())
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Register a callback invoked with the new value on each change of the
    /// dirty flag.
    pub fn on_dirty_changed(&mut self, observer: impl FnMut(bool) + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn set_dirty(&mut self, dirty: bool) {
        if self.dirty == dirty {
            return;
        }
        self.dirty = dirty;
        for observer in &mut self.observers {
            observer(dirty);
        }
    }
}

impl<S: RawStore + fmt::Debug> fmt::Debug for MetadataRecord<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataRecord")
            .field("store", &self.store)
            .field("dirty", &self.dirty)
            .field("observers", &self.observers.len())
            .finish()
    }
}
