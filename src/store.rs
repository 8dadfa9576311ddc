//! Object store: every parsed object of one run, keyed by full path
//!
//! The store is an arena: objects live in one insertion-ordered vector and
//! are addressed by index everywhere else (edges, applications). There is no
//! removal; a later definition of the same object merges into the earlier
//! one, and a definition of a different kind under an existing path is
//! rejected.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::domain::ConfigObject;
use crate::stats::TypeConflict;

/// What [`ObjectStore::insert`] did with an object
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// Merged over an existing definition of the same object
    Merged,
    /// Rejected: the path already names an object of another kind
    Conflict(TypeConflict),
}

/// Insertion-ordered collection of objects, one per full path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectStore {
    objects: IndexMap<String, ConfigObject>,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, object: ConfigObject) -> InsertOutcome {
        match self.objects.get_mut(&object.full_path) {
            None => {
                self.objects.insert(object.full_path.clone(), object);
                InsertOutcome::Inserted
            }
            Some(existing) if existing.type_tag == object.type_tag => {
                existing.merge(object);
                InsertOutcome::Merged
            }
            Some(existing) => InsertOutcome::Conflict(TypeConflict {
                full_path: object.full_path,
                kept_type: existing.type_tag.clone(),
                rejected_type: object.type_tag,
                file: object.source_files.last().cloned().unwrap_or_default(),
            }),
        }
    }

    pub fn get(&self, full_path: &str) -> Option<&ConfigObject> {
        self.objects.get(full_path)
    }

    /// Arena index of an object
    pub fn index_of(&self, full_path: &str) -> Option<usize> {
        self.objects.get_index_of(full_path)
    }

    /// Object at an arena index
    pub fn at(&self, index: usize) -> Option<&ConfigObject> {
        self.objects.get_index(index).map(|(_, object)| object)
    }

    /// All objects in insertion order
    pub fn all(&self) -> impl ExactSizeIterator<Item = &ConfigObject> {
        self.objects.values()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Snapshot of the store in the pre-parsed bundle format
    pub fn export(&self) -> ObjectExport {
        ObjectExport {
            objects: self.objects.values().cloned().collect(),
        }
    }
}

/// Serialized object list, re-enterable as a pre-parsed bundle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectExport {
    pub objects: Vec<ConfigObject>,
}

impl ObjectExport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
