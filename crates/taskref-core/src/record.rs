// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Capability traits for fetched task records and collections.
//!
//! These are the whole surface lazy values delegate to once materialized.
//! Stores pick their own concrete record and collection types; the lazy layer
//! only ever calls what is listed here.

use crate::error::LazyError;
use crate::ident::TaskUuid;
use serde_json::Value;
use std::collections::BTreeSet;

/// A fully fetched task record.
///
/// The four status properties are optional. A record shape that
/// has no notion of, say, "saved" returns `None` and [`LazyTask`](crate::LazyTask)
/// substitutes its documented default.
pub trait TaskRecord: Clone {
    /// The record's uuid. `None` for records that were never saved.
    fn uuid(&self) -> Option<&TaskUuid>;

    /// Read a field by name.
    fn field(&self, name: &str) -> Option<Value>;

    /// Overwrite a field by name.
    ///
    /// Once a record has a uuid, writing a different value to
    /// [`ID_FIELD`](crate::ID_FIELD) fails with [`LazyError::ImmutableUuid`].
    fn set_field(&mut self, name: &str, value: Value) -> Result<(), LazyError>;

    /// Whether the task is completed.
    fn completed(&self) -> Option<bool> {
        None
    }

    /// Whether the record has unsaved local changes.
    fn modified(&self) -> Option<bool> {
        None
    }

    /// Whether the record exists in the store.
    fn saved(&self) -> Option<bool> {
        None
    }

    /// Names of fields changed locally since the last fetch or save.
    fn pending_changes(&self) -> Option<BTreeSet<String>> {
        None
    }
}

/// A fetched collection of task records, unique by uuid.
///
/// `Default` must produce an empty collection; lazy sets with no members
/// materialize to it without asking the store.
pub trait TaskCollection: Default + Clone {
    /// Record type held by the collection.
    type Record: TaskRecord;

    /// Records in the collection, in the collection's own order.
    fn records(&self) -> &[Self::Record];

    /// Insert a record, replacing any record with the same uuid.
    fn insert(&mut self, record: Self::Record);

    /// Remove and return the record with this uuid.
    fn remove(&mut self, uuid: &TaskUuid) -> Option<Self::Record>;

    /// Remove and return an arbitrary record.
    fn pop(&mut self) -> Option<Self::Record>;

    /// Keep only the records for which `keep` returns true.
    fn retain(&mut self, keep: &mut dyn FnMut(&Self::Record) -> bool);

    /// Visit every record mutably.
    fn for_each_mut(&mut self, visit: &mut dyn FnMut(&mut Self::Record));

    /// Remove every record.
    fn clear(&mut self) {
        self.retain(&mut |_| false);
    }

    /// Number of records.
    fn len(&self) -> usize {
        self.records().len()
    }

    /// Whether the collection holds no records.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a record by uuid.
    fn get(&self, uuid: &TaskUuid) -> Option<&Self::Record> {
        self.records().iter().find(|r| r.uuid() == Some(uuid))
    }

    /// Whether a record with this uuid is present.
    fn contains(&self, uuid: &TaskUuid) -> bool {
        self.get(uuid).is_some()
    }

    /// Uuids of every saved record in the collection.
    fn uuids(&self) -> Vec<TaskUuid> {
        self.records()
            .iter()
            .filter_map(|r| r.uuid().cloned())
            .collect()
    }
}
