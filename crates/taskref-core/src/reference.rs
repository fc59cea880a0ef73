// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Lazy reference to a single task.

use crate::config::ReferencePolicy;
use crate::error::LazyError;
use crate::ident::{TaskLike, TaskUuid, ID_FIELD};
use crate::record::TaskRecord;
use crate::store::{Backend, TaskStore};
use crate::task::Task;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use tracing::{debug, instrument};

/// A task known by uuid, fetched only when record data is needed.
///
/// States: *lazy* (uuid only) and *materialized* (uuid + fetched record).
/// The first accessor that needs record data moves a lazy task to
/// materialized; nothing moves it back.
///
/// Equality and hashing use the uuid alone, so a lazy and a materialized
/// reference to the same task are equal and hash identically.
pub struct LazyTask<S: TaskStore> {
    backend: Backend<S>,
    uuid: TaskUuid,
    record: Option<S::Record>,
}

impl<S: TaskStore> LazyTask<S> {
    /// A lazy reference; no backend call is made.
    pub fn new(backend: Backend<S>, uuid: TaskUuid) -> Self {
        Self {
            backend,
            uuid,
            record: None,
        }
    }

    /// A reference that starts out materialized with an already fetched record.
    pub(crate) fn with_record(backend: Backend<S>, uuid: TaskUuid, record: S::Record) -> Self {
        Self {
            backend,
            uuid,
            record: Some(record),
        }
    }

    /// The task's uuid. Never touches the backend.
    pub fn uuid(&self) -> &TaskUuid {
        &self.uuid
    }

    /// The handle this reference materializes through.
    pub fn backend(&self) -> &Backend<S> {
        &self.backend
    }

    /// Whether a record has been fetched.
    pub fn is_materialized(&self) -> bool {
        self.record.is_some()
    }

    /// The fetched record, if any. Never touches the backend.
    pub fn record(&self) -> Option<&S::Record> {
        self.record.as_ref()
    }

    /// Read a field.
    ///
    /// [`ID_FIELD`] is answered from the uuid without a backend call; any
    /// other name materializes first.
    pub fn get_field(&mut self, name: &str) -> Result<Value, LazyError> {
        if name == ID_FIELD {
            return Ok(Value::String(self.uuid.to_string()));
        }
        let found = self.materialize()?.field(name);
        found.ok_or_else(|| LazyError::FieldNotFound {
            uuid: self.uuid.clone(),
            field: name.to_owned(),
        })
    }

    /// Whether the task is completed; `false` if the record has no such notion.
    pub fn completed(&mut self) -> Result<bool, LazyError> {
        Ok(self.materialize()?.completed().unwrap_or(false))
    }

    /// Whether the record has local edits; `false` if the record has no such notion.
    pub fn modified(&mut self) -> Result<bool, LazyError> {
        Ok(self.materialize()?.modified().unwrap_or(false))
    }

    /// Whether the record exists in the store; `true` if the record has no such notion.
    pub fn saved(&mut self) -> Result<bool, LazyError> {
        Ok(self.materialize()?.saved().unwrap_or(true))
    }

    /// Locally edited field names; empty if the record has no such notion.
    pub fn pending_changes(&mut self) -> Result<BTreeSet<String>, LazyError> {
        Ok(self.materialize()?.pending_changes().unwrap_or_default())
    }

    /// Compare identity with any task-like value. Never errors: a value
    /// without a uuid is simply unequal.
    pub fn equals(&self, other: &impl TaskLike) -> bool {
        other.task_uuid().as_ref() == Some(&self.uuid)
    }

    /// Make sure a record is present and return it.
    ///
    /// Under [`ReferencePolicy::Memoize`] the store is asked once; under
    /// [`ReferencePolicy::Refetch`] every call fetches again.
    pub fn materialize(&mut self) -> Result<&S::Record, LazyError> {
        let refetch = self.backend.config().reference_policy == ReferencePolicy::Refetch;
        if refetch || self.record.is_none() {
            self.refresh()
        } else {
            self.record
                .as_ref()
                .ok_or_else(|| LazyError::not_found(&self.uuid))
        }
    }

    /// Fetch the record again, replacing any previously fetched one.
    ///
    /// On failure the previous record (if any) is kept.
    #[instrument(level = "debug", skip(self), fields(uuid = %self.uuid))]
    pub fn refresh(&mut self) -> Result<&S::Record, LazyError> {
        debug!(was_materialized = self.record.is_some(), "fetching task");
        let record = self.backend.store().get(&self.uuid)?;
        Ok(self.record.insert(record))
    }

    /// Materialize and hand over the record.
    pub fn into_record(mut self) -> Result<S::Record, LazyError> {
        self.materialize()?;
        self.record.ok_or_else(|| LazyError::not_found(&self.uuid))
    }
}

impl<S: TaskStore> TaskLike for LazyTask<S> {
    fn task_uuid(&self) -> Option<TaskUuid> {
        Some(self.uuid.clone())
    }
}

impl<S: TaskStore> Clone for LazyTask<S> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            uuid: self.uuid.clone(),
            record: self.record.clone(),
        }
    }
}

impl<S: TaskStore> PartialEq for LazyTask<S> {
    fn eq(&self, other: &Self) -> bool {
        self.uuid == other.uuid
    }
}

impl<S: TaskStore> Eq for LazyTask<S> {}

impl<S: TaskStore> Hash for LazyTask<S> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uuid.hash(state);
    }
}

impl<S: TaskStore> PartialEq<Task> for LazyTask<S> {
    fn eq(&self, other: &Task) -> bool {
        self.equals(other)
    }
}

impl<S: TaskStore> PartialEq<LazyTask<S>> for Task {
    fn eq(&self, other: &LazyTask<S>) -> bool {
        other.equals(self)
    }
}

impl<S: TaskStore> PartialEq<TaskUuid> for LazyTask<S> {
    fn eq(&self, other: &TaskUuid) -> bool {
        &self.uuid == other
    }
}

impl<S: TaskStore> fmt::Debug for LazyTask<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.is_materialized() {
            "materialized"
        } else {
            "lazy"
        };
        f.debug_struct("LazyTask")
            .field("uuid", &self.uuid)
            .field("state", &state)
            .finish_non_exhaustive()
    }
}

impl<S: TaskStore> fmt::Display for LazyTask<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LazyTask: {}", self.uuid)
    }
}
