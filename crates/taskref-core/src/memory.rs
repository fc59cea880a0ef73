// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory task store.
//!
//! [`MemoryStore`] is the reference [`TaskStore`]: records live in a map keyed
//! by uuid, and the only query it understands is a list of bare uuids.

use std::collections::BTreeMap;

use crate::error::LazyError;
use crate::ident::TaskUuid;
use crate::record::TaskCollection;
use crate::store::TaskStore;
use crate::task::{Task, TaskList};

/// In-memory task store.
///
/// Tasks are keyed by uuid in a `BTreeMap`, so `filter` results come back in
/// uuid order regardless of query order.
///
/// # Query semantics
///
/// - The query is split on [`query_separator`](TaskStore::query_separator);
///   every non-empty term is a uuid and terms are OR-ed.
/// - Terms naming no stored task match nothing (not an error).
/// - An empty query matches every task.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tasks: BTreeMap<TaskUuid, Task>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a task, replacing any task with the same uuid.
    ///
    /// Returns [`LazyError::MissingUuid`] for unsaved tasks.
    pub fn insert(&mut self, task: Task) -> Result<TaskUuid, LazyError> {
        let (uuid, task) = keyed(task).ok_or(LazyError::MissingUuid)?;
        self.tasks.insert(uuid.clone(), task);
        Ok(uuid)
    }

    /// Drop a task.
    pub fn remove(&mut self, uuid: &TaskUuid) -> Option<Task> {
        self.tasks.remove(uuid)
    }

    /// Number of tasks stored.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns `true` if no tasks are stored.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// A task ready for storage under its uuid, or `None` if it was never saved.
fn keyed(mut task: Task) -> Option<(TaskUuid, Task)> {
    let uuid = task.uuid.clone()?;
    task.mark_saved();
    Some((uuid, task))
}

impl FromIterator<Task> for MemoryStore {
    /// Collect saved tasks; unsaved ones are skipped.
    fn from_iter<I: IntoIterator<Item = Task>>(iter: I) -> Self {
        Self {
            tasks: iter.into_iter().filter_map(keyed).collect(),
        }
    }
}

impl TaskStore for MemoryStore {
    type Record = Task;
    type Collection = TaskList;

    fn get(&self, uuid: &TaskUuid) -> Result<Task, LazyError> {
        self.tasks
            .get(uuid)
            .cloned()
            .ok_or_else(|| LazyError::not_found(uuid))
    }

    fn filter(&self, query: &str) -> Result<TaskList, LazyError> {
        let mut terms: Vec<TaskUuid> = query
            .split(self.query_separator())
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(TaskUuid::from)
            .collect();
        if terms.is_empty() {
            return Ok(self.tasks.values().cloned().collect());
        }
        terms.sort();
        terms.dedup();

        let mut list = TaskList::new();
        for term in &terms {
            if let Some(task) = self.tasks.get(term) {
                list.insert(task.clone());
            }
        }
        Ok(list)
    }
}
