// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Reference record types: a JSON task document and a uuid-unique task list.

use crate::error::LazyError;
use crate::ident::{TaskLike, TaskUuid, ID_FIELD};
use crate::record::{TaskCollection, TaskRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Status value that marks a task as done.
const STATUS_COMPLETED: &str = "completed";

/// A task record as a flat JSON document.
///
/// The uuid is held apart from the other fields so an unsaved task (no uuid)
/// is representable. Local edits are tracked until [`Task::mark_saved`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Identity; `None` until the task has been saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<TaskUuid>,
    /// Every other field.
    #[serde(flatten)]
    pub data: BTreeMap<String, Value>,
    #[serde(skip)]
    modified_fields: BTreeSet<String>,
}

impl Task {
    /// Create an unsaved task with no fields.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a saved task with the given uuid and no other fields.
    pub fn with_uuid(uuid: impl Into<TaskUuid>) -> Self {
        Self {
            uuid: Some(uuid.into()),
            ..Self::default()
        }
    }

    /// Builder-style field assignment that does not count as a local edit.
    pub fn field_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(name.into(), value.into());
        self
    }

    /// The `status` field, if it is a string.
    pub fn status(&self) -> Option<&str> {
        self.data.get("status").and_then(Value::as_str)
    }

    /// Forget local edits, as after a successful save.
    pub fn mark_saved(&mut self) {
        self.modified_fields.clear();
    }

    /// An unsaved task may take a string uuid once; a saved task keeps its own.
    fn assign_uuid(&mut self, value: &Value) -> Result<(), LazyError> {
        let text = value.as_str();
        if let Some(current) = &self.uuid {
            return if text == Some(current.as_str()) {
                Ok(())
            } else {
                Err(LazyError::immutable_uuid())
            };
        }
        let text = text.ok_or_else(LazyError::immutable_uuid)?;
        self.uuid = Some(TaskUuid::from(text));
        self.modified_fields.insert(ID_FIELD.to_owned());
        Ok(())
    }
}

impl TaskLike for Task {
    fn task_uuid(&self) -> Option<TaskUuid> {
        self.uuid.clone()
    }
}

impl TaskRecord for Task {
    fn uuid(&self) -> Option<&TaskUuid> {
        self.uuid.as_ref()
    }

    fn field(&self, name: &str) -> Option<Value> {
        if name == ID_FIELD {
            return self.uuid.as_ref().map(|u| Value::String(u.to_string()));
        }
        self.data.get(name).cloned()
    }

    fn set_field(&mut self, name: &str, value: Value) -> Result<(), LazyError> {
        if name == ID_FIELD {
            return self.assign_uuid(&value);
        }
        if self.data.get(name) != Some(&value) {
            self.data.insert(name.to_owned(), value);
            self.modified_fields.insert(name.to_owned());
        }
        Ok(())
    }

    fn completed(&self) -> Option<bool> {
        Some(self.status() == Some(STATUS_COMPLETED))
    }

    fn modified(&self) -> Option<bool> {
        Some(!self.modified_fields.is_empty())
    }

    fn saved(&self) -> Option<bool> {
        Some(self.uuid.is_some())
    }

    fn pending_changes(&self) -> Option<BTreeSet<String>> {
        Some(self.modified_fields.clone())
    }
}

/// An ordered list of tasks, unique by uuid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskList {
    tasks: Vec<Task>,
}

impl TaskList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterate over the tasks.
    pub fn iter(&self) -> std::slice::Iter<'_, Task> {
        self.tasks.iter()
    }

    /// Mutable iteration over the tasks.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Task> {
        self.tasks.iter_mut()
    }
}

impl TaskCollection for TaskList {
    type Record = Task;

    fn records(&self) -> &[Task] {
        &self.tasks
    }

    fn insert(&mut self, record: Task) {
        let existing = record
            .uuid
            .as_ref()
            .and_then(|uuid| self.tasks.iter().position(|t| t.uuid.as_ref() == Some(uuid)));
        match existing {
            Some(idx) => self.tasks[idx] = record,
            None => self.tasks.push(record),
        }
    }

    fn remove(&mut self, uuid: &TaskUuid) -> Option<Task> {
        let idx = self
            .tasks
            .iter()
            .position(|t| t.uuid.as_ref() == Some(uuid))?;
        Some(self.tasks.remove(idx))
    }

    fn pop(&mut self) -> Option<Task> {
        self.tasks.pop()
    }

    fn retain(&mut self, keep: &mut dyn FnMut(&Task) -> bool) {
        self.tasks.retain(keep);
    }

    fn for_each_mut(&mut self, visit: &mut dyn FnMut(&mut Task)) {
        self.tasks.iter_mut().for_each(visit);
    }

    fn clear(&mut self) {
        self.tasks.clear();
    }
}

impl FromIterator<Task> for TaskList {
    fn from_iter<I: IntoIterator<Item = Task>>(iter: I) -> Self {
        let mut list = Self::new();
        for task in iter {
            list.insert(task);
        }
        list
    }
}

impl IntoIterator for TaskList {
    type Item = Task;
    type IntoIter = std::vec::IntoIter<Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.into_iter()
    }
}

impl<'a> IntoIterator for &'a TaskList {
    type Item = &'a Task;
    type IntoIter = std::slice::Iter<'a, Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.iter()
    }
}

impl<'a> IntoIterator for &'a mut TaskList {
    type Item = &'a mut Task;
    type IntoIter = std::slice::IterMut<'a, Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.iter_mut()
    }
}
