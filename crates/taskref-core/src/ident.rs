// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Task identifiers and the `TaskLike` identity seam.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Name of the record field that carries a task's identity.
///
/// Asking a [`LazyTask`](crate::LazyTask) for this field never reaches the
/// store.
pub const ID_FIELD: &str = "uuid";

/// Opaque task identifier (UUID text in practice).
///
/// Equality, ordering and hashing are plain string semantics; no format
/// validation is applied, the store owns what a valid uuid looks like.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskUuid(String);

impl TaskUuid {
    /// Wrap a uuid string.
    pub fn new(uuid: impl Into<String>) -> Self {
        Self(uuid.into())
    }

    /// View the uuid text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TaskUuid {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for TaskUuid {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TaskUuid {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for TaskUuid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Anything that can name the task it stands for.
///
/// This is the only thing set algebra and equality ever ask of an operand.
/// `None` means the value exposes no identity (for example a task that was
/// never saved); such values compare unequal to everything and contribute
/// nothing to set algebra.
pub trait TaskLike {
    /// The task's uuid, if it has one.
    fn task_uuid(&self) -> Option<TaskUuid>;
}

impl TaskLike for TaskUuid {
    fn task_uuid(&self) -> Option<TaskUuid> {
        Some(self.clone())
    }
}

impl<T: TaskLike + ?Sized> TaskLike for &T {
    fn task_uuid(&self) -> Option<TaskUuid> {
        (**self).task_uuid()
    }
}

impl<T: TaskLike> TaskLike for Option<T> {
    fn task_uuid(&self) -> Option<TaskUuid> {
        self.as_ref().and_then(TaskLike::task_uuid)
    }
}
