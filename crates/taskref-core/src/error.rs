// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error type shared by lazy values and stores.

use crate::ident::TaskUuid;

/// Errors surfaced by lazy tasks, lazy task sets and [`TaskStore`](crate::TaskStore)
/// implementations.
///
/// Store failures are never retried or masked; whatever the store returns
/// reaches the caller that triggered materialization.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LazyError {
    /// No record (or no set member) carries this uuid.
    #[error("[TASK_NOT_FOUND] no task with uuid {uuid}")]
    NotFound {
        /// The uuid that was looked up.
        uuid: TaskUuid,
    },
    /// A fetched record does not have the requested field.
    #[error("[FIELD_NOT_FOUND] task {uuid} has no field `{field}`")]
    FieldNotFound {
        /// The task whose record was inspected.
        uuid: TaskUuid,
        /// The missing field name.
        field: String,
    },
    /// `pop` on an empty set.
    #[error("[EMPTY_COLLECTION] cannot pop from an empty task set")]
    EmptyCollection,
    /// A task-like value without a uuid was handed to an operation that
    /// needs one (e.g. adding an unsaved task to a set).
    #[error("[MISSING_UUID] value does not expose a task uuid")]
    MissingUuid,
    /// A field write that would change a task's identity.
    #[error("[IMMUTABLE_UUID] field `{field}` carries task identity and cannot be reassigned")]
    ImmutableUuid {
        /// The identity field name.
        field: String,
    },
    /// Opaque failure reported by the store.
    #[error("[BACKEND] {0}")]
    Backend(String),
}

impl LazyError {
    /// Shorthand for [`LazyError::NotFound`].
    pub fn not_found(uuid: &TaskUuid) -> Self {
        Self::NotFound { uuid: uuid.clone() }
    }

    /// Shorthand for [`LazyError::ImmutableUuid`] on [`ID_FIELD`](crate::ID_FIELD).
    pub fn immutable_uuid() -> Self {
        Self::ImmutableUuid {
            field: crate::ident::ID_FIELD.to_owned(),
        }
    }
}
