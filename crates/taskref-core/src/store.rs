// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The store port and the shared handle lazy values carry.

use crate::config::LazyConfig;
use crate::error::LazyError;
use crate::ident::TaskUuid;
use crate::record::{TaskCollection, TaskRecord};
use crate::reference::LazyTask;
use crate::set::LazyTaskSet;
use std::fmt;
use std::sync::Arc;

/// Backend holding the task records.
///
/// The trait is synchronous: each call may block on a process invocation or
/// a network round trip, and timeouts or cancellation are the
/// implementation's business.
///
/// # Query format
///
/// [`filter`](TaskStore::filter) receives bare uuids joined by
/// [`query_separator`](TaskStore::query_separator). Interpreting that as
/// "any of these uuids" is the store's contract, not the lazy layer's.
pub trait TaskStore {
    /// Fetched record type.
    type Record: TaskRecord;
    /// Fetched collection type.
    type Collection: TaskCollection<Record = Self::Record>;

    /// Fetch one record. Fails with [`LazyError::NotFound`] if no record has
    /// this uuid.
    fn get(&self, uuid: &TaskUuid) -> Result<Self::Record, LazyError>;

    /// Run a query and return every matching record.
    fn filter(&self, query: &str) -> Result<Self::Collection, LazyError>;

    /// Separator placed between uuids when building a [`filter`](TaskStore::filter) query.
    fn query_separator(&self) -> &str {
        " "
    }
}

/// Cheap-to-clone handle pairing a store with its [`LazyConfig`].
///
/// Every lazy value keeps one of these so it can materialize later. It is
/// also the usual way to make lazy values.
pub struct Backend<S> {
    inner: Arc<Shared<S>>,
}

struct Shared<S> {
    store: S,
    config: LazyConfig,
}

impl<S> Backend<S> {
    /// Wrap a store with the default config.
    pub fn new(store: S) -> Self {
        Self::with_config(store, LazyConfig::default())
    }

    /// Wrap a store with an explicit config.
    pub fn with_config(store: S, config: LazyConfig) -> Self {
        Self {
            inner: Arc::new(Shared { store, config }),
        }
    }

    /// The wrapped store.
    pub fn store(&self) -> &S {
        &self.inner.store
    }

    /// The active config.
    pub fn config(&self) -> &LazyConfig {
        &self.inner.config
    }

    /// Whether two handles share the same store.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<S: TaskStore> Backend<S> {
    /// A lazy reference to one task.
    pub fn task(&self, uuid: impl Into<TaskUuid>) -> LazyTask<S> {
        LazyTask::new(self.clone(), uuid.into())
    }

    /// A lazy set over the given uuids. Duplicates collapse.
    pub fn task_set<I>(&self, uuids: I) -> LazyTaskSet<S>
    where
        I: IntoIterator,
        I::Item: Into<TaskUuid>,
    {
        LazyTaskSet::new(self.clone(), uuids.into_iter().map(Into::into))
    }
}

impl<S> Clone for Backend<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> fmt::Debug for Backend<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}
