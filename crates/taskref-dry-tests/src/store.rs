// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Call-counting `TaskStore` wrapper.

use std::sync::{Arc, Mutex, MutexGuard};
use taskref_core::{LazyError, MemoryStore, TaskStore, TaskUuid};

/// Wraps a [`TaskStore`] and records every call made through it.
///
/// Clones share the same call log, so a test can hand one clone to a
/// [`Backend`](taskref_core::Backend) and keep another to inspect afterwards.
///
/// # Example
///
/// ```
/// use taskref_core::{Backend, MemoryStore, Task};
/// use taskref_dry_tests::CountingStore;
///
/// let tasks: MemoryStore = [Task::with_uuid("u1")].into_iter().collect();
/// let store = CountingStore::new(tasks);
/// let backend = Backend::new(store.clone());
///
/// let mut task = backend.task("u1");
/// assert_eq!(task.get_field("uuid").unwrap(), "u1");
/// assert_eq!(store.total_calls(), 0);
///
/// task.saved().unwrap();
/// assert_eq!(store.get_count(), 1);
/// ```
pub struct CountingStore<S = MemoryStore> {
    store: Arc<S>,
    log: Arc<Mutex<CallLog>>,
}

#[derive(Default)]
struct CallLog {
    gets: Vec<TaskUuid>,
    queries: Vec<String>,
    fail: bool,
}

impl<S> CountingStore<S> {
    /// Wrap `store` with an empty call log.
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
            log: Arc::default(),
        }
    }

    fn log(&self) -> MutexGuard<'_, CallLog> {
        self.log.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The wrapped store.
    pub fn inner(&self) -> &S {
        &self.store
    }

    /// Make every following call fail with [`LazyError::Backend`].
    ///
    /// Failed calls are still counted.
    pub fn set_fail(&self, fail: bool) {
        self.log().fail = fail;
    }

    /// Number of `get` calls (attempted, not successful).
    pub fn get_count(&self) -> usize {
        self.log().gets.len()
    }

    /// Number of `filter` calls (attempted, not successful).
    pub fn filter_count(&self) -> usize {
        self.log().queries.len()
    }

    /// `get` plus `filter` calls.
    pub fn total_calls(&self) -> usize {
        let log = self.log();
        log.gets.len() + log.queries.len()
    }

    /// Uuids passed to `get`, in call order.
    pub fn requested_uuids(&self) -> Vec<TaskUuid> {
        self.log().gets.clone()
    }

    /// Queries passed to `filter`, in call order.
    pub fn queries(&self) -> Vec<String> {
        self.log().queries.clone()
    }

    /// Forget all recorded calls and clear the failure flag.
    pub fn reset(&self) {
        let mut log = self.log();
        log.gets.clear();
        log.queries.clear();
        log.fail = false;
    }
}

impl<S> Clone for CountingStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            log: Arc::clone(&self.log),
        }
    }
}

impl<S: TaskStore> TaskStore for CountingStore<S> {
    type Record = S::Record;
    type Collection = S::Collection;

    fn get(&self, uuid: &TaskUuid) -> Result<S::Record, LazyError> {
        {
            let mut log = self.log();
            log.gets.push(uuid.clone());
            if log.fail {
                return Err(LazyError::Backend("simulated get failure".into()));
            }
        }
        self.store.get(uuid)
    }

    fn filter(&self, query: &str) -> Result<S::Collection, LazyError> {
        {
            let mut log = self.log();
            log.queries.push(query.to_owned());
            if log.fail {
                return Err(LazyError::Backend("simulated filter failure".into()));
            }
        }
        self.store.filter(query)
    }

    fn query_separator(&self) -> &str {
        self.store.query_separator()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use taskref_core::{Task, TaskCollection};

    fn store() -> CountingStore {
        CountingStore::new(
            [Task::with_uuid("u1"), Task::with_uuid("u2")]
                .into_iter()
                .collect(),
        )
    }

    #[test]
    fn counts_calls_and_records_arguments() {
        let store = store();
        store.get(&TaskUuid::from("u1")).unwrap();
        let list = store.filter("u1 u2").unwrap();
        assert_eq!(list.len(), 2);

        assert_eq!(store.get_count(), 1);
        assert_eq!(store.filter_count(), 1);
        assert_eq!(store.requested_uuids(), vec![TaskUuid::from("u1")]);
        assert_eq!(store.queries(), vec!["u1 u2".to_owned()]);
    }

    #[test]
    fn failures_are_counted_and_surface_as_backend_errors() {
        let store = store();
        store.set_fail(true);
        assert!(matches!(
            store.get(&TaskUuid::from("u1")),
            Err(LazyError::Backend(_))
        ));
        assert!(matches!(store.filter("u1"), Err(LazyError::Backend(_))));
        assert_eq!(store.total_calls(), 2);

        store.set_fail(false);
        assert!(store.get(&TaskUuid::from("u1")).is_ok());
    }

    #[test]
    fn clones_share_the_log() {
        let a = store();
        let b = a.clone();
        let _ = a.get(&TaskUuid::from("missing"));
        assert_eq!(b.get_count(), 1);
        b.reset();
        assert_eq!(a.total_calls(), 0);
    }
}
