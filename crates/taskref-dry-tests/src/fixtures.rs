// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Deterministic uuids, tasks and seeded stores for tests.

use crate::store::CountingStore;
use taskref_core::{Backend, MemoryStore, Task, TaskUuid};

/// Generate a uuid-shaped identifier from a numeric seed (useful for loops).
///
/// # Example
///
/// ```
/// use taskref_dry_tests::make_uuid;
///
/// assert_eq!(make_uuid(7).as_str(), "00000000-0000-4000-8000-000000000007");
/// assert_ne!(make_uuid(1), make_uuid(2));
/// ```
pub fn make_uuid(seed: u64) -> TaskUuid {
    TaskUuid::new(format!("00000000-0000-4000-8000-{seed:012x}"))
}

/// A saved, pending task for `seed` with a description of `task <seed>`.
pub fn make_task(seed: u64) -> Task {
    Task::with_uuid(make_uuid(seed))
        .field_value("description", format!("task {seed}"))
        .field_value("status", "pending")
}

/// A [`MemoryStore`] holding [`make_task`] for every seed.
pub fn seeded_store(seeds: impl IntoIterator<Item = u64>) -> MemoryStore {
    seeds.into_iter().map(make_task).collect()
}

/// A backend over a counting, seeded store plus a handle to the call log.
pub fn counting_backend(
    seeds: impl IntoIterator<Item = u64>,
) -> (Backend<CountingStore>, CountingStore) {
    let store = CountingStore::new(seeded_store(seeds));
    (Backend::new(store.clone()), store)
}
