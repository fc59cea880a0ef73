// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Backend traffic generated by single lazy task references.
#![allow(clippy::unwrap_used)]

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde_json::json;
use taskref_core::{Backend, LazyConfig, LazyError, ReferencePolicy, ID_FIELD};
use taskref_dry_tests::{counting_backend, make_uuid, seeded_store, CountingStore};

fn hash_of<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

#[test]
fn uuid_access_makes_zero_backend_calls() {
    let (backend, store) = counting_backend(1..=2);
    let mut task = backend.task(make_uuid(1));

    assert_eq!(task.get_field(ID_FIELD).unwrap(), json!(make_uuid(1).as_str()));
    assert_eq!(task.uuid(), &make_uuid(1));
    assert_eq!(task.to_string(), format!("LazyTask: {}", make_uuid(1)));
    assert_eq!(store.total_calls(), 0);
}

#[test]
fn first_field_access_fetches_once_then_memoizes() {
    let (backend, store) = counting_backend(1..=2);
    let mut task = backend.task(make_uuid(2));

    assert_eq!(task.get_field("description").unwrap(), json!("task 2"));
    assert!(!task.completed().unwrap());
    assert!(task.saved().unwrap());
    assert!(!task.modified().unwrap());
    assert!(task.pending_changes().unwrap().is_empty());

    assert_eq!(store.get_count(), 1);
    assert_eq!(store.requested_uuids(), vec![make_uuid(2)]);
    assert_eq!(store.filter_count(), 0);
}

#[test]
fn refetch_policy_hits_the_backend_per_accessor() {
    let store = CountingStore::new(seeded_store([1]));
    let config = LazyConfig {
        reference_policy: ReferencePolicy::Refetch,
        ..LazyConfig::default()
    };
    let backend = Backend::with_config(store.clone(), config);
    let mut task = backend.task(make_uuid(1));

    task.completed().unwrap();
    task.get_field("description").unwrap();
    task.get_field(ID_FIELD).unwrap();

    assert_eq!(store.get_count(), 2, "uuid access is still free");
}

#[test]
fn equality_and_hash_survive_materialization() {
    let (backend, store) = counting_backend([1]);
    let lazy = backend.task(make_uuid(1));
    let mut fetched = backend.task(make_uuid(1));
    fetched.materialize().unwrap();

    assert!(fetched.is_materialized());
    assert!(!lazy.is_materialized());
    assert_eq!(lazy, fetched);
    assert!(lazy.equals(&fetched));
    assert_eq!(hash_of(&lazy), hash_of(&fetched));
    assert_eq!(store.get_count(), 1, "comparison itself never fetches");
}

#[test]
fn missing_task_propagates_not_found() {
    let (backend, _store) = counting_backend([1]);
    let mut task = backend.task(make_uuid(99));
    assert_eq!(
        task.get_field("description"),
        Err(LazyError::NotFound { uuid: make_uuid(99) })
    );
}

#[test]
fn backend_failure_is_surfaced_not_defaulted() {
    let (backend, store) = counting_backend([1]);
    store.set_fail(true);
    let mut task = backend.task(make_uuid(1));

    assert!(matches!(task.saved(), Err(LazyError::Backend(_))));
    assert!(matches!(task.completed(), Err(LazyError::Backend(_))));
    assert!(!task.is_materialized());
}

#[test]
fn failed_refresh_keeps_previous_record() {
    let (backend, store) = counting_backend([1]);
    let mut task = backend.task(make_uuid(1));
    task.materialize().unwrap();

    store.set_fail(true);
    assert!(task.refresh().is_err());
    assert!(task.is_materialized(), "materialization is one-way");

    store.set_fail(false);
    assert_eq!(task.get_field("description").unwrap(), json!("task 1"));
}
