// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Backend traffic generated by lazy task sets.
#![allow(clippy::unwrap_used)]

use std::collections::HashSet;

use serde_json::json;
use taskref_core::{LazyError, LazyTaskSet, TaskCollection, TaskUuid, ID_FIELD};
use taskref_dry_tests::{counting_backend, make_task, make_uuid, CountingStore};

fn u(seed: u64) -> TaskUuid {
    make_uuid(seed)
}

fn members(set: &LazyTaskSet<CountingStore>) -> HashSet<TaskUuid> {
    set.uuids()
}

fn expect(seeds: &[u64]) -> HashSet<TaskUuid> {
    seeds.iter().copied().map(make_uuid).collect()
}

#[test]
fn identifier_algebra_never_calls_filter() {
    let (backend, store) = counting_backend(1..=3);
    let a = backend.task_set([u(1), u(2)]);
    let b = backend.task_set([u(2), u(3)]);

    assert_eq!(members(&a.union(&b)), expect(&[1, 2, 3]));
    assert_eq!(members(&a.intersection(&b)), expect(&[2]));
    assert_eq!(members(&a.difference(&b)), expect(&[1]));
    assert_eq!(members(&b.difference(&a)), expect(&[3]));
    assert_eq!(members(&a.symmetric_difference(&b)), expect(&[1, 3]));
    assert_eq!(members(&(&a | &b)), expect(&[1, 2, 3]));

    assert!(a.contains(&make_task(1)));
    assert!(!a.contains(&make_task(3)));
    assert!(backend.task_set([u(1)]).is_subset(&a));
    assert!(a.is_superset(&backend.task_set([u(1)])));
    assert_eq!(a.len(), 2);
    assert_eq!(a.iter().count(), 2);

    assert_eq!(store.total_calls(), 0);
}

#[test]
fn algebra_against_plain_records_reads_only_their_uuids() {
    let (backend, store) = counting_backend(1..=3);
    let set = backend.task_set([u(1), u(2)]);
    let records = vec![make_task(2), make_task(3)];

    assert_eq!(members(&set.difference_from(&records)), expect(&[3]));
    assert_eq!(members(&(&set - &records)), expect(&[1]));
    assert!(set.equals(vec![backend.task(u(2)), backend.task(u(1))]));
    assert_eq!(store.total_calls(), 0);
}

#[test]
fn mutators_only_touch_identifiers() {
    let (backend, store) = counting_backend(1..=3);
    let mut set = backend.task_set([u(1)]);

    set.add(&u(2)).unwrap();
    set.update([u(3)]).unwrap();
    set.remove(&u(1)).unwrap();
    assert_eq!(
        set.remove(&u(1)).unwrap_err(),
        LazyError::NotFound { uuid: u(1) }
    );
    set.pop().unwrap();
    set.clear();
    assert_eq!(set.pop().unwrap_err(), LazyError::EmptyCollection);

    assert!(!set.is_materialized());
    assert_eq!(store.total_calls(), 0);
}

#[test]
fn delegation_issues_exactly_one_filter_with_every_uuid() {
    let (backend, store) = counting_backend(1..=3);
    let mut set = backend.task_set([u(2), u(1)]);

    let descriptions: HashSet<String> = set
        .field_values("description")
        .unwrap()
        .into_iter()
        .flatten()
        .filter_map(|v| v.as_str().map(str::to_owned))
        .collect();
    assert_eq!(
        descriptions,
        ["task 1", "task 2"].into_iter().map(str::to_owned).collect()
    );

    let queries = store.queries();
    assert_eq!(queries.len(), 1);
    let terms: HashSet<&str> = queries[0].split(' ').collect();
    assert_eq!(terms, [u(1).as_str(), u(2).as_str()].into_iter().collect());

    // Everything after that goes through the fetched collection.
    assert_eq!(set.records().unwrap().len(), 2);
    assert!(set.contains(&u(1)));
    assert_eq!(set.len(), 2);
    assert_eq!(members(&set.union([u(3)])), expect(&[1, 2, 3]));
    set.set_field_all("project", &json!("home")).unwrap();
    assert_eq!(store.filter_count(), 1);
    assert_eq!(store.get_count(), 0);
}

#[test]
fn identity_is_unchanged_after_materialization() {
    let (backend, store) = counting_backend(1..=2);
    let mut set = backend.task_set([u(1), u(2)]);
    set.materialize().unwrap();

    let mut seen = HashSet::new();
    for mut task in &set {
        assert!(task.is_materialized());
        let id = task.get_field(ID_FIELD).unwrap();
        seen.insert(id.as_str().map(TaskUuid::from).unwrap());
    }
    assert_eq!(seen, expect(&[1, 2]));
    assert_eq!(store.filter_count(), 1);
}

#[test]
fn failed_materialization_leaves_the_set_lazy() {
    let (backend, store) = counting_backend(1..=2);
    let mut set = backend.task_set([u(1), u(2)]);

    store.set_fail(true);
    assert!(matches!(set.materialize(), Err(LazyError::Backend(_))));
    assert!(!set.is_materialized());
    assert_eq!(set.len(), 2);

    store.set_fail(false);
    assert_eq!(set.collection().unwrap().len(), 2);
    assert_eq!(store.filter_count(), 2);
}

#[test]
fn empty_set_materializes_without_a_backend_call() {
    let (backend, store) = counting_backend(1..=2);
    let mut set = backend.task_set(Vec::<TaskUuid>::new());
    assert!(set.records().unwrap().is_empty());
    assert!(set.is_materialized());
    assert_eq!(store.total_calls(), 0);
}

#[test]
fn materialized_add_fetches_only_the_new_member() {
    let (backend, store) = counting_backend(1..=3);
    let mut set = backend.task_set([u(1)]);
    set.materialize().unwrap();

    assert!(set.add(&u(3)).unwrap());
    assert!(!set.add(&u(1)).unwrap());
    assert_eq!(store.requested_uuids(), vec![u(3)]);
    assert!(set.try_collection().unwrap().contains(&u(3)));
}

#[test]
fn bulk_identity_writes_are_refused_and_identities_survive() {
    let (backend, store) = counting_backend(1..=2);
    let mut set = backend.task_set([u(1), u(2)]);

    assert_eq!(
        set.set_field_all(ID_FIELD, &json!("dup")),
        Err(LazyError::immutable_uuid())
    );
    assert_eq!(store.total_calls(), 0);

    set.materialize().unwrap();
    assert!(set.set_field_all(ID_FIELD, &json!(7)).is_err());
    assert_eq!(members(&set), expect(&[1, 2]));
    assert_eq!(set.iter().count(), 2);

    let popped = set.pop().unwrap();
    assert!(expect(&[1, 2]).contains(popped.uuid()));
    assert_eq!(set.len(), 1);
    assert_eq!(store.filter_count(), 1);
}
