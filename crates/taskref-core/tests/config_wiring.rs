// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Loading `LazyConfig` through a config port and handing it to a backend.
#![allow(clippy::unwrap_used)]

use taskref_core::{Backend, ConfigDocument, ConfigService, LazyConfig, ReferencePolicy};
use taskref_dry_tests::{make_uuid, seeded_store, CountingStore, InMemoryConfigStore};

#[test]
fn saved_refetch_policy_reaches_the_references() {
    let config_store = InMemoryConfigStore::with_raw(
        LazyConfig::KEY,
        br#"{"reference_policy":"refetch"}"#,
    );
    let config: LazyConfig = ConfigService::new(config_store.clone()).load().unwrap();
    assert_eq!(config.reference_policy, ReferencePolicy::Refetch);
    assert_eq!(
        config.warn_materialize_above,
        LazyConfig::default().warn_materialize_above,
        "absent keys keep their defaults"
    );

    let store = CountingStore::new(seeded_store([1]));
    let backend = Backend::with_config(store.clone(), config);
    let mut task = backend.task(make_uuid(1));
    task.completed().unwrap();
    task.saved().unwrap();
    assert_eq!(store.get_count(), 2);
    assert_eq!(config_store.load_count(), 1);
}

#[test]
fn unreadable_config_falls_back_to_memoize() {
    let config_store = InMemoryConfigStore::new();
    config_store.set_fail_on_load(true);
    let config: LazyConfig = ConfigService::new(config_store).load_or_default();
    assert_eq!(config, LazyConfig::default());

    let store = CountingStore::new(seeded_store([1]));
    let backend = Backend::with_config(store.clone(), config);
    let mut task = backend.task(make_uuid(1));
    task.completed().unwrap();
    task.saved().unwrap();
    assert_eq!(store.get_count(), 1);
}

#[test]
fn config_round_trips_and_is_shared_by_clones_of_the_backend() {
    let config_store = InMemoryConfigStore::new();
    let service = ConfigService::new(config_store.clone());
    let config = LazyConfig {
        reference_policy: ReferencePolicy::Memoize,
        warn_materialize_above: None,
    };
    service.save(&config).unwrap();
    assert!(config_store.raw(LazyConfig::KEY).is_some());

    let backend = Backend::with_config(
        CountingStore::new(seeded_store([1])),
        service.load().unwrap(),
    );
    let copy = backend.clone();
    assert!(copy.ptr_eq(&backend));
    assert_eq!(copy.config(), &config);
}
