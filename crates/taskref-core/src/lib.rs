// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Identity-based lazy task references for taskref.
//!
//! `taskref-core` lets callers hold, compare and combine task records by
//! identity without fetching them. A [`LazyTask`] wraps one [`TaskUuid`]; a
//! [`LazyTaskSet`] wraps many and performs set algebra on identifiers alone.
//! Both upgrade themselves into fully fetched records (via a [`TaskStore`])
//! the first time a caller asks for something identifiers cannot answer.
//!
//! # Materialization
//!
//! Materialization is one-way. A lazy value that has fetched its record never
//! goes back to holding only identifiers, and identity (`uuid`) never changes
//! across the transition. Equality and hashing are identity-only in both
//! states.
//!
//! # Backend calls
//!
//! The store is reached through exactly two operations: [`TaskStore::get`]
//! for a single uuid and [`TaskStore::filter`] for a query built by joining a
//! set's uuids with [`TaskStore::query_separator`]. Nothing in the identifier
//! algebra calls either.
#![forbid(unsafe_code)]

pub mod config;
mod error;
mod ident;
mod memory;
mod record;
mod reference;
mod set;
mod store;
mod task;

pub use config::{
    ConfigDocument, ConfigError, ConfigService, ConfigStore, LazyConfig, ReferencePolicy,
};
pub use error::LazyError;
pub use ident::{TaskLike, TaskUuid, ID_FIELD};
pub use memory::MemoryStore;
pub use record::{TaskCollection, TaskRecord};
pub use reference::LazyTask;
pub use set::{LazyTaskSet, LazyTaskSetIter};
pub use store::{Backend, TaskStore};
pub use task::{Task, TaskList};
