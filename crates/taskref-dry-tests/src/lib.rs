// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for taskref crates.
#![forbid(unsafe_code)]
//!
//! # Modules
//!
//! - [`config`] - In-memory config store fake for testing without filesystem
//! - [`fixtures`] - Deterministic uuids, tasks and seeded stores
//! - [`store`] - Call-counting `TaskStore` wrapper with failure injection

pub mod config;
pub mod fixtures;
pub mod store;

// Re-export commonly used items at crate root for convenience
pub use config::InMemoryConfigStore;
pub use fixtures::{counting_backend, make_task, make_uuid, seeded_store};
pub use store::CountingStore;
